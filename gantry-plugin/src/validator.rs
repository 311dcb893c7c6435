//! Compatibility policies deciding whether a plugin may serve a slot

use crate::metadata::{PluginDescriptor, SlotDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Verdict of a compatibility policy, produced exactly once per proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    accepted: bool,
    reason: String,
}

impl ValidationOutcome {
    /// Positive verdict
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: "compatible".to_string(),
        }
    }

    /// Negative verdict with a human-readable reason
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.accepted {
            write!(f, "accepted: {}", self.reason)
        } else {
            write!(f, "rejected: {}", self.reason)
        }
    }
}

/// Compatibility policy evaluated once during the handshake.
///
/// Implementations must be pure and total: no I/O, and a verdict for every
/// well-formed descriptor pair. Unparseable versions are a rejection with a
/// reason, never an error or a panic.
pub trait SlotValidator: Send + Sync {
    fn validate(&self, slot: &SlotDescriptor, plugin: &PluginDescriptor) -> ValidationOutcome;
}

/// Default policy: the slot version reported by the plugin must fall inside
/// the slot's accepted semver range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotVersionValidator;

impl SlotValidator for SlotVersionValidator {
    fn validate(&self, slot: &SlotDescriptor, plugin: &PluginDescriptor) -> ValidationOutcome {
        let version = match semver::Version::parse(&plugin.slot_version) {
            Ok(version) => version,
            Err(e) => {
                return ValidationOutcome::rejected(format!(
                    "plugin reports unparseable slot version '{}': {}",
                    plugin.slot_version, e
                ));
            }
        };

        if slot.version_range.matches(&version) {
            ValidationOutcome::accepted()
        } else {
            ValidationOutcome::rejected(format!(
                "slot version {} outside accepted range {}",
                version, slot.version_range
            ))
        }
    }
}

/// Policy restricting which broadcast topics a plugin may subscribe to
#[derive(Debug, Clone, Default)]
pub struct SubscriptionValidator {
    allowed_topics: BTreeSet<String>,
}

impl SubscriptionValidator {
    pub fn new(allowed_topics: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed_topics: allowed_topics.into_iter().collect(),
        }
    }
}

impl SlotValidator for SubscriptionValidator {
    fn validate(&self, _slot: &SlotDescriptor, plugin: &PluginDescriptor) -> ValidationOutcome {
        for topic in &plugin.broadcast_subscriptions {
            if !self.allowed_topics.contains(topic) {
                return ValidationOutcome::rejected(format!(
                    "plugin subscribes to unknown broadcast topic '{}'",
                    topic
                ));
            }
        }
        ValidationOutcome::accepted()
    }
}

/// Policy accepting every plugin; useful for tests and permissive hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SlotValidator for AcceptAll {
    fn validate(&self, _slot: &SlotDescriptor, _plugin: &PluginDescriptor) -> ValidationOutcome {
        ValidationOutcome::accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VersionRequirement;
    use gantry_ipc::SlotId;
    use uuid::Uuid;

    fn slot(range: &str) -> SlotDescriptor {
        SlotDescriptor::new(
            SlotId::InfillGenerate,
            VersionRequirement::new(range).unwrap(),
            Uuid::nil(),
        )
    }

    fn plugin(slot_version: &str) -> PluginDescriptor {
        PluginDescriptor {
            plugin_name: "MyInfill".to_string(),
            plugin_version: "1.2.0".to_string(),
            slot_version: slot_version.to_string(),
            peer: "ipc://mock".to_string(),
            broadcast_subscriptions: Default::default(),
        }
    }

    #[test]
    fn test_version_in_range_accepted() {
        let outcome = SlotVersionValidator.validate(&slot("^1.0"), &plugin("1.2.0"));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_version_outside_range_rejected() {
        let outcome = SlotVersionValidator.validate(&slot("^1.0"), &plugin("2.0.0"));
        assert!(!outcome.is_accepted());
        assert!(outcome.reason().contains("outside accepted range"));
    }

    #[test]
    fn test_unparseable_version_rejected_not_panicking() {
        let outcome = SlotVersionValidator.validate(&slot("^1.0"), &plugin("one point two"));
        assert!(!outcome.is_accepted());
        assert!(outcome.reason().contains("unparseable"));
    }

    #[test]
    fn test_subscription_validator() {
        let validator = SubscriptionValidator::new(["settings".to_string()]);

        let mut subscriber = plugin("1.0.0");
        subscriber.broadcast_subscriptions = ["settings".to_string()].into();
        assert!(validator.validate(&slot("^1.0"), &subscriber).is_accepted());

        subscriber.broadcast_subscriptions = ["gcode".to_string()].into();
        let outcome = validator.validate(&slot("^1.0"), &subscriber);
        assert!(!outcome.is_accepted());
        assert!(outcome.reason().contains("gcode"));
    }

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.validate(&slot("^1.0"), &plugin("99.0.0")).is_accepted());
    }
}
