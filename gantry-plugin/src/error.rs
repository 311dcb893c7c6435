//! Plugin proxy error types

use thiserror::Error;

use crate::metadata::{PluginDescriptor, SlotDescriptor};
use crate::validator::ValidationOutcome;

/// Plugin proxy result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Plugin proxy errors.
///
/// The wire can fail in exactly two distinguishable ways: the transport
/// reported a failure (`Remote`), or the transport succeeded and the
/// compatibility policy turned the plugin down (`Rejected`). The remaining
/// variants are local conditions that never involve the plugin process.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Transport-level failure during the handshake or a slot call
    #[error("Remote failure on slot {slot}: {message}")]
    Remote {
        slot: SlotDescriptor,
        /// Present only if the handshake reply had been decoded before the
        /// failure was observed
        plugin: Option<PluginDescriptor>,
        message: String,
    },

    /// The compatibility policy rejected the plugin for this slot
    #[error("Plugin {plugin} rejected for slot {slot}: {reason}", reason = .outcome.reason())]
    Rejected {
        slot: SlotDescriptor,
        plugin: PluginDescriptor,
        outcome: ValidationOutcome,
    },

    /// A configured slot name does not match any known extension point
    #[error("Unknown slot '{name}'")]
    UnknownSlot { name: String },

    /// A configured version range is not a valid semver requirement
    #[error("Invalid version range for slot '{slot}': {reason}")]
    InvalidVersionRange { slot: String, reason: String },

    /// Serialization error while encoding native call arguments
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (building the per-call executor)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Plugin identity attached to this error, if it was known when the
    /// failure occurred
    pub fn plugin(&self) -> Option<&PluginDescriptor> {
        match self {
            PluginError::Remote { plugin, .. } => plugin.as_ref(),
            PluginError::Rejected { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VersionRequirement;
    use gantry_ipc::SlotId;
    use uuid::Uuid;

    fn slot() -> SlotDescriptor {
        SlotDescriptor::new(
            SlotId::SimplifyModify,
            VersionRequirement::new("^1.0").unwrap(),
            Uuid::nil(),
        )
    }

    fn plugin() -> PluginDescriptor {
        PluginDescriptor {
            plugin_name: "MockSimplify".to_string(),
            plugin_version: "2.0.0".to_string(),
            slot_version: "2.0.0".to_string(),
            peer: "ipc://mock".to_string(),
            broadcast_subscriptions: Default::default(),
        }
    }

    #[test]
    fn test_remote_error_without_plugin() {
        let err = PluginError::Remote {
            slot: slot(),
            plugin: None,
            message: "UNAVAILABLE".to_string(),
        };
        assert!(err.plugin().is_none());
        assert_eq!(
            err.to_string(),
            "Remote failure on slot simplify_modify (accepts ^1.0): UNAVAILABLE"
        );
    }

    #[test]
    fn test_rejected_error_always_names_plugin() {
        let err = PluginError::Rejected {
            slot: slot(),
            plugin: plugin(),
            outcome: ValidationOutcome::rejected("slot version 2.0.0 outside accepted range ^1.0"),
        };
        assert!(err.plugin().is_some());
        let text = err.to_string();
        assert!(text.contains("MockSimplify-2.0.0"));
        assert!(text.contains("outside accepted range"));
    }
}
