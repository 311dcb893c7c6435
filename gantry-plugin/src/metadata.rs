//! Slot and plugin descriptor value types
//!
//! Both descriptors are plain immutable values: equality and formatting only.
//! A [`SlotDescriptor`] exists before any plugin is contacted; a
//! [`PluginDescriptor`] only exists after a handshake reply was decoded.

use gantry_ipc::{HandshakeReply, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{PluginError, PluginResult};
use crate::types::VersionRequirement;

/// Identity of one engine extension point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// The extension point this descriptor binds
    pub slot_id: SlotId,
    /// Slot API versions the engine accepts from a plugin
    pub version_range: VersionRequirement,
    /// Identifier of the engine instance opening the slot
    pub engine_uuid: Uuid,
}

impl SlotDescriptor {
    /// Create a new slot descriptor
    pub fn new(slot_id: SlotId, version_range: VersionRequirement, engine_uuid: Uuid) -> Self {
        Self {
            slot_id,
            version_range,
            engine_uuid,
        }
    }

    /// Build a descriptor from a configured slot binding
    pub fn from_binding(
        binding: &gantry_config::SlotBindingConfig,
        engine_uuid: Uuid,
    ) -> PluginResult<Self> {
        let slot_id: SlotId = binding
            .slot
            .parse()
            .map_err(|_| PluginError::UnknownSlot {
                name: binding.slot.clone(),
            })?;
        let version_range =
            VersionRequirement::new(&binding.version_range).map_err(|e| PluginError::InvalidVersionRange {
                slot: binding.slot.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(slot_id, version_range, engine_uuid))
    }
}

impl fmt::Display for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (accepts {})", self.slot_id, self.version_range)
    }
}

/// Identity of the plugin answering for a slot, learned from the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub plugin_name: String,
    pub plugin_version: String,
    /// Version of the slot API the plugin implements
    pub slot_version: String,
    /// Network address of the plugin process, reported by the transport
    pub peer: String,
    /// Broadcast topics the plugin subscribed to
    pub broadcast_subscriptions: BTreeSet<String>,
}

impl PluginDescriptor {
    /// Decode a handshake reply into a descriptor.
    ///
    /// The peer address comes from the transport, not from the payload.
    pub fn from_reply(reply: HandshakeReply, peer: impl Into<String>) -> Self {
        Self {
            plugin_name: reply.plugin_name,
            plugin_version: reply.plugin_version,
            slot_version: reply.slot_version,
            peer: peer.into(),
            broadcast_subscriptions: reply.broadcast_subscriptions,
        }
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} at [{}]",
            self.plugin_name, self.plugin_version, self.peer
        )
    }
}
