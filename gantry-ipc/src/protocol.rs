//! Wire protocol definitions and message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Wire protocol version for compatibility checking
pub const WIRE_PROTOCOL_VERSION: u32 = 1;

/// Extension points the engine can delegate to a plugin.
///
/// Serialized by name in JSON; the stable numeric codes exist for transports
/// that prefer compact framing and for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    /// Engine pushes setting changes to subscribed plugins
    SettingsBroadcast,
    /// Polygon simplification replacing the built-in simplifier
    SimplifyModify,
    /// G-code rewriting after path generation
    PostprocessModify,
    /// Infill pattern generation for a prepared infill area
    InfillGenerate,
}

impl SlotId {
    /// Stable numeric code for this slot
    pub const fn code(&self) -> u32 {
        match self {
            SlotId::SettingsBroadcast => 0,
            SlotId::SimplifyModify => 100,
            SlotId::PostprocessModify => 101,
            SlotId::InfillGenerate => 200,
        }
    }

    /// Look up a slot by its numeric code
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(SlotId::SettingsBroadcast),
            100 => Some(SlotId::SimplifyModify),
            101 => Some(SlotId::PostprocessModify),
            200 => Some(SlotId::InfillGenerate),
            _ => None,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::SettingsBroadcast => write!(f, "settings_broadcast"),
            SlotId::SimplifyModify => write!(f, "simplify_modify"),
            SlotId::PostprocessModify => write!(f, "postprocess_modify"),
            SlotId::InfillGenerate => write!(f, "infill_generate"),
        }
    }
}

impl std::str::FromStr for SlotId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settings_broadcast" => Ok(SlotId::SettingsBroadcast),
            "simplify_modify" => Ok(SlotId::SimplifyModify),
            "postprocess_modify" => Ok(SlotId::PostprocessModify),
            "infill_generate" => Ok(SlotId::InfillGenerate),
            _ => Err(()),
        }
    }
}

/// Metadata tags attached to every request the engine sends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMetadata {
    /// Engine instance identifier (one per engine process)
    pub engine_uuid: String,
    /// Identifier of the engine thread issuing the call
    pub thread_id: String,
    /// Milliseconds left until the caller abandons the request
    pub deadline_ms: u64,
}

/// Handshake request sent once per slot binding, before any functional call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub slot_id: SlotId,
    /// Semver range of slot versions the engine accepts, e.g. "^1.0"
    pub version_range: String,
    pub engine_uuid: String,
}

/// Handshake reply identifying the plugin answering for a slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeReply {
    /// Version of the slot API the plugin implements
    pub slot_version: String,
    pub plugin_name: String,
    pub plugin_version: String,
    /// Broadcast topics the plugin wants to receive
    #[serde(default)]
    pub broadcast_subscriptions: BTreeSet<String>,
}

/// Messages sent from the engine to a plugin process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// Identity and compatibility exchange
    Handshake {
        request: HandshakeRequest,
        metadata: CallMetadata,
        correlation_id: Uuid,
    },

    /// One functional call against a bound slot
    SlotCall {
        slot_id: SlotId,
        payload: JsonValue,
        metadata: CallMetadata,
        correlation_id: Uuid,
    },
}

/// Messages sent from a plugin process back to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginMessage {
    /// Answer to a handshake
    HandshakeReply {
        correlation_id: Uuid,
        reply: HandshakeReply,
    },

    /// Result payload of a slot call
    SlotResult {
        correlation_id: Uuid,
        payload: JsonValue,
    },

    /// The plugin could not serve the request
    Fault {
        correlation_id: Option<Uuid>,
        fault: PluginFault,
    },
}

/// Failure reported by the plugin side of the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "fault_type", rename_all = "snake_case")]
pub enum PluginFault {
    /// A slot call failed inside the plugin
    CallFailed { slot_id: SlotId, error: String },

    /// The plugin does not implement the requested slot
    UnsupportedSlot { slot_id: SlotId },

    /// The plugin refused the handshake outright
    HandshakeFailed { error: String },

    /// The plugin could not parse an engine message
    MessageParseError { error: String },
}

impl fmt::Display for PluginFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginFault::CallFailed { slot_id, error } => {
                write!(f, "Slot call failed ({}): {}", slot_id, error)
            }
            PluginFault::UnsupportedSlot { slot_id } => {
                write!(f, "Slot {} not supported by plugin", slot_id)
            }
            PluginFault::HandshakeFailed { error } => {
                write!(f, "Handshake refused: {}", error)
            }
            PluginFault::MessageParseError { error } => {
                write!(f, "Message parse error: {}", error)
            }
        }
    }
}

impl std::error::Error for PluginFault {}

/// Message envelope for all wire communications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope<T> {
    pub protocol_version: u32,
    pub timestamp: DateTime<Utc>,
    pub message: T,
}

impl<T> MessageEnvelope<T> {
    /// Create a new message envelope
    pub fn new(message: T) -> Self {
        Self {
            protocol_version: WIRE_PROTOCOL_VERSION,
            timestamp: Utc::now(),
            message,
        }
    }

    /// Check if protocol version is compatible
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == WIRE_PROTOCOL_VERSION
    }
}
