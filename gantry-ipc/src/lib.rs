//! Inter-process communication for Gantry
//!
//! This crate provides the wire protocol and transport abstractions used for
//! communication between the slicing engine and plugin processes. The engine
//! side only ever talks to a plugin through the [`PluginChannel`] trait; the
//! channel itself is created and owned by whoever spawns the plugin process.

pub mod channel;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-export commonly used types
pub use channel::{PluginChannel, TransportChannel};
pub use error::IpcError;
pub use protocol::{
    CallMetadata, EngineMessage, HandshakeRequest, HandshakeReply, MessageEnvelope, PluginFault,
    PluginMessage, SlotId, WIRE_PROTOCOL_VERSION,
};
pub use transport::{IpcTransport, StreamTransport};
