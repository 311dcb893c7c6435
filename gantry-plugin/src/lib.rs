//! Plugin slot proxies for Gantry
//!
//! This crate binds named, versioned extension points ("slots") of the
//! slicing engine to out-of-process plugins reached over an RPC channel.
//! A [`PluginProxy`] performs a single handshake and compatibility check at
//! construction and thereafter presents each slot call as a plain blocking
//! call, even though the underlying channel is asynchronous.

pub mod context;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod handshake;
pub mod metadata;
pub mod proxy;
pub mod slots;
pub mod types;
pub mod validator;

// Re-export main types
pub use context::{CallContext, DEFAULT_CALL_TIMEOUT};
pub use convert::{RequestConverter, ResponseConverter};
pub use error::{PluginError, PluginResult};
pub use handshake::HandshakeState;
pub use metadata::{PluginDescriptor, SlotDescriptor};
pub use proxy::{PluginProxy, ProxyOptions};
pub use types::VersionRequirement;
pub use validator::{
    AcceptAll, SlotValidator, SlotVersionValidator, SubscriptionValidator, ValidationOutcome,
};

// Re-export the wire-level types callers need to wire up a proxy without
// depending on gantry-ipc directly
pub use gantry_ipc::{PluginChannel, SlotId};
