//! Plugin channel abstraction used by the engine-side proxy
//!
//! A channel is the shared handle through which one plugin process is
//! reached. The proxy never creates channels; it borrows one supplied by the
//! host and issues single request/response round trips against it.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::IpcError;
use crate::protocol::{
    CallMetadata, EngineMessage, HandshakeReply, HandshakeRequest, MessageEnvelope, PluginMessage,
    SlotId,
};
use crate::transport::IpcTransport;

/// Engine-side view of a connection to one plugin process.
///
/// Implementations must tolerate concurrent use from multiple callers; the
/// proxy issues each round trip independently.
#[async_trait]
pub trait PluginChannel: Send + Sync {
    /// Address of the plugin process behind this channel, for diagnostics
    fn peer(&self) -> String;

    /// Perform the identity/compatibility exchange for one slot
    async fn handshake(
        &self,
        request: HandshakeRequest,
        metadata: &CallMetadata,
    ) -> Result<HandshakeReply, IpcError>;

    /// Perform one functional slot call
    async fn call(
        &self,
        slot_id: SlotId,
        payload: JsonValue,
        metadata: &CallMetadata,
    ) -> Result<JsonValue, IpcError>;
}

/// A [`PluginChannel`] running correlated round trips over an [`IpcTransport`].
///
/// The transport carries one request at a time; the mutex serializes round
/// trips so replies always match the request that is currently in flight.
///
/// A caller abandoning a round trip mid-flight (a deadline expiry drops the
/// future) can leave the plugin's late reply buffered in the stream. The next
/// round trip discards any reply whose correlation id is not the one it is
/// waiting for, so a stale answer never satisfies or poisons a later request.
pub struct TransportChannel<T: IpcTransport> {
    peer: String,
    transport: Mutex<T>,
}

impl<T: IpcTransport> TransportChannel<T> {
    /// Create a channel over an established transport
    pub fn new(peer: impl Into<String>, transport: T) -> Self {
        Self {
            peer: peer.into(),
            transport: Mutex::new(transport),
        }
    }

    async fn round_trip(
        &self,
        message: EngineMessage,
        correlation_id: Uuid,
    ) -> Result<PluginMessage, IpcError> {
        let mut transport = self.transport.lock().await;
        transport.send(&MessageEnvelope::new(message)).await?;

        loop {
            let envelope: MessageEnvelope<PluginMessage> = transport.receive().await?;
            match message_correlation(&envelope.message) {
                Some(id) if id != correlation_id => {
                    // Late answer to a request abandoned after its deadline
                    log::warn!(
                        "discarding stale reply from {} (correlation {}, awaiting {})",
                        self.peer,
                        id,
                        correlation_id
                    );
                }
                _ => return Ok(envelope.message),
            }
        }
    }
}

/// Correlation id carried by a plugin message; a fault without one applies to
/// whatever request is currently in flight
fn message_correlation(message: &PluginMessage) -> Option<Uuid> {
    match message {
        PluginMessage::HandshakeReply { correlation_id, .. } => Some(*correlation_id),
        PluginMessage::SlotResult { correlation_id, .. } => Some(*correlation_id),
        PluginMessage::Fault { correlation_id, .. } => *correlation_id,
    }
}

#[async_trait]
impl<T: IpcTransport> PluginChannel for TransportChannel<T> {
    fn peer(&self) -> String {
        self.peer.clone()
    }

    async fn handshake(
        &self,
        request: HandshakeRequest,
        metadata: &CallMetadata,
    ) -> Result<HandshakeReply, IpcError> {
        let correlation_id = Uuid::new_v4();
        log::debug!(
            "handshake -> {} (slot {}, correlation {})",
            self.peer,
            request.slot_id,
            correlation_id
        );

        let message = EngineMessage::Handshake {
            request,
            metadata: metadata.clone(),
            correlation_id,
        };

        match self.round_trip(message, correlation_id).await? {
            PluginMessage::HandshakeReply { reply, .. } => Ok(reply),
            PluginMessage::Fault { fault, .. } => Err(IpcError::PluginFault(fault)),
            other => Err(IpcError::UnexpectedMessage(format!(
                "expected handshake reply, got {:?}",
                other
            ))),
        }
    }

    async fn call(
        &self,
        slot_id: SlotId,
        payload: JsonValue,
        metadata: &CallMetadata,
    ) -> Result<JsonValue, IpcError> {
        let correlation_id = Uuid::new_v4();
        log::debug!(
            "slot call -> {} (slot {}, correlation {})",
            self.peer,
            slot_id,
            correlation_id
        );

        let message = EngineMessage::SlotCall {
            slot_id,
            payload,
            metadata: metadata.clone(),
            correlation_id,
        };

        match self.round_trip(message, correlation_id).await? {
            PluginMessage::SlotResult { payload, .. } => Ok(payload),
            PluginMessage::Fault { fault, .. } => Err(IpcError::PluginFault(fault)),
            other => Err(IpcError::UnexpectedMessage(format!(
                "expected slot result, got {:?}",
                other
            ))),
        }
    }
}
