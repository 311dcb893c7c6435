//! Newline-delimited JSON transport over async byte streams

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::IpcError;
use crate::protocol::{MessageEnvelope, WIRE_PROTOCOL_VERSION};

/// IPC transport trait for different communication mechanisms
#[async_trait]
pub trait IpcTransport: Send + Sync {
    /// Send a message to the other end
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError>;

    /// Receive a message from the other end
    async fn receive<T: for<'de> Deserialize<'de> + Send>(
        &mut self,
    ) -> Result<MessageEnvelope<T>, IpcError>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), IpcError>;
}

/// Transport framing envelopes as newline-delimited JSON over a byte stream pair.
///
/// Concrete instantiations cover the plugin side of a stdio pipe as well as the
/// engine side of a spawned plugin process; tests run it over `tokio::io::duplex`.
pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    /// Create a transport from a raw reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }
}

impl StreamTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over this process's stdin/stdout (the plugin side of the pipe)
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl StreamTransport<tokio::process::ChildStdout, tokio::process::ChildStdin> {
    /// Transport over a spawned plugin process's pipes (the engine side)
    pub fn child_process(
        stdout: tokio::process::ChildStdout,
        stdin: tokio::process::ChildStdin,
    ) -> Self {
        Self::new(stdout, stdin)
    }
}

#[async_trait]
impl<R, W> IpcTransport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError> {
        let json =
            serde_json::to_string(message).map_err(|e| IpcError::SerializationError(e.to_string()))?;
        log::trace!("ipc send: {}", json);

        // Send with newline delimiter
        let message_with_newline = format!("{}\n", json);
        self.writer
            .write_all(message_with_newline.as_bytes())
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;

        self.writer
            .flush()
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;

        Ok(())
    }

    async fn receive<T: for<'de> Deserialize<'de> + Send>(
        &mut self,
    ) -> Result<MessageEnvelope<T>, IpcError> {
        let mut line = String::new();

        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;

        if line.is_empty() {
            return Err(IpcError::ConnectionClosed);
        }

        // Remove newline
        line.truncate(line.trim_end().len());
        log::trace!("ipc receive: {}", line);

        let envelope: MessageEnvelope<T> = serde_json::from_str(&line)
            .map_err(|e| IpcError::DeserializationError(e.to_string()))?;

        // Check protocol version compatibility
        if envelope.protocol_version != WIRE_PROTOCOL_VERSION {
            return Err(IpcError::ProtocolVersionMismatch {
                expected: WIRE_PROTOCOL_VERSION,
                actual: envelope.protocol_version,
            });
        }

        Ok(envelope)
    }

    async fn close(&mut self) -> Result<(), IpcError> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EngineMessage, HandshakeRequest, CallMetadata, SlotId};
    use uuid::Uuid;

    fn handshake_message() -> EngineMessage {
        EngineMessage::Handshake {
            request: HandshakeRequest {
                slot_id: SlotId::SimplifyModify,
                version_range: "^1.0".to_string(),
                engine_uuid: "engine-1".to_string(),
            },
            metadata: CallMetadata {
                engine_uuid: "engine-1".to_string(),
                thread_id: "main".to_string(),
                deadline_ms: 500,
            },
            correlation_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_roundtrip_over_duplex() {
        let (engine_side, plugin_side) = tokio::io::duplex(4096);
        let (engine_read, engine_write) = tokio::io::split(engine_side);
        let (plugin_read, plugin_write) = tokio::io::split(plugin_side);

        let mut engine = StreamTransport::new(engine_read, engine_write);
        let mut plugin = StreamTransport::new(plugin_read, plugin_write);

        let envelope = MessageEnvelope::new(handshake_message());
        engine.send(&envelope).await.unwrap();

        let received: MessageEnvelope<EngineMessage> = plugin.receive().await.unwrap();
        assert!(received.is_compatible());
        match received.message {
            EngineMessage::Handshake { request, .. } => {
                assert_eq!(request.slot_id, SlotId::SimplifyModify);
                assert_eq!(request.version_range, "^1.0");
            }
            other => panic!("expected handshake, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_closed_stream_reported() {
        let (engine_side, plugin_side) = tokio::io::duplex(64);
        let (engine_read, engine_write) = tokio::io::split(engine_side);
        let mut engine = StreamTransport::new(engine_read, engine_write);

        drop(plugin_side);

        let result: Result<MessageEnvelope<EngineMessage>, _> = engine.receive().await;
        assert!(matches!(result, Err(IpcError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let (engine_side, plugin_side) = tokio::io::duplex(4096);
        let (engine_read, engine_write) = tokio::io::split(engine_side);
        let (_plugin_read, mut plugin_write) = tokio::io::split(plugin_side);

        let mut engine = StreamTransport::new(engine_read, engine_write);

        let mut envelope = MessageEnvelope::new(handshake_message());
        envelope.protocol_version = WIRE_PROTOCOL_VERSION + 1;
        let line = format!("{}\n", serde_json::to_string(&envelope).unwrap());
        plugin_write.write_all(line.as_bytes()).await.unwrap();
        plugin_write.flush().await.unwrap();

        let result: Result<MessageEnvelope<EngineMessage>, _> = engine.receive().await;
        assert!(matches!(
            result,
            Err(IpcError::ProtocolVersionMismatch { expected, actual })
                if expected == WIRE_PROTOCOL_VERSION && actual == WIRE_PROTOCOL_VERSION + 1
        ));
    }
}
