//! Plugin proxy: the synchronous call surface over an async channel
//!
//! A proxy is constructed with `connect`, which runs the handshake and the
//! compatibility policy before the value exists; a proxy that failed to
//! construct never escapes. Every subsequent call runs one encode → RPC →
//! decode cycle to completion on a throwaway single-threaded runtime, so the
//! calling thread observes a plain blocking call.

use std::sync::Arc;
use std::time::Duration;

use gantry_ipc::PluginChannel;

use crate::context::{CallContext, DEFAULT_CALL_TIMEOUT};
use crate::convert::{RequestConverter, ResponseConverter};
use crate::error::{PluginError, PluginResult};
use crate::handshake::Handshake;
use crate::metadata::{PluginDescriptor, SlotDescriptor};
use crate::validator::{SlotValidator, ValidationOutcome};

/// Timeouts applied by a proxy
#[derive(Debug, Clone, Copy)]
pub struct ProxyOptions {
    /// Deadline for the one-time handshake
    pub handshake_timeout: Duration,
    /// Default deadline for slot calls; overridable per call
    pub call_timeout: Duration,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_CALL_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl From<&gantry_config::PluginsConfig> for ProxyOptions {
    fn from(config: &gantry_config::PluginsConfig) -> Self {
        Self {
            handshake_timeout: config.handshake_timeout,
            call_timeout: config.call_timeout,
        }
    }
}

/// Engine-side proxy for one slot bound to one plugin connection.
///
/// Clones share the underlying channel and the already-established validated
/// identity; cloning never re-runs the handshake.
#[derive(Clone)]
pub struct PluginProxy<Req, Rsp>
where
    Req: RequestConverter,
    Rsp: ResponseConverter,
{
    slot: SlotDescriptor,
    plugin: PluginDescriptor,
    outcome: ValidationOutcome,
    request: Req,
    response: Rsp,
    channel: Arc<dyn PluginChannel>,
    options: ProxyOptions,
}

impl<Req, Rsp> PluginProxy<Req, Rsp>
where
    Req: RequestConverter,
    Rsp: ResponseConverter,
{
    /// Open the slot: run the handshake and compatibility check, with default
    /// timeouts.
    pub fn connect<V: SlotValidator + ?Sized>(
        channel: Arc<dyn PluginChannel>,
        slot: SlotDescriptor,
        validator: &V,
        request: Req,
        response: Rsp,
    ) -> PluginResult<Self> {
        Self::connect_with_options(channel, slot, validator, request, response, ProxyOptions::default())
    }

    /// Open the slot with explicit timeouts.
    ///
    /// This is the only place the handshake state machine runs; it performs
    /// exactly one round trip, and the validator is evaluated exactly once.
    pub fn connect_with_options<V: SlotValidator + ?Sized>(
        channel: Arc<dyn PluginChannel>,
        slot: SlotDescriptor,
        validator: &V,
        request: Req,
        response: Rsp,
        options: ProxyOptions,
    ) -> PluginResult<Self> {
        let runtime = current_thread_runtime()?;
        let context = CallContext::with_timeout(slot.engine_uuid, options.handshake_timeout);

        let mut handshake = Handshake::new();
        let (plugin, outcome) =
            runtime.block_on(handshake.run(channel.as_ref(), &slot, validator, &context))?;
        debug_assert!(handshake.state().is_terminal());

        Ok(Self {
            slot,
            plugin,
            outcome,
            request,
            response,
            channel,
            options,
        })
    }

    /// The slot this proxy serves
    pub fn slot(&self) -> &SlotDescriptor {
        &self.slot
    }

    /// Identity of the plugin behind this proxy
    pub fn plugin(&self) -> &PluginDescriptor {
        &self.plugin
    }

    /// The cached verdict from construction time; always positive for a live
    /// proxy
    pub fn validation(&self) -> &ValidationOutcome {
        &self.outcome
    }

    /// Execute one slot call with the proxy's default deadline
    pub fn call(&self, args: &Req::Args) -> PluginResult<Rsp::Output> {
        self.call_with_timeout(args, self.options.call_timeout)
    }

    /// Execute one slot call with a caller-chosen deadline.
    ///
    /// Blocks the calling thread until the round trip completes or the
    /// deadline elapses; either a fully decoded value comes back or an error,
    /// never a partial result.
    pub fn call_with_timeout(&self, args: &Req::Args, timeout: Duration) -> PluginResult<Rsp::Output> {
        let runtime = current_thread_runtime()?;
        runtime.block_on(self.dispatch(args, timeout))
    }

    async fn dispatch(&self, args: &Req::Args, timeout: Duration) -> PluginResult<Rsp::Output> {
        let context = CallContext::with_timeout(self.slot.engine_uuid, timeout);
        let payload = self.request.encode(args)?;

        tracing::debug!(
            target: "plugin",
            slot = %self.slot.slot_id,
            plugin = %self.plugin,
            timeout_ms = timeout.as_millis() as u64,
            "slot call"
        );

        let metadata = context.metadata();
        let rpc = self
            .channel
            .call(self.slot.slot_id, payload, &metadata);
        let payload = match tokio::time::timeout(context.remaining(), rpc).await {
            Err(_elapsed) => {
                return Err(self.remote_error(format!("deadline of {:?} exceeded", timeout)));
            }
            // TODO: handle different kinds of transport status; for now every
            // non-OK outcome maps uniformly to a remote failure.
            Ok(Err(e)) => return Err(self.remote_error(e.to_string())),
            Ok(Ok(payload)) => payload,
        };

        self.response
            .decode(payload)
            .map_err(|e| self.remote_error(format!("malformed response payload: {}", e)))
    }

    fn remote_error(&self, message: String) -> PluginError {
        PluginError::Remote {
            slot: self.slot.clone(),
            plugin: Some(self.plugin.clone()),
            message,
        }
    }
}

/// Throwaway executor hosting exactly one round trip.
///
/// Each handshake and each call gets a fresh single-threaded runtime that is
/// dropped as soon as the round trip resolves; nothing else ever interleaves
/// inside it.
fn current_thread_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VersionRequirement;
    use crate::validator::SlotVersionValidator;
    use async_trait::async_trait;
    use gantry_ipc::{CallMetadata, HandshakeReply, HandshakeRequest, IpcError, SlotId};
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Mock plugin that answers handshakes and doubles the `value` field of
    /// every slot call
    struct DoublingChannel {
        handshakes: AtomicUsize,
        calls: AtomicUsize,
    }

    impl DoublingChannel {
        fn new() -> Self {
            Self {
                handshakes: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PluginChannel for DoublingChannel {
        fn peer(&self) -> String {
            "ipc://doubling".to_string()
        }

        async fn handshake(
            &self,
            _request: HandshakeRequest,
            _metadata: &CallMetadata,
        ) -> Result<HandshakeReply, IpcError> {
            self.handshakes.fetch_add(1, Ordering::SeqCst);
            Ok(HandshakeReply {
                slot_version: "1.2.0".to_string(),
                plugin_name: "Doubler".to_string(),
                plugin_version: "1.2.0".to_string(),
                broadcast_subscriptions: Default::default(),
            })
        }

        async fn call(
            &self,
            _slot_id: SlotId,
            payload: JsonValue,
            _metadata: &CallMetadata,
        ) -> Result<JsonValue, IpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = payload["value"].as_i64().unwrap_or(0);
            Ok(json!({ "value": value * 2 }))
        }
    }

    #[derive(Clone, Copy, Default)]
    struct NumberRequest;

    impl RequestConverter for NumberRequest {
        type Args = i64;

        fn encode(&self, args: &Self::Args) -> Result<JsonValue, serde_json::Error> {
            Ok(json!({ "value": args }))
        }
    }

    #[derive(Clone, Copy, Default)]
    struct NumberResponse;

    impl ResponseConverter for NumberResponse {
        type Output = i64;

        fn decode(&self, payload: JsonValue) -> Result<Self::Output, serde_json::Error> {
            serde_json::from_value(payload["value"].clone())
        }
    }

    fn slot() -> SlotDescriptor {
        SlotDescriptor::new(
            SlotId::InfillGenerate,
            VersionRequirement::new("^1.0").unwrap(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_call_executes_encode_rpc_decode() {
        let channel = Arc::new(DoublingChannel::new());
        let proxy = PluginProxy::connect(
            channel.clone(),
            slot(),
            &SlotVersionValidator,
            NumberRequest,
            NumberResponse,
        )
        .unwrap();

        assert_eq!(proxy.call(&5).unwrap(), 10);
        assert_eq!(proxy.call(&21).unwrap(), 42);
        assert_eq!(channel.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clone_shares_handshake_and_channel() {
        let channel = Arc::new(DoublingChannel::new());
        let proxy = PluginProxy::connect(
            channel.clone(),
            slot(),
            &SlotVersionValidator,
            NumberRequest,
            NumberResponse,
        )
        .unwrap();

        let clone = proxy.clone();
        assert_eq!(clone.call(&3).unwrap(), 6);
        assert_eq!(proxy.call(&4).unwrap(), 8);

        // One handshake total, regardless of clones and calls
        assert_eq!(channel.handshakes.load(Ordering::SeqCst), 1);
        assert_eq!(clone.plugin(), proxy.plugin());
    }

    #[test]
    fn test_options_from_config() {
        let config = gantry_config::PluginsConfig::default();
        let options = ProxyOptions::from(&config);
        assert_eq!(options.handshake_timeout, Duration::from_millis(500));
        assert_eq!(options.call_timeout, Duration::from_millis(500));
    }
}
