//! Handshake state machine binding a slot to a plugin
//!
//! The handshake runs exactly once, at proxy construction, and performs
//! exactly one round trip. `Accepted` and `Rejected` are terminal; a
//! rejected handshake leaves nothing usable behind.

use gantry_ipc::{HandshakeRequest, PluginChannel};

use crate::context::CallContext;
use crate::error::{PluginError, PluginResult};
use crate::metadata::{PluginDescriptor, SlotDescriptor};
use crate::validator::{SlotValidator, ValidationOutcome};

/// States of the handshake exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No request sent yet
    Unstarted,
    /// Request sent, reply outstanding
    AwaitingResponse,
    /// Reply decoded and the validator accepted the plugin
    Accepted,
    /// Transport failure, or the validator turned the plugin down
    Rejected,
}

impl HandshakeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Accepted | HandshakeState::Rejected)
    }
}

/// One-shot handshake execution
pub(crate) struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    pub(crate) fn new() -> Self {
        Self {
            state: HandshakeState::Unstarted,
        }
    }

    pub(crate) fn state(&self) -> HandshakeState {
        self.state
    }

    /// Send the handshake request, decode the reply, and evaluate the
    /// compatibility policy. The validator runs at most once.
    pub(crate) async fn run<V>(
        &mut self,
        channel: &dyn PluginChannel,
        slot: &SlotDescriptor,
        validator: &V,
        context: &CallContext,
    ) -> PluginResult<(PluginDescriptor, ValidationOutcome)>
    where
        V: SlotValidator + ?Sized,
    {
        debug_assert_eq!(self.state, HandshakeState::Unstarted);

        let request = HandshakeRequest {
            slot_id: slot.slot_id,
            version_range: slot.version_range.to_string(),
            engine_uuid: slot.engine_uuid.to_string(),
        };

        self.state = HandshakeState::AwaitingResponse;
        let metadata = context.metadata();
        let exchange = channel.handshake(request, &metadata);
        let reply = match tokio::time::timeout(context.remaining(), exchange).await {
            Err(_elapsed) => {
                self.state = HandshakeState::Rejected;
                return Err(PluginError::Remote {
                    slot: slot.clone(),
                    plugin: None,
                    message: format!("handshake deadline of {:?} exceeded", context.timeout()),
                });
            }
            Ok(Err(e)) => {
                // Transport failed before a reply was decoded, so no plugin
                // identity can be attached.
                self.state = HandshakeState::Rejected;
                return Err(PluginError::Remote {
                    slot: slot.clone(),
                    plugin: None,
                    message: e.to_string(),
                });
            }
            Ok(Ok(reply)) => reply,
        };

        let plugin = PluginDescriptor::from_reply(reply, channel.peer());
        let outcome = validator.validate(slot, &plugin);

        if outcome.is_accepted() {
            self.state = HandshakeState::Accepted;
            tracing::info!(
                target: "plugin",
                plugin = %plugin,
                slot = %slot.slot_id,
                "Using plugin"
            );
            Ok((plugin, outcome))
        } else {
            self.state = HandshakeState::Rejected;
            Err(PluginError::Rejected {
                slot: slot.clone(),
                plugin,
                outcome,
            })
        }
    }
}
