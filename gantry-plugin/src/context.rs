//! Per-call metadata: deadline and identity tags

use gantry_ipc::CallMetadata;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default deadline for handshakes and slot calls
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(500);

/// Ephemeral per-invocation context.
///
/// Created fresh for every handshake and every slot call, and discarded as
/// soon as the call completes. Never shared between calls.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Instant,
    timeout: Duration,
    engine_uuid: Uuid,
    thread_id: String,
}

impl CallContext {
    /// Context with the default deadline
    pub fn new(engine_uuid: Uuid) -> Self {
        Self::with_timeout(engine_uuid, DEFAULT_CALL_TIMEOUT)
    }

    /// Context with a caller-chosen deadline
    pub fn with_timeout(engine_uuid: Uuid, timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            engine_uuid,
            thread_id: format!("{:?}", std::thread::current().id()),
        }
    }

    /// The timeout this context was created with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left until the deadline; zero once it has elapsed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Wire metadata tags for the request this context scopes
    pub fn metadata(&self) -> CallMetadata {
        CallMetadata {
            engine_uuid: self.engine_uuid.to_string(),
            thread_id: self.thread_id.clone(),
            deadline_ms: self.remaining().as_millis() as u64,
        }
    }
}
