use crate::context::ExecutionContext;
use callbridge_core::{RequestId, RequestIdAllocator, RpcError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

static REQUEST_IDS: RequestIdAllocator = RequestIdAllocator::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    PendingDelivery,
    Delivered,
    Draining,
    Complete,
}

/// One admitted unit of work inside an execution context.
///
/// Delivery happens exactly once; resources are not released until drain
/// completes, and any capability bound to this request becomes unusable
/// the instant the request reaches `Complete`.
pub struct IncomingRequest {
    id: RequestId,
    ctx: Arc<ExecutionContext>,
    state: Mutex<RequestState>,
    completed: Arc<AtomicBool>,
}

impl IncomingRequest {
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        IncomingRequest {
            id: REQUEST_IDS.allocate(),
            ctx,
            state: Mutex::new(RequestState::PendingDelivery),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn context(&self) -> Arc<ExecutionContext> {
        Arc::clone(&self.ctx)
    }

    pub fn state(&self) -> RequestState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks the request delivered. Entered exactly once; a second call is
    /// a protocol violation.
    pub fn delivered(&self) -> Result<(), RpcError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            RequestState::PendingDelivery => {
                *state = RequestState::Delivered;
                debug!(id = %self.id, "incoming request delivered");
                Ok(())
            }
            other => Err(RpcError::internal(format!(
                "request {} delivered twice (state {:?})",
                self.id, other
            ))),
        }
    }

    /// Drains the request: waits out the in-flight unit of work, then
    /// transitions to `Complete` and flips the shared completion flag.
    pub async fn drain(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == RequestState::Complete {
                return;
            }
            *state = RequestState::Draining;
        }
        debug!(id = %self.id, "draining incoming request");
        self.ctx.quiesce().await;
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = RequestState::Complete;
        }
        self.completed.store(true, Ordering::SeqCst);
        debug!(id = %self.id, "incoming request complete");
    }

    /// Shared flag a capability consults to detect that its owning request
    /// has completed.
    pub fn completion_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.completed)
    }
}

impl std::fmt::Debug for IncomingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingRequest")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
