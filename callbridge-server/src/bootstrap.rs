use crate::context::ExecutionContext;
use crate::request::IncomingRequest;
use crate::signal::completion_signal;
use crate::target::{BridgeTarget, FatalSlot};
use async_trait::async_trait;
use callbridge_core::{EventResult, RpcError};
use callbridge_transport::{BootstrapListener, CapabilityPublisher};
use std::sync::Arc;
use tracing::debug;

/// Services one bootstrap event: publishes a fresh capability bound to the
/// incoming request, then suspends until the first call finishes and the
/// request drains. The outcome record carries no payload; results travel
/// over the capability's own call channel.
pub async fn run(
    incoming: Arc<IncomingRequest>,
    entrypoint: Option<String>,
    publisher: CapabilityPublisher,
) -> Result<EventResult, RpcError> {
    incoming.delivered()?;

    let (guard, signal) = completion_signal();
    let fatal = FatalSlot::default();
    let target = Arc::new(BridgeTarget::new(
        incoming.context(),
        entrypoint,
        guard,
        incoming.completion_flag(),
        Arc::clone(&fatal),
    ));
    publisher.publish(target)?;
    debug!(id = %incoming.id(), "bootstrap capability published, awaiting call");

    // Unblocks once the first call finishes servicing, whatever its outcome.
    signal.wait().await;
    incoming.drain().await;

    let fatal = fatal.lock().unwrap_or_else(|e| e.into_inner()).take();
    match fatal {
        Some(err) => Err(err),
        None => Ok(EventResult::ok()),
    }
}

/// Callee-side host: admits one fresh incoming request per bootstrap event
/// against its execution context.
#[derive(Debug)]
pub struct WorkerHost {
    ctx: Arc<ExecutionContext>,
    entrypoint: Option<String>,
}

impl WorkerHost {
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        WorkerHost {
            ctx,
            entrypoint: None,
        }
    }

    pub fn with_entrypoint(ctx: Arc<ExecutionContext>, entrypoint: impl Into<String>) -> Self {
        WorkerHost {
            ctx,
            entrypoint: Some(entrypoint.into()),
        }
    }

    pub fn context(&self) -> Arc<ExecutionContext> {
        Arc::clone(&self.ctx)
    }
}

#[async_trait]
impl BootstrapListener for WorkerHost {
    async fn handle_bootstrap(
        &self,
        publisher: CapabilityPublisher,
    ) -> Result<EventResult, RpcError> {
        let incoming = Arc::new(IncomingRequest::new(Arc::clone(&self.ctx)));
        run(incoming, self.entrypoint.clone(), publisher).await
    }
}
