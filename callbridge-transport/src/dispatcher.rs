use async_trait::async_trait;
use callbridge_core::{CallTarget, EventResult, RpcError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bootstrap channel closed")]
    ChannelClosed,
    #[error("capability already published for this bootstrap event")]
    AlreadyPublished,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        RpcError::transport_failure(err.to_string())
    }
}

/// What a successful bootstrap hands back to the caller: the provisioned
/// capability, plus the bootstrap event's own lifecycle future. The event
/// completes only after the remote side drains its incoming request, long
/// after the capability itself was published.
pub struct BootstrapEvent {
    pub capability: Arc<dyn CallTarget>,
    pub completion: oneshot::Receiver<Result<EventResult, RpcError>>,
}

impl std::fmt::Debug for BootstrapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapEvent").finish_non_exhaustive()
    }
}

/// Caller-side transport seam. `send_bootstrap` resolves once the remote
/// side creates and returns a capability, not once any call on it finishes.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn send_bootstrap(&self) -> Result<BootstrapEvent, RpcError>;
}

/// Single-use publish half handed to the callee per bootstrap event.
///
/// Exactly one capability is issued per event; the publisher consumes
/// itself on use.
pub struct CapabilityPublisher {
    tx: oneshot::Sender<Arc<dyn CallTarget>>,
}

impl std::fmt::Debug for CapabilityPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityPublisher").finish_non_exhaustive()
    }
}

impl CapabilityPublisher {
    pub fn new(tx: oneshot::Sender<Arc<dyn CallTarget>>) -> Self {
        CapabilityPublisher { tx }
    }

    pub fn publish(self, capability: Arc<dyn CallTarget>) -> Result<(), TransportError> {
        self.tx
            .send(capability)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Callee-side transport seam: invoked once per delivered bootstrap event.
#[async_trait]
pub trait BootstrapListener: Send + Sync {
    async fn handle_bootstrap(
        &self,
        publisher: CapabilityPublisher,
    ) -> Result<EventResult, RpcError>;
}
