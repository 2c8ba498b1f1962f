use crate::dispatcher::{BootstrapEvent, BootstrapListener, CapabilityPublisher, EventDispatcher};
use async_trait::async_trait;
use callbridge_core::RpcError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// In-process dispatcher: drives a `BootstrapListener` on a spawned task
/// and hands the published capability straight back to the caller.
///
/// Every `send_bootstrap` is counted, so tests can assert that a request
/// which fails locally caused zero transport activity.
pub struct LocalDispatcher {
    listener: Arc<dyn BootstrapListener>,
    sends: AtomicUsize,
}

impl LocalDispatcher {
    pub fn new(listener: Arc<dyn BootstrapListener>) -> Self {
        LocalDispatcher {
            listener,
            sends: AtomicUsize::new(0),
        }
    }

    /// Number of bootstrap events sent through this dispatcher.
    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for LocalDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDispatcher")
            .field("sends", &self.send_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventDispatcher for LocalDispatcher {
    async fn send_bootstrap(&self) -> Result<BootstrapEvent, RpcError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        debug!("sending bootstrap event");

        let (cap_tx, cap_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let listener = Arc::clone(&self.listener);
        tokio::spawn(async move {
            let result = listener
                .handle_bootstrap(CapabilityPublisher::new(cap_tx))
                .await;
            if let Err(err) = &result {
                warn!(%err, "bootstrap event failed");
            }
            // The caller may have gone away already; nothing left to do.
            let _ = done_tx.send(result);
        });

        let capability = match cap_rx.await {
            Ok(capability) => capability,
            Err(_) => {
                // The listener finished without publishing. Surface its own
                // error rather than a generic channel failure.
                return Err(match done_rx.await {
                    Ok(Err(err)) => err,
                    Ok(Ok(_)) => RpcError::transport_failure(
                        "bootstrap event completed without publishing a capability",
                    ),
                    Err(_) => RpcError::transport_failure("bootstrap event dropped"),
                });
            }
        };

        debug!("bootstrap capability published");
        Ok(BootstrapEvent {
            capability,
            completion: done_rx,
        })
    }
}
