use callbridge_core::{ensure_within_limit, CallRequest, RpcError, ValueCodec};
use callbridge_transport::{BootstrapEvent, EventDispatcher};
use futures::future::{self, Either};
use futures::pin_mut;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Caller side of the bridge: turns a method name and arguments into a
/// serialize, send, await, deserialize round trip.
///
/// Each `invoke` obtains a fresh capability via a bootstrap event; the
/// capability is dropped after the call.
pub struct CallInitiator {
    dispatcher: Arc<dyn EventDispatcher>,
    codec: ValueCodec,
}

impl CallInitiator {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        CallInitiator {
            dispatcher,
            codec: ValueCodec::new(),
        }
    }

    pub async fn invoke(&self, method_name: &str, args: &[Value]) -> Result<Value, RpcError> {
        // Serialize and size-check before any send: an oversized request
        // fails here with zero transport activity.
        let args_blob = if args.is_empty() {
            None
        } else {
            let blob = self.codec.serialize(&Value::Array(args.to_vec()))?;
            ensure_within_limit("request", blob.len())?;
            Some(blob)
        };

        let BootstrapEvent {
            capability,
            completion,
        } = self.dispatcher.send_bootstrap().await?;
        debug!(method = method_name, "invoking remote method");

        let call = capability.call(CallRequest::new(method_name, args_blob));

        // The bootstrap event's success carries no useful value and must
        // never win this race; only the call result, or a bootstrap
        // failure, can settle it.
        let bootstrap_failure = async {
            match completion.await {
                Ok(Ok(_)) => future::pending::<RpcError>().await,
                Ok(Err(err)) => err,
                Err(_) => RpcError::transport_failure("bootstrap event dropped"),
            }
        };
        pin_mut!(call, bootstrap_failure);

        let response = match future::select(call, bootstrap_failure).await {
            Either::Left((result, _)) => result?,
            Either::Right((err, _)) => return Err(err),
        };

        trace!(method = method_name, bytes = response.result_blob.len(), "remote call resolved");
        self.codec.deserialize(&response.result_blob)
    }
}

impl std::fmt::Debug for CallInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallInitiator").finish_non_exhaustive()
    }
}
