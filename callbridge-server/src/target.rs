use crate::context::ExecutionContext;
use crate::signal::CompletionGuard;
use async_trait::async_trait;
use callbridge_core::{
    ensure_within_limit, CallRequest, CallResponse, CallTarget, RpcError, ValueCodec,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Entrypoint names reserved by the platform; never remotely callable
/// through this path, even when the handler exports an own function of the
/// same name.
pub const RESERVED_METHODS: [&str; 6] = [
    "fetch",
    "connect",
    "alarm",
    "webSocketMessage",
    "webSocketClose",
    "webSocketError",
];

pub fn is_reserved_method(name: &str) -> bool {
    RESERVED_METHODS.contains(&name)
}

/// Shared slot the bootstrap run loop inspects after draining: an error
/// recorded here fails the whole event, not just one call.
pub type FatalSlot = Arc<Mutex<Option<RpcError>>>;

/// The capability that services remote method calls for one bound
/// (execution context, entrypoint, completion signal) triple.
pub struct BridgeTarget {
    ctx: Arc<ExecutionContext>,
    entrypoint: Option<String>,
    completion: Mutex<Option<CompletionGuard>>,
    revoked: Arc<AtomicBool>,
    fatal: FatalSlot,
    codec: ValueCodec,
}

impl BridgeTarget {
    /// Normally constructed by `bootstrap::run`; public so lifecycle tests
    /// can drive a target directly.
    pub fn new(
        ctx: Arc<ExecutionContext>,
        entrypoint: Option<String>,
        completion: CompletionGuard,
        revoked: Arc<AtomicBool>,
        fatal: FatalSlot,
    ) -> Self {
        BridgeTarget {
            ctx,
            entrypoint,
            completion: Mutex::new(Some(completion)),
            revoked,
            fatal,
            codec: ValueCodec::new(),
        }
    }

    fn decode_args(&self, blob: &[u8]) -> Result<Vec<Value>, RpcError> {
        match self.codec.deserialize(blob)? {
            Value::Array(items) => Ok(items),
            other => Err(RpcError::malformed_arguments(format!(
                "expected an array of arguments, got {}",
                json_type_name(&other)
            ))),
        }
    }

    async fn dispatch(&self, request: &CallRequest) -> Result<CallResponse, RpcError> {
        if self.revoked.load(Ordering::SeqCst) {
            return Err(RpcError::capability_revoked(
                "the owning incoming request has completed",
            ));
        }

        if !self.ctx.rpc_enabled() {
            return Err(RpcError::permission_denied(
                "The receiving worker does not allow its methods to be called over RPC.",
            ));
        }

        let handler = match self.ctx.exported_handler(self.entrypoint.as_deref()) {
            Some(handler) => handler,
            None => {
                let err = RpcError::handler_not_found(format!(
                    "no exported handler for entrypoint {:?}",
                    self.entrypoint
                ));
                // Structurally broken request: fail the owning event too.
                let mut fatal = self.fatal.lock().unwrap_or_else(|e| e.into_inner());
                fatal.get_or_insert_with(|| err.clone());
                return Err(err);
            }
        };

        let name = request.method_name.as_str();
        let method = handler.own_method(name).ok_or_else(|| {
            RpcError::method_not_implemented(format!(
                "The RPC receiver does not implement the method \"{}\".",
                name
            ))
        })?;

        if is_reserved_method(name) {
            return Err(RpcError::reserved_method(format!(
                "'{}' is a reserved method and cannot be called over RPC.",
                name
            )));
        }

        let args = match &request.args_blob {
            Some(blob) if !blob.is_empty() => self.decode_args(blob)?,
            _ => Vec::new(),
        };

        debug!(method = name, argc = args.len(), "dispatching RPC method");
        let value = method(args).await?;

        let result_blob = self.codec.serialize(&value)?;
        ensure_within_limit("response", result_blob.len())?;
        Ok(CallResponse::new(result_blob))
    }
}

#[async_trait]
impl CallTarget for BridgeTarget {
    async fn call(&self, request: CallRequest) -> Result<CallResponse, RpcError> {
        // Taken into this frame so the signal fires on every exit path of
        // the call, including cancellation; later calls find it already
        // fulfilled.
        let _completion = self
            .completion
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let result = self.ctx.run(self.dispatch(&request)).await;
        if let Err(err) = &result {
            warn!(method = %request.method_name, %err, "RPC call failed");
        }
        result
    }
}

impl std::fmt::Debug for BridgeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeTarget")
            .field("entrypoint", &self.entrypoint)
            .field("revoked", &self.revoked.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ExportedHandler;
    use crate::signal::completion_signal;
    use callbridge_core::{ErrorCode, MAX_RPC_MESSAGE_SIZE};
    use serde_json::json;

    fn target_for(ctx: Arc<ExecutionContext>, entrypoint: Option<&str>) -> BridgeTarget {
        let (guard, _signal) = completion_signal();
        BridgeTarget::new(
            ctx,
            entrypoint.map(str::to_string),
            guard,
            Arc::new(AtomicBool::new(false)),
            FatalSlot::default(),
        )
    }

    fn ctx_with(handler: ExportedHandler) -> Arc<ExecutionContext> {
        let ctx = Arc::new(ExecutionContext::new(true));
        ctx.export_handler(None, Arc::new(handler));
        ctx
    }

    fn encode_args(args: Value) -> Option<bytes::Bytes> {
        Some(ValueCodec::new().serialize(&args).unwrap())
    }

    #[tokio::test]
    async fn test_own_method_succeeds() {
        let ctx = ctx_with(ExportedHandler::new().method("add", |args| {
            let a = args[0].as_i64().unwrap_or(0);
            let b = args[1].as_i64().unwrap_or(0);
            Ok(json!(a + b))
        }));
        let target = target_for(ctx, None);

        let resp = target
            .call(CallRequest::new("add", encode_args(json!([1, 2]))))
            .await
            .unwrap();
        let value = ValueCodec::new().deserialize(&resp.result_blob).unwrap();
        assert_eq!(value, json!(3));
    }

    #[tokio::test]
    async fn test_zero_argument_call() {
        let ctx = ctx_with(ExportedHandler::new().method("ping", |args| {
            assert!(args.is_empty());
            Ok(json!("pong"))
        }));
        let target = target_for(ctx, None);

        let resp = target.call(CallRequest::new("ping", None)).await.unwrap();
        let value = ValueCodec::new().deserialize(&resp.result_blob).unwrap();
        assert_eq!(value, json!("pong"));
    }

    #[tokio::test]
    async fn test_rpc_disabled_is_permission_denied() {
        let ctx = Arc::new(ExecutionContext::new(false));
        ctx.export_handler(None, Arc::new(ExportedHandler::new().method("add", |_| Ok(json!(0)))));
        let target = target_for(ctx, None);

        let err = target.call(CallRequest::new("add", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_missing_handler_is_fatal() {
        let ctx = Arc::new(ExecutionContext::new(true));
        let (guard, _signal) = completion_signal();
        let fatal = FatalSlot::default();
        let target = BridgeTarget::new(
            ctx,
            Some("missing".to_string()),
            guard,
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&fatal),
        );

        let err = target.call(CallRequest::new("add", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::HandlerNotFound);
        assert!(err.is_fatal());
        assert_eq!(fatal.lock().unwrap().as_ref().unwrap().code, ErrorCode::HandlerNotFound);
    }

    #[tokio::test]
    async fn test_unknown_method_not_implemented() {
        let ctx = ctx_with(ExportedHandler::new().method("add", |_| Ok(json!(0))));
        let target = target_for(ctx, None);

        let err = target
            .call(CallRequest::new("subtract", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotImplemented);
        assert!(err.message.contains("subtract"));
    }

    #[tokio::test]
    async fn test_prototype_method_not_implemented() {
        let proto = Arc::new(ExportedHandler::new().method("inherited", |_| Ok(json!(1))));
        let ctx = ctx_with(ExportedHandler::new().with_prototype(proto));
        let target = target_for(ctx, None);

        let err = target
            .call(CallRequest::new("inherited", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotImplemented);
    }

    #[tokio::test]
    async fn test_reserved_method_rejected_even_when_own() {
        for name in RESERVED_METHODS {
            let ctx = ctx_with(ExportedHandler::new().method(name, |_| Ok(json!("never"))));
            let target = target_for(ctx, None);

            let err = target.call(CallRequest::new(name, None)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ReservedMethod, "method {}", name);
        }
    }

    #[tokio::test]
    async fn test_non_array_args_malformed() {
        let ctx = ctx_with(ExportedHandler::new().method("add", |_| Ok(json!(0))));
        let target = target_for(ctx, None);

        let err = target
            .call(CallRequest::new("add", encode_args(json!({"a": 1}))))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedArguments);
        assert!(err.message.contains("an object"));
    }

    #[tokio::test]
    async fn test_undecodable_args_malformed() {
        let ctx = ctx_with(ExportedHandler::new().method("add", |_| Ok(json!(0))));
        let target = target_for(ctx, None);

        let err = target
            .call(CallRequest::new(
                "add",
                Some(bytes::Bytes::from_static(&[0xFF, 0xFF, 0xFF])),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedArguments);
    }

    #[tokio::test]
    async fn test_oversized_response_rejected_not_truncated() {
        let ctx = ctx_with(ExportedHandler::new().method("huge", |_| {
            Ok(json!("x".repeat(MAX_RPC_MESSAGE_SIZE)))
        }));
        let target = target_for(ctx, None);

        let err = target.call(CallRequest::new("huge", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MessageTooLarge);
        assert!(err.message.contains("response"));
    }

    #[tokio::test]
    async fn test_revoked_capability_rejects_calls() {
        let ctx = ctx_with(ExportedHandler::new().method("add", |_| Ok(json!(0))));
        let (guard, _signal) = completion_signal();
        let revoked = Arc::new(AtomicBool::new(true));
        let target = BridgeTarget::new(ctx, None, guard, revoked, FatalSlot::default());

        let err = target.call(CallRequest::new("add", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CapabilityRevoked);
    }

    #[tokio::test]
    async fn test_handler_error_leaves_capability_usable() {
        let ctx = ctx_with(
            ExportedHandler::new()
                .method("boom", |_| Err(RpcError::internal("handler failure")))
                .method("ok", |_| Ok(json!(true))),
        );
        let target = target_for(ctx, None);

        let err = target.call(CallRequest::new("boom", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);

        // The error rejected only that call; the target still services more.
        let resp = target.call(CallRequest::new("ok", None)).await.unwrap();
        let value = ValueCodec::new().deserialize(&resp.result_blob).unwrap();
        assert_eq!(value, json!(true));
    }
}
