pub mod codec;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod limits;

pub use codec::{ValueCodec, CODEC_VERSION};
pub use envelope::{CallRequest, CallResponse, EventOutcome, EventResult};
pub use error::{ErrorCode, RpcError};
pub use ids::{RequestId, RequestIdAllocator};
pub use limits::{ensure_within_limit, MAX_RPC_MESSAGE_SIZE};

use async_trait::async_trait;

/// The one operation a remote-call capability exposes.
///
/// A target is bound at creation to exactly one execution context and
/// entrypoint; it becomes unusable once its owning incoming request
/// completes.
#[async_trait]
pub trait CallTarget: Send + Sync {
    async fn call(&self, request: CallRequest) -> Result<CallResponse, RpcError>;
}
