pub mod bootstrap;
pub mod context;
pub mod handler;
pub mod logging;
pub mod request;
pub mod signal;
pub mod target;

pub use bootstrap::WorkerHost;
pub use context::ExecutionContext;
pub use handler::{ExportedHandler, MethodHandler, MethodResult};
pub use logging::{init_logging, init_test_logging};
pub use request::{IncomingRequest, RequestState};
pub use signal::{completion_signal, CompletionGuard, CompletionSignal};
pub use target::{is_reserved_method, BridgeTarget, FatalSlot, RESERVED_METHODS};
