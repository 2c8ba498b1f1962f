pub mod initiator;
pub mod stubs;

pub use initiator::CallInitiator;
pub use stubs::{MethodStub, WorkerStub};
