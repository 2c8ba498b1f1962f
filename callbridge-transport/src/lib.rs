pub mod dispatcher;
pub mod local;

pub use dispatcher::{
    BootstrapEvent, BootstrapListener, CapabilityPublisher, EventDispatcher, TransportError,
};
pub use local::LocalDispatcher;
