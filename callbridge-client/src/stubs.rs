use crate::initiator::CallInitiator;
use callbridge_core::RpcError;
use callbridge_transport::EventDispatcher;
use serde_json::Value;
use std::sync::Arc;

/// Open-ended view of a remote worker: methods are not statically
/// enumerated, any name resolves to a callable stub per access.
#[derive(Debug, Clone)]
pub struct WorkerStub {
    initiator: Arc<CallInitiator>,
}

impl WorkerStub {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        WorkerStub {
            initiator: Arc::new(CallInitiator::new(dispatcher)),
        }
    }

    /// Resolves `name` to a callable bound to `invoke(name, args)`.
    pub fn method(&self, name: impl Into<String>) -> MethodStub {
        MethodStub {
            initiator: Arc::clone(&self.initiator),
            name: name.into(),
        }
    }

    pub fn initiator(&self) -> &CallInitiator {
        &self.initiator
    }
}

#[derive(Debug, Clone)]
pub struct MethodStub {
    initiator: Arc<CallInitiator>,
    name: String,
}

impl MethodStub {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn call(&self, args: Vec<Value>) -> Result<Value, RpcError> {
        self.initiator.invoke(&self.name, &args).await
    }
}
