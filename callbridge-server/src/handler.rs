use callbridge_core::RpcError;
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type MethodResult = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send>>;
pub type MethodHandler = Arc<dyn Fn(Vec<Value>) -> MethodResult + Send + Sync>;

/// A worker's exported handler: the object remote calls are dispatched to.
///
/// Methods registered directly on a handler are its *own* members; a
/// handler may also delegate to a prototype handler. Ordinary lookup walks
/// the prototype chain, but only own members are remotely callable.
#[derive(Clone, Default)]
pub struct ExportedHandler {
    methods: IndexMap<String, MethodHandler>,
    prototype: Option<Arc<ExportedHandler>>,
}

impl ExportedHandler {
    pub fn new() -> Self {
        ExportedHandler {
            methods: IndexMap::new(),
            prototype: None,
        }
    }

    /// Registers a synchronous own method.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.into(),
            Arc::new(move |args| {
                let out = f(args);
                Box::pin(std::future::ready(out)) as MethodResult
            }),
        );
        self
    }

    /// Registers an own method whose return value is awaited before the
    /// result is serialized.
    pub fn async_method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        self.methods
            .insert(name.into(), Arc::new(move |args| Box::pin(f(args)) as MethodResult));
        self
    }

    pub fn with_prototype(mut self, prototype: Arc<ExportedHandler>) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Own-member lookup: does not consult the prototype chain.
    pub fn own_method(&self, name: &str) -> Option<MethodHandler> {
        self.methods.get(name).cloned()
    }

    /// Ordinary lookup: walks the prototype chain. Used only to tell
    /// "missing entirely" apart from "inherited, so not callable".
    pub fn lookup(&self, name: &str) -> Option<MethodHandler> {
        self.own_method(name)
            .or_else(|| self.prototype.as_ref().and_then(|p| p.lookup(name)))
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ExportedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedHandler")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("has_prototype", &self.prototype.is_some())
            .finish()
    }
}
