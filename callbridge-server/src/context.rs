use crate::handler::ExportedHandler;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The live processing environment for one worker.
///
/// Owns the exported-handler table (keyed by optional entrypoint name) and
/// the exclusive-execution gate: no two units of work run concurrently
/// against the same context. Mutual exclusion for everything dispatched
/// through [`run`](Self::run) is delegated entirely to that gate; callers
/// take no locks of their own.
pub struct ExecutionContext {
    handlers: DashMap<Option<String>, Arc<ExportedHandler>>,
    rpc_enabled: bool,
    gate: Mutex<()>,
}

impl ExecutionContext {
    pub fn new(rpc_enabled: bool) -> Self {
        ExecutionContext {
            handlers: DashMap::new(),
            rpc_enabled,
            gate: Mutex::new(()),
        }
    }

    /// Whether this worker allows its methods to be called over RPC.
    pub fn rpc_enabled(&self) -> bool {
        self.rpc_enabled
    }

    pub fn export_handler(&self, entrypoint: Option<String>, handler: Arc<ExportedHandler>) {
        self.handlers.insert(entrypoint, handler);
    }

    pub fn exported_handler(&self, entrypoint: Option<&str>) -> Option<Arc<ExportedHandler>> {
        let key = entrypoint.map(str::to_string);
        self.handlers.get(&key).map(|entry| Arc::clone(&entry))
    }

    /// Runs one unit of work exclusively against this context. Also the
    /// adapter that brings externally-driven asynchronous work into the
    /// context's cooperative model: the future is awaited while the gate is
    /// held, so nothing else touches the context until it settles.
    pub async fn run<T, Fut>(&self, work: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let _gate = self.gate.lock().await;
        work.await
    }

    /// Waits until no unit of work is in flight.
    pub(crate) async fn quiesce(&self) {
        let _gate = self.gate.lock().await;
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("rpc_enabled", &self.rpc_enabled)
            .field("entrypoints", &self.handlers.len())
            .finish()
    }
}
