use tokio::sync::oneshot;

/// Creates the single-fulfillment pair used to unblock a bootstrap's drain
/// step: the guard fulfills on drop, so the signal fires on every exit path
/// of the call that holds it (normal return, error, cancellation), exactly
/// once.
pub fn completion_signal() -> (CompletionGuard, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    (CompletionGuard { tx: Some(tx) }, CompletionSignal { rx })
}

#[derive(Debug)]
pub struct CompletionGuard {
    tx: Option<oneshot::Sender<()>>,
}

impl CompletionGuard {
    /// Fulfills the signal now instead of at drop time.
    pub fn fulfill(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<()>,
}

impl CompletionSignal {
    pub async fn wait(self) {
        // A dropped sender counts as fulfillment; the guard cannot be lost
        // without firing.
        let _ = self.rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_explicit_fulfill() {
        let (guard, signal) = completion_signal();
        guard.fulfill();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_drop_fulfills() {
        let (guard, signal) = completion_signal();
        drop(guard);
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fires_when_holding_task_is_cancelled() {
        let (guard, signal) = completion_signal();
        let task = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        task.abort();

        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_not_fulfilled_before_guard_released() {
        let (guard, signal) = completion_signal();
        let waited =
            tokio::time::timeout(Duration::from_millis(20), signal.wait()).await;
        assert!(waited.is_err(), "signal must not fire while the guard lives");
        drop(guard);
    }
}
