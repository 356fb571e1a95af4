use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;

/// Counting join barrier: the orchestrator waits until every worker of a
/// batch has signalled completion.
pub(crate) struct Latch {
    semaphore: Semaphore,
    count: u32,
}

impl Latch {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Semaphore::new(0),
            count: count as u32,
        })
    }

    pub fn count_down(&self) {
        self.semaphore.add_permits(1);
    }

    /// Resolves once `count` signals have arrived. A zero-sized batch
    /// resolves immediately.
    pub async fn wait(&self) {
        if self.count > 0 {
            // the semaphore is never closed
            let _permits = self.semaphore.acquire_many(self.count).await.unwrap();
        }
    }
}

/// Per-worker handle that decrements the latch at most once, no matter how
/// many of the worker's terminal paths fire.
pub(crate) struct LatchGuard {
    latch: Arc<Latch>,
    fired: AtomicBool,
}

impl LatchGuard {
    pub fn new(latch: Arc<Latch>) -> Self {
        Self {
            latch,
            fired: AtomicBool::new(false),
        }
    }

    pub fn count_down(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            self.latch.count_down();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_latch_opens_immediately() {
        let latch = Latch::new(0);
        latch.wait().await;
    }

    #[tokio::test]
    async fn opens_after_all_signals() {
        let latch = Latch::new(3);
        for _ in 0..3 {
            let latch = latch.clone();
            tokio::spawn(async move { latch.count_down() });
        }
        tokio::time::timeout(Duration::from_secs(5), latch.wait())
            .await
            .expect("latch never opened");
    }

    #[tokio::test]
    async fn guard_decrements_at_most_once() {
        let latch = Latch::new(2);
        let guard = LatchGuard::new(latch.clone());

        // double-fire from the same worker must not open a two-party latch
        guard.count_down();
        guard.count_down();

        let wait = tokio::time::timeout(Duration::from_millis(50), latch.wait()).await;
        assert!(wait.is_err(), "latch opened after a single worker");

        LatchGuard::new(latch.clone()).count_down();
        tokio::time::timeout(Duration::from_secs(5), latch.wait())
            .await
            .expect("latch never opened");
    }
}
