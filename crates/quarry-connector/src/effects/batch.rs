use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::{Latch, LatchGuard};
use crate::data::{ResourceKind, Transfer, TransferOutcome};
use crate::error::TransferError;

/// One descriptor's worth of work handed to the orchestrator.
pub(crate) struct BatchJob<F> {
    pub(crate) transfer: Transfer,
    pub(crate) kind: ResourceKind,
    pub(crate) url: String,
    pub(crate) work: F,
}

/// Carries a worker's terminal result back to the orchestrator and
/// releases the join latch, at most once per worker.
struct WorkerSignal {
    result: Mutex<Option<TransferOutcome>>,
    guard: LatchGuard,
}

impl WorkerSignal {
    fn complete(&self, outcome: TransferOutcome) {
        {
            let mut slot = self.result.lock().unwrap();
            if slot.is_none() {
                *slot = Some(outcome);
            }
        }
        self.guard.count_down();
    }

    fn recorded(&self) -> Option<TransferOutcome> {
        self.result.lock().unwrap().clone()
    }
}

/// Run one batch: spawn a task per descriptor, wait for all of them (or
/// cancellation), then finalize every descriptor exactly once.
///
/// The submitter gets back only after every transfer is DONE. On
/// cancellation, workers that have not reported yet are finalized as
/// cancelled while their network I/O drains in the background.
pub(crate) async fn execute_batch<F>(jobs: Vec<BatchJob<F>>, cancel: &CancellationToken)
where
    F: Future<Output = Result<(), TransferError>> + Send + 'static,
{
    let latch = Latch::new(jobs.len());
    let mut pending = Vec::with_capacity(jobs.len());

    for job in jobs {
        let signal = Arc::new(WorkerSignal {
            result: Mutex::new(None),
            guard: LatchGuard::new(latch.clone()),
        });
        pending.push((job.transfer, signal.clone()));

        let kind = job.kind;
        let url = job.url;
        let work = job.work;
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(TransferError::Failed {
                    kind,
                    url,
                    message: "transfer worker panicked".to_string(),
                }),
            };
            signal.complete(outcome);
        });
    }

    let cancelled = tokio::select! {
        _ = latch.wait() => false,
        _ = cancel.cancelled() => true,
    };

    for (transfer, signal) in pending {
        let outcome = match signal.recorded() {
            Some(outcome) => outcome,
            None if cancelled => Err(TransferError::Cancelled),
            None => Ok(()),
        };
        transfer.finish(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TransferState;
    use futures_util::future::BoxFuture;
    use std::time::Duration;

    type BoxedJob = BatchJob<BoxFuture<'static, Result<(), TransferError>>>;

    fn job(
        transfer: &Transfer,
        work: BoxFuture<'static, Result<(), TransferError>>,
    ) -> BoxedJob {
        BatchJob {
            transfer: transfer.clone(),
            kind: ResourceKind::Artifact,
            url: "http://repo.example/a.jar".to_string(),
            work,
        }
    }

    #[tokio::test]
    async fn every_descriptor_reaches_done() {
        let ok = Transfer::new();
        let failed = Transfer::new();

        execute_batch(
            vec![
                job(&ok, async { Ok(()) }.boxed()),
                job(&failed, async { Err(TransferError::Cancelled) }.boxed()),
            ],
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(ok.state(), TransferState::Done);
        assert_eq!(ok.outcome(), Some(Ok(())));
        assert_eq!(failed.state(), TransferState::Done);
        assert_eq!(failed.outcome(), Some(Err(TransferError::Cancelled)));
    }

    #[tokio::test]
    async fn panicking_worker_still_finalizes() {
        let transfer = Transfer::new();

        execute_batch(
            vec![job(&transfer, async { panic!("worker bug") }.boxed())],
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(transfer.state(), TransferState::Done);
        assert!(matches!(
            transfer.outcome(),
            Some(Err(TransferError::Failed { .. }))
        ));
    }

    #[tokio::test]
    async fn cancellation_finalizes_pending_workers() {
        let stuck = Transfer::new();
        let token = CancellationToken::new();
        token.cancel();

        execute_batch(
            vec![job(
                &stuck,
                async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
                .boxed(),
            )],
            &token,
        )
        .await;

        assert_eq!(stuck.state(), TransferState::Done);
        assert_eq!(stuck.outcome(), Some(Err(TransferError::Cancelled)));
    }

    #[tokio::test]
    async fn empty_batch_completes_immediately() {
        let jobs: Vec<BatchJob<std::future::Ready<Result<(), TransferError>>>> = Vec::new();
        execute_batch(jobs, &CancellationToken::new()).await;
    }
}
