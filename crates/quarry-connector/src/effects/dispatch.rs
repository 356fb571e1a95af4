use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use crate::data::{RequestKind, TransferEvent, TransferObserver, TransferResource};
use crate::error::TransferError;

/// Fans lifecycle events out to the session observer.
///
/// Each worker drives its own transfer's events sequentially, so the
/// per-transfer total order falls out of worker discipline; the
/// dispatcher adds the best-effort guarantee that a misbehaving observer
/// cannot affect the transfer.
#[derive(Clone)]
pub(crate) struct EventDispatcher {
    observer: Option<Arc<dyn TransferObserver>>,
}

impl EventDispatcher {
    pub fn new(observer: Option<Arc<dyn TransferObserver>>) -> Self {
        Self { observer }
    }

    pub fn initiated(&self, resource: &Arc<TransferResource>, request: RequestKind) {
        self.emit(resource, request, 0, 0, None, None, |observer, event| {
            observer.transfer_initiated(event)
        });
    }

    pub fn progressed(
        &self,
        resource: &Arc<TransferResource>,
        request: RequestKind,
        delta: u64,
        transferred: u64,
        total: Option<u64>,
    ) {
        self.emit(resource, request, delta, transferred, total, None, |observer, event| {
            observer.transfer_progressed(event)
        });
    }

    pub fn succeeded(
        &self,
        resource: &Arc<TransferResource>,
        request: RequestKind,
        transferred: u64,
    ) {
        self.emit(resource, request, 0, transferred, None, None, |observer, event| {
            observer.transfer_succeeded(event)
        });
    }

    pub fn corrupted(
        &self,
        resource: &Arc<TransferResource>,
        request: RequestKind,
        error: &TransferError,
    ) {
        self.emit(
            resource,
            request,
            0,
            0,
            None,
            Some(error.clone()),
            |observer, event| observer.transfer_corrupted(event),
        );
    }

    pub fn failed(
        &self,
        resource: &Arc<TransferResource>,
        request: RequestKind,
        error: &TransferError,
    ) {
        self.emit(
            resource,
            request,
            0,
            0,
            None,
            Some(error.clone()),
            |observer, event| observer.transfer_failed(event),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn emit<F>(
        &self,
        resource: &Arc<TransferResource>,
        request: RequestKind,
        delta: u64,
        transferred: u64,
        total: Option<u64>,
        error: Option<TransferError>,
        call: F,
    ) where
        F: FnOnce(&dyn TransferObserver, &TransferEvent),
    {
        let Some(observer) = &self.observer else {
            return;
        };
        let event = TransferEvent {
            resource: resource.clone(),
            request,
            delta,
            transferred,
            total,
            error,
        };
        if catch_unwind(AssertUnwindSafe(|| call(observer.as_ref(), &event))).is_err() {
            warn!(
                resource = %event.resource.resource_path,
                "transfer observer panicked; event dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Panicking;

    impl TransferObserver for Panicking {
        fn transfer_initiated(&self, _event: &TransferEvent) {
            panic!("observer bug");
        }
    }

    struct Recording(Mutex<Vec<String>>);

    impl TransferObserver for Recording {
        fn transfer_progressed(&self, event: &TransferEvent) {
            self.0
                .lock()
                .unwrap()
                .push(format!("progressed {}", event.transferred));
        }
    }

    fn resource() -> Arc<TransferResource> {
        Arc::new(TransferResource {
            repository_url: "http://repo.example".to_string(),
            resource_path: "a.jar".to_string(),
            file: None,
        })
    }

    #[test]
    fn observer_panic_is_swallowed() {
        let dispatcher = EventDispatcher::new(Some(Arc::new(Panicking)));
        dispatcher.initiated(&resource(), RequestKind::Get);
    }

    #[test]
    fn events_reach_the_observer() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let dispatcher = EventDispatcher::new(Some(recording.clone()));

        dispatcher.progressed(&resource(), RequestKind::Get, 5, 5, Some(10));
        dispatcher.progressed(&resource(), RequestKind::Get, 5, 10, Some(10));

        assert_eq!(
            *recording.0.lock().unwrap(),
            vec!["progressed 5".to_string(), "progressed 10".to_string()]
        );
    }

    #[test]
    fn no_observer_is_a_no_op() {
        let dispatcher = EventDispatcher::new(None);
        dispatcher.succeeded(&resource(), RequestKind::Put, 42);
    }
}
