use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use seatlens_core_types::ProbeId;

use crate::ports::ContextHost;

/// The live state of one hover interaction: its probe task, its
/// cancellation token, and the hidden context it owns.
pub struct ActiveProbe {
    pub id: ProbeId,
    pub canonical_url: String,
    cancel: CancellationToken,
    host: Arc<dyn ContextHost>,
    task: JoinHandle<()>,
}

impl ActiveProbe {
    pub fn new(
        id: ProbeId,
        canonical_url: impl Into<String>,
        cancel: CancellationToken,
        host: Arc<dyn ContextHost>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            canonical_url: canonical_url.into(),
            cancel,
            host,
            task,
        }
    }

    /// Cancel the timeout and poller, discard the hidden context, and
    /// stop the probe task. Safe to call in any state.
    fn teardown(self) {
        debug!(target: "probe-loader", id = %self.id, "tearing down probe");
        self.cancel.cancel();
        self.host.discard();
        self.task.abort();
    }
}

/// Enforces the at-most-one-active-probe invariant.
///
/// Starting a new hover tears the previous probe down *before* the new
/// one is registered, synchronously under the lock. Stale work is gone
/// before any new transition can begin, so a late result can never be
/// attributed to the wrong hover.
#[derive(Default)]
pub struct HoverCoordinator {
    active: Mutex<Option<ActiveProbe>>,
}

impl HoverCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new probe, replacing (and tearing down) any previous one.
    pub fn begin(&self, probe: ActiveProbe) {
        let mut guard = self.active.lock();
        if let Some(previous) = guard.take() {
            previous.teardown();
        }
        *guard = Some(probe);
    }

    /// Tear down the active probe (pointer left the hovered element).
    pub fn end(&self) {
        if let Some(probe) = self.active.lock().take() {
            probe.teardown();
        }
    }

    pub fn active_id(&self) -> Option<ProbeId> {
        self.active.lock().as_ref().map(|probe| probe.id.clone())
    }

    /// Canonical URL of the active probe, used to suppress re-probing
    /// the showtime already being probed.
    pub fn active_canonical(&self) -> Option<String> {
        self.active
            .lock()
            .as_ref()
            .map(|probe| probe.canonical_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    use crate::errors::LoaderError;
    use crate::ports::LoadEvent;

    struct CountingHost {
        events: broadcast::Sender<LoadEvent>,
        discarded: AtomicBool,
    }

    impl CountingHost {
        fn new() -> Arc<Self> {
            let (events, _) = broadcast::channel(4);
            Arc::new(Self {
                events,
                discarded: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl ContextHost for CountingHost {
        async fn navigate(&self, _url: &str) -> Result<(), LoaderError> {
            Ok(())
        }

        fn load_events(&self) -> broadcast::Receiver<LoadEvent> {
            self.events.subscribe()
        }

        fn discard(&self) {
            self.discarded.store(true, Ordering::SeqCst);
        }
    }

    fn probe_with(
        host: Arc<CountingHost>,
        completed: Arc<AtomicBool>,
    ) -> (ActiveProbe, CancellationToken) {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {}
                _ = sleep(Duration::from_secs(60)) => {
                    completed.store(true, Ordering::SeqCst);
                }
            }
        });
        (
            ActiveProbe::new(ProbeId::new(), "https://host/a", cancel.clone(), host, task),
            cancel,
        )
    }

    #[tokio::test]
    async fn beginning_a_new_probe_tears_down_the_previous_one() {
        let coordinator = HoverCoordinator::new();
        let host_a = CountingHost::new();
        let completed_a = Arc::new(AtomicBool::new(false));
        let (probe_a, cancel_a) = probe_with(Arc::clone(&host_a), Arc::clone(&completed_a));
        let id_a = probe_a.id.clone();
        coordinator.begin(probe_a);
        assert_eq!(coordinator.active_id(), Some(id_a));

        let host_b = CountingHost::new();
        let completed_b = Arc::new(AtomicBool::new(false));
        let (probe_b, cancel_b) = probe_with(Arc::clone(&host_b), completed_b);
        let id_b = probe_b.id.clone();
        coordinator.begin(probe_b);

        // A's token is cancelled and its context discarded before B is
        // the registered probe.
        assert!(cancel_a.is_cancelled());
        assert!(host_a.discarded.load(Ordering::SeqCst));
        assert_eq!(coordinator.active_id(), Some(id_b));
        assert!(!cancel_b.is_cancelled());
        assert!(!host_b.discarded.load(Ordering::SeqCst));

        sleep(Duration::from_millis(20)).await;
        assert!(!completed_a.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn ending_a_hover_clears_the_active_probe() {
        let coordinator = HoverCoordinator::new();
        let host = CountingHost::new();
        let (probe, cancel) = probe_with(Arc::clone(&host), Arc::new(AtomicBool::new(false)));
        coordinator.begin(probe);

        coordinator.end();
        assert!(cancel.is_cancelled());
        assert!(host.discarded.load(Ordering::SeqCst));
        assert_eq!(coordinator.active_id(), None);
    }

    #[tokio::test]
    async fn ending_with_no_active_probe_is_a_no_op() {
        let coordinator = HoverCoordinator::new();
        coordinator.end();
        assert_eq!(coordinator.active_id(), None);
    }
}
