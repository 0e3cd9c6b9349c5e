use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::select;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use seatlens_core_types::SeatStats;

use crate::analyzer::analyze_stage;
use crate::errors::ChartProbeError;
use crate::model::SceneNode;

/// Cadence at which the poller re-checks the rendering library's stage
/// registry.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Access to the stages the rendering library has published inside the
/// hidden document. Empty means the chart has not rendered yet.
#[async_trait]
pub trait StagePort: Send + Sync {
    async fn stages(&self) -> Result<Vec<SceneNode>, ChartProbeError>;
}

/// Repeatedly checks for a published stage, analyzes the first one found,
/// and delivers the stats exactly once before terminating permanently.
///
/// The poller itself never gives up: an empty or unpopulated chart keeps
/// it retrying until the owning probe session cancels it (the absolute
/// timeout lives with the session, not here).
pub struct RenderPoller {
    port: Arc<dyn StagePort>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl RenderPoller {
    pub fn new(port: Arc<dyn StagePort>, interval: Duration) -> Self {
        Self {
            port,
            interval,
            task: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start polling; the stats of the first populated stage are sent on
    /// `tx`, after which the task exits and never re-arms.
    pub fn start(&mut self, tx: oneshot::Sender<SeatStats>) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }

        let port = Arc::clone(&self.port);
        let shutdown = self.shutdown.clone();
        let poll_every = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_every);
            debug!(target: "chart-probe", "render poller started");
            loop {
                select! {
                    _ = shutdown.cancelled() => {
                        debug!(target: "chart-probe", "render poller cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        if let Some(stats) = poll_once(port.as_ref()).await {
                            debug!(
                                target: "chart-probe",
                                available = stats.available,
                                total = stats.total,
                                "stage analyzed, delivering stats"
                            );
                            let _ = tx.send(stats);
                            return;
                        }
                    }
                }
            }
        }));
    }

    /// Stop the poller and wait for the task to wind down.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            let _ = handle.await;
        }
    }
}

async fn poll_once(port: &dyn StagePort) -> Option<SeatStats> {
    let stages = match port.stages().await {
        Ok(stages) => stages,
        Err(err) => {
            trace!(target: "chart-probe", %err, "stage registry not readable yet");
            return None;
        }
    };
    let stage = stages.first()?;
    analyze_stage(stage)
}

impl Drop for RenderPoller {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::{sleep, timeout};

    use crate::model::NodeAttrs;

    fn populated_stage() -> SceneNode {
        let seat = SceneNode {
            class_name: "Group".into(),
            attrs: NodeAttrs::default(),
            children: vec![
                SceneNode {
                    class_name: "Rect".into(),
                    attrs: NodeAttrs {
                        fill: Some("#ffffff".into()),
                        ..NodeAttrs::default()
                    },
                    children: vec![],
                },
                SceneNode {
                    class_name: "Text".into(),
                    attrs: NodeAttrs {
                        text: Some("1".into()),
                        ..NodeAttrs::default()
                    },
                    children: vec![],
                },
            ],
        };
        SceneNode {
            class_name: "Stage".into(),
            attrs: NodeAttrs::default(),
            children: vec![seat],
        }
    }

    /// Publishes nothing for the first `empty_polls` calls, then a
    /// populated stage.
    struct ScriptedPort {
        empty_polls: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StagePort for ScriptedPort {
        async fn stages(&self) -> Result<Vec<SceneNode>, ChartProbeError> {
            let seen = self.calls.fetch_add(1, Ordering::SeqCst);
            if seen < self.empty_polls {
                Ok(vec![])
            } else {
                Ok(vec![populated_stage()])
            }
        }
    }

    #[tokio::test]
    async fn delivers_stats_once_the_stage_appears() {
        let port = Arc::new(ScriptedPort {
            empty_polls: 3,
            calls: AtomicUsize::new(0),
        });
        let mut poller = RenderPoller::new(port.clone(), Duration::from_millis(5));
        let (tx, rx) = oneshot::channel();
        poller.start(tx);

        let stats = timeout(Duration::from_secs(1), rx)
            .await
            .expect("poller should deliver before timeout")
            .expect("sender not dropped");
        assert_eq!(stats, SeatStats::new(1, 1));
        poller.stop().await;
    }

    #[tokio::test]
    async fn terminates_permanently_after_delivery() {
        let port = Arc::new(ScriptedPort {
            empty_polls: 0,
            calls: AtomicUsize::new(0),
        });
        let mut poller = RenderPoller::new(port.clone(), Duration::from_millis(5));
        let (tx, rx) = oneshot::channel();
        poller.start(tx);
        rx.await.expect("stats delivered");

        let calls_after_delivery = port.calls.load(Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(port.calls.load(Ordering::SeqCst), calls_after_delivery);
        poller.stop().await;
    }

    #[tokio::test]
    async fn cancellation_stops_an_unfulfilled_poller() {
        let port = Arc::new(ScriptedPort {
            empty_polls: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let mut poller = RenderPoller::new(port.clone(), Duration::from_millis(5));
        let (tx, mut rx) = oneshot::channel();
        poller.start(tx);

        sleep(Duration::from_millis(30)).await;
        poller.stop().await;

        // Sender dropped without delivering.
        assert!(rx.try_recv().is_err());
        let calls_after_stop = port.calls.load(Ordering::SeqCst);
        sleep(Duration::from_millis(30)).await;
        assert_eq!(port.calls.load(Ordering::SeqCst), calls_after_stop);
    }

    #[tokio::test]
    async fn port_errors_are_treated_as_not_rendered_yet() {
        struct FailingThenOk {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl StagePort for FailingThenOk {
            async fn stages(&self) -> Result<Vec<SceneNode>, ChartProbeError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ChartProbeError::StageUnavailable("registry missing".into()))
                } else {
                    Ok(vec![populated_stage()])
                }
            }
        }

        let port = Arc::new(FailingThenOk {
            calls: AtomicUsize::new(0),
        });
        let mut poller = RenderPoller::new(port, Duration::from_millis(5));
        let (tx, rx) = oneshot::channel();
        poller.start(tx);
        let stats = timeout(Duration::from_secs(1), rx)
            .await
            .expect("recovers after errors")
            .expect("sender alive");
        assert_eq!(stats.total, 1);
        poller.stop().await;
    }
}
