//! Pipeline wiring: one page capture, one cache, one probe at a time.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use probe_loader::{
    ActiveProbe, ContextHost, HoverCoordinator, ProbeOutcome, SpeculativeLoader,
};
use seatlens_bridge::MessageChannel;
use seatlens_core_types::{ProbeId, SeatReport};
use session_resolver::{HoverTarget, PageCapture, ResolveError, SessionResolver};
use stats_cache::StatsCache;

use crate::config::SeatlensConfig;

/// Per-page-load assembly of the probe pipeline. Construct once per
/// capture, discard on navigation; the cache and coordinator live and
/// die with it.
pub struct ProbePipeline {
    resolver: SessionResolver,
    loader: Arc<SpeculativeLoader>,
    coordinator: HoverCoordinator,
    cache: Arc<StatsCache>,
    host: Arc<dyn ContextHost>,
    site_host: String,
}

impl ProbePipeline {
    pub fn new(
        capture: &PageCapture,
        host: Arc<dyn ContextHost>,
        outer: Arc<MessageChannel>,
        config: &SeatlensConfig,
    ) -> Self {
        let cache = Arc::new(StatsCache::new(config.cache_ttl()));
        let loader = Arc::new(SpeculativeLoader::new(
            Arc::clone(&host),
            outer,
            Arc::clone(&cache),
            config.site_host.clone(),
            config.probe_timeout(),
        ));
        Self {
            resolver: SessionResolver::new(capture),
            loader,
            coordinator: HoverCoordinator::new(),
            cache,
            host,
            site_host: config.site_host.clone(),
        }
    }

    /// Handle one hover interaction to completion.
    ///
    /// `None` means the hover produced nothing to show: not a showtime,
    /// unresolvable (no event id), superseded by a newer hover, or the
    /// retry ladder ran dry (deliberately silent).
    pub async fn hover(&self, target: &HoverTarget) -> Option<SeatReport> {
        let meta = match self.resolver.resolve(target) {
            Ok(meta) => meta,
            Err(ResolveError::NotAShowtime) => return None,
            Err(ResolveError::MissingEventId) => {
                debug!(target: "pipeline", "no event id on this page, hover dropped");
                return None;
            }
        };
        let canonical = meta.canonical_url(&self.site_host);

        // Already probing this very showtime: let the running probe finish.
        if self.coordinator.active_canonical().as_deref() == Some(canonical.as_str()) {
            return None;
        }

        // The previous probe must be fully torn down before this one
        // makes any transition.
        self.coordinator.end();

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let loader = Arc::clone(&self.loader);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let outcome = loader.run(&meta, task_cancel).await;
            let _ = tx.send(outcome);
        });
        self.coordinator.begin(ActiveProbe::new(
            ProbeId::new(),
            canonical,
            cancel,
            Arc::clone(&self.host),
            task,
        ));

        // A newer hover aborts the task, which drops `tx`.
        let outcome = rx.await.ok()?;
        match outcome {
            ProbeOutcome::Cached(stats) | ProbeOutcome::Success(stats) => {
                Some(SeatReport::Stats(stats))
            }
            ProbeOutcome::ExtractionFailed { .. } => Some(SeatReport::Error {
                reason: "Unable to view".into(),
            }),
            ProbeOutcome::TimedOut => Some(SeatReport::Error {
                reason: "Timed out".into(),
            }),
            ProbeOutcome::Aborted | ProbeOutcome::Cancelled => None,
        }
    }

    /// Pointer left the hovered element: tear the active probe down.
    pub fn leave(&self) {
        self.coordinator.end();
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }
}
