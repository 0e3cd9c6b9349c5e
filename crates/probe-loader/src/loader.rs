use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use seatlens_bridge::{BridgeMessage, MessageChannel, OuterReceiver};
use seatlens_core_types::SeatLayoutMeta;
use stats_cache::{canonical_key, StatsCache};

use crate::headers::frame_options;
use crate::ladder::RetryLadder;
use crate::ports::{AddressProbe, ContextHost, LoadEvent};
use crate::state::{ProbeOutcome, ProbeState};

/// Absolute budget for one probe, racing every other transition.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Marker a landing address must carry to count as the target page.
const TARGET_MARKER: &str = "seat-layout";

/// Drives one hidden-context load to a terminal probe state.
///
/// The loader never mutates the meta it is given: each retry attempt
/// works on a copy with a rewritten region. Results are correlated by
/// canonical URL: a bridged message only counts when its URL matches one
/// of this probe's attempted URLs, so a late message from a torn-down
/// context can never satisfy (or poison) a newer probe.
pub struct SpeculativeLoader {
    host: Arc<dyn ContextHost>,
    outer: Arc<MessageChannel>,
    cache: Arc<StatsCache>,
    site_host: String,
    origin: String,
    timeout: Duration,
}

impl SpeculativeLoader {
    pub fn new(
        host: Arc<dyn ContextHost>,
        outer: Arc<MessageChannel>,
        cache: Arc<StatsCache>,
        site_host: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let site_host = site_host.into();
        let origin = seatlens_bridge::origin_of(&site_host).unwrap_or_else(|| site_host.clone());
        Self {
            host,
            outer,
            cache,
            site_host,
            origin,
            timeout,
        }
    }

    /// Run one probe for `meta` until a terminal outcome; `cancel` is the
    /// owning hover session's token.
    pub async fn run(&self, meta: &SeatLayoutMeta, cancel: CancellationToken) -> ProbeOutcome {
        let mut state = ProbeState::Idle;
        let canonical = meta.canonical_url(&self.site_host);

        if let Some(stats) = self.cache.lookup(&canonical) {
            transition(&mut state, ProbeState::Cached);
            return ProbeOutcome::Cached(stats);
        }

        // Subscribe to both streams before the first navigation so no
        // event can slip past.
        let mut loads = self.host.load_events();
        let mut results = OuterReceiver::new(&self.outer, self.origin.clone());

        let mut ladder = RetryLadder::new(&meta.region);
        let mut attempted = vec![canonical.clone()];
        let mut attempt = 0u32;

        transition(&mut state, ProbeState::Loading { attempt });
        if let Err(err) = self.host.navigate(&cache_busted(&canonical)).await {
            warn!(target: "probe-loader", %err, "initial navigation failed");
            transition(&mut state, ProbeState::Aborted);
            return ProbeOutcome::Aborted;
        }

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            select! {
                _ = cancel.cancelled() => {
                    self.host.discard();
                    debug!(target: "probe-loader", "probe cancelled by session teardown");
                    return ProbeOutcome::Cancelled;
                }
                _ = &mut deadline => {
                    self.host.discard();
                    transition(&mut state, ProbeState::TimedOut);
                    return ProbeOutcome::TimedOut;
                }
                load = loads.recv() => {
                    let event = match load {
                        Ok(event) => event,
                        Err(_) => continue,
                    };
                    match self.on_load(event, meta, &mut state, &mut ladder, &mut attempt, &mut attempted).await {
                        Some(outcome) => return outcome,
                        None => {}
                    }
                }
                message = results.recv() => {
                    let Some(message) = message else { continue };
                    if let Some(outcome) = self.on_message(message, &mut state, &attempted) {
                        return outcome;
                    }
                }
            }
        }
    }

    /// Handle one load-complete event; `Some` ends the probe.
    async fn on_load(
        &self,
        event: LoadEvent,
        meta: &SeatLayoutMeta,
        state: &mut ProbeState,
        ladder: &mut RetryLadder,
        attempt: &mut u32,
        attempted: &mut Vec<String>,
    ) -> Option<ProbeOutcome> {
        if let Some(value) = frame_options(&event.headers) {
            warn!(
                target: "probe-loader",
                value,
                "seat-layout response carries X-Frame-Options; hidden context may be blocked"
            );
        }

        match event.address {
            AddressProbe::Unreadable => {
                // Cannot determine the outcome; the attempt stands,
                // counted neither success nor retry.
                debug!(target: "probe-loader", "landing address unreadable, attempt stands");
                None
            }
            AddressProbe::Landed(url) if url.contains(TARGET_MARKER) => {
                debug!(target: "probe-loader", %url, "target page reached, awaiting stats");
                None
            }
            AddressProbe::Landed(url) => {
                transition(state, ProbeState::Retrying { attempt: *attempt });
                debug!(target: "probe-loader", landed = %url, "speculative load missed the target page");
                match ladder.next_region() {
                    Some(region) => {
                        *attempt += 1;
                        let retry_meta = meta.with_region(region);
                        let retry_canonical = retry_meta.canonical_url(&self.site_host);
                        attempted.push(retry_canonical.clone());
                        transition(state, ProbeState::Loading { attempt: *attempt });
                        if let Err(err) = self.host.navigate(&cache_busted(&retry_canonical)).await {
                            warn!(target: "probe-loader", %err, "retry navigation failed");
                            transition(state, ProbeState::Aborted);
                            return Some(ProbeOutcome::Aborted);
                        }
                        None
                    }
                    None => {
                        transition(state, ProbeState::Aborted);
                        Some(ProbeOutcome::Aborted)
                    }
                }
            }
        }
    }

    /// Handle one bridged message; `Some` ends the probe. Messages whose
    /// URL does not match an attempted URL belong to someone else and are
    /// ignored.
    fn on_message(
        &self,
        message: BridgeMessage,
        state: &mut ProbeState,
        attempted: &[String],
    ) -> Option<ProbeOutcome> {
        match message {
            BridgeMessage::SeatDataResult { url, stats } => {
                if !attempted.contains(&canonical_key(&url)) {
                    debug!(target: "probe-loader", %url, "ignoring result for a foreign url");
                    return None;
                }
                self.cache.store(&url, stats);
                transition(state, ProbeState::Success);
                Some(ProbeOutcome::Success(stats))
            }
            BridgeMessage::SeatDataError { url, reason } => {
                if !attempted.contains(&canonical_key(&url)) {
                    return None;
                }
                warn!(target: "probe-loader", %url, %reason, "extraction failed");
                Some(ProbeOutcome::ExtractionFailed { reason })
            }
            BridgeMessage::SpyData { .. } => None,
        }
    }
}

fn transition(state: &mut ProbeState, next: ProbeState) {
    debug!(target: "probe-loader", from = ?state, to = ?next, "probe transition");
    *state = next;
}

fn cache_busted(canonical: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{canonical}?ts={millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use seatlens_core_types::SeatStats;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    use crate::errors::LoaderError;

    const SITE: &str = "https://in.bookmyshow.com";

    fn meta(region: &str) -> SeatLayoutMeta {
        SeatLayoutMeta {
            session_id: "99887".into(),
            venue_code: "PVOO".into(),
            event_id: "ET00312345".into(),
            date: "20251225".into(),
            region: region.into(),
        }
    }

    /// Host that answers each navigation with the next scripted event.
    struct ScriptedHost {
        events: broadcast::Sender<LoadEvent>,
        script: Mutex<Vec<LoadEvent>>,
        navigations: Mutex<Vec<String>>,
        discards: Mutex<u32>,
    }

    impl ScriptedHost {
        fn new(script: Vec<LoadEvent>) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                events,
                script: Mutex::new(script),
                navigations: Mutex::new(Vec::new()),
                discards: Mutex::new(0),
            })
        }

        fn navigated(&self) -> Vec<String> {
            self.navigations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContextHost for ScriptedHost {
        async fn navigate(&self, url: &str) -> Result<(), LoaderError> {
            self.navigations.lock().unwrap().push(url.to_string());
            let mut script = self.script.lock().unwrap();
            if !script.is_empty() {
                let event = script.remove(0);
                let _ = self.events.send(event);
            }
            Ok(())
        }

        fn load_events(&self) -> broadcast::Receiver<LoadEvent> {
            self.events.subscribe()
        }

        fn discard(&self) {
            *self.discards.lock().unwrap() += 1;
        }
    }

    fn loader(host: Arc<ScriptedHost>, outer: Arc<MessageChannel>, cache: Arc<StatsCache>) -> SpeculativeLoader {
        SpeculativeLoader::new(host, outer, cache, SITE, Duration::from_millis(200))
    }

    fn target_url(region: &str) -> String {
        meta(region).canonical_url(SITE)
    }

    #[tokio::test]
    async fn fresh_cache_entry_short_circuits() {
        let host = ScriptedHost::new(vec![]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        cache.store(&target_url("bengaluru"), SeatStats::new(3, 9));

        let outcome = loader(host.clone(), outer, cache)
            .run(&meta("bengaluru"), CancellationToken::new())
            .await;

        assert_eq!(outcome, ProbeOutcome::Cached(SeatStats::new(3, 9)));
        assert!(host.navigated().is_empty());
    }

    #[tokio::test]
    async fn bridged_result_completes_the_probe_and_fills_the_cache() {
        let host = ScriptedHost::new(vec![LoadEvent::landed(target_url("bengaluru"))]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let loader = loader(host.clone(), Arc::clone(&outer), Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            async move { loader.run(&meta, CancellationToken::new()).await }
        });

        sleep(Duration::from_millis(20)).await;
        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataResult {
                    url: format!("{}?ts=1", target_url("bengaluru")),
                    stats: SeatStats::new(12, 40),
                },
            )
            .unwrap();

        assert_eq!(
            run.await.unwrap(),
            ProbeOutcome::Success(SeatStats::new(12, 40))
        );
        assert_eq!(
            cache.lookup(&target_url("bengaluru")),
            Some(SeatStats::new(12, 40))
        );
    }

    #[tokio::test]
    async fn off_target_landing_walks_the_ladder() {
        // First load bounces to the regional home page; the retry with
        // the mapped slug lands on the target.
        let host = ScriptedHost::new(vec![
            LoadEvent::landed(format!("{SITE}/explore/home")),
            LoadEvent::landed(target_url("bang")),
        ]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let loader = loader(host.clone(), Arc::clone(&outer), Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            async move { loader.run(&meta, CancellationToken::new()).await }
        });

        sleep(Duration::from_millis(20)).await;
        let navigated = host.navigated();
        assert_eq!(navigated.len(), 2);
        assert!(navigated[0].contains("/movies/bengaluru/"));
        assert!(navigated[1].contains("/movies/bang/"));

        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataResult {
                    url: target_url("bang"),
                    stats: SeatStats::new(7, 30),
                },
            )
            .unwrap();

        assert_eq!(
            run.await.unwrap(),
            ProbeOutcome::Success(SeatStats::new(7, 30))
        );
    }

    #[tokio::test]
    async fn ladder_exhaustion_aborts_silently() {
        let bounce = || LoadEvent::landed(format!("{SITE}/explore/home"));
        let host = ScriptedHost::new(vec![bounce(), bounce(), bounce(), bounce()]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());

        let outcome = loader(host.clone(), outer, cache)
            .run(&meta("bengaluru"), CancellationToken::new())
            .await;

        assert_eq!(outcome, ProbeOutcome::Aborted);
        // Original attempt plus the three rungs.
        assert_eq!(host.navigated().len(), 4);
    }

    #[tokio::test]
    async fn unreadable_address_neither_succeeds_nor_retries() {
        let host = ScriptedHost::new(vec![LoadEvent::unreadable()]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let loader = loader(host.clone(), Arc::clone(&outer), Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            async move { loader.run(&meta, CancellationToken::new()).await }
        });

        sleep(Duration::from_millis(20)).await;
        // No retry navigation happened.
        assert_eq!(host.navigated().len(), 1);

        // The attempt stands: a late result still completes it.
        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataResult {
                    url: target_url("bengaluru"),
                    stats: SeatStats::new(1, 5),
                },
            )
            .unwrap();
        assert_eq!(
            run.await.unwrap(),
            ProbeOutcome::Success(SeatStats::new(1, 5))
        );
    }

    #[tokio::test]
    async fn timeout_fires_and_discards_the_context() {
        let host = ScriptedHost::new(vec![LoadEvent::landed(target_url("bengaluru"))]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());

        let outcome = loader(host.clone(), outer, cache)
            .run(&meta("bengaluru"), CancellationToken::new())
            .await;

        assert_eq!(outcome, ProbeOutcome::TimedOut);
        assert_eq!(*host.discards.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn foreign_results_are_ignored() {
        let host = ScriptedHost::new(vec![LoadEvent::landed(target_url("bengaluru"))]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let loader = loader(host.clone(), Arc::clone(&outer), Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            async move { loader.run(&meta, CancellationToken::new()).await }
        });

        sleep(Duration::from_millis(20)).await;
        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataResult {
                    url: format!("{SITE}/movies/bang/seat-layout/ET999/XXXX/1/20251225"),
                    stats: SeatStats::new(99, 99),
                },
            )
            .unwrap();
        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataResult {
                    url: target_url("bengaluru"),
                    stats: SeatStats::new(2, 8),
                },
            )
            .unwrap();

        assert_eq!(
            run.await.unwrap(),
            ProbeOutcome::Success(SeatStats::new(2, 8))
        );
        assert_eq!(cache.lookup(&format!("{SITE}/movies/bang/seat-layout/ET999/XXXX/1/20251225")), None);
    }

    #[tokio::test]
    async fn parse_error_reports_extraction_failure() {
        let host = ScriptedHost::new(vec![LoadEvent::landed(target_url("bengaluru"))]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let loader = loader(host.clone(), Arc::clone(&outer), Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            async move { loader.run(&meta, CancellationToken::new()).await }
        });

        sleep(Duration::from_millis(20)).await;
        outer
            .post(
                SITE,
                &BridgeMessage::SeatDataError {
                    url: target_url("bengaluru"),
                    reason: "Parse Error".into(),
                },
            )
            .unwrap();

        assert_eq!(
            run.await.unwrap(),
            ProbeOutcome::ExtractionFailed {
                reason: "Parse Error".into()
            }
        );
    }

    #[tokio::test]
    async fn cancellation_wins_over_everything() {
        let host = ScriptedHost::new(vec![LoadEvent::landed(target_url("bengaluru"))]);
        let outer = MessageChannel::new(8);
        let cache = Arc::new(StatsCache::default());
        let cancel = CancellationToken::new();
        let loader = loader(host.clone(), outer, Arc::clone(&cache));

        let run = tokio::spawn({
            let meta = meta("bengaluru");
            let cancel = cancel.clone();
            async move { loader.run(&meta, cancel).await }
        });

        sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert_eq!(run.await.unwrap(), ProbeOutcome::Cancelled);
        assert_eq!(*host.discards.lock().unwrap(), 1);
    }
}
