//! Scripted context host for replayed captures.
//!
//! Drives the probe pipeline without a live browser: each canonical URL
//! maps to a scripted landing address, optional response headers, and
//! optional chart content. When a navigation lands on a seat-layout page
//! with content, the fixture boots the same hidden-document machinery a
//! real context would run: render poller, page spy broadcast, and the
//! spy relay back to the parent document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use chart_probe::{ChartProbeError, RenderPoller, SceneNode, StagePort};
use probe_loader::{AddressProbe, ContextHost, LoadEvent, LoaderError};
use seatlens_bridge::{origin_of, BridgeMessage, MessageChannel, SpyRelay, SpySubType};
use stats_cache::canonical_key;

const TARGET_MARKER: &str = "seat-layout";

/// Scripted behavior for one canonical URL.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageScript {
    /// Address the hidden context reports landing on; omitted means the
    /// requested URL itself.
    pub landed: Option<String>,
    /// The landing address cannot be read (cross-origin redirect).
    pub unreadable: bool,
    /// Rendered chart content, in the scene-graph dump shape.
    pub stage: Option<SceneNode>,
    /// Raw spy payload override, for scripting malformed broadcasts.
    pub spy_payload: Option<String>,
    /// Observable response headers.
    pub headers: Vec<(String, String)>,
    /// Poll ticks the chart stays unrendered before the stage appears.
    pub polls_before_render: u32,
}

/// The hidden-document machinery for one seat-layout load; dropping it
/// tears the document down.
struct HiddenDocument {
    // Held for their cancel-on-drop behavior.
    #[allow(dead_code)]
    poller: Option<RenderPoller>,
    #[allow(dead_code)]
    relay: SpyRelay,
    feeder: JoinHandle<()>,
}

impl Drop for HiddenDocument {
    fn drop(&mut self) {
        self.feeder.abort();
    }
}

/// Stage registry whose chart appears after a scripted number of polls.
struct StaticStagePort {
    stage: SceneNode,
    delay: AtomicU32,
}

#[async_trait]
impl StagePort for StaticStagePort {
    async fn stages(&self) -> Result<Vec<SceneNode>, ChartProbeError> {
        let remaining = self.delay.load(Ordering::SeqCst);
        if remaining > 0 {
            self.delay.store(remaining - 1, Ordering::SeqCst);
            return Ok(vec![]);
        }
        Ok(vec![self.stage.clone()])
    }
}

pub struct FixtureHost {
    pages: HashMap<String, PageScript>,
    bounce_address: String,
    outer: Arc<MessageChannel>,
    origin: String,
    poll_interval: Duration,
    events: broadcast::Sender<LoadEvent>,
    live: Mutex<Vec<HiddenDocument>>,
    navigations: Mutex<Vec<String>>,
}

impl FixtureHost {
    /// `pages` is keyed by canonical URL (no query string). Unknown URLs
    /// bounce to the site's explore page, which is what the real host
    /// does with a bad region slug.
    pub fn new(
        pages: HashMap<String, PageScript>,
        outer: Arc<MessageChannel>,
        site_host: &str,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        let origin = origin_of(site_host).unwrap_or_else(|| site_host.to_string());
        Arc::new(Self {
            pages,
            bounce_address: format!("{}/explore/home", site_host.trim_end_matches('/')),
            outer,
            origin,
            poll_interval,
            events,
            live: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        })
    }

    /// URLs navigated so far, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    fn boot_document(&self, script: &PageScript, document_url: &str) {
        let inner = MessageChannel::new(8);
        let mut relay = SpyRelay::new(
            Arc::clone(&inner),
            Arc::clone(&self.outer),
            document_url,
            self.origin.clone(),
        );
        relay.start();

        let origin = self.origin.clone();
        let (poller, feeder) = if let Some(payload) = script.spy_payload.clone() {
            let spy_channel = Arc::clone(&inner);
            let feeder = tokio::spawn(async move {
                let _ = spy_channel.post(
                    &origin,
                    &BridgeMessage::SpyData {
                        sub_type: SpySubType::KonvaStats,
                        payload,
                    },
                );
            });
            (None, feeder)
        } else if let Some(stage) = script.stage.clone() {
            let port = Arc::new(StaticStagePort {
                stage,
                delay: AtomicU32::new(script.polls_before_render),
            });
            let mut poller = RenderPoller::new(port, self.poll_interval);
            let (tx, rx) = oneshot::channel();
            poller.start(tx);
            let spy_channel = Arc::clone(&inner);
            let feeder = tokio::spawn(async move {
                if let Ok(stats) = rx.await {
                    let payload = serde_json::to_string(&stats).unwrap_or_default();
                    let _ = spy_channel.post(
                        &origin,
                        &BridgeMessage::SpyData {
                            sub_type: SpySubType::KonvaStats,
                            payload,
                        },
                    );
                }
            });
            (Some(poller), feeder)
        } else {
            // Target page with no chart content: the document idles and
            // the probe's own timeout decides.
            return;
        };

        self.live.lock().push(HiddenDocument {
            poller,
            relay,
            feeder,
        });
    }
}

#[async_trait]
impl ContextHost for FixtureHost {
    async fn navigate(&self, url: &str) -> Result<(), LoaderError> {
        let canonical = canonical_key(url);
        self.navigations.lock().push(url.to_string());

        let script = self.pages.get(&canonical);
        let (address, headers, document_url) = match script {
            Some(script) => {
                let document_url = script.landed.clone().unwrap_or_else(|| canonical.clone());
                let address = if script.unreadable {
                    AddressProbe::Unreadable
                } else {
                    AddressProbe::Landed(document_url.clone())
                };
                (address, script.headers.clone(), Some(document_url))
            }
            None => (
                AddressProbe::Landed(self.bounce_address.clone()),
                Vec::new(),
                None,
            ),
        };

        debug!(target: "fixture", %url, ?address, "fixture navigation");

        if let (Some(script), Some(document_url)) = (script, document_url) {
            if document_url.contains(TARGET_MARKER) {
                // Re-pointing the context replaces any previous document.
                self.discard();
                self.boot_document(script, &document_url);
            }
        }

        let _ = self.events.send(LoadEvent { address, headers });
        Ok(())
    }

    fn load_events(&self) -> broadcast::Receiver<LoadEvent> {
        self.events.subscribe()
    }

    fn discard(&self) {
        self.live.lock().clear();
    }
}
