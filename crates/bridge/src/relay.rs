use std::sync::Arc;

use tokio::select;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use seatlens_core_types::SeatStats;

use crate::channel::MessageChannel;
use crate::messages::{decode, BridgeMessage, SpySubType};

const PARSE_ERROR_REASON: &str = "Parse Error";

/// Extractor-shell side of the inner hop.
///
/// Listens on the inner channel for the page spy's stats broadcast and
/// relays it to the parent document on the outer channel: a decodable
/// payload becomes `SEAT_DATA_RESULT`, an undecodable one becomes
/// `SEAT_DATA_ERROR`. The inner hop carries no origin validation; spy
/// and shell share a document by construction.
pub struct SpyRelay {
    inner: Arc<MessageChannel>,
    outer: Arc<MessageChannel>,
    document_url: String,
    origin: String,
    task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl SpyRelay {
    pub fn new(
        inner: Arc<MessageChannel>,
        outer: Arc<MessageChannel>,
        document_url: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            outer,
            document_url: document_url.into(),
            origin: origin.into(),
            task: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn start(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }

        let mut rx = self.inner.subscribe();
        let outer = Arc::clone(&self.outer);
        let document_url = self.document_url.clone();
        let origin = self.origin.clone();
        let shutdown = self.shutdown.clone();

        self.task = Some(tokio::spawn(async move {
            loop {
                select! {
                    _ = shutdown.cancelled() => return,
                    received = rx.recv() => {
                        let envelope = match received {
                            Ok(envelope) => envelope,
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => return,
                        };
                        let Some(message) = decode(&envelope.data) else {
                            continue;
                        };
                        if let BridgeMessage::SpyData { sub_type: SpySubType::KonvaStats, payload } = message {
                            let reply = match serde_json::from_str::<SeatStats>(&payload) {
                                Ok(stats) => {
                                    debug!(
                                        target: "bridge",
                                        available = stats.available,
                                        total = stats.total,
                                        "relaying spy stats to parent"
                                    );
                                    BridgeMessage::SeatDataResult {
                                        url: document_url.clone(),
                                        stats,
                                    }
                                }
                                Err(err) => {
                                    warn!(target: "bridge", %err, "spy payload not parseable");
                                    BridgeMessage::SeatDataError {
                                        url: document_url.clone(),
                                        reason: PARSE_ERROR_REASON.into(),
                                    }
                                }
                            };
                            let _ = outer.post(&origin, &reply);
                        }
                    }
                }
            }
        }));
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for SpyRelay {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}
