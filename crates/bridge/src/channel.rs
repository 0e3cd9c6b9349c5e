use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use crate::messages::{decode, BridgeMessage};
use crate::BridgeError;

/// The origin (`scheme://host[:port]`) of a URL, used for the outer-hop
/// sender check.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// A message with the origin of the document that posted it.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub origin: String,
    pub data: Value,
}

/// In-memory transport standing in for one `postMessage` boundary.
///
/// One channel instance is created per hop per probe pipeline; there is
/// no process-wide singleton, so concurrent pipelines (and tests) do not
/// interfere.
pub struct MessageChannel {
    sender: broadcast::Sender<Envelope>,
}

impl MessageChannel {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Post a typed message from a document at `origin`.
    pub fn post(&self, origin: &str, message: &BridgeMessage) -> Result<(), BridgeError> {
        let data =
            serde_json::to_value(message).map_err(|err| BridgeError::Serialize(err.to_string()))?;
        self.post_raw(Envelope {
            origin: origin.to_string(),
            data,
        })
    }

    /// Post an arbitrary body; used by tests to model foreign messages.
    pub fn post_raw(&self, envelope: Envelope) -> Result<(), BridgeError> {
        self.sender
            .send(envelope)
            .map(|_| ())
            .map_err(|_| BridgeError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }
}

/// Receiving side of the outer hop: drops envelopes whose origin differs
/// from the receiving document's own, then drops undecodable shapes.
pub struct OuterReceiver {
    rx: broadcast::Receiver<Envelope>,
    own_origin: String,
}

impl OuterReceiver {
    pub fn new(channel: &MessageChannel, own_origin: impl Into<String>) -> Self {
        Self {
            rx: channel.subscribe(),
            own_origin: own_origin.into(),
        }
    }

    /// Next accepted message, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<BridgeMessage> {
        loop {
            let envelope = match self.rx.recv().await {
                Ok(envelope) => envelope,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(target: "bridge", skipped, "outer receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            if envelope.origin != self.own_origin {
                debug!(
                    target: "bridge",
                    origin = %envelope.origin,
                    "dropping cross-origin envelope"
                );
                continue;
            }
            match decode(&envelope.data) {
                Some(message) => return Some(message),
                None => continue,
            }
        }
    }
}
