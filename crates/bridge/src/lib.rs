//! Cross-document message bridge.
//!
//! The seat stats are computed inside a hidden secondary document and must
//! travel two hops: page spy → extractor shell (same document, inner hop)
//! and extractor shell → requesting document (outer hop). The outer hop
//! validates the sender origin against the receiver's own; the inner hop
//! is same-document by construction and deliberately does not re-validate.
//! Messages of unrecognized shape are dropped, never errored.

mod channel;
mod messages;
mod relay;

pub use channel::{origin_of, Envelope, MessageChannel, OuterReceiver};
pub use messages::{decode, BridgeMessage, SpySubType};
pub use relay::SpyRelay;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("message channel closed")]
    ChannelClosed,
    #[error("message not serializable: {0}")]
    Serialize(String),
}
