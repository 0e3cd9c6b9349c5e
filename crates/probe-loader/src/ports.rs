use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::LoaderError;

/// Best-effort view of where a hidden-context load ended up.
///
/// Reading the landing address can fail (a cross-origin redirect makes
/// it unreachable); that is a first-class outcome the retry machine
/// treats as "attempt stands", not an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressProbe {
    Landed(String),
    Unreadable,
}

/// Load-complete notification from the hidden context: the landing
/// address plus any response headers the host could observe.
#[derive(Clone, Debug)]
pub struct LoadEvent {
    pub address: AddressProbe,
    pub headers: Vec<(String, String)>,
}

impl LoadEvent {
    pub fn landed(address: impl Into<String>) -> Self {
        Self {
            address: AddressProbe::Landed(address.into()),
            headers: Vec::new(),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            address: AddressProbe::Unreadable,
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// The hidden secondary browsing context, as seen by the loader.
///
/// `navigate` begins a load (replacing any current one) and returns
/// immediately; completion arrives on the `load_events` stream. `discard`
/// drops the context unconditionally; an in-flight network request may
/// still run to completion, but nothing further is delivered.
#[async_trait]
pub trait ContextHost: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), LoaderError>;
    fn load_events(&self) -> broadcast::Receiver<LoadEvent>;
    fn discard(&self);
}
