//! Speculative loading of hidden seat-layout documents.
//!
//! One hover interaction owns one probe: a hidden browsing context is
//! pointed at the computed seat-layout URL, the landing address is
//! inspected best-effort, and a ladder of region-slug hypotheses is tried
//! when the load misses the target page. A 20-second absolute timeout
//! races everything, and at most one probe is ever active: starting a
//! new hover tears the previous one down first.

mod errors;
mod headers;
mod ladder;
mod loader;
mod ports;
mod session;
mod state;

pub use errors::LoaderError;
pub use headers::frame_options;
pub use ladder::{RetryLadder, MAX_RETRIES};
pub use loader::{SpeculativeLoader, DEFAULT_PROBE_TIMEOUT};
pub use ports::{AddressProbe, ContextHost, LoadEvent};
pub use session::{ActiveProbe, HoverCoordinator};
pub use state::{ProbeOutcome, ProbeState};
