use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one hover-probe interaction.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProbeId(pub String);

impl ProbeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ProbeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat counts extracted from one rendered seating chart.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatStats {
    pub available: u32,
    pub total: u32,
}

impl SeatStats {
    pub fn new(available: u32, total: u32) -> Self {
        Self { available, total }
    }
}

/// Presentation-facing state of one probe: still loading, failed, or counted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SeatReport {
    Loading,
    Error { reason: String },
    Stats(SeatStats),
}

/// One showtime candidate from the host page's initial-state blob.
///
/// Immutable once built; scoped to the lifetime of one page capture.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShowtimeSessionRef {
    pub session_id: String,
    pub venue_code: Option<String>,
}

impl ShowtimeSessionRef {
    pub fn new(session_id: impl Into<String>, venue_code: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            venue_code,
        }
    }
}

/// The five fields that fully determine a canonical seat-layout URL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatLayoutMeta {
    pub session_id: String,
    pub venue_code: String,
    pub event_id: String,
    pub date: String,
    pub region: String,
}

impl SeatLayoutMeta {
    /// Canonical seat-layout URL for this meta on the given host.
    pub fn canonical_url(&self, host: &str) -> String {
        format!(
            "{}/movies/{}/seat-layout/{}/{}/{}/{}",
            host.trim_end_matches('/'),
            self.region,
            self.event_id,
            self.venue_code,
            self.session_id,
            self.date
        )
    }

    /// Copy of this meta with a rewritten region, used by retry attempts.
    pub fn with_region(&self, region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for SeatLayoutMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session={} venue={} event={} date={} region={}",
            self.session_id, self.venue_code, self.event_id, self.date, self.region
        )
    }
}
