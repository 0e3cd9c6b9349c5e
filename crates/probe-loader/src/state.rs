use seatlens_core_types::SeatStats;

/// States of one probe session. `Cached`, `Success`, `TimedOut`, and
/// `Aborted` are terminal; `Retrying` always re-enters `Loading`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeState {
    Idle,
    Cached,
    Loading { attempt: u32 },
    Retrying { attempt: u32 },
    Success,
    TimedOut,
    Aborted,
}

impl ProbeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProbeState::Cached | ProbeState::Success | ProbeState::TimedOut | ProbeState::Aborted
        )
    }
}

/// How one probe run ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeOutcome {
    /// Fresh cache entry short-circuited the load.
    Cached(SeatStats),
    /// Stats arrived over the bridge and were cached.
    Success(SeatStats),
    /// The hidden document reached the chart but its payload was
    /// unusable; reported once, never retried.
    ExtractionFailed { reason: String },
    /// The absolute timeout fired before any result.
    TimedOut,
    /// The retry ladder ran dry; no result and no report.
    Aborted,
    /// Torn down externally (mouse leave or a newer hover).
    Cancelled,
}
