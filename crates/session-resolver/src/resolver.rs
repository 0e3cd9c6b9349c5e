use tracing::debug;

use seatlens_core_types::SeatLayoutMeta;

use crate::errors::ResolveError;
use crate::model::{HoverTarget, PageCapture};
use crate::page_url::{find_date, find_event_id, find_region};
use crate::state_index::TimeIndex;
use crate::time::parse_to_minutes;
use crate::venue::find_venue_code;

pub const DEFAULT_DATE: &str = "20251225";
pub const DEFAULT_REGION: &str = "bang";
pub const DEFAULT_VENUE: &str = "PVOO";

/// Per-page-load resolver: owns the time index built from the capture's
/// state blob and the page URL the date/event/region fields come from.
/// Constructed once per page capture and discarded on navigation.
pub struct SessionResolver {
    page_url: String,
    index: TimeIndex,
}

impl SessionResolver {
    pub fn new(capture: &PageCapture) -> Self {
        let index = TimeIndex::from_scripts(capture.scripts.iter().map(String::as_str));
        Self {
            page_url: capture.url.clone(),
            index,
        }
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Resolve a hover into the full seat-layout meta.
    ///
    /// Identifier policy: a purely numeric token is trusted as the
    /// session id outright. Otherwise the time bucket is consulted:
    /// venue-matching candidate first, then the first candidate, and for
    /// an empty bucket the raw token itself (an explicitly degraded path
    /// that may yield an unloadable URL).
    pub fn resolve(&self, hover: &HoverTarget) -> Result<SeatLayoutMeta, ResolveError> {
        let intent = hover.intent().ok_or(ResolveError::NotAShowtime)?;
        let venue = find_venue_code(&hover.ancestors);

        let session_id = if is_numeric(&intent.token) {
            intent.token.clone()
        } else {
            let minutes = parse_to_minutes(&intent.time);
            let candidates = self.index.candidates(minutes);
            if let Some(first) = candidates.first() {
                candidates
                    .iter()
                    .find(|candidate| candidate.venue_code == venue)
                    .unwrap_or(first)
                    .session_id
                    .clone()
            } else {
                debug!(
                    target: "session-resolver",
                    token = %intent.token,
                    minutes,
                    "empty time bucket, degrading to raw token"
                );
                intent.token.clone()
            }
        };

        let event_id = find_event_id(&self.page_url).ok_or(ResolveError::MissingEventId)?;
        let meta = SeatLayoutMeta {
            session_id,
            venue_code: venue.unwrap_or_else(|| DEFAULT_VENUE.to_string()),
            event_id,
            date: find_date(&self.page_url).unwrap_or_else(|| DEFAULT_DATE.to_string()),
            region: find_region(&self.page_url).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };
        debug!(target: "session-resolver", %meta, "hover resolved");
        Ok(meta)
    }
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
