//! Session resolution for hovered showtimes.
//!
//! Turns an ambiguous hover target (an element whose text contains a
//! `H:MM AM/PM` time) into the five concrete fields of a seat-layout URL,
//! consulting a time-of-day index built once per page capture from the
//! host's embedded initial-state blob.

mod errors;
mod model;
mod page_url;
mod resolver;
mod state_index;
mod time;
mod venue;

pub use errors::ResolveError;
pub use model::{ElementCapture, HoverIntent, HoverTarget, PageCapture};
pub use page_url::{find_date, find_event_id, find_region};
pub use resolver::{SessionResolver, DEFAULT_DATE, DEFAULT_REGION, DEFAULT_VENUE};
pub use state_index::{extract_balanced_json, TimeIndex, STATE_MARKER};
pub use time::{find_showtime, parse_to_minutes};
pub use venue::find_venue_code;
