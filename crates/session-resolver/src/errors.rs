use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ResolveError {
    /// The hover target carries no showtime (no time pattern, or the
    /// text is too large to be a showtime chip).
    #[error("hover target is not a showtime")]
    NotAShowtime,
    /// The page URL carries no `ET<digits>` event id; no seat-layout URL
    /// is constructible without it.
    #[error("event id missing from page url")]
    MissingEventId,
}
