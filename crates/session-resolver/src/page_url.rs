/// Fields recovered from the showtimes page's own URL.
const REGION_MARKER: &str = "movies";
const EVENT_PREFIX: &str = "ET";

/// First path segment consisting of exactly 8 digits (a `yyyymmdd` date).
pub fn find_date(page_url: &str) -> Option<String> {
    page_url
        .split('/')
        .find(|segment| segment.len() == 8 && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

/// First `ET<digits>` token anywhere in the URL.
pub fn find_event_id(page_url: &str) -> Option<String> {
    let bytes = page_url.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = page_url[search_from..].find(EVENT_PREFIX) {
        let start = search_from + offset;
        let digits = bytes[start + EVENT_PREFIX.len()..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            return Some(page_url[start..start + EVENT_PREFIX.len() + digits].to_string());
        }
        search_from = start + EVENT_PREFIX.len();
    }
    None
}

/// Path segment following the `movies` marker (the region slug).
pub fn find_region(page_url: &str) -> Option<String> {
    let mut segments = page_url.split('/');
    segments
        .by_ref()
        .find(|segment| *segment == REGION_MARKER)?;
    segments
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
