use crate::model::ElementCapture;

const BOOKING_PATH_MARKER: &str = "/buytickets/";
const VENUE_ATTR: &str = "data-venue-code";

/// Walk the captured ancestor chain (hovered element first, body
/// excluded) looking for a venue code. For each element, a booking link
/// is consulted first: its path may carry a 4-character alphanumeric
/// venue token. Failing that, an explicit `data-venue-code` attribute
/// wins. The first ancestor satisfying either ends the walk.
pub fn find_venue_code(ancestors: &[ElementCapture]) -> Option<String> {
    for element in ancestors {
        if let Some(href) = element
            .link_hrefs
            .iter()
            .find(|href| href.contains(BOOKING_PATH_MARKER))
        {
            if let Some(code) = venue_from_href(href) {
                return Some(code);
            }
        }
        if let Some(code) = element.attr(VENUE_ATTR) {
            return Some(code.to_string());
        }
    }
    None
}

/// First path segment that looks like a venue code: exactly 4 uppercase
/// alphanumerics, not purely numeric.
fn venue_from_href(href: &str) -> Option<String> {
    href.split('/')
        .find(|segment| is_venue_token(segment))
        .map(str::to_string)
}

fn is_venue_token(segment: &str) -> bool {
    segment.len() == 4
        && segment
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && !segment.bytes().all(|b| b.is_ascii_digit())
}
