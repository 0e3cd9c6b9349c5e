/// Response-header diagnostic for hidden-context loads.
///
/// A seat-layout response carrying `X-Frame-Options` may refuse to render
/// inside the hidden context; the loader logs it so a stuck probe can be
/// explained. Purely observational; nothing branches on it.
const FRAME_OPTIONS: &str = "x-frame-options";

/// The `X-Frame-Options` value among `headers`, if present (header names
/// compared case-insensitively).
pub fn frame_options(headers: &[(String, String)]) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(FRAME_OPTIONS))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn detects_the_header_in_any_case() {
        let observed = headers(&[("Content-Type", "text/html"), ("X-Frame-Options", "DENY")]);
        assert_eq!(frame_options(&observed), Some("DENY"));

        let lower = headers(&[("x-frame-options", "SAMEORIGIN")]);
        assert_eq!(frame_options(&lower), Some("SAMEORIGIN"));
    }

    #[test]
    fn absent_header_yields_none() {
        let observed = headers(&[("Content-Type", "text/html")]);
        assert_eq!(frame_options(&observed), None);
    }
}
