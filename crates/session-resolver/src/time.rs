/// Convert a 12-hour `H:MM AM/PM` string to minutes since midnight.
///
/// PM advances hours below 12; noon stays at 720. A string with no
/// `H:MM` pattern yields 0.
pub fn parse_to_minutes(text: &str) -> u32 {
    let Some((hours, minutes)) = first_clock_pair(text) else {
        return 0;
    };
    let upper = text.to_ascii_uppercase();
    let hours = if upper.contains("PM") && hours < 12 {
        hours + 12
    } else {
        hours
    };
    hours * 60 + minutes
}

/// The first `H:MM AM/PM` substring in `text`, as written (1-2 hour
/// digits, exactly 2 minute digits, optional space before the meridiem,
/// any case).
pub fn find_showtime(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if !bytes[index].is_ascii_digit() {
            index += 1;
            continue;
        }
        if let Some(matched) = showtime_at(bytes, index) {
            return Some(matched);
        }
        // Skip the whole digit run so "12:3" does not re-match at "2".
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index += 1;
        }
    }
    None
}

fn showtime_at(bytes: &[u8], start: usize) -> Option<String> {
    let mut cursor = start;
    let hour_digits = digit_run(bytes, cursor);
    if hour_digits == 0 || hour_digits > 2 {
        return None;
    }
    cursor += hour_digits;
    if bytes.get(cursor) != Some(&b':') {
        return None;
    }
    cursor += 1;
    if digit_run(bytes, cursor) != 2 {
        return None;
    }
    cursor += 2;
    if bytes.get(cursor) == Some(&b' ') {
        cursor += 1;
    }
    let meridiem = bytes.get(cursor..cursor + 2)?;
    if !matches!(meridiem[0].to_ascii_uppercase(), b'A' | b'P') {
        return None;
    }
    if meridiem[1].to_ascii_uppercase() != b'M' {
        return None;
    }
    cursor += 2;
    Some(String::from_utf8_lossy(&bytes[start..cursor]).into_owned())
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

fn first_clock_pair(text: &str) -> Option<(u32, u32)> {
    let bytes = text.as_bytes();
    for (colon, byte) in bytes.iter().enumerate() {
        if *byte != b':' {
            continue;
        }
        let hour_start = bytes[..colon]
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map(|position| position + 1)
            .unwrap_or(0);
        if hour_start == colon {
            continue;
        }
        let minute_len = digit_run(bytes, colon + 1);
        if minute_len == 0 {
            continue;
        }
        let hours = text[hour_start..colon].parse().ok()?;
        let minutes = text[colon + 1..colon + 1 + minute_len].parse().ok()?;
        return Some((hours, minutes));
    }
    None
}
