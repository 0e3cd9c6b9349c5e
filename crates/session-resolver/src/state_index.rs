use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use seatlens_core_types::ShowtimeSessionRef;

use crate::time::parse_to_minutes;

/// Literal marker embedded in the host page's bootstrap script.
pub const STATE_MARKER: &str = "__INITIAL_STATE__";

const SHOWTIME_ROOTS: &[&str] = &["showtimesByEvent", "showTimes"];

/// Extract the balanced JSON object starting at `start` (which must point
/// at a `{`). The scan is string-aware, including escaped quotes, because
/// the object sits inside a larger non-JSON script body and a naive parse
/// of the whole body would fail.
pub fn extract_balanced_json(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }
    let mut balance = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => balance += 1,
            b'}' => {
                balance -= 1;
                if balance == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Mapping from minutes-since-midnight to the showtime sessions starting
/// at that minute, in blob order. Built once per page capture from the
/// initial-state blob; never mutated afterward.
#[derive(Debug, Default)]
pub struct TimeIndex {
    buckets: HashMap<u32, Vec<ShowtimeSessionRef>>,
}

impl TimeIndex {
    /// Build the index from the page's script bodies. Scripts without the
    /// state marker, or with an unparseable blob, contribute nothing.
    pub fn from_scripts<'a>(scripts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = TimeIndex::default();
        for script in scripts {
            let Some(marker_at) = script.find(STATE_MARKER) else {
                continue;
            };
            let Some(brace_at) = script[marker_at..].find('{').map(|off| marker_at + off) else {
                continue;
            };
            let Some(raw) = extract_balanced_json(script, brace_at) else {
                warn!(target: "session-resolver", "state marker found but blob not balanced");
                continue;
            };
            let state: Value = match serde_json::from_str(raw) {
                Ok(state) => state,
                Err(err) => {
                    warn!(target: "session-resolver", %err, "state blob not parseable");
                    continue;
                }
            };
            for root_key in SHOWTIME_ROOTS {
                if let Some(root) = state.get(root_key) {
                    index.visit(root, None);
                    break;
                }
            }
        }
        debug!(
            target: "session-resolver",
            buckets = index.buckets.len(),
            "time index built"
        );
        index
    }

    /// Candidates whose showtime starts at `minutes`, in insertion order.
    pub fn candidates(&self, minutes: u32) -> &[ShowtimeSessionRef] {
        self.buckets
            .get(&minutes)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn session_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Depth-first walk carrying the nearest enclosing venue code as
    /// context, so sessions nested under a venue object inherit its code.
    fn visit(&mut self, node: &Value, context_venue: Option<&str>) {
        match node {
            Value::Object(map) => {
                let venue = map
                    .get("venueCode")
                    .and_then(Value::as_str)
                    .or(context_venue);
                if let (Some(show_time), Some(session_id)) =
                    (map.get("showTime"), map.get("sessionId"))
                {
                    if let (Some(time_text), Some(id_text)) =
                        (show_time.as_str(), scalar_to_string(session_id))
                    {
                        let minutes = parse_to_minutes(time_text);
                        self.buckets.entry(minutes).or_default().push(
                            ShowtimeSessionRef::new(id_text, venue.map(str::to_string)),
                        );
                    }
                }
                for value in map.values() {
                    self.visit(value, venue);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.visit(item, context_venue);
                }
            }
            _ => {}
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
