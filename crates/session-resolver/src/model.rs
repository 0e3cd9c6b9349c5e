use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::time::find_showtime;

/// Hovered-element text longer than this is never a showtime chip.
const HOVER_TEXT_CAP: usize = 50;
/// Containers with more text than this are layout blocks, not chips.
const CONTAINER_TEXT_CAP: usize = 60;

const SESSION_ATTRS: &[&str] = &["data-id", "data-session-id"];

/// One captured element of the hover's ancestor chain: its attributes
/// and the hrefs of any links it carries (itself included, when it is an
/// anchor).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElementCapture {
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub link_hrefs: Vec<String>,
}

impl ElementCapture {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// What the pointer is over: the element's own text, the text of its
/// nearest chip container, and the ancestor chain (container first, body
/// excluded) the venue walk climbs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HoverTarget {
    pub text: String,
    #[serde(default)]
    pub container_text: String,
    #[serde(default)]
    pub ancestors: Vec<ElementCapture>,
}

/// A hover that passed the showtime filters: the extracted time string
/// and the identifier token (an explicit session attribute when present,
/// otherwise the time string itself).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HoverIntent {
    pub time: String,
    pub token: String,
}

impl HoverTarget {
    /// The chip container: first element of the captured chain.
    pub fn container(&self) -> Option<&ElementCapture> {
        self.ancestors.first()
    }

    /// Extract the showtime intent, or `None` when this hover should be
    /// ignored (no time pattern, or text too large to be a chip).
    pub fn intent(&self) -> Option<HoverIntent> {
        if self.text.chars().count() > HOVER_TEXT_CAP {
            return None;
        }
        let time = find_showtime(&self.text)?;
        if self.container_text.chars().count() > CONTAINER_TEXT_CAP {
            return None;
        }
        let token = self
            .container()
            .and_then(|container| {
                SESSION_ATTRS
                    .iter()
                    .find_map(|attr| container.attr(attr))
            })
            .map(str::to_string)
            .unwrap_or_else(|| time.clone());
        Some(HoverIntent { time, token })
    }
}

/// Serialized inputs of one showtimes page: its URL and the text of its
/// script elements (one of which embeds the initial-state blob).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageCapture {
    pub url: String,
    #[serde(default)]
    pub scripts: Vec<String>,
}
