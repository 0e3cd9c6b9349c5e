use serde::{Deserialize, Serialize};

use crate::errors::ChartProbeError;

const SHAPE_KINDS: &[&str] = &["Rect", "Circle", "Path"];

/// One node of a serialized scene graph, in the shape the rendering
/// library's own `stage.toJSON()` produces (`className` + `attrs` +
/// `children`). Unknown attrs are ignored on deserialize.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(rename = "className", default)]
    pub class_name: String,
    #[serde(default)]
    pub attrs: NodeAttrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

/// The subset of node attributes the analyzer cares about. The library
/// omits attributes left at their defaults, so every field is optional;
/// visibility in particular defaults to `true` when absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl SceneNode {
    /// Parse a stage dump from its JSON text form.
    pub fn from_json(raw: &str) -> Result<Self, ChartProbeError> {
        serde_json::from_str(raw).map_err(|err| ChartProbeError::MalformedDump(err.to_string()))
    }

    /// The node's own visibility flag, ignoring ancestors.
    pub fn visible_flag(&self) -> bool {
        self.attrs.visible.unwrap_or(true)
    }

    pub fn is_text(&self) -> bool {
        self.class_name == "Text"
    }

    /// Recognized seat-background shape kinds.
    pub fn is_shape(&self) -> bool {
        SHAPE_KINDS.contains(&self.class_name.as_str())
    }

    pub fn trimmed_text(&self) -> &str {
        self.attrs.text.as_deref().unwrap_or("").trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_konva_style_dump() {
        let raw = r##"{
            "className": "Stage",
            "attrs": {"width": 1366, "height": 768},
            "children": [{
                "className": "Layer",
                "children": [{
                    "className": "Group",
                    "children": [
                        {"className": "Rect", "attrs": {"fill": "#ffffff"}},
                        {"className": "Text", "attrs": {"text": "12"}}
                    ]
                }]
            }]
        }"##;
        let stage = SceneNode::from_json(raw).expect("parse dump");
        assert_eq!(stage.class_name, "Stage");
        let group = &stage.children[0].children[0];
        assert!(group.children[0].is_shape());
        assert!(group.children[1].is_text());
        assert_eq!(group.children[1].trimmed_text(), "12");
    }

    #[test]
    fn visibility_defaults_to_true() {
        let node = SceneNode::default();
        assert!(node.visible_flag());
        let hidden: SceneNode =
            serde_json::from_str(r#"{"className": "Rect", "attrs": {"visible": false}}"#).unwrap();
        assert!(!hidden.visible_flag());
    }

    #[test]
    fn malformed_dump_is_an_error() {
        assert!(SceneNode::from_json("{not json").is_err());
    }
}
