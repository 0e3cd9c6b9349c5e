use seatlens_core_types::SeatStats;

use crate::model::SceneNode;

const AVAILABLE_STROKE: &str = "#2ecc71";

/// Compute available/total seat counts from a rendered stage.
///
/// A seat is a visible text node whose trimmed content is purely numeric,
/// paired with the first shape-kind sibling in the same group. The pair
/// counts toward `total` only when that background shape is visible, and
/// additionally toward `available` when its fill is white or its stroke
/// is the availability green. Returns `None` when no seat pairs were
/// found; the chart may simply not have populated yet.
pub fn analyze_stage(stage: &SceneNode) -> Option<SeatStats> {
    let mut stats = SeatStats::default();
    visit_group(stage, stage.visible_flag(), &mut stats);
    (stats.total > 0).then_some(stats)
}

fn visit_group(node: &SceneNode, node_visible: bool, stats: &mut SeatStats) {
    for (index, child) in node.children.iter().enumerate() {
        let child_visible = node_visible && child.visible_flag();
        if child.is_text() && child_visible && is_seat_label(child.trimmed_text()) {
            if let Some(bg) = background_sibling(node, index) {
                if node_visible && bg.visible_flag() {
                    stats.total += 1;
                    if is_available(bg) {
                        stats.available += 1;
                    }
                }
            }
        }
        visit_group(child, child_visible, stats);
    }
}

/// First sibling of the text node at `text_index` that is a recognized
/// shape kind. Visibility is judged afterwards: an invisible first match
/// means the pair is skipped, not that a later shape is substituted.
fn background_sibling(parent: &SceneNode, text_index: usize) -> Option<&SceneNode> {
    parent
        .children
        .iter()
        .enumerate()
        .find(|(index, sibling)| *index != text_index && sibling.is_shape())
        .map(|(_, sibling)| sibling)
}

fn is_seat_label(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_available(shape: &SceneNode) -> bool {
    let fill = shape.attrs.fill.as_deref().unwrap_or("").to_lowercase();
    let stroke = shape.attrs.stroke.as_deref().unwrap_or("").to_lowercase();
    fill == "#ffffff" || fill == "white" || stroke == AVAILABLE_STROKE
}
