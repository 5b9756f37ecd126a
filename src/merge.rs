use tracing::warn;

use crate::document::{Document, Node};

/// What to do when the base and overlay disagree on whether a key is a
/// group or a leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapeConflict {
    /// The overlay's node replaces the base's wholesale.
    #[default]
    Replace,
    /// The base's node is kept and the overlay's node dropped.
    KeepBase,
}

/// Result of a deep merge: the merged document plus the dotted paths at
/// which a shape conflict was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub document: Document,
    pub conflicts: Vec<String>,
}

/// Deep-merge `overlay` on top of `base`.
/// Groups on both sides recurse. Leaves in the overlay win. Keys only in the
/// base are kept. Group-versus-leaf disagreements are settled by `policy`
/// and reported either way.
pub fn deep_merge(base: Document, overlay: Document, policy: ShapeConflict) -> Merged {
    let mut conflicts = Vec::new();
    let document = merge_into(base, overlay, policy, "", &mut conflicts);
    Merged {
        document,
        conflicts,
    }
}

fn merge_into(
    mut base: Document,
    overlay: Document,
    policy: ShapeConflict,
    prefix: &str,
    conflicts: &mut Vec<String>,
) -> Document {
    for (key, overlay_node) in overlay.into_entries() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        let merged = match (base.take_entry(&key), overlay_node) {
            (Some(Node::Group(base_doc)), Node::Group(overlay_doc)) => {
                Node::Group(merge_into(base_doc, overlay_doc, policy, &path, conflicts))
            }
            (None, overlay_node) | (Some(Node::Leaf(_)), overlay_node @ Node::Leaf(_)) => {
                overlay_node
            }
            (Some(base_node), overlay_node) => {
                warn!(key = %path, ?policy, "group and leaf collide while merging settings");
                conflicts.push(path);
                match policy {
                    ShapeConflict::Replace => overlay_node,
                    ShapeConflict::KeepBase => base_node,
                }
            }
        };
        base.insert(key, merged);
    }
    base
}
