// Transform tree: the parser's output.
//
// An ordered forest of `Node`s. A `Segment` places one primitive at an
// offset along its parent's growth axis. A `Branch` opens a new local frame:
// it sits at the parent's running offset, rotates by a pair of Euler angles
// (axis A, axis B, in degrees), applies a uniform scale, and holds its own
// ordered children whose offsets restart at zero.
//
// The tree is plain data. Turning it into scene objects is the consumer's
// job; `placement.rs` has a helper that flattens it into root-space
// transforms.
//
// Nesting depth is only bounded by the input string, so everything that
// touches a whole subtree (`Drop`, `Clone`, `PartialEq`, `walk`) runs on an
// explicit work stack. The derived `Debug`, `Serialize` and `Deserialize`
// still recurse: `to_json()` refuses trees deeper than
// `MAX_SERIALIZED_DEPTH`, and `Debug` is only meant for test output on
// small trees.

use serde::{Deserialize, Serialize};

/// Deepest tree `to_json()` will serialize. Each branch costs serde_json
/// three levels of its 128-level read limit, so deeper output could not be
/// read back.
pub const MAX_SERIALIZED_DEPTH: usize = 40;

/// Euler rotation of a branch frame, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Axis A (driven by `+` / `-`).
    pub a: f32,
    /// Axis B (driven by `*` / `/`).
    pub b: f32,
}

impl Rotation {
    pub const ZERO: Self = Self { a: 0.0, b: 0.0 };

    pub fn new(a: f32, b: f32) -> Self {
        Self { a, b }
    }

    pub fn is_zero(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }

    /// `(a, b)` in radians.
    pub fn to_radians(self) -> (f32, f32) {
        (self.a.to_radians(), self.b.to_radians())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Node {
    Segment {
        primitive: char,
        local_y_offset: f32,
    },
    Branch {
        local_rotation: Rotation,
        local_scale: f32,
        local_y_offset: f32,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn local_y_offset(&self) -> f32 {
        match self {
            Node::Segment { local_y_offset, .. } | Node::Branch { local_y_offset, .. } => {
                *local_y_offset
            }
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Node::Branch { .. })
    }

    /// Children of a branch; empty for a segment.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Segment { .. } => &[],
            Node::Branch { children, .. } => children.as_slice(),
        }
    }

    /// Copy of this node's own fields with `children` in place of its
    /// subtree. Segments ignore `children`.
    fn with_children(&self, children: Vec<Node>) -> Node {
        match self {
            Node::Segment {
                primitive,
                local_y_offset,
            } => Node::Segment {
                primitive: *primitive,
                local_y_offset: *local_y_offset,
            },
            Node::Branch {
                local_rotation,
                local_scale,
                local_y_offset,
                ..
            } => Node::Branch {
                local_rotation: *local_rotation,
                local_scale: *local_scale,
                local_y_offset: *local_y_offset,
                children,
            },
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let Node::Branch { children, .. } = self else {
            return;
        };
        if !children.iter().any(Node::is_branch) {
            return;
        }
        // Detach grandchildren before each child drops, so every drop below
        // sees an empty child list.
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Node::Branch { children, .. } = &mut node {
                pending.append(children);
            }
        }
    }
}

/// One branch being rebuilt by `Node::clone()`.
struct CloneFrame<'a> {
    source: &'a Node,
    next: usize,
    cloned: Vec<Node>,
}

impl<'a> CloneFrame<'a> {
    fn new(source: &'a Node) -> Self {
        Self {
            source,
            next: 0,
            cloned: Vec::with_capacity(source.children().len()),
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        let mut ancestors: Vec<CloneFrame<'_>> = Vec::new();
        let mut current = CloneFrame::new(self);
        loop {
            let source = current.source;
            if let Some(child) = source.children().get(current.next) {
                current.next += 1;
                ancestors.push(std::mem::replace(&mut current, CloneFrame::new(child)));
                continue;
            }
            let node = source.with_children(current.cloned);
            match ancestors.pop() {
                Some(mut parent) => {
                    parent.cloned.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            match (a, b) {
                (
                    Node::Segment {
                        primitive: pa,
                        local_y_offset: oa,
                    },
                    Node::Segment {
                        primitive: pb,
                        local_y_offset: ob,
                    },
                ) => {
                    if pa != pb || oa != ob {
                        return false;
                    }
                }
                (
                    Node::Branch {
                        local_rotation: ra,
                        local_scale: sa,
                        local_y_offset: oa,
                        children: ca,
                    },
                    Node::Branch {
                        local_rotation: rb,
                        local_scale: sb,
                        local_y_offset: ob,
                        children: cb,
                    },
                ) => {
                    if ra != rb || sa != sb || oa != ob || ca.len() != cb.len() {
                        return false;
                    }
                    pending.extend(ca.iter().zip(cb.iter()));
                }
                _ => return false,
            }
        }
        true
    }
}

/// Ordered forest produced by `parse_branch_structure()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformTree {
    pub roots: Vec<Node>,
}

impl TransformTree {
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total segments at every depth.
    pub fn segment_count(&self) -> usize {
        self.walk().filter(|(_, n)| !n.is_branch()).count()
    }

    /// Total branches at every depth.
    pub fn branch_count(&self) -> usize {
        self.walk().filter(|(_, n)| n.is_branch()).count()
    }

    /// Deepest branch nesting level; 0 for a flat tree.
    pub fn max_depth(&self) -> usize {
        self.walk()
            .filter(|(_, n)| n.is_branch())
            .map(|(depth, _)| depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pre-order traversal yielding `(nesting depth, node)`.
    ///
    /// Uses an explicit stack, so arbitrarily deep trees are fine.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|n| (0, n)).collect(),
        }
    }

    /// Serialize to JSON for debugging or handing to an out-of-process
    /// consumer. Fails for trees nested deeper than `MAX_SERIALIZED_DEPTH`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let depth = self.max_depth();
        if depth > MAX_SERIALIZED_DEPTH {
            return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "tree depth {depth} exceeds serializable depth {MAX_SERIALIZED_DEPTH}"
            )));
        }
        serde_json::to_string(self)
    }
}

/// Iterator returned by `TransformTree::walk()`.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children().iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}
