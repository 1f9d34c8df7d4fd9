// Flatten a transform tree into root-space segment placements.
//
// This is the consumer side of the pipeline, for hosts that just want one
// transform per segment instead of building a scene hierarchy themselves.
// Every branch contributes a local frame (translate along the parent's
// growth axis, rotate, uniform scale) and frames compose down the tree.
//
// Rotation convention: axis A turns about X and axis B turns about Y,
// applied as the Euler sequence Y * X (Z unused). A +90 degree axis-A turn
// tips a branch's growth axis from +Y toward +Z.
//
// A segment is lifted by `-min_y` from its extent so the bottom of its
// model, not its origin, sits on the running offset. Primitives flagged
// `ignore_ambient_scale` keep their parent's position and rotation but are
// placed at unit scale, which is what a scale-neutral intermediate node
// would do in a scene graph.

use crate::extent::ExtentSource;
use crate::symbol::SymbolTable;
use crate::tree::{Node, Rotation, TransformTree};
use glam::{Affine3A, EulerRot, Quat, Vec3};

/// One segment resolved to root space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub primitive: char,
    pub transform: Affine3A,
    /// Ambient scale was dropped for this segment.
    pub scale_neutral: bool,
    /// Number of enclosing branches.
    pub depth: usize,
}

impl Placement {
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.transform.translation)
    }

    /// Uniform scale of the placed model.
    pub fn scale(&self) -> f32 {
        self.transform.matrix3.x_axis.length()
    }

    /// Direction of the model's local +Y in root space.
    pub fn up(&self) -> Vec3 {
        Vec3::from(self.transform.matrix3.y_axis).normalize_or_zero()
    }
}

/// Local frame of a branch node relative to its parent.
pub fn branch_frame(rotation: Rotation, scale: f32, y_offset: f32) -> Affine3A {
    Affine3A::from_scale_rotation_translation(
        Vec3::splat(scale),
        branch_rotation(rotation),
        Vec3::new(0.0, y_offset, 0.0),
    )
}

fn branch_rotation(rotation: Rotation) -> Quat {
    let (a, b) = rotation.to_radians();
    Quat::from_euler(EulerRot::YXZ, b, a, 0.0)
}

/// Accumulated parent state for nodes waiting on the stack.
#[derive(Clone, Copy)]
struct Frame {
    transform: Affine3A,
    /// Accumulated rotation without scale, for scale-neutral segments.
    rotation: Quat,
}

impl Frame {
    const ROOT: Self = Self {
        transform: Affine3A::IDENTITY,
        rotation: Quat::IDENTITY,
    };
}

/// Resolve every segment of `tree` to a root-space placement, in pre-order.
pub fn flatten<E: ExtentSource + ?Sized>(
    tree: &TransformTree,
    table: &SymbolTable,
    extents: &E,
) -> Vec<Placement> {
    let mut placements = Vec::new();
    let mut stack: Vec<(Frame, usize, &Node)> = tree
        .roots
        .iter()
        .rev()
        .map(|node| (Frame::ROOT, 0, node))
        .collect();

    while let Some((parent, depth, node)) = stack.pop() {
        match node {
            Node::Segment {
                primitive,
                local_y_offset,
            } => {
                let lift = *local_y_offset - extents.extent(*primitive).min_y;
                let mut transform = parent.transform * Affine3A::from_translation(Vec3::Y * lift);
                let scale_neutral = table.ignores_ambient_scale(*primitive);
                if scale_neutral {
                    transform = Affine3A::from_rotation_translation(
                        parent.rotation,
                        Vec3::from(transform.translation),
                    );
                }
                placements.push(Placement {
                    primitive: *primitive,
                    transform,
                    scale_neutral,
                    depth,
                });
            }
            Node::Branch {
                local_rotation,
                local_scale,
                local_y_offset,
                children,
            } => {
                let frame = Frame {
                    transform: parent.transform
                        * branch_frame(*local_rotation, *local_scale, *local_y_offset),
                    rotation: parent.rotation * branch_rotation(*local_rotation),
                };
                for child in children.iter().rev() {
                    stack.push((frame, depth + 1, child));
                }
            }
        }
    }

    placements
}
