// Branch interpreter: bracketed symbol string -> transform tree.
//
// Grammar of the expanded string, scanned left to right:
//
//   string  := item*
//   item    := branch | primitive
//   branch  := '[' scale rotation string ']'
//   scale   := [0-9]* ('.' [0-9]*)?      (at least one digit required)
//   rotation:= ('+' | '-' | '*' | '/')*
//
// Each nesting level keeps a running offset along its growth axis, starting
// at 0. A primitive emits a `Segment` at the current offset and then advances
// it by the primitive's height (zero unless an `ExtentSource` says
// otherwise; negative or NaN heights count as zero, so offsets never
// decrease). A branch is placed at the parent's current offset and does not
// advance it, so sibling segments after a branch continue from where the
// segment before the branch ended.
//
// Brackets are matched by depth counting. Matching is precomputed in one
// pass, and nesting is handled with an explicit stack of open branches
// rather than recursion. The resulting tree also clones, compares and drops
// without recursing (see `tree.rs`), so deep input never exhausts the call
// stack on its way through the parser and back out to the caller.
//
// Rotation markers are only meaningful in a branch's rotation prefix.
// Anywhere else they fall through to the primitive lookup and are reported
// as unknown primitives, as is a stray `]` at the top level.
//
// See also: `tree.rs` for the output type, `extent.rs` for segment heights,
// `placement.rs` for composing the tree into root-space transforms.

use crate::error::ParseError;
use crate::extent::{ExtentSource, NoExtent};
use crate::symbol::{
    AXIS_A_NEGATIVE, AXIS_A_POSITIVE, AXIS_B_NEGATIVE, AXIS_B_POSITIVE, BRANCH_CLOSE, BRANCH_OPEN,
    SymbolTable,
};
use crate::tree::{Node, Rotation, TransformTree};

/// Parse an expanded string into a transform tree with all offsets at 0.
///
/// `axis_a_step` and `axis_b_step` are the degrees contributed by each
/// rotation marker on the respective axis.
pub fn parse_branch_structure(
    symbols: &str,
    table: &SymbolTable,
    axis_a_step: f32,
    axis_b_step: f32,
) -> Result<TransformTree, ParseError> {
    parse_branch_structure_with_extents(symbols, table, axis_a_step, axis_b_step, &NoExtent)
}

/// Like `parse_branch_structure()`, but each segment advances its level's
/// running offset by the height reported by `extents`.
pub fn parse_branch_structure_with_extents<E: ExtentSource + ?Sized>(
    symbols: &str,
    table: &SymbolTable,
    axis_a_step: f32,
    axis_b_step: f32,
    extents: &E,
) -> Result<TransformTree, ParseError> {
    let chars: Vec<char> = symbols.chars().collect();
    let closes = match_brackets(&chars);

    let mut root = Level::default();
    let mut open: Vec<OpenBranch> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if open.last().is_some_and(|b| b.close == i) {
            if let Some(done) = open.pop() {
                let node = done.into_node();
                current_level(&mut root, &mut open).children.push(node);
            }
            i += 1;
            continue;
        }

        let symbol = chars[i];
        if symbol == BRANCH_OPEN {
            let close = closes[i].ok_or(ParseError::UnterminatedBranch { position: i })?;
            let body = &chars[i + 1..close];
            let (scale_len, scale) =
                scale_prefix(body).ok_or(ParseError::MissingScale { position: i })?;
            let turns = rotation_prefix(&body[scale_len..]);

            let offset = current_level(&mut root, &mut open).offset;
            open.push(OpenBranch {
                close,
                rotation: Rotation::new(
                    axis_a_step * turns.a as f32,
                    axis_b_step * turns.b as f32,
                ),
                scale,
                offset,
                level: Level::default(),
            });
            i += 1 + scale_len + turns.len;
        } else {
            if !table.is_primitive(symbol) {
                return Err(ParseError::UnknownPrimitive {
                    symbol,
                    position: i,
                });
            }
            let level = current_level(&mut root, &mut open);
            level.children.push(Node::Segment {
                primitive: symbol,
                local_y_offset: level.offset,
            });
            level.offset += extents.extent(symbol).height.max(0.0);
            i += 1;
        }
    }

    Ok(TransformTree::new(root.children))
}

/// Children collected so far at one nesting level.
#[derive(Default)]
struct Level {
    offset: f32,
    children: Vec<Node>,
}

struct OpenBranch {
    /// Index of the matching close marker.
    close: usize,
    rotation: Rotation,
    scale: f32,
    /// Parent's running offset when the branch was opened.
    offset: f32,
    level: Level,
}

impl OpenBranch {
    fn into_node(self) -> Node {
        Node::Branch {
            local_rotation: self.rotation,
            local_scale: self.scale,
            local_y_offset: self.offset,
            children: self.level.children,
        }
    }
}

fn current_level<'a>(root: &'a mut Level, open: &'a mut [OpenBranch]) -> &'a mut Level {
    match open.last_mut() {
        Some(branch) => &mut branch.level,
        None => root,
    }
}

/// For every `[` at index `i`, `result[i]` is the index of its matching `]`,
/// or `None` if the depth never returns to zero. Other indices are `None`.
fn match_brackets(chars: &[char]) -> Vec<Option<usize>> {
    let mut closes = vec![None; chars.len()];
    let mut pending = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == BRANCH_OPEN {
            pending.push(i);
        } else if c == BRANCH_CLOSE {
            // An unmatched close at depth zero pairs with nothing.
            if let Some(open) = pending.pop() {
                closes[open] = Some(i);
            }
        }
    }
    closes
}

/// Length and value of the decimal literal at the start of `body`.
///
/// `None` if the literal has no digits at all (empty, or a bare `.`).
fn scale_prefix(body: &[char]) -> Option<(usize, f32)> {
    let int_digits = body.iter().take_while(|c| c.is_ascii_digit()).count();
    let mut len = int_digits;
    let mut frac_digits = 0;
    if body.get(len) == Some(&'.') {
        frac_digits = body[len + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        len += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    let literal: String = body[..len].iter().collect();
    literal.parse::<f32>().ok().map(|scale| (len, scale))
}

/// Net marker counts from a rotation prefix.
#[derive(Debug, Default, PartialEq)]
struct Turns {
    len: usize,
    a: i64,
    b: i64,
}

fn rotation_prefix(body: &[char]) -> Turns {
    let mut turns = Turns::default();
    for &c in body {
        match c {
            AXIS_A_POSITIVE => turns.a += 1,
            AXIS_A_NEGATIVE => turns.a -= 1,
            AXIS_B_POSITIVE => turns.b += 1,
            AXIS_B_NEGATIVE => turns.b -= 1,
            _ => break,
        }
        turns.len += 1;
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::SegmentExtent;
    use crate::symbol::{PrimitiveSpec, build_symbol_table};
    use std::collections::BTreeMap;

    fn table(symbols: &str) -> SymbolTable {
        let specs: Vec<_> = symbols.chars().map(PrimitiveSpec::new).collect();
        build_symbol_table(&specs, &[]).unwrap()
    }

    fn parse(s: &str) -> Result<TransformTree, ParseError> {
        parse_branch_structure(s, &table("ABCFL"), 30.0, 45.0)
    }

    fn seg(primitive: char, local_y_offset: f32) -> Node {
        Node::Segment {
            primitive,
            local_y_offset,
        }
    }

    #[test]
    fn flat_string_yields_ordered_segments() {
        let tree = parse("AB").unwrap();
        assert_eq!(tree.roots, vec![seg('A', 0.0), seg('B', 0.0)]);
    }

    #[test]
    fn empty_string_yields_empty_tree() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn scaled_branch_with_children() {
        let tree = parse("[2.0AB]").unwrap();
        assert_eq!(
            tree.roots,
            vec![Node::Branch {
                local_rotation: Rotation::ZERO,
                local_scale: 2.0,
                local_y_offset: 0.0,
                children: vec![seg('A', 0.0), seg('B', 0.0)],
            }]
        );
    }

    #[test]
    fn rotation_count_matches_marker_occurrences() {
        let tree = parse("[2.0++A]").unwrap();
        assert_eq!(
            tree.roots,
            vec![Node::Branch {
                local_rotation: Rotation::new(60.0, 0.0),
                local_scale: 2.0,
                local_y_offset: 0.0,
                children: vec![seg('A', 0.0)],
            }]
        );

        let tree = parse("[2.0+A]").unwrap();
        match &tree.roots[0] {
            Node::Branch { local_rotation, .. } => assert_eq!(local_rotation.a, 30.0),
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn rotation_counts_are_net_and_per_axis() {
        let tree = parse("[1+-*//-A]").unwrap();
        match &tree.roots[0] {
            Node::Branch {
                local_rotation,
                children,
                ..
            } => {
                assert_eq!(*local_rotation, Rotation::new(-30.0, -45.0));
                assert_eq!(children, &vec![seg('A', 0.0)]);
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn missing_scale_is_an_error() {
        assert_eq!(
            parse("[AB]"),
            Err(ParseError::MissingScale { position: 0 })
        );
        assert_eq!(parse("A[+B]"), Err(ParseError::MissingScale { position: 1 }));
        // A bare dot has no digits on either side.
        assert_eq!(parse("[.A]"), Err(ParseError::MissingScale { position: 0 }));
        assert_eq!(parse("[]"), Err(ParseError::MissingScale { position: 0 }));
    }

    #[test]
    fn scale_literals_may_omit_either_side_of_the_dot() {
        let scales: Vec<f32> = ["[3.A]", "[.5A]", "[0.25A]", "[7A]"]
            .iter()
            .map(|s| match &parse(s).unwrap().roots[0] {
                Node::Branch { local_scale, .. } => *local_scale,
                other => panic!("expected branch, got {other:?}"),
            })
            .collect();
        assert_eq!(scales, vec![3.0, 0.5, 0.25, 7.0]);
    }

    #[test]
    fn unterminated_branch_is_an_error() {
        assert_eq!(
            parse("[A"),
            Err(ParseError::UnterminatedBranch { position: 0 })
        );
        assert_eq!(
            parse("A[1.0[1.0B]"),
            Err(ParseError::UnterminatedBranch { position: 1 })
        );
    }

    #[test]
    fn unknown_primitive_is_an_error() {
        assert_eq!(
            parse("Z"),
            Err(ParseError::UnknownPrimitive {
                symbol: 'Z',
                position: 0
            })
        );
        assert_eq!(
            parse("[1.0AZ]"),
            Err(ParseError::UnknownPrimitive {
                symbol: 'Z',
                position: 5
            })
        );
    }

    #[test]
    fn stray_markers_are_unknown_primitives() {
        assert_eq!(
            parse("A]"),
            Err(ParseError::UnknownPrimitive {
                symbol: ']',
                position: 1
            })
        );
        assert_eq!(
            parse("[1.0A+B]"),
            Err(ParseError::UnknownPrimitive {
                symbol: '+',
                position: 5
            })
        );
    }

    #[test]
    fn first_error_left_to_right_wins() {
        assert_eq!(
            parse("Z[A"),
            Err(ParseError::UnknownPrimitive {
                symbol: 'Z',
                position: 0
            })
        );
    }

    #[test]
    fn empty_branch_body_is_valid() {
        let tree = parse("A[1.5+*]B").unwrap();
        assert_eq!(tree.roots.len(), 3);
        match &tree.roots[1] {
            Node::Branch {
                local_rotation,
                local_scale,
                children,
                ..
            } => {
                assert_eq!(*local_rotation, Rotation::new(30.0, 45.0));
                assert_eq!(*local_scale, 1.5);
                assert!(children.is_empty());
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn nested_branches_match_by_depth() {
        let tree = parse("[1.0A[1.0B]C]").unwrap();
        assert_eq!(
            tree.roots,
            vec![Node::Branch {
                local_rotation: Rotation::ZERO,
                local_scale: 1.0,
                local_y_offset: 0.0,
                children: vec![
                    seg('A', 0.0),
                    Node::Branch {
                        local_rotation: Rotation::ZERO,
                        local_scale: 1.0,
                        local_y_offset: 0.0,
                        children: vec![seg('B', 0.0)],
                    },
                    seg('C', 0.0),
                ],
            }]
        );
    }

    #[test]
    fn siblings_after_nested_close_stay_in_parent() {
        let tree = parse("[1[2[3A]]B]C").unwrap();
        assert_eq!(tree.roots.len(), 2);
        assert_eq!(tree.max_depth(), 3);
        assert_eq!(tree.roots[1], seg('C', 0.0));
        assert_eq!(tree.roots[0].children()[1], seg('B', 0.0));
    }

    #[test]
    fn extents_accumulate_per_level_and_branches_do_not_advance() {
        let mut extents = BTreeMap::new();
        extents.insert('F', SegmentExtent::from_base(2.0));
        extents.insert('L', SegmentExtent::centred(0.5));

        let tree = parse_branch_structure_with_extents(
            "FF[0.5+FL]F",
            &table("FL"),
            30.0,
            0.0,
            &extents,
        )
        .unwrap();

        assert_eq!(tree.roots.len(), 4);
        assert_eq!(tree.roots[0], seg('F', 0.0));
        assert_eq!(tree.roots[1], seg('F', 2.0));
        // Branch sits at the running offset and leaves it alone.
        assert_eq!(tree.roots[2].local_y_offset(), 4.0);
        assert_eq!(tree.roots[3], seg('F', 4.0));
        // Inside the branch the offset restarts at 0.
        assert_eq!(
            tree.roots[2].children(),
            &[seg('F', 0.0), seg('L', 2.0)]
        );
    }

    #[test]
    fn parsing_is_pure() {
        let t = table("ABCFL");
        let s = "F[0.7+F[0.5*L]F]F[0.7-FL]";
        let a = parse_branch_structure(s, &t, 25.0, 90.0).unwrap();
        let b = parse_branch_structure(s, &t, 25.0, 90.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 200_000;
        let s = format!("{}A{}", "[1".repeat(depth), "]".repeat(depth));
        let tree = parse(&s).unwrap();
        assert_eq!(tree.max_depth(), depth);
        assert_eq!(tree.segment_count(), 1);

        let copy = tree.clone();
        assert!(copy == tree);
        assert!(tree.to_json().is_err());
        drop(copy);
        drop(tree);
    }

    #[test]
    fn deep_partial_tree_is_dropped_on_error() {
        let depth = 200_000;
        let s = format!("{}A{}[1A", "[1".repeat(depth), "]".repeat(depth));
        let position = 3 * depth + 1;
        assert!(matches!(
            parse(&s),
            Err(ParseError::UnterminatedBranch { position: p }) if p == position
        ));
    }

    #[test]
    fn negative_and_nan_heights_do_not_rewind_offsets() {
        let mut extents = BTreeMap::new();
        extents.insert('A', SegmentExtent::new(0.0, 2.0));
        extents.insert('B', SegmentExtent::new(0.0, -5.0));
        extents.insert('C', SegmentExtent::new(0.0, f32::NAN));
        let tree =
            parse_branch_structure_with_extents("ABCA[1A]A", &table("ABC"), 0.0, 0.0, &extents)
                .unwrap();
        let offsets: Vec<f32> = tree.roots.iter().map(Node::local_y_offset).collect();
        assert_eq!(offsets, vec![0.0, 2.0, 2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn bracket_matching_ignores_stray_closes() {
        let chars: Vec<char> = "][[]]".chars().collect();
        let closes = match_brackets(&chars);
        assert_eq!(closes, vec![None, Some(4), Some(3), None, None]);
    }

    #[test]
    fn rotation_prefix_stops_at_first_other_symbol() {
        let body: Vec<char> = "+*-A+".chars().collect();
        assert_eq!(rotation_prefix(&body), Turns { len: 3, a: 0, b: 1 });
    }
}
