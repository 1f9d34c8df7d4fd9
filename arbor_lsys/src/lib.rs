// arbor_lsys — stochastic L-system expansion and branch interpretation.
//
// Turns a compact weighted grammar into a branching skeleton. A production
// engine rewrites an axiom a fixed number of times, picking among weighted
// alternatives per symbol; the branch interpreter then reads the bracketed
// result as a tree of local transforms (offset along the growth axis,
// rotation, scale). Building meshes or scene objects from that tree is left
// to the host.
//
// Module overview:
// - `symbol.rs`:     Alphabet markers, PrimitiveSpec/ProductionRule, the immutable SymbolTable.
// - `production.rs`: Weighted alternative selection and the parallel rewrite step.
// - `branch.rs`:     Bracketed string -> TransformTree (scale and rotation prefixes, nesting).
// - `tree.rs`:       TransformTree / Node output types and traversal.
// - `extent.rs`:     ExtentSource — per-primitive model bounds supplied by the host.
// - `placement.rs`:  Flattens a tree into root-space transforms (glam).
// - `config.rs`:     LsysConfig — JSON-loadable grammar and run parameters, presets.
// - `generator.rs`:  LSystem — validated config, bounded expansion, seeded and batch runs.
// - `error.rs`:      ConfigError, ParseError, LsysError.
// - `prng`:          Re-exported from `arbor_prng` — xoshiro256++ and the RandomSource seam.
//
// **Critical constraint: determinism.** Given the same config and the same
// draw sequence, every stage produces the same output. Randomness only ever
// enters through a `RandomSource` passed in by the caller, and all lookup
// maps are ordered.

pub mod branch;
pub mod config;
pub mod error;
pub mod extent;
pub mod generator;
pub mod placement;
pub use arbor_prng as prng;
pub mod production;
pub mod symbol;
pub mod tree;

pub use branch::{parse_branch_structure, parse_branch_structure_with_extents};
pub use config::LsysConfig;
pub use error::{ConfigError, LsysError, ParseError};
pub use extent::{ExtentFn, ExtentSource, NoExtent, SegmentExtent};
pub use generator::{Generation, LSystem};
pub use placement::{Placement, flatten};
pub use production::{generate_symbol_string, rewrite, rewrite_bounded, select_alternative};
pub use symbol::{PrimitiveSpec, ProductionRule, RuleGroup, SymbolTable, build_symbol_table};
pub use tree::{MAX_SERIALIZED_DEPTH, Node, Rotation, TransformTree};
