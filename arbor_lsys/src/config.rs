// Data-driven grammar configuration.
//
// `LsysConfig` carries everything a run needs: the primitive list, the
// weighted production rules, the axiom, the iteration count, and the degrees
// per rotation marker. It is loaded from JSON (`LsysConfig::from_json`) so
// grammars can be tuned without recompiling, and validated into a
// `SymbolTable` by `LSystem::from_config()`.
//
// Named presets (`binary_tree()`, `weeping_shrub()`) are built in code in the
// same way the JSON files in `data/` are laid out.
//
// Example JSON:
//
//   {
//     "primitives": [{ "symbol": "F" }, { "symbol": "L", "ignore_ambient_scale": true }],
//     "rules": [{ "predecessor": "F", "successor": "F[0.6+FL]F", "weight": 1.0 }],
//     "initial": "F",
//     "iterations": 3,
//     "axis_a_step_degrees": 25.0,
//     "axis_b_step_degrees": 90.0,
//     "seed": 42
//   }

use crate::symbol::{PrimitiveSpec, ProductionRule};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LsysConfig {
    pub primitives: Vec<PrimitiveSpec>,
    #[serde(default)]
    pub rules: Vec<ProductionRule>,
    /// Axiom the first rewrite starts from.
    pub initial: String,
    #[serde(default)]
    pub iterations: u32,
    /// Degrees per `+` (negative for `-`).
    #[serde(default)]
    pub axis_a_step_degrees: f32,
    /// Degrees per `*` (negative for `/`).
    #[serde(default)]
    pub axis_b_step_degrees: f32,
    /// Seed for `LSystem::run()`. `None` draws a fresh seed each run.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Abort expansion as soon as an iteration's output passes this many
    /// symbols. The rewrite stops mid-iteration, so no iteration allocates
    /// more than this plus the longest successor.
    #[serde(default)]
    pub max_symbols: Option<usize>,
}

impl LsysConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Symmetric binary tree: every tip splits into two half-scale branches
    /// tilted either way on axis A, with a small chance to stop early.
    pub fn binary_tree() -> Self {
        Self {
            primitives: vec![PrimitiveSpec::new('F'), PrimitiveSpec::new('X')],
            rules: vec![
                ProductionRule::new('X', "F[0.5+X][0.5-X]", 0.9),
                ProductionRule::new('X', "F", 0.1),
                ProductionRule::new('F', "FF", 1.0),
            ],
            initial: "X".into(),
            iterations: 5,
            axis_a_step_degrees: 30.0,
            axis_b_step_degrees: 90.0,
            seed: None,
            max_symbols: Some(1 << 20),
        }
    }

    /// Drooping shrub with unscaled leaves at the tips. Branches spin around
    /// the stem (axis B) and bend down (axis A) as they go.
    pub fn weeping_shrub() -> Self {
        Self {
            primitives: vec![
                PrimitiveSpec::new('S'),
                PrimitiveSpec::new('B'),
                PrimitiveSpec::scale_neutral('L'),
            ],
            rules: vec![
                ProductionRule::new('B', "S[0.8++*B]L", 0.5),
                ProductionRule::new('B', "S[0.8++/B]L", 0.5),
                ProductionRule::new('B', "SL", 0.2),
                ProductionRule::new('S', "S", 0.8),
                ProductionRule::new('S', "SS", 0.2),
            ],
            initial: "SB[0.9+*B][0.9+/B]".into(),
            iterations: 4,
            axis_a_step_degrees: 20.0,
            axis_b_step_degrees: 120.0,
            seed: None,
            max_symbols: Some(1 << 20),
        }
    }
}

impl Default for LsysConfig {
    fn default() -> Self {
        Self::binary_tree()
    }
}
