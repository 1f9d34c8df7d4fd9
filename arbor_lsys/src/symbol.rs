// Grammar alphabet and the immutable symbol table.
//
// A symbol is a single `char`. Six of them are structural markers and can
// never name a primitive: `[` and `]` delimit a branch, `+`/`-` step the
// axis-A rotation count, and `*`/`/` step the axis-B rotation count.
//
// `build_symbol_table()` groups production rules by predecessor, keeping
// declaration order (that order is the tie-break order for weighted
// selection in `production.rs`), and precomputes each group's cumulative
// weights. After construction the table is read-only and can be shared by
// reference across any number of generation runs.
//
// See also: `production.rs` which draws from `RuleGroup`, `branch.rs` which
// checks segment symbols against the primitive map, `config.rs` for the JSON
// shape of `PrimitiveSpec` and `ProductionRule`.
//
// Ordered maps only (`BTreeMap`) so that iteration order, and therefore any
// logged or serialized view of the table, is deterministic.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BRANCH_OPEN: char = '[';
pub const BRANCH_CLOSE: char = ']';
pub const AXIS_A_POSITIVE: char = '+';
pub const AXIS_A_NEGATIVE: char = '-';
pub const AXIS_B_POSITIVE: char = '*';
pub const AXIS_B_NEGATIVE: char = '/';

pub const STRUCTURAL_MARKERS: [char; 6] = [
    BRANCH_OPEN,
    BRANCH_CLOSE,
    AXIS_A_POSITIVE,
    AXIS_A_NEGATIVE,
    AXIS_B_POSITIVE,
    AXIS_B_NEGATIVE,
];

pub fn is_structural(symbol: char) -> bool {
    STRUCTURAL_MARKERS.contains(&symbol)
}

/// Metadata for a symbol that places a visual segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSpec {
    pub symbol: char,
    /// When set, the consumer places this primitive under a scale-neutral
    /// parent so branch scale factors do not shrink or grow it (leaves,
    /// flowers).
    #[serde(default)]
    pub ignore_ambient_scale: bool,
}

impl PrimitiveSpec {
    pub fn new(symbol: char) -> Self {
        Self {
            symbol,
            ignore_ambient_scale: false,
        }
    }

    pub fn scale_neutral(symbol: char) -> Self {
        Self {
            symbol,
            ignore_ambient_scale: true,
        }
    }
}

/// One weighted alternative: `predecessor -> successor` with `weight`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    pub predecessor: char,
    /// Replacement string. May be empty (the symbol is erased) and may
    /// contain structural markers.
    #[serde(default)]
    pub successor: String,
    pub weight: f32,
}

impl ProductionRule {
    pub fn new(predecessor: char, successor: impl Into<String>, weight: f32) -> Self {
        Self {
            predecessor,
            successor: successor.into(),
            weight,
        }
    }
}

/// All alternatives for one predecessor, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleGroup {
    successors: Vec<String>,
    /// `cumulative[j]` is the sum of weights `0..=j`. Non-decreasing, and the
    /// last entry is strictly positive.
    cumulative: Vec<f32>,
}

impl RuleGroup {
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn total_weight(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    pub fn successor(&self, index: usize) -> Option<&str> {
        self.successors.get(index).map(String::as_str)
    }

    pub fn successors(&self) -> impl Iterator<Item = &str> {
        self.successors.iter().map(String::as_str)
    }
}

/// Symbol -> primitive metadata, and symbol -> production alternatives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTable {
    primitives: BTreeMap<char, PrimitiveSpec>,
    productions: BTreeMap<char, RuleGroup>,
}

impl SymbolTable {
    pub fn primitive(&self, symbol: char) -> Option<&PrimitiveSpec> {
        self.primitives.get(&symbol)
    }

    pub fn is_primitive(&self, symbol: char) -> bool {
        self.primitives.contains_key(&symbol)
    }

    /// Whether a segment of this primitive should drop ambient scale.
    /// Unknown symbols report `false`.
    pub fn ignores_ambient_scale(&self, symbol: char) -> bool {
        self.primitive(symbol)
            .is_some_and(|spec| spec.ignore_ambient_scale)
    }

    /// Alternatives for `symbol`, or `None` if the symbol is terminal.
    pub fn rules(&self, symbol: char) -> Option<&RuleGroup> {
        self.productions.get(&symbol)
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Number of symbols that have at least one production.
    pub fn productive_count(&self) -> usize {
        self.productions.len()
    }
}

/// Validate and index primitives and rules.
///
/// Fails if a primitive uses a structural marker or is declared twice, if a
/// rule's predecessor is not a declared primitive, if a weight is negative or
/// not finite, or if every alternative of some predecessor weighs zero.
pub fn build_symbol_table(
    primitives: &[PrimitiveSpec],
    rules: &[ProductionRule],
) -> Result<SymbolTable, ConfigError> {
    let mut primitive_map = BTreeMap::new();
    for spec in primitives {
        if is_structural(spec.symbol) {
            return Err(ConfigError::ReservedSymbol(spec.symbol));
        }
        if primitive_map.insert(spec.symbol, spec.clone()).is_some() {
            return Err(ConfigError::DuplicatePrimitive(spec.symbol));
        }
    }

    let mut productions: BTreeMap<char, RuleGroup> = BTreeMap::new();
    for rule in rules {
        if !primitive_map.contains_key(&rule.predecessor) {
            return Err(ConfigError::UnknownPredecessor(rule.predecessor));
        }
        if !rule.weight.is_finite() || rule.weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                symbol: rule.predecessor,
                weight: rule.weight,
            });
        }
        let group = productions
            .entry(rule.predecessor)
            .or_insert_with(|| RuleGroup {
                successors: Vec::new(),
                cumulative: Vec::new(),
            });
        let running = group.total_weight() + rule.weight;
        if !running.is_finite() {
            return Err(ConfigError::InvalidWeight {
                symbol: rule.predecessor,
                weight: rule.weight,
            });
        }
        group.successors.push(rule.successor.clone());
        group.cumulative.push(running);
    }

    if let Some((&symbol, _)) = productions.iter().find(|(_, g)| g.total_weight() <= 0.0) {
        return Err(ConfigError::ZeroWeightGroup(symbol));
    }

    log::debug!(
        "symbol table: {} primitives, {} productive symbols, {} rules",
        primitive_map.len(),
        productions.len(),
        rules.len()
    );

    Ok(SymbolTable {
        primitives: primitive_map,
        productions,
    })
}
