// Error types for table construction, parsing, and whole-run generation.
//
// `ConfigError` comes out of `build_symbol_table()` and means the grammar
// itself is inconsistent. `ParseError` comes out of the branch parser and
// means an expanded string is malformed; since rewriting never fails on
// content, a malformed string is still a grammar bug, only detected later.
// `LsysError` wraps both for `LSystem`, plus JSON decoding and the symbol
// growth guard.
//
// Positions in `ParseError` are character indices into the parsed string.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("production rule predecessor '{0}' has no matching primitive")]
    UnknownPredecessor(char),

    #[error("every production alternative for '{0}' has zero weight")]
    ZeroWeightGroup(char),

    #[error("production rule for '{symbol}' has invalid weight {weight}")]
    InvalidWeight { symbol: char, weight: f32 },

    #[error("'{0}' is a structural marker and cannot name a primitive")]
    ReservedSymbol(char),

    #[error("primitive '{0}' is declared more than once")]
    DuplicatePrimitive(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A branch-open marker whose matching close never arrives.
    #[error("branch opened at position {position} is never closed")]
    UnterminatedBranch { position: usize },

    /// The branch body does not start with a decimal scale literal.
    #[error("branch opened at position {position} has no leading scale factor")]
    MissingScale { position: usize },

    #[error("unknown primitive '{symbol}' at position {position}")]
    UnknownPrimitive { symbol: char, position: usize },
}

#[derive(Debug, Error)]
pub enum LsysError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("iteration {iteration} exceeded {limit} symbols (stopped at {length})")]
    SymbolLimit {
        iteration: u32,
        length: usize,
        limit: usize,
    },
}
