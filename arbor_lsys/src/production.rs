// Production engine: stochastic parallel rewriting.
//
// One `rewrite()` call replaces every symbol of the input independently.
// Terminal symbols (no rule group) pass through unchanged. For a symbol with
// alternatives, one uniform draw `u` is compared against each cumulative
// weight divided by the group's total, and the first alternative whose
// normalized boundary is >= `u` wins. Dividing the boundary rather than
// multiplying the draw keeps tiny (even subnormal) totals from rounding every
// draw down to zero. A draw landing exactly on a boundary selects the earlier
// alternative. If the draw sits above every boundary (out of range or NaN),
// the last alternative is used.
//
// `generate_symbol_string()` chains `iterations` rewrites. It cannot fail:
// every degenerate weight setup is rejected by `build_symbol_table()`.
// `rewrite_bounded()` stops mid-string once the output passes a symbol
// limit, so a runaway grammar never allocates the whole oversized iteration.
//
// See also: `symbol.rs` for `RuleGroup`, `generator.rs` for the bounded
// expansion used by `LSystem` (growth limit + per-iteration logging).
//
// **Critical constraint: determinism.** All randomness comes from the
// `RandomSource` passed in, exactly one draw per productive symbol, in input
// order. Same table + same draw sequence = same output.

use crate::symbol::{RuleGroup, SymbolTable};
use arbor_prng::RandomSource;

/// Index of the alternative selected by a unit draw `u` in [0, 1).
///
/// Always in `0..group.len()` for a non-empty group.
pub fn select_alternative(group: &RuleGroup, u: f32) -> usize {
    let cumulative = group.cumulative();
    let last = cumulative.len().saturating_sub(1);
    let total = group.total_weight();
    cumulative
        .iter()
        .position(|&boundary| u <= boundary / total)
        .unwrap_or(last)
}

/// Rewrite every symbol of `input` once.
pub fn rewrite<R: RandomSource + ?Sized>(input: &str, table: &SymbolTable, rng: &mut R) -> String {
    let mut output = String::with_capacity(input.len());
    rewrite_into(input, table, rng, usize::MAX, &mut output);
    output
}

/// Like `rewrite()`, but gives up as soon as the output holds more than
/// `limit` symbols. `Err` carries the symbol count at that point, which is at
/// most `limit` plus the longest successor.
pub fn rewrite_bounded<R: RandomSource + ?Sized>(
    input: &str,
    table: &SymbolTable,
    limit: usize,
    rng: &mut R,
) -> Result<String, usize> {
    let mut output = String::with_capacity(input.len().min(limit));
    let length = rewrite_into(input, table, rng, limit, &mut output);
    if length > limit {
        return Err(length);
    }
    Ok(output)
}

/// Appends the rewrite of `input` to `output`, stopping once more than
/// `limit` symbols have been written. Returns the number written.
fn rewrite_into<R: RandomSource + ?Sized>(
    input: &str,
    table: &SymbolTable,
    rng: &mut R,
    limit: usize,
    output: &mut String,
) -> usize {
    let mut length = 0usize;
    for symbol in input.chars() {
        match table.rules(symbol) {
            Some(group) if !group.is_empty() => {
                let chosen = select_alternative(group, rng.next_unit());
                if let Some(successor) = group.successor(chosen) {
                    output.push_str(successor);
                    length += successor.chars().count();
                }
            }
            _ => {
                output.push(symbol);
                length += 1;
            }
        }
        if length > limit {
            break;
        }
    }
    length
}

/// Apply `rewrite()` `iterations` times, starting from `initial`.
pub fn generate_symbol_string<R: RandomSource + ?Sized>(
    initial: &str,
    table: &SymbolTable,
    iterations: u32,
    rng: &mut R,
) -> String {
    let mut current = initial.to_string();
    for _ in 0..iterations {
        current = rewrite(&current, table, rng);
    }
    current
}
