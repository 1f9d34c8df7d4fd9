// One-shot generation: config -> table -> expanded string -> tree.
//
// `LSystem` validates a `LsysConfig` once and can then be run any number of
// times. Each run owns its random source; the symbol table is only read, so
// `generate_many()` runs seeds in parallel against one shared `LSystem`.
//
// Expansion here is the bounded form of `generate_symbol_string()`: it logs
// every generation and stops with `LsysError::SymbolLimit` as soon as a
// rewrite's output passes `max_symbols`, partway through the iteration. A caller wanting a time bound picks
// `iterations`/`max_symbols` accordingly; nothing inside a run blocks or
// can be cancelled.
//
// See also: `production.rs` for the rewrite step, `branch.rs` for parsing,
// `config.rs` for the inputs.

use crate::branch::{parse_branch_structure, parse_branch_structure_with_extents};
use crate::config::LsysConfig;
use crate::error::{ConfigError, LsysError, ParseError};
use crate::extent::ExtentSource;
use crate::production::{rewrite, rewrite_bounded};
use crate::symbol::{SymbolTable, build_symbol_table};
use crate::tree::TransformTree;
use arbor_prng::{ArborRng, RandomSource, entropy_seed};
use rayon::prelude::*;

/// Output of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    /// Seed the run's `ArborRng` was built from, when known.
    pub seed: Option<u64>,
    /// Final expanded string.
    pub symbols: String,
    pub tree: TransformTree,
}

/// A validated grammar plus run parameters.
#[derive(Clone, Debug)]
pub struct LSystem {
    config: LsysConfig,
    table: SymbolTable,
}

impl LSystem {
    pub fn from_config(config: LsysConfig) -> Result<Self, ConfigError> {
        let table = build_symbol_table(&config.primitives, &config.rules)?;
        Ok(Self { config, table })
    }

    pub fn from_json(json: &str) -> Result<Self, LsysError> {
        let config = LsysConfig::from_json(json)?;
        Ok(Self::from_config(config)?)
    }

    pub fn config(&self) -> &LsysConfig {
        &self.config
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Rewrite the axiom `iterations` times.
    pub fn expand<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<String, LsysError> {
        let mut current = self.config.initial.clone();
        if let Some(limit) = self.config.max_symbols {
            let length = current.chars().count();
            if length > limit {
                return Err(LsysError::SymbolLimit {
                    iteration: 0,
                    length,
                    limit,
                });
            }
        }
        for iteration in 1..=self.config.iterations {
            current = match self.config.max_symbols {
                Some(limit) => rewrite_bounded(&current, &self.table, limit, rng).map_err(
                    |length| LsysError::SymbolLimit {
                        iteration,
                        length,
                        limit,
                    },
                )?,
                None => rewrite(&current, &self.table, rng),
            };
            log::debug!(
                "iteration {iteration}/{}: {} symbols",
                self.config.iterations,
                current.chars().count()
            );
            log::trace!("iteration {iteration}: {current}");
        }
        Ok(current)
    }

    /// Parse an expanded string with this grammar's rotation steps.
    pub fn parse(&self, symbols: &str) -> Result<TransformTree, ParseError> {
        parse_branch_structure(
            symbols,
            &self.table,
            self.config.axis_a_step_degrees,
            self.config.axis_b_step_degrees,
        )
    }

    /// Parse with segment heights from `extents` feeding the offsets.
    pub fn parse_with_extents<E: ExtentSource + ?Sized>(
        &self,
        symbols: &str,
        extents: &E,
    ) -> Result<TransformTree, ParseError> {
        parse_branch_structure_with_extents(
            symbols,
            &self.table,
            self.config.axis_a_step_degrees,
            self.config.axis_b_step_degrees,
            extents,
        )
    }

    /// Expand and parse, drawing from `rng`.
    pub fn generate<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Generation, LsysError> {
        let symbols = self.expand(rng)?;
        let tree = self.parse(&symbols)?;
        log::debug!(
            "generated {} segments in {} branches (depth {})",
            tree.segment_count(),
            tree.branch_count(),
            tree.max_depth()
        );
        Ok(Generation {
            seed: None,
            symbols,
            tree,
        })
    }

    pub fn generate_seeded(&self, seed: u64) -> Result<Generation, LsysError> {
        let mut rng = ArborRng::new(seed);
        let mut generation = self.generate(&mut rng)?;
        generation.seed = Some(seed);
        Ok(generation)
    }

    /// Run with the configured seed, or a fresh one if none is set.
    pub fn run(&self) -> Result<Generation, LsysError> {
        let seed = self.config.seed.unwrap_or_else(entropy_seed);
        log::debug!("running grammar with seed {seed}");
        self.generate_seeded(seed)
    }

    /// Independent runs, one per seed, in parallel. Results keep seed order.
    pub fn generate_many(&self, seeds: &[u64]) -> Vec<Result<Generation, LsysError>> {
        seeds
            .par_iter()
            .map(|&seed| self.generate_seeded(seed))
            .collect()
    }
}
