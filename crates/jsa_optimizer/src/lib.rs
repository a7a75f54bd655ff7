//! jsa_optimizer: Rewriting passes over quadruple sequences.
//!
//! Each iteration runs, in order:
//! 1. Constant folding with propagation of constant temporaries
//! 2. Removal of unread side-effect-free temporaries
//! 3. Jump-chain collapsing
//! 4. Unreachable-code elimination
//! 5. Redundant label merging
//!
//! Iterations repeat until nothing changes. Passes only rewrite or remove
//! quadruples, so the output is never longer than the input, and calls and
//! assignments keep their relative order.

mod fold;
mod passes;

pub use fold::{fold_binary, fold_unary};

use jsa_ir::{renumber, Quadruple};
use tracing::debug;

/// Default bound on fixpoint iterations.
pub const DEFAULT_MAX_PASSES: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimizer {
    pub max_passes: u32,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// The optimized sequence and how it was reached.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub code: Vec<Quadruple>,
    pub iterations: u32,
    /// False when the iteration bound was hit before a fixpoint.
    pub converged: bool,
}

impl Optimizer {
    pub fn new(max_passes: u32) -> Self {
        Self { max_passes }
    }

    pub fn optimize(&self, code: &[Quadruple]) -> Vec<Quadruple> {
        self.run(code).code
    }

    pub fn run(&self, code: &[Quadruple]) -> OptimizeOutcome {
        let mut current = code.to_vec();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_passes {
            iterations += 1;
            let mut changed = passes::fold_constants(&mut current);
            changed |= passes::remove_dead_temps(&mut current);
            changed |= passes::collapse_jump_chains(&mut current);
            changed |= passes::eliminate_unreachable(&mut current);
            changed |= passes::merge_labels(&mut current);
            if !changed {
                converged = true;
                break;
            }
        }

        renumber(&mut current);
        debug!(
            before = code.len(),
            after = current.len(),
            iterations,
            converged,
            "optimization complete"
        );
        OptimizeOutcome {
            code: current,
            iterations,
            converged,
        }
    }
}

/// Optimize with the default iteration bound.
pub fn optimize(code: &[Quadruple]) -> Vec<Quadruple> {
    Optimizer::default().optimize(code)
}
