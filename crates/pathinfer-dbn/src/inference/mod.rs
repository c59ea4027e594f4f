//! Belief-update families over the unrolled time chain.
//!
//! Every family returns one normalised root posterior per slice, or
//! `ImpossibleEvidence` when the evidence rules out every trajectory.

mod exact;
mod loopy;
mod sampling;

use pathinfer_core::{AlgorithmFamily, EngineError};
use tracing::{Level, event};

pub use exact::smooth;
pub use loopy::{LoopyReport, propagate};
pub use sampling::likelihood_weighting;

use crate::network::EngineOptions;

/// Root-chain view of one update: prior, transition and per-slice likelihoods.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainProblem<'a> {
    pub prior: &'a [f64],
    pub transition: &'a [f64],
    pub likelihoods: Vec<Vec<f64>>,
}

impl ChainProblem<'_> {
    pub fn states(&self) -> usize {
        self.prior.len()
    }

    pub fn slices(&self) -> usize {
        self.likelihoods.len()
    }

    pub fn row(&self, from: usize) -> &[f64] {
        let k = self.states();
        &self.transition[from * k..(from + 1) * k]
    }

    /// One step of `belief * T`.
    pub fn predict(&self, belief: &[f64]) -> Vec<f64> {
        let k = self.states();
        let mut next = vec![0.0; k];
        for (from, weight) in belief.iter().enumerate() {
            if *weight == 0.0 {
                continue;
            }
            for (to, p) in self.row(from).iter().enumerate() {
                next[to] += weight * p;
            }
        }
        next
    }

    /// `T * (likelihood_{t} ∘ message)`, the backward step into slice `t - 1`.
    pub fn retract(&self, slice: usize, message: &[f64]) -> Vec<f64> {
        let weighted: Vec<f64> = self.likelihoods[slice]
            .iter()
            .zip(message)
            .map(|(l, m)| l * m)
            .collect();
        (0..self.states())
            .map(|from| self.row(from).iter().zip(&weighted).map(|(p, w)| p * w).sum())
            .collect()
    }

    /// First slice whose likelihood is zero everywhere, if any.
    pub fn vacuous_slice(&self) -> Option<usize> {
        self.likelihoods
            .iter()
            .position(|l| l.iter().all(|v| *v == 0.0))
    }
}

pub fn run(
    family: AlgorithmFamily,
    problem: &ChainProblem<'_>,
    options: &EngineOptions,
) -> Result<Vec<Vec<f64>>, EngineError> {
    if problem.slices() == 0 {
        return Err(EngineError::NoSlices);
    }
    match family {
        AlgorithmFamily::Exact => smooth(problem),
        AlgorithmFamily::Sampling => likelihood_weighting(problem, options.samples, options.seed),
        AlgorithmFamily::Loopy => propagate(
            problem,
            options.loopy_max_iterations,
            options.loopy_tolerance,
        )
        .map(|report| {
            if !report.converged {
                event!(
                    target: "pathinfer_dbn::engine",
                    Level::WARN,
                    iterations = report.iterations,
                    "message passing stopped before converging"
                );
            }
            report.beliefs
        }),
    }
}

pub(crate) fn hadamard(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

/// Scales `values` to sum to one; `None` when the total is zero or not finite.
pub(crate) fn normalise(values: &mut [f64]) -> Option<()> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    values.iter_mut().for_each(|v| *v /= total);
    Some(())
}
