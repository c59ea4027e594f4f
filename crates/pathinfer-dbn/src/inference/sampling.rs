use pathinfer_core::EngineError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{SeedableRng, rngs::StdRng};

use super::{ChainProblem, normalise};

/// Likelihood weighting over root trajectories.
///
/// Trajectories are drawn forward from the prior and transition rows; each is
/// weighted by the product of its slice likelihoods, each slice scaled so its
/// largest entry is 1. The same seed always yields the same estimate.
pub fn likelihood_weighting(
    problem: &ChainProblem<'_>,
    samples: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>, EngineError> {
    let states = problem.states();
    let slices = problem.slices();

    let sampler_error = |message: String| EngineError::Topology { message };
    let initial = WeightedIndex::new(problem.prior).map_err(|e| sampler_error(e.to_string()))?;
    let rows = (0..states)
        .map(|from| WeightedIndex::new(problem.row(from)).map_err(|e| sampler_error(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    let likelihoods: Vec<Vec<f64>> = problem.likelihoods.iter().map(|l| rescaled(l)).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut tallies = vec![vec![0.0; states]; slices];
    let mut path = vec![0_usize; slices];
    let mut accepted = 0_usize;

    for _ in 0..samples.max(1) {
        let mut weight = 1.0;
        let mut state = initial.sample(&mut rng);
        for slice in 0..slices {
            if slice > 0 {
                state = rows[state].sample(&mut rng);
            }
            weight *= likelihoods[slice][state];
            if weight == 0.0 {
                break;
            }
            path[slice] = state;
        }
        if weight == 0.0 {
            continue;
        }
        accepted += 1;
        for (slice, s) in path.iter().enumerate() {
            tallies[slice][*s] += weight;
        }
    }

    if accepted == 0 {
        return Err(EngineError::ImpossibleEvidence {
            slice: problem.vacuous_slice().unwrap_or(0),
        });
    }
    for (slice, tally) in tallies.iter_mut().enumerate() {
        normalise(tally).ok_or(EngineError::ImpossibleEvidence { slice })?;
    }
    Ok(tallies)
}

/// Divides by the largest entry so long products of unnormalised evidence
/// stay finite. Rows that are all zero or not finite are left alone.
fn rescaled(likelihood: &[f64]) -> Vec<f64> {
    let max = likelihood.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 && max.is_finite() {
        likelihood.iter().map(|l| l / max).collect()
    } else {
        likelihood.to_vec()
    }
}
