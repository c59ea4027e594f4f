use pathinfer_core::EngineError;

use super::{ChainProblem, hadamard, normalise};

/// Outcome of a message-passing run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopyReport {
    pub beliefs: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
}

/// Flooding-schedule message passing.
///
/// All forward and backward messages are recomputed from the previous
/// iteration's messages until the largest change drops below `tolerance` or
/// `max_iterations` is reached. On a chain this settles after at most
/// `slices` sweeps.
pub fn propagate(
    problem: &ChainProblem<'_>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<LoopyReport, EngineError> {
    let states = problem.states();
    let slices = problem.slices();
    let uniform = vec![1.0 / states as f64; states];

    // forward[t]: message into slice t from t - 1 (the prior at t = 0).
    // backward[t]: message into slice t from t + 1 (flat at the last slice).
    let mut forward = vec![uniform.clone(); slices];
    forward[0] = problem.prior.to_vec();
    let mut backward = vec![uniform; slices];

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations.max(1) {
        iterations += 1;
        let mut delta: f64 = 0.0;

        let mut next_forward = forward.clone();
        for slice in 1..slices {
            let outgoing = hadamard(&forward[slice - 1], &problem.likelihoods[slice - 1]);
            let mut message = problem.predict(&outgoing);
            normalise(&mut message).ok_or(EngineError::ImpossibleEvidence { slice: slice - 1 })?;
            delta = delta.max(max_change(&forward[slice], &message));
            next_forward[slice] = message;
        }

        let mut next_backward = backward.clone();
        for slice in 0..slices.saturating_sub(1) {
            let mut message = problem.retract(slice + 1, &backward[slice + 1]);
            normalise(&mut message).ok_or(EngineError::ImpossibleEvidence { slice: slice + 1 })?;
            delta = delta.max(max_change(&backward[slice], &message));
            next_backward[slice] = message;
        }

        forward = next_forward;
        backward = next_backward;
        if delta < tolerance {
            converged = true;
            break;
        }
    }

    let beliefs = (0..slices)
        .map(|slice| {
            let mut belief = hadamard(
                &hadamard(&forward[slice], &problem.likelihoods[slice]),
                &backward[slice],
            );
            normalise(&mut belief).ok_or(EngineError::ImpossibleEvidence { slice })?;
            Ok(belief)
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    Ok(LoopyReport {
        beliefs,
        iterations,
        converged,
    })
}

fn max_change(old: &[f64], new: &[f64]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
