use pathinfer_core::EngineError;

use super::{ChainProblem, hadamard, normalise};

/// Forward/backward smoothing with per-step normalisation.
pub fn smooth(problem: &ChainProblem<'_>) -> Result<Vec<Vec<f64>>, EngineError> {
    let slices = problem.slices();

    let mut forward: Vec<Vec<f64>> = Vec::with_capacity(slices);
    for slice in 0..slices {
        let predicted = match forward.last() {
            Some(previous) => problem.predict(previous),
            None => problem.prior.to_vec(),
        };
        let mut alpha = hadamard(&predicted, &problem.likelihoods[slice]);
        normalise(&mut alpha).ok_or(EngineError::ImpossibleEvidence { slice })?;
        forward.push(alpha);
    }

    let mut backward = vec![1.0; problem.states()];
    let mut posteriors = vec![Vec::new(); slices];
    for slice in (0..slices).rev() {
        if slice + 1 < slices {
            backward = problem.retract(slice + 1, &backward);
            normalise(&mut backward).ok_or(EngineError::ImpossibleEvidence { slice })?;
        }
        let mut posterior = hadamard(&forward[slice], &backward);
        normalise(&mut posterior).ok_or(EngineError::ImpossibleEvidence { slice })?;
        posteriors[slice] = posterior;
    }

    Ok(posteriors)
}
