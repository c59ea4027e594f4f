use core::ops::Deref;

use serde::Serialize;

use super::record::ProbabilisticRecord;

/// Per-outcome weights for one record, laid out in a network's outcome order.
///
/// Locations missing from the record weigh 0.0. No normalisation is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceVector(Vec<f64>);

impl EvidenceVector {
    /// Builds the vector for `record`, one entry per name in `location_order`.
    pub fn from_record<S: AsRef<str>>(record: &ProbabilisticRecord, location_order: &[S]) -> Self {
        let distribution = record.location_probabilities();
        Self(
            location_order
                .iter()
                .map(|name| distribution.get(name.as_ref()).unwrap_or(0.0))
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// True when every weight is zero, i.e. the record names none of the outcomes.
    pub fn is_vacuous(&self) -> bool {
        self.0.iter().all(|w| *w == 0.0)
    }
}

impl Deref for EvidenceVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for EvidenceVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Free-function form of [`EvidenceVector::from_record`].
pub fn evidence_vector<S: AsRef<str>>(
    record: &ProbabilisticRecord,
    location_order: &[S],
) -> EvidenceVector {
    EvidenceVector::from_record(record, location_order)
}
