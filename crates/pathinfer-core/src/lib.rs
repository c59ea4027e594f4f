//! Observation parsing, slice scheduling and the inference session contract
//! for estimating a vehicle's path between two noisy location observations.

pub mod algorithm;
pub mod engine;
pub mod model;
pub mod parser;
pub mod schedule;
pub mod session;

pub use algorithm::{Algorithm, AlgorithmFamily};
pub use engine::{EngineError, ModelFormat, TemporalNetwork};
pub use model::{EvidenceVector, LocationDistribution, ProbabilisticRecord, RecordError};
pub use parser::parse_records;
pub use schedule::{SlicePlan, SliceScheduler, compute_slice_count};
pub use session::{
    BeliefUpdate, BufferShape, InferenceSession, LOCATION_NODE, Marginals, ModelSummary,
    READER_NODE, REFERENCE_SLICES, SessionError, SessionState, StructuralMismatch,
};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "pathinfer"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "pathinfer");
        assert!(!AppInfo::version().is_empty());
    }
}
