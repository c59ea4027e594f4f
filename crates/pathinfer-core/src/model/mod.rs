//! Observation data: probabilistic records, their timestamps, and the
//! evidence vectors derived from them.

pub mod evidence;
pub mod record;
pub mod timestamp;

pub use evidence::{EvidenceVector, evidence_vector};
pub use record::{LocationDistribution, ProbabilisticRecord, RecordError};
pub use timestamp::{TimestampError, to_epoch_seconds};
