use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timestamp::{TimestampError, to_epoch_seconds};

/// Ordered `location -> probability` entries of one observation.
///
/// Insertion order is preserved. Re-inserting a known location overwrites its
/// value in place. Values are not normalised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDistribution {
    entries: Vec<(String, f64)>,
}

impl LocationDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `name:prob,name:prob,...`. Empty entries are skipped.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let mut distribution = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, value)) = entry.split_once(':') else {
                return Err(RecordError::LocationEntry {
                    entry: entry.to_string(),
                });
            };
            let value = value.trim();
            let probability = value
                .parse::<f64>()
                .map_err(|_| RecordError::Probability {
                    location: name.trim().to_string(),
                    value: value.to_string(),
                })?;
            distribution.insert(name.trim(), probability);
        }
        Ok(distribution)
    }

    pub fn insert(&mut self, location: &str, probability: f64) {
        match self.entries.iter_mut().find(|(name, _)| name == location) {
            Some((_, slot)) => *slot = probability,
            None => self.entries.push((location.to_string(), probability)),
        }
    }

    pub fn get(&self, location: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == location)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }
}

impl fmt::Display for LocationDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, probability)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}:{probability}")?;
        }
        Ok(())
    }
}

/// One timestamped observation of a moving object.
///
/// Epoch times are derived once at construction; the record is immutable
/// afterwards. `start <= end` is expected but not checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilisticRecord {
    license_plate: String,
    location_probabilities: LocationDistribution,
    start_time_raw: String,
    end_time_raw: String,
    start_time_epoch: i64,
    end_time_epoch: i64,
}

impl ProbabilisticRecord {
    pub fn new(
        license_plate: &str,
        location_probabilities: &str,
        start_time_raw: &str,
        end_time_raw: &str,
    ) -> Result<Self, RecordError> {
        let location_probabilities = LocationDistribution::parse(location_probabilities)?;
        let start_time_epoch = to_epoch_seconds(start_time_raw)?;
        let end_time_epoch = to_epoch_seconds(end_time_raw)?;
        Ok(Self {
            license_plate: license_plate.to_string(),
            location_probabilities,
            start_time_raw: start_time_raw.to_string(),
            end_time_raw: end_time_raw.to_string(),
            start_time_epoch,
            end_time_epoch,
        })
    }

    pub fn license_plate(&self) -> &str {
        &self.license_plate
    }

    pub fn location_probabilities(&self) -> &LocationDistribution {
        &self.location_probabilities
    }

    pub fn start_time_raw(&self) -> &str {
        &self.start_time_raw
    }

    pub fn end_time_raw(&self) -> &str {
        &self.end_time_raw
    }

    /// Raw start time with the `!` field-safe space marker turned back into a space.
    pub fn start_time_display(&self) -> String {
        self.start_time_raw.replace('!', " ")
    }

    pub fn end_time_display(&self) -> String {
        self.end_time_raw.replace('!', " ")
    }

    pub fn start_time_epoch(&self) -> i64 {
        self.start_time_epoch
    }

    pub fn end_time_epoch(&self) -> i64 {
        self.end_time_epoch
    }
}

impl fmt::Display for ProbabilisticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "License Plate: {}", self.license_plate)?;
        writeln!(f, "Prob Location: {}", self.location_probabilities)?;
        writeln!(f, "Start Time: {}", self.start_time_display().trim_end())?;
        writeln!(f, "End Time: {}", self.end_time_display().trim_end())?;
        writeln!(f, "Start Time Unix: {}", self.start_time_epoch)?;
        write!(f, "End Time Unix: {}", self.end_time_epoch)
    }
}

/// Malformed observation input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected exactly 2 records separated by '#', found {found}")]
    RecordCount { found: usize },
    #[error("record {record}: expected exactly 4 fields separated by ';', found {found}")]
    FieldCount { record: usize, found: usize },
    #[error("location entry {entry:?} is not of the form name:probability")]
    LocationEntry { entry: String },
    #[error("location {location:?}: probability {value:?} is not a number")]
    Probability { location: String, value: String },
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}
