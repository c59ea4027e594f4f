//! How many time slices the temporal model is unrolled to between two
//! boundary observations.

use serde::Serialize;

use crate::model::ProbabilisticRecord;

/// One slice for each boundary observation.
pub const BOUNDARY_SLICES: usize = 2;

/// Returns 2, or 3 when a full interval fits strictly between the end of the
/// first observation and the start of the second.
///
/// The gap slice is a single coarse placeholder: wide gaps are never unrolled
/// into more than one intermediate step.
pub fn compute_slice_count(end_epoch0: i64, start_epoch1: i64, interval_secs: u32) -> usize {
    let earliest_gap = i128::from(end_epoch0) + i128::from(interval_secs);
    let latest_gap = i128::from(start_epoch1) - 1;
    if earliest_gap <= latest_gap {
        BOUNDARY_SLICES + 1
    } else {
        BOUNDARY_SLICES
    }
}

/// Slice layout for one pair of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlicePlan {
    pub slices: usize,
    pub gap_slice: bool,
}

impl SlicePlan {
    /// Index of the slice carrying the second observation.
    pub fn last_slice(&self) -> usize {
        self.slices - 1
    }
}

/// Fixed-interval scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceScheduler {
    interval_secs: u32,
}

impl SliceScheduler {
    pub fn new(interval_secs: u32) -> Self {
        Self { interval_secs }
    }

    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    pub fn plan(&self, first: &ProbabilisticRecord, second: &ProbabilisticRecord) -> SlicePlan {
        let slices = compute_slice_count(
            first.end_time_epoch(),
            second.start_time_epoch(),
            self.interval_secs,
        );
        SlicePlan {
            slices,
            gap_slice: slices > BOUNDARY_SLICES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_slice_boundary() {
        assert_eq!(compute_slice_count(1000, 1011, 10), 3);
        assert_eq!(compute_slice_count(1000, 1010, 10), 2);
    }

    #[test]
    fn never_fewer_than_two() {
        for (end0, start1, interval) in [
            (0, 0, 0),
            (1000, 10, 5),
            (i64::MAX, i64::MIN, u32::MAX),
            (i64::MIN, i64::MAX, 0),
            (5, 4, 0),
        ] {
            assert!(compute_slice_count(end0, start1, interval) >= BOUNDARY_SLICES);
        }
    }

    #[test]
    fn expansion_is_capped_at_three() {
        assert_eq!(compute_slice_count(0, 1_000_000, 1), 3);
    }

    #[test]
    fn zero_interval_needs_a_spare_second() {
        assert_eq!(compute_slice_count(100, 101, 0), 3);
        assert_eq!(compute_slice_count(100, 100, 0), 2);
    }

    #[test]
    fn extreme_epochs_do_not_overflow() {
        assert_eq!(compute_slice_count(i64::MAX, i64::MAX, u32::MAX), 2);
        assert_eq!(compute_slice_count(i64::MIN, i64::MIN, 0), 2);
    }

    #[test]
    fn plan_uses_first_end_and_second_start() {
        let first = ProbabilisticRecord::new(
            "ABC123",
            "LocA:1.0",
            "2012-05-14 10:00:00!",
            "2012-05-14 10:00:05!",
        )
        .expect("valid");
        let second = ProbabilisticRecord::new(
            "ABC123",
            "LocB:1.0",
            "2012-05-14 10:02:00!",
            "2012-05-14 10:02:05!",
        )
        .expect("valid");

        let plan = SliceScheduler::new(30).plan(&first, &second);
        assert_eq!(plan, SlicePlan { slices: 3, gap_slice: true });
        assert_eq!(plan.last_slice(), 2);

        let plan = SliceScheduler::new(115).plan(&first, &second);
        assert_eq!(plan.slices, 2);
        assert!(!plan.gap_slice);
    }
}
