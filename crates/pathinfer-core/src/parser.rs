//! Splits a raw two-observation string into [`ProbabilisticRecord`]s.
//!
//! Input shape: `plate;loc:p,loc:p;start;end#plate;loc:p;start;end`.
//! Empty tokens left by leading, trailing or doubled delimiters are skipped
//! before records and fields are counted.

use tracing::{Level, event};

use crate::model::{ProbabilisticRecord, RecordError};

pub const RECORD_DELIMITER: char = '#';
pub const FIELD_DELIMITER: char = ';';

const RECORDS_PER_INPUT: usize = 2;
const FIELDS_PER_RECORD: usize = 4;

/// Parses exactly two consecutive records of one moving object.
pub fn parse_records(raw: &str) -> Result<(ProbabilisticRecord, ProbabilisticRecord), RecordError> {
    let chunks = tokens(raw, RECORD_DELIMITER);
    if chunks.len() != RECORDS_PER_INPUT {
        return Err(RecordError::RecordCount {
            found: chunks.len(),
        });
    }

    let first = parse_record(0, chunks[0])?;
    let second = parse_record(1, chunks[1])?;

    if first.license_plate() != second.license_plate() {
        event!(
            target: "pathinfer_core::parser",
            Level::DEBUG,
            first = first.license_plate(),
            second = second.license_plate(),
            "records carry different license plates"
        );
    }

    Ok((first, second))
}

/// Parses one `plate;locations;start;end` record.
pub fn parse_record(index: usize, raw: &str) -> Result<ProbabilisticRecord, RecordError> {
    let fields = tokens(raw, FIELD_DELIMITER);
    let &[plate, locations, start, end] = fields.as_slice() else {
        return Err(RecordError::FieldCount {
            record: index,
            found: fields.len(),
        });
    };
    debug_assert_eq!(fields.len(), FIELDS_PER_RECORD);

    let record = ProbabilisticRecord::new(plate, locations, start, end)?;
    event!(
        target: "pathinfer_core::parser",
        Level::DEBUG,
        record = index,
        plate = record.license_plate(),
        start = record.start_time_epoch(),
        end = record.end_time_epoch(),
        "parsed probabilistic record"
    );
    if record.start_time_epoch() > record.end_time_epoch() {
        event!(
            target: "pathinfer_core::parser",
            Level::WARN,
            record = index,
            "record ends before it starts"
        );
    }
    Ok(record)
}

fn tokens(raw: &str, delimiter: char) -> Vec<&str> {
    raw.split(delimiter).filter(|t| !t.is_empty()).collect()
}
