pub mod app;
pub mod config;
pub mod logging;
pub mod report;

use pathinfer_core::{RecordError, SessionError};

use crate::config::{ConfigError, ValidationError};

pub const EXIT_USAGE: u8 = 1;
pub const EXIT_MALFORMED_INPUT: u8 = 2;
pub const EXIT_MODEL_LOAD: u8 = 3;
pub const EXIT_RUNTIME: u8 = 4;
/// Unknown model structure is unrecoverable.
pub const EXIT_STRUCTURAL_MISMATCH: u8 = 255;

/// Maps the first typed error found in the chain to a process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.downcast_ref::<RecordError>().is_some() {
            return EXIT_MALFORMED_INPUT;
        }
        if let Some(session) = cause.downcast_ref::<SessionError>() {
            return match session {
                SessionError::ModelLoad(_) => EXIT_MODEL_LOAD,
                SessionError::StructuralMismatch(_) => EXIT_STRUCTURAL_MISMATCH,
                _ => EXIT_RUNTIME,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some()
            || cause.downcast_ref::<ValidationError>().is_some()
        {
            return EXIT_USAGE;
        }
    }
    EXIT_RUNTIME
}
