//! Adapter boundary between the session and a temporal network engine.
//!
//! Engines expose their structure through plain index-based accessors so the
//! session can validate it before trusting any of it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::Algorithm;

/// Serialization of a model definition on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    #[default]
    Json,
    Yaml,
}

impl ModelFormat {
    /// Infers the format from a file extension; unknown extensions read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => ModelFormat::Yaml,
            _ => ModelFormat::Json,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(ModelFormat::Json),
            "yaml" | "yml" => Some(ModelFormat::Yaml),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ModelFormat::Json => "json",
            ModelFormat::Yaml => "yaml",
        }
    }
}

/// Capabilities the session needs from a time-sliced network.
///
/// Posterior buffers are flat and slice-major: `slices * outcomes` values for
/// a node, empty until a belief update has succeeded.
pub trait TemporalNetwork {
    /// Engine tuning fixed when the model is read.
    type Options: Default;

    fn read_file(
        path: &Path,
        format: ModelFormat,
        options: &Self::Options,
    ) -> Result<Self, EngineError>
    where
        Self: Sized;

    fn variable_count(&self) -> usize;
    fn variable_id(&self, index: usize) -> Option<&str>;
    fn outcome_names(&self, index: usize) -> Option<&[String]>;
    /// Size of the node's (static) definition table.
    fn table_size(&self, index: usize) -> Option<usize>;

    fn set_algorithm(&mut self, algorithm: Algorithm);
    fn algorithm(&self) -> Algorithm;

    fn set_slice_count(&mut self, slices: usize);
    fn slice_count(&self) -> usize;

    /// Attaches soft evidence to `index` at `slice`, replacing earlier evidence there.
    fn set_virtual_evidence(
        &mut self,
        index: usize,
        slice: usize,
        evidence: &[f64],
    ) -> Result<(), EngineError>;
    fn clear_evidence(&mut self, index: usize, slice: usize);

    fn update_beliefs(&mut self) -> Result<(), EngineError>;
    fn posterior_buffer(&self, index: usize) -> &[f64];
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read model {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse model {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unsupported model topology: {message}")]
    Topology { message: String },
    #[error("node index {index} out of range ({count} nodes)")]
    NodeIndex { index: usize, count: usize },
    #[error("slice {slice} out of range ({slices} slices)")]
    SliceIndex { slice: usize, slices: usize },
    #[error("evidence has {found} values, node has {expected} outcomes")]
    EvidenceLength { expected: usize, found: usize },
    #[error("evidence at slice {slice} has zero total likelihood")]
    ImpossibleEvidence { slice: usize },
    #[error("no time slices configured")]
    NoSlices,
}
