use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use pathinfer_core::{BufferShape, ModelFormat};
use pathinfer_dbn::EngineOptions;

const DEFAULT_MODEL_PATH: &str = "models/experiment_dbn.json";

/// Root runtime configuration loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: AppConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.model.validate()?;
        self.inference.validate()?;
        self.logging.normalize();
        self.logging.validate()?;
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            samples: self.inference.samples,
            seed: self
                .inference
                .seed
                .unwrap_or_else(|| EngineOptions::default().seed),
            loopy_max_iterations: self.inference.loopy_max_iterations,
            loopy_tolerance: self.inference.loopy_tolerance,
        }
    }
}

/// Model file location and serialization.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// Inferred from the file extension when absent.
    #[serde(default)]
    pub format: Option<ModelFormat>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            format: None,
        }
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "model.path".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn resolved_format(&self) -> ModelFormat {
        self.format
            .unwrap_or_else(|| ModelFormat::from_path(&self.path))
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

/// Tuning for the sampling and message-passing families. Unset fields take
/// the engine's own defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InferenceConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_loopy_max_iterations")]
    pub loopy_max_iterations: usize,
    #[serde(default = "default_loopy_tolerance")]
    pub loopy_tolerance: f64,
    /// `per_slice` reads posteriors of any expansion width instead of only
    /// the three-slice reference.
    #[serde(default)]
    pub buffer_shape: BufferShape,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Self {
            samples: engine.samples,
            seed: None,
            loopy_max_iterations: engine.loopy_max_iterations,
            loopy_tolerance: engine.loopy_tolerance,
            buffer_shape: BufferShape::default(),
        }
    }
}

impl InferenceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.samples == 0 {
            return Err(ValidationError::InvalidField {
                field: "inference.samples".to_string(),
                message: "number of samples must be greater than zero".to_string(),
            });
        }

        if self.loopy_max_iterations == 0 {
            return Err(ValidationError::InvalidField {
                field: "inference.loopy_max_iterations".to_string(),
                message: "iteration cap must be at least 1".to_string(),
            });
        }

        if !self.loopy_tolerance.is_finite() || self.loopy_tolerance <= 0.0 {
            return Err(ValidationError::InvalidField {
                field: "inference.loopy_tolerance".to_string(),
                message: format!(
                    "tolerance must be positive and finite, got {}",
                    self.loopy_tolerance
                ),
            });
        }

        Ok(())
    }
}

fn default_samples() -> usize {
    EngineOptions::default().samples
}

fn default_loopy_max_iterations() -> usize {
    EngineOptions::default().loopy_max_iterations
}

fn default_loopy_tolerance() -> f64 {
    EngineOptions::default().loopy_tolerance
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration; stderr only unless `log_file` is set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            tracing_level: default_tracing_level(),
            log_file: None,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.tracing_level),
            });
        }
        Ok(())
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "warn".to_string()
}

/// Errors that can occur while loading configuration from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
