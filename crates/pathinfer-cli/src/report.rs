//! Per-slice rendering of location posteriors.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use pathinfer_core::Marginals;

use crate::config::OutputFormat;

const DECIMALS: usize = 6;

/// Location posterior of one slice, in canonical outcome order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceReport {
    pub slice: usize,
    pub degraded: bool,
    pub distribution: Distribution,
}

impl SliceReport {
    pub fn new(slice: usize, names: &[String], marginals: Marginals) -> Self {
        Self {
            slice,
            degraded: marginals.degraded,
            distribution: Distribution(names.iter().cloned().zip(marginals.values).collect()),
        }
    }

    /// `name:prob` pairs joined by commas, no trailing comma.
    pub fn to_text(&self) -> String {
        self.distribution
            .0
            .iter()
            .map(|(name, p)| format!("{name}:{}", format_probability(*p)))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => serde_json::to_string(self),
        }
    }
}

/// Ordered name/probability pairs, serialized as a JSON object that keeps
/// insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution(pub Vec<(String, f64)>);

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, p) in &self.0 {
            map.serialize_entry(name, p)?;
        }
        map.end()
    }
}

/// Fixed six decimals with trailing zeros and a bare point trimmed.
pub fn format_probability(value: f64) -> String {
    let fixed = format!("{value:.prec$}", prec = DECIMALS);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}
