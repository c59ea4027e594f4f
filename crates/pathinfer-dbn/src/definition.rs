//! On-disk model definition and its compilation into a time chain.
//!
//! A model has one root node that evolves over time (its `temporal` table is
//! the slice-to-slice transition) and any number of children that each hang
//! off the root within a slice.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use pathinfer_core::{EngineError, ModelFormat};
use serde::{Deserialize, Serialize};

const ROW_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: String,
    #[serde(default = "default_slices")]
    pub slices: usize,
    pub nodes: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    /// Prior for the root, parent-outcome-major CPT for children.
    pub probabilities: Vec<f64>,
    /// Row-major `outcomes x outcomes` transition; root only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<Vec<f64>>,
}

fn default_slices() -> usize {
    1
}

impl ModelDefinition {
    pub fn from_file(path: &Path, format: ModelFormat) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|source| EngineError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let parsed: Result<Self, String> = match format {
            ModelFormat::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            ModelFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| EngineError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub(crate) fn compile(&self) -> Result<ChainStructure, EngineError> {
        if self.nodes.is_empty() {
            return Err(topology("model has no nodes"));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.id.trim().is_empty() {
                return Err(topology("node id must not be empty"));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(topology(format!("node '{}' defined more than once", node.id)));
            }
            if node.outcomes.is_empty() {
                return Err(topology(format!("node '{}' has no outcomes", node.id)));
            }
            let mut names = HashSet::new();
            if let Some(dup) = node.outcomes.iter().find(|o| !names.insert(o.as_str())) {
                return Err(topology(format!(
                    "node '{}' lists outcome '{dup}' twice",
                    node.id
                )));
            }
        }

        let roots: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parents.is_empty())
            .collect();
        let &[root] = roots.as_slice() else {
            return Err(topology(format!(
                "expected exactly one root node, found {}",
                roots.len()
            )));
        };
        let root_node = &self.nodes[root];
        let states = root_node.outcomes.len();

        check_rows(&root_node.id, "prior", &root_node.probabilities, 1, states)?;
        let transition = match &root_node.temporal {
            Some(table) => {
                check_rows(&root_node.id, "temporal", table, states, states)?;
                table.clone()
            }
            None => root_node.probabilities.repeat(states),
        };

        let mut children = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if index == root {
                continue;
            }
            if node.parents.len() != 1 || node.parents[0] != root_node.id {
                return Err(topology(format!(
                    "node '{}' must have '{}' as its only parent",
                    node.id, root_node.id
                )));
            }
            if node.temporal.is_some() {
                return Err(topology(format!(
                    "node '{}' is not the root and cannot carry a temporal table",
                    node.id
                )));
            }
            let outcomes = node.outcomes.len();
            check_rows(&node.id, "definition", &node.probabilities, states, outcomes)?;
            children.push(ChildTable {
                node: index,
                outcomes,
                cpt: node.probabilities.clone(),
            });
        }

        Ok(ChainStructure {
            root,
            states,
            prior: root_node.probabilities.clone(),
            transition,
            children,
        })
    }
}

/// A validated model reduced to what belief updating needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChainStructure {
    pub root: usize,
    pub states: usize,
    pub prior: Vec<f64>,
    pub transition: Vec<f64>,
    pub children: Vec<ChildTable>,
}

impl ChainStructure {
    pub fn child(&self, node: usize) -> Option<&ChildTable> {
        self.children.iter().find(|c| c.node == node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChildTable {
    pub node: usize,
    pub outcomes: usize,
    pub cpt: Vec<f64>,
}

impl ChildTable {
    pub fn row(&self, parent_state: usize) -> &[f64] {
        &self.cpt[parent_state * self.outcomes..(parent_state + 1) * self.outcomes]
    }
}

fn check_rows(
    node: &str,
    table: &str,
    values: &[f64],
    rows: usize,
    width: usize,
) -> Result<(), EngineError> {
    if values.len() != rows * width {
        return Err(topology(format!(
            "node '{node}' {table} table has {} entries, expected {}",
            values.len(),
            rows * width
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(topology(format!(
            "node '{node}' {table} table contains invalid probability {bad}"
        )));
    }
    for (row, chunk) in values.chunks(width).enumerate() {
        let sum: f64 = chunk.iter().sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(topology(format!(
                "node '{node}' {table} row {row} sums to {sum}"
            )));
        }
    }
    Ok(())
}

fn topology(message: impl Into<String>) -> EngineError {
    EngineError::Topology {
        message: message.into(),
    }
}
