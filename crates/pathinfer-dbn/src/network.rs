use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use pathinfer_core::{Algorithm, EngineError, ModelFormat, TemporalNetwork};
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::definition::{ChainStructure, ModelDefinition};
use crate::inference::{self, ChainProblem};

const DEFAULT_SAMPLES: usize = 10_000;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_LOOPY_MAX_ITERATIONS: usize = 100;
const DEFAULT_LOOPY_TOLERANCE: f64 = 1e-9;

/// Tuning knobs for the sampling and loopy families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub samples: usize,
    pub seed: u64,
    pub loopy_max_iterations: usize,
    pub loopy_tolerance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            loopy_max_iterations: DEFAULT_LOOPY_MAX_ITERATIONS,
            loopy_tolerance: DEFAULT_LOOPY_TOLERANCE,
        }
    }
}

/// Time-sliced network: one root chain plus per-slice children.
#[derive(Debug, Clone)]
pub struct DynamicNetwork {
    definition: ModelDefinition,
    chain: ChainStructure,
    algorithm: Algorithm,
    options: EngineOptions,
    slices: usize,
    evidence: BTreeMap<(usize, usize), Vec<f64>>,
    posteriors: Vec<Vec<f64>>,
}

impl DynamicNetwork {
    pub fn from_definition(definition: ModelDefinition) -> Result<Self, EngineError> {
        let chain = definition.compile()?;
        let slices = definition.slices.max(1);
        let node_count = definition.nodes.len();
        Ok(Self {
            definition,
            chain,
            algorithm: Algorithm::default(),
            options: EngineOptions::default(),
            slices,
            evidence: BTreeMap::new(),
            posteriors: vec![Vec::new(); node_count],
        })
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    fn invalidate(&mut self) {
        self.posteriors.iter_mut().for_each(Vec::clear);
    }

    fn check_node(&self, index: usize) -> Result<usize, EngineError> {
        self.definition
            .nodes
            .get(index)
            .map(|node| node.outcomes.len())
            .ok_or(EngineError::NodeIndex {
                index,
                count: self.definition.nodes.len(),
            })
    }

    /// Root likelihood per slice from every piece of virtual evidence.
    fn likelihoods(&self) -> Vec<Vec<f64>> {
        let mut likelihoods = vec![vec![1.0; self.chain.states]; self.slices];
        for (&(node, slice), evidence) in &self.evidence {
            let Some(slot) = likelihoods.get_mut(slice) else {
                continue;
            };
            if node == self.chain.root {
                slot.iter_mut().zip(evidence).for_each(|(l, e)| *l *= e);
            } else if let Some(child) = self.chain.child(node) {
                for (state, l) in slot.iter_mut().enumerate() {
                    let support: f64 = child.row(state).iter().zip(evidence).map(|(p, e)| p * e).sum();
                    *l *= support;
                }
            }
        }
        likelihoods
    }

    fn fill_posteriors(&mut self, root_posteriors: &[Vec<f64>]) {
        let mut buffers = vec![Vec::new(); self.definition.nodes.len()];
        buffers[self.chain.root] = root_posteriors.concat();

        for child in &self.chain.children {
            let mut buffer = Vec::with_capacity(self.slices * child.outcomes);
            for (slice, root) in root_posteriors.iter().enumerate() {
                let evidence = self.evidence.get(&(child.node, slice));
                let mut marginal = vec![0.0; child.outcomes];
                for (state, p_state) in root.iter().enumerate() {
                    let mut row: Vec<f64> = child.row(state).to_vec();
                    if let Some(evidence) = evidence {
                        row.iter_mut().zip(evidence).for_each(|(r, e)| *r *= e);
                    }
                    if inference::normalise(&mut row).is_none() {
                        continue;
                    }
                    marginal.iter_mut().zip(&row).for_each(|(m, r)| *m += p_state * r);
                }
                buffer.extend(marginal);
            }
            buffers[child.node] = buffer;
        }

        self.posteriors = buffers;
    }
}

impl TemporalNetwork for DynamicNetwork {
    type Options = EngineOptions;

    fn read_file(
        path: &Path,
        format: ModelFormat,
        options: &EngineOptions,
    ) -> Result<Self, EngineError> {
        let definition = ModelDefinition::from_file(path, format)?;
        let network = Self::from_definition(definition)?.with_options(*options);
        event!(
            target: "pathinfer_dbn::engine",
            Level::DEBUG,
            path = %path.display(),
            id = network.id(),
            nodes = network.variable_count(),
            samples = options.samples,
            seed = options.seed,
            "model definition read"
        );
        Ok(network)
    }

    fn variable_count(&self) -> usize {
        self.definition.nodes.len()
    }

    fn variable_id(&self, index: usize) -> Option<&str> {
        self.definition.nodes.get(index).map(|n| n.id.as_str())
    }

    fn outcome_names(&self, index: usize) -> Option<&[String]> {
        self.definition.nodes.get(index).map(|n| n.outcomes.as_slice())
    }

    fn table_size(&self, index: usize) -> Option<usize> {
        self.definition.nodes.get(index).map(|n| n.probabilities.len())
    }

    fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn set_slice_count(&mut self, slices: usize) {
        self.slices = slices;
        self.evidence.retain(|&(_, slice), _| slice < slices);
        self.invalidate();
    }

    fn slice_count(&self) -> usize {
        self.slices
    }

    fn set_virtual_evidence(
        &mut self,
        index: usize,
        slice: usize,
        evidence: &[f64],
    ) -> Result<(), EngineError> {
        let expected = self.check_node(index)?;
        if slice >= self.slices {
            return Err(EngineError::SliceIndex {
                slice,
                slices: self.slices,
            });
        }
        if evidence.len() != expected {
            return Err(EngineError::EvidenceLength {
                expected,
                found: evidence.len(),
            });
        }
        self.evidence.insert((index, slice), evidence.to_vec());
        self.invalidate();
        Ok(())
    }

    fn clear_evidence(&mut self, index: usize, slice: usize) {
        if self.evidence.remove(&(index, slice)).is_some() {
            self.invalidate();
        }
    }

    fn update_beliefs(&mut self) -> Result<(), EngineError> {
        self.invalidate();
        if self.slices == 0 {
            return Err(EngineError::NoSlices);
        }

        let likelihoods = self.likelihoods();
        let problem = ChainProblem {
            prior: &self.chain.prior,
            transition: &self.chain.transition,
            likelihoods,
        };

        let start = Instant::now();
        let family = self.algorithm.family();
        let root_posteriors = inference::run(family, &problem, &self.options)?;

        event!(
            target: "pathinfer_dbn::engine",
            Level::DEBUG,
            algorithm = self.algorithm.name(),
            family = ?family,
            slices = self.slices,
            elapsed_us = start.elapsed().as_micros() as u64,
            "beliefs updated"
        );
        self.fill_posteriors(&root_posteriors);
        Ok(())
    }

    fn posterior_buffer(&self, index: usize) -> &[f64] {
        self.posteriors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
