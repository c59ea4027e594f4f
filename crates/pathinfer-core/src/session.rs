//! A single load → verify → configure → evidence → update → extract cycle
//! over one temporal network.
//!
//! The session owns the network for its whole life and releases it exactly
//! once, including when structural verification rejects it.

use core::fmt;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

use crate::algorithm::Algorithm;
use crate::engine::{EngineError, ModelFormat, TemporalNetwork};

pub const LOCATION_NODE: usize = 0;
pub const READER_NODE: usize = 1;

const EXPECTED_VARIABLES: usize = 2;
const LOCATION_PREFIX: char = 'L';
const READER_PREFIX: char = 'R';
pub const LOCATION_OUTCOMES: usize = 6;
const READER_TABLE_SIZE: usize = 30;
/// Slices in the reference expansion: start, gap and end.
pub const REFERENCE_SLICES: usize = 3;

/// Where a session is in its single inference cycle.
///
/// A session only exists once its model is loaded and verified, so the
/// unloaded/loaded phases have no runtime representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Verified,
    Configured,
    EvidenceInjected,
    Updated,
}

/// The check a loaded model failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralMismatch {
    #[error("expected 2 variables, found {found}")]
    VariableCount { found: usize },
    #[error("variable {index} id {id:?} does not start with '{expected}'")]
    VariableId {
        index: usize,
        id: String,
        expected: char,
    },
    #[error("variable {index} definition has {found} entries, expected {expected}")]
    TableSize {
        index: usize,
        found: usize,
        expected: usize,
    },
    #[error("location variable has {found} outcomes, expected 6")]
    OutcomeCount { found: usize },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("model load failed: {0}")]
    ModelLoad(#[source] EngineError),
    #[error("model has an unknown structure: {0}")]
    StructuralMismatch(#[from] StructuralMismatch),
    #[error("{operation} is not allowed once the session is {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: SessionState,
    },
    #[error("slice count must be at least 1")]
    InvalidSliceCount,
    #[error("evidence weight {value} for outcome {outcome} is not finite and non-negative")]
    InvalidEvidence { outcome: usize, value: f64 },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result of the belief-update pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BeliefUpdate {
    Completed,
    /// The engine gave up; every marginal afterwards is the degraded fallback.
    Failed { reason: String },
}

/// Posterior distribution of one node at one slice.
///
/// `degraded` marks the uniform fallback used when the engine's result buffer
/// does not have the expected shape. A degraded result is indistinguishable
/// from a genuine uniform posterior by value alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marginals {
    pub values: Vec<f64>,
    pub degraded: bool,
}

impl Marginals {
    fn uniform(outcomes: usize) -> Self {
        let weight = 1.0 / outcomes as f64;
        Self {
            values: vec![weight; outcomes],
            degraded: true,
        }
    }
}

/// Which posterior buffer lengths `marginals` accepts as genuine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferShape {
    /// Only the three-slice reference expansion (18 location values) is
    /// read; any other length yields the degraded uniform.
    #[default]
    Reference,
    /// Any `slices * outcomes` buffer is read.
    PerSlice,
}

impl BufferShape {
    pub fn expected_len(self, slices: usize, outcomes: usize) -> usize {
        match self {
            BufferShape::Reference => REFERENCE_SLICES * outcomes,
            BufferShape::PerSlice => slices * outcomes,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "reference" => Some(BufferShape::Reference),
            "per_slice" | "per-slice" => Some(BufferShape::PerSlice),
            _ => None,
        }
    }
}

/// Checks the two-variable location/reader shape.
pub fn verify_structure<N: TemporalNetwork + ?Sized>(network: &N) -> Result<(), StructuralMismatch> {
    let found = network.variable_count();
    if found != EXPECTED_VARIABLES {
        return Err(StructuralMismatch::VariableCount { found });
    }

    for (index, expected) in [(LOCATION_NODE, LOCATION_PREFIX), (READER_NODE, READER_PREFIX)] {
        let id = network.variable_id(index).unwrap_or_default();
        if !id.starts_with(expected) {
            return Err(StructuralMismatch::VariableId {
                index,
                id: id.to_string(),
                expected,
            });
        }
    }

    for (index, expected) in [
        (LOCATION_NODE, LOCATION_OUTCOMES),
        (READER_NODE, READER_TABLE_SIZE),
    ] {
        let found = network.table_size(index).unwrap_or(0);
        if found != expected {
            return Err(StructuralMismatch::TableSize {
                index,
                found,
                expected,
            });
        }
    }

    let outcomes = network.outcome_names(LOCATION_NODE).map_or(0, <[String]>::len);
    if outcomes != LOCATION_OUTCOMES {
        return Err(StructuralMismatch::OutcomeCount { found: outcomes });
    }

    Ok(())
}

pub struct InferenceSession<N: TemporalNetwork> {
    network: N,
    algorithm: Algorithm,
    state: SessionState,
    evidence_slots: Vec<(usize, usize)>,
    buffer_shape: BufferShape,
}

impl<N: TemporalNetwork> InferenceSession<N> {
    /// Reads a model through the engine with default engine options and
    /// verifies it.
    pub fn load(path: &Path, format: ModelFormat, algorithm: Algorithm) -> Result<Self, SessionError> {
        Self::load_with(path, format, algorithm, &N::Options::default())
    }

    pub fn load_with(
        path: &Path,
        format: ModelFormat,
        algorithm: Algorithm,
        options: &N::Options,
    ) -> Result<Self, SessionError> {
        let network = N::read_file(path, format, options).map_err(SessionError::ModelLoad)?;
        event!(
            target: "pathinfer_core::session",
            Level::DEBUG,
            path = %path.display(),
            format = format.as_str(),
            "model loaded"
        );
        Self::from_network(network, algorithm)
    }

    /// Wraps an already loaded network; rejects and releases it when its
    /// structure does not match.
    pub fn from_network(mut network: N, algorithm: Algorithm) -> Result<Self, SessionError> {
        if let Err(mismatch) = verify_structure(&network) {
            event!(
                target: "pathinfer_core::session",
                Level::ERROR,
                reason = %mismatch,
                "the model imported does not have a known structure"
            );
            drop(network);
            event!(
                target: "pathinfer_core::session",
                Level::DEBUG,
                "model released"
            );
            return Err(mismatch.into());
        }

        network.set_algorithm(algorithm);
        Ok(Self {
            network,
            algorithm,
            state: SessionState::Verified,
            evidence_slots: Vec::new(),
            buffer_shape: BufferShape::default(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn slice_count(&self) -> usize {
        self.network.slice_count()
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn buffer_shape(&self) -> BufferShape {
        self.buffer_shape
    }

    /// Opts into reading buffers of other expansion widths.
    pub fn set_buffer_shape(&mut self, shape: BufferShape) {
        self.buffer_shape = shape;
    }

    /// Sets the temporal expansion width. Evidence on slices that no longer
    /// exist is dropped.
    pub fn set_slice_count(&mut self, slices: usize) -> Result<(), SessionError> {
        self.require(
            "set_slice_count",
            &[
                SessionState::Verified,
                SessionState::Configured,
                SessionState::EvidenceInjected,
            ],
        )?;
        if slices == 0 {
            return Err(SessionError::InvalidSliceCount);
        }

        self.network.set_slice_count(slices);
        let network = &mut self.network;
        self.evidence_slots.retain(|&(node, slice)| {
            if slice < slices {
                return true;
            }
            network.clear_evidence(node, slice);
            event!(
                target: "pathinfer_core::session",
                Level::DEBUG,
                node,
                slice,
                "evidence dropped by slice reconfiguration"
            );
            false
        });

        self.state = if self.evidence_slots.is_empty() {
            SessionState::Configured
        } else {
            SessionState::EvidenceInjected
        };
        Ok(())
    }

    /// Canonical location outcome names; evidence vectors must follow this order.
    pub fn location_outcome_order(&self) -> Vec<String> {
        self.network
            .outcome_names(LOCATION_NODE)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Attaches soft evidence at `slice`, overwriting earlier evidence for the
    /// same node and slice.
    pub fn inject_evidence(
        &mut self,
        node: usize,
        slice: usize,
        evidence: &[f64],
    ) -> Result<(), SessionError> {
        self.require(
            "inject_evidence",
            &[SessionState::Configured, SessionState::EvidenceInjected],
        )?;
        let outcomes = self.outcome_count(node)?;
        self.check_slice(slice)?;
        if evidence.len() != outcomes {
            return Err(EngineError::EvidenceLength {
                expected: outcomes,
                found: evidence.len(),
            }
            .into());
        }
        if let Some((outcome, &value)) = evidence
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(SessionError::InvalidEvidence { outcome, value });
        }

        self.network.set_virtual_evidence(node, slice, evidence)?;
        if !self.evidence_slots.contains(&(node, slice)) {
            self.evidence_slots.push((node, slice));
        }
        self.state = SessionState::EvidenceInjected;
        event!(
            target: "pathinfer_core::session",
            Level::DEBUG,
            node,
            slice,
            evidence = ?evidence,
            "virtual evidence set"
        );
        Ok(())
    }

    /// Runs the engine's belief update over the whole expansion. Only one
    /// update is allowed per session.
    pub fn run(&mut self) -> Result<BeliefUpdate, SessionError> {
        self.require(
            "run",
            &[SessionState::Configured, SessionState::EvidenceInjected],
        )?;

        let start = Instant::now();
        let outcome = match self.network.update_beliefs() {
            Ok(()) => BeliefUpdate::Completed,
            Err(err) => {
                event!(
                    target: "pathinfer_core::session",
                    Level::WARN,
                    algorithm = self.algorithm.name(),
                    error = %err,
                    "belief update failed"
                );
                BeliefUpdate::Failed {
                    reason: err.to_string(),
                }
            }
        };
        self.state = SessionState::Updated;
        event!(
            target: "pathinfer_core::session",
            Level::INFO,
            algorithm = self.algorithm.name(),
            slices = self.network.slice_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            completed = matches!(outcome, BeliefUpdate::Completed),
            "belief update finished"
        );
        Ok(outcome)
    }

    /// Posterior of `node` at `slice`, in the node's outcome order.
    pub fn marginals(&self, node: usize, slice: usize) -> Result<Marginals, SessionError> {
        self.require("marginals", &[SessionState::Updated])?;
        let outcomes = self.outcome_count(node)?;
        self.check_slice(slice)?;

        let expected = self
            .buffer_shape
            .expected_len(self.network.slice_count(), outcomes);
        let buffer = self.network.posterior_buffer(node);
        if buffer.len() != expected {
            event!(
                target: "pathinfer_core::session",
                Level::WARN,
                node,
                slice,
                buffer_len = buffer.len(),
                expected,
                degraded = true,
                "posterior buffer has unexpected size; substituting a uniform distribution"
            );
            return Ok(Marginals::uniform(outcomes));
        }

        let start = slice * outcomes;
        Ok(Marginals {
            values: buffer[start..start + outcomes].to_vec(),
            degraded: false,
        })
    }

    pub fn describe(&self) -> ModelSummary {
        let variables = (0..self.network.variable_count())
            .map(|index| VariableSummary {
                index,
                id: self.network.variable_id(index).unwrap_or_default().to_string(),
                outcomes: self
                    .network
                    .outcome_names(index)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default(),
                table_size: self.network.table_size(index).unwrap_or(0),
            })
            .collect();
        ModelSummary {
            algorithm: self.algorithm,
            slices: self.network.slice_count(),
            variables,
        }
    }

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }

    fn outcome_count(&self, node: usize) -> Result<usize, SessionError> {
        self.network
            .outcome_names(node)
            .map(<[String]>::len)
            .ok_or(SessionError::Engine(EngineError::NodeIndex {
                index: node,
                count: self.network.variable_count(),
            }))
    }

    fn check_slice(&self, slice: usize) -> Result<(), SessionError> {
        let slices = self.network.slice_count();
        if slice < slices {
            Ok(())
        } else {
            Err(EngineError::SliceIndex { slice, slices }.into())
        }
    }
}

impl<N: TemporalNetwork> Drop for InferenceSession<N> {
    fn drop(&mut self) {
        event!(
            target: "pathinfer_core::session",
            Level::DEBUG,
            state = ?self.state,
            "model released"
        );
    }
}

/// Static description of a session's model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub algorithm: Algorithm,
    pub slices: usize,
    pub variables: Vec<VariableSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSummary {
    pub index: usize,
    pub id: String,
    pub outcomes: Vec<String>,
    pub table_size: usize,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Algorithm: {}", self.algorithm)?;
        writeln!(f, "Number Of Nodes: {}", self.variables.len())?;
        write!(f, "Number Of Slices: {}", self.slices)?;
        for variable in &self.variables {
            write!(
                f,
                "\nIndex: {}\tName: {}\tDefinition: {}\tOutcomes: {}",
                variable.index,
                variable.id,
                variable.table_size,
                variable.outcomes.join(",")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal engine: posteriors are the normalised evidence, or uniform
    /// where no evidence was given.
    struct FakeNetwork {
        ids: Vec<String>,
        outcomes: Vec<Vec<String>>,
        tables: Vec<usize>,
        algorithm: Algorithm,
        slices: usize,
        evidence: Vec<(usize, usize, Vec<f64>)>,
        posteriors: Vec<Vec<f64>>,
        fail_update: bool,
        short_buffer: bool,
    }

    impl FakeNetwork {
        fn reference() -> Self {
            Self {
                ids: vec!["Location".into(), "Reader".into()],
                outcomes: vec![
                    (1..=6).map(|i| format!("L{i}")).collect(),
                    (1..=5).map(|i| format!("R{i}")).collect(),
                ],
                tables: vec![6, 30],
                algorithm: Algorithm::default(),
                slices: 1,
                evidence: Vec::new(),
                posteriors: vec![Vec::new(), Vec::new()],
                fail_update: false,
                short_buffer: false,
            }
        }
    }

    impl TemporalNetwork for FakeNetwork {
        type Options = ();

        fn read_file(
            _path: &Path,
            _format: ModelFormat,
            _options: &(),
        ) -> Result<Self, EngineError> {
            Ok(Self::reference())
        }

        fn variable_count(&self) -> usize {
            self.ids.len()
        }

        fn variable_id(&self, index: usize) -> Option<&str> {
            self.ids.get(index).map(String::as_str)
        }

        fn outcome_names(&self, index: usize) -> Option<&[String]> {
            self.outcomes.get(index).map(Vec::as_slice)
        }

        fn table_size(&self, index: usize) -> Option<usize> {
            self.tables.get(index).copied()
        }

        fn set_algorithm(&mut self, algorithm: Algorithm) {
            self.algorithm = algorithm;
        }

        fn algorithm(&self) -> Algorithm {
            self.algorithm
        }

        fn set_slice_count(&mut self, slices: usize) {
            self.slices = slices;
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
            self.clear_evidence(index, slice);
            self.evidence.push((index, slice, evidence.to_vec()));
            Ok(())
        }

        fn clear_evidence(&mut self, index: usize, slice: usize) {
            self.evidence.retain(|(n, s, _)| !(*n == index && *s == slice));
        }

        fn update_beliefs(&mut self) -> Result<(), EngineError> {
            if self.fail_update {
                return Err(EngineError::ImpossibleEvidence { slice: 0 });
            }
            for node in 0..self.ids.len() {
                let k = self.outcomes[node].len();
                let mut buffer = Vec::with_capacity(self.slices * k);
                for slice in 0..self.slices {
                    match self.evidence.iter().find(|(n, s, _)| *n == node && *s == slice) {
                        Some((_, _, ev)) => {
                            let total: f64 = ev.iter().sum();
                            buffer.extend(ev.iter().map(|v| v / total));
                        }
                        None => buffer.extend(std::iter::repeat(1.0 / k as f64).take(k)),
                    }
                }
                if self.short_buffer {
                    buffer.pop();
                }
                self.posteriors[node] = buffer;
            }
            Ok(())
        }

        fn posterior_buffer(&self, index: usize) -> &[f64] {
            self.posteriors.get(index).map(Vec::as_slice).unwrap_or(&[])
        }
    }

    fn session() -> InferenceSession<FakeNetwork> {
        InferenceSession::from_network(FakeNetwork::reference(), Algorithm::Lauritzen)
            .expect("reference structure")
    }

    fn one_hot(index: usize) -> Vec<f64> {
        let mut ev = vec![0.0; LOCATION_OUTCOMES];
        ev[index] = 1.0;
        ev
    }

    #[test]
    fn reference_structure_is_accepted() {
        let session = session();
        assert_eq!(session.state(), SessionState::Verified);
        assert_eq!(session.network().algorithm(), Algorithm::Lauritzen);
    }

    #[test]
    fn load_goes_through_the_engine_reader() {
        let session = InferenceSession::<FakeNetwork>::load(
            Path::new("unused.json"),
            ModelFormat::Json,
            Algorithm::EpisSampling,
        )
        .expect("fake load");
        assert_eq!(session.algorithm(), Algorithm::EpisSampling);
        assert_eq!(session.network().algorithm(), Algorithm::EpisSampling);

        let session = InferenceSession::<FakeNetwork>::load_with(
            Path::new("unused.yaml"),
            ModelFormat::Yaml,
            Algorithm::Henrion,
            &(),
        )
        .expect("fake load with options");
        assert_eq!(session.state(), SessionState::Verified);
    }

    #[test]
    fn rejects_wrong_variable_count() {
        let mut net = FakeNetwork::reference();
        net.ids.push("Extra".into());
        let err = verify_structure(&net).expect_err("three variables");
        assert_eq!(err, StructuralMismatch::VariableCount { found: 3 });
    }

    #[test]
    fn rejects_wrong_prefixes() {
        let mut net = FakeNetwork::reference();
        net.ids.swap(0, 1);
        assert!(matches!(
            verify_structure(&net),
            Err(StructuralMismatch::VariableId { index: 0, expected: 'L', .. })
        ));

        let mut net = FakeNetwork::reference();
        net.ids[1] = "Sensor".into();
        assert!(matches!(
            verify_structure(&net),
            Err(StructuralMismatch::VariableId { index: 1, expected: 'R', .. })
        ));
    }

    #[test]
    fn rejects_wrong_table_sizes() {
        let mut net = FakeNetwork::reference();
        net.tables[0] = 5;
        assert_eq!(
            verify_structure(&net),
            Err(StructuralMismatch::TableSize { index: 0, found: 5, expected: 6 })
        );

        let mut net = FakeNetwork::reference();
        net.tables[1] = 36;
        assert_eq!(
            verify_structure(&net),
            Err(StructuralMismatch::TableSize { index: 1, found: 36, expected: 30 })
        );
    }

    #[test]
    fn structural_mismatch_surfaces_as_session_error() {
        let mut net = FakeNetwork::reference();
        net.ids[0] = "Position".into();
        let err = InferenceSession::from_network(net, Algorithm::Lauritzen)
            .err()
            .expect("mismatch");
        assert!(matches!(err, SessionError::StructuralMismatch(_)));
    }

    #[test]
    fn full_cycle_extracts_marginals() {
        let mut session = session();
        session.set_slice_count(3).expect("configure");
        assert_eq!(session.state(), SessionState::Configured);

        session.inject_evidence(LOCATION_NODE, 0, &one_hot(0)).expect("first");
        session.inject_evidence(LOCATION_NODE, 2, &one_hot(1)).expect("last");
        assert_eq!(session.state(), SessionState::EvidenceInjected);

        assert_eq!(session.run().expect("run"), BeliefUpdate::Completed);
        assert_eq!(session.state(), SessionState::Updated);

        let first = session.marginals(LOCATION_NODE, 0).expect("slice 0");
        assert_eq!(first.values, one_hot(0));
        assert!(!first.degraded);
        let gap = session.marginals(LOCATION_NODE, 1).expect("slice 1");
        assert!(gap.values.iter().all(|v| (v - 1.0 / 6.0).abs() < 1e-12));
        assert!(!gap.degraded);
    }

    #[test]
    fn evidence_for_same_slot_overwrites() {
        let mut session = session();
        session.set_slice_count(3).expect("configure");
        session.inject_evidence(LOCATION_NODE, 1, &one_hot(0)).expect("first");
        session.inject_evidence(LOCATION_NODE, 1, &one_hot(4)).expect("second");
        session.run().expect("run");
        assert_eq!(session.marginals(LOCATION_NODE, 1).expect("m").values, one_hot(4));
    }

    #[test]
    fn evidence_before_configuration_is_out_of_order() {
        let mut session = session();
        let err = session
            .inject_evidence(LOCATION_NODE, 0, &one_hot(0))
            .expect_err("no slices yet");
        assert!(matches!(
            err,
            SessionError::OutOfOrder { operation: "inject_evidence", state: SessionState::Verified }
        ));
    }

    #[test]
    fn reconfiguring_drops_out_of_range_evidence() {
        let mut session = session();
        session.set_slice_count(3).expect("configure");
        session.inject_evidence(LOCATION_NODE, 2, &one_hot(3)).expect("inject");
        session.set_slice_count(2).expect("shrink");
        assert_eq!(session.state(), SessionState::Configured);
        assert!(session.network().evidence.is_empty());
    }

    #[test]
    fn configuration_may_interleave_with_evidence() {
        let mut session = session();
        session.set_slice_count(2).expect("configure");
        session.inject_evidence(LOCATION_NODE, 0, &one_hot(2)).expect("inject");
        session.set_slice_count(3).expect("widen");
        assert_eq!(session.state(), SessionState::EvidenceInjected);
        session.inject_evidence(LOCATION_NODE, 2, &one_hot(5)).expect("inject last");
        assert_eq!(session.network().evidence.len(), 2);
    }

    #[test]
    fn rejects_bad_evidence() {
        let mut session = session();
        session.set_slice_count(2).expect("configure");
        assert!(matches!(
            session.inject_evidence(LOCATION_NODE, 0, &[1.0; 5]),
            Err(SessionError::Engine(EngineError::EvidenceLength { expected: 6, found: 5 }))
        ));
        assert!(matches!(
            session.inject_evidence(LOCATION_NODE, 2, &one_hot(0)),
            Err(SessionError::Engine(EngineError::SliceIndex { slice: 2, slices: 2 }))
        ));
        assert!(matches!(
            session.inject_evidence(7, 0, &one_hot(0)),
            Err(SessionError::Engine(EngineError::NodeIndex { index: 7, .. }))
        ));
        let mut ev = one_hot(0);
        ev[3] = -0.5;
        assert!(matches!(
            session.inject_evidence(LOCATION_NODE, 0, &ev),
            Err(SessionError::InvalidEvidence { outcome: 3, .. })
        ));
    }

    #[test]
    fn zero_slices_rejected() {
        let mut session = session();
        assert!(matches!(
            session.set_slice_count(0),
            Err(SessionError::InvalidSliceCount)
        ));
    }

    #[test]
    fn second_run_and_early_marginals_are_out_of_order() {
        let mut session = session();
        session.set_slice_count(2).expect("configure");
        assert!(matches!(
            session.marginals(LOCATION_NODE, 0),
            Err(SessionError::OutOfOrder { operation: "marginals", .. })
        ));
        session.run().expect("run");
        assert!(matches!(
            session.run(),
            Err(SessionError::OutOfOrder { operation: "run", .. })
        ));
        assert!(matches!(
            session.set_slice_count(4),
            Err(SessionError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn mis_sized_buffer_falls_back_to_tagged_uniform() {
        let mut net = FakeNetwork::reference();
        net.short_buffer = true;
        let mut session = InferenceSession::from_network(net, Algorithm::Lauritzen).expect("ok");
        session.set_slice_count(3).expect("configure");
        session.inject_evidence(LOCATION_NODE, 0, &one_hot(0)).expect("inject");
        session.run().expect("run");

        let m = session.marginals(LOCATION_NODE, 0).expect("fallback");
        assert!(m.degraded);
        assert_eq!(m.values, vec![1.0 / 6.0; 6]);
    }

    #[test]
    fn two_slice_buffer_degrades_under_reference_shape() {
        let mut session = session();
        session.set_slice_count(2).expect("configure");
        session.inject_evidence(LOCATION_NODE, 0, &one_hot(0)).expect("first");
        session.inject_evidence(LOCATION_NODE, 1, &one_hot(1)).expect("last");
        session.run().expect("run");

        for slice in 0..2 {
            let m = session.marginals(LOCATION_NODE, slice).expect("fallback");
            assert!(m.degraded);
            assert_eq!(m.values, vec![1.0 / 6.0; 6]);
        }
    }

    #[test]
    fn per_slice_shape_reads_other_widths() {
        let mut session = session();
        assert_eq!(session.buffer_shape(), BufferShape::Reference);
        session.set_buffer_shape(BufferShape::PerSlice);
        session.set_slice_count(2).expect("configure");
        session.inject_evidence(LOCATION_NODE, 1, &one_hot(1)).expect("last");
        session.run().expect("run");

        let m = session.marginals(LOCATION_NODE, 1).expect("slice 1");
        assert!(!m.degraded);
        assert_eq!(m.values, one_hot(1));
    }

    #[test]
    fn buffer_shape_lengths() {
        assert_eq!(BufferShape::Reference.expected_len(2, LOCATION_OUTCOMES), 18);
        assert_eq!(BufferShape::Reference.expected_len(3, LOCATION_OUTCOMES), 18);
        assert_eq!(BufferShape::PerSlice.expected_len(2, LOCATION_OUTCOMES), 12);
        assert_eq!(BufferShape::from_str("per-slice"), Some(BufferShape::PerSlice));
        assert_eq!(BufferShape::from_str("exact"), None);
    }

    #[test]
    fn failed_update_is_reported_and_degrades_marginals() {
        let mut net = FakeNetwork::reference();
        net.fail_update = true;
        let mut session = InferenceSession::from_network(net, Algorithm::Lauritzen).expect("ok");
        session.set_slice_count(2).expect("configure");
        let outcome = session.run().expect("run");
        assert!(matches!(outcome, BeliefUpdate::Failed { .. }));
        assert!(session.marginals(LOCATION_NODE, 1).expect("fallback").degraded);
    }

    #[test]
    fn outcome_order_is_stable_within_a_session() {
        let session = session();
        let first = session.location_outcome_order();
        let second = session.location_outcome_order();
        assert_eq!(first, second);
        assert_eq!(first.len(), LOCATION_OUTCOMES);
    }

    #[test]
    fn describe_lists_both_variables() {
        let mut session = session();
        session.set_slice_count(3).expect("configure");
        let summary = session.describe();
        assert_eq!(summary.slices, 3);
        assert_eq!(summary.variables[1].id, "Reader");
        assert_eq!(summary.variables[1].table_size, 30);
        assert!(summary.to_string().contains("Index: 0\tName: Location"));
    }
}
