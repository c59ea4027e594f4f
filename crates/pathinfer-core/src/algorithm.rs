use core::fmt;
use serde::{Deserialize, Serialize};

/// Belief-update strategies selectable by integer code 0–16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Algorithm {
    #[default]
    Lauritzen = 0,
    Henrion = 1,
    Pearl = 2,
    LogicSampling = 3,
    SelfImportance = 4,
    HeuristicImportance = 5,
    BackSampling = 6,
    AisSampling = 7,
    EpisSampling = 8,
    LoopyBeliefPropagation = 9,
    LauritzenOld = 10,
    RelevanceDecomposition = 11,
    RelevanceDecomposition2 = 12,
    HybridEpis = 13,
    HybridLikelihoodWeighting = 14,
    HybridLoopyBeliefPropagation = 15,
    HybridLogicSampling = 16,
}

/// How an [`Algorithm`] actually updates beliefs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFamily {
    Exact,
    Sampling,
    Loopy,
}

impl Algorithm {
    pub const ALL: [Algorithm; 17] = [
        Algorithm::Lauritzen,
        Algorithm::Henrion,
        Algorithm::Pearl,
        Algorithm::LogicSampling,
        Algorithm::SelfImportance,
        Algorithm::HeuristicImportance,
        Algorithm::BackSampling,
        Algorithm::AisSampling,
        Algorithm::EpisSampling,
        Algorithm::LoopyBeliefPropagation,
        Algorithm::LauritzenOld,
        Algorithm::RelevanceDecomposition,
        Algorithm::RelevanceDecomposition2,
        Algorithm::HybridEpis,
        Algorithm::HybridLikelihoodWeighting,
        Algorithm::HybridLoopyBeliefPropagation,
        Algorithm::HybridLogicSampling,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::ALL.len() {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Out-of-range codes select [`Algorithm::Lauritzen`].
    pub fn from_code(code: i64) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(Self::from_index)
            .unwrap_or_default()
    }

    /// Parses a command-line code; anything non-numeric selects the default.
    pub fn from_arg(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .map(Self::from_code)
            .unwrap_or_default()
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn family(self) -> AlgorithmFamily {
        match self {
            Algorithm::Lauritzen
            | Algorithm::Henrion
            | Algorithm::LauritzenOld
            | Algorithm::RelevanceDecomposition
            | Algorithm::RelevanceDecomposition2 => AlgorithmFamily::Exact,
            Algorithm::Pearl
            | Algorithm::LoopyBeliefPropagation
            | Algorithm::HybridLoopyBeliefPropagation => AlgorithmFamily::Loopy,
            Algorithm::LogicSampling
            | Algorithm::SelfImportance
            | Algorithm::HeuristicImportance
            | Algorithm::BackSampling
            | Algorithm::AisSampling
            | Algorithm::EpisSampling
            | Algorithm::HybridEpis
            | Algorithm::HybridLikelihoodWeighting
            | Algorithm::HybridLogicSampling => AlgorithmFamily::Sampling,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Lauritzen => "Lauritzen",
            Algorithm::Henrion => "Henrion",
            Algorithm::Pearl => "Pearl",
            Algorithm::LogicSampling => "LogicSampling",
            Algorithm::SelfImportance => "SelfImportance",
            Algorithm::HeuristicImportance => "HeuristicImportance",
            Algorithm::BackSampling => "BackSampling",
            Algorithm::AisSampling => "AisSampling",
            Algorithm::EpisSampling => "EpisSampling",
            Algorithm::LoopyBeliefPropagation => "LoopyBeliefPropagation",
            Algorithm::LauritzenOld => "LauritzenOld",
            Algorithm::RelevanceDecomposition => "RelevanceDecomposition",
            Algorithm::RelevanceDecomposition2 => "RelevanceDecomposition2",
            Algorithm::HybridEpis => "HybridEpis",
            Algorithm::HybridLikelihoodWeighting => "HybridLikelihoodWeighting",
            Algorithm::HybridLoopyBeliefPropagation => "HybridLoopyBeliefPropagation",
            Algorithm::HybridLogicSampling => "HybridLogicSampling",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
