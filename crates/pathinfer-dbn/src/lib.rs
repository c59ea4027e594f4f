//! Time-sliced network engine behind the `TemporalNetwork` adapter.

pub mod definition;
pub mod inference;
pub mod network;

pub use definition::{ModelDefinition, NodeDefinition};
pub use network::{DynamicNetwork, EngineOptions};
