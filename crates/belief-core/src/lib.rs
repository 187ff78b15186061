//! Belief Propagation Simulation Core
//!
//! Agents hold one belief each, arranged on a fixed topology. Every iteration
//! a random agent and one of its neighbors hold a conversation; the defender
//! then keeps, refines or replaces its belief, and the outcome is logged.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod dialogue;
pub mod display;
pub mod engine;
pub mod error;
pub mod rng;
pub mod summary;
pub mod topology;

pub use catalog::BeliefCatalog;
pub use classifier::classify;
pub use config::{BackendConfig, SimConfig};
pub use dialogue::{ConversationCollaborator, Dialogue, EchoCollaborator, OllamaBackend};
pub use engine::{RunObserver, RunParams, SimulationEngine};
pub use error::{CatalogError, CollaboratorError, Result, SimError};
pub use rng::SimRng;
pub use summary::{ChangeTally, RunSummary};
pub use topology::{Layout, LayoutKind, Topology};
