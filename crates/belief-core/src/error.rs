//! Error Types
//!
//! None of these are retried anywhere in the core: every error aborts the run
//! it occurs in.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Bad topology or run parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("agent {agent_id} is out of range (agent count {agent_count})")]
    OutOfRange { agent_id: usize, agent_count: usize },

    /// An agent has no one to talk to
    #[error("agent {agent_id} has no neighbors")]
    EmptyNeighborhood { agent_id: usize },

    #[error("failed to load belief catalog: {0}")]
    CatalogLoad(#[from] CatalogError),

    #[error("conversation failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Writing the simulation log failed
    #[error("log error: {0}")]
    Log(#[from] std::io::Error),
}

/// Reasons a belief catalog could not be loaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed belief file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("belief list is empty")]
    Empty,
}

/// Failures raised by a conversation collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The backend could not be reached
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with an error status
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend answered with something unusable
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
