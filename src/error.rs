//! Error types for loading, validating and stepping a chain.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the chain model.
///
/// Everything except `Parse` is a validation or usage error the control
/// surface reports to the user while keeping the previous chain running.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The document is not valid JSON or does not have the chain shape
    #[error("malformed chain document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A link references a node index past the end of the node list
    #[error("link {link} references node {index}, but only {len} nodes are defined")]
    NodeOutOfRange { link: usize, index: usize, len: usize },

    /// A node value is not a probability
    #[error("node {node} has value {value}, expected a number in [0, 1]")]
    ValueOutOfRange { node: usize, value: f64 },

    /// A link probability is not a probability
    #[error("link {link} has probability {p}, expected a number in [0, 1]")]
    ProbabilityOutOfRange { link: usize, p: f64 },

    /// Outgoing transitions of a node sum past 1
    #[error("outgoing probabilities of node {node} sum to {total}, which exceeds 1")]
    OutgoingMassExceeded { node: usize, total: f64 },

    /// `step` called with a timestep outside [0, 1]
    #[error("invalid step size: {0}")]
    InvalidStep(f64),
}

/// Errors raised while fetching the initial chain document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Fatal errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not load initial chain: {0}")]
    Source(#[from] SourceError),

    #[error("window error: {0}")]
    Ui(#[from] eframe::Error),
}
