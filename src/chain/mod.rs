//! Markov chain data structures and the probability-mass update.

pub mod model;
pub mod types;

pub use model::{ChainModel, RedrawRequest};
pub use types::{ChainDocument, Link, LinkHandle, Node, NodeHandle};
