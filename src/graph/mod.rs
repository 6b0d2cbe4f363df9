//! Force-directed layout for the chain graph.

pub mod layout;
mod quadtree;

pub use layout::ForceLayout;
