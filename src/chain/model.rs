//! The chain model: validated load, simultaneous mass update, reset.
//!
//! Nodes and links live in two arenas addressed by [`NodeHandle`] and
//! [`LinkHandle`]. Real states occupy handles `0..state_count()` in document
//! order; loop anchors created for self-loops follow them. Layout positions are
//! kept outside the model in a parallel array indexed by the same handles.

use super::types::{ChainDocument, Link, LinkHandle, Node, NodeHandle, State};
use crate::error::ChainError;
use std::time::Duration;
use tracing::{debug, info};

/// Slack allowed when checking that outgoing probabilities sum to at most 1
const OUTGOING_TOLERANCE: f64 = 1e-9;

/// Ask the renderer to refresh node fills and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequest {
    /// `None` repaints immediately; `Some` interpolates from `old_value`
    pub transition: Option<Duration>,
}

impl RedrawRequest {
    pub const IMMEDIATE: Self = Self { transition: None };
}

#[derive(Debug, Clone, Default)]
pub struct ChainModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Values as loaded, one per real state
    original_values: Vec<f64>,
    pending_redraw: Option<RedrawRequest>,
}

fn is_probability(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

impl ChainModel {
    /// Build a model from a document, validating it first
    pub fn from_document(doc: &ChainDocument) -> Result<Self, ChainError> {
        validate(doc)?;

        let mut nodes: Vec<Node> = doc
            .nodes
            .iter()
            .map(|spec| {
                Node::State(State {
                    name: spec.name.clone(),
                    value: spec.value,
                    old_value: None,
                    links: Vec::new(),
                })
            })
            .collect();

        let mut links: Vec<Link> = doc
            .links
            .iter()
            .map(|spec| Link::Transition {
                source: NodeHandle(spec.source),
                target: NodeHandle(spec.target),
                probability: spec.p,
                loop_anchor: None,
            })
            .collect();

        // Only document links are visited; anchor links pushed below are not.
        for i in 0..doc.links.len() {
            let spec = &doc.links[i];
            let source = NodeHandle(spec.source);

            if spec.source == spec.target {
                let anchor = NodeHandle(nodes.len());
                nodes.push(Node::LoopAnchor { parent: source });
                links.push(Link::Anchor { anchor, parent: source });
                if let Link::Transition { loop_anchor, .. } = &mut links[i] {
                    *loop_anchor = Some(anchor);
                }
            }

            if let Node::State(state) = &mut nodes[source.index()] {
                state.links.push(LinkHandle(i));
            }
        }

        let original_values = doc.nodes.iter().map(|n| n.value).collect();

        let model = Self {
            nodes,
            links,
            original_values,
            pending_redraw: Some(RedrawRequest::IMMEDIATE),
        };
        info!(
            states = model.state_count(),
            links = doc.links.len(),
            loop_anchors = model.nodes.len() - model.state_count(),
            "loaded chain"
        );
        Ok(model)
    }

    /// Replace all state with a new document.
    ///
    /// On error the current chain is left untouched.
    pub fn load(&mut self, doc: &ChainDocument) -> Result<(), ChainError> {
        *self = Self::from_document(doc)?;
        Ok(())
    }

    /// Parse and load JSON text
    pub fn load_json(&mut self, text: &str) -> Result<(), ChainError> {
        let doc = ChainDocument::from_json(text)?;
        self.load(&doc)
    }

    /// Advance the chain by one tick of size `dt`.
    ///
    /// Every flow is computed from the values before the step, so link order
    /// does not matter. Self-loops move no mass and are skipped.
    pub fn step(&mut self, dt: f64, transition: Option<Duration>) -> Result<(), ChainError> {
        if !(0.0..=1.0).contains(&dt) {
            return Err(ChainError::InvalidStep(dt));
        }

        let current: Vec<f64> = self
            .nodes
            .iter()
            .map(|n| n.value().unwrap_or(0.0))
            .collect();
        let mut next = current.clone();

        for link in &self.links {
            if let Link::Transition { source, target, probability, .. } = *link {
                if source == target {
                    continue;
                }
                let flow = probability * current[source.index()] * dt;
                next[source.index()] -= flow;
                next[target.index()] += flow;
            }
        }

        for (node, value) in self.nodes.iter_mut().zip(next) {
            if let Node::State(state) = node {
                state.old_value = Some(state.value);
                state.value = value;
            }
        }

        self.pending_redraw = Some(RedrawRequest { transition });
        Ok(())
    }

    /// Restore every state to its loaded value. Layout positions are not touched.
    pub fn reset(&mut self) {
        for (node, &value) in self.nodes.iter_mut().zip(&self.original_values) {
            if let Node::State(state) = node {
                state.value = value;
                state.old_value = None;
            }
        }
        debug!("chain values reset");
        self.pending_redraw = Some(RedrawRequest::IMMEDIATE);
    }

    /// Take the pending redraw request, if any
    pub fn take_redraw(&mut self) -> Option<RedrawRequest> {
        self.pending_redraw.take()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.index())
    }

    pub fn link(&self, handle: LinkHandle) -> Option<&Link> {
        self.links.get(handle.index())
    }

    pub fn state(&self, handle: NodeHandle) -> Option<&State> {
        self.node(handle).and_then(Node::as_state)
    }

    /// Number of real states (loop anchors excluded)
    pub fn state_count(&self) -> usize {
        self.original_values.len()
    }

    /// Real states with their handles
    pub fn states(&self) -> impl Iterator<Item = (NodeHandle, &State)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_state().map(|s| (NodeHandle(i), s)))
    }

    /// Current value of every real state, in handle order
    #[cfg(test)]
    pub fn values(&self) -> Vec<f64> {
        self.states().map(|(_, s)| s.value).collect()
    }

    /// Sum of all state values
    pub fn total_mass(&self) -> f64 {
        self.states().map(|(_, s)| s.value).sum()
    }

    /// Does `from` have a transition straight to `to`?
    pub fn one_step_to(&self, from: NodeHandle, to: NodeHandle) -> bool {
        self.state(from).map_or(false, |state| {
            state.links.iter().any(|&h| {
                matches!(self.link(h), Some(Link::Transition { target, .. }) if *target == to)
            })
        })
    }
}

fn validate(doc: &ChainDocument) -> Result<(), ChainError> {
    let len = doc.nodes.len();

    for (i, node) in doc.nodes.iter().enumerate() {
        if !is_probability(node.value) {
            return Err(ChainError::ValueOutOfRange { node: i, value: node.value });
        }
    }

    let mut outgoing = vec![0.0; len];
    for (i, link) in doc.links.iter().enumerate() {
        for index in [link.source, link.target] {
            if index >= len {
                return Err(ChainError::NodeOutOfRange { link: i, index, len });
            }
        }
        if !is_probability(link.p) {
            return Err(ChainError::ProbabilityOutOfRange { link: i, p: link.p });
        }
        outgoing[link.source] += link.p;
    }

    for (node, total) in outgoing.into_iter().enumerate() {
        if total > 1.0 + OUTGOING_TOLERANCE {
            return Err(ChainError::OutgoingMassExceeded { node, total });
        }
    }

    Ok(())
}
