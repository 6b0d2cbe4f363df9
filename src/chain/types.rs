//! Chain data types: the external JSON document and the internal node/link arena.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// A state as written in the chain document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub value: f64,
}

/// A transition as written in the chain document.
/// `source` and `target` are positions in the document's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: usize,
    pub target: usize,
    pub p: f64,
}

/// Complete chain document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl ChainDocument {
    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self, ChainError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty-printed JSON, as shown in the editor
    pub fn to_json_pretty(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Stable index of a node in the model arena.
///
/// Real states keep their document position; loop anchors are appended after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable index of a link in the model arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(pub usize);

impl LinkHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A state carrying probability mass
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub value: f64,
    /// Value before the most recent step, kept for interpolated redraws
    pub old_value: Option<f64>,
    /// Outgoing transitions, in document order
    pub links: Vec<LinkHandle>,
}

/// A node in the arena
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    State(State),
    /// Synthetic node giving a self-loop something to bend around.
    /// Carries no mass.
    LoopAnchor { parent: NodeHandle },
}

impl Node {
    pub fn as_state(&self) -> Option<&State> {
        match self {
            Node::State(state) => Some(state),
            Node::LoopAnchor { .. } => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.as_state().map(|s| s.value)
    }

    #[cfg(test)]
    pub fn is_loop_anchor(&self) -> bool {
        matches!(self, Node::LoopAnchor { .. })
    }
}

/// A link in the arena
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// A transition from the document
    Transition {
        source: NodeHandle,
        target: NodeHandle,
        probability: f64,
        /// Set for self-loops: the anchor the loop arc is drawn towards
        loop_anchor: Option<NodeHandle>,
    },
    /// Spring tying a loop anchor to its parent. Layout only.
    Anchor { anchor: NodeHandle, parent: NodeHandle },
}

impl Link {
    /// (source, target) as seen by the layout
    pub fn endpoints(&self) -> (NodeHandle, NodeHandle) {
        match *self {
            Link::Transition { source, target, .. } => (source, target),
            Link::Anchor { anchor, parent } => (anchor, parent),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        matches!(self, Link::Transition { source, target, .. } if source == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_shape() {
        let doc = ChainDocument::from_json(
            r#"{"nodes":[{"name":"A","value":1.0},{"name":"B","value":0}],
                "links":[{"source":0,"target":1,"p":0.5}]}"#,
        )
        .unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[1].name, "B");
        assert_eq!(doc.links[0], LinkSpec { source: 0, target: 1, p: 0.5 });
    }

    #[test]
    fn missing_links_means_no_transitions() {
        let doc = ChainDocument::from_json(r#"{"nodes":[{"name":"A","value":1}]}"#).unwrap();
        assert!(doc.links.is_empty());
    }

    #[test]
    fn rejects_negative_index() {
        let err = ChainDocument::from_json(
            r#"{"nodes":[{"name":"A","value":1}],"links":[{"source":-1,"target":0,"p":0.1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::Parse(_)));
    }

    #[test]
    fn pretty_json_reparses() {
        let doc = ChainDocument {
            nodes: vec![NodeSpec { name: "A".into(), value: 0.25 }],
            links: vec![LinkSpec { source: 0, target: 0, p: 0.3 }],
        };
        let text = doc.to_json_pretty().unwrap();
        assert!(text.contains("\"p\": 0.3"));
        assert_eq!(ChainDocument::from_json(&text).unwrap(), doc);
    }

    #[test]
    fn self_loop_detection() {
        let loop_link = Link::Transition {
            source: NodeHandle(2),
            target: NodeHandle(2),
            probability: 0.5,
            loop_anchor: Some(NodeHandle(3)),
        };
        assert!(loop_link.is_self_loop());
        let anchor = Link::Anchor { anchor: NodeHandle(3), parent: NodeHandle(2) };
        assert!(!anchor.is_self_loop());
        assert_eq!(anchor.endpoints(), (NodeHandle(3), NodeHandle(2)));
    }
}
