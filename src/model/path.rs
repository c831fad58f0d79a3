//! The drawn path: a simple orthogonal walk over lattice nodes.

use serde::{Deserialize, Serialize};

use super::grid::Node;

/// An ordered sequence of distinct nodes where consecutive nodes are one
/// orthogonal step apart.
///
/// The only way to grow a `Path` is [`Path::try_extend`], so the invariant
/// holds for every value built through this API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    nodes: Vec<Node>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// A path holding just the seed node.
    pub fn seeded(node: Node) -> Self {
        Self { nodes: vec![node] }
    }

    /// Rebuild a path from untrusted nodes, e.g. a loaded document.
    ///
    /// Returns `None` if the sequence is not a simple orthogonal walk.
    pub fn from_nodes(nodes: Vec<Node>) -> Option<Self> {
        let path = Self { nodes };
        path.is_simple_walk().then_some(path)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<Node> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<Node> {
        self.nodes.last().copied()
    }

    pub fn contains(&self, node: Node) -> bool {
        self.nodes.contains(&node)
    }

    /// Whether `node` may be appended: adjacent to the last node and not
    /// already visited. An empty path accepts nothing.
    pub fn can_extend(&self, node: Node) -> bool {
        match self.last() {
            Some(last) => last.is_adjacent(&node) && !self.contains(node),
            None => false,
        }
    }

    /// Append `node` if legal. Returns whether it was appended.
    pub fn try_extend(&mut self, node: Node) -> bool {
        if !self.can_extend(node) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Remove the most recent node, never going below the seed.
    pub fn pop_keep_seed(&mut self) -> Option<Node> {
        if self.nodes.len() > 1 {
            self.nodes.pop()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Check uniqueness and unit-step adjacency over the whole sequence.
    pub fn is_simple_walk(&self) -> bool {
        let adjacent = self.nodes.windows(2).all(|w| w[0].is_adjacent(&w[1]));
        let unique = self
            .nodes
            .iter()
            .enumerate()
            .all(|(i, n)| !self.nodes[..i].contains(n));
        adjacent && unique
    }

    /// Consecutive node pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }
}
