//! Type visibility and node selection.

mod search;

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::graph::{GraphData, GraphStore, Link, Node, NodeType};

pub use search::{SearchHit, search_nodes};

/// Node types currently filtered out of the view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HiddenTypes {
    hidden: BTreeSet<NodeType>,
}

impl HiddenTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips visibility of `node_type`. Returns `true` when it is now hidden.
    pub fn toggle(&mut self, node_type: NodeType) -> bool {
        let hidden = if self.hidden.remove(&node_type) {
            false
        } else {
            self.hidden.insert(node_type);
            true
        };
        debug!(node_type = node_type.label(), hidden, "toggled type visibility");
        hidden
    }

    pub fn is_hidden(&self, node_type: NodeType) -> bool {
        self.hidden.contains(&node_type)
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.hidden.iter().copied()
    }
}

/// Nodes whose type is not hidden and the links between them, in store order.
pub fn derive_visible(store: &GraphStore, hidden: &HiddenTypes) -> GraphData {
    derive_visible_from(store.nodes(), store.links(), hidden)
}

pub fn derive_visible_from(nodes: &[Node], links: &[Link], hidden: &HiddenTypes) -> GraphData {
    let nodes = nodes
        .iter()
        .filter(|node| !hidden.is_hidden(node.node_type))
        .cloned()
        .collect::<Vec<_>>();
    let visible = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
    let links = links
        .iter()
        .filter(|link| {
            visible.contains(link.source_id.as_str()) && visible.contains(link.target_id.as_str())
        })
        .cloned()
        .collect();
    GraphData { nodes, links }
}

/// Insertion-ordered set of selected node ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    /// Most recently added id.
    pub fn primary(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    /// Plain click: replace the selection.
    pub fn select_only(&mut self, id: impl Into<String>) {
        self.ids.clear();
        self.ids.push(id.into());
    }

    /// Modifier click: add when absent, remove when present.
    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|selected| selected == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id.to_owned());
        }
    }

    /// Background click.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected != id);
        self.ids.len() != before
    }

    /// Drops ids that no longer name a visible node.
    pub fn retain_existing(&mut self, visible: &GraphData) {
        self.ids.retain(|id| visible.contains(id));
    }
}
