use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::{GraphData, Link, LinkKind, Node, NodeLayout, NodePatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node `{0}` already exists")]
    DuplicateNode(String),

    #[error("node `{0}` not found")]
    UnknownNode(String),

    #[error("link {source_id} -> {target_id} references missing node `{missing}`")]
    UnknownEndpoint {
        source_id: String,
        target_id: String,
        missing: String,
    },
}

/// Canonical node/link collection for the active viewing level.
///
/// Every mutation keeps link endpoints valid by construction: links are only
/// accepted between known ids and node deletion removes incident links first.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    data: GraphData,
    ids: HashSet<String>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing data. Duplicate ids keep their first occurrence and
    /// dangling links are dropped.
    pub fn from_data(data: GraphData) -> Self {
        let mut store = Self::default();
        store.replace(data);
        store
    }

    pub fn replace(&mut self, data: GraphData) {
        let mut ids = HashSet::with_capacity(data.nodes.len());
        let mut nodes = Vec::with_capacity(data.nodes.len());
        for node in data.nodes {
            if ids.insert(node.id.clone()) {
                nodes.push(node);
            } else {
                debug!(node = %node.id, "dropping duplicate node id");
            }
        }

        self.data = GraphData {
            nodes,
            links: data.links,
        };
        self.ids = ids;
        self.prune_dangling_links();
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn snapshot(&self) -> GraphData {
        self.data.clone()
    }

    pub fn into_data(self) -> GraphData {
        self.data
    }

    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.data.links
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.data.links.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        if !self.contains(id) {
            return None;
        }
        self.data.node(id)
    }

    pub fn links_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.data.links.iter().filter(move |link| link.touches(id))
    }

    /// Ids adjacent to `id` in either direction, in link order, deduplicated.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();
        for link in self.links_of(id) {
            let other = if link.source_id == id {
                &link.target_id
            } else {
                &link.source_id
            };
            if other != id && seen.insert(other.as_str()) {
                neighbors.push(other.clone());
            }
        }
        neighbors
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.ids.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.ids.insert(node.id.clone());
        self.data.nodes.push(node);
        Ok(())
    }

    pub fn add_link(
        &mut self,
        source_id: &str,
        target_id: &str,
        relation: &str,
    ) -> Result<(), GraphError> {
        self.insert_link(Link::new(source_id, target_id, relation))
    }

    pub fn add_lineage_link(
        &mut self,
        source_id: &str,
        target_id: &str,
        relation: &str,
    ) -> Result<(), GraphError> {
        self.insert_link(Link::new(source_id, target_id, relation).with_kind(LinkKind::Lineage))
    }

    /// Appends a fully formed link. Parallel links between the same pair are
    /// allowed.
    pub fn insert_link(&mut self, link: Link) -> Result<(), GraphError> {
        for endpoint in [&link.source_id, &link.target_id] {
            if !self.ids.contains(endpoint) {
                return Err(GraphError::UnknownEndpoint {
                    source_id: link.source_id.clone(),
                    target_id: link.target_id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        self.data.links.push(link);
        Ok(())
    }

    /// Removes the node and every incident link. Returns the removed node,
    /// `None` when the id was absent.
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        if !self.ids.remove(id) {
            return None;
        }

        self.data.links.retain(|link| !link.touches(id));
        let index = self.data.nodes.iter().position(|node| node.id == id)?;
        Some(self.data.nodes.remove(index))
    }

    /// Removes the first link matching the triple. Returns whether one was removed.
    pub fn delete_link(&mut self, source_id: &str, target_id: &str, relation: &str) -> bool {
        let Some(index) = self.data.links.iter().position(|link| {
            link.source_id == source_id && link.target_id == target_id && link.relation == relation
        }) else {
            return false;
        };
        self.data.links.remove(index);
        true
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        let node = self
            .data
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_owned()))?;
        patch.apply(node);
        Ok(())
    }

    /// Records simulation state on a node. Returns `false` for unknown ids.
    pub fn set_layout(&mut self, id: &str, layout: NodeLayout) -> bool {
        match self.data.node_mut(id) {
            Some(node) => {
                node.layout = Some(layout);
                true
            }
            None => false,
        }
    }

    /// Attaches (`Some`) or detaches (`None`) a nested graph.
    pub fn set_sub_graph(&mut self, id: &str, sub_graph: Option<GraphData>) -> Result<(), GraphError> {
        let node = self
            .data
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_owned()))?;
        node.sub_graph = sub_graph;
        Ok(())
    }

    /// Clears the ghost flag on a node and on its incident ghost links.
    pub fn confirm_ghost(&mut self, id: &str) -> Result<(), GraphError> {
        let node = self
            .data
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_owned()))?;
        node.is_ghost = false;
        for link in self.data.links.iter_mut().filter(|link| link.touches(id)) {
            link.is_ghost = false;
        }
        Ok(())
    }

    /// Deletes every ghost node (with its links) and every remaining ghost
    /// link. Returns the number of removed nodes.
    pub fn discard_ghosts(&mut self) -> usize {
        let ghost_ids = self
            .data
            .nodes
            .iter()
            .filter(|node| node.is_ghost)
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        for id in &ghost_ids {
            self.delete_node(id);
        }
        self.data.links.retain(|link| !link.is_ghost);
        ghost_ids.len()
    }

    /// Drops links whose endpoints are unknown. Returns how many were removed.
    pub fn prune_dangling_links(&mut self) -> usize {
        let before = self.data.links.len();
        let ids = &self.ids;
        self.data
            .links
            .retain(|link| ids.contains(&link.source_id) && ids.contains(&link.target_id));
        let removed = before - self.data.links.len();
        if removed > 0 {
            debug!(removed, "pruned dangling links");
        }
        removed
    }

    /// Finds a node whose label matches case-insensitively.
    pub fn find_by_label(&self, label: &str) -> Option<&Node> {
        let needle = label.trim();
        self.data
            .nodes
            .iter()
            .find(|node| node.label.trim().eq_ignore_ascii_case(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    fn concept(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), NodeType::Concept)
    }

    #[test]
    fn add_node_rejects_duplicate_ids() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        let error = store.add_node(concept("a")).unwrap_err();
        assert_eq!(error, GraphError::DuplicateNode("a".into()));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn add_link_requires_both_endpoints() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();

        let error = store.add_link("a", "b", "enables").unwrap_err();
        assert!(matches!(error, GraphError::UnknownEndpoint { ref missing, .. } if missing == "b"));
        assert_eq!(store.link_count(), 0);
    }

    #[test]
    fn parallel_links_with_distinct_relations_are_kept() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        store.add_node(concept("b")).unwrap();
        store.add_link("a", "b", "enables").unwrap();
        store.add_link("a", "b", "contradicts").unwrap();
        store.add_link("a", "b", "enables").unwrap();
        assert_eq!(store.link_count(), 3);
    }

    #[test]
    fn delete_node_cascades_links_and_is_idempotent() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        store.add_node(concept("b")).unwrap();
        store.add_link("a", "b", "enables").unwrap();

        let removed = store.delete_node("a");
        assert_eq!(removed.map(|node| node.id), Some("a".to_owned()));
        assert_eq!(
            store.nodes().iter().map(|node| node.id.as_str()).collect::<Vec<_>>(),
            vec!["b"]
        );
        assert!(store.links().is_empty());

        assert!(store.delete_node("a").is_none());
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn update_node_merges_fields_and_reports_missing() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();

        store
            .update_node(
                "a",
                NodePatch {
                    description: Some("first letter".into()),
                    ..NodePatch::default()
                },
            )
            .unwrap();
        let node = store.node("a").unwrap();
        assert_eq!(node.label, "A");
        assert_eq!(node.description, "first letter");

        let before = store.snapshot();
        let error = store.update_node("zz", NodePatch::label("nope")).unwrap_err();
        assert_eq!(error, GraphError::UnknownNode("zz".into()));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn set_sub_graph_attaches_and_detaches() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        let nested = GraphData {
            nodes: vec![concept("x")],
            links: Vec::new(),
        };

        store.set_sub_graph("a", Some(nested.clone())).unwrap();
        assert_eq!(store.node("a").unwrap().sub_graph.as_ref(), Some(&nested));

        store.set_sub_graph("a", None).unwrap();
        assert!(store.node("a").unwrap().sub_graph.is_none());
        assert!(store.set_sub_graph("missing", None).is_err());
    }

    #[test]
    fn set_layout_only_touches_known_nodes() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        let layout = NodeLayout {
            x: 3.0,
            y: 4.0,
            fx: Some(3.0),
            fy: Some(4.0),
            ..NodeLayout::default()
        };

        assert!(store.set_layout("a", layout));
        assert_eq!(store.node("a").unwrap().layout, Some(layout));

        let before = store.snapshot();
        assert!(!store.set_layout("missing", layout));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn from_data_drops_duplicates_and_dangling_links() {
        let store = GraphStore::from_data(GraphData {
            nodes: vec![concept("a"), concept("a"), concept("b")],
            links: vec![Link::new("a", "b", "x"), Link::new("a", "c", "y")],
        });
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn ghosts_can_be_confirmed_or_discarded() {
        let mut store = GraphStore::new();
        store.add_node(concept("a")).unwrap();
        store.add_node(concept("g1").as_ghost()).unwrap();
        store.add_node(concept("g2").as_ghost()).unwrap();
        store.insert_link(Link::new("a", "g1", "suggests").as_ghost()).unwrap();
        store.insert_link(Link::new("a", "g2", "suggests").as_ghost()).unwrap();

        store.confirm_ghost("g1").unwrap();
        assert!(!store.node("g1").unwrap().is_ghost);

        assert_eq!(store.discard_ghosts(), 1);
        assert!(!store.contains("g2"));
        assert_eq!(store.link_count(), 1);
        assert!(!store.links()[0].is_ghost);
    }

    #[test]
    fn neighbors_are_unique_and_ordered() {
        let mut store = GraphStore::new();
        for id in ["a", "b", "c"] {
            store.add_node(concept(id)).unwrap();
        }
        store.add_link("a", "b", "x").unwrap();
        store.add_link("c", "a", "y").unwrap();
        store.add_link("a", "b", "z").unwrap();
        assert_eq!(store.neighbors("a"), vec!["b".to_owned(), "c".to_owned()]);
    }
}
