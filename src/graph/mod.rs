//! Node/link model shared by every viewing level.
//!
//! A `GraphData` is a self-contained collection: link endpoints refer to node
//! ids in the same collection, and a node's `sub_graph` is a fully separate
//! `GraphData` that never aliases its parent.

mod store;

use serde::{Deserialize, Serialize};

pub use store::{GraphError, GraphStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Concept,
    Entity,
    Event,
    Person,
    Place,
    Question,
    Source,
    /// Lineage/annotation node attached to a subject.
    Trace,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        Self::Concept,
        Self::Entity,
        Self::Event,
        Self::Person,
        Self::Place,
        Self::Question,
        Self::Source,
        Self::Trace,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Entity => "entity",
            Self::Event => "event",
            Self::Person => "person",
            Self::Place => "place",
            Self::Question => "question",
            Self::Source => "source",
            Self::Trace => "trace",
        }
    }

    pub fn is_lineage(self) -> bool {
        matches!(self, Self::Trace)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    #[default]
    Semantic,
    Lineage,
}

/// Persisted physical state of a node. Written back from the engine before
/// saving, switching levels or hiding a type; never per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub is_ghost: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<NodeLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_graph: Option<GraphData>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            description: String::new(),
            is_root: false,
            is_ghost: false,
            layout: None,
            sub_graph: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn as_root(mut self) -> Self {
        self.is_root = true;
        self
    }

    pub fn as_ghost(mut self) -> Self {
        self.is_ghost = true;
        self
    }

    pub fn with_layout(mut self, x: f32, y: f32) -> Self {
        self.layout = Some(NodeLayout {
            x,
            y,
            ..NodeLayout::default()
        });
        self
    }

    pub fn has_sub_graph(&self) -> bool {
        self.sub_graph
            .as_ref()
            .is_some_and(|sub_graph| !sub_graph.nodes.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub kind: LinkKind,
    #[serde(default)]
    pub is_ghost: bool,
}

impl Link {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation: relation.into(),
            kind: LinkKind::Semantic,
            is_ghost: false,
        }
    }

    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn as_ghost(mut self) -> Self {
        self.is_ghost = true;
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Links whose source or target is not a node of this collection.
    pub fn orphan_links(&self) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| !self.contains(&link.source_id) || !self.contains(&link.target_id))
            .collect()
    }

    /// Checks this collection and every nested sub-graph for orphan links.
    pub fn is_consistent(&self) -> bool {
        self.orphan_links().is_empty()
            && self
                .nodes
                .iter()
                .filter_map(|node| node.sub_graph.as_ref())
                .all(GraphData::is_consistent)
    }

    /// Nesting depth below this level (0 when no node carries a sub-graph).
    pub fn nesting_depth(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| node.sub_graph.as_ref())
            .map(|sub_graph| 1 + sub_graph.nesting_depth())
            .max()
            .unwrap_or(0)
    }
}

/// Shallow field update for `GraphStore::update_node`. `id` and `sub_graph`
/// are not patchable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub node_type: Option<NodeType>,
    pub description: Option<String>,
    pub is_ghost: Option<bool>,
    pub layout: Option<NodeLayout>,
}

impl NodePatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    fn apply(self, node: &mut Node) {
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(description) = self.description {
            node.description = description;
        }
        if let Some(is_ghost) = self.is_ghost {
            node.is_ghost = is_ghost;
        }
        if let Some(layout) = self.layout {
            node.layout = Some(layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_serializes_with_camel_case_wire_names() {
        let mut node = Node::new("a", "Alpha", NodeType::Event).as_root();
        node.sub_graph = Some(GraphData {
            nodes: vec![Node::new("a", "Alpha", NodeType::Event)],
            links: Vec::new(),
        });

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["isRoot"], true);
        assert_eq!(value["isGhost"], false);
        assert!(value["subGraph"]["nodes"].is_array());
        assert!(value.get("layout").is_none());
    }

    #[test]
    fn link_defaults_fill_missing_fields() {
        let link: Link = serde_json::from_str(r#"{"sourceId":"a","targetId":"b"}"#).unwrap();
        assert_eq!(link.kind, LinkKind::Semantic);
        assert_eq!(link.relation, "");
        assert!(!link.is_ghost);
    }

    #[test]
    fn consistency_checks_nested_levels() {
        let mut data = GraphData {
            nodes: vec![Node::new("a", "A", NodeType::Concept)],
            links: Vec::new(),
        };
        assert!(data.is_consistent());

        data.nodes[0].sub_graph = Some(GraphData {
            nodes: vec![Node::new("x", "X", NodeType::Concept)],
            links: vec![Link::new("x", "ghost", "points at nothing")],
        });
        assert!(data.orphan_links().is_empty());
        assert!(!data.is_consistent());
        assert_eq!(data.nesting_depth(), 1);
    }

    #[test]
    fn empty_sub_graph_does_not_count_as_nested() {
        let mut node = Node::new("a", "A", NodeType::Concept);
        assert!(!node.has_sub_graph());
        node.sub_graph = Some(GraphData::default());
        assert!(!node.has_sub_graph());
    }
}
