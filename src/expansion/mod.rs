//! Boundary to suggestion providers and the atomic application of their
//! output to the live store.

mod discovery;
mod template;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::graph::{GraphError, GraphStore, Link, LinkKind, Node, NodeType};
use crate::session::Workspace;
use crate::util::fresh_id;

pub use discovery::{Cancellable, CancellationToken, DiscoveryBatch, DiscoveryLoop, DiscoveryPoll};
pub use template::TemplateProvider;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("suggestion provider failed: {0}")]
    Provider(String),

    #[error("suggestions rejected: {0}")]
    Rejected(#[from] GraphError),

    #[error("cannot expand unknown node `{0}`")]
    UnknownNode(String),
}

/// One proposed node plus the relation linking it to the anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub label: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "relationLabel", default)]
    pub relation: String,
    #[serde(default)]
    pub link_kind: LinkKind,
}

impl Suggestion {
    pub fn new(label: impl Into<String>, node_type: NodeType, relation: impl Into<String>) -> Self {
        let link_kind = if node_type.is_lineage() {
            LinkKind::Lineage
        } else {
            LinkKind::Semantic
        };
        Self {
            label: label.into(),
            node_type,
            description: String::new(),
            relation: relation.into(),
            link_kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// What a provider sees of the node being expanded.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeContext {
    /// The anchor, without its nested graph.
    pub node: Node,
    /// `(relation, neighbor label)` for every incident link.
    pub neighbors: Vec<(String, String)>,
    /// Breadcrumb labels from the root to the live level.
    pub path: Vec<String>,
}

impl NodeContext {
    pub fn build(workspace: &Workspace, node_id: &str) -> Result<Self, ExpansionError> {
        let store = workspace.store();
        let mut node = store
            .node(node_id)
            .cloned()
            .ok_or_else(|| ExpansionError::UnknownNode(node_id.to_owned()))?;
        node.sub_graph = None;

        let neighbors = store
            .links_of(node_id)
            .filter_map(|link| {
                let other = if link.source_id == node_id {
                    &link.target_id
                } else {
                    &link.source_id
                };
                store
                    .node(other)
                    .map(|neighbor| (link.relation.clone(), neighbor.label.clone()))
            })
            .collect();
        let path = workspace
            .breadcrumbs()
            .into_iter()
            .map(|crumb| crumb.label)
            .collect();

        Ok(Self {
            node,
            neighbors,
            path,
        })
    }
}

/// Opaque source of suggestions. Called from worker threads.
pub trait ExpansionProvider: Send + Sync {
    fn expand(&self, context: &NodeContext) -> Result<Vec<Suggestion>, ExpansionError>;
}

impl<F> ExpansionProvider for F
where
    F: Fn(&NodeContext) -> Result<Vec<Suggestion>, ExpansionError> + Send + Sync,
{
    fn expand(&self, context: &NodeContext) -> Result<Vec<Suggestion>, ExpansionError> {
        self(context)
    }
}

pub type SharedProvider = Arc<dyn ExpansionProvider>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionOutcome {
    /// Ids of newly created nodes, in suggestion order.
    pub added: Vec<String>,
    /// Ids of existing nodes that a suggestion resolved to by label.
    pub linked_existing: Vec<String>,
}

impl ExpansionOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.linked_existing.is_empty()
    }
}

/// Adds every suggestion as a node linked from `anchor_id`, or nothing at all.
///
/// A suggestion whose label matches an existing node (case-insensitively)
/// links to that node instead of duplicating it. An empty suggestion list is a
/// successful no-op.
pub fn apply_suggestions(
    store: &mut GraphStore,
    anchor_id: &str,
    suggestions: &[Suggestion],
    ghost: bool,
) -> Result<ExpansionOutcome, ExpansionError> {
    if !store.contains(anchor_id) {
        return Err(ExpansionError::UnknownNode(anchor_id.to_owned()));
    }
    if let Some(blank) = suggestions.iter().position(|suggestion| suggestion.label.trim().is_empty()) {
        return Err(ExpansionError::Provider(format!(
            "suggestion {blank} has an empty label"
        )));
    }

    let mut staged = store.clone();
    let mut outcome = ExpansionOutcome::default();
    for suggestion in suggestions {
        let existing = staged
            .find_by_label(&suggestion.label)
            .map(|node| node.id.clone());
        let target_id = match existing {
            Some(id) if id == anchor_id => {
                debug!(label = %suggestion.label, "suggestion names the anchor itself; skipped");
                continue;
            }
            Some(id) => {
                outcome.linked_existing.push(id.clone());
                id
            }
            None => {
                let mut node = Node::new(fresh_id(), suggestion.label.trim(), suggestion.node_type)
                    .with_description(suggestion.description.clone());
                node.is_ghost = ghost;
                let id = node.id.clone();
                staged.add_node(node)?;
                outcome.added.push(id.clone());
                id
            }
        };

        let mut link = Link::new(anchor_id, target_id, suggestion.relation.clone())
            .with_kind(suggestion.link_kind);
        link.is_ghost = ghost;
        staged.insert_link(link)?;
    }

    *store = staged;
    info!(
        anchor = %anchor_id,
        added = outcome.added.len(),
        linked = outcome.linked_existing.len(),
        ghost,
        "applied suggestions"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GraphStore {
        let mut store = GraphStore::new();
        store.add_node(Node::new("a", "Photosynthesis", NodeType::Concept)).unwrap();
        store.add_node(Node::new("b", "Chlorophyll", NodeType::Entity)).unwrap();
        store
    }

    #[test]
    fn suggestions_become_linked_nodes() {
        let mut store = store();
        let outcome = apply_suggestions(
            &mut store,
            "a",
            &[
                Suggestion::new("Sunlight", NodeType::Entity, "requires"),
                Suggestion::new("Calvin cycle", NodeType::Event, "includes"),
            ],
            false,
        )
        .unwrap();

        assert_eq!(outcome.added.len(), 2);
        assert_eq!(store.node_count(), 4);
        assert_eq!(store.neighbors("a").len(), 2);
        assert!(store.links().iter().all(|link| link.source_id == "a"));
    }

    #[test]
    fn duplicate_label_links_existing_node() {
        let mut store = store();
        let outcome = apply_suggestions(
            &mut store,
            "a",
            &[Suggestion::new("chlorophyll", NodeType::Entity, "uses")],
            true,
        )
        .unwrap();

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.linked_existing, vec!["b".to_owned()]);
        assert_eq!(store.node_count(), 2);
        assert!(!store.node("b").unwrap().is_ghost);
        assert!(store.links()[0].is_ghost);
    }

    #[test]
    fn invalid_batch_changes_nothing() {
        let mut store = store();
        let before = store.snapshot();
        let error = apply_suggestions(
            &mut store,
            "a",
            &[
                Suggestion::new("Sunlight", NodeType::Entity, "requires"),
                Suggestion::new("  ", NodeType::Entity, "requires"),
            ],
            false,
        )
        .unwrap_err();

        assert!(matches!(error, ExpansionError::Provider(_)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn unknown_anchor_and_empty_batch() {
        let mut store = store();
        assert_eq!(
            apply_suggestions(&mut store, "zz", &[], false),
            Err(ExpansionError::UnknownNode("zz".into()))
        );
        assert!(apply_suggestions(&mut store, "a", &[], false).unwrap().is_empty());
    }

    #[test]
    fn trace_suggestions_use_lineage_links() {
        let suggestion = Suggestion::new("Source note", NodeType::Trace, "annotated by");
        assert_eq!(suggestion.link_kind, LinkKind::Lineage);

        let parsed: Suggestion = serde_json::from_str(
            r#"{"label":"Leaf","type":"entity","relationLabel":"occurs in"}"#,
        )
        .unwrap();
        assert_eq!(parsed.relation, "occurs in");
        assert_eq!(parsed.link_kind, LinkKind::Semantic);
    }

    #[test]
    fn context_lists_neighbors_and_path() {
        let mut workspace = Workspace::new(store().into_data());
        workspace.store_mut().add_link("a", "b", "uses").unwrap();
        let context = NodeContext::build(&workspace, "a").unwrap();

        assert_eq!(context.node.label, "Photosynthesis");
        assert_eq!(context.neighbors, vec![("uses".to_owned(), "Chlorophyll".to_owned())]);
        assert_eq!(context.path, vec!["Root".to_owned()]);
    }
}
