//! Nested viewing levels.
//!
//! Entering a node pushes a deep copy of the current level onto the stack and
//! makes the node's sub-graph live. Navigating up folds the live data back
//! into every snapshot between the top of the stack and the target, deepest
//! first, so edits made at any depth survive in each ancestor's copy.

mod file;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::{GraphData, GraphError, GraphStore};
use crate::util::fresh_id;

pub use file::{SeedFile, SeedFileError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub label: String,
    pub data: GraphData,
    /// Node in `data` whose sub-graph is the next deeper level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_node_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RollUp {
    pub stack: Vec<SessionSnapshot>,
    pub live: GraphData,
}

/// Folds `live` into the snapshots from the top of `stack` down to `target`
/// (inclusive) and returns the truncated stack `[0..target)` together with
/// the updated data of `target`. Returns `None` when `target` is out of range.
///
/// A snapshot whose trigger node is missing cannot receive its child level;
/// that level is skipped with a warning and folding continues upward.
pub fn roll_up(stack: &[SessionSnapshot], live: GraphData, target: usize) -> Option<RollUp> {
    if target >= stack.len() {
        return None;
    }

    let mut carried = live;
    let mut tail = stack[target..].to_vec();
    for snapshot in tail.iter_mut().rev() {
        let SessionSnapshot {
            id,
            data,
            trigger_node_id,
            ..
        } = snapshot;

        match trigger_node_id.as_deref().and_then(|trigger| data.node_mut(trigger)) {
            Some(trigger) => trigger.sub_graph = Some(carried),
            None => warn!(
                snapshot = %id,
                trigger = ?trigger_node_id,
                "trigger node missing during roll-up; nested level not stored"
            ),
        }
        carried = data.clone();
    }

    Some(RollUp {
        stack: stack[..target].to_vec(),
        live: carried,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    /// Stack index to pass to `navigate_to`; `None` for the live level.
    pub target: Option<usize>,
}

/// Live graph store plus the stack of ancestor levels.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    store: GraphStore,
    stack: Vec<SessionSnapshot>,
}

impl Workspace {
    pub const ROOT_LABEL: &'static str = "Root";

    pub fn new(root: GraphData) -> Self {
        Self {
            store: GraphStore::from_data(root),
            stack: Vec::new(),
        }
    }

    pub fn from_parts(live: GraphData, stack: Vec<SessionSnapshot>) -> Self {
        Self {
            store: GraphStore::from_data(live),
            stack,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn stack(&self) -> &[SessionSnapshot] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// Id of the deepest snapshot, identifying the live level.
    pub fn current_session_id(&self) -> Option<&str> {
        self.stack.last().map(|snapshot| snapshot.id.as_str())
    }

    pub fn current_label(&self) -> &str {
        self.stack
            .last()
            .map(|snapshot| snapshot.label.as_str())
            .unwrap_or(Self::ROOT_LABEL)
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::with_capacity(self.stack.len() + 1);
        crumbs.push(Breadcrumb {
            label: Self::ROOT_LABEL.to_owned(),
            target: Some(0),
        });
        for (index, snapshot) in self.stack.iter().enumerate() {
            crumbs.push(Breadcrumb {
                label: snapshot.label.clone(),
                target: Some(index + 1),
            });
        }
        if let Some(last) = crumbs.last_mut() {
            last.target = None;
        }
        crumbs
    }

    /// Pushes the current level and makes `node_id`'s nested graph live: the
    /// stored sub-graph when it has nodes, otherwise a fresh graph seeded with
    /// a copy of the node (without its own sub-graph).
    pub fn enter_sub_graph(&mut self, node_id: &str) -> Result<(), GraphError> {
        let node = self
            .store
            .node(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_owned()))?;

        let next = match &node.sub_graph {
            Some(sub_graph) if !sub_graph.nodes.is_empty() => sub_graph.clone(),
            _ => {
                let mut seed = node.clone();
                seed.sub_graph = None;
                seed.layout = None;
                seed.is_root = true;
                GraphData {
                    nodes: vec![seed],
                    links: Vec::new(),
                }
            }
        };

        let snapshot = SessionSnapshot {
            id: fresh_id(),
            label: node.label.clone(),
            data: self.store.snapshot(),
            trigger_node_id: Some(node.id.clone()),
        };
        info!(
            session = %snapshot.id,
            node = %node_id,
            depth = self.stack.len() + 1,
            "entering nested session"
        );
        self.stack.push(snapshot);
        self.store.replace(next);
        Ok(())
    }

    /// Rolls the live level up into stack index `target` and makes it live.
    /// Out-of-range targets leave everything untouched and return `false`.
    pub fn navigate_to(&mut self, target: usize) -> bool {
        let live = self.store.snapshot();
        let Some(RollUp { stack, live }) = roll_up(&self.stack, live, target) else {
            warn!(target, depth = self.stack.len(), "navigation target out of range");
            return false;
        };

        debug!(from = self.stack.len(), to = target, "navigated up");
        self.stack = stack;
        self.store.replace(live);
        true
    }

    pub fn navigate_to_root(&mut self) -> bool {
        if self.stack.is_empty() {
            return false;
        }
        self.navigate_to(0)
    }

    /// Root data with every open level folded in, without changing the
    /// workspace.
    pub fn rolled_up_root(&self) -> GraphData {
        let live = self.store.snapshot();
        match roll_up(&self.stack, live.clone(), 0) {
            Some(rolled) => rolled.live,
            None => live,
        }
    }
}
