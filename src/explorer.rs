//! Single-threaded owner of the live workspace and everything derived from
//! it.
//!
//! Every structural change goes through here so the visible graph and the
//! physics engine are brought up to date in the same call that mutated the
//! store. Background expansion results are only applied from `poll_background`,
//! which the viewer calls between frames.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ExplorerConfig;
use crate::expansion::{
    DiscoveryLoop, ExpansionError, ExpansionProvider, NodeContext, apply_suggestions,
};
use crate::filter::{HiddenTypes, Selection, derive_visible};
use crate::graph::{GraphData, GraphError, GraphStore, Link, LinkKind, Node, NodeLayout, NodePatch, NodeType};
use crate::notify::{ToastKind, Toasts};
use crate::physics::{PhysicsConfig, PhysicsEngine};
use crate::session::{Breadcrumb, SeedFile, SeedFileError, Workspace};
use crate::util::fresh_id;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    pub x: f32,
    pub y: f32,
    pub is_root: bool,
    pub is_ghost: bool,
    pub selected: bool,
    pub has_sub_graph: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderLink {
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    pub kind: LinkKind,
    pub is_ghost: bool,
    pub source: (f32, f32),
    pub target: (f32, f32),
}

/// Read-only view of the visible graph with resolved coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSnapshot {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
}

impl RenderSnapshot {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JobKind {
    Expand,
    Discovery,
}

struct Job {
    kind: JobKind,
    worker: DiscoveryLoop,
    finished: bool,
}

pub struct Explorer {
    config: ExplorerConfig,
    workspace: Workspace,
    engine: PhysicsEngine,
    hidden: HiddenTypes,
    selection: Selection,
    toasts: Toasts,
    visible: GraphData,
    provider: Option<Arc<dyn ExpansionProvider>>,
    jobs: Vec<Job>,
    file_id: Option<String>,
    viewport: (f32, f32),
    now: f64,
}

impl Explorer {
    pub fn new(config: ExplorerConfig, workspace: Workspace) -> Self {
        let engine = PhysicsEngine::new(config.physics, config.viewport_width, config.viewport_height);
        let mut explorer = Self {
            config,
            workspace,
            engine,
            hidden: HiddenTypes::new(),
            selection: Selection::new(),
            toasts: Toasts::new(config.toast_ttl_secs()),
            visible: GraphData::default(),
            provider: None,
            jobs: Vec::new(),
            file_id: None,
            viewport: (config.viewport_width, config.viewport_height),
            now: 0.0,
        };
        explorer.refresh();
        explorer
    }

    pub fn with_root(config: ExplorerConfig, root: GraphData) -> Self {
        Self::new(config, Workspace::new(root))
    }

    pub fn from_seed_file(file: SeedFile, config: ExplorerConfig) -> Result<Self, SeedFileError> {
        let file_id = file.id.clone();
        let name = file.name.clone();
        let workspace = file.into_workspace()?;
        info!(%name, depth = workspace.depth(), "opened seed file");
        let mut explorer = Self::new(config, workspace);
        explorer.file_id = Some(file_id);
        Ok(explorer)
    }

    /// Writes engine state into the store, then captures the workspace.
    pub fn to_seed_file(&mut self, name: &str) -> SeedFile {
        self.sync_layout();
        let file = SeedFile::from_workspace(self.file_id.clone(), name, &self.workspace);
        self.file_id = Some(file.id.clone());
        file
    }

    pub fn set_provider(&mut self, provider: Arc<dyn ExpansionProvider>) {
        self.provider = Some(provider);
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn store(&self) -> &GraphStore {
        self.workspace.store()
    }

    pub fn engine(&self) -> &PhysicsEngine {
        &self.engine
    }

    pub fn visible(&self) -> &GraphData {
        &self.visible
    }

    pub fn hidden_types(&self) -> &HiddenTypes {
        &self.hidden
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.workspace.breadcrumbs()
    }

    /// Caller clock in seconds, used to timestamp and expire toasts.
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
        self.toasts.expire(now);
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toasts.push(kind, message, self.now);
    }

    pub fn dismiss_toast(&mut self, id: u64) {
        self.toasts.dismiss(id);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    fn report<T, E: Display>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if let Err(error) = &result {
            self.notify(ToastKind::Error, error.to_string());
        }
        result
    }

    /// Re-derives the visible graph and reseeds the engine.
    fn refresh(&mut self) {
        self.visible = derive_visible(self.workspace.store(), &self.hidden);
        self.selection.retain_existing(&self.visible);
        self.engine.reseed(&self.visible.nodes, &self.visible.links);
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        let result = self.workspace.store_mut().add_node(node);
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    /// Adds a node with a fresh id and returns the id.
    pub fn create_node(&mut self, label: &str, node_type: NodeType) -> Result<String, GraphError> {
        let node = Node::new(fresh_id(), label.trim(), node_type);
        let id = node.id.clone();
        self.add_node(node)?;
        Ok(id)
    }

    pub fn add_link(&mut self, source_id: &str, target_id: &str, relation: &str) -> Result<(), GraphError> {
        let result = self.workspace.store_mut().add_link(source_id, target_id, relation);
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    /// Links the first selected node to every other selected node.
    pub fn link_selection(&mut self, relation: &str) -> Result<usize, GraphError> {
        let ids = self.selection.ids().to_vec();
        let Some((source, targets)) = ids.split_first() else {
            return Ok(0);
        };

        let mut staged = self.workspace.store().clone();
        for target in targets {
            if let Err(error) = staged.add_link(source, target, relation) {
                return self.report(Err(error));
            }
        }
        *self.workspace.store_mut() = staged;
        self.refresh();
        Ok(targets.len())
    }

    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.workspace.store_mut().delete_node(id);
        if removed.is_some() {
            self.selection.remove(id);
            self.refresh();
        }
        removed
    }

    pub fn delete_selection(&mut self) -> usize {
        let mut removed = 0;
        for id in self.selection.ids().to_vec() {
            if self.workspace.store_mut().delete_node(&id).is_some() {
                removed += 1;
            }
        }
        self.selection.clear();
        if removed > 0 {
            self.refresh();
        }
        removed
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        let result = self.workspace.store_mut().update_node(id, patch);
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    pub fn set_sub_graph(&mut self, id: &str, sub_graph: Option<GraphData>) -> Result<(), GraphError> {
        let result = self.workspace.store_mut().set_sub_graph(id, sub_graph);
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    pub fn confirm_ghost(&mut self, id: &str) -> Result<(), GraphError> {
        let result = self.workspace.store_mut().confirm_ghost(id);
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    pub fn discard_ghosts(&mut self) -> usize {
        let removed = self.workspace.store_mut().discard_ghosts();
        self.refresh();
        removed
    }

    /// Returns whether `node_type` is now hidden. Bodies that drop out of the
    /// engine keep their state in the stored layout and resume from it.
    pub fn toggle_type_visibility(&mut self, node_type: NodeType) -> bool {
        self.sync_layout();
        let hidden = self.hidden.toggle(node_type);
        self.refresh();
        hidden
    }

    pub fn click_node(&mut self, id: &str, toggle_modifier: bool) {
        if !self.visible.contains(id) {
            return;
        }
        if toggle_modifier {
            self.selection.toggle(id);
        } else {
            self.selection.select_only(id);
        }
    }

    pub fn click_background(&mut self) {
        self.selection.clear();
    }

    pub fn enter_sub_graph(&mut self, id: &str) -> Result<(), GraphError> {
        self.sync_layout();
        let result = self.workspace.enter_sub_graph(id);
        if result.is_ok() {
            self.after_navigation();
        }
        self.report(result)
    }

    pub fn navigate_to(&mut self, target: usize) -> bool {
        self.sync_layout();
        let navigated = self.workspace.navigate_to(target);
        if navigated {
            self.after_navigation();
        }
        navigated
    }

    pub fn navigate_to_root(&mut self) -> bool {
        self.sync_layout();
        let navigated = self.workspace.navigate_to_root();
        if navigated {
            self.after_navigation();
        }
        navigated
    }

    fn after_navigation(&mut self) {
        self.cancel_jobs();
        self.selection.clear();
        // Ids shared between levels must not inherit the other level's body.
        self.engine.clear();
        self.refresh();
        self.reset_view();
    }

    pub fn pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.engine.pin(id, x, y)
    }

    pub fn drag_to(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.engine.drag_to(id, x, y)
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        self.engine.unpin(id)
    }

    /// Recenters the layout on the current viewport with full energy.
    pub fn reset_view(&mut self) {
        let (width, height) = self.viewport;
        self.engine.reset_view(width, height);
    }

    pub fn set_physics_config(&mut self, physics: PhysicsConfig) {
        self.config.physics = physics;
        self.engine.set_config(physics);
    }

    pub fn is_settled(&self) -> bool {
        self.engine.is_settled()
    }

    /// Advances the solver one step and returns the resulting view.
    pub fn tick(&mut self) -> RenderSnapshot {
        self.engine.step();
        self.render_snapshot()
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let fallback = self.engine.center();
        let position = |id: &str| {
            let point = self.engine.position(id).unwrap_or(fallback);
            (point.x, point.y)
        };

        let nodes = self
            .visible
            .nodes
            .iter()
            .map(|node| {
                let (x, y) = position(&node.id);
                RenderNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    node_type: node.node_type,
                    x,
                    y,
                    is_root: node.is_root,
                    is_ghost: node.is_ghost,
                    selected: self.selection.contains(&node.id),
                    has_sub_graph: node.has_sub_graph(),
                }
            })
            .collect();
        let links = self
            .visible
            .links
            .iter()
            .map(|link: &Link| RenderLink {
                source_id: link.source_id.clone(),
                target_id: link.target_id.clone(),
                relation: link.relation.clone(),
                kind: link.kind,
                is_ghost: link.is_ghost,
                source: position(&link.source_id),
                target: position(&link.target_id),
            })
            .collect();
        RenderSnapshot { nodes, links }
    }

    /// Copies engine positions, velocities and pins into the stored layouts.
    /// Nodes without a body keep whatever layout they had.
    pub fn sync_layout(&mut self) {
        let updates = self
            .workspace
            .store()
            .nodes()
            .iter()
            .filter_map(|node| {
                let body = self.engine.body(&node.id)?;
                Some((
                    node.id.clone(),
                    NodeLayout {
                        x: body.position.x,
                        y: body.position.y,
                        vx: body.velocity.x,
                        vy: body.velocity.y,
                        fx: body.pinned.map(|pin| pin.x),
                        fy: body.pinned.map(|pin| pin.y),
                    },
                ))
            })
            .collect::<Vec<_>>();

        let store = self.workspace.store_mut();
        for (id, layout) in updates {
            store.set_layout(&id, layout);
        }
    }

    /// Starts a one-shot provider call for `id`. Results are applied as
    /// confirmed nodes by `poll_background`.
    pub fn expand_node(&mut self, id: &str) -> Result<(), ExpansionError> {
        let result = self.spawn_job(JobKind::Expand, vec![id.to_owned()], 1, Duration::ZERO, false);
        self.report(result)
    }

    /// Starts periodic ghost suggestions for the selection, or for every
    /// visible confirmed node when nothing is selected. Replaces a running
    /// discovery.
    pub fn start_discovery(&mut self) -> Result<(), ExpansionError> {
        self.stop_discovery();
        let anchors = if self.selection.is_empty() {
            self.visible
                .nodes
                .iter()
                .filter(|node| !node.is_ghost && !node.node_type.is_lineage())
                .map(|node| node.id.clone())
                .collect()
        } else {
            self.selection.ids().to_vec()
        };
        let interval = Duration::from_millis(self.config.discovery_interval_ms);
        let rounds = self.config.discovery_rounds;
        let result = self.spawn_job(JobKind::Discovery, anchors, rounds, interval, true);
        self.report(result)
    }

    pub fn stop_discovery(&mut self) {
        for job in self.jobs.iter().filter(|job| job.kind == JobKind::Discovery) {
            job.worker.cancel();
        }
    }

    pub fn is_discovering(&self) -> bool {
        self.jobs
            .iter()
            .any(|job| job.kind == JobKind::Discovery && !job.worker.is_cancelled())
    }

    pub fn has_pending_work(&self) -> bool {
        !self.jobs.is_empty()
    }

    fn cancel_jobs(&mut self) {
        for job in &self.jobs {
            job.worker.cancel();
        }
    }

    fn spawn_job(
        &mut self,
        kind: JobKind,
        anchor_ids: Vec<String>,
        rounds: usize,
        interval: Duration,
        ghost: bool,
    ) -> Result<(), ExpansionError> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| ExpansionError::Provider("no suggestion provider configured".to_owned()))?;
        let anchors = anchor_ids
            .iter()
            .map(|id| NodeContext::build(&self.workspace, id))
            .collect::<Result<Vec<_>, _>>()?;
        if anchors.is_empty() {
            return Err(ExpansionError::Provider("nothing to expand".to_owned()));
        }

        let session_id = self.workspace.current_session_id().map(str::to_owned);
        debug!(?kind, anchors = anchors.len(), rounds, "starting expansion job");
        let worker = DiscoveryLoop::spawn(provider, anchors, session_id, rounds, interval, ghost);
        self.jobs.push(Job {
            kind,
            worker,
            finished: false,
        });
        Ok(())
    }

    /// Applies finished background rounds. Returns whether the store changed.
    pub fn poll_background(&mut self) -> bool {
        let live_session = self.workspace.current_session_id().map(str::to_owned);
        let mut changed = false;
        let mut jobs = std::mem::take(&mut self.jobs);

        for job in &mut jobs {
            let poll = job.worker.poll(live_session.as_deref());
            for batch in poll.batches {
                let outcome = batch.result.and_then(|suggestions| {
                    apply_suggestions(
                        self.workspace.store_mut(),
                        &batch.anchor_id,
                        &suggestions,
                        batch.ghost,
                    )
                });
                match outcome {
                    Ok(outcome) if outcome.is_empty() => {}
                    Ok(outcome) => {
                        changed = true;
                        if job.kind == JobKind::Expand {
                            self.notify(
                                ToastKind::Info,
                                format!("Added {} suggested nodes", outcome.added.len()),
                            );
                        }
                    }
                    Err(error) => self.notify(ToastKind::Error, error.to_string()),
                }
            }
            if poll.finished && job.kind == JobKind::Discovery && !job.worker.is_cancelled() {
                self.notify(ToastKind::Info, "Discovery finished");
            }
            job.finished = poll.finished;
        }

        jobs.retain(|job| !job.finished);
        self.jobs = jobs;
        if changed {
            self.refresh();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explorer() -> Explorer {
        let root = GraphData {
            nodes: vec![
                Node::new("a", "A", NodeType::Concept).as_root(),
                Node::new("b", "B", NodeType::Person),
            ],
            links: vec![Link::new("a", "b", "knows")],
        };
        Explorer::with_root(ExplorerConfig::default(), root)
    }

    #[test]
    fn mutations_reseed_the_engine() {
        let mut explorer = explorer();
        assert_eq!(explorer.engine().body_count(), 2);

        let id = explorer.create_node("C", NodeType::Event).unwrap();
        assert!(explorer.engine().contains(&id));
        explorer.add_link("a", &id, "caused").unwrap();
        assert_eq!(explorer.engine().link_count(), 2);

        explorer.delete_node("a");
        assert_eq!(explorer.engine().body_count(), 2);
        assert_eq!(explorer.engine().link_count(), 0);
    }

    #[test]
    fn validation_errors_raise_toasts_and_leave_store_alone() {
        let mut explorer = explorer();
        let before = explorer.store().snapshot();

        assert!(explorer.add_link("a", "missing", "x").is_err());
        assert!(explorer.update_node("missing", NodePatch::label("y")).is_err());
        assert_eq!(explorer.store().snapshot(), before);
        assert_eq!(explorer.toasts().active().len(), 2);
        assert!(explorer.toasts().active().iter().all(|toast| toast.kind == ToastKind::Error));
    }

    #[test]
    fn hiding_a_type_removes_bodies_and_selection() {
        let mut explorer = explorer();
        explorer.click_node("b", false);
        assert!(explorer.toggle_type_visibility(NodeType::Person));

        assert_eq!(explorer.engine().body_count(), 1);
        assert!(explorer.selection().is_empty());
        assert_eq!(explorer.store().node_count(), 2);
        assert!(explorer.render_snapshot().links.is_empty());
    }

    #[test]
    fn navigation_clears_selection_and_recenters() {
        let mut explorer = explorer();
        explorer.click_node("a", false);
        explorer.enter_sub_graph("a").unwrap();

        assert!(explorer.selection().is_empty());
        assert_eq!(explorer.workspace().depth(), 1);
        assert_eq!(explorer.engine().body_count(), 1);
        assert!((explorer.engine().alpha() - 1.0).abs() < 1e-6);

        assert!(!explorer.navigate_to(3));
        assert!(explorer.navigate_to_root());
        assert_eq!(explorer.engine().body_count(), 2);
    }

    fn settle(explorer: &mut Explorer) {
        for _ in 0..2_000 {
            if explorer.is_settled() {
                return;
            }
            explorer.tick();
        }
        panic!("layout never settled");
    }

    fn distance(explorer: &Explorer, a: &str, b: &str) -> f32 {
        let a = explorer.engine().position(a).unwrap();
        let b = explorer.engine().position(b).unwrap();
        (a - b).length()
    }

    #[test]
    fn returning_to_a_level_restores_its_layout() {
        let mut explorer = explorer();
        explorer.create_node("C", NodeType::Concept).unwrap();
        let c = explorer.store().find_by_label("C").unwrap().id.clone();
        explorer.add_link("a", &c, "relates").unwrap();
        settle(&mut explorer);
        let before = distance(&explorer, "a", "b");

        explorer.enter_sub_graph("a").unwrap();
        assert!(explorer.pin("a", 5_000.0, 5_000.0));
        explorer.unpin("a");
        assert!(explorer.navigate_to_root());

        let after = distance(&explorer, "a", "b");
        assert!((after - before).abs() < 1e-2, "before={before} after={after}");
        assert!(explorer.engine().body("a").unwrap().pinned.is_none());
    }

    #[test]
    fn entered_level_ignores_bodies_of_the_parent() {
        let mut explorer = explorer();
        explorer.pin("a", 900.0, 700.0);
        explorer.enter_sub_graph("a").unwrap();

        let seed = explorer.engine().body("a").unwrap();
        assert_eq!(seed.pinned, None);
        let (width, height) = (explorer.config().viewport_width, explorer.config().viewport_height);
        assert!((seed.position - eframe::egui::vec2(width * 0.5, height * 0.5)).length() < 1e-3);
    }

    #[test]
    fn hiding_and_showing_a_type_keeps_body_state() {
        let mut explorer = explorer();
        for _ in 0..50 {
            explorer.tick();
        }
        explorer.pin("b", 300.0, 200.0);
        let before = explorer.engine().body("b").unwrap();

        assert!(explorer.toggle_type_visibility(NodeType::Person));
        assert!(!explorer.engine().contains("b"));
        assert!(!explorer.toggle_type_visibility(NodeType::Person));

        assert_eq!(explorer.engine().body("b").unwrap(), before);
    }

    #[test]
    fn attaching_a_sub_graph_updates_the_view() {
        let mut explorer = explorer();
        assert!(!explorer.render_snapshot().node("b").unwrap().has_sub_graph);

        let nested = GraphData {
            nodes: vec![Node::new("x", "X", NodeType::Concept)],
            links: Vec::new(),
        };
        explorer.set_sub_graph("b", Some(nested)).unwrap();
        assert!(explorer.render_snapshot().node("b").unwrap().has_sub_graph);
    }

    #[test]
    fn click_semantics_follow_selection_rules() {
        let mut explorer = explorer();
        explorer.click_node("a", false);
        explorer.click_node("b", true);
        assert_eq!(explorer.selection().ids(), ["a", "b"]);
        explorer.click_node("a", false);
        assert_eq!(explorer.selection().ids(), ["a"]);
        explorer.click_node("ghost", false);
        assert_eq!(explorer.selection().ids(), ["a"]);
        explorer.click_background();
        assert!(explorer.selection().is_empty());
    }

    #[test]
    fn link_selection_is_all_or_nothing() {
        let mut explorer = explorer();
        explorer.create_node("C", NodeType::Concept).unwrap();
        let c = explorer.store().find_by_label("C").unwrap().id.clone();
        explorer.click_node("a", false);
        explorer.click_node(&c, true);

        assert_eq!(explorer.link_selection("relates"), Ok(1));
        assert_eq!(explorer.store().link_count(), 2);
    }

    #[test]
    fn snapshot_resolves_link_endpoints() {
        let mut explorer = explorer();
        explorer.click_node("a", false);
        let snapshot = explorer.tick();

        let a = snapshot.node("a").unwrap();
        let b = snapshot.node("b").unwrap();
        assert!(a.selected && a.is_root);
        assert!(!b.selected);
        assert_eq!(snapshot.links[0].source, (a.x, a.y));
        assert_eq!(snapshot.links[0].target, (b.x, b.y));
    }

    #[test]
    fn sync_layout_records_engine_state() {
        let mut explorer = explorer();
        explorer.pin("a", 10.0, 20.0);
        explorer.sync_layout();

        let layout = explorer.store().node("a").unwrap().layout.unwrap();
        assert_eq!((layout.x, layout.y), (10.0, 20.0));
        assert_eq!((layout.fx, layout.fy), (Some(10.0), Some(20.0)));
        assert!(explorer.store().node("b").unwrap().layout.is_some());
    }

    #[test]
    fn expansion_without_provider_reports_error() {
        let mut explorer = explorer();
        assert!(explorer.expand_node("a").is_err());
        assert_eq!(explorer.toasts().active().len(), 1);
        assert!(!explorer.has_pending_work());
    }
}
