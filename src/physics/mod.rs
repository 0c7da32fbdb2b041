//! Force-directed layout for the visible graph.
//!
//! The engine owns a position/velocity table keyed by node id. It never
//! touches the store's node records; callers read positions back through
//! `tick`/`positions`. Energy is modelled by `alpha`, which decays toward
//! `alpha_target` each step. Once it falls below `alpha_min` the engine is
//! settled and `tick` stops integrating until something reheats it.

mod forces;
mod quadtree;

use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::graph::{Link, LinkKind, Node, NodeLayout, NodeType};
use crate::util::stable_pair;

use forces::{Collision, Repulsion, separation_direction};
use quadtree::QuadCell;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub semantic_link_distance: f32,
    pub lineage_link_distance: f32,
    pub link_strength: f32,
    pub repulsion_strength: f32,
    pub repulsion_softening: f32,
    pub barnes_hut_theta: f32,
    /// Below this many bodies repulsion is computed pairwise.
    pub barnes_hut_threshold: usize,
    pub center_strength: f32,
    pub collision_radius: f32,
    pub lineage_collision_radius: f32,
    pub collision_strength: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub reheat_alpha: f32,
    pub drag_alpha_target: f32,
    pub velocity_decay: f32,
    pub max_speed: f32,
    /// Spread of the jitter ring used to place nodes with no placed neighbor.
    pub spawn_radius: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            semantic_link_distance: 120.0,
            lineage_link_distance: 45.0,
            link_strength: 1.0,
            repulsion_strength: 24_000.0,
            repulsion_softening: 400.0,
            barnes_hut_theta: 0.9,
            barnes_hut_threshold: 64,
            center_strength: 0.02,
            collision_radius: 28.0,
            lineage_collision_radius: 12.0,
            collision_strength: 0.7,
            alpha_min: 0.001,
            // Reaches alpha_min from 1.0 in ~300 steps.
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            reheat_alpha: 0.3,
            drag_alpha_target: 0.3,
            velocity_decay: 0.4,
            max_speed: 40.0,
            spawn_radius: 160.0,
        }
    }
}

impl PhysicsConfig {
    fn link_distance(&self, kind: LinkKind) -> f32 {
        match kind {
            LinkKind::Semantic => self.semantic_link_distance,
            LinkKind::Lineage => self.lineage_link_distance,
        }
    }

    fn collision_radius(&self, node_type: NodeType) -> f32 {
        if node_type.is_lineage() {
            self.lineage_collision_radius
        } else {
            self.collision_radius
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodePosition {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

/// Physical state of one body, as exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReseedReport {
    pub added: usize,
    pub removed: usize,
    pub retained: usize,
    pub dropped_links: usize,
}

impl ReseedReport {
    pub fn changed_nodes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

#[derive(Clone, Debug)]
struct Body {
    id: String,
    position: Vec2,
    velocity: Vec2,
    pinned: Option<Vec2>,
    dragged: bool,
    node_type: NodeType,
    radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Spring {
    source: usize,
    target: usize,
    kind: LinkKind,
    distance: f32,
    strength: f32,
    bias: f32,
}

#[derive(Default)]
struct Scratch {
    points: Vec<Vec2>,
    radii: Vec<f32>,
    forces: Vec<Vec2>,
}

pub struct PhysicsEngine {
    config: PhysicsConfig,
    bodies: Vec<Body>,
    index_by_id: HashMap<String, usize>,
    springs: Vec<Spring>,
    link_signature: Vec<(String, String, LinkKind)>,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    scratch: Scratch,
}

impl PhysicsEngine {
    pub fn new(config: PhysicsConfig, width: f32, height: f32) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            index_by_id: HashMap::new(),
            springs: Vec::new(),
            link_signature: Vec::new(),
            center: vec2(width * 0.5, height * 0.5),
            alpha: 1.0,
            alpha_target: 0.0,
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
        for body in &mut self.bodies {
            body.radius = config.collision_radius(body.node_type);
        }
        for spring in &mut self.springs {
            spring.distance = config.link_distance(spring.kind);
        }
        self.reheat(config.reheat_alpha);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn link_count(&self) -> usize {
        self.springs.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    /// Raises alpha to at least `alpha`.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub fn body(&self, id: &str) -> Option<BodyState> {
        let body = &self.bodies[*self.index_by_id.get(id)?];
        Some(BodyState {
            position: body.position,
            velocity: body.velocity,
            pinned: body.pinned,
        })
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.bodies
            .iter()
            .map(|body| NodePosition {
                id: body.id.clone(),
                x: body.position.x,
                y: body.position.y,
            })
            .collect()
    }

    /// Replaces the working node/link set. Bodies whose id survives keep their
    /// position, velocity and pin; new bodies start next to an already placed
    /// neighbor (or on a jitter ring around the center) with zero velocity.
    pub fn reseed(&mut self, nodes: &[Node], links: &[Link]) -> ReseedReport {
        let mut report = ReseedReport::default();
        let mut prior = std::mem::take(&mut self.bodies)
            .into_iter()
            .map(|body| (body.id.clone(), body))
            .collect::<HashMap<_, _>>();

        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut bodies = Vec::with_capacity(nodes.len());
        let mut fresh = Vec::new();
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                warn!(node = %node.id, "duplicate node id passed to physics engine");
                continue;
            }
            let radius = self.config.collision_radius(node.node_type);
            index_by_id.insert(node.id.clone(), bodies.len());
            match prior.remove(&node.id) {
                Some(mut body) => {
                    body.node_type = node.node_type;
                    body.radius = radius;
                    bodies.push(body);
                    report.retained += 1;
                }
                None => {
                    fresh.push((bodies.len(), node.layout));
                    bodies.push(Body {
                        id: node.id.clone(),
                        position: self.center,
                        velocity: Vec2::ZERO,
                        pinned: None,
                        dragged: false,
                        node_type: node.node_type,
                        radius,
                    });
                    report.added += 1;
                }
            }
        }
        report.removed = prior.len();

        let mut springs = Vec::with_capacity(links.len());
        let mut signature = Vec::with_capacity(links.len());
        let mut degree = vec![0usize; bodies.len()];
        for link in links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&link.source_id),
                index_by_id.get(&link.target_id),
            ) else {
                warn!(
                    source = %link.source_id,
                    target = %link.target_id,
                    "dropping link with unknown endpoint"
                );
                report.dropped_links += 1;
                continue;
            };
            signature.push((link.source_id.clone(), link.target_id.clone(), link.kind));
            if source == target {
                continue;
            }
            degree[source] += 1;
            degree[target] += 1;
            springs.push(Spring {
                source,
                target,
                kind: link.kind,
                distance: self.config.link_distance(link.kind),
                strength: 0.0,
                bias: 0.5,
            });
        }
        for spring in &mut springs {
            let (source_degree, target_degree) = (degree[spring.source], degree[spring.target]);
            spring.strength =
                self.config.link_strength / source_degree.min(target_degree).max(1) as f32;
            spring.bias = source_degree as f32 / (source_degree + target_degree) as f32;
        }

        self.place_fresh_bodies(&mut bodies, &fresh, &springs);

        let links_changed = signature != self.link_signature;
        self.bodies = bodies;
        self.index_by_id = index_by_id;
        self.springs = springs;
        self.link_signature = signature;
        if self.bodies.iter().all(|body| !body.dragged) {
            self.alpha_target = 0.0;
        }

        if report.changed_nodes() || links_changed {
            self.reheat(self.config.reheat_alpha);
        }
        debug!(
            added = report.added,
            removed = report.removed,
            retained = report.retained,
            dropped_links = report.dropped_links,
            "physics reseeded"
        );
        report
    }

    fn place_fresh_bodies(
        &self,
        bodies: &mut [Body],
        fresh: &[(usize, Option<NodeLayout>)],
        springs: &[Spring],
    ) {
        let fresh_indices = fresh.iter().map(|(index, _)| *index).collect::<HashSet<_>>();
        let mut placed = (0..bodies.len())
            .map(|index| !fresh_indices.contains(&index))
            .collect::<Vec<_>>();

        for &(index, layout) in fresh {
            if let Some(layout) = layout {
                let body = &mut bodies[index];
                body.position = vec2(layout.x, layout.y);
                body.velocity = vec2(layout.vx, layout.vy);
                if let (Some(fx), Some(fy)) = (layout.fx, layout.fy) {
                    body.pinned = Some(vec2(fx, fy));
                    body.position = vec2(fx, fy);
                }
                placed[index] = true;
            }
        }

        for &(index, layout) in fresh {
            if layout.is_some() {
                continue;
            }

            let (jx, jy) = stable_pair(&bodies[index].id);
            let mut direction = vec2(jx, jy);
            if direction.length_sq() <= 0.0001 {
                direction = separation_direction(index, bodies.len());
            } else {
                direction = direction.normalized();
            }

            let anchor = springs.iter().find_map(|spring| {
                let other = if spring.source == index {
                    spring.target
                } else if spring.target == index {
                    spring.source
                } else {
                    return None;
                };
                placed[other].then(|| (bodies[other].position, spring.distance))
            });

            bodies[index].position = match anchor {
                Some((anchor, distance)) => anchor + direction * distance * 0.5,
                None => self.center + direction * self.config.spawn_radius * jx.abs().max(0.25),
            };
            placed[index] = true;
        }
    }

    /// Drops every body and spring. The next `reseed` treats all nodes as new,
    /// so they start from their stored layouts.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.index_by_id.clear();
        self.springs.clear();
        self.link_signature.clear();
        self.alpha_target = 0.0;
    }

    /// Fixes a node at `(x, y)` for the duration of a drag.
    pub fn pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let body = &mut self.bodies[index];
        body.pinned = Some(vec2(x, y));
        body.position = vec2(x, y);
        body.velocity = Vec2::ZERO;
        body.dragged = true;
        self.alpha_target = self.config.drag_alpha_target;
        self.reheat(self.config.drag_alpha_target);
        true
    }

    /// Moves an existing pin; no-op for unpinned nodes.
    pub fn drag_to(&mut self, id: &str, x: f32, y: f32) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let body = &mut self.bodies[index];
        if body.pinned.is_none() {
            return false;
        }
        body.pinned = Some(vec2(x, y));
        body.position = vec2(x, y);
        true
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let body = &mut self.bodies[index];
        let was_pinned = body.pinned.take().is_some();
        body.dragged = false;
        if self.bodies.iter().all(|body| !body.dragged) {
            self.alpha_target = 0.0;
        }
        was_pinned
    }

    /// Recenters on a new viewport and restarts with full energy. Bodies are
    /// translated so their centroid sits on the new center.
    pub fn reset_view(&mut self, width: f32, height: f32) {
        self.center = vec2(width * 0.5, height * 0.5);
        if !self.bodies.is_empty() {
            let centroid = self
                .bodies
                .iter()
                .fold(Vec2::ZERO, |sum, body| sum + body.position)
                / self.bodies.len() as f32;
            let shift = self.center - centroid;
            for body in &mut self.bodies {
                body.position += shift;
                body.velocity = Vec2::ZERO;
                if let Some(pin) = body.pinned.as_mut() {
                    *pin += shift;
                }
            }
        }
        self.alpha = 1.0;
    }

    /// Advances one step (unless settled) and returns every body's position.
    pub fn tick(&mut self) -> Vec<NodePosition> {
        self.step();
        self.positions()
    }

    /// Advances one step. Returns whether a step was taken.
    pub fn step(&mut self) -> bool {
        if self.is_settled() || self.bodies.is_empty() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;
        let config = self.config;

        self.apply_springs(alpha);
        self.apply_repulsion(alpha);
        for body in &mut self.bodies {
            body.velocity += (self.center - body.position) * config.center_strength * alpha;
        }
        self.apply_collisions();

        let max_speed_sq = config.max_speed * config.max_speed;
        for body in &mut self.bodies {
            if let Some(pin) = body.pinned {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            body.velocity *= 1.0 - config.velocity_decay;
            let speed_sq = body.velocity.length_sq();
            if speed_sq > max_speed_sq {
                body.velocity *= config.max_speed / speed_sq.sqrt();
            }
            if !body.velocity.x.is_finite() || !body.velocity.y.is_finite() {
                body.velocity = Vec2::ZERO;
            }
            body.position += body.velocity;
        }
        true
    }

    fn apply_springs(&mut self, alpha: f32) {
        for spring in &self.springs {
            let source = &self.bodies[spring.source];
            let target = &self.bodies[spring.target];
            let mut delta =
                (target.position + target.velocity) - (source.position + source.velocity);
            let mut distance = delta.length();
            if distance <= 0.0001 {
                delta = separation_direction(spring.source, spring.target) * 0.01;
                distance = 0.01;
            }

            let pull = (distance - spring.distance) / distance * alpha * spring.strength;
            let correction = delta * pull;
            self.bodies[spring.target].velocity -= correction * spring.bias;
            self.bodies[spring.source].velocity += correction * (1.0 - spring.bias);
        }
    }

    fn apply_repulsion(&mut self, alpha: f32) {
        let count = self.bodies.len();
        if count < 2 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.points.clear();
        scratch.points.extend(self.bodies.iter().map(|body| body.position));
        scratch.forces.clear();
        scratch.forces.resize(count, Vec2::ZERO);

        let repulsion = Repulsion {
            strength: self.config.repulsion_strength,
            softening: self.config.repulsion_softening,
            theta: self.config.barnes_hut_theta,
        };
        if count < self.config.barnes_hut_threshold {
            repulsion.accumulate_pairwise(&scratch.points, &mut scratch.forces);
        } else if let Some(tree) = QuadCell::build(&scratch.points) {
            for (index, force) in scratch.forces.iter_mut().enumerate() {
                repulsion.accumulate_for(&tree, index, &scratch.points, force);
            }
        }

        for (body, force) in self.bodies.iter_mut().zip(&scratch.forces) {
            body.velocity += *force * alpha;
        }
    }

    fn apply_collisions(&mut self) {
        let count = self.bodies.len();
        if count < 2 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.points.clear();
        scratch
            .points
            .extend(self.bodies.iter().map(|body| body.position + body.velocity));
        scratch.radii.clear();
        scratch.radii.extend(self.bodies.iter().map(|body| body.radius));
        scratch.forces.clear();
        scratch.forces.resize(count, Vec2::ZERO);

        let reach = scratch.radii.iter().copied().fold(0.0_f32, f32::max) * 2.0;
        if reach <= 0.0 {
            return;
        }
        let Some(tree) = QuadCell::build(&scratch.points) else {
            return;
        };
        Collision {
            strength: self.config.collision_strength,
            reach_sq: reach * reach,
        }
        .accumulate(
            &tree,
            &tree,
            true,
            &scratch.points,
            &scratch.radii,
            &mut scratch.forces,
        );

        for (body, push) in self.bodies.iter_mut().zip(&scratch.forces) {
            body.velocity += *push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, id, NodeType::Concept)
    }

    fn engine() -> PhysicsEngine {
        PhysicsEngine::new(PhysicsConfig::default(), 800.0, 600.0)
    }

    fn run_until_settled(engine: &mut PhysicsEngine) -> usize {
        let mut steps = 0;
        while engine.step() {
            steps += 1;
            assert!(steps < 5_000, "engine never settled");
        }
        steps
    }

    #[test]
    fn default_decay_settles_in_about_three_hundred_steps() {
        let mut engine = engine();
        engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        let steps = run_until_settled(&mut engine);
        assert!((280..=320).contains(&steps), "settled after {steps} steps");
        assert!(engine.is_settled());

        let before = engine.positions();
        assert_eq!(engine.tick(), before);
    }

    #[test]
    fn retained_bodies_keep_state_across_reseed() {
        let mut engine = engine();
        engine.reseed(&[node("a")], &[]);
        for _ in 0..10 {
            engine.tick();
        }
        let before = engine.body("a").unwrap();

        let report = engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        assert_eq!(
            report,
            ReseedReport {
                added: 1,
                removed: 0,
                retained: 1,
                dropped_links: 0,
            }
        );
        assert_eq!(engine.body("a").unwrap(), before);
        assert_eq!(engine.body("b").unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn new_body_spawns_next_to_linked_neighbor() {
        let mut engine = engine();
        engine.reseed(&[node("a").with_layout(5.0, 5.0)], &[]);
        assert_eq!(engine.position("a"), Some(vec2(5.0, 5.0)));

        engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        assert_eq!(engine.position("a"), Some(vec2(5.0, 5.0)));
        let b = engine.position("b").unwrap();
        let expected = PhysicsConfig::default().semantic_link_distance * 0.5;
        assert!(((b - vec2(5.0, 5.0)).length() - expected).abs() < 1e-3);
    }

    #[test]
    fn cleared_engine_restarts_from_stored_layouts() {
        let mut engine = engine();
        engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        engine.pin("a", 900.0, 900.0);

        engine.clear();
        assert_eq!(engine.body_count(), 0);
        assert_eq!(engine.link_count(), 0);

        let report = engine.reseed(&[node("a").with_layout(5.0, 5.0)], &[]);
        assert_eq!(report.added, 1);
        assert_eq!(report.retained, 0);
        let body = engine.body("a").unwrap();
        assert_eq!(body.position, vec2(5.0, 5.0));
        assert_eq!(body.pinned, None);
    }

    #[test]
    fn removed_bodies_are_dropped_and_reported() {
        let mut engine = engine();
        engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        let report = engine.reseed(&[node("b")], &[]);
        assert_eq!(report.removed, 1);
        assert!(!engine.contains("a"));
        assert_eq!(engine.link_count(), 0);
    }

    #[test]
    fn malformed_links_are_dropped_not_fatal() {
        let mut engine = engine();
        let report = engine.reseed(
            &[node("a"), node("b")],
            &[Link::new("a", "b", "x"), Link::new("a", "ghost", "y")],
        );
        assert_eq!(report.dropped_links, 1);
        assert_eq!(engine.link_count(), 1);
    }

    #[test]
    fn unchanged_reseed_does_not_reheat() {
        let mut engine = engine();
        let nodes = [node("a"), node("b")];
        let links = [Link::new("a", "b", "x")];
        engine.reseed(&nodes, &links);
        run_until_settled(&mut engine);

        engine.reseed(&nodes, &links);
        assert!(engine.is_settled());

        engine.reseed(&nodes, &[]);
        assert!(!engine.is_settled());
    }

    #[test]
    fn pinned_body_ignores_forces_until_unpinned() {
        let mut engine = engine();
        engine.reseed(&[node("a"), node("b")], &[Link::new("a", "b", "x")]);
        engine.pin("a", 10.0, 20.0);
        for _ in 0..50 {
            engine.tick();
        }
        assert_eq!(engine.position("a"), Some(vec2(10.0, 20.0)));

        engine.drag_to("a", 30.0, 40.0);
        engine.tick();
        assert_eq!(engine.position("a"), Some(vec2(30.0, 40.0)));

        assert!(engine.unpin("a"));
        assert!(engine.body("a").unwrap().pinned.is_none());
        run_until_settled(&mut engine);
        assert_ne!(engine.position("a"), Some(vec2(30.0, 40.0)));
    }

    #[test]
    fn dragging_keeps_the_solver_warm() {
        let mut engine = engine();
        engine.reseed(&[node("a"), node("b")], &[]);
        run_until_settled(&mut engine);

        engine.pin("a", 0.0, 0.0);
        for _ in 0..2_000 {
            engine.tick();
        }
        assert!(!engine.is_settled());

        engine.unpin("a");
        run_until_settled(&mut engine);
    }

    #[test]
    fn coincident_bodies_separate() {
        let mut engine = engine();
        engine.reseed(
            &[node("a").with_layout(100.0, 100.0), node("b").with_layout(100.0, 100.0)],
            &[],
        );
        run_until_settled(&mut engine);
        let distance = (engine.position("a").unwrap() - engine.position("b").unwrap()).length();
        assert!(distance >= PhysicsConfig::default().collision_radius);
    }

    #[test]
    fn linked_pair_is_pulled_together() {
        let mut engine = engine();
        engine.reseed(
            &[node("a").with_layout(-600.0, 300.0), node("b").with_layout(1400.0, 300.0)],
            &[Link::new("a", "b", "x")],
        );
        run_until_settled(&mut engine);
        let distance = (engine.position("a").unwrap() - engine.position("b").unwrap()).length();
        assert!(distance < 600.0, "distance {distance}");
    }

    #[test]
    fn reset_view_recenters_and_restarts() {
        let mut engine = engine();
        engine.reseed(&[node("a").with_layout(5000.0, 5000.0)], &[]);
        run_until_settled(&mut engine);

        engine.reset_view(200.0, 100.0);
        assert_eq!(engine.alpha(), 1.0);
        let position = engine.position("a").unwrap();
        assert!((position - vec2(100.0, 50.0)).length() < 0.01);
        assert_eq!(engine.center(), vec2(100.0, 50.0));
    }

    #[test]
    fn large_graphs_use_the_tree_path_and_stay_finite() {
        let mut engine = engine();
        let nodes = (0..150).map(|index| node(&format!("n{index}"))).collect::<Vec<_>>();
        let links = (1..150)
            .map(|index| Link::new(format!("n{}", index / 3), format!("n{index}"), "x"))
            .collect::<Vec<_>>();
        engine.reseed(&nodes, &links);
        for _ in 0..100 {
            engine.tick();
        }
        assert!(engine.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }
}
