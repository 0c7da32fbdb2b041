use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

const MIN_DISTANCE: f32 = 0.0001;

/// Deterministic unit vector for two bodies sharing a position.
pub(super) fn separation_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

impl Repulsion {
    fn between(self, a: usize, b: usize, point_a: Vec2, point_b: Vec2) -> Vec2 {
        let delta = point_a - point_b;
        let distance_sq = delta.length_sq();
        let distance = distance_sq.sqrt();
        let direction = if distance > MIN_DISTANCE {
            delta / distance
        } else {
            separation_direction(a, b)
        };
        direction * (self.strength / (distance_sq + self.softening))
    }

    /// Exact O(n²) accumulation, used for small graphs.
    pub(super) fn accumulate_pairwise(self, points: &[Vec2], forces: &mut [Vec2]) {
        for a in 0..points.len() {
            for b in (a + 1)..points.len() {
                let push = self.between(a, b, points[a], points[b]);
                forces[a] += push;
                forces[b] -= push;
            }
        }
    }

    /// Barnes–Hut accumulation of the force acting on body `index`.
    pub(super) fn accumulate_for(
        self,
        cell: &QuadCell,
        index: usize,
        points: &[Vec2],
        force: &mut Vec2,
    ) {
        if cell.mass <= 0.0 {
            return;
        }

        let point = points[index];
        if cell.is_leaf() {
            for &other in &cell.bodies {
                if other != index {
                    *force += self.between(index, other, point, points[other]);
                }
            }
            return;
        }

        let delta = point - cell.center_of_mass;
        let distance_sq = delta.length_sq().max(MIN_DISTANCE);
        let distance = distance_sq.sqrt();
        let far_enough = !cell.bounds.contains(point) && cell.bounds.side() / distance < self.theta;
        if far_enough {
            *force += delta / distance * (self.strength * cell.mass / (distance_sq + self.softening));
            return;
        }

        for child in cell.children() {
            self.accumulate_for(child, index, points, force);
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct Collision {
    pub(super) strength: f32,
    pub(super) reach_sq: f32,
}

impl Collision {
    fn resolve_pair(self, a: usize, b: usize, points: &[Vec2], radii: &[f32], pushes: &mut [Vec2]) {
        let min_distance = radii[a] + radii[b];
        let delta = points[a] - points[b];
        let distance = delta.length();
        if distance >= min_distance {
            return;
        }

        let direction = if distance > MIN_DISTANCE {
            delta / distance
        } else {
            separation_direction(a, b)
        };
        let overlap = (min_distance - distance) * self.strength * 0.5;
        pushes[a] += direction * overlap;
        pushes[b] -= direction * overlap;
    }

    /// Dual-tree traversal that only visits cell pairs within collision reach.
    pub(super) fn accumulate(
        self,
        cell_a: &QuadCell,
        cell_b: &QuadCell,
        same_cell: bool,
        points: &[Vec2],
        radii: &[f32],
        pushes: &mut [Vec2],
    ) {
        if cell_a.bounds.gap_sq(cell_b.bounds) > self.reach_sq {
            return;
        }

        if cell_a.is_leaf() && cell_b.is_leaf() {
            if same_cell {
                for (offset, &a) in cell_a.bodies.iter().enumerate() {
                    for &b in &cell_a.bodies[offset + 1..] {
                        self.resolve_pair(a, b, points, radii, pushes);
                    }
                }
            } else {
                for &a in &cell_a.bodies {
                    for &b in &cell_b.bodies {
                        self.resolve_pair(a, b, points, radii, pushes);
                    }
                }
            }
            return;
        }

        if same_cell {
            let children = cell_a.children().collect::<Vec<_>>();
            for (offset, child) in children.iter().enumerate() {
                self.accumulate(child, child, true, points, radii, pushes);
                for other in &children[offset + 1..] {
                    self.accumulate(child, other, false, points, radii, pushes);
                }
            }
            return;
        }

        let split_a = !cell_a.is_leaf()
            && (cell_b.is_leaf() || cell_a.bounds.half_extent >= cell_b.bounds.half_extent);
        if split_a {
            for child in cell_a.children() {
                self.accumulate(child, cell_b, false, points, radii, pushes);
            }
        } else {
            for child in cell_b.children() {
                self.accumulate(cell_a, child, false, points, radii, pushes);
            }
        }
    }
}
