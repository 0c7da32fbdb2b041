use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    fn quadrant(self, index: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if index & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if index & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two boxes, zero when they overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }
}

/// Barnes–Hut cell. Leaves hold body indices; inner cells only aggregate.
pub(super) struct QuadCell {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) bodies: Vec<usize>,
    pub(super) children: [Option<Box<QuadCell>>; 4],
}

impl QuadCell {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(points)?;
        Some(Self::subdivide(bounds, (0..points.len()).collect(), points, 0))
    }

    fn subdivide(bounds: QuadBounds, bodies: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let mass = bodies.len() as f32;
        let center_of_mass = if bodies.is_empty() {
            bounds.center
        } else {
            bodies.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]) / mass
        };

        let mut cell = Self {
            bounds,
            center_of_mass,
            mass,
            bodies,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || cell.bodies.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &cell.bodies {
            buckets[bounds.quadrant_of(points[index])].push(index);
        }

        // Coincident points would recurse to MAX_DEPTH without splitting.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    points,
                    depth + 1,
                )));
            }
        }
        cell.bodies.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadCell> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}
