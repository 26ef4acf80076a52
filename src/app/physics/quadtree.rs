use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

/// Barnes-Hut cell. Every body carries the same charge, so `weight` is the
/// number of bodies below the cell and `centroid` their mean position.
pub(super) struct QuadCell {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) weight: f32,
    pub(super) bodies: Vec<usize>,
    pub(super) children: [Option<Box<QuadCell>>; 4],
}

impl QuadCell {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        Some(Self::subdivide(
            square,
            (0..positions.len()).collect(),
            positions,
            0,
        ))
    }

    fn subdivide(square: Square, bodies: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let weight = bodies.len() as f32;
        let centroid = if bodies.is_empty() {
            square.center
        } else {
            bodies
                .iter()
                .fold(Vec2::ZERO, |sum, &body| sum + positions[body])
                / weight
        };

        let mut cell = Self {
            square,
            centroid,
            weight,
            bodies,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || cell.bodies.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &body in &cell.bodies {
            buckets[square.quadrant(positions[body])].push(body);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::subdivide(
                    square.child(quadrant),
                    bucket,
                    positions,
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
}
