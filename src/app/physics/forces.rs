use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Negative values repel.
    pub(super) strength: f32,
    pub(super) alpha: f32,
    pub(super) theta_sq: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    /// Share of the correction applied to the target; heavier endpoints move less.
    pub(super) bias: f32,
}

fn separation(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

fn charge_impulse(delta: Vec2, distance_sq: f32, weight: f32, params: ChargeParams) -> Vec2 {
    let distance_sq = if distance_sq < params.distance_min_sq {
        (params.distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    };
    delta * (params.strength * weight * params.alpha / distance_sq)
}

/// Many-body velocity change on body `index`, approximating distant cells
/// by their centroid.
pub(super) fn accumulate_charge_for_body(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if cell.weight <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.bodies {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() == 0.0 {
                delta = separation(index, other);
            }
            let distance_sq = delta.length_sq();
            if distance_sq < params.distance_max_sq {
                *velocity += charge_impulse(delta, distance_sq, 1.0, params);
            }
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq();
    let width = cell.square.width();
    let far_enough = (width * width) / params.theta_sq < distance_sq;

    if far_enough && !cell.square.contains(point) {
        if distance_sq < params.distance_max_sq {
            *velocity += charge_impulse(delta, distance_sq, cell.weight, params);
        }
        return;
    }

    for child in cell.children.iter().flatten() {
        accumulate_charge_for_body(child, index, positions, params, velocity);
    }
}

/// Pulls or pushes linked bodies toward each spring's rest length, using the
/// velocities the other forces already produced this tick.
pub(super) fn apply_link_springs(
    springs: &[LinkSpring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() == 0.0 {
            delta = separation(source, target);
        }

        let distance = delta.length();
        let correction = delta * ((distance - spring.distance) / distance * alpha * spring.strength);

        velocities[target] -= correction * spring.bias;
        velocities[source] += correction * (1.0 - spring.bias);
    }
}

/// Translates every body so the centroid drifts toward the origin.
pub(super) fn apply_centering(positions: &mut [Vec2], strength: f32) {
    if positions.is_empty() {
        return;
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, &point| sum + point)
        / positions.len() as f32;
    let shift = centroid * strength;
    for position in positions {
        *position -= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChargeParams {
        ChargeParams {
            strength: -200.0,
            alpha: 1.0,
            theta_sq: 0.81,
            distance_min_sq: 1.0,
            distance_max_sq: 600.0 * 600.0,
        }
    }

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadCell::build(&positions).expect("finite positions");

        let mut left = Vec2::ZERO;
        let mut right = Vec2::ZERO;
        accumulate_charge_for_body(&tree, 0, &positions, params(), &mut left);
        accumulate_charge_for_body(&tree, 1, &positions, params(), &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + 20.0).abs() < 1e-3);
    }

    #[test]
    fn charge_ignores_bodies_beyond_distance_max() {
        let positions = vec![vec2(0.0, 0.0), vec2(700.0, 0.0)];
        let tree = QuadCell::build(&positions).expect("finite positions");

        let mut velocity = Vec2::ZERO;
        accumulate_charge_for_body(&tree, 0, &positions, params(), &mut velocity);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn barnes_hut_stays_close_to_exact_sum() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 2.399_963;
                vec2(angle.cos(), angle.sin()) * (10.0 * (index as f32 + 0.5).sqrt())
            })
            .collect::<Vec<_>>();
        let tree = QuadCell::build(&positions).expect("finite positions");
        let params = ChargeParams {
            theta_sq: 0.25,
            ..params()
        };
        let body = 190;

        let mut approximate = Vec2::ZERO;
        accumulate_charge_for_body(&tree, body, &positions, params, &mut approximate);

        let mut exact = Vec2::ZERO;
        for (other, &point) in positions.iter().enumerate() {
            if other != body {
                let delta = point - positions[body];
                exact += charge_impulse(delta, delta.length_sq(), 1.0, params);
            }
        }

        assert!((approximate - exact).length() <= exact.length() * 0.1 + 1e-3);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let springs = [LinkSpring {
            source: 0,
            target: 1,
            distance: 40.0,
            strength: 0.3,
            bias: 0.5,
        }];
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_link_springs(&springs, &positions, &mut velocities, 1.0);

        assert!((velocities[0].x - 9.0).abs() < 1e-4);
        assert!((velocities[1].x + 9.0).abs() < 1e-4);
    }

    #[test]
    fn centering_moves_centroid_toward_origin() {
        let mut positions = [vec2(100.0, 0.0), vec2(200.0, 40.0)];
        apply_centering(&mut positions, 0.05);
        let centroid = (positions[0] + positions[1]) / 2.0;
        assert!((centroid - vec2(142.5, 19.0)).length() < 1e-3);
    }
}
