mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Pos2, Rect, Vec2, vec2};

use crate::util::stable_pair;

use super::PhysicsConfig;
use super::graph::{DisplayGraph, EdgeKind};
use forces::{ChargeParams, LinkSpring, accumulate_charge_for_body, apply_centering, apply_link_springs};
use quadtree::QuadCell;

const GOLDEN_ANGLE: f32 = 2.399_963;
const DRAG_ALPHA_TARGET: f32 = 0.3;

impl Default for PhysicsConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            theta: 0.9,
            distance_max: 600.0,
            center_strength: 0.05,
            hub_link_distance: 40.0,
            direct_link_distance: 80.0,
            hub_link_strength: 0.3,
            warmup_ticks: 30,
            cooldown_ticks: 400,
        }
    }
}

impl PhysicsConfig {
    /// Repulsion grows with the graph so large graphs do not collapse.
    pub(in crate::app) fn charge_for(node_count: usize) -> f32 {
        -200.0 - node_count as f32 * 0.5
    }

    pub(in crate::app) fn direct_link_strength(confidence: f32) -> f32 {
        0.15 + confidence * 0.15
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum LayoutState {
    Empty,
    Running,
    Settled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct TickReport {
    pub(in crate::app) moved: bool,
    /// Set on the tick the simulation came to rest.
    pub(in crate::app) settled: bool,
}

/// Force simulation over the current display graph. Positions live in a
/// side table indexed like `DisplayGraph::nodes`; nothing else writes them.
pub(in crate::app) struct LayoutEngine {
    config: PhysicsConfig,
    ids: Vec<String>,
    index_by_id: HashMap<String, usize>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    fixed: Vec<Option<Vec2>>,
    radii: Vec<f32>,
    springs: Vec<LinkSpring>,
    charge: f32,
    alpha: f32,
    alpha_target: f32,
    ticks_since_reheat: usize,
    state: LayoutState,
}

impl LayoutEngine {
    pub(in crate::app) fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            ids: Vec::new(),
            index_by_id: HashMap::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            fixed: Vec::new(),
            radii: Vec::new(),
            springs: Vec::new(),
            charge: PhysicsConfig::charge_for(0),
            alpha: 0.0,
            alpha_target: 0.0,
            ticks_since_reheat: 0,
            state: LayoutState::Empty,
        }
    }

    pub(in crate::app) fn state(&self) -> LayoutState {
        self.state
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Loads `graph`, carrying over positions and pins of nodes that were
    /// already laid out, then reheats and runs the warm-up ticks.
    pub(in crate::app) fn start(&mut self, graph: &DisplayGraph) -> LayoutState {
        let mut previous = HashMap::with_capacity(self.ids.len());
        for (index, id) in self.ids.drain(..).enumerate() {
            previous.insert(id, (self.positions[index], self.fixed[index]));
        }

        self.index_by_id.clear();
        self.positions.clear();
        self.velocities.clear();
        self.fixed.clear();
        self.radii.clear();
        self.springs.clear();

        if graph.is_empty() {
            self.alpha = 0.0;
            self.alpha_target = 0.0;
            self.state = LayoutState::Empty;
            return self.state;
        }

        for (index, node) in graph.nodes.iter().enumerate() {
            let (position, fixed) = match previous.get(&node.id) {
                Some(&(position, fixed)) => (position, fixed),
                None => (Self::seed_position(graph, index, &previous), None),
            };
            self.ids.push(node.id.clone());
            self.index_by_id.insert(node.id.clone(), index);
            self.positions.push(fixed.unwrap_or(position));
            self.velocities.push(Vec2::ZERO);
            self.fixed.push(fixed);
            self.radii.push(node.radius);
        }

        let mut degree = vec![0usize; graph.nodes.len()];
        for &(source, target) in &graph.endpoints {
            if source != target {
                degree[source] += 1;
                degree[target] += 1;
            }
        }

        for (edge, &(source, target)) in graph.edges.iter().zip(&graph.endpoints) {
            if source == target {
                continue;
            }
            let (distance, strength) = match edge.kind {
                EdgeKind::EntityHub => (self.config.hub_link_distance, self.config.hub_link_strength),
                EdgeKind::Direct => (
                    self.config.direct_link_distance,
                    PhysicsConfig::direct_link_strength(edge.confidence),
                ),
            };
            self.springs.push(LinkSpring {
                source,
                target,
                distance,
                strength,
                bias: degree[source] as f32 / (degree[source] + degree[target]) as f32,
            });
        }

        self.charge = PhysicsConfig::charge_for(graph.nodes.len());
        self.alpha_target = 0.0;
        self.reheat();
        for _ in 0..self.config.warmup_ticks {
            if self.step().settled {
                break;
            }
        }
        self.state
    }

    fn seed_position(
        graph: &DisplayGraph,
        index: usize,
        previous: &HashMap<String, (Vec2, Option<Vec2>)>,
    ) -> Vec2 {
        let (jx, jy) = stable_pair(&graph.nodes[index].id);
        let jitter = vec2(jx, jy) * 12.0;

        let anchor = graph.neighbors[index]
            .iter()
            .find_map(|&neighbor| previous.get(&graph.nodes[neighbor].id));
        if let Some(&(position, _)) = anchor {
            return position + jitter;
        }

        let radius = 10.0 * (index as f32 + 0.5).sqrt();
        let angle = index as f32 * GOLDEN_ANGLE;
        vec2(angle.cos(), angle.sin()) * radius + jitter * 0.1
    }

    pub(in crate::app) fn reheat(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        self.alpha = 1.0;
        self.ticks_since_reheat = 0;
        self.state = LayoutState::Running;
    }

    /// One integration step. Pinned bodies are written back to their fixed
    /// position after the forces ran.
    pub(in crate::app) fn step(&mut self) -> TickReport {
        if self.state != LayoutState::Running {
            return TickReport::default();
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks_since_reheat += 1;

        if self.positions.len() >= 2
            && let Some(tree) = QuadCell::build(&self.positions)
        {
            let params = ChargeParams {
                strength: self.charge,
                alpha: self.alpha,
                theta_sq: self.config.theta * self.config.theta,
                distance_min_sq: 1.0,
                distance_max_sq: self.config.distance_max * self.config.distance_max,
            };
            for (index, velocity) in self.velocities.iter_mut().enumerate() {
                accumulate_charge_for_body(&tree, index, &self.positions, params, velocity);
            }
        }

        apply_link_springs(&self.springs, &self.positions, &mut self.velocities, self.alpha);
        apply_centering(&mut self.positions, self.config.center_strength);

        let retain = 1.0 - self.config.velocity_decay;
        for ((position, velocity), fixed) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(&self.fixed)
        {
            match fixed {
                Some(pinned) => {
                    *position = *pinned;
                    *velocity = Vec2::ZERO;
                }
                None => {
                    *velocity *= retain;
                    *position += *velocity;
                }
            }
        }

        let cooled = self.alpha < self.config.alpha_min;
        let out_of_budget =
            self.alpha_target <= 0.0 && self.ticks_since_reheat >= self.config.cooldown_ticks;
        let settled = cooled || out_of_budget;
        if settled {
            self.state = LayoutState::Settled;
        }

        TickReport {
            moved: true,
            settled,
        }
    }

    pub(in crate::app) fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub(in crate::app) fn position(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.positions[index])
    }

    /// World-space box around every body, including its radius.
    pub(in crate::app) fn bounds(&self) -> Option<Rect> {
        self.positions
            .iter()
            .zip(&self.radii)
            .map(|(position, radius)| {
                Rect::from_center_size(Pos2::new(position.x, position.y), Vec2::splat(radius * 2.0))
            })
            .reduce(|acc, rect| acc.union(rect))
    }

    pub(in crate::app) fn is_pinned(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.fixed[index].is_some())
    }

    pub(in crate::app) fn pinned_count(&self) -> usize {
        self.fixed.iter().filter(|fixed| fixed.is_some()).count()
    }

    /// Fixes `id` at `world`; returns false for ids outside the layout.
    pub(in crate::app) fn pin(&mut self, id: &str, world: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.fixed[index] = Some(world);
        self.positions[index] = world;
        self.velocities[index] = Vec2::ZERO;
        true
    }

    /// Pins the dragged body under the pointer and keeps the simulation warm
    /// so its neighbors follow.
    pub(in crate::app) fn drag_to(&mut self, id: &str, world: Vec2) {
        if !self.pin(id, world) {
            return;
        }
        self.alpha_target = DRAG_ALPHA_TARGET;
        if self.state != LayoutState::Running {
            self.ticks_since_reheat = 0;
            self.state = LayoutState::Running;
        }
    }

    pub(in crate::app) fn end_drag(&mut self) {
        self.alpha_target = 0.0;
        self.ticks_since_reheat = 0;
    }

    pub(in crate::app) fn release(&mut self, id: &str) {
        if let Some(&index) = self.index_by_id.get(id)
            && self.fixed[index].take().is_some()
        {
            self.reheat();
        }
    }

    pub(in crate::app) fn release_all(&mut self) {
        if self.pinned_count() > 0 {
            self.fixed.fill(None);
            self.reheat();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::{FilterParams, build_display_graph};
    use crate::memory::{Layer, RawDataset, RawEdge, RawMemoryNode};

    fn dataset(ids: &[&str], links: &[(&str, &str, &str)]) -> RawDataset {
        RawDataset {
            nodes: ids
                .iter()
                .map(|id| RawMemoryNode {
                    id: (*id).to_owned(),
                    layer: Layer::Session,
                    raw_text: (*id).to_owned(),
                    extraction_summary: None,
                    importance: 0.5,
                    source: String::new(),
                    created_at: None,
                })
                .collect(),
            edges: links
                .iter()
                .map(|(source, target, link_type)| RawEdge {
                    source: (*source).to_owned(),
                    target: (*target).to_owned(),
                    link_type: (*link_type).to_owned(),
                    confidence: 1.0,
                })
                .collect(),
            entities: Vec::new(),
        }
    }

    fn graph(ids: &[&str], links: &[(&str, &str, &str)]) -> DisplayGraph {
        build_display_graph(&dataset(ids, links), &FilterParams::default())
    }

    fn run_until_settled(engine: &mut LayoutEngine) -> usize {
        let mut ticks = 0;
        while engine.state() == LayoutState::Running {
            engine.step();
            ticks += 1;
            assert!(ticks <= 2_000, "simulation never settled");
        }
        ticks
    }

    #[test]
    fn empty_graph_does_not_start() {
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        assert_eq!(engine.start(&DisplayGraph::default()), LayoutState::Empty);
        assert_eq!(engine.step(), TickReport::default());
        assert!(engine.bounds().is_none());
        engine.reheat();
        assert_eq!(engine.state(), LayoutState::Empty);
    }

    #[test]
    fn tuning_follows_graph_size_and_confidence() {
        assert_eq!(PhysicsConfig::charge_for(100), -250.0);
        assert!((PhysicsConfig::direct_link_strength(1.0) - 0.3).abs() < 1e-6);
        assert!((PhysicsConfig::direct_link_strength(0.0) - 0.15).abs() < 1e-6);

        let graph = graph(
            &["a", "b", "c", "d"],
            &[("a", "b", "shared:X"), ("b", "c", "shared:X"), ("c", "d", "cites")],
        );
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        engine.start(&graph);
        assert_eq!(engine.charge, PhysicsConfig::charge_for(5));
        let hub_springs = engine
            .springs
            .iter()
            .filter(|spring| spring.distance == 40.0 && spring.strength == 0.3)
            .count();
        let direct_springs = engine
            .springs
            .iter()
            .filter(|spring| spring.distance == 80.0)
            .count();
        assert_eq!(hub_springs, 3);
        assert_eq!(direct_springs, 1);
    }

    #[test]
    fn simulation_settles_within_cooldown_budget() {
        let graph = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b", "cites"), ("b", "c", "cites"), ("d", "e", "cites")],
        );
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        engine.start(&graph);
        let ticks = run_until_settled(&mut engine);
        assert!(ticks <= PhysicsConfig::default().cooldown_ticks);
        assert_eq!(engine.state(), LayoutState::Settled);
        assert!(engine.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));

        let a = engine.position("a").expect("a laid out");
        let b = engine.position("b").expect("b laid out");
        assert!((a - b).length() > 1.0);
    }

    #[test]
    fn pinned_node_never_moves() {
        let graph = graph(&["a", "b", "c"], &[("a", "b", "cites"), ("b", "c", "cites")]);
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        engine.start(&graph);

        let index = graph.index_of("b").expect("b admitted");
        let anchor = vec2(250.0, -120.0);
        engine.drag_to("b", anchor);
        engine.end_drag();
        for _ in 0..50 {
            engine.step();
        }
        assert_eq!(engine.positions()[index], anchor);
        assert!(engine.is_pinned("b"));

        engine.release("b");
        assert!(!engine.is_pinned("b"));
        assert_eq!(engine.state(), LayoutState::Running);
        for _ in 0..50 {
            engine.step();
        }
        assert_ne!(engine.positions()[index], anchor);
    }

    #[test]
    fn restart_keeps_positions_and_pins_of_surviving_nodes() {
        let before = graph(&["a", "b", "c"], &[("a", "b", "cites"), ("b", "c", "cites")]);
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        engine.start(&before);
        engine.pin("a", vec2(10.0, 10.0));

        let after = graph(&["a", "b"], &[("a", "b", "cites")]);
        engine.start(&after);
        let index = after.index_of("a").expect("a admitted");
        assert!(engine.is_pinned("a"));
        assert_eq!(engine.positions()[index], vec2(10.0, 10.0));
        assert_eq!(engine.pinned_count(), 1);
        assert!(engine.position("c").is_none());

        engine.release_all();
        assert_eq!(engine.pinned_count(), 0);
    }

    #[test]
    fn bounds_cover_every_body() {
        let graph = graph(&["a", "b"], &[("a", "b", "cites")]);
        let mut engine = LayoutEngine::new(PhysicsConfig::default());
        engine.start(&graph);
        let bounds = engine.bounds().expect("non-empty layout");
        for position in engine.positions() {
            assert!(bounds.contains(Pos2::new(position.x, position.y)));
        }
    }
}
