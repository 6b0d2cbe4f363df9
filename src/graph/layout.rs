//! Force-directed graph layout.
//!
//! Implements a force-directed layout with:
//! - Repulsive charge between all nodes, O(n log n) via Barnes-Hut
//! - Springs along links, including the links tying loop anchors to their parent
//! - Weak gravity toward the center of the layout area
//! - Friction to settle the simulation
//!
//! All forces are scaled by `alpha`, which cools geometrically every tick.
//! Once it drops below `ALPHA_MIN` the layout stops moving until restarted.

use super::quadtree::Quadtree;
use crate::chain::{ChainModel, Link, Node};
use crate::settings::Settings;
use egui::{Pos2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Alpha on (re)start
pub const ALPHA_START: f32 = 0.1;
/// Multiplier applied to alpha after every tick
pub const ALPHA_DECAY: f32 = 0.99;
/// Below this alpha the layout is settled
pub const ALPHA_MIN: f32 = 0.005;

/// Loop anchors spawn this far from their parent
const ANCHOR_SPAWN_RADIUS: f32 = 10.0;

pub struct ForceLayout {
    /// Per-node charge; negative repels
    pub charge: f32,
    /// Pull toward the center of the layout area
    pub gravity: f32,
    /// Spring stiffness (0.0 - 1.0)
    pub link_strength: f32,
    /// Spring rest length
    pub link_distance: f32,
    /// Velocity retained per tick (0.0 - 1.0)
    pub friction: f32,
    /// Barnes-Hut accuracy parameter
    pub theta: f32,
    /// Width and height of the layout area
    pub size: Vec2,
    /// Minimum distance to prevent division by zero
    pub min_distance: f32,
    /// Maximum velocity
    pub max_velocity: f32,
    /// Ticks run synchronously on load before the first paint
    pub prewarm_iterations: usize,

    alpha: f32,
    positions: Vec<Pos2>,
    velocities: Vec<Vec2>,
    /// Node index pairs joined by a spring
    springs: Vec<(usize, usize)>,
    /// Number of springs touching each node
    degrees: Vec<f32>,
    rng: StdRng,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ForceLayout {
    pub fn from_settings(settings: &Settings) -> Self {
        let rng = match settings.layout_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            charge: settings.charge,
            gravity: settings.gravity,
            link_strength: settings.link_strength,
            link_distance: settings.link_distance,
            friction: settings.friction,
            theta: settings.theta,
            size: Vec2::new(settings.width, settings.height),
            min_distance: 1.0,
            max_velocity: 50.0,
            prewarm_iterations: settings.prewarm_iterations,
            alpha: 0.0,
            positions: Vec::new(),
            velocities: Vec::new(),
            springs: Vec::new(),
            degrees: Vec::new(),
            rng,
        }
    }

    /// Take over the nodes and links of a freshly loaded chain.
    ///
    /// Stops the layout, scatters the nodes, relaxes `prewarm_iterations`
    /// times synchronously and then restarts continuous relaxation.
    pub fn load(&mut self, model: &ChainModel) {
        self.stop();

        let nodes = model.nodes();
        self.positions = Vec::with_capacity(nodes.len());
        for node in nodes {
            let pos = match node {
                Node::State(_) => Pos2::new(
                    self.rng.gen_range(0.0..=self.size.x),
                    self.rng.gen_range(0.0..=self.size.y),
                ),
                // Anchors are appended after every state, so the parent is placed already
                Node::LoopAnchor { parent } => {
                    let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                    let parent_pos = self.positions.get(parent.index()).copied().unwrap_or(Pos2::ZERO);
                    parent_pos + Vec2::angled(angle) * ANCHOR_SPAWN_RADIUS
                }
            };
            self.positions.push(pos);
        }
        self.velocities = vec![Vec2::ZERO; nodes.len()];

        self.springs = model
            .links()
            .iter()
            .filter(|link| !link.is_self_loop())
            .map(Link::endpoints)
            .map(|(s, t)| (s.index(), t.index()))
            .collect();

        self.degrees = vec![0.0; nodes.len()];
        for &(s, t) in &self.springs {
            self.degrees[s] += 1.0;
            self.degrees[t] += 1.0;
        }

        self.alpha = ALPHA_START;
        for _ in 0..self.prewarm_iterations {
            if !self.tick() {
                break;
            }
        }
        debug!(
            nodes = self.positions.len(),
            springs = self.springs.len(),
            iterations = self.prewarm_iterations,
            "layout prewarmed"
        );

        self.start();
    }

    /// (Re)start continuous relaxation
    pub fn start(&mut self) {
        self.alpha = ALPHA_START;
    }

    pub fn stop(&mut self) {
        self.alpha = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.alpha >= ALPHA_MIN
    }

    /// Check if the simulation has settled
    pub fn is_settled(&self) -> bool {
        !self.is_running()
    }

    #[cfg(test)]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Node positions, indexed by node handle
    pub fn positions(&self) -> &[Pos2] {
        &self.positions
    }

    #[cfg(test)]
    pub fn position(&self, handle: crate::chain::NodeHandle) -> Option<Pos2> {
        self.positions.get(handle.index()).copied()
    }

    /// Run one relaxation iteration.
    ///
    /// Returns `true` if positions moved and the caller should redraw links.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            self.alpha = 0.0;
            return false;
        }
        self.relax();
        self.alpha *= ALPHA_DECAY;
        true
    }

    fn relax(&mut self) {
        let n = self.positions.len();
        if n == 0 {
            return;
        }
        let mut forces = vec![Vec2::ZERO; n];

        // Springs: split the correction by degree so hubs move less
        for &(s, t) in &self.springs {
            let delta = self.positions[t] - self.positions[s];
            let length = delta.length();
            if length == 0.0 {
                continue;
            }
            let stretch = self.alpha * self.link_strength * (length - self.link_distance) / length;
            let correction = delta * stretch;
            let k = self.degrees[s] / (self.degrees[s] + self.degrees[t]);
            forces[t] -= correction * k;
            forces[s] += correction * (1.0 - k);
        }

        // Gravity
        let center = (self.size / 2.0).to_pos2();
        let pull = self.alpha * self.gravity;
        for (force, &pos) in forces.iter_mut().zip(&self.positions) {
            *force += (center - pos) * pull;
        }

        // Charge using Barnes-Hut
        let bodies: Vec<(Pos2, f32)> = self.positions.iter().map(|&p| (p, self.charge)).collect();
        let tree = Quadtree::build(&bodies, self.theta);
        for (i, force) in forces.iter_mut().enumerate() {
            *force += tree.charge_force(i, self.positions[i], self.min_distance) * self.alpha;
        }

        for ((pos, vel), force) in self.positions.iter_mut().zip(&mut self.velocities).zip(forces) {
            *vel = (*vel + force) * self.friction;
            if vel.length() > self.max_velocity {
                *vel = vel.normalized() * self.max_velocity;
            }
            *pos += *vel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{LinkSpec, NodeSpec};
    use crate::chain::{ChainDocument, NodeHandle};

    fn seeded() -> ForceLayout {
        ForceLayout::from_settings(&Settings {
            layout_seed: Some(7),
            ..Settings::default()
        })
    }

    fn weather() -> ChainModel {
        let nodes = ["sunny", "cloudy", "rainy"]
            .iter()
            .map(|&name| NodeSpec { name: name.into(), value: 1.0 / 3.0 })
            .collect();
        let links = [(0, 0, 0.5), (0, 1, 0.4), (0, 2, 0.1), (1, 0, 0.3), (1, 2, 0.5), (2, 1, 0.6), (2, 2, 0.4)]
            .iter()
            .map(|&(source, target, p)| LinkSpec { source, target, p })
            .collect();
        ChainModel::from_document(&ChainDocument { nodes, links }).unwrap()
    }

    #[test]
    fn negative_width_from_settings_file_still_loads() {
        let settings = Settings::from_json(r#"{"width": -10, "layout_seed": 1}"#).unwrap();
        let mut layout = ForceLayout::from_settings(&settings);
        layout.load(&weather());
        assert_eq!(layout.size.x, Settings::default().width);
        assert!(layout.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn load_places_every_node_and_restarts() {
        let model = weather();
        let mut layout = seeded();
        layout.load(&model);

        assert_eq!(layout.positions().len(), model.nodes().len());
        assert!(layout.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!(layout.is_running());
        assert_eq!(layout.alpha(), ALPHA_START);
    }

    #[test]
    fn springs_skip_self_loops_but_keep_anchor_links() {
        let mut layout = seeded();
        layout.load(&weather());
        // 7 transitions, 2 of them self-loops, plus 2 anchor links
        assert_eq!(layout.springs.len(), 7);
        assert!(layout.springs.contains(&(3, 0)));
        assert!(layout.springs.iter().all(|&(s, t)| s != t));
    }

    #[test]
    fn anchors_stay_near_their_parent() {
        let mut layout = seeded();
        layout.load(&weather());
        for _ in 0..100 {
            layout.tick();
        }
        let parent = layout.position(NodeHandle(0)).unwrap();
        let anchor = layout.position(NodeHandle(3)).unwrap();
        let distance = (anchor - parent).length();
        assert!(distance > 0.0 && distance < 200.0, "anchor at {}", distance);
    }

    #[test]
    fn same_seed_same_layout() {
        let model = weather();
        let mut a = seeded();
        let mut b = seeded();
        a.load(&model);
        b.load(&model);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn cools_down_and_stops() {
        let mut layout = seeded();
        layout.load(&weather());
        let mut ticks = 0;
        while layout.tick() {
            ticks += 1;
            assert!(ticks < 1000, "layout never settled");
        }
        assert!(layout.is_settled());
        // 0.1 * 0.99^n < 0.005
        assert!(ticks <= 300);
        let frozen = layout.positions().to_vec();
        assert!(!layout.tick());
        assert_eq!(layout.positions(), frozen.as_slice());
    }

    #[test]
    fn stop_freezes_positions() {
        let mut layout = seeded();
        layout.load(&weather());
        layout.stop();
        let frozen = layout.positions().to_vec();
        assert!(!layout.tick());
        assert_eq!(layout.positions(), frozen.as_slice());
    }

    #[test]
    fn empty_chain_is_fine() {
        let mut layout = seeded();
        layout.load(&ChainModel::default());
        assert!(layout.positions().is_empty());
        assert!(layout.tick());
    }

    #[test]
    fn charge_separates_unlinked_nodes() {
        let nodes = vec![
            NodeSpec { name: "A".into(), value: 0.5 },
            NodeSpec { name: "B".into(), value: 0.5 },
        ];
        let model = ChainModel::from_document(&ChainDocument { nodes, links: vec![] }).unwrap();
        let mut layout = seeded();
        layout.load(&model);
        let gap = (layout.positions()[0] - layout.positions()[1]).length();
        assert!(gap > 30.0, "nodes overlap: {}", gap);
    }
}
