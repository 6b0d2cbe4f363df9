//! Geometry and styling for the chain view.
//!
//! Nothing here touches the painter: links become [`LinkGeometry`] values,
//! node values become fill colors and percent labels, and timed value
//! transitions are sampled on demand. `app` turns the result into shapes.

use crate::chain::{ChainModel, Link, LinkHandle, NodeHandle, RedrawRequest};
use crate::theme;
use egui::{Color32, Pos2, Vec2};
use std::f32::consts::PI;

/// Link ends sit this far from the node center, just outside the circle
pub const TRIM_RADIUS: f32 = 36.0;
/// Angular offset of straight link ends, so opposite links don't overlap
pub const LINK_TRIM_ANGLE: f32 = PI / 20.0;
/// Angular offset of the two ends of a loop arc
pub const LOOP_TRIM_ANGLE: f32 = PI / 7.0;
/// Radius of a loop arc
pub const LOOP_RADIUS: f32 = 20.0;

/// Drawable shape of one transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkGeometry {
    Straight { from: Pos2, to: Pos2 },
    /// Major arc of a circle from `start` to `end`, bulging away from the node
    Loop {
        start: Pos2,
        end: Pos2,
        center: Pos2,
        radius: f32,
    },
}

/// Rotate a unit vector by `angle`
fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}

impl LinkGeometry {
    /// Straight link between two node centers. `None` if they coincide.
    pub fn straight(source: Pos2, target: Pos2) -> Option<Self> {
        let delta = target - source;
        let distance = delta.length();
        if distance == 0.0 || !distance.is_finite() {
            return None;
        }
        let dir = delta / distance;
        Some(LinkGeometry::Straight {
            from: source + rotate(dir, LINK_TRIM_ANGLE) * TRIM_RADIUS,
            to: target - rotate(dir, -LINK_TRIM_ANGLE) * TRIM_RADIUS,
        })
    }

    /// Loop on `node`, opening toward `anchor`. `None` if they coincide.
    pub fn self_loop(node: Pos2, anchor: Pos2) -> Option<Self> {
        let delta = anchor - node;
        let distance = delta.length();
        if distance == 0.0 || !distance.is_finite() {
            return None;
        }
        let dir = delta / distance;
        let half_chord = TRIM_RADIUS * LOOP_TRIM_ANGLE.sin();
        let center_offset = TRIM_RADIUS * LOOP_TRIM_ANGLE.cos()
            + (LOOP_RADIUS * LOOP_RADIUS - half_chord * half_chord).max(0.0).sqrt();
        Some(LinkGeometry::Loop {
            start: node + rotate(dir, LOOP_TRIM_ANGLE) * TRIM_RADIUS,
            end: node + rotate(dir, -LOOP_TRIM_ANGLE) * TRIM_RADIUS,
            center: node + dir * center_offset,
            radius: LOOP_RADIUS,
        })
    }

    /// Start angle and signed sweep of the major arc
    fn arc(start: Pos2, end: Pos2, center: Pos2) -> (f32, f32) {
        let a0 = (start - center).angle();
        let a1 = (end - center).angle();
        let mut span = (a1 - a0).rem_euclid(2.0 * PI);
        if span < PI {
            span -= 2.0 * PI;
        }
        (a0, span)
    }

    /// Polyline approximation; `segments` only matters for loops
    pub fn points(&self, segments: usize) -> Vec<Pos2> {
        match *self {
            LinkGeometry::Straight { from, to } => vec![from, to],
            LinkGeometry::Loop { start, end, center, radius } => {
                let segments = segments.max(2);
                let (a0, span) = Self::arc(start, end, center);
                (0..=segments)
                    .map(|i| center + Vec2::angled(a0 + span * i as f32 / segments as f32) * radius)
                    .collect()
            }
        }
    }

    /// Where the arrowhead goes
    pub fn tip(&self) -> Pos2 {
        match *self {
            LinkGeometry::Straight { to, .. } => to,
            LinkGeometry::Loop { end, .. } => end,
        }
    }

    /// Unit direction of travel at the tip
    pub fn tip_direction(&self) -> Vec2 {
        match *self {
            LinkGeometry::Straight { from, to } => (to - from).normalized(),
            LinkGeometry::Loop { start, end, center, .. } => {
                let (a0, span) = Self::arc(start, end, center);
                let tangent = Vec2::angled(a0 + span + PI / 2.0);
                if span >= 0.0 {
                    tangent
                } else {
                    -tangent
                }
            }
        }
    }

    /// SVG path data for this link
    pub fn svg_path(&self) -> String {
        match *self {
            LinkGeometry::Straight { from, to } => {
                format!("M {},{} L {},{}", from.x, from.y, to.x, to.y)
            }
            LinkGeometry::Loop { start, end, radius, .. } => format!(
                "M {},{} A {},{} 0,1,0 {},{}",
                start.x, start.y, radius, radius, end.x, end.y
            ),
        }
    }
}

/// Geometry for a link, or `None` if it isn't drawn this frame.
///
/// Anchor links are layout-only; coincident endpoints draw nothing.
pub fn link_geometry(link: &Link, positions: &[Pos2]) -> Option<LinkGeometry> {
    match *link {
        Link::Anchor { .. } => None,
        Link::Transition { source, target, loop_anchor, .. } => {
            let source_pos = positions.get(source.index())?;
            match loop_anchor {
                Some(anchor) if source == target => {
                    LinkGeometry::self_loop(*source_pos, *positions.get(anchor.index())?)
                }
                _ => LinkGeometry::straight(*source_pos, *positions.get(target.index())?),
            }
        }
    }
}

/// Node fill: saturation follows the value
pub fn node_fill(value: f64) -> Color32 {
    theme::hsl_to_rgb(theme::fill::HUE, value as f32, theme::fill::LIGHTNESS)
}

/// Value as a percentage with one decimal
pub fn percent_label(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Link and node placement, rebuilt on every layout tick
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub links: Vec<(LinkHandle, LinkGeometry)>,
    /// Real states only
    pub nodes: Vec<(NodeHandle, Pos2)>,
}

impl Scene {
    pub fn redraw_links(&mut self, model: &ChainModel, positions: &[Pos2]) {
        self.links.clear();
        self.links.extend(
            model
                .links()
                .iter()
                .enumerate()
                .filter_map(|(i, link)| link_geometry(link, positions).map(|g| (LinkHandle(i), g))),
        );

        self.nodes.clear();
        self.nodes.extend(
            model
                .states()
                .filter_map(|(h, _)| positions.get(h.index()).map(|&p| (h, p))),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ValueTransition {
    from: f64,
    to: f64,
    start: f64,
    duration: f64,
}

impl ValueTransition {
    fn settled(value: f64) -> Self {
        Self { from: value, to: value, start: 0.0, duration: 0.0 }
    }

    fn sample(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = ((now - self.start) / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_done(&self, now: f64) -> bool {
        now - self.start >= self.duration
    }
}

/// Displayed value of each state, possibly mid-transition
#[derive(Debug, Clone, Default)]
pub struct ValueDisplay {
    transitions: Vec<ValueTransition>,
}

impl ValueDisplay {
    /// Apply a redraw request from the model at time `now` (seconds)
    pub fn apply(&mut self, model: &ChainModel, request: RedrawRequest, now: f64) {
        self.transitions = model
            .states()
            .map(|(_, state)| match request.transition {
                Some(duration) => ValueTransition {
                    from: state.old_value.unwrap_or(state.value),
                    to: state.value,
                    start: now,
                    duration: duration.as_secs_f64(),
                },
                None => ValueTransition::settled(state.value),
            })
            .collect();
    }

    /// Value to show for a state at time `now`
    pub fn value(&self, handle: NodeHandle, now: f64) -> Option<f64> {
        self.transitions.get(handle.index()).map(|t| t.sample(now))
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.transitions.iter().any(|t| !t.is_done(now))
    }
}
