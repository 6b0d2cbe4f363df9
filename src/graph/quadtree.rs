//! Barnes-Hut quadtree for the charge force.
//!
//! Distant groups of bodies are approximated by their combined charge placed
//! at their charge-weighted centroid, so one charge pass costs O(n log n).

use egui::{Pos2, Vec2};

/// Coincident bodies stop splitting at this depth
const MAX_DEPTH: u32 = 50;

#[derive(Debug, Default)]
pub enum QuadNode {
    #[default]
    Empty,
    Leaf {
        index: usize,
        pos: Pos2,
        charge: f32,
    },
    /// Bodies that still share a cell at `MAX_DEPTH`
    Bucket(Vec<(usize, Pos2, f32)>),
    Internal {
        /// Charge-weighted centroid of all bodies in this cell
        centroid: Pos2,
        /// Summed charge of all bodies in this cell
        charge: f32,
        /// Children: NW, NE, SW, SE
        children: Box<[QuadNode; 4]>,
    },
}

/// Square cell of the tree
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Pos2,
    pub max: Pos2,
}

impl Bounds {
    pub fn new(min: Pos2, max: Pos2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn size(&self) -> f32 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    /// 0=NW, 1=NE, 2=SW, 3=SE
    pub fn quadrant(&self, pos: Pos2) -> usize {
        let center = self.center();
        match (pos.y >= center.y, pos.x >= center.x) {
            (false, false) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }

    pub fn child_bounds(&self, quadrant: usize) -> Bounds {
        let c = self.center();
        match quadrant {
            0 => Bounds::new(self.min, c),
            1 => Bounds::new(Pos2::new(c.x, self.min.y), Pos2::new(self.max.x, c.y)),
            2 => Bounds::new(Pos2::new(self.min.x, c.y), Pos2::new(c.x, self.max.y)),
            _ => Bounds::new(c, self.max),
        }
    }
}

pub struct Quadtree {
    pub root: QuadNode,
    pub bounds: Bounds,
    /// Cell-size / distance ratio under which a cell is approximated
    pub theta: f32,
}

impl Quadtree {
    /// Build a tree over `bodies` (position, charge), indexed by slice position
    pub fn build(bodies: &[(Pos2, f32)], theta: f32) -> Self {
        if bodies.is_empty() {
            return Self {
                root: QuadNode::Empty,
                bounds: Bounds::new(Pos2::ZERO, Pos2::ZERO),
                theta,
            };
        }

        let mut min = Pos2::new(f32::MAX, f32::MAX);
        let mut max = Pos2::new(f32::MIN, f32::MIN);
        for (pos, _) in bodies {
            min = min.min(*pos);
            max = max.max(*pos);
        }

        // Square cell, padded so bodies never sit on the outer edge
        let padding = 1.0;
        let size = (max.x - min.x).max(max.y - min.y) + 2.0 * padding;
        let min = min - Vec2::splat(padding);
        let bounds = Bounds::new(min, min + Vec2::splat(size));

        let mut tree = Self {
            root: QuadNode::Empty,
            bounds,
            theta,
        };
        for (index, &(pos, charge)) in bodies.iter().enumerate() {
            tree.root = Self::insert_into(std::mem::take(&mut tree.root), index, pos, charge, bounds, 0);
        }
        tree
    }

    fn insert_into(node: QuadNode, index: usize, pos: Pos2, charge: f32, bounds: Bounds, depth: u32) -> QuadNode {
        if depth >= MAX_DEPTH {
            return match node {
                QuadNode::Empty => QuadNode::Leaf { index, pos, charge },
                QuadNode::Leaf {
                    index: existing_index,
                    pos: existing_pos,
                    charge: existing_charge,
                } => QuadNode::Bucket(vec![(existing_index, existing_pos, existing_charge), (index, pos, charge)]),
                QuadNode::Bucket(mut bodies) => {
                    bodies.push((index, pos, charge));
                    QuadNode::Bucket(bodies)
                }
                // Internal cells are never created at this depth
                internal @ QuadNode::Internal { .. } => internal,
            };
        }

        match node {
            QuadNode::Empty => QuadNode::Leaf { index, pos, charge },

            // Buckets only exist at MAX_DEPTH, handled above
            bucket @ QuadNode::Bucket(_) => bucket,

            QuadNode::Leaf {
                index: existing_index,
                pos: existing_pos,
                charge: existing_charge,
            } => {
                let mut children: Box<[QuadNode; 4]> = Box::default();

                let eq = bounds.quadrant(existing_pos);
                children[eq] = Self::insert_into(
                    QuadNode::Empty,
                    existing_index,
                    existing_pos,
                    existing_charge,
                    bounds.child_bounds(eq),
                    depth + 1,
                );

                let nq = bounds.quadrant(pos);
                children[nq] = Self::insert_into(
                    std::mem::take(&mut children[nq]),
                    index,
                    pos,
                    charge,
                    bounds.child_bounds(nq),
                    depth + 1,
                );

                QuadNode::Internal {
                    centroid: weighted_centroid(existing_pos, existing_charge, pos, charge),
                    charge: existing_charge + charge,
                    children,
                }
            }

            QuadNode::Internal {
                centroid,
                charge: cell_charge,
                mut children,
            } => {
                let q = bounds.quadrant(pos);
                children[q] = Self::insert_into(
                    std::mem::take(&mut children[q]),
                    index,
                    pos,
                    charge,
                    bounds.child_bounds(q),
                    depth + 1,
                );

                QuadNode::Internal {
                    centroid: weighted_centroid(centroid, cell_charge, pos, charge),
                    charge: cell_charge + charge,
                    children,
                }
            }
        }
    }

    /// Displacement on body `index` at `pos` from every other body.
    ///
    /// Falls off as `charge / distance`; negative charges repel. Distances are
    /// clamped to `min_distance`. The body's own leaf is skipped.
    pub fn charge_force(&self, index: usize, pos: Pos2, min_distance: f32) -> Vec2 {
        self.charge_force_in(&self.root, index, pos, min_distance, self.bounds)
    }

    fn charge_force_in(&self, node: &QuadNode, index: usize, pos: Pos2, min_distance: f32, bounds: Bounds) -> Vec2 {
        match node {
            QuadNode::Empty => Vec2::ZERO,

            QuadNode::Leaf { index: other, pos: body_pos, charge } => {
                if *other == index {
                    return Vec2::ZERO;
                }
                pull(pos, *body_pos, *charge, min_distance)
            }

            QuadNode::Bucket(bodies) => bodies
                .iter()
                .filter(|(other, _, _)| *other != index)
                .map(|&(_, body_pos, charge)| pull(pos, body_pos, charge, min_distance))
                .fold(Vec2::ZERO, |acc, f| acc + f),

            QuadNode::Internal { centroid, charge, children, .. } => {
                let distance = (*centroid - pos).length().max(min_distance);
                if bounds.size() / distance < self.theta {
                    pull(pos, *centroid, *charge, min_distance)
                } else {
                    children
                        .iter()
                        .enumerate()
                        .map(|(q, child)| self.charge_force_in(child, index, pos, min_distance, bounds.child_bounds(q)))
                        .fold(Vec2::ZERO, |acc, f| acc + f)
                }
            }
        }
    }
}

fn weighted_centroid(a: Pos2, wa: f32, b: Pos2, wb: f32) -> Pos2 {
    let total = wa + wb;
    if total == 0.0 {
        return a.lerp(b, 0.5);
    }
    Pos2::new((a.x * wa + b.x * wb) / total, (a.y * wa + b.y * wb) / total)
}

/// Move `pos` toward `source` by `charge / distance` (away when negative)
fn pull(pos: Pos2, source: Pos2, charge: f32, min_distance: f32) -> Vec2 {
    let delta = source - pos;
    let length = delta.length();
    if length == 0.0 {
        return Vec2::ZERO;
    }
    let distance = length.max(min_distance);
    (delta / length) * (charge / distance)
}
