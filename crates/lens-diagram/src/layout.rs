//! Fixed-parameter force-directed layout
//!
//! Pairwise repulsion, spring attraction along edges and a weak pull toward
//! the origin. Constants are fixed and do not depend on the data, and the
//! initial placement is derived from node order, so the same graph always
//! lays out the same way.

use lens_graph::Graph;
use serde::{Deserialize, Serialize};

/// Physics constants, embedded verbatim in rendered documents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Repulsion strength (negative repels)
    pub gravity: f64,
    /// Pull toward the origin
    pub central_gravity: f64,
    /// Rest length of edge springs
    pub spring_length: f64,
    /// Spring stiffness
    pub spring_constant: f64,
    /// Velocity damping per step, 0..1
    pub damping: f64,
    /// Simulation steps
    pub iterations: u32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: -3000.0,
            central_gravity: 0.3,
            spring_length: 150.0,
            spring_constant: 0.04,
            damping: 0.09,
            iterations: 60,
        }
    }
}

/// Node position in layout space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const MIN_DISTANCE: f64 = 1.0;
const MAX_VELOCITY: f64 = 50.0;

/// Compute one position per node, in graph node order
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn layout(graph: &Graph, params: &PhysicsParams) -> Vec<Position> {
    let n = graph.node_count();
    let mut positions: Vec<Position> = graph
        .nodes()
        .enumerate()
        .map(|(i, node)| {
            let angle = i as f64 * GOLDEN_ANGLE;
            let radius = params.spring_length * (node.depth as f64 + 1.0);
            Position {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();

    let springs: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .filter_map(|e| Some((graph.index_of(&e.parent)?, graph.index_of(&e.child)?)))
        .filter(|(a, b)| a != b)
        .collect();

    let mut velocity = vec![(0.0_f64, 0.0_f64); n];
    for _ in 0..params.iterations {
        let mut force = vec![(0.0_f64, 0.0_f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[i].x - positions[j].x;
                let dy = positions[i].y - positions[j].y;
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let magnitude = -params.gravity / (dist * dist);
                let (fx, fy) = (magnitude * dx / dist, magnitude * dy / dist);
                force[i].0 += fx;
                force[i].1 += fy;
                force[j].0 -= fx;
                force[j].1 -= fy;
            }
        }

        for &(a, b) in &springs {
            let dx = positions[b].x - positions[a].x;
            let dy = positions[b].y - positions[a].y;
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let stretch = (dist - params.spring_length) * params.spring_constant;
            let (fx, fy) = (stretch * dx / dist, stretch * dy / dist);
            force[a].0 += fx;
            force[a].1 += fy;
            force[b].0 -= fx;
            force[b].1 -= fy;
        }

        for (i, pos) in positions.iter_mut().enumerate() {
            let fx = force[i].0 - pos.x * params.central_gravity * 0.01;
            let fy = force[i].1 - pos.y * params.central_gravity * 0.01;
            let vx = ((velocity[i].0 + fx) * (1.0 - params.damping)).clamp(-MAX_VELOCITY, MAX_VELOCITY);
            let vy = ((velocity[i].1 + fy) * (1.0 - params.damping)).clamp(-MAX_VELOCITY, MAX_VELOCITY);
            velocity[i] = (vx, vy);
            pos.x += vx;
            pos.y += vy;
        }
    }

    positions
}
