//! Force-directed placement of the agent graph.
//!
//! [`layout`] is a pure function of the snapshot, the previous layout, the
//! user's pins and the parameters. Pins are layout-local: moving a node
//! never touches the graph store.

use crate::config::LayoutConfig;
use crate::theme::{status_visual, StatusVisual, SynthBruteTheme};
use meridian_core::AgentId;
use meridian_graph::GraphSnapshot;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

/// Angular step between siblings, so no two ever share a direction.
const GOLDEN_ANGLE: f64 = PI * (3.0 - 2.236_067_977_499_79);
/// Pull towards the origin, keeps disconnected parts on screen
const CENTERING: f64 = 0.01;
const MIN_DISTANCE_SQ: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn offset(&self, angle: f64, radius: f64) -> Position {
        Position::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub iterations: u32,
    pub spring_length: f64,
    pub repulsion: f64,
    pub spring_strength: f64,
    pub damping: f64,
}

impl From<&LayoutConfig> for LayoutParams {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            iterations: config.iterations,
            spring_length: config.spring_length,
            repulsion: config.repulsion,
            spring_strength: config.spring_strength,
            damping: config.damping,
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: 60,
            spring_length: 12.0,
            repulsion: 400.0,
            spring_strength: 0.05,
            damping: 0.85,
        }
    }
}

/// Positions fixed by the user.
pub type Pins = BTreeMap<AgentId, Position>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphLayout {
    pub positions: BTreeMap<AgentId, Position>,
    pub visuals: BTreeMap<AgentId, StatusVisual>,
}

impl GraphLayout {
    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// `([min_x, max_x], [min_y, max_y])` with `padding` on every side.
    pub fn bounds(&self, padding: f64) -> ([f64; 2], [f64; 2]) {
        if self.positions.is_empty() {
            return ([-padding, padding], [-padding, padding]);
        }
        let mut x = [f64::MAX, f64::MIN];
        let mut y = [f64::MAX, f64::MIN];
        for p in self.positions.values() {
            x = [x[0].min(p.x), x[1].max(p.x)];
            y = [y[0].min(p.y), y[1].max(p.y)];
        }
        ([x[0] - padding, x[1] + padding], [y[0] - padding, y[1] + padding])
    }
}

pub fn layout(
    snapshot: &GraphSnapshot,
    previous: Option<&GraphLayout>,
    pins: &Pins,
    params: &LayoutParams,
    theme: &SynthBruteTheme,
) -> GraphLayout {
    let seeded = seed_positions(snapshot, previous, pins, params);
    let ids: Vec<&AgentId> = snapshot.nodes.keys().collect();
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

    let mut positions: Vec<Position> = ids
        .iter()
        .map(|id| seeded.get(*id).copied().unwrap_or(Position::new(0.0, 0.0)))
        .collect();
    let fixed: Vec<bool> = ids.iter().map(|id| pins.contains_key(*id)).collect();
    let springs: Vec<(usize, usize)> = snapshot
        .resolved_edges()
        .filter_map(|e| Some((*index.get(e.source_id.as_str())?, *index.get(e.target_id.as_str())?)))
        .filter(|(a, b)| a != b)
        .collect();

    simulate(&mut positions, &fixed, &springs, params);

    GraphLayout {
        positions: ids.iter().map(|id| (*id).clone()).zip(positions).collect(),
        visuals: snapshot
            .nodes
            .iter()
            .map(|(id, node)| (id.clone(), status_visual(node.status, theme)))
            .collect(),
    }
}

/// Starting positions: pins, then the previous layout, then placement of
/// unseen nodes next to their parent.
fn seed_positions(
    snapshot: &GraphSnapshot,
    previous: Option<&GraphLayout>,
    pins: &Pins,
    params: &LayoutParams,
) -> BTreeMap<AgentId, Position> {
    let mut placed: BTreeMap<AgentId, Position> = BTreeMap::new();
    let mut pending: Vec<&AgentId> = Vec::new();

    for id in snapshot.nodes.keys() {
        let known = pins
            .get(id)
            .copied()
            .or_else(|| previous.and_then(|p| p.position(id)));
        match known {
            Some(position) => {
                placed.insert(id.clone(), position);
            }
            None => pending.push(id),
        }
    }

    let mut ring_slot = 0usize;
    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();
        for id in pending {
            let parent = snapshot
                .node(id)
                .and_then(|n| n.parent_id.as_ref())
                .filter(|p| snapshot.nodes.contains_key(*p));
            match parent {
                Some(parent) => match placed.get(parent).copied() {
                    Some(anchor) => {
                        let position = near_parent(snapshot, id, parent, anchor, params);
                        placed.insert(id.clone(), position);
                    }
                    None => waiting.push(id),
                },
                None => {
                    let position = ring_position(ring_slot, placed.is_empty(), params);
                    ring_slot += 1;
                    placed.insert(id.clone(), position);
                }
            }
        }
        // Parent cycle: break it by putting the first waiting node on the ring.
        if waiting.len() == before {
            let first = waiting.remove(0);
            let position = ring_position(ring_slot, placed.is_empty(), params);
            ring_slot += 1;
            placed.insert(first.clone(), position);
        }
        pending = waiting;
    }
    placed
}

fn near_parent(
    snapshot: &GraphSnapshot,
    id: &str,
    parent: &str,
    anchor: Position,
    params: &LayoutParams,
) -> Position {
    let sibling_index = snapshot.children(parent).position(|n| n.id == id).unwrap_or(0);
    let outward = if anchor.x == 0.0 && anchor.y == 0.0 {
        0.0
    } else {
        anchor.y.atan2(anchor.x)
    };
    anchor.offset(outward + sibling_index as f64 * GOLDEN_ANGLE, params.spring_length)
}

fn ring_position(slot: usize, first: bool, params: &LayoutParams) -> Position {
    if slot == 0 && first {
        return Position::new(0.0, 0.0);
    }
    Position::new(0.0, 0.0).offset(slot as f64 * GOLDEN_ANGLE, params.spring_length * 2.0)
}

fn simulate(positions: &mut [Position], fixed: &[bool], springs: &[(usize, usize)], params: &LayoutParams) {
    let n = positions.len();
    let max_step = params.spring_length;
    let mut velocity = vec![(0.0f64, 0.0f64); n];

    for _ in 0..params.iterations {
        let mut force = vec![(0.0f64, 0.0f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (mut dx, mut dy) = (positions[i].x - positions[j].x, positions[i].y - positions[j].y);
                let mut dist_sq = dx * dx + dy * dy;
                if dist_sq < MIN_DISTANCE_SQ {
                    let angle = (i * n + j) as f64 * GOLDEN_ANGLE;
                    dx = angle.cos() * 0.1;
                    dy = angle.sin() * 0.1;
                    dist_sq = MIN_DISTANCE_SQ;
                }
                let dist = dist_sq.sqrt();
                let magnitude = params.repulsion / dist_sq;
                let (fx, fy) = (dx / dist * magnitude, dy / dist * magnitude);
                force[i].0 += fx;
                force[i].1 += fy;
                force[j].0 -= fx;
                force[j].1 -= fy;
            }
        }

        for &(a, b) in springs {
            let (dx, dy) = (positions[b].x - positions[a].x, positions[b].y - positions[a].y);
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE_SQ.sqrt());
            let magnitude = params.spring_strength * (dist - params.spring_length);
            let (fx, fy) = (dx / dist * magnitude, dy / dist * magnitude);
            force[a].0 += fx;
            force[a].1 += fy;
            force[b].0 -= fx;
            force[b].1 -= fy;
        }

        for i in 0..n {
            if fixed[i] {
                continue;
            }
            force[i].0 -= positions[i].x * CENTERING;
            force[i].1 -= positions[i].y * CENTERING;

            let (mut vx, mut vy) = (
                (velocity[i].0 + force[i].0) * params.damping,
                (velocity[i].1 + force[i].1) * params.damping,
            );
            let speed = (vx * vx + vy * vy).sqrt();
            if speed > max_step {
                vx *= max_step / speed;
                vy *= max_step / speed;
            }
            velocity[i] = (vx, vy);
            positions[i].x += vx;
            positions[i].y += vy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{AgentKind, AgentNode, AgentStatus, Edge, EdgeStatus, EdgeType};

    fn snapshot(nodes: &[(&str, Option<&str>)]) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        for (id, parent) in nodes {
            snapshot.nodes.insert(
                id.to_string(),
                AgentNode::new(*id, AgentKind::Worker, parent.map(str::to_string)),
            );
            if let Some(parent) = parent {
                snapshot
                    .edges
                    .push(Edge::new(*parent, *id, EdgeType::Dependency, EdgeStatus::Pending));
            }
        }
        snapshot
    }

    fn frozen() -> LayoutParams {
        LayoutParams {
            iterations: 0,
            ..LayoutParams::default()
        }
    }

    #[test]
    fn test_first_root_sits_at_origin() {
        let graph = snapshot(&[("CEO", None)]);
        let result = layout(&graph, None, &Pins::new(), &frozen(), &SynthBruteTheme::default());
        assert_eq!(result.position("CEO"), Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_new_child_enters_next_to_parent() {
        let params = frozen();
        let graph = snapshot(&[("CEO", None), ("Research_Leader", Some("CEO"))]);
        let result = layout(&graph, None, &Pins::new(), &params, &SynthBruteTheme::default());
        let (Some(parent), Some(child)) = (result.position("CEO"), result.position("Research_Leader"))
        else {
            panic!("missing positions");
        };
        assert!((parent.distance(&child) - params.spring_length).abs() < 1e-9);
    }

    #[test]
    fn test_previous_positions_seed_the_next_layout() {
        let theme = SynthBruteTheme::default();
        let graph = snapshot(&[("CEO", None)]);
        let mut previous = GraphLayout::default();
        previous.positions.insert("CEO".into(), Position::new(5.0, -3.0));
        let result = layout(&graph, Some(&previous), &Pins::new(), &frozen(), &theme);
        assert_eq!(result.position("CEO"), Some(Position::new(5.0, -3.0)));
    }

    #[test]
    fn test_pinned_nodes_do_not_move() {
        let graph = snapshot(&[("CEO", None), ("a", Some("CEO")), ("b", Some("CEO"))]);
        let mut pins = Pins::new();
        pins.insert("a".into(), Position::new(1.0, 1.0));
        let result = layout(&graph, None, &pins, &LayoutParams::default(), &SynthBruteTheme::default());
        assert_eq!(result.position("a"), Some(Position::new(1.0, 1.0)));
        assert!(result.positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let theme = SynthBruteTheme::default();
        let graph = snapshot(&[("CEO", None), ("a", Some("CEO")), ("b", Some("a")), ("c", None)]);
        let first = layout(&graph, None, &Pins::new(), &LayoutParams::default(), &theme);
        let second = layout(&graph, None, &Pins::new(), &LayoutParams::default(), &theme);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parent_cycles_still_place_every_node() {
        let graph = snapshot(&[("a", Some("b")), ("b", Some("a"))]);
        let result = layout(&graph, None, &Pins::new(), &frozen(), &SynthBruteTheme::default());
        assert_eq!(result.positions.len(), 2);
    }

    #[test]
    fn test_visuals_follow_status() {
        let theme = SynthBruteTheme::default();
        let mut graph = snapshot(&[("CEO", None)]);
        if let Some(node) = graph.nodes.get_mut("CEO") {
            node.status = AgentStatus::Searching;
        }
        let result = layout(&graph, None, &Pins::new(), &frozen(), &theme);
        assert_eq!(
            result.visuals.get("CEO"),
            Some(&status_visual(AgentStatus::Searching, &theme))
        );
    }

    #[test]
    fn test_bounds_cover_every_node() {
        let mut result = GraphLayout::default();
        result.positions.insert("a".into(), Position::new(-4.0, 2.0));
        result.positions.insert("b".into(), Position::new(6.0, -1.0));
        assert_eq!(result.bounds(1.0), ([-5.0, 7.0], [-2.0, 3.0]));
    }
}
