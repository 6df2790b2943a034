use std::collections::{HashMap, HashSet};

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::config::EditorConfig;
use super::geometry::Point;
use super::store::GraphStore;
use super::types::NodeId;

/// Temperature after a structural change or a drag.
pub const ALPHA_START: f64 = 0.1;
/// Below this temperature the layout counts as settled.
pub const ALPHA_MIN: f64 = 0.005;
const ALPHA_DECAY: f64 = 0.99;
const GRAVITY: f64 = 0.1;
/// Vertical push per unit of alpha: sources up, targets down.
const TREE_BIAS: f64 = 6.0;
const NODE_MASS: f32 = 10.0;
const SPRING: f32 = 0.05;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Simulation parameters whose spring/charge balance puts two connected
/// nodes `link_distance` apart.
fn parameters(link_distance: f64) -> SimulationParameters {
	let d = link_distance as f32;
	SimulationParameters {
		force_charge: SPRING * d * d * d / (2.0 * NODE_MASS * NODE_MASS),
		force_spring: SPRING,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

/// Force-directed layout over the nodes of a [`GraphStore`].
///
/// The simulation runs on a `force_graph` mirror of the store which is
/// rebuilt whenever the store's revision changes. Positions are written back
/// into the store after every step; nothing else moves nodes except pins.
pub struct LayoutEngine {
	graph: ForceGraph<NodeId>,
	links: Vec<(NodeId, NodeId)>,
	pinned: HashMap<NodeId, Point>,
	synced: Option<u64>,
	alpha: f64,
	center: Point,
}

impl LayoutEngine {
	pub fn new(config: &EditorConfig, width: f64, height: f64) -> Self {
		Self {
			graph: ForceGraph::new(parameters(config.link_distance)),
			links: Vec::new(),
			pinned: HashMap::new(),
			synced: None,
			alpha: ALPHA_START,
			center: Point::new(width / 2.0, height / 2.0),
		}
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < ALPHA_MIN
	}

	/// Heats the simulation back up.
	pub fn rearm(&mut self) {
		self.alpha = ALPHA_START;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.center = Point::new(width / 2.0, height / 2.0);
		self.rearm();
	}

	/// Fixes a node at `position` until [`unpin`](Self::unpin).
	pub fn pin(&mut self, store: &mut GraphStore, id: NodeId, position: Point) {
		if !store.contains_node(id) {
			debug!("pin: {id} is not in the graph");
			return;
		}
		store.set_position(id, position);
		self.pinned.insert(id, position);
		self.rearm();
	}

	pub fn unpin(&mut self, id: NodeId) {
		if self.pinned.remove(&id).is_some() {
			// force_graph keeps accumulating spring force on anchored nodes;
			// a fresh mirror drops it so the node does not jump on release.
			self.synced = None;
			self.rearm();
		}
	}

	pub fn is_pinned(&self, id: NodeId) -> bool {
		self.pinned.contains_key(&id)
	}

	/// Whether the mirror reflects the current structure of `store`.
	pub fn is_synced(&self, store: &GraphStore) -> bool {
		self.synced == Some(store.revision())
	}

	/// Advances the simulation by one tick of `dt` seconds.
	pub fn step(&mut self, store: &mut GraphStore, dt: f32) {
		if self.synced != Some(store.revision()) {
			self.rebuild(store);
			self.rearm();
		}
		if store.nodes().is_empty() {
			self.alpha *= ALPHA_DECAY;
			return;
		}

		let pinned = &self.pinned;
		self.graph
			.visit_nodes_mut(|node| match pinned.get(&node.data.user_data) {
				Some(p) => {
					node.data.x = p.x as f32;
					node.data.y = p.y as f32;
					node.data.is_anchor = true;
				}
				None => node.data.is_anchor = false,
			});

		// force_graph moves nodes by roughly dt cubed; the cube root keeps
		// displacement proportional to alpha.
		let heat = (self.alpha / ALPHA_START).cbrt() as f32;
		self.graph.update(dt * heat);

		let bias = TREE_BIAS * self.alpha;
		let mut nudges: HashMap<NodeId, f64> = HashMap::new();
		for &(source, target) in &self.links {
			*nudges.entry(source).or_default() -= bias;
			*nudges.entry(target).or_default() += bias;
		}
		let (pull, center) = (GRAVITY * self.alpha, self.center);
		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			let (x, y) = (node.data.x as f64, node.data.y as f64);
			let dy = nudges.get(&node.data.user_data).copied().unwrap_or(0.0);
			node.data.x = (x + (center.x - x) * pull) as f32;
			node.data.y = (y + (center.y - y) * pull + dy) as f32;
		});

		self.graph.visit_nodes(|node| {
			store.set_position(
				node.data.user_data,
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		self.alpha *= ALPHA_DECAY;
	}

	fn rebuild(&mut self, store: &GraphStore) {
		self.graph.clear();
		self.pinned.retain(|id, _| store.contains_node(*id));

		let mut indices = HashMap::with_capacity(store.nodes().len());
		let mut occupied = HashSet::with_capacity(store.nodes().len());
		for (i, node) in store.nodes().iter().enumerate() {
			let mut p = node.position();
			// repulsion has no direction between coincident nodes
			if !occupied.insert((p.x.to_bits(), p.y.to_bits())) {
				let angle = i as f64 * GOLDEN_ANGLE;
				p = p + Point::new(angle.cos(), angle.sin());
			}
			let idx = self.graph.add_node(NodeData {
				x: p.x as f32,
				y: p.y as f32,
				mass: NODE_MASS,
				is_anchor: self.pinned.contains_key(&node.id()),
				user_data: node.id(),
			});
			indices.insert(node.id(), idx);
		}

		self.links = store
			.edges()
			.iter()
			.map(|e| (e.source(), e.target()))
			.collect();
		for (source, target) in &self.links {
			if let (Some(&a), Some(&b)) = (indices.get(source), indices.get(target)) {
				self.graph.add_edge(a, b, EdgeData::default());
			}
		}
		self.synced = Some(store.revision());
		debug!(
			"layout rebuilt: {} nodes, {} links",
			indices.len(),
			self.links.len()
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_editor::types::{Direction, Node};

	const DT: f32 = 0.016;

	fn store_at(points: &[(u64, f64, f64)]) -> GraphStore {
		let nodes = points
			.iter()
			.map(|&(id, x, y)| Node::new(NodeId(id), "person", Point::new(x, y)))
			.collect();
		GraphStore::initialize(nodes, Vec::new()).unwrap()
	}

	fn engine() -> LayoutEngine {
		LayoutEngine::new(&EditorConfig::default(), 800.0, 800.0)
	}

	fn distance(store: &GraphStore, a: u64, b: u64) -> f64 {
		let a = store.node(NodeId(a)).unwrap().position();
		let b = store.node(NodeId(b)).unwrap().position();
		a.distance(b)
	}

	#[test]
	fn alpha_decays_and_structural_change_rearms() {
		let mut store = store_at(&[(0, 300.0, 400.0), (1, 500.0, 400.0)]);
		let mut layout = engine();
		for _ in 0..400 {
			layout.step(&mut store, DT);
		}
		assert!(layout.is_settled(), "alpha {}", layout.alpha());

		store.add_node(Point::new(400.0, 300.0));
		layout.step(&mut store, DT);
		assert!(!layout.is_settled());
		assert!((layout.alpha() - ALPHA_START * ALPHA_DECAY).abs() < 1e-12);
	}

	#[test]
	fn edges_push_sources_up_and_targets_down() {
		let mut store = store_at(&[(0, 300.0, 400.0), (1, 500.0, 400.0)]);
		store.connect(NodeId(0), NodeId(1), Direction::Forward);
		let mut layout = engine();
		layout.step(&mut store, DT);

		let source = store.node(NodeId(0)).unwrap().position();
		let target = store.node(NodeId(1)).unwrap().position();
		assert!(source.y < 400.0, "source y {}", source.y);
		assert!(target.y > 400.0, "target y {}", target.y);
	}

	#[test]
	fn pinned_node_follows_pin_not_forces() {
		let mut store = store_at(&[(0, 390.0, 400.0), (1, 410.0, 400.0)]);
		store.connect(NodeId(0), NodeId(1), Direction::Forward);
		let mut layout = engine();
		layout.pin(&mut store, NodeId(0), Point::new(100.0, 120.0));
		for _ in 0..20 {
			layout.step(&mut store, DT);
		}
		assert_eq!(
			store.node(NodeId(0)).unwrap().position(),
			Point::new(100.0, 120.0)
		);
		assert!(layout.is_pinned(NodeId(0)));

		layout.unpin(NodeId(0));
		assert!(!layout.is_pinned(NodeId(0)));
		layout.step(&mut store, DT);
		let moved = store.node(NodeId(0)).unwrap().position();
		assert!(moved.x.is_finite() && moved.y.is_finite());
	}

	#[test]
	fn close_neighbours_spread_apart() {
		let mut store = store_at(&[(0, 395.0, 400.0), (1, 405.0, 400.0)]);
		store.connect(NodeId(0), NodeId(1), Direction::Forward);
		let mut layout = engine();
		for _ in 0..300 {
			layout.step(&mut store, DT);
		}
		let d = distance(&store, 0, 1);
		assert!(d > 40.0 && d < 300.0, "distance {d}");
	}

	#[test]
	fn coincident_nodes_separate_without_nan() {
		let mut store = store_at(&[(0, 400.0, 400.0), (1, 400.0, 400.0)]);
		let mut layout = engine();
		for _ in 0..50 {
			layout.step(&mut store, DT);
		}
		let d = distance(&store, 0, 1);
		assert!(d.is_finite() && d > 0.0, "distance {d}");
	}

	#[test]
	fn charge_balances_spring_at_link_distance() {
		let p = parameters(150.0);
		let attract = p.force_spring * 150.0 * 0.5;
		let repel = p.force_charge * NODE_MASS * NODE_MASS / (150.0 * 150.0);
		assert!((attract - repel).abs() < 1e-3);
	}
}
