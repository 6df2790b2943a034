use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use anyhow::{Result, bail};
use log::{debug, warn};

use super::geometry::Point;
use super::types::{
	Direction, Edge, EdgeArrows, EdgeKey, Endpoint, GraphData, NEW_NODE_KIND, Node, NodeId,
};

/// Radius of the circle unpositioned input nodes are seeded on.
const SEED_RADIUS: f64 = 100.0;

/// Canonical node and edge collections of one editor instance.
///
/// Operations addressed to nodes or edges that are not in the store are
/// logged and ignored; they never fail.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	next_id: u64,
	revision: u64,
}

impl GraphStore {
	/// Adopts `nodes` and `edges` as the live graph. Duplicate node ids and
	/// edges to unknown nodes are rejected; repeated edges merge their arrows.
	pub fn initialize(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
		let mut ids = HashSet::with_capacity(nodes.len());
		for node in &nodes {
			if !ids.insert(node.id) {
				bail!("duplicate node id {}", node.id);
			}
		}

		let mut merged: Vec<Edge> = Vec::with_capacity(edges.len());
		let mut by_key: HashMap<EdgeKey, usize> = HashMap::with_capacity(edges.len());
		for edge in edges {
			for end in [edge.source(), edge.target()] {
				if !ids.contains(&end) {
					bail!("edge {} references unknown node {}", edge.key, end);
				}
			}
			match by_key.get(&edge.key) {
				Some(&i) => {
					warn!("merging repeated edge {}", edge.key);
					merged[i].left |= edge.left;
					merged[i].right |= edge.right;
				}
				None => {
					by_key.insert(edge.key, merged.len());
					merged.push(edge);
				}
			}
		}

		let next_id = nodes.iter().map(|n| n.id.0 + 1).max().unwrap_or(0);
		Ok(Self {
			nodes,
			edges: merged,
			next_id,
			revision: 0,
		})
	}

	/// Builds a store from host data, resolving index and id endpoints.
	/// Nodes without a position are seeded on a circle around `center`.
	pub fn from_data(data: &GraphData, center: Point) -> Result<Self> {
		let count = data.nodes.len().max(1) as f64;
		let nodes: Vec<Node> = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| {
				let angle = (i as f64) * 2.0 * PI / count;
				let seeded = center + Point::new(angle.cos(), angle.sin()) * SEED_RADIUS;
				let mut node = Node::new(
					n.id,
					n.kind.clone(),
					Point::new(n.x.unwrap_or(seeded.x), n.y.unwrap_or(seeded.y)),
				);
				node.name = n.name.clone();
				node.reflexive = n.reflexive;
				node.highlighted = n.highlighted;
				node
			})
			.collect();

		let resolve = |endpoint: Endpoint, link: usize| -> Result<NodeId> {
			match endpoint {
				Endpoint::Index(i) => match data.nodes.get(i) {
					Some(n) => Ok(n.id),
					None => bail!("link {link} points at node index {i}, out of range"),
				},
				Endpoint::Id(id) => Ok(id),
			}
		};

		let mut edges = Vec::with_capacity(data.links.len());
		let mut self_links = Vec::new();
		for (i, link) in data.links.iter().enumerate() {
			let (a, b) = (resolve(link.source, i)?, resolve(link.target, i)?);
			let Some(key) = EdgeKey::new(a, b) else {
				warn!("link {i} connects {a} to itself, marking it reflexive");
				self_links.push(a);
				continue;
			};
			let mut edge = Edge::new(key);
			if key.source() == a {
				(edge.left, edge.right) = (link.left, link.right);
			} else {
				(edge.left, edge.right) = (link.right, link.left);
			}
			edges.push(edge);
		}

		let mut store = Self::initialize(nodes, edges)?;
		for id in self_links {
			if let Some(node) = store.node_mut(id) {
				node.reflexive = true;
			}
		}
		Ok(store)
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
		self.edges.iter().find(|e| e.key == key)
	}

	pub fn contains_node(&self, id: NodeId) -> bool {
		self.node(id).is_some()
	}

	/// Id the next created node will receive.
	pub fn next_id(&self) -> NodeId {
		NodeId(self.next_id)
	}

	/// Counter bumped by every structural change (nodes or edges added or
	/// removed). Flag changes do not count.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub(crate) fn set_position(&mut self, id: NodeId, position: Point) {
		if let Some(node) = self.node_mut(id) {
			node.x = position.x;
			node.y = position.y;
		}
	}

	/// Creates a node of kind `new` at `position`.
	pub fn add_node(&mut self, position: Point) -> NodeId {
		let id = NodeId(self.next_id);
		self.next_id += 1;
		self.nodes.push(Node::new(id, NEW_NODE_KIND, position));
		self.revision += 1;
		debug!("added node {id} at ({:.1}, {:.1})", position.x, position.y);
		id
	}

	/// Removes the node and every edge touching it.
	pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
		let Some(index) = self.nodes.iter().position(|n| n.id == id) else {
			debug!("remove_node: {id} is not in the graph");
			return None;
		};
		let node = self.nodes.remove(index);
		let before = self.edges.len();
		self.edges.retain(|e| !e.key.touches(id));
		self.revision += 1;
		debug!("removed node {id} and {} edges", before - self.edges.len());
		Some(node)
	}

	/// Connects `a` and `b`, setting the arrow picked by `direction` on the
	/// canonical edge. An existing edge for the pair is updated in place.
	pub fn connect(&mut self, a: NodeId, b: NodeId, direction: Direction) -> Option<EdgeKey> {
		if !self.contains_node(a) || !self.contains_node(b) {
			debug!("connect: {a} or {b} is not in the graph");
			return None;
		}
		let Some(key) = EdgeKey::new(a, b) else {
			debug!("connect: refusing to link {a} to itself");
			return None;
		};
		let arrow_at_target = (key.target() == b) == (direction == Direction::Forward);

		let edge = match self.edges.iter().position(|e| e.key == key) {
			Some(i) => &mut self.edges[i],
			None => {
				self.edges.push(Edge::new(key));
				self.revision += 1;
				debug!("added edge {key}");
				let last = self.edges.len() - 1;
				&mut self.edges[last]
			}
		};
		if arrow_at_target {
			edge.right = true;
		} else {
			edge.left = true;
		}
		Some(key)
	}

	/// Removes a single edge.
	pub fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
		let Some(index) = self.edges.iter().position(|e| e.key == key) else {
			debug!("remove_edge: {key} is not in the graph");
			return None;
		};
		self.revision += 1;
		Some(self.edges.remove(index))
	}

	/// Replaces the arrows of an edge.
	pub fn set_edge_arrows(&mut self, key: EdgeKey, arrows: EdgeArrows) -> bool {
		let Some(edge) = self.edges.iter_mut().find(|e| e.key == key) else {
			debug!("set_edge_arrows: {key} is not in the graph");
			return false;
		};
		(edge.left, edge.right) = arrows.flags();
		true
	}

	/// Flips the reflexive flag of a node.
	pub fn toggle_reflexive(&mut self, id: NodeId) -> bool {
		let Some(node) = self.node_mut(id) else {
			debug!("toggle_reflexive: {id} is not in the graph");
			return false;
		};
		node.reflexive = !node.reflexive;
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_editor::types::{LinkData, NodeData};

	fn store_with(ids: &[u64]) -> GraphStore {
		let nodes = ids
			.iter()
			.map(|&id| Node::new(NodeId(id), "person", Point::default()))
			.collect();
		GraphStore::initialize(nodes, Vec::new()).unwrap()
	}

	fn node_data(id: u64) -> NodeData {
		NodeData {
			id: NodeId(id),
			kind: "person".into(),
			name: None,
			reflexive: false,
			highlighted: false,
			x: None,
			y: None,
		}
	}

	#[test]
	fn connect_sets_arrow_relative_to_call_order() {
		let (a, c) = (NodeId(0), NodeId(2));
		let mut store = store_with(&[0, 1, 2]);

		let key = store.connect(a, c, Direction::Forward).unwrap();
		assert_eq!(store.edges().len(), 1);
		let edge = store.edge(key).unwrap();
		assert_eq!((edge.source(), edge.target()), (a, c));
		assert_eq!((edge.left, edge.right), (false, true));

		let again = store.connect(c, a, Direction::Forward).unwrap();
		assert_eq!(again, key);
		assert_eq!(store.edges().len(), 1);
		let edge = store.edge(key).unwrap();
		assert_eq!((edge.left, edge.right), (true, true));
	}

	#[test]
	fn connect_is_idempotent() {
		let mut store = store_with(&[4, 9]);
		store.connect(NodeId(9), NodeId(4), Direction::Backward);
		let revision = store.revision();
		store.connect(NodeId(9), NodeId(4), Direction::Backward);

		assert_eq!(store.edges().len(), 1);
		let edge = &store.edges()[0];
		assert_eq!((edge.source(), edge.target()), (NodeId(4), NodeId(9)));
		assert_eq!((edge.left, edge.right), (false, true));
		assert_eq!(store.revision(), revision);
	}

	#[test]
	fn connect_to_self_or_missing_node_is_ignored() {
		let mut store = store_with(&[0, 1]);
		assert_eq!(store.connect(NodeId(1), NodeId(1), Direction::Forward), None);
		assert_eq!(store.connect(NodeId(1), NodeId(5), Direction::Forward), None);
		assert!(store.edges().is_empty());
	}

	#[test]
	fn removing_a_node_cascades_to_its_edges_only() {
		let mut store = store_with(&[0, 1, 2, 3]);
		store.connect(NodeId(0), NodeId(1), Direction::Forward);
		store.connect(NodeId(1), NodeId(2), Direction::Forward);
		store.connect(NodeId(2), NodeId(3), Direction::Forward);

		let removed = store.remove_node(NodeId(1)).unwrap();
		assert_eq!(removed.id(), NodeId(1));
		let remaining: Vec<_> = store.edges().iter().map(|e| e.key()).collect();
		assert_eq!(remaining, vec![EdgeKey::new(NodeId(2), NodeId(3)).unwrap()]);
		assert!(store.remove_node(NodeId(1)).is_none());
	}

	#[test]
	fn new_ids_exceed_every_existing_id() {
		let mut store = store_with(&[3, 11, 7]);
		assert_eq!(store.next_id(), NodeId(12));
		let a = store.add_node(Point::new(5.0, 6.0));
		store.remove_node(a);
		let b = store.add_node(Point::default());
		assert_eq!((a, b), (NodeId(12), NodeId(13)));

		let node = store.node(a);
		assert!(node.is_none());
		let node = store.node(b).unwrap();
		assert_eq!(node.kind, NEW_NODE_KIND);
		assert!(!node.reflexive);
		assert_eq!(GraphStore::default().next_id(), NodeId(0));
	}

	#[test]
	fn structural_changes_bump_revision() {
		let mut store = store_with(&[0, 1]);
		let start = store.revision();
		let key = store.connect(NodeId(0), NodeId(1), Direction::Forward).unwrap();
		assert_eq!(store.revision(), start + 1);
		assert!(store.set_edge_arrows(key, EdgeArrows::Both));
		assert!(store.toggle_reflexive(NodeId(0)));
		assert_eq!(store.revision(), start + 1);
		store.remove_edge(key);
		assert_eq!(store.revision(), start + 2);
		assert!(store.remove_edge(key).is_none());
		assert_eq!(store.revision(), start + 2);
	}

	#[test]
	fn initialize_rejects_duplicate_ids() {
		let nodes = vec![
			Node::new(NodeId(1), "a", Point::default()),
			Node::new(NodeId(1), "b", Point::default()),
		];
		assert!(GraphStore::initialize(nodes, Vec::new()).is_err());
	}

	#[test]
	fn from_data_normalizes_links() {
		let data = GraphData {
			nodes: vec![node_data(0), node_data(5), node_data(3)],
			links: vec![
				LinkData {
					source: Endpoint::Index(1),
					target: Endpoint::Index(2),
					left: false,
					right: true,
				},
				LinkData {
					source: Endpoint::Id(NodeId(3)),
					target: Endpoint::Id(NodeId(5)),
					left: false,
					right: true,
				},
				LinkData {
					source: Endpoint::Id(NodeId(0)),
					target: Endpoint::Index(0),
					left: false,
					right: false,
				},
			],
		};
		let store = GraphStore::from_data(&data, Point::new(100.0, 100.0)).unwrap();

		assert_eq!(store.edges().len(), 1);
		let edge = &store.edges()[0];
		assert_eq!((edge.source(), edge.target()), (NodeId(3), NodeId(5)));
		assert_eq!((edge.left, edge.right), (true, true));
		assert!(store.node(NodeId(0)).unwrap().reflexive);
		assert_eq!(store.next_id(), NodeId(6));

		let first = store.node(NodeId(0)).unwrap().position();
		assert!((first.x - 200.0).abs() < 1e-9 && (first.y - 100.0).abs() < 1e-9);
	}

	#[test]
	fn from_data_rejects_dangling_links() {
		let mut data = GraphData {
			nodes: vec![node_data(0)],
			links: vec![LinkData {
				source: Endpoint::Index(0),
				target: Endpoint::Index(4),
				left: false,
				right: true,
			}],
		};
		assert!(GraphStore::from_data(&data, Point::default()).is_err());

		data.links[0].target = Endpoint::Id(NodeId(9));
		assert!(GraphStore::from_data(&data, Point::default()).is_err());
	}
}
