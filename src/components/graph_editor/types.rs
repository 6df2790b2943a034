use std::fmt;

use anyhow::Context;
use serde::Deserialize;

use super::geometry::Point;

/// Kind given to nodes created on the canvas.
pub const NEW_NODE_KIND: &str = "new";

/// Identifier of a node, unique within one editor instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A vertex of the graph.
///
/// The id and the position are read-only outside the editor core: ids are
/// issued by the store and positions belong to the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub(crate) id: NodeId,
	/// Category tag, used for the color lookup.
	pub kind: String,
	/// Display label.
	pub name: Option<String>,
	/// Self-loop flag, drawn as a heavier outline.
	pub reflexive: bool,
	/// Set by the host, independent of selection.
	pub highlighted: bool,
	pub(crate) x: f64,
	pub(crate) y: f64,
}

impl Node {
	pub(crate) fn new(id: NodeId, kind: impl Into<String>, position: Point) -> Self {
		Self {
			id,
			kind: kind.into(),
			name: None,
			reflexive: false,
			highlighted: false,
			x: position.x,
			y: position.y,
		}
	}

	/// The node's identifier.
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Current simulated position in graph space.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Identity of an edge: its canonically ordered endpoint pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
	source: NodeId,
	target: NodeId,
}

impl EdgeKey {
	/// Orders `a` and `b` so the lower id is the source. Returns `None` when
	/// both ends are the same node.
	pub fn new(a: NodeId, b: NodeId) -> Option<Self> {
		match a.cmp(&b) {
			std::cmp::Ordering::Less => Some(Self { source: a, target: b }),
			std::cmp::Ordering::Greater => Some(Self { source: b, target: a }),
			std::cmp::Ordering::Equal => None,
		}
	}

	/// The lower-id endpoint.
	pub fn source(&self) -> NodeId {
		self.source
	}

	/// The higher-id endpoint.
	pub fn target(&self) -> NodeId {
		self.target
	}

	/// Whether `id` is one of the two endpoints.
	pub fn touches(&self, id: NodeId) -> bool {
		self.source == id || self.target == id
	}
}

impl fmt::Display for EdgeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.source, self.target)
	}
}

/// A connector between two nodes, stored in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub(crate) key: EdgeKey,
	/// Arrow drawn at the source end.
	pub left: bool,
	/// Arrow drawn at the target end.
	pub right: bool,
}

impl Edge {
	pub(crate) fn new(key: EdgeKey) -> Self {
		Self {
			key,
			left: false,
			right: false,
		}
	}

	/// The edge's identity.
	pub fn key(&self) -> EdgeKey {
		self.key
	}

	/// The lower-id endpoint.
	pub fn source(&self) -> NodeId {
		self.key.source
	}

	/// The higher-id endpoint.
	pub fn target(&self) -> NodeId {
		self.key.target
	}
}

/// Which end of a `connect(a, b, ..)` call receives the arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	/// Arrow at `b`.
	Forward,
	/// Arrow at `a`.
	Backward,
}

/// Arrow layouts reachable from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeArrows {
	Both,
	LeftOnly,
	RightOnly,
}

impl EdgeArrows {
	pub(crate) fn flags(self) -> (bool, bool) {
		match self {
			EdgeArrows::Both => (true, true),
			EdgeArrows::LeftOnly => (true, false),
			EdgeArrows::RightOnly => (false, true),
		}
	}
}

/// Graph supplied by the host.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<NodeData>,
	#[serde(default)]
	pub links: Vec<LinkData>,
}

impl GraphData {
	/// Parses the `{ "nodes": [..], "links": [..] }` load format.
	pub fn from_json(json: &str) -> anyhow::Result<Self> {
		serde_json::from_str(json).context("failed to parse graph JSON")
	}
}

/// A node as described by the host.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeData {
	pub id: NodeId,
	#[serde(rename = "type", default = "default_kind")]
	pub kind: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub reflexive: bool,
	#[serde(default)]
	pub highlighted: bool,
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
}

fn default_kind() -> String {
	NEW_NODE_KIND.to_string()
}

/// How a link names one of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
	/// Position in the `nodes` array.
	Index(usize),
	/// A node id.
	Id(NodeId),
}

/// A link as described by the host, endpoints not yet resolved.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawLink")]
pub struct LinkData {
	pub source: Endpoint,
	pub target: Endpoint,
	pub left: bool,
	pub right: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLink {
	source_index: Option<usize>,
	target_index: Option<usize>,
	source: Option<NodeId>,
	target: Option<NodeId>,
	#[serde(default)]
	left: bool,
	#[serde(default)]
	right: bool,
}

fn endpoint(index: Option<usize>, id: Option<NodeId>, side: &str) -> Result<Endpoint, String> {
	match (index, id) {
		(Some(index), None) => Ok(Endpoint::Index(index)),
		(None, Some(id)) => Ok(Endpoint::Id(id)),
		(Some(_), Some(_)) => Err(format!("link {side} is given both by index and by id")),
		(None, None) => Err(format!("link has no {side}")),
	}
}

impl TryFrom<RawLink> for LinkData {
	type Error = String;

	fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
		Ok(Self {
			source: endpoint(raw.source_index, raw.source, "source")?,
			target: endpoint(raw.target_index, raw.target, "target")?,
			left: raw.left,
			right: raw.right,
		})
	}
}

/// Flag overrides pushed by the host before a render pass.
///
/// Each node's flag becomes whether its id is listed; a missing list clears
/// the flag on every node.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Mutations {
	#[serde(default)]
	pub highlighted: Option<Vec<NodeId>>,
	#[serde(default)]
	pub reflexive: Option<Vec<NodeId>>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edge_key_is_canonical() {
		let key = EdgeKey::new(NodeId(7), NodeId(2)).unwrap();
		assert_eq!(key.source(), NodeId(2));
		assert_eq!(key.target(), NodeId(7));
		assert!(key.touches(NodeId(7)));
		assert!(!key.touches(NodeId(3)));
		assert_eq!(EdgeKey::new(NodeId(4), NodeId(4)), None);
	}

	#[test]
	fn links_accept_index_and_id_endpoints() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [{"id": 0, "type": "person", "name": "John"}, {"id": 3}],
				"links": [
					{"sourceIndex": 0, "targetIndex": 1, "right": true},
					{"source": 3, "target": 0}
				]
			}"#,
		)
		.unwrap();

		assert_eq!(data.nodes[1].kind, NEW_NODE_KIND);
		assert_eq!(data.links[0].source, Endpoint::Index(0));
		assert!(data.links[0].right);
		assert_eq!(data.links[1].source, Endpoint::Id(NodeId(3)));
		assert!(!data.links[1].left);
	}

	#[test]
	fn link_without_endpoint_is_rejected() {
		let err = GraphData::from_json(r#"{"nodes": [], "links": [{"sourceIndex": 0}]}"#)
			.unwrap_err();
		assert!(format!("{err:#}").contains("no target"), "got: {err:#}");
	}
}
