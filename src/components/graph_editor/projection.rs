//! Pure mapping from graph, selection and gesture state to render primitives.
//!
//! Primitives are keyed by node id and edge key so two scenes can be diffed
//! entity by entity; the painter only has to redraw when the diff is
//! non-empty.

use std::collections::BTreeMap;

use super::color::Rgb;
use super::config::EditorConfig;
use super::geometry::{Point, Segment, trim_edge};
use super::interaction::{DragLine, Selection};
use super::store::GraphStore;
use super::types::{Edge, EdgeKey, Node, NodeId};
use super::viewport::ViewTransform;

const MAX_LABEL_LINES: usize = 3;
const LABEL_LINE_HEIGHT: f64 = 12.0;
const DROP_TARGET_SCALE: f64 = 1.1;
const DARK_BACKGROUND: Rgb = Rgb::new(0x1a, 0x1a, 0x2e);

/// Arrowhead variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
	StartArrow,
	EndArrow,
	/// End arrow of an edge whose endpoints are both highlighted.
	EndArrowHighlighted,
}

impl Marker {
	pub fn color(self) -> Rgb {
		match self {
			Marker::StartArrow => Rgb::new(0xef, 0xef, 0xef),
			Marker::EndArrow => Rgb::new(0xe5, 0xe5, 0xe5),
			Marker::EndArrowHighlighted => Rgb::new(0x4a, 0x4a, 0x4a),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelLine {
	pub text: String,
	/// Baseline offset from the node center.
	pub baseline: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodePrimitive {
	pub id: NodeId,
	pub center: Point,
	pub radius: f64,
	pub scale: f64,
	pub fill: Rgb,
	pub stroke: Rgb,
	pub reflexive: bool,
	pub selected: bool,
	pub highlighted: bool,
	pub label: Vec<LabelLine>,
	pub label_color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgePrimitive {
	pub key: EdgeKey,
	pub segment: Segment,
	pub selected: bool,
	pub highlighted: bool,
	pub marker_start: Option<Marker>,
	pub marker_end: Option<Marker>,
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub transform: ViewTransform,
	pub background: Rgb,
	pub edges: BTreeMap<EdgeKey, EdgePrimitive>,
	pub nodes: BTreeMap<NodeId, NodePrimitive>,
	/// Connect preview, ending in an [`Marker::EndArrow`].
	pub drag_line: Option<Segment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveKey {
	Edge(EdgeKey),
	Node(NodeId),
	DragLine,
}

/// Per-primitive changes between two scenes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDiff {
	pub added: Vec<PrimitiveKey>,
	pub updated: Vec<PrimitiveKey>,
	pub removed: Vec<PrimitiveKey>,
	/// Pan/zoom or background changed.
	pub frame_changed: bool,
}

impl SceneDiff {
	pub fn is_empty(&self) -> bool {
		!self.frame_changed
			&& self.added.is_empty()
			&& self.updated.is_empty()
			&& self.removed.is_empty()
	}

	fn compare<K: Ord + Copy, V: PartialEq>(
		&mut self,
		before: &BTreeMap<K, V>,
		after: &BTreeMap<K, V>,
		key: impl Fn(K) -> PrimitiveKey,
	) {
		for (k, v) in after {
			match before.get(k) {
				None => self.added.push(key(*k)),
				Some(old) if old != v => self.updated.push(key(*k)),
				Some(_) => {}
			}
		}
		self.removed.extend(
			before
				.keys()
				.filter(|k| !after.contains_key(*k))
				.map(|k| key(*k)),
		);
	}
}

impl Scene {
	/// Changes needed to turn `previous` into `self`.
	pub fn diff(&self, previous: &Scene) -> SceneDiff {
		let mut diff = SceneDiff {
			frame_changed: self.transform != previous.transform
				|| self.background != previous.background,
			..SceneDiff::default()
		};
		diff.compare(&previous.edges, &self.edges, PrimitiveKey::Edge);
		diff.compare(&previous.nodes, &self.nodes, PrimitiveKey::Node);
		match (&previous.drag_line, &self.drag_line) {
			(None, Some(_)) => diff.added.push(PrimitiveKey::DragLine),
			(Some(_), None) => diff.removed.push(PrimitiveKey::DragLine),
			(Some(a), Some(b)) if a != b => diff.updated.push(PrimitiveKey::DragLine),
			_ => {}
		}
		diff
	}
}

/// Splits a label on `-`, `_` and whitespace into at most three lines,
/// stacked upwards from the last one.
pub fn wrap_label(name: &str) -> Vec<LabelLine> {
	if name.is_empty() {
		return Vec::new();
	}
	let parts: Vec<&str> = name
		.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
		.take(MAX_LABEL_LINES)
		.collect();
	let n = parts.len();
	let bottom = 5.0 * n as f64;
	parts
		.into_iter()
		.enumerate()
		.map(|(i, text)| LabelLine {
			text: text.to_string(),
			baseline: bottom - LABEL_LINE_HEIGHT * (n - 1 - i) as f64,
		})
		.collect()
}

fn node_fill(node: &Node, emphasized: bool, config: &EditorConfig) -> Rgb {
	let color = config.colors.get(&node.kind);
	match (emphasized, config.inverted) {
		(true, true) => color,
		(true, false) if color.is_light() => color.brighter(0.8),
		(true, false) => color.brighter(1.7),
		(false, true) => Rgb::WHITE,
		(false, false) => color,
	}
}

fn node_stroke(node: &Node, config: &EditorConfig) -> Rgb {
	let color = config.colors.get(&node.kind);
	if config.inverted { color } else { color.darker(1.0) }
}

fn label_color(node: &Node, emphasized: bool, config: &EditorConfig) -> Rgb {
	if config.inverted && !emphasized {
		config.colors.get(&node.kind)
	} else {
		Rgb::WHITE
	}
}

/// Trimmed line of an edge between its endpoints' current positions.
pub(crate) fn edge_segment(store: &GraphStore, edge: &Edge) -> Option<Segment> {
	let source = store.node(edge.source())?;
	let target = store.node(edge.target())?;
	Some(trim_edge(
		source.position(),
		target.position(),
		edge.left,
		edge.right,
	))
}

pub fn project(
	store: &GraphStore,
	selection: Selection,
	drag_line: Option<DragLine>,
	config: &EditorConfig,
	transform: ViewTransform,
) -> Scene {
	let drop_target = drag_line.and_then(|line| line.drop_target);

	let nodes = store
		.nodes()
		.iter()
		.map(|node| {
			let selected = selection == Selection::Node(node.id());
			let emphasized = selected || node.highlighted;
			let primitive = NodePrimitive {
				id: node.id(),
				center: node.position(),
				radius: config.radius,
				scale: if drop_target == Some(node.id()) {
					DROP_TARGET_SCALE
				} else {
					1.0
				},
				fill: node_fill(node, emphasized, config),
				stroke: node_stroke(node, config),
				reflexive: node.reflexive,
				selected,
				highlighted: node.highlighted,
				label: node.name.as_deref().map(wrap_label).unwrap_or_default(),
				label_color: label_color(node, emphasized, config),
			};
			(node.id(), primitive)
		})
		.collect();

	let edges = store
		.edges()
		.iter()
		.filter_map(|edge| {
			let segment = edge_segment(store, edge)?;
			let highlighted = [edge.source(), edge.target()]
				.iter()
				.all(|&id| store.node(id).is_some_and(|n| n.highlighted));
			let marker_end = match (edge.right, highlighted) {
				(false, _) => None,
				(true, true) => Some(Marker::EndArrowHighlighted),
				(true, false) => Some(Marker::EndArrow),
			};
			let primitive = EdgePrimitive {
				key: edge.key(),
				segment,
				selected: selection == Selection::Edge(edge.key()),
				highlighted,
				marker_start: edge.left.then_some(Marker::StartArrow),
				marker_end,
			};
			Some((edge.key(), primitive))
		})
		.collect();

	let drag_line = drag_line.and_then(|line| {
		let origin = store.node(line.origin)?;
		Some(Segment {
			from: origin.position(),
			to: line.pointer,
		})
	});

	Scene {
		transform,
		background: if config.inverted {
			Rgb::WHITE
		} else {
			DARK_BACKGROUND
		},
		edges,
		nodes,
		drag_line,
	}
}
