//! Pointer and keyboard interpretation.
//!
//! Raw input arrives in screen space together with the modifier state. Shift
//! (held or reported by the event) routes pointer input to pan/zoom, Ctrl
//! routes it to moving nodes, and otherwise a press is resolved against
//! nodes, then edges, then the empty canvas.

use std::collections::HashSet;

use log::debug;

use super::config::EditorConfig;
use super::geometry::Point;
use super::layout::LayoutEngine;
use super::projection::edge_segment;
use super::store::GraphStore;
use super::types::{Direction, EdgeArrows, EdgeKey, NodeId};
use super::viewport::ViewTransform;

/// Pointer distance (graph units) within which an edge counts as hit.
const EDGE_HIT_TOLERANCE: f64 = 6.0;

/// Keys the editor reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
	Backspace,
	Delete,
	/// Arrows at both ends.
	B,
	/// Arrow at the source end only.
	L,
	/// Arrow at the target end only, or toggle reflexive on a node.
	R,
	Shift,
	Control,
	Other(String),
}

impl Key {
	/// Maps a DOM `KeyboardEvent.key` value.
	pub fn from_dom(key: &str) -> Self {
		match key {
			"Backspace" => Key::Backspace,
			"Delete" => Key::Delete,
			"b" | "B" => Key::B,
			"l" | "L" => Key::L,
			"r" | "R" => Key::R,
			"Shift" => Key::Shift,
			"Control" => Key::Control,
			other => Key::Other(other.to_string()),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	pub shift: bool,
	pub ctrl: bool,
}

/// A pointer event in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	pub position: Point,
	pub modifiers: Modifiers,
}

impl PointerInput {
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			position: Point::new(x, y),
			modifiers: Modifiers::default(),
		}
	}

	pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = modifiers;
		self
	}
}

/// A wheel notch in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelInput {
	pub position: Point,
	pub delta_y: f64,
	pub modifiers: Modifiers,
}

/// The selected element, if any. Node and edge selection exclude each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Node(NodeId),
	Edge(EdgeKey),
}

impl Selection {
	pub fn node(&self) -> Option<NodeId> {
		match self {
			Selection::Node(id) => Some(*id),
			_ => None,
		}
	}

	pub fn edge(&self) -> Option<EdgeKey> {
		match self {
			Selection::Edge(key) => Some(*key),
			_ => None,
		}
	}
}

/// Coarse state of the editor as seen by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
	Idle,
	NodeSelected,
	EdgeSelected,
	DraggingNewEdge,
	PanningZooming,
	MovingNode,
}

/// Preview line of a connect gesture, from the origin node to the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragLine {
	pub origin: NodeId,
	/// Pointer position in graph space.
	pub pointer: Point,
	/// Node under the pointer that would become the other end.
	pub drop_target: Option<NodeId>,
}

/// Effects of one input event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
	/// Something visible changed.
	pub changed: bool,
	/// The node selection changed to this value; observers must be told.
	pub notify: Option<Option<NodeId>>,
}

impl Outcome {
	fn changed() -> Self {
		Self {
			changed: true,
			notify: None,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Connect(DragLine),
	EdgePress(EdgeKey),
	Pan {
		start: Point,
		from: (f64, f64),
	},
	Move(NodeId),
}

enum Hit {
	Node(NodeId),
	Edge(EdgeKey),
	Canvas,
}

/// Everything an input handler may read or mutate.
pub(crate) struct Surface<'a> {
	pub store: &'a mut GraphStore,
	pub layout: &'a mut LayoutEngine,
	pub transform: &'a mut ViewTransform,
	pub config: &'a EditorConfig,
	pub viewport: (f64, f64),
}

/// Selection, gesture and key state of one editor.
#[derive(Debug)]
pub struct Interaction {
	editable: bool,
	selection: Selection,
	gesture: Gesture,
	held: HashSet<Key>,
	zooming: bool,
	moving: bool,
}

impl Interaction {
	pub fn new(editable: bool) -> Self {
		Self {
			editable,
			selection: Selection::None,
			gesture: Gesture::Idle,
			held: HashSet::new(),
			zooming: false,
			moving: false,
		}
	}

	pub fn selection(&self) -> Selection {
		self.selection
	}

	pub fn state(&self) -> InteractionState {
		match self.gesture {
			Gesture::Pan { .. } => return InteractionState::PanningZooming,
			Gesture::Move(_) => return InteractionState::MovingNode,
			Gesture::Connect(_) if self.editable => return InteractionState::DraggingNewEdge,
			_ => {}
		}
		if self.zooming {
			return InteractionState::PanningZooming;
		}
		match self.selection {
			Selection::None => InteractionState::Idle,
			Selection::Node(_) => InteractionState::NodeSelected,
			Selection::Edge(_) => InteractionState::EdgeSelected,
		}
	}

	/// The connect preview, shown only while editing is enabled.
	pub fn drag_line(&self) -> Option<DragLine> {
		match self.gesture {
			Gesture::Connect(line) if self.editable => Some(line),
			_ => None,
		}
	}

	fn zoom_mode(&self, modifiers: Modifiers) -> bool {
		self.zooming || modifiers.shift
	}

	fn move_mode(&self, modifiers: Modifiers) -> bool {
		self.moving || modifiers.ctrl
	}

	fn node_at(surface: &Surface<'_>, p: Point) -> Option<NodeId> {
		let radius = surface.config.radius;
		surface
			.store
			.nodes()
			.iter()
			.rev()
			.find(|n| n.position().distance(p) <= radius)
			.map(|n| n.id())
	}

	fn hit_test(surface: &Surface<'_>, p: Point) -> Hit {
		if let Some(id) = Self::node_at(surface, p) {
			return Hit::Node(id);
		}
		let store = &*surface.store;
		store
			.edges()
			.iter()
			.rev()
			.find(|e| {
				edge_segment(store, e).is_some_and(|s| s.distance_to(p) <= EDGE_HIT_TOLERANCE)
			})
			.map_or(Hit::Canvas, |e| Hit::Edge(e.key()))
	}

	/// Turns an in-flight node or edge press into a pan starting at `at`, or
	/// at the drag line's end when no pointer position is known.
	fn hand_over_to_pan(&mut self, surface: &Surface<'_>, at: Option<Point>) -> bool {
		let start = match (self.gesture, at) {
			(Gesture::Connect(line), None) => surface.transform.graph_to_screen(line.pointer),
			(Gesture::Connect(_) | Gesture::EdgePress(_), Some(p)) => p,
			(Gesture::EdgePress(_), None) => {
				self.gesture = Gesture::Idle;
				return false;
			}
			_ => return false,
		};
		let t = &*surface.transform;
		self.gesture = Gesture::Pan {
			start,
			from: (t.x, t.y),
		};
		debug!("pointer press handed over to panning");
		true
	}

	/// Drops the in-flight gesture, releasing a moved node.
	fn cancel_gesture(&mut self, surface: &mut Surface<'_>) -> bool {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => false,
			Gesture::Move(id) => {
				surface.layout.unpin(id);
				true
			}
			_ => true,
		}
	}

	pub(crate) fn pointer_down(&mut self, surface: &mut Surface<'_>, input: PointerInput) -> Outcome {
		self.cancel_gesture(surface);
		if self.zoom_mode(input.modifiers) {
			let t = &*surface.transform;
			self.gesture = Gesture::Pan {
				start: input.position,
				from: (t.x, t.y),
			};
			return Outcome::default();
		}

		let point = surface.transform.screen_to_graph(input.position);
		let hit = Self::hit_test(surface, point);
		if self.move_mode(input.modifiers) {
			let Hit::Node(id) = hit else {
				return Outcome::default();
			};
			surface.layout.pin(surface.store, id, point);
			self.gesture = Gesture::Move(id);
			return Outcome::changed();
		}

		match hit {
			Hit::Node(id) => {
				self.selection = if self.selection == Selection::Node(id) {
					Selection::None
				} else {
					Selection::Node(id)
				};
				self.gesture = Gesture::Connect(DragLine {
					origin: id,
					pointer: point,
					drop_target: None,
				});
				debug!("pointer down on node {id}, selection {:?}", self.selection);
				Outcome {
					changed: true,
					notify: Some(self.selection.node()),
				}
			}
			Hit::Edge(key) => {
				self.selection = if self.selection == Selection::Edge(key) {
					Selection::None
				} else {
					Selection::Edge(key)
				};
				self.gesture = Gesture::EdgePress(key);
				debug!("pointer down on edge {key}, selection {:?}", self.selection);
				Outcome::changed()
			}
			Hit::Canvas if self.editable => {
				surface.store.add_node(point);
				Outcome::changed()
			}
			Hit::Canvas => Outcome::default(),
		}
	}

	pub(crate) fn pointer_move(&mut self, surface: &mut Surface<'_>, input: PointerInput) -> Outcome {
		if self.zoom_mode(input.modifiers) {
			self.hand_over_to_pan(surface, Some(input.position));
		}
		let point = surface.transform.screen_to_graph(input.position);
		match self.gesture {
			Gesture::Pan { start, from } => {
				let delta = input.position - start;
				surface
					.transform
					.pan_to(from.0 + delta.x, from.1 + delta.y, surface.viewport);
				Outcome::changed()
			}
			Gesture::Move(id) => {
				surface.layout.pin(surface.store, id, point);
				Outcome::changed()
			}
			Gesture::Connect(line) if self.editable => {
				let hovered = Self::node_at(surface, point).filter(|&id| id != line.origin);
				self.gesture = Gesture::Connect(DragLine {
					pointer: point,
					drop_target: hovered,
					..line
				});
				Outcome::changed()
			}
			_ => Outcome::default(),
		}
	}

	pub(crate) fn pointer_up(&mut self, surface: &mut Surface<'_>, input: PointerInput) -> Outcome {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle | Gesture::Pan { .. } | Gesture::EdgePress(_) => Outcome::default(),
			Gesture::Move(id) => {
				surface.layout.unpin(id);
				Outcome::changed()
			}
			Gesture::Connect(_) if !self.editable => Outcome::default(),
			Gesture::Connect(line) => {
				let point = surface.transform.screen_to_graph(input.position);
				let target = Self::node_at(surface, point).filter(|&id| id != line.origin);
				if let Some(target) = target {
					if let Some(key) = surface.store.connect(line.origin, target, Direction::Forward) {
						self.selection = Selection::Edge(key);
					}
				}
				Outcome::changed()
			}
		}
	}

	/// The pointer left the surface: every gesture ends without effect.
	pub(crate) fn pointer_leave(&mut self, surface: &mut Surface<'_>) -> Outcome {
		Outcome {
			changed: self.cancel_gesture(surface),
			notify: None,
		}
	}

	pub(crate) fn wheel(&mut self, surface: &mut Surface<'_>, input: WheelInput) -> Outcome {
		if !self.zoom_mode(input.modifiers) {
			return Outcome::default();
		}
		surface
			.transform
			.zoom_at(input.position, input.delta_y, surface.viewport);
		Outcome::changed()
	}

	pub(crate) fn key_down(&mut self, surface: &mut Surface<'_>, key: Key) -> Outcome {
		if !self.held.insert(key.clone()) {
			return Outcome::default();
		}
		match key {
			Key::Shift => {
				debug!("entering zoom mode");
				self.zooming = true;
				Outcome {
					changed: self.hand_over_to_pan(surface, None),
					notify: None,
				}
			}
			Key::Control => {
				self.moving = true;
				Outcome::default()
			}
			_ if !self.editable => Outcome::default(),
			Key::Backspace | Key::Delete => self.delete_selection(surface),
			Key::B => self.set_arrows(surface, EdgeArrows::Both),
			Key::L => self.set_arrows(surface, EdgeArrows::LeftOnly),
			Key::R => match self.selection {
				Selection::Node(id) => Outcome {
					changed: surface.store.toggle_reflexive(id),
					notify: None,
				},
				_ => self.set_arrows(surface, EdgeArrows::RightOnly),
			},
			Key::Other(_) => Outcome::default(),
		}
	}

	pub(crate) fn key_up(&mut self, surface: &mut Surface<'_>, key: Key) -> Outcome {
		self.held.remove(&key);
		let ends = match key {
			Key::Shift => {
				self.zooming = false;
				matches!(self.gesture, Gesture::Pan { .. })
			}
			Key::Control => {
				self.moving = false;
				matches!(self.gesture, Gesture::Move(_))
			}
			_ => false,
		};
		Outcome {
			changed: ends && self.cancel_gesture(surface),
			notify: None,
		}
	}

	/// Forgets held keys, e.g. after the surface lost focus and missed the
	/// key-up events.
	pub(crate) fn release_keys(&mut self, surface: &mut Surface<'_>) -> Outcome {
		for key in [Key::Shift, Key::Control] {
			if self.held.contains(&key) {
				self.key_up(surface, key);
			}
		}
		self.held.clear();
		self.zooming = false;
		self.moving = false;
		Outcome::default()
	}

	fn delete_selection(&mut self, surface: &mut Surface<'_>) -> Outcome {
		let outcome = match self.selection {
			Selection::None => return Outcome::default(),
			Selection::Node(id) => {
				surface.store.remove_node(id);
				Outcome {
					changed: true,
					notify: Some(None),
				}
			}
			Selection::Edge(key) => {
				surface.store.remove_edge(key);
				Outcome::changed()
			}
		};
		self.selection = Selection::None;
		if !matches!(self.gesture, Gesture::Pan { .. }) {
			self.cancel_gesture(surface);
		}
		outcome
	}

	fn set_arrows(&mut self, surface: &mut Surface<'_>, arrows: EdgeArrows) -> Outcome {
		match self.selection {
			Selection::Edge(key) => Outcome {
				changed: surface.store.set_edge_arrows(key, arrows),
				notify: None,
			},
			_ => Outcome::default(),
		}
	}
}
