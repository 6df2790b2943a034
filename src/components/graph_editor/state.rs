use anyhow::Result;
use log::{debug, error, info};

use super::config::EditorConfig;
use super::geometry::Point;
use super::interaction::{
	Interaction, InteractionState, Key, Outcome, PointerInput, Selection, Surface, WheelInput,
};
use super::layout::LayoutEngine;
use super::projection::{Scene, project};
use super::store::GraphStore;
use super::types::{GraphData, Mutations, Node, NodeId};
use super::viewport::ViewTransform;

/// Handle returned by [`EditorState::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(Option<&Node>)>;

/// One mounted editor: graph, layout, input state and selection observers.
///
/// Instances share nothing, so several editors can live on one page.
pub struct EditorState {
	store: GraphStore,
	layout: LayoutEngine,
	interaction: Interaction,
	transform: ViewTransform,
	config: EditorConfig,
	observers: Vec<(SubscriptionId, Observer)>,
	next_subscription: u64,
	pub width: f64,
	pub height: f64,
}

impl EditorState {
	/// Loads `data` into a fresh editor with a `width` x `height` viewport.
	pub fn new(data: &GraphData, config: EditorConfig, width: f64, height: f64) -> Result<Self> {
		let center = Point::new(width / 2.0, height / 2.0);
		let store = GraphStore::from_data(data, center)?;
		info!(
			"graph editor created: {} nodes, {} edges, editable={}",
			store.nodes().len(),
			store.edges().len(),
			config.editable
		);
		Ok(Self {
			layout: LayoutEngine::new(&config, width, height),
			interaction: Interaction::new(config.editable),
			transform: ViewTransform::default(),
			observers: Vec::new(),
			next_subscription: 0,
			store,
			config,
			width,
			height,
		})
	}

	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	pub fn layout(&self) -> &LayoutEngine {
		&self.layout
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn selection(&self) -> Selection {
		self.interaction.selection()
	}

	pub fn selected_node(&self) -> Option<&Node> {
		self.selection().node().and_then(|id| self.store.node(id))
	}

	pub fn state(&self) -> InteractionState {
		self.interaction.state()
	}

	/// True once the layout has cooled down and no structural change is
	/// waiting for it.
	pub fn is_settled(&self) -> bool {
		self.layout.is_settled() && self.layout.is_synced(&self.store)
	}

	/// Runs one layout step.
	pub fn tick(&mut self, dt: f32) {
		self.layout.step(&mut self.store, dt);
	}

	/// Projects the current state to render primitives.
	pub fn scene(&self) -> Scene {
		project(
			&self.store,
			self.interaction.selection(),
			self.interaction.drag_line(),
			&self.config,
			self.transform,
		)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout.resize(width, height);
	}

	/// Registers a handler for node selection changes. It receives the newly
	/// selected node, or `None` when the selection is cleared.
	pub fn subscribe(&mut self, handler: impl FnMut(Option<&Node>) + 'static) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription);
		self.next_subscription += 1;
		self.observers.push((id, Box::new(handler)));
		id
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.observers.len();
		self.observers.retain(|(sub, _)| *sub != id);
		self.observers.len() != before
	}

	fn notify(&mut self, id: Option<NodeId>) {
		let node = id.and_then(|id| self.store.node(id));
		for (_, observer) in &mut self.observers {
			observer(node);
		}
	}

	fn dispatch(
		&mut self,
		handler: impl FnOnce(&mut Interaction, &mut Surface<'_>) -> Outcome,
	) -> bool {
		let mut surface = Surface {
			store: &mut self.store,
			layout: &mut self.layout,
			transform: &mut self.transform,
			config: &self.config,
			viewport: (self.width, self.height),
		};
		let outcome = handler(&mut self.interaction, &mut surface);
		if let Some(selected) = outcome.notify {
			self.notify(selected);
		}
		outcome.changed
	}

	pub fn pointer_down(&mut self, input: PointerInput) -> bool {
		self.dispatch(|i, s| i.pointer_down(s, input))
	}

	pub fn pointer_move(&mut self, input: PointerInput) -> bool {
		self.dispatch(|i, s| i.pointer_move(s, input))
	}

	pub fn pointer_up(&mut self, input: PointerInput) -> bool {
		self.dispatch(|i, s| i.pointer_up(s, input))
	}

	pub fn pointer_leave(&mut self) -> bool {
		self.dispatch(|i, s| i.pointer_leave(s))
	}

	pub fn wheel(&mut self, input: WheelInput) -> bool {
		self.dispatch(|i, s| i.wheel(s, input))
	}

	pub fn key_down(&mut self, key: Key) -> bool {
		self.dispatch(|i, s| i.key_down(s, key))
	}

	pub fn key_up(&mut self, key: Key) -> bool {
		self.dispatch(|i, s| i.key_up(s, key))
	}

	/// Call when the surface loses focus and key-up events may be lost.
	pub fn release_keys(&mut self) -> bool {
		self.dispatch(|i, s| i.release_keys(s))
	}

	/// Lets the host edit node flags and labels before the next frame.
	pub fn update(&mut self, f: impl FnOnce(&mut [Node])) {
		f(self.store.nodes_mut());
		debug!("host update applied");
	}

	/// Sets `highlighted` and `reflexive` on every node from the id lists.
	pub fn apply_mutations(&mut self, mutations: &Mutations) {
		let listed = |list: &Option<Vec<NodeId>>, id: NodeId| {
			list.as_ref().is_some_and(|ids| ids.contains(&id))
		};
		self.update(|nodes| {
			for node in nodes {
				node.highlighted = listed(&mutations.highlighted, node.id);
				node.reflexive = listed(&mutations.reflexive, node.id);
			}
		});
	}

	/// Edits a single node and reports it to the selection observers.
	pub fn update_node(&mut self, id: NodeId, f: impl FnOnce(&mut Node)) -> bool {
		let Some(node) = self.store.node_mut(id) else {
			error!("cannot find node {id} in the graph");
			return false;
		};
		f(node);
		debug!("updated node {id}");
		self.notify(Some(id));
		true
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	const NETWORK: &str = r#"{
		"nodes": [
			{"id": 0, "type": "person", "name": "John", "x": 100, "y": 100},
			{"id": 1, "type": "person", "name": "Eddie", "x": 300, "y": 100},
			{"id": 3, "type": "movie", "name": "Matrix I", "x": 100, "y": 300}
		],
		"links": [{"sourceIndex": 0, "targetIndex": 2, "right": true}]
	}"#;

	fn editor(editable: bool) -> EditorState {
		let data = GraphData::from_json(NETWORK).unwrap();
		let config = EditorConfig {
			editable,
			..EditorConfig::default()
		};
		EditorState::new(&data, config, 800.0, 600.0).unwrap()
	}

	fn record(editor: &mut EditorState) -> (SubscriptionId, Rc<RefCell<Vec<Option<NodeId>>>>) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let id = editor.subscribe(move |node| sink.borrow_mut().push(node.map(|n| n.id())));
		(id, seen)
	}

	#[test]
	fn every_observer_hears_node_selection() {
		let mut editor = editor(false);
		let (first, a) = record(&mut editor);
		let (_, b) = record(&mut editor);

		editor.pointer_down(PointerInput::at(300.0, 100.0));
		editor.pointer_up(PointerInput::at(300.0, 100.0));
		assert_eq!(*a.borrow(), vec![Some(NodeId(1))]);
		assert_eq!(*b.borrow(), vec![Some(NodeId(1))]);
		assert_eq!(editor.selected_node().unwrap().name.as_deref(), Some("Eddie"));

		assert!(editor.unsubscribe(first));
		assert!(!editor.unsubscribe(first));
		editor.pointer_down(PointerInput::at(300.0, 100.0));
		assert_eq!(a.borrow().len(), 1);
		assert_eq!(*b.borrow(), vec![Some(NodeId(1)), None]);
	}

	#[test]
	fn deleting_the_selected_node_reports_none() {
		let mut editor = editor(true);
		let (_, seen) = record(&mut editor);
		editor.pointer_down(PointerInput::at(100.0, 300.0));
		editor.pointer_up(PointerInput::at(100.0, 300.0));
		editor.key_down(Key::Delete);

		assert_eq!(*seen.borrow(), vec![Some(NodeId(3)), None]);
		assert!(editor.store().edges().is_empty());
		assert_eq!(editor.state(), InteractionState::Idle);
	}

	#[test]
	fn mutations_set_flags_from_id_lists() {
		let mut editor = editor(false);
		editor.apply_mutations(&Mutations {
			highlighted: Some(vec![NodeId(1), NodeId(3)]),
			reflexive: None,
		});
		let flags: Vec<_> = editor
			.store()
			.nodes()
			.iter()
			.map(|n| (n.id(), n.highlighted, n.reflexive))
			.collect();
		assert_eq!(
			flags,
			vec![
				(NodeId(0), false, false),
				(NodeId(1), true, false),
				(NodeId(3), true, false),
			]
		);

		let scene = editor.scene();
		assert!(scene.nodes[&NodeId(3)].highlighted);
		assert!(!scene.edges.values().next().unwrap().highlighted);
	}

	#[test]
	fn loaded_flags_survive_until_the_host_mutates() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [{"id": 0, "reflexive": true}, {"id": 1, "highlighted": true}],
				"links": [{"source": 1, "target": 1}]
			}"#,
		)
		.unwrap();
		let mut editor = EditorState::new(&data, EditorConfig::default(), 800.0, 600.0).unwrap();
		for _ in 0..5 {
			editor.tick(0.016);
		}
		let flags: Vec<_> = editor
			.store()
			.nodes()
			.iter()
			.map(|n| (n.reflexive, n.highlighted))
			.collect();
		assert_eq!(flags, vec![(true, false), (true, true)]);
	}

	#[test]
	fn update_node_notifies_and_ignores_unknown_ids() {
		let mut editor = editor(false);
		let (_, seen) = record(&mut editor);
		assert!(editor.update_node(NodeId(0), |n| n.name = Some("Neo".into())));
		assert!(!editor.update_node(NodeId(42), |n| n.name = None));
		assert_eq!(*seen.borrow(), vec![Some(NodeId(0))]);
		assert_eq!(
			editor.store().node(NodeId(0)).unwrap().name.as_deref(),
			Some("Neo")
		);
	}

	#[test]
	fn structural_change_wakes_a_settled_layout() {
		let mut editor = editor(true);
		while !editor.is_settled() {
			editor.tick(0.016);
		}
		editor.pointer_down(PointerInput::at(700.0, 500.0));
		assert!(!editor.is_settled());
		editor.tick(0.016);
		assert_eq!(editor.store().nodes().len(), 4);
		assert!(!editor.is_settled());
	}

	#[test]
	fn instances_do_not_share_state() {
		let mut a = editor(true);
		let b = editor(true);
		a.pointer_down(PointerInput::at(700.0, 500.0));
		assert_eq!(a.store().nodes().len(), 4);
		assert_eq!(b.store().nodes().len(), 3);
	}
}
