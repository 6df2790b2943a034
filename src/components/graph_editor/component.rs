use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, trace, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::config::EditorConfig;
use super::interaction::{Key, Modifiers, PointerInput, WheelInput};
use super::projection::Scene;
use super::render;
use super::state::EditorState;
use super::types::{GraphData, Mutations, Node, NodeId};

const FRAME_DT: f32 = 0.016;

type Shared<T> = Rc<RefCell<Option<T>>>;

/// Shared access to a mounted editor for the hosting page.
#[derive(Clone, Default)]
pub struct EditorHandle(Shared<EditorState>);

impl EditorHandle {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs `f` on the editor, or returns `None` while it is not mounted or
	/// already borrowed by an event in progress.
	pub fn with<R>(&self, f: impl FnOnce(&mut EditorState) -> R) -> Option<R> {
		let Ok(mut guard) = self.0.try_borrow_mut() else {
			warn!("editor is busy, host call dropped");
			return None;
		};
		guard.as_mut().map(f)
	}

	pub fn update(&self, f: impl FnOnce(&mut [Node])) -> bool {
		self.with(|s| s.update(f)).is_some()
	}

	pub fn update_node(&self, id: NodeId, f: impl FnOnce(&mut Node)) -> bool {
		self.with(|s| s.update_node(id, f)).unwrap_or(false)
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	let width = window.inner_width().ok()?.as_f64()?;
	let height = window.inner_height().ok()?.as_f64()?;
	Some((width, height))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<PointerInput> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	let input = PointerInput::at(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	);
	Some(input.with_modifiers(Modifiers {
		shift: ev.shift_key(),
		ctrl: ev.ctrl_key(),
	}))
}

/// Interactive node-link editor drawn on a canvas.
///
/// Keyboard input needs focus; the canvas takes it on the first press.
#[component]
pub fn GraphEditorCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: EditorConfig,
	/// Called with the selected node, or `None` when the selection clears.
	#[prop(optional, into)]
	on_node_selected: Option<Callback<Option<Node>>>,
	/// Host-driven `highlighted` / `reflexive` flags.
	#[prop(optional, into)]
	mutations: Option<Signal<Mutations>>,
	#[prop(optional)] handle: Option<EditorHandle>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handle = handle.unwrap_or_default();
	let state = handle.0.clone();
	let last_scene: Shared<Scene> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let (state_init, scene_init, animate_init, resize_cb_init) = (
		state.clone(),
		last_scene.clone(),
		animate.clone(),
		resize_cb.clone(),
	);

	// Rebuilds the editor whenever `data` changes; the frame loop and resize
	// listener are installed once.
	Effect::new(move |_| {
		let data = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((config.width, config.height))
		} else {
			let parent = canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64));
			let measured = |size: Option<f64>| size.filter(|v| *v > 0.0);
			(
				width
					.or_else(|| measured(parent.map(|p| p.0)))
					.unwrap_or(config.width),
				height
					.or_else(|| measured(parent.map(|p| p.1)))
					.unwrap_or(config.height),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let mut editor = match EditorState::new(&data, config.clone(), w, h) {
			Ok(editor) => editor,
			Err(err) => {
				error!("failed to load graph: {err:#}");
				*state_init.borrow_mut() = None;
				return;
			}
		};
		if let Some(callback) = on_node_selected {
			editor.subscribe(move |node| callback.run(node.cloned()));
		}
		*state_init.borrow_mut() = Some(editor);
		*scene_init.borrow_mut() = None;

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (state_resize, scene_resize, canvas_resize) =
				(state_init.clone(), scene_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
				*scene_resize.borrow_mut() = None;
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};
		let (state_anim, scene_anim, animate_inner) =
			(state_init.clone(), scene_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Ok(mut guard) = state_anim.try_borrow_mut()
				&& let Some(s) = guard.as_mut()
			{
				if !s.is_settled() {
					s.tick(FRAME_DT);
				}
				let scene = s.scene();
				let mut last = scene_anim.borrow_mut();
				let dirty = last.as_ref().is_none_or(|prev| !scene.diff(prev).is_empty());
				if dirty {
					trace!("repainting {} nodes, {} edges", scene.nodes.len(), scene.edges.len());
					render::render(&scene, &ctx, s.width, s.height);
					*last = Some(scene);
				}
			}
			if let (Some(cb), Some(window)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
		debug!("graph editor mounted at {w}x{h}");
	});

	// Loaded flags stand until the host changes its mutations; the first run
	// only subscribes.
	if let Some(mutations) = mutations {
		let state_mut = state.clone();
		Effect::new(move |subscribed: Option<()>| {
			let mutations = mutations.get();
			if subscribed.is_none() {
				return;
			}
			if let Some(ref mut s) = *state_mut.borrow_mut() {
				s.apply_mutations(&mutations);
			}
		});
	}

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(canvas) = canvas_ref.get() {
			let _ = canvas.focus();
		}
		let Some(input) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(input);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(input) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(input);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(input) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up(input);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let Some(input) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let wheel = WheelInput {
				position: input.position,
				delta_y: ev.delta_y(),
				modifiers: input.modifiers,
			};
			if s.wheel(wheel) {
				ev.prevent_default();
			}
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if let Some(ref mut s) = *state_kd.borrow_mut() {
			let key = Key::from_dom(&ev.key());
			// keep Backspace from navigating back
			if s.key_down(key.clone()) || matches!(key, Key::Backspace) {
				ev.prevent_default();
			}
		}
	};

	let state_ku = state.clone();
	let on_keyup = move |ev: KeyboardEvent| {
		if let Some(ref mut s) = *state_ku.borrow_mut() {
			s.key_up(Key::from_dom(&ev.key()));
		}
	};

	let state_bl = state.clone();
	let on_blur = move |_: web_sys::FocusEvent| {
		if let Some(ref mut s) = *state_bl.borrow_mut() {
			s.release_keys();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-editor-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:keydown=on_keydown
			on:keyup=on_keyup
			on:blur=on_blur
			on:contextmenu=|ev: MouseEvent| ev.prevent_default()
			style="display: block; outline: none; cursor: default;"
		/>
	}
}
