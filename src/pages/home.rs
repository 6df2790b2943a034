use leptos::prelude::*;

use crate::components::graph_editor::{
	EditorConfig, EditorHandle, GraphData, GraphEditorCanvas, Mutations, Node, NodeId,
};

/// Sample movie network shown on the home page.
const SAMPLE_NETWORK: &str = include_str!("../../assets/matrix.json");

/// Nodes the highlight button toggles.
const FEATURED: [NodeId; 3] = [NodeId(7), NodeId(8), NodeId(9)];

#[component]
fn NodeDetail(
	#[prop(into)] node: Signal<Option<Node>>,
	handle: StoredValue<EditorHandle, LocalStorage>,
) -> impl IntoView {
	move || match node.get() {
		None => view! { <div class="node-detail">"Select a node..."</div> }.into_any(),
		Some(node) => {
			let id = node.id();
			let toggle_reflexive = move |_| {
				handle.with_value(|h| h.update_node(id, |n| n.reflexive = !n.reflexive));
			};
			view! {
				<div class="node-detail">
					<h3>"Node Properties"</h3>
					<ul>
						<li><strong>"Id"</strong>": "{id.to_string()}</li>
						<li><strong>"Name"</strong>": "{node.name.clone().unwrap_or_default()}</li>
						<li><strong>"Type"</strong>": "{node.kind.clone()}</li>
						<li><strong>"Reflexive"</strong>": "{node.reflexive.to_string()}</li>
					</ul>
					<button on:click=toggle_reflexive>"Toggle reflexive"</button>
				</div>
			}
			.into_any()
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let data = match GraphData::from_json(SAMPLE_NETWORK) {
		Ok(data) => data,
		Err(err) => {
			return view! {
				<h1>"Uh oh! Something went wrong!"</h1>
				<p>"Errors: "{format!("{err:#}")}</p>
			}
			.into_any();
		}
	};
	let graph_data = Signal::derive(move || data.clone());

	let selected = RwSignal::new(None::<Node>);
	let featured = RwSignal::new(true);
	let mutations = Signal::derive(move || Mutations {
		highlighted: featured.get().then(|| FEATURED.to_vec()),
		reflexive: None,
	});
	let handle = EditorHandle::new();
	let stored_handle = StoredValue::new_local(handle.clone());

	let config = EditorConfig {
		editable: true,
		inverted: true,
		..EditorConfig::default()
	};

	view! {
		<div class="editor-layout">
			<div>
				<h1>"Matrix"</h1>
				<p class="subtitle">
					"Click the canvas to add a node. Drag from a node to connect. "
					"B, L and R set the arrows of the selected edge; R toggles a node's loop. "
					"Hold Shift to pan and zoom, Ctrl to move nodes."
				</p>
				<GraphEditorCanvas
					data=graph_data
					config=config
					on_node_selected={move |node: Option<Node>| selected.set(node)}
					mutations=mutations
					handle=handle
					height=Some(500.0)
				/>
			</div>
			<div>
				<button on:click=move |_| featured.update(|on| *on = !*on)>
					{move || if featured.get() { "Clear highlight" } else { "Highlight the trilogy" }}
				</button>
				<NodeDetail node=selected handle=stored_handle />
			</div>
		</div>
	}
	.into_any()
}
