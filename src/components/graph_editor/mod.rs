//! Interactive node-link graph editor.
//!
//! [`EditorState`] holds one editor instance and can be driven without a
//! browser; [`GraphEditorCanvas`] mounts it on a canvas.

pub mod color;
mod component;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod projection;
mod render;
pub mod state;
pub mod store;
pub mod types;
pub mod viewport;

pub use component::{EditorHandle, GraphEditorCanvas};
pub use config::EditorConfig;
pub use interaction::{InteractionState, Key, Modifiers, PointerInput, Selection, WheelInput};
pub use projection::{Scene, SceneDiff};
pub use state::{EditorState, SubscriptionId};
pub use store::GraphStore;
pub use types::{
	Direction, Edge, EdgeArrows, EdgeKey, GraphData, Mutations, Node, NodeData, NodeId,
};
