use serde::Deserialize;

use super::color::ColorTable;

/// Options recognized by an editor instance. Every field has a default, so a
/// JSON config only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
	/// Enables structural mutations (create, connect, delete, flag keys).
	pub editable: bool,
	/// White background; nodes are filled only when selected or highlighted.
	pub inverted: bool,
	/// Node circle radius in pixels.
	pub radius: f64,
	pub colors: ColorTable,
	/// Viewport used when the host element reports no size.
	pub width: f64,
	pub height: f64,
	/// Rest length of the layout springs.
	pub link_distance: f64,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			editable: false,
			inverted: false,
			radius: 26.0,
			colors: ColorTable::default(),
			width: 860.0,
			height: 800.0,
			link_distance: 150.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_editor::color::Rgb;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: EditorConfig =
			serde_json::from_str(r##"{"editable": true, "colors": {"slot": "#9ABBD6"}}"##).unwrap();
		assert!(config.editable);
		assert!(!config.inverted);
		assert_eq!(config.radius, 26.0);
		assert_eq!(config.colors.get("slot"), Rgb::new(0x9a, 0xbb, 0xd6));
	}

	#[test]
	fn bad_color_is_rejected() {
		let result = serde_json::from_str::<EditorConfig>(r#"{"colors": {"slot": "blue"}}"#);
		assert!(result.is_err());
	}
}
