use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::color::Rgb;
use super::geometry::{Point, Segment};
use super::projection::{EdgePrimitive, Marker, NodePrimitive, Scene};

const EDGE_WIDTH: f64 = 1.5;
const SELECTED_DASH: (f64, f64) = (10.0, 2.0);
const ARROW_SIZE: f64 = 10.0;
const FONT_SIZE: f64 = 10.0;

/// Paints `scene` onto a `width` x `height` canvas.
pub fn render(scene: &Scene, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str(&scene.background.to_string());
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let t = scene.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	for edge in scene.edges.values() {
		draw_edge(edge, ctx);
	}
	if let Some(line) = scene.drag_line {
		draw_line(&line, Marker::EndArrow.color(), false, ctx);
		draw_arrow(line.to, line.from, Marker::EndArrow, ctx);
	}
	for node in scene.nodes.values() {
		draw_node(node, ctx);
	}
	ctx.restore();
}

fn draw_line(segment: &Segment, color: Rgb, dashed: bool, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(&color.to_string());
	ctx.set_line_width(EDGE_WIDTH);
	if dashed {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(SELECTED_DASH.0),
			&JsValue::from_f64(SELECTED_DASH.1),
		));
	}
	ctx.begin_path();
	ctx.move_to(segment.from.x, segment.from.y);
	ctx.line_to(segment.to.x, segment.to.y);
	ctx.stroke();
	if dashed {
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}
}

/// Filled triangle with its tip at `tip`, pointing away from `from`.
fn draw_arrow(tip: Point, from: Point, marker: Marker, ctx: &CanvasRenderingContext2d) {
	let Some(unit) = (Segment { from, to: tip }).direction() else {
		return;
	};
	let back = tip - unit * ARROW_SIZE;
	let side = Point::new(-unit.y, unit.x) * (ARROW_SIZE * 0.5);
	ctx.set_fill_style_str(&marker.color().to_string());
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(back.x + side.x, back.y + side.y);
	ctx.line_to(back.x - side.x, back.y - side.y);
	ctx.close_path();
	ctx.fill();
}

fn draw_edge(edge: &EdgePrimitive, ctx: &CanvasRenderingContext2d) {
	let color = if edge.highlighted {
		Rgb::new(0x4a, 0x4a, 0x4a)
	} else {
		Rgb::new(0x99, 0x99, 0x99)
	};
	draw_line(&edge.segment, color, edge.selected, ctx);
	if let Some(marker) = edge.marker_start {
		draw_arrow(edge.segment.from, edge.segment.to, marker, ctx);
	}
	if let Some(marker) = edge.marker_end {
		draw_arrow(edge.segment.to, edge.segment.from, marker, ctx);
	}
}

fn draw_glow(node: &NodePrimitive, radius: f64, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (node.center.x, node.center.y);
	let glow = radius * 1.8;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow) else {
		return;
	};
	let stops = [
		(0.0, node.fill.with_alpha(0.45)),
		(0.6, node.fill.with_alpha(0.15)),
		(1.0, node.fill.with_alpha(0.0)),
	];
	for (offset, color) in &stops {
		if gradient.add_color_stop(*offset, color).is_err() {
			return;
		}
	}
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

fn draw_node(node: &NodePrimitive, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (node.center.x, node.center.y);
	let radius = node.radius * node.scale;
	if node.highlighted {
		draw_glow(node, radius, ctx);
	}

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.fill.to_string());
	ctx.fill();
	ctx.set_stroke_style_str(&node.stroke.to_string());
	ctx.set_line_width(if node.reflexive { 4.0 } else { 1.5 });
	ctx.stroke();

	if node.label.is_empty() {
		return;
	}
	ctx.set_fill_style_str(&node.label_color.to_string());
	ctx.set_font(&format!("{FONT_SIZE}px sans-serif"));
	ctx.set_text_align("center");
	for line in &node.label {
		let _ = ctx.fill_text(&line.text, x, y + line.baseline);
	}
}
