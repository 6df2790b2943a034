use super::geometry::Point;

pub const MIN_SCALE: f64 = 0.7;
pub const MAX_SCALE: f64 = 15.0;
/// How far the graph may be dragged past the viewport edges.
pub const PAN_PADDING: f64 = 250.0;

/// Screen = graph * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	pub fn graph_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Moves the translation to `(x, y)`, kept within the padded viewport.
	pub fn pan_to(&mut self, x: f64, y: f64, viewport: (f64, f64)) {
		self.x = x;
		self.y = y;
		self.clamp(viewport);
	}

	/// Zooms by one wheel notch about `anchor` (screen space).
	pub fn zoom_at(&mut self, anchor: Point, delta_y: f64, viewport: (f64, f64)) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = k / self.k;
		self.x = anchor.x - (anchor.x - self.x) * ratio;
		self.y = anchor.y - (anchor.y - self.y) * ratio;
		self.k = k;
		self.clamp(viewport);
	}

	fn clamp(&mut self, (width, height): (f64, f64)) {
		let bound = |t: f64, extent: f64| {
			t.max(extent - (extent + PAN_PADDING) * self.k).min(PAN_PADDING)
		};
		self.x = bound(self.x, width);
		self.y = bound(self.y, height);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const VIEW: (f64, f64) = (800.0, 600.0);

	#[test]
	fn screen_and_graph_round_trip() {
		let t = ViewTransform {
			x: 40.0,
			y: -20.0,
			k: 2.0,
		};
		let p = Point::new(15.0, 7.5);
		assert_eq!(t.graph_to_screen(p), Point::new(70.0, -5.0));
		assert_eq!(t.screen_to_graph(t.graph_to_screen(p)), p);
	}

	#[test]
	fn scale_is_clamped() {
		let mut t = ViewTransform::default();
		for _ in 0..50 {
			t.zoom_at(Point::new(400.0, 300.0), 1.0, VIEW);
		}
		assert_eq!(t.k, MIN_SCALE);
		for _ in 0..100 {
			t.zoom_at(Point::new(400.0, 300.0), -1.0, VIEW);
		}
		assert_eq!(t.k, MAX_SCALE);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut t = ViewTransform::default();
		let anchor = Point::new(200.0, 150.0);
		let before = t.screen_to_graph(anchor);
		t.zoom_at(anchor, -1.0, VIEW);
		let after = t.screen_to_graph(anchor);
		assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
	}

	#[test]
	fn pan_is_limited_by_padding() {
		let mut t = ViewTransform::default();
		t.pan_to(1000.0, -5000.0, VIEW);
		assert_eq!(t.x, PAN_PADDING);
		assert_eq!(t.y, 600.0 - (600.0 + PAN_PADDING));
	}
}
