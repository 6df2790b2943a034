use std::ops::{Add, Mul, Sub};

/// Padding at an edge end that carries an arrowhead.
pub const ARROW_PADDING: f64 = 17.0;
/// Padding at an edge end without an arrowhead.
pub const PLAIN_PADDING: f64 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	pub fn distance(self, other: Point) -> f64 {
		(other - self).length()
	}

	pub fn dot(self, other: Point) -> f64 {
		self.x * other.x + self.y * other.y
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// A straight line between two points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment {
	pub from: Point,
	pub to: Point,
}

impl Segment {
	pub fn length(&self) -> f64 {
		self.from.distance(self.to)
	}

	/// Unit vector from `from` to `to`, or `None` for a zero-length segment.
	pub fn direction(&self) -> Option<Point> {
		let delta = self.to - self.from;
		let len = delta.length();
		(len > f64::EPSILON).then(|| delta * (1.0 / len))
	}

	/// Shortest distance from `p` to any point of the segment.
	pub fn distance_to(&self, p: Point) -> f64 {
		let delta = self.to - self.from;
		let len_sq = delta.dot(delta);
		if len_sq <= f64::EPSILON {
			return p.distance(self.from);
		}
		let t = ((p - self.from).dot(delta) / len_sq).clamp(0.0, 1.0);
		p.distance(self.from + delta * t)
	}
}

/// Shortens the line between two node centers so arrowheads clear the node
/// outlines. Coincident centers give a zero-length segment at `source`.
pub fn trim_edge(source: Point, target: Point, left: bool, right: bool) -> Segment {
	let line = Segment {
		from: source,
		to: target,
	};
	let Some(unit) = line.direction() else {
		return Segment {
			from: source,
			to: source,
		};
	};
	let source_padding = if left { ARROW_PADDING } else { PLAIN_PADDING };
	let target_padding = if right { ARROW_PADDING } else { PLAIN_PADDING };
	Segment {
		from: source + unit * source_padding,
		to: target - unit * target_padding,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trims_more_on_arrow_side() {
		let seg = trim_edge(Point::new(0.0, 0.0), Point::new(100.0, 0.0), false, true);
		assert_eq!(seg.from, Point::new(12.0, 0.0));
		assert_eq!(seg.to, Point::new(83.0, 0.0));

		let seg = trim_edge(Point::new(0.0, 0.0), Point::new(0.0, 100.0), true, false);
		assert_eq!(seg.from, Point::new(0.0, 17.0));
		assert_eq!(seg.to, Point::new(0.0, 88.0));
	}

	#[test]
	fn coincident_nodes_give_zero_length_segment() {
		let p = Point::new(40.0, -3.5);
		let seg = trim_edge(p, p, true, true);
		assert_eq!(seg.length(), 0.0);
		assert!(seg.from.x.is_finite() && seg.from.y.is_finite());
		assert!(seg.to.x.is_finite() && seg.to.y.is_finite());
	}

	#[test]
	fn distance_to_segment_clamps_to_ends() {
		let seg = Segment {
			from: Point::new(0.0, 0.0),
			to: Point::new(10.0, 0.0),
		};
		assert_eq!(seg.distance_to(Point::new(5.0, 3.0)), 3.0);
		assert_eq!(seg.distance_to(Point::new(13.0, 4.0)), 5.0);
		assert_eq!(seg.distance_to(Point::new(-3.0, 0.0)), 3.0);
	}
}
