use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use super::types::NEW_NODE_KIND;

/// Fallback used when neither the node's kind nor `new` is in the table.
const FALLBACK: Rgb = Rgb::new(0x3f, 0x88, 0xc5);

/// An opaque sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Rgb {
	pub const WHITE: Rgb = Rgb::new(255, 255, 255);

	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#rrggbb` or `#rgb`.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let digits = hex.strip_prefix('#')?;
		if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
			return None;
		}
		let channel = |s: &str| u8::from_str_radix(s, 16).ok();
		match digits.len() {
			6 => Some(Self::new(
				channel(&digits[0..2])?,
				channel(&digits[2..4])?,
				channel(&digits[4..6])?,
			)),
			3 => {
				let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
				Some(Self::new(short(0)?, short(1)?, short(2)?))
			}
			_ => None,
		}
	}

	/// Lightens the color; each step divides the channels by 0.7. Channels
	/// below 30 are lifted to 30 first so dark colors still change. Results
	/// are truncated, not rounded.
	pub fn brighter(self, k: f64) -> Self {
		let factor = 0.7f64.powf(k);
		let floor = 30.0;
		let (mut r, mut g, mut b) = (self.r as f64, self.g as f64, self.b as f64);
		if r == 0.0 && g == 0.0 && b == 0.0 {
			return Self::new(30, 30, 30);
		}
		for c in [&mut r, &mut g, &mut b] {
			if *c > 0.0 && *c < floor {
				*c = floor;
			}
		}
		let scale = |c: f64| (c / factor).min(255.0) as u8;
		Self::new(scale(r), scale(g), scale(b))
	}

	/// Darkens the color; each step multiplies the channels by 0.7.
	pub fn darker(self, k: f64) -> Self {
		let factor = 0.7f64.powf(k);
		let scale = |c: u8| (c as f64 * factor) as u8;
		Self::new(scale(self.r), scale(self.g), scale(self.b))
	}

	/// YIQ brightness test, true for colors that read as light.
	pub fn is_light(self) -> bool {
		let yiq = (self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000;
		yiq >= 128
	}

	/// CSS `rgba(..)` string with the given alpha.
	pub fn with_alpha(self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl TryFrom<String> for Rgb {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Rgb::from_hex(&value).ok_or_else(|| format!("invalid hex color {value:?}"))
	}
}

/// Node kind to color lookup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ColorTable(HashMap<String, Rgb>);

impl ColorTable {
	pub fn new(entries: impl IntoIterator<Item = (String, Rgb)>) -> Self {
		Self(entries.into_iter().collect())
	}

	/// Color for `kind`, falling back to the `new` entry.
	pub fn get(&self, kind: &str) -> Rgb {
		self.0
			.get(kind)
			.or_else(|| self.0.get(NEW_NODE_KIND))
			.copied()
			.unwrap_or(FALLBACK)
	}
}

impl Default for ColorTable {
	fn default() -> Self {
		Self::new(
			[
				("person", Rgb::new(0x62, 0x94, 0xd0)),
				("location", Rgb::new(0x92, 0xa4, 0x7e)),
				("movie", Rgb::new(0x85, 0x8b, 0xdb)),
				("director", Rgb::new(0xf6, 0xa6, 0x23)),
				(NEW_NODE_KIND, FALLBACK),
				("highlighted", Rgb::new(0xff, 0xd7, 0x00)),
			]
			.into_iter()
			.map(|(k, v)| (k.to_string(), v)),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex() {
		assert_eq!(Rgb::from_hex("#6294D0"), Some(Rgb::new(0x62, 0x94, 0xd0)));
		assert_eq!(Rgb::from_hex("#fff"), Some(Rgb::WHITE));
		assert_eq!(Rgb::from_hex("6294D0"), None);
		assert_eq!(Rgb::from_hex("#12345"), None);
		assert_eq!(Rgb::from_hex("#zzzzzz"), None);
		assert_eq!(Rgb::new(0x3f, 0x88, 0xc5).to_string(), "#3f88c5");
	}

	#[test]
	fn brighter_and_darker_follow_power_of_point_seven() {
		let c = Rgb::new(70, 140, 7);
		// 0.7 ^ 1 = 0.7: 70 / 0.7 = 100, 140 / 0.7 = 200, 7 is lifted to 30 then 42.86 truncates to 42
		assert_eq!(c.brighter(1.0), Rgb::new(100, 200, 42));
		assert_eq!(Rgb::new(200, 250, 10).brighter(1.0), Rgb::new(255, 255, 42));
		// 0.7 ^ 2 = 0.49: 50 / 0.49 = 102.04, 99 * 0.49 = 48.51
		assert_eq!(Rgb::new(50, 50, 50).brighter(2.0), Rgb::new(102, 102, 102));
		assert_eq!(Rgb::new(99, 99, 99).darker(2.0), Rgb::new(48, 48, 48));
		assert_eq!(Rgb::new(0, 0, 0).brighter(2.0), Rgb::new(30, 30, 30));
		assert_eq!(Rgb::new(100, 200, 10).darker(1.0), Rgb::new(70, 140, 7));
	}

	#[test]
	fn lightness_uses_yiq() {
		assert!(Rgb::WHITE.is_light());
		assert!(Rgb::new(0xf6, 0xa6, 0x23).is_light());
		assert!(!Rgb::new(0x3f, 0x88, 0xc5).is_light());
	}

	#[test]
	fn unknown_kinds_fall_back_to_new() {
		let table = ColorTable::default();
		assert_eq!(table.get("movie"), Rgb::new(0x85, 0x8b, 0xdb));
		assert_eq!(table.get("planet"), table.get(NEW_NODE_KIND));
		assert_eq!(ColorTable::new([]).get("person"), FALLBACK);
	}
}
