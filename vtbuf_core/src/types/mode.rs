use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Primitive topology a bucket's elements describe.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
	#[default]
	Triangles,
	Lines,
	Points,
}

impl Mode {
	/// Number of vertex indices making up one element.
	pub fn vertices_per_element(&self) -> usize {
		match self {
			Mode::Triangles => 3,
			Mode::Lines => 2,
			Mode::Points => 1,
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			Mode::Triangles => "TRIANGLES",
			Mode::Lines => "LINES",
			Mode::Points => "POINTS",
		}
	}

	pub fn parse_str(value: &str) -> Result<Self> {
		Ok(match value.to_uppercase().trim() {
			"TRIANGLES" => Mode::Triangles,
			"LINES" => Mode::Lines,
			"POINTS" => Mode::Points,
			_ => bail!("Unknown mode '{value}'. Expected TRIANGLES, LINES or POINTS"),
		})
	}
}

impl Display for Mode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
