//! Paint values as attribute value sources.
//!
//! A [`PaintDeclaration`] is the resolved paint property of a style layer: a constant, a zoom
//! function, or a property function. [`PaintDeclaration::to_attribute_value`] evaluates it at a
//! zoom level and turns it into an [`AttributeValue`]. Constants and zoom functions become
//! [`AttributeValue::Constant`]; property functions become [`AttributeValue::Computed`], reading
//! the feature property through [`FeatureProperties`].
//!
//! # Examples
//!
//! ```
//! use vtbuf_bucket::paint::{FeatureProperties, PaintDeclaration};
//!
//! struct Vertex(f64);
//! impl FeatureProperties for Vertex {
//! 	fn property(&self, _key: &str) -> Option<f64> {
//! 		Some(self.0)
//! 	}
//! }
//!
//! let declaration: PaintDeclaration = serde_yaml_ng::from_str("{stops: [[0, 1], [10, 2]]}").unwrap();
//! let value = declaration.to_attribute_value::<Vertex>(5.0, 10.0).unwrap();
//! assert_eq!(value.as_constant(), Some(&[15.0][..]));
//! ```

use crate::AttributeValue;
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Access to the properties of the feature a vertex belongs to.
pub trait FeatureProperties {
	fn property(&self, key: &str) -> Option<f64>;
}

/// A scalar or a vector paint value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaintValue {
	Scalar(f64),
	Vector(Vec<f64>),
}

impl PaintValue {
	pub fn to_vec(&self) -> Vec<f64> {
		match self {
			PaintValue::Scalar(value) => vec![*value],
			PaintValue::Vector(values) => values.clone(),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			PaintValue::Scalar(_) => 1,
			PaintValue::Vector(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn default_base() -> f64 {
	1.0
}

/// Piecewise interpolation between stops, over the zoom level or over a feature property.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StyleFunction {
	/// Exponential base of the interpolation; `1` interpolates linearly.
	#[serde(default = "default_base")]
	pub base: f64,
	/// `(input, output)` pairs, sorted by input.
	pub stops: Vec<(f64, PaintValue)>,
	/// Feature property used as input. Zoom functions leave this empty.
	#[serde(default)]
	pub property: Option<String>,
}

impl StyleFunction {
	pub fn validate(&self) -> Result<()> {
		ensure!(!self.stops.is_empty(), "a style function needs at least one stop");
		ensure!(self.base > 0.0, "style function base must be positive, got {}", self.base);

		let components = self.stops[0].1.len();
		ensure!(components > 0, "style function stops must not be empty");
		for window in self.stops.windows(2) {
			ensure!(
				window[0].0 <= window[1].0,
				"style function stops must be sorted by input, {} follows {}",
				window[1].0,
				window[0].0
			);
		}
		ensure!(
			self.stops.iter().all(|(_, output)| output.len() == components),
			"all style function stops must have {components} components"
		);
		Ok(())
	}

	/// Evaluates the function at `input`, clamping to the outermost stops.
	///
	/// Expects a function that passed [`validate`](Self::validate).
	pub fn evaluate(&self, input: f64) -> Vec<f64> {
		let Some((first, rest)) = self.stops.split_first() else {
			return Vec::new();
		};
		if rest.is_empty() || input <= first.0 {
			return first.1.to_vec();
		}

		for pair in self.stops.windows(2) {
			let (lower, upper) = (&pair[0], &pair[1]);
			if input < upper.0 {
				let t = interpolation_factor(self.base, input - lower.0, upper.0 - lower.0);
				return lower
					.1
					.to_vec()
					.into_iter()
					.zip(upper.1.to_vec())
					.map(|(a, b)| a + (b - a) * t)
					.collect();
			}
		}

		self.stops[self.stops.len() - 1].1.to_vec()
	}
}

fn interpolation_factor(base: f64, progress: f64, difference: f64) -> f64 {
	if difference == 0.0 {
		0.0
	} else if base == 1.0 {
		progress / difference
	} else {
		(base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
	}
}

/// A resolved paint property.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaintDeclaration {
	Constant(PaintValue),
	Function(StyleFunction),
}

impl PaintDeclaration {
	/// Whether the value is the same for every feature.
	pub fn is_feature_constant(&self) -> bool {
		match self {
			PaintDeclaration::Constant(_) => true,
			PaintDeclaration::Function(function) => function.property.is_none(),
		}
	}

	/// Number of components the evaluated value has.
	pub fn components(&self) -> usize {
		match self {
			PaintDeclaration::Constant(value) => value.len(),
			PaintDeclaration::Function(function) => function.stops.first().map_or(0, |(_, output)| output.len()),
		}
	}

	/// Turns this declaration into an attribute value source at `zoom`, scaling every component
	/// by `multiplier`.
	pub fn to_attribute_value<V>(&self, zoom: f64, multiplier: f64) -> Result<AttributeValue<V>>
	where
		V: FeatureProperties + 'static,
	{
		let scale = move |values: Vec<f64>| values.into_iter().map(|v| v * multiplier).collect::<Vec<f64>>();

		Ok(match self {
			PaintDeclaration::Constant(value) => {
				ensure!(!value.is_empty(), "paint value must not be empty");
				AttributeValue::Constant(scale(value.to_vec()))
			}
			PaintDeclaration::Function(function) => {
				function.validate()?;
				match &function.property {
					None => AttributeValue::Constant(scale(function.evaluate(zoom))),
					Some(key) => {
						let function = function.clone();
						let key = key.clone();
						let fallback = function.stops[0].0;
						AttributeValue::computed(move |data: &V| {
							scale(function.evaluate(data.property(&key).unwrap_or(fallback)))
						})
					}
				}
			}
		})
	}
}

impl From<f64> for PaintDeclaration {
	fn from(value: f64) -> Self {
		PaintDeclaration::Constant(PaintValue::Scalar(value))
	}
}

impl From<Vec<f64>> for PaintDeclaration {
	fn from(values: Vec<f64>) -> Self {
		PaintDeclaration::Constant(PaintValue::Vector(values))
	}
}
