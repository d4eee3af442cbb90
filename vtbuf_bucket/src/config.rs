//! YAML bucket configuration.
//!
//! ```yaml
//! id: water
//! mode: TRIANGLES
//! zoom: 12
//! attributes:
//!   - name: a_color
//!     components: 4
//!     value: [0.1, 0.3, 0.8, 1]
//!     multiplier: 255
//!   - name: a_width
//!     type: FLOAT
//!     value:
//!       property: weight
//!       stops: [[0, 1], [10, 4]]
//! ```

use crate::{
	AttributeDescriptor, Bucket, BucketOptions, ELEMENT_GROUP_VERTEX_LENGTH, ElementVertexGenerator, FeatureProperties,
	PaintDeclaration,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
	collections::BTreeMap,
	fs::File,
	io::{BufReader, Read},
	path::Path,
};
use vtbuf_core::{ArrayBuffer, AttributeType, BufferLayout, BufferSet, Mode, VertexLayout};

fn default_vertex_buffer() -> String {
	String::from("vertex")
}

fn default_element_buffer() -> String {
	String::from("element")
}

fn default_element_group_vertex_length() -> u32 {
	ELEMENT_GROUP_VERTEX_LENGTH
}

fn default_multiplier() -> f64 {
	1.0
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
	/// Bucket id, usually the style layer id.
	pub id: String,

	#[serde(default)]
	pub mode: Mode,

	/// Default target buffer of attributes
	#[serde(default = "default_vertex_buffer")]
	pub vertex_buffer: String,

	#[serde(default = "default_element_buffer")]
	pub element_buffer: String,

	/// Maximum number of vertices per element group
	#[serde(default = "default_element_group_vertex_length")]
	pub element_group_vertex_length: u32,

	/// Zoom level zoom functions are evaluated at
	#[serde(default)]
	pub zoom: f64,

	#[serde(default)]
	pub attributes: Vec<AttributeConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AttributeConfig {
	pub name: String,

	/// Defaults to the number of components of `value`.
	#[serde(default)]
	pub components: Option<usize>,

	#[serde(default, rename = "type")]
	pub attribute_type: Option<AttributeType>,

	#[serde(default)]
	pub buffer: Option<String>,

	pub value: PaintDeclaration,

	/// Factor applied to every component, e.g. `255` for colors stored as unsigned bytes.
	#[serde(default = "default_multiplier")]
	pub multiplier: f64,
}

impl AttributeConfig {
	pub fn components(&self) -> usize {
		self.components.unwrap_or_else(|| self.value.components().max(1))
	}
}

impl BucketConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("Failed to open bucket config {path:?}"))?;
		BucketConfig::from_reader(BufReader::new(file))
			.with_context(|| format!("Failed to parse bucket config {path:?}"))
	}

	/// Evaluates the paint values at the configured zoom level.
	pub fn attribute_descriptors<V>(&self) -> Result<Vec<AttributeDescriptor<V>>>
	where
		V: FeatureProperties + 'static,
	{
		self
			.attributes
			.iter()
			.map(|attribute| {
				let value = attribute
					.value
					.to_attribute_value(self.zoom, attribute.multiplier)
					.with_context(|| format!("Failed to evaluate the value of attribute '{}'", attribute.name))?;

				let mut descriptor = AttributeDescriptor::new(&attribute.name)
					.with_components(attribute.components())
					.with_value(value);
				if let Some(attribute_type) = attribute.attribute_type {
					descriptor = descriptor.with_type(attribute_type);
				}
				if let Some(buffer) = &attribute.buffer {
					descriptor = descriptor.with_buffer(buffer);
				}
				Ok(descriptor)
			})
			.collect()
	}

	/// Layouts of all buffers the configured attributes and elements are written into, by
	/// buffer id.
	///
	/// Elements hold absolute vertex indices, so the element buffer always stores unsigned ints.
	pub fn buffer_layouts(&self) -> Result<BTreeMap<String, BufferLayout>> {
		let mut attributes: BTreeMap<&str, Vec<(&str, usize, AttributeType)>> = BTreeMap::new();
		for attribute in &self.attributes {
			let buffer = attribute.buffer.as_deref().unwrap_or(&self.vertex_buffer);
			attributes.entry(buffer).or_default().push((
				&attribute.name,
				attribute.components(),
				attribute.attribute_type.unwrap_or_default(),
			));
		}

		let mut layouts = BTreeMap::new();
		for (buffer, attributes) in attributes {
			let layout = VertexLayout::new(attributes)
				.with_context(|| format!("Failed to build the layout of buffer '{buffer}'"))?;
			layouts.insert(buffer.to_string(), BufferLayout::Vertex(layout));
		}

		layouts.insert(
			self.element_buffer.clone(),
			BufferLayout::new_element(self.mode.vertices_per_element(), AttributeType::UnsignedInt)?,
		);

		Ok(layouts)
	}

	/// Creates an empty [`ArrayBuffer`] for every layout of [`buffer_layouts`](Self::buffer_layouts).
	pub fn create_buffers(&self) -> Result<BufferSet> {
		let mut buffers = BufferSet::new();
		for (id, layout) in self.buffer_layouts()? {
			buffers.insert(&id, ArrayBuffer::new(layout));
		}
		Ok(buffers)
	}
}

impl<G> Bucket<G>
where
	G: ElementVertexGenerator,
	G::Vertex: FeatureProperties + 'static,
{
	pub fn from_config(config: &BucketConfig, generator: G, buffers: BufferSet) -> Result<Self> {
		let mut options = BucketOptions::new(&config.id, generator, buffers)
			.with_mode(config.mode)
			.with_vertex_buffer(&config.vertex_buffer)
			.with_element_buffer(&config.element_buffer)
			.with_element_group_vertex_length(config.element_group_vertex_length);
		options.attributes = config
			.attribute_descriptors()
			.with_context(|| format!("Failed to configure bucket '{}'", config.id))?;
		Bucket::new(options)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		AttributeFilter, ElementGroup,
		paint::{PaintValue, StyleFunction},
		testing::{TestFeature, TestGenerator, TestVertex},
	};
	use approx::assert_relative_eq;
	use pretty_assertions::assert_eq;
	use std::io::Write;

	const WATER: &str = "
id: water
zoom: 5
attributes:
  - name: a_color
    components: 4
    value: [0, 0.5, 1, 1]
    multiplier: 255
  - name: a_width
    type: FLOAT
    value:
      property: weight
      stops: [[0, 1], [10, 4]]
  - name: a_opacity
    type: FLOAT
    buffer: extra
    value:
      stops: [[0, 0], [10, 1]]
";

	#[test]
	fn test_parse() -> Result<()> {
		let config = BucketConfig::from_string(WATER)?;
		assert_eq!(config.id, "water");
		assert_eq!(config.mode, Mode::Triangles);
		assert_eq!(config.vertex_buffer, "vertex");
		assert_eq!(config.element_buffer, "element");
		assert_eq!(config.element_group_vertex_length, 65535);
		assert_eq!(config.attributes.len(), 3);
		assert_eq!(
			config.attributes[1],
			AttributeConfig {
				name: "a_width".to_string(),
				components: None,
				attribute_type: Some(AttributeType::Float),
				buffer: None,
				value: PaintDeclaration::Function(StyleFunction {
					base: 1.0,
					stops: vec![(0.0, PaintValue::Scalar(1.0)), (10.0, PaintValue::Scalar(4.0))],
					property: Some("weight".to_string()),
				}),
				multiplier: 1.0,
			}
		);
		Ok(())
	}

	#[test]
	fn test_parse_errors() {
		assert!(BucketConfig::from_string("id: water\nshader: fill").is_err());
		assert!(BucketConfig::from_string("id: water\nmode: QUADS").is_err());

		let error = BucketConfig::from_string("id: water\nattributes:\n  - name: a_color").unwrap_err();
		assert!(error.to_string().contains("missing field `value`"));
	}

	#[test]
	fn test_from_path() -> Result<()> {
		let mut file = tempfile::NamedTempFile::new()?;
		file.write_all(WATER.as_bytes())?;
		assert_eq!(BucketConfig::from_path(file.path())?, BucketConfig::from_string(WATER)?);

		assert!(BucketConfig::from_path(Path::new("/does/not/exist.yml")).is_err());
		Ok(())
	}

	#[test]
	fn test_attribute_descriptors() -> Result<()> {
		let config = BucketConfig::from_string(WATER)?;
		let descriptors = config.attribute_descriptors::<TestVertex>()?;

		let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
		assert_eq!(names, ["a_color", "a_width", "a_opacity"]);

		let color = descriptors[0].value.as_ref().unwrap();
		assert_eq!(color.as_constant(), Some(&[0.0, 127.5, 255.0, 255.0][..]));
		assert!(!descriptors[1].value.as_ref().unwrap().is_feature_constant());
		assert_eq!(descriptors[2].value.as_ref().unwrap().as_constant(), Some(&[0.5][..]));
		assert_eq!(descriptors[2].buffer.as_deref(), Some("extra"));
		assert_eq!(descriptors[1].components, Some(1));
		Ok(())
	}

	#[test]
	fn test_invalid_paint_value() {
		let config = BucketConfig::from_string("id: line\nattributes:\n  - name: a_width\n    value: {stops: []}").unwrap();
		let error = config.attribute_descriptors::<TestVertex>().unwrap_err();
		assert_eq!(error.to_string(), "Failed to evaluate the value of attribute 'a_width'");
	}

	#[test]
	fn test_buffer_layouts() -> Result<()> {
		let layouts = BucketConfig::from_string(WATER)?.buffer_layouts()?;
		assert_eq!(layouts.keys().collect::<Vec<_>>(), ["element", "extra", "vertex"]);

		let BufferLayout::Vertex(vertex) = &layouts["vertex"] else {
			panic!("expected a vertex layout");
		};
		assert_eq!(vertex.stride(), 8);
		assert_eq!(vertex.get("a_width").unwrap().offset, 4);
		assert_eq!(layouts["extra"].item_size(), 4);
		assert_eq!(layouts["element"], BufferLayout::new_element(3, AttributeType::UnsignedInt)?);

		let lines = BucketConfig::from_string("id: lines\nmode: LINES\nelement_group_vertex_length: 100000")?;
		assert_eq!(
			lines.buffer_layouts()?["element"],
			BufferLayout::new_element(2, AttributeType::UnsignedInt)?
		);
		Ok(())
	}

	#[test]
	fn test_from_config() -> Result<()> {
		let config = BucketConfig::from_string(WATER)?;
		let layouts = config.buffer_layouts()?;

		let mut buffers = BufferSet::new();
		let vertex = buffers.insert("vertex", ArrayBuffer::new(layouts["vertex"].clone()));
		let extra = buffers.insert("extra", ArrayBuffer::new(layouts["extra"].clone()));
		let element = buffers.insert("element", ArrayBuffer::new(layouts["element"].clone()));

		let mut bucket = Bucket::from_config(&config, TestGenerator, buffers)?;
		assert_eq!(bucket.id(), "water");
		assert_eq!(bucket.vertex_attributes(AttributeFilter::all()).count(), 3);

		bucket.add_feature(TestFeature::new(3, 1).with_weight(5.0));
		assert!(bucket.refresh()?);

		let vertex = vertex.lock();
		assert_eq!(vertex.vertex_count(), 3);
		assert_relative_eq!(vertex.get_attribute(2, "a_width")?[0], 2.5);
		// constants are left to the renderer
		assert_eq!(vertex.get_attribute(2, "a_color")?, vec![0.0; 4]);
		assert!(extra.lock().is_empty());
		assert_eq!(element.lock().get_element(0)?, vec![0, 1, 2]);

		let stale: Vec<(String, Vec<f64>)> = bucket.take_stale_constants();
		assert_eq!(
			stale,
			vec![
				("a_color".to_string(), vec![0.0, 127.5, 255.0, 255.0]),
				("a_opacity".to_string(), vec![0.5])
			]
		);
		Ok(())
	}

	#[test]
	fn test_create_buffers() -> Result<()> {
		let config = BucketConfig::from_string(WATER)?;
		let buffers = config.create_buffers()?;
		assert_eq!(buffers.ids().collect::<Vec<_>>(), ["element", "extra", "vertex"]);

		let mut bucket = Bucket::from_config(&config, TestGenerator, buffers)?;
		bucket.add_feature(TestFeature::new(4, 2));
		assert!(bucket.refresh()?);
		assert_eq!(bucket.vertex_length(), 4);
		assert_eq!(bucket.element_length(), 2);
		Ok(())
	}

	#[test]
	fn test_refresh_beyond_16_bit_vertex_range() -> Result<()> {
		let config = BucketConfig::from_string(
			"
id: fill
attributes:
  - name: a_width
    type: FLOAT
    value: {property: weight, stops: [[0, 0], [10, 10]]}
",
		)?;
		let layouts = config.buffer_layouts()?;
		let mut buffers = BufferSet::new();
		let vertex = buffers.insert("vertex", ArrayBuffer::new(layouts["vertex"].clone()));
		let element = buffers.insert("element", ArrayBuffer::new(layouts["element"].clone()));

		let mut bucket = Bucket::from_config(&config, TestGenerator, buffers)?;
		for _ in 0..25_000 {
			bucket.add_feature(TestFeature::new(3, 1).with_weight(2.0));
		}
		assert!(bucket.refresh()?);

		assert_eq!(bucket.vertex_length(), 75_000);
		assert_eq!(bucket.element_length(), 25_000);
		assert_eq!(
			bucket.element_groups(),
			&[
				ElementGroup::new(0, 65_535, 0, 21_845),
				ElementGroup::new(65_535, 9_465, 21_845, 3_155)
			]
		);
		assert_eq!(element.lock().get_element(24_999)?, vec![74_997, 74_998, 74_999]);
		assert_relative_eq!(vertex.lock().get_attribute(74_999, "a_width")?[0], 2.0);
		Ok(())
	}
}
