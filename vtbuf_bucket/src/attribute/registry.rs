//! Attribute registry.
//!
//! Normalizes [`AttributeDescriptor`]s into [`VertexAttribute`]s and tracks which of them need to
//! be rewritten. Registration applies the defaults `components = 1`, `type = UNSIGNED_BYTE`,
//! `buffer = <bucket vertex buffer>` and marks every attribute stale. Whether an attribute is
//! feature-constant follows from its [`AttributeValue`] variant.

use super::{AttributeDescriptor, AttributeValue};
use anyhow::{Result, anyhow, ensure};
use std::fmt::{self, Debug};
use vtbuf_core::AttributeType;

/// A normalized vertex attribute.
pub struct VertexAttribute<V> {
	name: String,
	components: usize,
	attribute_type: AttributeType,
	buffer: String,
	value: AttributeValue<V>,
	is_stale: bool,
}

impl<V> VertexAttribute<V> {
	fn from_descriptor(descriptor: AttributeDescriptor<V>, default_buffer: &str) -> Result<Self> {
		let AttributeDescriptor {
			name,
			components,
			attribute_type,
			buffer,
			value,
		} = descriptor;

		let value = value.ok_or_else(|| anyhow!("attribute '{name}' has no value source"))?;
		let components = components.unwrap_or(1);
		ensure!(components > 0, "attribute '{name}' must have at least one component");
		check_constant(&name, components, &value)?;

		Ok(VertexAttribute {
			components,
			attribute_type: attribute_type.unwrap_or_default(),
			buffer: buffer.unwrap_or_else(|| default_buffer.to_string()),
			value,
			is_stale: true,
			name,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn components(&self) -> usize {
		self.components
	}

	pub fn attribute_type(&self) -> AttributeType {
		self.attribute_type
	}

	/// Id of the buffer this attribute is written into.
	pub fn buffer(&self) -> &str {
		&self.buffer
	}

	pub fn value(&self) -> &AttributeValue<V> {
		&self.value
	}

	pub fn is_stale(&self) -> bool {
		self.is_stale
	}

	pub fn is_feature_constant(&self) -> bool {
		self.value.is_feature_constant()
	}
}

impl<V> Debug for VertexAttribute<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VertexAttribute")
			.field("name", &self.name)
			.field("components", &self.components)
			.field("attribute_type", &self.attribute_type)
			.field("buffer", &self.buffer)
			.field("value", &self.value)
			.field("is_stale", &self.is_stale)
			.finish()
	}
}

fn check_constant<V>(name: &str, components: usize, value: &AttributeValue<V>) -> Result<()> {
	if let Some(constant) = value.as_constant() {
		ensure!(
			constant.len() == components,
			"constant value of attribute '{name}' has {} components, expected {components}",
			constant.len()
		);
	}
	Ok(())
}

/// Selects attributes by staleness and/or value source. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttributeFilter {
	pub is_stale: Option<bool>,
	pub is_feature_constant: Option<bool>,
}

impl AttributeFilter {
	pub fn all() -> Self {
		Self::default()
	}

	pub fn stale(mut self, is_stale: bool) -> Self {
		self.is_stale = Some(is_stale);
		self
	}

	pub fn feature_constant(mut self, is_feature_constant: bool) -> Self {
		self.is_feature_constant = Some(is_feature_constant);
		self
	}

	pub fn matches<V>(&self, attribute: &VertexAttribute<V>) -> bool {
		self.is_stale.is_none_or(|s| s == attribute.is_stale())
			&& self
				.is_feature_constant
				.is_none_or(|c| c == attribute.is_feature_constant())
	}
}

/// Ordered set of the attributes of one bucket, fixed at construction.
pub struct AttributeRegistry<V> {
	attributes: Vec<VertexAttribute<V>>,
}

impl<V> AttributeRegistry<V> {
	/// Normalizes `descriptors`. Fails on a missing value source, zero components, a constant of
	/// the wrong length or a duplicate name.
	pub fn new<I>(descriptors: I, default_buffer: &str) -> Result<Self>
	where
		I: IntoIterator<Item = AttributeDescriptor<V>>,
	{
		let mut attributes: Vec<VertexAttribute<V>> = Vec::new();
		for descriptor in descriptors {
			let attribute = VertexAttribute::from_descriptor(descriptor, default_buffer)?;
			ensure!(
				attributes.iter().all(|a| a.name != attribute.name),
				"attribute '{}' is defined twice",
				attribute.name
			);
			attributes.push(attribute);
		}
		Ok(AttributeRegistry { attributes })
	}

	pub fn get(&self, name: &str) -> Option<&VertexAttribute<V>> {
		self.attributes.iter().find(|a| a.name == name)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, VertexAttribute<V>> {
		self.attributes.iter()
	}

	pub fn filter(&self, filter: AttributeFilter) -> impl Iterator<Item = &VertexAttribute<V>> + '_ {
		self.attributes.iter().filter(move |a| filter.matches(a))
	}

	/// Attributes the next refresh pass has to write per vertex.
	pub fn stale_feature_dependent(&self) -> impl Iterator<Item = &VertexAttribute<V>> + '_ {
		self.filter(AttributeFilter::all().stale(true).feature_constant(false))
	}

	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}

	/// Replaces the value source of `name` and marks it stale. `None` keeps the current source.
	pub fn set_value(&mut self, name: &str, value: Option<AttributeValue<V>>) -> Result<()> {
		let attribute = self
			.attributes
			.iter_mut()
			.find(|a| a.name == name)
			.ok_or_else(|| anyhow!("unknown vertex attribute '{name}'"))?;

		if let Some(value) = value {
			check_constant(name, attribute.components, &value)?;
			attribute.value = value;
		}
		attribute.is_stale = true;
		Ok(())
	}

	pub fn mark_feature_dependent_fresh(&mut self) {
		for attribute in self.attributes.iter_mut().filter(|a| !a.is_feature_constant()) {
			attribute.is_stale = false;
		}
	}

	/// Returns the stale constant attributes as `(name, value)` and clears their flag.
	pub fn take_stale_constants(&mut self) -> Vec<(String, Vec<f64>)> {
		let mut constants = Vec::new();
		for attribute in &mut self.attributes {
			if let (true, Some(value)) = (attribute.is_stale, attribute.value.as_constant()) {
				constants.push((attribute.name.clone(), value.to_vec()));
				attribute.is_stale = false;
			}
		}
		constants
	}
}

impl<'a, V> IntoIterator for &'a AttributeRegistry<V> {
	type Item = &'a VertexAttribute<V>;
	type IntoIter = std::slice::Iter<'a, VertexAttribute<V>>;

	fn into_iter(self) -> Self::IntoIter {
		self.attributes.iter()
	}
}

impl<V> Debug for AttributeRegistry<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.attributes).finish()
	}
}
