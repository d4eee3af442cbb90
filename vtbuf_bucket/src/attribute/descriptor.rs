use super::AttributeValue;
use std::fmt::{self, Debug};
use vtbuf_core::AttributeType;

/// A partial attribute description. Missing fields are filled in when the attribute is
/// registered with a bucket.
pub struct AttributeDescriptor<V> {
	pub name: String,
	pub components: Option<usize>,
	pub attribute_type: Option<AttributeType>,
	/// Target buffer id; defaults to the bucket's vertex buffer.
	pub buffer: Option<String>,
	pub value: Option<AttributeValue<V>>,
}

impl<V> AttributeDescriptor<V> {
	pub fn new(name: &str) -> Self {
		AttributeDescriptor {
			name: name.to_string(),
			components: None,
			attribute_type: None,
			buffer: None,
			value: None,
		}
	}

	pub fn with_components(mut self, components: usize) -> Self {
		self.components = Some(components);
		self
	}

	pub fn with_type(mut self, attribute_type: AttributeType) -> Self {
		self.attribute_type = Some(attribute_type);
		self
	}

	pub fn with_buffer(mut self, buffer: &str) -> Self {
		self.buffer = Some(buffer.to_string());
		self
	}

	pub fn with_value(mut self, value: impl Into<AttributeValue<V>>) -> Self {
		self.value = Some(value.into());
		self
	}
}

impl<V> Clone for AttributeDescriptor<V> {
	fn clone(&self) -> Self {
		AttributeDescriptor {
			name: self.name.clone(),
			components: self.components,
			attribute_type: self.attribute_type,
			buffer: self.buffer.clone(),
			value: self.value.clone(),
		}
	}
}

impl<V> Debug for AttributeDescriptor<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttributeDescriptor")
			.field("name", &self.name)
			.field("components", &self.components)
			.field("attribute_type", &self.attribute_type)
			.field("buffer", &self.buffer)
			.field("value", &self.value)
			.finish()
	}
}
