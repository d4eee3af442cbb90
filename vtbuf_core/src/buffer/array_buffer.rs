//! This module provides [`ArrayBuffer`], an in-memory [`Buffer`] that packs vertices or elements
//! into a contiguous little-endian byte array ready for upload.
//!
//! # Examples
//!
//! ```
//! use vtbuf_core::{ArrayBuffer, AttributeType, Buffer, VertexLayout};
//!
//! let layout = VertexLayout::new([("a_pos", 2, AttributeType::Short)]).unwrap();
//! let mut buffer = ArrayBuffer::new_vertex(layout);
//! buffer.set_attribute(1, "a_pos", &[3.0, -4.0]).unwrap();
//!
//! assert_eq!(buffer.vertex_count(), 2);
//! assert_eq!(buffer.get_attribute(1, "a_pos").unwrap(), vec![3.0, -4.0]);
//! ```

use super::{AttributeLayout, Buffer, BufferLayout, VertexLayout};
use crate::types::AttributeType;
use anyhow::{Context, Result, anyhow, bail, ensure};

/// Growable byte array holding either interleaved vertices or index records.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayBuffer {
	layout: BufferLayout,
	data: Vec<u8>,
	length: usize,
}

impl ArrayBuffer {
	pub fn new(layout: BufferLayout) -> ArrayBuffer {
		ArrayBuffer {
			layout,
			data: Vec::new(),
			length: 0,
		}
	}

	pub fn new_vertex(layout: VertexLayout) -> ArrayBuffer {
		ArrayBuffer::new(BufferLayout::Vertex(layout))
	}

	pub fn new_element(indices_per_element: usize, index_type: AttributeType) -> Result<ArrayBuffer> {
		Ok(ArrayBuffer::new(BufferLayout::new_element(indices_per_element, index_type)?))
	}

	pub fn layout(&self) -> &BufferLayout {
		&self.layout
	}

	/// Number of items (vertices or elements) stored.
	pub fn len(&self) -> usize {
		self.length
	}

	pub fn is_empty(&self) -> bool {
		self.length == 0
	}

	pub fn vertex_count(&self) -> usize {
		match self.layout {
			BufferLayout::Vertex(_) => self.length,
			BufferLayout::Element { .. } => 0,
		}
	}

	pub fn element_count(&self) -> usize {
		match self.layout {
			BufferLayout::Vertex(_) => 0,
			BufferLayout::Element { .. } => self.length,
		}
	}

	/// Packed bytes of all items, `len() * item_size()` long.
	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	/// Drops all items while keeping the layout.
	pub fn clear(&mut self) {
		self.data.clear();
		self.length = 0;
	}

	fn vertex_attribute(&self, name: &str) -> Result<&AttributeLayout> {
		match &self.layout {
			BufferLayout::Vertex(layout) => layout
				.get(name)
				.ok_or_else(|| anyhow!("attribute '{name}' is not part of this vertex buffer")),
			BufferLayout::Element { .. } => bail!("element buffers have no attribute '{name}'"),
		}
	}

	/// Reads the components of `attribute` at `vertex_index`.
	pub fn get_attribute(&self, vertex_index: usize, attribute: &str) -> Result<Vec<f64>> {
		let layout = self.vertex_attribute(attribute)?;
		ensure!(
			vertex_index < self.length,
			"vertex {vertex_index} is out of bounds ({} vertices)",
			self.length
		);

		let start = vertex_index * self.layout.item_size() + layout.offset;
		let size = layout.attribute_type.size();
		Ok((0..layout.components)
			.map(|i| layout.attribute_type.read(&self.data[start + i * size..]))
			.collect())
	}

	/// Reads the indices of the element at `element_index`.
	pub fn get_element(&self, element_index: usize) -> Result<Vec<u32>> {
		let BufferLayout::Element {
			indices_per_element,
			index_type,
		} = self.layout
		else {
			bail!("vertex buffers have no elements");
		};
		ensure!(
			element_index < self.length,
			"element {element_index} is out of bounds ({} elements)",
			self.length
		);

		let start = element_index * self.layout.item_size();
		let size = index_type.size();
		Ok((0..indices_per_element)
			.map(|i| index_type.read(&self.data[start + i * size..]) as u32)
			.collect())
	}
}

impl Buffer for ArrayBuffer {
	fn set_attribute(&mut self, vertex_index: u32, attribute: &str, value: &[f64]) -> Result<()> {
		let layout = self.vertex_attribute(attribute)?.clone();
		ensure!(
			value.len() == layout.components,
			"attribute '{attribute}' expects {} components, got {}",
			layout.components,
			value.len()
		);

		// pack into scratch space first, a rejected value leaves the buffer untouched
		let size = layout.attribute_type.size();
		let mut packed = vec![0; layout.size()];
		for (chunk, component) in packed.chunks_exact_mut(size).zip(value) {
			layout
				.attribute_type
				.write(chunk, *component)
				.with_context(|| format!("Failed to write attribute '{attribute}' of vertex {vertex_index}"))?;
		}

		let stride = self.layout.item_size();
		let index = vertex_index as usize;
		if index >= self.length {
			self.length = index + 1;
			self.data.resize(self.length * stride, 0);
		}

		let start = index * stride + layout.offset;
		self.data[start..start + packed.len()].copy_from_slice(&packed);
		Ok(())
	}

	fn add(&mut self, element: &[u32]) -> Result<()> {
		let BufferLayout::Element {
			indices_per_element,
			index_type,
		} = self.layout
		else {
			bail!("can not add elements to a vertex buffer");
		};
		ensure!(
			element.len() == indices_per_element,
			"an element needs {indices_per_element} indices, got {}",
			element.len()
		);

		let size = index_type.size();
		let start = self.data.len();
		self.data.resize(start + indices_per_element * size, 0);
		for (i, index) in element.iter().enumerate() {
			let offset = start + i * size;
			if let Err(err) = index_type.write(&mut self.data[offset..offset + size], f64::from(*index)) {
				self.data.truncate(start);
				return Err(err.context(format!("Failed to add element {}", self.length)));
			}
		}
		self.length += 1;
		Ok(())
	}

	fn add_all(&mut self, elements: &[Vec<u32>]) -> Result<()> {
		let (length, bytes) = (self.length, self.data.len());
		for element in elements {
			if let Err(err) = self.add(element) {
				self.length = length;
				self.data.truncate(bytes);
				return Err(err);
			}
		}
		Ok(())
	}
}
