use crate::types::AttributeType;
use anyhow::{Result, ensure};

/// Placement of one attribute inside a vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeLayout {
	pub name: String,
	pub components: usize,
	pub attribute_type: AttributeType,
	/// Byte offset from the start of the vertex.
	pub offset: usize,
}

impl AttributeLayout {
	pub fn size(&self) -> usize {
		self.components * self.attribute_type.size()
	}
}

/// Interleaved layout of all attributes stored in one vertex buffer.
///
/// Each attribute starts at an offset aligned to its scalar size, and the stride is padded to a
/// multiple of 4 bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
	attributes: Vec<AttributeLayout>,
	stride: usize,
}

impl VertexLayout {
	/// Builds a layout from `(name, components, type)` triples in the given order.
	pub fn new<S: Into<String>>(attributes: impl IntoIterator<Item = (S, usize, AttributeType)>) -> Result<Self> {
		let mut layouts: Vec<AttributeLayout> = Vec::new();
		let mut offset = 0;

		for (name, components, attribute_type) in attributes {
			let name = name.into();
			ensure!(components > 0, "attribute '{name}' must have at least one component");
			ensure!(
				!layouts.iter().any(|a| a.name == name),
				"attribute '{name}' is defined twice"
			);

			offset = align(offset, attribute_type.size());
			let layout = AttributeLayout {
				name,
				components,
				attribute_type,
				offset,
			};
			offset += layout.size();
			layouts.push(layout);
		}

		ensure!(!layouts.is_empty(), "a vertex layout needs at least one attribute");

		Ok(VertexLayout {
			attributes: layouts,
			stride: align(offset, 4),
		})
	}

	pub fn stride(&self) -> usize {
		self.stride
	}

	pub fn attributes(&self) -> &[AttributeLayout] {
		&self.attributes
	}

	pub fn get(&self, name: &str) -> Option<&AttributeLayout> {
		self.attributes.iter().find(|a| a.name == name)
	}
}

/// How an [`ArrayBuffer`](super::ArrayBuffer) packs its items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferLayout {
	/// Interleaved per-vertex attributes, written by slot.
	Vertex(VertexLayout),
	/// Fixed-size index records, appended one element at a time.
	Element {
		indices_per_element: usize,
		index_type: AttributeType,
	},
}

impl BufferLayout {
	pub fn new_element(indices_per_element: usize, index_type: AttributeType) -> Result<Self> {
		ensure!(indices_per_element > 0, "an element needs at least one index");
		ensure!(
			matches!(
				index_type,
				AttributeType::UnsignedByte | AttributeType::UnsignedShort | AttributeType::UnsignedInt
			),
			"index type must be unsigned, got {index_type}"
		);
		Ok(BufferLayout::Element {
			indices_per_element,
			index_type,
		})
	}

	/// Size of one item (vertex or element) in bytes.
	pub fn item_size(&self) -> usize {
		match self {
			BufferLayout::Vertex(layout) => layout.stride(),
			BufferLayout::Element {
				indices_per_element,
				index_type,
			} => indices_per_element * index_type.size(),
		}
	}
}

fn align(offset: usize, alignment: usize) -> usize {
	offset.div_ceil(alignment) * alignment
}
