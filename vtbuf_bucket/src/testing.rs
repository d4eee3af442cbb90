//! Test doubles shared by the unit tests of this crate.

use crate::{ElementVertexGenerator, FeatureProperties, RefreshContext};
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use vtbuf_core::{ArrayBuffer, AttributeType, Buffer, BufferSet, VertexLayout};

/// A feature that tessellates into `vertices` vertices and `elements` triangles.
#[derive(Clone, Debug, PartialEq)]
pub struct TestFeature {
	pub vertices: u32,
	pub elements: u32,
	pub weight: f64,
}

impl TestFeature {
	pub fn new(vertices: u32, elements: u32) -> Self {
		TestFeature {
			vertices,
			elements,
			weight: 1.0,
		}
	}

	pub fn with_weight(mut self, weight: f64) -> Self {
		self.weight = weight;
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestVertex {
	/// Position of the vertex within its feature.
	pub x: f64,
	pub weight: f64,
}

impl FeatureProperties for TestVertex {
	fn property(&self, key: &str) -> Option<f64> {
		match key {
			"weight" => Some(self.weight),
			_ => None,
		}
	}
}

/// Emits the vertices of a feature first, then triangles over them.
pub struct TestGenerator;

impl ElementVertexGenerator for TestGenerator {
	type Feature = TestFeature;
	type Vertex = TestVertex;

	fn generate(&self, feature: &TestFeature, context: &mut RefreshContext<'_, TestVertex>) -> Result<()> {
		let mut first = None;
		for i in 0..feature.vertices {
			let index = context.add_vertex(&TestVertex {
				x: f64::from(i),
				weight: feature.weight,
			})?;
			first.get_or_insert(index);
		}

		let first = first.unwrap_or(context.vertex_index());
		let n = feature.vertices.max(1);
		for j in 0..feature.elements {
			context.add_element(&[first + j % n, first + (j + 1) % n, first + (j + 2) % n])?;
		}
		Ok(())
	}
}

/// Vertex layout: `a_color` (4 x UNSIGNED_BYTE), `a_width` and `a_opacity` (FLOAT).
pub fn test_vertex_layout() -> VertexLayout {
	VertexLayout::new([
		("a_color", 4, AttributeType::UnsignedByte),
		("a_width", 1, AttributeType::Float),
		("a_opacity", 1, AttributeType::Float),
	])
	.unwrap()
}

/// Buffers `"vertex"` and `"element"` backed by [`ArrayBuffer`]s.
pub fn test_buffers() -> (BufferSet, Arc<Mutex<ArrayBuffer>>, Arc<Mutex<ArrayBuffer>>) {
	let mut buffers = BufferSet::new();
	let vertex = buffers.insert("vertex", ArrayBuffer::new_vertex(test_vertex_layout()));
	let element = buffers.insert(
		"element",
		ArrayBuffer::new_element(3, AttributeType::UnsignedShort).unwrap(),
	);
	(buffers, vertex, element)
}

#[derive(Clone, Debug, PartialEq)]
pub enum BufferCall {
	SetAttribute {
		vertex_index: u32,
		attribute: String,
		value: Vec<f64>,
	},
	Add(Vec<u32>),
}

/// A buffer that only records the calls it receives.
#[derive(Debug, Default)]
pub struct RecordingBuffer {
	pub calls: Vec<BufferCall>,
}

impl RecordingBuffer {
	pub fn set_attribute_calls(&self, attribute: &str) -> usize {
		self
			.calls
			.iter()
			.filter(|c| matches!(c, BufferCall::SetAttribute { attribute: a, .. } if a == attribute))
			.count()
	}

	pub fn add_calls(&self) -> usize {
		self.calls.iter().filter(|c| matches!(c, BufferCall::Add(_))).count()
	}
}

impl Buffer for RecordingBuffer {
	fn set_attribute(&mut self, vertex_index: u32, attribute: &str, value: &[f64]) -> Result<()> {
		self.calls.push(BufferCall::SetAttribute {
			vertex_index,
			attribute: attribute.to_string(),
			value: value.to_vec(),
		});
		Ok(())
	}

	fn add(&mut self, element: &[u32]) -> Result<()> {
		self.calls.push(BufferCall::Add(element.to_vec()));
		Ok(())
	}
}

pub struct RecordingBuffers {
	pub set: BufferSet,
	pub vertex: Arc<Mutex<RecordingBuffer>>,
	pub extra: Arc<Mutex<RecordingBuffer>>,
	pub element: Arc<Mutex<RecordingBuffer>>,
}

impl RecordingBuffers {
	/// Buffers `"vertex"`, `"extra"` and `"element"`, each recording its calls.
	pub fn new() -> Self {
		let mut set = BufferSet::new();
		let vertex = set.insert("vertex", RecordingBuffer::default());
		let extra = set.insert("extra", RecordingBuffer::default());
		let element = set.insert("element", RecordingBuffer::default());
		RecordingBuffers {
			set,
			vertex,
			extra,
			element,
		}
	}

	pub fn clear(&self) {
		self.vertex.lock().calls.clear();
		self.extra.lock().calls.clear();
		self.element.lock().calls.clear();
	}
}
