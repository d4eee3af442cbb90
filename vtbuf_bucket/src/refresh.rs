//! Refresh engine.
//!
//! A refresh pass replays every feature of a bucket through its generator. The generator reports
//! vertices and elements to a [`RefreshContext`], which writes only the stale feature-dependent
//! attributes and, if the element buffer is stale, collects the elements. Collected elements are
//! appended once every feature has been generated, so a failed pass never leaves a partial element
//! list behind. Counters and the element group table are rebuilt on every pass; staleness flags are
//! cleared once the pass has completed.

use crate::{
	Bucket, ElementGroup, ElementGroupSplitter, ElementVertexGenerator, IndexCursor, attribute::VertexAttribute,
};
use anyhow::{Context, Result};
use parking_lot::MutexGuard;
use std::sync::Arc;
use vtbuf_core::{Buffer, BufferSet, SharedBuffer};

struct StaleAttribute<'a, V> {
	attribute: &'a VertexAttribute<V>,
	/// Index into `RefreshContext::vertex_buffers`.
	buffer: usize,
}

/// State of one refresh pass, handed to the generator for every feature.
///
/// Every target buffer is locked once for the duration of the pass.
pub struct RefreshContext<'a, V> {
	attributes: Vec<StaleAttribute<'a, V>>,
	vertex_buffers: Vec<MutexGuard<'a, dyn Buffer>>,
	element_buffer: Option<MutexGuard<'a, dyn Buffer>>,
	elements: Vec<Vec<u32>>,
	cursor: IndexCursor,
	splitter: ElementGroupSplitter,
}

impl<'a, V> RefreshContext<'a, V> {
	/// Prepares a pass writing `attributes` and, if `element_buffer` is given, the elements.
	pub(crate) fn new(
		attributes: Vec<&'a VertexAttribute<V>>,
		buffers: &'a BufferSet,
		element_buffer: Option<&str>,
		ceiling: u32,
	) -> Result<Self> {
		let mut handles: Vec<&'a SharedBuffer> = Vec::new();
		let mut stale = Vec::with_capacity(attributes.len());

		for attribute in attributes {
			let handle = buffers
				.require(attribute.buffer())
				.with_context(|| format!("Failed to resolve the buffer of attribute '{}'", attribute.name()))?;
			let buffer = if let Some(index) = handles.iter().position(|h| Arc::ptr_eq(h, handle)) {
				index
			} else {
				handles.push(handle);
				handles.len() - 1
			};
			stale.push(StaleAttribute { attribute, buffer });
		}

		// Bucket::new makes sure the element buffer is not one of the vertex buffers
		let element_handle = element_buffer
			.map(|id| buffers.require(id))
			.transpose()
			.context("Failed to resolve the element buffer")?;

		Ok(RefreshContext {
			attributes: stale,
			vertex_buffers: handles.into_iter().map(|h| h.lock()).collect(),
			element_buffer: element_handle.map(|h| h.lock()),
			elements: Vec::new(),
			cursor: IndexCursor::default(),
			splitter: ElementGroupSplitter::new(ceiling),
		})
	}

	/// Reports one vertex and returns its index.
	///
	/// Every stale feature-dependent attribute is evaluated for `data` and written at that index.
	pub fn add_vertex(&mut self, data: &V) -> Result<u32> {
		let index = self.cursor.vertex_index;
		for stale in &self.attributes {
			let value = stale.attribute.value().evaluate(data);
			self.vertex_buffers[stale.buffer]
				.set_attribute(index, stale.attribute.name(), &value)
				.with_context(|| format!("Failed to write attribute '{}' of vertex {index}", stale.attribute.name()))?;
		}
		self.splitter.count_vertex();
		self.cursor.vertex_index += 1;
		Ok(index)
	}

	/// Reports one element and returns its index. The element is only written if the element
	/// buffer is stale, after the last feature of the pass.
	pub fn add_element(&mut self, element: &[u32]) -> Result<u32> {
		let index = self.cursor.element_index;
		if self.element_buffer.is_some() {
			self.elements.push(element.to_vec());
		}
		self.splitter.count_element();
		self.cursor.element_index += 1;
		Ok(index)
	}

	/// Index the next vertex will get.
	pub fn vertex_index(&self) -> u32 {
		self.cursor.vertex_index
	}

	/// Index the next element will get.
	pub fn element_index(&self) -> u32 {
		self.cursor.element_index
	}

	pub fn cursor(&self) -> IndexCursor {
		self.cursor
	}

	/// Whether this pass writes elements.
	pub fn writes_elements(&self) -> bool {
		self.element_buffer.is_some()
	}

	/// Number of attributes written per vertex in this pass.
	pub fn stale_attribute_count(&self) -> usize {
		self.attributes.len()
	}

	pub(crate) fn end_feature(&mut self, start: IndexCursor) {
		self.splitter.end_feature(start, self.cursor);
	}

	/// Appends the collected elements, releases the buffers and returns the final counters and
	/// group table.
	pub(crate) fn finish(self) -> Result<(IndexCursor, Vec<ElementGroup>)> {
		let RefreshContext {
			element_buffer,
			elements,
			cursor,
			splitter,
			..
		} = self;
		if let Some(mut buffer) = element_buffer {
			buffer
				.add_all(&elements)
				.with_context(|| format!("Failed to write {} elements", elements.len()))?;
		}
		Ok((cursor, splitter.finish(cursor)))
	}
}

impl<G: ElementVertexGenerator> Bucket<G> {
	/// Brings the buffers up to date. Returns `false` without touching anything when no
	/// feature-dependent attribute and not the element buffer is stale.
	///
	/// Otherwise all features are replayed through the generator, the stale data is rewritten,
	/// the element groups and totals are rebuilt, and the feature-dependent attributes and the
	/// element buffer are marked fresh. Constant attributes are never written here.
	///
	/// If a buffer write or the generator fails, the pass is aborted and the bucket keeps its
	/// previous groups, totals and staleness flags, so the next refresh runs the full pass again.
	pub fn refresh(&mut self) -> Result<bool> {
		let stale: Vec<&VertexAttribute<G::Vertex>> = self.attributes.stale_feature_dependent().collect();
		if stale.is_empty() && !self.is_element_buffer_stale {
			log::trace!("bucket '{}' is up to date", self.id);
			return Ok(false);
		}

		log::debug!(
			"refreshing bucket '{}': {} stale attributes, element buffer stale: {}",
			self.id,
			stale.len(),
			self.is_element_buffer_stale
		);

		let element_buffer = self.is_element_buffer_stale.then_some(self.element_buffer.as_str());
		let mut context = RefreshContext::new(stale, &self.buffers, element_buffer, self.element_group_vertex_length)
			.with_context(|| format!("Failed to prepare refresh of bucket '{}'", self.id))?;

		for (index, feature) in self.features.iter().enumerate() {
			let start = context.cursor();
			self
				.generator
				.generate(feature, &mut context)
				.with_context(|| format!("Failed to generate feature {index} of bucket '{}'", self.id))?;
			context.end_feature(start);
		}

		let (end, groups) = context
			.finish()
			.with_context(|| format!("Failed to finish refresh of bucket '{}'", self.id))?;
		self.element_groups = groups;
		self.vertex_length = end.vertex_index;
		self.element_length = end.element_index;

		self.attributes.mark_feature_dependent_fresh();
		self.is_element_buffer_stale = false;

		log::debug!(
			"refreshed bucket '{}': {} vertices, {} elements in {} element groups",
			self.id,
			self.vertex_length,
			self.element_length,
			self.element_groups.len()
		);
		Ok(true)
	}
}
