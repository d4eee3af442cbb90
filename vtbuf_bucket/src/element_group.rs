//! Element groups.
//!
//! A 16-bit index buffer can only address 65535 vertices, so the vertices and elements produced
//! by one refresh pass are partitioned into [`ElementGroup`]s. The [`ElementGroupSplitter`]
//! closes a group only between features: when a feature pushes the pending group over the
//! ceiling, the group is closed where that feature started and the feature opens the next one.

use serde::{Deserialize, Serialize};

/// A contiguous range of vertices and elements: `[vertex_index, vertex_index + vertex_length)`
/// and `[element_index, element_index + element_length)`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ElementGroup {
	pub vertex_index: u32,
	pub vertex_length: u32,
	pub element_index: u32,
	pub element_length: u32,
}

impl ElementGroup {
	pub fn new(vertex_index: u32, vertex_length: u32, element_index: u32, element_length: u32) -> Self {
		ElementGroup {
			vertex_index,
			vertex_length,
			element_index,
			element_length,
		}
	}

	fn starting_at(cursor: IndexCursor) -> Self {
		ElementGroup::new(cursor.vertex_index, 0, cursor.element_index, 0)
	}

	pub fn vertex_end(&self) -> u32 {
		self.vertex_index + self.vertex_length
	}

	pub fn element_end(&self) -> u32 {
		self.element_index + self.element_length
	}
}

/// Position of the vertex and element counters during a refresh pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexCursor {
	pub vertex_index: u32,
	pub element_index: u32,
}

impl IndexCursor {
	pub fn new(vertex_index: u32, element_index: u32) -> Self {
		IndexCursor {
			vertex_index,
			element_index,
		}
	}
}

/// Builds the element group table of one refresh pass.
#[derive(Clone, Debug)]
pub struct ElementGroupSplitter {
	ceiling: u32,
	groups: Vec<ElementGroup>,
	pending: ElementGroup,
}

impl ElementGroupSplitter {
	/// Starts an empty table whose pending group begins at `(0, 0)`.
	pub fn new(ceiling: u32) -> Self {
		ElementGroupSplitter {
			ceiling,
			groups: Vec::new(),
			pending: ElementGroup::default(),
		}
	}

	pub fn ceiling(&self) -> u32 {
		self.ceiling
	}

	pub fn pending(&self) -> &ElementGroup {
		&self.pending
	}

	pub fn count_vertex(&mut self) {
		self.pending.vertex_length += 1;
	}

	pub fn count_element(&mut self) {
		self.pending.element_length += 1;
	}

	/// Called after each feature with the counters at feature entry (`start`) and now (`end`).
	pub fn end_feature(&mut self, start: IndexCursor, end: IndexCursor) {
		if self.pending.vertex_length <= self.ceiling {
			return;
		}

		if start.vertex_index == self.pending.vertex_index {
			// nothing precedes this feature in the pending group, so there is no boundary to close
			log::warn!(
				"a single feature produced {} vertices, exceeding the element group limit of {}",
				end.vertex_index - start.vertex_index,
				self.ceiling
			);
			return;
		}

		self.close(start);
		self.pending.vertex_length = end.vertex_index - start.vertex_index;
		self.pending.element_length = end.element_index - start.element_index;

		if self.pending.vertex_length > self.ceiling {
			log::warn!(
				"a single feature produced {} vertices, exceeding the element group limit of {}",
				self.pending.vertex_length,
				self.ceiling
			);
		}
	}

	/// Closes the trailing group, even when it is empty, and returns the full table.
	pub fn finish(mut self, end: IndexCursor) -> Vec<ElementGroup> {
		self.close(end);
		self.groups
	}

	fn close(&mut self, at: IndexCursor) {
		self.pending.vertex_length = at.vertex_index - self.pending.vertex_index;
		self.pending.element_length = at.element_index - self.pending.element_index;
		self.groups.push(self.pending);
		self.pending = ElementGroup::starting_at(at);
	}
}
