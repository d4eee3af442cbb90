//! Buffer storage.
//!
//! Buckets never own their storage directly. They write through the [`Buffer`] trait into
//! handles registered in a [`BufferSet`], so several buckets of one tile can share the same
//! underlying vertex buffer.
//!
//! - [`Buffer`]: the write interface consumed by buckets.
//! - [`BufferLayout`]: describes how values are packed into bytes.
//! - [`ArrayBuffer`]: an in-memory, little-endian packed implementation.
//! - [`BufferSet`]: maps buffer ids to shared handles.

mod array_buffer;
mod buffer_set;
mod layout;

pub use array_buffer::ArrayBuffer;
pub use buffer_set::{BufferSet, SharedBuffer};
pub use layout::{AttributeLayout, BufferLayout, VertexLayout};

use anyhow::Result;

/// Write interface for vertex and element storage.
pub trait Buffer: Send {
	/// Writes a (possibly multi-component) value for `attribute` at the absolute slot `vertex_index`.
	///
	/// Writes are overwrites: repeated or out-of-order writes to the same slot are allowed.
	fn set_attribute(&mut self, vertex_index: u32, attribute: &str, value: &[f64]) -> Result<()>;

	/// Appends one element record, e.g. the three vertex indices of a triangle.
	fn add(&mut self, element: &[u32]) -> Result<()>;

	/// Appends several element records.
	///
	/// Implementations that can roll back should either append all records or none of them.
	fn add_all(&mut self, elements: &[Vec<u32>]) -> Result<()> {
		for element in elements {
			self.add(element)?;
		}
		Ok(())
	}
}
