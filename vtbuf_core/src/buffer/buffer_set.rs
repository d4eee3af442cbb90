use super::Buffer;
use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use std::{
	collections::BTreeMap,
	fmt::{self, Debug},
	sync::Arc,
};

/// A buffer handle that may be shared by several buckets.
pub type SharedBuffer = Arc<Mutex<dyn Buffer>>;

/// Maps buffer ids to shared buffer handles.
///
/// Cloning a `BufferSet` clones the handles, not the buffers.
#[derive(Clone, Default)]
pub struct BufferSet {
	buffers: BTreeMap<String, SharedBuffer>,
}

impl BufferSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `buffer` under `id` and returns a typed handle to it.
	///
	/// An existing buffer with the same id is replaced.
	pub fn insert<B: Buffer + 'static>(&mut self, id: &str, buffer: B) -> Arc<Mutex<B>> {
		let buffer = Arc::new(Mutex::new(buffer));
		self.insert_shared(id, buffer.clone());
		buffer
	}

	/// Registers an already shared handle under `id`.
	pub fn insert_shared(&mut self, id: &str, buffer: SharedBuffer) {
		if self.buffers.insert(id.to_string(), buffer).is_some() {
			log::debug!("replaced buffer '{id}'");
		}
	}

	pub fn get(&self, id: &str) -> Option<&SharedBuffer> {
		self.buffers.get(id)
	}

	/// Like [`get`](Self::get), but fails for unknown ids.
	pub fn require(&self, id: &str) -> Result<&SharedBuffer> {
		self
			.buffers
			.get(id)
			.ok_or_else(|| anyhow!("buffer '{id}' is not registered"))
	}

	pub fn contains(&self, id: &str) -> bool {
		self.buffers.contains_key(id)
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
		self.buffers.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.buffers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buffers.is_empty()
	}
}

impl Debug for BufferSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.buffers.keys()).finish()
	}
}
