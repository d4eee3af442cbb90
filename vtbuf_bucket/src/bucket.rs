//! The [`Bucket`]: features of one style layer in one tile, plus everything needed to turn them
//! into vertex and element buffers.
//!
//! A bucket is created per style layer and tile, receives its features from the layout stage, and
//! is refreshed before every render or transfer. Only stale data is rewritten by a refresh; see
//! [`Bucket::refresh`].

use crate::{
	ElementGroup, ElementVertexGenerator, SerializedBucket,
	attribute::{AttributeDescriptor, AttributeFilter, AttributeRegistry, AttributeValue, VertexAttribute},
};
use anyhow::{Context, Result, ensure};
use std::{
	fmt::{self, Debug},
	sync::Arc,
};
use vtbuf_core::{BufferSet, Mode};

/// Number of vertices a 16-bit index buffer can address, the default element group limit.
pub const ELEMENT_GROUP_VERTEX_LENGTH: u32 = 65535;

/// Predicate deciding whether the layout stage adds a feature to a bucket.
pub type FeatureFilter<F> = Box<dyn Fn(&F) -> bool + Send + Sync>;

/// Everything needed to construct a [`Bucket`].
pub struct BucketOptions<G: ElementVertexGenerator> {
	/// Identifier, usually the style layer id.
	pub id: String,
	pub mode: Mode,
	pub generator: G,
	pub filter: Option<FeatureFilter<G::Feature>>,
	pub buffers: BufferSet,
	/// Default target buffer of attributes that do not name one.
	pub vertex_buffer: String,
	pub element_buffer: String,
	pub attributes: Vec<AttributeDescriptor<G::Vertex>>,
	pub element_group_vertex_length: u32,
}

impl<G: ElementVertexGenerator> BucketOptions<G> {
	/// Options with `TRIANGLES` mode, the buffer ids `"vertex"` and `"element"`, no attributes
	/// and the 16-bit element group limit.
	pub fn new(id: &str, generator: G, buffers: BufferSet) -> Self {
		BucketOptions {
			id: id.to_string(),
			mode: Mode::default(),
			generator,
			filter: None,
			buffers,
			vertex_buffer: String::from("vertex"),
			element_buffer: String::from("element"),
			attributes: Vec::new(),
			element_group_vertex_length: ELEMENT_GROUP_VERTEX_LENGTH,
		}
	}

	pub fn with_mode(mut self, mode: Mode) -> Self {
		self.mode = mode;
		self
	}

	pub fn with_filter<F>(mut self, filter: F) -> Self
	where
		F: Fn(&G::Feature) -> bool + Send + Sync + 'static,
	{
		self.filter = Some(Box::new(filter));
		self
	}

	pub fn with_vertex_buffer(mut self, id: &str) -> Self {
		self.vertex_buffer = id.to_string();
		self
	}

	pub fn with_element_buffer(mut self, id: &str) -> Self {
		self.element_buffer = id.to_string();
		self
	}

	pub fn with_attribute(mut self, descriptor: AttributeDescriptor<G::Vertex>) -> Self {
		self.attributes.push(descriptor);
		self
	}

	pub fn with_element_group_vertex_length(mut self, length: u32) -> Self {
		self.element_group_vertex_length = length;
		self
	}
}

/// Features of one style layer together with their attribute set and buffer state.
pub struct Bucket<G: ElementVertexGenerator> {
	pub(crate) id: String,
	pub(crate) mode: Mode,
	pub(crate) generator: G,
	pub(crate) filter: Option<FeatureFilter<G::Feature>>,
	pub(crate) features: Vec<G::Feature>,
	pub(crate) attributes: AttributeRegistry<G::Vertex>,
	pub(crate) buffers: BufferSet,
	pub(crate) element_buffer: String,
	pub(crate) is_element_buffer_stale: bool,
	pub(crate) element_groups: Vec<ElementGroup>,
	pub(crate) vertex_length: u32,
	pub(crate) element_length: u32,
	pub(crate) element_group_vertex_length: u32,
}

impl<G: ElementVertexGenerator> Bucket<G> {
	/// Normalizes the attribute descriptors and checks that every referenced buffer exists.
	///
	/// Fails if an attribute has no value source, if a buffer id is unknown, or if an attribute
	/// targets the element buffer.
	pub fn new(options: BucketOptions<G>) -> Result<Self> {
		let BucketOptions {
			id,
			mode,
			generator,
			filter,
			buffers,
			vertex_buffer,
			element_buffer,
			attributes,
			element_group_vertex_length,
		} = options;

		ensure!(
			element_group_vertex_length > 0,
			"element group vertex length of bucket '{id}' must be positive"
		);

		let attributes = AttributeRegistry::new(attributes, &vertex_buffer)
			.with_context(|| format!("Failed to register vertex attributes of bucket '{id}'"))?;

		for attribute in &attributes {
			ensure!(
				buffers.contains(attribute.buffer()),
				"buffer '{}' of attribute '{}' is not registered",
				attribute.buffer(),
				attribute.name()
			);
			ensure!(
				attribute.buffer() != element_buffer,
				"attribute '{}' can not be written into the element buffer '{element_buffer}'",
				attribute.name()
			);
		}
		ensure!(
			buffers.contains(&element_buffer),
			"element buffer '{element_buffer}' is not registered"
		);

		let element_handle = buffers.require(&element_buffer)?;
		for attribute in &attributes {
			ensure!(
				!Arc::ptr_eq(buffers.require(attribute.buffer())?, element_handle),
				"buffer '{}' of attribute '{}' is the element buffer '{element_buffer}'",
				attribute.buffer(),
				attribute.name()
			);
		}

		log::debug!("created bucket '{id}' with {} vertex attributes", attributes.len());

		Ok(Bucket {
			id,
			mode,
			generator,
			filter,
			features: Vec::new(),
			attributes,
			buffers,
			element_buffer,
			is_element_buffer_stale: true,
			element_groups: Vec::new(),
			vertex_length: 0,
			element_length: 0,
			element_group_vertex_length,
		})
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn generator(&self) -> &G {
		&self.generator
	}

	/// Appends a feature. Features are expected to be complete before the first refresh.
	pub fn add_feature(&mut self, feature: G::Feature) {
		self.features.push(feature);
	}

	pub fn features(&self) -> &[G::Feature] {
		&self.features
	}

	/// Whether `feature` passes this bucket's filter. Buckets without filter accept everything.
	///
	/// The filter is meant for the layout stage; refreshing never re-applies it.
	pub fn matches_filter(&self, feature: &G::Feature) -> bool {
		self.filter.as_ref().is_none_or(|filter| filter(feature))
	}

	pub fn vertex_attribute(&self, name: &str) -> Option<&VertexAttribute<G::Vertex>> {
		self.attributes.get(name)
	}

	pub fn vertex_attributes(&self, filter: AttributeFilter) -> impl Iterator<Item = &VertexAttribute<G::Vertex>> + '_ {
		self.attributes.filter(filter)
	}

	/// Replaces the value source of an attribute and marks it stale.
	///
	/// `None` keeps the current source and only marks it stale. Buffers are rewritten on the
	/// next [`refresh`](Self::refresh).
	pub fn set_vertex_attribute_value(&mut self, name: &str, value: Option<AttributeValue<G::Vertex>>) -> Result<()> {
		self
			.attributes
			.set_value(name, value)
			.with_context(|| format!("Failed to set vertex attribute value in bucket '{}'", self.id))
	}

	/// Constant attributes that changed since they were last taken, as `(name, value)`.
	/// Their stale flag is cleared.
	pub fn take_stale_constants(&mut self) -> Vec<(String, Vec<f64>)> {
		self.attributes.take_stale_constants()
	}

	pub fn is_element_buffer_stale(&self) -> bool {
		self.is_element_buffer_stale
	}

	pub fn element_groups(&self) -> &[ElementGroup] {
		&self.element_groups
	}

	pub fn vertex_length(&self) -> u32 {
		self.vertex_length
	}

	pub fn element_length(&self) -> u32 {
		self.element_length
	}

	pub fn element_buffer(&self) -> &str {
		&self.element_buffer
	}

	pub fn buffers(&self) -> &BufferSet {
		&self.buffers
	}

	pub fn element_group_vertex_length(&self) -> u32 {
		self.element_group_vertex_length
	}

	/// Refreshes the buffers and captures a function-free snapshot of this bucket.
	pub fn serialize(&mut self) -> Result<SerializedBucket> {
		self
			.refresh()
			.with_context(|| format!("Failed to refresh bucket '{}' before serializing", self.id))?;
		Ok(SerializedBucket::capture(self))
	}
}

impl<G: ElementVertexGenerator> Debug for Bucket<G> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Bucket")
			.field("id", &self.id)
			.field("mode", &self.mode)
			.field("features", &self.features.len())
			.field("attributes", &self.attributes)
			.field("buffers", &self.buffers)
			.field("element_buffer", &self.element_buffer)
			.field("is_element_buffer_stale", &self.is_element_buffer_stale)
			.field("element_groups", &self.element_groups)
			.field("vertex_length", &self.vertex_length)
			.field("element_length", &self.element_length)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{TestFeature, TestGenerator, TestVertex, test_buffers};
	use pretty_assertions::assert_eq;
	use vtbuf_core::AttributeType;

	fn options() -> BucketOptions<TestGenerator> {
		BucketOptions::new("water", TestGenerator, test_buffers().0)
			.with_attribute(AttributeDescriptor::new("a_color").with_components(4).with_value(vec![0.0, 0.0, 255.0, 255.0]))
			.with_attribute(
				AttributeDescriptor::new("a_width")
					.with_type(AttributeType::Float)
					.with_value(AttributeValue::computed(|v: &TestVertex| vec![v.weight])),
			)
	}

	#[test]
	fn test_new() -> Result<()> {
		let bucket = Bucket::new(options())?;

		assert_eq!(bucket.id(), "water");
		assert_eq!(bucket.mode(), Mode::Triangles);
		assert!(bucket.is_element_buffer_stale());
		assert!(bucket.element_groups().is_empty());
		assert_eq!(bucket.vertex_length(), 0);
		assert_eq!(bucket.element_length(), 0);
		assert_eq!(bucket.element_buffer(), "element");
		assert_eq!(bucket.element_group_vertex_length(), ELEMENT_GROUP_VERTEX_LENGTH);
		assert_eq!(bucket.vertex_attribute("a_width").map(VertexAttribute::buffer), Some("vertex"));
		assert_eq!(bucket.vertex_attributes(AttributeFilter::all().stale(true)).count(), 2);
		Ok(())
	}

	#[test]
	fn test_new_rejects_attributes_in_element_buffer() {
		let (mut buffers, _, _) = test_buffers();
		let element = buffers.require("element").unwrap().clone();
		buffers.insert_shared("alias", element);

		let options = BucketOptions::new("alias", TestGenerator, buffers).with_attribute(
			AttributeDescriptor::new("a_width")
				.with_buffer("alias")
				.with_value(AttributeValue::computed(|v: &TestVertex| vec![v.weight])),
		);
		let error = Bucket::new(options).unwrap_err();
		assert_eq!(
			error.to_string(),
			"buffer 'alias' of attribute 'a_width' is the element buffer 'element'"
		);
	}

	#[test]
	fn test_new_rejects_missing_value() {
		let error = Bucket::new(options().with_attribute(AttributeDescriptor::new("a_broken"))).unwrap_err();
		assert_eq!(
			format!("{error:#}"),
			"Failed to register vertex attributes of bucket 'water': attribute 'a_broken' has no value source"
		);
	}

	#[test]
	fn test_new_rejects_unknown_buffers() {
		assert!(Bucket::new(options().with_vertex_buffer("nowhere")).is_err());
		assert!(Bucket::new(options().with_element_buffer("nowhere")).is_err());
		assert!(
			Bucket::new(options().with_attribute(
				AttributeDescriptor::new("a_index")
					.with_buffer("element")
					.with_value(1.0)
			))
			.is_err()
		);
		assert!(Bucket::new(options().with_element_group_vertex_length(0)).is_err());
	}

	#[test]
	fn test_features_and_filter() -> Result<()> {
		let mut bucket = Bucket::new(options().with_filter(|f: &TestFeature| f.vertices > 0))?;
		assert!(bucket.matches_filter(&TestFeature::new(3, 1)));
		assert!(!bucket.matches_filter(&TestFeature::new(0, 0)));

		bucket.add_feature(TestFeature::new(3, 1));
		bucket.add_feature(TestFeature::new(0, 0));
		assert_eq!(bucket.features().len(), 2);

		let unfiltered = Bucket::new(options())?;
		assert!(unfiltered.matches_filter(&TestFeature::new(0, 0)));
		Ok(())
	}

	#[test]
	fn test_set_vertex_attribute_value() -> Result<()> {
		let mut bucket = Bucket::new(options())?;
		bucket.refresh()?;
		assert!(!bucket.vertex_attribute("a_width").unwrap().is_stale());

		bucket.set_vertex_attribute_value("a_width", None)?;
		assert!(bucket.vertex_attribute("a_width").unwrap().is_stale());

		bucket.set_vertex_attribute_value("a_width", Some(AttributeValue::constant([2.0])))?;
		assert!(bucket.vertex_attribute("a_width").unwrap().is_feature_constant());

		assert!(bucket.set_vertex_attribute_value("a_missing", None).is_err());
		Ok(())
	}

	#[test]
	fn test_take_stale_constants() -> Result<()> {
		let mut bucket = Bucket::new(options())?;
		assert_eq!(
			bucket.take_stale_constants(),
			vec![("a_color".to_string(), vec![0.0, 0.0, 255.0, 255.0])]
		);
		assert!(bucket.take_stale_constants().is_empty());
		Ok(())
	}

	#[test]
	fn test_debug_lists_state() -> Result<()> {
		let bucket = Bucket::new(options())?;
		let debug = format!("{bucket:?}");
		assert!(debug.starts_with("Bucket { id: \"water\", mode: Triangles, features: 0"));
		Ok(())
	}
}
