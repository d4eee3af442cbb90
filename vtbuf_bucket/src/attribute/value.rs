use std::{
	borrow::Cow,
	fmt::{self, Debug},
	sync::Arc,
};

/// Signature of a per-vertex value function.
pub type ComputeFn<V> = dyn Fn(&V) -> Vec<f64> + Send + Sync;

/// Where the value of a vertex attribute comes from.
pub enum AttributeValue<V> {
	/// One value shared by every vertex. Uploaded once, never written per vertex.
	Constant(Vec<f64>),
	/// A value computed from the data of each vertex.
	Computed(Arc<ComputeFn<V>>),
}

impl<V> AttributeValue<V> {
	pub fn constant(value: impl Into<Vec<f64>>) -> Self {
		AttributeValue::Constant(value.into())
	}

	pub fn computed<F>(function: F) -> Self
	where
		F: Fn(&V) -> Vec<f64> + Send + Sync + 'static,
	{
		AttributeValue::Computed(Arc::new(function))
	}

	pub fn is_feature_constant(&self) -> bool {
		matches!(self, AttributeValue::Constant(_))
	}

	pub fn as_constant(&self) -> Option<&[f64]> {
		match self {
			AttributeValue::Constant(value) => Some(value),
			AttributeValue::Computed(_) => None,
		}
	}

	/// Value of this source for one vertex.
	pub fn evaluate(&self, data: &V) -> Cow<'_, [f64]> {
		match self {
			AttributeValue::Constant(value) => Cow::Borrowed(value),
			AttributeValue::Computed(function) => Cow::Owned(function(data)),
		}
	}
}

impl<V> Clone for AttributeValue<V> {
	fn clone(&self) -> Self {
		match self {
			AttributeValue::Constant(value) => AttributeValue::Constant(value.clone()),
			AttributeValue::Computed(function) => AttributeValue::Computed(Arc::clone(function)),
		}
	}
}

impl<V> Debug for AttributeValue<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttributeValue::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			AttributeValue::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl<V> From<Vec<f64>> for AttributeValue<V> {
	fn from(value: Vec<f64>) -> Self {
		AttributeValue::Constant(value)
	}
}

impl<V> From<f64> for AttributeValue<V> {
	fn from(value: f64) -> Self {
		AttributeValue::Constant(vec![value])
	}
}
