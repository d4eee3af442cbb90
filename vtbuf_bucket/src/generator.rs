use crate::RefreshContext;
use anyhow::Result;

/// Tessellates one feature into vertices and elements.
///
/// For each vertex the generator calls [`RefreshContext::add_vertex`] and for each element
/// [`RefreshContext::add_element`], typically with indices returned by earlier `add_vertex`
/// calls. The number of calls must not depend on which attributes are stale: a partial refresh
/// relies on every pass producing the same vertex and element counts.
pub trait ElementVertexGenerator {
	/// The feature records this generator understands.
	type Feature;
	/// Per-vertex data handed to computed attribute values.
	type Vertex;

	fn generate(&self, feature: &Self::Feature, context: &mut RefreshContext<'_, Self::Vertex>) -> Result<()>;
}
