//! Vertex attributes of a bucket.
//!
//! - [`value`]: the value source of an attribute, constant or computed per vertex.
//! - [`descriptor`]: partial attribute descriptions as supplied by callers.
//! - [`registry`]: normalized attributes with their staleness flags.

mod descriptor;
mod registry;
mod value;

pub use descriptor::AttributeDescriptor;
pub use registry::{AttributeFilter, AttributeRegistry, VertexAttribute};
pub use value::{AttributeValue, ComputeFn};
