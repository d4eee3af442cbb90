//! Bucket assembly: turns the features of one style layer into packed vertex and element
//! buffers, split into element groups that fit a 16-bit index range.
//!
//! A [`Bucket`] replays its features through an [`ElementVertexGenerator`] whenever a
//! feature-dependent attribute or the element buffer is stale, writing only the stale data.
//! [`Bucket::serialize`] produces a [`SerializedBucket`], the function-free snapshot handed to
//! a render thread.

pub mod attribute;
mod bucket;
pub mod config;
mod element_group;
mod generator;
pub mod paint;
mod refresh;
pub mod snapshot;
#[cfg(test)]
pub(crate) mod testing;

pub use attribute::{AttributeDescriptor, AttributeFilter, AttributeValue, VertexAttribute};
pub use bucket::{Bucket, BucketOptions, ELEMENT_GROUP_VERTEX_LENGTH, FeatureFilter};
pub use config::BucketConfig;
pub use element_group::{ElementGroup, ElementGroupSplitter, IndexCursor};
pub use generator::ElementVertexGenerator;
pub use paint::{FeatureProperties, PaintDeclaration};
pub use refresh::RefreshContext;
pub use snapshot::{SerializedBucket, SerializedVertexAttribute, TransferPayload};
