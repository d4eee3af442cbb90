//! Transferable bucket snapshots.
//!
//! A [`SerializedBucket`] describes the buffer state of a bucket without any of its value
//! functions, so it can be sent to a render thread or another process. Computed attributes are
//! reported with a `null` value; constant attributes carry their literal value.
//!
//! On the wire a snapshot is wrapped in a [`TransferPayload`], tagged with its type and schema
//! version:
//!
//! ```json
//! {"type": "bucket", "version": 1, "id": "water", "mode": "TRIANGLES", ...}
//! ```

use crate::{Bucket, ElementGroup, ElementVertexGenerator};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vtbuf_core::{AttributeType, Mode};

/// Schema version of serialized buckets.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SerializedVertexAttribute {
	pub name: String,
	pub components: usize,
	#[serde(rename = "type")]
	pub attribute_type: AttributeType,
	pub is_stale: bool,
	pub is_feature_constant: bool,
	pub buffer: String,
	/// Literal value of constant attributes, `None` for computed ones.
	pub value: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SerializedBucket {
	pub id: String,
	pub mode: Mode,
	pub vertex_attributes: BTreeMap<String, SerializedVertexAttribute>,
	pub element_groups: Vec<ElementGroup>,
	pub element_buffer: String,
	pub vertex_length: u32,
	pub element_length: u32,
}

impl SerializedBucket {
	/// Captures the current state of `bucket` as is, without refreshing it.
	pub fn capture<G: ElementVertexGenerator>(bucket: &Bucket<G>) -> Self {
		let vertex_attributes = bucket
			.attributes
			.iter()
			.map(|attribute| {
				let serialized = SerializedVertexAttribute {
					name: attribute.name().to_string(),
					components: attribute.components(),
					attribute_type: attribute.attribute_type(),
					is_stale: attribute.is_stale(),
					is_feature_constant: attribute.is_feature_constant(),
					buffer: attribute.buffer().to_string(),
					value: attribute.value().as_constant().map(<[f64]>::to_vec),
				};
				(serialized.name.clone(), serialized)
			})
			.collect();

		SerializedBucket {
			id: bucket.id.clone(),
			mode: bucket.mode,
			vertex_attributes,
			element_groups: bucket.element_groups.clone(),
			element_buffer: bucket.element_buffer.clone(),
			vertex_length: bucket.vertex_length,
			element_length: bucket.element_length,
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&SerializedVertexAttribute> {
		self.vertex_attributes.get(name)
	}

	pub fn into_payload(self) -> TransferPayload {
		TransferPayload::Bucket {
			version: SNAPSHOT_VERSION,
			bucket: self,
		}
	}

	pub fn to_json(&self) -> Result<String> {
		serde_json::to_string(&self.clone().into_payload()).context("Failed to serialize bucket snapshot")
	}

	pub fn from_json(json: &str) -> Result<Self> {
		let payload: TransferPayload = serde_json::from_str(json).context("Failed to parse transfer payload")?;
		payload.into_bucket()
	}
}

/// Tagged, versioned envelope for everything crossing a thread or process boundary.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferPayload {
	Bucket {
		version: u32,
		#[serde(flatten)]
		bucket: SerializedBucket,
	},
}

impl TransferPayload {
	pub fn version(&self) -> u32 {
		match self {
			TransferPayload::Bucket { version, .. } => *version,
		}
	}

	/// Unwraps the bucket snapshot, rejecting unsupported schema versions.
	pub fn into_bucket(self) -> Result<SerializedBucket> {
		match self {
			TransferPayload::Bucket { version, bucket } => {
				ensure!(
					version == SNAPSHOT_VERSION,
					"unsupported bucket snapshot version {version}, expected {SNAPSHOT_VERSION}"
				);
				Ok(bucket)
			}
		}
	}
}
