//! This module defines the [`AttributeType`] enum, the scalar element type of a vertex attribute
//! or an index buffer, together with the little-endian packing of values into raw bytes.
//!
//! # Examples
//!
//! ```
//! use vtbuf_core::types::AttributeType;
//!
//! assert_eq!(AttributeType::UnsignedByte.size(), 1);
//! assert_eq!(AttributeType::Float.size(), 4);
//! assert_eq!(AttributeType::parse_str("unsigned_short").unwrap(), AttributeType::UnsignedShort);
//!
//! let mut bytes = [0u8; 2];
//! AttributeType::Short.write(&mut bytes, -2.0).unwrap();
//! assert_eq!(AttributeType::Short.read(&bytes), -2.0);
//! ```

use anyhow::{Result, bail, ensure};
use byteorder::{ByteOrder, LE};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Scalar type of a single attribute component.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
	Byte,
	#[default]
	UnsignedByte,
	Short,
	UnsignedShort,
	Int,
	UnsignedInt,
	Float,
}

impl AttributeType {
	/// Size of one component in bytes.
	pub fn size(&self) -> usize {
		match self {
			AttributeType::Byte | AttributeType::UnsignedByte => 1,
			AttributeType::Short | AttributeType::UnsignedShort => 2,
			AttributeType::Int | AttributeType::UnsignedInt | AttributeType::Float => 4,
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			AttributeType::Byte => "BYTE",
			AttributeType::UnsignedByte => "UNSIGNED_BYTE",
			AttributeType::Short => "SHORT",
			AttributeType::UnsignedShort => "UNSIGNED_SHORT",
			AttributeType::Int => "INT",
			AttributeType::UnsignedInt => "UNSIGNED_INT",
			AttributeType::Float => "FLOAT",
		}
	}

	pub fn parse_str(value: &str) -> Result<Self> {
		Ok(match value.to_uppercase().trim() {
			"BYTE" => AttributeType::Byte,
			"UNSIGNED_BYTE" | "UBYTE" => AttributeType::UnsignedByte,
			"SHORT" => AttributeType::Short,
			"UNSIGNED_SHORT" | "USHORT" => AttributeType::UnsignedShort,
			"INT" => AttributeType::Int,
			"UNSIGNED_INT" | "UINT" => AttributeType::UnsignedInt,
			"FLOAT" => AttributeType::Float,
			_ => bail!("Unknown attribute type '{value}'"),
		})
	}

	/// Inclusive range of values representable by this type.
	fn range(&self) -> (f64, f64) {
		match self {
			AttributeType::Byte => (f64::from(i8::MIN), f64::from(i8::MAX)),
			AttributeType::UnsignedByte => (0.0, f64::from(u8::MAX)),
			AttributeType::Short => (f64::from(i16::MIN), f64::from(i16::MAX)),
			AttributeType::UnsignedShort => (0.0, f64::from(u16::MAX)),
			AttributeType::Int => (f64::from(i32::MIN), f64::from(i32::MAX)),
			AttributeType::UnsignedInt => (0.0, f64::from(u32::MAX)),
			AttributeType::Float => (f64::from(f32::MIN), f64::from(f32::MAX)),
		}
	}

	/// Packs `value` little-endian into the first [`size`](Self::size) bytes of `bytes`.
	///
	/// Integer types truncate toward zero. Values that are not finite or do not fit the
	/// type are rejected instead of wrapping around.
	pub fn write(&self, bytes: &mut [u8], value: f64) -> Result<()> {
		ensure!(
			bytes.len() >= self.size(),
			"{} needs {} bytes, got {}",
			self.as_str(),
			self.size(),
			bytes.len()
		);
		ensure!(value.is_finite(), "{} can not store non-finite value {value}", self.as_str());

		let value = if *self == AttributeType::Float { value } else { value.trunc() };
		let (min, max) = self.range();
		ensure!(
			(min..=max).contains(&value),
			"value {value} is out of range for {}",
			self.as_str()
		);

		match self {
			AttributeType::Byte => bytes[0] = value as i8 as u8,
			AttributeType::UnsignedByte => bytes[0] = value as u8,
			AttributeType::Short => LE::write_i16(bytes, value as i16),
			AttributeType::UnsignedShort => LE::write_u16(bytes, value as u16),
			AttributeType::Int => LE::write_i32(bytes, value as i32),
			AttributeType::UnsignedInt => LE::write_u32(bytes, value as u32),
			AttributeType::Float => LE::write_f32(bytes, value as f32),
		}
		Ok(())
	}

	/// Reads one little-endian component from the start of `bytes`.
	///
	/// # Panics
	///
	/// Panics if `bytes` is shorter than [`size`](Self::size).
	pub fn read(&self, bytes: &[u8]) -> f64 {
		match self {
			AttributeType::Byte => f64::from(bytes[0] as i8),
			AttributeType::UnsignedByte => f64::from(bytes[0]),
			AttributeType::Short => f64::from(LE::read_i16(bytes)),
			AttributeType::UnsignedShort => f64::from(LE::read_u16(bytes)),
			AttributeType::Int => f64::from(LE::read_i32(bytes)),
			AttributeType::UnsignedInt => f64::from(LE::read_u32(bytes)),
			AttributeType::Float => f64::from(LE::read_f32(bytes)),
		}
	}
}

impl Display for AttributeType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
