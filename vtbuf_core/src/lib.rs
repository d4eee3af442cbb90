//! Building blocks shared by the vtbuf crates: scalar attribute types, primitive modes and
//! the packed buffer storage that buckets write their vertices and elements into.

pub mod buffer;
pub mod types;

pub use buffer::*;
pub use types::*;
