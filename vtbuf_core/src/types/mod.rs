//! Contains the scalar attribute types and primitive modes.

mod attribute_type;
pub use attribute_type::*;

mod mode;
pub use mode::*;
