//! Pipeline-side audio representation and sample conversion

pub mod convert;
pub mod types;

pub use types::{FloatBuffer, StreamFormat};
