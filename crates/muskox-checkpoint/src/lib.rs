//! Zero-copy, memory-mapped checkpoint loader for Muskox
//!
//! This crate maps a binary model checkpoint into process memory and hands
//! out read-only `f32` views into the mapped payload without copying. The
//! container's textual header is parsed elsewhere; callers pass in the byte
//! offset at which the tensor payload begins.

pub mod cast;
pub mod checkpoint;
pub mod error;
pub mod region;
pub mod view;

pub use cast::cast_f32;
pub use checkpoint::Checkpoint;
pub use error::{Error, Result};
pub use region::MappedRegion;
pub use view::TensorView;
