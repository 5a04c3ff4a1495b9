//! Segment text encoding/decoding and stream storage.

pub mod factory;
pub mod stream;

pub use factory::{BuildMode, SegmentFactory};
pub use stream::{FileStream, IoStream, MemoryStream, Stream, Truncate};
