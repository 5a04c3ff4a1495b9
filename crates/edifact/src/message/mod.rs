//! Interchange building and reading.
//!
//! A [`MessageKind`] supplies the segment registry, the blueprint and the
//! write routines of one message type. [`MessageBuilder`] drives it to write
//! an interchange; [`MessageReader`] reads one back and validates it.

pub mod builder;
pub mod config;
pub mod kind;
pub mod reader;

pub use builder::MessageBuilder;
pub use config::{ConfigValue, Configuration, Setting, keys};
pub use kind::{InterchangeHeader, MessageKind, SegmentWriter};
pub use reader::{MessageReader, SegmentCursor};
