//! EDIFACT interchanges: building, reading and structural validation.
//!
//! An interchange is a flat sequence of tagged segments. Envelope segments
//! (UNA, UNB ... UNZ) wrap one or more messages (UNH ... UNT), each an
//! ordered, looped sequence of business segments.
//!
//! # Quick Start
//!
//! ```rust
//! use edifact::kinds::{Order, OrderLine, Orders, Party};
//! use edifact::{MessageBuilder, SegmentCursor};
//!
//! let mut builder = MessageBuilder::new(Orders::new(), "4012345000023", "5412345000013");
//! builder.add_message(&Order {
//!     number: "PO-1".to_string(),
//!     date: "20261016".to_string(),
//!     buyer: Party::new("5412345000013"),
//!     supplier: None,
//!     lines: vec![OrderLine::new("4000862141404", 3)],
//! })?;
//!
//! // Writes UNZ and validates the segment order.
//! let mut reader = builder.get_or_fail()?;
//! let bgm = reader.find_next_segment("BGM")?.map(|s| s.value(1, 0).map(str::to_string));
//! assert_eq!(bgm, Some(Some("PO-1".to_string())));
//!
//! reader.rewind()?;
//! let mut tags = Vec::new();
//! while let Some(segment) = reader.next_segment()? {
//!     tags.push(segment.tag());
//! }
//! assert_eq!(tags.first(), Some(&"UNA"));
//! assert_eq!(tags.last(), Some(&"UNZ"));
//! # Ok::<(), edifact::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: Delimiters, segments, segment definitions and registries
//! - [`codec`]: Segment line encoding/decoding and stream storage
//! - [`validate`]: Blueprints and the segment-order state machine
//! - [`message`]: Message kinds, configuration, builder and reader
//! - [`kinds`]: Bundled message kinds (ORDERS)
//! - [`util`]: Date/time helpers
//! - [`error`]: Error types
//!
//! # Validation
//!
//! Two independent checks are available on a [`MessageReader`]:
//! - [`MessageReader::validate`]: segment order against the kind's blueprint
//! - [`MessageReader::validate_segments`]: each segment's element layout
//!
//! Both stop at the first failure.

pub mod codec;
pub mod error;
pub mod kinds;
pub mod message;
pub mod model;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{BuildMode, FileStream, MemoryStream, SegmentFactory, Stream};
pub use error::{ConfigError, Error, ErrorCode, Result, SegmentError, ValidationError};
pub use message::{
    ConfigValue, Configuration, InterchangeHeader, MessageBuilder, MessageKind, MessageReader,
    SegmentCursor, SegmentWriter, Setting, keys,
};
pub use model::{
    ComponentRule, DelimiterSet, Element, ElementRule, Format, Necessity, Segment, SegmentDef,
    SegmentRegistry, tags,
};
pub use validate::{Blueprint, BlueprintNode, BlueprintSpec};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
