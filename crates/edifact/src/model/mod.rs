//! Data model types for EDIFACT interchanges.
//!
//! This module contains the core types for representing interchange data:
//! - Delimiter sets (service characters)
//! - Segments and elements (parsed values)
//! - Segment definitions and registries (per message kind)
//! - Service segment layouts (envelope framing)

pub mod delimiter;
pub mod segment;
pub mod service;

pub use delimiter::DelimiterSet;
pub use segment::{
    ComponentRule, Element, ElementRule, Format, Necessity, Segment, SegmentDef, SegmentRegistry,
    tags,
};
