//! The capability each concrete message kind implements.

use tracing::trace;

use crate::codec::{BuildMode, SegmentFactory, Stream};
use crate::error::Result;
use crate::model::{DelimiterSet, Element, SegmentRegistry, tags};
use crate::validate::BlueprintSpec;

/// A concrete message kind (ORDERS, INVOIC, ...).
///
/// Builders and readers hold the kind behind an `Arc` and call into it for
/// the segment registry, the blueprint, and the write routines.
pub trait MessageKind {
    /// Business data for one message.
    type Payload;

    /// Segment definitions of this kind, service segments included.
    fn registry(&self) -> &SegmentRegistry;

    /// Expected segment order of a whole interchange of this kind.
    fn blueprint(&self) -> &BlueprintSpec;

    /// Writes the interchange header (UNB).
    fn write_header(
        &self,
        writer: &mut SegmentWriter<'_>,
        header: &InterchangeHeader<'_>,
    ) -> Result<()>;

    /// Writes one message, UNH through UNT.
    fn write_message(&self, writer: &mut SegmentWriter<'_>, payload: &Self::Payload) -> Result<()>;
}

/// Values available to [`MessageKind::write_header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterchangeHeader<'a> {
    pub sender: &'a str,
    pub receiver: &'a str,
    pub reference: &'a str,
    /// Seconds since the Unix epoch.
    pub prepared_at: i64,
}

/// Envelope bookkeeping of a builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    /// Segments since (and including) the last UNH.
    pub unh: usize,
    /// Messages completed.
    pub messages: usize,
}

impl Counters {
    pub(crate) fn count(&mut self, tag: &str) {
        match tag {
            tags::UNA | tags::UNB => {}
            tags::UNH => self.unh = 1,
            _ => self.unh += 1,
        }
    }
}

/// Write access to the interchange being built.
///
/// Every segment goes through the kind's registry and the builder's
/// factory, and is counted.
pub struct SegmentWriter<'w> {
    stream: &'w mut dyn Stream,
    factory: &'w SegmentFactory,
    registry: &'w SegmentRegistry,
    counters: &'w mut Counters,
    reference: &'w str,
    mode: BuildMode,
}

impl<'w> SegmentWriter<'w> {
    pub(crate) fn new(
        stream: &'w mut dyn Stream,
        factory: &'w SegmentFactory,
        registry: &'w SegmentRegistry,
        counters: &'w mut Counters,
        reference: &'w str,
        mode: BuildMode,
    ) -> Self {
        Self {
            stream,
            factory,
            registry,
            counters,
            reference,
            mode,
        }
    }

    /// Writes a segment using the builder's build mode.
    pub fn write(&mut self, tag: &str, elements: Vec<Element>) -> Result<()> {
        self.write_with(tag, elements, self.mode)
    }

    /// Writes a segment with an explicit build mode.
    pub fn write_with(&mut self, tag: &str, elements: Vec<Element>, mode: BuildMode) -> Result<()> {
        let def = self.registry.lookup(tag)?;
        let segment = self.factory.from_attributes(def, elements, mode)?;
        self.stream.write(&self.factory.encode(&segment))?;
        self.counters.count(def.tag);
        trace!(tag = def.tag, unh_count = self.counters.unh, "segment written");
        Ok(())
    }

    /// Segments written since the last UNH, UNH included.
    pub fn unh_count(&self) -> usize {
        self.counters.unh
    }

    /// Messages completed before the one being written.
    pub fn message_count(&self) -> usize {
        self.counters.messages
    }

    pub fn interchange_reference(&self) -> &str {
        self.reference
    }

    pub fn delimiters(&self) -> &DelimiterSet {
        self.factory.delimiters()
    }
}
