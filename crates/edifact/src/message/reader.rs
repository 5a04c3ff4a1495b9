//! Sequential, restartable access to the segments of an interchange.

use std::sync::Arc;

use tracing::debug;

use crate::codec::{MemoryStream, SegmentFactory, Stream};
use crate::error::{ConfigError, Error, Result};
use crate::message::config::{ConfigValue, Configuration, Setting};
use crate::message::kind::MessageKind;
use crate::model::{DelimiterSet, Segment, tags};
use crate::validate::Blueprint;

/// Explicit cursor over a finite, restartable segment sequence.
pub trait SegmentCursor {
    /// 1-based number of the last segment read; 0 before the first read.
    fn position(&self) -> usize;

    /// Segment under the cursor, read on first access. `None` at the end.
    fn current(&mut self) -> Result<Option<&Segment>>;

    /// Moves past the segment under the cursor.
    fn advance(&mut self) -> Result<()>;

    fn at_end(&mut self) -> Result<bool> {
        Ok(self.current()?.is_none())
    }

    /// Returns to the first segment.
    fn rewind(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Unloaded,
    Loaded(Segment),
    End,
}

impl Slot {
    fn segment(&self) -> Option<&Segment> {
        match self {
            Slot::Loaded(segment) => Some(segment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Pin {
    offset: u64,
    read: usize,
    slot: Slot,
}

/// Reads and validates an interchange of kind `K` from a stream.
pub struct MessageReader<K: MessageKind, S: Stream = MemoryStream> {
    kind: Arc<K>,
    stream: S,
    factory: SegmentFactory,
    slot: Slot,
    read: usize,
    pin: Option<Pin>,
    configuration: Configuration,
}

impl<K: MessageKind, S: Stream> MessageReader<K, S> {
    /// Creates a reader; delimiters come from a leading UNA, else the defaults.
    pub fn new(kind: K, stream: S) -> Result<Self> {
        Self::from_shared(Arc::new(kind), stream)
    }

    pub fn from_shared(kind: Arc<K>, mut stream: S) -> Result<Self> {
        let delimiters = stream.delimiter_set()?;
        debug!(identifier = %stream.identifier(), "reader created");
        Ok(Self {
            kind,
            stream,
            factory: SegmentFactory::new(delimiters),
            slot: Slot::Unloaded,
            read: 0,
            pin: None,
            configuration: Configuration::new(),
        })
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn delimiters(&self) -> &DelimiterSet {
        self.factory.delimiters()
    }

    pub fn identifier(&self) -> String {
        self.stream.identifier()
    }

    /// Whole interchange text; the read position is preserved.
    pub fn to_edifact_string(&mut self) -> Result<String> {
        Ok(self.stream.contents()?)
    }

    pub fn into_stream(self) -> S {
        self.stream
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// Reads and parses the next segment. `Ok(None)` once the stream is exhausted.
    pub fn next_segment(&mut self) -> Result<Option<&Segment>> {
        self.read_next()?;
        Ok(self.slot.segment())
    }

    /// Scans forward for the next segment with `tag`.
    pub fn find_next_segment(&mut self, tag: &str) -> Result<Option<&Segment>> {
        self.find_next_segment_where(tag, |_| true)
    }

    /// Scans forward for the next segment with `tag` accepted by `predicate`.
    pub fn find_next_segment_where<F>(
        &mut self,
        tag: &str,
        mut predicate: F,
    ) -> Result<Option<&Segment>>
    where
        F: FnMut(&Segment) -> bool,
    {
        let def = self.kind.registry().lookup(tag)?;
        loop {
            self.read_next()?;
            let found = match &self.slot {
                Slot::Loaded(segment) => segment.tag() == def.tag && predicate(segment),
                _ => true,
            };
            if found {
                return Ok(self.slot.segment());
            }
        }
    }

    /// Like [`find_next_segment`](Self::find_next_segment), from the first segment.
    pub fn find_from_start(&mut self, tag: &str) -> Result<Option<&Segment>> {
        self.rewind()?;
        self.find_next_segment(tag)
    }

    pub fn find_from_start_where<F>(&mut self, tag: &str, predicate: F) -> Result<Option<&Segment>>
    where
        F: FnMut(&Segment) -> bool,
    {
        self.rewind()?;
        self.find_next_segment_where(tag, predicate)
    }

    fn read_next(&mut self) -> Result<()> {
        let Some(line) = self.stream.next_line()? else {
            self.slot = Slot::End;
            return Ok(());
        };
        self.read += 1;
        match self.parse_line(&line) {
            Ok(segment) => {
                self.slot = Slot::Loaded(segment);
                Ok(())
            }
            Err(e) => {
                // The line is consumed; nothing is under the cursor.
                self.slot = Slot::Unloaded;
                Err(e)
            }
        }
    }

    fn parse_line(&self, line: &str) -> Result<Segment> {
        let tag = line.get(..tags::TAG_LEN).unwrap_or(line);
        let def = self.kind.registry().lookup(tag)?;
        Ok(self.factory.from_line(def, line)?)
    }

    // =========================================================================
    // PIN
    // =========================================================================

    /// Remembers the current stream offset, replacing an earlier pin.
    pub fn pin(&mut self) -> Result<u64> {
        let offset = self.stream.tell()?;
        self.pin = Some(Pin {
            offset,
            read: self.read,
            slot: self.slot.clone(),
        });
        Ok(offset)
    }

    /// Returns to the pinned offset and clears the pin.
    ///
    /// Without a pin this does nothing and returns the current offset.
    pub fn jump_to_pin(&mut self) -> Result<u64> {
        let Some(pin) = self.pin.take() else {
            return Ok(self.stream.tell()?);
        };
        let offset = self.stream.seek(pin.offset)?;
        self.read = pin.read;
        self.slot = pin.slot;
        Ok(offset)
    }

    pub fn has_pin(&self) -> bool {
        self.pin.is_some()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Checks segment order against the kind's blueprint.
    ///
    /// Reads from the first segment and rewinds afterwards. Stops at the
    /// first mismatch.
    pub fn validate(&mut self) -> Result<()> {
        let kind = Arc::clone(&self.kind);
        let mut blueprint = Blueprint::new(kind.blueprint());
        self.rewind()?;
        let result = loop {
            match self.next_segment() {
                Ok(Some(segment)) => {
                    if let Err(e) = blueprint.validate(segment) {
                        break Err(Error::from(e));
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.rewind()?;
        if let Err(e) = &result {
            debug!(identifier = %self.identifier(), error = %e, "interchange failed validation");
        }
        result
    }

    /// Runs every segment's own element checks, from the first segment.
    pub fn validate_segments(&mut self) -> Result<()> {
        self.rewind()?;
        let result = loop {
            match self.next_segment() {
                Ok(Some(segment)) => {
                    if let Err(e) = segment.validate() {
                        break Err(Error::from(e));
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.rewind()?;
        result
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    pub fn add_configuration(&mut self, key: impl Into<String>, setting: Setting<ConfigValue>) {
        self.configuration.set(key, setting);
    }

    pub fn configuration(&mut self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.configuration.get(key)
    }
}

impl<K: MessageKind, S: Stream> SegmentCursor for MessageReader<K, S> {
    fn position(&self) -> usize {
        self.read
    }

    fn current(&mut self) -> Result<Option<&Segment>> {
        if matches!(self.slot, Slot::Unloaded) {
            self.read_next()?;
        }
        Ok(self.slot.segment())
    }

    fn advance(&mut self) -> Result<()> {
        match self.slot {
            Slot::Unloaded => {
                self.read_next()?;
                if let Slot::Loaded(_) = self.slot {
                    self.slot = Slot::Unloaded;
                }
            }
            Slot::Loaded(_) => self.slot = Slot::Unloaded,
            Slot::End => {}
        }
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.stream.rewind()?;
        self.slot = Slot::Unloaded;
        self.read = 0;
        Ok(())
    }
}

impl<K: MessageKind, S: Stream> std::fmt::Debug for MessageReader<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageReader")
            .field("identifier", &self.stream.identifier())
            .field("delimiters", self.factory.delimiters())
            .field("position", &self.read)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SegmentError, ValidationError};
    use crate::kinds::Orders;

    const TEXT: &str = "UNA:+.? 'UNB+UNOC:3+SENDER:14+RECEIVER:14+261016:0930+REF1'\
UNH+1+ORDERS:D:96A:UN'BGM+220+PO1+9'DTM+137:20261016:102'LIN+1++A1:EN'QTY+21:5'UNS+S'UNT+7+1'\
UNH+2+ORDERS:D:96A:UN'BGM+220+PO2+9'DTM+137:20261017:102'LIN+1++B2:EN'QTY+21:1'UNS+S'UNT+7+2'\
UNZ+2+REF1'";

    fn reader(text: &str) -> MessageReader<Orders> {
        MessageReader::new(Orders::new(), MemoryStream::from_text(text)).unwrap()
    }

    fn tags_of(reader: &mut MessageReader<Orders>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(segment) = reader.next_segment().unwrap() {
            out.push(segment.tag());
        }
        out
    }

    #[test]
    fn test_next_segment() {
        let mut reader = reader(TEXT);
        let tags = tags_of(&mut reader);
        assert_eq!(tags.len(), 17);
        assert_eq!(&tags[..3], &["UNA", "UNB", "UNH"]);
        assert_eq!(tags.last(), Some(&"UNZ"));
        assert_eq!(reader.position(), 17);
        assert!(reader.next_segment().unwrap().is_none());
    }

    #[test]
    fn test_cursor() {
        let mut reader = reader(TEXT);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNA"));
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNA"));
        assert_eq!(reader.position(), 1);

        reader.advance().unwrap();
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNB"));
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("BGM"));
        assert_eq!(reader.position(), 4);

        reader.rewind().unwrap();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNA"));

        let mut count = 0;
        while !reader.at_end().unwrap() {
            count += 1;
            reader.advance().unwrap();
        }
        assert_eq!(count, 17);
    }

    #[test]
    fn test_find() {
        let mut reader = reader(TEXT);
        let bgm = reader.find_next_segment("bgm").unwrap().unwrap();
        assert_eq!(bgm.value(1, 0), Some("PO1"));

        let bgm = reader
            .find_from_start_where("BGM", |s| s.value(1, 0) == Some("PO2"))
            .unwrap()
            .unwrap();
        assert_eq!(bgm.value(1, 0), Some("PO2"));

        assert!(reader.find_next_segment("BGM").unwrap().is_none());
        assert!(reader.find_from_start("PRI").unwrap().is_none());

        let err = reader.find_from_start("XYZ").unwrap_err();
        assert!(matches!(err, Error::Segment(SegmentError::Unknown { ref tag }) if tag == "XYZ"));
    }

    #[test]
    fn test_pin() {
        let mut reader = reader(TEXT);
        reader.find_next_segment("UNH").unwrap();
        let pinned = reader.pin().unwrap();
        reader.find_next_segment("UNZ").unwrap();

        assert_eq!(reader.jump_to_pin().unwrap(), pinned);
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNH"));
        assert_eq!(reader.next_segment().unwrap().map(Segment::tag), Some("BGM"));
        assert!(!reader.has_pin());

        let here = reader.pin().unwrap();
        reader.next_segment().unwrap();
        reader.jump_to_pin().unwrap();
        assert_eq!(here, pinned + "BGM+220+PO1+9'".len() as u64);

        // no pin left: stays put
        reader.next_segment().unwrap();
        let offset = reader.jump_to_pin().unwrap();
        assert!(offset > here);
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("DTM"));
    }

    #[test]
    fn test_validate() {
        let mut reader = reader(TEXT);
        reader.next_segment().unwrap();
        reader.validate().unwrap();
        assert_eq!(reader.position(), 0);
        reader.validate_segments().unwrap();
    }

    #[test]
    fn test_validate_reports_first_mismatch() {
        let text = TEXT.replacen("DTM+137:20261016:102'", "", 1);
        let err = reader(&text).validate().unwrap_err();
        let Error::Validation(err) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            err,
            ValidationError::UnexpectedSegment {
                expected: Some("DTM".to_string()),
                actual: "LIN".to_string(),
                position: 5,
            }
        );
        assert_eq!(Error::from(err).code(), crate::error::ErrorCode::UnexpectedSegment);
    }

    #[test]
    fn test_validate_segments_reports_invalid_element() {
        let text = TEXT.replacen("QTY+21:5'", "QTY+21:five'", 1);
        let mut reader = reader(&text);
        reader.validate().unwrap();
        let err = reader.validate_segments().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SegmentInvalid {
                tag: "QTY",
                element: 0,
                component: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_unreadable_segment_clears_cursor() {
        let text = "UNA:+.? 'UNB+UNOC:3+S:14+R:14+261016:0930+REF1'FTX+AAI+hello'UNZ+0+REF1'";
        let mut reader = reader(text);
        reader.next_segment().unwrap();
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNA"));
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.position(), 2);

        let err = reader.current().unwrap_err();
        assert!(matches!(err, Error::Segment(SegmentError::Unknown { ref tag }) if tag == "FTX"));
        assert_eq!(reader.position(), 3);
        // UNB is no longer under the cursor; reading resumes after FTX
        assert_eq!(reader.current().unwrap().map(Segment::tag), Some("UNZ"));
    }

    #[test]
    fn test_custom_delimiters() {
        let text = "UNA|*,! ~UNB*UNOC|3*S|14*R|14*261016|0930*REF1~UNZ*0*REF1~";
        let mut reader = reader(text);
        assert_eq!(reader.delimiters().element(), b'*');
        assert_eq!(tags_of(&mut reader), vec!["UNA", "UNB", "UNZ"]);
        assert_eq!(reader.to_edifact_string().unwrap(), text);
        assert_eq!(reader.identifier(), "memory");
    }

    #[test]
    fn test_configuration() {
        let mut reader = reader(TEXT);
        assert!(matches!(reader.configuration("partner"), Err(ConfigError::NotSet { .. })));
        reader.add_configuration("partner", Setting::literal("ACME"));
        assert_eq!(reader.configuration("partner").unwrap().as_text(), Some("ACME"));
    }
}
