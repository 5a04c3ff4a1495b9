//! Conversion between segment lines and typed segments.
//!
//! A segment line is the raw text of one segment without its terminator:
//!
//! ```text
//! QTY+21:12.5:PCE          tag, element separator, components
//! FTX+AAI+++Order 4?+5     release character escapes a delimiter
//! UNA:+.?                  service string advice, never split
//! ```

use crate::error::{SegmentError, ValidationError};
use crate::model::{DelimiterSet, Element, Segment, SegmentDef, tags};

/// Whether segments built from attributes are self-validated immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Run [`Segment::validate`] and fail fast.
    #[default]
    Checked,
    /// Leave validation to [`crate::MessageReader::validate_segments`].
    Unchecked,
}

/// Builds and parses segments using one delimiter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentFactory {
    delimiters: DelimiterSet,
}

impl SegmentFactory {
    pub fn new(delimiters: DelimiterSet) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &DelimiterSet {
        &self.delimiters
    }

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Builds a segment of type `def` from raw attribute data.
    ///
    /// For UNA the attributes are ignored: its element is always the
    /// service string of this factory's delimiter set.
    pub fn from_attributes(
        &self,
        def: &'static SegmentDef,
        elements: Vec<Element>,
        mode: BuildMode,
    ) -> Result<Segment, ValidationError> {
        let elements = if def.tag == tags::UNA {
            vec![Element::from(self.delimiters.service_string())]
        } else {
            elements
        };
        let segment = Segment::new(def, elements);
        if mode == BuildMode::Checked {
            segment.validate()?;
        }
        Ok(segment)
    }

    /// Renders a segment as a terminated line, escaping delimiter bytes.
    ///
    /// Trailing empty elements and components are omitted.
    pub fn encode(&self, segment: &Segment) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(segment.tag());

        if segment.tag() == tags::UNA {
            out.push_str(&self.delimiters.service_string());
            return out;
        }

        let elements = segment.elements();
        let used = elements.iter().rposition(|e| !e.is_empty()).map_or(0, |i| i + 1);
        for element in &elements[..used] {
            out.push(char::from(self.delimiters.element()));
            let components = element.components();
            let used = components.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            for (i, component) in components[..used].iter().enumerate() {
                if i > 0 {
                    out.push(char::from(self.delimiters.component()));
                }
                self.escape_into(component, &mut out);
            }
        }
        out.push(char::from(self.delimiters.segment()));
        out
    }

    fn escape_into(&self, value: &str, out: &mut String) {
        for c in value.chars() {
            if c.is_ascii() && self.delimiters.is_special(c as u8) {
                out.push(char::from(self.delimiters.escape()));
            }
            out.push(c);
        }
    }

    // =========================================================================
    // PARSING
    // =========================================================================

    /// Parses a segment line into a segment of type `def`.
    ///
    /// The caller resolves `def` from the line's tag beforehand; a line whose
    /// tag differs from `def.tag` is rejected.
    pub fn from_line(&self, def: &'static SegmentDef, line: &str) -> Result<Segment, SegmentError> {
        if line.len() < tags::TAG_LEN || !line.is_char_boundary(tags::TAG_LEN) {
            return Err(SegmentError::Malformed {
                reason: "line shorter than a segment tag",
            });
        }
        let (tag, rest) = line.split_at(tags::TAG_LEN);
        if !tag.eq_ignore_ascii_case(def.tag) {
            return Err(SegmentError::TagMismatch {
                expected: def.tag,
                found: tag.to_string(),
            });
        }

        if def.tag == tags::UNA {
            // The terminator was consumed by the stream; restore it.
            if rest.len() != DelimiterSet::SERVICE_STRING_LEN - 1 {
                return Err(SegmentError::Malformed {
                    reason: "service string advice must hold six characters",
                });
            }
            let mut service = rest.to_string();
            service.push(char::from(self.delimiters.segment()));
            return Ok(Segment::new(def, vec![Element::from(service)]));
        }

        if rest.is_empty() {
            return Ok(Segment::new(def, Vec::new()));
        }
        let body = rest
            .strip_prefix(char::from(self.delimiters.element()))
            .ok_or(SegmentError::Malformed {
                reason: "missing element separator after tag",
            })?;
        Ok(Segment::new(def, self.split(body)?))
    }

    /// Splits an element list into elements and components, unescaping values.
    fn split(&self, body: &str) -> Result<Vec<Element>, SegmentError> {
        let d = &self.delimiters;
        let mut elements = Vec::new();
        let mut components = Vec::new();
        let mut current = Vec::new();

        let mut bytes = body.bytes();
        while let Some(b) = bytes.next() {
            if b == d.escape() {
                let escaped = bytes.next().ok_or(SegmentError::Malformed {
                    reason: "dangling release character",
                })?;
                current.push(escaped);
            } else if b == d.component() {
                components.push(to_string(std::mem::take(&mut current))?);
            } else if b == d.element() {
                components.push(to_string(std::mem::take(&mut current))?);
                elements.push(Element::new(std::mem::take(&mut components)));
            } else {
                current.push(b);
            }
        }
        components.push(to_string(current)?);
        elements.push(Element::new(components));

        Ok(elements)
    }
}

fn to_string(bytes: Vec<u8>) -> Result<String, SegmentError> {
    String::from_utf8(bytes).map_err(|_| SegmentError::Malformed {
        reason: "invalid UTF-8 in value",
    })
}
