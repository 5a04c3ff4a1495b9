//! Segments, their element layouts, and the per-kind segment registry.

use rustc_hash::FxHashMap;

use crate::error::{SegmentError, ValidationError};

/// Well-known service segment tags.
pub mod tags {
    /// Service string advice (delimiter declaration).
    pub const UNA: &str = "UNA";
    /// Interchange header.
    pub const UNB: &str = "UNB";
    /// Message header.
    pub const UNH: &str = "UNH";
    /// Message trailer.
    pub const UNT: &str = "UNT";
    /// Interchange trailer.
    pub const UNZ: &str = "UNZ";

    /// Length of every segment tag.
    pub const TAG_LEN: usize = 3;
}

/// Whether an element, component or blueprint entry must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Necessity {
    /// Must appear.
    Mandatory,
    /// May be omitted.
    Optional,
}

impl Necessity {
    pub fn is_optional(self) -> bool {
        self == Necessity::Optional
    }
}

/// Character class of a component value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `a`: no digits.
    Alpha,
    /// `n`: digits with optional sign and decimal mark.
    Numeric,
    /// `an`: anything.
    Alphanumeric,
}

impl Format {
    fn accepts(self, value: &str) -> bool {
        match self {
            Format::Alphanumeric => true,
            Format::Alpha => !value.bytes().any(|b| b.is_ascii_digit()),
            Format::Numeric => {
                let digits = value.strip_prefix('-').unwrap_or(value);
                let mut marks = 0;
                let mut any_digit = false;
                for b in digits.bytes() {
                    match b {
                        b'0'..=b'9' => any_digit = true,
                        b'.' | b',' => marks += 1,
                        _ => return false,
                    }
                }
                any_digit && marks <= 1
            }
        }
    }
}

/// Rule for one component of a data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentRule {
    pub necessity: Necessity,
    pub format: Format,
    /// Maximum length in characters.
    pub max_len: usize,
}

impl ComponentRule {
    pub const fn mandatory(format: Format, max_len: usize) -> Self {
        Self {
            necessity: Necessity::Mandatory,
            format,
            max_len,
        }
    }

    pub const fn optional(format: Format, max_len: usize) -> Self {
        Self {
            necessity: Necessity::Optional,
            format,
            max_len,
        }
    }
}

/// Rule for one data element: its necessity and component layout.
///
/// Component necessities only apply once the element itself is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRule {
    pub necessity: Necessity,
    pub components: &'static [ComponentRule],
}

impl ElementRule {
    pub const fn mandatory(components: &'static [ComponentRule]) -> Self {
        Self {
            necessity: Necessity::Mandatory,
            components,
        }
    }

    pub const fn optional(components: &'static [ComponentRule]) -> Self {
        Self {
            necessity: Necessity::Optional,
            components,
        }
    }
}

/// A segment type: its tag and element layout.
///
/// Definitions are declared as `static` items and referenced from a
/// [`SegmentRegistry`].
#[derive(Debug, PartialEq, Eq)]
pub struct SegmentDef {
    pub tag: &'static str,
    pub elements: &'static [ElementRule],
}

impl SegmentDef {
    pub const fn new(tag: &'static str, elements: &'static [ElementRule]) -> Self {
        Self { tag, elements }
    }
}

/// One data element: an ordered list of component values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element(Vec<String>);

impl Element {
    /// Creates an element from its components.
    pub fn new(components: Vec<String>) -> Self {
        Self(components)
    }

    /// Creates a composite element (`a:b:c`).
    pub fn composite<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(components.into_iter().map(Into::into).collect())
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Returns the component at `index` if present and non-empty.
    pub fn component(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the element carries no value at all.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(String::is_empty)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<&String> for Element {
    fn from(value: &String) -> Self {
        Self(vec![value.clone()])
    }
}

/// A typed segment: a definition plus parsed element values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    def: &'static SegmentDef,
    elements: Vec<Element>,
}

impl Segment {
    pub fn new(def: &'static SegmentDef, elements: Vec<Element>) -> Self {
        Self { def, elements }
    }

    /// The three-character segment tag.
    pub fn tag(&self) -> &'static str {
        self.def.tag
    }

    pub fn def(&self) -> &'static SegmentDef {
        self.def
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Shorthand for `element(e)?.component(c)`.
    pub fn value(&self, element: usize, component: usize) -> Option<&str> {
        self.element(element).and_then(|e| e.component(component))
    }

    /// Checks element values against the segment's element layout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let tag = self.def.tag;
        let fail = |element, component, reason| ValidationError::SegmentInvalid {
            tag,
            element,
            component,
            reason,
        };

        if self.elements.len() > self.def.elements.len()
            && self.elements[self.def.elements.len()..].iter().any(|e| !e.is_empty())
        {
            return Err(fail(self.def.elements.len(), 0, "unexpected element"));
        }

        for (i, rule) in self.def.elements.iter().enumerate() {
            let element = match self.elements.get(i).filter(|e| !e.is_empty()) {
                Some(element) => element,
                None if rule.necessity.is_optional() => continue,
                None => return Err(fail(i, 0, "mandatory element missing")),
            };

            if element.len() > rule.components.len()
                && element.0[rule.components.len()..].iter().any(|c| !c.is_empty())
            {
                return Err(fail(i, rule.components.len(), "unexpected component"));
            }

            for (j, component) in rule.components.iter().enumerate() {
                let Some(value) = element.component(j) else {
                    if component.necessity.is_optional() {
                        continue;
                    }
                    return Err(fail(i, j, "mandatory value missing"));
                };
                if value.chars().count() > component.max_len {
                    return Err(fail(i, j, "value too long"));
                }
                if !component.format.accepts(value) {
                    return Err(fail(i, j, "value has wrong format"));
                }
            }
        }

        Ok(())
    }
}

/// Maps segment tags to segment definitions for one message kind.
#[derive(Debug, Clone, Default)]
pub struct SegmentRegistry {
    defs: FxHashMap<&'static str, &'static SegmentDef>,
}

impl SegmentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the interchange service segments
    /// (UNA, UNB, UNH, UNT, UNZ).
    pub fn with_service_segments() -> Self {
        let mut registry = Self::new();
        for def in crate::model::service::ALL {
            registry.register(def);
        }
        registry
    }

    /// Adds or replaces a definition.
    pub fn register(&mut self, def: &'static SegmentDef) {
        self.defs.insert(def.tag, def);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, def: &'static SegmentDef) -> Self {
        self.register(def);
        self
    }

    /// Resolves a tag (case-insensitive).
    pub fn lookup(&self, tag: &str) -> Result<&'static SegmentDef, SegmentError> {
        let upper = tag.to_ascii_uppercase();
        self.defs
            .get(upper.as_str())
            .copied()
            .ok_or(SegmentError::Unknown { tag: upper })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_ok()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
