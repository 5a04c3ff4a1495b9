//! Service characters separating segments, elements and components.

/// The six service characters of an interchange (UNA service string advice).
///
/// Delimiters are single ASCII bytes. Values may contain any UTF-8 text;
/// multi-byte characters never collide with an ASCII delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelimiterSet {
    component: u8,
    element: u8,
    decimal: u8,
    escape: u8,
    reserved: u8,
    segment: u8,
}

impl Default for DelimiterSet {
    /// The UN/EDIFACT defaults: `:+.? '`.
    fn default() -> Self {
        Self::new(b':', b'+', b'.', b'?', b' ', b'\'')
    }
}

impl DelimiterSet {
    /// Length of the service string following the `UNA` tag.
    pub const SERVICE_STRING_LEN: usize = 6;

    /// Creates a delimiter set from explicit bytes.
    pub const fn new(
        component: u8,
        element: u8,
        decimal: u8,
        escape: u8,
        reserved: u8,
        segment: u8,
    ) -> Self {
        Self {
            component,
            element,
            decimal,
            escape,
            reserved,
            segment,
        }
    }

    /// Parses the six characters following `UNA` (e.g. `:+.? '`).
    ///
    /// Returns `None` if the string is shorter than six bytes or contains
    /// non-ASCII characters.
    pub fn from_service_string(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() < Self::SERVICE_STRING_LEN || !bytes[..Self::SERVICE_STRING_LEN].is_ascii() {
            return None;
        }
        Some(Self::new(bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]))
    }

    /// Renders the six-character service string (terminator included).
    pub fn service_string(&self) -> String {
        [
            self.component,
            self.element,
            self.decimal,
            self.escape,
            self.reserved,
            self.segment,
        ]
        .iter()
        .map(|b| char::from(*b))
        .collect()
    }

    pub fn component(&self) -> u8 {
        self.component
    }

    pub fn element(&self) -> u8 {
        self.element
    }

    pub fn decimal(&self) -> u8 {
        self.decimal
    }

    pub fn escape(&self) -> u8 {
        self.escape
    }

    pub fn reserved(&self) -> u8 {
        self.reserved
    }

    pub fn segment(&self) -> u8 {
        self.segment
    }

    /// Overrides the component separator.
    pub fn with_component(mut self, c: u8) -> Self {
        self.component = c;
        self
    }

    /// Overrides the element separator.
    pub fn with_element(mut self, c: u8) -> Self {
        self.element = c;
        self
    }

    /// Overrides the decimal mark.
    pub fn with_decimal(mut self, c: u8) -> Self {
        self.decimal = c;
        self
    }

    /// Overrides the release (escape) character.
    pub fn with_escape(mut self, c: u8) -> Self {
        self.escape = c;
        self
    }

    /// Overrides the segment terminator.
    pub fn with_segment(mut self, c: u8) -> Self {
        self.segment = c;
        self
    }

    /// Returns true if `byte` must be escaped inside a value.
    #[inline]
    pub fn is_special(&self, byte: u8) -> bool {
        byte == self.component
            || byte == self.element
            || byte == self.escape
            || byte == self.segment
    }
}
