//! Spanned values and durable captures.
//!
//! A [`RawValue`] is a zero-copy view into the scanner's current buffer
//! window; it stays valid only until the window is compacted or replaced, so
//! anything that must survive further scanning is copied out into a
//! [`CapturedValue`] at the moment it is cached.

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};

/// Classification of a spanned JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Recognized but not yet classified.
    Pending,
    /// String with no escapes and no bytes ≥ 0x80; decodes by straight copy.
    SimpleString,
    /// String that needs the full unescaping decode path.
    String,
    /// Number with no fractional part or exponent.
    Int,
    /// Number with a fractional part or exponent.
    Float,
    /// `null`.
    Null,
    /// `true`.
    True,
    /// `false`.
    False,
    /// The field was not present in its container.
    Missing,
    /// `{ ... }`.
    Object,
    /// `[ ... ]`.
    List,
    /// A list-valued object collapsed with its identity wrapper.
    ListWithId,
}

impl ValueKind {
    /// Whether this kind spans an object or list.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::List | Self::ListWithId)
    }

    /// Whether this kind is a string.
    #[must_use]
    pub fn is_string(self) -> bool {
        matches!(self, Self::SimpleString | Self::String)
    }

    /// Collapses scanner-internal distinctions for public queries.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::SimpleString => Self::String,
            Self::ListWithId => Self::List,
            k => k,
        }
    }

    /// Noun used in mismatch messages.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Pending => "unparsed value",
            Self::SimpleString | Self::String => "string",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Null => "null",
            Self::True | Self::False => "boolean",
            Self::Missing => "missing field",
            Self::Object => "object",
            Self::List | Self::ListWithId => "list",
        }
    }
}

/// One spanned value: a kind plus the byte range it occupies in the current
/// window. `pos` is the absolute offset of `start` within the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawValue {
    pub kind: ValueKind,
    pub start: usize,
    pub end: usize,
    pub pos: u64,
}

/// A durable copy of a spanned value, taken when the value is cached past
/// the lifetime of the window it was spanned in.
#[derive(Debug, Clone)]
pub(crate) struct CapturedValue {
    pub kind: ValueKind,
    pub bytes: Box<[u8]>,
    pub pos: u64,
}

/// Skipped whole objects that declared an identity, keyed by id.
///
/// Fed by the scanner while it spans past unwanted subtrees; consulted when
/// a backreference names an id nothing has constructed yet. First insertion
/// for an id wins — an id is declared at most once in a well-formed
/// document, and replays of a captured range must not re-register it.
#[derive(Debug, Default)]
pub(crate) struct SkipLog {
    objects: BTreeMap<u64, CapturedValue>,
}

impl SkipLog {
    pub fn insert(&mut self, id: u64, value: CapturedValue) {
        self.objects.entry(id).or_insert(value);
    }

    pub fn get(&self, id: u64) -> Option<&CapturedValue> {
        self.objects.get(&id)
    }
}

/// Skipped properties of one open container, keyed by decoded property name.
///
/// Lazily allocated on the first out-of-order access and discarded when the
/// container closes. Entries persist so the same field can be requested more
/// than once.
pub(crate) type SkippedProps = BTreeMap<Box<str>, CapturedValue>;

/// Parses an identity id from a spanned value's bytes: a bare non-negative
/// integer, or the same wrapped in a string.
pub(crate) fn parse_id(kind: ValueKind, bytes: &[u8]) -> Option<u64> {
    let digits: &[u8] = match kind {
        ValueKind::Int => bytes,
        ValueKind::SimpleString => &bytes[1..bytes.len() - 1],
        _ => return None,
    };
    if digits.is_empty() {
        return None;
    }
    let mut id: u64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        id = id.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
    }
    Some(id)
}

/// Copies a window range out into an owned capture.
pub(crate) fn capture(kind: ValueKind, bytes: &[u8], pos: u64) -> CapturedValue {
    CapturedValue {
        kind,
        bytes: Vec::from(bytes).into_boxed_slice(),
        pos,
    }
}
