#![allow(clippy::struct_excessive_bools)]

//! Configuration consumed by the read and write engines.

use alloc::string::String;

use crate::dialect::Dialect;

/// How raw byte sequences are represented on the wire.
///
/// On read the representation is auto-detected: a JSON list is read as a
/// list of numbers, a string starting with `!` (or the control character
/// U+0001) is unprefixed and decoded as BAIS, and any other string is
/// decoded as Base64 — unless the configured mode is [`Bais`], in which case
/// unprefixed strings are treated as BAIS too.
///
/// Switching already-written data from [`Bais`] to [`BaisPrefixed`] is a
/// compatibility hazard: old unprefixed strings will be misread as Base64.
///
/// [`Bais`]: ByteArrayMode::Bais
/// [`BaisPrefixed`]: ByteArrayMode::BaisPrefixed
///
/// # Default
///
/// [`ByteArrayMode::Base64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteArrayMode {
    /// Base64 string, as Json.NET writes `byte[]`.
    #[default]
    Base64,
    /// JSON list of numbers, one element per byte.
    NumberList,
    /// Byte-array-in-string without a prefix character.
    Bais,
    /// Byte-array-in-string prefixed with `!`.
    BaisPrefixed,
}

/// Kind of the document's root container.
///
/// # Default
///
/// [`RootKind::Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootKind {
    /// The document root is an object; fields are synced by name.
    #[default]
    Object,
    /// The document root is a list; items are synced with the empty name.
    List,
}

/// A field-name transform applied before names are written or compared.
///
/// The converter appends the transformed form of `name` to `out`. On read,
/// if the transformed name misses, the original spelling is re-checked, so
/// documents written under a different convention still resolve.
pub type NameConverter = fn(name: &str, out: &mut String);

/// Custom coercion consulted when a primitive read meets a value of the
/// wrong shape, before the type mismatch is reported.
///
/// The callback sees the value's kind and raw bytes (string quotes
/// included) and may return replacement text that is then decoded as if the
/// document had contained a bare scalar spelled that way. Returning `None`
/// lets the mismatch error through.
pub type CoercePrimitive = fn(kind: crate::ValueKind, bytes: &[u8]) -> Option<String>;

/// Configuration options for reading a document.
///
/// # Examples
///
/// ```rust
/// use jsonsync::{Dialect, ReadOptions};
///
/// let options = ReadOptions {
///     dialect: Dialect::Newtonsoft,
///     allow_comments: true,
///     ..ReadOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Which control-key convention the document uses.
    ///
    /// # Default
    ///
    /// [`Dialect::Compact`].
    pub dialect: Dialect,

    /// Optional transform applied to field names before comparison.
    ///
    /// # Default
    ///
    /// `None`.
    pub name_converter: Option<NameConverter>,

    /// Kind of the root container.
    ///
    /// # Default
    ///
    /// [`RootKind::Object`].
    pub root: RootKind,

    /// Expected byte-array representation; see [`ByteArrayMode`] for the
    /// auto-detection rules.
    ///
    /// # Default
    ///
    /// [`ByteArrayMode::Base64`].
    pub byte_arrays: ByteArrayMode,

    /// Reject syntax RFC 8259 rejects.
    ///
    /// When `false`, the scanner tolerates leading zeros, a leading or
    /// trailing decimal point, missing exponent digits, trailing commas,
    /// the `\0` escape, unknown escapes (kept as a literal backslash plus
    /// the character), and non-string object keys.
    ///
    /// # Default
    ///
    /// `false`.
    pub strict: bool,

    /// Maximum container nesting depth before a fatal error is raised.
    ///
    /// # Default
    ///
    /// `64`.
    pub max_depth: u32,

    /// Whether `//` and `/* */` comments are skipped as whitespace.
    ///
    /// # Default
    ///
    /// `false`.
    pub allow_comments: bool,

    /// Whether non-whitespace input after the root value is an error.
    ///
    /// # Default
    ///
    /// `true`.
    pub verify_eof: bool,

    /// Whether a requested field that is absent from its object reads as
    /// `null` instead of raising [`ErrorKind::MissingField`].
    ///
    /// [`ErrorKind::MissingField`]: crate::ErrorKind::MissingField
    ///
    /// # Default
    ///
    /// `true`.
    pub allow_missing_fields: bool,

    /// Whether a `null` read into a primitive field yields that primitive's
    /// default value instead of raising [`ErrorKind::UnexpectedNull`].
    ///
    /// [`ErrorKind::UnexpectedNull`]: crate::ErrorKind::UnexpectedNull
    ///
    /// # Default
    ///
    /// `true`.
    pub null_as_default: bool,

    /// Optional coercion for mistyped primitives; see [`CoercePrimitive`].
    ///
    /// # Default
    ///
    /// `None`.
    pub coerce_primitive: Option<CoercePrimitive>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            name_converter: None,
            root: RootKind::default(),
            byte_arrays: ByteArrayMode::default(),
            strict: false,
            max_depth: 64,
            allow_comments: false,
            verify_eof: true,
            allow_missing_fields: true,
            null_as_default: true,
            coerce_primitive: None,
        }
    }
}

/// Configuration options for writing a document.
///
/// # Examples
///
/// ```rust
/// use jsonsync::WriteOptions;
///
/// let options = WriteOptions {
///     minify: true,
///     ..WriteOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Which control-key convention to emit.
    ///
    /// # Default
    ///
    /// [`Dialect::Compact`].
    pub dialect: Dialect,

    /// Optional transform applied to field names before they are written.
    ///
    /// # Default
    ///
    /// `None`.
    pub name_converter: Option<NameConverter>,

    /// Kind of the root container.
    ///
    /// # Default
    ///
    /// [`RootKind::Object`].
    pub root: RootKind,

    /// Byte-array representation to emit.
    ///
    /// # Default
    ///
    /// [`ByteArrayMode::Base64`].
    pub byte_arrays: ByteArrayMode,

    /// Line terminator between container entries.
    ///
    /// # Default
    ///
    /// `"\n"`.
    pub newline: &'static str,

    /// String repeated once per indentation level.
    ///
    /// # Default
    ///
    /// `"\t"`.
    pub indent: &'static str,

    /// Whether a space follows the `:` after each key.
    ///
    /// # Default
    ///
    /// `true`.
    pub space_after_colon: bool,

    /// Characters at or above this code point are written as `\uXXXX`.
    ///
    /// # Default
    ///
    /// `0x7F` (pure-ASCII output).
    pub escape_threshold: u32,

    /// Nesting depth past which visible indentation stops growing.
    ///
    /// # Default
    ///
    /// `32`.
    pub max_indent_depth: u32,

    /// Suppress all newlines, indentation, and the space after colons.
    ///
    /// # Default
    ///
    /// `false`.
    pub minify: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            name_converter: None,
            root: RootKind::default(),
            byte_arrays: ByteArrayMode::default(),
            newline: "\n",
            indent: "\t",
            space_after_colon: true,
            escape_threshold: 0x7F,
            max_indent_depth: 32,
            minify: false,
        }
    }
}
