//! Write engine: deferred formatting and identity assignment.
//!
//! Punctuation is decided one token late: writing a value never appends its
//! trailing comma or newline, it only marks the enclosing container as
//! non-empty. The next entry (or the closer) flushes what is actually
//! needed — a comma exactly when a sibling follows, and no newline at all
//! for a container that closes empty, so `{}` and `[]` stay on one line.

use alloc::{collections::BTreeMap, format, string::String, vec::Vec};

use smallvec::SmallVec;

use crate::{
    bytes,
    error::Result,
    options::{ByteArrayMode, RootKind, WriteOptions},
    scanner::ValueKind,
    sync::{DedupMode, Entered, FieldIo, Instance, ObjKey, SyncObject},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Object,
    List,
}

impl Shape {
    fn closer(self) -> u8 {
        match self {
            Self::Object => b'}',
            Self::List => b']',
        }
    }
}

/// One open container on the write side.
#[derive(Debug, Clone, Copy)]
struct WriteFrame {
    shape: Shape,
    /// Indent level of this container's entries.
    level: u32,
    /// Something was written inside; the closer needs its own line and the
    /// next entry needs a comma.
    any: bool,
    /// Suppress newlines and indentation locally.
    compact: bool,
    /// The list half of an identity wrapper; closing it also closes the
    /// wrapper object.
    fused: bool,
}

/// The streaming document writer.
pub struct Writer {
    out: Vec<u8>,
    options: WriteOptions,
    stack: SmallVec<[WriteFrame; 8]>,
    ids: BTreeMap<ObjKey, u64>,
    next_id: u64,
    scratch: String,
}

impl Writer {
    #[must_use]
    pub fn new(options: WriteOptions) -> Self {
        Self {
            out: Vec::new(),
            options,
            stack: SmallVec::new(),
            ids: BTreeMap::new(),
            next_id: 1,
            scratch: String::new(),
        }
    }

    /// Opens the root container. Call once, before the first field.
    pub fn begin_document(&mut self) {
        let shape = match self.options.root {
            RootKind::Object => Shape::Object,
            RootKind::List => Shape::List,
        };
        self.open(shape, false, false);
    }

    /// Closes the root container.
    pub fn end_document(&mut self) {
        self.close();
        debug_assert!(self.stack.is_empty(), "unclosed container at end of document");
    }

    /// The finished document bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    // --------------------------------------------------------------------
    // Formatting
    // --------------------------------------------------------------------

    fn newline_indent(&mut self, level: u32) {
        if self.options.minify {
            return;
        }
        self.out.extend_from_slice(self.options.newline.as_bytes());
        let depth = level.min(self.options.max_indent_depth);
        for _ in 0..depth {
            self.out.extend_from_slice(self.options.indent.as_bytes());
        }
    }

    /// Flushes the separator owed by the previous entry and positions the
    /// output for the next one.
    fn prepare_slot(&mut self) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        let had_any = top.any;
        top.any = true;
        let level = top.level;
        let compact = top.compact;
        if had_any {
            self.out.push(b',');
        }
        if !compact {
            self.newline_indent(level);
        }
    }

    /// Writes the key for `name` when the current container is an object,
    /// then the colon. Lists get only the slot separator.
    fn key_slot(&mut self, name: &str, convert: bool) {
        self.prepare_slot();
        let Some(top) = self.stack.last() else {
            return;
        };
        if top.shape != Shape::Object {
            return;
        }
        let compact = top.compact;
        self.out.push(b'"');
        if convert {
            if let Some(f) = self.options.name_converter {
                self.scratch.clear();
                f(name, &mut self.scratch);
                let converted = core::mem::take(&mut self.scratch);
                escape_into(&mut self.out, &converted, self.options.escape_threshold);
                self.scratch = converted;
            } else {
                escape_into(&mut self.out, name, self.options.escape_threshold);
            }
        } else {
            escape_into(&mut self.out, name, self.options.escape_threshold);
        }
        self.out.push(b'"');
        self.out.push(b':');
        if self.options.space_after_colon && !self.options.minify && !compact {
            self.out.push(b' ');
        }
    }

    fn open(&mut self, shape: Shape, compact: bool, fused: bool) {
        let parent_level = self.stack.last().map_or(0, |f| f.level);
        let compact = compact || self.stack.last().is_some_and(|f| f.compact);
        self.out.push(match shape {
            Shape::Object => b'{',
            Shape::List => b'[',
        });
        self.stack.push(WriteFrame {
            shape,
            level: parent_level + 1,
            any: false,
            compact,
            fused,
        });
    }

    fn close(&mut self) {
        let top = self.stack.pop().expect("close with no open container");
        if top.any && !top.compact {
            self.newline_indent(top.level.saturating_sub(1));
        }
        self.out.push(top.shape.closer());
    }

    // --------------------------------------------------------------------
    // Values
    // --------------------------------------------------------------------

    fn put_raw(&mut self, text: &str) {
        self.out.extend_from_slice(text.as_bytes());
    }

    fn put_int(&mut self, value: i128) {
        self.put_raw(&format!("{value}"));
    }

    fn put_f32(&mut self, value: f32) {
        if value.is_finite() {
            self.put_raw(&format!("{value}"));
        } else {
            self.put_raw("null");
        }
    }

    fn put_f64(&mut self, value: f64) {
        if value.is_finite() {
            self.put_raw(&format!("{value}"));
        } else {
            // JSON has no spelling for non-finite numbers.
            self.put_raw("null");
        }
    }

    fn put_str(&mut self, value: &str) {
        self.out.push(b'"');
        escape_into(&mut self.out, value, self.options.escape_threshold);
        self.out.push(b'"');
    }

    fn put_id(&mut self, id: u64) {
        if self.options.dialect.quotes_ids() {
            self.put_raw(&format!("\"{id}\""));
        } else {
            self.put_raw(&format!("{id}"));
        }
    }

    fn put_bytes(&mut self, value: &[u8]) {
        match self.options.byte_arrays {
            ByteArrayMode::Base64 => {
                let encoded = bytes::base64_encode(value);
                self.put_str(&encoded);
            }
            ByteArrayMode::NumberList => {
                self.open(Shape::List, true, false);
                for &b in value {
                    self.prepare_slot();
                    self.put_int(i128::from(b));
                }
                self.close();
            }
            ByteArrayMode::Bais => {
                self.scratch.clear();
                let mut text = core::mem::take(&mut self.scratch);
                bytes::bais_encode(value, &mut text);
                self.put_str(&text);
                self.scratch = text;
            }
            ByteArrayMode::BaisPrefixed => {
                self.scratch.clear();
                let mut text = core::mem::take(&mut self.scratch);
                text.push('!');
                bytes::bais_encode(value, &mut text);
                self.put_str(&text);
                self.scratch = text;
            }
        }
    }

    // --------------------------------------------------------------------
    // Deduplication
    // --------------------------------------------------------------------

    /// Emits a one-line backreference object for an already-assigned id.
    fn put_backref(&mut self, id: u64) {
        self.open(Shape::Object, true, false);
        self.key_slot(self.options.dialect.ref_key(), false);
        self.put_id(id);
        self.close();
    }

    fn open_field(&mut self, name: &str, dedup: DedupMode, shape: Shape) -> Entered {
        let seen = match dedup {
            DedupMode::Key(key) => Some((key, self.ids.get(&key).copied())),
            DedupMode::Off | DedupMode::Tracked => None,
        };
        match seen {
            Some((_, Some(id))) => {
                self.key_slot(name, true);
                self.put_backref(id);
                Entered::Existing(None)
            }
            Some((key, None)) => {
                let id = self.next_id;
                self.next_id += 1;
                self.ids.insert(key, id);
                self.key_slot(name, true);
                self.open(Shape::Object, false, false);
                self.key_slot(self.options.dialect.id_key(), false);
                self.put_id(id);
                match shape {
                    Shape::Object => {}
                    Shape::List => {
                        self.key_slot(self.options.dialect.values_key(), false);
                        self.open(Shape::List, false, true);
                    }
                }
                Entered::Open
            }
            None => {
                self.key_slot(name, true);
                self.open(shape, false, false);
                Entered::Open
            }
        }
    }
}

/// Escapes `value` into `out` as JSON string content. Characters at or
/// above `threshold` are written as `\uXXXX` (surrogate pairs past the
/// BMP).
fn escape_into(out: &mut Vec<u8>, value: &str, threshold: u32) {
    for ch in value.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{8}' => out.extend_from_slice(b"\\b"),
            '\u{c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            _ if (ch as u32) < 0x20 || (ch as u32) >= threshold => {
                let mut units = [0u16; 2];
                for &unit in ch.encode_utf16(&mut units).iter() {
                    push_unit_escape(out, unit);
                }
            }
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

fn push_unit_escape(out: &mut Vec<u8>, unit: u16) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.extend_from_slice(&[
        b'\\',
        b'u',
        HEX[usize::from(unit >> 12) & 0xF],
        HEX[usize::from(unit >> 8) & 0xF],
        HEX[usize::from(unit >> 4) & 0xF],
        HEX[usize::from(unit) & 0xF],
    ]);
}

// ------------------------------------------------------------------------
// Facade
// ------------------------------------------------------------------------

impl FieldIo for Writer {
    fn is_reading(&self) -> bool {
        false
    }

    fn sync_bool(&mut self, name: &str, value: bool) -> Result<bool> {
        self.key_slot(name, true);
        self.put_raw(if value { "true" } else { "false" });
        Ok(value)
    }

    fn sync_i8(&mut self, name: &str, value: i8) -> Result<i8> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_u8(&mut self, name: &str, value: u8) -> Result<u8> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_i16(&mut self, name: &str, value: i16) -> Result<i16> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_u16(&mut self, name: &str, value: u16) -> Result<u16> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_i32(&mut self, name: &str, value: i32) -> Result<i32> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_u32(&mut self, name: &str, value: u32) -> Result<u32> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_i64(&mut self, name: &str, value: i64) -> Result<i64> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_u64(&mut self, name: &str, value: u64) -> Result<u64> {
        self.key_slot(name, true);
        self.put_int(i128::from(value));
        Ok(value)
    }

    fn sync_f32(&mut self, name: &str, value: f32) -> Result<f32> {
        self.key_slot(name, true);
        self.put_f32(value);
        Ok(value)
    }

    fn sync_f64(&mut self, name: &str, value: f64) -> Result<f64> {
        self.key_slot(name, true);
        self.put_f64(value);
        Ok(value)
    }

    fn sync_string(&mut self, name: &str, value: String) -> Result<String> {
        self.key_slot(name, true);
        self.put_str(&value);
        Ok(value)
    }

    fn sync_bytes(&mut self, name: &str, value: Vec<u8>) -> Result<Vec<u8>> {
        self.key_slot(name, true);
        self.put_bytes(&value);
        Ok(value)
    }

    fn sync_type_tag(&mut self, value: String) -> Result<String> {
        self.key_slot(self.options.dialect.type_key(), false);
        self.put_str(&value);
        Ok(value)
    }

    fn begin_record(&mut self, name: &str, dedup: DedupMode) -> Result<Entered> {
        Ok(self.open_field(name, dedup, Shape::Object))
    }

    fn end_record(&mut self) -> Result<()> {
        self.close();
        Ok(())
    }

    fn begin_list(&mut self, name: &str, dedup: DedupMode) -> Result<Entered> {
        Ok(self.open_field(name, dedup, Shape::List))
    }

    fn end_list(&mut self) -> Result<()> {
        let fused = self.stack.last().is_some_and(|f| f.fused);
        self.close();
        if fused {
            // The wrapper object the identity declaration lives in.
            self.close();
        }
        Ok(())
    }

    fn list_has_more(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn bind_instance(&mut self, _instance: Instance) -> Result<()> {
        Ok(())
    }

    fn field_kind(&mut self, _name: &str) -> Result<ValueKind> {
        Ok(ValueKind::Missing)
    }
}

/// Writes one whole document, returning its UTF-8 bytes.
pub fn write_vec<T: SyncObject>(value: &mut T, options: WriteOptions) -> Result<Vec<u8>> {
    let mut writer = Writer::new(options);
    writer.begin_document();
    value.sync(&mut writer)?;
    writer.end_document();
    Ok(writer.into_bytes())
}
