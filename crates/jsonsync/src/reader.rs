//! Read engine: field resolution, skip caching, and reference resolution.
//!
//! Field access has two speeds. The fast path compares the requested name
//! against the property the committed cursor already points at and consumes
//! it in place. A miss falls back to the current container's
//! skipped-properties cache, and then to scanning forward — caching every
//! property passed over — until the name is found or the container ends.
//! Requesting fields in written order therefore never allocates; any other
//! order only pays for what it skips.
//!
//! Sub-objects follow the deduplication protocol: a backreference resolves
//! through the identity map, or by replaying a captured skipped object; an
//! identity declaration parks the id on the open container until the
//! application binds an instance to it.

use alloc::{
    collections::{btree_map, BTreeMap},
    string::String,
    vec::Vec,
};
use core::any::type_name;

use crate::{
    bytes,
    error::{Error, ErrorKind, Result},
    options::{ByteArrayMode, ReadOptions, RootKind},
    scanner::{
        number, raw, string, CapturedValue, ContainerKind, Cursor, Opened, ScanConfig, Scanner,
        SkipLog, ValueKind,
    },
    source::{ScanSource, SliceSource},
    sync::{DedupMode, Entered, FieldIo, Instance, SyncObject},
};

/// Where a requested field was found.
enum Located {
    /// The committed cursor points at the live value.
    Live,
    /// Served from the skipped-properties cache.
    Cached(CapturedValue),
    /// Not present in the current container.
    Missing,
}

/// What kind of container an open request expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Record,
    List,
}

impl Want {
    fn describe(self) -> &'static str {
        match self {
            Self::Record => "object",
            Self::List => "list",
        }
    }
}

/// Decoder applied to a resolved field. Runs against live window bytes or a
/// cached copy; must not touch the reader.
type Decode<T> = fn(ValueKind, &[u8], u64, &ReadOptions) -> Result<T>;

/// The streaming document reader.
///
/// One reader decodes exactly one document and is not reusable. A fatal
/// (structural) error poisons the instance: every later call returns the
/// same error.
pub struct Reader<S> {
    scanner: Scanner<S>,
    options: ReadOptions,
    skips: SkipLog,
    identities: BTreeMap<u64, Instance>,
    poison: Option<Error>,
    scratch: String,
}

impl<'a> Reader<SliceSource<'a>> {
    /// Reader over a complete in-memory document.
    #[must_use]
    pub fn from_slice(bytes: &'a [u8], options: ReadOptions) -> Self {
        Self::new(SliceSource::new(bytes), options)
    }
}

impl<S: ScanSource> Reader<S> {
    #[must_use]
    pub fn new(source: S, options: ReadOptions) -> Self {
        let cfg = ScanConfig {
            strict: options.strict,
            allow_comments: options.allow_comments,
            max_depth: options.max_depth,
            verify_eof: options.verify_eof,
            dialect: options.dialect,
        };
        Self {
            scanner: Scanner::new(source, cfg),
            options,
            skips: SkipLog::default(),
            identities: BTreeMap::new(),
            poison: None,
            scratch: String::new(),
        }
    }

    /// Opens the root container. Call once, before the first field.
    pub fn begin_document(&mut self) -> Result<()> {
        self.guard()?;
        let r = self.begin_document_inner();
        r.map_err(|e| self.fail(e))
    }

    fn begin_document_inner(&mut self) -> Result<()> {
        let mut cur = self.scanner.cursor();
        let (expected, expected_name) = match self.options.root {
            RootKind::Object => (ContainerKind::Object, "object"),
            RootKind::List => (ContainerKind::List, "list"),
        };
        match self.scanner.try_begin_object(&mut cur, &mut self.skips)? {
            Some(opened) if opened.kind == expected => Ok(()),
            Some(opened) => {
                let found = match opened.kind {
                    ContainerKind::Object => "object",
                    _ => "list",
                };
                self.scanner.undo_begin_object(&mut cur, opened);
                Err(Error::new(
                    ErrorKind::TypeMismatch {
                        expected: expected_name,
                        found,
                    },
                    self.scanner.pos(),
                ))
            }
            None => {
                let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
                Err(Error::new(
                    ErrorKind::TypeMismatch {
                        expected: expected_name,
                        found: raw.kind.describe(),
                    },
                    raw.pos,
                ))
            }
        }
    }

    /// Closes the root container, skipping unread fields and applying the
    /// trailing-input policy.
    pub fn end_document(&mut self) -> Result<()> {
        self.guard()?;
        let mut cur = self.scanner.cursor();
        let r = self
            .scanner
            .end_object_and_commit(&mut cur, &mut self.skips);
        r.map_err(|e| self.fail(e))
    }

    // --------------------------------------------------------------------
    // Error discipline
    // --------------------------------------------------------------------

    fn guard(&self) -> Result<()> {
        match &self.poison {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        if e.is_fatal() {
            self.poison = Some(e.clone());
        }
        e
    }

    // --------------------------------------------------------------------
    // Field resolution
    // --------------------------------------------------------------------

    fn in_list(&self) -> bool {
        matches!(
            self.scanner.top().map(|c| c.kind),
            Some(ContainerKind::List | ContainerKind::ListWithId)
        )
    }

    /// Whether the committed key matches `name`, trying the converted
    /// spelling first and falling back to the original.
    fn key_matches(&mut self, name: &str, convert: bool) -> bool {
        let key = self.scanner.committed_key();
        if convert {
            if let Some(f) = self.options.name_converter {
                self.scratch.clear();
                f(name, &mut self.scratch);
                if self.scanner.key_is(key, &self.scratch) {
                    return true;
                }
            }
        }
        self.scanner.key_is(key, name)
    }

    fn lookup_skipped(&mut self, name: &str, convert: bool) -> Option<CapturedValue> {
        let converted = if convert {
            self.options.name_converter.map(|f| {
                let mut s = String::new();
                f(name, &mut s);
                s
            })
        } else {
            None
        };
        let map = self.scanner.top()?.skipped.as_ref()?;
        if let Some(c) = converted.as_deref().and_then(|n| map.get(n)) {
            return Some(c.clone());
        }
        map.get(name).cloned()
    }

    /// Positions the engine at the value of `name`, scanning forward and
    /// caching skipped properties as needed.
    fn resolve_field(&mut self, name: &str, convert: bool) -> Result<Located> {
        if self.in_list() {
            return Ok(if self.scanner.at_end() {
                Located::Missing
            } else {
                Located::Live
            });
        }
        if self.key_matches(name, convert) {
            return Ok(Located::Live);
        }
        if let Some(c) = self.lookup_skipped(name, convert) {
            return Ok(Located::Cached(c));
        }
        while !self.scanner.at_end() {
            let key_text = self.scanner.key_text(self.scanner.committed_key());
            let mut cur = self.scanner.cursor();
            let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
            if let Some(key) = key_text {
                let cap = self.scanner.capture(&raw);
                self.scanner.skipped_props_mut().insert(key, cap);
            }
            self.scanner.begin_next(&mut cur, &mut self.skips)?;
            if self.key_matches(name, convert) {
                return Ok(Located::Live);
            }
        }
        // The forward scan may have cached the field under a spelling the
        // direct probes missed.
        if let Some(c) = self.lookup_skipped(name, convert) {
            return Ok(Located::Cached(c));
        }
        Ok(Located::Missing)
    }

    // --------------------------------------------------------------------
    // Primitive decoding
    // --------------------------------------------------------------------

    fn sync_prim<T>(&mut self, name: &str, convert: bool, decode: Decode<T>) -> Result<T> {
        self.guard()?;
        let r = self.sync_prim_inner(name, convert, decode);
        r.map_err(|e| self.fail(e))
    }

    fn sync_prim_inner<T>(&mut self, name: &str, convert: bool, decode: Decode<T>) -> Result<T> {
        match self.resolve_field(name, convert)? {
            Located::Live => {
                let mut cur = self.scanner.cursor();
                let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
                let value = decode(
                    raw.kind,
                    self.scanner.raw_bytes(&raw),
                    raw.pos,
                    &self.options,
                )?;
                self.scanner.begin_next(&mut cur, &mut self.skips)?;
                Ok(value)
            }
            Located::Cached(c) => decode(c.kind, &c.bytes, c.pos, &self.options),
            Located::Missing => {
                if self.options.allow_missing_fields {
                    // Missing behaves as if the field were present with
                    // value null.
                    decode(ValueKind::Null, b"", self.scanner.pos(), &self.options)
                } else {
                    Err(Error::new(
                        ErrorKind::MissingField(name.into()),
                        self.scanner.pos(),
                    ))
                }
            }
        }
    }

    // --------------------------------------------------------------------
    // Sub-objects and references
    // --------------------------------------------------------------------

    fn open_field(&mut self, name: &str, dedup: bool, want: Want) -> Result<Entered> {
        self.guard()?;
        let r = self.open_field_inner(name, dedup, want);
        if r.is_err() {
            // A recoverable failure may have run a replayed range to its
            // end; resume the outer frame so sibling reads stay coherent.
            self.pop_finished_replays();
        }
        r.map_err(|e| self.fail(e))
    }

    fn open_field_inner(&mut self, name: &str, dedup: bool, want: Want) -> Result<Entered> {
        match self.resolve_field(name, true)? {
            Located::Live => self.open_live(dedup, want),
            Located::Cached(c) => match c.kind {
                ValueKind::Object | ValueKind::List => {
                    let mut cur = self.scanner.cursor();
                    self.scanner.begin_replay(&mut cur, &c);
                    self.open_live(dedup, want)
                }
                ValueKind::Null => Ok(Entered::Absent),
                kind => Err(Error::new(
                    ErrorKind::TypeMismatch {
                        expected: want.describe(),
                        found: kind.describe(),
                    },
                    c.pos,
                )),
            },
            Located::Missing => {
                if self.options.allow_missing_fields {
                    Ok(Entered::Absent)
                } else {
                    Err(Error::new(
                        ErrorKind::MissingField(name.into()),
                        self.scanner.pos(),
                    ))
                }
            }
        }
    }

    fn open_live(&mut self, dedup: bool, want: Want) -> Result<Entered> {
        let mut cur = self.scanner.cursor();
        let Some(opened) = self.scanner.try_begin_object(&mut cur, &mut self.skips)? else {
            let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
            if raw.kind == ValueKind::Null {
                self.scanner.begin_next(&mut cur, &mut self.skips)?;
                return Ok(Entered::Absent);
            }
            return Err(Error::new(
                ErrorKind::TypeMismatch {
                    expected: want.describe(),
                    found: raw.kind.describe(),
                },
                raw.pos,
            ));
        };
        match (want, opened.kind) {
            (Want::List, ContainerKind::List | ContainerKind::ListWithId) => Ok(Entered::Open),
            (Want::Record, ContainerKind::List | ContainerKind::ListWithId) => {
                self.scanner.undo_begin_object(&mut cur, opened);
                Err(Error::new(
                    ErrorKind::TypeMismatch {
                        expected: "object",
                        found: "list",
                    },
                    self.scanner.pos(),
                ))
            }
            (_, ContainerKind::Object) => self.open_object(cur, opened, dedup, want),
        }
    }

    /// Applies the reference protocol to a just-opened object.
    ///
    /// A backreference is recognized by its key being the object's first
    /// (it is the object's only content). An identity declaration is
    /// recognized in first position always, and anywhere in the object when
    /// the field was opened dedup-eligible — the writer puts it first, but
    /// hand-edited documents may not.
    fn open_object(
        &mut self,
        mut cur: Cursor,
        opened: Opened,
        dedup: bool,
        want: Want,
    ) -> Result<Entered> {
        let dialect = self.options.dialect;
        let key = self.scanner.committed_key();

        if self.scanner.key_is(key, dialect.ref_key()) {
            // A backreference stands in for the whole object; consume it,
            // then resolve the target.
            let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
            let id = self.scanner.parse_id(&raw)?;
            let pos = raw.pos;
            self.scanner.begin_next(&mut cur, &mut self.skips)?;
            self.scanner.end_object_and_commit(&mut cur, &mut self.skips)?;
            self.pop_finished_replays();
            if let Some(instance) = self.identities.get(&id) {
                return Ok(Entered::Existing(Some(instance.clone())));
            }
            if let Some(captured) = self.skips.get(id).cloned() {
                // The target was scanned past earlier; read it now as if it
                // were in place of the backreference.
                let mut cur = self.scanner.cursor();
                self.scanner.begin_replay(&mut cur, &captured);
                return self.open_live(dedup, want);
            }
            return Err(Error::new(ErrorKind::DanglingReference(id), pos));
        }

        let first_is_id = self.scanner.key_is(key, dialect.id_key());
        if !first_is_id && !dedup {
            return match want {
                Want::Record => Ok(Entered::Open),
                Want::List => {
                    self.scanner.undo_begin_object(&mut cur, opened);
                    Err(Error::new(
                        ErrorKind::TypeMismatch {
                            expected: "list",
                            found: "object",
                        },
                        self.scanner.pos(),
                    ))
                }
            };
        }

        // Identity resolution. The common case is the id in first position
        // and consumed in place; a dedup-eligible open also finds it through
        // the regular out-of-order machinery.
        let id = if first_is_id {
            let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
            let id = self.scanner.parse_id(&raw)?;
            self.scanner.begin_next(&mut cur, &mut self.skips)?;
            Some(id)
        } else {
            match self.resolve_field(dialect.id_key(), false)? {
                Located::Live => {
                    let mut cur = self.scanner.cursor();
                    let raw = self.scanner.scan_value(&mut cur, &mut self.skips)?;
                    let id = self.scanner.parse_id(&raw)?;
                    self.scanner.begin_next(&mut cur, &mut self.skips)?;
                    Some(id)
                }
                Located::Cached(c) => Some(
                    raw::parse_id(c.kind, &c.bytes)
                        .ok_or_else(|| Error::new(ErrorKind::MalformedIdentity, c.pos))?,
                ),
                Located::Missing => None,
            }
        };

        if let Some(id) = id {
            if let Some(instance) = self.identities.get(&id).cloned() {
                // Already constructed through another path; skip this body.
                let mut cur = self.scanner.cursor();
                self.scanner.end_object_and_commit(&mut cur, &mut self.skips)?;
                self.pop_finished_replays();
                return Ok(Entered::Existing(Some(instance)));
            }
            if let Some(top) = self.scanner.top_mut() {
                top.id = Some(id);
            }
        }

        match want {
            Want::Record => Ok(Entered::Open),
            Want::List => {
                if id.is_none() {
                    return Err(Error::new(
                        ErrorKind::TypeMismatch {
                            expected: "list",
                            found: "object",
                        },
                        self.scanner.pos(),
                    ));
                }
                match self.resolve_field(dialect.values_key(), false)? {
                    Located::Live => {
                        let mut cur = self.scanner.cursor();
                        self.scanner.try_open_list_values(&mut cur)?;
                        Ok(Entered::Open)
                    }
                    // A values list scanned past while hunting for the id
                    // would have to be replayed while the wrapper closer
                    // stays in the outer window; no writer produces that
                    // ordering, so it is rejected instead of special-cased.
                    Located::Cached(_) | Located::Missing => Err(Error::new(
                        ErrorKind::MalformedIdentity,
                        self.scanner.pos(),
                    )),
                }
            }
        }
    }

    fn close_container(&mut self) -> Result<()> {
        self.guard()?;
        let mut cur = self.scanner.cursor();
        let r = self
            .scanner
            .end_object_and_commit(&mut cur, &mut self.skips);
        r.map_err(|e| self.fail(e))?;
        self.pop_finished_replays();
        Ok(())
    }

    /// Pops every replay frame whose captured range has been consumed,
    /// resuming the frame that was live when the replay began.
    fn pop_finished_replays(&mut self) {
        loop {
            let cur = self.scanner.cursor();
            if !self.scanner.at_replay_end(&cur) {
                break;
            }
            let mut cur = cur;
            self.scanner.end_replay(&mut cur);
        }
    }
}

// ------------------------------------------------------------------------
// Decoders
// ------------------------------------------------------------------------

fn null_default<T: Default>(pos: u64, options: &ReadOptions) -> Result<T> {
    if options.null_as_default {
        Ok(T::default())
    } else {
        Err(Error::new(ErrorKind::UnexpectedNull, pos))
    }
}

fn mismatch<T>(expected: &'static str, found: ValueKind, pos: u64) -> Result<T> {
    Err(Error::new(
        ErrorKind::TypeMismatch {
            expected,
            found: found.describe(),
        },
        pos,
    ))
}

/// Runs the configured primitive coercion, if any, on a mistyped value.
fn coerce(kind: ValueKind, bytes: &[u8], options: &ReadOptions) -> Option<String> {
    options.coerce_primitive.and_then(|f| f(kind, bytes))
}

fn decode_bool(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<bool> {
    match kind {
        ValueKind::True => Ok(true),
        ValueKind::False => Ok(false),
        ValueKind::Null | ValueKind::Missing => null_default(pos, options),
        k => match coerce(k, bytes, options).as_deref() {
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            _ => mismatch("boolean", k, pos),
        },
    }
}

fn decode_int<T>(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<T>
where
    T: TryFrom<i128> + Default,
{
    match kind {
        ValueKind::Int => {
            let wide = number::decode_integer(bytes)
                .ok_or_else(|| Error::new(ErrorKind::NumberOutOfRange(type_name::<T>()), pos))?;
            T::try_from(wide)
                .map_err(|_| Error::new(ErrorKind::NumberOutOfRange(type_name::<T>()), pos))
        }
        ValueKind::Null | ValueKind::Missing => null_default(pos, options),
        k => match coerce(k, bytes, options)
            .and_then(|text| number::decode_integer(text.as_bytes()))
            .and_then(|wide| T::try_from(wide).ok())
        {
            Some(value) => Ok(value),
            None => mismatch("integer", k, pos),
        },
    }
}

fn decode_f64(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<f64> {
    match kind {
        ValueKind::Int | ValueKind::Float => {
            number::decode_float(bytes).map_err(|k| Error::new(k, pos))
        }
        ValueKind::Null | ValueKind::Missing => null_default(pos, options),
        k => match coerce(k, bytes, options)
            .and_then(|text| number::decode_float(text.as_bytes()).ok())
        {
            Some(value) => Ok(value),
            None => mismatch("number", k, pos),
        },
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decode_f32(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<f32> {
    decode_f64(kind, bytes, pos, options).map(|v| v as f32)
}

fn string_contents(bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<String> {
    string::decode(&bytes[1..bytes.len() - 1], options.strict).map_err(|k| Error::new(k, pos))
}

fn decode_string(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<String> {
    match kind {
        ValueKind::SimpleString | ValueKind::String => string_contents(bytes, pos, options),
        ValueKind::Null | ValueKind::Missing => null_default(pos, options),
        k => match coerce(k, bytes, options) {
            Some(text) => Ok(text),
            None => mismatch("string", k, pos),
        },
    }
}

fn decode_bytes(kind: ValueKind, bytes: &[u8], pos: u64, options: &ReadOptions) -> Result<Vec<u8>> {
    match kind {
        ValueKind::SimpleString | ValueKind::String => {
            let text = string_contents(bytes, pos, options)?;
            let decoded = if let Some(rest) = bytes::strip_bais_prefix(&text) {
                bytes::bais_decode(rest)
            } else if options.byte_arrays == ByteArrayMode::Bais {
                bytes::bais_decode(&text)
            } else {
                bytes::base64_decode(&text)
            };
            decoded.map_err(|k| Error::new(k, pos))
        }
        ValueKind::List => decode_number_list(bytes, pos),
        ValueKind::Null | ValueKind::Missing => null_default(pos, options),
        k => mismatch("byte array", k, pos),
    }
}

/// Re-parses an already-spanned number list as bytes. The span was
/// structurally validated when it was scanned, so this only needs to pick
/// the numbers out.
fn decode_number_list(bytes: &[u8], pos: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 1; // past '['
    let end = bytes.len() - 1; // before ']'
    while i < end {
        match bytes[i] {
            b' ' | b'\t' | b'\n' | b'\r' | b',' => i += 1,
            _ => {
                let start = i;
                while i < end && !matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r' | b',') {
                    i += 1;
                }
                let wide = number::decode_integer(&bytes[start..i])
                    .ok_or_else(|| Error::new(ErrorKind::NumberOutOfRange("u8"), pos))?;
                let byte = u8::try_from(wide)
                    .map_err(|_| Error::new(ErrorKind::NumberOutOfRange("u8"), pos))?;
                out.push(byte);
            }
        }
    }
    Ok(out)
}

// ------------------------------------------------------------------------
// Facade
// ------------------------------------------------------------------------

impl<S: ScanSource> FieldIo for Reader<S> {
    fn is_reading(&self) -> bool {
        true
    }

    fn sync_bool(&mut self, name: &str, _value: bool) -> Result<bool> {
        self.sync_prim(name, true, decode_bool)
    }

    fn sync_i8(&mut self, name: &str, _value: i8) -> Result<i8> {
        self.sync_prim(name, true, decode_int::<i8>)
    }

    fn sync_u8(&mut self, name: &str, _value: u8) -> Result<u8> {
        self.sync_prim(name, true, decode_int::<u8>)
    }

    fn sync_i16(&mut self, name: &str, _value: i16) -> Result<i16> {
        self.sync_prim(name, true, decode_int::<i16>)
    }

    fn sync_u16(&mut self, name: &str, _value: u16) -> Result<u16> {
        self.sync_prim(name, true, decode_int::<u16>)
    }

    fn sync_i32(&mut self, name: &str, _value: i32) -> Result<i32> {
        self.sync_prim(name, true, decode_int::<i32>)
    }

    fn sync_u32(&mut self, name: &str, _value: u32) -> Result<u32> {
        self.sync_prim(name, true, decode_int::<u32>)
    }

    fn sync_i64(&mut self, name: &str, _value: i64) -> Result<i64> {
        self.sync_prim(name, true, decode_int::<i64>)
    }

    fn sync_u64(&mut self, name: &str, _value: u64) -> Result<u64> {
        self.sync_prim(name, true, decode_int::<u64>)
    }

    fn sync_f32(&mut self, name: &str, _value: f32) -> Result<f32> {
        self.sync_prim(name, true, decode_f32)
    }

    fn sync_f64(&mut self, name: &str, _value: f64) -> Result<f64> {
        self.sync_prim(name, true, decode_f64)
    }

    fn sync_string(&mut self, name: &str, _value: String) -> Result<String> {
        self.sync_prim(name, true, decode_string)
    }

    fn sync_bytes(&mut self, name: &str, _value: Vec<u8>) -> Result<Vec<u8>> {
        self.sync_prim(name, true, decode_bytes)
    }

    fn sync_type_tag(&mut self, _value: String) -> Result<String> {
        let key = self.options.dialect.type_key();
        self.sync_prim(key, false, decode_string)
    }

    fn begin_record(&mut self, name: &str, dedup: DedupMode) -> Result<Entered> {
        self.open_field(name, dedup != DedupMode::Off, Want::Record)
    }

    fn end_record(&mut self) -> Result<()> {
        self.close_container()
    }

    fn begin_list(&mut self, name: &str, dedup: DedupMode) -> Result<Entered> {
        self.open_field(name, dedup != DedupMode::Off, Want::List)
    }

    fn end_list(&mut self) -> Result<()> {
        self.close_container()
    }

    fn list_has_more(&mut self) -> Result<bool> {
        self.guard()?;
        Ok(!self.scanner.at_end())
    }

    fn bind_instance(&mut self, instance: Instance) -> Result<()> {
        self.guard()?;
        let Some(id) = self.scanner.top().and_then(|c| c.id) else {
            return Ok(());
        };
        match self.identities.entry(id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(instance);
                Ok(())
            }
            btree_map::Entry::Occupied(slot) => {
                if core::ptr::addr_eq(Instance::as_ptr(slot.get()), Instance::as_ptr(&instance)) {
                    Ok(())
                } else {
                    Err(Error::new(
                        ErrorKind::IdentityRebound(id),
                        self.scanner.pos(),
                    ))
                }
            }
        }
    }

    fn field_kind(&mut self, name: &str) -> Result<ValueKind> {
        self.guard()?;
        let r = match self.resolve_field(name, true) {
            Ok(Located::Live) => {
                // Probe without committing; the value stays consumable.
                let mut probe = self.scanner.cursor();
                self.scanner
                    .scan_value(&mut probe, &mut self.skips)
                    .map(|raw| raw.kind.normalized())
            }
            Ok(Located::Cached(c)) => Ok(c.kind.normalized()),
            Ok(Located::Missing) => Ok(ValueKind::Missing),
            Err(e) => Err(e),
        };
        r.map_err(|e| self.fail(e))
    }
}

/// Reads one whole document from an in-memory byte slice.
pub fn read_slice<T: SyncObject + Default>(bytes: &[u8], options: ReadOptions) -> Result<T> {
    read_from(SliceSource::new(bytes), options)
}

/// Reads one whole document from a scan source.
pub fn read_from<S: ScanSource, T: SyncObject + Default>(
    source: S,
    options: ReadOptions,
) -> Result<T> {
    let mut reader = Reader::new(source, options);
    reader.begin_document()?;
    let mut value = T::default();
    value.sync(&mut reader)?;
    reader.end_document()?;
    Ok(value)
}
