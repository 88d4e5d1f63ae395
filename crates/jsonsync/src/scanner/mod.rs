//! Value scanner: incremental tokenizing over a sliding buffer window.
//!
//! The scanner recognizes one JSON value at a time and exposes the
//! structural operations the read engine is built from. Two pieces of state
//! cooperate:
//!
//! - the ephemeral [`Cursor`], a plain `Copy` value threaded by `&mut`
//!   through every scanning call. It is never stored. Speculative scanning
//!   is simply "take a cursor, scan, and drop it without committing" — the
//!   persisted state is untouched, so backtracking costs nothing.
//! - the persisted [`Frame`], written only at explicit checkpoints (after a
//!   value or property boundary is fully recognized). A fresh cursor is
//!   always rebuilt from the frame.
//!
//! Only one cursor may be live at a time: a refill rebases the frame and
//! the cursor passed into the refilling call, and any other outstanding
//! cursor copy goes stale. Callers that probed ahead rebuild from the frame.
//!
//! The window is owned here as a `Vec<u8>`; sources only append. When more
//! lookahead is needed, bytes below the discard floor — the minimum of the
//! active pin, the committed position, the committed key range, and the byte
//! about to be read — are dropped and every window-relative index is rebased
//! by the amount discarded. A value's bytes therefore stay contiguous and
//! valid for as long as it can still be referenced.
//!
//! Replay pushes the whole frame, window included, onto a LIFO stack and
//! installs a previously captured byte range as the window. Container
//! bookkeeping is untouched by replay entry and exit.

pub(crate) mod number;
pub(crate) mod raw;
pub(crate) mod string;

#[cfg(test)]
mod tests;

use alloc::{boxed::Box, string::String, vec::Vec};
use core::mem;

use smallvec::SmallVec;

pub use raw::ValueKind;
pub(crate) use raw::{CapturedValue, RawValue, SkipLog, SkippedProps};

use crate::{
    dialect::Dialect,
    error::{Error, ErrorKind, Result},
    source::ScanSource,
};

/// Scanner-facing subset of the read options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanConfig {
    pub strict: bool,
    pub allow_comments: bool,
    pub max_depth: u32,
    pub verify_eof: bool,
    pub dialect: Dialect,
}

/// How the current property key was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum KeyKind {
    /// No key: inside a list, or at a container boundary.
    #[default]
    None,
    /// String key without escapes; compares byte-for-byte.
    Plain,
    /// String key with escapes or non-ASCII; compares after decoding.
    Escaped,
    /// Tolerated non-string key. Never matches a requested name.
    Bare,
}

/// Window-relative span of the current property key's content.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeySpan {
    pub kind: KeyKind,
    pub start: usize,
    pub end: usize,
}

/// Ephemeral scanning position. See the module docs for the cursor/frame
/// discipline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor {
    /// Window-relative byte index.
    pub index: usize,
    /// Key of the property the cursor points at; meaningless inside lists.
    pub key: KeySpan,
    /// Whether the cursor sits before the current container's closer.
    pub at_end: bool,
    /// Lowest absolute byte that must survive compaction, if any.
    pin: Option<u64>,
}

/// Persisted scanning context, updated only at commit points.
#[derive(Debug, Clone, Copy)]
struct Frame {
    index: usize,
    key: KeySpan,
    at_end: bool,
    pin: Option<u64>,
}

impl Frame {
    fn start() -> Self {
        Self {
            index: 0,
            key: KeySpan::default(),
            at_end: false,
            pin: None,
        }
    }
}

/// A frame saved across a replay, window included.
#[derive(Debug)]
struct SavedFrame {
    frame: Frame,
    window: Vec<u8>,
    window_start: u64,
    eof: bool,
}

/// Kind of an open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Object,
    List,
    /// A list collapsed with its identity wrapper; iterates like a list and
    /// closes with two physical closers.
    ListWithId,
}

/// One entry of the open-container stack.
#[derive(Debug)]
pub(crate) struct Container {
    pub kind: ContainerKind,
    /// Identity declared by this container, once the engine has read it.
    pub id: Option<u64>,
    /// Properties scanned past but not yet consumed. Lazily allocated.
    pub skipped: Option<SkippedProps>,
    /// Absolute position of the opener.
    pub start_pos: u64,
}

/// Token returned by a successful [`Scanner::try_begin_object`], needed to
/// reverse the open before any further commit.
#[derive(Debug)]
pub(crate) struct Opened {
    prev: Frame,
    pub kind: ContainerKind,
}

pub(crate) struct Scanner<S> {
    source: S,
    cfg: ScanConfig,
    window: Vec<u8>,
    /// Absolute offset of `window[0]` within the logical document.
    window_start: u64,
    /// The source has reported end of input.
    eof: bool,
    frame: Frame,
    containers: SmallVec<[Container; 8]>,
    replays: SmallVec<[SavedFrame; 2]>,
}

impl<S: ScanSource> Scanner<S> {
    pub fn new(source: S, cfg: ScanConfig) -> Self {
        Self {
            source,
            cfg,
            window: Vec::new(),
            window_start: 0,
            eof: false,
            frame: Frame::start(),
            containers: SmallVec::new(),
            replays: SmallVec::new(),
        }
    }

    // --------------------------------------------------------------------
    // Cursor / frame plumbing
    // --------------------------------------------------------------------

    /// A fresh cursor at the committed position.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            index: self.frame.index,
            key: self.frame.key,
            at_end: self.frame.at_end,
            pin: self.frame.pin,
        }
    }

    /// Commits `cur` into the frame, releasing any pin.
    pub fn commit(&mut self, cur: &Cursor) {
        self.frame = Frame {
            index: cur.index,
            key: cur.key,
            at_end: cur.at_end,
            pin: None,
        };
    }

    fn commit_pinned(&mut self, cur: &Cursor, pin: u64) {
        self.commit(cur);
        self.frame.pin = Some(pin);
    }

    pub fn at_end(&self) -> bool {
        self.frame.at_end
    }

    /// Key of the property the committed cursor points at.
    pub fn committed_key(&self) -> KeySpan {
        self.frame.key
    }

    /// Absolute position of the committed cursor.
    pub fn pos(&self) -> u64 {
        self.abs(self.frame.index)
    }

    fn abs(&self, index: usize) -> u64 {
        self.window_start + index as u64
    }

    fn err_at(&self, index: usize, kind: ErrorKind) -> Error {
        Error::new(kind, self.abs(index))
    }

    // --------------------------------------------------------------------
    // Window management
    // --------------------------------------------------------------------

    fn replaying(&self) -> bool {
        !self.replays.is_empty()
    }

    /// Depth of the replay stack, for LIFO assertions in tests.
    #[cfg(test)]
    pub fn replay_depth(&self) -> usize {
        self.replays.len()
    }

    /// Whether the replayed range has been fully consumed.
    pub fn at_replay_end(&self, cur: &Cursor) -> bool {
        self.replaying() && cur.index >= self.window.len()
    }

    fn discard_floor(&self, cur: &Cursor) -> u64 {
        let mut floor = self.abs(cur.index.min(self.frame.index));
        if let Some(pin) = cur.pin {
            floor = floor.min(pin);
        }
        if let Some(pin) = self.frame.pin {
            floor = floor.min(pin);
        }
        if self.frame.key.kind != KeyKind::None {
            floor = floor.min(self.abs(self.frame.key.start));
        }
        if cur.key.kind != KeyKind::None {
            floor = floor.min(self.abs(cur.key.start));
        }
        floor
    }

    /// Makes at least `need` bytes available at the cursor, refilling from
    /// the source as necessary. Returns `false` once input is exhausted
    /// before `need` bytes.
    fn ensure(&mut self, cur: &mut Cursor, need: usize) -> Result<bool> {
        while self.window.len() < cur.index + need {
            if self.eof || self.replaying() {
                return Ok(false);
            }
            self.refill(cur)?;
        }
        Ok(true)
    }

    fn refill(&mut self, cur: &mut Cursor) -> Result<()> {
        let floor = self.discard_floor(cur);
        debug_assert!(floor >= self.window_start);
        #[allow(clippy::cast_possible_truncation)]
        let drop = (floor - self.window_start) as usize;
        if drop > 0 {
            self.window.drain(..drop);
            self.window_start = floor;
            cur.index -= drop;
            rebase_key(&mut cur.key, drop);
            self.frame.index -= drop;
            rebase_key(&mut self.frame.key, drop);
        }
        let pulled = self
            .source
            .pull(&mut self.window)
            .map_err(|e| Error::new(e.kind, self.abs(self.window.len())))?;
        if pulled == 0 {
            self.eof = true;
        }
        Ok(())
    }

    fn peek(&mut self, cur: &mut Cursor) -> Result<Option<u8>> {
        if !self.ensure(cur, 1)? {
            return Ok(None);
        }
        Ok(Some(self.window[cur.index]))
    }

    // --------------------------------------------------------------------
    // Whitespace and comments
    // --------------------------------------------------------------------

    fn skip_ws(&mut self, cur: &mut Cursor) -> Result<()> {
        loop {
            match self.peek(cur)? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => cur.index += 1,
                Some(b'/') => {
                    if !self.cfg.allow_comments {
                        return Err(self.err_at(cur.index, ErrorKind::CommentsForbidden));
                    }
                    self.skip_comment(cur)?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self, cur: &mut Cursor) -> Result<()> {
        let open_pos = self.abs(cur.index);
        cur.index += 1;
        match self.peek(cur)? {
            Some(b'/') => {
                cur.index += 1;
                loop {
                    match self.peek(cur)? {
                        Some(b'\n') => {
                            cur.index += 1;
                            return Ok(());
                        }
                        Some(_) => cur.index += 1,
                        None => return Ok(()),
                    }
                }
            }
            Some(b'*') => {
                cur.index += 1;
                loop {
                    match self.peek(cur)? {
                        Some(b'*') => {
                            cur.index += 1;
                            if self.peek(cur)? == Some(b'/') {
                                cur.index += 1;
                                return Ok(());
                            }
                        }
                        Some(_) => cur.index += 1,
                        None => {
                            return Err(Error::new(ErrorKind::UnterminatedComment, open_pos));
                        }
                    }
                }
            }
            _ => Err(Error::new(ErrorKind::UnexpectedCharacter('/'), open_pos)),
        }
    }

    // --------------------------------------------------------------------
    // Value spanning
    // --------------------------------------------------------------------

    /// Classifies and spans one value at the cursor. Containers are spanned
    /// recursively; identity-declaring objects encountered while skipping
    /// are captured into `skips` so forward-declared ids stay resolvable.
    ///
    /// Does not commit. The returned range is valid until the next call
    /// that may refill the window.
    pub fn scan_value(&mut self, cur: &mut Cursor, skips: &mut SkipLog) -> Result<RawValue> {
        self.scan_value_at(cur, skips, 0)
    }

    fn scan_value_at(
        &mut self,
        cur: &mut Cursor,
        skips: &mut SkipLog,
        depth: u32,
    ) -> Result<RawValue> {
        self.skip_ws(cur)?;
        let pos = self.abs(cur.index);
        let Some(b) = self.peek(cur)? else {
            return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof));
        };
        let saved_pin = cur.pin;
        cur.pin = Some(saved_pin.map_or(pos, |p| p.min(pos)));
        let kind = match b {
            b'"' => self.scan_string_span(cur)?,
            b'{' | b'[' => self.span_container(cur, skips, depth)?,
            b't' => self.expect_literal(cur, b"true", ValueKind::True)?,
            b'f' => self.expect_literal(cur, b"false", ValueKind::False)?,
            b'n' => self.expect_literal(cur, b"null", ValueKind::Null)?,
            b'-' | b'0'..=b'9' => self.scan_number_span(cur)?,
            b'+' | b'.' if !self.cfg.strict => self.scan_number_span(cur)?,
            _ => {
                return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
            }
        };
        cur.pin = saved_pin;
        #[allow(clippy::cast_possible_truncation)]
        let start = (pos - self.window_start) as usize;
        Ok(RawValue {
            kind,
            start,
            end: cur.index,
            pos,
        })
    }

    fn expect_literal(
        &mut self,
        cur: &mut Cursor,
        lit: &'static [u8],
        kind: ValueKind,
    ) -> Result<ValueKind> {
        if !self.ensure(cur, lit.len())? {
            return Err(self.err_at(self.window.len(), ErrorKind::UnexpectedEof));
        }
        if &self.window[cur.index..cur.index + lit.len()] != lit {
            let b = self.window[cur.index];
            return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
        }
        cur.index += lit.len();
        Ok(kind)
    }

    /// Spans a string, leaving the cursor past the closing quote. Any escape
    /// or byte ≥ 0x80 promotes the classification from [`SimpleString`] to
    /// [`String`]; this affects the decode path, not validity.
    ///
    /// [`SimpleString`]: ValueKind::SimpleString
    /// [`String`]: ValueKind::String
    fn scan_string_span(&mut self, cur: &mut Cursor) -> Result<ValueKind> {
        let open_pos = self.abs(cur.index);
        cur.index += 1;
        let mut simple = true;
        loop {
            let Some(b) = self.peek(cur)? else {
                return Err(Error::new(ErrorKind::UnterminatedString, open_pos));
            };
            match b {
                b'"' => {
                    cur.index += 1;
                    return Ok(if simple {
                        ValueKind::SimpleString
                    } else {
                        ValueKind::String
                    });
                }
                b'\\' => {
                    simple = false;
                    cur.index += 1;
                    if self.peek(cur)?.is_none() {
                        return Err(Error::new(ErrorKind::UnterminatedString, open_pos));
                    }
                    cur.index += 1;
                }
                0x00..=0x1F => {
                    if self.cfg.strict {
                        return Err(
                            self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char))
                        );
                    }
                    simple = false;
                    cur.index += 1;
                }
                0x20..=0x7F => cur.index += 1,
                _ => {
                    simple = false;
                    cur.index += 1;
                }
            }
        }
    }

    /// Spans a number with a hand-rolled state machine. Strict mode rejects
    /// leading zeros before more digits and missing digits around `.`/`e`;
    /// relaxed mode also admits a leading `+` or `.`.
    fn scan_number_span(&mut self, cur: &mut Cursor) -> Result<ValueKind> {
        let strict = self.cfg.strict;
        let start = self.abs(cur.index);
        let malformed = || Error::new(ErrorKind::MalformedNumber, start);
        let mut float = false;

        match self.peek(cur)? {
            Some(b'-') => cur.index += 1,
            Some(b'+') if !strict => cur.index += 1,
            _ => {}
        }

        let mut int_digits = 0usize;
        let mut first_digit = 0u8;
        while let Some(b) = self.peek(cur)? {
            if b.is_ascii_digit() {
                if int_digits == 0 {
                    first_digit = b;
                }
                int_digits += 1;
                cur.index += 1;
            } else {
                break;
            }
        }
        if strict && int_digits > 1 && first_digit == b'0' {
            return Err(malformed());
        }

        if self.peek(cur)? == Some(b'.') {
            float = true;
            cur.index += 1;
            let mut frac_digits = 0usize;
            while let Some(b) = self.peek(cur)? {
                if b.is_ascii_digit() {
                    frac_digits += 1;
                    cur.index += 1;
                } else {
                    break;
                }
            }
            if frac_digits == 0 && (strict || int_digits == 0) {
                return Err(malformed());
            }
        } else if int_digits == 0 {
            return Err(malformed());
        }

        if matches!(self.peek(cur)?, Some(b'e' | b'E')) {
            float = true;
            cur.index += 1;
            if matches!(self.peek(cur)?, Some(b'+' | b'-')) {
                cur.index += 1;
            }
            let mut exp_digits = 0usize;
            while let Some(b) = self.peek(cur)? {
                if b.is_ascii_digit() {
                    exp_digits += 1;
                    cur.index += 1;
                } else {
                    break;
                }
            }
            if exp_digits == 0 && strict {
                return Err(malformed());
            }
        }

        Ok(if float { ValueKind::Float } else { ValueKind::Int })
    }

    /// Spans past a whole container, watching for a direct-child identity
    /// key. A skipped object that declares an id is captured whole so a
    /// later backreference can replay it.
    fn span_container(
        &mut self,
        cur: &mut Cursor,
        skips: &mut SkipLog,
        depth: u32,
    ) -> Result<ValueKind> {
        let total = self.containers.len() as u32 + depth;
        if total >= self.cfg.max_depth {
            return Err(self.err_at(cur.index, ErrorKind::DepthLimitExceeded(self.cfg.max_depth)));
        }
        let is_obj = self.window[cur.index] == b'{';
        let closer = if is_obj { b'}' } else { b']' };
        let start_pos = self.abs(cur.index);
        cur.index += 1;

        let mut declared_id: Option<u64> = None;
        let mut first = true;
        loop {
            self.skip_ws(cur)?;
            match self.peek(cur)? {
                None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
                Some(b) if b == closer => {
                    cur.index += 1;
                    break;
                }
                Some(b @ (b'}' | b']')) => {
                    return Err(self.err_at(cur.index, ErrorKind::MismatchedCloser(b as char)));
                }
                Some(_) => {}
            }
            if !first {
                match self.peek(cur)? {
                    Some(b',') => {
                        cur.index += 1;
                        self.skip_ws(cur)?;
                        if self.peek(cur)? == Some(closer) {
                            if self.cfg.strict {
                                return Err(
                                    self.err_at(cur.index, ErrorKind::UnexpectedCharacter(','))
                                );
                            }
                            cur.index += 1;
                            break;
                        }
                    }
                    Some(b) => {
                        return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
                    }
                    None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
                }
            }
            first = false;

            if is_obj {
                let key = self.scan_key(cur, skips, depth)?;
                self.skip_ws(cur)?;
                match self.peek(cur)? {
                    Some(b':') => cur.index += 1,
                    Some(b) => {
                        return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
                    }
                    None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
                }
                self.skip_ws(cur)?;
                let watch = declared_id.is_none() && self.key_is(key, self.cfg.dialect.id_key());
                let value = self.scan_value_at(cur, skips, depth + 1)?;
                if watch {
                    // A malformed id inside a subtree nobody asked for is
                    // not worth failing the scan over.
                    declared_id = self.parse_id(&value).ok();
                }
            } else {
                self.scan_value_at(cur, skips, depth + 1)?;
            }
        }

        if let Some(id) = declared_id {
            #[allow(clippy::cast_possible_truncation)]
            let start = (start_pos - self.window_start) as usize;
            skips.insert(
                id,
                raw::capture(ValueKind::Object, &self.window[start..cur.index], start_pos),
            );
        }
        Ok(if is_obj {
            ValueKind::Object
        } else {
            ValueKind::List
        })
    }

    /// Reads a property key at the cursor. Non-string keys are spanned and
    /// reported as [`KeyKind::Bare`] placeholders in relaxed mode.
    fn scan_key(&mut self, cur: &mut Cursor, skips: &mut SkipLog, depth: u32) -> Result<KeySpan> {
        match self.peek(cur)? {
            Some(b'"') => {
                let content_pos = self.abs(cur.index) + 1;
                let kind = self.scan_string_span(cur)?;
                #[allow(clippy::cast_possible_truncation)]
                let start = (content_pos - self.window_start) as usize;
                Ok(KeySpan {
                    kind: if kind == ValueKind::SimpleString {
                        KeyKind::Plain
                    } else {
                        KeyKind::Escaped
                    },
                    start,
                    end: cur.index - 1,
                })
            }
            Some(_) => {
                if self.cfg.strict {
                    return Err(self.err_at(cur.index, ErrorKind::NonStringKey));
                }
                let placeholder = cur.index;
                self.scan_value_at(cur, skips, depth + 1)?;
                Ok(KeySpan {
                    kind: KeyKind::Bare,
                    start: placeholder,
                    end: placeholder,
                })
            }
            None => Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
        }
    }

    // --------------------------------------------------------------------
    // Structural operations
    // --------------------------------------------------------------------

    /// Opens the container at the cursor, if there is one.
    ///
    /// On success the opener is consumed, a stack entry is pushed, the first
    /// property key (if an object) is decoded, and the state is committed
    /// with the opener pinned. Returns `Ok(None)` with no side effects when
    /// the cursor is not at `{` or `[`.
    pub fn try_begin_object(
        &mut self,
        cur: &mut Cursor,
        skips: &mut SkipLog,
    ) -> Result<Option<Opened>> {
        self.skip_ws(cur)?;
        let kind = match self.peek(cur)? {
            Some(b'{') => ContainerKind::Object,
            Some(b'[') => ContainerKind::List,
            _ => return Ok(None),
        };
        if self.containers.len() as u32 >= self.cfg.max_depth {
            return Err(self.err_at(cur.index, ErrorKind::DepthLimitExceeded(self.cfg.max_depth)));
        }
        let start_pos = self.abs(cur.index);
        cur.index += 1;
        cur.key = KeySpan::default();
        cur.at_end = false;
        self.containers.push(Container {
            kind,
            id: None,
            skipped: None,
            start_pos,
        });
        let result: Result<()> = (|| {
            self.skip_ws(cur)?;
            match kind {
                ContainerKind::Object => match self.peek(cur)? {
                    Some(b'}') => cur.at_end = true,
                    Some(_) => {
                        cur.key = self.scan_key(cur, skips, 0)?;
                        self.skip_ws(cur)?;
                        match self.peek(cur)? {
                            Some(b':') => cur.index += 1,
                            Some(b) => {
                                return Err(self
                                    .err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
                            }
                            None => {
                                return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof));
                            }
                        }
                        self.skip_ws(cur)?;
                    }
                    None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
                },
                ContainerKind::List | ContainerKind::ListWithId => {
                    if self.peek(cur)? == Some(b']') {
                        cur.at_end = true;
                    }
                }
            }
            Ok(())
        })();
        if let Err(e) = result {
            self.containers.pop();
            return Err(e);
        }
        // Captured only now: refills while scanning the first key rebase the
        // frame in place, so an entry-time copy would go stale.
        let prev = self.frame;
        self.commit_pinned(cur, start_pos);
        Ok(Some(Opened { prev, kind }))
    }

    /// Exactly reverses a [`Self::try_begin_object`], provided nothing has
    /// committed since the open.
    pub fn undo_begin_object(&mut self, cur: &mut Cursor, opened: Opened) {
        let popped = self.containers.pop();
        debug_assert!(popped.is_some(), "undo with no open container");
        self.frame = opened.prev;
        *cur = self.cursor();
    }

    /// Collapses the `{id, values: [...]}` wrapper: consumes the inner `[`
    /// and reclassifies the current stack entry in place, so one logical
    /// list occupies one stack slot.
    pub fn try_open_list_values(&mut self, cur: &mut Cursor) -> Result<()> {
        self.skip_ws(cur)?;
        match self.peek(cur)? {
            Some(b'[') => {}
            Some(b) => {
                return Err(self.err_at(
                    cur.index,
                    ErrorKind::TypeMismatch {
                        expected: "list",
                        found: classify_byte(b),
                    },
                ));
            }
            None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
        }
        cur.index += 1;
        cur.key = KeySpan::default();
        cur.at_end = false;
        let top = self
            .containers
            .last_mut()
            .expect("list-values wrapper with no open container");
        top.kind = ContainerKind::ListWithId;
        self.skip_ws(cur)?;
        if self.peek(cur)? == Some(b']') {
            cur.at_end = true;
        }
        self.commit(cur);
        Ok(())
    }

    /// Advances past the separator after a consumed value: either decodes
    /// the next property key (objects), positions at the next item (lists),
    /// or detects the container end. Commits.
    pub fn begin_next(&mut self, cur: &mut Cursor, skips: &mut SkipLog) -> Result<()> {
        let Some(top) = self.containers.last() else {
            cur.at_end = true;
            cur.key = KeySpan::default();
            self.commit(cur);
            return Ok(());
        };
        let is_obj = top.kind == ContainerKind::Object;
        let closer = if is_obj { b'}' } else { b']' };
        self.skip_ws(cur)?;
        match self.peek(cur)? {
            Some(b) if b == closer => {
                cur.at_end = true;
                cur.key = KeySpan::default();
            }
            Some(b',') => {
                cur.index += 1;
                self.skip_ws(cur)?;
                if self.peek(cur)? == Some(closer) {
                    if self.cfg.strict {
                        return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(',')));
                    }
                    cur.at_end = true;
                    cur.key = KeySpan::default();
                } else if is_obj {
                    self.begin_prop(cur, skips)?;
                } else {
                    cur.key = KeySpan::default();
                }
            }
            Some(b @ (b'}' | b']')) => {
                return Err(self.err_at(cur.index, ErrorKind::MismatchedCloser(b as char)));
            }
            Some(b) => {
                return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
            }
            None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
        }
        self.commit(cur);
        Ok(())
    }

    /// Decodes the next property key and the `:` after it, leaving the
    /// cursor at the value. Does not commit.
    pub fn begin_prop(&mut self, cur: &mut Cursor, skips: &mut SkipLog) -> Result<()> {
        cur.key = self.scan_key(cur, skips, 0)?;
        self.skip_ws(cur)?;
        match self.peek(cur)? {
            Some(b':') => cur.index += 1,
            Some(b) => {
                return Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char)));
            }
            None => return Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
        }
        self.skip_ws(cur)?;
        Ok(())
    }

    /// Skips any unconsumed entries, consumes the closer (both of them for
    /// [`ContainerKind::ListWithId`]), pops the stack, and advances to the
    /// next sibling — or, at the root, applies the verify-EOF policy.
    ///
    /// When the replayed region ends exactly at the closed value, neither
    /// advancing nor the EOF check applies; the caller pops the replay.
    pub fn end_object_and_commit(&mut self, cur: &mut Cursor, skips: &mut SkipLog) -> Result<()> {
        while !cur.at_end {
            self.scan_value_at(cur, skips, 0)?;
            self.begin_next(cur, skips)?;
        }
        let kind = self
            .containers
            .last()
            .expect("end_object with no open container")
            .kind;
        match kind {
            ContainerKind::Object => self.expect_closer(cur, b'}')?,
            ContainerKind::List => self.expect_closer(cur, b']')?,
            ContainerKind::ListWithId => {
                self.expect_closer(cur, b']')?;
                self.skip_ws(cur)?;
                if !self.cfg.strict && self.peek(cur)? == Some(b',') {
                    cur.index += 1;
                }
                self.expect_closer(cur, b'}')?;
            }
        }
        self.containers.pop();

        if self.at_replay_end(cur) {
            cur.at_end = true;
            cur.key = KeySpan::default();
            self.commit(cur);
            return Ok(());
        }
        if self.containers.is_empty() {
            cur.at_end = true;
            cur.key = KeySpan::default();
            self.commit(cur);
            if self.cfg.verify_eof && !self.replaying() {
                let mut probe = self.cursor();
                self.skip_ws(&mut probe)?;
                if self.peek(&mut probe)?.is_some() {
                    return Err(self.err_at(probe.index, ErrorKind::TrailingData));
                }
            }
            return Ok(());
        }
        self.begin_next(cur, skips)
    }

    fn expect_closer(&mut self, cur: &mut Cursor, expected: u8) -> Result<()> {
        self.skip_ws(cur)?;
        match self.peek(cur)? {
            Some(b) if b == expected => {
                cur.index += 1;
                Ok(())
            }
            Some(b @ (b'}' | b']')) => {
                Err(self.err_at(cur.index, ErrorKind::MismatchedCloser(b as char)))
            }
            Some(b) => Err(self.err_at(cur.index, ErrorKind::UnexpectedCharacter(b as char))),
            None => Err(self.err_at(cur.index, ErrorKind::UnexpectedEof)),
        }
    }

    // --------------------------------------------------------------------
    // Replay
    // --------------------------------------------------------------------

    /// Redirects scanning into a previously captured byte range. The current
    /// frame, window included, is pushed; [`Self::end_replay`] restores it.
    pub fn begin_replay(&mut self, cur: &mut Cursor, captured: &CapturedValue) {
        self.replays.push(SavedFrame {
            frame: self.frame,
            window: mem::take(&mut self.window),
            window_start: self.window_start,
            eof: self.eof,
        });
        self.window = captured.bytes.to_vec();
        self.window_start = captured.pos;
        self.eof = true;
        self.frame = Frame::start();
        *cur = self.cursor();
    }

    /// Pops the innermost replay frame and resumes the original position.
    pub fn end_replay(&mut self, cur: &mut Cursor) {
        let saved = self.replays.pop().expect("end_replay without begin_replay");
        self.window = saved.window;
        self.window_start = saved.window_start;
        self.eof = saved.eof;
        self.frame = saved.frame;
        *cur = self.cursor();
    }

    // --------------------------------------------------------------------
    // Container stack access
    // --------------------------------------------------------------------

    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    pub fn top(&self) -> Option<&Container> {
        self.containers.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Container> {
        self.containers.last_mut()
    }

    /// The skipped-properties cache of the innermost container, allocating
    /// it on first use.
    pub fn skipped_props_mut(&mut self) -> &mut SkippedProps {
        self.containers
            .last_mut()
            .expect("skipped-props access with no open container")
            .skipped
            .get_or_insert_with(SkippedProps::new)
    }

    // --------------------------------------------------------------------
    // Raw access and decoding helpers
    // --------------------------------------------------------------------

    pub fn raw_bytes(&self, raw: &RawValue) -> &[u8] {
        &self.window[raw.start..raw.end]
    }

    /// Copies a spanned value out of the window into a durable capture.
    pub fn capture(&self, raw: &RawValue) -> CapturedValue {
        raw::capture(raw.kind, self.raw_bytes(raw), raw.pos)
    }

    pub fn key_bytes(&self, key: KeySpan) -> &[u8] {
        &self.window[key.start..key.end]
    }

    /// Whether the given key equals `name`, applying the escape-aware
    /// comparison when needed. Bare placeholders never match.
    pub fn key_is(&self, key: KeySpan, name: &str) -> bool {
        match key.kind {
            KeyKind::Plain => string::key_equals(self.key_bytes(key), false, name),
            KeyKind::Escaped => string::key_equals(self.key_bytes(key), true, name),
            KeyKind::None | KeyKind::Bare => false,
        }
    }

    /// Decoded text of the given key, for cache insertion. `None` for bare
    /// placeholders and boundary states.
    pub fn key_text(&self, key: KeySpan) -> Option<Box<str>> {
        match key.kind {
            KeyKind::Plain => core::str::from_utf8(self.key_bytes(key))
                .ok()
                .map(Box::from),
            KeyKind::Escaped => string::decode(self.key_bytes(key), false).ok().map(String::into_boxed_str),
            KeyKind::None | KeyKind::Bare => None,
        }
    }

    /// Parses an identity id from a spanned value: a bare non-negative
    /// integer, or the same wrapped in a string.
    pub fn parse_id(&self, raw: &RawValue) -> Result<u64> {
        raw::parse_id(raw.kind, self.raw_bytes(raw))
            .ok_or_else(|| Error::new(ErrorKind::MalformedIdentity, raw.pos))
    }
}

fn rebase_key(key: &mut KeySpan, drop: usize) {
    if key.kind != KeyKind::None {
        key.start -= drop;
        key.end -= drop;
    }
}

/// Rough classification of a value by its first byte, for error messages.
pub(crate) fn classify_byte(b: u8) -> &'static str {
    match b {
        b'{' => "object",
        b'[' => "list",
        b'"' => "string",
        b't' | b'f' => "boolean",
        b'n' => "null",
        b'-' | b'+' | b'.' | b'0'..=b'9' => "number",
        _ => "value",
    }
}
