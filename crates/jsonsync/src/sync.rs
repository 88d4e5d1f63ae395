//! The generic field-sync contract.
//!
//! Application types implement [`SyncObject`] with a single `sync` function
//! that is executed symmetrically for reading and writing: each `sync_*`
//! call reads the named field into the passed value, or writes the passed
//! value under that name, depending on which engine is behind the
//! [`FieldIo`].

use alloc::{rc::Rc, string::String, vec::Vec};
use core::any::Any;

use crate::{error::Result, scanner::ValueKind};

/// A constructed application object tracked by identity.
///
/// Downcast with [`Rc::downcast`] after receiving one from
/// [`Entered::Existing`].
pub type Instance = Rc<dyn Any>;

/// Identity of an application object, for deduplication on write.
///
/// Two keys are equal exactly when they were taken from the same `Rc`
/// allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjKey(usize);

impl ObjKey {
    /// The identity of an `Rc`-held object.
    #[must_use]
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

/// Deduplication behavior for one sub-object or list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Always write the full body; never resolve to a shared instance.
    Off,
    /// Dedup-eligible without a write-side identity. On read this enables
    /// full identity resolution (the document decides what the field is);
    /// on write it behaves like [`Off`], since there is no key to track.
    ///
    /// [`Off`]: DedupMode::Off
    Tracked,
    /// Track the object under this key: the first write emits the full body
    /// prefixed with an identity declaration, later writes emit a
    /// backreference. On read, equivalent to [`Tracked`] (the key is
    /// meaningless for a document being decoded).
    ///
    /// [`Tracked`]: DedupMode::Tracked
    Key(ObjKey),
}

/// Outcome of opening a sub-object or list field.
#[derive(Debug, Clone)]
pub enum Entered {
    /// A body is open. Sync its fields, then call the matching
    /// `end_record`/`end_list`.
    Open,
    /// The value resolved to an already-known object: a backreference or a
    /// repeated identity on read, an already-written reference on write.
    /// Nothing is open — do not sync fields and do not call the matching
    /// end. The instance is `Some` when reading, `None` when writing.
    Existing(Option<Instance>),
    /// The field was null or missing; nothing is open.
    Absent,
}

/// The capability object handed to [`SyncObject::sync`].
///
/// One operation per primitive type, used symmetrically: on read the passed
/// value is ignored and the decoded value returned, on write the passed
/// value is emitted and returned unchanged. Fields may be requested in any
/// order; out-of-order reads are served from the engine's skip cache.
pub trait FieldIo {
    /// `true` when this capability decodes a document rather than building
    /// one.
    fn is_reading(&self) -> bool;

    fn sync_bool(&mut self, name: &str, value: bool) -> Result<bool>;
    fn sync_i8(&mut self, name: &str, value: i8) -> Result<i8>;
    fn sync_u8(&mut self, name: &str, value: u8) -> Result<u8>;
    fn sync_i16(&mut self, name: &str, value: i16) -> Result<i16>;
    fn sync_u16(&mut self, name: &str, value: u16) -> Result<u16>;
    fn sync_i32(&mut self, name: &str, value: i32) -> Result<i32>;
    fn sync_u32(&mut self, name: &str, value: u32) -> Result<u32>;
    fn sync_i64(&mut self, name: &str, value: i64) -> Result<i64>;
    fn sync_u64(&mut self, name: &str, value: u64) -> Result<u64>;
    fn sync_f32(&mut self, name: &str, value: f32) -> Result<f32>;
    fn sync_f64(&mut self, name: &str, value: f64) -> Result<f64>;
    fn sync_string(&mut self, name: &str, value: String) -> Result<String>;

    /// Byte arrays travel as Base64, a number list, or BAIS, per the
    /// configured mode; the representation is auto-detected on read.
    fn sync_bytes(&mut self, name: &str, value: Vec<u8>) -> Result<Vec<u8>>;

    /// Reads or writes the dialect's type-tag field. The tag name is fixed
    /// by the dialect and exempt from name conversion.
    fn sync_type_tag(&mut self, value: String) -> Result<String>;

    /// Opens the sub-object stored under `name`.
    fn begin_record(&mut self, name: &str, dedup: DedupMode) -> Result<Entered>;

    /// Closes the sub-object opened by the last [`Self::begin_record`] that
    /// returned [`Entered::Open`]. Unread fields are skipped.
    fn end_record(&mut self) -> Result<()>;

    /// Opens the list stored under `name`. With deduplication, the list
    /// travels wrapped in an identity-carrying object; the wrapper is
    /// handled here and invisible to the caller.
    fn begin_list(&mut self, name: &str, dedup: DedupMode) -> Result<Entered>;

    /// Closes the list opened by the last [`Self::begin_list`] that
    /// returned [`Entered::Open`].
    fn end_list(&mut self) -> Result<()>;

    /// Whether another list item is available. Always `false` when writing;
    /// drive the loop from the collection instead.
    fn list_has_more(&mut self) -> Result<bool>;

    /// Binds `instance` as the object for the identity declared by the
    /// currently open record. Must be called before populating fields so
    /// that cycles through this object resolve to it. No-op when the record
    /// declared no identity, and on write.
    fn bind_instance(&mut self, instance: Instance) -> Result<()>;

    /// The kind of the value stored under `name`, without consuming it.
    /// [`ValueKind::Missing`] when absent, and always when writing.
    fn field_kind(&mut self, name: &str) -> Result<ValueKind>;

    /// Whether `name` is present in the current object.
    fn has_field(&mut self, name: &str) -> Result<bool> {
        Ok(!matches!(self.field_kind(name)?, ValueKind::Missing))
    }
}

/// An application type that can be carried through a document.
pub trait SyncObject {
    /// Syncs every field of `self` through `io`, in any order.
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()>;
}

/// One element type a list can carry, synced under the empty name.
pub trait SyncItem: Sized {
    fn sync_item(io: &mut dyn FieldIo, value: Self) -> Result<Self>;
}

macro_rules! impl_sync_item {
    ($($t:ty => $m:ident),* $(,)?) => {
        $(
            impl SyncItem for $t {
                fn sync_item(io: &mut dyn FieldIo, value: Self) -> Result<Self> {
                    io.$m("", value)
                }
            }
        )*
    };
}

impl_sync_item! {
    bool => sync_bool,
    i8 => sync_i8,
    u8 => sync_u8,
    i16 => sync_i16,
    u16 => sync_u16,
    i32 => sync_i32,
    u32 => sync_u32,
    i64 => sync_i64,
    u64 => sync_u64,
    f32 => sync_f32,
    f64 => sync_f64,
    String => sync_string,
}

/// Syncs a whole `Vec` field: reads replace the vector's contents, writes
/// emit every element. The list-building side of the container adaptation
/// contract, specialized to `Vec`.
pub fn sync_vec<T: SyncItem + Default + Clone>(
    io: &mut dyn FieldIo,
    name: &str,
    vec: &mut Vec<T>,
) -> Result<()> {
    match io.begin_list(name, DedupMode::Off)? {
        Entered::Open => {}
        Entered::Existing(_) | Entered::Absent => {
            if io.is_reading() {
                vec.clear();
            }
            return Ok(());
        }
    }
    if io.is_reading() {
        vec.clear();
        while io.list_has_more()? {
            vec.push(T::sync_item(io, T::default())?);
        }
    } else {
        for item in &*vec {
            T::sync_item(io, item.clone())?;
        }
    }
    io.end_list()
}

/// Name converter lowercasing the leading ASCII letter: `Name` → `name`.
pub fn camel_case(name: &str, out: &mut String) {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {
            out.push(c.to_ascii_lowercase());
            out.push_str(chars.as_str());
        }
        Some(c) => {
            out.push(c);
            out.push_str(chars.as_str());
        }
        None => {}
    }
}
