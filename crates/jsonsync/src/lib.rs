//! A streaming, field-oriented JSON codec for object graphs.
//!
//! `jsonsync` reads and writes application objects directly to and from
//! UTF-8 bytes in a single pass — no DOM, no intermediate tree. Application
//! types describe themselves once, with a `sync` function that is executed
//! symmetrically for reading and writing. Fields may be requested in a
//! different order than they appear in the stream, and object graphs with
//! shared or cyclic references round-trip through an identity/backreference
//! protocol.
//!
//! Two wire dialects are supported: a Json.NET-compatible one
//! (`$id`/`$ref`/`$values`, Base64 byte arrays) and a compact one
//! (one-character control keys, string-packed byte arrays).
//!
//! # Examples
//!
//! ```
//! use jsonsync::{FieldIo, ReadOptions, Result, SyncObject, WriteOptions};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl SyncObject for Point {
//!     fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
//!         self.x = io.sync_i32("x", self.x)?;
//!         self.y = io.sync_i32("y", self.y)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut point = Point { x: 3, y: -1 };
//! let options = WriteOptions {
//!     minify: true,
//!     ..WriteOptions::default()
//! };
//! let bytes = jsonsync::write_vec(&mut point, options)?;
//! assert_eq!(bytes, br#"{"x":3,"y":-1}"#);
//!
//! let back: Point = jsonsync::read_slice(&bytes, ReadOptions::default())?;
//! assert_eq!(back, point);
//! # Ok::<(), jsonsync::Error>(())
//! ```
//!
//! A reader or writer processes exactly one document and is not safe for
//! concurrent use; all state is instance-local.

#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod bytes;
mod dialect;
mod error;
mod options;
mod reader;
mod scanner;
mod source;
mod sync;
mod writer;

#[cfg(test)]
mod tests;

pub use dialect::Dialect;
pub use error::{Error, ErrorKind, Result};
pub use options::{
    ByteArrayMode, CoercePrimitive, NameConverter, ReadOptions, RootKind, WriteOptions,
};
pub use reader::{Reader, read_from, read_slice};
pub use scanner::ValueKind;
#[cfg(feature = "std")]
pub use source::ReadSource;
pub use source::{ScanSource, SliceSource};
pub use sync::{
    DedupMode, Entered, FieldIo, Instance, ObjKey, SyncItem, SyncObject, camel_case, sync_vec,
};
pub use writer::{Writer, write_vec};
