//! Pull sources feeding the scanner's buffer window.
//!
//! The scanner owns the window and its compaction policy; a source is only
//! asked to append more bytes when the window runs short. Bytes a source has
//! handed over are never requested again — replaying a previously seen range
//! is handled by the scanner from its own captured copies.

use alloc::vec::Vec;

use crate::error::Result;

/// An abstract pull source of document bytes.
pub trait ScanSource {
    /// Appends more input to `buf`, returning how many bytes were added.
    ///
    /// Returns `Ok(0)` exactly once the input is exhausted; the scanner
    /// treats the window end as end-of-document from then on.
    fn pull(&mut self, buf: &mut Vec<u8>) -> Result<usize>;
}

/// Source over a complete in-memory document.
#[derive(Debug)]
pub struct SliceSource<'a> {
    rest: &'a [u8],
}

impl<'a> SliceSource<'a> {
    /// Creates a source that hands over `bytes` in a single pull.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }
}

impl ScanSource for SliceSource<'_> {
    fn pull(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let n = self.rest.len();
        buf.extend_from_slice(self.rest);
        self.rest = &[];
        Ok(n)
    }
}

#[cfg(feature = "std")]
pub use self::io::ReadSource;

#[cfg(feature = "std")]
mod io {
    extern crate std;

    use alloc::{string::ToString, vec::Vec};
    use std::io::Read;

    use super::ScanSource;
    use crate::error::{Error, ErrorKind, Result};

    /// Source pulling fixed-size chunks from a [`std::io::Read`].
    #[derive(Debug)]
    pub struct ReadSource<R> {
        inner: R,
        chunk: usize,
    }

    impl<R: Read> ReadSource<R> {
        /// Default chunk size per pull.
        pub const DEFAULT_CHUNK: usize = 64 * 1024;

        /// Wraps `inner`, pulling [`Self::DEFAULT_CHUNK`] bytes at a time.
        pub fn new(inner: R) -> Self {
            Self::with_chunk_size(inner, Self::DEFAULT_CHUNK)
        }

        /// Wraps `inner` with an explicit chunk size.
        ///
        /// # Panics
        ///
        /// Panics if `chunk` is zero.
        pub fn with_chunk_size(inner: R, chunk: usize) -> Self {
            assert!(chunk > 0, "chunk size must be non-zero");
            Self { inner, chunk }
        }
    }

    impl<R: Read> ScanSource for ReadSource<R> {
        fn pull(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
            let start = buf.len();
            buf.resize(start + self.chunk, 0);
            loop {
                match self.inner.read(&mut buf[start..]) {
                    Ok(n) => {
                        buf.truncate(start + n);
                        return Ok(n);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        buf.truncate(start);
                        return Err(Error::new(ErrorKind::Io(e.to_string()), 0));
                    }
                }
            }
        }
    }
}
