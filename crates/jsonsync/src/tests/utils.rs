//! Shared fixtures for the engine tests.

use alloc::{string::String, vec::Vec};
use core::mem;

use crate::{
    FieldIo, ReadOptions, Result, ScanSource, SyncObject, read_from, read_slice, write_vec,
    WriteOptions,
};

/// Source that hands out at most `chunk` bytes per pull, forcing window
/// refills mid-token.
pub struct ChunkSource<'a> {
    rest: &'a [u8],
    chunk: usize,
}

impl<'a> ChunkSource<'a> {
    pub fn new(bytes: &'a [u8], chunk: usize) -> Self {
        assert!(chunk > 0, "chunk size must be non-zero");
        Self { rest: bytes, chunk }
    }
}

impl ScanSource for ChunkSource<'_> {
    fn pull(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let n = self.rest.len().min(self.chunk);
        let (head, tail) = self.rest.split_at(n);
        buf.extend_from_slice(head);
        self.rest = tail;
        Ok(n)
    }
}

/// Reads `bytes` through a 1-to-n-byte chunked source.
pub fn read_chunked<T: SyncObject + Default>(
    bytes: &[u8],
    chunk: usize,
    options: ReadOptions,
) -> Result<T> {
    read_from(ChunkSource::new(bytes, chunk), options)
}

/// Round-trips `value` through bytes and back under the given options.
pub fn round_trip<T: SyncObject + Default>(
    value: &mut T,
    write: WriteOptions,
    read: ReadOptions,
) -> Result<T> {
    let bytes = write_vec(value, write)?;
    read_slice(&bytes, read)
}

/// One field of every primitive shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitives {
    pub flag: bool,
    pub tiny: i8,
    pub small: u16,
    pub count: i32,
    pub big: i64,
    pub huge: u64,
    pub ratio: f64,
    pub name: String,
    pub blob: Vec<u8>,
}

impl SyncObject for Primitives {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.flag = io.sync_bool("flag", self.flag)?;
        self.tiny = io.sync_i8("tiny", self.tiny)?;
        self.small = io.sync_u16("small", self.small)?;
        self.count = io.sync_i32("count", self.count)?;
        self.big = io.sync_i64("big", self.big)?;
        self.huge = io.sync_u64("huge", self.huge)?;
        self.ratio = io.sync_f64("ratio", self.ratio)?;
        self.name = io.sync_string("name", mem::take(&mut self.name))?;
        self.blob = io.sync_bytes("blob", mem::take(&mut self.blob))?;
        Ok(())
    }
}

impl Primitives {
    pub fn sample() -> Self {
        Self {
            flag: true,
            tiny: -7,
            small: 40_000,
            count: -123_456,
            big: i64::MIN,
            huge: u64::MAX,
            ratio: 2.5,
            name: String::from("héllo \"world\"\n"),
            blob: alloc::vec![0, 1, 0x7F, 0x80, 0xFF],
        }
    }
}

/// Two integer fields, for ordering tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pair {
    pub a: i32,
    pub b: i32,
}

impl SyncObject for Pair {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.a = io.sync_i32("a", self.a)?;
        self.b = io.sync_i32("b", self.b)?;
        Ok(())
    }
}

/// `Pair` with the fields requested in the opposite order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairReversed {
    pub a: i32,
    pub b: i32,
}

impl SyncObject for PairReversed {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.b = io.sync_i32("b", self.b)?;
        self.a = io.sync_i32("a", self.a)?;
        Ok(())
    }
}
