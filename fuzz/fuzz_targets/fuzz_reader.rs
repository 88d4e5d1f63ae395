#![no_main]

use jsonsync::{
    DedupMode, Dialect, Entered, FieldIo, ReadOptions, Result, RootKind, ScanSource, SyncObject,
    read_from,
};
use libfuzzer_sys::fuzz_target;

const HEADER: usize = 2; // 1 flag byte + 1 chunk-size byte

/// Feeds the document a few bytes at a time so window refills and index
/// rebasing run constantly.
struct Trickle<'a> {
    rest: &'a [u8],
    chunk: usize,
}

impl ScanSource for Trickle<'_> {
    fn pull(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let n = self.rest.len().min(self.chunk);
        let (head, tail) = self.rest.split_at(n);
        buf.extend_from_slice(head);
        self.rest = tail;
        Ok(n)
    }
}

/// Requests a fixed spread of field names and shapes; any of them may be
/// missing, mistyped, or reference-valued in the fuzzed document. Errors
/// are expected — panics and hangs are what the fuzzer hunts.
#[derive(Debug, Default)]
struct Probe {
    depth: u8,
}

impl Probe {
    fn sync_fields(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        let _ = io.sync_i64("a", 0);
        let _ = io.sync_string("b", String::new());
        let _ = io.sync_bool("c", false);
        let _ = io.sync_f64("d", 0.0);
        let _ = io.sync_bytes("e", Vec::new());
        let _ = io.field_kind("f");
        if self.depth < 4 {
            if let Ok(Entered::Open) = io.begin_record("g", DedupMode::Tracked) {
                let mut inner = Probe {
                    depth: self.depth + 1,
                };
                let _ = inner.sync_fields(io);
                let _ = io.end_record();
            }
            if let Ok(Entered::Open) = io.begin_list("h", DedupMode::Off) {
                while matches!(io.list_has_more(), Ok(true)) {
                    if io.sync_i64("", 0).is_err() {
                        break;
                    }
                }
                let _ = io.end_list();
            }
        }
        Ok(())
    }
}

impl SyncObject for Probe {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.sync_fields(io)
    }
}

fn run(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let chunk = usize::from(data[1]).max(1);
    let doc = &data[HEADER..];

    let options = ReadOptions {
        dialect: if flags & 1 != 0 {
            Dialect::Newtonsoft
        } else {
            Dialect::Compact
        },
        strict: flags & 2 != 0,
        allow_comments: flags & 4 != 0,
        verify_eof: flags & 8 != 0,
        allow_missing_fields: flags & 16 == 0,
        null_as_default: flags & 32 == 0,
        root: if flags & 64 != 0 {
            RootKind::List
        } else {
            RootKind::Object
        },
        max_depth: 24,
        ..ReadOptions::default()
    };

    let source = Trickle { rest: doc, chunk };
    let _ = read_from::<_, Probe>(source, options);
}

fuzz_target!(|data: &[u8]| run(data));
