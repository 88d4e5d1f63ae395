use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use jsonsync::{
    DedupMode, Entered, FieldIo, ReadOptions, Result, SyncObject, WriteOptions, read_slice,
    sync_vec, write_vec,
};

#[derive(Debug, Default, Clone)]
struct Record {
    id: i64,
    name: String,
    score: f64,
    tags: Vec<i64>,
}

impl Record {
    fn sync_fields(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.id = io.sync_i64("id", self.id)?;
        self.name = io.sync_string("name", std::mem::take(&mut self.name))?;
        self.score = io.sync_f64("score", self.score)?;
        sync_vec(io, "tags", &mut self.tags)
    }
}

#[derive(Debug, Default, Clone)]
struct Batch {
    records: Vec<Record>,
}

impl SyncObject for Batch {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        if let Entered::Open = io.begin_list("records", DedupMode::Off)? {
            if io.is_reading() {
                self.records.clear();
                while io.list_has_more()? {
                    if let Entered::Open = io.begin_record("", DedupMode::Off)? {
                        let mut record = Record::default();
                        record.sync_fields(io)?;
                        io.end_record()?;
                        self.records.push(record);
                    }
                }
            } else {
                for record in &mut self.records {
                    if let Entered::Open = io.begin_record("", DedupMode::Off)? {
                        record.sync_fields(io)?;
                        io.end_record()?;
                    }
                }
            }
            io.end_list()?;
        }
        Ok(())
    }
}

fn batch(n: usize) -> Batch {
    Batch {
        records: (0..n)
            .map(|i| Record {
                id: i as i64,
                name: format!("record-{i}"),
                score: i as f64 * 0.5,
                tags: vec![i as i64, i as i64 + 1, i as i64 + 2],
            })
            .collect(),
    }
}

fn bench_codec(c: &mut Criterion) {
    let mut value = batch(1_000);
    let minified = write_vec(
        &mut value,
        WriteOptions {
            minify: true,
            ..WriteOptions::default()
        },
    )
    .unwrap();

    c.bench_function("write_1k_records", |b| {
        b.iter(|| {
            let bytes = write_vec(
                black_box(&mut value),
                WriteOptions {
                    minify: true,
                    ..WriteOptions::default()
                },
            )
            .unwrap();
            black_box(bytes)
        });
    });

    c.bench_function("read_1k_records", |b| {
        b.iter(|| {
            let back: Batch = read_slice(black_box(&minified), ReadOptions::default()).unwrap();
            black_box(back)
        });
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
