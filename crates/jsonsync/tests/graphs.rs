//! Whole-document object-graph scenarios through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use jsonsync::{
    DedupMode, Dialect, Entered, FieldIo, ObjKey, ReadOptions, Result, ScanSource, SyncObject,
    WriteOptions, camel_case, read_from, read_slice, write_vec,
};

/// Feeds at most `chunk` bytes per pull.
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

#[derive(Debug, Default)]
struct Node {
    label: String,
    next: Option<Rc<RefCell<Node>>>,
    other: Option<Rc<RefCell<Node>>>,
}

impl Node {
    fn sync_fields(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.label = io.sync_string("label", std::mem::take(&mut self.label))?;
        sync_link(io, "next", &mut self.next)?;
        sync_link(io, "other", &mut self.other)
    }
}

fn sync_link(
    io: &mut dyn FieldIo,
    name: &str,
    slot: &mut Option<Rc<RefCell<Node>>>,
) -> Result<()> {
    if io.is_reading() {
        match io.begin_record(name, DedupMode::Tracked)? {
            Entered::Open => {
                let rc = Rc::new(RefCell::new(Node::default()));
                io.bind_instance(rc.clone())?;
                rc.borrow_mut().sync_fields(io)?;
                io.end_record()?;
                *slot = Some(rc);
            }
            Entered::Existing(instance) => {
                *slot = Some(
                    instance
                        .expect("reader returns instances")
                        .downcast::<RefCell<Node>>()
                        .ok()
                        .expect("nodes were bound"),
                );
            }
            Entered::Absent => *slot = None,
        }
    } else if let Some(rc) = slot.clone() {
        if let Entered::Open = io.begin_record(name, DedupMode::Key(ObjKey::of(&rc)))? {
            rc.borrow_mut().sync_fields(io)?;
            io.end_record()?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Graph {
    root: Option<Rc<RefCell<Node>>>,
}

impl SyncObject for Graph {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        sync_link(io, "root", &mut self.root)
    }
}

fn node(label: &str) -> Rc<RefCell<Node>> {
    Rc::new(RefCell::new(Node {
        label: label.to_owned(),
        next: None,
        other: None,
    }))
}

#[test]
fn diamond_sharing_preserves_identity() {
    // Two parents pointing at one shared child.
    let shared = node("shared");
    let root = node("root");
    root.borrow_mut().next = Some(shared.clone());
    root.borrow_mut().other = Some(shared);

    let mut graph = Graph { root: Some(root) };
    let bytes = write_vec(&mut graph, WriteOptions::default()).unwrap();
    let back: Graph = read_slice(&bytes, ReadOptions::default()).unwrap();

    let root = back.root.expect("root decoded");
    let next = root.borrow().next.clone().expect("next decoded");
    let other = root.borrow().other.clone().expect("other decoded");
    assert!(Rc::ptr_eq(&next, &other));
    assert_eq!(next.borrow().label, "shared");
}

#[test]
fn cycles_survive_streaming_windows() {
    let a = node("a");
    let b = node("b");
    a.borrow_mut().next = Some(b.clone());
    b.borrow_mut().next = Some(a.clone());
    let mut graph = Graph { root: Some(a) };

    let bytes = write_vec(&mut graph, WriteOptions::default()).unwrap();
    for chunk in 1..9 {
        let source = Trickle {
            rest: &bytes,
            chunk,
        };
        let back: Graph = read_from(source, ReadOptions::default()).unwrap();
        let a = back.root.expect("root decoded");
        let b = a.borrow().next.clone().expect("a links b");
        let a_again = b.borrow().next.clone().expect("b links a");
        assert!(Rc::ptr_eq(&a, &a_again));
        assert_eq!(b.borrow().label, "b");
    }
}

#[derive(Debug, Default, PartialEq)]
struct Settings {
    port: u16,
    host_name: String,
    verbose: bool,
}

impl SyncObject for Settings {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        // Requested in a different order than written.
        self.verbose = io.sync_bool("Verbose", self.verbose)?;
        self.port = io.sync_u16("Port", self.port)?;
        self.host_name = io.sync_string("HostName", std::mem::take(&mut self.host_name))?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct SettingsWritten {
    port: u16,
    host_name: String,
    verbose: bool,
}

impl SyncObject for SettingsWritten {
    fn sync(&mut self, io: &mut dyn FieldIo) -> Result<()> {
        self.port = io.sync_u16("Port", self.port)?;
        self.host_name = io.sync_string("HostName", std::mem::take(&mut self.host_name))?;
        self.verbose = io.sync_bool("Verbose", self.verbose)?;
        Ok(())
    }
}

#[test]
fn converted_names_round_trip_out_of_order() {
    let options_w = WriteOptions {
        dialect: Dialect::Newtonsoft,
        name_converter: Some(camel_case),
        ..WriteOptions::default()
    };
    let options_r = ReadOptions {
        dialect: Dialect::Newtonsoft,
        name_converter: Some(camel_case),
        ..ReadOptions::default()
    };
    let mut value = SettingsWritten {
        port: 8080,
        host_name: "example".to_owned(),
        verbose: true,
    };
    let bytes = write_vec(&mut value, options_w).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains("\"hostName\""), "got: {text}");

    for chunk in 1..6 {
        let source = Trickle {
            rest: &bytes,
            chunk,
        };
        let back: Settings = read_from(source, options_r).unwrap();
        assert_eq!(back.port, 8080);
        assert_eq!(back.host_name, "example");
        assert!(back.verbose);
    }
}

#[test]
fn one_reader_one_document() {
    // A reader is single-shot: after the document is consumed, a second
    // pass does not exist. Fresh state comes from a fresh reader.
    let doc = br#"{"root": null}"#;
    let first: Graph = read_slice(doc, ReadOptions::default()).unwrap();
    assert!(first.root.is_none());
    let second: Graph = read_slice(doc, ReadOptions::default()).unwrap();
    assert!(second.root.is_none());
}
