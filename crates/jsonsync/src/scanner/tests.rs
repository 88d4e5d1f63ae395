use super::*;
use crate::{dialect::Dialect, error::ErrorKind, source::SliceSource, tests::utils::ChunkSource};

fn cfg() -> ScanConfig {
    ScanConfig {
        strict: false,
        allow_comments: false,
        max_depth: 64,
        verify_eof: true,
        dialect: Dialect::Compact,
    }
}

fn strict_cfg() -> ScanConfig {
    ScanConfig {
        strict: true,
        ..cfg()
    }
}

fn scanner(bytes: &[u8]) -> Scanner<SliceSource<'_>> {
    Scanner::new(SliceSource::new(bytes), cfg())
}

fn scan_kind(bytes: &[u8]) -> ValueKind {
    let mut s = scanner(bytes);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap().kind
}

fn scan_err(bytes: &[u8], config: ScanConfig) -> ErrorKind {
    let mut s = Scanner::new(SliceSource::new(bytes), config);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap_err().kind().clone()
}

#[test]
fn classifies_literals() {
    assert_eq!(scan_kind(b"null"), ValueKind::Null);
    assert_eq!(scan_kind(b"true"), ValueKind::True);
    assert_eq!(scan_kind(b"false"), ValueKind::False);
}

#[test]
fn classifies_numbers() {
    assert_eq!(scan_kind(b"0"), ValueKind::Int);
    assert_eq!(scan_kind(b"-42"), ValueKind::Int);
    assert_eq!(scan_kind(b"3.25"), ValueKind::Float);
    assert_eq!(scan_kind(b"1e9"), ValueKind::Float);
    assert_eq!(scan_kind(b"-0.5e-2"), ValueKind::Float);
}

#[test]
fn escapes_promote_strings() {
    assert_eq!(scan_kind(br#""plain""#), ValueKind::SimpleString);
    assert_eq!(scan_kind(br#""with \n escape""#), ValueKind::String);
    assert_eq!(scan_kind("\"h\u{e9}\"".as_bytes()), ValueKind::String);
}

#[test]
fn classifies_containers() {
    assert_eq!(scan_kind(b"{}"), ValueKind::Object);
    assert_eq!(scan_kind(b"[1, 2, [3]]"), ValueKind::List);
    assert_eq!(scan_kind(br#"{"a": [1, {"b": null}]}"#), ValueKind::Object);
}

#[test]
fn strict_number_rules() {
    assert_eq!(scan_err(b"01", strict_cfg()), ErrorKind::MalformedNumber);
    assert_eq!(scan_err(b"1.", strict_cfg()), ErrorKind::MalformedNumber);
    assert_eq!(scan_err(b".5", strict_cfg()), ErrorKind::UnexpectedCharacter('.'));
    assert_eq!(scan_err(b"1e", strict_cfg()), ErrorKind::MalformedNumber);
    // All tolerated when relaxed.
    assert_eq!(scan_kind(b"01"), ValueKind::Int);
    assert_eq!(scan_kind(b"1."), ValueKind::Float);
    assert_eq!(scan_kind(b".5"), ValueKind::Float);
}

#[test]
fn unterminated_inputs() {
    assert_eq!(scan_err(br#""abc"#, cfg()), ErrorKind::UnterminatedString);
    assert_eq!(scan_err(b"[1, 2", cfg()), ErrorKind::UnexpectedEof);
    assert_eq!(scan_err(b"tru", cfg()), ErrorKind::UnexpectedEof);
}

#[test]
fn mismatched_closers() {
    assert_eq!(scan_err(b"[1}", cfg()), ErrorKind::MismatchedCloser('}'));
    assert_eq!(scan_err(br#"{"a": 1]"#, cfg()), ErrorKind::MismatchedCloser(']'));
}

#[test]
fn trailing_commas_by_mode() {
    assert_eq!(scan_kind(b"[1, 2,]"), ValueKind::List);
    assert_eq!(
        scan_err(b"[1, 2,]", strict_cfg()),
        ErrorKind::UnexpectedCharacter(',')
    );
}

#[test]
fn comments_by_mode() {
    let with_comments = ScanConfig {
        allow_comments: true,
        ..cfg()
    };
    let doc = b"[1, // one\n 2 /* two */, 3]";
    let mut s = Scanner::new(SliceSource::new(doc), with_comments);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    assert_eq!(s.scan_value(&mut cur, &mut skips).unwrap().kind, ValueKind::List);

    assert_eq!(scan_err(doc, cfg()), ErrorKind::CommentsForbidden);
    assert_eq!(
        scan_err(b"[1 /* open", with_comments),
        ErrorKind::UnterminatedComment
    );
}

#[test]
fn depth_limit_holds() {
    let shallow = ScanConfig {
        max_depth: 4,
        ..cfg()
    };
    assert_eq!(scan_kind(b"[[[[0]]]]"), ValueKind::List);
    assert_eq!(
        scan_err(b"[[[[[0]]]]]", shallow),
        ErrorKind::DepthLimitExceeded(4)
    );
}

#[test]
fn object_walk_in_order() {
    let mut s = scanner(br#"{"a": 1, "b": "two"}"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    let opened = s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    assert_eq!(opened.kind, ContainerKind::Object);
    assert!(s.key_is(s.committed_key(), "a"));

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(raw.kind, ValueKind::Int);
    assert_eq!(s.raw_bytes(&raw), b"1");
    s.begin_next(&mut cur, &mut skips).unwrap();
    assert!(s.key_is(s.committed_key(), "b"));

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.raw_bytes(&raw), br#""two""#);
    s.begin_next(&mut cur, &mut skips).unwrap();
    assert!(s.at_end());

    let mut cur = s.cursor();
    s.end_object_and_commit(&mut cur, &mut skips).unwrap();
    assert_eq!(s.depth(), 0);
}

#[test]
fn try_begin_object_is_cheap_lookahead() {
    let mut s = scanner(b"17");
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    assert!(s.try_begin_object(&mut cur, &mut skips).unwrap().is_none());
    // Nothing consumed; the value is still scannable.
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(raw.kind, ValueKind::Int);
}

#[test]
fn undo_reverses_open() {
    let mut s = scanner(br#"{"a": 1}"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    let opened = s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    s.undo_begin_object(&mut cur, opened);
    assert_eq!(s.depth(), 0);
    // The container opens again from scratch.
    let opened = s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    assert_eq!(opened.kind, ContainerKind::Object);
    assert!(s.key_is(s.committed_key(), "a"));
}

#[test]
fn skipped_object_with_id_is_captured() {
    let mut s = scanner(br#"{"x": {"\f": 7, "v": 1}, "y": 2}"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();

    // Skip past x's value; the id declaration inside must be logged.
    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap();
    s.begin_next(&mut cur, &mut skips).unwrap();

    let captured = skips.get(7).expect("id 7 captured");
    assert_eq!(captured.kind, ValueKind::Object);
    assert_eq!(&*captured.bytes, br#"{"\f": 7, "v": 1}"#.as_slice());
    assert_eq!(captured.pos, 6);
    assert!(s.key_is(s.committed_key(), "y"));
}

#[test]
fn nested_ids_are_all_captured() {
    let mut s = scanner(br#"[{"\f": 1, "inner": {"\f": 2, "v": 5}}]"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap();
    assert!(skips.get(1).is_some());
    assert_eq!(&*skips.get(2).unwrap().bytes, br#"{"\f": 2, "v": 5}"#.as_slice());
}

#[test]
fn replay_is_lifo() {
    let mut s = scanner(b" 0");
    let outer = raw::capture(ValueKind::Object, br#"{"a": 1}"#, 100);
    let inner = raw::capture(ValueKind::Object, br#"{"b": 2}"#, 200);
    let mut skips = SkipLog::default();

    let mut cur = s.cursor();
    s.begin_replay(&mut cur, &outer);
    assert_eq!(s.replay_depth(), 1);
    let opened = s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    assert_eq!(opened.kind, ContainerKind::Object);
    assert!(s.key_is(s.committed_key(), "a"));

    let mut cur = s.cursor();
    s.begin_replay(&mut cur, &inner);
    assert_eq!(s.replay_depth(), 2);
    let mut skips2 = SkipLog::default();
    s.try_begin_object(&mut cur, &mut skips2).unwrap().unwrap();
    assert!(s.key_is(s.committed_key(), "b"));
    s.end_replay(&mut cur);

    // Back in the outer replay, exactly where it was left.
    assert_eq!(s.replay_depth(), 1);
    assert!(s.key_is(s.committed_key(), "a"));
    s.end_replay(&mut cur);
    assert_eq!(s.replay_depth(), 0);

    // The live stream resumes untouched.
    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.raw_bytes(&raw), b"0");
}

#[test]
fn windows_slide_under_tiny_chunks() {
    let doc = br#"{"first": "a long enough string value", "second": 123456789, "third": [1, 2, 3, 4, 5, 6, 7, 8, 9]}"#;
    for chunk in 1..8 {
        let mut s = Scanner::new(ChunkSource::new(doc, chunk), cfg());
        let mut skips = SkipLog::default();
        let mut cur = s.cursor();
        s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
        assert!(s.key_is(s.committed_key(), "first"));

        let mut cur = s.cursor();
        let raw = s.scan_value(&mut cur, &mut skips).unwrap();
        assert_eq!(raw.kind, ValueKind::SimpleString);
        assert_eq!(s.raw_bytes(&raw), br#""a long enough string value""#);
        s.begin_next(&mut cur, &mut skips).unwrap();
        assert!(s.key_is(s.committed_key(), "second"));

        let mut cur = s.cursor();
        let raw = s.scan_value(&mut cur, &mut skips).unwrap();
        assert_eq!(s.raw_bytes(&raw), b"123456789");
        s.begin_next(&mut cur, &mut skips).unwrap();

        let mut cur = s.cursor();
        let raw = s.scan_value(&mut cur, &mut skips).unwrap();
        assert_eq!(raw.kind, ValueKind::List);
        s.begin_next(&mut cur, &mut skips).unwrap();
        assert!(s.at_end());

        let mut cur = s.cursor();
        s.end_object_and_commit(&mut cur, &mut skips).unwrap();
    }
}

#[test]
fn list_values_wrapper_collapses() {
    let mut s = scanner(br#"{"\f": 3, "": [10, 20]}"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    assert!(s.key_is(s.committed_key(), "\u{c}"));

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.parse_id(&raw).unwrap(), 3);
    s.begin_next(&mut cur, &mut skips).unwrap();
    assert!(s.key_is(s.committed_key(), ""));

    let mut cur = s.cursor();
    s.try_open_list_values(&mut cur).unwrap();
    assert_eq!(s.depth(), 1);
    assert_eq!(s.top().unwrap().kind, ContainerKind::ListWithId);

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.raw_bytes(&raw), b"10");
    s.begin_next(&mut cur, &mut skips).unwrap();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.raw_bytes(&raw), b"20");
    s.begin_next(&mut cur, &mut skips).unwrap();
    assert!(s.at_end());

    // Closing consumes both physical closers and passes the EOF check.
    let mut cur = s.cursor();
    s.end_object_and_commit(&mut cur, &mut skips).unwrap();
    assert_eq!(s.depth(), 0);
}

#[test]
fn ids_parse_in_both_spellings() {
    let mut s = scanner(br#"[7, "8", "x", 1.5]"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.parse_id(&raw).unwrap(), 7);
    s.begin_next(&mut cur, &mut skips).unwrap();

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(s.parse_id(&raw).unwrap(), 8);
    s.begin_next(&mut cur, &mut skips).unwrap();

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert_eq!(
        s.parse_id(&raw).unwrap_err().kind().clone(),
        ErrorKind::MalformedIdentity
    );
    s.begin_next(&mut cur, &mut skips).unwrap();

    let mut cur = s.cursor();
    let raw = s.scan_value(&mut cur, &mut skips).unwrap();
    assert!(s.parse_id(&raw).is_err());
}

#[test]
fn bare_keys_tolerated_when_relaxed() {
    let mut s = scanner(br#"{1: "x", "b": 2}"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    // The bare key is a placeholder that matches nothing.
    assert!(!s.key_is(s.committed_key(), "1"));
    assert!(s.key_text(s.committed_key()).is_none());

    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap();
    s.begin_next(&mut cur, &mut skips).unwrap();
    assert!(s.key_is(s.committed_key(), "b"));

    let mut strict = Scanner::new(SliceSource::new(br#"{1: "x"}"#), strict_cfg());
    let mut cur = strict.cursor();
    assert_eq!(
        strict
            .try_begin_object(&mut cur, &mut skips)
            .unwrap_err()
            .kind()
            .clone(),
        ErrorKind::NonStringKey
    );
}

#[test]
fn trailing_garbage_detected() {
    let mut s = scanner(br#"{"a": 1} []"#);
    let mut skips = SkipLog::default();
    let mut cur = s.cursor();
    s.try_begin_object(&mut cur, &mut skips).unwrap().unwrap();
    let mut cur = s.cursor();
    s.scan_value(&mut cur, &mut skips).unwrap();
    s.begin_next(&mut cur, &mut skips).unwrap();
    let mut cur = s.cursor();
    let err = s.end_object_and_commit(&mut cur, &mut skips).unwrap_err();
    assert_eq!(err.kind().clone(), ErrorKind::TrailingData);
}
