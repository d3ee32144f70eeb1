use super::*;
use crate::ErrorCategory;
use TokenType::*;
use std::option::Option::None;

fn events(input: &str) -> Vec<(TokenType, String)> {
    match try_events(input) {
        Ok(events) => events,
        Err(err) => panic!("failed to read {input:?}: {err}"),
    }
}

fn try_events(input: &str) -> Result<Vec<(TokenType, String)>, Error> {
    let mut reader = Reader::new(input.as_bytes(), ReaderOptions::default());
    collect(&mut reader)
}

fn collect(reader: &mut Reader<'_>) -> Result<Vec<(TokenType, String)>, Error> {
    let mut out = Vec::new();
    while reader.read()? {
        let text = match reader.token_type() {
            Scalar | Alias | Anchor | Tag => reader.get_string()?.into_owned(),
            _ => String::new(),
        };
        out.push((reader.token_type(), text));
    }
    Ok(out)
}

fn read_err(input: &str) -> Error {
    match try_events(input) {
        Ok(events) => panic!("expected an error for {input:?}, got {events:?}"),
        Err(err) => err,
    }
}

fn ev(token_type: TokenType, text: &str) -> (TokenType, String) {
    (token_type, text.to_string())
}

#[test]
fn end_to_end_example() {
    let input = "name: Jane Smith\ntags:\n  - designer\n";
    assert_eq!(
        events(input),
        [
            ev(MappingStart, ""),
            ev(Scalar, "name"),
            ev(Scalar, "Jane Smith"),
            ev(Scalar, "tags"),
            ev(SequenceStart, ""),
            ev(Scalar, "designer"),
            ev(SequenceEnd, ""),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn key_tracking_and_depth() {
    let mut reader = Reader::new(b"a: 1\nb: [x, {c: d}]\n", ReaderOptions::default());
    let mut seen = Vec::new();
    while reader.read().unwrap() {
        seen.push((
            reader.token_type(),
            reader.is_mapping_key(),
            reader.token_depth(),
        ));
    }
    assert_eq!(
        seen,
        [
            (MappingStart, false, 0),
            (Scalar, true, 1),
            (Scalar, false, 1),
            (Scalar, true, 1),
            (SequenceStart, false, 1),
            (Scalar, false, 2),
            (MappingStart, false, 2),
            (Scalar, true, 3),
            (Scalar, false, 3),
            (MappingEnd, false, 2),
            (SequenceEnd, false, 1),
            (MappingEnd, false, 0),
        ]
    );
}

#[test]
fn styles_are_reported() {
    let mut reader = Reader::new(b"- 'q'\n- [a]\n", ReaderOptions::default());
    reader.read().unwrap();
    assert_eq!(reader.collection_style(), Some(CollectionStyle::Block));
    reader.read().unwrap();
    assert_eq!(reader.scalar_style(), Some(ScalarStyle::SingleQuoted));
    assert_eq!(reader.collection_style(), None);
    reader.read().unwrap();
    assert_eq!(reader.collection_style(), Some(CollectionStyle::Flow));
}

#[test]
fn empty_nodes_are_empty_scalars() {
    assert_eq!(
        events("a:\nb: 1\n"),
        [
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(Scalar, ""),
            ev(Scalar, "b"),
            ev(Scalar, "1"),
            ev(MappingEnd, ""),
        ]
    );
    assert_eq!(
        events("- \n- x\n"),
        [
            ev(SequenceStart, ""),
            ev(Scalar, ""),
            ev(Scalar, "x"),
            ev(SequenceEnd, ""),
        ]
    );
    assert_eq!(events("---\n...\n"), [ev(DocumentStart, ""), ev(Scalar, ""), ev(DocumentEnd, "")]);
}

#[test]
fn indentless_sequence_value() {
    assert_eq!(
        events("a:\n- 1\n- 2\nb: c\n"),
        [
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(SequenceStart, ""),
            ev(Scalar, "1"),
            ev(Scalar, "2"),
            ev(SequenceEnd, ""),
            ev(Scalar, "b"),
            ev(Scalar, "c"),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn explicit_keys() {
    assert_eq!(
        events("? a\n: b\n? c\n"),
        [
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(Scalar, "b"),
            ev(Scalar, "c"),
            ev(Scalar, ""),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn flow_pairs_and_keys_without_values() {
    assert_eq!(
        events("[a: b, c]"),
        [
            ev(SequenceStart, ""),
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(Scalar, "b"),
            ev(MappingEnd, ""),
            ev(Scalar, "c"),
            ev(SequenceEnd, ""),
        ]
    );
    assert_eq!(
        events("{a, b: c,}"),
        [
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(Scalar, ""),
            ev(Scalar, "b"),
            ev(Scalar, "c"),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn properties_come_before_their_node() {
    assert_eq!(
        events("base: &b !!map\n  x: 1\nref: *b\nempty: &e\n"),
        [
            ev(MappingStart, ""),
            ev(Scalar, "base"),
            ev(Anchor, "b"),
            ev(Tag, "tag:yaml.org,2002:map"),
            ev(MappingStart, ""),
            ev(Scalar, "x"),
            ev(Scalar, "1"),
            ev(MappingEnd, ""),
            ev(Scalar, "ref"),
            ev(Alias, "b"),
            ev(Scalar, "empty"),
            ev(Anchor, "e"),
            ev(Scalar, ""),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn tag_resolution() {
    let input = "%TAG !e! tag:example.com,2000:app/\n---\n- !e!foo%21 a\n- !local b\n- !<tag:x,1:y> c\n- ! d\n";
    let tags: Vec<String> = events(input)
        .into_iter()
        .filter(|(t, _)| *t == Tag)
        .map(|(_, s)| s)
        .collect();
    assert_eq!(
        tags,
        ["tag:example.com,2000:app/foo!", "!local", "tag:x,1:y", "!"]
    );
}

#[test]
fn tag_handles_are_document_scoped() {
    let err = read_err("%TAG !e! tag:e.com:\n--- !e!a x\n...\n--- !e!b y\n");
    assert_eq!(err.kind, ErrorKind::UndefinedTagHandle("!e!".into()));
    assert_eq!(err.mark.line, 3);
}

#[test]
fn directive_errors() {
    assert_eq!(
        read_err("%YAML 1.2\n%YAML 1.2\n---\na\n").kind,
        ErrorKind::DuplicateVersionDirective
    );
    assert_eq!(
        read_err("%YAML 2.0\n---\na\n").kind,
        ErrorKind::UnsupportedVersion { major: 2, minor: 0 }
    );
    assert_eq!(
        read_err("%TAG !a! x:\n%TAG !a! y:\n---\na\n").kind,
        ErrorKind::DuplicateTagHandle("!a!".into())
    );
    assert!(matches!(
        read_err("%YAML 1.2\nbare\n").kind,
        ErrorKind::Wanted { .. }
    ));
}

#[test]
fn multiple_documents() {
    assert_eq!(
        events("a\n---\nb\n...\nc\n"),
        [
            ev(Scalar, "a"),
            ev(DocumentStart, ""),
            ev(Scalar, "b"),
            ev(DocumentEnd, ""),
            ev(Scalar, "c"),
        ]
    );
}

#[test]
fn content_after_root_node_is_rejected() {
    assert!(matches!(read_err("[a] b").kind, ErrorKind::Wanted { .. }));
}

#[test]
fn undefined_alias() {
    let err = read_err("a: *nope\n");
    assert_eq!(err.kind, ErrorKind::UndefinedAlias("nope".into()));
    assert_eq!(err.category(), ErrorCategory::Semantic);

    // Anchors do not survive the document they were defined in.
    let err = read_err("- &a 1\n---\n- *a\n");
    assert_eq!(err.kind, ErrorKind::UndefinedAlias("a".into()));
}

#[test]
fn alias_inside_its_own_anchored_node() {
    let err = read_err("&a [*a]");
    assert_eq!(err.kind, ErrorKind::UndefinedAlias("a".into()));
    let err = read_err("&m {k: [x, *m]}");
    assert_eq!(err.kind, ErrorKind::UndefinedAlias("m".into()));

    assert_eq!(
        events("- &a [x]\n- *a\n- &e\n- *e\n"),
        [
            ev(SequenceStart, ""),
            ev(Anchor, "a"),
            ev(SequenceStart, ""),
            ev(Scalar, "x"),
            ev(SequenceEnd, ""),
            ev(Alias, "a"),
            ev(Anchor, "e"),
            ev(Scalar, ""),
            ev(Alias, "e"),
            ev(SequenceEnd, ""),
        ]
    );
    assert_eq!(
        events("&k key: *k\n"),
        [
            ev(MappingStart, ""),
            ev(Anchor, "k"),
            ev(Scalar, "key"),
            ev(Alias, "k"),
            ev(MappingEnd, ""),
        ]
    );
}

#[test]
fn depth_limit() {
    let options = ReaderOptions { max_depth: 2 };
    let mut reader = Reader::new(b"[[[a]]]", options);
    assert!(reader.read().unwrap());
    assert!(reader.read().unwrap());
    let err = reader.read().unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded { limit: 2, depth: 3 });
    assert_eq!(err.category(), ErrorCategory::Limit);
    assert_eq!(err.mark, Mark::new(2, 0, 2));
}

#[test]
fn errors_are_sticky() {
    let mut reader = Reader::new(b"a: 'open", ReaderOptions::default());
    let first = loop {
        match reader.read() {
            Ok(true) => continue,
            Ok(false) => panic!("unterminated scalar was accepted"),
            Err(err) => break err,
        }
    };
    assert_eq!(first.kind, ErrorKind::UnterminatedScalar);
    assert_eq!(reader.read().unwrap_err(), first);
    assert_eq!(reader.token_type(), TokenType::None);
}

#[test]
fn key_retroactivity_errors() {
    let long_key = format!("{}: v\n", "k".repeat(1025));
    assert!(try_events(&long_key).is_err());
    assert_eq!(read_err("a\nb: c\n").kind, ErrorKind::MappingValueNotAllowed);
    assert_eq!(read_err("a:\n\tb: c\n").kind, ErrorKind::TabIndentation);
}

#[test]
fn block_scalars() {
    let input = "clip: |\n  a\n  b\n\nstrip: |-\n  a\n  b\n\nkeep: |+\n  a\n  b\n\nfold: >\n  one\n  two\n\n  three\n";
    let values: Vec<String> = events(input)
        .into_iter()
        .filter(|(t, _)| *t == Scalar)
        .map(|(_, s)| s)
        .collect();
    assert_eq!(
        values,
        [
            "clip", "a\nb\n", "strip", "a\nb", "keep", "a\nb\n\n", "fold", "one two\nthree\n"
        ]
    );
}

#[test]
fn typed_accessors() {
    let input = "[42, -7, 3000000000, 1.5, .inf, yes, off, null, ~, '', '12', text]";
    let mut reader = Reader::new(input.as_bytes(), ReaderOptions::default());
    reader.read().unwrap();
    let mut rows = Vec::new();
    while reader.read().unwrap() && reader.token_type() == Scalar {
        rows.push((
            reader.try_get_i32(),
            reader.try_get_i64(),
            reader.try_get_f64(),
            reader.try_get_bool(),
            reader.is_null(),
        ));
    }
    assert_eq!(
        rows,
        [
            (Some(42), Some(42), Some(42.0), None, false),
            (Some(-7), Some(-7), Some(-7.0), None, false),
            (None, Some(3_000_000_000), Some(3e9), None, false),
            (None, None, Some(1.5), None, false),
            (None, None, Some(f64::INFINITY), None, false),
            (None, None, None, Some(true), false),
            (None, None, None, Some(false), false),
            (None, None, None, None, true),
            (None, None, None, None, true),
            (None, None, None, None, false),
            (Some(12), Some(12), Some(12.0), None, false),
            (None, None, None, None, false),
        ]
    );
}

#[test]
fn resolve_only_types_plain_scalars() {
    let mut reader = Reader::new(b"[12, '12', true, ~]", ReaderOptions::default());
    reader.read().unwrap();
    let mut values = Vec::new();
    while reader.read().unwrap() && reader.token_type() == Scalar {
        values.push(reader.resolve().unwrap());
    }
    assert_eq!(
        values,
        [
            ScalarValue::Int(12),
            ScalarValue::String(Cow::Borrowed("12")),
            ScalarValue::Bool(true),
            ScalarValue::Null,
        ]
    );
}

#[test]
fn value_span_and_positions() {
    let input = b"key: \"a\\tb\"\n";
    let mut reader = Reader::new(input, ReaderOptions::default());
    reader.read().unwrap();
    reader.read().unwrap();
    reader.read().unwrap();
    assert_eq!(reader.value_span(), b"a\\tb");
    assert_eq!(reader.get_string().unwrap(), "a\tb");
    assert_eq!(reader.token_start(), Mark::new(5, 0, 5));
    assert_eq!(reader.span(), Span::new(6, 10));
}

#[test]
fn skip_consumes_whole_subtree() {
    let mut reader = Reader::new(b"a: {b: [1, 2], c: 3}\nd: &x [4]\ne: 5\n", ReaderOptions::default());
    let mut scalars = Vec::new();
    while reader.read().unwrap() {
        match reader.token_type() {
            Scalar => scalars.push(reader.get_string().unwrap().into_owned()),
            MappingStart | Anchor if reader.token_depth() == 1 => {
                reader.skip().unwrap();
                assert_eq!(reader.current_depth(), 1);
            }
            _ => {}
        }
    }
    assert_eq!(scalars, ["a", "d", "e", "5"]);
}

#[test]
#[should_panic(expected = "get_string called on a None token")]
fn get_string_without_token_panics() {
    let reader = Reader::new(b"a", ReaderOptions::default());
    let _ = reader.get_string();
}

#[test]
fn chunked_input_resumes() {
    let mut reader = Reader::with_state(b"a: 1\nb:\n", false, ReaderState::default());
    let first = collect(&mut reader).unwrap();
    assert_eq!(
        first,
        [
            ev(MappingStart, ""),
            ev(Scalar, "a"),
            ev(Scalar, "1"),
            ev(Scalar, "b"),
        ]
    );
    let state = reader.state();
    assert_eq!(state.depth(), 1);
    assert_eq!(state.position(), Mark::new(8, 2, 0));
    assert_eq!(state.parser_state(), ParserState::InBlockContent);

    let mut reader = Reader::with_state(b"  - x\n", true, state);
    let second = collect(&mut reader).unwrap();
    assert_eq!(
        second,
        [
            ev(SequenceStart, ""),
            ev(Scalar, "x"),
            ev(SequenceEnd, ""),
            ev(MappingEnd, ""),
        ]
    );
    assert_eq!(reader.parser_state(), ParserState::Finished);
}
