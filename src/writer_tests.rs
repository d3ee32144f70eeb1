use super::*;
use crate::{Reader, ReaderOptions, TokenType};

fn emit(build: impl FnOnce(&mut Writer<Vec<u8>>)) -> String {
    emit_with(WriterOptions::default(), build)
}

fn emit_with(options: WriterOptions, build: impl FnOnce(&mut Writer<Vec<u8>>)) -> String {
    let mut writer = Writer::with_options(Vec::new(), options);
    build(&mut writer);
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

fn root_string(value: &str) -> String {
    emit(|w| w.write_string(value))
}

#[test]
fn quoting_decisions() {
    assert_eq!(root_string("true"), "'true'\n");
    assert_eq!(root_string("hello"), "hello\n");
    assert_eq!(root_string("a: b"), "'a: b'\n");
    assert_eq!(root_string(""), "''\n");
    assert_eq!(root_string("it's"), "it's\n");
    assert_eq!(root_string("a'b: c"), "'a''b: c'\n");
    assert_eq!(root_string("line\nbreak"), "\"line\\nbreak\"\n");
    assert_eq!(root_string("bell\x07"), "\"bell\\a\"\n");
}

#[test]
fn quoting_rules() {
    for text in ["NULL", "~", "False", "12", "-3", "1.5", ".inf", "0x1f"] {
        assert_eq!(quoting(text, false), Quoting::Single, "{text}");
    }
    for text in ["-x", "?", "*a", "&a", "!t", "|", ">", "%", "@", "`", "{", "["] {
        assert_eq!(quoting(text, false), Quoting::Single, "{text}");
    }
    for text in [" lead", "trail ", "x #y", "k:v", "...", "---"] {
        assert_eq!(quoting(text, false), Quoting::Single, "{text}");
    }
    for text in ["hello", "two words", "a,b", "é ü", "yes", "1.2.3"] {
        assert_eq!(quoting(text, false), Quoting::Plain, "{text}");
    }
    assert_eq!(quoting("a,b", true), Quoting::Single);
    assert_eq!(quoting("x]", true), Quoting::Single);
    assert_eq!(quoting("cr\r", false), Quoting::Double);
    assert_eq!(quoting("\u{FEFF}bom", false), Quoting::Double);
}

#[test]
fn double_quoted_escapes() {
    let mut out = String::new();
    escape_double("\"\\\0\t\n\r\x1B\u{85}\u{2028}\x01\u{9F}\u{FEFF}", &mut out);
    assert_eq!(out, r#"\"\\\0\t\n\r\e\N\L\x01\x9F\uFEFF"#);
}

#[test]
fn end_to_end_example() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("name");
        w.write_string("Jane Smith");
        w.write_property_name("tags");
        w.write_sequence_start(CollectionStyle::Block);
        w.write_string("designer");
        w.write_sequence_end();
        w.write_mapping_end();
    });
    assert_eq!(out, "name: Jane Smith\ntags:\n  - designer\n");
}

fn three_levels(w: &mut Writer<Vec<u8>>) {
    w.write_mapping_start(CollectionStyle::Block);
    w.write_property_name("a");
    w.write_mapping_start(CollectionStyle::Block);
    w.write_property_name("b");
    w.write_mapping_start(CollectionStyle::Block);
    w.write_property_name("c");
    w.write_string("d");
    w.write_mapping_end();
    w.write_mapping_end();
    w.write_mapping_end();
}

#[test]
fn indentation_per_level() {
    assert_eq!(emit(three_levels), "a:\n  b:\n    c: d\n");
    let options = WriterOptions {
        indent: 4,
        ..WriterOptions::default()
    };
    assert_eq!(emit_with(options, three_levels), "a:\n    b:\n        c: d\n");
}

#[test]
fn indent_is_clamped() {
    let options = WriterOptions {
        indent: 1,
        ..WriterOptions::default()
    };
    let writer = Writer::with_options(Vec::new(), options);
    assert_eq!(writer.options().indent, 2);
}

#[test]
fn sequence_entries_are_compact() {
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_i32(1);
        w.write_property_name("b");
        w.write_i64(-2);
        w.write_mapping_end();
        w.write_sequence_start(CollectionStyle::Block);
        w.write_string("x");
        w.write_string("y");
        w.write_sequence_end();
        w.write_sequence_end();
    });
    assert_eq!(out, "- a: 1\n  b: -2\n- - x\n  - y\n");
}

#[test]
fn sequence_entries_pad_to_indent() {
    let options = WriterOptions {
        indent: 4,
        ..WriterOptions::default()
    };
    let out = emit_with(options, |w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_bool(true);
        w.write_property_name("b");
        w.write_null();
        w.write_mapping_end();
        w.write_sequence_end();
    });
    assert_eq!(out, "-   a: true\n    b: null\n");
}

#[test]
fn empty_block_collections_use_flow_form() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_sequence_start(CollectionStyle::Block);
        w.write_sequence_end();
        w.write_property_name("b");
        w.write_mapping_start(CollectionStyle::Block);
        w.write_mapping_end();
        w.write_mapping_end();
    });
    assert_eq!(out, "a: []\nb: {}\n");

    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_sequence_end();
    });
    assert_eq!(out, "[]\n");
}

#[test]
fn flow_collections() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Flow);
        w.write_property_name("a");
        w.write_i32(1);
        w.write_property_name("b");
        w.write_sequence_start(CollectionStyle::Block);
        w.write_string("x");
        w.write_string("y, z");
        w.write_sequence_end();
        w.write_property_name("c");
        w.write_mapping_start(CollectionStyle::Flow);
        w.write_mapping_end();
        w.write_mapping_end();
    });
    assert_eq!(out, "{a: 1, b: [x, 'y, z'], c: {}}\n");
}

#[test]
fn flow_inside_block() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("point");
        w.write_sequence_start(CollectionStyle::Flow);
        w.write_i32(1);
        w.write_i32(2);
        w.write_sequence_end();
        w.write_property_name("list");
        w.write_sequence_start(CollectionStyle::Block);
        w.write_mapping_start(CollectionStyle::Flow);
        w.write_property_name("k");
        w.write_string("v");
        w.write_mapping_end();
        w.write_sequence_end();
        w.write_mapping_end();
    });
    assert_eq!(out, "point: [1, 2]\nlist:\n  - {k: v}\n");
}

#[test]
fn special_doubles() {
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_f64(f64::INFINITY);
        w.write_f64(f64::NEG_INFINITY);
        w.write_f64(f64::NAN);
        w.write_f64(1.5);
        w.write_f64(2.0);
        w.write_sequence_end();
    });
    assert_eq!(out, "- .inf\n- -.inf\n- .nan\n- 1.5\n- 2.0\n");
}

fn literal_value(value: &str) -> String {
    emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("k");
        w.write_literal_scalar(value);
        w.write_mapping_end();
    })
}

#[test]
fn literal_scalars_pick_chomping() {
    assert_eq!(literal_value("one\ntwo\n"), "k: |\n  one\n  two\n");
    assert_eq!(literal_value("a"), "k: |-\n  a\n");
    assert_eq!(literal_value("a\n\n"), "k: |+\n  a\n\n");
    assert_eq!(literal_value("a\n\nb\n"), "k: |\n  a\n\n  b\n");
    assert_eq!(literal_value(""), "k: |-\n");
    assert_eq!(literal_value("\n"), "k: |+\n\n");
}

#[test]
fn literal_scalar_strips_carriage_returns() {
    assert_eq!(literal_value("a\r\nb\r\n"), "k: |\n  a\n  b\n");
}

#[test]
fn literal_scalar_indentation_indicator() {
    assert_eq!(literal_value("  code\nend\n"), "k: |2\n    code\n  end\n");
    let out = emit(|w| w.write_literal_scalar(" x\n"));
    assert_eq!(out, "|2\n   x\n");
}

#[test]
fn folded_scalar() {
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_folded_scalar("one\ntwo\n");
        w.write_sequence_end();
    });
    assert_eq!(out, "- >\n  one\n  two\n");
}

#[test]
fn block_scalar_in_flow_is_quoted() {
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Flow);
        w.write_literal_scalar("a\nb");
        w.write_sequence_end();
    });
    assert_eq!(out, "[\"a\\nb\"]\n");
}

#[test]
fn document_markers_and_directive() {
    let options = WriterOptions {
        version_directive: true,
        explicit_document_start: true,
        explicit_document_end: true,
        ..WriterOptions::default()
    };
    let out = emit_with(options, |w| {
        w.write_stream_start();
        w.write_document_start();
        w.write_string("a");
        w.write_document_end();
        w.write_document_start();
        w.write_string("b");
        w.write_document_end();
        w.write_stream_end();
        assert_eq!(w.state(), WriterState::Finished);
    });
    assert_eq!(out, "%YAML 1.2\n---\na\n...\n%YAML 1.2\n---\nb\n...\n");
}

#[test]
fn implicit_documents() {
    let out = emit(|w| {
        w.write_string("a");
        assert_eq!(w.state(), WriterState::InDocument);
        w.write_string("b");
    });
    assert_eq!(out, "a\n---\nb\n");

    let options = WriterOptions {
        explicit_document_end: true,
        ..WriterOptions::default()
    };
    let out = emit_with(options, |w| {
        w.write_string("a");
        w.write_string("b");
        w.write_stream_end();
    });
    assert_eq!(out, "a\n...\nb\n...\n");
}

#[test]
fn properties_and_aliases() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_anchor("x");
        w.write_string("v");
        w.write_property_name("b");
        w.write_alias("x");
        w.write_property_name("c");
        w.write_tag("tag:yaml.org,2002:str");
        w.write_string("1");
        w.write_property_name("d");
        w.write_tag("!local");
        w.write_anchor("m");
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("e");
        w.write_string("f");
        w.write_mapping_end();
        w.write_property_name("g");
        w.write_tag("urn:example");
        w.write_sequence_start(CollectionStyle::Block);
        w.write_sequence_end();
        w.write_mapping_end();
    });
    assert_eq!(
        out,
        "a: &x v\nb: *x\nc: !!str '1'\nd: !local &m\n  e: f\ng: !<urn:example> []\n"
    );
}

#[test]
fn anchored_collection_in_sequence_starts_new_line() {
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_anchor("a");
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("k");
        w.write_string("v");
        w.write_mapping_end();
        w.write_sequence_end();
    });
    assert_eq!(out, "- &a\n  k: v\n");
}

#[test]
fn comments() {
    let out = emit(|w| {
        w.write_comment("top");
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_string("b");
        w.write_comment("note");
        w.write_property_name("c");
        w.write_string("d");
        w.write_mapping_end();
    });
    assert_eq!(out, "# top\na: b # note\nc: d\n");
}

#[test]
fn quoted_property_names() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("key: x");
        w.write_string("1");
        w.write_property_name("");
        w.write_i32(2);
        w.write_mapping_end();
    });
    assert_eq!(out, "'key: x': '1'\n'': 2\n");
}

#[test]
fn flush_and_pending_bytes() {
    let mut sink = Vec::new();
    let mut writer = Writer::new(&mut sink);
    writer.write_string("a");
    assert_eq!(writer.bytes_pending(), 2);
    writer.flush().unwrap();
    assert_eq!(writer.bytes_pending(), 0);
    drop(writer);
    assert_eq!(sink, b"a\n");
}

#[test]
fn reset_discards_output() {
    let mut writer = Writer::new(Vec::new());
    writer.write_mapping_start(CollectionStyle::Block);
    writer.write_property_name("lost");
    writer.reset();
    assert_eq!(writer.state(), WriterState::Initial);
    assert_eq!(writer.bytes_pending(), 0);
    assert!(writer.current_container().is_none());
    writer.write_string("kept");
    assert_eq!(writer.into_inner().unwrap(), b"kept\n");
}

#[test]
fn container_info_tracks_children() {
    let mut writer = Writer::new(Vec::new());
    writer.write_sequence_start(CollectionStyle::Flow);
    let info = *writer.current_container().unwrap();
    assert_eq!(info.kind, ContainerKind::FlowSequence);
    assert_eq!(info.depth, 0);
    assert!(info.is_first_child);
    writer.write_null();
    assert!(!writer.current_container().unwrap().is_first_child);
}

#[test]
fn strings_read_back_unchanged() {
    let values = [
        "true", "", "a: b", "x #y", " pad ", "line\nbreak", "tab\tin", "quote'd", "-dash",
        "null", "...", "é ü", "1.5", "back\\slash", "\"dq\"",
    ];
    let out = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        for value in values {
            w.write_string(value);
        }
        w.write_sequence_end();
    });

    let mut reader = Reader::new(out.as_bytes(), ReaderOptions::default());
    assert!(reader.read().unwrap());
    assert_eq!(reader.token_type(), TokenType::SequenceStart);
    for value in values {
        assert!(reader.read().unwrap());
        assert_eq!(reader.token_type(), TokenType::Scalar);
        assert_eq!(reader.get_string().unwrap(), value, "in {out:?}");
    }
    assert!(reader.read().unwrap());
    assert_eq!(reader.token_type(), TokenType::SequenceEnd);
    assert!(!reader.read().unwrap());
}

fn keys_of(text: &str) -> Vec<String> {
    let mut reader = Reader::new(text.as_bytes(), ReaderOptions::default());
    let mut keys = Vec::new();
    while reader.read().unwrap() {
        if reader.token_type() == TokenType::Scalar && reader.is_mapping_key() {
            keys.push(reader.get_string().unwrap().into_owned());
        }
    }
    keys
}

#[test]
fn long_keys_use_explicit_form() {
    let long = "k".repeat(1100);

    let flow = emit(|w| {
        w.write_mapping_start(CollectionStyle::Flow);
        w.write_property_name("a");
        w.write_i32(1);
        w.write_property_name(&long);
        w.write_i32(2);
        w.write_mapping_end();
    });
    assert_eq!(flow, format!("{{a: 1, ? {long}: 2}}\n"));
    assert_eq!(keys_of(&flow), ["a", long.as_str()]);

    let block = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("a");
        w.write_i32(1);
        w.write_property_name(&long);
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name("x");
        w.write_string("y");
        w.write_mapping_end();
        w.write_mapping_end();
    });
    assert_eq!(block, format!("a: 1\n? {long}\n:\n  x: y\n"));
    assert_eq!(keys_of(&block), ["a", long.as_str(), "x"]);

    let nested = emit(|w| {
        w.write_sequence_start(CollectionStyle::Block);
        w.write_mapping_start(CollectionStyle::Block);
        w.write_anchor("k");
        w.write_property_name(&long);
        w.write_null();
        w.write_mapping_end();
        w.write_sequence_end();
    });
    assert_eq!(nested, format!("- ? &k {long}\n  : null\n"));
    assert_eq!(keys_of(&nested), [long.as_str()]);

    // At the limit the implicit form still reads back.
    let edge = "e".repeat(MAX_SIMPLE_KEY_LENGTH);
    let text = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_property_name(&edge);
        w.write_null();
        w.write_mapping_end();
    });
    assert_eq!(text, format!("{edge}: null\n"));
    assert_eq!(keys_of(&text), [edge.as_str()]);
}

#[test]
#[should_panic(expected = "collection end without a matching start")]
fn unmatched_end_panics() {
    Writer::new(Vec::new()).write_mapping_end();
}

#[test]
#[should_panic(expected = "mapping value written without a property name")]
fn value_without_property_name_panics() {
    let mut writer = Writer::new(Vec::new());
    writer.write_mapping_start(CollectionStyle::Block);
    writer.write_string("orphan");
}

#[test]
#[should_panic(expected = "property name written inside a BlockSequence")]
fn property_name_in_sequence_panics() {
    let mut writer = Writer::new(Vec::new());
    writer.write_sequence_start(CollectionStyle::Block);
    writer.write_property_name("k");
}

#[test]
fn properties_on_keys() {
    let out = emit(|w| {
        w.write_mapping_start(CollectionStyle::Block);
        w.write_anchor("k");
        w.write_property_name("key");
        w.write_string("v");
        w.write_mapping_end();
    });
    assert_eq!(out, "&k key: v\n");
}
