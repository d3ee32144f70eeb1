#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_spanner::{Reader, ReaderOptions, ScalarStyle, ScalarValue, TokenType, Writer};

/// Resolved token stream, or `None` when the input is rejected or uses
/// collections or aliases as mapping keys.
fn events(input: &[u8]) -> Option<Vec<String>> {
    let mut reader = Reader::new(input, ReaderOptions::default());
    let mut out = Vec::new();
    while reader.read().ok()? {
        let token_type = reader.token_type();
        let event = match token_type {
            TokenType::DocumentStart | TokenType::DocumentEnd => continue,
            TokenType::Scalar if reader.is_mapping_key() => {
                format!("key {}", reader.get_string().ok()?)
            }
            _ if reader.is_mapping_key() => return None,
            TokenType::Scalar => match reader.resolve().ok()? {
                ScalarValue::Float(f) if f.is_nan() => "nan".to_string(),
                value => format!("{value:?}"),
            },
            TokenType::Anchor | TokenType::Tag | TokenType::Alias => {
                format!("{token_type:?} {}", reader.get_string().ok()?)
            }
            other => format!("{other:?}"),
        };
        out.push(event);
    }
    Some(out)
}

fn transcode(input: &[u8]) -> Vec<u8> {
    let mut reader = Reader::new(input, ReaderOptions::default());
    let mut writer = Writer::new(Vec::new());
    while reader.read().unwrap() {
        match reader.token_type() {
            TokenType::DocumentStart => writer.write_document_start(),
            TokenType::DocumentEnd => writer.write_document_end(),
            TokenType::MappingStart => writer.write_mapping_start(reader.collection_style().unwrap()),
            TokenType::MappingEnd => writer.write_mapping_end(),
            TokenType::SequenceStart => {
                writer.write_sequence_start(reader.collection_style().unwrap())
            }
            TokenType::SequenceEnd => writer.write_sequence_end(),
            TokenType::Anchor => writer.write_anchor(&reader.get_string().unwrap()),
            TokenType::Tag => writer.write_tag(&reader.get_string().unwrap()),
            TokenType::Alias => writer.write_alias(&reader.get_string().unwrap()),
            TokenType::Scalar if reader.is_mapping_key() => {
                writer.write_property_name(&reader.get_string().unwrap())
            }
            TokenType::Scalar if reader.scalar_style() == Some(ScalarStyle::Plain) => {
                match reader.resolve().unwrap() {
                    ScalarValue::Null => writer.write_null(),
                    ScalarValue::Bool(b) => writer.write_bool(b),
                    ScalarValue::Int(i) => writer.write_i64(i),
                    ScalarValue::Float(f) => writer.write_f64(f),
                    ScalarValue::String(s) => writer.write_string(&s),
                }
            }
            TokenType::Scalar => writer.write_string(&reader.get_string().unwrap()),
            TokenType::None => unreachable!(),
        }
    }
    writer.write_stream_end();
    writer.into_inner().unwrap()
}

fuzz_target!(|data: &[u8]| {
    let Some(expected) = events(data) else {
        return;
    };
    let once = transcode(data);
    let text = String::from_utf8_lossy(&once);
    assert_eq!(events(&once).as_ref(), Some(&expected), "output:\n{text}");
    assert_eq!(transcode(&once), once, "output:\n{text}");
});
