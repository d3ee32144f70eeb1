//! Lazy scalar decoding and YAML 1.2 core-schema resolution.
//!
//! The scanner only records where a scalar's content lies. Folding, escape
//! decoding and chomping happen here, when a caller actually asks for the
//! value.

use crate::ErrorKind;
use crate::tags::hex_value;
use crate::token::{BlockHeader, Chomping, ScalarStyle};
use std::borrow::Cow;

#[cfg(test)]
#[path = "./scalar_tests.rs"]
mod tests;

/// A scalar interpreted through the YAML 1.2 core schema.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue<'a> {
    /// `null`, `~` or an empty plain scalar.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Decimal, `0o` octal or `0x` hexadecimal integer that fits an `i64`.
    Int(i64),
    /// Floating point number, including `.inf`, `-.inf` and `.nan`.
    Float(f64),
    /// Anything else, and every quoted or block scalar.
    String(Cow<'a, str>),
}

impl<'a> ScalarValue<'a> {
    /// Resolves a decoded plain scalar.
    pub fn resolve_plain(value: Cow<'a, str>) -> ScalarValue<'a> {
        let text: &str = &value;
        if is_null(text) {
            ScalarValue::Null
        } else if let Some(b) = parse_bool(text, false) {
            ScalarValue::Bool(b)
        } else if let Some(i) = parse_int(text) {
            ScalarValue::Int(i)
        } else if let Some(f) = parse_float(text) {
            ScalarValue::Float(f)
        } else {
            ScalarValue::String(value)
        }
    }
}

// --- decoding -------------------------------------------------------------

/// Decodes the raw content of a scalar token.
///
/// Content without line breaks, escapes or doubled quotes is returned
/// borrowed.
pub(crate) fn decode(
    raw: &[u8],
    style: ScalarStyle,
    block: BlockHeader,
) -> Result<Cow<'_, str>, ErrorKind> {
    let has_break = || raw.iter().any(|&b| b == b'\n' || b == b'\r');
    let simple = match style {
        ScalarStyle::Plain => !has_break(),
        ScalarStyle::SingleQuoted => !raw.contains(&b'\'') && !has_break(),
        ScalarStyle::DoubleQuoted => !raw.contains(&b'\\') && !has_break(),
        ScalarStyle::Literal | ScalarStyle::Folded => raw.is_empty() && block.chomping != Chomping::Keep,
    };
    if simple {
        return std::str::from_utf8(raw)
            .map(Cow::Borrowed)
            .map_err(|_| ErrorKind::InvalidUtf8);
    }

    let out = match style {
        ScalarStyle::Plain | ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
            fold_flow(raw, style)?
        }
        ScalarStyle::Literal => fold_block(raw, block, false),
        ScalarStyle::Folded => fold_block(raw, block, true),
    };
    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| ErrorKind::InvalidUtf8)
}

#[inline]
fn break_len(raw: &[u8], i: usize) -> usize {
    match raw[i] {
        b'\r' if raw.get(i + 1) == Some(&b'\n') => 2,
        b'\n' | b'\r' => 1,
        _ => 0,
    }
}

/// Plain, single- and double-quoted folding: a single line break becomes a
/// space, `n` consecutive breaks become `n - 1` newlines, and whitespace
/// around breaks is dropped.
fn fold_flow(raw: &[u8], style: ScalarStyle) -> Result<Vec<u8>, ErrorKind> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let mut escaped_break = false;
        while i < raw.len() {
            match raw[i] {
                b' ' | b'\t' | b'\n' | b'\r' => break,
                b'\'' if style == ScalarStyle::SingleQuoted && raw.get(i + 1) == Some(&b'\'') => {
                    out.push(b'\'');
                    i += 2;
                }
                b'\\' if style == ScalarStyle::DoubleQuoted => {
                    let Some(&code) = raw.get(i + 1) else {
                        return Err(ErrorKind::InvalidEscape('\\'));
                    };
                    if code == b'\n' || code == b'\r' {
                        i += 1 + break_len(raw, i + 1);
                        escaped_break = true;
                        break;
                    }
                    i = decode_escape(raw, i, &mut out)?;
                }
                b => {
                    out.push(b);
                    i += 1;
                }
            }
        }

        let blanks_start = i;
        let mut breaks = 0usize;
        while i < raw.len() {
            match raw[i] {
                b' ' | b'\t' => i += 1,
                b'\n' | b'\r' => {
                    i += break_len(raw, i);
                    breaks += 1;
                }
                _ => break,
            }
        }
        if escaped_break {
            out.resize(out.len() + breaks, b'\n');
        } else if breaks == 0 {
            out.extend_from_slice(&raw[blanks_start..i]);
        } else if breaks == 1 {
            out.push(b' ');
        } else {
            out.resize(out.len() + breaks - 1, b'\n');
        }
    }
    Ok(out)
}

/// Decodes the escape starting at `raw[at] == b'\\'`, returning the index
/// just past it.
fn decode_escape(raw: &[u8], at: usize, out: &mut Vec<u8>) -> Result<usize, ErrorKind> {
    let code = raw[at + 1];
    let simple: &[u8] = match code {
        b'0' => b"\0",
        b'a' => b"\x07",
        b'b' => b"\x08",
        b't' | b'\t' => b"\t",
        b'n' => b"\n",
        b'v' => b"\x0B",
        b'f' => b"\x0C",
        b'r' => b"\r",
        b'e' => b"\x1B",
        b' ' => b" ",
        b'"' => b"\"",
        b'/' => b"/",
        b'\\' => b"\\",
        b'N' => "\u{85}".as_bytes(),
        b'_' => "\u{A0}".as_bytes(),
        b'L' => "\u{2028}".as_bytes(),
        b'P' => "\u{2029}".as_bytes(),
        b'x' | b'u' | b'U' => &[],
        other => return Err(ErrorKind::InvalidEscape(other as char)),
    };
    if !simple.is_empty() {
        out.extend_from_slice(simple);
        return Ok(at + 2);
    }

    let digits = match code {
        b'x' => 2,
        b'u' => 4,
        _ => 8,
    };
    let mut value = 0u32;
    for k in 0..digits {
        let b = raw.get(at + 2 + k).copied().unwrap_or(b'"');
        match hex_value(b) {
            Some(digit) => value = value << 4 | digit as u32,
            None => return Err(ErrorKind::InvalidHexEscape(b as char)),
        }
    }
    let ch = char::from_u32(value).ok_or(ErrorKind::InvalidEscapeValue(value))?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    Ok(at + 2 + digits)
}

/// Literal and folded block scalars. `raw` starts at the beginning of the
/// first line after the header.
fn fold_block(raw: &[u8], block: BlockHeader, folded: bool) -> Vec<u8> {
    let indent = block.indent as usize;
    let mut out = Vec::with_capacity(raw.len());
    let mut leading_break = false;
    let mut leading_blank = false;
    let mut trailing_breaks = 0usize;

    let mut i = 0;
    while i < raw.len() {
        let line_start = i;
        while i < raw.len() && raw[i] != b'\n' && raw[i] != b'\r' {
            i += 1;
        }
        let line = &raw[line_start..i];
        let terminated = i < raw.len();
        if terminated {
            i += break_len(raw, i);
        }

        let stripped = line.iter().take(indent).take_while(|&&b| b == b' ').count();
        let text = &line[stripped..];
        if text.is_empty() {
            trailing_breaks += 1;
            continue;
        }

        let trailing_blank = matches!(text[0], b' ' | b'\t');
        if folded && leading_break && !leading_blank && !trailing_blank {
            if trailing_breaks == 0 {
                out.push(b' ');
            }
            leading_break = false;
        }
        if leading_break {
            out.push(b'\n');
        }
        out.resize(out.len() + trailing_breaks, b'\n');
        trailing_breaks = 0;
        leading_blank = trailing_blank;

        out.extend_from_slice(text);
        leading_break = terminated;
    }

    if block.chomping != Chomping::Strip && leading_break {
        out.push(b'\n');
    }
    if block.chomping == Chomping::Keep {
        out.resize(out.len() + trailing_breaks, b'\n');
    }
    out
}

// --- core schema ----------------------------------------------------------

pub(crate) fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null")
}

/// `true`/`false`, plus `yes/no/on/off` in any case when `lenient`.
pub(crate) fn parse_bool(text: &str, lenient: bool) -> Option<bool> {
    match text {
        "true" => return Some(true),
        "false" => return Some(false),
        _ if !lenient => return None,
        _ => {}
    }
    const TRUTHY: [&str; 2] = ["yes", "on"];
    const FALSY: [&str; 2] = ["no", "off"];
    if TRUTHY.iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSY.iter().any(|f| text.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

fn all_digits(text: &str, radix: u32) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_digit(radix))
}

/// Core-schema integer syntax, regardless of range.
pub(crate) fn is_int_literal(text: &str) -> bool {
    if let Some(octal) = text.strip_prefix("0o") {
        return all_digits(octal, 8);
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return all_digits(hex, 16);
    }
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    all_digits(unsigned, 10)
}

pub(crate) fn parse_int(text: &str) -> Option<i64> {
    if !is_int_literal(text) {
        return None;
    }
    if let Some(octal) = text.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()
    } else if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

/// Core-schema float syntax, including the special values.
pub(crate) fn is_float_literal(text: &str) -> bool {
    if text.eq_ignore_ascii_case(".nan") {
        return true;
    }
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    if unsigned.eq_ignore_ascii_case(".inf") {
        return true;
    }

    let bytes = unsigned.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };
    let int_digits = digits(&mut i);
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        frac_digits = digits(&mut i);
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    if !is_float_literal(text) {
        return None;
    }
    if text.eq_ignore_ascii_case(".nan") {
        return Some(f64::NAN);
    }
    match text.strip_prefix(['-', '+']).unwrap_or(text) {
        rest if rest.eq_ignore_ascii_case(".inf") => Some(if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }),
        _ => text.parse().ok(),
    }
}

/// Whether a plain scalar with this text would resolve to something other
/// than a string.
#[cfg_attr(not(feature = "write"), allow(dead_code))]
pub(crate) fn resolves_to_non_string(text: &str) -> bool {
    is_null(text)
        || parse_bool(text, false).is_some()
        || is_int_literal(text)
        || is_float_literal(text)
}
