//! Document-scoped `%TAG` handle registry.

use crate::ErrorKind;
use std::borrow::Cow;

#[cfg(test)]
#[path = "./tags_tests.rs"]
mod tests;

/// Most `%TAG` directives a single document may declare.
pub const MAX_TAG_HANDLES: usize = 16;

/// Prefix the `!!` handle expands to unless redeclared.
pub const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

/// Handles are owned so the table survives a chunk boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct TagHandles {
    entries: Vec<(String, String)>,
}

impl TagHandles {
    pub(crate) fn declare(&mut self, handle: &str, prefix: &str) -> Result<(), ErrorKind> {
        if self.entries.iter().any(|(h, _)| h == handle) {
            return Err(ErrorKind::DuplicateTagHandle(handle.to_string()));
        }
        if self.entries.len() == MAX_TAG_HANDLES {
            return Err(ErrorKind::TooManyTagHandles(MAX_TAG_HANDLES));
        }
        self.entries.push((handle.to_string(), prefix.to_string()));
        Ok(())
    }

    /// Looks up a handle, falling back to the two default handles.
    pub(crate) fn resolve(&self, handle: &str) -> Option<&str> {
        for (h, prefix) in &self.entries {
            if h == handle {
                return Some(prefix);
            }
        }
        match handle {
            "!" => Some("!"),
            "!!" => Some(CORE_SCHEMA_PREFIX),
            _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decodes `%XX` escapes in a tag URI. Malformed escapes are kept verbatim;
/// the scanner has already rejected them.
pub(crate) fn decode_uri(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(s) => Cow::Owned(s),
        Err(_) => Cow::Borrowed(raw),
    }
}

pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
