//! Token model shared by the scanner and the reader.

use crate::{Mark, Span};

/// Kind of a low-level scanner token.
///
/// These never leave the crate; the reader folds them into [`TokenType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum TokenKind {
    #[default]
    StreamStart,
    StreamEnd,
    VersionDirective,
    TagDirective,
    DocumentStart,
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    BlockEntry,
    FlowEntry,
    Key,
    Value,
    Alias,
    Anchor,
    Tag,
    Scalar,
}

impl TokenKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::StreamStart => "stream start",
            Self::StreamEnd => "end of stream",
            Self::VersionDirective => "a %YAML directive",
            Self::TagDirective => "a %TAG directive",
            Self::DocumentStart => "a document start marker",
            Self::DocumentEnd => "a document end marker",
            Self::BlockSequenceStart => "a block sequence",
            Self::BlockMappingStart => "a block mapping",
            Self::BlockEnd => "the end of a block collection",
            Self::FlowSequenceStart => "a left bracket",
            Self::FlowSequenceEnd => "a right bracket",
            Self::FlowMappingStart => "a left brace",
            Self::FlowMappingEnd => "a right brace",
            Self::BlockEntry => "a block entry",
            Self::FlowEntry => "a comma",
            Self::Key => "a mapping key",
            Self::Value => "a colon",
            Self::Alias => "an alias",
            Self::Anchor => "an anchor",
            Self::Tag => "a tag",
            Self::Scalar => "a scalar",
        }
    }
}

/// Presentation style of a scalar in the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    /// Unquoted.
    #[default]
    Plain,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
}

/// Trailing line-break handling of a block scalar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Chomping {
    /// Keep a single trailing line break (no indicator).
    #[default]
    Clip,
    /// Drop all trailing line breaks (`-`).
    Strip,
    /// Keep every trailing line break (`+`).
    Keep,
}

/// Header data of a block scalar, needed to decode its content lazily.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) struct BlockHeader {
    /// Column every content line is indented to.
    pub indent: u32,
    pub chomping: Chomping,
}

/// One lexical unit. Holds views into the source buffer, never the bytes.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub style: ScalarStyle,
    /// Scalar content, anchor/alias name, tag handle, directive name value.
    pub span: Span,
    /// Tag suffix, `%TAG` prefix.
    pub extra: Span,
    pub block: BlockHeader,
    pub start: Mark,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, start: Mark) -> Self {
        Token {
            kind,
            start,
            ..Token::default()
        }
    }
}

/// The kind of token the [`Reader`](crate::Reader) is positioned on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TokenType {
    /// No token has been read yet.
    #[default]
    None,
    /// An explicit `---` marker.
    DocumentStart,
    /// An explicit `...` marker.
    DocumentEnd,
    /// Start of a block or flow mapping.
    MappingStart,
    /// End of a mapping.
    MappingEnd,
    /// Start of a block or flow sequence.
    SequenceStart,
    /// End of a sequence.
    SequenceEnd,
    /// A scalar, including the empty scalar of an omitted node.
    Scalar,
    /// `*name`
    Alias,
    /// `&name`, decorating the next node.
    Anchor,
    /// A tag, decorating the next node.
    Tag,
}

impl TokenType {
    /// Returns `true` for [`MappingStart`](Self::MappingStart) and
    /// [`SequenceStart`](Self::SequenceStart).
    #[inline]
    pub fn is_collection_start(self) -> bool {
        matches!(self, Self::MappingStart | Self::SequenceStart)
    }

    /// Returns `true` for [`MappingEnd`](Self::MappingEnd) and
    /// [`SequenceEnd`](Self::SequenceEnd).
    #[inline]
    pub fn is_collection_end(self) -> bool {
        matches!(self, Self::MappingEnd | Self::SequenceEnd)
    }
}

/// Layout of a collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollectionStyle {
    /// Indentation based.
    #[default]
    Block,
    /// `{...}` or `[...]`.
    Flow,
}
