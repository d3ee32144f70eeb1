use crate::{Mark, Span};
use std::fmt::{self, Debug, Display};

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

/// Error produced while reading YAML.
///
/// Every error is fatal to the current parse; once [`Reader::read`](crate::Reader::read)
/// has failed it keeps returning the same error.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The error kind
    pub kind: ErrorKind,
    /// Position in the stream where the problem was detected.
    pub mark: Mark,
    /// The bytes of the current buffer the error refers to. May be empty when
    /// the error concerns a position rather than a construct.
    pub span: Span,
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn new(kind: ErrorKind, mark: Mark, span: Span) -> Self {
        Self { kind, mark, span }
    }

    /// Shorthand for `self.kind.category()`.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

/// Broad classification of an [`ErrorKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input is not well-formed YAML.
    Syntax,
    /// The tokens are well-formed but their meaning is invalid.
    Semantic,
    /// A caller-configured limit was exceeded.
    Limit,
}

/// The specific problem an [`Error`] describes.
#[derive(Clone, PartialEq)]
pub enum ErrorKind {
    /// The buffer is larger than the maximum supported size of 4GiB.
    FileTooLarge,

    /// A character that cannot start any token was found.
    Unexpected(char),

    /// A quoted scalar was not closed before the end of the input.
    UnterminatedScalar,

    /// A document marker (`---` or `...`) appeared inside a quoted scalar.
    DocumentMarkerInScalar,

    /// An unknown escape character was found in a double-quoted scalar.
    InvalidEscape(char),

    /// A non hexadecimal digit was found in a `\x`, `\u` or `\U` escape.
    InvalidHexEscape(char),

    /// A hex escape does not name a Unicode scalar value.
    InvalidEscapeValue(u32),

    /// A tab character was used where indentation is expected.
    TabIndentation,

    /// The header of a `|` or `>` block scalar is malformed.
    InvalidBlockScalarHeader(&'static str),

    /// An anchor or alias has an empty name.
    EmptyAnchorName,

    /// A tag is malformed.
    InvalidTag(&'static str),

    /// A directive line is malformed.
    InvalidDirective(&'static str),

    /// A `-` block entry appeared where it is not allowed.
    BlockEntryNotAllowed,

    /// A `?` mapping key appeared where it is not allowed.
    MappingKeyNotAllowed,

    /// A `:` mapping value appeared where it is not allowed.
    MappingValueNotAllowed,

    /// An implicit key that must be followed by `:` was not.
    MissingMappingValue,

    /// Wanted one sort of token, but found another.
    Wanted {
        /// Expected token description.
        expected: &'static str,
        /// Found token description.
        found: &'static str,
    },

    /// A materialized value is not valid UTF-8.
    InvalidUtf8,

    /// A tag uses a handle that has not been declared with `%TAG`.
    UndefinedTagHandle(String),

    /// A `%TAG` directive redeclared a handle in the same document.
    DuplicateTagHandle(String),

    /// More `%TAG` directives than the table can hold.
    TooManyTagHandles(usize),

    /// A document carries more than one `%YAML` directive.
    DuplicateVersionDirective,

    /// A `%YAML` directive names an unsupported major version.
    UnsupportedVersion {
        /// Major version number.
        major: u32,
        /// Minor version number.
        minor: u32,
    },

    /// An alias refers to an anchor that has not been defined.
    UndefinedAlias(String),

    /// Nesting went deeper than the configured maximum.
    DepthLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// The depth that was reached.
        depth: usize,
    },
}

impl ErrorKind {
    /// Returns the broad [`ErrorCategory`] of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UndefinedTagHandle(_)
            | Self::DuplicateTagHandle(_)
            | Self::TooManyTagHandles(_)
            | Self::DuplicateVersionDirective
            | Self::UnsupportedVersion { .. }
            | Self::UndefinedAlias(_) => ErrorCategory::Semantic,
            Self::DepthLimitExceeded { .. } => ErrorCategory::Limit,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FileTooLarge => "file-too-large",
            Self::Unexpected(..) => "unexpected",
            Self::UnterminatedScalar => "unterminated-scalar",
            Self::DocumentMarkerInScalar => "document-marker-in-scalar",
            Self::InvalidEscape(..) => "invalid-escape",
            Self::InvalidHexEscape(..) => "invalid-hex-escape",
            Self::InvalidEscapeValue(..) => "invalid-escape-value",
            Self::TabIndentation => "tab-indentation",
            Self::InvalidBlockScalarHeader(..) => "invalid-block-scalar-header",
            Self::EmptyAnchorName => "empty-anchor-name",
            Self::InvalidTag(..) => "invalid-tag",
            Self::InvalidDirective(..) => "invalid-directive",
            Self::BlockEntryNotAllowed => "block-entry-not-allowed",
            Self::MappingKeyNotAllowed => "mapping-key-not-allowed",
            Self::MappingValueNotAllowed => "mapping-value-not-allowed",
            Self::MissingMappingValue => "missing-mapping-value",
            Self::Wanted { .. } => "wanted",
            Self::InvalidUtf8 => "invalid-utf8",
            Self::UndefinedTagHandle(..) => "undefined-tag-handle",
            Self::DuplicateTagHandle(..) => "duplicate-tag-handle",
            Self::TooManyTagHandles(..) => "too-many-tag-handles",
            Self::DuplicateVersionDirective => "duplicate-version-directive",
            Self::UnsupportedVersion { .. } => "unsupported-version",
            Self::UndefinedAlias(..) => "undefined-alias",
            Self::DepthLimitExceeded { .. } => "depth-limit-exceeded",
        };
        f.write_str(text)
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

struct Escape(char);

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.0.is_whitespace() || self.0.is_control() {
            for esc in self.0.escape_default() {
                f.write_char(esc)?;
            }
            Ok(())
        } else {
            f.write_char(self.0)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::FileTooLarge => f.write_str("buffer is too large (maximum 4GiB)")?,
            ErrorKind::Unexpected(c) => {
                write!(f, "found character that cannot start any token: `{}`", Escape(*c))?
            }
            ErrorKind::UnterminatedScalar => f.write_str("unterminated quoted scalar")?,
            ErrorKind::DocumentMarkerInScalar => {
                f.write_str("found document marker inside a quoted scalar")?
            }
            ErrorKind::InvalidEscape(c) => {
                write!(f, "invalid escape character in scalar: `{}`", Escape(*c))?
            }
            ErrorKind::InvalidHexEscape(c) => {
                write!(f, "invalid hex escape character in scalar: `{}`", Escape(*c))?
            }
            ErrorKind::InvalidEscapeValue(v) => write!(f, "invalid escape value: `{v:#x}`")?,
            ErrorKind::TabIndentation => {
                f.write_str("found a tab character where indentation is expected")?
            }
            ErrorKind::InvalidBlockScalarHeader(why) => {
                write!(f, "invalid block scalar header: {why}")?
            }
            ErrorKind::EmptyAnchorName => f.write_str("anchor or alias name is empty")?,
            ErrorKind::InvalidTag(why) => write!(f, "invalid tag: {why}")?,
            ErrorKind::InvalidDirective(why) => write!(f, "invalid directive: {why}")?,
            ErrorKind::BlockEntryNotAllowed => {
                f.write_str("block sequence entries are not allowed in this context")?
            }
            ErrorKind::MappingKeyNotAllowed => {
                f.write_str("mapping keys are not allowed in this context")?
            }
            ErrorKind::MappingValueNotAllowed => {
                f.write_str("mapping values are not allowed in this context")?
            }
            ErrorKind::MissingMappingValue => {
                f.write_str("could not find expected ':' after simple key")?
            }
            ErrorKind::Wanted { expected, found } => write!(f, "expected {expected}, found {found}")?,
            ErrorKind::InvalidUtf8 => f.write_str("value is not valid UTF-8")?,
            ErrorKind::UndefinedTagHandle(handle) => write!(f, "undefined tag handle `{handle}`")?,
            ErrorKind::DuplicateTagHandle(handle) => {
                write!(f, "duplicate %TAG directive for handle `{handle}`")?
            }
            ErrorKind::TooManyTagHandles(max) => {
                write!(f, "too many %TAG directives (maximum {max})")?
            }
            ErrorKind::DuplicateVersionDirective => f.write_str("duplicate %YAML directive")?,
            ErrorKind::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported YAML version {major}.{minor}")?
            }
            ErrorKind::UndefinedAlias(name) => write!(f, "alias `*{name}` refers to an undefined anchor")?,
            ErrorKind::DepthLimitExceeded { limit, depth } => {
                write!(f, "nesting depth {depth} exceeds the configured maximum of {limit}")?
            }
        }
        write!(f, " at {}", self.mark)
    }
}
