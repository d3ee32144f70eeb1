//! Pull reader turning scanner tokens into the public token stream.

use crate::error::{Error, ErrorKind};
use crate::scalar::{self, ScalarValue};
use crate::scanner::{ParseError, Scanner, ScannerState};
use crate::tags::{TagHandles, decode_uri};
use crate::token::{CollectionStyle, ScalarStyle, Token, TokenKind, TokenType};
use crate::{Mark, Span};
use foldhash::HashSet;
use std::borrow::Cow;

#[cfg(test)]
#[path = "./reader_tests.rs"]
mod tests;

/// Largest buffer a single [`Reader`] accepts; spans are 32-bit.
const MAX_BUFFER_SIZE: usize = u32::MAX as usize;

/// Configuration for a [`Reader`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderOptions {
    /// Deepest collection nesting accepted before reporting
    /// [`ErrorKind::DepthLimitExceeded`].
    pub max_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions { max_depth: 64 }
    }
}

/// Coarse position of a reader in the YAML grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParserState {
    /// Nothing has been read.
    Initial,
    /// Between documents.
    InStream,
    /// Inside a document, outside any collection.
    InDocument,
    /// Inside a block collection.
    InBlockContent,
    /// Inside a flow collection.
    InFlowContent,
    /// The end of the stream was reached.
    Finished,
}

/// Node property already seen for the node being parsed.
const HAS_ANCHOR: u8 = 1;
const HAS_TAG: u8 = 2;

/// Grammar position. Every state decides on a single token so that running
/// out of input never leaves a half-applied transition behind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum State {
    StreamStart,
    /// `bare` allows a document without `---`.
    DocumentStart { bare: bool },
    DocumentDirectives,
    DocumentContent,
    DocumentEnd,
    Node { block: bool, indentless: bool, props: u8 },
    BlockSequenceEntry,
    BlockSequenceAfterEntry,
    IndentlessSequenceEntry,
    IndentlessSequenceAfterEntry,
    BlockMappingKey,
    BlockMappingAfterKey,
    BlockMappingValue,
    BlockMappingAfterValue,
    FlowSequenceEntry { first: bool },
    FlowSequencePairKey,
    FlowSequencePairValue,
    FlowSequencePairAfterValue,
    FlowSequencePairEnd,
    FlowMappingKey { first: bool },
    FlowMappingAfterKey,
    FlowMappingValue,
    FlowMappingAfterValue,
    FlowMappingEmptyValue,
    End,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Frame {
    mapping: bool,
    style: CollectionStyle,
    expecting_key: bool,
    /// The collection itself is a mapping key.
    is_key: bool,
    /// The collection's anchor is on top of `defining`.
    anchored: bool,
}

/// Everything needed to resume reading in a new buffer.
///
/// Obtained from [`Reader::state`] after [`Reader::read`] returned
/// `Ok(false)` on a non-final block, and handed to [`Reader::with_state`]
/// together with the next block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderState {
    options: ReaderOptions,
    scanner: ScannerState,
    state: State,
    states: Vec<State>,
    frames: Vec<Frame>,
    tags: TagHandles,
    anchors: HashSet<String>,
    defining: Vec<String>,
    pending_anchor: Option<String>,
    version_seen: bool,
}

impl ReaderState {
    /// State of a reader that has not consumed anything yet.
    pub fn new(options: ReaderOptions) -> Self {
        ReaderState {
            options,
            scanner: ScannerState::default(),
            state: State::StreamStart,
            states: Vec::new(),
            frames: Vec::new(),
            tags: TagHandles::default(),
            anchors: HashSet::default(),
            defining: Vec::new(),
            pending_anchor: None,
            version_seen: false,
        }
    }

    /// Current collection nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Stream position the next block starts at.
    pub fn position(&self) -> Mark {
        self.scanner.mark
    }

    /// Coarse grammar position.
    pub fn parser_state(&self) -> ParserState {
        parser_state(self.state, &self.frames)
    }
}

impl Default for ReaderState {
    fn default() -> Self {
        ReaderState::new(ReaderOptions::default())
    }
}

fn parser_state(state: State, frames: &[Frame]) -> ParserState {
    match state {
        State::StreamStart => ParserState::Initial,
        State::DocumentStart { .. } | State::DocumentDirectives => ParserState::InStream,
        State::End => ParserState::Finished,
        _ => match frames.last() {
            None => ParserState::InDocument,
            Some(frame) if frame.style == CollectionStyle::Flow => ParserState::InFlowContent,
            Some(_) => ParserState::InBlockContent,
        },
    }
}

/// Forward-only YAML reader over a borrowed buffer.
///
/// Call [`read`](Self::read) to advance, then inspect the current token with
/// [`token_type`](Self::token_type) and the accessors. Scalar content is only
/// decoded when asked for.
///
/// ```
/// use yaml_spanner::{Reader, TokenType};
///
/// let mut reader = Reader::new(b"name: Jane\nage: 42\n", Default::default());
/// let mut keys = Vec::new();
/// while reader.read()? {
///     if reader.token_type() == TokenType::Scalar && reader.is_mapping_key() {
///         keys.push(reader.get_string()?.into_owned());
///     }
/// }
/// assert_eq!(keys, ["name", "age"]);
/// # Ok::<(), yaml_spanner::Error>(())
/// ```
pub struct Reader<'a> {
    scanner: Scanner<'a>,
    options: ReaderOptions,
    state: State,
    states: Vec<State>,
    frames: Vec<Frame>,
    tags: TagHandles,
    /// Anchors defined so far in the current document.
    anchors: HashSet<String>,
    /// Anchors of collections that are still open. Aliases cannot refer to
    /// them yet.
    defining: Vec<String>,
    /// Anchor read for the node that comes next.
    pending_anchor: Option<String>,
    version_seen: bool,

    token_type: TokenType,
    current: Token,
    is_key: bool,
    token_depth: usize,
    collection_style: CollectionStyle,
    error: Option<Error>,
}

impl<'a> Reader<'a> {
    /// Creates a reader over a complete YAML stream.
    pub fn new(bytes: &'a [u8], options: ReaderOptions) -> Self {
        Reader::with_state(bytes, true, ReaderState::new(options))
    }

    /// Resumes reading with the next block of a chunked stream.
    ///
    /// With `is_final_block` unset, [`read`](Self::read) returns `Ok(false)`
    /// when `bytes` is exhausted instead of ending the stream. Blocks must be
    /// split at line boundaries outside of scalars.
    pub fn with_state(bytes: &'a [u8], is_final_block: bool, state: ReaderState) -> Self {
        Reader {
            scanner: Scanner::new(bytes, is_final_block, state.scanner),
            options: state.options,
            state: state.state,
            states: state.states,
            frames: state.frames,
            tags: state.tags,
            anchors: state.anchors,
            defining: state.defining,
            pending_anchor: state.pending_anchor,
            version_seen: state.version_seen,
            token_type: TokenType::None,
            current: Token::default(),
            is_key: false,
            token_depth: 0,
            collection_style: CollectionStyle::Block,
            error: None,
        }
    }

    /// Captures the state needed to continue with the next block.
    pub fn state(&self) -> ReaderState {
        ReaderState {
            options: self.options.clone(),
            scanner: self.scanner.snapshot(),
            state: self.state,
            states: self.states.clone(),
            frames: self.frames.clone(),
            tags: self.tags.clone(),
            anchors: self.anchors.clone(),
            defining: self.defining.clone(),
            pending_anchor: self.pending_anchor.clone(),
            version_seen: self.version_seen,
        }
    }

    /// Advances to the next token.
    ///
    /// Returns `Ok(false)` at the end of the stream, or when a non-final
    /// block has been fully consumed. Errors are fatal: every later call
    /// returns the same error.
    pub fn read(&mut self) -> Result<bool, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.scanner.bytes().len() > MAX_BUFFER_SIZE {
            let err = Error::new(ErrorKind::FileTooLarge, self.scanner.mark(), Span::default());
            self.error = Some(err.clone());
            return Err(err);
        }
        match self.step() {
            Ok(true) => {
                tracing::trace!(
                    token = ?self.token_type,
                    depth = self.token_depth,
                    line = self.current.start.line,
                    "read token"
                );
                Ok(true)
            }
            Ok(false) => {
                self.token_type = TokenType::None;
                Ok(false)
            }
            Err(ParseError) => {
                let err = self.scanner.take_error();
                self.scanner.abandon();
                self.token_type = TokenType::None;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Kind of the current token.
    #[inline]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Whether the current node (or the property decorating it) is a mapping
    /// key. For an end token, whether the closed collection was a key.
    #[inline]
    pub fn is_mapping_key(&self) -> bool {
        self.is_key
    }

    /// Number of collections currently open.
    #[inline]
    pub fn current_depth(&self) -> usize {
        self.frames.len()
    }

    /// Depth of the current token: the depth outside the collection for
    /// start and end tokens.
    #[inline]
    pub fn token_depth(&self) -> usize {
        self.token_depth
    }

    /// Position the scanner has reached.
    #[inline]
    pub fn position(&self) -> Mark {
        self.scanner.mark()
    }

    /// Where the current token starts.
    #[inline]
    pub fn token_start(&self) -> Mark {
        self.current.start
    }

    /// Coarse grammar position.
    pub fn parser_state(&self) -> ParserState {
        parser_state(self.state, &self.frames)
    }

    /// Style of the current scalar.
    pub fn scalar_style(&self) -> Option<ScalarStyle> {
        (self.token_type == TokenType::Scalar).then_some(self.current.style)
    }

    /// Style of the current collection start or end.
    pub fn collection_style(&self) -> Option<CollectionStyle> {
        (self.token_type.is_collection_start() || self.token_type.is_collection_end())
            .then_some(self.collection_style)
    }

    /// Byte range of the current value within this buffer: scalar content
    /// without quotes or block header, anchor or alias name, raw tag.
    pub fn span(&self) -> Span {
        let token = &self.current;
        match self.token_type {
            TokenType::Tag if token.span.is_empty() => token.extra,
            TokenType::Tag => Span::new(token.span.start, token.extra.end),
            _ => token.span,
        }
    }

    /// Raw, undecoded bytes of the current value.
    pub fn value_span(&self) -> &'a [u8] {
        self.span().slice(self.scanner.bytes())
    }

    /// Materialises the current scalar, anchor, alias or tag.
    ///
    /// Scalars are decoded (escapes, folding, chomping). Tags are resolved
    /// against the document's `%TAG` handles.
    ///
    /// # Panics
    ///
    /// When the current token carries no value.
    pub fn get_string(&self) -> Result<Cow<'a, str>, Error> {
        let bytes = self.scanner.bytes();
        let token = &self.current;
        match self.token_type {
            TokenType::Scalar => scalar::decode(token.span.slice(bytes), token.style, token.block)
                .map_err(|kind| self.value_error(kind)),
            TokenType::Alias | TokenType::Anchor => self.utf8(token.span).map(Cow::Borrowed),
            TokenType::Tag => self.resolve_tag(),
            other => panic!("get_string called on a {other:?} token"),
        }
    }

    /// `true` for a plain `null`, `~` or empty scalar.
    pub fn is_null(&self) -> bool {
        self.token_type == TokenType::Scalar
            && self.current.style == ScalarStyle::Plain
            && self.get_string().is_ok_and(|s| scalar::is_null(&s))
    }

    /// Interprets the current scalar through the core schema. Only plain
    /// scalars resolve to something other than a string.
    ///
    /// # Panics
    ///
    /// When the current token is not a scalar.
    pub fn resolve(&self) -> Result<ScalarValue<'a>, Error> {
        assert!(
            self.token_type == TokenType::Scalar,
            "resolve called on a {:?} token",
            self.token_type
        );
        let value = self.get_string()?;
        if self.current.style == ScalarStyle::Plain {
            Ok(ScalarValue::resolve_plain(value))
        } else {
            Ok(ScalarValue::String(value))
        }
    }

    fn scalar_text(&self) -> Option<Cow<'a, str>> {
        if self.token_type != TokenType::Scalar {
            return None;
        }
        self.get_string().ok()
    }

    /// The current scalar as an `i32`, if it is an integer in range.
    pub fn try_get_i32(&self) -> Option<i32> {
        self.try_get_i64().and_then(|v| v.try_into().ok())
    }

    /// The current scalar as an `i64`, if it is a core-schema integer.
    pub fn try_get_i64(&self) -> Option<i64> {
        scalar::parse_int(&self.scalar_text()?)
    }

    /// The current scalar as an `f64`; integers are accepted.
    pub fn try_get_f64(&self) -> Option<f64> {
        let text = self.scalar_text()?;
        scalar::parse_float(&text).or_else(|| scalar::parse_int(&text).map(|v| v as f64))
    }

    /// The current scalar as a boolean. Besides `true`/`false` this accepts
    /// `yes`, `no`, `on` and `off`.
    pub fn try_get_bool(&self) -> Option<bool> {
        scalar::parse_bool(&self.scalar_text()?, true)
    }

    /// Skips the current node. For a collection start everything up to and
    /// including the matching end is consumed; for an anchor or tag the node
    /// it decorates is skipped.
    pub fn skip(&mut self) -> Result<(), Error> {
        while matches!(self.token_type, TokenType::Anchor | TokenType::Tag) {
            if !self.read()? {
                return Ok(());
            }
        }
        if !self.token_type.is_collection_start() {
            return Ok(());
        }
        let depth = self.token_depth;
        while self.read()? {
            if self.token_type.is_collection_end() && self.token_depth == depth {
                break;
            }
        }
        Ok(())
    }

    fn utf8(&self, span: Span) -> Result<&'a str, Error> {
        std::str::from_utf8(span.slice(self.scanner.bytes()))
            .map_err(|_| self.value_error(ErrorKind::InvalidUtf8))
    }

    fn value_error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.current.start, self.span())
    }

    fn resolve_tag(&self) -> Result<Cow<'a, str>, Error> {
        let handle = self.utf8(self.current.span)?;
        let suffix = decode_uri(self.utf8(self.current.extra)?);
        if handle.is_empty() {
            return Ok(suffix);
        }
        let Some(prefix) = self.tags.resolve(handle) else {
            return Err(self.value_error(ErrorKind::UndefinedTagHandle(handle.to_string())));
        };
        let mut tag = String::with_capacity(prefix.len() + suffix.len());
        tag.push_str(prefix);
        tag.push_str(&suffix);
        Ok(Cow::Owned(tag))
    }

    // -- state machine ------------------------------------------------------

    fn fail(&mut self, kind: ErrorKind, token: &Token) -> ParseError {
        self.scanner.fail(kind, token.start, token.span)
    }

    fn unexpected(&mut self, expected: &'static str, token: &Token) -> ParseError {
        let found = token.kind.describe();
        self.fail(ErrorKind::Wanted { expected, found }, token)
    }

    fn pop_state(&mut self) -> State {
        match self.states.pop() {
            Some(state) => state,
            None => unreachable!("parser state stack underflow"),
        }
    }

    fn node_is_key(&self) -> bool {
        matches!(self.frames.last(), Some(frame) if frame.mapping && frame.expecting_key)
    }

    fn complete_node(&mut self) {
        if let Some(frame) = self.frames.last_mut()
            && frame.mapping
        {
            frame.expecting_key = !frame.expecting_key;
        }
    }

    fn produce(&mut self, token_type: TokenType, token: Token) -> bool {
        self.token_type = token_type;
        self.current = token;
        self.token_depth = self.frames.len();
        self.is_key = match token_type {
            TokenType::DocumentStart | TokenType::DocumentEnd => false,
            _ => self.node_is_key(),
        };
        if matches!(token_type, TokenType::Scalar | TokenType::Alias) {
            if let Some(name) = self.pending_anchor.take() {
                self.anchors.insert(name);
            }
            self.complete_node();
        }
        true
    }

    fn empty_scalar(&mut self, at: Mark) -> bool {
        let offset = self.scanner.buffer_offset(at);
        let mut token = Token::new(TokenKind::Scalar, at);
        token.span = Span::new(offset, offset);
        self.produce(TokenType::Scalar, token)
    }

    fn open(
        &mut self,
        token: Token,
        mapping: bool,
        style: CollectionStyle,
    ) -> Result<bool, ParseError> {
        let depth = self.frames.len() + 1;
        if depth > self.options.max_depth {
            let limit = self.options.max_depth;
            return Err(self.fail(ErrorKind::DepthLimitExceeded { limit, depth }, &token));
        }
        let token_type = if mapping {
            TokenType::MappingStart
        } else {
            TokenType::SequenceStart
        };
        self.produce(token_type, token);
        self.collection_style = style;
        let anchor = self.pending_anchor.take();
        let anchored = anchor.is_some();
        self.defining.extend(anchor);
        self.frames.push(Frame {
            mapping,
            style,
            expecting_key: true,
            is_key: self.is_key,
            anchored,
        });
        Ok(true)
    }

    fn close(&mut self, token: Token) -> bool {
        let Some(frame) = self.frames.pop() else {
            unreachable!("collection end without an open collection")
        };
        if frame.anchored
            && let Some(name) = self.defining.pop()
        {
            self.anchors.insert(name);
        }
        self.token_type = if frame.mapping {
            TokenType::MappingEnd
        } else {
            TokenType::SequenceEnd
        };
        self.current = token;
        self.token_depth = self.frames.len();
        self.is_key = frame.is_key;
        self.collection_style = frame.style;
        self.complete_node();
        true
    }

    fn end_document(&mut self) {
        tracing::debug!(line = self.scanner.mark().line, "document end");
        self.tags.clear();
        self.anchors.clear();
        self.defining.clear();
        self.pending_anchor = None;
        self.version_seen = false;
    }

    fn directive(&mut self, token: Token) -> Result<(), ParseError> {
        let text = token.span.slice(self.scanner.bytes());
        let text = std::str::from_utf8(text).unwrap_or_default();
        if token.kind == TokenKind::VersionDirective {
            if self.version_seen {
                return Err(self.fail(ErrorKind::DuplicateVersionDirective, &token));
            }
            let (major, minor) = text.split_once('.').unwrap_or((text, "0"));
            let major = major.parse().unwrap_or(u32::MAX);
            let minor = minor.parse().unwrap_or(u32::MAX);
            if major != 1 {
                return Err(self.fail(ErrorKind::UnsupportedVersion { major, minor }, &token));
            }
            tracing::debug!(major, minor, "%YAML directive");
            self.version_seen = true;
        } else {
            let prefix = token.extra.slice(self.scanner.bytes());
            let prefix = std::str::from_utf8(prefix).unwrap_or_default();
            if let Err(kind) = self.tags.declare(text, prefix) {
                return Err(self.fail(kind, &token));
            }
            tracing::debug!(handle = text, prefix, "%TAG directive");
        }
        Ok(())
    }

    fn step(&mut self) -> Result<bool, ParseError> {
        loop {
            match self.state {
                State::End => return Ok(false),
                State::FlowSequencePairEnd => {
                    self.state = State::FlowSequenceEntry { first: false };
                    let token = Token::new(TokenKind::FlowMappingEnd, self.scanner.mark());
                    return Ok(self.close(token));
                }
                State::FlowMappingEmptyValue => {
                    self.state = State::FlowMappingKey { first: false };
                    return Ok(self.empty_scalar(self.scanner.mark()));
                }
                _ => {}
            }

            let Some(token) = self.scanner.peek()? else {
                return Ok(false);
            };
            let kind = token.kind;

            match self.state {
                State::StreamStart => {
                    if kind != TokenKind::StreamStart {
                        return Err(self.unexpected("stream start", &token));
                    }
                    self.scanner.consume();
                    self.state = State::DocumentStart { bare: true };
                }

                State::DocumentStart { bare } => match kind {
                    TokenKind::DocumentEnd => {
                        self.scanner.consume();
                        self.state = State::DocumentStart { bare: true };
                    }
                    TokenKind::StreamEnd => {
                        self.scanner.consume();
                        self.state = State::End;
                        tracing::debug!("stream end");
                        return Ok(false);
                    }
                    TokenKind::VersionDirective | TokenKind::TagDirective => {
                        self.scanner.consume();
                        self.directive(token)?;
                        self.state = State::DocumentDirectives;
                    }
                    TokenKind::DocumentStart => return Ok(self.start_document(token)),
                    _ if bare => {
                        tracing::debug!(line = token.start.line, "bare document start");
                        self.states.push(State::DocumentEnd);
                        self.state = State::Node {
                            block: true,
                            indentless: false,
                            props: 0,
                        };
                    }
                    _ => return Err(self.unexpected("a document start marker", &token)),
                },

                State::DocumentDirectives => match kind {
                    TokenKind::VersionDirective | TokenKind::TagDirective => {
                        self.scanner.consume();
                        self.directive(token)?;
                    }
                    TokenKind::DocumentStart => return Ok(self.start_document(token)),
                    _ => return Err(self.unexpected("a document start marker", &token)),
                },

                State::DocumentContent => match kind {
                    TokenKind::VersionDirective
                    | TokenKind::TagDirective
                    | TokenKind::DocumentStart
                    | TokenKind::DocumentEnd
                    | TokenKind::StreamEnd => {
                        self.state = self.pop_state();
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => {
                        self.state = State::Node {
                            block: true,
                            indentless: false,
                            props: 0,
                        };
                    }
                },

                State::DocumentEnd => {
                    self.end_document();
                    if kind == TokenKind::DocumentEnd {
                        self.scanner.consume();
                        self.state = State::DocumentStart { bare: true };
                        return Ok(self.produce(TokenType::DocumentEnd, token));
                    }
                    self.state = State::DocumentStart { bare: false };
                }

                State::Node {
                    block,
                    indentless,
                    props,
                } => return self.node(token, block, indentless, props),

                State::BlockSequenceEntry => match kind {
                    TokenKind::BlockEntry => {
                        self.scanner.consume();
                        self.state = State::BlockSequenceAfterEntry;
                    }
                    TokenKind::BlockEnd => {
                        self.scanner.consume();
                        self.state = self.pop_state();
                        return Ok(self.close(token));
                    }
                    _ => return Err(self.unexpected("a block sequence entry", &token)),
                },

                State::BlockSequenceAfterEntry => match kind {
                    TokenKind::BlockEntry | TokenKind::BlockEnd => {
                        self.state = State::BlockSequenceEntry;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::BlockSequenceEntry, true, false),
                },

                State::IndentlessSequenceEntry => {
                    if kind == TokenKind::BlockEntry {
                        self.scanner.consume();
                        self.state = State::IndentlessSequenceAfterEntry;
                    } else {
                        self.state = self.pop_state();
                        return Ok(self.close(Token::new(TokenKind::BlockEnd, token.start)));
                    }
                }

                State::IndentlessSequenceAfterEntry => match kind {
                    TokenKind::BlockEntry
                    | TokenKind::Key
                    | TokenKind::Value
                    | TokenKind::BlockEnd => {
                        self.state = State::IndentlessSequenceEntry;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::IndentlessSequenceEntry, true, false),
                },

                State::BlockMappingKey => match kind {
                    TokenKind::Key => {
                        self.scanner.consume();
                        self.state = State::BlockMappingAfterKey;
                    }
                    TokenKind::Value => {
                        self.state = State::BlockMappingValue;
                        return Ok(self.empty_scalar(token.start));
                    }
                    TokenKind::BlockEnd => {
                        self.scanner.consume();
                        self.state = self.pop_state();
                        return Ok(self.close(token));
                    }
                    _ => return Err(self.unexpected("a mapping key", &token)),
                },

                State::BlockMappingAfterKey => match kind {
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd => {
                        self.state = State::BlockMappingValue;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::BlockMappingValue, true, true),
                },

                State::BlockMappingValue => {
                    if kind == TokenKind::Value {
                        self.scanner.consume();
                        self.state = State::BlockMappingAfterValue;
                    } else {
                        self.state = State::BlockMappingKey;
                        return Ok(self.empty_scalar(token.start));
                    }
                }

                State::BlockMappingAfterValue => match kind {
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd => {
                        self.state = State::BlockMappingKey;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::BlockMappingKey, true, true),
                },

                State::FlowSequenceEntry { first } => match kind {
                    TokenKind::FlowSequenceEnd => {
                        self.scanner.consume();
                        self.state = self.pop_state();
                        return Ok(self.close(token));
                    }
                    TokenKind::FlowEntry if !first => {
                        self.scanner.consume();
                        self.state = State::FlowSequenceEntry { first: true };
                    }
                    _ if !first => return Err(self.unexpected("',' or ']'", &token)),
                    TokenKind::Key => {
                        self.scanner.consume();
                        self.state = State::FlowSequencePairKey;
                        return self.open(token, true, CollectionStyle::Flow);
                    }
                    _ => self.push_node(State::FlowSequenceEntry { first: false }, false, false),
                },

                State::FlowSequencePairKey => match kind {
                    TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowSequenceEnd => {
                        self.state = State::FlowSequencePairValue;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::FlowSequencePairValue, false, false),
                },

                State::FlowSequencePairValue => {
                    if kind == TokenKind::Value {
                        self.scanner.consume();
                        self.state = State::FlowSequencePairAfterValue;
                    } else {
                        self.state = State::FlowSequencePairEnd;
                        return Ok(self.empty_scalar(token.start));
                    }
                }

                State::FlowSequencePairAfterValue => match kind {
                    TokenKind::FlowEntry | TokenKind::FlowSequenceEnd => {
                        self.state = State::FlowSequencePairEnd;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::FlowSequencePairEnd, false, false),
                },

                State::FlowMappingKey { first } => match kind {
                    TokenKind::FlowMappingEnd => {
                        self.scanner.consume();
                        self.state = self.pop_state();
                        return Ok(self.close(token));
                    }
                    TokenKind::FlowEntry if !first => {
                        self.scanner.consume();
                        self.state = State::FlowMappingKey { first: true };
                    }
                    _ if !first => return Err(self.unexpected("',' or '}'", &token)),
                    TokenKind::Key => {
                        self.scanner.consume();
                        self.state = State::FlowMappingAfterKey;
                    }
                    _ => self.push_node(State::FlowMappingEmptyValue, false, false),
                },

                State::FlowMappingAfterKey => match kind {
                    TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowMappingEnd => {
                        self.state = State::FlowMappingValue;
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::FlowMappingValue, false, false),
                },

                State::FlowMappingValue => {
                    if kind == TokenKind::Value {
                        self.scanner.consume();
                        self.state = State::FlowMappingAfterValue;
                    } else {
                        self.state = State::FlowMappingKey { first: false };
                        return Ok(self.empty_scalar(token.start));
                    }
                }

                State::FlowMappingAfterValue => match kind {
                    TokenKind::FlowEntry | TokenKind::FlowMappingEnd => {
                        self.state = State::FlowMappingKey { first: false };
                        return Ok(self.empty_scalar(token.start));
                    }
                    _ => self.push_node(State::FlowMappingKey { first: false }, false, false),
                },

                State::End | State::FlowSequencePairEnd | State::FlowMappingEmptyValue => {
                    unreachable!("handled before peeking")
                }
            }
        }
    }

    fn start_document(&mut self, token: Token) -> bool {
        tracing::debug!(line = token.start.line, "document start");
        self.scanner.consume();
        self.states.push(State::DocumentEnd);
        self.state = State::DocumentContent;
        self.produce(TokenType::DocumentStart, token)
    }

    fn push_node(&mut self, resume: State, block: bool, indentless: bool) {
        self.states.push(resume);
        self.state = State::Node {
            block,
            indentless,
            props: 0,
        };
    }

    fn node(
        &mut self,
        token: Token,
        block: bool,
        indentless: bool,
        props: u8,
    ) -> Result<bool, ParseError> {
        let bytes = self.scanner.bytes();
        match token.kind {
            TokenKind::Alias if props == 0 => {
                self.scanner.consume();
                let name = String::from_utf8_lossy(token.span.slice(bytes));
                if !self.anchors.contains(&*name) {
                    let name = name.into_owned();
                    return Err(self.fail(ErrorKind::UndefinedAlias(name), &token));
                }
                self.state = self.pop_state();
                Ok(self.produce(TokenType::Alias, token))
            }
            TokenKind::Anchor if props & HAS_ANCHOR == 0 => {
                self.scanner.consume();
                let name = String::from_utf8_lossy(token.span.slice(bytes));
                self.pending_anchor = Some(name.into_owned());
                self.state = State::Node {
                    block,
                    indentless,
                    props: props | HAS_ANCHOR,
                };
                Ok(self.produce(TokenType::Anchor, token))
            }
            TokenKind::Tag if props & HAS_TAG == 0 => {
                self.scanner.consume();
                let handle = String::from_utf8_lossy(token.span.slice(bytes));
                if !handle.is_empty() && self.tags.resolve(&handle).is_none() {
                    let handle = handle.into_owned();
                    return Err(self.fail(ErrorKind::UndefinedTagHandle(handle), &token));
                }
                self.state = State::Node {
                    block,
                    indentless,
                    props: props | HAS_TAG,
                };
                Ok(self.produce(TokenType::Tag, token))
            }
            TokenKind::BlockEntry if indentless => {
                self.state = State::IndentlessSequenceEntry;
                self.open(token, false, CollectionStyle::Block)
            }
            TokenKind::Scalar => {
                self.scanner.consume();
                self.state = self.pop_state();
                Ok(self.produce(TokenType::Scalar, token))
            }
            TokenKind::FlowSequenceStart => {
                self.scanner.consume();
                self.state = State::FlowSequenceEntry { first: true };
                self.open(token, false, CollectionStyle::Flow)
            }
            TokenKind::FlowMappingStart => {
                self.scanner.consume();
                self.state = State::FlowMappingKey { first: true };
                self.open(token, true, CollectionStyle::Flow)
            }
            TokenKind::BlockSequenceStart if block => {
                self.scanner.consume();
                self.state = State::BlockSequenceEntry;
                self.open(token, false, CollectionStyle::Block)
            }
            TokenKind::BlockMappingStart if block => {
                self.scanner.consume();
                self.state = State::BlockMappingKey;
                self.open(token, true, CollectionStyle::Block)
            }
            _ if props != 0 => {
                self.state = self.pop_state();
                Ok(self.empty_scalar(token.start))
            }
            _ => Err(self.unexpected("node content", &token)),
        }
    }
}
