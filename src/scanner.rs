// The scanner stores the full error in `Scanner::error` and hands the
// zero-sized `ParseError` up the stack, so `?` never builds an `Error` on the
// hot path.

use crate::error::{Error, ErrorKind};
use crate::queue::TokenQueue;
use crate::simple_key::{SimpleKey, SimpleKeyStack};
use crate::tags::hex_value;
use crate::token::{BlockHeader, Chomping, ScalarStyle, Token, TokenKind};
use crate::{Mark, Span};

#[cfg(test)]
#[path = "./scanner_tests.rs"]
mod tests;

/// Marker for "an error has been recorded in `Scanner::error`".
#[derive(Copy, Clone, Debug)]
pub(crate) struct ParseError;

/// Continuation state of a scanner at a chunk boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct ScannerState {
    pub mark: Mark,
    pub indent: isize,
    pub indents: Vec<isize>,
    pub flow_level: usize,
    pub simple_key_allowed: bool,
    pub stream_start_produced: bool,
    pub stream_end_fetched: bool,
    pub tokens_consumed: usize,
}

impl Default for ScannerState {
    fn default() -> Self {
        ScannerState {
            mark: Mark::default(),
            indent: -1,
            indents: Vec::new(),
            flow_level: 0,
            simple_key_allowed: false,
            stream_start_produced: false,
            stream_end_fetched: false,
            tokens_consumed: 0,
        }
    }
}

pub(crate) struct Scanner<'a> {
    bytes: &'a [u8],
    cursor: usize,
    /// Stream offset of `bytes[0]`.
    base: usize,
    line: usize,
    column: usize,
    is_final: bool,
    /// The buffer ran out in a non-final block.
    suspended: bool,

    tokens: TokenQueue,
    simple_keys: SimpleKeyStack,
    simple_key_allowed: bool,
    stream_start_produced: bool,
    stream_end_fetched: bool,

    /// Indentation column of the innermost block collection, -1 at the root.
    indent: isize,
    indents: Vec<isize>,
    flow_level: usize,

    error: Option<Error>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(bytes: &'a [u8], is_final: bool, state: ScannerState) -> Self {
        let mut simple_keys = SimpleKeyStack::new();
        if state.stream_start_produced {
            for level in 0..=state.flow_level {
                simple_keys.push(SimpleKey {
                    flow_level: level,
                    ..SimpleKey::default()
                });
            }
        }
        Scanner {
            bytes,
            cursor: 0,
            base: state.mark.offset,
            line: state.mark.line,
            column: state.mark.column,
            is_final,
            suspended: false,
            tokens: TokenQueue::new(state.tokens_consumed),
            simple_keys,
            simple_key_allowed: state.simple_key_allowed,
            stream_start_produced: state.stream_start_produced,
            stream_end_fetched: state.stream_end_fetched,
            indent: state.indent,
            indents: state.indents,
            flow_level: state.flow_level,
            error: None,
        }
    }

    /// Captures the continuation state. Only meaningful once the queue has
    /// drained at a suspension point.
    pub(crate) fn snapshot(&self) -> ScannerState {
        ScannerState {
            mark: self.mark(),
            indent: self.indent,
            indents: self.indents.clone(),
            flow_level: self.flow_level,
            simple_key_allowed: self.simple_key_allowed,
            stream_start_produced: self.stream_start_produced,
            stream_end_fetched: self.stream_end_fetched,
            tokens_consumed: self.tokens.consumed(),
        }
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub(crate) fn mark(&self) -> Mark {
        Mark::new(self.base + self.cursor, self.line, self.column)
    }

    /// Converts a stream mark into an offset in the current buffer.
    #[inline]
    pub(crate) fn buffer_offset(&self, mark: Mark) -> u32 {
        mark.offset.saturating_sub(self.base).min(self.bytes.len()) as u32
    }

    /// Returns the next token without consuming it, or `None` when a
    /// non-final buffer is exhausted.
    pub(crate) fn peek(&mut self) -> Result<Option<Token>, ParseError> {
        if self.tokens.is_empty() || self.needs_more_tokens() {
            self.fetch_more_tokens()?;
        }
        Ok(self.tokens.peek(0).copied())
    }

    pub(crate) fn consume(&mut self) -> Token {
        self.tokens.consume()
    }

    pub(crate) fn take_error(&mut self) -> Error {
        match self.error.take() {
            Some(err) => err,
            None => panic!("take_error called without a recorded scanner error"),
        }
    }

    /// Records an error outside the scanner proper (reader-level checks).
    pub(crate) fn fail(&mut self, kind: ErrorKind, mark: Mark, span: Span) -> ParseError {
        self.error = Some(Error::new(kind, mark, span));
        ParseError
    }

    /// Drops buffered tokens after a fatal error.
    pub(crate) fn abandon(&mut self) {
        self.tokens.clear();
    }

    #[cold]
    fn error_at(&mut self, kind: ErrorKind, mark: Mark) -> ParseError {
        let span = self.span_from(mark.offset);
        self.fail(kind, mark, span)
    }

    // -- cursor operations --------------------------------------------------

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    #[inline]
    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.cursor + offset).copied()
    }

    #[inline]
    fn is_break_at(&self, offset: usize) -> bool {
        matches!(self.peek_byte_at(offset), Some(b'\n' | b'\r'))
    }

    #[inline]
    fn is_blank_at(&self, offset: usize) -> bool {
        matches!(self.peek_byte_at(offset), Some(b' ' | b'\t'))
    }

    #[inline]
    fn is_blankz_at(&self, offset: usize) -> bool {
        matches!(
            self.peek_byte_at(offset),
            None | Some(b' ' | b'\t' | b'\n' | b'\r')
        )
    }

    #[inline]
    fn is_breakz(&self) -> bool {
        matches!(self.peek_byte(), None | Some(b'\n' | b'\r'))
    }

    /// Moves past one character that is not a line break.
    #[inline]
    fn advance(&mut self) {
        let width = match self.peek_byte() {
            Some(b) if b < 0x80 => 1,
            Some(b) if b >= 0xF0 => 4,
            Some(b) if b >= 0xE0 => 3,
            Some(b) if b >= 0xC0 => 2,
            Some(_) => 1,
            None => return,
        };
        self.cursor = (self.cursor + width).min(self.bytes.len());
        self.column += 1;
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Moves past a line break (`\n`, `\r\n` or a lone `\r`).
    fn skip_line(&mut self) {
        match self.peek_byte() {
            Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => self.cursor += 2,
            Some(b'\n' | b'\r') => self.cursor += 1,
            _ => return,
        }
        self.line += 1;
        self.column = 0;
    }

    fn at_document_indicator(&self) -> bool {
        if self.column != 0 {
            return false;
        }
        let rest = &self.bytes[self.cursor..];
        (rest.starts_with(b"---") || rest.starts_with(b"...")) && self.is_blankz_at(3)
    }

    #[inline]
    fn span_from(&self, start_offset: usize) -> Span {
        let start = start_offset.saturating_sub(self.base).min(self.cursor);
        Span::new(start as u32, self.cursor as u32)
    }

    #[inline]
    fn span(start: usize, end: usize) -> Span {
        Span::new(start as u32, end as u32)
    }

    // -- token production ---------------------------------------------------

    fn needs_more_tokens(&self) -> bool {
        let consumed = self.tokens.consumed();
        self.simple_keys
            .iter()
            .any(|key| key.possible && key.token_number == consumed)
    }

    fn fetch_more_tokens(&mut self) -> Result<(), ParseError> {
        loop {
            let need_more = if self.tokens.is_empty() {
                true
            } else {
                self.stale_simple_keys()?;
                self.needs_more_tokens()
            };
            if !need_more || self.stream_end_fetched || self.suspended {
                return Ok(());
            }
            self.fetch_next_token()?;
        }
    }

    fn fetch_next_token(&mut self) -> Result<(), ParseError> {
        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }
        self.scan_to_next_token()?;

        if self.peek_byte().is_none() && !self.is_final {
            return self.suspend();
        }

        self.stale_simple_keys()?;
        self.unroll_indent(self.column as isize);

        let Some(b) = self.peek_byte() else {
            return self.fetch_stream_end();
        };

        if self.column == 0 && b == b'%' {
            return self.fetch_directive();
        }
        if self.at_document_indicator() {
            let kind = if b == b'-' {
                TokenKind::DocumentStart
            } else {
                TokenKind::DocumentEnd
            };
            return self.fetch_document_indicator(kind);
        }

        match b {
            b'[' => self.fetch_flow_collection_start(TokenKind::FlowSequenceStart),
            b'{' => self.fetch_flow_collection_start(TokenKind::FlowMappingStart),
            b']' => self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd),
            b'}' => self.fetch_flow_collection_end(TokenKind::FlowMappingEnd),
            b',' => self.fetch_flow_entry(),
            b'-' if self.is_blankz_at(1) => self.fetch_block_entry(),
            b'?' if self.flow_level > 0 || self.is_blankz_at(1) => self.fetch_key(),
            b':' if self.flow_level > 0 || self.is_blankz_at(1) => self.fetch_value(),
            b'*' => self.fetch_anchor(TokenKind::Alias),
            b'&' => self.fetch_anchor(TokenKind::Anchor),
            b'!' => self.fetch_tag(),
            b'|' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Literal),
            b'>' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Folded),
            b'\'' => self.fetch_flow_scalar(ScalarStyle::SingleQuoted),
            b'"' => self.fetch_flow_scalar(ScalarStyle::DoubleQuoted),
            b'\t' => Err(self.error_at(ErrorKind::TabIndentation, self.mark())),
            _ if self.starts_plain_scalar(b) => self.fetch_plain_scalar(),
            _ => {
                let ch = self.char_at_cursor();
                Err(self.error_at(ErrorKind::Unexpected(ch), self.mark()))
            }
        }
    }

    fn starts_plain_scalar(&self, b: u8) -> bool {
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => false,
            b'-' => !self.is_blank_at(1),
            b'?' | b':' => self.flow_level == 0 && !self.is_blankz_at(1),
            b',' | b'[' | b']' | b'{' | b'}' | b'#' | b'&' | b'*' | b'!' | b'|' | b'>' | b'\''
            | b'"' | b'%' | b'@' | b'`' => false,
            _ => true,
        }
    }

    fn char_at_cursor(&self) -> char {
        let rest = &self.bytes[self.cursor..];
        let end = rest.len().min(4);
        for len in (1..=end).rev() {
            if let Ok(s) = std::str::from_utf8(&rest[..len]) {
                if let Some(ch) = s.chars().next() {
                    return ch;
                }
            }
        }
        char::REPLACEMENT_CHARACTER
    }

    fn suspend(&mut self) -> Result<(), ParseError> {
        let pending = self
            .simple_keys
            .iter()
            .find(|key| key.possible && key.required)
            .map(|key| key.mark);
        if let Some(mark) = pending {
            return Err(self.error_at(ErrorKind::MissingMappingValue, mark));
        }
        for key in self.simple_keys.iter_mut() {
            key.possible = false;
        }
        self.suspended = true;
        Ok(())
    }

    // -- simple keys --------------------------------------------------------

    fn stale_simple_keys(&mut self) -> Result<(), ParseError> {
        let here = self.mark();
        let mut required_stale = None;
        for key in self.simple_keys.iter_mut() {
            if key.possible && key.is_stale(here) {
                if key.required {
                    required_stale = Some(key.mark);
                    break;
                }
                key.possible = false;
            }
        }
        match required_stale {
            Some(mark) => Err(self.error_at(ErrorKind::MissingMappingValue, mark)),
            None => Ok(()),
        }
    }

    fn save_simple_key(&mut self) -> Result<(), ParseError> {
        if self.simple_key_allowed {
            let key = SimpleKey {
                possible: true,
                required: self.flow_level == 0 && self.indent == self.column as isize,
                token_number: self.tokens.next_position(),
                flow_level: self.flow_level,
                mark: self.mark(),
            };
            self.remove_simple_key()?;
            *self.simple_keys.top_mut() = key;
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<(), ParseError> {
        let key = self.simple_keys.top_mut();
        if key.possible && key.required {
            let mark = key.mark;
            return Err(self.error_at(ErrorKind::MissingMappingValue, mark));
        }
        key.possible = false;
        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.flow_level += 1;
        self.simple_keys.push(SimpleKey {
            flow_level: self.flow_level,
            ..SimpleKey::default()
        });
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level > 0 {
            self.flow_level -= 1;
            self.simple_keys.pop();
        }
    }

    // -- indentation --------------------------------------------------------

    fn roll_indent(&mut self, column: usize, position: Option<usize>, kind: TokenKind, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }
        let column = column as isize;
        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;
            let token = Token::new(kind, mark);
            match position {
                Some(position) => self.tokens.insert_at(position, token),
                None => self.tokens.enqueue(token),
            }
        }
    }

    fn unroll_indent(&mut self, column: isize) {
        if self.flow_level > 0 {
            return;
        }
        while self.indent > column {
            self.tokens.enqueue(Token::new(TokenKind::BlockEnd, self.mark()));
            self.indent = self.indents.pop().unwrap_or(-1);
        }
    }

    // -- fetchers -----------------------------------------------------------

    fn fetch_stream_start(&mut self) {
        self.indent = -1;
        self.simple_keys.push(SimpleKey::default());
        self.simple_key_allowed = true;
        self.stream_start_produced = true;
        self.tokens
            .enqueue(Token::new(TokenKind::StreamStart, self.mark()));
    }

    fn fetch_stream_end(&mut self) -> Result<(), ParseError> {
        if self.column != 0 {
            self.column = 0;
            self.line += 1;
        }
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        self.stream_end_fetched = true;
        self.tokens
            .enqueue(Token::new(TokenKind::StreamEnd, self.mark()));
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<(), ParseError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        if let Some(token) = self.scan_directive()? {
            self.tokens.enqueue(token);
        }
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.mark();
        self.advance_n(3);
        let mut token = Token::new(kind, start);
        token.span = self.span_from(start.offset);
        self.tokens.enqueue(token);
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;
        self.fetch_indicator(kind);
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;
        self.fetch_indicator(kind);
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<(), ParseError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        self.fetch_indicator(TokenKind::FlowEntry);
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<(), ParseError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(self.error_at(ErrorKind::BlockEntryNotAllowed, self.mark()));
            }
            let mark = self.mark();
            self.roll_indent(self.column, None, TokenKind::BlockSequenceStart, mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        self.fetch_indicator(TokenKind::BlockEntry);
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<(), ParseError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(self.error_at(ErrorKind::MappingKeyNotAllowed, self.mark()));
            }
            let mark = self.mark();
            self.roll_indent(self.column, None, TokenKind::BlockMappingStart, mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        self.fetch_indicator(TokenKind::Key);
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<(), ParseError> {
        let key = *self.simple_keys.top_mut();
        if key.possible {
            tracing::trace!(
                position = key.token_number,
                line = key.mark.line,
                column = key.mark.column,
                "confirmed implicit key"
            );
            self.tokens
                .insert_at(key.token_number, Token::new(TokenKind::Key, key.mark));
            self.roll_indent(
                key.mark.column,
                Some(key.token_number),
                TokenKind::BlockMappingStart,
                key.mark,
            );
            self.simple_keys.top_mut().possible = false;
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return Err(self.error_at(ErrorKind::MappingValueNotAllowed, self.mark()));
                }
                let mark = self.mark();
                self.roll_indent(self.column, None, TokenKind::BlockMappingStart, mark);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }
        self.fetch_indicator(TokenKind::Value);
        Ok(())
    }

    fn fetch_indicator(&mut self, kind: TokenKind) {
        let start = self.mark();
        self.advance();
        let mut token = Token::new(kind, start);
        token.span = self.span_from(start.offset);
        self.tokens.enqueue(token);
    }

    fn fetch_anchor(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_anchor(kind)?;
        self.tokens.enqueue(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<(), ParseError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_tag()?;
        self.tokens.enqueue(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, style: ScalarStyle) -> Result<(), ParseError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let token = self.scan_block_scalar(style)?;
        self.tokens.enqueue(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, style: ScalarStyle) -> Result<(), ParseError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_flow_scalar(style)?;
        self.tokens.enqueue(token);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<(), ParseError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_plain_scalar()?;
        self.tokens.enqueue(token);
        Ok(())
    }

    // -- scanners -----------------------------------------------------------

    fn scan_to_next_token(&mut self) -> Result<(), ParseError> {
        loop {
            if self.column == 0 && self.bytes[self.cursor..].starts_with(b"\xEF\xBB\xBF") {
                self.cursor += 3;
            }
            while let Some(b) = self.peek_byte() {
                let skip =
                    b == b' ' || (b == b'\t' && (self.flow_level > 0 || !self.simple_key_allowed));
                if !skip {
                    break;
                }
                self.advance();
            }
            if self.peek_byte() == Some(b'#') {
                while !self.is_breakz() {
                    self.advance();
                }
            }
            if !self.is_break_at(0) {
                return Ok(());
            }
            self.skip_line();
            if self.flow_level == 0 {
                self.simple_key_allowed = true;
            }
        }
    }

    fn skip_blanks(&mut self) {
        while self.is_blank_at(0) {
            self.advance();
        }
    }

    /// Skips an optional comment and the line break that must end a
    /// directive or block scalar header.
    fn finish_line(&mut self, start: Mark, problem: fn(&'static str) -> ErrorKind) -> Result<(), ParseError> {
        self.skip_blanks();
        if self.peek_byte() == Some(b'#') {
            while !self.is_breakz() {
                self.advance();
            }
        }
        if !self.is_breakz() {
            return Err(self.error_at(problem("expected a comment or a line break"), start));
        }
        self.skip_line();
        Ok(())
    }

    fn scan_directive(&mut self) -> Result<Option<Token>, ParseError> {
        let start = self.mark();
        self.advance();
        let name_start = self.cursor;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            self.advance();
        }
        let name = &self.bytes[name_start..self.cursor];
        if name.is_empty() {
            return Err(self.error_at(ErrorKind::InvalidDirective("missing directive name"), start));
        }
        if !self.is_blankz_at(0) {
            return Err(self.error_at(
                ErrorKind::InvalidDirective("unexpected character after directive name"),
                start,
            ));
        }

        let token = match name {
            b"YAML" => {
                self.skip_blanks();
                let version_start = self.cursor;
                self.scan_version_number(start)?;
                if self.peek_byte() != Some(b'.') {
                    return Err(self.error_at(
                        ErrorKind::InvalidDirective("expected a digit or '.' in %YAML directive"),
                        start,
                    ));
                }
                self.advance();
                self.scan_version_number(start)?;
                let mut token = Token::new(TokenKind::VersionDirective, start);
                token.span = Self::span(version_start, self.cursor);
                Some(token)
            }
            b"TAG" => {
                self.skip_blanks();
                let handle = self.scan_tag_handle(start, true)?;
                if !self.is_blank_at(0) {
                    return Err(self.error_at(
                        ErrorKind::InvalidDirective("expected whitespace after %TAG handle"),
                        start,
                    ));
                }
                self.skip_blanks();
                let prefix = self.scan_tag_uri(start, true)?;
                if !self.is_blankz_at(0) {
                    return Err(self.error_at(
                        ErrorKind::InvalidDirective("expected whitespace or line break after %TAG prefix"),
                        start,
                    ));
                }
                let mut token = Token::new(TokenKind::TagDirective, start);
                token.span = handle;
                token.extra = prefix;
                Some(token)
            }
            _ => {
                tracing::warn!(
                    name = %String::from_utf8_lossy(name),
                    line = start.line + 1,
                    "ignoring reserved directive"
                );
                while !self.is_breakz() {
                    self.advance();
                }
                None
            }
        };

        self.finish_line(start, ErrorKind::InvalidDirective)?;
        Ok(token)
    }

    fn scan_version_number(&mut self, start: Mark) -> Result<(), ParseError> {
        let digits_start = self.cursor;
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.advance();
        }
        let len = self.cursor - digits_start;
        if len == 0 {
            return Err(self.error_at(
                ErrorKind::InvalidDirective("expected a version number"),
                start,
            ));
        }
        if len > 9 {
            return Err(self.error_at(
                ErrorKind::InvalidDirective("version number is too long"),
                start,
            ));
        }
        Ok(())
    }

    fn scan_anchor(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let start = self.mark();
        self.advance();
        let name_start = self.cursor;
        while let Some(b) = self.peek_byte() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b',' | b'[' | b']' | b'{' | b'}') {
                break;
            }
            self.advance();
        }
        if self.cursor == name_start {
            return Err(self.error_at(ErrorKind::EmptyAnchorName, start));
        }
        let mut token = Token::new(kind, start);
        token.span = Self::span(name_start, self.cursor);
        Ok(token)
    }

    /// Scans `!`, `!!` or `!word!` and returns its span.
    fn scan_tag_handle(&mut self, start: Mark, directive: bool) -> Result<Span, ParseError> {
        if self.peek_byte() != Some(b'!') {
            let kind = if directive {
                ErrorKind::InvalidDirective("expected '!' to start a tag handle")
            } else {
                ErrorKind::InvalidTag("expected '!'")
            };
            return Err(self.error_at(kind, start));
        }
        let handle_start = self.cursor;
        self.advance();
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            self.advance();
        }
        if self.peek_byte() == Some(b'!') {
            self.advance();
        } else if directive && self.cursor - handle_start > 1 {
            return Err(self.error_at(
                ErrorKind::InvalidDirective("expected '!' to end a tag handle"),
                start,
            ));
        }
        Ok(Self::span(handle_start, self.cursor))
    }

    /// Scans URI characters. With `uri` set the full URI alphabet is
    /// accepted (verbatim tags and `%TAG` prefixes); otherwise the tag
    /// shorthand alphabet, which excludes `!` and flow indicators.
    fn scan_tag_uri(&mut self, start: Mark, uri: bool) -> Result<Span, ParseError> {
        let uri_start = self.cursor;
        while let Some(b) = self.peek_byte() {
            let accepted = b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'-' | b';' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b'_'
                        | b'.' | b'~' | b'*' | b'\'' | b'(' | b')' | b'#' | b'%'
                )
                || (uri && matches!(b, b'!' | b',' | b'[' | b']'));
            if !accepted {
                break;
            }
            if b == b'%' {
                let valid = matches!(self.peek_byte_at(1), Some(h) if hex_value(h).is_some())
                    && matches!(self.peek_byte_at(2), Some(h) if hex_value(h).is_some());
                if !valid {
                    return Err(self.error_at(ErrorKind::InvalidTag("invalid URI escape"), start));
                }
                self.advance_n(3);
            } else {
                self.advance();
            }
        }
        if uri && self.cursor == uri_start {
            return Err(self.error_at(ErrorKind::InvalidTag("expected a tag URI"), start));
        }
        Ok(Self::span(uri_start, self.cursor))
    }

    /// `span` holds the handle (empty for verbatim tags), `extra` the suffix.
    fn scan_tag(&mut self) -> Result<Token, ParseError> {
        let start = self.mark();
        let (handle, suffix);
        if self.peek_byte_at(1) == Some(b'<') {
            self.advance_n(2);
            handle = Self::span(self.cursor, self.cursor);
            suffix = self.scan_tag_uri(start, true)?;
            if self.peek_byte() != Some(b'>') {
                return Err(self.error_at(ErrorKind::InvalidTag("expected '>'"), start));
            }
            self.advance();
        } else {
            let named = self.scan_tag_handle(start, false)?;
            if named.len() > 1 && self.bytes[named.end as usize - 1] == b'!' {
                handle = named;
                suffix = self.scan_tag_uri(start, false)?;
                if suffix.is_empty() {
                    return Err(self.error_at(ErrorKind::InvalidTag("expected a tag suffix"), start));
                }
            } else {
                // `!word` is the primary handle followed by a suffix.
                handle = Span::new(named.start, named.start + 1);
                let rest = self.scan_tag_uri(start, false)?;
                suffix = Span::new(named.start + 1, rest.end);
            }
        }

        let terminated = self.is_blankz_at(0)
            || (self.flow_level > 0 && matches!(self.peek_byte(), Some(b',' | b']' | b'}')));
        if !terminated {
            return Err(self.error_at(
                ErrorKind::InvalidTag("expected whitespace or line break after tag"),
                start,
            ));
        }
        let mut token = Token::new(TokenKind::Tag, start);
        token.span = handle;
        token.extra = suffix;
        Ok(token)
    }

    fn scan_block_scalar(&mut self, style: ScalarStyle) -> Result<Token, ParseError> {
        let start = self.mark();
        self.advance();

        let mut chomping = Chomping::Clip;
        let mut increment = 0isize;
        for _ in 0..2 {
            match self.peek_byte() {
                Some(b'+') if chomping == Chomping::Clip => chomping = Chomping::Keep,
                Some(b'-') if chomping == Chomping::Clip => chomping = Chomping::Strip,
                Some(b'0') if increment == 0 => {
                    return Err(self.error_at(
                        ErrorKind::InvalidBlockScalarHeader("indentation indicator must be 1-9"),
                        start,
                    ));
                }
                Some(d @ b'1'..=b'9') if increment == 0 => increment = (d - b'0') as isize,
                _ => break,
            }
            self.advance();
        }
        self.finish_line(start, ErrorKind::InvalidBlockScalarHeader)?;

        let content_start = self.cursor;
        let mut end = self.cursor;
        let mut indent = if increment > 0 {
            if self.indent >= 0 {
                self.indent + increment
            } else {
                increment
            }
        } else {
            0
        };

        self.block_scalar_breaks(&mut indent, &mut end, start)?;
        while self.column as isize == indent && self.peek_byte().is_some() {
            while !self.is_breakz() {
                self.advance();
            }
            end = self.cursor;
            if self.peek_byte().is_none() {
                break;
            }
            self.skip_line();
            end = self.cursor;
            self.block_scalar_breaks(&mut indent, &mut end, start)?;
        }

        let mut token = Token::new(TokenKind::Scalar, start);
        token.style = style;
        token.span = Self::span(content_start, end);
        token.block = BlockHeader {
            indent: indent as u32,
            chomping,
        };
        Ok(token)
    }

    /// Skips indentation and empty lines. Determines the content indentation
    /// when it was neither given nor detected yet.
    fn block_scalar_breaks(
        &mut self,
        indent: &mut isize,
        end: &mut usize,
        start: Mark,
    ) -> Result<(), ParseError> {
        let mut max_indent = 0isize;
        loop {
            while (*indent == 0 || (self.column as isize) < *indent)
                && self.peek_byte() == Some(b' ')
            {
                self.advance();
            }
            max_indent = max_indent.max(self.column as isize);
            if (*indent == 0 || (self.column as isize) < *indent)
                && self.peek_byte() == Some(b'\t')
            {
                return Err(self.error_at(ErrorKind::TabIndentation, start));
            }
            if !self.is_break_at(0) {
                break;
            }
            self.skip_line();
            *end = self.cursor;
        }
        if *indent == 0 {
            *indent = max_indent.max(self.indent + 1).max(1);
        }
        Ok(())
    }

    fn scan_flow_scalar(&mut self, style: ScalarStyle) -> Result<Token, ParseError> {
        let start = self.mark();
        let single = style == ScalarStyle::SingleQuoted;
        let quote = if single { b'\'' } else { b'"' };
        self.advance();
        let content_start = self.cursor;

        let content_end = loop {
            if self.at_document_indicator() {
                return Err(self.error_at(ErrorKind::DocumentMarkerInScalar, start));
            }
            let Some(b) = self.peek_byte() else {
                return Err(self.error_at(ErrorKind::UnterminatedScalar, start));
            };
            match b {
                b'\'' if single && self.peek_byte_at(1) == Some(b'\'') => self.advance_n(2),
                _ if b == quote => break self.cursor,
                b'\\' if !single => {
                    if self.scan_escape(start)? {
                        self.quoted_line_indent()?;
                    }
                }
                b'\n' | b'\r' => {
                    self.skip_line();
                    self.quoted_line_indent()?;
                }
                _ => self.advance(),
            }
        };
        self.advance();

        let mut token = Token::new(TokenKind::Scalar, start);
        token.style = style;
        token.span = Self::span(content_start, content_end);
        Ok(token)
    }

    /// Skips the indentation of a quoted continuation line. In block context
    /// the indentation may not contain tabs.
    fn quoted_line_indent(&mut self) -> Result<(), ParseError> {
        let indent = self.indent + 1;
        while let Some(b @ (b' ' | b'\t')) = self.peek_byte() {
            if b == b'\t' && self.flow_level == 0 && (self.column as isize) < indent {
                return Err(self.error_at(ErrorKind::TabIndentation, self.mark()));
            }
            self.advance();
        }
        Ok(())
    }

    /// Validates one escape sequence of a double-quoted scalar. Returns true
    /// for an escaped line break.
    fn scan_escape(&mut self, start: Mark) -> Result<bool, ParseError> {
        let escape_mark = self.mark();
        let Some(code) = self.peek_byte_at(1) else {
            return Err(self.error_at(ErrorKind::UnterminatedScalar, start));
        };
        let digits = match code {
            b'\n' | b'\r' => {
                self.advance();
                self.skip_line();
                return Ok(true);
            }
            b'0' | b'a' | b'b' | b't' | b'\t' | b'n' | b'v' | b'f' | b'r' | b'e' | b' ' | b'"'
            | b'/' | b'\\' | b'N' | b'_' | b'L' | b'P' => 0,
            b'x' => 2,
            b'u' => 4,
            b'U' => 8,
            _ => {
                self.advance();
                let ch = self.char_at_cursor();
                return Err(self.error_at(ErrorKind::InvalidEscape(ch), escape_mark));
            }
        };
        self.advance_n(2);
        if digits == 0 {
            return Ok(false);
        }
        let mut value = 0u32;
        for _ in 0..digits {
            let next = self.peek_byte();
            match (next, next.and_then(hex_value)) {
                (_, Some(digit)) => {
                    value = value << 4 | digit as u32;
                    self.advance();
                }
                (Some(b'\n' | b'\r') | None, _) => {
                    return Err(self.error_at(ErrorKind::InvalidHexEscape('\n'), escape_mark));
                }
                _ => {
                    let ch = self.char_at_cursor();
                    return Err(self.error_at(ErrorKind::InvalidHexEscape(ch), escape_mark));
                }
            }
        }
        if char::from_u32(value).is_none() {
            return Err(self.error_at(ErrorKind::InvalidEscapeValue(value), escape_mark));
        }
        Ok(false)
    }

    fn scan_plain_scalar(&mut self) -> Result<Token, ParseError> {
        let start = self.mark();
        let content_start = self.cursor;
        let mut end = self.cursor;
        let indent = self.indent + 1;
        let mut leading_blanks = false;

        loop {
            if self.at_document_indicator() || self.peek_byte() == Some(b'#') {
                break;
            }
            while let Some(b) = self.peek_byte() {
                if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                    break;
                }
                if b == b':' {
                    let next = self.peek_byte_at(1);
                    let ends = self.is_blankz_at(1)
                        || (self.flow_level > 0
                            && matches!(next, Some(b',' | b'?' | b'[' | b']' | b'{' | b'}')));
                    if ends {
                        break;
                    }
                }
                if self.flow_level > 0 && matches!(b, b',' | b'[' | b']' | b'{' | b'}') {
                    break;
                }
                self.advance();
                end = self.cursor;
                leading_blanks = false;
            }
            if !(self.is_blank_at(0) || self.is_break_at(0)) {
                break;
            }
            while self.is_blank_at(0) || self.is_break_at(0) {
                if self.is_blank_at(0) {
                    if leading_blanks
                        && (self.column as isize) < indent
                        && self.peek_byte() == Some(b'\t')
                    {
                        return Err(self.error_at(ErrorKind::TabIndentation, self.mark()));
                    }
                    self.advance();
                } else {
                    self.skip_line();
                    leading_blanks = true;
                }
            }
            if self.flow_level == 0 && (self.column as isize) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        let mut token = Token::new(TokenKind::Scalar, start);
        token.style = ScalarStyle::Plain;
        token.span = Self::span(content_start, end);
        Ok(token)
    }
}
