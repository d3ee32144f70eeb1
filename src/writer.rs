//! Push-style YAML emitter.
//!
//! The [`Writer`] mirrors the [`Reader`](crate::Reader) grammar in the other
//! direction: structural and scalar calls append bytes to an internal buffer
//! that is handed to the sink on [`Writer::flush`].

use crate::scalar::resolves_to_non_string;
use crate::simple_key::MAX_SIMPLE_KEY_LENGTH;
use crate::tags::CORE_SCHEMA_PREFIX;
use crate::token::CollectionStyle;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io;

#[cfg(test)]
#[path = "./writer_tests.rs"]
mod tests;

/// Output settings for a [`Writer`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriterOptions {
    /// Spaces per nesting level, clamped to `2..=9`.
    pub indent: usize,
    /// Emit `%YAML 1.2` before every document.
    pub version_directive: bool,
    /// Always emit the `---` marker.
    pub explicit_document_start: bool,
    /// Always emit the `...` marker.
    pub explicit_document_end: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indent: 2,
            version_directive: false,
            explicit_document_start: false,
            explicit_document_end: false,
        }
    }
}

/// Where a [`Writer`] is in the stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum WriterState {
    /// Nothing has been written yet.
    #[default]
    Initial,
    /// Between documents.
    InStream,
    /// Inside a document.
    InDocument,
    /// The stream has been closed.
    Finished,
}

/// The kind of an open collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    BlockMapping,
    BlockSequence,
    FlowMapping,
    FlowSequence,
}

impl ContainerKind {
    fn is_flow(self) -> bool {
        matches!(self, Self::FlowMapping | Self::FlowSequence)
    }

    fn is_mapping(self) -> bool {
        matches!(self, Self::BlockMapping | Self::FlowMapping)
    }
}

/// An open collection on the writer's stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContainerInfo {
    pub kind: ContainerKind,
    /// Zero for the root collection of a document.
    pub depth: usize,
    /// No child has been written yet.
    pub is_first_child: bool,
    expecting_value: bool,
}

/// Writes YAML to an [`io::Write`] sink.
///
/// Output is buffered until [`flush`](Self::flush) or
/// [`into_inner`](Self::into_inner). Protocol misuse, such as ending a
/// collection that was never started or writing a mapping value without a
/// property name, panics.
///
/// ```
/// use yaml_spanner::{CollectionStyle, Writer};
///
/// let mut writer = Writer::new(Vec::new());
/// writer.write_mapping_start(CollectionStyle::Block);
/// writer.write_property_name("name");
/// writer.write_string("Jane Smith");
/// writer.write_property_name("tags");
/// writer.write_sequence_start(CollectionStyle::Block);
/// writer.write_string("designer");
/// writer.write_sequence_end();
/// writer.write_mapping_end();
/// let out = writer.into_inner()?;
/// assert_eq!(out, b"name: Jane Smith\ntags:\n  - designer\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Writer<W: io::Write> {
    sink: W,
    out: String,
    options: WriterOptions,
    state: WriterState,
    stack: Vec<ContainerInfo>,
    /// Anchor and tag text for the next node.
    props: String,
    /// Bytes written since the last line break.
    column: usize,
    /// The cursor sits right after a `- ` indicator, where a block mapping or
    /// sequence may begin on the same line.
    compact: bool,
    /// A space goes before the next inline text.
    pending_space: bool,
    /// A comment ended the line; inline text must start a new one.
    pending_break: bool,
    root_written: bool,
    /// The previous document ended with `...`.
    closed_explicitly: bool,
    documents: usize,
}

impl<W: io::Write> Writer<W> {
    /// Creates a writer with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    /// Creates a writer. The indent is clamped to `2..=9`.
    pub fn with_options(sink: W, mut options: WriterOptions) -> Self {
        options.indent = options.indent.clamp(2, 9);
        Writer {
            sink,
            out: String::new(),
            options,
            state: WriterState::Initial,
            stack: Vec::new(),
            props: String::new(),
            column: 0,
            compact: false,
            pending_space: false,
            pending_break: false,
            root_written: false,
            closed_explicitly: false,
            documents: 0,
        }
    }

    /// The options in effect, after clamping.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Where the writer is in the stream.
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// The innermost open collection.
    pub fn current_container(&self) -> Option<&ContainerInfo> {
        self.stack.last()
    }

    /// Bytes buffered but not yet handed to the sink.
    pub fn bytes_pending(&self) -> usize {
        self.out.len()
    }

    /// Writes buffered output to the sink and flushes it.
    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.write_all(self.out.as_bytes())?;
        self.out.clear();
        self.sink.flush()
    }

    /// Flushes and returns the sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    /// Discards buffered output and all state, keeping the sink and options.
    pub fn reset(&mut self) {
        self.out.clear();
        self.state = WriterState::Initial;
        self.stack.clear();
        self.props.clear();
        self.column = 0;
        self.compact = false;
        self.pending_space = false;
        self.pending_break = false;
        self.root_written = false;
        self.closed_explicitly = false;
        self.documents = 0;
    }

    // --- stream and documents ----------------------------------------------

    /// Marks the start of the stream. Optional; the first node or document
    /// start implies it.
    pub fn write_stream_start(&mut self) {
        match self.state {
            WriterState::Initial => self.state = WriterState::InStream,
            state => panic!("stream already started (state {state:?})"),
        }
    }

    /// Closes any open document. Nothing may be written afterwards until
    /// [`reset`](Self::reset).
    pub fn write_stream_end(&mut self) {
        match self.state {
            WriterState::InDocument => self.write_document_end(),
            WriterState::Finished => panic!("stream already ended"),
            _ => {}
        }
        self.state = WriterState::Finished;
    }

    /// Begins a document, emitting `%YAML 1.2` and `---` as configured.
    ///
    /// A `---` marker is always emitted for a directive, and for a document
    /// following one that did not end with `...`.
    pub fn write_document_start(&mut self) {
        match self.state {
            WriterState::Initial => self.state = WriterState::InStream,
            WriterState::InStream => {}
            WriterState::InDocument => self.write_document_end(),
            WriterState::Finished => panic!("document started after the end of the stream"),
        }
        self.end_line();
        let follows_bare = self.documents > 0 && !self.closed_explicitly;
        if self.options.version_directive {
            if follows_bare {
                self.raw("...\n");
            }
            self.raw("%YAML 1.2\n");
        }
        if self.options.explicit_document_start || self.options.version_directive || follows_bare
        {
            self.raw("---");
        }
        self.state = WriterState::InDocument;
        self.root_written = false;
        self.closed_explicitly = false;
        self.documents += 1;
        tracing::debug!(document = self.documents, "writer document start");
    }

    /// Ends the current document, emitting `...` when configured.
    pub fn write_document_end(&mut self) {
        if self.state != WriterState::InDocument {
            panic!("document end outside of a document (state {:?})", self.state);
        }
        if let Some(open) = self.stack.last() {
            panic!("document ended with an open {:?}", open.kind);
        }
        self.props.clear();
        self.end_line();
        if self.options.explicit_document_end {
            self.raw("...\n");
            self.closed_explicitly = true;
        }
        self.state = WriterState::InStream;
        tracing::debug!(document = self.documents, "writer document end");
    }

    // --- collections ---------------------------------------------------------

    /// Opens a mapping. Inside a flow collection the mapping is written in
    /// flow style whatever `style` says.
    pub fn write_mapping_start(&mut self, style: CollectionStyle) {
        self.open(true, style);
    }

    /// Closes the innermost mapping. An empty block mapping is written as
    /// `{}`.
    pub fn write_mapping_end(&mut self) {
        self.close(true);
    }

    /// Opens a sequence, in flow style when nested in a flow collection.
    pub fn write_sequence_start(&mut self, style: CollectionStyle) {
        self.open(false, style);
    }

    /// Closes the innermost sequence. An empty block sequence is written as
    /// `[]`.
    pub fn write_sequence_end(&mut self) {
        self.close(false);
    }

    fn open(&mut self, mapping: bool, style: CollectionStyle) {
        let flow = style == CollectionStyle::Flow
            || self.stack.last().is_some_and(|c| c.kind.is_flow());
        self.begin_node();
        let kind = match (mapping, flow) {
            (true, false) => ContainerKind::BlockMapping,
            (false, false) => ContainerKind::BlockSequence,
            (true, true) => ContainerKind::FlowMapping,
            (false, true) => ContainerKind::FlowSequence,
        };
        if flow {
            self.inline(if mapping { "{" } else { "[" });
        }
        self.stack.push(ContainerInfo {
            kind,
            depth: self.stack.len(),
            is_first_child: true,
            expecting_value: false,
        });
    }

    fn close(&mut self, mapping: bool) {
        let Some(info) = self.stack.pop() else {
            panic!("collection end without a matching start");
        };
        if info.kind.is_mapping() != mapping {
            panic!("{:?} closed with the wrong end call", info.kind);
        }
        if info.expecting_value {
            panic!("mapping ended after a property name without its value");
        }
        match info.kind {
            ContainerKind::FlowMapping => self.inline("}"),
            ContainerKind::FlowSequence => self.inline("]"),
            ContainerKind::BlockMapping if info.is_first_child => self.inline("{}"),
            ContainerKind::BlockSequence if info.is_first_child => self.inline("[]"),
            _ => {}
        }
        self.end_node();
    }

    /// Writes a mapping key. The next node written is its value.
    ///
    /// Keys too long to be read back as implicit keys are written in the
    /// explicit `? key` form.
    pub fn write_property_name(&mut self, name: &str) {
        let indent = self.options.indent;
        let Some(top) = self.stack.last_mut() else {
            panic!("property name written outside of a mapping");
        };
        if !top.kind.is_mapping() {
            panic!("property name written inside a {:?}", top.kind);
        }
        if top.expecting_value {
            panic!("property name written where a mapping value is expected");
        }
        let first = std::mem::replace(&mut top.is_first_child, false);
        top.expecting_value = true;
        let (kind, depth) = (top.kind, top.depth);
        let key = render_text(name, kind.is_flow());
        let props = self.props.len() + usize::from(!self.props.is_empty());
        let explicit = props + key.len() > MAX_SIMPLE_KEY_LENGTH;
        if kind.is_flow() {
            if !first {
                self.inline(",");
                self.pending_space = true;
            }
        } else {
            self.start_line(depth * indent);
        }
        if explicit {
            self.inline("?");
            self.pending_space = true;
        }
        self.write_props();
        self.inline(&key);
        if explicit && !kind.is_flow() {
            self.end_line();
            self.spaces(depth * indent);
        }
        self.raw(":");
        self.pending_space = true;
    }

    // --- scalars -------------------------------------------------------------

    /// Writes `null`.
    pub fn write_null(&mut self) {
        self.scalar("null");
    }

    /// Writes `true` or `false`.
    pub fn write_bool(&mut self, value: bool) {
        self.scalar(if value { "true" } else { "false" });
    }

    /// Writes a decimal integer.
    pub fn write_i32(&mut self, value: i32) {
        self.write_i64(value.into());
    }

    /// Writes a decimal integer.
    pub fn write_i64(&mut self, value: i64) {
        self.begin_node();
        self.inline(&value.to_string());
        self.end_node();
    }

    /// Writes a float; infinities and NaN use `.inf`, `-.inf` and `.nan`.
    pub fn write_f64(&mut self, value: f64) {
        if value.is_nan() {
            self.scalar(".nan");
        } else if value.is_infinite() {
            self.scalar(if value > 0.0 { ".inf" } else { "-.inf" });
        } else {
            let mut buffer = zmij::Buffer::new();
            let text = buffer.format(value);
            if text.contains(['.', 'e', 'E']) {
                self.scalar(text);
            } else {
                let mut text = text.to_string();
                text.push_str(".0");
                self.scalar(&text);
            }
        }
    }

    /// Writes a string, plain when it would read back unchanged, quoted
    /// otherwise.
    pub fn write_string(&mut self, value: &str) {
        self.begin_node();
        self.write_text(value);
        self.end_node();
    }

    /// Writes an alias node `*name`.
    pub fn write_alias(&mut self, name: &str) {
        self.begin_node();
        self.inline("*");
        self.raw(name);
        self.end_node();
    }

    /// Attaches an anchor to the next node.
    pub fn write_anchor(&mut self, name: &str) {
        if !self.props.is_empty() {
            self.props.push(' ');
        }
        self.props.push('&');
        self.props.push_str(name);
    }

    /// Attaches a tag to the next node.
    ///
    /// Core-schema tags use the `!!` shorthand, local tags starting with `!`
    /// are written as is, and anything else uses the verbatim `!<...>` form.
    pub fn write_tag(&mut self, tag: &str) {
        if !self.props.is_empty() {
            self.props.push(' ');
        }
        if let Some(suffix) = tag.strip_prefix(CORE_SCHEMA_PREFIX)
            && !suffix.is_empty()
        {
            self.props.push_str("!!");
            self.props.push_str(suffix);
        } else if tag.starts_with('!') {
            self.props.push_str(tag);
        } else {
            self.props.push_str("!<");
            self.props.push_str(tag);
            self.props.push('>');
        }
    }

    /// Writes a comment, trailing the current line when it has content.
    pub fn write_comment(&mut self, text: &str) {
        let column = self.stack.last().map_or(0, |c| c.depth * self.options.indent);
        for (i, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if i > 0 || self.column == 0 {
                self.end_line();
                self.spaces(column);
                self.raw("#");
            } else {
                self.raw(" #");
            }
            if !line.is_empty() {
                self.raw(" ");
                self.raw(line);
            }
        }
        self.pending_break = true;
        self.pending_space = false;
        self.compact = false;
    }

    /// Writes a `|` block scalar. Inside a flow collection the value is
    /// written as a quoted string instead.
    pub fn write_literal_scalar(&mut self, value: &str) {
        self.block_scalar('|', value);
    }

    /// Writes a `>` block scalar. Single line breaks between text lines fold
    /// into spaces when read back.
    pub fn write_folded_scalar(&mut self, value: &str) {
        self.block_scalar('>', value);
    }

    fn block_scalar(&mut self, indicator: char, value: &str) {
        if self.stack.last().is_some_and(|c| c.kind.is_flow()) {
            self.write_string(value);
            return;
        }
        let body = value.trim_end_matches(['\n', '\r']);
        let trailing = value[body.len()..].matches('\n').count();
        let chomping = match trailing {
            0 => "-",
            1 if !body.is_empty() => "",
            _ => "+",
        };
        let leading_space = body
            .split('\n')
            .find(|line| !line.trim_end_matches('\r').is_empty())
            .is_some_and(|line| line.starts_with([' ', '\t']));

        let mut header = String::from(indicator);
        if leading_space {
            let _ = write!(header, "{}", self.options.indent);
        }
        header.push_str(chomping);
        self.begin_node();
        self.inline(&header);

        let column = self.stack.len().max(1) * self.options.indent;
        if !body.is_empty() {
            for line in body.split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                self.raw("\n");
                if !line.is_empty() {
                    self.spaces(column);
                    self.raw(line);
                }
            }
        }
        if chomping == "+" || body.is_empty() {
            self.raw("\n");
            // The first break of a non-empty body ends its last line.
            let extra = trailing - usize::from(!body.is_empty());
            for _ in 0..extra {
                self.raw("\n");
            }
        }
        self.end_node();
    }

    // --- layout --------------------------------------------------------------

    fn scalar(&mut self, text: &str) {
        self.begin_node();
        self.inline(text);
        self.end_node();
    }

    /// Emits whatever must precede a node in the current context, then any
    /// pending properties.
    fn begin_node(&mut self) {
        match self.state {
            WriterState::Initial | WriterState::InStream => self.write_document_start(),
            WriterState::InDocument => {}
            WriterState::Finished => panic!("node written after the end of the stream"),
        }
        let indent = self.options.indent;
        match self.stack.last_mut() {
            None => {
                if self.root_written {
                    self.write_document_start();
                }
                self.end_line();
            }
            Some(top) if top.kind.is_mapping() => {
                if !top.expecting_value {
                    panic!("mapping value written without a property name");
                }
                top.expecting_value = false;
            }
            Some(top) => {
                let first = std::mem::replace(&mut top.is_first_child, false);
                if top.kind.is_flow() {
                    if !first {
                        self.inline(",");
                        self.pending_space = true;
                    }
                } else {
                    let column = top.depth * indent;
                    self.start_line(column);
                    self.raw("-");
                    self.spaces(indent - 1);
                    self.compact = true;
                }
            }
        }
        self.write_props();
    }

    fn write_props(&mut self) {
        if !self.props.is_empty() {
            let props = std::mem::take(&mut self.props);
            self.inline(&props);
            self.pending_space = true;
        }
    }

    fn end_node(&mut self) {
        if self.stack.is_empty() {
            self.end_line();
            self.root_written = true;
        }
    }

    /// Positions the cursor at `column` on a fresh line, unless it already
    /// sits there after a `- ` indicator.
    fn start_line(&mut self, column: usize) {
        if self.compact && self.column == column {
            self.compact = false;
            self.pending_space = false;
            return;
        }
        self.end_line();
        self.spaces(column);
    }

    /// Terminates the current line if it has content.
    fn end_line(&mut self) {
        if self.column > 0 {
            self.out.push('\n');
        }
        self.column = 0;
        self.compact = false;
        self.pending_space = false;
        self.pending_break = false;
    }

    /// Emits text that continues the current line.
    fn inline(&mut self, text: &str) {
        if self.pending_break {
            self.end_line();
            self.spaces(self.stack.len().max(1) * self.options.indent);
        } else if self.pending_space {
            self.out.push(' ');
            self.column += 1;
        }
        self.pending_space = false;
        self.compact = false;
        self.raw(text);
    }

    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        match text.rfind('\n') {
            Some(nl) => self.column = text.len() - nl - 1,
            None => self.column += text.len(),
        }
    }

    fn spaces(&mut self, count: usize) {
        for _ in 0..count {
            self.out.push(' ');
        }
        self.column += count;
    }

    fn write_text(&mut self, value: &str) {
        let flow = self.stack.last().is_some_and(|c| c.kind.is_flow());
        let text = render_text(value, flow);
        self.inline(&text);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Quoting {
    Plain,
    Single,
    Double,
}

fn needs_escape(c: char) -> bool {
    (c < ' ' && c != '\t')
        || ('\u{7F}'..='\u{9F}').contains(&c)
        || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}')
}

fn quoting(value: &str, flow: bool) -> Quoting {
    if value.chars().any(needs_escape) {
        return Quoting::Double;
    }
    let Some(first) = value.chars().next() else {
        return Quoting::Single;
    };
    const RESERVED: [&str; 4] = ["null", "true", "false", "~"];
    let quoted = "-?:,[]{}#&*!|>'\"%@`".contains(first)
        || first.is_whitespace()
        || value.ends_with(char::is_whitespace)
        || RESERVED.iter().any(|w| value.eq_ignore_ascii_case(w))
        || resolves_to_non_string(value)
        || value.contains([':', '#'])
        || value.starts_with("...")
        || (flow && value.contains([',', '[', ']', '{', '}']));
    if quoted {
        Quoting::Single
    } else {
        Quoting::Plain
    }
}

/// Renders `value` plain, single-quoted or double-quoted. The result never
/// contains a line break.
fn render_text(value: &str, flow: bool) -> Cow<'_, str> {
    match quoting(value, flow) {
        Quoting::Plain => Cow::Borrowed(value),
        Quoting::Single => Cow::Owned(format!("'{}'", value.replace('\'', "''"))),
        Quoting::Double => {
            let mut escaped = String::with_capacity(value.len() + 2);
            escaped.push('"');
            escape_double(value, &mut escaped);
            escaped.push('"');
            Cow::Owned(escaped)
        }
    }
}

fn escape_double(value: &str, out: &mut String) {
    for c in value.chars() {
        let escaped = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\0' => "\\0",
            '\x07' => "\\a",
            '\x08' => "\\b",
            '\t' => "\\t",
            '\n' => "\\n",
            '\x0B' => "\\v",
            '\x0C' => "\\f",
            '\r' => "\\r",
            '\x1B' => "\\e",
            '\u{85}' => "\\N",
            '\u{2028}' => "\\L",
            '\u{2029}' => "\\P",
            c if needs_escape(c) => {
                let code = c as u32;
                if code <= 0xFF {
                    let _ = write!(out, "\\x{code:02X}");
                } else {
                    let _ = write!(out, "\\u{code:04X}");
                }
                continue;
            }
            c => {
                out.push(c);
                continue;
            }
        };
        out.push_str(escaped);
    }
}
