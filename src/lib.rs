#![forbid(unsafe_code)]
//! Mansite turns a small roff-like manual page dialect into a themed HTML page.
//!
//! The source understands three directives: `.TH` (title fields), `.SH`
//! (section header) and `.LN` (link). Every other line is body text that
//! belongs to the most recently opened section.
//!
//! # Example
//!
//! ```no_run
//! let source = ".TH mytool 1 2024-01-01 Local Mytool Manual\n.SH NAME\nmytool\n";
//! let options = mansite::RenderOptions::default();
//! let html = mansite::convert_to_html(source, "mytool.1", &options)?;
//! # Ok::<(), mansite::MansiteError>(())
//! ```

pub mod config;
pub mod html;

pub use config::{BUILTIN_SCHEMA, load_config, load_config_str, load_config_with_schema};
pub use html::{DEFAULT_STYLESHEET, RenderOptions, render_html};

use serde_json::{Map as JsonMap, Value as JsonValue};
use std::error::Error;
use std::fmt;

/// Number of fields carried by a `.TH` line.
pub const TITLE_FIELDS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: TitleFields,
    pub sections: Vec<Section>,
}

/// The five `.TH` fields, in source order.
///
/// `manual_section` doubles as the long document title: the HTML renderer
/// uses it for both `<title>` and the page heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFields {
    pub title: String,
    pub section: String,
    pub date: String,
    pub source: String,
    pub manual_section: String,
}

impl TitleFields {
    pub const NAMES: [&'static str; TITLE_FIELDS] =
        ["title", "section", "date", "source", "manual_section"];

    fn from_fields(fields: Vec<String>) -> Self {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Self {
            title: next(),
            section: next(),
            date: next(),
            source: next(),
            manual_section: next(),
        }
    }

    /// Field names paired with their values, in `.TH` order.
    pub fn entries(&self) -> [(&'static str, &str); TITLE_FIELDS] {
        let names = Self::NAMES;
        [
            (names[0], self.title.as_str()),
            (names[1], self.section.as_str()),
            (names[2], self.date.as_str()),
            (names[3], self.source.as_str()),
            (names[4], self.manual_section.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A body line, kept exactly as written.
    Text(String),
    /// The raw remainder of a `.LN` line: `<target> <label...>`.
    Link(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Text,
    Link,
}

impl CommandKind {
    pub fn ordinal(self) -> u8 {
        match self {
            CommandKind::Text => 0,
            CommandKind::Link => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Text => "text",
            CommandKind::Link => "link",
        }
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Text(_) => CommandKind::Text,
            Command::Link(_) => CommandKind::Link,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Command::Text(content) | Command::Link(content) => content,
        }
    }

    /// Splits a link payload into `(target, label)`.
    ///
    /// The payload is trimmed first, then split on its first space. A link
    /// without a label uses the target as its label. Returns `None` for text.
    pub fn link_parts(&self) -> Option<(&str, &str)> {
        let Command::Link(payload) = self else {
            return None;
        };
        let payload = payload.trim();
        match payload.split_once(' ') {
            Some((target, label)) if !label.trim().is_empty() => {
                Some((target.trim(), label.trim()))
            }
            Some((target, _)) => Some((target.trim(), target.trim())),
            None => Some((payload, payload)),
        }
    }
}

/// A recoverable problem found while parsing. Parsing continues past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub path: String,
    pub line: usize,
    pub content: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: warning: unrecognized command: {}",
            self.path, self.line, self.content
        )
    }
}

#[derive(Debug)]
pub enum MansiteError {
    TextOutsideSection { path: String, line: usize },
    LinkOutsideSection { path: String, line: usize },
    Yaml(String),
    Schema(String),
    Io { path: String, message: String },
    Json(String),
}

impl fmt::Display for MansiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MansiteError::TextOutsideSection { path, line } => write!(
                f,
                "{path}:{line}: error: trying to add text without specifying section header .SH"
            ),
            MansiteError::LinkOutsideSection { path, line } => write!(
                f,
                "{path}:{line}: error: trying to add link without specifying section header .SH"
            ),
            MansiteError::Yaml(msg) => write!(f, "yaml parse error: {msg}"),
            MansiteError::Schema(msg) => write!(f, "schema validation error: {msg}"),
            MansiteError::Io { path, message } => {
                write!(f, "error: while trying to read file '{path}': {message}")
            }
            MansiteError::Json(msg) => write!(f, "json error: {msg}"),
        }
    }
}

impl Error for MansiteError {}

pub type Result<T> = std::result::Result<T, MansiteError>;

struct PageBuilder<'p> {
    path: &'p str,
    document: Document,
    warnings: Vec<ParseWarning>,
}

impl<'p> PageBuilder<'p> {
    fn new(path: &'p str) -> Self {
        Self {
            path,
            document: Document::default(),
            warnings: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str, number: usize) -> Result<()> {
        if let Some(rest) = line.strip_prefix(".TH") {
            let fields = split_title_fields(rest.trim_start());
            self.document.title = TitleFields::from_fields(fields);
        } else if let Some(rest) = line.strip_prefix(".SH") {
            self.document.sections.push(Section {
                name: rest.trim_start().to_string(),
                commands: Vec::new(),
            });
        } else if let Some(rest) = line.strip_prefix(".LN") {
            let path = self.path;
            let section = self.current_section().ok_or_else(|| {
                MansiteError::LinkOutsideSection {
                    path: path.to_string(),
                    line: number,
                }
            })?;
            section.commands.push(Command::Link(rest.to_string()));
        } else if line.starts_with('.') {
            self.warnings.push(ParseWarning {
                path: self.path.to_string(),
                line: number,
                content: line.to_string(),
            });
        } else {
            let path = self.path;
            let section = self.current_section().ok_or_else(|| {
                MansiteError::TextOutsideSection {
                    path: path.to_string(),
                    line: number,
                }
            })?;
            section.commands.push(Command::Text(line.to_string()));
        }
        Ok(())
    }

    fn current_section(&mut self) -> Option<&mut Section> {
        self.document.sections.last_mut()
    }

    fn finish(self) -> (Document, Vec<ParseWarning>) {
        (self.document, self.warnings)
    }
}

/// Splits the remainder of a `.TH` line into at most five fields.
///
/// Every unescaped space ends a field, so doubled spaces yield empty fields.
/// A backslash keeps the following space from splitting. The fifth field
/// runs to the end of the line, and the last character always closes the
/// field being collected.
fn split_title_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(TITLE_FIELDS);
    let mut escape = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        if fields.len() == TITLE_FIELDS {
            break;
        }
        let end = idx + ch.len_utf8();
        let last_field = fields.len() + 1 == TITLE_FIELDS;
        if (!escape && ch == ' ' && !last_field) || end == line.len() {
            fields.push(unescape_title_field(&line[start..end]).trim().to_string());
            start = idx;
            continue;
        }
        escape = ch == '\\';
    }
    fields
}

fn unescape_title_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&' ') {
            continue;
        }
        out.push(ch);
    }
    out
}

fn source_lines(source: &str) -> impl Iterator<Item = &str> {
    source.split_inclusive('\n').map(|line| {
        let line = line.strip_suffix('\n').unwrap_or(line);
        line.strip_suffix('\r').unwrap_or(line)
    })
}

/// Parses a page, returning the unrecognized-directive warnings alongside it.
///
/// `path` only names the source in diagnostics.
pub fn parse_document_with_warnings(
    source: &str,
    path: &str,
) -> Result<(Document, Vec<ParseWarning>)> {
    let mut builder = PageBuilder::new(path);
    for (idx, line) in source_lines(source).enumerate() {
        builder.push_line(line, idx + 1)?;
    }
    Ok(builder.finish())
}

/// Parses a page and reports unrecognized directives through `tracing`.
pub fn parse_document(source: &str, path: &str) -> Result<Document> {
    let (document, warnings) = parse_document_with_warnings(source, path)?;
    for warning in &warnings {
        tracing::warn!(
            path = %warning.path,
            line = warning.line,
            "unrecognized command: {}",
            warning.content
        );
    }
    tracing::debug!(path, sections = document.sections.len(), "parsed page");
    Ok(document)
}

pub fn convert_to_html(source: &str, path: &str, options: &RenderOptions) -> Result<String> {
    let document = parse_document(source, path)?;
    Ok(render_html(&document, options))
}

/// Plain-text projection of a document, one line per title field, section
/// and command.
pub fn render_summary(document: &Document) -> String {
    let mut out = String::new();
    for (name, value) in document.title.entries() {
        out.push_str(&format!("{name}: {value}\n"));
    }
    for section in &document.sections {
        out.push_str(&format!("SECTION {}\n", section.name));
        for command in &section.commands {
            out.push_str(&format!(
                "  COMMAND({}) {}\n",
                command.kind().ordinal(),
                command.content()
            ));
        }
    }
    out
}

pub fn summary_to_json(document: &Document) -> JsonValue {
    let mut title = JsonMap::new();
    for (name, value) in document.title.entries() {
        title.insert(name.to_string(), JsonValue::String(value.to_string()));
    }

    let sections = document
        .sections
        .iter()
        .map(|section| {
            let commands = section
                .commands
                .iter()
                .map(|command| {
                    let mut entry = JsonMap::new();
                    let kind = command.kind();
                    entry.insert("kind".to_string(), JsonValue::String(kind.name().to_string()));
                    entry.insert("ordinal".to_string(), JsonValue::from(kind.ordinal()));
                    entry.insert(
                        "content".to_string(),
                        JsonValue::String(command.content().to_string()),
                    );
                    JsonValue::Object(entry)
                })
                .collect::<Vec<_>>();
            let mut entry = JsonMap::new();
            entry.insert("name".to_string(), JsonValue::String(section.name.clone()));
            entry.insert("commands".to_string(), JsonValue::Array(commands));
            JsonValue::Object(entry)
        })
        .collect::<Vec<_>>();

    let mut root = JsonMap::new();
    root.insert("title".to_string(), JsonValue::Object(title));
    root.insert("sections".to_string(), JsonValue::Array(sections));
    JsonValue::Object(root)
}

pub fn render_summary_json(document: &Document) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&summary_to_json(document))
        .map_err(|err| MansiteError::Json(err.to_string()))?;
    out.push('\n');
    Ok(out)
}
