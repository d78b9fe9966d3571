//! HTML rendering of a parsed [`Document`].
//!
//! Body text, section names and title fields are emitted verbatim unless
//! [`RenderOptions::escape_text`] is set.

use crate::{Command, Document, Section};
use std::borrow::Cow;

pub const DEFAULT_STYLESHEET: &str = include_str!("../data/theme.css");
pub const DEFAULT_BACKGROUND: &str = "220";
pub const DEFAULT_TEXT: &str = "220";
pub const DEFAULT_ACCENT: &str = "30";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub stylesheet: String,
    pub background: String,
    pub text: String,
    pub accent: String,
    pub escape_text: bool,
}

impl RenderOptions {
    pub fn new(
        stylesheet: impl Into<String>,
        background: impl Into<String>,
        text: impl Into<String>,
        accent: impl Into<String>,
    ) -> Self {
        Self {
            stylesheet: stylesheet.into(),
            background: background.into(),
            text: text.into(),
            accent: accent.into(),
            escape_text: false,
        }
    }

    pub fn with_escaped_text(mut self, escape_text: bool) -> Self {
        self.escape_text = escape_text;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(
            DEFAULT_STYLESHEET,
            DEFAULT_BACKGROUND,
            DEFAULT_TEXT,
            DEFAULT_ACCENT,
        )
    }
}

struct HtmlWriter<'o> {
    output: String,
    options: &'o RenderOptions,
    depth: usize,
}

impl<'o> HtmlWriter<'o> {
    fn new(options: &'o RenderOptions) -> Self {
        Self {
            output: String::new(),
            options,
            depth: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.depth {
            self.output.push_str("  ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.write_line(tag);
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.write_line(tag);
    }

    fn text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.options.escape_text {
            Cow::Owned(html_escape(text))
        } else {
            Cow::Borrowed(text)
        }
    }

    fn write_preamble(&mut self, document: &Document) {
        self.write_line("<!DOCTYPE html>");
        self.open("<html>");
        self.open("<head>");
        self.write_line("<meta charset=\"utf-8\" />");
        self.write_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />");
        let title = self.text(&document.title.manual_section).into_owned();
        self.write_line(&format!("<title>{title}</title>"));
        self.write_colors();
        self.write_stylesheet();
        self.close("</head>");
        self.open("<body>");
        self.open("<div class=\"page\">");
    }

    fn write_colors(&mut self) {
        let options = self.options;
        let colors = [
            ("background", &options.background),
            ("text", &options.text),
            ("accent", &options.accent),
        ];
        self.open("<style>");
        self.open(":root {");
        for (name, degrees) in colors {
            self.write_line(&format!("--{name}-hue: {degrees}deg;"));
        }
        self.close("}");
        self.close("</style>");
    }

    fn write_stylesheet(&mut self) {
        self.write_line("<style>");
        self.output.push_str(&self.options.stylesheet);
        if !self.options.stylesheet.is_empty() && !self.options.stylesheet.ends_with('\n') {
            self.output.push('\n');
        }
        self.write_line("</style>");
    }

    fn write_identity(&mut self, document: &Document) {
        let title = self.text(&document.title.title).into_owned();
        let section = self.text(&document.title.section).into_owned();
        self.write_line(&format!(
            "<div class=\"man-id\"><span>{title}</span><span>{section}</span></div>"
        ));
    }

    fn write_header(&mut self, document: &Document) {
        self.open("<header class=\"man-header\">");
        self.write_identity(document);
        let heading = self.text(&document.title.manual_section).into_owned();
        self.write_line(&format!("<h1>{heading}</h1>"));
        self.write_identity(document);
        self.close("</header>");
    }

    fn write_section(&mut self, section: &Section) {
        self.open("<section class=\"man-section\">");
        let name = self.text(&section.name).into_owned();
        self.write_line(&format!("<h2>{name}</h2>"));
        for command in &section.commands {
            self.write_command(command);
        }
        self.close("</section>");
    }

    fn write_command(&mut self, command: &Command) {
        match command {
            Command::Text(content) if content.trim().is_empty() => {
                self.write_line("<br /><br />");
            }
            Command::Text(content) => {
                let content = self.text(content).into_owned();
                self.write_line(&content);
            }
            Command::Link(_) => {
                if let Some((target, label)) = command.link_parts() {
                    let target = self.text(target).into_owned();
                    let label = self.text(label).into_owned();
                    self.write_line(&format!("<a href=\"{target}\">{label}</a>"));
                }
            }
        }
    }

    fn write_footer(&mut self, document: &Document) {
        let title = &document.title;
        self.open("<footer class=\"man-footer\">");
        for field in [&title.source, &title.date, &title.source] {
            let field = self.text(field).into_owned();
            self.write_line(&format!("<span>{field}</span>"));
        }
        self.close("</footer>");
    }

    fn write_closing(&mut self) {
        self.close("</div>");
        self.close("</body>");
        self.close("</html>");
    }
}

/// Renders `document` as a standalone HTML page.
///
/// The color tokens land in `--background-hue`, `--text-hue` and
/// `--accent-hue` with a `deg` suffix, followed by the stylesheet text.
pub fn render_html(document: &Document, options: &RenderOptions) -> String {
    let mut writer = HtmlWriter::new(options);
    writer.write_preamble(document);
    writer.write_header(document);
    writer.open("<main>");
    for section in &document.sections {
        writer.write_section(section);
    }
    writer.close("</main>");
    writer.write_footer(document);
    writer.write_closing();
    writer.finish()
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
