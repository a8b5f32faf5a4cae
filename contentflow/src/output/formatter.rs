//! Renders final content into deliverable documents.

use super::OutputFormat;
use crate::envelope::CustomerContext;
use crate::utils::{format_iso8601, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Inputs to a render besides the content itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    /// Primary format.
    pub format: OutputFormat,
    /// Whether to embed metadata in the document.
    pub include_metadata: bool,
    /// Customer the content was produced for.
    pub customer_context: Option<CustomerContext>,
    /// File name without extension.
    pub basename: String,
    /// Document title.
    pub title: Option<String>,
    /// Generation time recorded in the metadata block.
    pub generated_at: Option<Timestamp>,
}

impl RenderOptions {
    /// Creates options for a format.
    #[must_use]
    pub fn new(format: OutputFormat, basename: impl Into<String>) -> Self {
        Self {
            format,
            basename: basename.into(),
            ..Default::default()
        }
    }

    /// Embeds metadata.
    #[must_use]
    pub fn with_metadata(mut self, customer_context: CustomerContext, generated_at: Timestamp) -> Self {
        self.include_metadata = true;
        self.customer_context = Some(customer_context);
        self.generated_at = Some(generated_at);
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if !self.include_metadata {
            return map;
        }
        if let Some(ctx) = &self.customer_context {
            map.extend(ctx.to_dict());
        }
        if let Some(at) = &self.generated_at {
            map.insert("generated_at".to_string(), format_iso8601(at));
        }
        if let Some(title) = &self.title {
            map.insert("title".to_string(), title.clone());
        }
        map
    }

    fn filename(&self, format: OutputFormat) -> String {
        let base = if self.basename.trim().is_empty() {
            "output"
        } else {
            self.basename.trim()
        };
        format!("{base}.{}", format.extension())
    }
}

/// One rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedArtifact {
    /// Format of `content`.
    pub format: OutputFormat,
    /// The document.
    pub content: String,
    /// Suggested file name.
    pub filename: String,
    /// Size of `content` in bytes.
    pub size_bytes: usize,
}

/// The primary rendering plus every alternative format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOutput {
    /// Rendering in the requested format.
    pub primary: RenderedArtifact,
    /// Renderings in the remaining formats.
    pub alternatives: Vec<RenderedArtifact>,
}

impl RenderedOutput {
    /// Looks up a rendering by format.
    #[must_use]
    pub fn get(&self, format: OutputFormat) -> Option<&RenderedArtifact> {
        std::iter::once(&self.primary)
            .chain(&self.alternatives)
            .find(|a| a.format == format)
    }
}

/// Stateless renderer for every [`OutputFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    /// Creates a formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders `content` in the primary format and every other format.
    #[must_use]
    pub fn render_all(&self, content: &str, options: &RenderOptions) -> RenderedOutput {
        let primary = self.render(content, options, options.format);
        let alternatives = OutputFormat::ALL
            .into_iter()
            .filter(|f| *f != options.format)
            .map(|f| self.render(content, options, f))
            .collect();
        RenderedOutput {
            primary,
            alternatives,
        }
    }

    /// Renders `content` in one format.
    #[must_use]
    pub fn render(&self, content: &str, options: &RenderOptions, format: OutputFormat) -> RenderedArtifact {
        let metadata = options.metadata();
        let body = match format {
            OutputFormat::Html => render_html(content, options.title.as_deref(), &metadata),
            OutputFormat::Markdown => render_markdown(content, &metadata),
            OutputFormat::Json => render_json(content, &metadata),
            OutputFormat::Xml => render_xml(content, &metadata),
            OutputFormat::PlainText => render_plain(content),
        };
        RenderedArtifact {
            format,
            size_bytes: body.len(),
            filename: options.filename(format),
            content: body,
        }
    }
}

fn render_html(content: &str, title: Option<&str>, metadata: &BTreeMap<String, String>) -> String {
    let mut out = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_markup(title.unwrap_or("Generated content")));
    for (key, value) in metadata {
        let _ = writeln!(
            out,
            "<meta name=\"{}\" content=\"{}\">",
            escape_markup(key),
            escape_markup(value)
        );
    }
    out.push_str("</head>\n<body>\n");

    for block in blocks(content) {
        let lines: Vec<&str> = block.lines().collect();
        if lines.iter().all(|l| list_item(l).is_some()) {
            out.push_str("<ul>\n");
            for &line in &lines {
                let item = list_item(line).unwrap_or(line);
                let _ = writeln!(out, "<li>{}</li>", escape_markup(item));
            }
            out.push_str("</ul>\n");
        } else if let Some((level, text)) = heading(block) {
            let _ = writeln!(out, "<h{level}>{}</h{level}>", escape_markup(text));
        } else {
            let text = lines
                .iter()
                .map(|l| escape_markup(l.trim()))
                .collect::<Vec<_>>()
                .join("<br>\n");
            let _ = writeln!(out, "<p>{text}</p>");
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_markdown(content: &str, metadata: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    if !metadata.is_empty() {
        out.push_str("---\n");
        for (key, value) in metadata {
            let _ = writeln!(out, "{key}: {}", serde_json::json!(value));
        }
        out.push_str("---\n\n");
    }
    out.push_str(content.trim());
    out.push('\n');
    out
}

fn render_json(content: &str, metadata: &BTreeMap<String, String>) -> String {
    let mut doc = serde_json::json!({
        "format": "json",
        "content": content,
    });
    if !metadata.is_empty() {
        doc["metadata"] = serde_json::json!(metadata);
    }
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
}

fn render_xml(content: &str, metadata: &BTreeMap<String, String>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document>\n");
    if !metadata.is_empty() {
        out.push_str("  <metadata>\n");
        for (key, value) in metadata {
            let _ = writeln!(
                out,
                "    <entry key=\"{}\">{}</entry>",
                escape_markup(key),
                escape_markup(value)
            );
        }
        out.push_str("  </metadata>\n");
    }
    let _ = writeln!(out, "  <content>{}</content>", escape_markup(content.trim()));
    out.push_str("</document>\n");
    out
}

fn render_plain(content: &str) -> String {
    let mut out = String::new();
    for line in content.trim().lines() {
        let line = line.trim_end();
        let line = heading(line).map_or(line, |(_, text)| text);
        let line = list_item(line).map_or_else(|| line.to_string(), |item| format!("- {item}"));
        out.push_str(&line.replace("**", "").replace('`', ""));
        out.push('\n');
    }
    out
}

fn blocks(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
}

fn heading(block: &str) -> Option<(usize, &str)> {
    let trimmed = block.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 || block.contains('\n') {
        return None;
    }
    let text = trimmed[level..].strip_prefix(' ')?;
    Some((level, text.trim()))
}

fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim)
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CustomerTier;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const CONTENT: &str = "# Launch notes\n\nWe shipped <fast> & safe.\n\n- one\n- two";

    #[test]
    fn test_html_structure_and_escaping() {
        let options = RenderOptions::new(OutputFormat::Html, "launch");
        let artifact = OutputFormatter::new().render(CONTENT, &options, OutputFormat::Html);

        assert!(artifact.content.contains("<h1>Launch notes</h1>"));
        assert!(artifact.content.contains("<p>We shipped &lt;fast&gt; &amp; safe.</p>"));
        assert!(artifact.content.contains("<li>two</li>"));
        assert_eq!(artifact.filename, "launch.html");
        assert_eq!(artifact.size_bytes, artifact.content.len());
    }

    #[test]
    fn test_render_all_covers_every_format_once() {
        let options = RenderOptions::new(OutputFormat::Markdown, "");
        let output = OutputFormatter::new().render_all("Y", &options);

        assert_eq!(output.primary.format, OutputFormat::Markdown);
        assert_eq!(output.primary.filename, "output.md");
        assert_eq!(output.alternatives.len(), 4);
        for format in OutputFormat::ALL {
            let artifact = output.get(format).unwrap();
            assert!(artifact.content.contains('Y'));
        }
    }

    #[test]
    fn test_json_is_structured() {
        let options = RenderOptions::new(OutputFormat::Json, "x");
        let artifact = OutputFormatter::new().render("He said \"hi\"", &options, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&artifact.content).unwrap();

        assert_eq!(parsed["content"], "He said \"hi\"");
        assert!(parsed.get("metadata").is_none());
    }

    #[test]
    fn test_metadata_is_embedded_when_requested() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let options = RenderOptions::new(OutputFormat::Xml, "x")
            .with_metadata(CustomerContext::new(CustomerTier::Enterprise), at);
        let formatter = OutputFormatter::new();

        let xml = formatter.render("body", &options, OutputFormat::Xml);
        assert!(xml.content.contains("<entry key=\"tier\">enterprise</entry>"));

        let md = formatter.render("body", &options, OutputFormat::Markdown);
        assert!(md.content.starts_with("---\n"));
        assert!(md.content.contains("generated_at: \"2024-05-01"));

        let json = formatter.render("body", &options, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json.content).unwrap();
        assert_eq!(parsed["metadata"]["tier"], "enterprise");
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let options = RenderOptions::new(OutputFormat::PlainText, "x");
        let artifact = OutputFormatter::new().render("## Title\n**bold** `code`", &options, OutputFormat::PlainText);
        assert_eq!(artifact.content, "Title\nbold code\n");
    }

    #[test]
    fn test_rendering_is_pure() {
        let options = RenderOptions::new(OutputFormat::Html, "x");
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.render_all(CONTENT, &options), formatter.render_all(CONTENT, &options));
    }
}
