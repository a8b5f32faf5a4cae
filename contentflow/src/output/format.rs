use serde::{Deserialize, Serialize};
use std::fmt;

/// A rendering target for final content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Hypertext document.
    #[default]
    Html,
    /// Lightweight markup.
    Markdown,
    /// Structured JSON document.
    Json,
    /// Structured XML document.
    Xml,
    /// Unformatted text.
    PlainText,
}

impl OutputFormat {
    /// Every format, primary-first order used by `render_all`.
    pub const ALL: [Self; 5] = [
        Self::Html,
        Self::Markdown,
        Self::Json,
        Self::Xml,
        Self::PlainText,
    ];

    /// Parses a format name. Common aliases (`md`, `text`, `txt`) are accepted.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Self::Html),
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "plain_text" | "plaintext" | "text" | "txt" | "plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::PlainText => "txt",
        }
    }

    /// MIME type.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Markdown => "text/markdown",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::PlainText => "text/plain",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => write!(f, "html"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::PlainText => write!(f, "plain_text"),
        }
    }
}
