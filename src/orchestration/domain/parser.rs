//! Structured-data extraction from free-text engine responses.
//!
//! Engines answer in prose with fenced code blocks. Extraction never fails:
//! text that does not decode as JSON degrades to the raw response so a
//! human can follow up.

use serde_json::Value;

/// Result of extracting structured data from a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A JSON document was found and decoded.
    Parsed(Value),
    /// No decodable JSON was found; carries the original response.
    Degraded(String),
}

impl ParsedResponse {
    /// Returns `true` when no JSON could be decoded.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Returns the decoded value, or `{ <list_key>: [], "raw_response": … }`
    /// for degraded responses.
    #[must_use]
    pub fn into_document(self, list_key: &str) -> Value {
        match self {
            Self::Parsed(value) => value,
            Self::Degraded(raw) => {
                let mut document = serde_json::Map::new();
                document.insert(list_key.to_owned(), Value::Array(Vec::new()));
                document.insert("raw_response".to_owned(), Value::String(raw));
                Value::Object(document)
            }
        }
    }
}

/// One fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Info string after the opening fence, lowercased, e.g. `json`.
    pub language: String,
    /// Lines between the fences.
    pub body: Vec<&'a str>,
}

impl FencedBlock<'_> {
    /// Returns the block body joined with newlines.
    #[must_use]
    pub fn content(&self) -> String {
        self.body.join("\n")
    }
}

/// Returns every fenced code block in `text`, in order.
///
/// A block opens on a line starting with three backticks and closes on the
/// next such line. An unterminated block runs to the end of the text.
#[must_use]
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<FencedBlock<'_>> = None;
    for line in text.lines() {
        let trimmed = line.trim_start();
        match (trimmed.strip_prefix("```"), open.take()) {
            (Some(_), Some(block)) => blocks.push(block),
            (Some(info), None) => {
                open = Some(FencedBlock {
                    language: info.trim().to_ascii_lowercase(),
                    body: Vec::new(),
                });
            }
            (None, Some(mut block)) => {
                block.body.push(line);
                open = Some(block);
            }
            (None, None) => {}
        }
    }
    blocks.extend(open);
    blocks
}

/// Extracts a JSON document from a response.
///
/// Looks for a block labelled `json`, then any fenced block, then the whole
/// text, and decodes the first candidate found.
#[must_use]
pub fn extract_structured(text: &str) -> ParsedResponse {
    let blocks = fenced_blocks(text);
    let candidate = blocks
        .iter()
        .find(|block| block.language == "json")
        .or_else(|| blocks.first())
        .map_or_else(|| text.trim().to_owned(), FencedBlock::content);
    serde_json::from_str(&candidate).map_or_else(
        |_| ParsedResponse::Degraded(text.to_owned()),
        ParsedResponse::Parsed,
    )
}

/// An architecture decision record taken from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdrDocument {
    /// Artifact file name, `adr-<n>-<slug>.md` or `adr-<n>.md`.
    pub file_name: String,
    /// Title from the first Markdown heading, if any.
    pub title: Option<String>,
    /// Markdown body.
    pub content: String,
}

const MAX_SLUG_CHARS: usize = 50;

/// Extracts one ADR per fenced `markdown` block, numbered from 1.
#[must_use]
pub fn extract_adrs(text: &str) -> Vec<AdrDocument> {
    fenced_blocks(text)
        .into_iter()
        .filter(|block| block.language == "markdown")
        .enumerate()
        .map(|(index, block)| {
            let number = index.saturating_add(1);
            let title = block.body.iter().find_map(|line| heading(line));
            let slug = title.as_deref().map(slugify).unwrap_or_default();
            let file_name = if slug.is_empty() {
                format!("adr-{number}.md")
            } else {
                format!("adr-{number}-{slug}.md")
            };
            AdrDocument {
                file_name,
                title,
                content: block.content(),
            }
        })
        .collect()
}

fn heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let title = trimmed.trim_start_matches('#').trim();
    (!title.is_empty()).then(|| title.to_owned())
}

fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let truncated: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    truncated.trim_end_matches('-').to_owned()
}
