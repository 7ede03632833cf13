//! Front-matter extraction for `docsync-frontmatter`.
//!
//! `parse(text)` splits a markdown document into its leading `key: value`
//! block and the body that follows. A block is recognized when the first
//! token (after an optional blank run) is a thematic break and another
//! thematic break closes it within [`ParseOptions::max_closing_offset`]
//! tokens.
//!
//! ```text
//! ---
//! slug: getting-started
//! lang: en
//! title: Getting started
//! ---
//! Body text
//! ```

pub mod lexer;

use docsync_core::{config::FrontMatterConfig, FrontMatter};

pub use lexer::{tokenize, Token, TokenKind};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Parser knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Largest token offset from the opening rule searched for the closing
    /// rule. Offsets `1..=max_closing_offset` are accepted.
    pub max_closing_offset: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_closing_offset: 3,
        }
    }
}

impl From<&FrontMatterConfig> for ParseOptions {
    fn from(config: &FrontMatterConfig) -> Self {
        Self {
            max_closing_offset: config.max_closing_offset,
        }
    }
}

/// Result of [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub front_matter: FrontMatter,
    /// Text after the closing rule, or `None` when no block was found.
    pub body: Option<String>,
}

impl ParsedDocument {
    pub fn has_front_matter(&self) -> bool {
        self.body.is_some()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse `text` with [`ParseOptions::default`].
pub fn parse(text: &str) -> ParsedDocument {
    parse_with(text, &ParseOptions::default())
}

/// Parse `text`, searching for the closing rule within `options`' window.
pub fn parse_with(text: &str, options: &ParseOptions) -> ParsedDocument {
    let tokens = tokenize(text);

    let Some((open, close)) = delimiters(&tokens, options.max_closing_offset) else {
        return ParsedDocument::default();
    };

    let inner: String = tokens[open + 1..close].iter().map(|t| t.raw).collect();
    let body = text[tokens[close].span.end..].trim_start_matches(['\r', '\n']);

    ParsedDocument {
        front_matter: parse_pairs(&inner),
        body: Some(body.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Indices of the opening and closing rules, if the block is well formed.
fn delimiters(tokens: &[Token<'_>], max_offset: usize) -> Option<(usize, usize)> {
    let open = match tokens.first()?.kind {
        TokenKind::Space => 1,
        _ => 0,
    };
    if tokens.get(open)?.kind != TokenKind::Hr {
        return None;
    }
    (1..=max_offset)
        .map(|offset| open + offset)
        .take_while(|idx| *idx < tokens.len())
        .find(|idx| tokens[*idx].kind == TokenKind::Hr)
        .map(|close| (open, close))
}

fn parse_pairs(inner: &str) -> FrontMatter {
    inner
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_example() {
        let parsed = parse("---\nlang: en\ntitle: Hello\nslug: hello\n---\nBody text");
        assert_eq!(parsed.front_matter.get("lang"), Some("en"));
        assert_eq!(parsed.front_matter.get("title"), Some("Hello"));
        assert_eq!(parsed.front_matter.get("slug"), Some("hello"));
        assert_eq!(parsed.front_matter.len(), 3);
        assert_eq!(parsed.body.as_deref(), Some("Body text"));
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let parsed = parse("---\ntitle: Ratio: 3:2\n---\n");
        assert_eq!(parsed.front_matter.get("title"), Some("Ratio: 3:2"));
        assert_eq!(parsed.body.as_deref(), Some(""));
    }

    #[test]
    fn no_leading_rule_means_no_front_matter() {
        let parsed = parse("# Title\n\n---\nslug: x\n---\n");
        assert!(!parsed.has_front_matter());
        assert!(parsed.front_matter.is_empty());
    }

    #[test]
    fn options_from_config() {
        let options = ParseOptions::from(&FrontMatterConfig {
            max_closing_offset: 5,
        });
        assert_eq!(options.max_closing_offset, 5);
    }
}
