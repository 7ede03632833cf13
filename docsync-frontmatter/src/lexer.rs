//! Block-level markdown lexer.
//!
//! Only the block kinds the front-matter parser cares about are recognized.
//! Setext headings are not: a `---` line directly under text is always a
//! thematic break, so a front-matter block never swallows its closing rule.

use std::ops::Range;

/// Kind of a block token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// One or more blank lines.
    Space,
    /// Thematic break (`---`, `***`, `___`).
    Hr,
    /// ATX heading (`# Title`).
    Heading,
    /// Fenced code block, fences included.
    Code,
    /// Run of consecutive lines that are none of the above.
    Paragraph,
}

/// One block of the input, borrowing its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text of the block, trailing line break included.
    pub raw: &'a str,
    /// Byte range of `raw` within the input.
    pub span: Range<usize>,
}

/// Split `text` into block tokens. Concatenating every `raw` yields `text`.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let lines = split_lines(text);
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let start = lines[i].start;
        let line = &text[lines[i].clone()];

        let (kind, next) = if is_blank(line) {
            let mut j = i + 1;
            while j < lines.len() && is_blank(&text[lines[j].clone()]) {
                j += 1;
            }
            (TokenKind::Space, j)
        } else if is_thematic_break(line) {
            (TokenKind::Hr, i + 1)
        } else if is_atx_heading(line) {
            (TokenKind::Heading, i + 1)
        } else if let Some(fence) = opening_fence(line) {
            let mut j = i + 1;
            while j < lines.len() && !fence.is_closed_by(&text[lines[j].clone()]) {
                j += 1;
            }
            // Unclosed fences run to end of input.
            (TokenKind::Code, (j + 1).min(lines.len()))
        } else {
            let mut j = i + 1;
            while j < lines.len() && continues_paragraph(&text[lines[j].clone()]) {
                j += 1;
            }
            (TokenKind::Paragraph, j)
        };

        let end = lines[next - 1].end;
        tokens.push(Token {
            kind,
            raw: &text[start..end],
            span: start..end,
        });
        i = next;
    }

    tokens
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

fn split_lines(text: &str) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            lines.push(start..idx + 1);
            start = idx + 1;
        }
    }
    if start < text.len() {
        lines.push(start..text.len());
    }
    lines
}

fn content(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_blank(line: &str) -> bool {
    content(line).trim().is_empty()
}

/// Strip up to three leading spaces; `None` when the line is indented code.
fn strip_indent(line: &str) -> Option<&str> {
    let spaces = line.bytes().take_while(|b| *b == b' ').count();
    if spaces > 3 {
        None
    } else {
        Some(&line[spaces..])
    }
}

fn is_thematic_break(line: &str) -> bool {
    let Some(rest) = strip_indent(content(line)) else {
        return false;
    };
    let mut marker = None;
    let mut count = 0;
    for c in rest.chars() {
        match c {
            ' ' | '\t' => {}
            '-' | '*' | '_' => match marker {
                None => {
                    marker = Some(c);
                    count = 1;
                }
                Some(m) if m == c => count += 1,
                Some(_) => return false,
            },
            _ => return false,
        }
    }
    count >= 3
}

fn is_atx_heading(line: &str) -> bool {
    let Some(rest) = strip_indent(content(line)) else {
        return false;
    };
    let hashes = rest.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return false;
    }
    matches!(rest.as_bytes().get(hashes), None | Some(b' ') | Some(b'\t'))
}

struct Fence {
    marker: u8,
    len: usize,
}

impl Fence {
    fn is_closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_indent(content(line)) else {
            return false;
        };
        let len = rest.bytes().take_while(|b| *b == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }
}

fn opening_fence(line: &str) -> Option<Fence> {
    let rest = strip_indent(content(line))?;
    let marker = *rest.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = rest.bytes().take_while(|b| *b == marker).count();
    if len < 3 {
        return None;
    }
    // Backtick fences may not carry backticks in their info string.
    if marker == b'`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { marker, len })
}

fn continues_paragraph(line: &str) -> bool {
    !is_blank(line)
        && !is_thematic_break(line)
        && !is_atx_heading(line)
        && opening_fence(line).is_none()
}
