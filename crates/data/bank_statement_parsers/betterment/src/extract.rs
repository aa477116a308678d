//! Block adapter over the PDF text-extraction collaborator.
//!
//! Everything downstream works on [`TextLine`] values: ordered logical lines
//! with page/row provenance, each split into column-offset-tagged tokens. A
//! token is a run of text separated from its neighbors by two or more spaces,
//! which is how the extractor renders the statement's table columns.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to extract text from statement PDF: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
}

#[derive(Debug, Clone)]
pub struct Token {
    /// Character offset of the token start within its line.
    pub col: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub page: u32,
    /// 1-based line number within the document.
    pub row: u32,
    /// Token texts joined with single spaces; what pattern rules match on.
    pub raw: String,
    pub tokens: Vec<Token>,
}

fn page_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Page [0-9]+ of [0-9]+$").unwrap())
}

pub fn is_page_marker(raw: &str) -> bool {
    page_marker_re().is_match(raw)
}

/// Runs the extraction collaborator over the raw document bytes. Failure here
/// is fatal: without structured text there is nothing to convert.
pub fn extract_lines(bytes: &[u8]) -> Result<Vec<TextLine>, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(bytes)?;
    Ok(lines_from_text(&text))
}

/// Normalizes already-extracted statement text. Used by tests and by callers
/// that hold the collaborator's output directly.
pub fn lines_from_text(text: &str) -> Vec<TextLine> {
    let mut out = Vec::new();
    let mut page = 1u32;
    for (idx, raw_line) in text.lines().enumerate() {
        let tokens = tokenize(raw_line);
        if tokens.is_empty() {
            continue;
        }
        let raw = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let marker = is_page_marker(&raw);
        out.push(TextLine {
            page,
            row: idx as u32 + 1,
            raw,
            tokens,
        });
        if marker {
            page += 1;
        }
    }
    out
}

/// Splits a line on runs of two or more spaces, keeping single spaces inside
/// a token. Records the character offset of each token start.
fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut gap = 0usize;
    let mut buf = String::new();

    for (i, ch) in line.chars().enumerate() {
        if ch == ' ' || ch == '\t' {
            gap += if ch == '\t' { 2 } else { 1 };
            continue;
        }
        match start {
            None => {
                start = Some(i);
                buf.push(ch);
            }
            Some(_) if gap >= 2 => {
                tokens.push(Token {
                    col: start.unwrap(),
                    text: std::mem::take(&mut buf),
                });
                start = Some(i);
                buf.push(ch);
            }
            Some(_) => {
                if gap == 1 {
                    buf.push(' ');
                }
                buf.push(ch);
            }
        }
        gap = 0;
    }
    if let Some(col) = start {
        if !buf.is_empty() {
            tokens.push(Token { col, text: buf });
        }
    }
    tokens
}
