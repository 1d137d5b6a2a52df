//! Block-level parsing.

use std::sync::Arc;

/// A block-level unit of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Markdown source between rule matches, rendered as CommonMark.
    Markdown(String),
    /// A `[quote=author;post_id]...[/quote]` block.
    RmbQuote(RmbQuote),
}

/// Fields of a regional-message-board style quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmbQuote {
    /// Name of the quoted author, as written.
    pub author: String,
    /// ID of the quoted post (ASCII digits).
    pub post_id: String,
    /// Raw quoted text, trimmed. Rendered inline only, never re-parsed as blocks.
    pub text: String,
}

/// A rule recognizing one kind of block.
pub trait BlockRule: Send + Sync {
    /// Short identifier, used in logs and tests.
    fn name(&self) -> &'static str;

    /// Tries to match a block at the very start of `src`.
    ///
    /// Returns the block and the number of bytes it consumed, including any
    /// trailing whitespace on its last line.
    fn parse(&self, src: &str) -> Option<(Block, usize)>;
}

/// Splits posts into rule blocks and the markdown around them.
///
/// Rules are tried in order at the start of every line outside fenced code,
/// so a rule match always ends the markdown run before it.
#[derive(Clone, Default)]
pub struct BlockParser {
    rules: Vec<Arc<dyn BlockRule>>,
}

impl BlockParser {
    /// A parser with no rules: the whole post is markdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Earlier rules win.
    pub fn with_rule(mut self, rule: Arc<dyn BlockRule>) -> Self {
        self.push_rule(rule);
        self
    }

    pub fn push_rule(&mut self, rule: Arc<dyn BlockRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn parse(&self, src: &str) -> Vec<Block> {
        let normalized = src.replace("\r\n", "\n");
        let src = normalized.as_str();
        let mut blocks = Vec::new();
        let mut markdown_start = 0;
        let mut fence: Option<&'static str> = None;
        let mut pos = 0;

        while pos < src.len() {
            let rest = &src[pos..];
            let line = &rest[..line_len(rest)];

            if let Some(marker) = fence {
                if line.trim_start().starts_with(marker) {
                    fence = None;
                }
                pos += line.len();
                continue;
            }
            if let Some(marker) = fence_marker(line) {
                fence = Some(marker);
                pos += line.len();
                continue;
            }

            if let Some((block, used)) = self.match_rule(rest) {
                push_markdown(&src[markdown_start..pos], &mut blocks);
                blocks.push(block);
                pos += used.max(1);
                markdown_start = pos;
                continue;
            }

            pos += line.len();
        }

        push_markdown(&src[markdown_start..], &mut blocks);
        blocks
    }

    fn match_rule(&self, src: &str) -> Option<(Block, usize)> {
        let body = src.trim_start_matches([' ', '\t']);
        let indent = src.len() - body.len();
        self.rules
            .iter()
            .find_map(|rule| rule.parse(body))
            .map(|(block, used)| (block, indent + used))
    }
}

/// Pushes `src` as markdown unless it is blank. Leading blank lines and
/// trailing whitespace are dropped; indentation of the first line is kept.
fn push_markdown(src: &str, blocks: &mut Vec<Block>) {
    let mut start = 0;
    while start < src.len() {
        let len = line_len(&src[start..]);
        if !src[start..start + len].trim().is_empty() {
            break;
        }
        start += len;
    }
    let text = src[start..].trim_end();
    if !text.is_empty() {
        blocks.push(Block::Markdown(text.to_string()));
    }
}

/// The fence a line opens, if it starts a fenced code block.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m))
}

/// Length of the first line of `s`, including its newline.
fn line_len(s: &str) -> usize {
    s.find('\n').map_or(s.len(), |i| i + 1)
}

const QUOTE_OPEN: &str = "[quote=";
const QUOTE_CLOSE: &str = "[/quote]";

/// Recognizes `[quote=<author>;<post_id>]<text>[/quote]`.
///
/// The last `;` in the header separates the post ID, so authors may contain
/// semicolons. The closing tag is the first `[/quote]` after the header, so
/// quotes do not nest. The body may span lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmbQuoteRule;

impl BlockRule for RmbQuoteRule {
    fn name(&self) -> &'static str {
        "rmb_quote"
    }

    fn parse(&self, src: &str) -> Option<(Block, usize)> {
        let header = src.strip_prefix(QUOTE_OPEN)?;
        let header_end = header.find(']')?;
        let (author, post_id) = header[..header_end].rsplit_once(';')?;

        if author.is_empty() || author.contains('\n') {
            return None;
        }
        if post_id.is_empty() || !post_id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let body_start = QUOTE_OPEN.len() + header_end + 1;
        let body = &src[body_start..];
        let close = body.find(QUOTE_CLOSE)?;

        let mut consumed = body_start + close + QUOTE_CLOSE.len();
        let tail = &src[consumed..];
        let tail_line = line_len(tail);
        if tail[..tail_line].trim().is_empty() {
            consumed += tail_line;
        }

        let quote = RmbQuote {
            author: author.to_string(),
            post_id: post_id.to_string(),
            text: body[..close].trim().to_string(),
        };
        Some((Block::RmbQuote(quote), consumed))
    }
}
