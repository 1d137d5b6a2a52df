//! Composition of block parsing and rendering strategies.

use crate::block::{Block, BlockParser, RmbQuote};
use crate::escape::escape_html;
use crate::tags::TagFormatter;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::sync::Arc;

/// One contributed piece of rendering behaviour.
///
/// Both methods default to "no opinion"; the renderer asks strategies in
/// order and uses the first answer.
pub trait RenderStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Renders a whole block. `renderer` gives access to inline formatting.
    fn render_block(&self, _block: &Block, _renderer: &PostRenderer) -> Option<String> {
        None
    }

    /// Formats a run of inline text into HTML.
    fn render_text(&self, _text: &str) -> Option<String> {
        None
    }
}

/// A block parser plus an ordered list of render strategies.
#[derive(Clone, Default)]
pub struct PostRenderer {
    parser: BlockParser,
    strategies: Vec<Arc<dyn RenderStrategy>>,
}

impl PostRenderer {
    pub fn new(parser: BlockParser, strategies: Vec<Arc<dyn RenderStrategy>>) -> Self {
        Self { parser, strategies }
    }

    pub fn parser(&self) -> &BlockParser {
        &self.parser
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Renders a full post to HTML.
    pub fn render(&self, src: &str) -> String {
        self.parser
            .parse(src)
            .iter()
            .map(|block| self.render_block(block))
            .collect()
    }

    pub fn render_block(&self, block: &Block) -> String {
        self.strategies
            .iter()
            .find_map(|s| s.render_block(block, self))
            .unwrap_or_else(|| match block {
                Block::Markdown(text) => self.markdown(text),
                Block::RmbQuote(quote) => {
                    format!("<blockquote>{}</blockquote>\n", self.inline(&quote.text))
                }
            })
    }

    /// Renders CommonMark. Raw HTML is shown as text, text runs go through
    /// [`inline`](Self::inline) outside code and links, and link targets
    /// with unsafe schemes are replaced by `#`.
    pub fn markdown(&self, src: &str) -> String {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
        let mut events = Vec::new();
        let mut text = String::new();
        let mut code_depth = 0usize;
        let mut link_depth = 0usize;

        for event in Parser::new_ext(src, options) {
            match event {
                Event::Text(t) if code_depth == 0 => text.push_str(&t),
                Event::Html(t) | Event::InlineHtml(t) => text.push_str(&t),
                Event::SoftBreak => text.push('\n'),
                Event::Start(Tag::HtmlBlock) => {
                    events.push(Event::Start(Tag::Paragraph));
                }
                Event::End(TagEnd::HtmlBlock) => {
                    let trimmed = text.trim_end_matches('\n').len();
                    text.truncate(trimmed);
                    self.flush_text(&mut text, link_depth > 0, &mut events);
                    events.push(Event::End(TagEnd::Paragraph));
                }
                other => {
                    self.flush_text(&mut text, link_depth > 0, &mut events);
                    match &other {
                        Event::Start(Tag::CodeBlock(_)) => code_depth += 1,
                        Event::End(TagEnd::CodeBlock) => code_depth -= 1,
                        Event::Start(Tag::Link { .. }) => link_depth += 1,
                        Event::End(TagEnd::Link) => link_depth -= 1,
                        _ => {}
                    }
                    events.push(sanitize_link(other));
                }
            }
        }
        self.flush_text(&mut text, link_depth > 0, &mut events);

        let mut out = String::with_capacity(src.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn flush_text(&self, text: &mut String, in_link: bool, events: &mut Vec<Event<'static>>) {
        if text.is_empty() {
            return;
        }
        let html = if in_link {
            escape_html(text).replace('\n', "<br />")
        } else {
            self.inline(text)
        };
        text.clear();
        events.push(Event::InlineHtml(html.into()));
    }

    /// Formats inline text with the first strategy that handles text.
    pub fn inline(&self, text: &str) -> String {
        self.strategies
            .iter()
            .find_map(|s| s.render_text(text))
            .unwrap_or_else(|| escape_html(text).replace('\n', "<br />"))
    }
}

const SAFE_SCHEMES: [&str; 3] = ["http:", "https:", "mailto:"];

/// Whether `dest` is relative or uses an allowed scheme.
fn is_safe_destination(dest: &str) -> bool {
    let lower = dest.trim_start().to_ascii_lowercase();
    let scheme_end = lower.find([':', '/', '?', '#']);
    match scheme_end {
        Some(i) if lower.as_bytes()[i] == b':' => {
            SAFE_SCHEMES.iter().any(|s| lower.starts_with(s))
        }
        _ => true,
    }
}

fn sanitize_link(event: Event<'_>) -> Event<'static> {
    let event = match event {
        Event::Start(Tag::Link { link_type, dest_url, title, id })
            if !is_safe_destination(&dest_url) =>
        {
            Event::Start(Tag::Link {
                link_type,
                dest_url: CowStr::Borrowed("#"),
                title,
                id,
            })
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id })
            if !is_safe_destination(&dest_url) =>
        {
            Event::Start(Tag::Image {
                link_type,
                dest_url: CowStr::Borrowed("#"),
                title,
                id,
            })
        }
        other => other,
    };
    event.into_static()
}

/// Default markup for RMB quotes.
pub const DEFAULT_QUOTE_TEMPLATE: &str = "<blockquote class=\"rmb-quote\">\
<p class=\"rmb-quote-author\">{author} <a href=\"/post/{post_id}\">#{post_id}</a> wrote:</p>\
<div class=\"rmb-quote-text\">{text}</div>\
</blockquote>\n";

/// A string template with `{author}`, `{post_id}` and `{text}` placeholders.
///
/// Author and post ID are escaped on substitution; `text` must already be
/// HTML. Unknown placeholders are left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTemplate {
    source: String,
}

impl Default for QuoteTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_TEMPLATE)
    }
}

impl QuoteTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn render(&self, quote: &RmbQuote, text_html: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + text_html.len());
        let mut rest = self.source.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let value = match &after[..close] {
                    "author" => escape_html(&quote.author),
                    "post_id" => escape_html(&quote.post_id),
                    "text" => text_html.to_string(),
                    _ => return None,
                };
                Some((value, close))
            });
            match value {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Renders [`Block::RmbQuote`] through a [`QuoteTemplate`].
#[derive(Debug, Clone, Default)]
pub struct RmbQuoteStrategy {
    template: QuoteTemplate,
}

impl RmbQuoteStrategy {
    pub fn new(template: QuoteTemplate) -> Self {
        Self { template }
    }
}

impl RenderStrategy for RmbQuoteStrategy {
    fn name(&self) -> &'static str {
        "rmb_quote"
    }

    fn render_block(&self, block: &Block, renderer: &PostRenderer) -> Option<String> {
        match block {
            Block::RmbQuote(quote) => {
                Some(self.template.render(quote, &renderer.inline(&quote.text)))
            }
            _ => None,
        }
    }
}

/// Pipes inline text through a [`TagFormatter`].
#[derive(Debug, Clone, Default)]
pub struct TagFormatterStrategy {
    formatter: TagFormatter,
}

impl TagFormatterStrategy {
    pub fn new(formatter: TagFormatter) -> Self {
        Self { formatter }
    }
}

impl RenderStrategy for TagFormatterStrategy {
    fn name(&self) -> &'static str {
        "tag_formatter"
    }

    fn render_text(&self, text: &str) -> Option<String> {
        Some(self.formatter.format(text))
    }
}
