//! Inline tag formatting: a small BBCode dialect.

use crate::escape::escape_html;
use std::collections::HashMap;
use std::fmt::Write;
use std::ops::Range;

/// Which kind of NationStates page a link tag points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Nation,
    Region,
}

impl LinkKind {
    /// The tag name, also the key in the canonical page URL.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Nation => "nation",
            Self::Region => "region",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TagKind {
    /// Wraps formatted content in the given HTML element.
    Simple(&'static str),
    /// Takes raw content and renders a link to a NationStates page.
    Link(LinkKind),
}

struct Token {
    start: usize,
    end: usize,
    kind: TokenKind,
}

enum TokenKind {
    Open {
        name: &'static str,
        element: &'static str,
    },
    Close {
        name: &'static str,
        element: &'static str,
    },
    Link {
        kind: LinkKind,
        inner: Range<usize>,
    },
}

/// Marks which tokens take effect. A closing tag pairs with the nearest
/// open tag of the same name; open tags left above it on the stack, stray
/// closing tags and tags still open at the end stay literal.
fn pair_tokens(tokens: &[Token]) -> Vec<bool> {
    let mut paired = vec![false; tokens.len()];
    let mut stack: Vec<(usize, &'static str)> = Vec::new();
    let mut open_counts: HashMap<&'static str, usize> = HashMap::new();

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Open { name, .. } => {
                stack.push((i, name));
                *open_counts.entry(name).or_default() += 1;
            }
            TokenKind::Close { name, .. } => {
                if open_counts.get(name).copied().unwrap_or(0) == 0 {
                    continue;
                }
                while let Some((j, open_name)) = stack.pop() {
                    if let Some(count) = open_counts.get_mut(open_name) {
                        *count -= 1;
                    }
                    if open_name == name {
                        paired[j] = true;
                        paired[i] = true;
                        break;
                    }
                }
            }
            TokenKind::Link { .. } => paired[i] = true,
        }
    }

    paired
}

const MAX_TAG_NAME_LEN: usize = 16;
const LINK_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

/// Formats inline text: escapes HTML, auto-links raw URLs and expands tags.
///
/// Unknown, stray or unclosed tags are kept as literal text.
#[derive(Debug, Clone)]
pub struct TagFormatter {
    tags: HashMap<&'static str, TagKind>,
    site_url: String,
    linkify: bool,
    replace_newlines: bool,
}

impl Default for TagFormatter {
    fn default() -> Self {
        let tags = HashMap::from([
            ("b", TagKind::Simple("strong")),
            ("i", TagKind::Simple("em")),
            ("u", TagKind::Simple("u")),
            ("s", TagKind::Simple("del")),
        ]);
        Self {
            tags,
            site_url: String::new(),
            linkify: true,
            replace_newlines: true,
        }
    }
}

impl TagFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `[nation]` and `[region]`, linking to pages under `site_url`.
    pub fn with_link_tags(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        for kind in [LinkKind::Nation, LinkKind::Region] {
            self.tags.insert(kind.tag(), TagKind::Link(kind));
        }
        self
    }

    pub fn linkify(mut self, enabled: bool) -> Self {
        self.linkify = enabled;
        self
    }

    pub fn replace_newlines(mut self, enabled: bool) -> Self {
        self.replace_newlines = enabled;
        self
    }

    /// Formats `src` in one pass.
    ///
    /// Tags are first collected as tokens, then paired with an explicit
    /// stack, so unclosed tags cost nothing extra and nesting depth is
    /// bounded only by input length.
    pub fn format(&self, src: &str) -> String {
        let tokens = self.tokenize(src);
        let paired = pair_tokens(&tokens);

        let mut out = String::with_capacity(src.len() + src.len() / 4);
        let mut text_start = 0;
        for (token, _) in tokens.iter().zip(&paired).filter(|(_, paired)| **paired) {
            self.emit_text(&src[text_start..token.start], &mut out);
            match &token.kind {
                TokenKind::Open { element, .. } => {
                    let _ = write!(out, "<{element}>");
                }
                TokenKind::Close { element, .. } => {
                    let _ = write!(out, "</{element}>");
                }
                TokenKind::Link { kind, inner } => {
                    out.push_str(&self.render_link(*kind, &src[inner.clone()]));
                }
            }
            text_start = token.end;
        }
        self.emit_text(&src[text_start..], &mut out);
        out
    }

    /// Collects known tags. Link tags are matched with their closing tag
    /// right away since their content is never formatted.
    fn tokenize(&self, src: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        // Next closing tag per link tag name; `None` once none remain.
        let mut next_close: HashMap<&'static str, Option<usize>> = HashMap::new();
        let mut pos = 0;

        while let Some(rel) = src[pos..].find('[') {
            let at = pos + rel;
            let Some(tag) = parse_tag(&src[at..]) else {
                pos = at + 1;
                continue;
            };
            let Some((&name, &kind)) = self.tags.get_key_value(tag.name.as_str()) else {
                pos = at + 1;
                continue;
            };
            let end = at + tag.len;

            match kind {
                TagKind::Simple(element) => {
                    let kind = if tag.closing {
                        TokenKind::Close { name, element }
                    } else {
                        TokenKind::Open { name, element }
                    };
                    tokens.push(Token { start: at, end, kind });
                    pos = end;
                }
                TagKind::Link(link) if !tag.closing => {
                    let close_at = match next_close.get(name) {
                        Some(None) => None,
                        Some(&Some(close)) if close >= end => Some(close),
                        _ => {
                            let found = find_ignore_ascii_case(&src[end..], &format!("[/{name}]"))
                                .map(|i| end + i);
                            next_close.insert(name, found);
                            found
                        }
                    };
                    match close_at {
                        Some(close) if !src[end..close].trim().is_empty() => {
                            let after = close + name.len() + 3;
                            tokens.push(Token {
                                start: at,
                                end: after,
                                kind: TokenKind::Link {
                                    kind: link,
                                    inner: end..close,
                                },
                            });
                            pos = after;
                        }
                        _ => pos = at + 1,
                    }
                }
                TagKind::Link(_) => pos = at + 1,
            }
        }

        tokens
    }

    fn render_link(&self, kind: LinkKind, raw: &str) -> String {
        let display = display_name(raw.trim());
        let slug = display.replace(' ', "_").to_lowercase();
        format!(
            "<a href=\"{}/{}={}\">{}</a>",
            escape_html(&self.site_url),
            kind.tag(),
            escape_html(&slug),
            escape_html(&display)
        )
    }

    fn emit_text(&self, text: &str, out: &mut String) {
        let mut rest = text;
        if self.linkify {
            while let Some((start, end, href)) = find_link(rest) {
                self.push_plain(&rest[..start], out);
                let _ = write!(
                    out,
                    "<a rel=\"nofollow\" href=\"{}\">{}</a>",
                    escape_html(&href),
                    escape_html(&rest[start..end])
                );
                rest = &rest[end..];
            }
        }
        self.push_plain(rest, out);
    }

    fn push_plain(&self, text: &str, out: &mut String) {
        let escaped = escape_html(text);
        if self.replace_newlines {
            out.push_str(&escaped.replace('\n', "<br />"));
        } else {
            out.push_str(&escaped);
        }
    }
}

/// Normalizes a nation or region name for display.
///
/// Underscores become spaces; the result is title-cased unless its first
/// letter is already upper-case.
pub fn display_name(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let capitalized = spaced
        .chars()
        .find(|c| c.is_alphabetic())
        .map_or(true, char::is_uppercase);
    if capitalized {
        spaced
    } else {
        title_case(&spaced)
    }
}

/// Upper-cases every letter that follows a non-letter, lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

struct ParsedTag {
    name: String,
    closing: bool,
    len: usize,
}

/// Parses `[name]` or `[/name]` at the start of `s`. Names are ASCII letters.
fn parse_tag(s: &str) -> Option<ParsedTag> {
    let inner = s.strip_prefix('[')?;
    let (closing, name_src) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name_len = name_src
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    if name_len == 0 || name_len > MAX_TAG_NAME_LEN || name_src.as_bytes().get(name_len) != Some(&b']') {
        return None;
    }
    Some(ParsedTag {
        name: name_src[..name_len].to_ascii_lowercase(),
        closing,
        len: 1 + usize::from(closing) + name_len + 1,
    })
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Finds the first auto-linkable URL in `text`: `(start, end, href)`.
fn find_link(text: &str) -> Option<(usize, usize, String)> {
    let mut search = 0;
    while search < text.len() {
        let start = LINK_PREFIXES
            .iter()
            .filter_map(|p| find_ignore_ascii_case(&text[search..], p))
            .min()?
            + search;

        let at_boundary = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || "([<\"'".contains(c));
        if !at_boundary {
            search = start + 1;
            continue;
        }

        let mut end = text[start..]
            .find(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"'))
            .map_or(text.len(), |i| start + i);
        while end > start && text[..end].ends_with(['.', ',', ';', ':', '!', '?', ')', '\'', '"']) {
            end -= 1;
        }

        let raw = &text[start..end];
        let href = if raw.len() >= 4 && raw[..4].eq_ignore_ascii_case("www.") {
            format!("http://{raw}")
        } else {
            raw.to_string()
        };

        let valid = url::Url::parse(&href).is_ok_and(|u| {
            u.host_str()
                .is_some_and(|host| !host.is_empty() && !host.ends_with('.'))
        });
        if valid {
            return Some((start, end, href));
        }
        search = start + 1;
    }
    None
}
