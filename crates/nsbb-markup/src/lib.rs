//! Post markup for the nsbb forum.
//!
//! Rendering is split in two layers:
//!
//! - a [`BlockParser`] that cuts a post into blocks, consulting an ordered
//!   list of [`BlockRule`]s and leaving everything else as markdown;
//! - a [`PostRenderer`] that turns each block into HTML through an ordered
//!   list of [`RenderStrategy`]s, the first strategy with an opinion winning.
//!   Markdown blocks go through CommonMark, with their text runs handed to
//!   the first text strategy.
//!
//! Plugins contribute rules and strategies; the host composes them into a
//! single renderer. Nothing here knows which plugins exist.

mod block;
mod escape;
mod render;
mod tags;

pub use block::{Block, BlockParser, BlockRule, RmbQuote, RmbQuoteRule};
pub use escape::escape_html;
pub use render::{
    PostRenderer, QuoteTemplate, RenderStrategy, RmbQuoteStrategy, TagFormatterStrategy,
    DEFAULT_QUOTE_TEMPLATE,
};
pub use tags::{display_name, LinkKind, TagFormatter};
