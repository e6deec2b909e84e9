//! Content module - post models, rich text rendering and reading time

mod post;
mod reading_time;
mod rich_text;
mod trusted;

pub use post::{ContentBlock, PostDetail, PostDetailData, PostSummary, PostSummaryData};
pub use reading_time::{content_text, content_words, count_words, estimate, estimate_with, WORDS_PER_MINUTE};
pub use rich_text::{Block, BlockKind, LinkResolver, Oembed, RichText, Span, SpanData, SpanKind};
pub use trusted::TrustedHtml;
