//! Rich text documents as delivered by the CMS
//!
//! A document is an ordered list of blocks (headings, paragraphs, list
//! items, images, embeds). Text blocks carry inline spans addressed by
//! UTF-16 offsets into the block text.

use serde::{Deserialize, Serialize};

use super::TrustedHtml;
use crate::helpers::{html_escape, post_url};

/// Block types we know how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    Preformatted,
    ListItem,
    OrderedListItem,
    Image,
    Embed,
    Unknown,
}

/// Inline span types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

impl Span {
    pub fn kind(&self) -> SpanKind {
        match self.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => SpanKind::Hyperlink,
            "label" => SpanKind::Label,
            _ => SpanKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub oembed: Option<Oembed>,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self.kind.as_str() {
            "paragraph" => BlockKind::Paragraph,
            "preformatted" => BlockKind::Preformatted,
            "list-item" => BlockKind::ListItem,
            "o-list-item" => BlockKind::OrderedListItem,
            "image" => BlockKind::Image,
            "embed" => BlockKind::Embed,
            k => match k.strip_prefix("heading").and_then(|n| n.parse::<u8>().ok()) {
                Some(level @ 1..=6) => BlockKind::Heading(level),
                _ => BlockKind::Unknown,
            },
        }
    }
}

/// Turns document links into site URLs
#[derive(Debug, Clone)]
pub struct LinkResolver {
    root: String,
}

impl LinkResolver {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
        }
    }

    pub fn resolve(&self, data: &SpanData) -> Option<String> {
        match data.link_type.as_deref() {
            Some("Document") => data
                .uid
                .as_ref()
                .map(|uid| post_url(&self.root, uid)),
            _ => data.url.clone(),
        }
    }
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new("/")
    }
}

/// A structured text value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

impl RichText {
    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All text runs joined by a space, no markup
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rebuild markup for display
    pub fn as_html(&self, links: &LinkResolver) -> TrustedHtml {
        let mut out = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let kind = block.kind();
            let list_tag = match kind {
                BlockKind::ListItem => Some("ul"),
                BlockKind::OrderedListItem => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    out.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    out.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            let inner = || render_spans(block.text.as_deref().unwrap_or(""), &block.spans, links);

            match kind {
                BlockKind::Heading(level) => {
                    out.push_str(&format!("<h{0}>{1}</h{0}>", level, inner()));
                }
                BlockKind::Paragraph => out.push_str(&format!("<p>{}</p>", inner())),
                BlockKind::Preformatted => out.push_str(&format!("<pre>{}</pre>", inner())),
                BlockKind::ListItem | BlockKind::OrderedListItem => {
                    out.push_str(&format!("<li>{}</li>", inner()));
                }
                BlockKind::Image => {
                    if let Some(url) = &block.url {
                        out.push_str(&format!(
                            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                            html_escape(url),
                            html_escape(block.alt.as_deref().unwrap_or(""))
                        ));
                    }
                }
                BlockKind::Embed => {
                    if let Some(oembed) = &block.oembed {
                        out.push_str(&render_embed(oembed));
                    }
                }
                BlockKind::Unknown => {
                    tracing::debug!("Skipping unknown rich text block {:?}", block.kind);
                }
            }
        }

        if let Some(tag) = open_list {
            out.push_str(&format!("</{}>", tag));
        }

        TrustedHtml::new(out)
    }
}

fn render_embed(oembed: &Oembed) -> String {
    let mut attrs = String::new();
    if let Some(url) = &oembed.embed_url {
        attrs.push_str(&format!(r#" data-oembed="{}""#, html_escape(url)));
    }
    if let Some(kind) = &oembed.kind {
        attrs.push_str(&format!(r#" data-oembed-type="{}""#, html_escape(kind)));
    }
    if let Some(provider) = &oembed.provider_name {
        attrs.push_str(&format!(
            r#" data-oembed-provider="{}""#,
            html_escape(&provider.to_lowercase())
        ));
    }
    // Provider markup is trusted as-is.
    format!("<div{}>{}</div>", attrs, oembed.html.as_deref().unwrap_or(""))
}

/// Span resolved to byte offsets
struct Range<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

/// Map a UTF-16 offset to a byte offset, clamped to the text
fn byte_offset(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (i, c) in text.char_indices() {
        if units >= utf16 {
            return i;
        }
        units += c.len_utf16();
    }
    text.len()
}

fn render_spans(text: &str, spans: &[Span], links: &LinkResolver) -> String {
    let ranges: Vec<Range> = spans
        .iter()
        .map(|span| Range {
            start: byte_offset(text, span.start),
            end: byte_offset(text, span.end),
            span,
        })
        .filter(|r| r.start < r.end)
        .collect();

    let mut points: Vec<usize> = vec![0, text.len()];
    for r in &ranges {
        points.push(r.start);
        points.push(r.end);
    }
    points.sort_unstable();
    points.dedup();

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Range> = Vec::new();

    for (i, &p) in points.iter().enumerate() {
        // Close everything down to the outermost span ending here, then
        // reopen the ones that continue past this point.
        if let Some(pos) = stack.iter().position(|r| r.end <= p) {
            let popped: Vec<&Range> = stack.drain(pos..).collect();
            for r in popped.iter().rev() {
                out.push_str(close_tag(r.span));
            }
            for r in popped {
                if r.end > p {
                    out.push_str(&open_tag(r.span, links));
                    stack.push(r);
                }
            }
        }

        let mut starting: Vec<&Range> = ranges.iter().filter(|r| r.start == p).collect();
        starting.sort_by(|a, b| b.end.cmp(&a.end));
        for r in starting {
            out.push_str(&open_tag(r.span, links));
            stack.push(r);
        }

        if let Some(&next) = points.get(i + 1) {
            out.push_str(&html_escape(&text[p..next]).replace('\n', "<br />"));
        }
    }

    out
}

fn open_tag(span: &Span, links: &LinkResolver) -> String {
    match span.kind() {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let data = span.data.clone().unwrap_or_default();
            let href = links.resolve(&data).unwrap_or_default();
            match data.target.as_deref() {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    html_escape(&href),
                    html_escape(target)
                ),
                None => format!(r#"<a href="{}">"#, html_escape(&href)),
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind() {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}
