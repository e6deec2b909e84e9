//! Built-in theme templates using Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! template: CMS strings are escaped on output, and only [`TrustedHtml`]
//! produced by the rich text renderer is emitted with `| safe`.

use anyhow::Result;
use chrono::Locale;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::cms::Page;
use crate::config::SiteConfig;
use crate::content::{estimate_with, LinkResolver, PostDetail, PostSummary, TrustedHtml};
use crate::helpers::{date_xml, format_post_date, join_root, locale_for, post_url};
use crate::i18n::I18n;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            ("error.html", include_str!("theme/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/post_link.html",
                include_str!("theme/partials/post_link.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("theme/partials/load_more.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}...", truncated.trim_end())))
    }
}

/// How CMS values are turned into display values
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub tz: Tz,
    pub locale: Locale,
    pub words_per_minute: usize,
    pub links: LinkResolver,
    pub root: String,
}

impl ViewOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            tz: config.tz(),
            locale: locale_for(&config.language),
            words_per_minute: config.words_per_minute,
            links: LinkResolver::new(&config.root),
            root: config.root.clone(),
        }
    }

    fn date(&self, summary_date: Option<&chrono::DateTime<chrono::FixedOffset>>) -> Option<String> {
        summary_date.map(|d| format_post_date(d, self.tz, self.locale))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub root: String,
    pub url: String,
    /// Endpoint answering "load more" requests
    pub posts_api: String,
    /// Seconds before the loading page asks again
    pub refresh_secs: u64,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            root: join_root(&config.root, ""),
            url: config.url.clone(),
            posts_api: join_root(&config.root, "api/posts"),
            refresh_secs: 2,
        }
    }
}

/// One entry of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostLinkView {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
}

impl PostLinkView {
    pub fn new(post: &PostSummary, options: &ViewOptions) -> Self {
        Self {
            uid: post.uid.clone(),
            href: post_url(&options.root, &post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: options.date(post.first_publication_date.as_ref()),
            date_iso: post.first_publication_date.as_ref().map(date_xml),
        }
    }
}

/// Loaded posts and the cursor of the next page
///
/// Serialized as-is for the "load more" JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    pub results: Vec<PostLinkView>,
    pub next_page: Option<String>,
}

impl ListingView {
    pub fn new(page: &Page<PostSummary>, options: &ViewOptions) -> Self {
        Self {
            results: page
                .results
                .iter()
                .map(|post| PostLinkView::new(post, options))
                .collect(),
            next_page: page.next_page.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: TrustedHtml,
}

/// A resolved post, ready to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
    /// Minutes
    pub reading_time: usize,
    pub content: Vec<SectionView>,
}

impl PostView {
    pub fn new(post: &PostDetail, options: &ViewOptions) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            banner_url: post.banner_url.clone(),
            author: post.author.clone(),
            date: options.date(post.first_publication_date.as_ref()),
            date_iso: post.first_publication_date.as_ref().map(date_xml),
            reading_time: estimate_with(&post.content, options.words_per_minute),
            content: post
                .content
                .iter()
                .map(|block| SectionView {
                    heading: block.heading.clone(),
                    html: block.body.as_html(&options.links),
                })
                .collect(),
        }
    }
}

/// Create a base context with common variables
pub fn base_context(site: &SiteData, i18n: &I18n) -> Context {
    let mut context = Context::new();
    context.insert("site", site);
    context.insert("t", &i18n.get_all_translations());
    context.insert("current_year", &chrono::Utc::now().format("%Y").to_string());
    context
}
