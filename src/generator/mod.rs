//! Generator module - renders pages with the built-in Tera templates and
//! writes them to the public directory

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cms::{CmsClient, FailureKind, Page};
use crate::content::PostSummary;
use crate::helpers::{encode_segment, full_url_for, post_url};
use crate::i18n::I18n;
use crate::listing;
use crate::post::{resolve, PostState, StaticPaths};
use crate::templates::{base_context, ListingView, SiteData, TemplateRenderer, ViewOptions};
use crate::Blog;

const STYLESHEET: &str = include_str!("../templates/theme/style.css");

/// What one generation run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub listed: usize,
    pub posts: Vec<String>,
    pub skipped: Vec<String>,
}

/// Renders listing and post pages and writes them to disk
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    site: SiteData,
    i18n: I18n,
    options: ViewOptions,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            site: SiteData::from_config(&blog.config),
            i18n: blog.i18n(),
            options: ViewOptions::from_config(&blog.config),
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Generate the home listing and every post the CMS reports as known
    pub async fn generate(&self, client: &CmsClient) -> Result<GenerateReport> {
        let config = &self.blog.config;
        let doc_type = &config.cms.document_type;

        fs::create_dir_all(&self.blog.public_dir)?;
        self.write_stylesheet()?;
        self.copy_static_assets()?;

        let first = listing::load_initial(client, doc_type, config.listing.page_size)
            .await
            .context("Failed to load the post listing")?;
        let html = self.render_listing(&first)?;
        self.write_listing(&html)?;

        let mut report = GenerateReport {
            listed: first.results.len(),
            ..GenerateReport::default()
        };

        let paths = StaticPaths::load(client, doc_type, config.static_paths.page_size)
            .await
            .context("Failed to list known posts")?;

        for slug in paths.slugs {
            let state = PostState::settle(resolve(client, doc_type, &slug).await, &self.options);
            match &state {
                PostState::Resolved(_) => {
                    let html = self.render_post_state(&state, &slug)?;
                    self.write_post(&slug, &html)?;
                    report.posts.push(slug);
                }
                PostState::NotFound => {
                    tracing::warn!("Known post {:?} no longer exists, skipping", slug);
                    report.skipped.push(slug);
                }
                PostState::Failed { kind, message } => {
                    tracing::warn!("Failed to load post {:?} ({}): {}", slug, kind.as_str(), message);
                    report.skipped.push(slug);
                }
                PostState::Pending => report.skipped.push(slug),
            }
        }

        Ok(report)
    }

    /// Render the home listing for an already fetched first page
    pub fn render_listing(&self, page: &Page<PostSummary>) -> Result<String> {
        let mut context = base_context(&self.site, &self.i18n);
        context.insert("listing", &ListingView::new(page, &self.options));
        context.insert("current_path", &self.site.root);
        self.renderer.render("index.html", &context)
    }

    /// Render the page shown for a post in `state`
    pub fn render_post_state(&self, state: &PostState, slug: &str) -> Result<String> {
        let mut context = base_context(&self.site, &self.i18n);
        let path = post_url(&self.site.root, slug);
        context.insert("current_path", &path);
        match state {
            PostState::Resolved(view) => {
                let canonical = full_url_for(
                    &self.blog.config,
                    &format!("post/{}", encode_segment(slug)),
                );
                context.insert("post", &**view);
                context.insert("canonical", &canonical);
            }
            PostState::Failed { kind, .. } => {
                context.insert("error_kind", kind.as_str());
                context.insert("retry_href", &path);
            }
            PostState::Pending | PostState::NotFound => {}
        }
        self.renderer.render(state.template(), &context)
    }

    /// Render an error page with a link retrying `retry_href`
    pub fn render_error(&self, kind: FailureKind, retry_href: &str) -> Result<String> {
        let mut context = base_context(&self.site, &self.i18n);
        context.insert("error_kind", kind.as_str());
        context.insert("retry_href", retry_href);
        context.insert("current_path", retry_href);
        self.renderer.render("error.html", &context)
    }

    pub fn listing_path(&self) -> PathBuf {
        self.blog.public_dir.join("index.html")
    }

    pub fn write_listing(&self, html: &str) -> Result<PathBuf> {
        let output_path = self.listing_path();
        write_file(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// Output file of the post page for `slug`
    pub fn post_path(&self, slug: &str) -> Result<PathBuf> {
        if !is_safe_slug(slug) {
            anyhow::bail!("Refusing to write a post page for slug {:?}", slug);
        }
        Ok(self
            .blog
            .public_dir
            .join("post")
            .join(slug)
            .join("index.html"))
    }

    pub fn write_post(&self, slug: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.post_path(slug)?;
        write_file(&output_path, html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(output_path)
    }

    fn write_stylesheet(&self) -> Result<()> {
        write_file(&self.blog.public_dir.join("css").join("style.css"), STYLESHEET)
    }

    /// Copy static assets (images, etc.) to public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
        }

        Ok(())
    }
}

/// Whether `slug` can name a directory under `public/post/`
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(&['/', '\\', '\0'][..])
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
