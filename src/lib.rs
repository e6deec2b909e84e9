//! headless-blog: a statically generated blog backed by a headless CMS
//!
//! Posts are fetched from the CMS at build time and rendered with embedded
//! Tera templates. The server fills in posts that were not pre-rendered
//! and regenerates stale pages on request.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod post;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: std::path::PathBuf,
    /// Language overrides
    pub i18n_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    ///
    /// `_config.yml` is optional; environment variables override it.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a Blog instance with an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let i18n_dir = base_dir.join(&config.i18n_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            i18n_dir,
        }
    }

    /// Client for the configured CMS repository
    pub fn cms_client(&self) -> Result<cms::CmsClient> {
        Ok(cms::CmsClient::new(&self.config.cms)?)
    }

    /// Interface strings for the site language
    pub fn i18n(&self) -> i18n::I18n {
        let mut i18n = i18n::I18n::new(&self.config.language);
        if let Err(e) = i18n.load_languages(&self.i18n_dir) {
            tracing::warn!("Failed to load languages from {:?}: {}", self.i18n_dir, e);
        }
        i18n
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
