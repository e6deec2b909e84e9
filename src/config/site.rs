//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `cms.endpoint`
pub const ENV_CMS_ENDPOINT: &str = "HEADLESS_BLOG_CMS_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ENV_CMS_TOKEN: &str = "HEADLESS_BLOG_CMS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
    pub i18n_dir: String,

    // Content
    pub cms: CmsConfig,
    pub listing: ListingConfig,
    pub static_paths: StaticPathsConfig,

    /// Seconds before a generated post page is regenerated on request
    pub revalidate_secs: u64,
    pub words_per_minute: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            language: "pt".to_string(),
            timezone: "UTC".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            i18n_dir: "languages".to_string(),

            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            static_paths: StaticPathsConfig::default(),

            revalidate_secs: 60 * 5,
            words_per_minute: crate::content::WORDS_PER_MINUTE,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply CMS credentials from the environment, if set
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_CMS_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.cms.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ENV_CMS_TOKEN) {
            if !token.trim().is_empty() {
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Resolve the configured timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type of blog posts
    pub document_type: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
        }
    }
}

/// Home page listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: 3 }
    }
}

/// Posts pre-rendered at build time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticPathsConfig {
    pub page_size: usize,
}

impl Default for StaticPathsConfig {
    fn default() -> Self {
        Self { page_size: 2 }
    }
}
