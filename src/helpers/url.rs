//! URL helper functions

use crate::config::SiteConfig;

/// Join a path onto a root path
///
/// # Examples
/// ```ignore
/// join_root("/blog/", "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn join_root(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a URL with the site root path
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    join_root(&config.root, path)
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Link to a post page under `root`
pub fn post_url(root: &str, uid: &str) -> String {
    join_root(root, &format!("post/{}", encode_segment(uid)))
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    const SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'_')
        .remove(b'.')
        .remove(b'~');
    percent_encoding::utf8_percent_encode(segment, SEGMENT).to_string()
}
