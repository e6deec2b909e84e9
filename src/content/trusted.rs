//! Markup that bypasses template escaping

use serde::{Serialize, Serializer};
use std::fmt;

/// HTML reconstructed from CMS rich text
///
/// Templates autoescape every value; a `TrustedHtml` is the only kind of
/// value rendered through the `safe` filter. Text runs are escaped when it
/// is built, but embed markup supplied by the CMS editors is kept verbatim:
/// whoever can publish in the CMS can inject markup into the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    /// Only the rich text renderer mints these
    pub(super) fn new(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TrustedHtml {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
