//! Headless CMS client adapter
//!
//! Wraps the repository endpoint and credentials into a [`CmsClient`] that
//! can run predicate queries, look documents up by uid and follow the
//! opaque `next_page` cursors of paginated results.

mod client;
mod document;
mod error;
mod predicate;

pub use client::{CmsClient, QueryOptions};
pub use document::{parse_timestamp, ApiInfo, Document, Image, Page, Ref};
pub use error::{CmsError, FailureKind};
pub use predicate::{query_string, Predicate, Value};

#[cfg(test)]
pub(crate) use client::tests as test_support;
