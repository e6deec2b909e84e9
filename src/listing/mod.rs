//! Listing pagination
//!
//! The listing shows a first page of post summaries and grows by one page
//! each time "load more" is used, following the CMS cursor until it runs
//! out. [`load_initial`] and [`load_more`] are the stateless building
//! blocks; [`Listing`] is the per-view controller that owns the loaded posts
//! and allows a single outstanding request at a time.

use thiserror::Error;

use crate::cms::{CmsClient, CmsError, Document, FailureKind, Page, Predicate, QueryOptions};
use crate::content::{PostSummary, PostSummaryData};

/// Fetch the first page of posts of `doc_type`, in the CMS default order
pub async fn load_initial(
    client: &CmsClient,
    doc_type: &str,
    page_size: usize,
) -> Result<Page<PostSummary>, CmsError> {
    let page = client
        .query::<PostSummaryData>(
            &[Predicate::document_type(doc_type)],
            &QueryOptions::page_size(page_size),
        )
        .await?;
    into_summaries(page)
}

/// Fetch the page behind `cursor`
pub async fn fetch_next(client: &CmsClient, cursor: &str) -> Result<Page<PostSummary>, CmsError> {
    let page = client.fetch_page::<PostSummaryData>(cursor).await?;
    into_summaries(page)
}

/// Fetch the page behind `next_page_url` and append it to `current`
///
/// Previously loaded posts keep their order and precede the new ones.
pub async fn load_more(
    client: &CmsClient,
    current: Vec<PostSummary>,
    next_page_url: &str,
) -> Result<Page<PostSummary>, CmsError> {
    let next = fetch_next(client, next_page_url).await?;
    Ok(append(current, next))
}

fn append(mut current: Vec<PostSummary>, next: Page<PostSummary>) -> Page<PostSummary> {
    let Page {
        page,
        total_pages,
        total_results_size,
        next_page,
        prev_page,
        results,
    } = next;
    current.extend(results);
    Page {
        page,
        total_pages,
        total_results_size,
        next_page,
        prev_page,
        results: current,
    }
}

fn into_summaries(page: Page<Document<PostSummaryData>>) -> Result<Page<PostSummary>, CmsError> {
    let results = page
        .results
        .into_iter()
        .map(PostSummary::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        page: page.page,
        total_pages: page.total_pages,
        total_results_size: page.total_results_size,
        next_page: page.next_page,
        prev_page: page.prev_page,
        results,
    })
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("a page is already loading")]
    AlreadyLoading,

    #[error("there are no more posts to load")]
    Exhausted,

    #[error(transparent)]
    Cms(#[from] CmsError),
}

/// What the view shows next to the posts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    Idle,
    Loading,
    Failed { kind: FailureKind, message: String },
}

/// Ticket for one outstanding "load more" request
#[derive(Debug)]
pub struct PendingLoad {
    cursor: String,
    generation: u64,
}

impl PendingLoad {
    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// Posts loaded so far by one listing view
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    status: ListingStatus,
    generation: u64,
}

impl Listing {
    pub fn new(first: Page<PostSummary>) -> Self {
        Self {
            posts: first.results,
            next_page: first.next_page,
            status: ListingStatus::Idle,
            generation: 0,
        }
    }

    /// Fetch the first page and start a listing from it
    pub async fn load(client: &CmsClient, doc_type: &str, page_size: usize) -> Result<Self, CmsError> {
        Ok(Self::new(load_initial(client, doc_type, page_size).await?))
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn status(&self) -> &ListingStatus {
        &self.status
    }

    /// Whether the "load more" control is shown and enabled
    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some() && self.status != ListingStatus::Loading
    }

    /// Claim the single outstanding request slot
    pub fn begin_load_more(&mut self) -> Result<PendingLoad, ListingError> {
        if self.status == ListingStatus::Loading {
            return Err(ListingError::AlreadyLoading);
        }
        let cursor = self.next_page.clone().ok_or(ListingError::Exhausted)?;
        self.status = ListingStatus::Loading;
        Ok(PendingLoad {
            cursor,
            generation: self.generation,
        })
    }

    /// Append a fetched page. Returns `false` if the load was stale.
    pub fn finish(&mut self, pending: PendingLoad, page: Page<PostSummary>) -> bool {
        if pending.generation != self.generation {
            tracing::debug!("Discarding page for a detached listing");
            return false;
        }
        self.posts.extend(page.results);
        self.next_page = page.next_page;
        self.status = ListingStatus::Idle;
        true
    }

    /// Record a failed load; the cursor is kept so the user can retry.
    pub fn fail(&mut self, pending: PendingLoad, error: &CmsError) -> bool {
        if pending.generation != self.generation {
            return false;
        }
        tracing::warn!("Loading more posts failed: {}", error);
        self.status = ListingStatus::Failed {
            kind: error.kind(),
            message: error.to_string(),
        };
        true
    }

    /// Drop interest in any outstanding request, e.g. when the view goes away
    pub fn detach(&mut self) {
        self.generation += 1;
        if self.status == ListingStatus::Loading {
            self.status = ListingStatus::Idle;
        }
    }

    /// Fetch and append the next page
    pub async fn load_more(&mut self, client: &CmsClient) -> Result<(), ListingError> {
        let pending = self.begin_load_more()?;
        match fetch_next(client, pending.cursor()).await {
            Ok(page) => {
                self.finish(pending, page);
                Ok(())
            }
            Err(e) => {
                self.fail(pending, &e);
                Err(e.into())
            }
        }
    }

    pub fn into_page(self) -> Page<PostSummary> {
        Page::new(self.posts, self.next_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::test_support::{config_for, mock_api_root};
    use httpmock::MockServer;
    use serde_json::{json, Value};

    fn summary(uid: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: None,
            title: uid.to_uppercase(),
            subtitle: String::new(),
            author: "Ana".to_string(),
        }
    }

    fn doc(uid: &str) -> Value {
        json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": { "title": uid, "subtitle": "sub", "author": "Ana" }
        })
    }

    fn uids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.uid.as_str()).collect()
    }

    #[test]
    fn test_append_keeps_prefix_order() {
        let current = vec![summary("a"), summary("b")];
        let next = Page::new(vec![summary("c")], None);
        let page = append(current, next);
        assert_eq!(uids(&page.results), vec!["a", "b", "c"]);
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut listing = Listing::new(Page::new(vec![summary("a")], Some("X".into())));
        let pending = listing.begin_load_more().unwrap();
        assert_eq!(pending.cursor(), "X");
        assert!(!listing.can_load_more());
        assert!(matches!(
            listing.begin_load_more(),
            Err(ListingError::AlreadyLoading)
        ));

        assert!(listing.finish(pending, Page::new(vec![summary("b")], None)));
        assert_eq!(uids(listing.posts()), vec!["a", "b"]);
        assert!(!listing.can_load_more());
        assert!(matches!(
            listing.begin_load_more(),
            Err(ListingError::Exhausted)
        ));
    }

    #[test]
    fn test_failure_allows_retry() {
        let mut listing = Listing::new(Page::new(vec![summary("a")], Some("X".into())));
        let pending = listing.begin_load_more().unwrap();
        let err = CmsError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            url: "https://cms.example".into(),
        };
        assert!(listing.fail(pending, &err));
        assert!(matches!(
            listing.status(),
            ListingStatus::Failed { kind: FailureKind::NetworkFailure, .. }
        ));
        assert_eq!(listing.next_page(), Some("X"));
        assert!(listing.can_load_more());

        let retry = listing.begin_load_more().unwrap();
        assert!(listing.finish(retry, Page::new(vec![summary("b")], None)));
        assert_eq!(listing.status(), &ListingStatus::Idle);
    }

    #[test]
    fn test_detached_listing_discards_results() {
        let mut listing = Listing::new(Page::new(vec![summary("a")], Some("X".into())));
        let pending = listing.begin_load_more().unwrap();
        listing.detach();
        assert!(!listing.finish(pending, Page::new(vec![summary("b")], None)));
        assert_eq!(uids(listing.posts()), vec!["a"]);
        assert_eq!(listing.next_page(), Some("X"));
    }

    #[tokio::test]
    async fn test_load_initial_then_more() {
        let server = MockServer::start_async().await;
        mock_api_root(&server).await;
        let cursor = format!("{}/api/v2/documents/search?ref=M1&page=2", server.base_url());

        let first = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/v2/documents/search")
                    .query_param("pageSize", "3");
                then.status(200).json_body(json!({
                    "next_page": cursor,
                    "results": [doc("a"), doc("b"), doc("c")]
                }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/v2/documents/search")
                    .query_param("page", "2");
                then.status(200).json_body(json!({
                    "next_page": null,
                    "results": [doc("d"), doc("e")]
                }));
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let page = load_initial(&client, "posts", 3).await.unwrap();
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.next_page.as_deref(), Some(cursor.as_str()));

        let cursor = page.next_page.clone().unwrap();
        let merged = load_more(&client, page.results, &cursor).await.unwrap();
        assert_eq!(uids(&merged.results), vec!["a", "b", "c", "d", "e"]);
        assert!(merged.next_page.is_none());

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_listing_load_more_over_http() {
        let server = MockServer::start_async().await;
        mock_api_root(&server).await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/v2/documents/search")
                    .query_param("page", "2");
                then.status(502);
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let cursor = format!("{}/api/v2/documents/search?ref=M1&page=2", server.base_url());
        let mut listing = Listing::new(Page::new(vec![summary("a")], Some(cursor)));

        let err = listing.load_more(&client).await.unwrap_err();
        assert!(matches!(err, ListingError::Cms(_)));
        assert!(listing.can_load_more());
        assert_eq!(uids(listing.posts()), vec!["a"]);
    }
}
