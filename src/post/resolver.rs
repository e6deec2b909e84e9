//! Resolve a slug to a full post

use crate::cms::{CmsClient, CmsError, FailureKind, QueryOptions};
use crate::content::{PostDetail, PostDetailData};
use crate::templates::{PostView, ViewOptions};

/// Fetch the post whose uid is `slug`
///
/// A missing post is `Err(CmsError::NotFound { .. })`.
pub async fn resolve(client: &CmsClient, doc_type: &str, slug: &str) -> Result<PostDetail, CmsError> {
    let doc = client
        .get_by_uid::<PostDetailData>(doc_type, slug, &QueryOptions::default())
        .await?;
    PostDetail::try_from(doc)
}

/// Where a post page is in its rendering lifecycle
///
/// `Pending` moves to exactly one of the other states. Date formatting and
/// the reading time are computed once, when the post becomes `Resolved`.
#[derive(Debug, Clone, PartialEq)]
pub enum PostState {
    Pending,
    Resolved(Box<PostView>),
    NotFound,
    Failed { kind: FailureKind, message: String },
}

impl PostState {
    pub fn settle(result: Result<PostDetail, CmsError>, options: &ViewOptions) -> Self {
        match result {
            Ok(detail) => PostState::Resolved(Box::new(PostView::new(&detail, options))),
            Err(e) if e.is_not_found() => PostState::NotFound,
            Err(e) => PostState::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn view(&self) -> Option<&PostView> {
        match self {
            PostState::Resolved(view) => Some(view),
            _ => None,
        }
    }

    /// Template rendering this state
    pub fn template(&self) -> &'static str {
        match self {
            PostState::Pending => "loading.html",
            PostState::Resolved(_) => "post.html",
            PostState::NotFound => "not_found.html",
            PostState::Failed { .. } => "error.html",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::test_support::{config_for, mock_api_root};
    use crate::config::SiteConfig;
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_and_settle() {
        let server = MockServer::start_async().await;
        mock_api_root(&server).await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/v2/documents/search")
                    .query_param("q", r#"[[at(my.posts.uid, "abc")]]"#);
                then.status(200).json_body(json!({
                    "next_page": null,
                    "results": [{
                        "id": "X1",
                        "uid": "abc",
                        "type": "posts",
                        "first_publication_date": "2021-03-15T19:25:28+0000",
                        "data": {
                            "title": "ABC",
                            "banner": { "url": "https://images.example/abc.png" },
                            "author": "Ana",
                            "content": [{
                                "heading": "One two",
                                "body": [{ "type": "paragraph", "text": "three four", "spans": [] }]
                            }]
                        }
                    }]
                }));
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let config = SiteConfig {
            language: "en".to_string(),
            ..SiteConfig::default()
        };
        let options = ViewOptions::from_config(&config);

        let state = PostState::settle(resolve(&client, "posts", "abc").await, &options);
        let view = state.view().expect("resolved");
        assert_eq!(view.title, "ABC");
        assert_eq!(view.reading_time, 1);
        assert_eq!(view.date.as_deref(), Some("15 Mar 2021"));
        assert_eq!(view.content[0].html.as_str(), "<p>three four</p>");
        assert_eq!(state.template(), "post.html");
    }

    #[tokio::test]
    async fn test_missing_post_settles_not_found() {
        let server = MockServer::start_async().await;
        mock_api_root(&server).await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/v2/documents/search");
                then.status(200)
                    .json_body(json!({ "next_page": null, "results": [] }));
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let options = ViewOptions::from_config(&SiteConfig::default());
        let state = PostState::settle(resolve(&client, "posts", "abc").await, &options);
        assert_eq!(state, PostState::NotFound);
        assert!(state.view().is_none());
        assert_eq!(state.template(), "not_found.html");
    }

    #[tokio::test]
    async fn test_unreachable_cms_settles_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/v2");
                then.status(503);
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let options = ViewOptions::from_config(&SiteConfig::default());
        let state = PostState::settle(resolve(&client, "posts", "abc").await, &options);
        assert!(matches!(
            state,
            PostState::Failed { kind: FailureKind::NetworkFailure, .. }
        ));
        assert_eq!(state.template(), "error.html");
    }

    #[test]
    fn test_pending_has_no_view() {
        let state = PostState::Pending;
        assert!(state.view().is_none());
        assert_eq!(state.template(), "loading.html");
    }
}
