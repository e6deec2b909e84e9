//! Slugs pre-rendered at build time

use crate::cms::{CmsClient, CmsError, Predicate, QueryOptions};
use crate::content::PostSummaryData;

/// Slugs to pre-render
///
/// This is a warm-up hint, not an exhaustive list: any other slug is still
/// resolved on its first request (`fallback`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub slugs: Vec<String>,
    pub fallback: bool,
}

impl StaticPaths {
    pub async fn load(
        client: &CmsClient,
        doc_type: &str,
        page_size: usize,
    ) -> Result<Self, CmsError> {
        Ok(Self {
            slugs: list_known_slugs(client, doc_type, page_size).await?,
            fallback: true,
        })
    }
}

/// Uids of the first `page_size` posts
pub async fn list_known_slugs(
    client: &CmsClient,
    doc_type: &str,
    page_size: usize,
) -> Result<Vec<String>, CmsError> {
    let page = client
        .query::<PostSummaryData>(
            &[Predicate::document_type(doc_type)],
            &QueryOptions::page_size(page_size),
        )
        .await?;

    Ok(page
        .results
        .into_iter()
        .filter_map(|doc| {
            if doc.uid.is_none() {
                tracing::warn!("Skipping document {} without uid", doc.id);
            }
            doc.uid
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::test_support::{config_for, mock_api_root};
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_known_slugs() {
        let server = MockServer::start_async().await;
        mock_api_root(&server).await;
        let search = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/v2/documents/search")
                    .query_param("q", r#"[[at(document.type, "posts")]]"#)
                    .query_param("pageSize", "2");
                then.status(200).json_body(json!({
                    "next_page": "https://ignored.example/next",
                    "results": [
                        { "id": "1", "uid": "first", "type": "posts", "data": {} },
                        { "id": "2", "type": "posts", "data": {} }
                    ]
                }));
            })
            .await;

        let client = CmsClient::new(&config_for(&server)).unwrap();
        let paths = StaticPaths::load(&client, "posts", 2).await.unwrap();
        search.assert_async().await;

        assert_eq!(paths.slugs, vec!["first".to_string()]);
        assert!(paths.fallback);
    }
}
