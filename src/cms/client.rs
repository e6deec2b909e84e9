//! HTTP client for the CMS query API

use reqwest::header;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use url::Url;

use super::document::{ApiInfo, Document, Page};
use super::error::CmsError;
use super::predicate::{query_string, Predicate};
use crate::config::CmsConfig;

/// Options accepted by [`CmsClient::query`]
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    /// e.g. `document.first_publication_date desc`
    pub orderings: Vec<String>,
    pub lang: Option<String>,
}

impl QueryOptions {
    pub fn page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Default::default()
        }
    }
}

/// A query-capable handle on one CMS repository
///
/// Each generation run or server owns its own instance; nothing is global.
pub struct CmsClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl CmsClient {
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let endpoint =
            Url::parse(config.endpoint.trim()).map_err(|source| CmsError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                source,
            })?;

        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config
                .access_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The ref of the published content, fetched once per client
    pub async fn master_ref(&self) -> Result<&str, CmsError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                self.authorize(&mut url);
                let info: ApiInfo = self.get_json(url).await?;
                info.master_ref()
                    .map(|r| r.reference.clone())
                    .ok_or(CmsError::MissingMasterRef)
            })
            .await?;
        Ok(reference)
    }

    /// Query documents matching all predicates
    pub async fn query<T: DeserializeOwned>(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Page<Document<T>>, CmsError> {
        let reference = self.master_ref().await?.to_string();
        let mut url = self.search_url()?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("ref", &reference);
            if !predicates.is_empty() {
                qp.append_pair("q", &query_string(predicates));
            }
            if let Some(page_size) = options.page_size {
                qp.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page) = options.page {
                qp.append_pair("page", &page.to_string());
            }
            if !options.orderings.is_empty() {
                qp.append_pair("orderings", &format!("[{}]", options.orderings.join(",")));
            }
            if let Some(lang) = &options.lang {
                qp.append_pair("lang", lang);
            }
        }
        self.authorize(&mut url);

        tracing::debug!(query = ?url.query_pairs().find(|(k, _)| k == "q"), "CMS query");
        self.get_json(url).await.map(public_cursors::<Document<T>>)
    }

    /// Fetch the single document of `doc_type` whose uid is `uid`
    pub async fn get_by_uid<T: DeserializeOwned>(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<Document<T>, CmsError> {
        let options = QueryOptions {
            page_size: Some(1),
            page: None,
            ..options.clone()
        };
        let page = self
            .query::<T>(&[Predicate::uid(doc_type, uid)], &options)
            .await?;

        page.results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    /// Follow a `next_page` cursor returned by an earlier query
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        cursor: &str,
    ) -> Result<Page<Document<T>>, CmsError> {
        let mut url = Url::parse(cursor).map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;
        if url.origin() != self.endpoint.origin() {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }
        self.authorize(&mut url);

        tracing::debug!(path = url.path(), "CMS next page");
        self.get_json(url).await.map(public_cursors::<Document<T>>)
    }

    fn search_url(&self) -> Result<Url, CmsError> {
        let raw = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|source| CmsError::InvalidEndpoint {
            endpoint: raw,
            source,
        })
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        let resp = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(without_url)?;

        let status = resp.status();
        if !status.is_success() {
            let mut shown = url;
            shown.set_query(None);
            tracing::warn!(%status, url = %shown, "CMS request failed");
            return Err(CmsError::Status {
                status,
                url: shown.to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(without_url)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Cursors are handed to browsers; `authorize` adds the token back when
/// one is followed
fn public_cursors<T>(mut page: Page<T>) -> Page<T> {
    page.next_page = page.next_page.map(strip_access_token);
    page.prev_page = page.prev_page.map(strip_access_token);
    page
}

fn strip_access_token(cursor: String) -> String {
    let Ok(mut url) = Url::parse(&cursor) else {
        return cursor;
    };
    if !url.query_pairs().any(|(k, _)| k == "access_token") {
        return cursor;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

/// Request URLs carry the access token; keep them out of error messages
fn without_url(e: reqwest::Error) -> CmsError {
    CmsError::Network(e.without_url())
}
