//! Post models built from CMS documents

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::RichText;
use crate::cms::{CmsError, Document, Image};

/// Fields of a post needed by the listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostSummaryData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub author: String,
}

/// Fields of a full post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDetailData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub banner: Image,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One section of a post: a heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: RichText,
}

/// A post as shown in the listing; identity is `uid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

fn require_uid<T>(doc: &Document<T>) -> Result<String, CmsError> {
    doc.uid.clone().ok_or_else(|| {
        CmsError::Decode(serde::de::Error::custom(format!(
            "document {} has no uid",
            doc.id
        )))
    })
}

impl TryFrom<Document<PostSummaryData>> for PostSummary {
    type Error = CmsError;

    fn try_from(doc: Document<PostSummaryData>) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: doc.data.title,
            subtitle: doc.data.subtitle,
            author: doc.data.author,
        })
    }
}

impl TryFrom<Document<PostDetailData>> for PostDetail {
    type Error = CmsError;

    fn try_from(doc: Document<PostDetailData>) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: doc.data.title,
            banner_url: doc.data.banner.url.filter(|u| !u.is_empty()),
            author: doc.data.author,
            content: doc.data.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_from_document() {
        let doc: Document<PostDetailData> = serde_json::from_value(json!({
            "id": "X1",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "banner": { "url": "https://images.example/banner.png" },
                "author": "Joseph Oliveira",
                "content": [{
                    "heading": "Proin et varius",
                    "body": [{ "type": "paragraph", "text": "Lorem ipsum", "spans": [] }]
                }]
            }
        }))
        .unwrap();

        let post = PostDetail::try_from(doc).unwrap();
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(post.banner_url.as_deref(), Some("https://images.example/banner.png"));
        assert_eq!(post.content.len(), 1);
        assert_eq!(post.content[0].body.as_text(), "Lorem ipsum");
    }

    #[test]
    fn test_summary_requires_uid() {
        let doc: Document<PostSummaryData> = serde_json::from_value(json!({
            "id": "X2",
            "type": "posts",
            "data": { "title": "No uid" }
        }))
        .unwrap();

        let err = PostSummary::try_from(doc).unwrap_err();
        assert_eq!(err.kind(), crate::cms::FailureKind::DecodeFailure);
    }
}
