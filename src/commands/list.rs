//! List site content

use anyhow::Result;

use crate::listing::Listing;
use crate::post::list_known_slugs;
use crate::templates::PostLinkView;
use crate::templates::ViewOptions;
use crate::Blog;

/// List CMS content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let client = blog.cms_client()?;
    let config = &blog.config;
    let doc_type = &config.cms.document_type;

    match content_type {
        "post" | "posts" => {
            let options = ViewOptions::from_config(config);
            let mut listing = Listing::load(&client, doc_type, config.listing.page_size).await?;
            while listing.can_load_more() {
                listing.load_more(&client).await?;
            }
            let posts: Vec<_> = listing
                .into_page()
                .results
                .iter()
                .map(|p| PostLinkView::new(p, &options))
                .collect();

            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}]",
                    post.date.as_deref().unwrap_or("-"),
                    post.title,
                    post.uid
                );
            }
        }
        "slug" | "slugs" => {
            let slugs = list_known_slugs(&client, doc_type, config.static_paths.page_size).await?;
            println!("Pre-rendered slugs ({}):", slugs.len());
            for slug in slugs {
                println!("  {}", slug);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, slug", content_type);
        }
    }

    Ok(())
}
