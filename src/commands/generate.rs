//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Fetch posts from the CMS and write the static site
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let client = blog.cms_client()?;
    let generator = Generator::new(blog)?;
    let report = generator.generate(&client).await?;

    tracing::info!(
        "Generated listing ({} posts) and {} post pages",
        report.listed,
        report.posts.len()
    );
    if !report.skipped.is_empty() {
        tracing::warn!("Skipped {} posts: {}", report.skipped.len(), report.skipped.join(", "));
    }

    let duration = start.elapsed();
    tracing::info!("Completed in {:.2}s", duration.as_secs_f64());
    Ok(())
}
