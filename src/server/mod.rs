//! HTTP server for the generated site
//!
//! Generated pages are served from the public directory. A post page that
//! was not generated is resolved in the background on its first request
//! while the visitor sees a loading page. Pages older than the revalidation
//! window are served as they are and regenerated behind the scenes.

mod registry;

pub use registry::{Claim, Registry};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::{CmsClient, CmsError, FailureKind};
use crate::generator::{is_safe_slug, Generator};
use crate::listing;
use crate::post::{resolve, PostState};
use crate::templates::ListingView;
use crate::Blog;

/// Registry key of the home listing
const LISTING_KEY: &str = "";

/// Server state
pub struct ServerState {
    generator: Generator,
    client: CmsClient,
    registry: Mutex<Registry>,
    revalidate: Duration,
}

impl ServerState {
    pub fn new(blog: &Blog) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            generator: Generator::new(blog)?,
            client: blog.cms_client()?,
            registry: Mutex::new(Registry::new()),
            revalidate: Duration::from_secs(blog.config.revalidate_secs),
        }))
    }

    fn doc_type(&self) -> &str {
        &self.generator.blog().config.cms.document_type
    }

    /// Resolve a post that has no page yet and record the outcome
    fn spawn_resolve(self: Arc<Self>, slug: String) {
        tokio::spawn(async move {
            let result = resolve(&self.client, self.doc_type(), &slug).await;
            let state = PostState::settle(result, self.generator.options());

            if let PostState::Resolved(_) = &state {
                match self.write_post(&state, &slug) {
                    Ok(path) => {
                        tracing::info!("Generated post on demand: {:?}", path);
                        self.registry.lock().await.forget(&slug);
                        return;
                    }
                    Err(e) => tracing::warn!("Failed to write post {:?}: {}", slug, e),
                }
            }
            self.registry.lock().await.settle(&slug, state, Instant::now());
        });
    }

    /// Regenerate a stale post page; on failure the stale page stays
    fn spawn_refresh(self: Arc<Self>, slug: String, path: PathBuf) {
        tokio::spawn(async move {
            if !self.registry.lock().await.begin_refresh(&slug) {
                return;
            }

            let result = resolve(&self.client, self.doc_type(), &slug).await;
            match PostState::settle(result, self.generator.options()) {
                state @ PostState::Resolved(_) => {
                    if let Err(e) = self.write_post(&state, &slug) {
                        tracing::warn!("Failed to refresh post {:?}: {}", slug, e);
                    }
                }
                PostState::NotFound => {
                    tracing::info!("Post {:?} was removed, deleting its page", slug);
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!("Failed to delete {:?}: {}", path, e);
                    }
                    self.registry
                        .lock()
                        .await
                        .settle(&slug, PostState::NotFound, Instant::now());
                }
                PostState::Failed { message, .. } => {
                    tracing::warn!("Keeping stale post {:?}: {}", slug, message);
                }
                PostState::Pending => {}
            }

            self.registry.lock().await.end_refresh(&slug);
        });
    }

    /// Regenerate the stale home listing
    fn spawn_listing_refresh(self: Arc<Self>) {
        tokio::spawn(async move {
            if !self.registry.lock().await.begin_refresh(LISTING_KEY) {
                return;
            }
            if let Err(e) = self.generate_listing().await {
                tracing::warn!("Keeping stale listing: {}", e);
            }
            self.registry.lock().await.end_refresh(LISTING_KEY);
        });
    }

    fn write_post(&self, state: &PostState, slug: &str) -> Result<PathBuf> {
        let html = self.generator.render_post_state(state, slug)?;
        self.generator.write_post(slug, &html)
    }

    async fn generate_listing(&self) -> Result<String> {
        let page_size = self.generator.blog().config.listing.page_size;
        let first = listing::load_initial(&self.client, self.doc_type(), page_size).await?;
        let html = self.generator.render_listing(&first)?;
        self.generator.write_listing(&html)?;
        Ok(html)
    }

    fn render_state(&self, status: StatusCode, state: &PostState, slug: &str) -> Response {
        let response = page(status, self.generator.render_post_state(state, slug));
        match state {
            PostState::Resolved(_) => response,
            _ => no_store(response),
        }
    }
}

/// Build the router serving the site under its root path
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.generator.blog().public_dir.clone();
    let root = state.generator.blog().config.root.trim_end_matches('/').to_string();

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/post/:slug/index.html", get(post_handler))
        .route("/api/posts", get(posts_api_handler))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state);

    let app = if root.is_empty() {
        app
    } else {
        Router::new().nest(&root, app)
    };
    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = ServerState::new(blog)?;
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let path = state.generator.listing_path();
    if let Some(modified) = modified(&path).await {
        if !is_fresh(modified, state.revalidate) {
            state.clone().spawn_listing_refresh();
        }
        return serve_file(&path).await;
    }

    match state.generate_listing().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!("Failed to load the listing: {:#}", e);
            let kind = e
                .downcast_ref::<CmsError>()
                .map(CmsError::kind)
                .unwrap_or(FailureKind::NetworkFailure);
            let root = state.generator.options().root.clone();
            no_store(page(
                StatusCode::BAD_GATEWAY,
                state.generator.render_error(kind, &root),
            ))
        }
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_safe_slug(&slug) {
        return state.render_state(StatusCode::NOT_FOUND, &PostState::NotFound, &slug);
    }
    let path = match state.generator.post_path(&slug) {
        Ok(path) => path,
        Err(_) => return state.render_state(StatusCode::NOT_FOUND, &PostState::NotFound, &slug),
    };

    if let Some(modified) = modified(&path).await {
        if !is_fresh(modified, state.revalidate) {
            state.clone().spawn_refresh(slug, path.clone());
        }
        return serve_file(&path).await;
    }

    let claim = state
        .registry
        .lock()
        .await
        .claim(&slug, Instant::now(), state.revalidate);

    match claim {
        Claim::Fetch => {
            tracing::debug!("Resolving post {:?} on demand", slug);
            state.clone().spawn_resolve(slug.clone());
            state.render_state(StatusCode::OK, &PostState::Pending, &slug)
        }
        Claim::Wait => state.render_state(StatusCode::OK, &PostState::Pending, &slug),
        Claim::Ready(view) => state.render_state(StatusCode::OK, &PostState::Resolved(view), &slug),
        Claim::NotFound => state.render_state(StatusCode::NOT_FOUND, &PostState::NotFound, &slug),
        Claim::Failed(kind) => state.render_state(
            StatusCode::BAD_GATEWAY,
            &PostState::Failed {
                kind,
                message: String::new(),
            },
            &slug,
        ),
    }
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    cursor: Option<String>,
}

/// Next listing page for the "load more" control
async fn posts_api_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PostsQuery>,
) -> Response {
    let Some(cursor) = query.cursor.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "kind": "bad_request", "message": "missing cursor" } })),
        )
            .into_response();
    };

    match listing::fetch_next(&state.client, &cursor).await {
        Ok(page) => Json(ListingView::new(&page, state.generator.options())).into_response(),
        Err(e) => {
            tracing::warn!("Loading more posts failed: {}", e);
            let status = match &e {
                CmsError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            let body = json!({
                "error": { "kind": e.kind().as_str(), "message": api_message(e.kind()) }
            });
            no_store((status, Json(body)).into_response())
        }
    }
}

/// Client-facing text of a failure; details stay in the server log
fn api_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::NetworkFailure => "the CMS could not be reached",
        FailureKind::DecodeFailure => "the CMS sent an unexpected response",
        FailureKind::NotFound => "no such page",
    }
}

fn page(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

fn no_store(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

async fn serve_file(path: &std::path::Path) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Html(content).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

async fn modified(path: &std::path::Path) -> Option<SystemTime> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok()
}

/// Whether a page written at `modified` is still within the window
fn is_fresh(modified: SystemTime, window: Duration) -> bool {
    // A timestamp in the future counts as fresh
    modified.elapsed().map(|age| age < window).unwrap_or(true)
}
