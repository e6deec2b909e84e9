//! In-flight and recently settled post lookups

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::cms::FailureKind;
use crate::post::PostState;
use crate::templates::PostView;

/// Entries kept before settled ones are dropped early
const MAX_ENTRIES: usize = 10_000;

#[derive(Debug)]
struct Entry {
    state: PostState,
    settled_at: Instant,
}

impl Entry {
    /// Pending lookups live until settled; outcomes last one window
    fn is_live(&self, now: Instant, window: Duration) -> bool {
        matches!(self.state, PostState::Pending)
            || now.saturating_duration_since(self.settled_at) < window
    }
}

/// What to answer for a slug that has no generated page
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// Nobody is resolving the slug yet; the caller must start
    Fetch,
    /// Another request already started resolving it
    Wait,
    Ready(Box<PostView>),
    NotFound,
    Failed(FailureKind),
}

/// Per-slug lookup state shared by all requests of a server
///
/// At most one resolution runs per slug. A resolved post or a `NotFound`
/// answer is remembered for one revalidation window; a failure is reported
/// once and then forgotten so the next request retries. Expired outcomes
/// are dropped on every claim.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    refreshing: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, slug: &str, now: Instant, window: Duration) -> Claim {
        self.evict(now, window);

        let claim = match self.entries.get(slug).map(|entry| &entry.state) {
            Some(PostState::Pending) => Claim::Wait,
            Some(PostState::Resolved(view)) => Claim::Ready(view.clone()),
            Some(PostState::NotFound) => Claim::NotFound,
            Some(PostState::Failed { kind, .. }) => Claim::Failed(*kind),
            None => Claim::Fetch,
        };

        match claim {
            Claim::Fetch => {
                if self.entries.len() >= MAX_ENTRIES {
                    self.entries
                        .retain(|_, entry| matches!(entry.state, PostState::Pending));
                }
                self.entries.insert(
                    slug.to_string(),
                    Entry {
                        state: PostState::Pending,
                        settled_at: now,
                    },
                );
            }
            Claim::Failed(_) => {
                self.entries.remove(slug);
            }
            _ => {}
        }
        claim
    }

    fn evict(&mut self, now: Instant, window: Duration) {
        self.entries.retain(|_, entry| entry.is_live(now, window));
    }

    /// Record the outcome of a resolution
    pub fn settle(&mut self, slug: &str, state: PostState, now: Instant) {
        self.entries.insert(
            slug.to_string(),
            Entry {
                state,
                settled_at: now,
            },
        );
    }

    /// Drop whatever is known about `slug`, e.g. once its page is on disk
    pub fn forget(&mut self, slug: &str) {
        self.entries.remove(slug);
    }

    /// Claim the refresh of a stale page. Returns `false` if one is running.
    pub fn begin_refresh(&mut self, key: &str) -> bool {
        self.refreshing.insert(key.to_string())
    }

    pub fn end_refresh(&mut self, key: &str) {
        self.refreshing.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(300);

    #[test]
    fn test_first_request_fetches_later_ones_wait() {
        let mut registry = Registry::new();
        let now = Instant::now();
        assert_eq!(registry.claim("abc", now, WINDOW), Claim::Fetch);
        assert_eq!(registry.claim("abc", now, WINDOW), Claim::Wait);
        assert_eq!(registry.claim("other", now, WINDOW), Claim::Fetch);
    }

    #[test]
    fn test_not_found_expires_after_window() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.claim("abc", now, WINDOW);
        registry.settle("abc", PostState::NotFound, now);

        assert_eq!(registry.claim("abc", now, WINDOW), Claim::NotFound);
        let later = now + WINDOW + Duration::from_secs(1);
        assert_eq!(registry.claim("abc", later, WINDOW), Claim::Fetch);
    }

    #[test]
    fn test_failure_is_reported_once() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.claim("abc", now, WINDOW);
        registry.settle(
            "abc",
            PostState::Failed {
                kind: FailureKind::DecodeFailure,
                message: "bad".to_string(),
            },
            now,
        );

        assert_eq!(
            registry.claim("abc", now, WINDOW),
            Claim::Failed(FailureKind::DecodeFailure)
        );
        assert_eq!(registry.claim("abc", now, WINDOW), Claim::Fetch);
    }

    #[test]
    fn test_resolved_view_expires_after_window() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.claim("abc", now, WINDOW);
        let view = Box::new(PostView {
            uid: "abc".to_string(),
            title: "ABC".to_string(),
            banner_url: None,
            author: "Ana".to_string(),
            date: None,
            date_iso: None,
            reading_time: 1,
            content: Vec::new(),
        });
        registry.settle("abc", PostState::Resolved(view.clone()), now);

        assert_eq!(registry.claim("abc", now, WINDOW), Claim::Ready(view));
        let later = now + WINDOW + Duration::from_secs(1);
        assert_eq!(registry.claim("abc", later, WINDOW), Claim::Fetch);
    }

    #[test]
    fn test_expired_outcomes_are_dropped() {
        let mut registry = Registry::new();
        let now = Instant::now();
        for n in 0..100 {
            let slug = format!("missing-{}", n);
            registry.claim(&slug, now, WINDOW);
            registry.settle(&slug, PostState::NotFound, now);
        }
        registry.claim("pending", now, WINDOW);
        assert_eq!(registry.entries.len(), 101);

        let later = now + WINDOW + Duration::from_secs(1);
        assert_eq!(registry.claim("other", later, WINDOW), Claim::Fetch);
        assert_eq!(registry.entries.len(), 2);
        assert_eq!(registry.claim("pending", later, WINDOW), Claim::Wait);
    }

    #[test]
    fn test_entries_are_capped() {
        let mut registry = Registry::new();
        let now = Instant::now();
        for n in 0..MAX_ENTRIES {
            let slug = format!("missing-{}", n);
            registry.claim(&slug, now, WINDOW);
            registry.settle(&slug, PostState::NotFound, now);
        }
        registry.claim("pending", now, WINDOW);
        assert!(registry.entries.len() <= MAX_ENTRIES);
        assert_eq!(registry.claim("pending", now, WINDOW), Claim::Wait);
    }

    #[test]
    fn test_forget_restarts_lookup() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.claim("abc", now, WINDOW);
        registry.forget("abc");
        assert_eq!(registry.claim("abc", now, WINDOW), Claim::Fetch);
    }

    #[test]
    fn test_single_refresh_per_key() {
        let mut registry = Registry::new();
        assert!(registry.begin_refresh("abc"));
        assert!(!registry.begin_refresh("abc"));
        registry.end_refresh("abc");
        assert!(registry.begin_refresh("abc"));
    }
}
