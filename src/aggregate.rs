//! Sequential paged aggregation and result post-processing.
//!
//! The browsing views of an anime catalog need more entries than one
//! upstream page holds, and the upstreams rate-limit aggressively. The
//! [`Aggregator`] fetches pages **strictly sequentially** with a fixed
//! inter-request delay, stops at the first empty page, and treats a page
//! failure as end-of-data instead of an error; already-collected pages are
//! never thrown away.
//!
//! [`ListExt`] then deduplicates and sorts the merged list, and
//! [`dedupe_by_key`] backs the same first-seen-wins pass for any item type.
//!
//! # Examples
//!
//! ```rust
//! use hakken::aggregate::{Aggregator, dedupe_by_key};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let aggregator = Aggregator::new(3).with_delay(Duration::from_millis(0));
//!
//! // Pages of numbers; page 3 is empty so it terminates the run.
//! let merged = aggregator
//!     .run(|page| async move {
//!         Ok(match page {
//!             1 => vec![1, 2, 3],
//!             2 => vec![4, 5],
//!             _ => vec![],
//!         })
//!     })
//!     .await;
//! assert_eq!(merged, vec![1, 2, 3, 4, 5]);
//!
//! let unique = dedupe_by_key(vec![1, 2, 2, 3, 1], |n| *n);
//! assert_eq!(unique, vec![1, 2, 3]);
//! # }
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{AnimeSummary, SortOrder};

/// Upper bound on pages a single aggregation run may request.
pub const MAX_PAGES: u32 = 15;

/// Default inter-request delay between page fetches.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(1000);

/// Normalizes a title into its deduplication key: trimmed and lowercased.
///
/// `"Naruto"` and `"naruto "` collapse to the same key.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Removes duplicates from `items`, keeping the first occurrence of each
/// key. Stable with respect to input order.
pub fn dedupe_by_key<T, K, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
    items
}

/// Sequential page-fetch engine with a fixed inter-request delay.
///
/// The page loop is deliberately sequential. The upstreams here share
/// per-client rate budgets, and a parallel fan-out over pages of the same
/// endpoint would trip them. Ordering of the merged output follows fetch
/// order: page 1's items first.
///
/// # Error policy
///
/// [`run`](Aggregator::run) never fails. A page whose fetch returns `Err`
/// is logged and treated as "no more data"; if the very first page fails
/// the result is an empty list and callers render an empty state.
#[derive(Debug, Clone)]
pub struct Aggregator {
    max_pages: u32,
    delay: Duration,
    cancel: CancellationToken,
}

impl Aggregator {
    /// Creates an aggregator fetching up to `max_pages` pages.
    ///
    /// The page count is clamped to `1..=`[`MAX_PAGES`]; the delay defaults
    /// to [`DEFAULT_PAGE_DELAY`].
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages: max_pages.clamp(1, MAX_PAGES),
            delay: DEFAULT_PAGE_DELAY,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the inter-request delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Ties this run to a cancellation token.
    ///
    /// Cancellation is honored before each page and during the inter-page
    /// delay; a cancelled run yields whatever was collected so far. The
    /// in-flight page fetch itself is dropped on cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The configured page bound.
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Fetches pages `1..=max_pages` sequentially and merges the results.
    ///
    /// Stops early when a page returns zero items, when a page fails, or
    /// when the run is cancelled. The delay is skipped after the final
    /// page.
    pub async fn run<T, F, Fut>(&self, fetch_page: F) -> Vec<T>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = crate::Result<Vec<T>>>,
    {
        let mut collected = Vec::new();

        for page in 1..=self.max_pages {
            if self.cancel.is_cancelled() {
                tracing::debug!(page, "aggregation cancelled");
                break;
            }

            let fetched = tokio::select! {
                result = fetch_page(page) => result,
                _ = self.cancel.cancelled() => {
                    tracing::debug!(page, "aggregation cancelled mid-fetch");
                    break;
                }
            };

            match fetched {
                Ok(items) if items.is_empty() => {
                    tracing::debug!(page, "empty page, stopping aggregation");
                    break;
                }
                Ok(mut items) => collected.append(&mut items),
                Err(e) => {
                    tracing::warn!(page, "page fetch failed, stopping aggregation: {}", e);
                    break;
                }
            }

            if page < self.max_pages && !self.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = self.cancel.cancelled() => break,
                }
            }
        }

        collected
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Extension trait with post-aggregation processing for anime lists.
///
/// # Examples
///
/// ```rust
/// use hakken::prelude::*;
///
/// # fn example(merged: Vec<hakken::AnimeSummary>) {
/// let unique = merged.dedupe_by_title().sort_by_order(SortOrder::Score);
/// # }
/// ```
pub trait ListExt {
    /// Removes duplicate entries sharing a normalized title key.
    ///
    /// The key is the preferred title, trimmed and lowercased; the first
    /// occurrence wins, so page-1 entries shadow later pages.
    fn dedupe_by_title(self) -> Self;

    /// Removes duplicate entries sharing a numeric external ID.
    fn dedupe_by_id(self) -> Self;

    /// Sorts by the given order. Entries missing the sort field go last.
    fn sort_by_order(self, order: SortOrder) -> Self;
}

impl ListExt for Vec<AnimeSummary> {
    fn dedupe_by_title(self) -> Self {
        dedupe_by_key(self, |anime| normalize_title(anime.preferred_title()))
    }

    fn dedupe_by_id(self) -> Self {
        dedupe_by_key(self, |anime| anime.external_id)
    }

    fn sort_by_order(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::Score => {
                self.sort_by(|a, b| {
                    let a = a.score.unwrap_or(0.0);
                    let b = b.score.unwrap_or(0.0);
                    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortOrder::Popularity => {
                self.sort_by(|a, b| b.members.unwrap_or(0).cmp(&a.members.unwrap_or(0)));
            }
            SortOrder::Rank => {
                self.sort_by(|a, b| {
                    a.rank.unwrap_or(u32::MAX).cmp(&b.rank.unwrap_or(u32::MAX))
                });
            }
        }
        self
    }
}
