//! Aggregation semantics, exercised with in-process page fetchers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use hakken::prelude::*;

mod common;
use common::anime;

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(pages: u32) -> Aggregator {
        Aggregator::new(pages).with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_pages_merge_in_fetch_order() {
        let merged = fast(3)
            .run(|page| async move {
                Ok(match page {
                    1 => vec![1, 2],
                    2 => vec![3, 4],
                    3 => vec![5],
                    _ => vec![],
                })
            })
            .await;

        assert_eq!(merged, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_first_page_failure_yields_empty_list() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let merged: Vec<u32> = fast(3)
            .run(|_page| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(hakken::Error::parse("first page exploded"))
                }
            })
            .await;

        assert!(merged.is_empty());
        // The failure terminates the run; later pages are never attempted
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_before_requested_bound() {
        let highest_page = Arc::new(AtomicU32::new(0));
        let tracker = highest_page.clone();

        let merged = fast(3)
            .run(|page| {
                let tracker = tracker.clone();
                async move {
                    tracker.fetch_max(page, Ordering::SeqCst);
                    Ok(match page {
                        1 => vec![10, 11, 12, 13, 14],
                        _ => vec![],
                    })
                }
            })
            .await;

        assert_eq!(merged.len(), 5);
        // Page 2 came back empty, so page 3 must not be attempted
        assert_eq!(highest_page.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mid_run_failure_keeps_collected_pages() {
        let merged = fast(5)
            .run(|page| async move {
                match page {
                    1 => Ok(vec![1, 2]),
                    2 => Ok(vec![3]),
                    _ => Err(hakken::Error::provider("jikan", "HTTP 500")),
                }
            })
            .await;

        assert_eq!(merged, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_page_bound_is_clamped() {
        assert_eq!(Aggregator::new(0).max_pages(), 1);
        assert_eq!(Aggregator::new(100).max_pages(), hakken::aggregate::MAX_PAGES);

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let merged = fast(100)
            .run(|page| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![page])
                }
            })
            .await;

        assert_eq!(merged.len() as u32, hakken::aggregate::MAX_PAGES);
        assert_eq!(calls.load(Ordering::SeqCst), hakken::aggregate::MAX_PAGES);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let merged: Vec<u32> = fast(3)
            .with_cancellation(token)
            .run(|_page| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                }
            })
            .await;

        assert!(merged.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_mid_run_returns_partial_results() {
        let token = CancellationToken::new();

        let merged = fast(4)
            .with_cancellation(token.clone())
            .run(|page| {
                let token = token.clone();
                async move {
                    if page == 1 {
                        Ok(vec![1, 2])
                    } else {
                        // A view teardown mid-fetch: the hung request is
                        // dropped, collected pages survive.
                        token.cancel();
                        futures::future::pending::<hakken::Result<Vec<u32>>>().await
                    }
                }
            })
            .await;

        assert_eq!(merged, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_aggregate_then_dedupe_across_pages() {
        let merged = fast(2)
            .run(|page| async move {
                Ok(match page {
                    1 => vec![anime(1, "Naruto"), anime(2, "Bleach")],
                    _ => vec![anime(3, "naruto "), anime(4, "One Piece")],
                })
            })
            .await;

        let raw_len = merged.len();
        let deduped = merged.dedupe_by_title();

        assert!(deduped.len() <= raw_len);
        assert_eq!(deduped.len(), 3);
        // Page-1 "Naruto" shadows the page-2 variant
        assert_eq!(deduped[0].external_id, 1);
    }

    #[tokio::test]
    async fn test_inter_page_delay_is_applied() {
        let started = std::time::Instant::now();

        let merged = Aggregator::new(3)
            .with_delay(Duration::from_millis(50))
            .run(|page| async move { Ok(vec![page]) })
            .await;

        assert_eq!(merged, vec![1, 2, 3]);
        // Two inter-page delays; the final page has no trailing sleep
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
