//! Common test utilities and constants
//!
//! Shared fixtures used across all test modules.

use std::time::Duration;

use hakken::types::{AiredRange, AnimeSummary};

#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds a minimal anime fixture with the given ID and title.
#[allow(dead_code)]
pub fn anime(external_id: u32, title: &str) -> AnimeSummary {
    AnimeSummary {
        external_id,
        title: title.to_string(),
        title_english: None,
        cover_url: None,
        score: None,
        kind: Some("TV".to_string()),
        episodes: None,
        aired: AiredRange::default(),
        rank: None,
        popularity: None,
        members: None,
        synopsis: None,
        provider: "test".to_string(),
    }
}

/// Builds an anime fixture with ranking metadata for sort tests.
#[allow(dead_code)]
pub fn ranked_anime(
    external_id: u32,
    title: &str,
    score: Option<f32>,
    rank: Option<u32>,
    members: Option<u64>,
) -> AnimeSummary {
    AnimeSummary {
        score,
        rank,
        members,
        ..anime(external_id, title)
    }
}
