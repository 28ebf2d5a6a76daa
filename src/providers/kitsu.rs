use futures::future::join_all;
use serde_json::Value;

use crate::{
    error::Result,
    net::{HttpClient, json},
    types::{AiredRange, AnimeSummary},
};

/// Client for the Kitsu JSON:API (`kitsu.io/api/edge`).
///
/// Kitsu is the supplementary source: it backs the featured carousel with
/// rating-sorted text search when the primary catalog has nothing suitable.
/// Responses follow the JSON:API envelope (`data.N.attributes.…`), which is
/// navigated with the [`json`] helpers rather than a full DTO mirror.
pub struct KitsuClient {
    client: HttpClient,
    api_base: String,
}

impl KitsuClient {
    /// Creates a new Kitsu client.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("kitsu")
                .with_interval(500)
                .with_max_retries(3),
            api_base: "https://kitsu.io/api/edge".to_string(),
        }
    }

    /// Searches anime by text, best-rated first.
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<AnimeSummary>> {
        let url = format!(
            "{}/anime?filter[text]={}&page[limit]={}&sort=-averageRating",
            self.api_base,
            urlencoding::encode(term),
            limit
        );

        let body: Value = self.client.get_json(&url).await?;
        Ok(json::extract_array(&body, "data")
            .iter()
            .filter_map(map_anime)
            .collect())
    }

    /// Fetches the best-rated match for each search term, skipping entries
    /// without a synopsis.
    ///
    /// The terms are independent endpoints, so they are fetched
    /// concurrently; the shared limiter still spaces the actual requests.
    /// A failing term degrades to a missing carousel entry, never an error.
    pub async fn featured(&self, terms: &[&str]) -> Vec<AnimeSummary> {
        let results = join_all(terms.iter().map(|term| self.search(term, 5))).await;

        results
            .into_iter()
            .zip(terms)
            .filter_map(|(result, term)| match result {
                Ok(entries) => entries.into_iter().find(|a| a.synopsis.is_some()),
                Err(e) => {
                    tracing::warn!(term = %term, "featured lookup failed: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl Default for KitsuClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_anime(entry: &Value) -> Option<AnimeSummary> {
    let external_id = json::extract_as::<String>(entry, "id")
        .ok()
        .and_then(|id| id.parse::<u32>().ok())?;

    // Prefer the English-ish title over the Japanese one
    let title = json::extract_path(entry, "attributes.titles.en_jp")
        .or_else(|| json::extract_path(entry, "attributes.canonicalTitle"))
        .or_else(|| json::extract_path(entry, "attributes.titles.ja_jp"))
        .and_then(|v| v.as_str().map(str::to_string))?;

    let score = json::extract_path(entry, "attributes.averageRating")
        .and_then(|v| v.as_str().and_then(|s| s.parse::<f32>().ok()))
        .map(|rating| rating / 10.0);

    let as_string = |path: &str| {
        json::extract_path(entry, path).and_then(|v| v.as_str().map(str::to_string))
    };

    Some(AnimeSummary {
        external_id,
        title,
        title_english: as_string("attributes.titles.en")
            .or_else(|| as_string("attributes.titles.en_jp")),
        cover_url: as_string("attributes.posterImage.large")
            .or_else(|| as_string("attributes.posterImage.original")),
        score,
        kind: as_string("attributes.subtype"),
        episodes: json::extract_path(entry, "attributes.episodeCount").and_then(|v| {
            v.as_u64().map(|n| n as u32)
        }),
        aired: AiredRange {
            from: as_string("attributes.startDate"),
            to: as_string("attributes.endDate"),
        },
        rank: None,
        popularity: None,
        members: None,
        synopsis: as_string("attributes.synopsis"),
        provider: "kitsu".to_string(),
    })
}
