//! Core data types for anime, characters, people, and search parameters.
//!
//! Everything here is a transient view model: created from an API response,
//! handed to the caller, and discarded. Nothing is persisted and no field is
//! ever partially updated in place.
//!
//! # Examples
//!
//! ```rust
//! use hakken::types::*;
//!
//! let anime = AnimeSummary {
//!     external_id: 1,
//!     title: "Cowboy Bebop".to_string(),
//!     title_english: Some("Cowboy Bebop".to_string()),
//!     cover_url: None,
//!     score: Some(8.75),
//!     kind: Some("TV".to_string()),
//!     episodes: Some(26),
//!     aired: AiredRange::default(),
//!     rank: Some(46),
//!     popularity: Some(43),
//!     members: None,
//!     synopsis: None,
//!     provider: "jikan".to_string(),
//! };
//! assert_eq!(anime.preferred_title(), "Cowboy Bebop");
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An anime series or film as one entry of a browsing/search result.
///
/// `external_id` is the numeric identifier in the provider's own ID space
/// (MAL ID for Jikan, Kitsu ID for Kitsu entries that could not be mapped).
/// `provider` records which service the record came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    /// Numeric identifier within the provider's ID space
    pub external_id: u32,

    /// Default title (usually romaji)
    pub title: String,

    /// English title, when the provider has one
    pub title_english: Option<String>,

    /// Cover image URL
    pub cover_url: Option<String>,

    /// Community score on a 0-10 scale
    pub score: Option<f32>,

    /// Media kind: "TV", "Movie", "OVA", ...
    pub kind: Option<String>,

    /// Episode count, absent for unaired or ongoing entries
    pub episodes: Option<u32>,

    /// Airing date range
    #[serde(default)]
    pub aired: AiredRange,

    /// Overall rank, lower is better
    pub rank: Option<u32>,

    /// Popularity rank, lower is better
    pub popularity: Option<u32>,

    /// Member/list count backing the popularity sort
    pub members: Option<u64>,

    /// Plot summary
    pub synopsis: Option<String>,

    /// Provider identifier this record came from
    pub provider: String,
}

impl AnimeSummary {
    /// The title to display and deduplicate on: the default title, falling
    /// back to the English one when the default is empty.
    pub fn preferred_title(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else {
            self.title_english.as_deref().unwrap_or("")
        }
    }
}

/// Airing date range, carried as the ISO-8601 strings the upstream emits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiredRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// A character as one entry of a browsing/search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    /// Numeric identifier within the provider's ID space
    pub external_id: u32,

    /// Character name
    pub name: String,

    /// Portrait image URL
    pub image_url: Option<String>,

    /// Favorites count
    pub favorites: u32,
}

/// Full character record for a detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDetail {
    pub external_id: u32,
    pub name: String,
    pub native_name: Option<String>,
    pub about: Option<String>,
    pub image_url: Option<String>,
    pub favorites: u32,
    pub gender: Option<String>,
    /// Birthday as an ISO-8601 string when the provider has one
    pub birthday: Option<String>,
}

/// A person (voice actor, staff) as one entry of a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub external_id: u32,
    pub name: String,
    pub image_url: Option<String>,
    pub birthday: Option<String>,
    pub about: Option<String>,
}

/// An anime a character appears in, with the character's billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub anime: AnimeSummary,
    /// "Main" or "Supporting"
    pub role: String,
}

/// A voice acting credit: who voices which character, in which language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRole {
    pub character: CharacterSummary,
    pub actor: PersonSummary,
    pub language: String,
}

/// A voice acting credit scoped to an already-known character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceActorCredit {
    pub actor: PersonSummary,
    pub language: String,
}

/// An external site link attached to an upstream record.
///
/// Cross-identifier resolution pattern-matches these for AniList URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    #[serde(default)]
    pub name: String,
    pub url: String,
}

/// Search parameters for querying a provider.
///
/// Uses the builder pattern (via `derive_builder`) for fluent construction:
///
/// ```rust
/// use hakken::types::SearchParamsBuilder;
///
/// let params = SearchParamsBuilder::default()
///     .query("one piece".to_string())
///     .limit(Some(20))
///     .build()
///     .unwrap();
/// assert_eq!(params.query, "one piece");
/// ```
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct SearchParams {
    pub query: String,
    #[builder(default)]
    pub limit: Option<usize>,
    #[builder(default)]
    pub page: Option<u32>,
    /// Restrict results to safe-for-work entries where supported
    #[builder(default)]
    pub sfw: bool,
}

impl From<String> for SearchParams {
    fn from(query: String) -> Self {
        SearchParams {
            query,
            ..Default::default()
        }
    }
}

impl From<&str> for SearchParams {
    fn from(query: &str) -> Self {
        SearchParams {
            query: query.to_string(),
            ..Default::default()
        }
    }
}

/// Anime season quarters as understood by the seasonal endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Lowercase form used in Jikan URL paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl std::str::FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            other => Err(Error::parse(format!(
                "Invalid season '{}'. Must be one of: winter, spring, summer, fall",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters accepted by the top-anime listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopAnimeFilter {
    Airing,
    Upcoming,
    ByPopularity,
    Favorite,
}

impl TopAnimeFilter {
    /// Query-string value used by the Jikan `/top/anime` endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopAnimeFilter::Airing => "airing",
            TopAnimeFilter::Upcoming => "upcoming",
            TopAnimeFilter::ByPopularity => "bypopularity",
            TopAnimeFilter::Favorite => "favorite",
        }
    }
}

/// Client-side sort orders applied after aggregation.
///
/// These replicate the sort menus of the browsing views; missing values
/// always sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Community score, highest first
    Score,
    /// Member count, highest first
    Popularity,
    /// Overall rank, lowest first
    Rank,
}
