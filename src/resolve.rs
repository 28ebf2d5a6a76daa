//! Cross-identifier resolution between the MAL and AniList ID spaces.
//!
//! MyAnimeList and AniList number the same anime and characters
//! differently, and no guaranteed-correct correspondence exists. Voice
//! actor and character detail views query AniList's GraphQL schema, so a
//! MAL ID arriving from a Jikan listing has to be mapped first.
//!
//! Resolution degrades through three strategies, in order of preference:
//!
//! 1. an explicit `anilist.co` link in the source record, pattern-matched
//!    on the URL path ([`Confidence::Exact`])
//! 2. a name-based search against AniList, first result wins
//!    ([`Confidence::Searched`])
//! 3. treating the MAL ID directly as an AniList ID
//!    ([`Confidence::Guessed`])
//!
//! The last strategy is best-effort and may well be wrong; every result
//! carries its [`Confidence`] so callers can decide how much to trust it
//! instead of silently receiving a possibly-mismatched ID.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    providers::{AniListClient, JikanClient},
    types::ExternalLink,
};

/// How a [`ResolvedId`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Extracted from an explicit AniList URL in the source record.
    Exact,
    /// First result of a name-based AniList search; usually right,
    /// occasionally a same-named impostor.
    Searched,
    /// The MAL ID reused verbatim. Unreliable; the two ID spaces only
    /// coincide by accident.
    Guessed,
}

/// An AniList ID together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: u32,
    pub confidence: Confidence,
}

impl ResolvedId {
    /// Whether the ID came from anything better than the verbatim
    /// fallback.
    pub fn is_reliable(&self) -> bool {
        self.confidence != Confidence::Guessed
    }
}

static ANILIST_CHARACTER_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"anilist\.co/character/(\d+)").expect("valid regex"));

/// Extracts an AniList character ID from a record's external links.
///
/// # Examples
///
/// ```rust
/// use hakken::resolve::extract_character_id;
/// use hakken::types::ExternalLink;
///
/// let links = vec![ExternalLink {
///     name: "AniList".to_string(),
///     url: "https://anilist.co/character/4879/Shinji-Hirako".to_string(),
/// }];
/// assert_eq!(extract_character_id(&links), Some(4879));
/// ```
pub fn extract_character_id(links: &[ExternalLink]) -> Option<u32> {
    links.iter().find_map(|link| {
        ANILIST_CHARACTER_URL
            .captures(&link.url)
            .and_then(|caps| caps[1].parse().ok())
    })
}

/// Resolves MAL identifiers into the AniList ID space.
///
/// Borrows both clients so resolution shares their rate budgets with the
/// rest of the application.
pub struct IdResolver<'a> {
    jikan: &'a JikanClient,
    anilist: &'a AniListClient,
}

impl<'a> IdResolver<'a> {
    pub fn new(jikan: &'a JikanClient, anilist: &'a AniListClient) -> Self {
        Self { jikan, anilist }
    }

    /// Resolves a MAL character ID to an AniList character ID.
    ///
    /// Never fails: upstream errors during a strategy are logged and the
    /// next strategy is tried, down to the `Guessed` fallback.
    pub async fn character_to_anilist(&self, mal_id: u32) -> ResolvedId {
        match self.jikan.character_full(mal_id).await {
            Ok(full) => {
                if let Some(id) = extract_character_id(&full.external) {
                    return ResolvedId {
                        id,
                        confidence: Confidence::Exact,
                    };
                }

                match self.anilist.character_id_by_name(&full.detail.name).await {
                    Ok(Some(id)) => {
                        return ResolvedId {
                            id,
                            confidence: Confidence::Searched,
                        };
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(mal_id, "character name search failed: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(mal_id, "character record fetch failed: {}", e);
            }
        }

        ResolvedId {
            id: mal_id,
            confidence: Confidence::Guessed,
        }
    }

    /// Resolves a MAL anime ID to an AniList media ID.
    ///
    /// The `idMal` cross-reference is authoritative when AniList has it;
    /// the title-search fallback kicks in only when it doesn't.
    pub async fn anime_to_anilist(&self, mal_id: u32) -> ResolvedId {
        match self.anilist.media_id_by_mal(mal_id).await {
            Ok(Some(id)) => {
                return ResolvedId {
                    id,
                    confidence: Confidence::Exact,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(mal_id, "idMal lookup failed: {}", e);
            }
        }

        match self.jikan.anime(mal_id).await {
            Ok(Some(anime)) => {
                match self.anilist.media_id_by_title(anime.preferred_title()).await {
                    Ok(Some(id)) => {
                        return ResolvedId {
                            id,
                            confidence: Confidence::Searched,
                        };
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(mal_id, "media title search failed: {}", e);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(mal_id, "anime record fetch failed: {}", e);
            }
        }

        ResolvedId {
            id: mal_id,
            confidence: Confidence::Guessed,
        }
    }
}
