use futures::join;
use serde::Deserialize;

use crate::{
    aggregate::{Aggregator, ListExt},
    error::Result,
    net::HttpClient,
    types::{
        AnimeSummary, Appearance, CharacterDetail, CharacterSummary, ExternalLink, PersonSummary,
        SearchParams, Season, TopAnimeFilter, VoiceActorCredit,
    },
};

/// Jikan list response envelope
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct JikanListResponse<T> {
    #[serde(default)]
    data: Vec<T>,
}

/// Jikan single-record response envelope
#[derive(Debug, Deserialize)]
struct JikanItemResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct JikanAnime {
    mal_id: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_english: Option<String>,
    #[serde(default)]
    images: Option<JikanImages>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    aired: Option<JikanDateRange>,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    popularity: Option<u32>,
    #[serde(default)]
    members: Option<u64>,
    #[serde(default)]
    synopsis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanImages {
    #[serde(default)]
    jpg: Option<JikanImageSet>,
}

#[derive(Debug, Deserialize)]
struct JikanImageSet {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanDateRange {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanCharacter {
    mal_id: u32,
    name: String,
    #[serde(default)]
    name_kanji: Option<String>,
    #[serde(default)]
    about: Option<String>,
    #[serde(default)]
    images: Option<JikanImages>,
    #[serde(default)]
    favorites: Option<u32>,
    #[serde(default)]
    birthday: Option<String>,
    #[serde(default)]
    external: Vec<JikanExternalLink>,
}

#[derive(Debug, Deserialize)]
struct JikanExternalLink {
    #[serde(default)]
    name: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct JikanPerson {
    mal_id: u32,
    name: String,
    #[serde(default)]
    images: Option<JikanImages>,
    #[serde(default)]
    birthday: Option<String>,
    #[serde(default)]
    about: Option<String>,
}

/// One entry of `/characters/{id}/anime`
#[derive(Debug, Deserialize)]
struct JikanAnimeRole {
    #[serde(default)]
    role: Option<String>,
    anime: JikanAnime,
}

/// One entry of `/characters/{id}/voices`
#[derive(Debug, Deserialize)]
struct JikanVoiceEntry {
    #[serde(default)]
    language: Option<String>,
    person: JikanPerson,
}

/// One entry of `/characters/{id}/pictures`
#[derive(Debug, Deserialize)]
struct JikanPicture {
    #[serde(default)]
    jpg: Option<JikanImageSet>,
}

/// Full character record plus the external links the detail endpoint carries.
#[derive(Debug, Clone)]
pub struct CharacterFull {
    pub detail: CharacterDetail,
    pub external: Vec<ExternalLink>,
}

/// Everything the character detail view renders, fetched in one call.
#[derive(Debug, Clone)]
pub struct CharacterBundle {
    pub detail: CharacterDetail,
    pub external: Vec<ExternalLink>,
    pub appearances: Vec<Appearance>,
    pub gallery: Vec<String>,
    pub voices: Vec<VoiceActorCredit>,
}

/// Client for the Jikan REST API (`api.jikan.moe/v4`), the unauthenticated
/// MyAnimeList mirror.
///
/// Covers search (anime, characters, people), the top and seasonal
/// listings, and the character detail endpoints, plus aggregation helpers
/// that merge several listing pages through an [`Aggregator`].
///
/// # Rate Limiting
///
/// Jikan allows 3 requests per second but throttles bursts well below
/// that; this client dispatches at most one request per second through the
/// shared process-wide limiter, the interval the browsing views were tuned
/// for.
///
/// # Examples
///
/// ```rust,no_run
/// use hakken::providers::JikanClient;
/// use hakken::prelude::*;
///
/// # async fn example() -> hakken::Result<()> {
/// let jikan = JikanClient::new();
///
/// let results = jikan.search_anime("one piece".into()).await?;
/// if let Some(anime) = results.first() {
///     println!("{} ({})", anime.preferred_title(), anime.external_id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct JikanClient {
    client: HttpClient,
    api_base: String,
}

impl JikanClient {
    /// Maximum `limit` the Jikan list endpoints accept.
    pub const MAX_LIMIT: usize = 25;

    /// Creates a new Jikan client.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("jikan")
                .with_interval(1000)
                .with_max_retries(3),
            api_base: "https://api.jikan.moe/v4".to_string(),
        }
    }

    fn list_query(params: &SearchParams) -> String {
        let mut parts = vec![
            format!("q={}", urlencoding::encode(params.query.trim())),
            format!(
                "limit={}",
                params.limit.unwrap_or(Self::MAX_LIMIT).min(Self::MAX_LIMIT)
            ),
        ];
        if let Some(page) = params.page {
            parts.push(format!("page={}", page));
        }
        if params.sfw {
            parts.push("sfw=true".to_string());
        }
        parts.join("&")
    }

    /// Searches anime by free text.
    pub async fn search_anime(&self, params: SearchParams) -> Result<Vec<AnimeSummary>> {
        let url = format!("{}/anime?{}", self.api_base, Self::list_query(&params));
        let response: JikanListResponse<JikanAnime> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_anime).collect())
    }

    /// Searches characters by free text.
    pub async fn search_characters(&self, params: SearchParams) -> Result<Vec<CharacterSummary>> {
        let url = format!("{}/characters?{}", self.api_base, Self::list_query(&params));
        let response: JikanListResponse<JikanCharacter> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_character_summary).collect())
    }

    /// Searches people (voice actors, staff) by free text.
    pub async fn search_people(&self, params: SearchParams) -> Result<Vec<PersonSummary>> {
        let url = format!("{}/people?{}", self.api_base, Self::list_query(&params));
        let response: JikanListResponse<JikanPerson> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_person).collect())
    }

    /// One page of the top-anime listing, optionally filtered.
    pub async fn top_anime(
        &self,
        filter: Option<TopAnimeFilter>,
        page: u32,
    ) -> Result<Vec<AnimeSummary>> {
        let mut url = format!(
            "{}/top/anime?page={}&limit={}",
            self.api_base,
            page,
            Self::MAX_LIMIT
        );
        if let Some(filter) = filter {
            url.push_str(&format!("&filter={}", filter.as_str()));
        }
        let response: JikanListResponse<JikanAnime> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_anime).collect())
    }

    /// One page of the top-characters listing.
    pub async fn top_characters(&self, page: u32) -> Result<Vec<CharacterSummary>> {
        let url = format!(
            "{}/top/characters?page={}&limit={}",
            self.api_base,
            page,
            Self::MAX_LIMIT
        );
        let response: JikanListResponse<JikanCharacter> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_character_summary).collect())
    }

    /// One page of a season's listing.
    pub async fn seasonal(&self, year: u16, season: Season, page: u32) -> Result<Vec<AnimeSummary>> {
        let url = format!(
            "{}/seasons/{}/{}?page={}&limit={}",
            self.api_base,
            year,
            season.as_str(),
            page,
            Self::MAX_LIMIT
        );
        let response: JikanListResponse<JikanAnime> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_anime).collect())
    }

    /// One page of the not-yet-aired listing.
    pub async fn upcoming(&self, page: u32) -> Result<Vec<AnimeSummary>> {
        let url = format!("{}/seasons/upcoming?page={}", self.api_base, page);
        let response: JikanListResponse<JikanAnime> = self.client.get_json(&url).await?;
        Ok(response.data.into_iter().map(map_anime).collect())
    }

    /// A single anime record by MAL ID. Returns `Ok(None)` for unknown IDs.
    pub async fn anime(&self, mal_id: u32) -> Result<Option<AnimeSummary>> {
        let url = format!("{}/anime/{}", self.api_base, mal_id);
        let response: JikanItemResponse<JikanAnime> = match self.client.get_json(&url).await {
            Ok(response) => response,
            Err(crate::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(map_anime(response.data)))
    }

    /// The full character record, including external site links.
    pub async fn character_full(&self, mal_id: u32) -> Result<CharacterFull> {
        let url = format!("{}/characters/{}/full", self.api_base, mal_id);
        let response: JikanItemResponse<JikanCharacter> = self.client.get_json(&url).await?;
        Ok(map_character_full(response.data))
    }

    /// The anime a character appears in, with billing.
    pub async fn character_anime(&self, mal_id: u32) -> Result<Vec<Appearance>> {
        let url = format!("{}/characters/{}/anime", self.api_base, mal_id);
        let response: JikanListResponse<JikanAnimeRole> = self.client.get_json(&url).await?;
        Ok(response
            .data
            .into_iter()
            .map(|entry| Appearance {
                anime: map_anime(entry.anime),
                role: entry.role.unwrap_or_default(),
            })
            .collect())
    }

    /// Gallery image URLs for a character.
    pub async fn character_pictures(&self, mal_id: u32) -> Result<Vec<String>> {
        let url = format!("{}/characters/{}/pictures", self.api_base, mal_id);
        let response: JikanListResponse<JikanPicture> = self.client.get_json(&url).await?;
        Ok(response
            .data
            .into_iter()
            .filter_map(|p| p.jpg.and_then(|set| set.image_url))
            .collect())
    }

    /// Voice acting credits for a character.
    pub async fn character_voices(&self, mal_id: u32) -> Result<Vec<VoiceActorCredit>> {
        let url = format!("{}/characters/{}/voices", self.api_base, mal_id);
        let response: JikanListResponse<JikanVoiceEntry> = self.client.get_json(&url).await?;
        Ok(response
            .data
            .into_iter()
            .map(|entry| VoiceActorCredit {
                actor: map_person(entry.person),
                language: entry.language.unwrap_or_default(),
            })
            .collect())
    }

    /// Fetches everything the character detail view needs in one call.
    ///
    /// The character record itself is required and its failure propagates;
    /// the three sub-endpoints (appearances, gallery, voices) are
    /// independent of each other, fetched concurrently, and individually
    /// degrade to empty lists on failure. The shared limiter keeps the
    /// fan-out within the provider's budget.
    pub async fn character_bundle(&self, mal_id: u32) -> Result<CharacterBundle> {
        let full = self.character_full(mal_id).await?;

        let (appearances, gallery, voices) = join!(
            self.character_anime(mal_id),
            self.character_pictures(mal_id),
            self.character_voices(mal_id),
        );

        Ok(CharacterBundle {
            detail: full.detail,
            external: full.external,
            appearances: appearances.unwrap_or_else(|e| {
                tracing::warn!(mal_id, "character appearances failed: {}", e);
                Vec::new()
            }),
            gallery: gallery.unwrap_or_else(|e| {
                tracing::warn!(mal_id, "character gallery failed: {}", e);
                Vec::new()
            }),
            voices: voices.unwrap_or_else(|e| {
                tracing::warn!(mal_id, "character voices failed: {}", e);
                Vec::new()
            }),
        })
    }

    /// Aggregates several pages of a season's listing, deduplicated by
    /// MAL ID.
    pub async fn browse_season(
        &self,
        year: u16,
        season: Season,
        aggregator: &Aggregator,
    ) -> Vec<AnimeSummary> {
        aggregator
            .run(|page| self.seasonal(year, season, page))
            .await
            .dedupe_by_id()
    }

    /// Aggregates several pages of currently-airing top anime,
    /// deduplicated by normalized title.
    pub async fn browse_airing(&self, aggregator: &Aggregator) -> Vec<AnimeSummary> {
        aggregator
            .run(|page| self.top_anime(Some(TopAnimeFilter::Airing), page))
            .await
            .dedupe_by_title()
    }

    /// Aggregates several pages of upcoming anime, deduplicated by
    /// normalized title.
    pub async fn browse_upcoming(&self, aggregator: &Aggregator) -> Vec<AnimeSummary> {
        aggregator
            .run(|page| self.upcoming(page))
            .await
            .dedupe_by_title()
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_anime(data: JikanAnime) -> AnimeSummary {
    let cover_url = data.images.and_then(|images| {
        images
            .jpg
            .and_then(|set| set.large_image_url.or(set.image_url))
    });

    AnimeSummary {
        external_id: data.mal_id,
        title: data.title.unwrap_or_default(),
        title_english: data.title_english,
        cover_url,
        score: data.score,
        kind: data.kind,
        episodes: data.episodes,
        aired: data
            .aired
            .map(|range| crate::types::AiredRange {
                from: range.from,
                to: range.to,
            })
            .unwrap_or_default(),
        rank: data.rank,
        popularity: data.popularity,
        members: data.members,
        synopsis: data.synopsis,
        provider: "jikan".to_string(),
    }
}

fn image_url(images: Option<JikanImages>) -> Option<String> {
    images.and_then(|images| images.jpg.and_then(|set| set.image_url))
}

fn map_character_summary(data: JikanCharacter) -> CharacterSummary {
    CharacterSummary {
        external_id: data.mal_id,
        name: data.name,
        image_url: image_url(data.images),
        favorites: data.favorites.unwrap_or(0),
    }
}

fn map_character_full(data: JikanCharacter) -> CharacterFull {
    let external = data
        .external
        .into_iter()
        .map(|link| ExternalLink {
            name: link.name.unwrap_or_default(),
            url: link.url,
        })
        .collect();

    CharacterFull {
        detail: CharacterDetail {
            external_id: data.mal_id,
            name: data.name,
            native_name: data.name_kanji,
            about: data.about,
            image_url: image_url(data.images),
            favorites: data.favorites.unwrap_or(0),
            gender: None,
            birthday: data.birthday,
        },
        external,
    }
}

fn map_person(data: JikanPerson) -> PersonSummary {
    PersonSummary {
        external_id: data.mal_id,
        name: data.name,
        image_url: image_url(data.images),
        birthday: data.birthday,
        about: data.about,
    }
}
