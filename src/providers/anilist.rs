use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{Error, Result},
    net::HttpClient,
    types::{AnimeSummary, CharacterDetail, CharacterSummary, PersonSummary, VoiceRole},
};

/// `Media(idMal:)` lookup, the cheap MAL-to-AniList conversion.
const MEDIA_ID_BY_MAL_QUERY: &str = r#"
query ($malId: Int!) {
  Media(idMal: $malId, type: ANIME) {
    id
  }
}
"#;

/// High-quality cover/banner art by title search.
const MEDIA_IMAGES_QUERY: &str = r#"
query ($search: String) {
  Media(search: $search, type: ANIME) {
    title {
      romaji
    }
    coverImage {
      medium
      large
      extraLarge
    }
    bannerImage
  }
}
"#;

/// Media ID by title search, the middle resolution fallback for anime.
const MEDIA_ID_BY_SEARCH_QUERY: &str = r#"
query ($search: String) {
  Media(search: $search, type: ANIME) {
    id
  }
}
"#;

/// Character ID by name search, the middle resolution fallback.
const CHARACTER_ID_BY_NAME_QUERY: &str = r#"
query ($search: String) {
  Character(search: $search) {
    id
  }
}
"#;

const CHARACTER_BY_ID_QUERY: &str = r#"
query ($id: Int) {
  Character(id: $id) {
    id
    name {
      full
      native
    }
    description
    image {
      large
    }
    gender
    dateOfBirth {
      year
      month
      day
    }
    favourites
    media(sort: POPULARITY_DESC, perPage: 30) {
      nodes {
        id
        idMal
        title {
          english
          romaji
        }
        coverImage {
          large
        }
        bannerImage
        averageScore
        type
      }
    }
  }
}
"#;

const VOICE_ACTORS_QUERY: &str = r#"
query ($id: Int!) {
  Media(id: $id, type: ANIME) {
    id
    title {
      romaji
      english
    }
    characters(role: MAIN, sort: [ROLE, RELEVANCE, ID]) {
      edges {
        node {
          id
          name {
            full
          }
          image {
            large
            medium
          }
        }
        voiceActors(language: JAPANESE, sort: [RELEVANCE, ID]) {
          id
          name {
            full
          }
          image {
            large
            medium
          }
          dateOfBirth {
            year
            month
            day
          }
          description
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct MediaIdData {
    #[serde(rename = "Media")]
    media: Option<MediaIdNode>,
}

#[derive(Debug, Deserialize)]
struct MediaIdNode {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct MediaImagesData {
    #[serde(rename = "Media")]
    media: Option<MediaImagesNode>,
}

#[derive(Debug, Deserialize)]
struct MediaImagesNode {
    #[serde(default)]
    title: Option<TitleNode>,
    #[serde(rename = "coverImage", default)]
    cover_image: Option<CoverImageNode>,
    #[serde(rename = "bannerImage", default)]
    banner_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitleNode {
    #[serde(default)]
    romaji: Option<String>,
    #[serde(default)]
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoverImageNode {
    #[serde(default)]
    medium: Option<String>,
    #[serde(default)]
    large: Option<String>,
    #[serde(rename = "extraLarge", default)]
    extra_large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CharacterIdData {
    #[serde(rename = "Character")]
    character: Option<CharacterIdNode>,
}

#[derive(Debug, Deserialize)]
struct CharacterIdNode {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct CharacterData {
    #[serde(rename = "Character")]
    character: Option<CharacterNode>,
}

#[derive(Debug, Deserialize)]
struct CharacterNode {
    id: u32,
    name: NameNode,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<ImageNode>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(rename = "dateOfBirth", default)]
    date_of_birth: Option<FuzzyDateNode>,
    #[serde(default)]
    favourites: Option<u32>,
    #[serde(default)]
    media: Option<MediaConnectionNode>,
}

#[derive(Debug, Deserialize)]
struct NameNode {
    #[serde(default)]
    full: Option<String>,
    #[serde(default)]
    native: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    #[serde(default)]
    large: Option<String>,
    #[serde(default)]
    medium: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FuzzyDateNode {
    #[serde(default)]
    year: Option<u16>,
    #[serde(default)]
    month: Option<u8>,
    #[serde(default)]
    day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct MediaConnectionNode {
    #[serde(default)]
    nodes: Vec<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    id: u32,
    #[serde(rename = "idMal", default)]
    id_mal: Option<u32>,
    #[serde(default)]
    title: Option<TitleNode>,
    #[serde(rename = "coverImage", default)]
    cover_image: Option<CoverImageNode>,
    #[serde(rename = "bannerImage", default)]
    banner_image: Option<String>,
    #[serde(rename = "averageScore", default)]
    average_score: Option<u32>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoiceActorsData {
    #[serde(rename = "Media")]
    media: Option<VoiceActorsMediaNode>,
}

#[derive(Debug, Deserialize)]
struct VoiceActorsMediaNode {
    #[serde(default)]
    characters: Option<CharacterConnectionNode>,
}

#[derive(Debug, Deserialize)]
struct CharacterConnectionNode {
    #[serde(default)]
    edges: Vec<CharacterEdgeNode>,
}

#[derive(Debug, Deserialize)]
struct CharacterEdgeNode {
    node: CharacterEdgeCharacter,
    #[serde(rename = "voiceActors", default)]
    voice_actors: Vec<VoiceActorNode>,
}

#[derive(Debug, Deserialize)]
struct CharacterEdgeCharacter {
    id: u32,
    name: NameNode,
    #[serde(default)]
    image: Option<ImageNode>,
}

#[derive(Debug, Deserialize)]
struct VoiceActorNode {
    id: u32,
    name: NameNode,
    #[serde(default)]
    image: Option<ImageNode>,
    #[serde(rename = "dateOfBirth", default)]
    date_of_birth: Option<FuzzyDateNode>,
    #[serde(default)]
    description: Option<String>,
}

/// Cover and banner art for one media entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaImages {
    pub title: Option<String>,
    pub cover_medium: Option<String>,
    pub cover_large: Option<String>,
    pub cover_extra_large: Option<String>,
    pub banner: Option<String>,
}

/// A character record from AniList with its media appearances.
#[derive(Debug, Clone)]
pub struct AniListCharacter {
    pub detail: CharacterDetail,
    pub appearances: Vec<AnimeSummary>,
}

/// Client for the AniList GraphQL API (`graphql.anilist.co`).
///
/// Used where Jikan falls short: MAL-to-AniList identifier conversion via
/// the `idMal` query argument, high-resolution cover/banner art, and voice
/// actor credits, which AniList models far better than the REST mirrors.
///
/// # Rate Limiting
///
/// AniList's budget is 30 requests per minute; the client dispatches at
/// most one request per two seconds through the shared limiter.
pub struct AniListClient {
    client: HttpClient,
    api_base: String,
}

impl AniListClient {
    /// Creates a new AniList client.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("anilist")
                .with_interval(2000)
                .with_max_retries(3),
            api_base: "https://graphql.anilist.co".to_string(),
        }
    }

    /// Resolves a MAL anime ID to the corresponding AniList media ID.
    ///
    /// Returns `Ok(None)` when AniList has no entry cross-referenced to
    /// that MAL ID.
    pub async fn media_id_by_mal(&self, mal_id: u32) -> Result<Option<u32>> {
        let response: Result<MediaIdData> = self
            .client
            .graphql(
                &self.api_base,
                MEDIA_ID_BY_MAL_QUERY,
                json!({ "malId": mal_id }),
            )
            .await;

        match response {
            Ok(data) => Ok(data.media.map(|m| m.id)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Looks up cover/banner art for the best title match.
    ///
    /// Returns `Ok(None)` when no media matches the search term.
    pub async fn media_images(&self, search: &str) -> Result<Option<MediaImages>> {
        let response: Result<MediaImagesData> = self
            .client
            .graphql(&self.api_base, MEDIA_IMAGES_QUERY, json!({ "search": search }))
            .await;

        let media = match response {
            Ok(data) => data.media,
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(media.map(|node| {
            let cover = node.cover_image;
            MediaImages {
                title: node.title.and_then(|t| t.romaji),
                cover_medium: cover.as_ref().and_then(|c| c.medium.clone()),
                cover_large: cover.as_ref().and_then(|c| c.large.clone()),
                cover_extra_large: cover.and_then(|c| c.extra_large),
                banner: node.banner_image,
            }
        }))
    }

    /// Finds the AniList ID of the best title match, first result wins.
    pub async fn media_id_by_title(&self, search: &str) -> Result<Option<u32>> {
        let response: Result<MediaIdData> = self
            .client
            .graphql(
                &self.api_base,
                MEDIA_ID_BY_SEARCH_QUERY,
                json!({ "search": search }),
            )
            .await;

        match response {
            Ok(data) => Ok(data.media.map(|m| m.id)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Finds the AniList ID of a same-named character, first result wins.
    pub async fn character_id_by_name(&self, name: &str) -> Result<Option<u32>> {
        let response: Result<CharacterIdData> = self
            .client
            .graphql(
                &self.api_base,
                CHARACTER_ID_BY_NAME_QUERY,
                json!({ "search": name }),
            )
            .await;

        match response {
            Ok(data) => Ok(data.character.map(|c| c.id)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches a character's full record and media appearances.
    pub async fn character(&self, anilist_id: u32) -> Result<Option<AniListCharacter>> {
        let response: Result<CharacterData> = self
            .client
            .graphql(&self.api_base, CHARACTER_BY_ID_QUERY, json!({ "id": anilist_id }))
            .await;

        let node = match response {
            Ok(data) => data.character,
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(node.map(map_character))
    }

    /// Fetches the main-cast voice acting credits for a media entry.
    ///
    /// Each main character edge contributes its first Japanese voice actor;
    /// edges without one are skipped.
    pub async fn voice_actors(&self, anilist_media_id: u32) -> Result<Vec<VoiceRole>> {
        let response: Result<VoiceActorsData> = self
            .client
            .graphql(
                &self.api_base,
                VOICE_ACTORS_QUERY,
                json!({ "id": anilist_media_id }),
            )
            .await;

        let media = match response {
            Ok(data) => data.media,
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let edges = media
            .and_then(|m| m.characters)
            .map(|c| c.edges)
            .unwrap_or_default();

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let actor = edge.voice_actors.into_iter().next()?;
                Some(VoiceRole {
                    character: CharacterSummary {
                        external_id: edge.node.id,
                        name: edge.node.name.full.unwrap_or_default(),
                        image_url: image_url(edge.node.image),
                        favorites: 0,
                    },
                    actor: PersonSummary {
                        external_id: actor.id,
                        name: actor.name.full.unwrap_or_default(),
                        image_url: image_url(actor.image),
                        birthday: actor.date_of_birth.and_then(format_fuzzy_date),
                        about: actor.description,
                    },
                    language: "Japanese".to_string(),
                })
            })
            .collect())
    }
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new()
    }
}

fn image_url(image: Option<ImageNode>) -> Option<String> {
    image.and_then(|img| img.large.or(img.medium))
}

/// Formats a fuzzy date as ISO-8601, dropping it entirely without a year.
fn format_fuzzy_date(date: FuzzyDateNode) -> Option<String> {
    let year = date.year?;
    Some(format!(
        "{:04}-{:02}-{:02}",
        year,
        date.month.unwrap_or(1),
        date.day.unwrap_or(1)
    ))
}

fn map_character(node: CharacterNode) -> AniListCharacter {
    let appearances = node
        .media
        .map(|m| m.nodes)
        .unwrap_or_default()
        .into_iter()
        .map(|media| AnimeSummary {
            // MAL ID preferred so detail links stay in one ID space
            external_id: media.id_mal.unwrap_or(media.id),
            title: media
                .title
                .as_ref()
                .and_then(|t| t.romaji.clone())
                .unwrap_or_default(),
            title_english: media.title.and_then(|t| t.english),
            cover_url: media
                .cover_image
                .and_then(|c| c.large)
                .or(media.banner_image),
            score: media.average_score.map(|s| s as f32 / 10.0),
            kind: media.kind,
            episodes: None,
            aired: Default::default(),
            rank: None,
            popularity: None,
            members: None,
            synopsis: None,
            provider: "anilist".to_string(),
        })
        .collect();

    AniListCharacter {
        detail: CharacterDetail {
            external_id: node.id,
            name: node.name.full.unwrap_or_default(),
            native_name: node.name.native,
            about: node.description,
            image_url: node.image.and_then(|img| img.large.or(img.medium)),
            favorites: node.favourites.unwrap_or(0),
            gender: node.gender,
            birthday: node.date_of_birth.and_then(format_fuzzy_date),
        },
        appearances,
    }
}
