//! # Hakken - Unified anime discovery library
//!
//! Hakken is an async client library for anime discovery. It wraps three
//! public metadata services, Jikan (the MyAnimeList mirror), AniList's
//! GraphQL API, and Kitsu, plus Supabase auth, behind one process-wide
//! rate-limit budget, and provides the aggregation glue a browsing UI
//! needs: sequential multi-page fetching, title/ID deduplication,
//! client-side paging, and MAL↔AniList identifier resolution.
//!
//! ## Features
//!
//! - **Typed Provider Clients**: Jikan REST, AniList GraphQL, and Kitsu
//!   JSON:API clients returning shared view-model types
//! - **Uniform Rate Limiting**: every upstream call, concurrent or
//!   sequential, is dispatched through a single per-provider limiter
//! - **Paged Aggregation**: sequential page loops with fixed delays,
//!   early stop on empty pages, and failure-tolerant merging
//! - **Result Processing**: first-seen-wins deduplication by normalized
//!   title or numeric ID, client-side sorting and paging
//! - **Identifier Resolution**: MAL-to-AniList mapping that reports how
//!   trustworthy each answer is
//! - **Auth Session Bridge**: Supabase sign-up/sign-in/sign-out with a
//!   watch-channel session state and leak-free teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hakken::prelude::*;
//! use hakken::providers::JikanClient;
//!
//! #[tokio::main]
//! async fn main() -> hakken::Result<()> {
//!     let jikan = JikanClient::new();
//!
//!     // Three pages of currently-airing anime, deduplicated by title,
//!     // sliced into a 25-entry view page.
//!     let airing = jikan.browse_airing(&Aggregator::new(3)).await;
//!     let pager = Pager::new(25);
//!     for anime in pager.slice(&airing, 1) {
//!         println!("{} ({:?})", anime.preferred_title(), anime.score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`providers`]: the three upstream clients, one module each
//! - [`aggregate`]: the sequential page-fetch engine and list processing
//! - [`pager`]: pure client-side paging
//! - [`resolve`]: MAL → AniList identifier resolution with confidence
//! - [`auth`]: Supabase auth client and session bridge
//! - [`net`]: shared HTTP client, rate limiter, JSON helpers
//! - [`types`]: view-model data structures
//! - [`error`]: error handling
//!
//! ## Identifier resolution
//!
//! MAL and AniList number the same entities differently. Resolution
//! degrades through explicit links, name search, and a verbatim guess,
//! and tells you which one you got:
//!
//! ```rust,no_run
//! use hakken::prelude::*;
//! use hakken::providers::{AniListClient, JikanClient};
//!
//! # async fn example() {
//! let jikan = JikanClient::new();
//! let anilist = AniListClient::new();
//!
//! let resolved = IdResolver::new(&jikan, &anilist)
//!     .character_to_anilist(417)
//!     .await;
//! if !resolved.is_reliable() {
//!     // render a "best effort" hint instead of trusting the ID
//! }
//! # }
//! ```

pub mod aggregate;
pub mod error;
pub mod net;
pub mod pager;
pub mod providers;
pub mod types;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(all(feature = "provider-jikan", feature = "provider-anilist"))]
pub mod resolve;

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types and traits so a single
/// `use hakken::prelude::*;` covers the typical call site.
pub mod prelude {
    pub use crate::{
        aggregate::{Aggregator, ListExt, dedupe_by_key, normalize_title},
        pager::{Pager, slice_page},
        types::{
            AnimeSummary, CharacterDetail, CharacterSummary, PersonSummary, SearchParams,
            Season, SortOrder, TopAnimeFilter,
        },
    };

    #[cfg(feature = "auth")]
    pub use crate::auth::{AuthClient, AuthProvider, Credentials, SessionBridge, SessionState};

    #[cfg(all(feature = "provider-jikan", feature = "provider-anilist"))]
    pub use crate::resolve::{Confidence, IdResolver, ResolvedId};
}

// Re-export main types at crate root for direct access
pub use aggregate::{Aggregator, ListExt, dedupe_by_key, normalize_title};
pub use error::{Error, Result};
pub use pager::{Pager, slice_page};
pub use types::{AnimeSummary, CharacterSummary, SearchParams, Season, SortOrder};
