//! Upstream provider clients with conditional compilation support.
//!
//! The three metadata services are deliberately separate clients rather
//! than implementations of a shared trait: they speak different protocols
//! (REST, GraphQL, JSON:API) and expose disjoint capabilities. What they do
//! share is the process-wide rate limiter and the pooled HTTP client in
//! [`net`](crate::net).
//!
//! # Feature Flags
//!
//! Each provider is behind its own feature flag:
//! - `provider-jikan` - the Jikan REST client (MyAnimeList mirror)
//! - `provider-anilist` - the AniList GraphQL client
//! - `provider-kitsu` - the Kitsu JSON:API client
//! - `all-providers` - all of the above (default)
//!
//! Build with only Jikan support:
//! ```bash
//! cargo build --no-default-features --features provider-jikan
//! ```

#[cfg(feature = "provider-jikan")]
pub mod jikan;

#[cfg(feature = "provider-anilist")]
pub mod anilist;

#[cfg(feature = "provider-kitsu")]
pub mod kitsu;

#[cfg(feature = "provider-jikan")]
pub use jikan::JikanClient;

#[cfg(feature = "provider-anilist")]
pub use anilist::AniListClient;

#[cfg(feature = "provider-kitsu")]
pub use kitsu::KitsuClient;
