//! Error types and result handling for hakken operations.
//!
//! All fallible operations return a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Network Errors**: connection issues, timeouts, HTTP transport errors
//! - **Parse Errors**: unexpected response shapes, missing fields
//! - **Provider Errors**: upstream-specific errors with context
//! - **Not Found**: missing anime, characters, or people
//! - **Rate Limiting**: when an upstream throttles us past our retries
//! - **Auth Errors**: messages surfaced by the auth backend, shown to users
//!   verbatim
//! - **JSON Errors**: serialization/deserialization failures
//!
//! # Examples
//!
//! ```rust
//! use hakken::error::{Error, Result};
//!
//! fn lookup(id: u32) -> Result<String> {
//!     if id == 0 {
//!         return Err(Error::not_found(format!("Anime with MAL ID {}", id)));
//!     }
//!     Ok("Cowboy Bebop".to_string())
//! }
//!
//! match lookup(0) {
//!     Ok(title) => println!("{}", title),
//!     Err(Error::NotFound(msg)) => println!("missing: {}", msg),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with hakken errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all hakken operations.
///
/// Covers everything from transport failures to upstream-specific errors.
/// Aggregation-level code generally swallows these (degrading to fewer or
/// zero results); detail lookups and auth operations propagate them.
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest): connection
    /// timeouts, DNS failures, TLS errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response data could not be interpreted as expected.
    ///
    /// Used when a response is structurally valid JSON but the expected
    /// fields are missing or malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider-specific errors with contextual information.
    ///
    /// `provider` is the identifier of the upstream service ("jikan",
    /// "anilist", "kitsu", "supabase"); `message` describes what went wrong.
    /// GraphQL `errors` payloads from AniList surface through this variant.
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Resource not found errors.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limiting responses that survived the retry budget.
    ///
    /// `retry_after` carries the upstream `Retry-After` header when present.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Auth backend errors.
    ///
    /// These messages are intended for direct display ("Passwords do not
    /// match", "Invalid login credentials") and are never rewritten.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Generic error messages that fit no other category.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a provider-specific error with provider ID and message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::provider("anilist", "GraphQL query failed");
    /// assert!(error.to_string().contains("anilist"));
    /// ```
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a rate limit error with optional retry-after time.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates an auth error with a user-displayable message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Error::Auth(msg.into())
    }
}
