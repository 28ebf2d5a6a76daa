//! JSON extraction utilities for nested API payloads.
//!
//! The JSON:API shape Kitsu returns nests everything under
//! `data.N.attributes.…`; these helpers navigate such structures with dot
//! notation instead of hand-written chains of `.get()`.
//!
//! # Examples
//!
//! ```rust
//! use hakken::net::json;
//! use serde_json::json;
//!
//! let data = json!({
//!     "attributes": {
//!         "canonicalTitle": "Cowboy Bebop",
//!         "averageRating": "88.1",
//!         "titles": { "en_jp": "Cowboy Bebop" }
//!     }
//! });
//!
//! let title = json::extract_path(&data, "attributes.canonicalTitle").unwrap();
//! assert_eq!(title.as_str(), Some("Cowboy Bebop"));
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts a value from nested JSON using dot notation.
///
/// Returns `None` if any part of the path doesn't exist.
///
/// # Examples
///
/// ```rust
/// use hakken::net::json;
/// use serde_json::json;
///
/// let data = json!({ "attributes": { "titles": { "en_jp": "Naruto" } } });
///
/// let title = json::extract_path(&data, "attributes.titles.en_jp");
/// assert_eq!(title.unwrap().as_str(), Some("Naruto"));
///
/// let missing = json::extract_path(&data, "attributes.titles.fr");
/// assert_eq!(missing, None);
/// ```
pub fn extract_path(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;

    for key in path.split('.') {
        current = current.get(key)?;
    }

    Some(current.clone())
}

/// Extracts and deserializes a value from a nested JSON path.
///
/// # Errors
///
/// * [`Error::Parse`](crate::Error::Parse) - if the path doesn't exist
/// * [`Error::Json`](crate::Error::Json) - if deserialization fails
pub fn extract_as<T>(json: &Value, path: &str) -> crate::Result<T>
where
    T: DeserializeOwned,
{
    extract_path(json, path)
        .ok_or_else(|| crate::Error::parse(format!("Path not found: {}", path)))
        .and_then(|v| serde_json::from_value(v).map_err(Into::into))
}

/// Extracts an array from a nested JSON path.
///
/// Returns an empty vector if the path doesn't exist, doesn't point to an
/// array, or the array is empty.
///
/// # Examples
///
/// ```rust
/// use hakken::net::json;
/// use serde_json::json;
///
/// let data = json!({ "data": [ { "id": "1" }, { "id": "2" } ] });
///
/// let entries = json::extract_array(&data, "data");
/// assert_eq!(entries.len(), 2);
///
/// let missing = json::extract_array(&data, "included");
/// assert_eq!(missing.len(), 0);
/// ```
pub fn extract_array(json: &Value, path: &str) -> Vec<Value> {
    extract_path(json, path)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
}
