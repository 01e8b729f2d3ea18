use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A catalog entry ready for display.
///
/// Only [`crate::mapping::map_results`] builds these; every field holds either
/// the value that came over the wire or its documented fallback, so callers
/// never deal with missing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub(crate) kind: String,
    pub(crate) artist_name: String,
    pub(crate) track_name: String,
    pub(crate) artwork_url: String,
    pub(crate) genre_name: String,
    pub(crate) preview_url: String,
}

impl SearchResultItem {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn artist_name(&self) -> &str {
        &self.artist_name
    }

    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    pub fn artwork_url(&self) -> &str {
        &self.artwork_url
    }

    pub fn genre_name(&self) -> &str {
        &self.genre_name
    }

    /// Empty when the catalog entry has no preview clip.
    pub fn preview_url(&self) -> &str {
        &self.preview_url
    }

    pub fn has_preview(&self) -> bool {
        !self.preview_url.is_empty()
    }
}

/// Decoded body of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<RawResultItem>,
}

/// One entry of the `results` array as it appears on the wire.
///
/// Decoding never fails: any JSON value is accepted, and a field that is
/// absent or not a string comes out as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct RawResultItem {
    pub kind: Option<String>,
    pub artist_name: Option<String>,
    pub track_name: Option<String>,
    pub artwork_url60: Option<String>,
    pub primary_genre_name: Option<String>,
    pub preview_url: Option<String>,
}

impl From<Value> for RawResultItem {
    fn from(value: Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            kind: field("kind"),
            artist_name: field("artistName"),
            track_name: field("trackName"),
            artwork_url60: field("artworkUrl60"),
            primary_genre_name: field("primaryGenreName"),
            preview_url: field("previewUrl"),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawResultItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawResultItem>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_field_names() {
        let body = r#"{
            "resultCount": 1,
            "results": [{
                "wrapperType": "track",
                "kind": "song",
                "artistName": "The Beatles",
                "trackName": "Let It Be",
                "artworkUrl60": "https://example.test/60.jpg",
                "primaryGenreName": "Rock",
                "previewUrl": "https://example.test/preview.m4a",
                "trackId": 1441164495
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(body).expect("should decode");
        let item = &response.results[0];
        assert_eq!(item.kind.as_deref(), Some("song"));
        assert_eq!(item.artist_name.as_deref(), Some("The Beatles"));
        assert_eq!(item.track_name.as_deref(), Some("Let It Be"));
        assert_eq!(item.primary_genre_name.as_deref(), Some("Rock"));
    }

    #[test]
    fn missing_or_null_results_decode_as_empty() {
        let missing: SearchResponse = serde_json::from_str("{}").expect("should decode");
        assert!(missing.results.is_empty());

        let null: SearchResponse =
            serde_json::from_str(r#"{"results": null}"#).expect("should decode");
        assert!(null.results.is_empty());
    }

    #[test]
    fn malformed_item_does_not_fail_the_batch() {
        let body = r#"{"results": [
            {"artistName": 42, "trackName": "Kept"},
            null,
            "not an object",
            {"artistName": "Second"}
        ]}"#;

        let response: SearchResponse = serde_json::from_str(body).expect("should decode");
        assert_eq!(response.results.len(), 4);
        assert_eq!(response.results[0].artist_name, None);
        assert_eq!(response.results[0].track_name.as_deref(), Some("Kept"));
        assert_eq!(response.results[1], RawResultItem::default());
        assert_eq!(response.results[3].artist_name.as_deref(), Some("Second"));
    }

    #[test]
    fn non_array_results_is_an_error() {
        let result = serde_json::from_str::<SearchResponse>(r#"{"results": "nope"}"#);
        assert!(result.is_err());
    }
}
