use crate::models::{RawResultItem, SearchResponse, SearchResultItem};

pub const UNKNOWN_KIND: &str = "Unknown";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_GENRE: &str = "Unknown Genre";
pub const PLACEHOLDER_ARTWORK_URL: &str = "https://via.placeholder.com/60";

/// Turns a decoded response into display items, preserving order.
///
/// Total: an empty `results` list yields an empty vec, and a field that is
/// missing or blank is replaced with its fallback literal instead of dropping
/// the item.
pub fn map_results(response: SearchResponse) -> Vec<SearchResultItem> {
    response.results.into_iter().map(map_item).collect()
}

pub fn map_item(raw: RawResultItem) -> SearchResultItem {
    SearchResultItem {
        kind: or_fallback(raw.kind, UNKNOWN_KIND),
        artist_name: or_fallback(raw.artist_name, UNKNOWN_ARTIST),
        track_name: or_fallback(raw.track_name, UNKNOWN_TRACK),
        artwork_url: or_fallback(raw.artwork_url60, PLACEHOLDER_ARTWORK_URL),
        genre_name: or_fallback(raw.primary_genre_name, UNKNOWN_GENRE),
        // no preview is represented by the empty string
        preview_url: or_fallback(raw.preview_url, ""),
    }
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(artist: Option<&str>, track: Option<&str>) -> RawResultItem {
        RawResultItem {
            kind: Some("song".into()),
            artist_name: artist.map(Into::into),
            track_name: track.map(Into::into),
            artwork_url60: Some("https://example.test/60.jpg".into()),
            primary_genre_name: Some("Rock".into()),
            preview_url: Some("https://example.test/p.m4a".into()),
        }
    }

    #[test]
    fn empty_results_map_to_empty() {
        assert!(map_results(SearchResponse::default()).is_empty());
    }

    #[test]
    fn complete_item_is_copied_verbatim() {
        let items = map_results(SearchResponse {
            results: vec![raw(Some("The Beatles"), Some("Help!"))],
        });
        let item = &items[0];
        assert_eq!(item.kind(), "song");
        assert_eq!(item.artist_name(), "The Beatles");
        assert_eq!(item.track_name(), "Help!");
        assert_eq!(item.artwork_url(), "https://example.test/60.jpg");
        assert_eq!(item.genre_name(), "Rock");
        assert_eq!(item.preview_url(), "https://example.test/p.m4a");
        assert!(item.has_preview());
    }

    #[test]
    fn missing_artist_falls_back() {
        let items = map_results(SearchResponse {
            results: vec![raw(None, Some("Help!"))],
        });
        assert_eq!(items[0].artist_name(), UNKNOWN_ARTIST);
        assert_eq!(items[0].track_name(), "Help!");
    }

    #[test]
    fn blank_fields_are_treated_as_missing() {
        let items = map_results(SearchResponse {
            results: vec![raw(Some("  "), Some(""))],
        });
        assert_eq!(items[0].artist_name(), UNKNOWN_ARTIST);
        assert_eq!(items[0].track_name(), UNKNOWN_TRACK);
    }

    #[test]
    fn empty_item_gets_every_fallback() {
        let item = map_item(RawResultItem::default());
        assert_eq!(item.kind(), UNKNOWN_KIND);
        assert_eq!(item.artist_name(), UNKNOWN_ARTIST);
        assert_eq!(item.track_name(), UNKNOWN_TRACK);
        assert_eq!(item.genre_name(), UNKNOWN_GENRE);
        assert_eq!(item.artwork_url(), PLACEHOLDER_ARTWORK_URL);
        assert!(!item.has_preview());
    }

    #[test]
    fn order_is_preserved_around_malformed_items() {
        let items = map_results(SearchResponse {
            results: vec![
                raw(Some("first"), None),
                RawResultItem::default(),
                raw(Some("third"), None),
            ],
        });
        let artists: Vec<_> = items.iter().map(|i| i.artist_name()).collect();
        assert_eq!(artists, vec!["first", UNKNOWN_ARTIST, "third"]);
    }
}
