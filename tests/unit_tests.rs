use hakken::prelude::*;
use hakken::types::SearchParamsBuilder;

mod common;
use common::{anime, ranked_anime};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParamsBuilder::default()
            .query("fullmetal".to_string())
            .limit(Some(10))
            .page(Some(2u32))
            .sfw(true)
            .build()
            .unwrap();

        assert_eq!(params.query, "fullmetal");
        assert_eq!(params.limit, Some(10));
        assert_eq!(params.page, Some(2));
        assert!(params.sfw);
    }

    #[test]
    fn test_search_params_from_string() {
        let params: SearchParams = "death note".into();
        assert_eq!(params.query, "death note");
        assert!(params.limit.is_none());
        assert!(params.page.is_none());
        assert!(!params.sfw);

        let params: SearchParams = "one piece".to_string().into();
        assert_eq!(params.query, "one piece");
    }

    #[test]
    fn test_season_parsing() {
        assert_eq!("winter".parse::<Season>().unwrap(), Season::Winter);
        assert_eq!("Summer".parse::<Season>().unwrap(), Season::Summer);
        assert_eq!("fall".parse::<Season>().unwrap(), Season::Fall);
        assert_eq!("autumn".parse::<Season>().unwrap(), Season::Fall);
        assert!("monsoon".parse::<Season>().is_err());

        assert_eq!(Season::Spring.as_str(), "spring");
        assert_eq!(Season::Winter.to_string(), "winter");
    }

    #[test]
    fn test_top_anime_filter_values() {
        assert_eq!(TopAnimeFilter::Airing.as_str(), "airing");
        assert_eq!(TopAnimeFilter::Upcoming.as_str(), "upcoming");
        assert_eq!(TopAnimeFilter::ByPopularity.as_str(), "bypopularity");
        assert_eq!(TopAnimeFilter::Favorite.as_str(), "favorite");
    }

    #[test]
    fn test_preferred_title_fallback() {
        let mut entry = anime(1, "Shingeki no Kyojin");
        entry.title_english = Some("Attack on Titan".to_string());
        assert_eq!(entry.preferred_title(), "Shingeki no Kyojin");

        entry.title = String::new();
        assert_eq!(entry.preferred_title(), "Attack on Titan");

        entry.title_english = None;
        assert_eq!(entry.preferred_title(), "");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Naruto"), "naruto");
        assert_eq!(normalize_title("naruto "), "naruto");
        assert_eq!(normalize_title("  ONE PIECE  "), "one piece");
    }

    #[test]
    fn test_dedupe_by_title_case_and_whitespace() {
        let list = vec![
            anime(1, "Naruto"),
            anime(2, "Bleach"),
            anime(3, "naruto "),
        ];

        let deduped = list.dedupe_by_title();
        assert_eq!(deduped.len(), 2);
        // First occurrence wins
        assert_eq!(deduped[0].external_id, 1);
        assert_eq!(deduped[0].title, "Naruto");
        assert_eq!(deduped[1].title, "Bleach");
    }

    #[test]
    fn test_dedupe_output_keys_unique() {
        let list = vec![
            anime(1, "A"),
            anime(2, "a"),
            anime(3, "B"),
            anime(4, " b "),
            anime(5, "C"),
        ];
        let raw_len = list.len();

        let deduped = list.dedupe_by_title();
        assert!(deduped.len() <= raw_len);

        let keys: Vec<String> = deduped
            .iter()
            .map(|a| normalize_title(a.preferred_title()))
            .collect();
        let mut unique = keys.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn test_dedupe_by_id() {
        let list = vec![anime(10, "First"), anime(11, "Other"), anime(10, "Again")];

        let deduped = list.dedupe_by_id();
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "First");
    }

    #[test]
    fn test_dedupe_by_key_generic() {
        let unique = dedupe_by_key(vec![1, 2, 2, 3, 1, 4], |n| *n);
        assert_eq!(unique, vec![1, 2, 3, 4]);

        let words = dedupe_by_key(vec!["ab", "cd", "ef"], |w| w.len());
        assert_eq!(words, vec!["ab"]);
    }

    #[test]
    fn test_sort_by_score() {
        let list = vec![
            ranked_anime(1, "Mid", Some(7.2), None, None),
            ranked_anime(2, "Unscored", None, None, None),
            ranked_anime(3, "Top", Some(9.1), None, None),
        ];

        let sorted = list.sort_by_order(SortOrder::Score);
        assert_eq!(sorted[0].external_id, 3);
        assert_eq!(sorted[1].external_id, 1);
        assert_eq!(sorted[2].external_id, 2);
    }

    #[test]
    fn test_sort_by_rank_missing_last() {
        let list = vec![
            ranked_anime(1, "Unranked", None, None, None),
            ranked_anime(2, "Second", None, Some(2), None),
            ranked_anime(3, "First", None, Some(1), None),
        ];

        let sorted = list.sort_by_order(SortOrder::Rank);
        assert_eq!(sorted[0].external_id, 3);
        assert_eq!(sorted[1].external_id, 2);
        assert_eq!(sorted[2].external_id, 1);
    }

    #[test]
    fn test_sort_by_popularity() {
        let list = vec![
            ranked_anime(1, "Small", None, None, Some(1_000)),
            ranked_anime(2, "Huge", None, None, Some(2_000_000)),
            ranked_anime(3, "NoMembers", None, None, None),
        ];

        let sorted = list.sort_by_order(SortOrder::Popularity);
        assert_eq!(sorted[0].external_id, 2);
        assert_eq!(sorted[1].external_id, 1);
        assert_eq!(sorted[2].external_id, 3);
    }

    #[test]
    fn test_slice_page_length_formula() {
        let items: Vec<u32> = (0..57).collect();
        let size = 25;

        for page in 0..=4 {
            let expected = if page == 0 {
                0
            } else {
                size.min(items.len().saturating_sub((page - 1) * size))
            };
            assert_eq!(
                slice_page(&items, page, size).len(),
                expected,
                "wrong slice length for page {}",
                page
            );
        }
    }

    #[test]
    fn test_slice_page_contents_and_edges() {
        let items: Vec<u32> = (1..=60).collect();

        assert_eq!(slice_page(&items, 1, 25), (1..=25).collect::<Vec<u32>>());
        assert_eq!(slice_page(&items, 3, 25), (51..=60).collect::<Vec<u32>>());

        // Out-of-range pages return empty without erroring
        assert!(slice_page(&items, 4, 25).is_empty());
        assert!(slice_page(&items, 1000, 25).is_empty());
        assert!(slice_page(&items, 0, 25).is_empty());
        assert!(slice_page(&items, 1, 0).is_empty());

        let empty: Vec<u32> = vec![];
        assert!(slice_page(&empty, 1, 25).is_empty());
    }

    #[test]
    fn test_pager_navigation() {
        let pager = Pager::new(25);
        assert_eq!(pager.total_pages(0), 0);
        assert_eq!(pager.total_pages(25), 1);
        assert_eq!(pager.total_pages(26), 2);
        assert_eq!(pager.total_pages(75), 3);

        assert!(pager.has_next(60, 1));
        assert!(pager.has_next(60, 2));
        assert!(!pager.has_next(60, 3));
        assert!(!pager.has_next(0, 1));

        // Page size zero is clamped to one
        assert_eq!(Pager::new(0).page_size(), 1);
        assert_eq!(Pager::default().page_size(), 25);
    }

    #[test]
    fn test_extract_character_id_from_links() {
        use hakken::resolve::extract_character_id;
        use hakken::types::ExternalLink;

        let links = vec![
            ExternalLink {
                name: "Official Site".to_string(),
                url: "https://example.com/character/999".to_string(),
            },
            ExternalLink {
                name: "AniList".to_string(),
                url: "https://anilist.co/character/4879/Shinji-Hirako".to_string(),
            },
        ];
        assert_eq!(extract_character_id(&links), Some(4879));

        let no_match = vec![ExternalLink {
            name: "MyAnimeList".to_string(),
            url: "https://myanimelist.net/character/4879".to_string(),
        }];
        assert_eq!(extract_character_id(&no_match), None);

        assert_eq!(extract_character_id(&[]), None);
    }

    #[test]
    fn test_resolved_id_reliability() {
        let exact = ResolvedId {
            id: 1,
            confidence: Confidence::Exact,
        };
        let searched = ResolvedId {
            id: 2,
            confidence: Confidence::Searched,
        };
        let guessed = ResolvedId {
            id: 3,
            confidence: Confidence::Guessed,
        };

        assert!(exact.is_reliable());
        assert!(searched.is_reliable());
        assert!(!guessed.is_reliable());
    }

    #[test]
    fn test_error_display() {
        use hakken::Error;

        let error = Error::parse("missing title field");
        assert!(error.to_string().contains("missing title field"));

        let error = Error::provider("jikan", "HTTP 500");
        let text = error.to_string();
        assert!(text.contains("jikan"));
        assert!(text.contains("HTTP 500"));

        let error = Error::not_found("Anime with MAL ID 0");
        assert!(error.to_string().contains("Anime with MAL ID 0"));
    }

    #[test]
    fn test_json_extraction() {
        use hakken::net::json;
        use serde_json::json;

        let body = json!({
            "data": [
                { "id": "7442", "attributes": { "canonicalTitle": "Attack on Titan" } },
                { "id": "1376", "attributes": { "canonicalTitle": "Death Note" } }
            ]
        });

        let entries = json::extract_array(&body, "data");
        assert_eq!(entries.len(), 2);

        let title: String =
            json::extract_as(&entries[0], "attributes.canonicalTitle").unwrap();
        assert_eq!(title, "Attack on Titan");

        assert!(json::extract_path(&body, "data.missing").is_none());
        assert!(json::extract_as::<String>(&entries[0], "attributes.nope").is_err());
    }

    #[test]
    fn test_credentials_validation() {
        use hakken::auth::Credentials;

        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("a@b.c", "").is_err());

        let err = Credentials::for_sign_up("a@b.c", "secret", "other").unwrap_err();
        assert!(err.to_string().contains("Passwords do not match"));

        let ok = Credentials::for_sign_up("a@b.c", "secret", "secret").unwrap();
        assert_eq!(ok.email, "a@b.c");
    }
}
