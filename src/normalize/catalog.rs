//! Popular manga listing.

use crate::requests::author::AuthorAttributes;
use crate::requests::cover::CoverArtAttributes;
use crate::requests::manga::{Manga, MangaQuery};
use crate::requests::query_utils::{
    find_related, ContentRating, EntityType, Locale, Order, OrderOption, SortingOptions,
};

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use std::sync::Arc;

pub const LISTING_LIMIT: u32 = 20;
pub const MAX_TAGS: usize = 3;
pub const COVER_PLACEHOLDER: &str = "https://via.placeholder.com/300x450?text=No+Cover";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const DESCRIPTION_PLACEHOLDER: &str = "Tidak ada deskripsi.";

/// Thumbnail variant appended to cover file names
const COVER_THUMBNAIL_SUFFIX: &str = ".256.jpg";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MangaSummary {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub author: String,
    pub rating: String,
    pub tags: Vec<String>,
    pub description: String,
}

/// Source of the `rating` field.
///
/// The listing endpoint carries no rating, so the gateway makes one up for every entry on every
/// request. Clients rely on the field being there, tests pin it with [FixedRating]
pub trait RatingSource: Send + Sync {
    fn next_rating(&self) -> f64;
}

/// Uniformly random rating in `[7.0, 9.0)`
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRating;

impl RatingSource for RandomRating {
    fn next_rating(&self) -> f64 {
        rand::thread_rng().gen_range(7.0..9.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedRating(pub f64);

impl RatingSource for FixedRating {
    fn next_rating(&self) -> f64 {
        self.0
    }
}

/// Query sent upstream: safe and suggestive titles only, most followed first, with cover art
/// and author embedded so that no secondary lookups are needed
pub fn listing_query() -> MangaQuery {
    let mut order = SortingOptions::new();
    order.insert(OrderOption::FollowedCount, Order::Desc);

    MangaQuery::builder()
        .limit(LISTING_LIMIT)
        .includes(vec![EntityType::CoverArt, EntityType::Author])
        .content_rating(vec![ContentRating::Safe, ContentRating::Suggestive])
        .order(order)
        .build()
}

#[derive(Clone)]
pub struct CatalogNormalizer {
    cover_base_url: String,
    rating: Arc<dyn RatingSource>,
}

impl std::fmt::Debug for CatalogNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogNormalizer")
            .field("cover_base_url", &self.cover_base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogNormalizer {
    pub fn new(cover_base_url: &str) -> Self {
        Self::with_rating_source(cover_base_url, Arc::new(RandomRating))
    }

    pub fn with_rating_source(cover_base_url: &str, rating: Arc<dyn RatingSource>) -> Self {
        Self {
            cover_base_url: cover_base_url.trim_end_matches('/').to_owned(),
            rating,
        }
    }

    /// Normalizes the listing, keeping the server's order. Entries are never dropped, missing
    /// optional fields fall back to placeholders instead
    pub fn normalize(&self, listing: Vec<Manga>) -> Vec<MangaSummary> {
        listing
            .into_iter()
            .map(|manga| self.summarize(manga))
            .collect()
    }

    pub fn summarize(&self, manga: Manga) -> MangaSummary {
        let attributes = &manga.attributes;

        let title = attributes
            .title
            .preferred(Locale::En)
            .unwrap_or_default()
            .to_owned();

        let cover = match find_related::<CoverArtAttributes>(&manga.relationships, EntityType::CoverArt)
        {
            Some(cover) if !cover.file_name.is_empty() => self.cover_url(&manga.id, &cover.file_name),
            _ => COVER_PLACEHOLDER.to_owned(),
        };

        let author = find_related::<AuthorAttributes>(&manga.relationships, EntityType::Author)
            .map(|author| author.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());

        let tags = attributes
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|tag| {
                tag.attributes
                    .name
                    .preferred(Locale::En)
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect();

        let description = attributes
            .description
            .get(Locale::En.code())
            .filter(|description| !description.is_empty())
            .unwrap_or(DESCRIPTION_PLACEHOLDER)
            .to_owned();

        MangaSummary {
            rating: format!("{:.1}", self.rating.next_rating()),
            id: manga.id,
            title,
            cover,
            author,
            tags,
            description,
        }
    }

    fn cover_url(&self, manga_id: &str, file_name: &str) -> String {
        format!(
            "{}/{manga_id}/{file_name}{COVER_THUMBNAIL_SUFFIX}",
            self.cover_base_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    const COVERS: &str = "https://uploads.mangadex.org/covers";

    fn manga(value: serde_json::Value) -> Manga {
        serde_json::from_value(value).unwrap()
    }

    fn normalizer() -> CatalogNormalizer {
        CatalogNormalizer::with_rating_source(COVERS, Arc::new(FixedRating(7.5)))
    }

    fn tag(name: serde_json::Value) -> serde_json::Value {
        json!({"id": "t", "type": "tag", "attributes": {"name": name, "group": "genre"}})
    }

    #[test]
    fn fully_populated_entry() {
        let entry = manga(json!({
            "id": "a77742b1-befd-49a4-bff5-1ad4e6b0ef7b",
            "type": "manga",
            "attributes": {
                "title": {"en": "Chainsaw Man"},
                "description": {"en": "Denji has a simple dream.", "id": "Denji punya mimpi."},
                "tags": [
                    tag(json!({"en": "Action"})),
                    tag(json!({"en": "Comedy"})),
                    tag(json!({"en": "Gore"})),
                    tag(json!({"en": "Horror"})),
                    tag(json!({"en": "Demons"}))
                ],
                "status": "ongoing",
                "year": 2018
            },
            "relationships": [
                {"id": "f5873770", "type": "author", "attributes": {"name": "Fujimoto Tatsuki"}},
                {"id": "f5873770", "type": "artist", "attributes": {"name": "Someone Else"}},
                {"id": "7cbb3d1f", "type": "cover_art", "attributes": {"fileName": "cover.jpg", "volume": "1"}}
            ]
        }));

        let summary = normalizer().summarize(entry);

        assert_eq!(
            summary,
            MangaSummary {
                id: "a77742b1-befd-49a4-bff5-1ad4e6b0ef7b".to_owned(),
                title: "Chainsaw Man".to_owned(),
                cover: format!("{COVERS}/a77742b1-befd-49a4-bff5-1ad4e6b0ef7b/cover.jpg.256.jpg"),
                author: "Fujimoto Tatsuki".to_owned(),
                rating: "7.5".to_owned(),
                tags: vec!["Action".to_owned(), "Comedy".to_owned(), "Gore".to_owned()],
                description: "Denji has a simple dream.".to_owned(),
            }
        );
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let entry = manga(json!({
            "id": "m1",
            "type": "manga",
            "attributes": {
                "title": {"ja-ro": "Sousou no Frieren", "ja": "葬送のフリーレン"},
                "description": [],
                "tags": []
            },
            "relationships": [
                {"id": "c1", "type": "cover_art"},
                {"id": "a1", "type": "author"}
            ]
        }));

        let summary = normalizer().summarize(entry);

        assert_eq!(summary.title, "Sousou no Frieren");
        assert_eq!(summary.cover, COVER_PLACEHOLDER);
        assert_eq!(summary.author, UNKNOWN_AUTHOR);
        assert!(summary.tags.is_empty());
        assert_eq!(summary.description, DESCRIPTION_PLACEHOLDER);
    }

    #[test]
    fn description_only_in_other_locales_uses_placeholder() {
        let entry = manga(json!({
            "id": "m2",
            "type": "manga",
            "attributes": {
                "title": {"en": "Blue Lock"},
                "description": {"id": "Deskripsi dalam bahasa Indonesia"}
            },
            "relationships": []
        }));

        let summary = normalizer().summarize(entry);
        assert_eq!(summary.description, DESCRIPTION_PLACEHOLDER);
        assert_eq!(summary.cover, COVER_PLACEHOLDER);
    }

    #[test]
    fn title_without_english_comes_from_the_map() {
        let entry = manga(json!({
            "id": "m3",
            "type": "manga",
            "attributes": {"title": {"en": "", "ko": "나 혼자만 레벨업", "ja": "俺だけレベルアップな件"}},
            "relationships": []
        }));

        let summary = normalizer().summarize(entry);
        assert_eq!(summary.title, "나 혼자만 레벨업");
    }

    #[test]
    fn tags_are_an_ordered_prefix() {
        let entry = manga(json!({
            "id": "m4",
            "type": "manga",
            "attributes": {
                "title": {"en": "Spy x Family"},
                "tags": [tag(json!({"en": "Comedy"})), tag(json!({"ja": "家族"})), tag(json!({"en": "Action"})), tag(json!({"en": "Spy"}))]
            },
            "relationships": []
        }));

        let summary = normalizer().summarize(entry);
        assert_eq!(summary.tags, vec!["Comedy", "家族", "Action"]);
    }

    #[test]
    fn unfamiliar_upstream_values_still_normalize() {
        let entry = manga(json!({
            "id": "m5",
            "type": "manga",
            "attributes": {
                "title": {"en": "Kaiju No. 8"},
                "contentRating": "brand_new_rating",
                "status": "on_break",
                "tags": [
                    {"id": "t1", "type": "tag", "attributes": {"name": {"en": "Monsters"}, "group": "brand_new_group"}},
                    {"id": "t2", "type": "tag", "attributes": {"name": {"en": "Action"}}}
                ]
            },
            "relationships": [
                {"id": "c1", "type": "cover_art", "attributes": {"fileName": "k8.png", "locale": "xx-new"}}
            ]
        }));

        let summary = normalizer().summarize(entry);

        assert_eq!(summary.tags, vec!["Monsters", "Action"]);
        assert_eq!(summary.cover, format!("{COVERS}/m5/k8.png.256.jpg"));
    }

    #[test]
    fn listing_order_is_kept() {
        let listing = ["z", "a", "m"]
            .into_iter()
            .map(|id| {
                manga(json!({
                    "id": id,
                    "type": "manga",
                    "attributes": {"title": {"en": id}},
                    "relationships": []
                }))
            })
            .collect();

        let ids: Vec<_> = normalizer()
            .normalize(listing)
            .into_iter()
            .map(|summary| summary.id)
            .collect();

        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn random_rating_stays_in_range() {
        let rating = RandomRating;

        for _ in 0..1000 {
            let value = rating.next_rating();
            assert!((7.0..9.0).contains(&value), "{value}");
        }
    }

    #[test]
    fn cover_base_url_trailing_slash_is_dropped() {
        let normalizer = CatalogNormalizer::new("https://covers.example/");
        assert_eq!(
            normalizer.cover_url("m", "f.png"),
            "https://covers.example/m/f.png.256.jpg"
        );
    }

    #[test]
    fn listing_query_encodes_upstream_policy() {
        let encoded = serde_qs::to_string(&listing_query()).unwrap();

        assert!(encoded.contains("limit=20"), "{encoded}");
        assert!(encoded.contains("order[followedCount]=desc"), "{encoded}");
        assert!(encoded.contains("=cover_art"), "{encoded}");
        assert!(encoded.contains("=author"), "{encoded}");
        assert!(encoded.contains("=safe"), "{encoded}");
        assert!(encoded.contains("=suggestive"), "{encoded}");
    }
}
