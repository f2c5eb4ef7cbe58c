//! Chapter feed of a single manga.
//!
//! Language filtering, ordering and the size cap are all part of the upstream query, the
//! projection below passes the server's answer through as is.

use crate::requests::chapter::{Chapter, MangaFeedQuery};
use crate::requests::query_utils::{Locale, Order, OrderOption, SortingOptions};

use serde::{Deserialize, Serialize};

pub const FEED_LIMIT: u32 = 100;
pub const FEED_LANGUAGES: [Locale; 2] = [Locale::En, Locale::Id];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChapterSummary {
    /// Identifier accepted by the page resolver
    pub id: String,
    pub chapter: Option<String>,
    pub title: Option<String>,
    pub language: String,
}

impl From<Chapter> for ChapterSummary {
    fn from(chapter: Chapter) -> Self {
        Self {
            id: chapter.id,
            chapter: chapter.attributes.chapter,
            title: chapter.attributes.title,
            language: chapter.attributes.translated_language,
        }
    }
}

/// English and Indonesian chapters, newest first, at most [FEED_LIMIT]
pub fn feed_query() -> MangaFeedQuery {
    let mut order = SortingOptions::new();
    order.insert(OrderOption::Chapter, Order::Desc);

    MangaFeedQuery::builder()
        .translated_language(FEED_LANGUAGES.to_vec())
        .order(order)
        .limit(FEED_LIMIT)
        .build()
}

pub fn normalize(feed: Vec<Chapter>) -> Vec<ChapterSummary> {
    feed.into_iter().map(ChapterSummary::from).collect()
}
