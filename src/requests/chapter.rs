use bon::Builder;
use serde::{Deserialize, Serialize};

use super::query_utils::{Query, Relationship, SortingOptions};
use super::{Entity, EntityType, Locale};

/// Query for the `/manga/{id}/feed` endpoint
#[derive(Serialize, Deserialize, Debug, Clone, Default, Builder)]
#[serde(rename_all = "camelCase")]
pub struct MangaFeedQuery {
    pub translated_language: Option<Vec<Locale>>,
    pub order: Option<SortingOptions>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
impl Query for MangaFeedQuery {}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChapterAttributes {
    pub title: Option<String>,
    pub chapter: Option<String>,
    pub translated_language: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Chapter {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub attributes: ChapterAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Entity for Chapter {}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChapterMeta {
    pub hash: String,
    pub data: Vec<String>,
    #[serde(default)]
    pub data_saver: Vec<String>,
}

/// Response of the at-home delivery server endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDownloadMeta {
    pub result: String,
    pub base_url: String,
    pub chapter: ChapterMeta,
}
