//! Manga entities and the listing query.
//!
//! Only the attributes the gateway actually reads are decoded, everything else the server sends
//! is ignored so that additions on the server side don't break deserialization.

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::query_utils::{ContentRating, Query, SortingOptions};
use super::tag::Tag;
use super::{Entity, EntityType, LocalizedString, Relationship};

/// Query for the `/manga` listing endpoint.
///
/// Can be constructed with the builder syntax from the [bon] crate
#[derive(Serialize, Deserialize, Debug, Clone, Default, Builder)]
#[serde(rename_all = "camelCase")]
pub struct MangaQuery {
    pub title: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub includes: Option<Vec<EntityType>>,
    pub content_rating: Option<Vec<ContentRating>>,
    pub order: Option<SortingOptions>,
}
impl Query for MangaQuery {}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Manga {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Entity for Manga {}
