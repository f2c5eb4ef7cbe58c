use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{Error, Result};

use std::collections::HashMap;
use std::fmt;

pub trait Query: Serialize + std::fmt::Debug {}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Copy)]
pub struct EmptyQuery {}
impl Query for EmptyQuery {}

/// Languages the gateway asks the server for. Anything else the server sends back is kept
/// as a plain string
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, std::hash::Hash, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    En,
    Id,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Id => "id",
        }
    }
}

/// Locale keyed text exactly as the server delivered it.
///
/// Entries keep the server's order, which is what the "first available locale" fallback is
/// defined against. Null values are skipped and an empty JSON array (which the server sends
/// instead of an empty object) decodes to an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedString(Vec<(String, String)>);

impl LocalizedString {
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == locale)
            .map(|(_, value)| value.as_str())
    }

    /// First non-empty value in server order
    pub fn first(&self) -> Option<&str> {
        self.0
            .iter()
            .map(|(_, value)| value.as_str())
            .find(|value| !value.is_empty())
    }

    /// Value for `locale` if present and non-empty, otherwise [`first`](LocalizedString::first)
    pub fn preferred(&self, locale: Locale) -> Option<&str> {
        self.get(locale.code())
            .filter(|value| !value.is_empty())
            .or_else(|| self.first())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocalizedString {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

struct LocalizedStringVisitor;

impl<'de> Visitor<'de> for LocalizedStringVisitor {
    type Value = LocalizedString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of locale codes to strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

        while let Some((locale, value)) = map.next_entry::<String, Option<String>>()? {
            if let Some(value) = value {
                entries.push((locale, value));
            }
        }

        Ok(LocalizedString(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(1, &"an empty array"));
        }

        Ok(LocalizedString::default())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LocalizedString::default())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LocalizedString::default())
    }
}

impl<'de> Deserialize<'de> for LocalizedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(LocalizedStringVisitor)
    }
}

impl Serialize for LocalizedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (locale, value) in &self.0 {
            map.serialize_entry(locale, value)?;
        }
        map.end()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Manga,
    CoverArt,
    Chapter,
    Author,
    Artist,
    Creator,
    ScanlationGroup,
    User,
    Tag,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub related: Option<String>,
    pub attributes: Option<Value>,
}

impl Relationship {
    /// Decodes the embedded attributes, which the server only sends for relationships listed in
    /// `includes`. Attributes that don't fit `T` are treated as absent
    pub fn attributes_as<T>(&self) -> Option<T>
    where
        for<'a> T: Deserialize<'a>,
    {
        let attributes = self.attributes.clone()?;

        match serde_json::from_value(attributes) {
            Ok(res) => Some(res),
            Err(e) => {
                tracing::debug!("ignoring {:?} relationship attributes: {e}", self.entity_type);
                None
            }
        }
    }
}

/// Helper for finding the attributes of the first relationship of the given type that decode
/// into `T`
pub fn find_related<T>(relationships: &[Relationship], entity_type: EntityType) -> Option<T>
where
    for<'a> T: Deserialize<'a>,
{
    relationships
        .iter()
        .filter(|relation| relation.entity_type == entity_type)
        .find_map(Relationship::attributes_as::<T>)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "camelCase")]
pub enum OrderOption {
    Title,
    Year,
    CreatedAt,
    UpdatedAt,
    LatestUploadedChapter,
    FollowedCount,
    Relevance,
    Chapter,
}

pub type SortingOptions = HashMap<OrderOption, Order>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

pub trait ResponseResultOk {
    fn response_result_ok(&self) -> Result<bool>;
}

impl ResponseResultOk for Value {
    fn response_result_ok(&self) -> Result<bool> {
        let result = match self.get("result") {
            Some(status) => status,
            None => return Err(Error::ParseError),
        };

        match result.as_str() {
            Some(result) => Ok(result == "ok"),
            None => Err(Error::ParseError),
        }
    }
}
