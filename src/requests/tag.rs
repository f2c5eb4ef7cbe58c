use serde::{Deserialize, Serialize};

use super::{EntityType, LocalizedString};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: LocalizedString,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Tag {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub attributes: TagAttributes,
}
