//! Cover art attributes as embedded in manga relationships when `includes[]=cover_art` is
//! requested.
//!
//! The meaning of the fields can be found at <https://api.mangadex.org/docs/>

use serde::{Deserialize, Serialize};

/// Used for serialization/deserialization
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CoverArtAttributes {
    pub file_name: String,
}
