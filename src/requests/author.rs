use serde::{Deserialize, Serialize};

/// Author attributes as embedded in manga relationships when `includes[]=author` is requested
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthorAttributes {
    pub name: String,
}
