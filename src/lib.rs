//! Gateway between a manga reading client and the MangaDex api.
//!
//! Catalog, chapter feed and page data are fetched from the upstream api and reshaped into a
//! small stable schema ([normalize]), page images are relayed through the gateway so the image
//! host sees its own referrer ([relay]), and [server] exposes all of it over http.

pub mod config;
pub mod normalize;
pub mod relay;
pub mod requests;
pub mod server;
pub mod viewer;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

/// Client for the upstream catalog api and the image hosts behind it.
///
/// Cloning is cheap, all clones share one connection pool
#[derive(Clone)]
pub struct MangoClient {
    pub(crate) client: ClientWithMiddleware,
    /// Relay mode client, never follows redirects on its own
    pub(crate) image_client: ClientWithMiddleware,
    pub(crate) api_base_url: String,
}

impl std::fmt::Debug for MangoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MangoClient")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl MangoClient {
    pub const BASE_URL: &'static str = "https://api.mangadex.org";
    pub const DEFAULT_USER_AGENT: &'static str = "KomiKita-Backend/1.0";

    /// Creates a client for the public MangaDex api
    pub fn new() -> requests::Result<Self> {
        Self::with_base_url(Self::BASE_URL, Self::DEFAULT_USER_AGENT)
    }

    /// Creates a client for the api at `api_base_url`, identifying itself with `user_agent` on
    /// every call
    pub fn with_base_url(api_base_url: &str, user_agent: &str) -> requests::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        let image_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let client = ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();
        let image_client = ClientBuilder::new(image_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            client,
            image_client,
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}
