//! Structs and utilities for making requests to mangadex servers

pub mod author;
pub mod chapter;
pub mod cover;
pub mod manga;
pub mod query_utils;
pub mod tag;

use crate::MangoClient;
use chapter::{Chapter, ChapterDownloadMeta, MangaFeedQuery};
use manga::{Manga, MangaQuery};
use query_utils::{EmptyQuery, EntityType, Locale, LocalizedString, Query, Relationship};
use query_utils::ResponseResultOk as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use reqwest::header::{REFERER, USER_AGENT};
use reqwest::{Response, StatusCode};

use tracing::instrument::Instrument as _;

/// Used to deserialize errors returned from server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerResponseError {
    pub id: Option<String>,
    pub status: Option<i32>,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub context: Option<String>,
}

/// Custom error type that contains all errors that this can be emitted by this crate's functions
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    RequestWithMiddleWareError(#[from] reqwest_middleware::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error("error while parsing json value")]
    ParseError,
    #[error("upstream responded with status {status}{}", describe_errors(.errors))]
    Upstream {
        status: StatusCode,
        errors: Vec<ServerResponseError>,
    },
    #[error(transparent)]
    QsError(#[from] serde_qs::Error),
}

fn describe_errors(errors: &[ServerResponseError]) -> String {
    errors
        .iter()
        .filter_map(|e| e.detail.as_deref().or(e.title.as_deref()))
        .map(|message| format!(": {message}"))
        .collect()
}

impl Error {
    /// Status code of the upstream response, if the failure came from one
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            Error::ReqwestError(e) => e.status(),
            _ => None,
        }
    }
}

/// Type alias for the [`Result`](std::result::Result) that is used in the crate's functions
pub type Result<T> = std::result::Result<T, Error>;

/// [Entity] is implemented for all structs that represent Entity types in terms used by mangadex servers
pub trait Entity {}
impl<T: Entity> Entity for Vec<T> {}

impl MangoClient {
    /// Lowest level function that executes arbitrary [Query] and returnes its response
    #[tracing::instrument(skip(self))]
    pub async fn query(&self, url: &str, query: &impl Query) -> Result<Response> {
        let query_data = serde_qs::to_string(query)?;

        let url = if query_data.is_empty() {
            url.to_owned()
        } else {
            format!("{url}?{query_data}")
        };

        Ok(self.client.get(url).send().await?)
    }

    /// Executes the query and decodes the json body, turning non 2xx responses into
    /// [`Error::Upstream`]
    async fn query_json(&self, url: &str, query: &impl Query) -> Result<Value> {
        let resp = self.query(url, query).in_current_span().await?;

        if !resp.status().is_success() {
            return Self::deserialize_reponse_error(resp).in_current_span().await;
        }

        Ok(resp.json().await?)
    }

    /// Deserializes responses that can be deserialized into [Entity] or a [`Vec`] of entities
    pub fn parse_respond_data<T>(mut resp: Value) -> Result<T>
    where
        for<'a> T: Entity + Deserialize<'a>,
    {
        if resp.response_result_ok()? {
            let data = match resp.get_mut("data") {
                Some(d) => d,
                None => return Err(Error::ParseError),
            };

            Ok(serde_json::from_value::<T>(data.take())?)
        } else {
            Err(Self::errors_from_body(StatusCode::OK, resp))
        }
    }

    fn errors_from_body(status: StatusCode, mut body: Value) -> Error {
        let errors = match body.get_mut("errors") {
            Some(errors) => serde_json::from_value(errors.take()).unwrap_or_default(),
            None => Vec::new(),
        };

        Error::Upstream { status, errors }
    }

    /// Shorthand for deserializing server error response
    async fn deserialize_reponse_error<T>(resp: Response) -> Result<T> {
        let status = resp.status();

        // the body of a failed response is best effort, gateways in front of the api answer
        // with html
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        let err = Self::errors_from_body(status, body);

        tracing::warn!("got {err} from server");

        Err(err)
    }

    /// Searches for manga with parameteres, specified by data
    #[tracing::instrument(skip(self))]
    pub async fn search_manga(&self, data: &MangaQuery) -> Result<Vec<Manga>> {
        let resp = self
            .query_json(&format!("{}/manga", self.api_base_url), data)
            .await?;

        MangoClient::parse_respond_data(resp)
    }

    /// Queries for the feed of the manga with the given `id` and parameteres specified by `data`
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_feed(&self, id: &str, data: &MangaFeedQuery) -> Result<Vec<Chapter>> {
        let resp = self
            .query_json(&format!("{}/manga/{id}/feed", self.api_base_url), data)
            .await?;

        MangoClient::parse_respond_data(resp)
    }

    /// Queries for the meta info about downloading chapter with the given `id`
    #[tracing::instrument(skip(self))]
    pub async fn get_chapter_download_meta(&self, id: &str) -> Result<ChapterDownloadMeta> {
        let resp = self
            .query_json(
                &format!("{}/at-home/server/{id}", self.api_base_url),
                &EmptyQuery {},
            )
            .await?;

        if resp.response_result_ok()? {
            Ok(serde_json::from_value(resp)?)
        } else {
            Err(Self::errors_from_body(StatusCode::OK, resp))
        }
    }

    /// Opens the image at `url` while presenting the given browser identity. The body is left
    /// unread so that it can be streamed chunk by chunk.
    ///
    /// Redirects are not followed, a 3xx answer is handed back as is so the caller decides
    /// whether the next hop may be fetched
    #[tracing::instrument(skip(self, user_agent, referer))]
    pub async fn get_image_stream(
        &self,
        url: &str,
        user_agent: &str,
        referer: &str,
    ) -> Result<Response> {
        let resp = self
            .image_client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(REFERER, referer)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() && !status.is_redirection() {
            tracing::warn!("image host responded with {status}");

            return Err(Error::Upstream {
                status,
                errors: Vec::new(),
            });
        }

        Ok(resp)
    }
}
