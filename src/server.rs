//! Http surface of the gateway.
//!
//! Each endpoint makes one upstream round trip, runs one normalizer and wraps the result in an
//! [Envelope]. Failures are all-or-nothing and rendered through [GatewayError].

use crate::config::GatewayConfig;
use crate::normalize::{self, feed, pages, CatalogNormalizer, PageQuality};
use crate::relay::{ImageRelay, RelayError};
use crate::requests;
use crate::viewer;
use crate::MangoClient;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HEALTH_MESSAGE: &str = "Server KomiKita Backend is Running! 🚀";

pub const CATALOG_OK: &str = "Data MangaDex berhasil diambil";
pub const CATALOG_FAILED: &str = "Gagal mengambil data dari MangaDex";
pub const FEED_OK: &str = "Daftar chapter berhasil diambil";
pub const FEED_FAILED: &str = "Gagal mengambil daftar chapter";
pub const PAGES_OK: &str = "Gambar chapter berhasil diambil";
pub const PAGES_FAILED: &str = "Gagal mengambil gambar chapter";
pub const MISSING_URL: &str = "Parameter url wajib diisi";
pub const INVALID_URL: &str = "Parameter url tidak valid";
pub const HOST_NOT_ALLOWED: &str = "Host gambar tidak diizinkan";
/// Plain text body of a failed relay
pub const RELAY_FAILED: &str = "Gagal mengambil gambar";

/// Shared state of all handlers. Holds configuration derived values only, nothing in here is
/// mutated by requests
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: MangoClient,
    pub catalog: CatalogNormalizer,
    pub relay: ImageRelay,
}

impl AppState {
    pub fn new(client: MangoClient, catalog: CatalogNormalizer, relay: ImageRelay) -> Self {
        Self {
            client,
            catalog,
            relay,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> requests::Result<Self> {
        Ok(Self::new(config.client()?, config.catalog(), config.relay()))
    }
}

/// Uniform body of the json endpoints
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub error: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            error: false,
            message: message.to_owned(),
            data: Some(data),
            details: None,
        }
    }

    pub fn failure(message: &str, details: Option<String>) -> Self {
        Self {
            error: true,
            message: message.to_owned(),
            data: None,
            details,
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{message}{}", .details.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    BadRequest {
        message: &'static str,
        details: Option<String>,
    },
    #[error("{message}: {details}")]
    Forbidden {
        message: &'static str,
        details: String,
    },
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: requests::Error,
    },
    #[error("image relay failed: {0}")]
    Relay(#[source] RelayError),
}

impl GatewayError {
    pub fn upstream(message: &'static str) -> impl FnOnce(requests::Error) -> Self {
        move |source| GatewayError::Upstream { message, source }
    }
}

impl From<RelayError> for GatewayError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::MissingUrl => GatewayError::BadRequest {
                message: MISSING_URL,
                details: None,
            },
            RelayError::InvalidUrl { .. } => GatewayError::BadRequest {
                message: INVALID_URL,
                details: Some(e.to_string()),
            },
            RelayError::HostNotAllowed(_) => GatewayError::Forbidden {
                message: HOST_NOT_ALLOWED,
                details: e.to_string(),
            },
            RelayError::Upstream(_)
            | RelayError::RedirectRefused { .. }
            | RelayError::TooManyRedirects(_) => GatewayError::Relay(e),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GatewayError::Upstream { .. } | GatewayError::Relay(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("rejected request: {self}");
        }

        let mut resp = HttpResponse::build(status);

        match self {
            GatewayError::BadRequest { message, details } => {
                resp.json(Envelope::<()>::failure(message, details.clone()))
            }
            GatewayError::Forbidden { message, details } => {
                resp.json(Envelope::<()>::failure(message, Some(details.clone())))
            }
            GatewayError::Upstream { message, source } => {
                resp.json(Envelope::<()>::failure(message, Some(source.to_string())))
            }
            // the relay answers with image bytes on success, so its failure isn't json either
            GatewayError::Relay(_) => resp.content_type(ContentType::plaintext()).body(RELAY_FAILED),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct PagesParams {
    pub quality: Option<PageQuality>,
}

#[derive(Deserialize, Debug)]
pub struct ImageProxyParams {
    pub url: Option<String>,
}

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": HEALTH_MESSAGE }))
}

#[get("/mangadex/list")]
#[tracing::instrument(skip(data))]
async fn list_manga(data: web::Data<AppState>) -> Result<HttpResponse, GatewayError> {
    let listing = data
        .client
        .search_manga(&normalize::catalog::listing_query())
        .await
        .map_err(GatewayError::upstream(CATALOG_FAILED))?;

    let summaries = data.catalog.normalize(listing);

    tracing::info!("normalized {} catalog entries", summaries.len());

    Ok(HttpResponse::Ok().json(Envelope::success(CATALOG_OK, summaries)))
}

#[get("/mangadex/manga/{manga_id}/chapters")]
#[tracing::instrument(skip(data))]
async fn list_chapters(
    data: web::Data<AppState>,
    manga_id: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let chapters = data
        .client
        .get_manga_feed(&manga_id, &feed::feed_query())
        .await
        .map_err(GatewayError::upstream(FEED_FAILED))?;

    let chapters = feed::normalize(chapters);

    Ok(HttpResponse::Ok().json(Envelope::success(FEED_OK, chapters)))
}

#[get("/mangadex/chapter/{chapter_id}")]
#[tracing::instrument(skip(data))]
async fn chapter_pages(
    data: web::Data<AppState>,
    chapter_id: web::Path<String>,
    params: web::Query<PagesParams>,
) -> Result<HttpResponse, GatewayError> {
    let meta = data
        .client
        .get_chapter_download_meta(&chapter_id)
        .await
        .map_err(GatewayError::upstream(PAGES_FAILED))?;

    let images = pages::resolve(&meta, params.quality.unwrap_or_default());

    Ok(HttpResponse::Ok().json(Envelope::success(PAGES_OK, images)))
}

#[get("/mangadex/image-proxy")]
#[tracing::instrument(skip(data))]
async fn image_proxy(
    data: web::Data<AppState>,
    params: web::Query<ImageProxyParams>,
) -> Result<HttpResponse, GatewayError> {
    let target = data.relay.authorize(params.url.as_deref())?;

    let image = data.relay.open(&data.client, target).await?;

    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .streaming(image.body))
}

/// Registers every endpoint of the gateway, the debug reader included
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_manga)
        .service(list_chapters)
        .service(chapter_pages)
        .service(image_proxy)
        .service(viewer::test_read);
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::body::MessageBody as _;

    #[test]
    fn success_envelope_omits_details() {
        let body = serde_json::to_value(Envelope::success(PAGES_OK, vec!["a"])).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"error": false, "message": PAGES_OK, "data": ["a"]})
        );
    }

    #[test]
    fn missing_url_renders_bare_envelope() {
        let err = GatewayError::from(RelayError::MissingUrl);
        let resp = err.error_response();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = resp.into_body().try_into_bytes().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": true, "message": MISSING_URL})
        );
    }

    #[test]
    fn upstream_failure_carries_details() {
        let err = GatewayError::upstream(FEED_FAILED)(requests::Error::ParseError);
        let resp = err.error_response();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = resp.into_body().try_into_bytes().unwrap();
        let body: Envelope<()> = serde_json::from_slice(&body).unwrap();
        assert!(body.error);
        assert_eq!(body.message, FEED_FAILED);
        assert_eq!(
            body.details.as_deref(),
            Some("error while parsing json value")
        );
    }

    #[test]
    fn relay_failure_is_plain_text() {
        let err = GatewayError::from(RelayError::Upstream(requests::Error::ParseError));
        let resp = err.error_response();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = resp.into_body().try_into_bytes().unwrap();
        assert_eq!(&body[..], RELAY_FAILED.as_bytes());
    }

    #[test]
    fn refused_redirect_is_a_relay_failure() {
        let err = GatewayError::from(RelayError::RedirectRefused {
            location: "http://10.0.0.1/".to_owned(),
            reason: "host '10.0.0.1' is not an allowed image host".to_owned(),
        });

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, GatewayError::Relay(_)));
    }

    #[test]
    fn disallowed_host_is_forbidden() {
        let err = GatewayError::from(RelayError::HostNotAllowed("example.com".to_owned()));

        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("example.com"));
    }
}
