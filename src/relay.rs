//! Image relay.
//!
//! Page images are fetched with a browser user agent and a referrer claiming the image host's
//! own site, which is what its hotlink protection checks. The body is handed on as a stream of
//! chunks, pulled from upstream only as fast as the caller reads them.

use crate::requests;
use crate::MangoClient;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt as _, TryStreamExt as _};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use thiserror::Error;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://mangadex.org/";
pub const DEFAULT_ALLOWED_HOSTS: [&str; 2] = ["mangadex.network", "mangadex.org"];

/// Sent when upstream doesn't name the type of the body
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub const MAX_REDIRECTS: usize = 5;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing relay target url")]
    MissingUrl,
    #[error("invalid relay target url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("host '{0}' is not an allowed image host")]
    HostNotAllowed(String),
    #[error("refused to follow redirect to '{location}': {reason}")]
    RedirectRefused { location: String, reason: String },
    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),
    #[error("failed to fetch image: {0}")]
    Upstream(#[from] requests::Error),
}

pub type ImageStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Image ready to be written to the caller
pub struct RelayedImage {
    pub content_type: String,
    pub body: ImageStream,
}

impl std::fmt::Debug for RelayedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayedImage")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ImageRelay {
    user_agent: String,
    referer: String,
    allowed_hosts: Vec<String>,
}

impl Default for ImageRelay {
    fn default() -> Self {
        Self::new(
            DEFAULT_USER_AGENT,
            DEFAULT_REFERER,
            DEFAULT_ALLOWED_HOSTS.iter().map(|host| host.to_string()).collect(),
        )
    }
}

impl ImageRelay {
    /// `allowed_hosts` entries match the host itself and all of its subdomains. An empty list
    /// lets every host through
    pub fn new(user_agent: &str, referer: &str, allowed_hosts: Vec<String>) -> Self {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|host| host.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();

        Self {
            user_agent: user_agent.to_owned(),
            referer: referer.to_owned(),
            allowed_hosts,
        }
    }

    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Checks the caller supplied target before anything is sent upstream
    pub fn authorize(&self, target: Option<&str>) -> Result<Url, RelayError> {
        let raw = match target.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(RelayError::MissingUrl),
        };

        let url = Url::parse(raw).map_err(|e| RelayError::InvalidUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        self.check(url)
    }

    /// Where a redirect answered for `current` leads, provided the next hop passes the same
    /// checks as the caller's own target
    pub fn next_hop(&self, current: &Url, location: Option<&str>) -> Result<Url, RelayError> {
        let refused = |location: &str, reason: String| RelayError::RedirectRefused {
            location: location.to_owned(),
            reason,
        };

        let location = location.ok_or_else(|| refused("", "no location header".to_owned()))?;
        let url = current
            .join(location)
            .map_err(|e| refused(location, e.to_string()))?;

        self.check(url).map_err(|e| refused(location, e.to_string()))
    }

    fn check(&self, url: Url) -> Result<Url, RelayError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl {
                reason: format!("unsupported scheme '{}'", url.scheme()),
                url: url.into(),
            });
        }

        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => {
                return Err(RelayError::InvalidUrl {
                    url: url.into(),
                    reason: "no host".to_owned(),
                })
            }
        };

        if !self.host_allowed(&host) {
            return Err(RelayError::HostNotAllowed(host));
        }

        Ok(url)
    }

    fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }

        self.allowed_hosts.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Opens the upstream image, following at most [MAX_REDIRECTS] redirects that stay on
    /// allowed hosts. Fails before anything is written to the caller if upstream doesn't end up
    /// answering with a success status
    #[tracing::instrument(skip(self, client, target), fields(url = %target))]
    pub async fn open(&self, client: &MangoClient, target: Url) -> Result<RelayedImage, RelayError> {
        let mut target = target;
        let mut redirects = 0;

        let resp = loop {
            let resp = client
                .get_image_stream(target.as_str(), &self.user_agent, &self.referer)
                .await?;

            if !resp.status().is_redirection() {
                break resp;
            }

            if redirects == MAX_REDIRECTS {
                return Err(RelayError::TooManyRedirects(redirects));
            }
            redirects += 1;

            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok());

            target = self.next_hop(&target, location)?;
            tracing::debug!("following redirect to {target}");
        };

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_owned();

        tracing::debug!("relaying {content_type} body");

        let body = resp
            .bytes_stream()
            .inspect_err(move |e| tracing::error!("image stream from {target} broke off: {e}"))
            .boxed();

        Ok(RelayedImage { content_type, body })
    }
}
