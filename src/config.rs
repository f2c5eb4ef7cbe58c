//! Command line / environment configuration.
//!
//! Everything is read once at startup into a [GatewayConfig] that is handed to each component's
//! constructor.

use clap::Parser;

use crate::normalize::CatalogNormalizer;
use crate::relay::{self, ImageRelay};
use crate::requests;
use crate::MangoClient;

pub const DEFAULT_COVER_BASE_URL: &str = "https://uploads.mangadex.org/covers";

/// Aggregation gateway in front of the MangaDex api
#[derive(Parser, Debug, Clone)]
#[command(name = "mango-gateway")]
#[command(author, version, about)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Base url of the catalog api
    #[arg(long, env = "MANGADEX_API", default_value = MangoClient::BASE_URL)]
    pub api_base_url: String,

    /// Base url cover thumbnails are built from
    #[arg(long, env = "MANGADEX_COVER", default_value = DEFAULT_COVER_BASE_URL)]
    pub cover_base_url: String,

    /// User agent sent to the catalog api
    #[arg(long, env = "GATEWAY_USER_AGENT", default_value = MangoClient::DEFAULT_USER_AGENT)]
    pub client_user_agent: String,

    /// Browser user agent presented to the image host
    #[arg(long, env = "RELAY_USER_AGENT", default_value = relay::DEFAULT_USER_AGENT)]
    pub relay_user_agent: String,

    /// Referrer presented to the image host
    #[arg(long, env = "RELAY_REFERER", default_value = relay::DEFAULT_REFERER)]
    pub relay_referer: String,

    /// Hosts (and their subdomains) the image relay may fetch from, comma separated.
    /// Pass an empty string to allow any host
    #[arg(
        long,
        env = "RELAY_ALLOWED_HOSTS",
        value_delimiter = ',',
        default_value = "mangadex.network,mangadex.org"
    )]
    pub relay_allowed_hosts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub cover_base_url: String,
    pub client_user_agent: String,
    pub relay_user_agent: String,
    pub relay_referer: String,
    pub relay_allowed_hosts: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            api_base_url: MangoClient::BASE_URL.to_owned(),
            cover_base_url: DEFAULT_COVER_BASE_URL.to_owned(),
            client_user_agent: MangoClient::DEFAULT_USER_AGENT.to_owned(),
            relay_user_agent: relay::DEFAULT_USER_AGENT.to_owned(),
            relay_referer: relay::DEFAULT_REFERER.to_owned(),
            relay_allowed_hosts: relay::DEFAULT_ALLOWED_HOSTS
                .iter()
                .map(|host| host.to_string())
                .collect(),
        }
    }
}

impl From<Args> for GatewayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            api_base_url: args.api_base_url,
            cover_base_url: args.cover_base_url,
            client_user_agent: args.client_user_agent,
            relay_user_agent: args.relay_user_agent,
            relay_referer: args.relay_referer,
            relay_allowed_hosts: args
                .relay_allowed_hosts
                .into_iter()
                .filter(|host| !host.trim().is_empty())
                .collect(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn client(&self) -> requests::Result<MangoClient> {
        MangoClient::with_base_url(&self.api_base_url, &self.client_user_agent)
    }

    pub fn catalog(&self) -> CatalogNormalizer {
        CatalogNormalizer::new(&self.cover_base_url)
    }

    pub fn relay(&self) -> ImageRelay {
        ImageRelay::new(
            &self.relay_user_agent,
            &self.relay_referer,
            self.relay_allowed_hosts.clone(),
        )
    }
}
