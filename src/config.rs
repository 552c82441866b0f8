//! Credentials and endpoints shared by the binaries.
//!
//! Every flag falls back to an environment variable; binaries load a local
//! `.env` first so keys can live outside the shell profile.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::atlas::AtlasClient;
use crate::serp::SerpApiClient;

/// Nomic Atlas connection settings.
#[derive(Args, Debug, Clone)]
pub struct AtlasSettings {
    /// Nomic API key
    #[arg(long, env = "NOMIC_API_KEY", hide_env_values = true)]
    pub nomic_api_key: String,

    /// Atlas API root
    #[arg(
        long,
        env = "SERPATLAS_ATLAS_BASE",
        default_value = "https://api-atlas.nomic.ai"
    )]
    pub atlas_base: String,

    /// Seconds to wait for any HTTP request
    #[arg(long, env = "SERPATLAS_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

impl AtlasSettings {
    /// Request timeout, never below one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Builds the Atlas client.
    pub fn client(&self) -> Result<AtlasClient> {
        AtlasClient::new(
            self.nomic_api_key.clone(),
            self.atlas_base.clone(),
            self.timeout(),
        )
    }
}

/// SerpApi connection settings.
#[derive(Args, Debug, Clone)]
pub struct SerpSettings {
    /// SerpApi private key
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_key: String,

    /// SerpApi root
    #[arg(long, env = "SERPATLAS_SERPAPI_BASE", default_value = "https://serpapi.com")]
    pub serpapi_base: String,
}

impl SerpSettings {
    /// Builds the SerpApi client.
    pub fn client(&self, timeout: Duration) -> Result<SerpApiClient> {
        SerpApiClient::new(self.serpapi_key.clone(), self.serpapi_base.clone(), timeout)
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` selects verbosity.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `.env` from the working directory when present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(?path, "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Probe {
        #[command(flatten)]
        atlas: AtlasSettings,
        #[command(flatten)]
        serp: SerpSettings,
    }

    #[test]
    fn flags_override_defaults() {
        let probe = Probe::try_parse_from([
            "probe",
            "--nomic-api-key",
            "nk",
            "--serpapi-key",
            "sk",
            "--http-timeout-secs",
            "0",
        ])
        .unwrap();
        assert_eq!(probe.atlas.nomic_api_key, "nk");
        assert_eq!(probe.atlas.atlas_base, "https://api-atlas.nomic.ai");
        assert_eq!(probe.atlas.timeout(), Duration::from_secs(1));
        assert_eq!(probe.serp.serpapi_base, "https://serpapi.com");
        assert!(probe.serp.client(probe.atlas.timeout()).is_ok());
    }
}
