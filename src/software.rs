//! Lookup of the latest director release, CPI release, and stemcell.
//!
//! The manifest references each artifact by download URL and SHA1 checksum.
//! [`BoshIoClient`] reads both from the public bosh.io JSON API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default bosh.io endpoint.
pub const DEFAULT_BOSH_IO_URL: &str = "https://bosh.io";
/// Release path of the director.
pub const DIRECTOR_RELEASE: &str = "github.com/cloudfoundry/bosh";
/// Release path of the AWS CPI.
pub const CPI_RELEASE: &str = "github.com/cloudfoundry-incubator/bosh-aws-cpi-release";
/// Stemcell booted by the director VM.
pub const STEMCELL: &str = "bosh-aws-xen-hvm-ubuntu-trusty-go_agent";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloadable artifact referenced by the manifest.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Artifact {
    /// Download URL.
    pub url: String,
    /// SHA1 checksum of the download.
    pub sha1: String,
}

/// Software the director deployment is built from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Software {
    /// Director release.
    pub director_release: Artifact,
    /// AWS CPI release.
    pub cpi_release: Artifact,
    /// Stemcell for the director VM.
    pub stemcell: Artifact,
}

/// Errors raised while resolving software artifacts.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SoftwareError {
    /// Raised when the request or response body fails.
    #[error("request to {url} failed: {message}")]
    Http {
        /// URL that was requested.
        url: String,
        /// Transport or decoding error.
        message: String,
    },
    /// Raised when the listing has no entries.
    #[error("empty result for {url}")]
    EmptyResult {
        /// URL that was requested.
        url: String,
    },
    /// Raised when the latest stemcell lists neither a light nor a full
    /// image.
    #[error("no downloadable stemcell listed at {url}")]
    NoStemcellImage {
        /// URL that was requested.
        url: String,
    },
}

/// Future returned by [`SoftwareSource`] operations.
pub type SoftwareFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SoftwareError>> + Send + 'a>>;

/// Source of the latest published artifacts.
pub trait SoftwareSource {
    /// Resolves the newest version of a release.
    fn latest_release<'a>(&'a self, release_path: &'a str) -> SoftwareFuture<'a, Artifact>;

    /// Resolves the newest version of a stemcell.
    fn latest_stemcell<'a>(&'a self, stemcell_name: &'a str) -> SoftwareFuture<'a, Artifact>;
}

/// Resolves every artifact the director manifest needs.
///
/// # Errors
///
/// Returns the first [`SoftwareError`] raised by `source`.
pub async fn resolve_software<S>(source: &S) -> Result<Software, SoftwareError>
where
    S: SoftwareSource + ?Sized,
{
    let stemcell = source.latest_stemcell(STEMCELL).await?;
    let cpi_release = source.latest_release(CPI_RELEASE).await?;
    let director_release = source.latest_release(DIRECTOR_RELEASE).await?;
    Ok(Software {
        director_release,
        cpi_release,
        stemcell,
    })
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    url: String,
    sha1: String,
}

#[derive(Debug, Deserialize)]
struct StemcellImage {
    url: String,
    sha1: String,
}

#[derive(Debug, Deserialize)]
struct StemcellEntry {
    #[serde(default)]
    light: Option<StemcellImage>,
    #[serde(default)]
    regular: Option<StemcellImage>,
}

fn select_release(entries: Vec<ReleaseEntry>, url: &str) -> Result<Artifact, SoftwareError> {
    let latest = entries
        .into_iter()
        .next()
        .ok_or_else(|| SoftwareError::EmptyResult {
            url: url.to_owned(),
        })?;
    Ok(Artifact {
        url: latest.url,
        sha1: latest.sha1,
    })
}

fn select_stemcell(entries: Vec<StemcellEntry>, url: &str) -> Result<Artifact, SoftwareError> {
    let latest = entries
        .into_iter()
        .next()
        .ok_or_else(|| SoftwareError::EmptyResult {
            url: url.to_owned(),
        })?;
    let image = latest
        .light
        .or(latest.regular)
        .ok_or_else(|| SoftwareError::NoStemcellImage {
            url: url.to_owned(),
        })?;
    Ok(Artifact {
        url: image.url,
        sha1: image.sha1,
    })
}

/// Client for the bosh.io JSON API.
#[derive(Clone, Debug)]
pub struct BoshIoClient {
    http: reqwest::Client,
    base_url: String,
}

impl BoshIoClient {
    /// Creates a client rooted at `base_url` (normally
    /// [`DEFAULT_BOSH_IO_URL`]).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn release_url(&self, release_path: &str) -> String {
        format!("{}/api/v1/releases/{release_path}", self.base_url)
    }

    fn stemcell_url(&self, stemcell_name: &str) -> String {
        format!("{}/api/v1/stemcells/{stemcell_name}", self.base_url)
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, SoftwareError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let http_error = |message: String| SoftwareError::Http {
            url: url.to_owned(),
            message,
        };
        debug!(url, "querying bosh.io");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| http_error(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| http_error(err.to_string()))?;

        if !status.is_success() {
            return Err(http_error(format!(
                "status {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }

        serde_json::from_slice(&body).map_err(|err| http_error(err.to_string()))
    }
}

impl SoftwareSource for BoshIoClient {
    fn latest_release<'a>(&'a self, release_path: &'a str) -> SoftwareFuture<'a, Artifact> {
        Box::pin(async move {
            let url = self.release_url(release_path);
            let entries: Vec<ReleaseEntry> = self.get_json(&url).await?;
            select_release(entries, &url)
        })
    }

    fn latest_stemcell<'a>(&'a self, stemcell_name: &'a str) -> SoftwareFuture<'a, Artifact> {
        Box::pin(async move {
            let url = self.stemcell_url(stemcell_name);
            let entries: Vec<StemcellEntry> = self.get_json(&url).await?;
            select_stemcell(entries, &url)
        })
    }
}
