//! Release metadata from the GitHub API.

use std::{io::Read, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::error::{Context, InstallError, Result};

pub const API_BASE: &str = "https://api.github.com";
pub const REPO_OWNER: &str = "trilogy-access";
pub const REPO_NAME: &str = "trilogy-access";

/// Release archives are named like "AccessibilityMod-v1.3.0.zip".
static ASSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^AccessibilityMod.*\.zip$").expect("asset pattern should compile")
});

/// A published release.
#[derive(Deserialize, Debug, Clone)]
pub struct Release {
    pub tag_name: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub prerelease: bool,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A file attached to a release.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,

    #[serde(default)]
    pub size: u64,

    pub browser_download_url: String,
}

/// Picks the archive to download from `release`. Prefers an asset following our naming convention,
/// then falls back to the first zip file.
pub fn select_asset(release: &Release) -> Option<&Asset> {
    release
        .assets
        .iter()
        .find(|asset| ASSET_PATTERN.is_match(&asset.name))
        .or_else(|| {
            release
                .assets
                .iter()
                .find(|asset| asset.name.to_ascii_lowercase().ends_with(".zip"))
        })
}

/// Reads a release from an API response body. The release list endpoint returns an array, newest
/// first, and the "latest" endpoint returns a single object.
fn parse_release(body: impl Read, is_list: bool) -> Result<Release> {
    if !is_list {
        return serde_json::from_reader(body).context("unable to read the release information");
    }

    let releases: Vec<Release> =
        serde_json::from_reader(body).context("unable to read the release list")?;

    releases
        .into_iter()
        .next()
        .ok_or_else(|| InstallError::new("no releases have been published yet"))
}

/// Talks to the releases API for one repository.
pub struct ReleaseClient {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
}

impl ReleaseClient {
    /// Creates a client for this project's repository.
    pub fn new() -> Result<ReleaseClient> {
        ReleaseClient::for_repo(REPO_OWNER, REPO_NAME)
    }

    pub fn for_repo(owner: impl Into<String>, repo: impl Into<String>) -> Result<ReleaseClient> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "-installer/",
                env!("CARGO_PKG_VERSION")
            ))
            // Downloads can legitimately take a long time on slow connections.
            .timeout(None::<Duration>)
            .build()
            .context("unable to create HTTP client")?;

        Ok(ReleaseClient {
            client,
            api_base: API_BASE.to_string(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Points the client at a different API host (for GitHub Enterprise or mirrors).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> ReleaseClient {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// The underlying HTTP client, shared with the downloader.
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// The endpoint to ask for the newest release. The "latest" endpoint never returns
    /// pre-releases, so when those are wanted we ask for the newest release of any kind instead.
    pub fn releases_url(&self, include_prerelease: bool) -> String {
        let base = format!("{}/repos/{}/{}/releases", self.api_base, self.owner, self.repo);

        if include_prerelease {
            format!("{base}?per_page=1")
        } else {
            format!("{base}/latest")
        }
    }

    /// Fetches the newest release, optionally including pre-releases.
    pub fn fetch_latest(&self, include_prerelease: bool) -> Result<Release> {
        let url = self.releases_url(include_prerelease);
        log::info!("fetching release information from {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .context("unable to reach GitHub")?
            .error_for_status()
            .context("GitHub refused the release request")?;

        let release = parse_release(response, include_prerelease)?;

        log::info!(
            "newest release is {} (pre-release: {}, {} asset(s))",
            release.tag_name,
            release.prerelease,
            release.assets.len()
        );

        Ok(release)
    }
}
