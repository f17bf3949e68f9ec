//! GitHub-backed [`ReleaseSource`] and archive downloader.

use std::io::Write;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::fetch::Downloader;
use crate::release::{Release, ReleaseSource, RepositorySummary};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Environment variables consulted for an auth token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["DDEV_GITHUB_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"];

/// Hosts that may receive the token besides the configured API host.
const PROVIDER_HOSTS: &[&str] = &["github.com", "api.github.com", "codeload.github.com"];

const USER_AGENT: &str = concat!("addon-manager/", env!("CARGO_PKG_VERSION"));

/// Blocking GitHub REST client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_base_url: String,
    token: Option<String>,
    http: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepositorySummary>,
}

impl GitHubClient {
    pub fn new(api_base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network {
                url: api_base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            api_base_url,
            token: token.filter(|t| !t.trim().is_empty()),
            http,
        })
    }

    /// Client for `api_base_url` using the first token found in
    /// [`TOKEN_ENV_VARS`].
    pub fn from_env(api_base_url: impl Into<String>) -> Result<Self> {
        let token = TOKEN_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        if token.is_none() {
            tracing::debug!("No GitHub token in environment; using anonymous rate limits");
        }
        Self::new(api_base_url, token)
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Whether a request to `url` may carry the token. Archive URLs can
    /// point anywhere; only the API host and the provider's own hosts are
    /// trusted with credentials.
    fn sends_token_to(&self, url: &str) -> bool {
        let Ok(target) = reqwest::Url::parse(url) else {
            return false;
        };
        let Some(host) = target.host_str() else {
            return false;
        };
        let same_as_api = reqwest::Url::parse(&self.api_base_url).is_ok_and(|api| {
            api.host_str() == Some(host) && api.port_or_known_default() == target.port_or_known_default()
        });
        same_as_api || (target.scheme() == "https" && PROVIDER_HOSTS.contains(&host))
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder, url: &str) -> Result<reqwest::blocking::Response> {
        let request = match &self.token {
            Some(token) if self.sends_token_to(url) => request.bearer_auth(token),
            Some(_) => {
                tracing::debug!(url, "Not sending token to a non-provider host");
                request
            }
            None => request,
        };
        let response = request
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| Error::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if status.as_u16() == 429 || (status.as_u16() == 403 && remaining == Some(0)) {
            tracing::warn!(url, "Provider rate limit exhausted");
            return Err(Error::RateLimited {
                url: url.to_string(),
            });
        }

        Err(Error::Network {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        tracing::debug!(url, "GitHub API request");
        let response = self.send(self.http.get(url).query(query), url)?;
        response.json::<T>().map_err(|e| Error::Network {
            url: url.to_string(),
            reason: format!("unexpected response body: {e}"),
        })
    }
}

impl ReleaseSource for GitHubClient {
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{owner}/{repo}/releases", self.api_base_url);
        self.get_json(&url, &[("per_page", "100")])
    }

    fn get_default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base_url);
        let info: RepoInfo = self.get_json(&url, &[])?;
        Ok(info.default_branch)
    }

    fn tarball_url_for(&self, owner: &str, repo: &str, reference: &str) -> String {
        format!("{}/repos/{owner}/{repo}/tarball/{reference}", self.api_base_url)
    }

    fn tarball_url_for_pr(&self, owner: &str, repo: &str, number: u64) -> String {
        self.tarball_url_for(owner, repo, &format!("refs/pull/{number}/head"))
    }

    fn search_repositories(&self, query: &str) -> Result<Vec<RepositorySummary>> {
        let url = format!("{}/search/repositories", self.api_base_url);
        let response: SearchResponse =
            self.get_json(&url, &[("q", query), ("per_page", "100"), ("sort", "stars")])?;
        Ok(response.items)
    }
}

impl Downloader for GitHubClient {
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        tracing::debug!(url, "Downloading archive");
        let mut response = self.send(self.http.get(url), url)?;
        response.copy_to(dest).map_err(|e| Error::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
