//! [`StaticReleaseSource`]: an in-memory hosting provider.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Mutex;

use addon_core::error::{Error, Result};
use addon_core::fetch::Downloader;
use addon_core::release::{Release, ReleaseSource, RepositorySummary};

const BASE_URL: &str = "https://archive.test";

/// Serves releases, default branches, searches and archive bytes from
/// memory. Unknown URLs fail with [`Error::Network`].
#[derive(Default)]
pub struct StaticReleaseSource {
    releases: BTreeMap<String, Vec<Release>>,
    default_branches: BTreeMap<String, String>,
    archives: BTreeMap<String, Vec<u8>>,
    repositories: Vec<RepositorySummary>,
    downloads: Mutex<Vec<String>>,
}

impl StaticReleaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a release of `owner/repo` whose tarball is `archive`.
    /// Releases are listed newest first in the order they are added last.
    pub fn with_release(mut self, owner: &str, repo: &str, tag: &str, prerelease: bool, archive: Vec<u8>) -> Self {
        let url = self.tarball_url_for(owner, repo, tag);
        self.releases.entry(format!("{owner}/{repo}")).or_default().insert(
            0,
            Release {
                tag_name: tag.to_string(),
                prerelease,
                draft: false,
                tarball_url: Some(url.clone()),
            },
        );
        self.archives.insert(url, archive);
        self
    }

    /// Serve `archive` for `reference` (branch, tag or `refs/pull/N/head`)
    /// without publishing a release.
    pub fn with_ref(mut self, owner: &str, repo: &str, reference: &str, archive: Vec<u8>) -> Self {
        let url = self.tarball_url_for(owner, repo, reference);
        self.archives.insert(url, archive);
        self
    }

    pub fn with_default_branch(mut self, owner: &str, repo: &str, branch: &str) -> Self {
        self.default_branches
            .insert(format!("{owner}/{repo}"), branch.to_string());
        self
    }

    /// Make a repository visible to searches.
    pub fn with_repository(mut self, full_name: &str, description: &str, stars: u64) -> Self {
        self.repositories.push(RepositorySummary {
            full_name: full_name.to_string(),
            description: Some(description.to_string()),
            stars,
        });
        self
    }

    /// Every URL downloaded so far.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

impl ReleaseSource for StaticReleaseSource {
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        Ok(self
            .releases
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .unwrap_or_default())
    }

    fn get_default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        self.default_branches
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .ok_or_else(|| Error::Network {
                url: format!("{BASE_URL}/{owner}/{repo}"),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }

    fn tarball_url_for(&self, owner: &str, repo: &str, reference: &str) -> String {
        format!("{BASE_URL}/{owner}/{repo}/tarball/{reference}")
    }

    fn tarball_url_for_pr(&self, owner: &str, repo: &str, number: u64) -> String {
        self.tarball_url_for(owner, repo, &format!("refs/pull/{number}/head"))
    }

    /// Matches every query term except `topic:`/`org:` qualifiers against
    /// the full name and description.
    fn search_repositories(&self, query: &str) -> Result<Vec<RepositorySummary>> {
        let org = query
            .split_whitespace()
            .find_map(|t| t.strip_prefix("org:"))
            .map(|o| format!("{o}/"));
        let terms: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.contains(':'))
            .map(str::to_lowercase)
            .collect();
        Ok(self
            .repositories
            .iter()
            .filter(|r| org.as_deref().is_none_or(|o| r.full_name.starts_with(o)))
            .filter(|r| {
                let haystack = format!(
                    "{} {}",
                    r.full_name,
                    r.description.as_deref().unwrap_or_default()
                )
                .to_lowercase();
                terms.iter().all(|t| haystack.contains(t))
            })
            .cloned()
            .collect())
    }
}

impl Downloader for StaticReleaseSource {
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.downloads.lock().unwrap().push(url.to_string());
        let bytes = self.archives.get(url).ok_or_else(|| Error::Network {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })?;
        dest.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }
}
