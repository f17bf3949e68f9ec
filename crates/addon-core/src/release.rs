//! Release resolution for provider-hosted add-ons.
//!
//! Turns an `owner/repo` slug plus a [`ReleaseSelector`] into the archive
//! URL to download and the label recorded as the manifest's `version`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which revision of a provider-hosted add-on to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReleaseSelector {
    /// Most recent non-prerelease release, else most recent release.
    #[default]
    Latest,
    /// A tag, branch or commit-ish.
    Explicit(String),
    /// Head of a pull request.
    PullRequest(u64),
    /// The repository's default branch.
    DefaultBranch,
}

impl ReleaseSelector {
    /// Build a selector from the CLI flags, rejecting invalid combinations
    /// before any network call.
    pub fn from_flags(
        version: Option<&str>,
        pr: Option<i64>,
        default_branch: bool,
    ) -> Result<Self> {
        let chosen = [version.is_some(), pr.is_some(), default_branch]
            .iter()
            .filter(|set| **set)
            .count();
        if chosen > 1 {
            return Err(Error::InvalidSelector {
                reason: "--version, --pr and --default-branch are mutually exclusive".to_string(),
            });
        }

        if let Some(v) = version {
            if v.trim().is_empty() {
                return Err(Error::InvalidSelector {
                    reason: "--version must not be empty".to_string(),
                });
            }
            return Ok(Self::Explicit(v.trim().to_string()));
        }
        if let Some(n) = pr {
            if n <= 0 {
                return Err(Error::InvalidSelector {
                    reason: format!("--pr must be a positive pull request number, got {n}"),
                });
            }
            return Ok(Self::PullRequest(n as u64));
        }
        if default_branch {
            return Ok(Self::DefaultBranch);
        }
        Ok(Self::Latest)
    }
}

/// A published release as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub tarball_url: Option<String>,
}

/// A repository returned by catalog searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "stargazers_count")]
    pub stars: u64,
}

/// Provider metadata consumed by the resolver and the catalog commands.
pub trait ReleaseSource {
    /// Releases, newest first.
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;

    fn get_default_branch(&self, owner: &str, repo: &str) -> Result<String>;

    fn tarball_url_for(&self, owner: &str, repo: &str, reference: &str) -> String;

    fn tarball_url_for_pr(&self, owner: &str, repo: &str, number: u64) -> String;

    /// Repository search; `query` uses the provider's search syntax.
    fn search_repositories(&self, query: &str) -> Result<Vec<RepositorySummary>>;
}

/// Archive location and human label chosen by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub archive_url: String,
    pub label: String,
}

/// Resolve `selector` for `owner/repo` against `source`.
pub fn resolve(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    selector: &ReleaseSelector,
) -> Result<ResolvedRelease> {
    let resolved = match selector {
        ReleaseSelector::PullRequest(0) => {
            return Err(Error::InvalidSelector {
                reason: "--pr must be a positive pull request number, got 0".to_string(),
            });
        }
        ReleaseSelector::PullRequest(n) => ResolvedRelease {
            archive_url: source.tarball_url_for_pr(owner, repo, *n),
            label: format!("pr-{n}"),
        },
        ReleaseSelector::Explicit(v) if v.trim().is_empty() => {
            return Err(Error::InvalidSelector {
                reason: "--version must not be empty".to_string(),
            });
        }
        ReleaseSelector::Explicit(v) => ResolvedRelease {
            archive_url: source.tarball_url_for(owner, repo, v),
            label: v.clone(),
        },
        ReleaseSelector::DefaultBranch => {
            let branch = source.get_default_branch(owner, repo)?;
            ResolvedRelease {
                archive_url: source.tarball_url_for(owner, repo, &branch),
                label: branch,
            }
        }
        ReleaseSelector::Latest => {
            let releases = source.list_releases(owner, repo)?;
            let published: Vec<&Release> = releases.iter().filter(|r| !r.draft).collect();
            let chosen = published
                .iter()
                .find(|r| !r.prerelease)
                .or_else(|| published.first())
                .ok_or_else(|| Error::NoRelease {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })?;
            ResolvedRelease {
                archive_url: chosen
                    .tarball_url
                    .clone()
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| source.tarball_url_for(owner, repo, &chosen.tag_name)),
                label: chosen.tag_name.clone(),
            }
        }
    };

    tracing::debug!(
        owner,
        repo,
        label = %resolved.label,
        url = %resolved.archive_url,
        "Resolved release"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FakeSource {
        releases: Vec<Release>,
    }

    impl ReleaseSource for FakeSource {
        fn list_releases(&self, _owner: &str, _repo: &str) -> Result<Vec<Release>> {
            Ok(self.releases.clone())
        }

        fn get_default_branch(&self, _owner: &str, _repo: &str) -> Result<String> {
            Ok("main".to_string())
        }

        fn tarball_url_for(&self, owner: &str, repo: &str, reference: &str) -> String {
            format!("https://example.test/{owner}/{repo}/tarball/{reference}")
        }

        fn tarball_url_for_pr(&self, owner: &str, repo: &str, number: u64) -> String {
            format!("https://example.test/{owner}/{repo}/tarball/refs/pull/{number}/head")
        }

        fn search_repositories(&self, _query: &str) -> Result<Vec<RepositorySummary>> {
            Ok(Vec::new())
        }
    }

    fn release(tag: &str, prerelease: bool) -> Release {
        Release {
            tag_name: tag.to_string(),
            prerelease,
            draft: false,
            tarball_url: None,
        }
    }

    #[test]
    fn selector_flags_validation() {
        assert_eq!(
            ReleaseSelector::from_flags(None, None, false).unwrap(),
            ReleaseSelector::Latest
        );
        assert_eq!(
            ReleaseSelector::from_flags(Some("v1.2.0"), None, false).unwrap(),
            ReleaseSelector::Explicit("v1.2.0".to_string())
        );
        assert_eq!(
            ReleaseSelector::from_flags(None, Some(12), false).unwrap(),
            ReleaseSelector::PullRequest(12)
        );
        assert!(ReleaseSelector::from_flags(Some(""), None, false).is_err());
        assert!(ReleaseSelector::from_flags(None, Some(0), false).is_err());
        assert!(ReleaseSelector::from_flags(None, Some(-3), false).is_err());
        assert!(ReleaseSelector::from_flags(Some("v1"), None, true).is_err());
    }

    #[test]
    fn latest_prefers_stable_release() {
        let source = FakeSource {
            releases: vec![release("v2.0.0-rc1", true), release("v1.9.0", false)],
        };
        let resolved = resolve(&source, "ddev", "ddev-redis", &ReleaseSelector::Latest).unwrap();
        assert_eq!(resolved.label, "v1.9.0");
        assert_eq!(
            resolved.archive_url,
            "https://example.test/ddev/ddev-redis/tarball/v1.9.0"
        );
    }

    #[test]
    fn latest_falls_back_to_prerelease() {
        let source = FakeSource {
            releases: vec![release("v0.1.0-beta", true)],
        };
        let resolved = resolve(&source, "o", "r", &ReleaseSelector::Latest).unwrap();
        assert_eq!(resolved.label, "v0.1.0-beta");
    }

    #[test]
    fn latest_without_releases_fails() {
        let source = FakeSource { releases: vec![] };
        let err = resolve(&source, "o", "r", &ReleaseSelector::Latest).unwrap_err();
        assert!(matches!(err, Error::NoRelease { .. }));
    }

    #[test]
    fn pull_request_and_branch_labels() {
        let source = FakeSource { releases: vec![] };
        let pr = resolve(&source, "o", "r", &ReleaseSelector::PullRequest(7)).unwrap();
        assert_eq!(pr.label, "pr-7");
        assert!(pr.archive_url.ends_with("refs/pull/7/head"));

        let branch = resolve(&source, "o", "r", &ReleaseSelector::DefaultBranch).unwrap();
        assert_eq!(branch.label, "main");
    }

    #[test]
    fn empty_explicit_and_zero_pr_rejected() {
        let source = FakeSource { releases: vec![] };
        assert!(resolve(&source, "o", "r", &ReleaseSelector::PullRequest(0)).is_err());
        assert!(
            resolve(
                &source,
                "o",
                "r",
                &ReleaseSelector::Explicit(String::new())
            )
            .is_err()
        );
    }
}
