//! The `add-on search` command

use addon_core::{Output, ReleaseSource};

use super::ADDON_TOPIC;
use super::list::print_repositories;
use crate::error::{CliError, Result};

pub fn run_search(source: &dyn ReleaseSource, output: &dyn Output, terms: &[String]) -> Result<()> {
    let terms: Vec<&str> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(CliError::user("search needs at least one term"));
    }

    let query = format!("{} topic:{ADDON_TOPIC}", terms.join(" "));
    let mut repositories = source.search_repositories(&query)?;
    repositories.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| a.full_name.cmp(&b.full_name)));

    print_repositories(output, &repositories, "matching add-ons");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_core::{Level, RecordingOutput};
    use addon_test_utils::StaticReleaseSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_search_ranks_by_stars() {
        let source = StaticReleaseSource::new()
            .with_repository("someone/ddev-redis-insight", "Redis GUI", 4)
            .with_repository("ddev/ddev-redis", "Redis service", 120)
            .with_repository("ddev/ddev-solr", "Solr search", 50);
        let output = RecordingOutput::new();

        run_search(&source, &output, &["redis".to_string()]).unwrap();

        let lines = output.messages(Level::Info);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ddev/ddev-redis "));
        assert!(lines[1].starts_with("someone/ddev-redis-insight"));
        assert_eq!(lines[2], "2 matching add-ons found");
    }

    #[test]
    fn test_search_without_terms() {
        let source = StaticReleaseSource::new();
        let err = run_search(&source, &RecordingOutput::new(), &[" ".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
