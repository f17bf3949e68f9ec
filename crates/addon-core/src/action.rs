//! Action parsing.
//!
//! An action is a shell script body. Its leading comment block may carry
//! `## key: value` directives; the inline `#ddev-warning-exit-code` flag may
//! appear anywhere in the body.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::project::ExecTarget;

/// Inline flag downgrading a non-zero exit to a warning.
pub const WARNING_EXIT_CODE_FLAG: &str = "#ddev-warning-exit-code";

pub const DESCRIPTION: &str = "description";
pub const PRE_HOOK_ACTION_CHECK: &str = "pre-hook-action-check";
pub const POST_HOOK_ACTION_CHECK: &str = "post-hook-action-check";
pub const EXEC_TARGET: &str = "exec-target";

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*##\s*([A-Za-z0-9_-]+)\s*:\s*(.*?)\s*$").expect("directive regex is valid")
});

static LEGACY_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#ddev-description:\s*(.*?)\s*$").expect("description regex is valid")
});

/// Inline flags detected anywhere in an action body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    WarningExitCode,
}

/// Directives parsed from the leading comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub description: Option<String>,
    pub directives: BTreeMap<String, String>,
}

impl Header {
    pub fn directive(&self, key: &str) -> Option<&str> {
        self.directives.get(key).map(String::as_str)
    }
}

/// A parsed action, ready for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub body: String,
    pub header: Header,
    pub flags: BTreeSet<Flag>,
}

impl Action {
    pub fn parse(body: &str) -> Self {
        let mut flags = BTreeSet::new();
        if body.contains(WARNING_EXIT_CODE_FLAG) {
            flags.insert(Flag::WarningExitCode);
        }
        Self {
            body: body.to_string(),
            header: parse_header(body),
            flags,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.header.description.as_deref()
    }

    pub fn warns_on_failure(&self) -> bool {
        self.flags.contains(&Flag::WarningExitCode)
    }

    /// Where the action runs: `## exec-target: host` or a service name,
    /// defaulting to the web service.
    pub fn exec_target(&self) -> ExecTarget {
        match self.header.directive(EXEC_TARGET) {
            Some("host") => ExecTarget::Host,
            Some(service) if !service.is_empty() => ExecTarget::Service(service.to_string()),
            _ => ExecTarget::default(),
        }
    }
}

/// Scan the leading comment block of `body` for directives.
pub fn parse_header(body: &str) -> Header {
    let mut header = Header::default();
    let lines = body.lines().skip_while(|l| l.trim().is_empty());

    for line in lines {
        if !line.trim_start().starts_with('#') {
            break;
        }
        if let Some(caps) = DIRECTIVE_RE.captures(line) {
            let key = caps[1].to_ascii_lowercase();
            let value = caps[2].to_string();
            if key == DESCRIPTION {
                header.description = Some(value.clone());
            }
            header.directives.insert(key, value);
        } else if let Some(caps) = LEGACY_DESCRIPTION_RE.captures(line) {
            if header.description.is_none() {
                header.description = Some(caps[1].to_string());
            }
        }
    }

    header.description = header.description.filter(|d| !d.is_empty());
    header
}
