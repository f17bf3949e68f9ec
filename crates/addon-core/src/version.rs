//! Version constraint parsing and the host-version gate.
//!
//! Constraints use the conventional semver range grammar:
//!
//! - comparators: `>=1.23.0`, `<2`, `=1.2.3`, `!=1.2.0`, bare `1.2`
//! - comma or space separated comparator sets (all must match)
//! - `||` alternatives (any set may match)
//! - caret `^1.2`, tilde `~1.2.3`, wildcards `1.x`, `*`
//! - hyphen ranges `1.2 - 1.4`
//!
//! Versions may carry a leading `v`.
//!
//! When no comparator names a prerelease, every lower bound and exclusive
//! upper bound is compared as `X.Y.Z-0`, so a prerelease host such as
//! `v1.24.0-alpha1` satisfies `>= v1.23.0`.
//!
//! # Examples
//!
//! ```
//! use addon_core::version::VersionConstraint;
//!
//! let constraint = VersionConstraint::parse(">= v1.23.0").unwrap();
//! assert!(constraint.satisfies("v1.24.0-alpha1"));
//! assert!(!constraint.satisfies("1.22.9"));
//!
//! let constraint = VersionConstraint::parse("^1.2 || ~2.0.1").unwrap();
//! assert!(constraint.satisfies("1.9.0"));
//! assert!(constraint.satisfies("2.0.4"));
//! assert!(!constraint.satisfies("2.1.0"));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};

use crate::error::{Error, Result};

static HYPHEN_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+-\s+(\S+)\s*$").expect("hyphen range regex is valid")
});

/// Operators, longest first so prefixes don't shadow each other.
const OPERATORS: &[(&str, CompareOp)] = &[
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    ("!=", CompareOp::Ne),
    ("==", CompareOp::Eq),
    ("=", CompareOp::Eq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    ("^", CompareOp::Caret),
    ("~", CompareOp::Tilde),
];

/// A comparison operator as written in the constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
    Caret,
    Tilde,
}

/// A primitive comparator after range sugar has been expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Specifier {
    op: CompareOp,
    version: Version,
}

impl Specifier {
    fn new(op: CompareOp, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            CompareOp::Gte => candidate >= &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Lte => candidate <= &self.version,
            CompareOp::Lt => candidate < &self.version,
            CompareOp::Eq => candidate == &self.version,
            CompareOp::Ne => candidate != &self.version,
            CompareOp::Caret | CompareOp::Tilde => false,
        }
    }
}

/// A version with possibly missing components (`1`, `1.2`, `1.x`).
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    fn lower(&self) -> Version {
        let mut v = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        v.pre = self.pre.clone();
        v
    }

    /// Smallest version above every version this partial covers.
    fn next(&self) -> Version {
        match (self.major, self.minor) {
            (Some(major), None) => Version::new(major + 1, 0, 0),
            (Some(major), Some(minor)) if self.patch.is_none() => Version::new(major, minor + 1, 0),
            _ => self.lower(),
        }
    }
}

/// A parsed version constraint.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    /// Alternatives separated by `||`; each is a conjunction.
    alternatives: Vec<Vec<Specifier>>,
    /// Whether any comparator names a prerelease explicitly.
    explicit_prerelease: bool,
    raw: String,
}

impl VersionConstraint {
    /// Parse a constraint expression.
    pub fn parse(constraint: &str) -> Result<Self> {
        let raw = constraint.to_string();
        if constraint.trim().is_empty() {
            return Err(parse_error(constraint, "empty constraint"));
        }

        let mut explicit_prerelease = false;
        let mut alternatives = Vec::new();
        for alternative in constraint.split("||") {
            let specifiers = parse_alternative(alternative, constraint, &mut explicit_prerelease)?;
            alternatives.push(specifiers);
        }

        if !explicit_prerelease {
            for spec in alternatives.iter_mut().flatten() {
                if matches!(spec.op, CompareOp::Gte | CompareOp::Lt) && spec.version.pre.is_empty() {
                    spec.version.pre = Prerelease::new("0").map_err(|e| parse_error(constraint, &e.to_string()))?;
                }
            }
        }

        Ok(Self {
            alternatives,
            explicit_prerelease,
            raw,
        })
    }

    /// Check if a version string satisfies this constraint.
    ///
    /// Returns `false` if the version string cannot be parsed.
    pub fn satisfies(&self, version: &str) -> bool {
        match parse_version(version) {
            Ok(v) => self.satisfies_version(&v),
            Err(_) => false,
        }
    }

    pub fn satisfies_version(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|specs| {
            if !specs.iter().all(|spec| spec.matches(version)) {
                return false;
            }
            if self.explicit_prerelease && !version.pre.is_empty() {
                // A prerelease only matches a set naming a prerelease of the same release.
                return specs.iter().any(|spec| {
                    !spec.version.pre.is_empty()
                        && spec.version.major == version.major
                        && spec.version.minor == version.minor
                        && spec.version.patch == version.patch
                });
            }
            true
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Gate an add-on on the host tool's version.
///
/// An empty or whitespace-only constraint always passes.
pub fn check(addon: &str, constraint: &str, host_version: &str) -> Result<()> {
    if constraint.trim().is_empty() {
        return Ok(());
    }
    let parsed = VersionConstraint::parse(constraint)?;
    let host = parse_version(host_version).map_err(|reason| Error::ConstraintParse {
        constraint: host_version.to_string(),
        reason: format!("host version is not semver: {reason}"),
    })?;

    if parsed.satisfies_version(&host) {
        tracing::debug!(addon, constraint, host_version, "Version constraint satisfied");
        Ok(())
    } else {
        Err(Error::Constraint {
            addon: addon.to_string(),
            constraint: constraint.to_string(),
            host_version: host_version.to_string(),
        })
    }
}

fn parse_error(constraint: &str, reason: &str) -> Error {
    Error::ConstraintParse {
        constraint: constraint.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_alternative(
    alternative: &str,
    constraint: &str,
    explicit_prerelease: &mut bool,
) -> Result<Vec<Specifier>> {
    if let Some(caps) = HYPHEN_RANGE_RE.captures(alternative) {
        let low = parse_partial(&caps[1], constraint)?;
        let high = parse_partial(&caps[2], constraint)?;
        *explicit_prerelease |= !low.pre.is_empty() || !high.pre.is_empty();
        let mut specs = Vec::new();
        if low.major.is_some() {
            specs.push(Specifier::new(CompareOp::Gte, low.lower()));
        }
        if high.major.is_some() {
            specs.push(if high.is_full() {
                Specifier::new(CompareOp::Lte, high.lower())
            } else {
                Specifier::new(CompareOp::Lt, high.next())
            });
        }
        return Ok(specs);
    }

    let mut specs = Vec::new();
    for (op, version) in tokenize(alternative, constraint)? {
        let partial = parse_partial(version, constraint)?;
        *explicit_prerelease |= !partial.pre.is_empty();
        specs.extend(expand(op, &partial));
    }
    if specs.is_empty() && alternative.trim().is_empty() {
        return Err(parse_error(constraint, "empty alternative"));
    }
    Ok(specs)
}

/// Split a comparator set into `(operator, version)` pairs, tolerating
/// whitespace between an operator and its version (`>= 1.2`).
fn tokenize<'a>(set: &'a str, constraint: &str) -> Result<Vec<(CompareOp, &'a str)>> {
    let mut tokens = Vec::new();
    let mut pending: Option<CompareOp> = None;

    for word in set.split([',', ' ', '\t']).filter(|w| !w.is_empty()) {
        let (op, rest) = split_operator(word);
        match (pending.take(), op) {
            (Some(_), Some(_)) => {
                return Err(parse_error(constraint, &format!("unexpected operator in '{word}'")));
            }
            (Some(prev), None) => tokens.push((prev, rest)),
            (None, Some(op)) if rest.is_empty() => pending = Some(op),
            (None, op) => tokens.push((op.unwrap_or(CompareOp::Eq), rest)),
        }
    }

    if pending.is_some() {
        return Err(parse_error(constraint, "operator without a version"));
    }
    Ok(tokens)
}

fn split_operator(word: &str) -> (Option<CompareOp>, &str) {
    OPERATORS
        .iter()
        .find_map(|(prefix, op)| word.strip_prefix(prefix).map(|rest| (Some(*op), rest)))
        .unwrap_or((None, word))
}

fn expand(op: CompareOp, p: &Partial) -> Vec<Specifier> {
    let Some(major) = p.major else {
        // `*`, `x` and friends match everything.
        return Vec::new();
    };

    match op {
        CompareOp::Eq if p.is_full() => vec![Specifier::new(CompareOp::Eq, p.lower())],
        CompareOp::Eq => vec![
            Specifier::new(CompareOp::Gte, p.lower()),
            Specifier::new(CompareOp::Lt, p.next()),
        ],
        CompareOp::Ne => vec![Specifier::new(CompareOp::Ne, p.lower())],
        CompareOp::Gt if p.is_full() => vec![Specifier::new(CompareOp::Gt, p.lower())],
        CompareOp::Gt => vec![Specifier::new(CompareOp::Gte, p.next())],
        CompareOp::Gte => vec![Specifier::new(CompareOp::Gte, p.lower())],
        CompareOp::Lt => vec![Specifier::new(CompareOp::Lt, p.lower())],
        CompareOp::Lte if p.is_full() => vec![Specifier::new(CompareOp::Lte, p.lower())],
        CompareOp::Lte => vec![Specifier::new(CompareOp::Lt, p.next())],
        CompareOp::Tilde => {
            let upper = match p.minor {
                Some(minor) => Version::new(major, minor + 1, 0),
                None => Version::new(major + 1, 0, 0),
            };
            vec![
                Specifier::new(CompareOp::Gte, p.lower()),
                Specifier::new(CompareOp::Lt, upper),
            ]
        }
        CompareOp::Caret => {
            let upper = match (major, p.minor, p.patch) {
                (0, Some(0), Some(patch)) => Version::new(0, 0, patch + 1),
                (0, Some(minor), _) => Version::new(0, minor + 1, 0),
                _ => Version::new(major + 1, 0, 0),
            };
            vec![
                Specifier::new(CompareOp::Gte, p.lower()),
                Specifier::new(CompareOp::Lt, upper),
            ]
        }
    }
}

fn parse_partial(s: &str, constraint: &str) -> Result<Partial> {
    let s = s.trim();
    let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
    let invalid = |reason: String| parse_error(constraint, &format!("invalid version '{s}': {reason}"));

    let without_build = s.split_once('+').map_or(s, |(core, _)| core);
    let (core, pre) = without_build.split_once('-').unwrap_or((without_build, ""));

    let mut components = [None, None, None];
    let mut wildcard_seen = false;
    let parts: Vec<&str> = if core.is_empty() { Vec::new() } else { core.split('.').collect() };
    if parts.len() > 3 {
        return Err(invalid("too many components".to_string()));
    }
    for (slot, part) in components.iter_mut().zip(parts) {
        if matches!(part, "x" | "X" | "*") {
            wildcard_seen = true;
            continue;
        }
        if wildcard_seen {
            return Err(invalid("number after wildcard".to_string()));
        }
        *slot = Some(part.parse::<u64>().map_err(|e| invalid(e.to_string()))?);
    }

    let [major, minor, patch] = components;
    let pre = if pre.is_empty() {
        Prerelease::EMPTY
    } else {
        if patch.is_none() {
            return Err(invalid("prerelease needs major.minor.patch".to_string()));
        }
        Prerelease::new(pre).map_err(|e| invalid(e.to_string()))?
    };

    Ok(Partial {
        major,
        minor,
        patch,
        pre,
    })
}

/// Parse a concrete version, accepting a leading `v` and a missing patch
/// (or minor) component.
pub fn parse_version(s: &str) -> std::result::Result<Version, String> {
    let s = s.trim();
    let s = s.strip_prefix(['v', 'V']).unwrap_or(s);

    if let Ok(v) = Version::parse(s) {
        return Ok(v);
    }

    let (core, rest) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => s.to_string(),
    };
    Version::parse(&padded).map_err(|e| format!("invalid version '{s}': {e}"))
}
