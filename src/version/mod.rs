// src/version/mod.rs

//! Version handling and range satisfaction for recipe versions
//!
//! Recipe folders are keyed by version strings that are only loosely semver:
//! `1.2`, `v3.0`, `1.1.1k` and `20200101` all occur in practice. This module
//! parses such strings tolerantly into [`semver::Version`] values and evaluates
//! range expressions like `>=1.2.11 <2` against them.
//!
//! Pre-release versions never satisfy a range here, even when they fall inside
//! its bounds numerically.

use crate::error::{Error, Result};
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version, VersionReq};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static LOOSE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[v=\s]*(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-?([0-9A-Za-z][0-9A-Za-z.-]*))?(?:\+([0-9A-Za-z.-]+))?$",
    )
    .unwrap()
});

/// Operators that may be separated from their version by whitespace
const OPERATORS: &[&str] = &[">=", "<=", ">", "<", "=", "~", "^"];

/// A version string parsed with loose rules
///
/// Keeps the original text so callers can hand back exactly the string that
/// names a recipe folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseVersion {
    raw: String,
    version: Version,
}

impl LooseVersion {
    /// Parse a version string
    ///
    /// Accepted forms:
    /// - "1.2.3" → 1.2.3
    /// - "1.2" → 1.2.0
    /// - "v2" → 2.0.0
    /// - "2.0.0-beta" → 2.0.0-beta
    /// - "1.1.1k" → 1.1.1-k (attached suffix counts as a pre-release)
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = LOOSE_VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| Error::ParseError(format!("Invalid version '{}'", s)))?;

        let number = |idx: usize| -> Result<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u64>().map_err(|e| {
                    Error::ParseError(format!("Invalid version component in '{}': {}", s, e))
                }),
                None => Ok(0),
            }
        };

        let mut version = Version::new(number(1)?, number(2)?, number(3)?);

        if let Some(pre) = caps.get(4) {
            version.pre = Prerelease::new(pre.as_str()).map_err(|e| {
                Error::ParseError(format!("Invalid pre-release in '{}': {}", s, e))
            })?;
        }
        if let Some(build) = caps.get(5) {
            version.build = BuildMetadata::new(build.as_str()).map_err(|e| {
                Error::ParseError(format!("Invalid build metadata in '{}': {}", s, e))
            })?;
        }

        Ok(Self {
            raw: s.to_string(),
            version,
        })
    }

    /// The string this version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized semver value
    pub fn semver(&self) -> &Version {
        &self.version
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }
}

impl fmt::Display for LooseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp_precedence(&other.version)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A range expression: one or more alternatives separated by `||`
///
/// Each alternative is a space-separated list of comparators that must all
/// hold, e.g. `>=1.2 <2`. Hyphen ranges (`1.2 - 1.4`) are accepted as well.
#[derive(Debug, Clone)]
pub struct VersionRange {
    expression: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse a range expression (without the surrounding brackets)
    ///
    /// Anything after a top-level comma is a resolver flag such as
    /// `include_prerelease=True`; those flags are ignored because the
    /// selection policy here is fixed.
    pub fn parse(expression: &str) -> Result<Self> {
        let range = expression.split(',').next().unwrap_or_default();

        let alternatives = range
            .split("||")
            .map(translate_alternative)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            expression: expression.trim().to_string(),
            alternatives,
        })
    }

    /// Check if a version satisfies this range
    ///
    /// Pre-releases are always rejected.
    pub fn satisfies(&self, version: &LooseVersion) -> bool {
        if version.is_prerelease() {
            return false;
        }
        let plain = Version::new(
            version.version.major,
            version.version.minor,
            version.version.patch,
        );
        self.alternatives.iter().any(|req| req.matches(&plain))
    }

    /// Pick the highest candidate satisfying this range
    ///
    /// Candidates that cannot be parsed are skipped. The returned string is the
    /// candidate exactly as given.
    pub fn max_satisfying<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter_map(|candidate| LooseVersion::parse(candidate).ok())
            .filter(|version| self.satisfies(version))
            .max()
            .map(|version| version.raw)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Convenience wrapper: parse `range` and select from `candidates`
pub fn max_satisfying<'a, I>(candidates: I, range: &str) -> Result<Option<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    Ok(VersionRange::parse(range)?.max_satisfying(candidates))
}

/// Translate one `||` alternative into a `VersionReq`
fn translate_alternative(alternative: &str) -> Result<VersionReq> {
    let tokens: Vec<&str> = alternative.split_whitespace().collect();
    let mut comparators = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        // Hyphen range: "A - B"
        if tokens.get(i + 1) == Some(&"-") {
            let upper = tokens.get(i + 2).ok_or_else(|| {
                Error::ParseError(format!("Incomplete hyphen range in '{}'", alternative))
            })?;
            comparators.push(format!(">={}", normalize_bound(token)));
            comparators.push(format!("<={}", normalize_bound(upper)));
            i += 3;
            continue;
        }

        // Operator written apart from its version: ">= 1.2"
        if OPERATORS.contains(&token) {
            let version = tokens.get(i + 1).ok_or_else(|| {
                Error::ParseError(format!("Operator '{}' without a version in '{}'", token, alternative))
            })?;
            comparators.push(format!("{}{}", token, normalize_bound(version)));
            i += 2;
            continue;
        }

        comparators.push(comparator(token));
        i += 1;
    }

    if comparators.is_empty() {
        return Ok(VersionReq::STAR);
    }

    let joined = comparators.join(", ");
    VersionReq::parse(&joined)
        .map_err(|e| Error::ParseError(format!("Invalid version range '{}': {}", alternative.trim(), e)))
}

/// Turn a single token into a comparator string understood by `semver`
fn comparator(token: &str) -> String {
    let split = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(split);

    if version.is_empty() || is_wildcard(version) {
        return if version.is_empty() {
            "*".to_string()
        } else {
            format!("{}{}", op, version)
        };
    }

    // A bare version pins that version (or that prefix, for partial versions)
    let op = if op.is_empty() { "=" } else { op };
    format!("{}{}", op, normalize_bound(version))
}

fn is_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

/// Rewrite a loosely written bound into semver syntax, keeping partial precision
///
/// `v1.2` becomes `1.2`, `1.1.1k` becomes `1.1.1-k`. Anything unrecognized is
/// passed through for `semver` to reject.
fn normalize_bound(version: &str) -> String {
    if is_wildcard(version) {
        return version.to_string();
    }
    let Some(caps) = LOOSE_VERSION_RE.captures(version) else {
        return version.to_string();
    };

    let mut out = caps[1].to_string();
    for idx in [2, 3] {
        if let Some(m) = caps.get(idx) {
            out.push('.');
            out.push_str(m.as_str());
        }
    }
    if let Some(pre) = caps.get(4) {
        // semver only allows a pre-release on a full version
        while out.matches('.').count() < 2 {
            out.push_str(".0");
        }
        out.push('-');
        out.push_str(pre.as_str());
    }
    out
}
