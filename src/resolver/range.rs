use anyhow::{anyhow, Result};
use semver::{Version, VersionReq};
use std::collections::BTreeMap;

/// An npm-style range, possibly a `||` union, compiled to `semver` requirements.
#[derive(Debug, Clone)]
pub struct VersionRange {
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(range: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in range.split("||").map(str::trim) {
            if part.is_empty() && range.contains("||") {
                continue;
            }
            let canon = canonicalize_npm_range(part);
            let req = if canon == "*" {
                VersionReq::STAR
            } else {
                VersionReq::parse(&canon).map_err(|e| {
                    anyhow!("invalid semver range '{}' (orig '{}'): {}", canon, part, e)
                })?
            };
            alternatives.push(req);
        }
        if alternatives.is_empty() {
            return Err(anyhow!("empty OR range '{}'", range));
        }
        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Highest candidate satisfying the range.
    pub fn pick<'a, T>(&self, candidates: &'a BTreeMap<Version, T>) -> Option<(&'a Version, &'a T)> {
        candidates.iter().rev().find(|(version, _)| self.matches(version))
    }
}

/// Rewrite a single (non-union) npm range into syntax the `semver` crate accepts.
pub fn canonicalize_npm_range(input: &str) -> String {
    let s = input.trim();
    if s.is_empty() || s == "*" || s == "latest" || s.eq_ignore_ascii_case("x") {
        return "*".into();
    }
    if Version::parse(s).is_ok() {
        return format!("={s}");
    }

    // "1.2.3 - 2.3.4"; the spaces keep it apart from prerelease dashes
    if let Some((left, right)) = s.split_once(" - ") {
        let (left, right) = (left.trim(), right.trim());
        if is_version_like(left) && is_version_like(right) {
            return format!(">={left}, <={right}");
        }
    }

    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() == 1 {
        return expand_partial(s).unwrap_or_else(|| s.to_string());
    }

    let mut comparators = Vec::new();
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        if is_op(token) {
            match iter.next() {
                Some(version) => comparators.push(format!("{token}{version}")),
                // dangling operator, let semver report it
                None => return s.to_string(),
            }
        } else if token.starts_with(|c: char| matches!(c, '>' | '<' | '=' | '^' | '~')) {
            comparators.push(token.to_string());
        } else if is_version_like(token) {
            comparators.push(expand_partial(token).unwrap_or_else(|| format!("={token}")));
        } else {
            return s.to_string();
        }
    }
    comparators.join(", ")
}

/// `1` / `1.x` / `1.2` / `1.2.x` style partial versions.
fn expand_partial(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('.').collect();
    let is_wild = |p: &str| p.eq_ignore_ascii_case("x") || p == "*";
    let major = parts.first()?.parse::<u64>().ok()?;
    match parts.as_slice() {
        [_] => Some(format!(">={major}.0.0, <{}.0.0", major + 1)),
        [_, minor] | [_, minor, _] if is_wild(minor) => Some(format!(">={major}.0.0, <{}.0.0", major + 1)),
        [_, minor] | [_, minor, _] if parts.len() == 2 || is_wild(parts[2]) => {
            let minor = minor.parse::<u64>().ok()?;
            Some(format!(">={major}.{minor}.0, <{major}.{}.0", minor + 1))
        }
        _ => None,
    }
}

fn is_op(t: &str) -> bool {
    matches!(t, ">" | "<" | ">=" | "<=" | "=" | "^" | "~")
}

fn is_version_like(t: &str) -> bool {
    t.chars().any(|c| c.is_ascii_digit())
        && t.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '*' | '+'))
}
