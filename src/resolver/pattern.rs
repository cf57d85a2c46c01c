use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested dependency, `name@range`. The range is never interpreted here;
/// only a [`Resolver`](super::Resolver) gives it meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    pub name: String,
    pub range: String,
}

impl Pattern {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self { name: name.into(), range: range.into() }
    }

    /// Parse `name`, `name@range` or `@scope/name@range`. A missing range
    /// means `*`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        // skip a leading scope marker so `@scope/name` isn't split at 0
        let split = trimmed.char_indices().skip(1).find(|(_, c)| *c == '@').map(|(idx, _)| idx);
        let (name, range) = match split {
            Some(idx) => (&trimmed[..idx], trimmed[idx + 1..].trim()),
            None => (trimmed, ""),
        };
        if !is_valid_name(name) {
            return None;
        }
        let range = if range.is_empty() { "*" } else { range };
        Some(Self::new(name, range))
    }

    /// For `alias@npm:real@range`, the pattern actually fetched (`real@range`).
    pub fn alias_target(&self) -> Option<Pattern> {
        self.range.strip_prefix("npm:").and_then(Pattern::parse)
    }
}

fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return false;
    }
    match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, rest)) => !scope.is_empty() && !rest.is_empty() && !rest.contains('/'),
            None => false,
        },
        None => !name.contains('/'),
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.range)
    }
}

impl TryFrom<String> for Pattern {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pattern::parse(&value).ok_or_else(|| format!("invalid dependency pattern '{value}'"))
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.to_string()
    }
}
