use super::{IndexEntry, LocationIndex, PackageLocator};
use crate::emit::literal::js_string;
use crate::error::PnpError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::MAIN_SEPARATOR;

/// Distinct location lengths in probe order. A lookup probes one candidate
/// prefix per length instead of one per package.
///
/// Lengths are ordered by how many locations use them, most common first,
/// ties keeping the order they were first seen. Lengths used by a location
/// that encloses another registered location (the project root, typically)
/// are probed last, longest first, so the innermost package always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthPlan {
    lengths: Vec<usize>,
}

impl LengthPlan {
    pub fn new<'a>(locations: impl IntoIterator<Item = &'a str>, measure: impl Fn(&str) -> usize) -> Self {
        let locations: Vec<&str> = locations.into_iter().collect();

        // in sorted order, every location nested under P directly follows P
        let mut sorted = locations.clone();
        sorted.sort_unstable();
        sorted.dedup();
        let enclosing: BTreeSet<usize> = sorted
            .windows(2)
            .filter(|pair| pair[1].starts_with(pair[0]))
            .map(|pair| measure(pair[0]))
            .collect();

        let mut counts: Vec<(usize, usize)> = Vec::new();
        for location in locations {
            let len = measure(location);
            match counts.iter_mut().find(|(l, _)| *l == len) {
                Some((_, count)) => *count += 1,
                None => counts.push((len, 1)),
            }
        }
        let (mut deferred, mut frequent): (Vec<_>, Vec<_>) =
            counts.into_iter().partition(|(len, _)| enclosing.contains(len));
        frequent.sort_by(|a, b| b.1.cmp(&a.1));
        deferred.sort_by(|a, b| b.0.cmp(&a.0));

        Self { lengths: frequent.into_iter().chain(deferred).map(|(len, _)| len).collect() }
    }

    /// Lengths in bytes, for [`PrefixMatcher`].
    pub fn native(index: &LocationIndex) -> Self {
        Self::new(index.locations(), str::len)
    }

    /// Lengths in UTF-16 code units, which is what JavaScript string
    /// indexing counts.
    pub fn javascript(index: &LocationIndex) -> Self {
        Self::new(index.locations(), utf16_len)
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// `exports.findPackageLocator`, one guarded table probe per length.
    pub fn render_js(&self) -> String {
        JsLookup(self).to_string()
    }
}

struct JsLookup<'a>(&'a LengthPlan);

impl fmt::Display for JsLookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = js_string(&MAIN_SEPARATOR.to_string());
        writeln!(f, "exports.findPackageLocator = function findPackageLocator(location) {{")?;
        writeln!(f, "  let match;\n")?;
        for &len in self.0.lengths() {
            writeln!(f, "  if (location.length >= {len} && location[{}] === {separator})", len - 1)?;
            writeln!(f, "    if (match = locatorsByLocations.get(location.slice(0, {len})))")?;
            writeln!(f, "      return blacklistCheck(match);\n")?;
        }
        writeln!(f, "  return null;")?;
        writeln!(f, "}};")
    }
}

pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Native equivalent of the generated `findPackageLocator`.
#[derive(Debug, Clone)]
pub struct PrefixMatcher<'a> {
    index: &'a LocationIndex,
    plan: LengthPlan,
}

impl<'a> PrefixMatcher<'a> {
    pub fn new(index: &'a LocationIndex) -> Self {
        Self { index, plan: LengthPlan::native(index) }
    }

    pub fn plan(&self) -> &LengthPlan {
        &self.plan
    }

    /// The instance whose location is a directory prefix of `path`.
    /// `Ok(None)` means no package owns the path.
    pub fn locate(&self, path: &str) -> Result<Option<&'a PackageLocator>, PnpError> {
        let separator = MAIN_SEPARATOR as u8;
        for &len in self.plan.lengths() {
            if path.len() < len || !path.is_char_boundary(len) || path.as_bytes()[len - 1] != separator {
                continue;
            }
            match self.index.get(&path[..len]) {
                Some(IndexEntry::Package(locator)) => return Ok(Some(locator)),
                Some(IndexEntry::Blacklisted) => {
                    return Err(PnpError::BlacklistedLocation { path: path.to_string() })
                }
                None => {}
            }
        }
        Ok(None)
    }
}
