use anyhow::Result;
use camino::Utf8PathBuf;
use std::collections::BTreeMap;

pub mod cache;
pub mod graph;
pub mod pattern;
pub mod range;

pub use cache::CacheResolver;
pub use graph::GraphResolver;
pub use pattern::Pattern;
pub use range::{canonicalize_npm_range, VersionRange};

/// Concrete package a pattern resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub main: Option<String>,
    /// Only the key set is consumed; the ranges are kept for diagnostics.
    pub peer_dependencies: BTreeMap<String, String>,
    /// `None` means the package has no on-disk location in this pass and is skipped.
    pub location: Option<Utf8PathBuf>,
    pub dependencies: Vec<Pattern>,
}

impl PackageDescriptor {
    pub fn has_peers(&self) -> bool {
        !self.peer_dependencies.is_empty()
    }

    pub fn is_peer(&self, name: &str) -> bool {
        self.peer_dependencies.contains_key(name)
    }
}

/// Turns a pattern into exactly one package. Errors are treated as
/// "unresolvable" by the store builder and only omit that branch.
pub trait Resolver: Sync {
    fn resolve_strict(&self, pattern: &Pattern) -> Result<PackageDescriptor>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve_strict(&self, pattern: &Pattern) -> Result<PackageDescriptor> {
        (**self).resolve_strict(pattern)
    }
}
