use super::{PackageDescriptor, Pattern, Resolver, VersionRange};
use crate::error::Result;
use anyhow::{anyhow, Context};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use walkdir::WalkDir;

/// The subset of `package.json` a cached package contributes to resolution.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CachedManifest {
    #[serde(default)]
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct CachedPackage {
    dir: Utf8PathBuf,
    manifest: CachedManifest,
}

/// Resolves patterns against an extracted package cache laid out as
/// `<root>/pkgs/<name...>/<version>/package/`.
#[derive(Debug, Clone)]
pub struct CacheResolver {
    packages: BTreeMap<String, BTreeMap<Version, CachedPackage>>,
}

pub fn cache_package_path(root: &Utf8Path, name: &str, version: &str) -> Utf8PathBuf {
    let mut dir = root.join("pkgs");
    for part in name.split('/') {
        dir.push(part);
    }
    dir.push(version);
    dir.push("package");
    dir
}

impl CacheResolver {
    pub fn open(root: &Utf8Path) -> Result<Self> {
        let pkgs = root.join("pkgs");
        let mut packages: BTreeMap<String, BTreeMap<Version, CachedPackage>> = BTreeMap::new();
        if !pkgs.is_dir() {
            warn!("package cache {pkgs} does not exist; every pattern will be unresolvable");
            return Ok(Self { packages });
        }

        // unscoped manifests sit 4 levels below pkgs/, scoped ones 5
        for entry in WalkDir::new(&pkgs).min_depth(4).max_depth(5).follow_links(false) {
            let entry = entry.with_context(|| format!("scan package cache {pkgs}"))?;
            if entry.file_name() != "package.json" || !entry.file_type().is_file() {
                continue;
            }
            let manifest_path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|p| anyhow!("non UTF-8 path in package cache: {}", p.display()))?;
            let Some((name, version, dir)) = split_cache_path(&pkgs, &manifest_path) else {
                continue;
            };
            let manifest = match read_cached_manifest(&manifest_path) {
                Ok(mf) => mf,
                Err(err) => {
                    warn!("skipping cached package at {dir}: {err:#}");
                    continue;
                }
            };
            debug!("indexed cached package {name}@{version}");
            packages.entry(name).or_default().insert(version, CachedPackage { dir, manifest });
        }

        Ok(Self { packages })
    }

    /// Cached versions of `name`, highest first.
    pub fn cached_versions(&self, name: &str) -> Vec<&Version> {
        self.packages.get(name).map(|v| v.keys().rev().collect()).unwrap_or_default()
    }
}

/// `pkgs/<name...>/<version>/package/package.json` -> (name, version, package dir)
fn split_cache_path(pkgs: &Utf8Path, manifest: &Utf8Path) -> Option<(String, Version, Utf8PathBuf)> {
    let package_dir = manifest.parent()?;
    if package_dir.file_name()? != "package" {
        return None;
    }
    let version_dir = package_dir.parent()?;
    let version = Version::parse(version_dir.file_name()?).ok()?;
    let name_dir = version_dir.parent()?.strip_prefix(pkgs).ok()?;
    let parts: Vec<&str> = name_dir.components().map(|c| c.as_str()).collect();
    let name = match parts.as_slice() {
        [name] if !name.starts_with('@') => name.to_string(),
        [scope, name] if scope.starts_with('@') => format!("{scope}/{name}"),
        _ => return None,
    };
    Some((name, version, package_dir.to_path_buf()))
}

pub fn read_cached_manifest(path: &Utf8Path) -> Result<CachedManifest> {
    let txt = fs::read_to_string(path).with_context(|| format!("read cached package.json at {path}"))?;
    let mf: CachedManifest = serde_json::from_str(&txt)
        .with_context(|| format!("parse cached package.json at {path}"))?;
    Ok(mf)
}

impl Resolver for CacheResolver {
    fn resolve_strict(&self, pattern: &Pattern) -> Result<PackageDescriptor> {
        let target = pattern.alias_target().unwrap_or_else(|| pattern.clone());
        let versions = self
            .packages
            .get(&target.name)
            .ok_or_else(|| anyhow!("{} is not in the package cache", target.name))?;
        let range = VersionRange::parse(&target.range)?;
        let (version, cached) = range
            .pick(versions)
            .ok_or_else(|| anyhow!("no cached version of {} matches {}", target.name, target.range))?;

        let mf = &cached.manifest;
        let mut dependencies: Vec<Pattern> =
            mf.dependencies.iter().map(|(name, range)| Pattern::new(name, range)).collect();
        dependencies.extend(
            mf.optional_dependencies
                .iter()
                .filter(|(name, _)| !mf.dependencies.contains_key(*name))
                .map(|(name, range)| Pattern::new(name, range)),
        );

        Ok(PackageDescriptor {
            // an aliased dependency is bound under the alias
            name: pattern.name.clone(),
            version: mf.version.clone().unwrap_or_else(|| version.to_string()),
            main: mf.main.clone(),
            peer_dependencies: mf.peer_dependencies.clone(),
            location: Some(cached.dir.clone()),
            dependencies,
        })
    }
}
