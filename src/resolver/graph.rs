use super::{PackageDescriptor, Pattern, Resolver};
use crate::error::Result;
use anyhow::{anyhow, Context};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

/// A pre-resolved descriptor graph: every pattern the project can reach,
/// keyed by its `name@range` text.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GraphFile {
    #[serde(default)]
    pub packages: BTreeMap<String, GraphEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub location: Option<Utf8PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<Pattern>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GraphResolver {
    entries: BTreeMap<String, GraphEntry>,
}

impl GraphResolver {
    /// Relative locations in the file are taken relative to `base`.
    pub fn new(graph: GraphFile, base: Option<&Utf8Path>) -> Self {
        let mut entries = graph.packages;
        if let Some(base) = base {
            for entry in entries.values_mut() {
                if let Some(loc) = entry.location.as_mut() {
                    if loc.is_relative() {
                        *loc = base.join(&*loc);
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let graph: GraphFile = serde_json::from_value(value).context("parse descriptor graph")?;
        Ok(Self::new(graph, None))
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("read graph file {path}"))?;
        let graph: GraphFile = match path.extension() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&data)
                .with_context(|| format!("parse YAML graph file {path}"))?,
            _ => serde_json::from_str(&data)
                .with_context(|| format!("parse JSON graph file {path}"))?,
        };
        Ok(Self::new(graph, path.parent()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for GraphResolver {
    fn resolve_strict(&self, pattern: &Pattern) -> Result<PackageDescriptor> {
        let key = pattern.to_string();
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| anyhow!("no descriptor for pattern {key}"))?;
        Ok(PackageDescriptor {
            name: entry.name.clone(),
            version: entry.version.clone(),
            main: entry.main.clone(),
            peer_dependencies: entry.peer_dependencies.clone(),
            location: entry.location.clone(),
            dependencies: entry.dependencies.clone(),
        })
    }
}
