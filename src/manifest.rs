use crate::error::Result;
use crate::resolver::Pattern;
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// The project's direct dependencies as resolution seeds: regular, then
    /// dev, then optional, each group in name order. A name listed in several
    /// groups is only seeded once.
    pub fn seed_patterns(&self) -> Vec<Pattern> {
        let mut seen = std::collections::BTreeSet::new();
        [&self.dependencies, &self.dev_dependencies, &self.optional_dependencies]
            .into_iter()
            .flatten()
            .filter(|(name, _)| seen.insert(name.as_str()))
            .map(|(name, range)| Pattern::new(name, range))
            .collect()
    }
}

pub fn load(path: &Utf8Path) -> Result<Manifest> {
    let data = fs::read_to_string(path)?;
    let m: Manifest = serde_json::from_str(&data)?;
    if m.name.is_empty() {
        anyhow::bail!("name empty");
    }
    Ok(m)
}
