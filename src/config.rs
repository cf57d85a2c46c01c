use crate::emit::DEFAULT_TEMPLATE;
use crate::error::Result;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

pub const CONFIG_FILE: &str = ".pnpgenrc.json";

/// Project-level settings, read from `.pnpgenrc.json` next to `package.json`.
/// Relative paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PnpConfig {
    pub output: Utf8PathBuf,
    pub externals_folder: Utf8PathBuf,
    pub shebang: Option<String>,
    pub template: Option<Utf8PathBuf>,
    pub graph: Option<Utf8PathBuf>,
    pub cache_folder: Option<Utf8PathBuf>,
}

impl Default for PnpConfig {
    fn default() -> Self {
        Self {
            output: Utf8PathBuf::from(".pnp.js"),
            externals_folder: Utf8PathBuf::from(".pnp/externals"),
            shebang: None,
            template: None,
            graph: None,
            cache_folder: None,
        }
    }
}

impl PnpConfig {
    pub fn load_or_default(project_root: &Utf8Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        load(&path)
    }

    pub fn output_path(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.output)
    }

    pub fn externals_path(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.externals_folder)
    }

    /// The configured template, or the bundled runtime.
    pub fn load_template(&self, project_root: &Utf8Path) -> Result<String> {
        match &self.template {
            Some(template) => {
                let path = project_root.join(template);
                fs::read_to_string(&path).with_context(|| format!("read template {path}"))
            }
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }
}

pub fn load(path: &Utf8Path) -> Result<PnpConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let config: PnpConfig =
        serde_json::from_str(&data).with_context(|| format!("parse {path}"))?;
    if config.output.as_str().is_empty() {
        anyhow::bail!("{path}: output must not be empty");
    }
    Ok(config)
}
