use crate::config::PnpConfig;
use crate::error::Result;
use crate::fsutil::{default_cache_root, to_utf8};
use crate::linker::AliasFs;
use crate::manifest::{self, Manifest};
use crate::pnp::{PackageStore, StoreBuilder};
use crate::resolver::{CacheResolver, GraphResolver, Resolver};
use anyhow::{bail, Context};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;

pub mod generate;
pub mod locate;
pub mod ls;
mod status;

pub use generate::{cmd_generate, GenerateOptions};
pub use locate::cmd_locate;
pub use ls::cmd_ls;

/// Where the project and its package descriptors come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Project directory containing package.json
    #[arg(long, default_value = ".")]
    pub project: String,
    /// Pre-resolved descriptor graph (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, conflicts_with = "cache")]
    pub graph: Option<String>,
    /// Extracted package cache to resolve from
    #[arg(long)]
    pub cache: Option<String>,
}

/// Everything a command needs before building the store.
pub(crate) struct Session {
    pub(crate) root: Utf8PathBuf,
    pub(crate) config: PnpConfig,
    pub(crate) manifest: Manifest,
    resolver: Box<dyn Resolver>,
}

impl Session {
    pub(crate) fn open(source: &SourceArgs) -> Result<Self> {
        let root = absolute(&source.project)?;
        let manifest_path = root.join("package.json");
        if !manifest_path.exists() {
            bail!("no package.json found in {root}");
        }
        let manifest = manifest::load(&manifest_path)
            .with_context(|| format!("load project manifest {manifest_path}"))?;
        let config = PnpConfig::load_or_default(&root)?;
        let resolver = open_resolver(&root, source, &config)?;
        Ok(Self { root, config, manifest, resolver })
    }

    pub(crate) fn externals(&self) -> Utf8PathBuf {
        self.config.externals_path(&self.root)
    }

    pub(crate) fn build(&self, linker: &dyn AliasFs) -> Result<PackageStore> {
        let seeds = self.manifest.seed_patterns();
        StoreBuilder::new(self.resolver.as_ref(), linker).build(&self.root, &seeds)
    }
}

fn open_resolver(root: &Utf8Path, source: &SourceArgs, config: &PnpConfig) -> Result<Box<dyn Resolver>> {
    if let Some(graph) = &source.graph {
        return Ok(Box::new(GraphResolver::load(&absolute(graph)?)?));
    }
    if let Some(cache) = &source.cache {
        return Ok(Box::new(CacheResolver::open(&absolute(cache)?)?));
    }
    if let Some(graph) = &config.graph {
        return Ok(Box::new(GraphResolver::load(&root.join(graph))?));
    }
    let cache = config.cache_folder.as_ref().map(|c| root.join(c)).unwrap_or_else(default_cache_root);
    Ok(Box::new(CacheResolver::open(&cache)?))
}

/// Command-line paths are relative to the working directory.
pub(crate) fn absolute(raw: &str) -> Result<Utf8PathBuf> {
    let path = Utf8PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = to_utf8(std::env::current_dir().context("read current directory")?)?;
    Ok(cwd.join(path))
}
