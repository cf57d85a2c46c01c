use crate::error::{PnpError, Result};
use crate::fsutil::to_utf8;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io;

/// Filesystem operations the store builder needs.
pub trait AliasFs: Sync {
    /// Materialize an alternate location for `real`, named after the
    /// instance digest, and return it.
    fn create_alias(&self, real: &Utf8Path, digest: &str, name: &str) -> Result<Utf8PathBuf>;

    fn canonicalize(&self, path: &Utf8Path) -> Result<Utf8PathBuf>;
}

/// `<externals>/pnp-<digest>/node_modules/<name>`
pub fn alias_location(externals: &Utf8Path, digest: &str, name: &str) -> Utf8PathBuf {
    let mut location = externals.join(format!("pnp-{digest}")).join("node_modules");
    for part in name.split('/') {
        location.push(part);
    }
    location
}

/// Creates real directory symlinks under the externals folder.
#[derive(Debug)]
pub struct SymlinkLinker {
    externals: Utf8PathBuf,
}

impl SymlinkLinker {
    pub fn new(externals: impl Into<Utf8PathBuf>) -> Self {
        Self { externals: externals.into() }
    }
}

impl AliasFs for SymlinkLinker {
    fn create_alias(&self, real: &Utf8Path, digest: &str, name: &str) -> Result<Utf8PathBuf> {
        let alias = alias_location(&self.externals, digest, name);
        let fail = |reason: String| PnpError::Alias {
            alias: alias.to_string(),
            target: real.to_string(),
            reason,
        };

        if let Some(parent) = alias.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        if existing_alias_matches(&alias, real).map_err(fail)? {
            debug!("alias {alias} already in place");
            return Ok(alias);
        }
        match symlink_dir(real, &alias) {
            Ok(()) => {}
            // a sibling branch may have created the same alias concurrently
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !existing_alias_matches(&alias, real).map_err(fail)? {
                    return Err(fail(e.to_string()).into());
                }
            }
            Err(e) => return Err(fail(e.to_string()).into()),
        }
        debug!("created alias {alias} -> {real}");
        Ok(alias)
    }

    fn canonicalize(&self, path: &Utf8Path) -> Result<Utf8PathBuf> {
        let canon = fs::canonicalize(path).with_context(|| format!("canonicalize {path}"))?;
        to_utf8(canon)
    }
}

/// `Ok(true)` when `alias` is already a symlink to `real`, `Ok(false)` when
/// nothing is there, and an error for anything else occupying the path.
fn existing_alias_matches(alias: &Utf8Path, real: &Utf8Path) -> Result<bool, String> {
    match fs::read_link(alias) {
        Ok(existing) if existing == real.as_std_path() => Ok(true),
        Ok(existing) => Err(format!("already points to {}", existing.display())),
        Err(_) if fs::symlink_metadata(alias).is_ok() => {
            Err("path exists and is not a symlink".to_string())
        }
        Err(_) => Ok(false),
    }
}

#[cfg(unix)]
fn symlink_dir(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(from, to)
}

#[cfg(windows)]
fn symlink_dir(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    use std::os::windows::fs::symlink_dir;
    match symlink_dir(from, to) {
        Ok(_) => Ok(()),
        Err(orig_err) => {
            if let Some(1314) = orig_err.raw_os_error() {
                // need admin, try junction
                use std::process::{Command, Stdio};
                let output = Command::new("cmd")
                    .args(["/C", "mklink", "/J", to.as_str(), from.as_str()])
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .output()?;
                if output.status.success() {
                    Ok(())
                } else {
                    Err(orig_err)
                }
            } else {
                Err(orig_err)
            }
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_from: &Utf8Path, _to: &Utf8Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported on this platform"))
}

/// Computes alias locations without touching the disk.
#[derive(Debug, Default)]
pub struct PlannedLinker {
    externals: Utf8PathBuf,
    planned: Mutex<BTreeMap<Utf8PathBuf, Utf8PathBuf>>,
}

impl PlannedLinker {
    pub fn new(externals: impl Into<Utf8PathBuf>) -> Self {
        Self { externals: externals.into(), planned: Mutex::new(BTreeMap::new()) }
    }

    /// alias -> real location, for every alias requested so far
    pub fn planned(&self) -> BTreeMap<Utf8PathBuf, Utf8PathBuf> {
        self.planned.lock().clone()
    }
}

impl AliasFs for PlannedLinker {
    fn create_alias(&self, real: &Utf8Path, digest: &str, name: &str) -> Result<Utf8PathBuf> {
        let alias = alias_location(&self.externals, digest, name);
        let mut planned = self.planned.lock();
        if let Some(existing) = planned.get(&alias) {
            if existing != real {
                return Err(PnpError::Alias {
                    alias: alias.to_string(),
                    target: real.to_string(),
                    reason: format!("already planned for {existing}"),
                }
                .into());
            }
        }
        planned.insert(alias.clone(), real.to_path_buf());
        Ok(alias)
    }

    fn canonicalize(&self, path: &Utf8Path) -> Result<Utf8PathBuf> {
        match fs::canonicalize(path) {
            Ok(canon) => to_utf8(canon),
            Err(_) => Ok(path.to_path_buf()),
        }
    }
}
