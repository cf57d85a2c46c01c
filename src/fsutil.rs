use anyhow::{anyhow, Result};
use camino::{Utf8Path, Utf8PathBuf};
use dirs::data_local_dir;
use std::path::{PathBuf, MAIN_SEPARATOR};

pub fn default_cache_root() -> Utf8PathBuf {
    let mut root = data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    root.push("pnpgen");
    root.push("cache");
    Utf8PathBuf::from_path_buf(root).unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
}

pub fn to_utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| anyhow!("path is not valid UTF-8: {}", p.display()))
}

/// Package locations always end with the platform separator so a location
/// is a prefix of exactly the paths inside it.
pub fn normalize_location(path: &Utf8Path) -> String {
    let mut location = path.as_str().to_string();
    if !location.ends_with(MAIN_SEPARATOR) {
        location.push(MAIN_SEPARATOR);
    }
    location
}
