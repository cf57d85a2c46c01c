use crate::error::{PnpError, Result};
use crate::pnp::{IndexEntry, LengthPlan, LocationIndex, PackageStore};
use anyhow::Context;
use camino::Utf8Path;
use log::info;
use std::fmt;
use std::fs;

pub mod literal;

use literal::{js_locator, js_optional_string, js_string};

/// Replaced by the generated tables and lookup function.
pub const TEMPLATE_MARKER: &str = "$$SETUP_STATIC_TABLES();";

/// Runtime shipped when no template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("pnpapi.js");

#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Interpreter line without the leading `#!`.
    pub shebang: Option<String>,
}

/// Top-level statements defining `packageInformationStores`,
/// `locatorsByLocations` and `exports.findPackageLocator`.
pub fn generate_fragment(store: &PackageStore, index: &LocationIndex) -> String {
    format!(
        "{}\n{}\n{}",
        StoreTable(store),
        LocationTable(index),
        LengthPlan::javascript(index).render_js()
    )
}

struct StoreTable<'a>(&'a PackageStore);

impl fmt::Display for StoreTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "const packageInformationStores = new Map([")?;
        for (name, instances) in self.0.stores() {
            writeln!(f, "  [{}, new Map([", js_optional_string(name.as_deref()))?;
            for (reference, info) in instances {
                writeln!(f, "    [{}, {{", js_optional_string(reference.as_deref()))?;
                writeln!(f, "      packageLocation: {},", js_string(&info.package_location))?;
                writeln!(f, "      packageMainEntry: {},", js_optional_string(info.package_main_entry.as_deref()))?;
                writeln!(f, "      packageDependencies: new Map([")?;
                for (dep_name, dep_reference) in &info.package_dependencies {
                    writeln!(f, "        [{}, {}],", js_string(dep_name), js_string(dep_reference))?;
                }
                writeln!(f, "      ]),")?;
                writeln!(f, "    }}],")?;
            }
            writeln!(f, "  ])],")?;
        }
        writeln!(f, "]);")
    }
}

struct LocationTable<'a>(&'a LocationIndex);

impl fmt::Display for LocationTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "const locatorsByLocations = new Map([")?;
        for (location, entry) in self.0.iter() {
            let value = match entry {
                IndexEntry::Package(locator) if locator.is_top_level() => "topLevelLocator".to_string(),
                IndexEntry::Package(locator) => js_locator(locator),
                IndexEntry::Blacklisted => "blacklistedLocator".to_string(),
            };
            writeln!(f, "  [{}, {}],", js_string(location), value)?;
        }
        writeln!(f, "]);")
    }
}

pub fn ensure_marker(template: &str) -> Result<()> {
    if !template.contains(TEMPLATE_MARKER) {
        return Err(PnpError::MissingTemplateMarker { marker: TEMPLATE_MARKER.to_string() }.into());
    }
    Ok(())
}

/// Splice the generated fragment into `template` at [`TEMPLATE_MARKER`].
pub fn render(template: &str, store: &PackageStore, index: &LocationIndex, options: &EmitOptions) -> Result<String> {
    ensure_marker(template)?;
    let fragment = generate_fragment(store, index);
    let body = template.replacen(TEMPLATE_MARKER, &fragment, 1);
    Ok(match &options.shebang {
        Some(shebang) => format!("#!{}\n{}", shebang.trim_start_matches("#!"), body),
        None => body,
    })
}

/// Write through a temporary sibling so readers never see a partial file.
pub fn write_artifact(path: &Utf8Path, contents: &str, executable: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).with_context(|| format!("write {tmp}"))?;
    #[cfg(unix)]
    {
        if executable {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&tmp)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&tmp, perms)?;
        }
    }
    #[cfg(not(unix))]
    let _ = executable;
    fs::rename(&tmp, path).with_context(|| format!("move {tmp} into place at {path}"))?;
    info!("wrote {} ({} bytes)", path, contents.len());
    Ok(())
}
