use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A project whose `app-dep` depends on `lib` and peer-depends on `react`,
/// described by a graph file with project-relative locations.
fn project() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(
        root.join("package.json"),
        json!({
            "name": "app",
            "version": "0.1.0",
            "dependencies": { "app-dep": "^1.0.0", "react": "^18.0.0" }
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        root.join("graph.json"),
        json!({
            "packages": {
                "app-dep@^1.0.0": {
                    "name": "app-dep",
                    "version": "1.0.0",
                    "main": "main.js",
                    "location": "node_modules/app-dep",
                    "dependencies": ["lib@^2.0.0", "react@*"],
                    "peerDependencies": { "react": "*" }
                },
                "lib@^2.0.0": { "name": "lib", "version": "2.0.0", "location": "node_modules/lib" },
                "react@^18.0.0": { "name": "react", "version": "18.2.0", "location": "node_modules/react" }
            }
        })
        .to_string(),
    )
    .unwrap();
    for pkg in ["app-dep", "lib", "react"] {
        fs::create_dir_all(root.join("node_modules").join(pkg)).unwrap();
    }
    dir
}

fn pnpgen(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pnpgen").unwrap();
    cmd.current_dir(root).env("RUST_LOG", "off");
    cmd
}

#[test]
fn generate_writes_lookup_file() {
    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["generate", "--graph", "graph.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let output = fs::read_to_string(root.join(".pnp.js")).unwrap();
    assert!(output.contains("const packageInformationStores = new Map(["));
    assert!(output.contains("const locatorsByLocations = new Map(["));
    assert!(output.contains("exports.findPackageLocator = function findPackageLocator(location) {"));
    assert!(output.contains("[\"lib\", new Map(["));
    assert!(output.contains("blacklistedLocator"));
    assert!(!output.contains("$$SETUP_STATIC_TABLES();"));
}

#[cfg(unix)]
#[test]
fn generate_links_virtual_instances() {
    let dir = project();
    let root = dir.path();
    pnpgen(root).args(["generate", "--graph", "graph.json"]).assert().success();

    let externals = root.join(".pnp/externals");
    let aliases: Vec<_> = fs::read_dir(&externals).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(aliases.len(), 1);
    let name = aliases[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("pnp-"));
    assert_eq!(name.len(), "pnp-".len() + 40);

    let alias = aliases[0].join("node_modules/app-dep");
    assert_eq!(fs::read_link(&alias).unwrap(), root.join("node_modules/app-dep"));

    // regenerating reuses the alias and produces the same file
    let first = fs::read_to_string(root.join(".pnp.js")).unwrap();
    pnpgen(root).args(["generate", "--graph", "graph.json"]).assert().success();
    assert_eq!(fs::read_to_string(root.join(".pnp.js")).unwrap(), first);
}

#[cfg(unix)]
#[test]
fn generate_with_shebang_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["generate", "--graph", "graph.json", "--out", "bin/pnp.cjs", "--shebang", "/usr/bin/env node"])
        .assert()
        .success();

    let out = root.join("bin/pnp.cjs");
    let output = fs::read_to_string(&out).unwrap();
    assert!(output.starts_with("#!/usr/bin/env node\n"));
    let mode = fs::metadata(&out).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[test]
fn dry_run_touches_nothing() {
    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["generate", "--graph", "graph.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would link"))
        .stdout(predicate::str::contains("would write"));

    assert!(!root.join(".pnp.js").exists());
    assert!(!root.join(".pnp").exists());
}

#[test]
fn template_without_marker_fails_before_linking() {
    let dir = project();
    let root = dir.path();
    fs::write(root.join("broken.js"), "module.exports = {};\n").unwrap();
    pnpgen(root)
        .args(["generate", "--graph", "graph.json", "--template", "broken.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("$$SETUP_STATIC_TABLES();"));

    assert!(!root.join(".pnp.js").exists());
    assert!(!root.join(".pnp").exists());
}

#[test]
fn config_file_supplies_graph_and_output() {
    let dir = project();
    let root = dir.path();
    fs::write(
        root.join(".pnpgenrc.json"),
        json!({ "graph": "graph.json", "output": "out/.pnp.js" }).to_string(),
    )
    .unwrap();
    pnpgen(root).arg("generate").assert().success();
    assert!(root.join("out/.pnp.js").exists());
}

#[test]
fn locate_reports_owning_package() {
    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["locate", "--graph", "graph.json", "node_modules/lib/index.js", "node_modules/app-dep/main.js", "src/index.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> lib@2.0.0"))
        .stdout(predicate::str::contains("physical location"))
        .stdout(predicate::str::contains("=> <top-level>"));
}

#[test]
fn locate_outside_project_has_no_owner() {
    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["locate", "--graph", "graph.json", "/definitely/elsewhere.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no owning package)"));
}

#[test]
fn ls_lists_instances() {
    let dir = project();
    let root = dir.path();
    pnpgen(root)
        .args(["ls", "--graph", "graph.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("react@18.2.0"))
        .stdout(predicate::str::contains("app-dep@pnp:"))
        .stdout(predicate::str::contains("lib => 2.0.0"));
}

#[test]
fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    pnpgen(dir.path())
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no package.json"));
}
