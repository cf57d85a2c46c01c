use crate::resolver::cache::cache_package_path;
use crate::resolver::{canonicalize_npm_range, CacheResolver, GraphResolver, Pattern, Resolver, VersionRange};
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use semver::{Version, VersionReq};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;

#[test]
fn test_basic_wildcards() {
    assert_eq!(canonicalize_npm_range("*"), "*");
    assert_eq!(canonicalize_npm_range("latest"), "*");
    assert_eq!(canonicalize_npm_range("1.x"), ">=1.0.0, <2.0.0");
    assert_eq!(canonicalize_npm_range("1.2.x"), ">=1.2.0, <1.3.0");
    assert_eq!(canonicalize_npm_range("1"), ">=1.0.0, <2.0.0");
    assert_eq!(canonicalize_npm_range("1.2"), ">=1.2.0, <1.3.0");
}

#[test]
fn test_exact_and_hyphen() {
    assert_eq!(canonicalize_npm_range("1.2.3"), "=1.2.3");
    assert_eq!(canonicalize_npm_range("1.2.3 - 2.3.4"), ">=1.2.3, <=2.3.4");
}

#[test]
fn test_spaced_comparators() {
    assert_eq!(canonicalize_npm_range(">= 2.1.2 < 3.0.0"), ">=2.1.2, <3.0.0");
    let out = canonicalize_npm_range("^3.1.0 <4");
    assert_eq!(out, "^3.1.0, <4");
    assert!(VersionReq::parse(&out).is_ok());
}

#[test]
fn canonicalize_leaves_single_comparator() {
    let out = canonicalize_npm_range("^2.0.0");
    assert_eq!(out, "^2.0.0");
    assert!(VersionReq::parse(&out).is_ok());
}

#[test]
fn range_picks_highest_match_across_union() {
    let candidates: BTreeMap<Version, &str> = ["1.5.0", "2.1.0", "3.0.0"]
        .into_iter()
        .map(|v| (Version::parse(v).unwrap(), v))
        .collect();
    let range = VersionRange::parse("^1.0.0 || ^2.0.0").unwrap();
    assert_eq!(range.pick(&candidates).map(|(_, v)| *v), Some("2.1.0"));
    assert!(VersionRange::parse("^9").unwrap().pick(&candidates).is_none());
    assert!(VersionRange::parse("not a range").is_err());
}

#[test]
fn parses_patterns() {
    let scoped = Pattern::parse("@types/node@^20.1.0").unwrap();
    assert_eq!(scoped.name, "@types/node");
    assert_eq!(scoped.range, "^20.1.0");
    assert_eq!(scoped.to_string(), "@types/node@^20.1.0");

    let bare = Pattern::parse("lodash").unwrap();
    assert_eq!(bare, Pattern::new("lodash", "*"));

    let alias = Pattern::parse("pad@npm:left-pad@1.3.0").unwrap();
    assert_eq!(alias.name, "pad");
    assert_eq!(alias.alias_target(), Some(Pattern::new("left-pad", "1.3.0")));

    for invalid in ["", "@scope", "a/b@1", "@scope/a/b@1", "has space@1"] {
        assert!(Pattern::parse(invalid).is_none(), "{invalid:?} should not parse");
    }
}

#[test]
fn pattern_serializes_as_text() {
    let patterns: Vec<Pattern> = serde_json::from_value(json!(["a@1", "@s/b"])).unwrap();
    assert_eq!(patterns, vec![Pattern::new("a", "1"), Pattern::new("@s/b", "*")]);
    assert_eq!(serde_json::to_value(&patterns).unwrap(), json!(["a@1", "@s/b@*"]));
    assert!(serde_json::from_value::<Pattern>(json!("")).is_err());
}

fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
    (dir, path)
}

fn seed_cached_package(root: &Utf8Path, name: &str, version: &str, manifest: Value) {
    let dir = cache_package_path(root, name, version);
    fs::create_dir_all(&dir).expect("create cached package dir");
    fs::write(dir.join("package.json"), manifest.to_string()).expect("write cached manifest");
}

#[test]
fn cache_resolver_picks_highest_cached_version() -> Result<()> {
    let (_dir, root) = utf8_tempdir();
    seed_cached_package(&root, "left-pad", "1.0.0", json!({ "name": "left-pad", "version": "1.0.0" }));
    seed_cached_package(
        &root,
        "left-pad",
        "1.3.0",
        json!({ "name": "left-pad", "version": "1.3.0", "main": "index.js" }),
    );
    seed_cached_package(&root, "left-pad", "2.0.0", json!({ "name": "left-pad", "version": "2.0.0" }));

    let resolver = CacheResolver::open(&root)?;
    let versions: Vec<String> = resolver.cached_versions("left-pad").iter().map(|v| v.to_string()).collect();
    assert_eq!(versions, vec!["2.0.0", "1.3.0", "1.0.0"]);

    let descriptor = resolver.resolve_strict(&Pattern::new("left-pad", "^1.0.0"))?;
    assert_eq!(descriptor.version, "1.3.0");
    assert_eq!(descriptor.main.as_deref(), Some("index.js"));
    assert_eq!(descriptor.location, Some(cache_package_path(&root, "left-pad", "1.3.0")));

    let aliased = resolver.resolve_strict(&Pattern::new("pad", "npm:left-pad@1.0.0"))?;
    assert_eq!(aliased.name, "pad");
    assert_eq!(aliased.version, "1.0.0");

    assert!(resolver.resolve_strict(&Pattern::new("left-pad", "^3")).is_err());
    assert!(resolver.resolve_strict(&Pattern::new("right-pad", "*")).is_err());
    Ok(())
}

#[test]
fn cache_resolver_reads_scoped_dependencies_and_peers() -> Result<()> {
    let (_dir, root) = utf8_tempdir();
    seed_cached_package(
        &root,
        "@scope/util",
        "2.0.0",
        json!({
            "name": "@scope/util",
            "version": "2.0.0",
            "dependencies": { "left-pad": "^1.0.0", "chalk": "^5" },
            "optionalDependencies": { "fsevents": "^2", "chalk": "^5" },
            "peerDependencies": { "react": ">=17" }
        }),
    );
    // junk next to real packages is ignored
    fs::create_dir_all(root.join("pkgs/not-a-version/package"))?;
    fs::write(root.join("pkgs/not-a-version/package/package.json"), "{}")?;

    let resolver = CacheResolver::open(&root)?;
    let descriptor = resolver.resolve_strict(&Pattern::new("@scope/util", "2"))?;
    assert_eq!(
        descriptor.dependencies,
        vec![
            Pattern::new("chalk", "^5"),
            Pattern::new("left-pad", "^1.0.0"),
            Pattern::new("fsevents", "^2"),
        ]
    );
    assert!(descriptor.is_peer("react"));
    assert!(descriptor.has_peers());
    Ok(())
}

#[test]
fn missing_cache_resolves_nothing() -> Result<()> {
    let (_dir, root) = utf8_tempdir();
    let resolver = CacheResolver::open(&root.join("absent"))?;
    assert!(resolver.resolve_strict(&Pattern::new("a", "*")).is_err());
    Ok(())
}

#[test]
fn graph_resolver_loads_yaml_with_relative_locations() -> Result<()> {
    let (_dir, root) = utf8_tempdir();
    let path = root.join("graph.yaml");
    fs::write(
        &path,
        "packages:\n  \"a@^1\":\n    name: a\n    version: 1.2.0\n    location: vendor/a\n    dependencies:\n      - \"b@2\"\n    peerDependencies:\n      react: \"*\"\n",
    )?;
    let resolver = GraphResolver::load(&path)?;
    assert_eq!(resolver.len(), 1);

    let descriptor = resolver.resolve_strict(&Pattern::new("a", "^1"))?;
    assert_eq!(descriptor.location, Some(root.join("vendor/a")));
    assert_eq!(descriptor.dependencies, vec![Pattern::new("b", "2")]);
    assert!(descriptor.is_peer("react"));
    assert!(resolver.resolve_strict(&Pattern::new("a", "^2")).is_err());
    Ok(())
}

#[test]
fn graph_resolver_rejects_bad_patterns() {
    let err = GraphResolver::from_value(json!({
        "packages": { "a@1": { "name": "a", "version": "1.0.0", "dependencies": ["@bad"] } }
    }));
    assert!(err.is_err());
}
