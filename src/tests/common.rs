use crate::linker::PlannedLinker;
use crate::pnp::{LocationIndex, PackageStore, StoreBuilder};
use crate::resolver::{GraphResolver, Pattern};
use camino::Utf8Path;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Points the platform data directory at a temporary sandbox for the guard's lifetime.
pub struct DataHomeGuard {
    _lock: MutexGuard<'static, ()>,
    pub temp: tempfile::TempDir,
    prev_xdg: Option<OsString>,
    prev_home: Option<OsString>,
}

impl DataHomeGuard {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let lock = lock_env();
        let temp = tempfile::tempdir().expect("create test tempdir");
        let data_home = temp.path().join("data-home");
        std::fs::create_dir_all(&data_home).expect("create data-home dir");

        let prev_xdg = env::var_os("XDG_DATA_HOME");
        env::set_var("XDG_DATA_HOME", data_home.as_os_str());

        let prev_home = env::var_os("HOME");
        env::set_var("HOME", temp.path());

        Self { _lock: lock, temp, prev_xdg, prev_home }
    }
}

impl Drop for DataHomeGuard {
    fn drop(&mut self) {
        restore_env("XDG_DATA_HOME", &self.prev_xdg);
        restore_env("HOME", &self.prev_home);
    }
}

fn restore_env(key: &str, previous: &Option<OsString>) {
    match previous {
        Some(val) => env::set_var(key, val),
        None => env::remove_var(key),
    }
}

pub const PROJECT: &str = "/proj";
pub const EXTERNALS: &str = "/proj/.pnp/externals";

pub fn graph(packages: Value) -> GraphResolver {
    GraphResolver::from_value(serde_json::json!({ "packages": packages })).expect("valid graph fixture")
}

pub fn seeds(raw: &[&str]) -> Vec<Pattern> {
    raw.iter().map(|p| Pattern::parse(p).expect("valid seed pattern")).collect()
}

/// Build against fake absolute locations; nothing touches the disk.
pub fn build_planned(resolver: &GraphResolver, seed: &[&str]) -> (PackageStore, PlannedLinker) {
    let linker = PlannedLinker::new(EXTERNALS);
    let store = StoreBuilder::new(resolver, &linker)
        .build(Utf8Path::new(PROJECT), &seeds(seed))
        .expect("store builds");
    (store, linker)
}

pub fn build_index(resolver: &GraphResolver, seed: &[&str]) -> (PackageStore, LocationIndex) {
    let (store, _) = build_planned(resolver, seed);
    let index = LocationIndex::from_store(&store);
    (store, index)
}

/// The `root-dep -> lib` project used across the store, index and emitter tests.
pub fn root_dep_graph() -> GraphResolver {
    graph(serde_json::json!({
        "root-dep@^1.0.0": {
            "name": "root-dep",
            "version": "1.0.0",
            "main": "main.js",
            "location": "/proj/node_modules/root-dep",
            "dependencies": ["lib@^2.0.0"]
        },
        "lib@^2.0.0": {
            "name": "lib",
            "version": "2.0.0",
            "location": "/proj/node_modules/lib"
        }
    }))
}
