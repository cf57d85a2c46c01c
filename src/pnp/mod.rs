//! Flattened package store and the lookup structures derived from it.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub mod builder;
pub mod hash;
pub mod locations;
pub mod lookup;

pub use builder::{ScopeBindings, StoreBuilder};
pub use locations::{IndexEntry, LocationIndex};
pub use lookup::{LengthPlan, PrefixMatcher};

/// Identifies one package instance. The project itself is `(None, None)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageLocator {
    pub name: Option<String>,
    pub reference: Option<String>,
}

impl PackageLocator {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self { name: Some(name.into()), reference: Some(reference.into()) }
    }

    pub fn top_level() -> Self {
        Self { name: None, reference: None }
    }

    pub fn is_top_level(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for PackageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.reference) {
            (Some(name), Some(reference)) => write!(f, "{name}@{reference}"),
            (Some(name), None) => write!(f, "{name}"),
            _ => write!(f, "<top-level>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInformation {
    /// Always terminated by the platform separator.
    pub package_location: String,
    pub package_main_entry: Option<String>,
    /// dependency name -> reference
    pub package_dependencies: BTreeMap<String, String>,
}

pub type PackageInformationStore = BTreeMap<Option<String>, PackageInformation>;
pub type PackageInformationStores = BTreeMap<Option<String>, PackageInformationStore>;

/// Deduplicating identity map from locator to package information.
/// Entries are only ever added during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageStore {
    stores: PackageInformationStores,
    blacklisted: BTreeSet<String>,
}

impl PackageStore {
    pub fn get(&self, locator: &PackageLocator) -> Option<&PackageInformation> {
        self.stores.get(&locator.name)?.get(&locator.reference)
    }

    pub fn contains(&self, locator: &PackageLocator) -> bool {
        self.get(locator).is_some()
    }

    pub fn top_level(&self) -> Option<&PackageInformation> {
        self.get(&PackageLocator::top_level())
    }

    /// First writer wins: returns `false` and leaves the store untouched when
    /// the locator is already present.
    pub(crate) fn insert(&mut self, locator: PackageLocator, info: PackageInformation) -> bool {
        let store = self.stores.entry(locator.name).or_default();
        if store.contains_key(&locator.reference) {
            return false;
        }
        store.insert(locator.reference, info);
        true
    }

    pub(crate) fn get_mut(&mut self, locator: &PackageLocator) -> Option<&mut PackageInformation> {
        self.stores.get_mut(&locator.name)?.get_mut(&locator.reference)
    }

    pub(crate) fn blacklist(&mut self, physical_location: String) {
        self.blacklisted.insert(physical_location);
    }

    pub fn stores(&self) -> &PackageInformationStores {
        &self.stores
    }

    /// Real locations of virtualized packages, which must not identify them.
    pub fn blacklisted(&self) -> &BTreeSet<String> {
        &self.blacklisted
    }

    /// Every instance in store order (top-level first, then by name and reference).
    pub fn iter(&self) -> impl Iterator<Item = (PackageLocator, &PackageInformation)> + '_ {
        self.stores.iter().flat_map(|(name, store)| {
            store.iter().map(move |(reference, info)| {
                (PackageLocator { name: name.clone(), reference: reference.clone() }, info)
            })
        })
    }

    /// Instances recorded for one package name.
    pub fn instances_of(&self, name: &str) -> Vec<(&str, &PackageInformation)> {
        self.stores
            .get(&Some(name.to_string()))
            .map(|store| {
                store.iter().filter_map(|(r, info)| r.as_deref().map(|r| (r, info))).collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.stores.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
