use super::{PackageLocator, PackageStore};
use log::warn;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    Package(PackageLocator),
    /// Physical location of a virtualized package.
    Blacklisted,
}

/// Reverse map from normalized package location to the instance living there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl LocationIndex {
    pub fn from_store(store: &PackageStore) -> Self {
        let mut entries = BTreeMap::new();
        for (locator, info) in store.iter() {
            if let Some(existing) = entries.get(&info.package_location) {
                warn!(
                    "{} shares location {} with {:?}; keeping the first",
                    locator, info.package_location, existing
                );
                continue;
            }
            entries.insert(info.package_location.clone(), IndexEntry::Package(locator));
        }
        for location in store.blacklisted() {
            entries.entry(location.clone()).or_insert(IndexEntry::Blacklisted);
        }
        Self { entries }
    }

    pub fn get(&self, location: &str) -> Option<&IndexEntry> {
        self.entries.get(location)
    }

    /// The locator registered at exactly `location`, if any.
    pub fn locator(&self, location: &str) -> Option<&PackageLocator> {
        match self.entries.get(location)? {
            IndexEntry::Package(locator) => Some(locator),
            IndexEntry::Blacklisted => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.entries.iter().map(|(location, entry)| (location.as_str(), entry))
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
