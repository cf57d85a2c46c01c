use super::hash::{virtual_digest, virtual_reference, VIRTUAL_PREFIX};
use super::{PackageInformation, PackageLocator, PackageStore};
use crate::error::{PnpError, Result};
use crate::fsutil::normalize_location;
use crate::linker::AliasFs;
use crate::resolver::{PackageDescriptor, Pattern, Resolver};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// What each requested name resolved to within one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeBindings {
    /// name -> reference (version, or `pnp:<digest>` for virtual instances)
    pub references: BTreeMap<String, String>,
    /// name -> location the instance is recorded at
    pub locations: BTreeMap<String, Utf8PathBuf>,
}

/// A pattern that survived the first pass.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) descriptor: PackageDescriptor,
    pub(crate) reference: String,
    pub(crate) location: Utf8PathBuf,
    /// real location of a virtualized instance
    pub(crate) physical: Option<Utf8PathBuf>,
}

#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub(crate) bindings: ScopeBindings,
    pub(crate) resolved: Vec<Resolved>,
}

/// Walks the dependency graph depth-first and records every package instance
/// exactly once.
pub struct StoreBuilder<'a> {
    resolver: &'a dyn Resolver,
    linker: &'a dyn AliasFs,
}

impl<'a> StoreBuilder<'a> {
    pub fn new(resolver: &'a dyn Resolver, linker: &'a dyn AliasFs) -> Self {
        Self { resolver, linker }
    }

    /// Resolve the project's direct dependencies and record the project
    /// itself as the top-level instance.
    pub fn build(&self, project_root: &Utf8Path, seeds: &[Pattern]) -> Result<PackageStore> {
        let root = self.linker.canonicalize(project_root)?;
        let mut store = PackageStore::default();
        let dependencies = self.resolve(&mut store, seeds, &[], &BTreeMap::new())?;
        store.insert(
            PackageLocator::top_level(),
            PackageInformation {
                package_location: normalize_location(&root),
                package_main_entry: None,
                package_dependencies: dependencies,
            },
        );
        info!(
            "package store built: {} instances, {} virtual locations blacklisted",
            store.len(),
            store.blacklisted().len()
        );
        Ok(store)
    }

    /// Returns what each of `patterns` resolved to in this scope.
    pub fn resolve(
        &self,
        store: &mut PackageStore,
        patterns: &[Pattern],
        ancestry: &[(String, String)],
        inherited: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let scope = self.compute_scope_bindings(patterns, ancestry)?;
        self.build_instances(store, &scope, ancestry, inherited)?;
        Ok(scope.bindings.references)
    }

    /// First pass: resolve every pattern of the scope and fix its reference
    /// and location. Patterns are independent here, so they run in parallel;
    /// results are folded back in pattern order.
    fn compute_scope_bindings(&self, patterns: &[Pattern], ancestry: &[(String, String)]) -> Result<Scope> {
        let resolved = patterns
            .par_iter()
            .map(|pattern| self.precompute(pattern, ancestry))
            .collect::<Result<Vec<_>>>()?;

        let mut scope = Scope::default();
        for entry in resolved.into_iter().flatten() {
            let name = entry.descriptor.name.clone();
            if let Some(previous) = scope.bindings.references.insert(name.clone(), entry.reference.clone()) {
                debug!("{name}@{previous} rebound to {} in the same scope", entry.reference);
            }
            scope.bindings.locations.insert(name, entry.location.clone());
            scope.resolved.push(entry);
        }
        Ok(scope)
    }

    fn precompute(&self, pattern: &Pattern, ancestry: &[(String, String)]) -> Result<Option<Resolved>> {
        let descriptor = match self.resolver.resolve_strict(pattern) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                debug!("skipping unresolvable pattern {pattern}: {err:#}");
                return Ok(None);
            }
        };
        let Some(physical) = descriptor.location.clone() else {
            debug!("skipping {pattern}: {}@{} has no location", descriptor.name, descriptor.version);
            return Ok(None);
        };

        if !descriptor.has_peers() {
            return Ok(Some(Resolved {
                reference: descriptor.version.clone(),
                location: physical,
                physical: None,
                descriptor,
            }));
        }

        let digest = match enclosing_instance(ancestry, &descriptor.name, &descriptor.version) {
            Some(digest) => {
                debug!("{}@{} closes a cycle; binding to its ancestor instance", descriptor.name, descriptor.version);
                digest
            }
            None => virtual_digest(ancestry, &descriptor.name, &descriptor.version),
        };
        let alias = self.linker.create_alias(&physical, &digest, &descriptor.name)?;
        Ok(Some(Resolved {
            reference: virtual_reference(&digest),
            location: alias,
            physical: Some(physical),
            descriptor,
        }))
    }

    /// Second pass: insert each new instance before descending into it, so a
    /// cycle back to it stops at the existing entry.
    pub(crate) fn build_instances(
        &self,
        store: &mut PackageStore,
        scope: &Scope,
        ancestry: &[(String, String)],
        inherited: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut visible = inherited.clone();
        visible.extend(scope.bindings.references.iter().map(|(n, r)| (n.clone(), r.clone())));

        for entry in &scope.resolved {
            let name = &entry.descriptor.name;
            if !scope.bindings.references.contains_key(name) {
                return Err(PnpError::InternalConsistency { what: "reference", name: name.clone() }.into());
            }
            if !scope.bindings.locations.contains_key(name) {
                return Err(PnpError::InternalConsistency { what: "location", name: name.clone() }.into());
            }
            // the binding may belong to a later pattern of the same name
            let (reference, location) = (&entry.reference, &entry.location);

            let locator = PackageLocator::new(name, reference);
            let inserted = store.insert(
                locator.clone(),
                PackageInformation {
                    package_location: normalize_location(location),
                    package_main_entry: entry.descriptor.main.clone(),
                    package_dependencies: BTreeMap::new(),
                },
            );
            if !inserted {
                debug!("reusing {locator}");
                continue;
            }
            if let Some(physical) = &entry.physical {
                store.blacklist(normalize_location(physical));
            }

            let children: Vec<Pattern> = entry
                .descriptor
                .dependencies
                .iter()
                .filter(|dep| !entry.descriptor.is_peer(&dep.name))
                .cloned()
                .collect();
            let mut chain = ancestry.to_vec();
            chain.push((name.clone(), reference.clone()));
            let mut dependencies = self.resolve(store, &children, &chain, &visible)?;

            for peer in entry.descriptor.peer_dependencies.keys() {
                match visible.get(peer) {
                    Some(peer_reference) => {
                        dependencies.insert(peer.clone(), peer_reference.clone());
                    }
                    None => debug!("peer dependency {peer} of {locator} is not provided by its parent"),
                }
            }

            let info = store.get_mut(&locator).ok_or_else(|| PnpError::InternalConsistency {
                what: "store entry",
                name: locator.to_string(),
            })?;
            info.package_dependencies = dependencies;
        }
        Ok(())
    }
}

/// Digest of the nearest ancestor that is this same peer-dependent package.
/// Re-entering it through a cycle must reuse that instance, since a digest
/// over the longer chain would never match an existing entry.
fn enclosing_instance(ancestry: &[(String, String)], name: &str, version: &str) -> Option<String> {
    ancestry.iter().enumerate().rev().find_map(|(depth, (ancestor, reference))| {
        if ancestor != name {
            return None;
        }
        let digest = reference.strip_prefix(VIRTUAL_PREFIX)?;
        (virtual_digest(&ancestry[..depth], name, version) == digest).then(|| digest.to_string())
    })
}
