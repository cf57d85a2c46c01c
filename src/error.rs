use thiserror::Error;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Conditions that abort a build outright. Everything else that goes wrong
/// while resolving a single pattern is logged and the branch is omitted.
#[derive(Debug, Error)]
pub enum PnpError {
    #[error("internal consistency violation: no precomputed {what} for '{name}' in this scope")]
    InternalConsistency { what: &'static str, name: String },

    #[error("failed to create alias {alias} -> {target}: {reason}")]
    Alias { alias: String, target: String, reason: String },

    #[error("template does not contain the substitution marker {marker}")]
    MissingTemplateMarker { marker: String },

    #[error("{path} is the physical location of a peer-dependent package; it must be accessed through its virtual location")]
    BlacklistedLocation { path: String },
}
