use sha1::{Digest, Sha1};

pub const VIRTUAL_PREFIX: &str = "pnp:";

/// Digest identifying a peer-dependent instance by where it sits in the graph.
///
/// Every token is followed by a NUL byte so `("ab", "c")` and `("a", "bc")`
/// hash differently.
pub fn virtual_digest(ancestry: &[(String, String)], name: &str, version: &str) -> String {
    let mut hasher = Sha1::new();
    let mut feed = |token: &str| {
        hasher.update(token.as_bytes());
        hasher.update([0u8]);
    };
    for (ancestor, reference) in ancestry {
        feed(ancestor);
        feed(reference);
    }
    feed(name);
    feed(version);
    hex::encode(hasher.finalize())
}

pub fn virtual_reference(digest: &str) -> String {
    format!("{VIRTUAL_PREFIX}{digest}")
}

pub fn is_virtual_reference(reference: &str) -> bool {
    reference.starts_with(VIRTUAL_PREFIX)
}
