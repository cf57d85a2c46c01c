//! JavaScript literal encoding. Every string reaching the generated file goes
//! through [`js_string`].

use crate::pnp::PackageLocator;

/// A double-quoted JavaScript string literal that evaluates to exactly `value`.
///
/// JSON string syntax is a subset of JavaScript's except for the raw line and
/// paragraph separators, which older engines reject inside literals.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

pub fn js_optional_string(value: Option<&str>) -> String {
    value.map(js_string).unwrap_or_else(|| "null".to_string())
}

pub fn js_locator(locator: &PackageLocator) -> String {
    format!(
        "{{name: {}, reference: {}}}",
        js_optional_string(locator.name.as_deref()),
        js_optional_string(locator.reference.as_deref())
    )
}
