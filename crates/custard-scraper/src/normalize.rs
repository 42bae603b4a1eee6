use custard_core::FlavorRecord;

use crate::markup::collapse_whitespace;
use crate::types::RawFlavor;

/// Build a [`FlavorRecord`] from raw extractor output.
///
/// Text fields are whitespace-collapsed. A missing flavor or description
/// becomes the empty string; a blank URL becomes `None`. Whether an empty
/// flavor is worth emitting is the extractor's call.
#[must_use]
pub fn normalize_flavor(raw: RawFlavor) -> FlavorRecord {
    let flavor = raw
        .flavor
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();
    let description = raw
        .description
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();
    let url = raw
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    FlavorRecord::new(
        collapse_whitespace(&raw.location),
        flavor,
        description,
        raw.date,
        url,
    )
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
