//! URI-reference handling.
//!
//! References resolve per RFC 3986: an absolute reference replaces the
//! base, a relative reference joins against it, and the fragment selects
//! within the target document. The registry addresses documents by their
//! fragmentless URI.

use url::Url;

use crate::error::ResolveError;

/// Strip a single trailing empty fragment from a URI.
///
/// Identifiers from the draft-07 era conventionally end in `#`; the
/// registry stores and looks up the fragmentless form.
pub(crate) fn trim_empty_fragment(uri: &str) -> &str {
    uri.strip_suffix('#').unwrap_or(uri)
}

/// Split a reference at its first `#` into a fragmentless part and the
/// fragment (without the `#`).
pub(crate) fn split_fragment(reference: &str) -> (&str, Option<&str>) {
    match reference.find('#') {
        Some(idx) => (&reference[..idx], Some(&reference[idx + 1..])),
        None => (reference, None),
    }
}

/// Resolve a fragmentless URI reference against a base URI.
///
/// # Errors
///
/// `InvalidBaseUri` when a relative reference needs a base that does not
/// parse as an absolute URI, and `UnresolvableReference` when the join
/// itself is impossible (e.g. a relative reference against a
/// non-hierarchical base such as a URN).
pub(crate) fn resolve_against(base: &str, reference: &str) -> Result<String, ResolveError> {
    if reference.is_empty() {
        return Ok(trim_empty_fragment(base).to_string());
    }
    // An absolute reference replaces the base outright.
    if let Ok(absolute) = Url::parse(reference) {
        return Ok(trim_empty_fragment(absolute.as_str()).to_string());
    }
    let base_url = Url::parse(trim_empty_fragment(base)).map_err(|source| {
        ResolveError::InvalidBaseUri {
            uri: base.to_string(),
            source,
        }
    })?;
    let joined = base_url
        .join(reference)
        .map_err(|_| ResolveError::UnresolvableReference {
            reference: reference.to_string(),
        })?;
    Ok(trim_empty_fragment(joined.as_str()).to_string())
}
