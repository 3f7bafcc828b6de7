//! Dialect detection.
//!
//! Documents declare the dialect they were authored against through an
//! identifier URI, conventionally the value of their `$schema` keyword.
//! This module maps identifier URIs to [`Specification`]s, both through
//! the fixed built-in table and through a configurable [`Detector`] for
//! embedders that register additional dialects, change the declaring
//! keyword, or fall back to a default.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::DialectError;
use crate::specification::Specification;
use crate::uri;

/// The keyword a document conventionally declares its dialect with.
pub const DIALECT_KEYWORD: &str = "$schema";

/// Built-in dialect identifiers.
///
/// Each draft is reachable under both URI schemes; matching strips one
/// trailing empty fragment, so the historical `...#` forms work too.
const DIALECT_IDS: &[(&str, Specification)] = &[
    ("https://json-schema.org/draft/2020-12/schema", Specification::Draft202012),
    ("http://json-schema.org/draft/2020-12/schema", Specification::Draft202012),
    ("https://json-schema.org/draft/2019-09/schema", Specification::Draft201909),
    ("http://json-schema.org/draft/2019-09/schema", Specification::Draft201909),
    ("https://json-schema.org/draft-07/schema", Specification::Draft7),
    ("http://json-schema.org/draft-07/schema", Specification::Draft7),
    ("https://json-schema.org/draft-06/schema", Specification::Draft6),
    ("http://json-schema.org/draft-06/schema", Specification::Draft6),
    ("https://json-schema.org/draft-04/schema", Specification::Draft4),
    ("http://json-schema.org/draft-04/schema", Specification::Draft4),
    ("https://json-schema.org/draft-03/schema", Specification::Draft3),
    ("http://json-schema.org/draft-03/schema", Specification::Draft3),
];

fn builtin(dialect_id: &str) -> Option<Specification> {
    DIALECT_IDS
        .iter()
        .find(|(id, _)| *id == dialect_id)
        .map(|(_, specification)| *specification)
}

/// The specification matching a dialect-identifier URI.
///
/// # Errors
///
/// `UnknownDialect`, carrying `dialect_id` verbatim, when no built-in
/// identifier matches.
pub fn specification_with(dialect_id: &str) -> Result<Specification, DialectError> {
    builtin(uri::trim_empty_fragment(dialect_id)).ok_or_else(|| DialectError::UnknownDialect {
        uri: dialect_id.to_string(),
    })
}

/// Like [`specification_with`], but return `default` for unknown
/// identifiers instead of failing.
pub fn specification_with_default(dialect_id: &str, default: Specification) -> Specification {
    builtin(uri::trim_empty_fragment(dialect_id)).unwrap_or(default)
}

/// Detect the dialect `contents` declare via [`DIALECT_KEYWORD`].
///
/// # Errors
///
/// `CannotDetermineDialect` when the keyword is absent (or not a
/// string), `UnknownDialect` when its value matches no built-in
/// identifier.
pub(crate) fn detect(contents: &Value) -> Result<Specification, DialectError> {
    match declared_dialect(contents, DIALECT_KEYWORD) {
        Some(dialect_id) => specification_with(dialect_id),
        None => Err(DialectError::CannotDetermineDialect),
    }
}

/// Detect as [`detect`] does, falling back to `default` when nothing is
/// declared or the declared identifier is unknown.
pub(crate) fn detect_with_default(contents: &Value, default: Specification) -> Specification {
    match declared_dialect(contents, DIALECT_KEYWORD) {
        Some(dialect_id) => specification_with_default(dialect_id, default),
        None => default,
    }
}

fn declared_dialect<'a>(contents: &'a Value, keyword: &str) -> Option<&'a str> {
    contents.as_object()?.get(keyword)?.as_str()
}

/// Configurable dialect detection.
///
/// The zero-configuration detector behaves like [`specification_with`]:
/// `$schema` keyword, built-in table, no default.
///
/// ```
/// use json_refs::{Detector, Specification};
/// use serde_json::json;
///
/// let detector = Detector::new()
///     .keyword("dialect")
///     .register("tag:example.com,2024:config", Specification::Draft202012)
///     .default_specification(Specification::Opaque);
///
/// let contents = json!({ "dialect": "tag:example.com,2024:config" });
/// assert_eq!(detector.detect(&contents), Ok(Specification::Draft202012));
///
/// let undeclared = json!({ "anything": "else" });
/// assert_eq!(detector.detect(&undeclared), Ok(Specification::Opaque));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Detector {
    keyword: Option<String>,
    default: Option<Specification>,
    registered: HashMap<String, Specification>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `keyword` instead of `$schema` as the dialect-declaring keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Return `default` instead of failing when detection comes up empty.
    pub fn default_specification(mut self, default: Specification) -> Self {
        self.default = Some(default);
        self
    }

    /// Map an additional dialect-identifier URI to a specification.
    ///
    /// Registered identifiers take precedence over the built-in table.
    pub fn register(
        mut self,
        dialect_id: impl Into<String>,
        specification: Specification,
    ) -> Self {
        let dialect_id = dialect_id.into();
        let key = uri::trim_empty_fragment(&dialect_id).to_string();
        self.registered.insert(key, specification);
        self
    }

    /// The specification for a dialect-identifier URI.
    ///
    /// # Errors
    ///
    /// `UnknownDialect` (carrying `dialect_id` verbatim) when neither
    /// the registered entries nor the built-in table match and no
    /// default is configured.
    pub fn specification_of(&self, dialect_id: &str) -> Result<Specification, DialectError> {
        let key = uri::trim_empty_fragment(dialect_id);
        if let Some(specification) = self.registered.get(key) {
            return Ok(*specification);
        }
        match builtin(key) {
            Some(specification) => Ok(specification),
            None => self.default.ok_or_else(|| DialectError::UnknownDialect {
                uri: dialect_id.to_string(),
            }),
        }
    }

    /// Detect the dialect `contents` declare.
    ///
    /// # Errors
    ///
    /// `CannotDetermineDialect` when the declaring keyword is absent and
    /// no default is configured; `UnknownDialect` as in
    /// [`specification_of`](Self::specification_of).
    pub fn detect(&self, contents: &Value) -> Result<Specification, DialectError> {
        let keyword = self.keyword.as_deref().unwrap_or(DIALECT_KEYWORD);
        match declared_dialect(contents, keyword) {
            Some(dialect_id) => self.specification_of(dialect_id),
            None => self.default.ok_or(DialectError::CannotDetermineDialect),
        }
    }
}
