//! Documents paired with the specification that governs them.

use std::sync::Arc;

use serde_json::Value;

use crate::dialect;
use crate::error::{DialectError, ResolveError};
use crate::resolver::{Resolved, Resolver};
use crate::specification::Specification;
use crate::uri;

/// A document governed by a [`Specification`].
///
/// Contents are immutable once constructed; re-interpreting a document
/// under a different specification produces a new resource sharing the
/// same contents. Two resources are equal iff their contents and
/// specifications both are.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    contents: Arc<Value>,
    specification: Specification,
}

impl Resource {
    /// Pair contents with an explicitly chosen specification.
    pub fn new(contents: Value, specification: Specification) -> Self {
        Self {
            contents: Arc::new(contents),
            specification,
        }
    }

    /// Construct a resource by detecting the dialect its contents declare.
    ///
    /// # Errors
    ///
    /// `CannotDetermineDialect` when the contents declare nothing (a
    /// specification must then be chosen explicitly), `UnknownDialect`
    /// when the declared identifier matches no built-in dialect.
    pub fn from_contents(contents: Value) -> Result<Self, DialectError> {
        let specification = dialect::detect(&contents)?;
        Ok(Self::new(contents, specification))
    }

    /// Like [`from_contents`](Self::from_contents), but fall back to
    /// `default` when the contents declare nothing or declare an
    /// unknown identifier.
    pub fn from_contents_with_default(contents: Value, default: Specification) -> Self {
        let specification = dialect::detect_with_default(&contents, default);
        Self::new(contents, specification)
    }

    /// Treat arbitrary contents as plain data with no identifiers,
    /// anchors, or subresources.
    pub fn opaque(contents: Value) -> Self {
        Self::new(contents, Specification::Opaque)
    }

    pub fn contents(&self) -> &Value {
        &self.contents
    }

    pub fn specification(&self) -> Specification {
        self.specification
    }

    /// The URI this document claims for itself, if any, with a trailing
    /// empty fragment stripped.
    pub fn id(&self) -> Option<&str> {
        self.specification
            .id_of(&self.contents)
            .map(uri::trim_empty_fragment)
    }

    /// Anchors declared directly by this document (nested subresources
    /// declare their own).
    pub fn anchors(&self) -> Vec<Anchor> {
        self.specification.anchors_in(&self.contents)
    }

    /// The direct subresources of this document, governed by the same
    /// specification.
    pub fn subresources(&self) -> Vec<Resource> {
        self.specification
            .subresources_of(&self.contents)
            .into_iter()
            .map(|contents| self.specification.create_resource(contents))
            .collect()
    }

    /// Walk a JSON pointer from this document's root.
    ///
    /// Crossing into a subresource that declares its own identifier
    /// pushes that identifier onto the resolver's scope stack, so
    /// relative references inside the resolved contents resolve against
    /// the right base.
    ///
    /// # Errors
    ///
    /// `PointerToNowhere` when a segment names a missing key, an
    /// out-of-range index, or descends into a non-container.
    pub fn pointer(&self, pointer: &str, mut resolver: Resolver) -> Result<Resolved, ResolveError> {
        let mut contents: &Value = &self.contents;
        let mut segments: Vec<String> = Vec::new();
        for raw in pointer.split('/').skip(1) {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            let next = match contents {
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                Value::Object(map) => map.get(segment.as_str()),
                _ => None,
            };
            let Some(next) = next else {
                return Err(ResolveError::PointerToNowhere {
                    uri: resolver.base_uri().to_string(),
                    pointer: pointer.to_string(),
                });
            };
            contents = next;
            segments.push(segment);
            if self.specification.subresource_boundary(&segments, contents) {
                if let Some(id) = self.specification.id_of(contents) {
                    resolver = resolver.push_scope(uri::trim_empty_fragment(id))?;
                }
                segments.clear();
            }
        }
        Ok(Resolved::new(Arc::new(contents.clone()), resolver))
    }

    pub(crate) fn contents_arc(&self) -> Arc<Value> {
        Arc::clone(&self.contents)
    }
}

/// A named landmark inside a document, discoverable only by crawling.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    name: String,
    resource: Resource,
    dynamic: bool,
}

impl Anchor {
    /// A static anchor: resolvable only within its own document.
    pub fn new(name: impl Into<String>, resource: Resource) -> Self {
        Self {
            name: name.into(),
            resource,
            dynamic: false,
        }
    }

    /// A dynamic anchor: additionally resolvable through the dynamic
    /// scope of an in-progress resolution.
    pub fn new_dynamic(name: impl Into<String>, resource: Resource) -> Self {
        Self {
            name: name.into(),
            resource,
            dynamic: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The subdocument the anchor marks.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_contents_detects_declared_dialect() {
        let contents = json!({"$schema": "http://json-schema.org/draft-07/schema#"});
        let resource = Resource::from_contents(contents.clone()).unwrap();
        assert_eq!(resource, Resource::new(contents, Specification::Draft7));
    }

    #[test]
    fn from_contents_unknown_dialect() {
        let dialect_id = "http://example.com/unknown-json-schema-dialect-id";
        let err = Resource::from_contents(json!({"$schema": dialect_id})).unwrap_err();
        assert_eq!(err.uri(), Some(dialect_id));
    }

    #[test]
    fn from_contents_without_declaration_fails() {
        let err = Resource::from_contents(json!({"type": "object"})).unwrap_err();
        assert_eq!(err, DialectError::CannotDetermineDialect);
    }

    #[test]
    fn from_contents_with_default_falls_back() {
        let resource = Resource::from_contents_with_default(
            json!({"type": "object"}),
            Specification::Draft202012,
        );
        assert_eq!(resource.specification(), Specification::Draft202012);
    }

    #[test]
    fn declared_dialect_beats_the_default() {
        let resource = Resource::from_contents_with_default(
            json!({"$schema": "http://json-schema.org/draft-06/schema#"}),
            Specification::Draft202012,
        );
        assert_eq!(resource.specification(), Specification::Draft6);
    }

    #[test]
    fn opaque_resource() {
        let resource = Resource::opaque(json!({"$id": "http://example.com/a"}));
        assert_eq!(resource.specification(), Specification::Opaque);
        assert_eq!(resource.id(), None);
    }

    #[test]
    fn id_strips_trailing_empty_fragment() {
        let resource = Resource::new(
            json!({"$id": "http://example.com/a#"}),
            Specification::Draft202012,
        );
        assert_eq!(resource.id(), Some("http://example.com/a"));
    }

    #[test]
    fn equality_requires_matching_specification() {
        let contents = json!({"type": "object"});
        let a = Resource::new(contents.clone(), Specification::Draft202012);
        let b = Resource::new(contents.clone(), Specification::Draft202012);
        let c = Resource::new(contents, Specification::Draft7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn subresources_share_the_specification() {
        let resource = Resource::new(
            json!({"$defs": {"a": {"type": "string"}}}),
            Specification::Draft202012,
        );
        let subresources = resource.subresources();
        assert_eq!(subresources.len(), 1);
        assert_eq!(subresources[0].specification(), Specification::Draft202012);
        assert_eq!(subresources[0].contents(), &json!({"type": "string"}));
    }
}
