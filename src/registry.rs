//! An immutable URI-to-resource store with lazily crawled anchor indexes.
//!
//! Every mutating operation returns a new `Registry` value; the receiver
//! is never altered, so held registries stay valid and safe to share
//! across threads. Clones share resource contents through reference
//! counting, keeping derivation cheap.
//!
//! Crawling (anchor and subresource discovery) is deferred until an
//! anchor or an identified subresource is actually needed, then memoized
//! in the registry value returned by the triggering call.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{CombineError, DialectError, ResolveError};
use crate::resolver::Resolver;
use crate::resource::{Anchor, Resource};
use crate::retrieve::Retrieve;
use crate::uri;

/// A value obtained from a registry, paired with the registry that now
/// caches whatever work produced it.
///
/// Callers continue with the returned registry; the one they asked is
/// unchanged.
#[derive(Debug, Clone)]
pub struct Retrieved<T> {
    pub value: T,
    pub registry: Registry,
}

/// An immutable mapping from URI to [`Resource`].
#[derive(Clone, Default)]
pub struct Registry {
    resources: HashMap<String, Resource>,
    anchors: HashMap<String, HashMap<String, Anchor>>,
    uncrawled: HashSet<String>,
    retrieve: Option<Arc<dyn Retrieve>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that consults `retrieve` for URIs it has no entry for.
    ///
    /// Retrieved resources are cached in the registry value returned by
    /// the lookup that fetched them.
    pub fn with_retrieve(&self, retrieve: impl Retrieve + 'static) -> Registry {
        let mut next = self.clone();
        next.retrieve = Some(Arc::new(retrieve));
        next
    }

    /// A registry with `resource` stored at `uri`.
    ///
    /// An existing entry at `uri` is replaced in the result; the
    /// receiving registry is unaffected.
    pub fn with_resource(&self, uri: impl Into<String>, resource: Resource) -> Registry {
        let mut next = self.clone();
        next.insert(uri.into(), resource);
        next
    }

    /// A registry with every `(uri, resource)` pair stored. Later pairs
    /// win over earlier ones at the same URI.
    pub fn with_resources<I, U>(&self, pairs: I) -> Registry
    where
        I: IntoIterator<Item = (U, Resource)>,
        U: Into<String>,
    {
        let mut next = self.clone();
        for (uri, resource) in pairs {
            next.insert(uri.into(), resource);
        }
        next
    }

    /// A registry with each document stored under its URI, detecting
    /// every document's dialect from its contents.
    ///
    /// # Errors
    ///
    /// Whatever [`Resource::from_contents`] raises, for the first
    /// offending document.
    pub fn with_contents<I, U>(&self, pairs: I) -> Result<Registry, DialectError>
    where
        I: IntoIterator<Item = (U, Value)>,
        U: Into<String>,
    {
        let mut next = self.clone();
        for (uri, contents) in pairs {
            let resource = Resource::from_contents(contents)?;
            next.insert(uri.into(), resource);
        }
        Ok(next)
    }

    /// The resource stored at `uri`, if any. Never invokes retrieval.
    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri::trim_empty_fragment(uri))
    }

    /// The contents stored at `uri`, if any.
    pub fn contents(&self, uri: &str) -> Option<&Value> {
        self.resource(uri).map(Resource::contents)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over `(uri, resource)` entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources
            .iter()
            .map(|(uri, resource)| (uri.as_str(), resource))
    }

    /// The resource at `uri`, falling back to the retrieval policy for
    /// unregistered URIs.
    ///
    /// A crawl is attempted first: the URI may name an identified
    /// subresource not yet discovered.
    ///
    /// # Errors
    ///
    /// `Unretrievable` when no entry exists and no policy is configured
    /// or the policy fails.
    pub fn get_or_retrieve(&self, uri: &str) -> Result<Retrieved<Resource>, ResolveError> {
        let key = uri::trim_empty_fragment(uri);
        if let Some(resource) = self.resources.get(key) {
            return Ok(Retrieved {
                value: resource.clone(),
                registry: self.clone(),
            });
        }
        let registry = self.ensure_crawled()?;
        if let Some(resource) = registry.resources.get(key) {
            let value = resource.clone();
            return Ok(Retrieved { value, registry });
        }
        let Some(retrieve) = registry.retrieve.clone() else {
            return Err(ResolveError::Unretrievable {
                uri: key.to_string(),
                source: None,
            });
        };
        match retrieve.retrieve(key) {
            Ok(resource) => {
                let registry = registry.with_resource(key, resource.clone());
                Ok(Retrieved {
                    value: resource,
                    registry,
                })
            }
            Err(source) => Err(ResolveError::Unretrievable {
                uri: key.to_string(),
                source: Some(source),
            }),
        }
    }

    /// The anchor named `name` within the resource at `uri`, crawling
    /// on first need.
    ///
    /// # Errors
    ///
    /// `NoSuchAnchor` when crawling discovers no such anchor.
    pub fn anchor(&self, uri: &str, name: &str) -> Result<Retrieved<Anchor>, ResolveError> {
        let key = uri::trim_empty_fragment(uri);
        if let Some(anchor) = self.anchors.get(key).and_then(|anchors| anchors.get(name)) {
            return Ok(Retrieved {
                value: anchor.clone(),
                registry: self.clone(),
            });
        }
        if !self.uncrawled.is_empty() {
            let registry = self.crawl()?;
            if let Some(anchor) = registry.anchors.get(key).and_then(|anchors| anchors.get(name)) {
                let value = anchor.clone();
                return Ok(Retrieved { value, registry });
            }
        }
        Err(ResolveError::NoSuchAnchor {
            uri: key.to_string(),
            anchor: name.to_string(),
        })
    }

    /// All anchors reachable in the resource at `uri`, keyed by name.
    ///
    /// # Errors
    ///
    /// `Unretrievable` when no resource exists at `uri` even after
    /// crawling.
    pub fn anchors_of(
        &self,
        uri: &str,
    ) -> Result<Retrieved<HashMap<String, Anchor>>, ResolveError> {
        let key = uri::trim_empty_fragment(uri);
        let registry = self.ensure_crawled()?;
        if !registry.resources.contains_key(key) {
            return Err(ResolveError::Unretrievable {
                uri: key.to_string(),
                source: None,
            });
        }
        let value = registry.anchors.get(key).cloned().unwrap_or_default();
        Ok(Retrieved { value, registry })
    }

    /// A registry in which everything inserted so far has been crawled:
    /// anchors indexed and identified subresources registered under
    /// their own URIs.
    ///
    /// Lookups crawl on demand; calling this eagerly is only useful to
    /// front-load the work.
    ///
    /// # Errors
    ///
    /// URI-resolution errors while joining a subresource's identifier
    /// against its base.
    pub fn crawl(&self) -> Result<Registry, ResolveError> {
        let mut next = self.clone();
        let mut stack: Vec<(String, Resource)> = next
            .uncrawled
            .iter()
            .filter_map(|uri| {
                next.resources
                    .get(uri)
                    .map(|resource| (uri.clone(), resource.clone()))
            })
            .collect();
        next.uncrawled.clear();
        while let Some((mut base, resource)) = stack.pop() {
            if let Some(id) = resource.id() {
                let joined = uri::resolve_against(&base, id)?;
                next.resources.insert(joined.clone(), resource.clone());
                base = joined;
            }
            let anchors = next.anchors.entry(base.clone()).or_default();
            for anchor in resource.anchors() {
                anchors.insert(anchor.name().to_string(), anchor);
            }
            for subresource in resource.subresources() {
                stack.push((base.clone(), subresource));
            }
        }
        Ok(next)
    }

    /// Merge the entries of `other` into this registry.
    ///
    /// # Errors
    ///
    /// `Collision` when both registries hold differing resources at the
    /// same URI. Equal resources merge to a single entry.
    pub fn combine(&self, other: &Registry) -> Result<Registry, CombineError> {
        let mut next = self.clone();
        for (uri, resource) in &other.resources {
            match next.resources.get(uri) {
                Some(existing) if existing == resource => {}
                Some(_) => {
                    return Err(CombineError::Collision { uri: uri.clone() });
                }
                None => {
                    next.resources.insert(uri.clone(), resource.clone());
                    if other.uncrawled.contains(uri) {
                        next.uncrawled.insert(uri.clone());
                    }
                }
            }
        }
        for (uri, anchors) in &other.anchors {
            let entry = next.anchors.entry(uri.clone()).or_default();
            for (name, anchor) in anchors {
                entry.entry(name.clone()).or_insert_with(|| anchor.clone());
            }
        }
        if next.retrieve.is_none() {
            next.retrieve = other.retrieve.clone();
        }
        Ok(next)
    }

    /// A resolver bound to this registry, rooted at `base_uri`.
    pub fn resolver(&self, base_uri: impl Into<String>) -> Resolver {
        Resolver::new(self.clone(), base_uri.into())
    }

    /// A resolver rooted at a resource that need not be registered yet:
    /// the resource is stored under its own identifier (or the empty
    /// base) in the resolver's registry.
    pub fn resolver_with_root(&self, resource: Resource) -> Resolver {
        let base_uri = resource.id().unwrap_or("").to_string();
        let registry = self.with_resource(base_uri.clone(), resource);
        Resolver::new(registry, base_uri)
    }

    pub(crate) fn ensure_crawled(&self) -> Result<Registry, ResolveError> {
        if self.uncrawled.is_empty() {
            Ok(self.clone())
        } else {
            self.crawl()
        }
    }

    pub(crate) fn dynamic_anchor_in(&self, uri: &str, name: &str) -> Option<&Anchor> {
        self.anchors
            .get(uri)
            .and_then(|anchors| anchors.get(name))
            .filter(|anchor| anchor.is_dynamic())
    }

    fn insert(&mut self, uri: String, resource: Resource) {
        let key = uri::trim_empty_fragment(&uri).to_string();
        // a replaced entry's crawled anchors would be stale
        self.anchors.remove(&key);
        self.uncrawled.insert(key.clone());
        self.resources.insert(key, resource);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("resources", &self.resources)
            .field("uncrawled", &self.uncrawled)
            .finish_non_exhaustive()
    }
}
