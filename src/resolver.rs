//! Reference resolution against a registry.
//!
//! A [`Resolver`] carries the current base URI, the dynamic-scope stack
//! of bases entered so far, and a handle to the registry being resolved
//! against. Every resolution step returns a new resolver reflecting any
//! newly cached retrievals and the scope where the resolved contents
//! live; shared resolvers are never mutated.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ResolveError;
use crate::registry::{Registry, Retrieved};
use crate::resource::Resource;
use crate::uri;

/// The outcome of one resolution step.
///
/// Carries the resolved contents together with the resolver to use for
/// references found *inside* those contents.
#[derive(Debug, Clone)]
pub struct Resolved {
    contents: Arc<Value>,
    resolver: Resolver,
}

impl Resolved {
    pub(crate) fn new(contents: Arc<Value>, resolver: Resolver) -> Self {
        Self { contents, resolver }
    }

    pub fn contents(&self) -> &Value {
        &self.contents
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn into_resolver(self) -> Resolver {
        self.resolver
    }
}

/// A traversal context bound to a [`Registry`].
#[derive(Debug, Clone)]
pub struct Resolver {
    base_uri: String,
    registry: Registry,
    previous: Vec<String>,
}

impl Resolver {
    pub(crate) fn new(registry: Registry, base_uri: String) -> Self {
        Self {
            base_uri: uri::trim_empty_fragment(&base_uri).to_string(),
            registry,
            previous: Vec::new(),
        }
    }

    /// The base URI relative references currently resolve against.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve a URI reference against the current base.
    ///
    /// A fragment-only reference stays within the current document; any
    /// other reference is joined against the base (absolute references
    /// replace it). A `/`-leading fragment is walked as a JSON pointer;
    /// any other non-empty fragment names an anchor.
    ///
    /// # Errors
    ///
    /// `Unretrievable` for target URIs the registry cannot produce,
    /// `PointerToNowhere` for unwalkable pointers, `NoSuchAnchor` for
    /// unmatched anchor names, and URI-resolution errors when the base
    /// cannot absorb the reference.
    pub fn lookup(&self, reference: &str) -> Result<Resolved, ResolveError> {
        let (uri_part, fragment) = uri::split_fragment(reference);
        let target = if uri_part.is_empty() {
            self.base_uri.clone()
        } else {
            uri::resolve_against(&self.base_uri, uri_part)?
        };
        let retrieved = self.registry.get_or_retrieve(&target)?;
        let fragment = fragment.unwrap_or("");

        if fragment.starts_with('/') {
            let resolver = self.evolve(retrieved.registry, target);
            return retrieved.value.pointer(fragment, resolver);
        }

        if !fragment.is_empty() {
            let Retrieved {
                value: anchor,
                registry,
            } = retrieved.registry.anchor(&target, fragment)?;
            let contents = anchor.resource().contents_arc();
            let resolver = self.evolve(registry, target);
            return Ok(Resolved::new(contents, resolver));
        }

        let contents = retrieved.value.contents_arc();
        let resolver = self.evolve(retrieved.registry, target);
        Ok(Resolved::new(contents, resolver))
    }

    /// Resolve a dynamic anchor against the dynamic scope.
    ///
    /// Walks the scope stack from outermost to innermost (the current
    /// base included) and takes the first resource declaring a *dynamic*
    /// anchor named `anchor_name`; a static anchor of the same name does
    /// not count. When the dynamic scope declares none, falls back to an
    /// ordinary anchor lookup in the current document.
    ///
    /// # Errors
    ///
    /// `NoSuchAnchor` when neither the dynamic scope nor the current
    /// document declares a matching anchor.
    pub fn lookup_dynamic(&self, anchor_name: &str) -> Result<Resolved, ResolveError> {
        let registry = self.registry.ensure_crawled()?;
        for scope in self.previous.iter().chain(std::iter::once(&self.base_uri)) {
            if let Some(anchor) = registry.dynamic_anchor_in(scope, anchor_name) {
                let contents = anchor.resource().contents_arc();
                let target = scope.clone();
                let resolver = self.evolve(registry.clone(), target);
                return Ok(Resolved::new(contents, resolver));
            }
        }
        let Retrieved {
            value: anchor,
            registry,
        } = registry.anchor(&self.base_uri, anchor_name)?;
        let contents = anchor.resource().contents_arc();
        let resolver = self.evolve(registry, self.base_uri.clone());
        Ok(Resolved::new(contents, resolver))
    }

    /// Push `scope_uri`, resolved against the current base, as the new
    /// base scope.
    ///
    /// # Errors
    ///
    /// URI-resolution errors when the current base cannot absorb
    /// `scope_uri`.
    pub fn push_scope(&self, scope_uri: &str) -> Result<Resolver, ResolveError> {
        let joined = uri::resolve_against(&self.base_uri, scope_uri)?;
        Ok(self.evolve(self.registry.clone(), joined))
    }

    /// Enter a subresource: push its identifier as the new base scope if
    /// it declares one, otherwise keep the current scope.
    ///
    /// # Errors
    ///
    /// URI-resolution errors when the current base cannot absorb the
    /// subresource's identifier.
    pub fn in_subresource(&self, subresource: &Resource) -> Result<Resolver, ResolveError> {
        match subresource.id() {
            Some(id) => self.push_scope(id),
            None => Ok(self.clone()),
        }
    }

    /// The dynamic-scope chain, outermost first, ending with the current
    /// base.
    pub fn dynamic_scope(&self) -> impl Iterator<Item = &str> {
        self.previous
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.base_uri.as_str()))
    }

    /// A resolver rebased at `base_uri`, with the old base pushed onto
    /// the scope stack (unless re-entering the scope just left).
    fn evolve(&self, registry: Registry, base_uri: String) -> Resolver {
        let mut previous = self.previous.clone();
        if !self.base_uri.is_empty() && previous.last() != Some(&base_uri) {
            previous.push(self.base_uri.clone());
        }
        Resolver {
            base_uri,
            registry,
            previous,
        }
    }
}
