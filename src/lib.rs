//! Dialect-aware JSON reference resolution.
//!
//! Documents arrive as already-decoded [`serde_json::Value`] trees, get
//! paired with the [`Specification`] of the dialect they were authored
//! against (JSON Schema drafts 3 through 2020-12, or [`Specification::Opaque`]
//! for plain data), and live in an immutable [`Registry`]. A [`Resolver`]
//! then resolves references across the registry: JSON pointer fragments,
//! crawled anchors, and dynamic anchors looked up through the scope
//! stack of an in-progress resolution.
//!
//! # Example
//!
//! ```
//! use json_refs::{Registry, Resource};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "$schema": "https://json-schema.org/draft/2020-12/schema",
//!     "$defs": {
//!         "string": { "$anchor": "str", "type": "string" }
//!     }
//! });
//!
//! let resource = Resource::from_contents(schema).unwrap();
//! let registry = Registry::new().with_resource("http://example.com/schema", resource);
//!
//! let resolver = registry.resolver("http://example.com/schema");
//! let resolved = resolver.lookup("#str").unwrap();
//! assert_eq!(resolved.contents()["type"], "string");
//! ```
//!
//! # Immutability
//!
//! Registries are persistent values: `with_resource`, `with_resources`,
//! and `combine` return new registries and never touch the receiver, so
//! registries (and resolvers bound to them) can be shared freely across
//! threads. Operations that cache work (crawling a document for its
//! anchors, fetching a missing URI through a [`Retrieve`] policy)
//! return the updated registry alongside their result ([`Retrieved`],
//! [`Resolved`]); callers continue with the returned value.
//!
//! # Dialects
//!
//! Each draft disagrees on the identifier keyword (`$id` vs. legacy
//! `id`), on anchor declaration (`$anchor`, `$dynamicAnchor`, the
//! draft-7-era fragment-only `$id`), and on which keywords hold nested
//! subresources. Detection reads the document's `$schema` keyword; the
//! [`Detector`] type supports alternative keywords, embedder-registered
//! dialects, and defaults.

mod dialect;
mod error;
mod registry;
mod resolver;
mod resource;
mod retrieve;
mod specification;
mod uri;

pub use dialect::{specification_with, specification_with_default, Detector, DIALECT_KEYWORD};
pub use error::{CombineError, DialectError, ResolveError, RetrieveError};
pub use registry::{Registry, Retrieved};
pub use resolver::{Resolved, Resolver};
pub use resource::{Anchor, Resource};
pub use retrieve::Retrieve;
pub use specification::Specification;

#[cfg(feature = "remote")]
pub use retrieve::HttpRetrieve;
