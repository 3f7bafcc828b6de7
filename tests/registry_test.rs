//! Integration tests for dialect detection and the registry.

use json_refs::{
    specification_with, specification_with_default, CombineError, DialectError, Registry,
    Resource, ResolveError, RetrieveError, Specification,
};
use serde_json::{json, Value};

fn draft2020(contents: Value) -> Resource {
    Resource::new(contents, Specification::Draft202012)
}

// === Dialect Detection Tests ===

mod detection {
    use super::*;

    const DIALECTS: &[(&str, Specification)] = &[
        ("https://json-schema.org/draft/2020-12/schema", Specification::Draft202012),
        ("https://json-schema.org/draft/2019-09/schema", Specification::Draft201909),
        ("http://json-schema.org/draft-07/schema#", Specification::Draft7),
        ("http://json-schema.org/draft-06/schema#", Specification::Draft6),
        ("http://json-schema.org/draft-04/schema#", Specification::Draft4),
        ("http://json-schema.org/draft-03/schema#", Specification::Draft3),
    ];

    #[test]
    fn explicit_dialect_keywords_are_detected() {
        for (dialect_id, expected) in DIALECTS {
            let contents = json!({ "$schema": *dialect_id });
            let resource = Resource::from_contents(contents.clone()).unwrap();
            assert_eq!(resource, Resource::new(contents, *expected));
        }
    }

    #[test]
    fn specification_with_matches_each_dialect() {
        for (dialect_id, expected) in DIALECTS {
            assert_eq!(specification_with(dialect_id), Ok(*expected));
        }
    }

    #[test]
    fn unknown_dialect() {
        let dialect_id = "http://example.com/unknown-json-schema-dialect-id";
        let err = Resource::from_contents(json!({"$schema": dialect_id})).unwrap_err();
        assert_eq!(err.uri(), Some(dialect_id));
    }

    #[test]
    fn specification_with_unknown_dialect() {
        let dialect_id = "http://example.com/unknown-json-schema-dialect-id";
        let err = specification_with(dialect_id).unwrap_err();
        assert!(matches!(
            err,
            DialectError::UnknownDialect { ref uri } if uri == dialect_id
        ));
    }

    #[test]
    fn specification_with_default_falls_back() {
        let specification = specification_with_default(
            "http://example.com/unknown-json-schema-dialect-id",
            Specification::Opaque,
        );
        assert_eq!(specification, Specification::Opaque);
    }

    #[test]
    fn id_of_mapping() {
        let uri = "http://example.com/some-schema";
        for (keyword, specification) in [
            ("$id", Specification::Draft202012),
            ("$id", Specification::Draft201909),
            ("$id", Specification::Draft7),
            ("$id", Specification::Draft6),
            ("id", Specification::Draft4),
            ("id", Specification::Draft3),
        ] {
            assert_eq!(specification.id_of(&json!({ keyword: uri })), Some(uri));
        }
    }

    #[test]
    fn id_of_bool() {
        for specification in [
            Specification::Draft202012,
            Specification::Draft201909,
            Specification::Draft7,
            Specification::Draft6,
        ] {
            for value in [true, false] {
                assert_eq!(specification.id_of(&json!(value)), None);
            }
        }
    }

    #[test]
    fn anchors_in_bool() {
        for specification in [
            Specification::Draft202012,
            Specification::Draft201909,
            Specification::Draft7,
            Specification::Draft6,
        ] {
            for value in [true, false] {
                assert_eq!(specification.anchors_in(&json!(value)), vec![]);
            }
        }
    }
}

// === Registry Immutability Tests ===

mod immutability {
    use super::*;

    #[test]
    fn insertion_round_trips() {
        let resource = draft2020(json!({"type": "object"}));
        let registry = Registry::new().with_resource("http://example.com/a", resource.clone());
        assert_eq!(registry.resource("http://example.com/a"), Some(&resource));
    }

    #[test]
    fn insertion_produces_a_new_value() {
        let first = draft2020(json!({"first": true}));
        let registry = Registry::new().with_resource("http://example.com/a", first.clone());
        let derived =
            registry.with_resource("http://example.com/b", draft2020(json!({"second": true})));

        // Prior lookups are unchanged in the original.
        assert_eq!(registry.resource("http://example.com/a"), Some(&first));
        assert!(registry.resource("http://example.com/b").is_none());
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn lookups_are_stable() {
        let registry = Registry::new()
            .with_resource("http://example.com/a", draft2020(json!({"stable": true})));
        let once = registry.resource("http://example.com/a").cloned();
        let twice = registry.resource("http://example.com/a").cloned();
        assert_eq!(once, twice);
    }

    #[test]
    fn crawling_leaves_the_receiver_alone() {
        let registry = Registry::new().with_resource(
            "http://example.com/root",
            draft2020(json!({
                "$defs": {
                    "child": { "$id": "http://example.com/child" }
                }
            })),
        );
        let crawled = registry.crawl().unwrap();
        assert!(crawled.resource("http://example.com/child").is_some());
        assert!(registry.resource("http://example.com/child").is_none());
    }
}

// === Combine Tests ===

mod combine {
    use super::*;

    #[test]
    fn disjoint_registries_union() {
        let a = Registry::new().with_resource("http://example.com/a", draft2020(json!({"a": 1})));
        let b = Registry::new().with_resource("http://example.com/b", draft2020(json!({"b": 2})));
        let combined = a.combine(&b).unwrap();
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.contents("http://example.com/a"), Some(&json!({"a": 1})));
        assert_eq!(combined.contents("http://example.com/b"), Some(&json!({"b": 2})));
    }

    #[test]
    fn equal_contents_merge_to_one_entry() {
        let resource = draft2020(json!({"shared": true}));
        let a = Registry::new().with_resource("http://example.com/a", resource.clone());
        let b = Registry::new().with_resource("http://example.com/a", resource);
        let combined = a.combine(&b).unwrap();
        assert_eq!(combined.len(), 1);
    }

    #[test]
    fn differing_contents_collide() {
        let a = Registry::new().with_resource("http://example.com/a", draft2020(json!({"v": 1})));
        let b = Registry::new().with_resource("http://example.com/a", draft2020(json!({"v": 2})));
        let err = a.combine(&b).unwrap_err();
        assert_eq!(
            err,
            CombineError::Collision {
                uri: "http://example.com/a".into()
            }
        );
    }

    #[test]
    fn collisions_do_not_overwrite() {
        let a = Registry::new().with_resource("http://example.com/a", draft2020(json!({"v": 1})));
        let b = Registry::new().with_resource("http://example.com/a", draft2020(json!({"v": 2})));
        let _ = a.combine(&b);
        assert_eq!(a.contents("http://example.com/a"), Some(&json!({"v": 1})));
        assert_eq!(b.contents("http://example.com/a"), Some(&json!({"v": 2})));
    }
}

// === Retrieval Policy Tests ===

mod retrieval {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn missing_uris_go_through_the_policy() {
        let registry = Registry::new().with_retrieve(|uri: &str| -> Result<Resource, RetrieveError> {
            Ok(Resource::opaque(json!({ "fetched": uri })))
        });
        let retrieved = registry.get_or_retrieve("http://example.com/anything").unwrap();
        assert_eq!(
            retrieved.value.contents(),
            &json!({ "fetched": "http://example.com/anything" })
        );
    }

    #[test]
    fn retrieved_resources_are_cached_in_the_returned_registry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = Registry::new().with_retrieve(move |_: &str| -> Result<Resource, RetrieveError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Resource::opaque(json!({})))
        });

        let retrieved = registry.get_or_retrieve("http://example.com/a").unwrap();
        let again = retrieved.registry.get_or_retrieve("http://example.com/a").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(again.value, retrieved.value);

        // The caller's held registry is untouched; asking it again re-fetches.
        assert!(registry.resource("http://example.com/a").is_none());
        registry.get_or_retrieve("http://example.com/a").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registered_resources_never_hit_the_policy() {
        let registry = Registry::new()
            .with_resource("http://example.com/a", draft2020(json!({"local": true})))
            .with_retrieve(|_: &str| -> Result<Resource, RetrieveError> {
                Err("should not be called".into())
            });
        let retrieved = registry.get_or_retrieve("http://example.com/a").unwrap();
        assert_eq!(retrieved.value.contents(), &json!({"local": true}));
    }

    #[test]
    fn policy_failure_is_unretrievable() {
        let registry = Registry::new().with_retrieve(|_: &str| -> Result<Resource, RetrieveError> {
            Err("out of service".into())
        });
        let err = registry.get_or_retrieve("http://example.com/a").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Unretrievable { ref uri, source: Some(_) } if uri == "http://example.com/a"
        ));
    }

    #[test]
    fn no_policy_is_unretrievable() {
        let err = Registry::new()
            .get_or_retrieve("http://example.com/a")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Unretrievable { ref uri, source: None } if uri == "http://example.com/a"
        ));
    }

    #[test]
    fn policies_can_load_from_disk() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"$schema": "http://json-schema.org/draft-07/schema#"}}"#).unwrap();

        let base = dir.path().to_path_buf();
        let registry = Registry::new().with_retrieve(move |uri: &str| -> Result<Resource, RetrieveError> {
            let name = uri.rsplit('/').next().unwrap_or(uri);
            let raw = std::fs::read_to_string(base.join(name))?;
            let contents: Value = serde_json::from_str(&raw)?;
            Ok(Resource::from_contents(contents)?)
        });

        let retrieved = registry
            .get_or_retrieve("http://example.com/schemas/widget.json")
            .unwrap();
        assert_eq!(retrieved.value.specification(), Specification::Draft7);
    }
}

// === Remote Retrieval Tests ===

#[cfg(feature = "remote")]
mod remote {
    use super::*;
    use json_refs::HttpRetrieve;

    #[test]
    fn fetches_and_caches_missing_documents() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/schemas/widget.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "object"}"#,
            )
            .create();

        let registry = Registry::new().with_retrieve(HttpRetrieve::new());
        let uri = format!("{}/schemas/widget.json", server.url());
        let retrieved = registry.get_or_retrieve(&uri).unwrap();

        assert_eq!(retrieved.value.contents()["type"], "object");
        assert_eq!(retrieved.value.specification(), Specification::Draft202012);
        assert!(retrieved.registry.resource(&uri).is_some());
        assert!(registry.resource(&uri).is_none());
        mock.assert();
    }

    #[test]
    fn undeclared_dialects_use_the_configured_default() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/data.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"just": "data"}"#)
            .create();

        let registry =
            Registry::new().with_retrieve(HttpRetrieve::with_default(Specification::Opaque));
        let uri = format!("{}/data.json", server.url());
        let retrieved = registry.get_or_retrieve(&uri).unwrap();
        assert_eq!(retrieved.value.specification(), Specification::Opaque);
    }

    #[test]
    fn http_errors_are_unretrievable() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.json").with_status(404).create();

        let registry = Registry::new().with_retrieve(HttpRetrieve::new());
        let uri = format!("{}/missing.json", server.url());
        let err = registry.get_or_retrieve(&uri).unwrap_err();
        assert!(matches!(err, ResolveError::Unretrievable { source: Some(_), .. }));
    }
}
