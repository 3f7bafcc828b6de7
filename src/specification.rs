//! Per-dialect behavior tables.
//!
//! Dialects disagree on which keyword names a document's identifier, how
//! anchors are declared, and which keywords hold nested subresources.
//! `Specification` captures those rules as a closed set of variants whose
//! three lookups (`id_of`, `anchors_in`, `subresources_of`) are total:
//! unrecognized or malformed shapes yield "nothing found", never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{Anchor, Resource};

/// The behavior descriptor for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specification {
    #[serde(rename = "draft2020-12")]
    Draft202012,
    #[serde(rename = "draft2019-09")]
    Draft201909,
    #[serde(rename = "draft7")]
    Draft7,
    #[serde(rename = "draft6")]
    Draft6,
    #[serde(rename = "draft4")]
    Draft4,
    #[serde(rename = "draft3")]
    Draft3,
    /// Governs arbitrary non-schema documents used purely as data.
    /// Declares no identifiers, no anchors, and no subresources.
    #[serde(rename = "opaque")]
    Opaque,
}

/// How each keyword of a dialect holds subresources.
///
/// `in_value`: the keyword's value is itself a schema. `in_subvalues`:
/// the value is a map whose values are schemas. `in_subarray`: the value
/// is an array of schemas. `schema_or_array`: legacy keywords whose value
/// is a single schema or an array of schemas (`items`, draft-3
/// `extends`). `schema_valued_maps`: legacy maps mixing schema values
/// with non-schema ones (`dependencies`); only schema-shaped values count.
struct Keywords {
    in_value: &'static [&'static str],
    in_subvalues: &'static [&'static str],
    in_subarray: &'static [&'static str],
    schema_or_array: &'static [&'static str],
    schema_valued_maps: &'static [&'static str],
}

impl Keywords {
    fn irregular(&self, keyword: &str) -> bool {
        self.schema_or_array.contains(&keyword) || self.schema_valued_maps.contains(&keyword)
    }
}

const DRAFT202012_KEYWORDS: Keywords = Keywords {
    in_value: &[
        "additionalProperties",
        "contains",
        "contentSchema",
        "else",
        "if",
        "items",
        "not",
        "propertyNames",
        "then",
        "unevaluatedItems",
        "unevaluatedProperties",
    ],
    in_subvalues: &[
        "$defs",
        "definitions",
        "dependentSchemas",
        "patternProperties",
        "properties",
    ],
    in_subarray: &["allOf", "anyOf", "oneOf", "prefixItems"],
    schema_or_array: &[],
    schema_valued_maps: &[],
};

const DRAFT201909_KEYWORDS: Keywords = Keywords {
    in_value: &[
        "additionalItems",
        "additionalProperties",
        "contains",
        "contentSchema",
        "else",
        "if",
        "not",
        "propertyNames",
        "then",
        "unevaluatedItems",
        "unevaluatedProperties",
    ],
    in_subvalues: &[
        "$defs",
        "definitions",
        "dependentSchemas",
        "patternProperties",
        "properties",
    ],
    in_subarray: &["allOf", "anyOf", "oneOf"],
    schema_or_array: &["items"],
    schema_valued_maps: &[],
};

const DRAFT7_KEYWORDS: Keywords = Keywords {
    in_value: &[
        "additionalItems",
        "additionalProperties",
        "contains",
        "else",
        "if",
        "not",
        "propertyNames",
        "then",
    ],
    in_subvalues: &["definitions", "patternProperties", "properties"],
    in_subarray: &["allOf", "anyOf", "oneOf"],
    schema_or_array: &["items"],
    schema_valued_maps: &["dependencies"],
};

const DRAFT6_KEYWORDS: Keywords = Keywords {
    in_value: &[
        "additionalItems",
        "additionalProperties",
        "contains",
        "not",
        "propertyNames",
    ],
    in_subvalues: &["definitions", "patternProperties", "properties"],
    in_subarray: &["allOf", "anyOf", "oneOf"],
    schema_or_array: &["items"],
    schema_valued_maps: &["dependencies"],
};

const DRAFT4_KEYWORDS: Keywords = Keywords {
    in_value: &["additionalItems", "additionalProperties", "not"],
    in_subvalues: &["definitions", "patternProperties", "properties"],
    in_subarray: &["allOf", "anyOf", "oneOf"],
    schema_or_array: &["items"],
    schema_valued_maps: &["dependencies"],
};

const DRAFT3_KEYWORDS: Keywords = Keywords {
    in_value: &["additionalItems", "additionalProperties"],
    in_subvalues: &["patternProperties", "properties"],
    in_subarray: &[],
    schema_or_array: &["extends", "items"],
    schema_valued_maps: &["dependencies"],
};

const OPAQUE_KEYWORDS: Keywords = Keywords {
    in_value: &[],
    in_subvalues: &[],
    in_subarray: &[],
    schema_or_array: &[],
    schema_valued_maps: &[],
};

impl Specification {
    /// The stable name of this dialect.
    pub fn name(&self) -> &'static str {
        match self {
            Specification::Draft202012 => "draft2020-12",
            Specification::Draft201909 => "draft2019-09",
            Specification::Draft7 => "draft7",
            Specification::Draft6 => "draft6",
            Specification::Draft4 => "draft4",
            Specification::Draft3 => "draft3",
            Specification::Opaque => "opaque",
        }
    }

    /// The URI the contents claim for themselves under this dialect's
    /// identifier keyword, if any.
    ///
    /// Non-mapping contents (booleans included) have no identifier. In
    /// drafts 6 and 7 a fragment-only `$id` declares an anchor rather
    /// than an identifier, and a mapping containing `$ref` is inert;
    /// drafts 3 and 4 apply the same rules to `id`.
    pub fn id_of<'a>(&self, contents: &'a Value) -> Option<&'a str> {
        let map = contents.as_object()?;
        match self {
            Specification::Draft202012 | Specification::Draft201909 => {
                map.get("$id")?.as_str()
            }
            Specification::Draft7 | Specification::Draft6 => legacy_id(map, "$id"),
            Specification::Draft4 | Specification::Draft3 => legacy_id(map, "id"),
            Specification::Opaque => None,
        }
    }

    /// Every anchor the contents declare directly, in declaration order.
    pub fn anchors_in(&self, contents: &Value) -> Vec<Anchor> {
        let Some(map) = contents.as_object() else {
            return Vec::new();
        };
        match self {
            Specification::Draft202012 => {
                let mut anchors = Vec::new();
                if let Some(name) = map.get("$anchor").and_then(Value::as_str) {
                    anchors.push(Anchor::new(name, self.create_resource(contents)));
                }
                if let Some(name) = map.get("$dynamicAnchor").and_then(Value::as_str) {
                    anchors.push(Anchor::new_dynamic(name, self.create_resource(contents)));
                }
                anchors
            }
            Specification::Draft201909 => {
                let mut anchors = Vec::new();
                if let Some(name) = map.get("$anchor").and_then(Value::as_str) {
                    anchors.push(Anchor::new(name, self.create_resource(contents)));
                }
                // $recursiveAnchor has no name of its own; it behaves as
                // a dynamic anchor named "".
                if map.get("$recursiveAnchor") == Some(&Value::Bool(true)) {
                    anchors.push(Anchor::new_dynamic("", self.create_resource(contents)));
                }
                anchors
            }
            Specification::Draft7 | Specification::Draft6 => {
                legacy_anchor(map, "$id", self, contents)
            }
            Specification::Draft4 | Specification::Draft3 => {
                legacy_anchor(map, "id", self, contents)
            }
            Specification::Opaque => Vec::new(),
        }
    }

    /// The nested contents this dialect recognizes as subresources, in
    /// table order.
    pub fn subresources_of<'a>(&self, contents: &'a Value) -> Vec<&'a Value> {
        let Some(map) = contents.as_object() else {
            return Vec::new();
        };
        let keywords = self.keywords();
        let mut found = Vec::new();
        for keyword in keywords.in_value {
            if let Some(value) = map.get(*keyword) {
                found.push(value);
            }
        }
        for keyword in keywords.schema_or_array {
            match map.get(*keyword) {
                Some(Value::Array(items)) => found.extend(items),
                Some(other) => found.push(other),
                None => {}
            }
        }
        for keyword in keywords.schema_valued_maps {
            if let Some(Value::Object(entries)) = map.get(*keyword) {
                found.extend(
                    entries
                        .values()
                        .filter(|value| value.is_object() || value.is_boolean()),
                );
            }
        }
        for keyword in keywords.in_subarray {
            if let Some(Value::Array(items)) = map.get(*keyword) {
                found.extend(items);
            }
        }
        for keyword in keywords.in_subvalues {
            if let Some(Value::Object(values)) = map.get(*keyword) {
                found.extend(values.values());
            }
        }
        found
    }

    /// Pair contents with this specification.
    pub fn create_resource(&self, contents: &Value) -> Resource {
        Resource::new(contents.clone(), *self)
    }

    /// Whether a pointer walk whose path since the last subresource
    /// boundary is `segments`, landing on `target`, has just crossed
    /// into a subresource.
    ///
    /// A path is a boundary when it is a concatenation of single
    /// schema-valued keyword segments and `<keyword>/<name>` pairs for
    /// map- and array-valued keywords. Legacy irregular keywords
    /// (`items`, `dependencies`, draft-3 `extends`) are a boundary
    /// whenever the target is a mapping, since their shape is only known
    /// from the value.
    pub(crate) fn subresource_boundary(&self, segments: &[String], target: &Value) -> bool {
        if segments.is_empty() {
            return false;
        }
        let keywords = self.keywords();
        let mut iter = segments.iter();
        while let Some(segment) = iter.next() {
            let segment = segment.as_str();
            if keywords.irregular(segment) && target.is_object() {
                return true;
            }
            if keywords.in_value.contains(&segment) {
                continue;
            }
            if (keywords.in_subvalues.contains(&segment)
                || keywords.in_subarray.contains(&segment))
                && iter.next().is_some()
            {
                continue;
            }
            return false;
        }
        true
    }

    fn keywords(&self) -> &'static Keywords {
        match self {
            Specification::Draft202012 => &DRAFT202012_KEYWORDS,
            Specification::Draft201909 => &DRAFT201909_KEYWORDS,
            Specification::Draft7 => &DRAFT7_KEYWORDS,
            Specification::Draft6 => &DRAFT6_KEYWORDS,
            Specification::Draft4 => &DRAFT4_KEYWORDS,
            Specification::Draft3 => &DRAFT3_KEYWORDS,
            Specification::Opaque => &OPAQUE_KEYWORDS,
        }
    }
}

impl std::fmt::Display for Specification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn legacy_id<'a>(map: &'a serde_json::Map<String, Value>, keyword: &str) -> Option<&'a str> {
    if map.contains_key("$ref") {
        return None;
    }
    let id = map.get(keyword)?.as_str()?;
    if id.starts_with('#') {
        return None;
    }
    Some(id)
}

fn legacy_anchor(
    map: &serde_json::Map<String, Value>,
    keyword: &str,
    specification: &Specification,
    contents: &Value,
) -> Vec<Anchor> {
    if map.contains_key("$ref") {
        return Vec::new();
    }
    let Some(id) = map.get(keyword).and_then(Value::as_str) else {
        return Vec::new();
    };
    match id.strip_prefix('#') {
        Some(name) => vec![Anchor::new(name, specification.create_resource(contents))],
        None => Vec::new(),
    }
}
