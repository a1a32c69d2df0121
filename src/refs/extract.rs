//! Reference Extractor
//!
//! Walks an entity's declared relationship fields and yields a normalized
//! stream of references. Tolerates every legacy shape in the data: flat
//! string arrays, flat object arrays, nested category maps, single
//! string/object values. Never throws; garbage entries are dropped.

use serde_json::Value;

use crate::entity::{singularize_type, Entity};

use super::{classify_value, RawReference, Reference};

/// Top-level fields that may carry relationship data. `relationships` is a
/// transparent container: its children keep their own field paths.
const RELATIONSHIP_ROOTS: &[&str] = &[
    "relationships",
    "relatedEntities",
    "family",
    "allies",
    "enemies",
];

/// Category maps deeper than this are not walked further
const MAX_DEPTH: usize = 3;

/// Extract all relationship references from one entity
pub fn extract(entity: &Entity) -> Vec<Reference> {
    let mut refs = Vec::new();
    let Some(obj) = entity.raw.as_object() else {
        return refs;
    };

    for root in RELATIONSHIP_ROOTS {
        let Some(value) = obj.get(*root) else {
            continue;
        };

        if *root == "relationships" {
            // Transparent container: `relationships.family.parents` is
            // reported as `family.parents`
            if let Some(inner) = value.as_object() {
                for (key, inner_value) in inner {
                    walk(entity, key, inner_value, 1, &mut refs);
                }
            }
        } else {
            walk(entity, root, value, 0, &mut refs);
        }
    }

    refs
}

fn walk(entity: &Entity, field: &str, value: &Value, depth: usize, out: &mut Vec<Reference>) {
    match value {
        Value::Array(items) => {
            for item in items {
                push_if_reference(entity, field, item, out);
            }
        }
        Value::Object(_) => {
            // An object is either a reference itself or a map of named
            // relation categories
            if let Some(raw) = classify_value(value) {
                out.push(make_reference(entity, field, raw));
            } else if depth < MAX_DEPTH {
                if let Some(map) = value.as_object() {
                    for (key, nested) in map {
                        walk(entity, &format!("{}.{}", field, key), nested, depth + 1, out);
                    }
                }
            }
        }
        _ => push_if_reference(entity, field, value, out),
    }
}

fn push_if_reference(entity: &Entity, field: &str, value: &Value, out: &mut Vec<Reference>) {
    if let Some(raw) = classify_value(value) {
        out.push(make_reference(entity, field, raw));
    }
}

fn make_reference(entity: &Entity, field: &str, raw: RawReference) -> Reference {
    Reference {
        source_id: entity.id.clone(),
        field: field.to_string(),
        raw,
    }
}

/// Best-effort candidate id from a legacy path string.
///
/// `"../../greek/deities/zeus.html"` yields `"greek_deity_zeus"`:
/// slug from the file name, singularized type from the parent folder,
/// domain from the folder above that when present. Returns `None` when no
/// usable slug can be pulled out, in which case the raw string is kept as
/// the candidate and resolution fails downstream as a FormatIssue.
pub fn candidate_from_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    let file = segments.last()?;
    let slug = file
        .trim_end_matches(".html")
        .trim_end_matches(".htm")
        .trim_end_matches(".json")
        .to_lowercase()
        .replace('-', "_");
    if slug.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(3);
    if segments.len() >= 3 {
        parts.push(segments[segments.len() - 3].to_lowercase());
    }
    if segments.len() >= 2 {
        parts.push(singularize_type(segments[segments.len() - 2]));
    }
    parts.push(slug);

    Some(parts.join("_"))
}
