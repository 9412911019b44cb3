//! Resolves raw variation records into ids, chart keys and colors.

use crate::aggregate::types::{RawVariation, Variation};
use serde::Serialize;
use std::collections::BTreeMap;

/// Line colors, assigned by variation position and cycling.
pub const PALETTE: [&str; 4] = ["#46464F", "#27ae60", "#FF8346", "#4142EF"];

/// Fields of a serialized chart point that a variation key must not shadow.
pub const RESERVED_KEYS: [&str; 2] = ["timestamp", "label"];

/// Two or more variations whose names slug to the same chart key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCollision {
    pub key: String,
    pub names: Vec<String>,
}

/// Lowercases `name` and joins its `[a-z0-9]` runs with single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_gap = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if in_gap && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            in_gap = false;
        } else {
            in_gap = true;
        }
    }

    slug
}

/// Resolves variations in input order.
///
/// A variation without an explicit id falls back to its position; position 0
/// is spelled out as `"0"`.
pub fn resolve_variations(raw: &[RawVariation]) -> Vec<Variation> {
    raw.iter()
        .enumerate()
        .map(|(index, v)| {
            let id = match v.id {
                Some(id) => id.to_string(),
                None if index == 0 => "0".to_string(),
                None => index.to_string(),
            };

            Variation {
                id,
                name: v.name.clone(),
                key: slugify(&v.name),
                color: PALETTE[index % PALETTE.len()].to_string(),
            }
        })
        .collect()
}

/// Lists chart keys shared by more than one variation, ordered by key.
///
/// Colliding variations are not renamed: in a chart point the value of the
/// later variation replaces the earlier one.
pub fn find_key_collisions(variations: &[Variation]) -> Vec<KeyCollision> {
    let mut by_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for v in variations {
        by_key.entry(v.key.as_str()).or_default().push(v.name.as_str());
    }

    by_key
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(key, names)| KeyCollision {
            key: key.to_string(),
            names: names.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

/// Lists variation keys equal to one of [`RESERVED_KEYS`], ordered by key.
///
/// Such a rate serializes next to the point's own field of the same name, so
/// the JSON object carries that key twice.
pub fn find_reserved_keys(variations: &[Variation]) -> Vec<KeyCollision> {
    let mut by_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for v in variations {
        if RESERVED_KEYS.contains(&v.key.as_str()) {
            by_key.entry(v.key.as_str()).or_default().push(v.name.as_str());
        }
    }

    by_key
        .into_iter()
        .map(|(key, names)| KeyCollision {
            key: key.to_string(),
            names: names.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
