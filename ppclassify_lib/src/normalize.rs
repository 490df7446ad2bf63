//! Normalization of raw provider payloads into category-to-weight tables.
//!
//! The SAL components answer in two shapes: a single object whose keys are
//! the categories (after dropping known metadata keys), or a list of objects
//! each carrying a category-name field and a percentage field. Percentages
//! are converted to fractions in [0,1]; category names are remapped or
//! capitalized, XML-escaped, and accumulated by addition.

use serde_json::Value;

use crate::error::ClassifyError;
use crate::taxonomy::{TaxonomyConfig, TaxonomyKind, NON_CATEGORY_KEYS};

/// Category weights for one taxonomy kind, as fractions, in insertion order.
///
/// A category appearing in multiple raw rows accumulates; weights are never
/// overwritten. Insertion order is an output contract (it drives color
/// assignment), so this is deliberately not a hash map.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    rows: Vec<(String, f64)>,
}

impl WeightTable {
    /// A shared empty table, for securities that produced no data for a
    /// kind. Returned by reference so accessors can fall back to it.
    pub fn empty() -> &'static WeightTable {
        static EMPTY: WeightTable = WeightTable { rows: Vec::new() };
        &EMPTY
    }

    pub fn add(&mut self, name: String, weight: f64) {
        if let Some(row) = self.rows.iter_mut().find(|(n, _)| *n == name) {
            row.1 += weight;
        } else {
            self.rows.push((name, weight));
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for row in &mut self.rows {
            row.1 *= factor;
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rows.iter().map(|(n, w)| (n.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The detected shape of a component payload.
pub enum CategoryShape<'a> {
    /// A single match: its object keys are the categories.
    Keyed(&'a Value),
    /// Multiple matches: every match is one category row.
    Listed(Vec<&'a Value>),
}

/// Result of normalizing one kind's payload for one security.
pub struct NormalizedKind {
    /// Unscaled category fractions in insertion order.
    pub weights: WeightTable,
    /// Long-equity exposure, computed for Asset-Type payloads only.
    pub long_equity: Option<f64>,
}

/// Selects values along a dotted path. A `[*]` suffix on a segment expands
/// an array into one match per element; missing fields drop out silently.
pub fn select<'a>(value: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut frontier = vec![value];
    if path.is_empty() {
        return frontier;
    }
    for segment in path.split('.') {
        let (field, expand) = match segment.strip_suffix("[*]") {
            Some(field) => (field, true),
            None => (segment, false),
        };
        let mut next = Vec::new();
        for value in frontier {
            let Some(child) = value.get(field) else {
                continue;
            };
            if expand {
                if let Some(items) = child.as_array() {
                    next.extend(items.iter());
                }
            } else {
                next.push(child);
            }
        }
        frontier = next;
    }
    frontier
}

/// A singular path match means the match itself holds the categories as
/// keys; anything else treats every match as one category.
pub fn detect_shape<'a>(value: &'a Value, path: &str) -> CategoryShape<'a> {
    let mut matches = select(value, path);
    if matches.len() == 1 {
        CategoryShape::Keyed(matches.remove(0))
    } else {
        CategoryShape::Listed(matches)
    }
}

/// Normalizes one kind's JSON payload into a weight table.
///
/// Errors here mean the payload had an unexpected shape; the caller logs
/// them and falls back to the x-ray report for this kind.
pub fn normalize_component(
    kind: TaxonomyKind,
    config: &TaxonomyConfig,
    value: &Value,
    secid: &str,
) -> Result<NormalizedKind, ClassifyError> {
    let (raw_rows, long_equity) = match detect_shape(value, config.json_path) {
        CategoryShape::Keyed(obj) => {
            let rows = keyed_rows(obj, config.percent_field, kind, secid)?;
            let long_equity = if kind == TaxonomyKind::AssetType {
                Some(long_equity_exposure(obj, secid))
            } else {
                None
            };
            (rows, long_equity)
        }
        CategoryShape::Listed(items) => (
            listed_rows(&items, config, kind, secid)?,
            None,
        ),
    };

    let named = remap(raw_rows, config.map, secid);
    let mut weights = WeightTable::default();
    for (name, percent) in named {
        weights.add(escape_xml(&name), percent / 100.0);
    }
    Ok(NormalizedKind {
        weights,
        long_equity,
    })
}

/// Extracts category rows from a key-shaped payload. The configured percent
/// field names a nested field; an empty field means the value itself is the
/// percentage. A null value on the first category yields no rows.
fn keyed_rows(
    obj: &Value,
    percent_field: &str,
    kind: TaxonomyKind,
    secid: &str,
) -> Result<Vec<(String, f64)>, ClassifyError> {
    let Some(map) = obj.as_object() else {
        return Err(ClassifyError::Document(format!(
            "{} payload for {} is not an object",
            kind, secid
        )));
    };

    let keys: Vec<&String> = map
        .keys()
        .filter(|key| !NON_CATEGORY_KEYS.contains(&key.as_str()))
        .collect();
    let Some(first) = keys.first() else {
        return Ok(Vec::new());
    };

    let percent_of = |key: &str| -> &Value {
        let value = &map[key];
        if percent_field.is_empty() {
            value
        } else {
            value.get(percent_field).unwrap_or(&Value::Null)
        }
    };

    if percent_of(first).is_null() {
        tracing::info!("percentages not found for {} for {}", kind, secid);
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        let value = percent_of(key);
        let percent = numeric(value).ok_or_else(|| {
            ClassifyError::Document(format!(
                "non-numeric percentage for {} key '{}' on {}",
                kind, key, secid
            ))
        })?;
        rows.push((key.clone(), percent));
    }
    Ok(rows)
}

/// Extracts category rows from a list-shaped payload using the configured
/// name and percent fields.
fn listed_rows(
    items: &[&Value],
    config: &TaxonomyConfig,
    kind: TaxonomyKind,
    secid: &str,
) -> Result<Vec<(String, f64)>, ClassifyError> {
    let percent_missing = items.first().map_or(true, |item| {
        let value = item.get(config.percent_field).unwrap_or(&Value::Null);
        value.is_null() || value.as_str() == Some("")
    });
    if percent_missing {
        if !items.is_empty() {
            tracing::info!("percentages not found for {} for {}", kind, secid);
        }
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .get(config.category_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClassifyError::Document(format!(
                    "missing category field '{}' for {} on {}",
                    config.category_field, kind, secid
                ))
            })?;
        let percent = item
            .get(config.percent_field)
            .and_then(numeric)
            .ok_or_else(|| {
                ClassifyError::Document(format!(
                    "non-numeric percentage for {} category '{}' on {}",
                    kind, name, secid
                ))
            })?;
        rows.push((name.to_string(), percent));
    }
    Ok(rows)
}

/// Computes the long-equity exposure fraction from an Asset-Type payload.
///
/// Sums the long allocations of the base, non-domestic, and domestic equity
/// buckets; a missing or non-numeric bucket contributes 0 and is logged.
pub fn long_equity_exposure(obj: &Value, secid: &str) -> f64 {
    const EQUITY_BUCKETS: [&str; 3] = [
        "assetAllocEquity",
        "AssetAllocNonUSEquity",
        "AssetAllocUSEquity",
    ];
    let mut total = 0.0;
    for bucket in EQUITY_BUCKETS {
        let allocation = obj
            .get(bucket)
            .and_then(|v| v.get("longAllocation"))
            .and_then(numeric);
        match allocation {
            Some(value) => total += value,
            None => {
                tracing::info!("no long allocation in '{}' for {}", bucket, secid);
            }
        }
    }
    total / 100.0
}

/// Applies the kind's name map when present, dropping (and logging) keys it
/// does not know. Without a map, the first character is uppercased.
fn remap(
    rows: Vec<(String, f64)>,
    map: &[(&str, &str)],
    secid: &str,
) -> Vec<(String, f64)> {
    if map.is_empty() {
        return rows
            .into_iter()
            .map(|(name, percent)| (capitalize_first(&name), percent))
            .collect();
    }

    let mut mapped = Vec::with_capacity(rows.len());
    let mut unmapped = Vec::new();
    for (name, percent) in rows {
        match map.iter().find(|(raw, _)| *raw == name) {
            Some((_, display)) => mapped.push((display.to_string(), percent)),
            None => unmapped.push(name),
        }
    }
    if !unmapped.is_empty() {
        tracing::info!("categories not mapped: {:?} for {}", unmapped, secid);
    }
    mapped
}

/// Accepts both JSON numbers and numeric strings, which the provider mixes.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Escapes `&`, `<`, and `>` so category names round-trip through the
/// output document.
pub fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
