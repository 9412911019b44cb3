//! State a chart consumer keeps around the aggregation core: chart data
//! memoized per granularity, and the set of variations currently shown.

use std::collections::{BTreeSet, HashMap};

use crate::aggregate::build_chart_data;
use crate::aggregate::types::{ChartData, Granularity, RawData, Variation};
use crate::aggregate::variations::resolve_variations;

/// Owns a dataset and caches its chart data per granularity.
pub struct Dashboard {
    raw: RawData,
    variations: Vec<Variation>,
    cache: HashMap<Granularity, ChartData>,
}

impl Dashboard {
    pub fn new(raw: RawData) -> Self {
        let variations = resolve_variations(&raw.variations);
        Self {
            raw,
            variations,
            cache: HashMap::new(),
        }
    }

    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Chart data for `granularity`, computed on first request.
    pub fn chart_data(&mut self, granularity: Granularity) -> &ChartData {
        let raw = &self.raw;
        self.cache
            .entry(granularity)
            .or_insert_with(|| build_chart_data(raw, granularity))
    }
}

/// Variations shown on the chart, by key. Never left empty by [`Selection::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<String>,
}

impl Selection {
    /// Every variation selected.
    pub fn all(variations: &[Variation]) -> Self {
        Self {
            keys: variations.iter().map(|v| v.key.clone()).collect(),
        }
    }

    /// Only the given keys that exist in `variations`; falls back to all when none match.
    pub fn only<'a>(variations: &[Variation], keys: impl IntoIterator<Item = &'a str>) -> Self {
        let wanted: BTreeSet<&str> = keys.into_iter().collect();
        let mut selection = Self {
            keys: variations
                .iter()
                .filter(|v| wanted.contains(v.key.as_str()))
                .map(|v| v.key.clone())
                .collect(),
        };
        selection.ensure_not_empty(variations);
        selection
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_all(&self, variations: &[Variation]) -> bool {
        variations.iter().all(|v| self.is_selected(&v.key))
    }

    /// Flips `key`. Returns `false` when nothing changed: the key is unknown,
    /// or it is the last selected one.
    pub fn toggle(&mut self, variations: &[Variation], key: &str) -> bool {
        if self.keys.contains(key) {
            if self.keys.len() == 1 {
                return false;
            }
            self.keys.remove(key);
            true
        } else if variations.iter().any(|v| v.key == key) {
            self.keys.insert(key.to_string());
            true
        } else {
            false
        }
    }

    /// Resets an empty selection to every variation.
    pub fn ensure_not_empty(&mut self, variations: &[Variation]) {
        if self.keys.is_empty() {
            *self = Self::all(variations);
        }
    }

    pub fn describe(&self, variations: &[Variation]) -> String {
        if self.is_all(variations) {
            "All variations selected".to_string()
        } else {
            format!("{} variations selected", self.len())
        }
    }

    /// Copy of `data` restricted to the selected variations.
    pub fn filter(&self, data: &ChartData) -> ChartData {
        let variations = data
            .variations
            .iter()
            .filter(|v| self.is_selected(&v.key))
            .cloned()
            .collect();

        let points = data
            .points
            .iter()
            .map(|p| {
                let mut point = p.clone();
                point.values.retain(|k, _| self.is_selected(k));
                point
            })
            .collect();

        ChartData { variations, points }
    }
}
