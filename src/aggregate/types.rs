//! Data types used by the variation resolver and the aggregator.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A variation as it appears in the raw dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

/// One calendar day of raw counts, keyed by variation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDataPoint {
    pub date: String,
    #[serde(default, deserialize_with = "counts_skipping_nulls")]
    pub visits: HashMap<String, u64>,
    #[serde(default, deserialize_with = "counts_skipping_nulls")]
    pub conversions: HashMap<String, u64>,
}

/// Reads a count map where a `null` count, or a `null` map, means "not recorded".
fn counts_skipping_nulls<'de, D>(deserializer: D) -> Result<HashMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let counts: Option<HashMap<String, Option<u64>>> = Option::deserialize(deserializer)?;
    Ok(counts
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, count)| count.map(|count| (id, count)))
        .collect())
}

/// The whole input document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub variations: Vec<RawVariation>,
    #[serde(default)]
    pub data: Vec<RawDataPoint>,
}

/// A resolved variation.
///
/// `id` joins back into the `visits`/`conversions` maps of each row, `key` is
/// the field name used in [`ChartPoint`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub id: String,
    pub name: String,
    pub key: String,
    pub color: String,
}

/// Time bucket size for the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
        }
    }
}

/// A single point of the conversion-rate chart.
///
/// Serializes flat: `{"timestamp": .., "label": .., "<key>": rate|null, ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl ChartPoint {
    pub fn new(timestamp: i64, label: impl Into<String>) -> Self {
        Self {
            timestamp,
            label: label.into(),
            values: BTreeMap::new(),
        }
    }

    /// Rate for `key`, `None` both when the key is absent and when the rate is null.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    /// Keys whose rate equals the highest non-null rate of this point.
    ///
    /// Ties return every tied key, in key order. Empty when all rates are null.
    pub fn leaders(&self) -> Vec<&str> {
        let max = self
            .values
            .values()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);

        if max == f64::NEG_INFINITY {
            return Vec::new();
        }

        self.values
            .iter()
            .filter(|(_, v)| **v == Some(max))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub variations: Vec<Variation>,
    pub points: Vec<ChartPoint>,
}
