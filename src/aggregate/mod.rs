//! Conversion-rate aggregation.
//!
//! This module resolves the raw variation list, then turns raw per-day
//! visit/conversion counts into chart points at daily or weekly granularity.
//! Nothing here performs I/O or fails: missing counts become null rates and
//! unparseable dates become [`utility::INVALID_TIMESTAMP`].

pub mod daily;
pub mod types;
pub mod utility;
pub mod variations;
pub mod weekly;

use chrono::{Local, TimeZone};
use tracing::{debug, warn};

use crate::aggregate::daily::daily_points;
use crate::aggregate::types::{ChartData, Granularity, RawData};
use crate::aggregate::variations::{find_key_collisions, find_reserved_keys, resolve_variations};
use crate::aggregate::weekly::weekly_points;

/// Builds chart data with dates interpreted in the local time zone.
pub fn build_chart_data(raw: &RawData, granularity: Granularity) -> ChartData {
    build_chart_data_in(raw, granularity, &Local)
}

/// Builds chart data with dates interpreted in `tz`.
pub fn build_chart_data_in<Tz: TimeZone>(
    raw: &RawData,
    granularity: Granularity,
    tz: &Tz,
) -> ChartData {
    let variations = resolve_variations(&raw.variations);

    for collision in find_key_collisions(&variations) {
        warn!(
            key = %collision.key,
            names = ?collision.names,
            "Variations share a chart key, later values overwrite earlier ones"
        );
    }
    for clash in find_reserved_keys(&variations) {
        warn!(
            key = %clash.key,
            names = ?clash.names,
            "Variation key shadows a chart point field, serialized points repeat it"
        );
    }

    let points = match granularity {
        Granularity::Day => daily_points(&raw.data, &variations, tz),
        Granularity::Week => weekly_points(&raw.data, &variations, tz),
    };

    debug!(
        %granularity,
        variations = variations.len(),
        rows = raw.data.len(),
        points = points.len(),
        "Chart data built"
    );

    ChartData { variations, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::types::{RawDataPoint, RawVariation};
    use chrono::Utc;

    fn dataset() -> RawData {
        let mk = |date: &str, v0: u64, c0: u64, v1: u64, c1: u64| RawDataPoint {
            date: date.to_string(),
            visits: [("0".to_string(), v0), ("1".to_string(), v1)].into_iter().collect(),
            conversions: [("0".to_string(), c0), ("1".to_string(), c1)]
                .into_iter()
                .collect(),
        };

        RawData {
            variations: vec![
                RawVariation {
                    id: None,
                    name: "Original".to_string(),
                },
                RawVariation {
                    id: None,
                    name: "Variation A".to_string(),
                },
            ],
            data: vec![
                mk("2024-01-09", 100, 10, 100, 12),
                mk("2024-01-01", 200, 20, 200, 30),
                mk("2024-01-02", 100, 5, 100, 20),
            ],
        }
    }

    #[test]
    fn test_day_granularity_one_point_per_row() {
        let data = build_chart_data_in(&dataset(), Granularity::Day, &Utc);

        assert_eq!(data.variations.len(), 2);
        assert_eq!(data.points.len(), 3);
        assert_eq!(data.points[0].label, "2024-01-09");
        assert_eq!(data.points[0].values["variation-a"], Some(12.0));
    }

    #[test]
    fn test_week_granularity_buckets_and_sorts() {
        let data = build_chart_data_in(&dataset(), Granularity::Week, &Utc);

        assert_eq!(data.points.len(), 2);
        assert_eq!(data.points[0].label, "Week 1 2024");
        assert_eq!(data.points[1].label, "Week 2 2024");
        assert_eq!(data.points[0].values["original"], Some(25.0 / 300.0 * 100.0));
        assert_eq!(data.points[0].values["variation-a"], Some(50.0 / 300.0 * 100.0));
    }

    #[test]
    fn test_empty_dataset() {
        let data = build_chart_data_in(&RawData::default(), Granularity::Week, &Utc);
        assert!(data.variations.is_empty());
        assert!(data.points.is_empty());
    }

    #[test]
    fn test_local_entry_point_matches_explicit_zone() {
        assert_eq!(
            build_chart_data(&dataset(), Granularity::Day),
            build_chart_data_in(&dataset(), Granularity::Day, &Local)
        );
    }

    #[test]
    fn test_null_counts_behave_like_missing_ones() {
        let raw: RawData = serde_json::from_str(
            r#"{
                "variations": [{"name": "Original"}],
                "data": [
                    {"date": "2024-01-02", "visits": {"0": null}, "conversions": {"0": 7}},
                    {"date": "2024-01-01", "visits": {"0": 100}, "conversions": {"0": null}},
                    {"date": "2024-01-03", "visits": {"0": 100}, "conversions": {"0": 10}}
                ]
            }"#,
        )
        .unwrap();

        let daily = build_chart_data_in(&raw, Granularity::Day, &Utc);
        assert_eq!(daily.points[0].values["original"], None);
        assert_eq!(daily.points[1].values["original"], None);
        assert_eq!(daily.points[2].values["original"], Some(10.0));

        // Nulls are skipped in the sums: visits 100 + 100, conversions 7 + 10.
        let weekly = build_chart_data_in(&raw, Granularity::Week, &Utc);
        assert_eq!(weekly.points.len(), 1);
        assert_eq!(
            weekly.points[0].values["original"],
            utility::conversion_rate(Some(200), Some(17))
        );
    }
}
