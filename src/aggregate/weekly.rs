use crate::aggregate::types::{ChartPoint, RawDataPoint, Variation};
use crate::aggregate::utility::{INVALID_TIMESTAMP, WeekKey, conversion_rate, parse_date};
use chrono::TimeZone;
use std::collections::HashMap;

/// Running totals for one week bucket.
struct WeekAccumulator {
    timestamp: i64,
    label: String,
    visits: HashMap<String, u64>,
    conversions: HashMap<String, u64>,
}

impl WeekAccumulator {
    fn new(timestamp: i64, key: WeekKey) -> Self {
        Self {
            timestamp,
            label: key.label(),
            visits: HashMap::new(),
            conversions: HashMap::new(),
        }
    }

    fn add_row(&mut self, row: &RawDataPoint, variations: &[Variation]) {
        for v in variations {
            if let Some(visits) = row.visits.get(&v.id) {
                let total = self.visits.entry(v.id.clone()).or_insert(0);
                *total = total.saturating_add(*visits);
            }
            if let Some(conversions) = row.conversions.get(&v.id) {
                let total = self.conversions.entry(v.id.clone()).or_insert(0);
                *total = total.saturating_add(*conversions);
            }
        }
    }

    fn into_point(self, variations: &[Variation]) -> ChartPoint {
        let mut point = ChartPoint::new(self.timestamp, self.label);

        for v in variations {
            let visits = self.visits.get(&v.id).copied();
            let conversions = self.conversions.get(&v.id).copied();
            point
                .values
                .insert(v.key.clone(), conversion_rate(visits, conversions));
        }

        point
    }
}

/// Buckets rows into year-relative weeks and computes one rate per bucket.
///
/// Visits and conversions are summed per variation before dividing. A bucket
/// takes the timestamp of the first row that opened it. Output is sorted by
/// timestamp; rows with unparseable dates share one bucket at
/// [`INVALID_TIMESTAMP`].
pub fn weekly_points<Tz: TimeZone>(
    rows: &[RawDataPoint],
    variations: &[Variation],
    tz: &Tz,
) -> Vec<ChartPoint> {
    let mut index: HashMap<WeekKey, usize> = HashMap::new();
    let mut buckets: Vec<WeekAccumulator> = Vec::new();

    for row in rows {
        let (key, timestamp) = match parse_date(&row.date, tz) {
            Some(date) => (WeekKey::of(&date), date.timestamp_millis()),
            None => (WeekKey::Invalid, INVALID_TIMESTAMP),
        };

        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push(WeekAccumulator::new(timestamp, key));
            buckets.len() - 1
        });

        buckets[slot].add_row(row, variations);
    }

    let mut points: Vec<ChartPoint> = buckets
        .into_iter()
        .map(|acc| acc.into_point(variations))
        .collect();

    points.sort_by_key(|p| p.timestamp);
    points
}
