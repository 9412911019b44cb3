use crate::aggregate::types::{ChartPoint, RawDataPoint, Variation};
use crate::aggregate::utility::{conversion_rate, parse_timestamp};
use chrono::TimeZone;

/// One point per row, in input order.
///
/// The label is the raw date string; the timestamp is local midnight of that date.
pub fn daily_points<Tz: TimeZone>(
    rows: &[RawDataPoint],
    variations: &[Variation],
    tz: &Tz,
) -> Vec<ChartPoint> {
    rows.iter()
        .map(|row| {
            let mut point = ChartPoint::new(parse_timestamp(&row.date, tz), row.date.clone());

            for v in variations {
                let visits = row.visits.get(&v.id).copied();
                let conversions = row.conversions.get(&v.id).copied();
                point
                    .values
                    .insert(v.key.clone(), conversion_rate(visits, conversions));
            }

            point
        })
        .collect()
}
