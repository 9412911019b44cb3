use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::aggregate::types::RawData;
use crate::aggregate::utility::{conversion_rate, parse_date};
use crate::aggregate::variations::resolve_variations;

/// Whole-dataset totals for one variation.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct VariationTotals {
    pub id: String,
    pub key: String,
    pub name: String,
    pub visits: u64,
    pub conversions: u64,
    pub rate: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub invalid_dates: usize,
    pub variations: Vec<VariationTotals>,
}

impl DatasetSummary {
    pub fn from_raw(raw: &RawData) -> Self {
        Self::from_raw_in(raw, &Local)
    }

    pub fn from_raw_in<Tz: TimeZone>(raw: &RawData, tz: &Tz) -> Self {
        let mut s = DatasetSummary {
            rows: raw.data.len(),
            ..Default::default()
        };

        for row in &raw.data {
            match parse_date(&row.date, tz) {
                Some(dt) => {
                    let day = dt.date_naive();
                    s.first_date = Some(s.first_date.map_or(day, |d| d.min(day)));
                    s.last_date = Some(s.last_date.map_or(day, |d| d.max(day)));
                }
                None => s.invalid_dates += 1,
            }
        }

        for v in resolve_variations(&raw.variations) {
            let mut visits: Option<u64> = None;
            let mut conversions: Option<u64> = None;

            for row in &raw.data {
                if let Some(n) = row.visits.get(&v.id) {
                    visits = Some(visits.unwrap_or(0).saturating_add(*n));
                }
                if let Some(n) = row.conversions.get(&v.id) {
                    conversions = Some(conversions.unwrap_or(0).saturating_add(*n));
                }
            }

            s.variations.push(VariationTotals {
                rate: conversion_rate(visits, conversions),
                visits: visits.unwrap_or(0),
                conversions: conversions.unwrap_or(0),
                id: v.id,
                key: v.key,
                name: v.name,
            });
        }

        s
    }

    /// Keys of the variations with the highest overall rate.
    pub fn leaders(&self) -> Vec<&str> {
        let max = self
            .variations
            .iter()
            .filter_map(|v| v.rate)
            .fold(f64::NEG_INFINITY, f64::max);

        self.variations
            .iter()
            .filter(|v| v.rate == Some(max))
            .map(|v| v.key.as_str())
            .collect()
    }
}
