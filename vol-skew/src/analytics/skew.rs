//! Skew curve construction.
//!
//! For one expiration, splits the records into Call and Put groups and turns
//! each group into a sequence of (strike, implied vol) points. Points keep
//! the order in which records were scanned; nothing is sorted here.

use rayon::prelude::*;
use serde::Serialize;

use crate::data::{NormalizedRecord, OptionType};

/// One point of a skew curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkewPoint {
    pub strike: f64,
    pub implied_vol: f64,
}

/// Implied vol against strike for one option type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkewCurve {
    pub option_type: OptionType,
    pub points: Vec<SkewPoint>,
}

impl SkewCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copy of this curve with points in ascending strike order.
    pub fn sorted_by_strike(&self) -> Self {
        let mut points = self.points.clone();
        points.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Self {
            option_type: self.option_type,
            points,
        }
    }
}

/// Row of the data table shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub strike: Option<f64>,
    #[serde(rename = "type")]
    pub option_type: String,
    pub price: Option<f64>,
    pub implied_vol: Option<f64>,
}

impl From<&NormalizedRecord> for TableRow {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            strike: record.strike,
            option_type: record.option_type_raw.clone().unwrap_or_default(),
            price: record.price,
            implied_vol: record.implied_vol,
        }
    }
}

/// Everything derived for one selected expiration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkewCurveSet {
    pub expiration: String,
    /// Absent when no call has both strike and implied vol.
    pub calls: Option<SkewCurve>,
    /// Absent when no put has both strike and implied vol.
    pub puts: Option<SkewCurve>,
    /// All records of the expiration, including those left off the curves.
    pub table: Vec<TableRow>,
}

impl SkewCurveSet {
    /// Present curves, calls first.
    pub fn curves(&self) -> impl Iterator<Item = &SkewCurve> {
        self.calls.iter().chain(self.puts.iter())
    }

    pub fn curve(&self, option_type: OptionType) -> Option<&SkewCurve> {
        match option_type {
            OptionType::Call => self.calls.as_ref(),
            OptionType::Put => self.puts.as_ref(),
        }
    }

    pub fn has_curves(&self) -> bool {
        self.calls.is_some() || self.puts.is_some()
    }
}

/// Builds [`SkewCurveSet`]s from a read-only record slice.
#[derive(Debug, Clone, Copy)]
pub struct SkewCurveBuilder<'a> {
    records: &'a [NormalizedRecord],
}

impl<'a> SkewCurveBuilder<'a> {
    pub fn new(records: &'a [NormalizedRecord]) -> Self {
        Self { records }
    }

    /// Build curves and table for the records whose label equals `label`.
    pub fn build(&self, label: &str) -> SkewCurveSet {
        let selected: Vec<&NormalizedRecord> = self
            .records
            .iter()
            .filter(|r| r.expiration_label == label)
            .collect();

        SkewCurveSet {
            expiration: label.to_string(),
            calls: curve_for(&selected, OptionType::Call),
            puts: curve_for(&selected, OptionType::Put),
            table: selected.iter().map(|&r| TableRow::from(r)).collect(),
        }
    }

    /// Build several expirations in parallel. Output follows `labels` order.
    pub fn build_all(&self, labels: &[String]) -> Vec<SkewCurveSet> {
        labels.par_iter().map(|label| self.build(label)).collect()
    }
}

fn curve_for(records: &[&NormalizedRecord], option_type: OptionType) -> Option<SkewCurve> {
    let points: Vec<SkewPoint> = records
        .iter()
        .filter(|r| r.option_type == Some(option_type))
        .filter_map(|r| r.skew_point())
        .map(|(strike, implied_vol)| SkewPoint { strike, implied_vol })
        .collect();

    if points.is_empty() {
        None
    } else {
        Some(SkewCurve {
            option_type,
            points,
        })
    }
}
