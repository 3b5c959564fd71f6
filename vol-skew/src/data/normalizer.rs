//! Raw record normalization.
//!
//! Steps, in order:
//! 1. Drop every record whose discriminator is not an option tag
//! 2. Coerce strike, price and implied vol to floats (missing on failure)
//! 3. Parse the expiration into a date (missing on failure)
//! 4. Derive the expiration label used for grouping
//!
//! Output keeps input order and never fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::coerce::{coerce_f64, expiration_label, parse_expiration};
use super::types::{NormalizedRecord, OptionType, RawRecord, RawValue, RecordKind};

/// Field names and tags of the store schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    /// Field holding the `<kind>#<id>` discriminator.
    pub discriminator: String,
    pub option_prefix: String,
    pub future_prefix: String,
    pub strike: String,
    pub price: String,
    pub implied_vol: String,
    pub expiration: String,
    pub option_type: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            discriminator: "tipo_id".to_string(),
            option_prefix: "opcion#".to_string(),
            future_prefix: "futuro#".to_string(),
            strike: "strike".to_string(),
            price: "precio".to_string(),
            implied_vol: "σ".to_string(),
            expiration: "vencimiento".to_string(),
            option_type: "tipo".to_string(),
        }
    }
}

/// Counts gathered during a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub scanned: usize,
    pub kept: usize,
    pub futures: usize,
    /// Records with no recognizable discriminator.
    pub unclassified: usize,
    pub missing_strike: usize,
    pub missing_price: usize,
    pub missing_vol: usize,
    pub missing_expiration: usize,
    /// Kept records whose type is neither `Call` nor `Put`.
    pub unknown_type: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.futures + self.unclassified
    }

    pub fn summary(&self) -> String {
        format!(
            "{} scanned, {} options kept, {} futures and {} unclassified dropped; \
             missing strike {}, price {}, vol {}, expiration {}; unknown type {}",
            self.scanned,
            self.kept,
            self.futures,
            self.unclassified,
            self.missing_strike,
            self.missing_price,
            self.missing_vol,
            self.missing_expiration,
            self.unknown_type
        )
    }
}

/// Converts raw store records into [`NormalizedRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    schema: RecordSchema,
}

impl Normalizer {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Classify a record by its discriminator prefix.
    ///
    /// Absent or non-text discriminators are unclassified.
    pub fn classify(&self, record: &RawRecord) -> Option<RecordKind> {
        let tag = record.get(&self.schema.discriminator)?.as_text()?;
        if tag.starts_with(&self.schema.option_prefix) {
            Some(RecordKind::Option)
        } else if tag.starts_with(&self.schema.future_prefix) {
            Some(RecordKind::Future)
        } else {
            None
        }
    }

    /// Normalize a batch, keeping only option records.
    pub fn normalize(&self, raw: &[RawRecord]) -> Vec<NormalizedRecord> {
        self.normalize_with_report(raw).0
    }

    /// Normalize a batch and report what was dropped or left missing.
    pub fn normalize_with_report(&self, raw: &[RawRecord]) -> (Vec<NormalizedRecord>, NormalizeReport) {
        let mut report = NormalizeReport {
            scanned: raw.len(),
            ..Default::default()
        };
        let mut out = Vec::with_capacity(raw.len());

        for record in raw {
            match self.classify(record) {
                Some(RecordKind::Option) => {}
                Some(RecordKind::Future) => {
                    report.futures += 1;
                    continue;
                }
                None => {
                    report.unclassified += 1;
                    continue;
                }
            }

            let normalized = self.normalize_option(record);
            report.missing_strike += normalized.strike.is_none() as usize;
            report.missing_price += normalized.price.is_none() as usize;
            report.missing_vol += normalized.implied_vol.is_none() as usize;
            report.missing_expiration += normalized.expiration_date.is_none() as usize;
            report.unknown_type += normalized.option_type.is_none() as usize;
            out.push(normalized);
        }

        report.kept = out.len();
        if report.unclassified > 0 {
            debug!("{} records without an option or future tag", report.unclassified);
        }
        info!("Normalized: {}", report.summary());
        (out, report)
    }

    fn normalize_option(&self, record: &RawRecord) -> NormalizedRecord {
        let s = &self.schema;
        let field_f64 = |name: &str| record.get(name).and_then(coerce_f64);

        let expiration_date = record.get(&s.expiration).and_then(parse_expiration);
        let option_type_raw = record.get(&s.option_type).and_then(RawValue::display_text);
        let option_type = record
            .get(&s.option_type)
            .and_then(RawValue::as_text)
            .and_then(OptionType::from_label);

        NormalizedRecord {
            id: record
                .get(&s.discriminator)
                .and_then(RawValue::as_text)
                .unwrap_or_default()
                .to_string(),
            record_kind: RecordKind::Option,
            strike: field_f64(&s.strike),
            price: field_f64(&s.price),
            implied_vol: field_f64(&s.implied_vol),
            expiration_date,
            expiration_label: expiration_label(expiration_date),
            option_type,
            option_type_raw,
        }
    }
}

impl NormalizedRecord {
    /// Re-emit this record in raw form. Missing fields are left out.
    pub fn to_raw(&self, schema: &RecordSchema) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert(schema.discriminator.as_str(), self.id.as_str());
        let numeric = [
            (&schema.strike, self.strike),
            (&schema.price, self.price),
            (&schema.implied_vol, self.implied_vol),
        ];
        for (field, value) in numeric {
            if let Some(v) = value {
                raw.insert(field.as_str(), v.to_string());
            }
        }
        if self.expiration_date.is_some() {
            raw.insert(schema.expiration.as_str(), self.expiration_label.as_str());
        }
        if let Some(t) = &self.option_type_raw {
            raw.insert(schema.option_type.as_str(), t.as_str());
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::MISSING_EXPIRATION_LABEL;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(pairs: &[(&str, RawValue)]) -> RawRecord {
        pairs.iter().cloned().collect()
    }

    fn option(id: &str, strike: &str, price: &str, vol: &str, venc: &str, tipo: &str) -> RawRecord {
        record(&[
            ("tipo_id", RawValue::text(id)),
            ("strike", RawValue::text(strike)),
            ("precio", RawValue::text(price)),
            ("σ", RawValue::text(vol)),
            ("vencimiento", RawValue::text(venc)),
            ("tipo", RawValue::text(tipo)),
        ])
    }

    fn future(id: &str) -> RawRecord {
        record(&[
            ("tipo_id", RawValue::text(id)),
            ("precio", RawValue::Number(dec!(11850.5))),
            ("vencimiento", RawValue::text("2025-03-21")),
        ])
    }

    #[test]
    fn test_futures_are_dropped() {
        let raw = vec![
            option("opcion#1", "6900", "10.5", "18.2", "2025-03-21", "Call"),
            future("futuro#1"),
            option("opcion#2", "6900", "9.1", "bad", "2025-03-21", "Put"),
        ];
        let (out, report) = Normalizer::default().normalize_with_report(&raw);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "opcion#1");
        assert_eq!(out[1].id, "opcion#2");
        assert_eq!(report.scanned, 3);
        assert_eq!(report.kept, 2);
        assert_eq!(report.futures, 1);
        assert_eq!(report.dropped(), 1);
        assert_eq!(report.missing_vol, 1);
    }

    #[test]
    fn test_unclassified_records_are_dropped() {
        let raw = vec![
            record(&[("strike", RawValue::text("6900"))]),
            record(&[("tipo_id", RawValue::Number(dec!(5)))]),
            record(&[("tipo_id", RawValue::text("OPCION#1"))]),
            record(&[("tipo_id", RawValue::text("x-opcion#1"))]),
            option("opcion#9", "7000", "1", "20", "2025-03-21", "Call"),
        ];
        let (out, report) = Normalizer::default().normalize_with_report(&raw);

        assert_eq!(out.len(), 1);
        assert_eq!(report.unclassified, 4);
        assert_eq!(report.futures, 0);
    }

    #[test]
    fn test_scenario_fields() {
        let raw = vec![option("opcion#1", "6900", "10.5", "18.2", "2025-03-21", "Call")];
        let out = Normalizer::default().normalize(&raw);
        let r = &out[0];

        assert_eq!(r.record_kind, RecordKind::Option);
        assert_eq!(r.strike, Some(6900.0));
        assert_eq!(r.price, Some(10.5));
        assert_eq!(r.implied_vol, Some(18.2));
        assert_eq!(r.expiration_date, NaiveDate::from_ymd_opt(2025, 3, 21));
        assert_eq!(r.expiration_label, "2025-03-21");
        assert_eq!(r.option_type, Some(OptionType::Call));
        assert_eq!(r.option_type_raw.as_deref(), Some("Call"));
    }

    #[test]
    fn test_decimal_fields_convert() {
        let raw = vec![record(&[
            ("tipo_id", RawValue::text("opcion#1")),
            ("strike", RawValue::Number(dec!(6900))),
            ("precio", RawValue::Number(dec!(123.45))),
            ("σ", RawValue::Number(dec!(18.20))),
            ("vencimiento", RawValue::text("2025-03-21")),
            ("tipo", RawValue::text("Put")),
        ])];
        let out = Normalizer::default().normalize(&raw);

        assert_eq!(out[0].strike, Some(6900.0));
        assert_eq!(out[0].price, Some(123.45));
        assert_eq!(out[0].implied_vol, Some(18.2));
        assert_eq!(out[0].option_type, Some(OptionType::Put));
    }

    #[test]
    fn test_bad_fields_become_missing() {
        let raw = vec![
            option("opcion#1", "n/a", "", "bad", "someday", "Call"),
            record(&[("tipo_id", RawValue::text("opcion#2"))]),
        ];
        let (out, report) = Normalizer::default().normalize_with_report(&raw);

        assert_eq!(out.len(), 2);
        for r in &out {
            assert_eq!(r.strike, None);
            assert_eq!(r.price, None);
            assert_eq!(r.implied_vol, None);
            assert_eq!(r.expiration_date, None);
            assert_eq!(r.expiration_label, MISSING_EXPIRATION_LABEL);
        }
        assert_eq!(out[1].option_type, None);
        assert_eq!(out[1].option_type_raw, None);
        assert_eq!(report.missing_strike, 2);
        assert_eq!(report.missing_expiration, 2);
        assert_eq!(report.unknown_type, 1);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let raw = vec![option("opcion#1", "6900", "1", "18", "2025-03-21", "call")];
        let out = Normalizer::default().normalize(&raw);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].option_type, None);
        assert_eq!(out[0].option_type_raw.as_deref(), Some("call"));
    }

    #[test]
    fn test_equal_dates_yield_equal_labels() {
        let raw = vec![
            option("opcion#1", "1", "1", "1", "2025-03-21", "Call"),
            option("opcion#2", "1", "1", "1", "21/03/2025", "Call"),
            option("opcion#3", "1", "1", "1", "2025-03-21T10:00:00", "Put"),
            record(&[
                ("tipo_id", RawValue::text("opcion#4")),
                ("vencimiento", RawValue::Number(dec!(20250321))),
            ]),
        ];
        let out = Normalizer::default().normalize(&raw);

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.expiration_label == "2025-03-21"));
    }

    #[test]
    fn test_order_is_preserved() {
        let raw: Vec<_> = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    future(&format!("futuro#{}", i))
                } else {
                    option(&format!("opcion#{}", i), "1", "1", "1", "2025-03-21", "Call")
                }
            })
            .collect();
        let out = Normalizer::default().normalize(&raw);

        let ids: Vec<_> = out.iter().map(|r| r.id.clone()).collect();
        let expected: Vec<_> = (0..20)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("opcion#{}", i))
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_renormalization_is_idempotent() {
        let normalizer = Normalizer::default();
        let raw = vec![
            option("opcion#1", "6900", "10.5", "18.2", "2025-03-21", "Call"),
            future("futuro#1"),
            option("opcion#2", "6900", "9.1", "bad", "21 Mar 2025", "Put"),
            option("opcion#3", "7000.125", "0.3", "22.75", "never", "Straddle"),
        ];
        let first = normalizer.normalize(&raw);

        let refed: Vec<_> = first.iter().map(|r| r.to_raw(normalizer.schema())).collect();
        let second = normalizer.normalize(&refed);

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_schema() {
        let schema = RecordSchema {
            discriminator: "kind".to_string(),
            option_prefix: "opt:".to_string(),
            implied_vol: "iv".to_string(),
            ..Default::default()
        };
        let raw = vec![record(&[
            ("kind", RawValue::text("opt:1")),
            ("iv", RawValue::text("30.5")),
        ])];
        let out = Normalizer::new(schema).normalize(&raw);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].implied_vol, Some(30.5));
    }
}
