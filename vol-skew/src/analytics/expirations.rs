//! Expiration index.
//!
//! Groups normalized records by expiration label and exposes the labels a
//! user can select. Records without a parseable expiration stay in the
//! snapshot but are never selectable.

use std::collections::BTreeMap;

use crate::data::NormalizedRecord;

/// Selectable expirations, built once from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ExpirationIndex {
    /// Label to record positions, in input order.
    groups: BTreeMap<String, Vec<usize>>,
    /// Sorted, deduplicated labels.
    labels: Vec<String>,
}

impl ExpirationIndex {
    pub fn build(records: &[NormalizedRecord]) -> Self {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            if !record.has_expiration() {
                continue;
            }
            groups
                .entry(record.expiration_label.clone())
                .or_default()
                .push(idx);
        }
        let labels = groups.keys().cloned().collect();
        Self { groups, labels }
    }

    /// Labels in ascending order, without duplicates or the missing sentinel.
    pub fn available_expirations(&self) -> &[String] {
        &self.labels
    }

    /// Initial selection: the smallest label.
    pub fn select_default(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.groups.contains_key(label)
    }

    /// Positions of the records carrying `label`, in input order.
    pub fn positions(&self, label: &str) -> &[usize] {
        self.groups.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn record_count(&self, label: &str) -> usize {
        self.positions(label).len()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{coerce, RecordKind, MISSING_EXPIRATION_LABEL};

    fn rec(venc: Option<&str>) -> NormalizedRecord {
        let date = venc.and_then(coerce::parse_date_str);
        NormalizedRecord {
            id: "opcion#1".to_string(),
            record_kind: RecordKind::Option,
            strike: Some(1.0),
            price: Some(1.0),
            implied_vol: Some(1.0),
            expiration_date: date,
            expiration_label: coerce::expiration_label(date),
            option_type: None,
            option_type_raw: None,
        }
    }

    #[test]
    fn test_sorted_unique_without_sentinel() {
        let records = vec![
            rec(Some("2025-06-20")),
            rec(Some("2025-03-21")),
            rec(None),
            rec(Some("2025-06-20")),
            rec(Some("2024-12-20")),
            rec(None),
        ];
        let index = ExpirationIndex::build(&records);

        assert_eq!(
            index.available_expirations(),
            &["2024-12-20", "2025-03-21", "2025-06-20"]
        );
        assert!(!index.contains(MISSING_EXPIRATION_LABEL));
        assert_eq!(index.select_default(), Some("2024-12-20"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_positions_keep_input_order() {
        let records = vec![
            rec(Some("2025-06-20")),
            rec(Some("2025-03-21")),
            rec(Some("2025-06-20")),
        ];
        let index = ExpirationIndex::build(&records);

        assert_eq!(index.positions("2025-06-20"), &[0, 2]);
        assert_eq!(index.record_count("2025-03-21"), 1);
        assert_eq!(index.record_count("2030-01-01"), 0);
    }

    #[test]
    fn test_short_year_dates_do_not_become_default() {
        let records = vec![
            rec(Some("2025-03-21")),
            rec(Some("21/03/25")),
            rec(Some("Mar 2025")),
        ];
        let index = ExpirationIndex::build(&records);

        assert_eq!(index.available_expirations(), &["2025-03-21"]);
        assert_eq!(index.select_default(), Some("2025-03-21"));
        assert_eq!(index.record_count("2025-03-21"), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = ExpirationIndex::build(&[rec(None)]);
        assert!(index.is_empty());
        assert_eq!(index.select_default(), None);
        assert!(index.available_expirations().is_empty());
    }
}
