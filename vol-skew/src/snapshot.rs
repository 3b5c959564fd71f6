//! Immutable skew snapshot.
//!
//! Built once from a full scan and shared read-only afterwards. Refreshing
//! means building a new snapshot and swapping the `Arc`; a snapshot is never
//! modified in place.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::analytics::{ExpirationIndex, SkewCurveBuilder, SkewCurveSet};
use crate::data::{
    fetch_all_with, NormalizeReport, NormalizedRecord, Normalizer, PageProgress, RawRecord,
    RecordSource, SourceError,
};

/// Normalized records plus the expiration index derived from them.
#[derive(Debug, Clone)]
pub struct SkewSnapshot {
    records: Vec<NormalizedRecord>,
    expirations: ExpirationIndex,
    report: NormalizeReport,
    loaded_at: DateTime<Utc>,
}

impl SkewSnapshot {
    /// Scan `source` to the end, normalize, and index.
    ///
    /// Any source error aborts the load.
    pub async fn load<S: RecordSource>(
        source: &mut S,
        normalizer: &Normalizer,
    ) -> Result<Self, SourceError> {
        Self::load_with(source, normalizer, |_| {}).await
    }

    /// Like [`SkewSnapshot::load`], reporting scan progress per page.
    pub async fn load_with<S, F>(
        source: &mut S,
        normalizer: &Normalizer,
        on_page: F,
    ) -> Result<Self, SourceError>
    where
        S: RecordSource,
        F: FnMut(&PageProgress),
    {
        let raw = fetch_all_with(source, on_page).await?;
        Ok(Self::from_raw(&raw, normalizer))
    }

    /// Build a snapshot from records already in memory.
    pub fn from_raw(raw: &[RawRecord], normalizer: &Normalizer) -> Self {
        let (records, report) = normalizer.normalize_with_report(raw);
        let expirations = ExpirationIndex::build(&records);
        info!(
            "Snapshot ready: {} option records, {} expirations",
            records.len(),
            expirations.len()
        );
        Self {
            records,
            expirations,
            report,
            loaded_at: Utc::now(),
        }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn expirations(&self) -> &ExpirationIndex {
        &self.expirations
    }

    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn builder(&self) -> SkewCurveBuilder<'_> {
        SkewCurveBuilder::new(&self.records)
    }

    /// Curves and table for one expiration label.
    pub fn build(&self, label: &str) -> SkewCurveSet {
        self.builder().build(label)
    }

    /// Curves and tables for every selectable expiration.
    pub fn build_all(&self) -> Vec<SkewCurveSet> {
        self.builder()
            .build_all(self.expirations.available_expirations())
    }
}
