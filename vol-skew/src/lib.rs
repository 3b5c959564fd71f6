pub mod analytics;
pub mod config;
pub mod data;
pub mod presentation;
pub mod snapshot;

// Re-export commonly used types
pub use analytics::{ExpirationIndex, SkewCurve, SkewCurveBuilder, SkewCurveSet, SkewPoint, TableRow};
pub use config::{AppConfig, PresentationConfig, SourceConfig};
pub use data::{
    fetch_all, DynamoScanSource, NormalizedRecord, Normalizer, OptionType, RawRecord, RawValue,
    RecordSchema, RecordSource, ScanExportSource, SourceError,
};
pub use presentation::{JsonSink, PresentationSink, SkewView, TextSink};
pub use snapshot::SkewSnapshot;
