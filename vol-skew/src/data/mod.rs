pub mod coerce;
pub mod dynamo;
pub mod normalizer;
pub mod source;
pub mod types;

pub use dynamo::{DynamoScanSource, ScanExportSource, ScanResponse};
pub use normalizer::{NormalizeReport, Normalizer, RecordSchema};
pub use source::{fetch_all, fetch_all_with, PageProgress, RecordSource, ScanKey, ScanPage, SourceError};
pub use types::{
    NormalizedRecord, OptionType, RawRecord, RawValue, RecordKind, MISSING_EXPIRATION_LABEL,
};
