//! DynamoDB scan sources.
//!
//! Items use the DynamoDB JSON attribute-value encoding
//! (`{"S": "Call"}`, `{"N": "6900"}`, ...). Numbers decode into
//! arbitrary-precision decimals; coercion to floats happens later in the
//! normalizer.
//!
//! Two sources are provided:
//! - [`DynamoScanSource`] issues `Scan` requests over HTTP. Requests are not
//!   signed, so point it at DynamoDB Local or a signing proxy.
//! - [`ScanExportSource`] replays captured `Scan` responses from disk.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::source::{RecordSource, ScanKey, ScanPage, SourceError};
use super::types::{RawRecord, RawValue};

const SCAN_TARGET: &str = "DynamoDB_20120810.Scan";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Raw `Scan` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanResponse {
    #[serde(default)]
    pub items: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Value>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl ScanResponse {
    /// Decode every item into a [`ScanPage`].
    pub fn into_page(self) -> Result<ScanPage, SourceError> {
        let items = self
            .items
            .iter()
            .map(decode_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScanPage {
            items,
            last_evaluated_key: self.last_evaluated_key.map(ScanKey),
        })
    }
}

/// Error body returned by DynamoDB on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(alias = "Message", default)]
    message: String,
}

/// Decode one item (attribute name to attribute value).
pub fn decode_item(item: &Map<String, Value>) -> Result<RawRecord, SourceError> {
    let mut record = RawRecord::new();
    for (name, value) in item {
        record.insert(name.clone(), decode_attribute(value)?);
    }
    Ok(record)
}

/// Decode a single attribute value.
pub fn decode_attribute(value: &Value) -> Result<RawValue, SourceError> {
    let obj = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| SourceError::InvalidResponse(format!("Bad attribute value: {}", value)))?;
    let (descriptor, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| SourceError::InvalidResponse("Empty attribute value".to_string()))?;

    match descriptor.as_str() {
        "S" | "B" => Ok(RawValue::Text(expect_str(descriptor, inner)?.to_string())),
        "N" => Ok(decode_number(expect_str(descriptor, inner)?)),
        "BOOL" => inner
            .as_bool()
            .map(RawValue::Bool)
            .ok_or_else(|| invalid(descriptor, inner)),
        "NULL" => Ok(RawValue::Null),
        "L" => inner
            .as_array()
            .ok_or_else(|| invalid(descriptor, inner))?
            .iter()
            .map(decode_attribute)
            .collect::<Result<Vec<_>, _>>()
            .map(RawValue::List),
        "M" => {
            let map = inner.as_object().ok_or_else(|| invalid(descriptor, inner))?;
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(k.clone(), decode_attribute(v)?);
            }
            Ok(RawValue::Map(out))
        }
        "SS" | "BS" | "NS" => {
            let members = inner.as_array().ok_or_else(|| invalid(descriptor, inner))?;
            members
                .iter()
                .map(|m| {
                    let s = expect_str(descriptor, m)?;
                    Ok(if descriptor == "NS" {
                        decode_number(s)
                    } else {
                        RawValue::Text(s.to_string())
                    })
                })
                .collect::<Result<Vec<_>, SourceError>>()
                .map(RawValue::List)
        }
        other => Err(SourceError::InvalidResponse(format!(
            "Unknown attribute type: {}",
            other
        ))),
    }
}

/// Numbers beyond decimal range stay as text and are coerced downstream.
fn decode_number(s: &str) -> RawValue {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(RawValue::Number)
        .unwrap_or_else(|_| RawValue::Text(s.to_string()))
}

fn expect_str<'a>(descriptor: &str, value: &'a Value) -> Result<&'a str, SourceError> {
    value.as_str().ok_or_else(|| invalid(descriptor, value))
}

fn invalid(descriptor: &str, value: &Value) -> SourceError {
    SourceError::InvalidResponse(format!("Bad {} attribute: {}", descriptor, value))
}

/// Scans a table over the DynamoDB JSON protocol.
pub struct DynamoScanSource {
    client: Client,
    endpoint: String,
    table: String,
    page_limit: Option<u32>,
    request_count: u64,
}

impl DynamoScanSource {
    /// Create a source for `table`. Without an explicit endpoint the
    /// regional AWS endpoint is used.
    pub fn new(table: &str, region: &str, endpoint: Option<&str>) -> Self {
        let endpoint = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://dynamodb.{}.amazonaws.com", region));
        Self {
            client: Client::new(),
            endpoint,
            table: table.to_string(),
            page_limit: None,
            request_count: 0,
        }
    }

    pub fn with_page_limit(mut self, limit: Option<u32>) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get request count for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    fn request_body(&self, start_key: Option<&ScanKey>) -> Value {
        let mut body = json!({ "TableName": self.table });
        if let Some(limit) = self.page_limit {
            body["Limit"] = json!(limit);
        }
        if let Some(key) = start_key {
            body["ExclusiveStartKey"] = key.0.clone();
        }
        body
    }
}

impl RecordSource for DynamoScanSource {
    async fn scan_page(&mut self, start_key: Option<&ScanKey>) -> Result<ScanPage, SourceError> {
        let body = self.request_body(start_key);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", SCAN_TARGET)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await?;
        self.request_count += 1;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let parsed: Option<ErrorBody> = serde_json::from_str(&text).ok();
            let (kind, message) = match parsed {
                Some(e) => (e.kind, e.message),
                None => (String::new(), text),
            };
            return Err(SourceError::Api {
                status: status.as_u16(),
                kind,
                message,
            });
        }

        let scan: ScanResponse = response.json().await.map_err(|e| {
            SourceError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;
        debug!(
            table = %self.table,
            request = self.request_count,
            count = scan.items.len(),
            "Scan response"
        );
        scan.into_page()
    }
}

/// Replays captured `Scan` responses.
///
/// The first call returns the first response. A start key returns the
/// response after the one whose `LastEvaluatedKey` equals it.
pub struct ScanExportSource {
    responses: Vec<ScanResponse>,
}

impl ScanExportSource {
    pub fn from_responses(responses: Vec<ScanResponse>) -> Self {
        Self { responses }
    }

    /// Load every `*.json` file in `dir`, ordered by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut responses = Vec::with_capacity(paths.len());
        for path in &paths {
            let content = std::fs::read_to_string(path)?;
            let response: ScanResponse = serde_json::from_str(&content).map_err(|e| {
                SourceError::InvalidResponse(format!("{}: {}", path.display(), e))
            })?;
            responses.push(response);
        }

        info!("Loaded {} scan pages from {}", responses.len(), dir.display());
        Ok(Self { responses })
    }

    pub fn page_count(&self) -> usize {
        self.responses.len()
    }
}

impl RecordSource for ScanExportSource {
    async fn scan_page(&mut self, start_key: Option<&ScanKey>) -> Result<ScanPage, SourceError> {
        let idx = match start_key {
            None => 0,
            Some(key) => self
                .responses
                .iter()
                .position(|r| r.last_evaluated_key.as_ref() == Some(&key.0))
                .map(|i| i + 1)
                .ok_or_else(|| SourceError::UnknownStartKey(key.to_string()))?,
        };

        match self.responses.get(idx) {
            Some(response) => response.clone().into_page(),
            // An empty export is an empty table.
            None if idx == 0 => Ok(ScanPage::default()),
            None => Err(SourceError::UnknownStartKey(format!(
                "page {} of {}",
                idx,
                self.responses.len()
            ))),
        }
    }
}
