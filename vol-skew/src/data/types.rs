//! Core data types for skew ingestion.
//!
//! Raw records arrive from the store as loosely typed field maps. The
//! normalizer turns them into [`NormalizedRecord`]s, where every value that
//! could fail to parse is an explicit `Option`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label used for records whose expiration could not be parsed.
///
/// Matches the string rendering of an absent date in the store exports, so
/// labels stay comparable with what users saw before.
pub const MISSING_EXPIRATION_LABEL: &str = "None";

/// A single untyped value as produced by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Arbitrary-precision number.
    Number(Decimal),
    Text(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable rendering for scalar values.
    pub fn display_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(d) => Some(d.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Field map for one store item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Kind of instrument a store item describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Option,
    Future,
}

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Exact match against the store's type labels.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Call" => Some(Self::Call),
            "Put" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Put => "Put",
        }
    }

    /// Series name used on the skew chart.
    pub fn series_name(&self) -> &'static str {
        match self {
            Self::Call => "Calls",
            Self::Put => "Puts",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single option record after coercion.
///
/// Numeric and date fields are `None` when the store value could not be
/// parsed. The record itself is always kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Discriminator value, e.g. `opcion#42`.
    pub id: String,

    pub record_kind: RecordKind,

    /// Strike price
    pub strike: Option<f64>,

    /// Option premium
    pub price: Option<f64>,

    /// Implied volatility, percentage-like units
    pub implied_vol: Option<f64>,

    pub expiration_date: Option<NaiveDate>,

    /// Canonical `YYYY-MM-DD` rendering of `expiration_date`, or
    /// [`MISSING_EXPIRATION_LABEL`].
    pub expiration_label: String,

    /// Parsed type; `None` for anything other than exactly `Call`/`Put`.
    pub option_type: Option<OptionType>,

    /// Type text as stored, kept for tabular display.
    pub option_type_raw: Option<String>,
}

impl NormalizedRecord {
    pub fn has_expiration(&self) -> bool {
        self.expiration_date.is_some()
    }

    /// Strike and vol together, when both are present.
    pub fn skew_point(&self) -> Option<(f64, f64)> {
        Some((self.strike?, self.implied_vol?))
    }
}
