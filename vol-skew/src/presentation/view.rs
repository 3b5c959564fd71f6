//! Chart, table and selector descriptions for one selection.

use serde::Serialize;

use crate::analytics::{SkewCurve, SkewCurveSet, TableRow};
use crate::config::PresentationConfig;
use crate::snapshot::SkewSnapshot;

pub const X_AXIS_TITLE: &str = "Strike";
pub const Y_AXIS_TITLE: &str = "Implied Volatility (%)";

/// Fixed table column order.
pub const TABLE_COLUMNS: [&str; 4] = ["strike", "type", "price", "implied_vol"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    LinesAndMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    pub mode: SeriesMode,
    pub points: Vec<ChartPoint>,
}

impl From<&SkewCurve> for SeriesSpec {
    fn from(curve: &SkewCurve) -> Self {
        Self {
            name: curve.option_type.series_name().to_string(),
            mode: SeriesMode::LinesAndMarkers,
            points: curve
                .points
                .iter()
                .map(|p| ChartPoint {
                    x: p.strike,
                    y: p.implied_vol,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Zero, one or two series; calls before puts.
    pub series: Vec<SeriesSpec>,
}

impl ChartSpec {
    pub fn series(&self, name: &str) -> Option<&SeriesSpec> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub page_size: usize,
}

impl TableSpec {
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size.max(1))
    }

    /// Rows of a zero-based page; empty past the end.
    pub fn page(&self, page: usize) -> &[TableRow] {
        let size = self.page_size.max(1);
        let start = page.saturating_mul(size).min(self.rows.len());
        let end = start.saturating_add(size).min(self.rows.len());
        &self.rows[start..end]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorSpec {
    pub options: Vec<String>,
    pub selected: Option<String>,
}

/// Everything a sink needs to present one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkewView {
    pub title: String,
    pub selector: SelectorSpec,
    pub chart: ChartSpec,
    pub table: TableSpec,
}

impl SkewView {
    /// Render the view for `selected`, or the default expiration when
    /// `selected` is `None`.
    pub fn render(
        snapshot: &SkewSnapshot,
        selected: Option<&str>,
        config: &PresentationConfig,
    ) -> Self {
        let index = snapshot.expirations();
        let selected = selected
            .map(str::to_string)
            .or_else(|| index.select_default().map(str::to_string));

        let set = match &selected {
            Some(label) => snapshot.build(label),
            None => SkewCurveSet {
                expiration: String::new(),
                calls: None,
                puts: None,
                table: Vec::new(),
            },
        };

        Self::from_curve_set(
            &set,
            SelectorSpec {
                options: index.available_expirations().to_vec(),
                selected,
            },
            config,
        )
    }

    pub fn from_curve_set(
        set: &SkewCurveSet,
        selector: SelectorSpec,
        config: &PresentationConfig,
    ) -> Self {
        let series = set
            .curves()
            .map(|curve| {
                if config.sort_points_by_strike {
                    SeriesSpec::from(&curve.sorted_by_strike())
                } else {
                    SeriesSpec::from(curve)
                }
            })
            .collect();

        Self {
            title: config.title.clone(),
            selector,
            chart: ChartSpec {
                title: format!("Volatility Skew - Expiration {}", set.expiration),
                x_axis_title: X_AXIS_TITLE.to_string(),
                y_axis_title: Y_AXIS_TITLE.to_string(),
                series,
            },
            table: TableSpec {
                columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                rows: set.table.clone(),
                page_size: config.page_size,
            },
        }
    }
}
