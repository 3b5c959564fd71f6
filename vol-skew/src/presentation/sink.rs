//! Presentation sinks.
//!
//! A sink receives a fully built [`SkewView`]; how it is shown is up to the
//! sink. Two writers are provided: pretty JSON and a plain-text report.

use std::io::Write;

use thiserror::Error;

use super::view::SkewView;

#[derive(Error, Debug)]
pub enum PresentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives chart, table and selector descriptions.
pub trait PresentationSink {
    fn present(&mut self, view: &SkewView) -> Result<(), PresentError>;
}

/// Writes each view as pretty-printed JSON.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for JsonSink<W> {
    fn present(&mut self, view: &SkewView) -> Result<(), PresentError> {
        serde_json::to_writer_pretty(&mut self.out, view)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Writes a plain-text summary of the chart and one page of the table.
pub struct TextSink<W: Write> {
    out: W,
    page: usize,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, page: 0 }
    }

    /// Zero-based table page to print. Pages past the end print the last one.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

const SEPARATOR: &str = "============================================================";

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl<W: Write> PresentationSink for TextSink<W> {
    fn present(&mut self, view: &SkewView) -> Result<(), PresentError> {
        let out = &mut self.out;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "{}", view.title)?;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(
            out,
            "Expirations: {} (selected: {})",
            view.selector.options.join(", "),
            view.selector.selected.as_deref().unwrap_or("-")
        )?;
        writeln!(out)?;

        writeln!(out, "{}", view.chart.title)?;
        writeln!(out, "  x: {}  y: {}", view.chart.x_axis_title, view.chart.y_axis_title)?;
        if view.chart.series.is_empty() {
            writeln!(out, "  (no series)")?;
        }
        for series in &view.chart.series {
            let points: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("({}, {})", p.x, p.y))
                .collect();
            writeln!(out, "  {} [{}]: {}", series.name, series.points.len(), points.join(" "))?;
        }
        writeln!(out)?;

        let table = &view.table;
        let page_count = table.page_count();
        let page = self.page.min(page_count.saturating_sub(1));
        writeln!(
            out,
            "Data ({} rows, page {} of {})",
            table.rows.len(),
            if page_count == 0 { 0 } else { page + 1 },
            page_count
        )?;
        writeln!(
            out,
            "{:>12} {:>8} {:>12} {:>12}",
            table.columns[0], table.columns[1], table.columns[2], table.columns[3]
        )?;
        for row in table.page(page) {
            writeln!(
                out,
                "{:>12} {:>8} {:>12} {:>12}",
                cell(row.strike),
                row.option_type,
                cell(row.price),
                cell(row.implied_vol)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresentationConfig;
    use crate::data::{Normalizer, RawRecord, RawValue};
    use crate::snapshot::SkewSnapshot;

    fn view() -> SkewView {
        let raw: Vec<RawRecord> = vec![
            [
                ("tipo_id", "opcion#1"),
                ("strike", "6900"),
                ("precio", "10.5"),
                ("σ", "18.2"),
                ("vencimiento", "2025-03-21"),
                ("tipo", "Call"),
            ],
            [
                ("tipo_id", "opcion#2"),
                ("strike", "6900"),
                ("precio", "9.1"),
                ("σ", "bad"),
                ("vencimiento", "2025-03-21"),
                ("tipo", "Put"),
            ],
        ]
        .into_iter()
        .map(|pairs| pairs.into_iter().map(|(k, v)| (k, RawValue::text(v))).collect())
        .collect();
        let snapshot = SkewSnapshot::from_raw(&raw, &Normalizer::default());
        SkewView::render(&snapshot, None, &PresentationConfig::default())
    }

    #[test]
    fn test_json_sink() {
        let mut sink = JsonSink::new(Vec::new());
        sink.present(&view()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();

        assert_eq!(value["selector"]["selected"], "2025-03-21");
        assert_eq!(value["chart"]["series"][0]["name"], "Calls");
        assert_eq!(value["chart"]["series"][0]["mode"], "lines_and_markers");
        assert_eq!(value["chart"]["series"][0]["points"][0]["x"], 6900.0);
        assert_eq!(value["chart"]["series"].as_array().unwrap().len(), 1);
        assert_eq!(value["table"]["rows"].as_array().unwrap().len(), 2);
        assert!(value["table"]["rows"][1]["implied_vol"].is_null());
    }

    #[test]
    fn test_text_sink() {
        let mut sink = TextSink::new(Vec::new());
        sink.present(&view()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.contains("Volatility Skew - MINI IBEX"));
        assert!(text.contains("Volatility Skew - Expiration 2025-03-21"));
        assert!(text.contains("Calls [1]: (6900, 18.2)"));
        assert!(!text.contains("Puts"));
        assert!(text.contains("Data (2 rows, page 1 of 1)"));
    }

    #[test]
    fn test_text_sink_clamps_page_past_end() {
        let mut sink = TextSink::new(Vec::new()).with_page(5);
        sink.present(&view()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.contains("Data (2 rows, page 1 of 1)"));
        assert!(!text.contains("page 6"));
        assert!(text.contains("        6900     Call"));
    }

    #[test]
    fn test_text_sink_without_series() {
        let empty = SkewSnapshot::from_raw(&[], &Normalizer::default());
        let view = SkewView::render(&empty, None, &PresentationConfig::default());
        let mut sink = TextSink::new(Vec::new());
        sink.present(&view).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.contains("(no series)"));
        assert!(text.contains("Data (0 rows, page 0 of 0)"));
    }
}
