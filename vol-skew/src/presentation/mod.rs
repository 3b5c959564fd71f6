//! Presentation descriptions and sinks.
//!
//! Rendering itself is owned by whoever implements [`PresentationSink`].

pub mod sink;
pub mod view;

pub use sink::{JsonSink, PresentError, PresentationSink, TextSink};
pub use view::{ChartPoint, ChartSpec, SelectorSpec, SeriesMode, SeriesSpec, SkewView, TableSpec};
