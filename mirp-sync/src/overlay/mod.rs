//! Overlay coordinate mapper and the layout provider it measures through

pub mod layout;
pub mod mapper;

pub use layout::{LayoutProvider, LayoutRect, Probe, StaticLayout};
pub use mapper::{measure_plot_rect, MeasureOutcome, MeasureTrigger, OverlayMapper};
