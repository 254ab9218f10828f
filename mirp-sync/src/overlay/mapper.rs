//! Overlay coordinate mapper
//!
//! Keeps the stored [`PlotRect`] in sync with the rendered chart and maps
//! between time and overlay pixels. Mount, DOM mutation, resize and paint
//! retries all funnel into the same idempotent measure; measurements are
//! applied in completion order, so the last completed one wins.

use super::layout::{LayoutProvider, LayoutRect, Probe};
use crate::playback::scrub::OverlayBox;
use mirp_common::config::Margins;
use mirp_common::PlotRect;
use tracing::{debug, trace};

/// Why a measurement was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureTrigger {
    Mount,
    Mutation,
    Resize,
    /// Retry scheduled by an earlier incomplete measurement
    Paint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureOutcome {
    Measured { rect: PlotRect, changed: bool },
    /// Geometry not available yet; will retry on the next paint
    Retry,
    /// Mapper torn down; nothing was written
    Abandoned,
}

/// Derive the plotted data area from the rendered geometry
///
/// # Returns
/// `None` when the chart is not laid out yet
pub fn measure_plot_rect(layout: &dyn LayoutProvider, margin: &Margins) -> Option<PlotRect> {
    let (cw, ch) = layout
        .container_size()
        .filter(|&(w, h)| w > 0.0 && h > 0.0)?;

    let surface = match layout.surface_rect() {
        Probe::Ready(rect) => Some(rect),
        Probe::Pending => return None,
        Probe::Unsupported => None,
    };
    let bbox = match layout.plot_bbox() {
        Probe::Ready(rect) => Some(rect),
        Probe::Pending => return None,
        Probe::Unsupported => None,
    };

    let raw = match (surface, bbox) {
        (Some(s), Some(b)) => LayoutRect::new(s.x + b.x, s.y + b.y, b.width, b.height),
        // No bbox support: surface minus nominal margins
        (Some(s), None) => LayoutRect::new(
            s.x + margin.left,
            s.y + margin.top,
            s.width - margin.horizontal(),
            s.height - margin.vertical(),
        ),
        (None, _) => LayoutRect::new(
            margin.left,
            margin.top,
            cw - margin.horizontal(),
            ch - margin.vertical(),
        ),
    };

    let px = |v: f64| if v.is_finite() { v.round().max(0.0) } else { 0.0 };
    Some(PlotRect::new(px(raw.x), px(raw.y), px(raw.width), px(raw.height)))
}

pub struct OverlayMapper {
    layout: Box<dyn LayoutProvider>,
    margin: Margins,
    rect: Option<PlotRect>,
    domain: (f64, f64),
    retry_pending: bool,
    torn_down: bool,
}

impl OverlayMapper {
    pub fn new(layout: Box<dyn LayoutProvider>, margin: Margins) -> Self {
        Self {
            layout,
            margin,
            rect: None,
            domain: (0.0, 1.0),
            retry_pending: false,
            torn_down: false,
        }
    }

    pub fn set_domain(&mut self, min: f64, max: f64) {
        self.domain = (min, max.max(min));
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Last completed measurement
    pub fn plot_rect(&self) -> Option<PlotRect> {
        self.rect
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Re-derive the plot rectangle
    ///
    /// A mount also schedules one correction pass on the following paint,
    /// since the first layout is often provisional.
    pub fn request_measure(&mut self, trigger: MeasureTrigger) -> MeasureOutcome {
        if self.torn_down {
            return MeasureOutcome::Abandoned;
        }

        let Some(rect) = measure_plot_rect(self.layout.as_ref(), &self.margin) else {
            trace!("Plot geometry not ready ({:?}), retrying on next paint", trigger);
            self.retry_pending = true;
            return MeasureOutcome::Retry;
        };

        let changed = self.rect != Some(rect);
        self.rect = Some(rect);
        self.retry_pending = trigger == MeasureTrigger::Mount;
        if changed {
            debug!(
                "Plot rect {:?}: left {} top {} width {} height {}",
                trigger, rect.left, rect.top, rect.width, rect.height
            );
        }
        MeasureOutcome::Measured { rect, changed }
    }

    /// Paint opportunity: run the scheduled retry, if any
    pub fn on_paint(&mut self) -> Option<MeasureOutcome> {
        if !self.retry_pending || self.torn_down {
            return None;
        }
        self.retry_pending = false;
        Some(self.request_measure(MeasureTrigger::Paint))
    }

    /// X within the container for time `t`, clamped to the plot
    pub fn time_to_pixel(&self, t: f64) -> Option<f64> {
        let (min, max) = self.domain;
        let span = max - min;
        let fraction = if span > 0.0 && t.is_finite() {
            ((t - min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.fraction_to_pixel(fraction)
    }

    /// Offset from the plot's left edge for time `t` (overlay-local X)
    pub fn time_to_offset(&self, t: f64) -> Option<f64> {
        let rect = self.rect?;
        self.time_to_pixel(t).map(|x| x - rect.left)
    }

    /// Time under container X, clamped to the domain
    pub fn pixel_to_time(&self, x: f64) -> f64 {
        let (min, max) = self.domain;
        match self.rect {
            Some(rect) if rect.width > 0.0 && x.is_finite() => {
                let fraction = ((x - rect.left) / rect.width).clamp(0.0, 1.0);
                min + fraction * (max - min)
            }
            _ => min,
        }
    }

    /// X within the container for a duration fraction (visual cursor)
    pub fn fraction_to_pixel(&self, fraction: f64) -> Option<f64> {
        let rect = self.rect?;
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(rect.left + f * rect.width)
    }

    /// Pointer-hit box of the overlay, for the scrub controller
    pub fn overlay_box(&self) -> OverlayBox {
        match self.rect {
            Some(rect) => OverlayBox::new(rect.left, rect.width),
            None => OverlayBox::new(0.0, 0.0),
        }
    }

    /// Abandon pending work; later measurements write nothing
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.retry_pending = false;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::layout::StaticLayout;

    fn margins() -> Margins {
        Margins::default()
    }

    fn rendered() -> StaticLayout {
        StaticLayout::new(
            (600.0, 300.0),
            LayoutRect::new(10.0, 5.0, 580.0, 290.0),
            LayoutRect::new(40.4, 19.6, 500.2, 240.0),
        )
    }

    #[test]
    fn test_measure_from_bbox() {
        let rect = measure_plot_rect(&rendered(), &margins()).unwrap();
        assert_eq!(rect, PlotRect::new(50.0, 25.0, 500.0, 240.0));
    }

    #[test]
    fn test_measure_without_bbox_support() {
        let layout = rendered();
        layout.set_plot_bbox(Probe::Unsupported);
        let rect = measure_plot_rect(&layout, &margins()).unwrap();
        assert_eq!(rect, PlotRect::new(46.0, 25.0, 528.0, 248.0));
    }

    #[test]
    fn test_measure_without_surface_geometry() {
        let layout = StaticLayout::from_parts(
            Some((400.0, 200.0)),
            Probe::Unsupported,
            Probe::Unsupported,
        );
        let rect = measure_plot_rect(&layout, &margins()).unwrap();
        assert_eq!(rect, PlotRect::new(36.0, 20.0, 348.0, 158.0));
    }

    #[test]
    fn test_measure_not_ready() {
        assert!(measure_plot_rect(&StaticLayout::pending((400.0, 200.0)), &margins()).is_none());
        let layout = rendered();
        layout.set_container(Some((0.0, 300.0)));
        assert!(measure_plot_rect(&layout, &margins()).is_none());
        layout.set_container(None);
        assert!(measure_plot_rect(&layout, &margins()).is_none());
    }

    #[test]
    fn test_negative_sizes_floor_at_zero() {
        let layout = StaticLayout::from_parts(Some((30.0, 20.0)), Probe::Unsupported, Probe::Unsupported);
        let rect = measure_plot_rect(&layout, &margins()).unwrap();
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
    }

    #[test]
    fn test_retry_on_next_paint() {
        let layout = StaticLayout::pending((600.0, 300.0));
        let mut mapper = OverlayMapper::new(Box::new(layout.clone()), margins());

        assert_eq!(mapper.request_measure(MeasureTrigger::Mutation), MeasureOutcome::Retry);
        assert!(mapper.retry_pending());

        layout.set_surface(Probe::Ready(LayoutRect::new(0.0, 0.0, 600.0, 300.0)));
        layout.set_plot_bbox(Probe::Ready(LayoutRect::new(40.0, 20.0, 520.0, 250.0)));
        let outcome = mapper.on_paint().unwrap();
        assert!(matches!(outcome, MeasureOutcome::Measured { changed: true, .. }));
        assert!(mapper.on_paint().is_none());
    }

    #[test]
    fn test_mount_schedules_correction_pass() {
        let layout = rendered();
        let mut mapper = OverlayMapper::new(Box::new(layout.clone()), margins());
        mapper.request_measure(MeasureTrigger::Mount);
        assert!(mapper.retry_pending());

        layout.set_plot_bbox(Probe::Ready(LayoutRect::new(30.0, 20.0, 520.0, 240.0)));
        match mapper.on_paint() {
            Some(MeasureOutcome::Measured { rect, changed }) => {
                assert!(changed);
                assert_eq!(rect.left, 40.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_last_measurement_wins() {
        let layout = rendered();
        let mut mapper = OverlayMapper::new(Box::new(layout.clone()), margins());
        mapper.request_measure(MeasureTrigger::Resize);
        layout.set_plot_bbox(Probe::Ready(LayoutRect::new(0.0, 0.0, 100.0, 100.0)));
        mapper.request_measure(MeasureTrigger::Mutation);
        assert_eq!(mapper.plot_rect().unwrap().width, 100.0);

        let again = mapper.request_measure(MeasureTrigger::Resize);
        assert!(matches!(again, MeasureOutcome::Measured { changed: false, .. }));
    }

    #[test]
    fn test_teardown_abandons() {
        let layout = StaticLayout::pending((600.0, 300.0));
        let mut mapper = OverlayMapper::new(Box::new(layout.clone()), margins());
        mapper.request_measure(MeasureTrigger::Mount);
        mapper.teardown();
        assert!(mapper.on_paint().is_none());
        assert_eq!(mapper.request_measure(MeasureTrigger::Resize), MeasureOutcome::Abandoned);
        assert!(mapper.plot_rect().is_none());
    }

    #[test]
    fn test_time_pixel_mapping() {
        let mut mapper = OverlayMapper::new(Box::new(rendered()), margins());
        mapper.request_measure(MeasureTrigger::Resize);
        mapper.set_domain(0.0, 120.0);

        assert_eq!(mapper.time_to_pixel(0.0), Some(50.0));
        assert_eq!(mapper.time_to_pixel(60.0), Some(300.0));
        assert_eq!(mapper.time_to_pixel(500.0), Some(550.0));
        assert_eq!(mapper.pixel_to_time(300.0), 60.0);
        assert_eq!(mapper.pixel_to_time(0.0), 0.0);
        assert_eq!(mapper.time_to_offset(60.0), Some(250.0));
        assert_eq!(mapper.time_to_offset(120.0), Some(500.0));

        for x in [50.0, 123.0, 377.5, 550.0] {
            let back = mapper.time_to_pixel(mapper.pixel_to_time(x)).unwrap();
            assert!((back - x).abs() < 1e-9, "{} -> {}", x, back);
        }
    }

    #[test]
    fn test_no_rect_yet() {
        let mapper = OverlayMapper::new(Box::new(StaticLayout::pending((1.0, 1.0))), margins());
        assert_eq!(mapper.time_to_pixel(1.0), None);
        assert_eq!(mapper.pixel_to_time(40.0), 0.0);
        assert_eq!(mapper.overlay_box(), OverlayBox::new(0.0, 0.0));
    }
}
