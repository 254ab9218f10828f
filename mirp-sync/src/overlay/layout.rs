//! Layout provider seam
//!
//! The charting layer owns its margins, so the plotted area has to be read
//! back from the rendered geometry. [`LayoutProvider`] is the only way the
//! core sees that geometry; it knows nothing about the rendering technology.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Outcome of one geometry probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probe<T> {
    Ready(T),
    /// Not rendered yet; try again on the next paint
    Pending,
    /// The renderer cannot answer this probe at all
    Unsupported,
}

/// Geometry of a rendered chart
pub trait LayoutProvider: Send {
    /// Client size of the chart container, `None` when it is not mounted
    fn container_size(&self) -> Option<(f64, f64)>;

    /// Drawing surface, relative to the container
    fn surface_rect(&self) -> Probe<LayoutRect>;

    /// Plotted data area (grid), in surface coordinates
    fn plot_bbox(&self) -> Probe<LayoutRect>;
}

/// Fixed geometry, adjustable through any clone of the handle
#[derive(Debug, Clone)]
pub struct StaticLayout {
    inner: Arc<Mutex<StaticGeometry>>,
}

#[derive(Debug, Clone, Copy)]
struct StaticGeometry {
    container: Option<(f64, f64)>,
    surface: Probe<LayoutRect>,
    bbox: Probe<LayoutRect>,
}

impl StaticLayout {
    /// Fully rendered chart
    pub fn new(container: (f64, f64), surface: LayoutRect, bbox: LayoutRect) -> Self {
        Self::from_parts(Some(container), Probe::Ready(surface), Probe::Ready(bbox))
    }

    /// Container mounted, chart not rendered yet
    pub fn pending(container: (f64, f64)) -> Self {
        Self::from_parts(Some(container), Probe::Pending, Probe::Pending)
    }

    pub fn from_parts(
        container: Option<(f64, f64)>,
        surface: Probe<LayoutRect>,
        bbox: Probe<LayoutRect>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StaticGeometry {
                container,
                surface,
                bbox,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StaticGeometry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_container(&self, container: Option<(f64, f64)>) {
        self.lock().container = container;
    }

    pub fn set_surface(&self, surface: Probe<LayoutRect>) {
        self.lock().surface = surface;
    }

    pub fn set_plot_bbox(&self, bbox: Probe<LayoutRect>) {
        self.lock().bbox = bbox;
    }
}

impl LayoutProvider for StaticLayout {
    fn container_size(&self) -> Option<(f64, f64)> {
        self.lock().container
    }

    fn surface_rect(&self) -> Probe<LayoutRect> {
        self.lock().surface
    }

    fn plot_bbox(&self) -> Probe<LayoutRect> {
        self.lock().bbox
    }
}
