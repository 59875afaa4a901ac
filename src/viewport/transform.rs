use anyhow::anyhow;

/// A position in screen space, in pixels. Screen y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another pixel position.
    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Projection from geographic coordinates to the current screen, plus the
/// currently visible geographic bounds. Both are only valid for the current
/// pan/zoom state, so callers must re-query on every click instead of caching
/// projected positions.
///
/// `Sync` because the hit-test scan queries the transform from parallel
/// workers.
pub trait MapTransform: Sync {
    fn geo_to_pixel(&self, coord: geo::Coord) -> PixelPoint;
    fn visible_bounds(&self) -> geo::Rect;
}

/// Transform mapping a geographic bounding rect linearly onto a pixel canvas
/// of `width_px` by `height_px`. The y axis is inverted: the northern edge of
/// the bounds maps to pixel row zero.
pub struct LinearViewport {
    bounds: geo::Rect,
    width_px: f64,
    height_px: f64,
}

impl LinearViewport {
    pub fn new(bounds: geo::Rect, width_px: f64, height_px: f64) -> anyhow::Result<Self> {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(anyhow!("Viewport bounds are degenerate: {:?}", bounds));
        }
        if width_px <= 0.0 || height_px <= 0.0 {
            return Err(anyhow!(
                "Viewport pixel dimensions must be positive, got {}x{}",
                width_px,
                height_px
            ));
        }
        Ok(Self {
            bounds,
            width_px,
            height_px,
        })
    }
}

impl MapTransform for LinearViewport {
    fn geo_to_pixel(&self, coord: geo::Coord) -> PixelPoint {
        let x = (coord.x - self.bounds.min().x) / self.bounds.width() * self.width_px;
        let y = (self.bounds.max().y - coord.y) / self.bounds.height() * self.height_px;
        PixelPoint::new(x, y)
    }

    fn visible_bounds(&self) -> geo::Rect {
        self.bounds
    }
}
