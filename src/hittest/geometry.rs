use anyhow::anyhow;

use crate::feature::rendered::{FeatureGeometry, RenderedFeature};
use crate::viewport::transform::MapTransform;

/// Default pixel radius within which a click matches a point or polyline
/// feature.
pub const DEFAULT_TOLERANCE_PX: f64 = 15.0;

/// Screen-space hit tolerance in pixels. Expressed in pixels rather than
/// geographic distance, so matching feels the same at every zoom level while
/// the geographic radius it covers varies.
#[derive(Debug, Clone, Copy)]
pub struct HitTolerance {
    pub pixels: f64,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            pixels: DEFAULT_TOLERANCE_PX,
        }
    }
}

/// Whether a click at `click` hits the feature under the current transform.
///
/// Projections are recomputed on every call; they change with pan and zoom,
/// so nothing here may be cached between clicks. Malformed geometry is
/// reported as an error for the caller's per-feature failure boundary.
pub fn feature_matches(
    feature: &RenderedFeature,
    click: geo::Coord,
    transform: &dyn MapTransform,
    tolerance: HitTolerance,
) -> anyhow::Result<bool> {
    match feature.geometry() {
        FeatureGeometry::Point(point) => {
            Ok(point_within_tolerance(point, click, transform, tolerance))
        }
        FeatureGeometry::Polyline(lines) => {
            polyline_within_tolerance(lines, click, transform, tolerance)
        }
        FeatureGeometry::Polygon(polygon) => {
            polygon_contains(polygon, feature.bounding_rect(), click)
        }
    }
}

/// A point feature matches when the pixel distance between its projection and
/// the click's projection is within tolerance.
pub fn point_within_tolerance(
    point: &geo::Point,
    click: geo::Coord,
    transform: &dyn MapTransform,
    tolerance: HitTolerance,
) -> bool {
    let feature_px = transform.geo_to_pixel(point.0);
    let click_px = transform.geo_to_pixel(click);
    feature_px.distance_to(&click_px) <= tolerance.pixels
}

/// A polyline matches when any vertex of any of its paths projects within
/// tolerance of the click.
///
/// This is a nearest-vertex approximation of point-to-segment distance: a
/// click on a long straight stretch far from every vertex is not matched.
/// Known accuracy gap, kept so matching behavior stays stable.
pub fn polyline_within_tolerance(
    lines: &geo::MultiLineString,
    click: geo::Coord,
    transform: &dyn MapTransform,
    tolerance: HitTolerance,
) -> anyhow::Result<bool> {
    let click_px = transform.geo_to_pixel(click);
    let mut saw_vertex = false;
    for path in &lines.0 {
        for coord in path.coords() {
            saw_vertex = true;
            if transform.geo_to_pixel(*coord).distance_to(&click_px) <= tolerance.pixels {
                return Ok(true);
            }
        }
    }
    if !saw_vertex {
        return Err(anyhow!("Polyline feature has no vertices"));
    }
    Ok(false)
}

/// Containment test for polygon features: a cheap bounding-rect rejection,
/// then an even-odd ray cast over the outer ring.
///
/// Interior rings are not subtracted: a click geometrically inside a hole
/// still counts as inside the polygon. Behavior for points exactly on the
/// boundary is implementation-defined.
pub fn polygon_contains(
    polygon: &geo::Polygon,
    bounding_rect: Option<&geo::Rect>,
    click: geo::Coord,
) -> anyhow::Result<bool> {
    if let Some(rect) = bounding_rect {
        if bounding_rect_excludes(rect, click) {
            return Ok(false);
        }
    }
    ray_cast_contains(polygon.exterior(), click)
}

/// True when the coordinate falls outside the rect. Borders count as inside
/// so the rejection never drops a coordinate the ray cast would accept.
pub fn bounding_rect_excludes(rect: &geo::Rect, coord: geo::Coord) -> bool {
    coord.x < rect.min().x
        || coord.x > rect.max().x
        || coord.y < rect.min().y
        || coord.y > rect.max().y
}

/// Even-odd ray cast over consecutive vertex pairs of a closed ring.
fn ray_cast_contains(ring: &geo::LineString, coord: geo::Coord) -> anyhow::Result<bool> {
    // A closed ring repeats its first coordinate, so four coordinates is the
    // smallest well-formed ring.
    if ring.0.len() < 4 {
        return Err(anyhow!(
            "Polygon outer ring has only {} coordinates",
            ring.0.len()
        ));
    }
    let coords = &ring.0;
    let mut inside = false;
    let mut j = coords.len() - 1;
    for i in 0..coords.len() {
        let a = coords[i];
        let b = coords[j];
        if (a.y > coord.y) != (b.y > coord.y)
            && coord.x < (b.x - a.x) * (coord.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    Ok(inside)
}
