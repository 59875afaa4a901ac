use std::collections::HashSet;

use rstar::primitives::{GeomWithData, Rectangle};

use super::rendered::{FeatureGeometry, FeatureIdx, RenderedFeature};

type PolygonEnvelope = GeomWithData<Rectangle<[f64; 2]>, FeatureIdx>;

/// The complete feature set produced by one redraw pass, in draw order.
///
/// A registry is immutable once built. A redraw constructs a brand-new
/// registry and swaps it in wholesale, so a click always scans one
/// self-consistent snapshot and never observes a partially rebuilt set.
///
/// Polygon bounding rects are indexed in an R-tree so that a click over a
/// registry with thousands of polygons only runs the full containment test on
/// the few whose bounding rect covers the click.
pub struct FeatureRegistry {
    features: Vec<RenderedFeature>,
    polygon_index: rstar::RTree<PolygonEnvelope>,
}

impl FeatureRegistry {
    pub fn new(features: Vec<RenderedFeature>) -> Self {
        let envelopes = features
            .iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                match (feature.geometry(), feature.bounding_rect()) {
                    (FeatureGeometry::Polygon(_), Some(rect)) => Some(PolygonEnvelope::new(
                        Rectangle::from_corners(
                            [rect.min().x, rect.min().y],
                            [rect.max().x, rect.max().y],
                        ),
                        idx,
                    )),
                    _ => None,
                }
            })
            .collect();
        Self {
            features,
            polygon_index: rstar::RTree::bulk_load(envelopes),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn features(&self) -> &[RenderedFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Indices of polygon features whose bounding rect contains the
    /// coordinate. Cheap shortlist run before the full containment test.
    pub fn polygon_candidates(&self, coord: geo::Coord) -> HashSet<FeatureIdx> {
        self.polygon_index
            .locate_all_at_point(&[coord.x, coord.y])
            .map(|envelope| envelope.data)
            .collect()
    }
}
