use geo::BoundingRect;

/// Index of a feature within the registry snapshot that produced it. Indices
/// follow draw order.
pub type FeatureIdx = usize;

/// Geometry of one rendered feature.
#[derive(Debug, Clone)]
pub enum FeatureGeometry {
    Point(geo::Point),
    /// One or more vertex paths drawn as a single line feature.
    Polyline(geo::MultiLineString),
    /// The first ring is the outer boundary; any further rings are holes.
    Polygon(geo::Polygon),
}

impl FeatureGeometry {
    fn bounding_rect(&self) -> Option<geo::Rect> {
        match self {
            FeatureGeometry::Point(point) => Some(point.bounding_rect()),
            FeatureGeometry::Polyline(lines) => lines.bounding_rect(),
            FeatureGeometry::Polygon(polygon) => polygon.bounding_rect(),
        }
    }
}

/// One drawn geometry with the popup metadata captured for it at redraw time.
/// Features are never mutated after creation; a redraw replaces the whole set.
///
/// `popup_content` is the content blob captured at creation, independent of
/// whatever the rendering library currently has bound. `backup_content` is a
/// second capture used when the primary blob is missing.
#[derive(Debug, Clone)]
pub struct RenderedFeature {
    geometry: FeatureGeometry,
    bounding_rect: Option<geo::Rect>,
    pub layer_type: Option<String>,
    pub layer_title: Option<String>,
    pub popup_content: Option<String>,
    pub backup_content: Option<String>,
}

impl RenderedFeature {
    pub fn new(geometry: FeatureGeometry) -> Self {
        let bounding_rect = geometry.bounding_rect();
        Self {
            geometry,
            bounding_rect,
            layer_type: None,
            layer_title: None,
            popup_content: None,
            backup_content: None,
        }
    }

    pub fn with_layer_type(mut self, layer_type: &str) -> Self {
        self.layer_type = Some(layer_type.to_string());
        self
    }

    pub fn with_layer_title(mut self, layer_title: &str) -> Self {
        self.layer_title = Some(layer_title.to_string());
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.popup_content = Some(content.to_string());
        self
    }

    pub fn with_backup_content(mut self, content: &str) -> Self {
        self.backup_content = Some(content.to_string());
        self
    }

    pub fn geometry(&self) -> &FeatureGeometry {
        &self.geometry
    }

    /// Bounding rect computed once at creation. `None` for empty geometry.
    pub fn bounding_rect(&self) -> Option<&geo::Rect> {
        self.bounding_rect.as_ref()
    }

    /// Popup content with the backup fallback applied. `None` when both blobs
    /// are missing, in which case the feature is dropped from results rather
    /// than rendered as an empty entry.
    pub fn resolved_content(&self) -> Option<&str> {
        self.popup_content
            .as_deref()
            .or(self.backup_content.as_deref())
    }
}
