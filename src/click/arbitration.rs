use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;

use crate::feature::registry::FeatureRegistry;
use crate::feature::rendered::{FeatureGeometry, FeatureIdx, RenderedFeature};
use crate::grouping::group::{group_matches, FeatureMatch};
use crate::grouping::infer::resolve_group_identity;
use crate::hittest::geometry::{feature_matches, HitTolerance};
use crate::popup::controller::{decide, PopupDecision, TabbedPopup};
use crate::popup::host::PopupHost;
use crate::viewport::transform::MapTransform;

/// What the caller should do with an intercepted feature-level click event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Consume the event: stop propagation and keep the rendering library's
    /// own single-feature popup from opening.
    Stop,
    Propagate,
}

/// Session-scoped context for one mounted map: the current registry snapshot,
/// the transform and popup host seams, and the state of the open popup.
///
/// Created when the map mounts and dropped when it unmounts; no state lives
/// at module level. Both click entry points funnel into the single
/// [`MapSession::resolve_at`] aggregation path.
pub struct MapSession<T: MapTransform, H: PopupHost> {
    registry: Arc<FeatureRegistry>,
    transform: T,
    host: H,
    tolerance: HitTolerance,
    open_popup: Option<TabbedPopup>,
}

impl<T: MapTransform, H: PopupHost> MapSession<T, H> {
    pub fn new(transform: T, host: H) -> Self {
        Self {
            registry: Arc::new(FeatureRegistry::empty()),
            transform,
            host,
            tolerance: HitTolerance::default(),
            open_popup: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: HitTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Swap in the complete feature set produced by a redraw. The swap is
    /// wholesale: a scan that already cloned the previous snapshot keeps
    /// scanning that one, and the next click sees only the new one.
    pub fn replace_registry(&mut self, features: Vec<RenderedFeature>) {
        log::debug!("Replacing feature registry ({} features)", features.len());
        self.registry = Arc::new(FeatureRegistry::new(features));
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Feature-level entry point: the rendering library delivered a click to
    /// one feature and would open its own popup for it. The same geographic
    /// point goes through the shared aggregation path instead, and the
    /// returned disposition tells the caller to suppress the default popup.
    pub fn on_feature_click(&mut self, click: geo::Coord) -> EventDisposition {
        self.resolve_at(click);
        EventDisposition::Stop
    }

    /// Background entry point: a click that landed on no feature directly.
    /// Features may still overlap that pixel even though only the topmost
    /// one would have received a native event, so the full registry is
    /// scanned.
    pub fn on_map_click(&mut self, click: geo::Coord) {
        self.resolve_at(click);
    }

    /// Resolve and present disambiguation at a geographic point. Closes the
    /// previous popup, scans one registry snapshot, groups the matches, and
    /// opens the resulting popup through the host.
    pub fn resolve_at(&mut self, click: geo::Coord) {
        self.close_popup();

        let registry = Arc::clone(&self.registry);
        let matches = scan_registry(&registry, click, &self.transform, self.tolerance);
        log::debug!(
            "{} feature(s) matched at ({}, {})",
            matches.len(),
            click.x,
            click.y
        );

        match decide(group_matches(matches)) {
            PopupDecision::NoMatch => {}
            PopupDecision::Single(feature_match) => {
                self.host.open(click, &feature_match.content);
            }
            PopupDecision::Tabbed(popup) => {
                self.host.open(click, &popup.markup());
                self.open_popup = Some(popup);
            }
        }
    }

    /// Close whatever popup is open and drop its tab state.
    pub fn close_popup(&mut self) {
        self.host.close();
        self.open_popup = None;
    }

    /// The host signals that the popup subtree finished mounting; this arms
    /// tab switching for the open tabbed popup. Single popups need no
    /// interaction wiring and ignore the signal.
    pub fn on_popup_mounted(&mut self) {
        if let Some(popup) = &mut self.open_popup {
            popup.mark_mounted();
        }
    }

    /// Delegated click anywhere inside the popup root. `tab_key` carries the
    /// key attribute of the clicked element when it was a tab button; clicks
    /// on anything else pass `None` and are ignored.
    pub fn on_popup_click(&mut self, tab_key: Option<&str>) {
        let Some(key) = tab_key else {
            return;
        };
        let Some(popup) = &mut self.open_popup else {
            return;
        };
        if let Some(switch) = popup.handle_tab_click(key) {
            self.host.apply_tab_switch(&switch);
        }
    }
}

/// Hit-test every feature of one registry snapshot against the click, in draw
/// order. Each feature runs inside its own failure boundary: malformed
/// geometry or missing content drops that feature with a log entry and the
/// scan continues.
fn scan_registry<T: MapTransform>(
    registry: &FeatureRegistry,
    click: geo::Coord,
    transform: &T,
    tolerance: HitTolerance,
) -> Vec<FeatureMatch> {
    let polygon_candidates = registry.polygon_candidates(click);
    registry
        .features()
        .par_iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            match try_match_feature(
                idx,
                feature,
                &polygon_candidates,
                click,
                transform,
                tolerance,
            ) {
                Ok(result) => result,
                Err(err) => {
                    log::warn!("Skipping feature {} in hit-test scan: {:#}", idx, err);
                    None
                }
            }
        })
        .collect()
}

fn try_match_feature<T: MapTransform>(
    idx: FeatureIdx,
    feature: &RenderedFeature,
    polygon_candidates: &HashSet<FeatureIdx>,
    click: geo::Coord,
    transform: &T,
    tolerance: HitTolerance,
) -> anyhow::Result<Option<FeatureMatch>> {
    if matches!(feature.geometry(), FeatureGeometry::Polygon(_))
        && !polygon_candidates.contains(&idx)
    {
        // The bounding-rect shortlist already ruled this polygon out.
        return Ok(None);
    }
    if !feature_matches(feature, click, transform, tolerance)? {
        return Ok(None);
    }
    let Some(content) = feature.resolved_content() else {
        log::debug!("Feature {} matched but has no popup content; dropped", idx);
        return Ok(None);
    };
    let identity = resolve_group_identity(feature, content, idx);
    Ok(Some(FeatureMatch {
        feature_idx: idx,
        group_key: identity.key,
        group_title: identity.title,
        content: content.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::{EventDisposition, MapSession};
    use crate::feature::rendered::{FeatureGeometry, RenderedFeature};
    use crate::popup::host::{PopupHost, TabSwitch};
    use crate::popup::markup::ENTRY_SEPARATOR;
    use crate::viewport::transform::LinearViewport;

    /// Host that records every call for inspection.
    #[derive(Default)]
    struct RecordingHost {
        opened: Vec<(geo::Coord, String)>,
        closes: usize,
        switches: Vec<TabSwitch>,
    }

    impl PopupHost for RecordingHost {
        fn open(&mut self, anchor: geo::Coord, markup: &str) {
            self.opened.push((anchor, markup.to_string()));
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn apply_tab_switch(&mut self, switch: &TabSwitch) {
            self.switches.push(switch.clone());
        }
    }

    fn test_viewport() -> LinearViewport {
        // One pixel per geographic unit.
        LinearViewport::new(
            geo::Rect::new(
                geo::coord! { x: 0.0, y: 0.0 },
                geo::coord! { x: 1024.0, y: 1024.0 },
            ),
            1024.0,
            1024.0,
        )
        .unwrap()
    }

    fn test_session() -> MapSession<LinearViewport, RecordingHost> {
        MapSession::new(test_viewport(), RecordingHost::default())
    }

    fn zone_polygon(tag: &str, title: &str, content: &str) -> RenderedFeature {
        RenderedFeature::new(FeatureGeometry::Polygon(geo::Polygon::new(
            geo::LineString::from(vec![
                (100.0, 100.0),
                (300.0, 100.0),
                (300.0, 300.0),
                (100.0, 300.0),
            ]),
            vec![],
        )))
        .with_layer_type(tag)
        .with_layer_title(title)
        .with_content(content)
    }

    fn marker(x: f64, y: f64, tag: &str, title: &str, content: &str) -> RenderedFeature {
        RenderedFeature::new(FeatureGeometry::Point(geo::Point::new(x, y)))
            .with_layer_type(tag)
            .with_layer_title(title)
            .with_content(content)
    }

    #[test]
    fn test_overlapping_layers_get_tabbed_popup() {
        // Two polygons of layer "a" and one marker of layer "b" all under the
        // same click.
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            zone_polygon("a", "Zones", "<p>zone 2</p>"),
            marker(200.0, 200.0, "b", "Markers", "<p>marker 1</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 1);
        let markup = &host.opened[0].1;
        assert_eq!(markup.matches("<button").count(), 2);
        assert!(markup.contains(">Zones (2)</button>"));
        assert!(markup.contains(">Markers</button>"));
        assert!(!markup.contains("Markers (1)"));
        assert!(markup.contains(&format!("<p>zone 1</p>{}<p>zone 2</p>", ENTRY_SEPARATOR)));
    }

    #[test]
    fn test_single_match_opens_content_directly() {
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            marker(800.0, 800.0, "b", "Markers", "<p>marker 1</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 800.0, y: 800.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 1);
        assert_eq!(host.opened[0].1, "<p>marker 1</p>");
        assert!(!host.opened[0].1.contains("<button"));
    }

    #[test]
    fn test_no_match_only_closes_previous_popup() {
        let mut session = test_session();
        session.replace_registry(vec![marker(100.0, 100.0, "b", "Markers", "<p>m</p>")]);

        session.on_map_click(geo::coord! { x: 900.0, y: 900.0 });

        let host = session.host();
        assert!(host.opened.is_empty());
        // The aggregation path always closes first, even when nothing opens.
        assert_eq!(host.closes, 1);
    }

    #[test]
    fn test_both_entry_points_share_one_path() {
        let click = geo::coord! { x: 200.0, y: 200.0 };
        let features = vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            marker(200.0, 200.0, "b", "Markers", "<p>marker 1</p>"),
        ];

        let mut feature_session = test_session();
        feature_session.replace_registry(features.clone());
        let disposition = feature_session.on_feature_click(click);
        assert_eq!(disposition, EventDisposition::Stop);

        let mut map_session = test_session();
        map_session.replace_registry(features);
        map_session.on_map_click(click);

        // Same click, same registry: both entry points open identical popups.
        assert_eq!(
            feature_session.host().opened[0].1,
            map_session.host().opened[0].1
        );
    }

    #[test]
    fn test_new_click_replaces_open_popup() {
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            zone_polygon("a", "Zones", "<p>zone 2</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });
        session.on_popup_mounted();
        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 2);
        // One close per aggregation run.
        assert_eq!(host.closes, 2);
        // The replacement popup has fresh, unmounted tab state.
        session.on_popup_click(Some("a"));
        assert!(session.host().switches.is_empty());
    }

    #[test]
    fn test_tab_switching_after_mount() {
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            marker(200.0, 200.0, "b", "Markers", "<p>marker 1</p>"),
        ]);
        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        // Before the mount signal, delegated clicks are no-ops.
        session.on_popup_click(Some("b"));
        assert!(session.host().switches.is_empty());

        session.on_popup_mounted();
        session.on_popup_click(None); // click inside the popup, not on a tab
        session.on_popup_click(Some("b"));

        let switches = &session.host().switches;
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].activate_key, "b");
        assert_eq!(switches[0].deactivate_keys, vec!["a".to_string()]);
    }

    #[test]
    fn test_malformed_feature_does_not_abort_scan() {
        let mut session = test_session();
        let broken = RenderedFeature::new(FeatureGeometry::Polygon(geo::Polygon::new(
            geo::LineString::from(vec![(100.0, 100.0), (300.0, 300.0)]),
            vec![],
        )))
        .with_layer_type("a")
        .with_content("<p>broken</p>");
        session.replace_registry(vec![
            broken,
            marker(200.0, 200.0, "b", "Markers", "<p>marker 1</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 1);
        assert_eq!(host.opened[0].1, "<p>marker 1</p>");
    }

    #[test]
    fn test_contentless_feature_dropped_and_backup_used() {
        let mut session = test_session();
        let no_content = RenderedFeature::new(FeatureGeometry::Point(geo::Point::new(
            200.0, 200.0,
        )))
        .with_layer_type("a");
        let mut backup_only = marker(200.0, 200.0, "b", "Markers", "ignored");
        backup_only.popup_content = None;
        backup_only.backup_content = Some("<p>from backup</p>".to_string());
        session.replace_registry(vec![no_content, backup_only]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 1);
        assert_eq!(host.opened[0].1, "<p>from backup</p>");
    }

    #[test]
    fn test_repeat_click_is_idempotent() {
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>zone 1</p>"),
            marker(200.0, 200.0, "b", "Markers", "<p>marker 1</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });
        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened.len(), 2);
        assert_eq!(host.opened[0].1, host.opened[1].1);
    }

    #[test]
    fn test_registry_swap_changes_next_click() {
        let mut session = test_session();
        session.replace_registry(vec![marker(200.0, 200.0, "b", "Markers", "<p>old</p>")]);
        assert_eq!(session.registry().len(), 1);
        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        session.replace_registry(vec![marker(200.0, 200.0, "b", "Markers", "<p>new</p>")]);
        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let host = session.host();
        assert_eq!(host.opened[0].1, "<p>old</p>");
        assert_eq!(host.opened[1].1, "<p>new</p>");
    }

    #[test]
    fn test_draw_order_preserved_in_matches() {
        let mut session = test_session();
        session.replace_registry(vec![
            zone_polygon("a", "Zones", "<p>first</p>"),
            zone_polygon("a", "Zones", "<p>second</p>"),
            zone_polygon("a", "Zones", "<p>third</p>"),
        ]);

        session.on_map_click(geo::coord! { x: 200.0, y: 200.0 });

        let markup = &session.host().opened[0].1;
        let first = markup.find("<p>first</p>").unwrap();
        let second = markup.find("<p>second</p>").unwrap();
        let third = markup.find("<p>third</p>").unwrap();
        assert!(first < second && second < third);
    }
}
