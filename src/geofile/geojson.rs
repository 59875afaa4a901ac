use std::{fs, path::Path};

use anyhow::anyhow;

use crate::feature::rendered::{FeatureGeometry, RenderedFeature};

/// Read rendered features from a GeoJSON FeatureCollection.
///
/// Recognized properties: `layer_type`, `layer_title`, `popup_content` and
/// `backup_content`, all optional strings. Point, LineString, MultiLineString
/// and Polygon geometries are supported; features with any other geometry are
/// skipped, with a warning summarizing how many survived.
pub fn read_features_from_geojson(filepath: &Path) -> anyhow::Result<Vec<RenderedFeature>> {
    let contents = fs::read_to_string(filepath)?;
    let geojson_contents: geojson::GeoJson = contents.parse()?;
    let feature_collection = match geojson_contents {
        geojson::GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(anyhow!(
                "Expected a FeatureCollection in {:?}",
                filepath
            ))
        }
    };

    let num_features = feature_collection.features.len();
    let features: Vec<RenderedFeature> = feature_collection
        .features
        .into_iter()
        .filter_map(rendered_feature_from_geojson)
        .collect();
    if features.len() != num_features {
        log::warn!(
            "Out of {} features read, only {} had supported geometry.",
            num_features,
            features.len()
        )
    }
    Ok(features)
}

fn rendered_feature_from_geojson(feature: geojson::Feature) -> Option<RenderedFeature> {
    let geometry = feature.geometry.as_ref()?;
    let geo_geometry = match geo::Geometry::try_from(&geometry.value) {
        Ok(geo_geometry) => geo_geometry,
        Err(err) => {
            log::warn!("Could not convert feature geometry: {}", err);
            return None;
        }
    };
    let feature_geometry = match geo_geometry {
        geo::Geometry::Point(point) => FeatureGeometry::Point(point),
        geo::Geometry::LineString(line) => {
            FeatureGeometry::Polyline(geo::MultiLineString(vec![line]))
        }
        geo::Geometry::MultiLineString(lines) => FeatureGeometry::Polyline(lines),
        geo::Geometry::Polygon(polygon) => FeatureGeometry::Polygon(polygon),
        _ => return None,
    };

    let mut rendered = RenderedFeature::new(feature_geometry);
    if let Some(properties) = &feature.properties {
        rendered.layer_type = string_property(properties, "layer_type");
        rendered.layer_title = string_property(properties, "layer_title");
        rendered.popup_content = string_property(properties, "popup_content");
        rendered.backup_content = string_property(properties, "backup_content");
    }
    Some(rendered)
}

fn string_property(properties: &geojson::JsonObject, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}
