use crate::types::{OverlayCategory, OverlayFeature, TractRecord};
use anyhow::{Context, Result, anyhow};
use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    // Whole collection is held in memory; metro tract files are small.
    let geojson = GeoJson::from_reader(reader)
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(anyhow!("{:?} must be a FeatureCollection", path)),
    }
}

/// Loads tract polygons with their approval statistics.
///
/// Features without polygonal geometry are skipped. A missing `gap` is
/// derived from the two rates.
pub fn load_tracts(path: &Path) -> Result<Vec<TractRecord>> {
    debug!("Loading tracts from {:?}", path);
    let collection = read_feature_collection(path)?;
    tracts_from_collection(collection)
}

pub fn tracts_from_collection(collection: FeatureCollection) -> Result<Vec<TractRecord>> {
    let mut tracts = Vec::with_capacity(collection.features.len());
    let empty = JsonObject::new();

    for feature in collection.features {
        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    other => {
                        debug!("Skipping non-polygon tract geometry: {}", geometry_kind(&other));
                        continue;
                    }
                }
            }
            None => {
                debug!("Skipping tract without geometry");
                continue;
            }
        };

        let props = feature.properties.as_ref().unwrap_or(&empty);
        let white_rate = number(props, "white_rate").unwrap_or(0.0);
        let black_rate = number(props, "black_rate").unwrap_or(0.0);
        let gap = number(props, "gap").unwrap_or(white_rate - black_rate);

        tracts.push(TractRecord {
            geometry,
            white_total: count(props, "white_total"),
            black_total: count(props, "black_total"),
            white_rate,
            black_rate,
            gap,
        });
    }

    Ok(tracts)
}

/// Loads a water/park/landmark overlay file. Features whose `type` tag is
/// not a known overlay category are ignored.
pub fn load_overlays(path: &Path) -> Result<Vec<OverlayFeature>> {
    debug!("Loading overlay from {:?}", path);
    let collection = read_feature_collection(path)?;
    let mut overlays = Vec::new();

    for feature in collection.features {
        let props = match feature.properties.as_ref() {
            Some(props) => props,
            None => continue,
        };

        let category = match props.get("type").and_then(|v| v.as_str()).and_then(OverlayCategory::from_tag) {
            Some(c) => c,
            None => continue,
        };

        let geometry: geo::Geometry<f64> = match feature.geometry {
            Some(geom) => geom.value.try_into()
                .map_err(|e| anyhow!("Failed to convert overlay geometry: {:?}", e))?,
            None => continue,
        };

        let name = props.get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| category.default_name().to_string());

        overlays.push(OverlayFeature { geometry, category, name });
    }

    Ok(overlays)
}

fn number(props: &JsonObject, key: &str) -> Option<f64> {
    let value: Option<f64> = match props.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn count(props: &JsonObject, key: &str) -> f64 {
    match number(props, key) {
        Some(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        geo::Geometry::Polygon(_) | geo::Geometry::MultiPolygon(_) => "Polygon",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(json: &str) -> FeatureCollection {
        match json.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            other => panic!("expected a FeatureCollection, got {other:?}"),
        }
    }

    #[test]
    fn tracts_read_counts_and_derive_missing_gap() {
        let fc = collection(r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
                 "properties": {"white_total": 12.0, "black_total": 3, "white_rate": 0.8, "black_rate": 0.6}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [0, 0]},
                 "properties": {"white_total": 1}},
                {"type": "Feature", "geometry": null, "properties": {}},
                {"type": "Feature",
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,2]]]]},
                 "properties": {"gap": -0.1, "white_total": null}}
            ]
        }"#);

        let tracts = tracts_from_collection(fc).unwrap();
        assert_eq!(tracts.len(), 2);
        assert_eq!(tracts[0].white_total, 12.0);
        assert_eq!(tracts[0].black_total, 3.0);
        assert!((tracts[0].gap - 0.2).abs() < 1e-9);
        assert_eq!(tracts[1].white_total, 0.0);
        assert_eq!(tracts[1].gap, -0.1);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let mut props = JsonObject::new();
        props.insert("white_total".into(), serde_json::json!(-4));
        props.insert("black_total".into(), serde_json::json!("7"));
        assert_eq!(count(&props, "white_total"), 0.0);
        assert_eq!(count(&props, "black_total"), 7.0);
        assert_eq!(count(&props, "missing"), 0.0);
    }

    #[test]
    fn fractional_counts_below_threshold_stay_insufficient() {
        let fc = collection(r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
                 "properties": {"white_total": 2.5, "black_total": 2.4, "gap": 0.8}}
            ]
        }"#);

        let tracts = tracts_from_collection(fc).unwrap();
        assert_eq!(tracts[0].white_total, 2.5);
        assert_eq!(tracts[0].black_total, 2.4);
        assert!(!tracts[0].has_sufficient_data());
        assert_eq!(crate::classify::classify_tract(&tracts[0]), crate::classify::GapClass::InsufficientData);
        assert_eq!(crate::processing::summarize(&tracts), None);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        let mut props = JsonObject::new();
        props.insert("gap".into(), serde_json::json!("NaN"));
        props.insert("white_rate".into(), serde_json::json!("inf"));
        props.insert("black_rate".into(), serde_json::json!(" 0.25 "));
        props.insert("white_total".into(), serde_json::json!("-inf"));
        assert_eq!(number(&props, "gap"), None);
        assert_eq!(number(&props, "white_rate"), None);
        assert_eq!(number(&props, "black_rate"), Some(0.25));
        assert_eq!(count(&props, "white_total"), 0.0);
    }
}
