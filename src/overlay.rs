use crate::types::{OverlayCategory, OverlayFeature, TractRecord};
use geo::bounding_rect::BoundingRect;
use geo::{Contains, Coord, CoordsIter, Geometry, Point};
use rstar::{RTree, RTreeObject, AABB};

const WATER_KEYWORDS: [&str; 4] = ["river", "lake", "ocean", "bay"];

/// Overlay features split by how the composer draws them.
#[derive(Debug, Default, Clone)]
pub struct OverlayLayers {
    /// Water bodies and coastline, drawn as outlines.
    pub water: Vec<OverlayFeature>,
    pub parks: Vec<OverlayFeature>,
    pub landmarks: Vec<OverlayFeature>,
}

impl OverlayLayers {
    pub fn from_features(features: impl IntoIterator<Item = OverlayFeature>) -> Self {
        let mut layers = Self::default();
        layers.extend(features);
        layers
    }

    pub fn extend(&mut self, features: impl IntoIterator<Item = OverlayFeature>) {
        for feature in features {
            match feature.category {
                OverlayCategory::Water | OverlayCategory::Coastline => self.water.push(feature),
                OverlayCategory::Park => self.parks.push(feature),
                OverlayCategory::Landmark => self.landmarks.push(feature),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.water.is_empty() && self.parks.is_empty() && self.landmarks.is_empty()
    }

    /// Water features that get a text label, paired with their anchor coordinate.
    pub fn water_labels(&self) -> Vec<(&OverlayFeature, Coord<f64>)> {
        self.water
            .iter()
            .filter(|f| is_labeled_water(&f.name))
            .filter_map(|f| label_anchor(&f.geometry).map(|c| (f, c)))
            .collect()
    }
}

/// True when the name mentions a river, lake, ocean or bay (case-insensitive).
pub fn is_labeled_water(name: &str) -> bool {
    let lower = name.to_lowercase();
    WATER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// First coordinate of the geometry: a line's start or a polygon's first exterior vertex.
pub fn label_anchor(geometry: &Geometry<f64>) -> Option<Coord<f64>> {
    geometry.coords_iter().next()
}

struct TractEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for TractEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Spatial index over tract bounding boxes for point lookups.
pub struct TractIndex<'a> {
    tracts: &'a [TractRecord],
    tree: RTree<TractEnvelope>,
}

impl<'a> TractIndex<'a> {
    pub fn new(tracts: &'a [TractRecord]) -> Self {
        let items: Vec<TractEnvelope> = tracts
            .iter()
            .enumerate()
            .filter_map(|(index, tract)| {
                let rect = tract.geometry.bounding_rect()?;
                Some(TractEnvelope {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self { tracts, tree: RTree::bulk_load(items) }
    }

    pub fn tract_at(&self, point: Point<f64>) -> Option<&'a TractRecord> {
        let tracts = self.tracts;
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| tracts.get(candidate.index))
            .find(|tract| tract.geometry.contains(&point))
    }
}

/// Landmarks whose anchor lies on some tract of the map.
pub fn landmarks_on_tracts<'a>(
    landmarks: &'a [OverlayFeature],
    index: &TractIndex<'_>,
) -> Vec<&'a OverlayFeature> {
    landmarks
        .iter()
        .filter(|l| {
            label_anchor(&l.geometry)
                .map(|c| index.tract_at(Point::from(c)).is_some())
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, MultiPolygon};

    fn feature(category: OverlayCategory, name: &str, geometry: Geometry<f64>) -> OverlayFeature {
        OverlayFeature { geometry, category, name: name.to_string() }
    }

    fn square_tract(x: f64, y: f64) -> TractRecord {
        TractRecord {
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0)
            ]]),
            white_total: 10.0,
            black_total: 10.0,
            white_rate: 0.5,
            black_rate: 0.5,
            gap: 0.0,
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert!(is_labeled_water("Hudson River"));
        assert!(is_labeled_water("LAKE MICHIGAN"));
        assert!(is_labeled_water("Biscayne Bay"));
        assert!(is_labeled_water("Pacific Ocean"));
        // substring match, as with any "bay" in the name
        assert!(is_labeled_water("Buffalo Bayou"));
        assert!(!is_labeled_water("Los Angeles Aqueduct"));
        assert!(!is_labeled_water("Coastline"));
        assert!(!is_labeled_water("Water"));
    }

    #[test]
    fn layers_split_by_category_and_label_only_named_water() {
        let layers = OverlayLayers::from_features(vec![
            feature(OverlayCategory::Water, "Hudson River",
                line_string![(x: -74.05, y: 40.75), (x: -74.02, y: 40.72)].into()),
            feature(OverlayCategory::Water, "Water",
                line_string![(x: -95.4, y: 29.8), (x: -95.3, y: 29.7)].into()),
            feature(OverlayCategory::Coastline, "Atlantic Ocean",
                line_string![(x: -80.2, y: 25.8), (x: -80.1, y: 25.9)].into()),
            feature(OverlayCategory::Park, "Central Park",
                polygon![(x: -73.97, y: 40.78), (x: -73.95, y: 40.78), (x: -73.95, y: 40.76)].into()),
            feature(OverlayCategory::Landmark, "Harlem", point!(x: -73.9465, y: 40.8116).into()),
        ]);

        assert_eq!(layers.water.len(), 3);
        assert_eq!(layers.parks.len(), 1);
        assert_eq!(layers.landmarks.len(), 1);

        let labels = layers.water_labels();
        let names: Vec<&str> = labels.iter().map(|(f, _)| f.name.as_str()).collect();
        assert_eq!(names, vec!["Hudson River", "Atlantic Ocean"]);
        assert_eq!(labels[0].1, Coord { x: -74.05, y: 40.75 });
    }

    #[test]
    fn polygon_anchor_is_first_exterior_vertex() {
        let lake: Geometry<f64> = polygon![(x: 1.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 4.0)].into();
        assert_eq!(label_anchor(&lake), Some(Coord { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn landmarks_outside_tracts_are_dropped() {
        let tracts = vec![square_tract(0.0, 0.0), square_tract(5.0, 5.0)];
        let index = TractIndex::new(&tracts);
        let landmarks = vec![
            feature(OverlayCategory::Landmark, "Inside", point!(x: 0.5, y: 0.5).into()),
            feature(OverlayCategory::Landmark, "Gap between", point!(x: 3.0, y: 3.0).into()),
            feature(OverlayCategory::Landmark, "Second", point!(x: 5.5, y: 5.2).into()),
        ];

        let kept = landmarks_on_tracts(&landmarks, &index);
        let names: Vec<&str> = kept.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Inside", "Second"]);
    }
}
