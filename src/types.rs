use geo::{Geometry, MultiPolygon};

/// Minimum combined application count for a tract to be colored by gap.
pub const MIN_APPLICATIONS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct TractRecord {
    pub geometry: MultiPolygon<f64>,
    // Application counts, kept unrounded so the sample-size check sees the raw sum.
    pub white_total: f64,
    pub black_total: f64,
    pub white_rate: f64,
    pub black_rate: f64,
    // white_rate - black_rate
    pub gap: f64,
}

impl TractRecord {
    pub fn has_sufficient_data(&self) -> bool {
        self.white_total + self.black_total >= MIN_APPLICATIONS
    }
}

#[derive(Debug, Clone)]
pub struct MetroMap {
    pub code: String,
    pub name: String,
    pub year: u16,
    pub tracts: Vec<TractRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCategory {
    Water,
    Park,
    Coastline,
    Landmark,
}

impl OverlayCategory {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "water" => Some(Self::Water),
            "park" => Some(Self::Park),
            "coastline" => Some(Self::Coastline),
            "landmark" => Some(Self::Landmark),
            _ => None,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Self::Water => "Water",
            Self::Park => "Park",
            Self::Coastline => "Coastline",
            Self::Landmark => "Landmark",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverlayFeature {
    pub geometry: Geometry<f64>,
    pub category: OverlayCategory,
    pub name: String,
}
