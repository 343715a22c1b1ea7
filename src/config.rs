use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub render: RenderConfig,
    pub years: Vec<u16>,
    pub metros: Vec<MetroArea>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding the tract and overlay GeoJSON files
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetroArea {
    pub code: String,
    pub name: String,
}

impl MetroArea {
    pub fn new(code: &str, name: &str) -> Self {
        Self { code: code.to_string(), name: name.to_string() }
    }

    /// Filesystem-safe form of the display name, used in overlay and output file names.
    pub fn safe_name(&self) -> String {
        safe_name(&self.name)
    }
}

pub fn safe_name(name: &str) -> String {
    name.replace('/', "-").replace(',', "").replace(' ', "_")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("metro-areas") }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { width: 1200.0, height: 800.0 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            render: RenderConfig::default(),
            years: (2018..=2024).collect(),
            metros: default_metros(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in metro list.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config at {:?}, using built-in defaults", path);
            Ok(Self::default())
        }
    }

    pub fn tract_path(&self, metro: &MetroArea, year: u16) -> PathBuf {
        self.input.dir.join(format!("metro_tracts_{}_{}.geojson", metro.code, year))
    }

    pub fn water_parks_path(&self, metro: &MetroArea) -> PathBuf {
        self.input.dir.join(format!("water_parks_{}.geojson", metro.safe_name()))
    }

    pub fn landmarks_path(&self, metro: &MetroArea) -> PathBuf {
        self.input.dir.join(format!("landmarks_{}.geojson", metro.safe_name()))
    }

    pub fn output_path(&self, metro: &MetroArea, year: u16) -> PathBuf {
        self.output.dir.join(format!("{}_{}.svg", year, metro.safe_name()))
    }
}

fn default_metros() -> Vec<MetroArea> {
    [
        ("35620", "New York-Newark-Jersey City, NY-NJ-PA"),
        ("31080", "Los Angeles-Long Beach-Anaheim, CA"),
        ("16980", "Chicago-Naperville-Elgin, IL-IN-WI"),
        ("19100", "Dallas-Fort Worth-Arlington, TX"),
        ("26420", "Houston-The Woodlands-Sugar Land, TX"),
        ("47900", "Washington-Arlington-Alexandria, DC-VA-MD-WV"),
        ("33100", "Miami-Fort Lauderdale-West Palm Beach, FL"),
        ("37980", "Philadelphia-Camden-Wilmington, PA-NJ-DE-MD"),
        ("12060", "Atlanta-Sandy Springs-Roswell, GA"),
        ("38060", "Phoenix-Mesa-Chandler, AZ"),
        ("14460", "Boston-Cambridge-Newton, MA-NH"),
        ("41860", "San Francisco-Oakland-Fremont, CA"),
        ("40140", "Riverside-San Bernardino-Ontario, CA"),
        ("19820", "Detroit-Warren-Dearborn, MI"),
        ("42660", "Seattle-Tacoma-Bellevue, WA"),
        ("33460", "Minneapolis-St. Paul-Bloomington, MN-WI"),
        ("45300", "Tampa-St. Petersburg-Clearwater, FL"),
        ("41740", "San Diego-Chula Vista-Carlsbad, CA"),
        ("19740", "Denver-Aurora-Centennial, CO"),
        ("36740", "Orlando-Kissimmee-Sanford, FL"),
        ("16740", "Charlotte-Concord-Gastonia, NC-SC"),
        ("12580", "Baltimore-Columbia-Towson, MD"),
        ("41180", "St. Louis, MO-IL"),
        ("41700", "San Antonio-New Braunfels, TX"),
        ("12420", "Austin-Round Rock-San Marcos, TX"),
        ("29820", "Las Vegas-Henderson-North Las Vegas, NV"),
        ("40900", "Sacramento-Roseville-Folsom, CA"),
    ]
    .iter()
    .map(|(code, name)| MetroArea::new(code, name))
    .collect()
}
