use crate::config::{AppConfig, MetroArea};
use crate::data::{load_overlays, load_tracts};
use crate::overlay::OverlayLayers;
use crate::render::compose_svg;
use crate::types::MetroMap;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Outcome of a single metro/year export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// No tract file for this metro/year.
    MissingInput(PathBuf),
    /// Tract file present but holds no usable tracts.
    NoFeatures(PathBuf),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: usize,
}

/// Exports every configured year × metro. Failures are logged and counted;
/// one bad metro never stops the batch.
pub fn export_all(config: &AppConfig) -> ExportReport {
    let mut report = ExportReport::default();

    for &year in &config.years {
        info!("Processing year {}...", year);
        for metro in &config.metros {
            match export_metro(config, metro, year) {
                Ok(ExportOutcome::Written(path)) => report.written.push(path),
                Ok(ExportOutcome::MissingInput(_)) | Ok(ExportOutcome::NoFeatures(_)) => report.skipped += 1,
                Err(e) => {
                    error!("Failed to export {} ({}): {:#}", metro.name, year, e);
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        "Exported {} maps to {:?} ({} skipped, {} failed)",
        report.written.len(),
        config.output.dir,
        report.skipped,
        report.failed
    );
    report
}

pub fn export_metro(config: &AppConfig, metro: &MetroArea, year: u16) -> Result<ExportOutcome> {
    let tract_path = config.tract_path(metro, year);
    if !tract_path.exists() {
        info!("File not found: {:?}", tract_path);
        return Ok(ExportOutcome::MissingInput(tract_path));
    }

    info!("Creating map for {} ({})...", metro.name, year);
    let tracts = load_tracts(&tract_path)?;
    if tracts.is_empty() {
        info!("No features found in {:?}", tract_path);
        return Ok(ExportOutcome::NoFeatures(tract_path));
    }

    let map = MetroMap {
        code: metro.code.clone(),
        name: metro.name.clone(),
        year,
        tracts,
    };
    let overlays = load_overlay_layers(config, metro);
    if overlays.is_empty() {
        debug!("No overlays for {} ({})", metro.name, map.code);
    }

    let svg = compose_svg(&map, &overlays, &config.render)
        .context("Failed to compose SVG")?;

    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output directory: {:?}", config.output.dir))?;
    let output_path = config.output_path(metro, year);
    fs::write(&output_path, svg)
        .with_context(|| format!("Failed to write map: {:?}", output_path))?;

    info!("Saved: {:?}", output_path);
    Ok(ExportOutcome::Written(output_path))
}

/// Water/park and landmark layers for a metro. A missing file contributes
/// nothing; a broken one is logged and skipped.
pub fn load_overlay_layers(config: &AppConfig, metro: &MetroArea) -> OverlayLayers {
    let mut layers = OverlayLayers::default();

    for path in [config.water_parks_path(metro), config.landmarks_path(metro)] {
        if !path.exists() {
            continue;
        }
        match load_overlays(&path) {
            Ok(features) => layers.extend(features),
            Err(e) => warn!("Could not add overlay {:?}: {:#}", path, e),
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_in(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.input.dir = dir.to_path_buf();
        config.output.dir = dir.join("metro-areas");
        config.years = vec![2020];
        config.metros = vec![MetroArea::new("38060", "Phoenix-Mesa-Chandler, AZ")];
        config
    }

    #[test]
    fn missing_tract_file_is_skipped_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let outcome = export_metro(&config, &config.metros[0], 2020).unwrap();
        assert_eq!(outcome, ExportOutcome::MissingInput(dir.path().join("metro_tracts_38060_2020.geojson")));
        assert!(!config.output.dir.exists());

        let report = export_all(&config);
        assert_eq!(report, ExportReport { written: vec![], skipped: 1, failed: 0 });
    }

    #[test]
    fn empty_collection_produces_no_map() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(
            dir.path().join("metro_tracts_38060_2020.geojson"),
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();

        let outcome = export_metro(&config, &config.metros[0], 2020).unwrap();
        assert!(matches!(outcome, ExportOutcome::NoFeatures(_)));
        assert!(!config.output_path(&config.metros[0], 2020).exists());
    }

    #[test]
    fn malformed_tract_file_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(dir.path().join("metro_tracts_38060_2020.geojson"), "{ not json").unwrap();

        let report = export_all(&config);
        assert_eq!(report.failed, 1);
        assert!(report.written.is_empty());
    }

    #[test]
    fn broken_overlay_yields_empty_layers() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(config.water_parks_path(&config.metros[0]), "[1, 2").unwrap();

        let layers = load_overlay_layers(&config, &config.metros[0]);
        assert!(layers.is_empty());
    }
}
