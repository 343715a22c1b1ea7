//! Stamps WGS84 CRS metadata onto tract files written without it.

use crate::data::read_feature_collection;
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// OGC name for WGS84 with lon/lat axis order, as GDAL writes it for EPSG:4326.
pub const WGS84_CRS_NAME: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrsReport {
    pub updated: Vec<PathBuf>,
    pub unchanged: usize,
    pub failed: usize,
}

pub fn tract_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("metro_tracts_") && n.ends_with(".geojson"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

pub fn fix_crs_in_dir(dir: &Path) -> Result<CrsReport> {
    let files = tract_files(dir)?;
    info!("Found {} GeoJSON files to fix", files.len());

    let mut report = CrsReport::default();
    for path in files {
        match fix_crs(&path) {
            Ok(true) => report.updated.push(path),
            Ok(false) => report.unchanged += 1,
            Err(e) => {
                error!("Error processing {:?}: {:#}", path, e);
                report.failed += 1;
            }
        }
    }

    info!("CRS fix complete: {} updated, {} unchanged, {} failed", report.updated.len(), report.unchanged, report.failed);
    Ok(report)
}

/// Adds a WGS84 `crs` member when the collection has none. Returns whether
/// the file was rewritten.
pub fn fix_crs(path: &Path) -> Result<bool> {
    let mut collection = read_feature_collection(path)?;
    let members = collection.foreign_members.get_or_insert_with(Default::default);

    if let Some(existing) = members.get("crs") {
        info!("CRS already set: {} for {:?}", existing, path);
        return Ok(false);
    }

    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": WGS84_CRS_NAME } }),
    );

    let body = serde_json::to_string(&collection).context("Failed to serialize GeoJSON")?;
    fs::write(path, body).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Set CRS to EPSG:4326 for {:?}", path);
    Ok(true)
}
