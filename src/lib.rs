pub mod types;
pub mod config;
pub mod classify;
pub mod data;
pub mod processing;
pub mod overlay;
pub mod render;
pub mod export;
pub mod crs;
