// src/lib.rs
//! Native 3D terrain viewer for DEM + orthophoto GeoTIFF pairs.
//!
//! The pipeline is deliberately thin: decode both rasters, normalize
//! elevation into a fixed-footprint grid mesh, drape the orthophoto over it,
//! and orbit a camera around the result. A small static server and a WMTS
//! tile fetcher round out the toolchain.

pub mod app;
pub mod assets;
pub mod camera;
pub mod data;
pub mod fetch;
pub mod renderer;
pub mod server;
pub mod ui;
