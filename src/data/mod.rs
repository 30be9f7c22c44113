// src/data/mod.rs
//! The raster-to-geometry pipeline: decode, mesh, texture.

pub mod raster;
pub mod terrain;

pub use raster::{load_raster, RasterError, RasterGrid};
pub use terrain::{build_mesh, build_texture, SurfaceTexture, TerrainMesh, TerrainVertex};
