// src/data/terrain.rs
//! Terrain geometry: DEM grid -> displaced mesh, orthophoto grid -> RGBA texture.

use crate::data::raster::{RasterError, RasterGrid};

/// World-unit footprint of the terrain mesh, independent of raster resolution.
pub const TERRAIN_EXTENT: f32 = 100.0;
/// World-unit height of the maximum elevation sample after normalization.
pub const HEIGHT_SCALE: f32 = 20.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A regular grid mesh in the XY plane with Z carrying normalized elevation.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub width: u32,
    pub height: u32,
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn cell_count(&self) -> usize {
        (self.width as usize - 1) * (self.height as usize - 1)
    }
}

/// An RGBA pixel buffer ready for texture upload.
#[derive(Debug, Clone)]
pub struct SurfaceTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Builds the terrain mesh from a decoded elevation grid.
///
/// The mesh always spans [`TERRAIN_EXTENT`]² world units centered at the
/// origin; one vertex per DEM sample, identity (x, y) mapping. Heights are
/// normalized to `[0, HEIGHT_SCALE]`; a perfectly flat raster (max == min)
/// clamps every height to 0 rather than dividing by zero.
pub fn build_mesh(dem: &RasterGrid) -> Result<TerrainMesh, RasterError> {
    let (w, h) = (dem.width, dem.height);
    if w < 2 || h < 2 {
        return Err(RasterError::InvalidGrid(format!(
            "DEM must be at least 2x2, got {w}x{h}"
        )));
    }

    let range = dem.max - dem.min;
    let inv_range = if range > 0.0 { 1.0 / range } else { 0.0 };

    let dx = TERRAIN_EXTENT / (w - 1) as f32;
    let dy = TERRAIN_EXTENT / (h - 1) as f32;
    let half = TERRAIN_EXTENT * 0.5;

    let mut vertices = Vec::with_capacity(w as usize * h as usize);
    for y in 0..h {
        let wy = half - y as f32 * dy; // raster row 0 is the north edge
        let v = y as f32 / (h - 1) as f32;
        for x in 0..w {
            let wx = x as f32 * dx - half;
            let u = x as f32 / (w - 1) as f32;
            let z = (dem.sample(x, y) - dem.min) * inv_range * HEIGHT_SCALE;
            vertices.push(TerrainVertex {
                position: [wx, wy, z],
                normal: [0.0, 0.0, 0.0],
                uv: [u, v],
            });
        }
    }

    // Two CCW triangles per cell, viewed from +Z.
    let mut indices = Vec::with_capacity((w as usize - 1) * (h as usize - 1) * 6);
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let i0 = y * w + x;
            let i1 = i0 + 1;
            let i2 = i0 + w;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    let mut mesh = TerrainMesh {
        width: w,
        height: h,
        vertices,
        indices,
    };
    recompute_normals(&mut mesh);
    Ok(mesh)
}

/// Recomputes per-vertex normals by accumulating area-weighted face normals.
/// Must run after every height write; heights are set exactly once at
/// construction, so this runs exactly once.
fn recompute_normals(mesh: &mut TerrainMesh) {
    for v in &mut mesh.vertices {
        v.normal = [0.0, 0.0, 0.0];
    }
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [
            glam::Vec3::from(mesh.vertices[tri[0] as usize].position),
            glam::Vec3::from(mesh.vertices[tri[1] as usize].position),
            glam::Vec3::from(mesh.vertices[tri[2] as usize].position),
        ];
        let face = (b - a).cross(c - a);
        for &i in tri {
            let n = &mut mesh.vertices[i as usize].normal;
            n[0] += face.x;
            n[1] += face.y;
            n[2] += face.z;
        }
    }
    for v in &mut mesh.vertices {
        let n = glam::Vec3::from(v.normal).normalize_or_zero();
        v.normal = n.to_array();
    }
}

/// Reinterprets an orthophoto grid as byte-packed RGBA, without rescaling or
/// gamma correction. The decoder is trusted to deliver byte-range values;
/// the band layout is validated because a mismatch would silently corrupt
/// the image otherwise.
pub fn build_texture(ortho: &RasterGrid) -> Result<SurfaceTexture, RasterError> {
    let pixel_count = ortho.width as usize * ortho.height as usize;
    if pixel_count == 0 {
        return Err(RasterError::InvalidGrid("zero-sized orthophoto".into()));
    }
    if ortho.samples.len() != pixel_count * 4 {
        return Err(RasterError::InvalidGrid(format!(
            "orthophoto has {} samples for {} pixels, expected 4 bands",
            ortho.samples.len(),
            pixel_count
        )));
    }

    let pixels = ortho.samples.iter().map(|&s| s as u8).collect();
    Ok(SurfaceTexture {
        width: ortho.width,
        height: ortho.height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32, samples: Vec<f32>) -> RasterGrid {
        RasterGrid::from_samples(width, height, 1, samples).unwrap()
    }

    #[test]
    fn mesh_counts_match_dem_dimensions() {
        let dem = grid(5, 3, (0..15).map(|i| i as f32).collect());
        let mesh = build_mesh(&dem).unwrap();
        assert_eq!(mesh.vertices.len(), 15);
        assert_eq!(mesh.cell_count(), 4 * 2);
        assert_eq!(mesh.indices.len(), 4 * 2 * 6);
    }

    #[test]
    fn normalization_boundary_law() {
        let dem = grid(3, 2, vec![10.0, 50.0, 30.0, 20.0, 90.0, 10.0]);
        let mesh = build_mesh(&dem).unwrap();

        for v in &mesh.vertices {
            let z = v.position[2];
            assert!((0.0..=HEIGHT_SCALE).contains(&z), "z out of range: {z}");
        }
        // min sample (10.0) at (0,0) and (2,1); max (90.0) at (1,1)
        assert_eq!(mesh.vertices[0].position[2], 0.0);
        assert_eq!(mesh.vertices[5].position[2], 0.0);
        assert_eq!(mesh.vertices[4].position[2], HEIGHT_SCALE);
    }

    #[test]
    fn flat_raster_clamps_to_zero() {
        let dem = grid(4, 4, vec![5.0; 16]);
        let mesh = build_mesh(&dem).unwrap();
        assert_eq!(mesh.vertices.len(), 16);
        for v in &mesh.vertices {
            assert_eq!(v.position[2], 0.0);
            assert!(!v.position[2].is_nan());
        }
    }

    #[test]
    fn flat_raster_normals_point_up() {
        let dem = grid(3, 3, vec![0.0; 9]);
        let mesh = build_mesh(&dem).unwrap();
        for v in &mesh.vertices {
            assert!(v.normal[2] > 0.99, "normal not up: {:?}", v.normal);
        }
    }

    #[test]
    fn mesh_spans_fixed_extent() {
        let dem = grid(2, 2, vec![0.0, 1.0, 2.0, 3.0]);
        let mesh = build_mesh(&dem).unwrap();
        let xs: Vec<f32> = mesh.vertices.iter().map(|v| v.position[0]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::INFINITY, f32::min), -50.0);
        assert_eq!(xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 50.0);
    }

    #[test]
    fn degenerate_dem_rejected() {
        let dem = grid(1, 4, vec![0.0; 4]);
        assert!(matches!(build_mesh(&dem), Err(RasterError::InvalidGrid(_))));
    }

    #[test]
    fn texture_length_law() {
        let ortho = RasterGrid::from_samples(2, 3, 4, vec![128.0; 24]).unwrap();
        let tex = build_texture(&ortho).unwrap();
        assert_eq!(tex.pixels.len(), 2 * 3 * 4);
        assert!(tex.pixels.iter().all(|&p| p == 128));
    }

    #[test]
    fn texture_band_mismatch_rejected() {
        let ortho = RasterGrid::from_samples(2, 2, 3, vec![0.0; 12]).unwrap();
        assert!(matches!(
            build_texture(&ortho),
            Err(RasterError::InvalidGrid(_))
        ));
    }
}
