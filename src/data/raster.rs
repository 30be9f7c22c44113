// src/data/raster.rs
//! GeoTIFF loading: asset bytes -> decoded sample grid.
//!
//! The whole payload is materialized in memory before decoding; assets are
//! bounded and loaded once at startup, so there is no streaming path.

use crate::assets::AssetDir;
use thiserror::Error;

/// Errors surfaced by the raster pipeline.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The asset bytes could not be retrieved.
    #[error("failed to fetch raster asset '{name}': {source}")]
    Fetch {
        name: String,
        source: std::io::Error,
    },

    /// The byte stream is not a valid raster.
    #[error("failed to decode raster: {0}")]
    Decode(#[from] tiff::TiffError),

    /// Degenerate dimensions or band-length mismatch.
    #[error("invalid raster grid: {0}")]
    InvalidGrid(String),
}

/// One decoded raster: dimensions, band count, interleaved samples and the
/// band-0 value range. Immutable after decode.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    pub width: u32,
    pub height: u32,
    pub bands: u32,
    /// Interleaved samples, `width * height * bands` values.
    pub samples: Vec<f32>,
    /// Minimum over band 0.
    pub min: f32,
    /// Maximum over band 0.
    pub max: f32,
}

impl RasterGrid {
    /// Builds a grid from raw samples, computing the band-0 range by a full
    /// linear scan.
    pub fn from_samples(
        width: u32,
        height: u32,
        bands: u32,
        samples: Vec<f32>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidGrid(format!(
                "zero-sized grid ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * bands as usize;
        if samples.len() != expected {
            return Err(RasterError::InvalidGrid(format!(
                "sample count {} does not match {width}x{height}x{bands}",
                samples.len()
            )));
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for s in samples.iter().step_by(bands as usize) {
            min = min.min(*s);
            max = max.max(*s);
        }

        Ok(Self {
            width,
            height,
            bands,
            samples,
            min,
            max,
        })
    }

    /// Band-0 sample at raster coordinate (x, y).
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        let idx = (y as usize * self.width as usize + x as usize) * self.bands as usize;
        self.samples[idx]
    }
}

/// Reads a named asset and decodes it into a [`RasterGrid`].
pub fn load_raster(assets: &AssetDir, name: &str) -> Result<RasterGrid, RasterError> {
    let bytes = assets.read(name).map_err(|source| RasterError::Fetch {
        name: name.to_string(),
        source,
    })?;
    log::debug!("fetched '{}' ({} bytes)", name, bytes.len());
    decode_raster(&bytes)
}

/// Decodes a TIFF byte stream into a [`RasterGrid`].
///
/// All integer sample formats are widened to f32; multi-band images keep
/// their interleaved layout.
pub fn decode_raster(bytes: &[u8]) -> Result<RasterGrid, RasterError> {
    use tiff::decoder::{Decoder, DecodingResult};

    let mut decoder = Decoder::new(std::io::Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let bands = band_count(decoder.colortype()?)?;

    let samples: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U8(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I8(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U16(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I16(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U32(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I32(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U64(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I64(data) => data.iter().map(|&v| v as f32).collect(),
    };

    RasterGrid::from_samples(width, height, bands, samples)
}

fn band_count(color: tiff::ColorType) -> Result<u32, RasterError> {
    use tiff::ColorType;
    Ok(match color {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) | ColorType::CMYK(_) => 4,
        other => {
            return Err(RasterError::InvalidGrid(format!(
                "unsupported color type {other:?}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_gray_f32(width: u32, height: u32, data: &[f32]) -> Vec<u8> {
        use tiff::encoder::{colortype, TiffEncoder};
        let mut buf = std::io::Cursor::new(Vec::new());
        TiffEncoder::new(&mut buf)
            .unwrap()
            .write_image::<colortype::Gray32Float>(width, height, data)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn decode_single_band_computes_range() {
        let data = vec![3.0, 7.0, 1.0, 5.0];
        let bytes = encode_gray_f32(2, 2, &data);

        let grid = decode_raster(&bytes).unwrap();
        assert_eq!((grid.width, grid.height, grid.bands), (2, 2, 1));
        assert_eq!(grid.min, 1.0);
        assert_eq!(grid.max, 7.0);
        assert_eq!(grid.sample(1, 0), 7.0);
        assert_eq!(grid.sample(0, 1), 1.0);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_raster(b"not a tiff at all"),
            Err(RasterError::Decode(_))
        ));
    }

    #[test]
    fn from_samples_rejects_zero_sized() {
        assert!(matches!(
            RasterGrid::from_samples(0, 4, 1, vec![]),
            Err(RasterError::InvalidGrid(_))
        ));
    }

    #[test]
    fn from_samples_rejects_length_mismatch() {
        assert!(matches!(
            RasterGrid::from_samples(2, 2, 1, vec![0.0; 5]),
            Err(RasterError::InvalidGrid(_))
        ));
    }

    #[test]
    fn load_raster_missing_asset_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(dir.path());
        assert!(matches!(
            load_raster(&assets, "missing.tiff"),
            Err(RasterError::Fetch { .. })
        ));
    }

    #[test]
    fn load_raster_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encode_gray_f32(4, 4, &[5.0; 16]);
        std::fs::write(dir.path().join("flat.tiff"), bytes).unwrap();

        let assets = AssetDir::new(dir.path());
        let grid = load_raster(&assets, "flat.tiff").unwrap();
        assert_eq!((grid.width, grid.height), (4, 4));
        assert_eq!(grid.min, grid.max);
    }
}
