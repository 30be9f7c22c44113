// src/fetch/wmts.rs
//! WMTS tile addressing for the IGN orthophoto layer.
//!
//! The tile matrix is anchored on a known reference tile rather than the
//! matrix origin; offsets from it are exact multiples of the tile footprint.

/// Fixed zoom level of the HR orthophoto matrix set.
pub const ZOOM_LEVEL: u32 = 19;
/// Ground resolution at that zoom, meters per pixel.
pub const PIXEL_SIZE: f64 = 0.2;
/// Tile edge in pixels.
pub const TILE_SIZE: u32 = 256;

/// Reference tile (row, col) and the Lambert 93 coordinates of its
/// top-left corner, taken from a known-good request.
const REF_ROW: i64 = 195_404;
const REF_COL: i64 = 275_651;
const REF_X: f64 = 1_223_232.7321;
const REF_Y: f64 = 6_075_925.1150;

/// One WMTS tile with the Lambert 93 position of its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub x: f64,
    pub y: f64,
}

impl Tile {
    pub fn filename(&self) -> String {
        format!("tile_{}_{}.jpeg", self.row, self.col)
    }

    pub fn url(&self) -> String {
        format!(
            "https://data.geopf.fr/wmts?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0\
             &LAYER=HR.ORTHOIMAGERY.ORTHOPHOTOS&STYLE=normal&FORMAT=image%2Fjpeg\
             &TILEMATRIXSET=PM_6_19&TILEMATRIX={}&TILEROW={}&TILECOL={}",
            ZOOM_LEVEL, self.row, self.col
        )
    }
}

/// Tile footprint in meters.
pub fn tile_span_m() -> f64 {
    TILE_SIZE as f64 * PIXEL_SIZE
}

/// Finds the tile containing the Lambert 93 point (x, y).
pub fn tile_at(x: f64, y: f64) -> Tile {
    let span = tile_span_m();
    let col_offset = ((x - REF_X) / span).round() as i64;
    let row_offset = ((REF_Y - y) / span).round() as i64; // row axis points south

    Tile {
        row: (REF_ROW + row_offset) as u32,
        col: (REF_COL + col_offset) as u32,
        x: REF_X + col_offset as f64 * span,
        y: REF_Y - row_offset as f64 * span,
    }
}

/// Enumerates every tile covering a Lambert 93 bounding box
/// (min_x, min_y, max_x, max_y).
pub fn tiles_for_bbox(bbox: (f64, f64, f64, f64)) -> Vec<Tile> {
    let a = tile_at(bbox.0, bbox.1);
    let b = tile_at(bbox.2, bbox.3);

    let (min_row, max_row) = (a.row.min(b.row), a.row.max(b.row));
    let (min_col, max_col) = (a.col.min(b.col), a.col.max(b.col));

    let span = tile_span_m();
    let mut tiles = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            let dc = col as i64 - REF_COL;
            let dr = row as i64 - REF_ROW;
            tiles.push(Tile {
                row,
                col,
                x: REF_X + dc as f64 * span,
                y: REF_Y - dr as f64 * span,
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_point_maps_to_reference_tile() {
        let t = tile_at(REF_X, REF_Y);
        assert_eq!(t.row, REF_ROW as u32);
        assert_eq!(t.col, REF_COL as u32);
        assert_eq!(t.x, REF_X);
        assert_eq!(t.y, REF_Y);
    }

    #[test]
    fn one_tile_east_advances_the_column() {
        let t = tile_at(REF_X + tile_span_m(), REF_Y);
        assert_eq!(t.col, REF_COL as u32 + 1);
        assert_eq!(t.row, REF_ROW as u32);
    }

    #[test]
    fn south_means_larger_row() {
        let t = tile_at(REF_X, REF_Y - 2.0 * tile_span_m());
        assert_eq!(t.row, REF_ROW as u32 + 2);
    }

    #[test]
    fn bbox_covers_a_dense_grid() {
        let span = tile_span_m();
        let bbox = (REF_X, REF_Y - 2.0 * span, REF_X + 3.0 * span, REF_Y);
        let tiles = tiles_for_bbox(bbox);
        assert_eq!(tiles.len(), 3 * 4);

        // No duplicates.
        let mut keys: Vec<(u32, u32)> = tiles.iter().map(|t| (t.row, t.col)).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), tiles.len());
    }

    #[test]
    fn url_carries_row_and_col() {
        let t = tile_at(REF_X, REF_Y);
        let url = t.url();
        assert!(url.contains("TILEROW=195404"));
        assert!(url.contains("TILECOL=275651"));
        assert!(url.contains("TILEMATRIX=19"));
    }
}
