// src/fetch/vrt.rs
//! GDAL VRT mosaic generation for downloaded tiles.

use super::wmts::{Tile, TILE_SIZE};
use std::fmt::Write as _;

/// Builds a VRT dataset referencing every tile as a simple source, with
/// three byte bands (JPEG RGB) and offsets relative to the tile grid's
/// north-west corner.
pub fn build_vrt(tiles: &[Tile]) -> String {
    let min_row = tiles.iter().map(|t| t.row).min().unwrap_or(0);
    let min_col = tiles.iter().map(|t| t.col).min().unwrap_or(0);
    let max_row = tiles.iter().map(|t| t.row).max().unwrap_or(0);
    let max_col = tiles.iter().map(|t| t.col).max().unwrap_or(0);

    let x_size = (max_col - min_col + 1) * TILE_SIZE;
    let y_size = (max_row - min_row + 1) * TILE_SIZE;

    let mut vrt = String::new();
    let _ = writeln!(
        vrt,
        "<VRTDataset rasterXSize=\"{x_size}\" rasterYSize=\"{y_size}\">"
    );
    let _ = writeln!(vrt, "  <SRS>EPSG:2154</SRS>");

    for (band, interp) in [(1, "Red"), (2, "Green"), (3, "Blue")] {
        let _ = writeln!(
            vrt,
            "  <VRTRasterBand dataType=\"Byte\" band=\"{band}\">"
        );
        let _ = writeln!(vrt, "    <ColorInterp>{interp}</ColorInterp>");

        for tile in tiles {
            let x_off = (tile.col - min_col) * TILE_SIZE;
            let y_off = (tile.row - min_row) * TILE_SIZE;
            let _ = writeln!(vrt, "    <SimpleSource>");
            let _ = writeln!(
                vrt,
                "      <SourceFilename relativeToVRT=\"1\">tiles/{}</SourceFilename>",
                tile.filename()
            );
            let _ = writeln!(vrt, "      <SourceBand>{band}</SourceBand>");
            let _ = writeln!(
                vrt,
                "      <SrcRect xOff=\"0\" yOff=\"0\" xSize=\"{TILE_SIZE}\" ySize=\"{TILE_SIZE}\"/>"
            );
            let _ = writeln!(
                vrt,
                "      <DstRect xOff=\"{x_off}\" yOff=\"{y_off}\" xSize=\"{TILE_SIZE}\" ySize=\"{TILE_SIZE}\"/>"
            );
            let _ = writeln!(vrt, "    </SimpleSource>");
        }
        let _ = writeln!(vrt, "  </VRTRasterBand>");
    }

    let _ = writeln!(vrt, "</VRTDataset>");
    vrt
}
