// src/fetch/mod.rs
//! WMTS orthophoto downloader: Lambert 93 bbox -> tile grid -> concurrent
//! downloads -> VRT mosaic. This is the tool that produces the orthophoto
//! the viewer consumes.

pub mod vrt;
pub mod wmts;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use wmts::Tile;

pub struct FetchConfig {
    /// Bounding box in Lambert 93: (min_x, min_y, max_x, max_y).
    pub bbox: (f64, f64, f64, f64),
    pub output: PathBuf,
    pub concurrent: usize,
    pub timeout_ms: u64,
}

/// Parses "minX,minY,maxX,maxY" (clap value parser).
pub fn parse_bbox(s: &str) -> Result<(f64, f64, f64, f64), String> {
    let coords: Vec<f64> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;
    match coords[..] {
        [a, b, c, d] => Ok((a, b, c, d)),
        _ => Err("bbox must have exactly 4 coordinates".to_string()),
    }
}

/// Downloads every tile covering the bbox, then writes the VRT mosaic.
/// Blocking entry point; owns its tokio runtime.
pub fn run(config: FetchConfig) -> Result<()> {
    let tiles = wmts::tiles_for_bbox(config.bbox);
    if tiles.is_empty() {
        bail!("no tiles found in the given bounding box");
    }
    log::info!("downloading {} tiles at zoom {}", tiles.len(), wmts::ZOOM_LEVEL);

    let tiles_dir = config.output.join("tiles");
    std::fs::create_dir_all(&tiles_dir)
        .with_context(|| format!("creating {}", tiles_dir.display()))?;

    let runtime = tokio::runtime::Runtime::new()?;
    let downloaded = runtime.block_on(download_all(
        &tiles,
        &tiles_dir,
        config.concurrent,
        config.timeout_ms,
    ))?;

    log::info!(
        "downloaded {}/{} tiles ({} failed)",
        downloaded,
        tiles.len(),
        tiles.len() - downloaded
    );
    if downloaded == 0 {
        bail!("no tiles were successfully downloaded");
    }

    let vrt_path = config.output.join("mosaic.vrt");
    std::fs::write(&vrt_path, vrt::build_vrt(&tiles))
        .with_context(|| format!("writing {}", vrt_path.display()))?;
    log::info!("wrote {}", vrt_path.display());

    Ok(())
}

/// Fans the tile list out over a bounded number of concurrent requests.
/// Returns the number of successful downloads; individual failures are
/// logged and skipped.
async fn download_all(
    tiles: &[Tile],
    tiles_dir: &Path,
    concurrent: usize,
    timeout_ms: u64,
) -> Result<usize> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?;
    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));

    let progress = ProgressBar::new(tiles.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({percent}%)")?
            .progress_chars("=>-"),
    );

    let mut handles = Vec::with_capacity(tiles.len());
    for tile in tiles.iter().copied() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let client = client.clone();
        let dest = tiles_dir.join(tile.filename());
        let progress = progress.clone();

        handles.push(tokio::spawn(async move {
            let result = download_tile(&client, tile, &dest).await;
            progress.inc(1);
            drop(permit);
            result
        }));
    }

    let mut downloaded = 0;
    for (handle, tile) in handles.into_iter().zip(tiles) {
        match handle.await {
            Ok(Ok(())) => downloaded += 1,
            Ok(Err(e)) => log::warn!("tile {},{} failed: {e}", tile.row, tile.col),
            Err(e) => log::warn!("download task panicked: {e}"),
        }
    }
    progress.finish_with_message("download complete");

    Ok(downloaded)
}

async fn download_tile(client: &reqwest::Client, tile: Tile, dest: &Path) -> Result<()> {
    let response = client.get(tile.url()).send().await?;
    if !response.status().is_success() {
        bail!("server answered {}", response.status());
    }
    let body = response.bytes().await?;
    tokio::fs::write(dest, &body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bbox_accepts_four_coordinates() {
        let bbox = parse_bbox("1.0, 2.0,3.5,4").unwrap();
        assert_eq!(bbox, (1.0, 2.0, 3.5, 4.0));
    }

    #[test]
    fn parse_bbox_rejects_wrong_arity() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,3,4,5").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }
}
