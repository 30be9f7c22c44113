// src/assets.rs
//! Directory-backed asset provider shared by the raster loader and the
//! static server: bytes by name, content type by extension.

use std::io;
use std::path::{Path, PathBuf};

pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path to a file under the root. `/` serves `index.html`;
    /// anything stepping outside the root is refused.
    pub fn resolve(&self, request_path: &str) -> io::Result<PathBuf> {
        let trimmed = request_path.trim_start_matches('/');
        let name = if trimmed.is_empty() { "index.html" } else { trimmed };

        let relative = Path::new(name);
        if relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("refusing non-normal path '{request_path}'"),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Reads an asset's bytes in full.
    pub fn read(&self, request_path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(request_path)?)
    }
}

/// Content type by file extension. GeoTIFFs are the one type the original
/// deployment needed to label precisely.
pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "tif" | "tiff" => "image/tiff",
        "html" | "htm" => "text/html",
        "js" => "text/javascript",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_maps_to_index_html() {
        let assets = AssetDir::new("/srv/terrain");
        assert_eq!(
            assets.resolve("/").unwrap(),
            PathBuf::from("/srv/terrain/index.html")
        );
        assert_eq!(
            assets.resolve("/index.html").unwrap(),
            PathBuf::from("/srv/terrain/index.html")
        );
    }

    #[test]
    fn traversal_is_refused() {
        let assets = AssetDir::new("/srv/terrain");
        assert!(assets.resolve("/../etc/passwd").is_err());
        assert!(assets.resolve("/a/../../b").is_err());
    }

    #[test]
    fn tiff_content_type() {
        assert_eq!(content_type("dem.tif"), "image/tiff");
        assert_eq!(content_type("ortho.TIFF"), "image/tiff");
        assert_eq!(content_type("index.html"), "text/html");
        assert_eq!(content_type("data.bin"), "application/octet-stream");
    }
}
