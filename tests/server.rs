//! Asset server behavior over a real ephemeral-port listener.

use std::io::{Read, Write};
use std::net::TcpStream;
use terraview::assets::AssetDir;
use terraview::server::{start, ServerConfig};

struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

fn get(port: u16, path: &str) -> Response {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let head = String::from_utf8_lossy(&raw[..split]).to_string();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.lines();
    let status = lines
        .next()
        .unwrap()
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    let headers = lines
        .filter_map(|l| {
            l.split_once(": ")
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        })
        .collect();

    Response {
        status,
        headers,
        body,
    }
}

fn header<'a>(resp: &'a Response, name: &str) -> Option<&'a str> {
    resp.headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn spawn_server() -> (tempfile::TempDir, u16) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"<html>viewer</html>").unwrap();
    std::fs::write(dir.path().join("dem.tif"), b"fake tiff bytes").unwrap();

    let handle = start(
        AssetDir::new(dir.path()),
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
    )
    .unwrap();
    (dir, handle.port)
}

#[test]
fn missing_asset_is_404() {
    let (_dir, port) = spawn_server();
    let resp = get(port, "/missing.tiff");
    assert_eq!(resp.status, 404);
}

#[test]
fn root_serves_index_html_bytes() {
    let (_dir, port) = spawn_server();

    let root = get(port, "/");
    let index = get(port, "/index.html");

    assert_eq!(root.status, 200);
    assert_eq!(index.status, 200);
    assert_eq!(root.body, index.body);
    assert_eq!(root.body, b"<html>viewer</html>");
    assert_eq!(header(&root, "content-type"), Some("text/html"));
}

#[test]
fn tiff_assets_get_the_tiff_content_type() {
    let (_dir, port) = spawn_server();
    let resp = get(port, "/dem.tif");
    assert_eq!(resp.status, 200);
    assert_eq!(header(&resp, "content-type"), Some("image/tiff"));
    assert_eq!(
        header(&resp, "content-length"),
        Some(resp.body.len().to_string().as_str())
    );
    assert_eq!(resp.body, b"fake tiff bytes");
}

#[test]
fn traversal_does_not_escape_the_root() {
    let (_dir, port) = spawn_server();
    let resp = get(port, "/../../../etc/passwd");
    assert_eq!(resp.status, 404);
}
