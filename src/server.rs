// src/server.rs
//! Minimal static asset server.
//!
//! One accept thread, one thread per connection, GET only. Any per-request
//! failure becomes a 404 response; nothing here can take the process down.

use crate::assets::{content_type, AssetDir};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Handle for a running server. Dropping the handle leaves the server
/// running; send on `shutdown_tx` to stop the accept loop.
pub struct ServerHandle {
    pub port: u16,
    pub shutdown_tx: mpsc::Sender<()>,
}

/// Binds the listener and spawns the accept loop. With `port: 0` the OS
/// picks a free port, reported back through the handle.
pub fn start(assets: AssetDir, config: ServerConfig) -> std::io::Result<ServerHandle> {
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port))?;
    listener.set_nonblocking(true)?;
    let port = listener.local_addr()?.port();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    log::info!("serving {} on {}:{}", assets.root().display(), config.host, port);

    let assets = Arc::new(assets);
    thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((stream, _)) => {
                    let assets = Arc::clone(&assets);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &assets) {
                            log::debug!("connection error: {e}");
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => log::warn!("accept error: {e}"),
            }
        }
    });

    Ok(ServerHandle { port, shutdown_tx })
}

fn handle_connection(stream: TcpStream, assets: &AssetDir) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(10)))?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next()) {
        (Some(m), Some(p)) => (m, p),
        _ => return respond_404(stream),
    };
    if method != "GET" {
        return respond_404(stream);
    }

    // Drain the request headers; none of them matter here.
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    match assets.read(path) {
        Ok(body) => {
            let served_name = if path == "/" { "/index.html" } else { path };
            log::debug!("200 {} ({} bytes)", path, body.len());
            respond_200(stream, served_name, &body)
        }
        Err(e) => {
            log::debug!("404 {}: {}", path, e);
            respond_404(stream)
        }
    }
}

fn respond_200(mut stream: TcpStream, path: &str, body: &[u8]) -> std::io::Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        content_type(path),
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)
}

fn respond_404(mut stream: TcpStream) -> std::io::Result<()> {
    let body = b"Not Found";
    let header = format!(
        "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)
}
