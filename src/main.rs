// src/main.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use terraview::{app::App, assets::AssetDir, fetch, server};
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

#[derive(Parser)]
#[command(name = "terraview")]
#[command(about = "3D terrain viewer for DEM + orthophoto GeoTIFFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the viewer window.
    View {
        /// Directory holding the terrain assets
        #[arg(short, long, default_value = "assets")]
        assets: PathBuf,

        /// Elevation raster filename within the asset directory
        #[arg(long, default_value = "dem.tif")]
        dem: String,

        /// Orthophoto raster filename within the asset directory
        #[arg(long, default_value = "ortho.tif")]
        ortho: String,
    },
    /// Serve the asset directory over HTTP.
    Serve {
        /// Directory to serve
        #[arg(short, long, default_value = "assets")]
        assets: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// Download WMTS orthophoto tiles covering a bounding box.
    Fetch {
        /// Bounding box coordinates in Lambert 93 (minX,minY,maxX,maxY)
        #[arg(short, long, value_parser = fetch::parse_bbox)]
        bbox: (f64, f64, f64, f64),

        /// Output directory for downloaded tiles
        #[arg(short, long, default_value = "tiles")]
        output: PathBuf,

        /// Maximum concurrent downloads
        #[arg(short, long, default_value_t = 32)]
        concurrent: usize,

        /// Request timeout in milliseconds
        #[arg(short, long, default_value_t = 10000)]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::View { assets, dem, ortho } => run_viewer(AssetDir::new(assets), &dem, &ortho),
        Commands::Serve { assets, host, port } => {
            let handle = server::start(AssetDir::new(assets), server::ServerConfig { host, port })?;
            log::info!("listening on port {} (ctrl-c to stop)", handle.port);
            loop {
                std::thread::park();
            }
        }
        Commands::Fetch {
            bbox,
            output,
            concurrent,
            timeout,
        } => fetch::run(fetch::FetchConfig {
            bbox,
            output,
            concurrent,
            timeout_ms: timeout,
        }),
    }
}

fn run_viewer(assets: AssetDir, dem: &str, ortho: &str) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("terraview")
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone()))?;
    app.load_scene(&assets, dem, ortho);

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(winit::event_loop::ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                match &event {
                    WindowEvent::CloseRequested => {
                        elwt.exit();
                        return;
                    }
                    WindowEvent::KeyboardInput { event: key, .. } => {
                        use winit::keyboard::{KeyCode, PhysicalKey};
                        if key.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                            elwt.exit();
                            return;
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        match app.render() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                let size = app.renderer.context.size;
                                app.resize(size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                            Err(e) => log::warn!("surface error: {e:?}"),
                        }
                        return;
                    }
                    _ => {}
                }
                app.handle_event(&event);
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
