//! Fluid Viewer - renders fluid background scenes to PNG frames.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fluid::{FluidEngine, ManualFrameHost};
use render::CanvasSurface;
use viewer::output::frame_file_name;
use viewer::{presets, write_png, Scene};

/// Fluid Viewer - renders animated fluid backgrounds headlessly
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene JSON file (built-in aurora scene if omitted)
    scene: Option<PathBuf>,

    /// Viewport width in CSS pixels
    #[arg(long, default_value = "640")]
    width: f64,

    /// Viewport height in CSS pixels
    #[arg(long, default_value = "360")]
    height: f64,

    /// Device pixel ratio
    #[arg(long, default_value = "1.0")]
    dpr: f64,

    /// Number of frames to render
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Virtual frame clock rate
    #[arg(long, default_value = "60.0")]
    fps: f64,

    /// Output directory
    #[arg(long, default_value = "frames")]
    out: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Fluid Viewer v{}", viewer::VERSION);

    let scene = match &args.scene {
        Some(path) => Scene::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => {
            info!("No scene given, using the aurora preset");
            presets::aurora()
        }
    };

    anyhow::ensure!(args.fps > 0.0 && args.fps.is_finite(), "--fps must be positive");
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let host = Arc::new(ManualFrameHost::new());
    let surface = CanvasSurface::new(args.width, args.height).with_device_pixel_ratio(args.dpr);
    let engine = FluidEngine::new(surface, host.clone(), scene.options)?;
    for blob in scene.blobs {
        engine.add_blob(blob);
    }
    engine.start();

    let frame_ms = 1000.0 / args.fps;
    for i in 0..args.frames {
        host.tick(i as f64 * frame_ms);
        let path = args.out.join(frame_file_name(i));
        engine.with_surface(|surface| write_png(surface, &path))?;
    }

    info!(
        frames = args.frames,
        rendered = engine.frames_rendered(),
        out = %args.out.display(),
        "Frames written"
    );

    engine.destroy();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default() {
        let args = Args::parse_from(["fluid-viewer"]);
        assert!(args.scene.is_none());
        assert_eq!(args.width, 640.0);
        assert_eq!(args.height, 360.0);
        assert_eq!(args.frames, 1);
        assert_eq!(args.out, PathBuf::from("frames"));
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_with_scene() {
        let args = Args::parse_from([
            "fluid-viewer",
            "scene.json",
            "--frames",
            "30",
            "--dpr",
            "2",
            "-v",
        ]);
        assert_eq!(args.scene, Some(PathBuf::from("scene.json")));
        assert_eq!(args.frames, 30);
        assert_eq!(args.dpr, 2.0);
        assert!(args.verbose);
    }
}
