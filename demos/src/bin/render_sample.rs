//! Render one frame headlessly and write it to an image file
//!
//! ```text
//! render_sample --sample teapot --samples-dir assets/ --mode arcball --drag 120,40 --output teapot.png
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use orbitview_io::{AssetSource, SampleModel};
use orbitview_viewer::{
    InteractionMode, LightingProfile, MaterialKind, SoftwareRenderer, ViewerConfig, ViewerCore, ViewerEvent,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "Render a model with the orbitview software renderer")]
struct Args {
    /// Built-in sample: cube, sphere, teapot, bunny or dragon
    #[arg(long, conflicts_with = "file")]
    sample: Option<SampleModel>,

    /// Mesh file (OBJ, PLY or STL)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Interaction mode the drag is applied in
    #[arg(long, default_value = "arcball")]
    mode: InteractionMode,

    /// Drag delta in pixels, e.g. `120,40`
    #[arg(long, value_parser = parse_drag, allow_hyphen_values = true)]
    drag: Option<(f32, f32)>,

    /// Wheel notches; positive zooms in
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    zoom: f32,

    /// Material type: lit, unlit, pbr or wireframe
    #[arg(long)]
    material: Option<MaterialKind>,

    /// Lighting profile: bright-day, studio, overcast or night
    #[arg(long)]
    lighting: Option<LightingProfile>,

    /// Viewer configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the file-backed samples
    #[arg(long)]
    samples_dir: Option<PathBuf>,

    /// Output image (.png or .jpg)
    #[arg(long, short, default_value = "orbitview.png")]
    output: PathBuf,
}

fn parse_drag(text: &str) -> std::result::Result<(f32, f32), String> {
    let (dx, dy) = text
        .split_once(',')
        .ok_or_else(|| format!("expected `dx,dy`, got '{}'", text))?;
    let parse = |s: &str| s.trim().parse::<f32>().map_err(|e| format!("'{}': {}", s, e));
    Ok((parse(dx)?, parse(dy)?))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if args.samples_dir.is_some() {
        config.samples_dir = args.samples_dir.clone();
    }
    config.camera.frame_on_load = true;

    let source = match (&args.file, args.sample) {
        (Some(path), _) => AssetSource::File(path.clone()),
        (None, Some(sample)) => AssetSource::Sample(sample),
        (None, None) => AssetSource::Sample(SampleModel::Cube),
    };

    let viewport = config.viewport;
    let mut viewer = ViewerCore::new(config, SoftwareRenderer::default())?;
    viewer
        .load_asset_now(&source)
        .with_context(|| format!("loading {}", source.display_name()))?;

    if let Some(kind) = args.material {
        viewer.set_material_kind(kind);
    }
    if let Some(profile) = args.lighting {
        viewer.set_lighting(profile);
    }
    viewer.set_mode(args.mode);
    if let Some((dx, dy)) = args.drag {
        let (x, y) = (viewport.width as f32 / 2.0, viewport.height as f32 / 2.0);
        viewer.on_drag_start(x, y);
        viewer.on_drag_move(x + dx, y + dy);
        viewer.on_drag_end();
    }
    if args.zoom != 0.0 {
        viewer.on_scroll(args.zoom * viewer.config().camera.wheel_notch);
    }

    for event in viewer.wait_idle(Duration::from_secs(30)) {
        match event {
            ViewerEvent::FrameReady(frame) => log::info!("Frame {} ready", frame.request_id),
            ViewerEvent::AssetLoaded { name, vertices, triangles } => {
                log::info!("{}: {} vertices, {} triangles", name, vertices, triangles)
            }
            ViewerEvent::Error { kind, message } => bail!("{} error: {}", kind, message),
        }
    }

    viewer
        .export_image(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
