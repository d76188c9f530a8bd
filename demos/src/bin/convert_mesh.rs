//! Convert a mesh between OBJ, PLY and STL

use anyhow::{Context, Result};
use clap::Parser;
use orbitview_io::{read_asset, write_asset};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Convert meshes between OBJ, PLY and STL")]
struct Args {
    /// Input mesh
    input: PathBuf,

    /// Output mesh; the format follows the extension
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let asset = read_asset(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    write_asset(&asset, &args.output).with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "{} -> {} ({} vertices, {} triangles)",
        args.input.display(),
        args.output.display(),
        asset.vertex_count(),
        asset.triangle_count()
    );
    Ok(())
}
