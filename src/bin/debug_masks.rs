//! Debug script to dump the intermediate layers of a map run as PNGs
//!
//! Writes the ocean and mountain masks plus the synthesized ocean and
//! mountain layers next to the exports, for checking classification by eye.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pretty_maps::pipeline::{prepare, save_png_atomic, MapRequest};
use pretty_maps::{logging, Result};

#[derive(Parser, Debug)]
#[command(name = "debug_masks")]
struct Args {
    /// Directory holding the region exports
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Map style used for texture lookup
    #[arg(short, long, default_value = "fantasy")]
    style: String,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<()> {
    let mut request = MapRequest::new(&args.dir);
    request.style = args.style;

    let prepared = prepare(&request)?;
    let synthesized = prepared.synthesize(&request.config)?;

    let outputs = [
        ("ocean-mask", prepared.ocean.to_layer("ocean-mask")),
        ("mountain-mask", prepared.mountains.to_layer("mountain-mask")),
        ("ocean", synthesized.ocean),
        ("mountains", synthesized.mountains),
    ];
    for (suffix, layer) in &outputs {
        let path = request.dir.join(prepared.region.file_name(&format!("debug-{}", suffix)));
        save_png_atomic(layer, &path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("debug_masks: {}", e);
            ExitCode::FAILURE
        }
    }
}
