use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pretty_maps::pipeline::{make_map, MapRequest};
use pretty_maps::region::RegionId;
use pretty_maps::style::StyleConfig;
use pretty_maps::{logging, Result};

#[derive(Parser, Debug)]
#[command(name = "pretty_maps")]
#[command(about = "Render stylized fantasy maps from world raster exports")]
struct Args {
    /// Directory holding the region exports (output is written here too)
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Map style; selects `<style>_dirt.png`, `<style>_mountains.png`, `<style>_trees.png`
    #[arg(short, long, default_value = "fantasy")]
    style: String,

    /// Directory holding the style textures (default: same as --dir)
    #[arg(short, long)]
    textures: Option<PathBuf>,

    /// Region id, e.g. "region1" (discovered from --dir if not given)
    #[arg(long, requires = "date")]
    region: Option<String>,

    /// Date stamp, e.g. "00250-01-01"
    #[arg(long, requires = "region")]
    date: Option<String>,

    /// Also write ocean-transparent copies of the el/tmp/veg/vol layers
    #[arg(long)]
    export_land_layers: bool,

    /// JSON file overriding style constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective style config as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => StyleConfig::load(path)?,
        None => StyleConfig::default(),
    };

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut request = MapRequest::new(&args.dir);
    request.style = args.style;
    request.config = config;
    request.export_land_layers = args.export_land_layers;
    if let Some(textures) = args.textures {
        request.texture_dir = textures;
    }
    if let (Some(region), Some(date)) = (&args.region, &args.date) {
        request.region = Some(RegionId::new(region, date));
    }

    log::info!("Rendering {} map from {}", request.style, request.dir.display());
    let report = make_map(&request)?;
    log::info!(
        "Map complete: {} ({}x{}, {} ocean / {} mountain pixels)",
        report.output.display(),
        report.width,
        report.height,
        report.ocean_pixels,
        report.mountain_pixels
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
