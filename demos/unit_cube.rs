//! Builds the unit cube geomodel and saves it as JSON.
//!
//! ```text
//! cargo run --example unit_cube -- --nb-hexs 10 --out cube.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use brep_geomodel::prelude::*;
use clap::Parser;

#[derive(Parser)]
#[command(name = "unit_cube")]
#[command(about = "Build a unit cube geomodel meshed with hexahedra", long_about = None)]
struct Cli {
    /// Number of hexahedra per axis (10 gives a 10x10x10 mesh)
    #[arg(long, default_value_t = 8)]
    nb_hexs: usize,
    /// Output file (format determined by extension: .json)
    #[arg(short, long, default_value = "unit_cube.json")]
    out: PathBuf,
    /// Vertex merge distance; 0 for exact matching
    #[arg(long, default_value_t = brep_geomodel::data::DEFAULT_VERTEX_TOLERANCE)]
    tolerance: f64,
}

fn run(cli: &Cli) -> Result<(), GeoModelError> {
    let options = GeoModelOptions {
        vertex_tolerance: cli.tolerance,
        ..GeoModelOptions::default()
    };
    let model = unit_cube_geomodel(cli.nb_hexs, options)?;
    let cells = model.region(0).and_then(|r| r.cells()).map_or(0, |c| c.nb_cells());
    println!(
        "unit cube: {} corners, {} lines, {} surfaces, {} regions, {} cells, {} vertices",
        model.nb_corners(),
        model.nb_lines(),
        model.nb_surfaces(),
        model.nb_regions(),
        cells,
        model.vertices().len()
    );
    save_geomodel(&model, &cli.out)?;
    println!("saved to {}", cli.out.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
