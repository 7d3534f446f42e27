use amass_core::{common::options::RegressorConverterConfig, pipeline::convert_regressor_archive};
use clap::Parser;
use log::{error, LevelFilter};
use std::{path::PathBuf, process::ExitCode};
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Binary that projects the SMPL-H joint regressor into joint space. Writes a JSON document, or the full model plus the projection when the output ends in .h5"
)]
struct Args {
    /// Input file. MUST be a SMPL-H model .npz with v_template, J_regressor and shapedirs.
    source: PathBuf,
    /// Output file, .json or .h5
    destination: PathBuf,
}
fn main() -> ExitCode {
    env_logger::Builder::new().filter_level(LevelFilter::Info).init();
    let args = Args::parse();
    match convert_regressor_archive(&args.source, &args.destination, &RegressorConverterConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {e}", args.source.display());
            ExitCode::FAILURE
        }
    }
}
