use amass_core::{common::options::PoseConverterConfig, pipeline::convert_pose_archive};
use clap::Parser;
use log::{error, LevelFilter};
use std::{path::PathBuf, process::ExitCode};
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Binary that converts an AMASS animation (.npz) into a JSON document with the poses as quaternions"
)]
struct Args {
    /// Input file. MUST be an AMASS .npz archive.
    source: PathBuf,
    /// Output JSON file.
    destination: PathBuf,
}
fn main() -> ExitCode {
    env_logger::Builder::new().filter_level(LevelFilter::Info).init();
    let args = Args::parse();
    match convert_pose_archive(&args.source, &args.destination, &PoseConverterConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {e}", args.source.display());
            ExitCode::FAILURE
        }
    }
}
