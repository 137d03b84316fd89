//! NTNDArray codec CLI tool
//!
//! Decodes compressed areaDetector frames and produces test frames.

use clap::Parser;
use ntnda_codec::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
