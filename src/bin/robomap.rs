// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robomap CLI
//!
//! Convert mower maps between ROS1 bags and GeoJSON.
//!
//! ## Usage
//!
//! ```sh
//! # Extract map polygons
//! robomap convert to-geojson mower.bag map.geojson
//!
//! # Write edited polygons back
//! robomap convert to-bag map.geojson map.bag --frame-id map
//!
//! # List connections
//! robomap inspect mower.bag
//! ```

mod cmd;
mod common;

use std::process;

use clap::{ArgAction, Parser, Subcommand};
use cmd::{ConvertCmd, InspectCmd};
use common::Result;

/// Robomap - mower map conversion toolkit
///
/// Extracts polygon boundaries from ROS1 bag files into GeoJSON and writes
/// GeoJSON polygons back into bags.
#[derive(Parser, Clone)]
#[command(name = "robomap")]
#[command(about = "Convert robotic mower maps between ROS1 bags and GeoJSON", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Convert between bag and GeoJSON (to-geojson, to-bag)
    #[command(subcommand)]
    Convert(ConvertCmd),

    /// List the connections of a bag with message counts
    Inspect(InspectCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.verbose);

    match cli.command {
        Commands::Convert(cmd) => cmd.run(),
        Commands::Inspect(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
