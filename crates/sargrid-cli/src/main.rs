//! Offline grid tools. Everything here runs without the server or a
//! database: coordinators in the field can produce the same GPX document
//! the API serves, straight from grid parameters.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use sargrid_core::{gpx, grid, labels, GridParamsError, GridRequest};

#[derive(Debug, Parser)]
#[command(name = "sargrid-cli")]
#[command(about = "Field-search grid tools that run without the server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search grid layout commands.
    #[command(subcommand)]
    Grid(GridCommands),
}

#[derive(Debug, Subcommand)]
enum GridCommands {
    /// Compute a grid and write the GPX document to a file or stdout.
    Generate(GenerateArgs),
    /// Print the cell codes a grid would produce, row by row.
    Preview(PreviewArgs),
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// Latitude of the grid center, decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    center_lat: f64,

    /// Longitude of the grid center, decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    center_lon: f64,

    /// Number of columns.
    #[arg(long)]
    cols: u32,

    /// Number of rows.
    #[arg(long)]
    rows: u32,

    /// Cell edge length in meters.
    #[arg(long)]
    cell_size_m: f64,

    /// Output file; the document goes to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Creator attribute stamped on the GPX document.
    #[arg(long, default_value = "sargrid-cli/0.1")]
    creator: String,
}

#[derive(Debug, clap::Args)]
struct PreviewArgs {
    /// Number of columns.
    #[arg(long)]
    cols: u32,

    /// Number of rows.
    #[arg(long)]
    rows: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Grid(GridCommands::Generate(args)) => run_generate(&args),
        Commands::Grid(GridCommands::Preview(args)) => run_preview(&args),
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let request = GridRequest::new(
        args.center_lat,
        args.center_lon,
        args.cols,
        args.rows,
        args.cell_size_m,
    )?;
    let layout = grid::layout(&request);
    let document = gpx::encode(&layout, Utc::now(), &args.creator)?;

    match &args.out {
        Some(path) => {
            fs::write(path, &document)?;
            println!(
                "wrote {} waypoints and {} grid lines to {}",
                layout.waypoints.len(),
                layout.segments.len(),
                path.display()
            );
        }
        None => print!("{document}"),
    }
    Ok(())
}

fn run_preview(args: &PreviewArgs) -> anyhow::Result<()> {
    if args.cols == 0 || args.rows == 0 {
        return Err(GridParamsError::EmptyGrid.into());
    }

    // The last cell of the last row has the widest code.
    let width = labels::cell_code(args.cols - 1, args.rows - 1).len();
    for row in 0..args.rows {
        let line = (0..args.cols)
            .map(|col| format!("{:<width$}", labels::cell_code(col, row)))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", line.trim_end());
    }
    Ok(())
}
