//! thumbsheet CLI - embed image thumbnails into an XLSX workbook

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thumbsheet::prelude::*;
use thumbsheet::CellAddress;

#[derive(Parser)]
#[command(name = "thumbsheet")]
#[command(
    author,
    version,
    about = "Embed thumbnails of a folder of images into an XLSX workbook"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder for .jpg files and write one row per image
    Embed {
        /// Folder to scan recursively
        input: PathBuf,

        /// Output workbook (default: <INPUT>/result.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip images that fail to decode instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Show the rows and pictures of a workbook
    Info {
        /// Input workbook
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Embed {
            input,
            output,
            skip_invalid,
        } => embed(input, output, skip_invalid),
        Commands::Info { input } => show_info(&input),
    }
}

fn embed(input: PathBuf, output: Option<PathBuf>, skip_invalid: bool) -> Result<()> {
    let mut config = Config::new(input);
    if let Some(output) = output {
        config = config.with_output(output);
    }
    if skip_invalid {
        config = config.with_error_policy(ErrorPolicy::Skip);
    }

    let summary = run(&config, |file| println!("Processing {}", file.name))
        .with_context(|| format!("Failed to build '{}'", config.output_path().display()))?;

    for path in &summary.skipped {
        eprintln!("Skipped '{}'", path.display());
    }
    log::info!(
        "{} rows written to '{}'",
        summary.rows_written,
        summary.output.display()
    );

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        let data_rows = sheet
            .used_range()
            .map(|range| range.end.row)
            .unwrap_or(0);

        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        println!("    Data rows: {}", data_rows);
        println!("    Pictures: {}", sheet.picture_count());

        for pic in sheet.pictures() {
            let label = pic.description.as_deref().unwrap_or("-");
            println!(
                "      {}\t{}x{}\t{}",
                CellAddress::new(pic.row, pic.col),
                pic.width,
                pic.height,
                label
            );
        }
    }

    Ok(())
}
