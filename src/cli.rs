// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every checker setting can come from a --config TOML file; the flags here
// override whatever the file says.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "favcheck",
    version,
    about = "Checks your favorites and reports which are accessible, redirected or broken",
    long_about = "favcheck probes every bookmark in a JSON bookmark list concurrently, \
                  follows redirects, and prints a report of accessible, redirected and \
                  broken favorites. Press Ctrl-C to cancel and get a partial report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug logging (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every favorite in a bookmark file
    ///
    /// Example: favcheck check bookmarks.json --concurrency 4
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// JSON file with an array of {url, title, tags} bookmarks
    pub bookmarks: PathBuf,

    /// Output the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// TOML file with checker settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of favorites probed at the same time
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Per-favorite timeout in seconds, redirects included
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// How many redirects to follow before calling a favorite broken
    #[arg(long)]
    pub max_redirects: Option<usize>,
}
