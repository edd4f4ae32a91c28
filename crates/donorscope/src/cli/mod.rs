//! Command-line interface for donorscope.
//!
//! This module provides the CLI structure for the `donorscope` binary.

mod commands;
mod explore;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ChartCommand, ConfigCommand, ExploreCommand, FacetsCommand, FilterArgs, GroupByArg,
    ShowCommand, SourceArgs,
};
pub use explore::{ExploreAction, EXPLORE_HELP};

/// donorscope - Find blood donors by city and blood group
///
/// Loads a donor list once and shows a table, a blood group distribution
/// and a map viewport, all derived from the same filter.
#[derive(Debug, Parser)]
#[command(name = "donorscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load donors and print the table, chart and map for one filter
    Show(ShowCommand),

    /// List the cities and blood groups that can be selected
    Facets(FacetsCommand),

    /// Count filtered donors by city or blood group
    Chart(ChartCommand),

    /// Change the filter interactively and watch all views follow
    Explore(ExploreCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
