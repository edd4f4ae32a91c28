//! `donorscope` - CLI for browsing a donor list
//!
//! Every command performs the session's single donor fetch, then renders the
//! views published by the coordinator.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use donorscope::cli::{
    ChartCommand, Cli, Command, ConfigCommand, ExploreAction, ExploreCommand, FacetsCommand,
    ShowCommand, SourceArgs, EXPLORE_HELP,
};
use donorscope::coordinator::ChartView;
use donorscope::render::{
    render_buckets, render_catalog, render_snapshot, OutputFormat, NO_CHART_MESSAGE,
};
use donorscope::{aggregate, init_logging, source, Config, Error, ViewCoordinator, Views};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Show(cmd) => handle_show(&config, &cmd).await,
        Command::Facets(cmd) => handle_facets(&config, &cmd).await,
        Command::Chart(cmd) => handle_chart(&config, &cmd).await,
        Command::Explore(cmd) => handle_explore(&config, &cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Build the coordinator and run the session's one fetch.
async fn open_session(config: &Config, args: &SourceArgs) -> CliResult<ViewCoordinator> {
    let source = source::from_config(&args.apply(&config.source))?;
    let mut coordinator = ViewCoordinator::new(config.region_table()?);
    coordinator.load(&*source).await;
    Ok(coordinator)
}

/// Print the failure reason when the collection could not be loaded.
fn report_unavailable(coordinator: &ViewCoordinator) -> bool {
    if let Views::Unavailable { reason } = coordinator.snapshot().views() {
        println!("Donor data unavailable: {reason}");
        true
    } else {
        false
    }
}

async fn handle_show(config: &Config, cmd: &ShowCommand) -> CliResult {
    let filter = cmd.filter.to_filter()?;
    let mut coordinator = open_session(config, &cmd.source).await?;
    let snapshot = coordinator.set_filter(filter);
    print!("{}", render_snapshot(snapshot, cmd.format)?);
    Ok(())
}

async fn handle_facets(config: &Config, cmd: &FacetsCommand) -> CliResult {
    let coordinator = open_session(config, &cmd.source).await?;
    if report_unavailable(&coordinator) {
        return Ok(());
    }
    let format = if cmd.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };
    println!("{}", render_catalog(coordinator.snapshot().catalog(), format)?.trim_end());
    Ok(())
}

async fn handle_chart(config: &Config, cmd: &ChartCommand) -> CliResult {
    let filter = cmd.filter.to_filter()?;
    let mut coordinator = open_session(config, &cmd.source).await?;
    if report_unavailable(&coordinator) {
        return Ok(());
    }
    coordinator.set_filter(filter);

    let donors = coordinator.donors().unwrap_or_default();
    let chart = ChartView {
        group_by: cmd.by.into(),
        buckets: aggregate(coordinator.filter().apply(donors), cmd.by.into()),
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        println!("Donors by {} ({})", chart.group_by, coordinator.filter());
        if chart.buckets.is_empty() {
            println!("{NO_CHART_MESSAGE}");
        } else {
            print!("{}", render_buckets(&chart.buckets));
        }
    }
    Ok(())
}

async fn handle_explore(config: &Config, cmd: &ExploreCommand) -> CliResult {
    let mut coordinator = open_session(config, &cmd.source).await?;
    print!("{}", render_snapshot(coordinator.snapshot(), cmd.format)?);
    println!();
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let action = match line.parse::<ExploreAction>() {
            Ok(action) => action,
            Err(e) => {
                eprintln!("{e} (type 'help' for commands)");
                continue;
            }
        };

        let snapshot = match action {
            ExploreAction::Nothing => continue,
            ExploreAction::Quit => break,
            ExploreAction::Help => {
                println!("{EXPLORE_HELP}");
                continue;
            }
            ExploreAction::Facets => {
                print!(
                    "{}",
                    render_catalog(coordinator.snapshot().catalog(), OutputFormat::Plain)?
                );
                continue;
            }
            ExploreAction::Show => coordinator.snapshot(),
            ExploreAction::City(city) => coordinator.select_city(city),
            ExploreAction::BloodGroup(group) => coordinator.select_blood_group(group),
            ExploreAction::Reset => coordinator.reset_filter(),
        };
        print!("{}", render_snapshot(snapshot, cmd.format)?);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match validate_file(path) {
                Ok(()) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn validate_file(path: PathBuf) -> donorscope::Result<()> {
    // A missing file would silently fall back to defaults.
    std::fs::metadata(&path).map_err(|source| Error::FileRead {
        path: path.clone(),
        source,
    })?;
    Config::load_from(Some(path)).map(|_| ())
}

fn print_config(config: &Config) {
    let unset = "(not set)".to_string();
    let map = &config.map;

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Source]");
    println!(
        "  URL:                {}",
        config.source.url.as_ref().unwrap_or(&unset)
    );
    println!(
        "  File:               {}",
        config
            .source
            .file
            .as_ref()
            .map_or(unset.clone(), |p| p.display().to_string())
    );
    println!("  Timeout (secs):     {}", config.source.timeout_secs);
    println!();
    println!("[Map]");
    println!(
        "  Default center:     {}, {}",
        map.default_center[0], map.default_center[1]
    );
    println!("  Default zoom:       {}", map.default_zoom);
    println!("  Coarse zoom:        {}", map.coarse_zoom);
    println!("  Fine zoom:          {}", map.fine_zoom);
    println!(
        "  Regions:            {}",
        map.regions.keys().cloned().collect::<Vec<_>>().join(", ")
    );
}
