//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::aggregate::GroupBy;
use crate::config::SourceConfig;
use crate::error::Result;
use crate::filter::{FilterState, ALL};
use crate::render::OutputFormat;

/// Flags selecting where donors come from, overriding the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Fetch donors from this endpoint
    #[arg(long, value_name = "URL", conflicts_with = "file")]
    pub url: Option<String>,

    /// Read donors from a local JSON file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl SourceArgs {
    /// Apply the flags on top of the configured source.
    #[must_use]
    pub fn apply(&self, config: &SourceConfig) -> SourceConfig {
        let mut merged = config.clone();
        if let Some(url) = &self.url {
            merged.url = Some(url.clone());
            merged.file = None;
        }
        if let Some(file) = &self.file {
            merged.file = Some(file.clone());
        }
        merged
    }
}

/// City and blood group selection.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// City to show, or "All"
    #[arg(long, default_value = ALL)]
    pub city: String,

    /// Blood group to show (e.g. "O+"), or "All"
    #[arg(short = 'g', long, default_value = ALL)]
    pub blood_group: String,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            city: ALL.to_string(),
            blood_group: ALL.to_string(),
        }
    }
}

impl FilterArgs {
    /// Parse the selection into a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the blood group is not a known group, "unknown" or "All".
    pub fn to_filter(&self) -> Result<FilterState> {
        Ok(FilterState {
            city: FilterState::parse_city(&self.city),
            blood_group: FilterState::parse_blood_group(&self.blood_group)?,
        })
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Donor source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Filter selection
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Facets command arguments.
#[derive(Debug, Args)]
pub struct FacetsCommand {
    /// Donor source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Chart command arguments.
#[derive(Debug, Args)]
pub struct ChartCommand {
    /// Donor source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Filter selection
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Facet to count donors by
    #[arg(long, value_enum, default_value = "blood-group")]
    pub by: GroupByArg,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Explore command arguments.
#[derive(Debug, Args)]
pub struct ExploreCommand {
    /// Donor source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format for each republication
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Facet argument for the chart command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupByArg {
    /// One bucket per city
    City,
    /// One bucket per known blood group
    BloodGroup,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::City => Self::City,
            GroupByArg::BloodGroup => Self::BloodGroup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donor::BloodGroup;
    use crate::filter::Facet;

    #[test]
    fn test_group_by_arg_conversion() {
        assert_eq!(GroupBy::from(GroupByArg::City), GroupBy::City);
        assert_eq!(GroupBy::from(GroupByArg::BloodGroup), GroupBy::BloodGroup);
    }

    #[test]
    fn test_filter_args_default_is_all() {
        let filter = FilterArgs::default().to_filter().unwrap();
        assert_eq!(filter, FilterState::all());
    }

    #[test]
    fn test_filter_args_parse() {
        let args = FilterArgs {
            city: " Colombo ".to_string(),
            blood_group: "o+".to_string(),
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.city, Facet::Only("Colombo".to_string()));
        assert_eq!(filter.blood_group, Facet::Only(BloodGroup::OPositive));
    }

    #[test]
    fn test_filter_args_rejects_bad_group() {
        let args = FilterArgs {
            city: ALL.to_string(),
            blood_group: "C+".to_string(),
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn test_source_args_override_url() {
        let config = SourceConfig {
            url: None,
            file: Some(PathBuf::from("/data/donors.json")),
            timeout_secs: 12,
        };
        let args = SourceArgs {
            url: Some("https://donors.example.org/api".to_string()),
            file: None,
        };
        let merged = args.apply(&config);
        assert_eq!(merged.url.as_deref(), Some("https://donors.example.org/api"));
        assert!(merged.file.is_none());
        assert_eq!(merged.timeout_secs, 12);
    }

    #[test]
    fn test_source_args_empty_keeps_config() {
        let config = SourceConfig {
            url: Some("https://donors.example.org/api".to_string()),
            file: None,
            timeout_secs: 30,
        };
        assert_eq!(SourceArgs::default().apply(&config), config);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
