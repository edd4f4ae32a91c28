//! Line commands of the interactive `explore` session.

use std::str::FromStr;

use crate::donor::BloodGroup;
use crate::error::{Error, Result};
use crate::filter::{Facet, FilterState};

/// Help text printed by the `help` command.
pub const EXPLORE_HELP: &str = "\
Commands:
  city <name|All>      select a city
  group <group|All>    select a blood group (e.g. O+, ab-, unknown)
  reset                clear both selections
  facets               list available cities and blood groups
  show                 print the current views again
  help                 show this help
  quit                 leave the session";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum ExploreAction {
    /// Change the city selection.
    City(Facet<String>),
    /// Change the blood group selection.
    BloodGroup(Facet<BloodGroup>),
    /// Clear both selections.
    Reset,
    /// List the selector options.
    Facets,
    /// Render the current snapshot again.
    Show,
    /// Print the command list.
    Help,
    /// End the session.
    Quit,
    /// Blank line.
    Nothing,
}

impl FromStr for ExploreAction {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "" => Ok(Self::Nothing),
            "city" if !rest.is_empty() => Ok(Self::City(FilterState::parse_city(rest))),
            "group" | "blood-group" if !rest.is_empty() => {
                FilterState::parse_blood_group(rest).map(Self::BloodGroup)
            }
            "reset" => Ok(Self::Reset),
            "facets" => Ok(Self::Facets),
            "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(Error::invalid_facet("command", line)),
        }
    }
}
