use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stellar-tales")]
#[command(about = "Space-weather feeds for young explorers.")]
#[command(version)]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recent flares, CMEs and storms with an alert level
    Summary,
    /// Solar flares
    Flares,
    /// Coronal mass ejections
    Cmes,
    /// Geomagnetic storms
    Storms,
    /// Solar energetic particle events
    Sep,
    /// Astronomy picture of the day
    Apod {
        /// Day to show (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Search the NASA image library
    Images {
        #[arg(num_args = 1.., required = true)]
        query: Vec<String>,
    },
    /// SWPC alerts
    Alerts,
    /// SWPC alerts grouped as watches, warnings and alerts
    Notifications,
    /// GOES X-ray flux
    Xray {
        /// Seven days instead of one
        #[arg(long)]
        week: bool,
    },
    /// Solar wind magnetic field and plasma
    Wind,
    /// Three-day Kp forecast
    Kp,
    /// Aurora forecast
    Aurora,
    /// Check the app shell is reachable: install and activate against the configured origin
    Precache,
    /// Show configuration and cache status
    Status,
    /// Generate config sample
    GenerateConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_json() {
        let cli = Cli::parse_from(["stellar-tales", "xray", "--week", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.command, Command::Xray { week: true });

        let cli = Cli::parse_from(["stellar-tales", "images", "solar", "flare"]);
        assert_eq!(
            cli.command,
            Command::Images {
                query: vec!["solar".to_string(), "flare".to_string()]
            }
        );
    }

    #[test]
    fn precache_is_a_subcommand() {
        let cli = Cli::parse_from(["stellar-tales", "precache"]);
        assert_eq!(cli.command, Command::Precache);
        assert!(!cli.json);
    }

    #[test]
    fn apod_date_is_validated() {
        let cli = Cli::parse_from(["stellar-tales", "apod", "--date", "2024-05-11"]);
        assert_eq!(
            cli.command,
            Command::Apod {
                date: NaiveDate::from_ymd_opt(2024, 5, 11)
            }
        );
        assert!(Cli::try_parse_from(["stellar-tales", "apod", "--date", "someday"]).is_err());
    }
}
