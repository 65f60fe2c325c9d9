use clap::{Parser, Subcommand};

/// CLI arguments for nalssi
#[derive(Debug, Parser)]
#[command(
    name = "nalssi",
    version,
    about = "Korean district search, favorite locations and weather from the terminal"
)]
pub struct CliArgs {
    /// Path to an alternative config.toml
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search the district list; letters may be skipped (e.g. 서종청)
    Search {
        keyword: String,
    },

    /// Search places by keyword through the map service
    Places {
        keyword: String,
    },

    /// Show current weather with hourly and daily forecasts
    Weather {
        /// Latitude in degrees
        #[arg(long, requires = "lon", conflicts_with = "name", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Place name to geocode instead of coordinates
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage favorite locations
    Fav {
        #[command(subcommand)]
        action: FavCommand,
    },

    /// Print the config path and validation results
    Config,
}

#[derive(Debug, Subcommand)]
pub enum FavCommand {
    /// List saved favorites
    List,

    /// Save a new favorite
    Add {
        name: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Rename a favorite by id
    Rename {
        id: String,
        name: String,
    },

    /// Remove a favorite by id
    Remove {
        id: String,
    },

    /// Add a favorite at these coordinates, or remove the one already there
    Toggle {
        name: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weather_coordinates() {
        let args = CliArgs::try_parse_from(["nalssi", "weather", "--lat", "37.5", "--lon", "127.0"])
            .unwrap();
        match args.command {
            Commands::Weather { lat, lon, name } => {
                assert_eq!(lat, Some(37.5));
                assert_eq!(lon, Some(127.0));
                assert!(name.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(CliArgs::try_parse_from(["nalssi", "weather", "--lat", "37.5"]).is_err());
    }

    #[test]
    fn test_coordinates_conflict_with_name() {
        let result = CliArgs::try_parse_from([
            "nalssi", "weather", "--lat", "37.5", "--lon", "127.0", "--name", "Seoul",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_fav_add_negative_longitude() {
        let args = CliArgs::try_parse_from(["nalssi", "fav", "add", "집", "40.7", "-74.0"]).unwrap();
        match args.command {
            Commands::Fav {
                action: FavCommand::Add { name, lat, lon },
            } => {
                assert_eq!(name, "집");
                assert_eq!(lat, 40.7);
                assert_eq!(lon, -74.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
