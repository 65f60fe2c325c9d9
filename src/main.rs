//! nalssi: command-line front end for Nalssi
//!
//! Usage examples
//! --------------
//!
//! - Search districts, skipping letters freely
//!   $ nalssi search 서종청
//!
//! - Weather for the default location, coordinates or a place name
//!   $ nalssi weather
//!   $ nalssi weather --lat 35.1796 --lon 129.0756
//!   $ nalssi weather --name Busan
//!
//! - Manage favorites (up to six)
//!   $ nalssi fav add 집 37.5665 126.978
//!   $ nalssi fav list
//!
//! Keys are read from config.toml, or from `OPENWEATHER_API_KEY` and
//! `KAKAO_REST_API_KEY` when the config leaves them empty.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod args;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::args::{CliArgs, Commands, FavCommand};
use nalssi_core::{App, AppError, Config};
use nalssi_places::{NewFavorite, ToggleOutcome};
use nalssi_weather::{Coordinates, WeatherReport};

#[tokio::main]
async fn main() -> Result<()> {
    nalssi_core::init()?;
    let args = CliArgs::parse();

    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => Config::config_path()?,
    };

    if let Commands::Config = args.command {
        let config = Config::load_from(&config_path)?;
        print_config(&config, &config_path);
        return Ok(());
    }

    let (config, _) = Config::load_validated_from(&config_path)?;

    let mut app = App::new(config)?;
    if let Err(e) = run(&mut app, args.command).await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

async fn run(app: &mut App, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Search { keyword } => {
            let results = app.search_districts(&keyword);
            if results.is_empty() {
                println!("No districts match {:?}", keyword);
            }
            for record in results {
                println!("{}  ({})", record.display_name(), record.full_name());
            }
        }

        Commands::Places { keyword } => {
            let places = app.search_places(&keyword).await?;
            if places.is_empty() {
                println!("No places match {:?}", keyword);
            }
            for place in places {
                println!(
                    "{}  {}  ({:.4}, {:.4})",
                    place.place_name, place.address_name, place.coords.lat, place.coords.lon
                );
            }
        }

        Commands::Weather { lat, lon, name } => {
            let coords = match (lat, lon, name) {
                (Some(lat), Some(lon), _) => Coordinates::new(lat, lon),
                (_, _, Some(name)) => {
                    let place = app.resolve_place(&name).await?;
                    println!("{} -> ({:.4}, {:.4})", place.name, place.coords.lat, place.coords.lon);
                    place.coords
                }
                _ => app.default_location(),
            };

            let report = app.weather_report(coords).await?;
            let starred = app.favorites().is_favorite(coords.lat, coords.lon);
            print_report(&report, starred);
        }

        Commands::Fav { action } => run_fav(app, action)?,

        // Handled before the app is built
        Commands::Config => {}
    }

    Ok(())
}

fn run_fav(app: &mut App, action: FavCommand) -> Result<(), AppError> {
    let favorites = app.favorites_mut();

    match action {
        FavCommand::List => {
            if favorites.is_empty() {
                println!("No favorites saved");
            }
            for fav in favorites.favorites() {
                println!("{}  {}  ({:.4}, {:.4})", fav.id, fav.name, fav.lat, fav.lon);
            }
        }

        FavCommand::Add { name, lat, lon } => {
            Coordinates::new(lat, lon).validate()?;
            let fav = favorites.add(NewFavorite::new(name, lat, lon))?;
            println!("Saved {} ({})", fav.name, fav.id);
        }

        FavCommand::Rename { id, name } => match favorites.rename(&id, &name)? {
            Some(fav) => println!("Renamed {} to {}", fav.id, fav.name),
            None => println!("No favorite with id {}", id),
        },

        FavCommand::Remove { id } => match favorites.remove(&id) {
            Some(fav) => println!("Removed {}", fav.name),
            None => println!("No favorite with id {}", id),
        },

        FavCommand::Toggle { name, lat, lon } => {
            Coordinates::new(lat, lon).validate()?;
            match favorites.toggle(NewFavorite::new(name, lat, lon))? {
                ToggleOutcome::Added(fav) => println!("Added {} ({})", fav.name, fav.id),
                ToggleOutcome::Removed(fav) => println!("Removed {} ({})", fav.name, fav.id),
            }
        }
    }

    Ok(())
}

fn print_report(report: &WeatherReport, starred: bool) {
    let current = &report.current;
    let star = if starred { " *" } else { "" };

    println!("{}{}", report.display_name(), star);
    println!(
        "  {:.1}° {} (feels like {:.1}°, {:.1}° / {:.1}°)",
        current.temperature,
        current.description,
        current.feels_like,
        current.temp_min,
        current.temp_max
    );
    println!(
        "  humidity {}%  wind {:.1} m/s {}  pressure {} hPa",
        current.humidity,
        current.wind_speed,
        current.wind_direction(),
        current.pressure
    );

    println!("\nNext hours:");
    for entry in report.forecast.hourly() {
        println!(
            "  {}  {:>5.1}°  {:>3}%  {}",
            entry.time_text, entry.temperature, entry.precipitation_chance, entry.description
        );
    }

    println!("\nDaily (noon):");
    for entry in report.forecast.daily() {
        let date = entry.time_text.split(' ').next().unwrap_or(&entry.time_text);
        println!(
            "  {}  {:>5.1}° / {:>5.1}°  {}",
            date, entry.temp_min, entry.temp_max, entry.description
        );
    }

    let wet = report.forecast.precipitation();
    if !wet.is_empty() {
        println!("\nRain or snow expected:");
        for entry in wet {
            println!(
                "  {}  rain {:.1} mm  snow {:.1} mm",
                entry.time_text,
                entry.rain_mm.unwrap_or(0.0),
                entry.snow_mm.unwrap_or(0.0)
            );
        }
    }
}

fn print_config(config: &Config, path: &Path) {
    println!("Config file: {}", path.display());
    println!(
        "Favorites: {:?} in {}",
        config.favorites.backend,
        config.favorites.data_dir.display()
    );

    let validation = config.validate();
    for error in &validation.errors {
        println!("  error: {}", error);
    }
    for warning in &validation.warnings {
        println!("  warning: {}", warning);
    }
    if validation.is_valid() && validation.warnings.is_empty() {
        println!("Configuration OK");
    }
}
