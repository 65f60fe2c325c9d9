//! Favorite locations: a small ordered collection persisted on every change.
//!
//! The store owns the collection outright. Callers mutate it only through
//! [`FavoritesStore::add`], [`FavoritesStore::remove`], [`FavoritesStore::rename`]
//! and [`FavoritesStore::toggle`]; the cap and name rules live here rather
//! than at each call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::FavoritesStorage;

/// Maximum number of saved favorites.
pub const MAX_FAVORITES: usize = 6;

/// Maximum favorite name length, in characters, after trimming.
pub const MAX_NAME_LENGTH: usize = 30;

/// Errors returned by favorites mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FavoritesError {
    /// The collection already holds `max` favorites.
    #[error("Favorites limit reached ({max})")]
    CapacityExceeded { max: usize },

    /// The supplied name is empty or too long.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl FavoritesError {
    /// User-facing message for the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::CapacityExceeded { max } => {
                format!("You can save up to {} favorites.", max)
            }
            Self::Validation(msg) => msg.clone(),
        }
    }
}

/// A saved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Input for creating a favorite; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFavorite {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl NewFavorite {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// Result of [`FavoritesStore::toggle`].
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Added(Favorite),
    Removed(Favorite),
}

/// Persisted document shape: `{ "favorites": [...] }`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesDocument {
    favorites: Vec<Favorite>,
}

/// Validate and normalize a favorite name.
///
/// Returns the trimmed name.
///
/// # Errors
/// Returns `FavoritesError::Validation` if the trimmed name is empty or longer
/// than [`MAX_NAME_LENGTH`] characters.
pub fn validate_name(name: &str) -> Result<String, FavoritesError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(FavoritesError::Validation(
            "Please enter a name.".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(FavoritesError::Validation(format!(
            "Names can be at most {} characters.",
            MAX_NAME_LENGTH
        )));
    }

    Ok(trimmed.to_string())
}

/// Check that a favorite's coordinates are finite and within range.
///
/// # Errors
/// Returns `FavoritesError::Validation` otherwise.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), FavoritesError> {
    let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
    let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(FavoritesError::Validation(format!("Invalid location ({}, {}).", lat, lon)))
    }
}

/// Ordered, persisted collection of favorites.
pub struct FavoritesStore<S: FavoritesStorage> {
    storage: S,
    favorites: Vec<Favorite>,
}

impl<S: FavoritesStorage> FavoritesStore<S> {
    /// Load the collection from `storage`.
    ///
    /// Missing, unreadable or malformed state starts an empty collection.
    pub fn open(storage: S) -> Self {
        let favorites = match storage.load() {
            Ok(Some(document)) => match serde_json::from_str::<FavoritesDocument>(&document) {
                Ok(doc) => doc.favorites,
                Err(e) => {
                    tracing::warn!("Stored favorites are malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read stored favorites, starting empty: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} favorites", favorites.len());
        Self { storage, favorites }
    }

    /// Favorites in insertion order.
    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    pub fn get(&self, id: &str) -> Option<&Favorite> {
        self.favorites.iter().find(|f| f.id == id)
    }

    /// First favorite saved at exactly these coordinates.
    pub fn find_by_coords(&self, lat: f64, lon: f64) -> Option<&Favorite> {
        self.favorites.iter().find(|f| f.lat == lat && f.lon == lon)
    }

    pub fn is_favorite(&self, lat: f64, lon: f64) -> bool {
        self.find_by_coords(lat, lon).is_some()
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.favorites.len() >= MAX_FAVORITES
    }

    /// Append a new favorite with a fresh id.
    ///
    /// # Errors
    /// Returns `FavoritesError::CapacityExceeded` when [`MAX_FAVORITES`] are
    /// already saved, or `FavoritesError::Validation` for an invalid name or
    /// non-finite/out-of-range coordinates.
    pub fn add(&mut self, new: NewFavorite) -> Result<Favorite, FavoritesError> {
        let name = validate_name(&new.name)?;
        validate_coordinates(new.lat, new.lon)?;

        if self.is_full() {
            return Err(FavoritesError::CapacityExceeded { max: MAX_FAVORITES });
        }

        let favorite = Favorite {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            lat: new.lat,
            lon: new.lon,
        };

        self.favorites.push(favorite.clone());
        self.persist();

        tracing::info!("Added favorite {} ({})", favorite.name, favorite.id);
        Ok(favorite)
    }

    /// Remove the favorite with `id`. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Favorite> {
        let pos = self.favorites.iter().position(|f| f.id == id)?;
        let removed = self.favorites.remove(pos);
        self.persist();

        tracing::info!("Removed favorite {} ({})", removed.name, removed.id);
        Some(removed)
    }

    /// Rename the favorite with `id` in place.
    ///
    /// Returns `Ok(None)` when no favorite has that id.
    ///
    /// # Errors
    /// Returns `FavoritesError::Validation` if the trimmed name is empty or
    /// too long; nothing is changed in that case.
    pub fn rename(
        &mut self,
        id: &str,
        new_name: &str,
    ) -> Result<Option<Favorite>, FavoritesError> {
        let name = validate_name(new_name)?;

        let Some(favorite) = self.favorites.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        favorite.name = name;
        let renamed = favorite.clone();
        self.persist();

        tracing::info!("Renamed favorite {} to {}", renamed.id, renamed.name);
        Ok(Some(renamed))
    }

    /// Remove the favorite at these coordinates, or add one if none exists.
    ///
    /// # Errors
    /// Same as [`FavoritesStore::add`] when adding.
    pub fn toggle(&mut self, new: NewFavorite) -> Result<ToggleOutcome, FavoritesError> {
        if let Some(id) = self.find_by_coords(new.lat, new.lon).map(|f| f.id.clone()) {
            if let Some(removed) = self.remove(&id) {
                return Ok(ToggleOutcome::Removed(removed));
            }
        }

        self.add(new).map(ToggleOutcome::Added)
    }

    /// Write the whole collection back. Failures are logged, not returned.
    fn persist(&self) {
        let document = FavoritesDocument {
            favorites: self.favorites.clone(),
        };

        let json = match serde_json::to_string(&document) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize favorites: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.save(&json) {
            tracing::warn!("Failed to persist favorites: {}", e);
        }
    }
}
