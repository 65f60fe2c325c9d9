//! Place lookup for Nalssi
//!
//! District name search over a bundled dataset and the persisted list of
//! favorite locations.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod favorites;
pub mod search;
pub mod storage;

pub use favorites::{
    validate_coordinates, validate_name, Favorite, FavoritesError, FavoritesStore, NewFavorite,
    ToggleOutcome, MAX_FAVORITES, MAX_NAME_LENGTH,
};
pub use search::{
    is_subsequence, DatasetError, DistrictRecord, DistrictSearchIndex, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SEPARATOR,
};
pub use storage::{
    FavoritesStorage, JsonFileStorage, MemoryStorage, SqliteKvStorage, StorageError,
    FAVORITES_STORE_KEY,
};
