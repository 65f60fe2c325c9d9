use std::sync::Arc;

use chrono::Utc;

use nalssi_places::{
    DistrictRecord, DistrictSearchIndex, FavoritesStorage, FavoritesStore, JsonFileStorage,
    MemoryStorage, SqliteKvStorage, FAVORITES_STORE_KEY,
};
use nalssi_weather::{
    Coordinates, GeoPlace, Geocoder, KakaoMapClient, MapService, PlaceResult, WeatherProvider,
    WeatherReport,
};

use crate::config::{Config, FavoritesBackend, FavoritesConfig, SearchConfig};
use crate::error::{AppError, ConfigError};

const SQLITE_FILE_NAME: &str = "favorites.db";

/// Favorites store over whichever backend the config selects
pub type Favorites = FavoritesStore<Box<dyn FavoritesStorage>>;

/// Main application state: search index, favorites and remote clients
pub struct App<M: MapService = KakaoMapClient> {
    config: Arc<Config>,
    districts: DistrictSearchIndex,
    favorites: Favorites,
    weather: WeatherProvider,
    geocoder: Geocoder,
    maps: Arc<M>,
}

impl App<KakaoMapClient> {
    /// Create an application using the Kakao map service
    pub fn new(config: Config) -> Result<Self, AppError> {
        let maps = KakaoMapClient::new(
            &config.maps.resolved_rest_api_key(),
            &config.maps.base_url,
            config.weather.timeout(),
        )?;
        Self::with_map_service(config, Arc::new(maps))
    }
}

impl<M: MapService> App<M> {
    /// Create an application with an injected map service
    pub fn with_map_service(config: Config, maps: Arc<M>) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        let districts = load_districts(&config.search)?;
        let favorites = FavoritesStore::open(open_storage(&config.favorites)?);

        let settings = config.weather.settings();
        let geocoder = Geocoder::new(settings.clone(), &config.weather.geo_base_url)?;
        let weather = WeatherProvider::new(settings)?;

        tracing::info!(
            "Application initialized: {} districts, {} favorites",
            districts.len(),
            favorites.len()
        );

        Ok(Self {
            config: Arc::new(config),
            districts,
            favorites,
            weather,
            geocoder,
            maps,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Coordinates shown when nothing else is selected
    pub fn default_location(&self) -> Coordinates {
        self.config.location.coords()
    }

    /// District names containing `keyword` as a subsequence, up to the configured limit
    pub fn search_districts(&self, keyword: &str) -> Vec<&DistrictRecord> {
        self.districts.search_with_limit(keyword, self.config.search.limit)
    }

    pub fn districts(&self) -> &DistrictSearchIndex {
        &self.districts
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut Favorites {
        &mut self.favorites
    }

    /// Current conditions, forecast and place name for `coords`.
    ///
    /// The three lookups run concurrently. A failed reverse geocode only
    /// leaves `place_name` empty.
    pub async fn weather_report(&self, coords: Coordinates) -> Result<WeatherReport, AppError> {
        coords.validate()?;

        let (current, forecast, place_name) = tokio::join!(
            self.weather.current(coords),
            self.weather.forecast(coords),
            self.maps.reverse_geocode(coords),
        );

        Ok(WeatherReport {
            coords,
            place_name,
            current: current?,
            forecast: forecast?,
            fetched_at: Utc::now(),
        })
    }

    /// Resolve a place name to coordinates
    pub async fn resolve_place(&self, name: &str) -> Result<GeoPlace, AppError> {
        Ok(self.geocoder.coords_by_name(name).await?)
    }

    /// Keyword search through the map service
    pub async fn search_places(&self, keyword: &str) -> Result<Vec<PlaceResult>, AppError> {
        Ok(self.maps.search(keyword).await?)
    }

    /// Drop memoized weather responses so the next report refetches.
    pub fn refresh(&self) {
        self.weather.clear_cache();
    }
}

fn load_districts(search: &SearchConfig) -> Result<DistrictSearchIndex, AppError> {
    let index = match &search.dataset_path {
        Some(path) => DistrictSearchIndex::from_json_file(path, search.separator)?,
        None => DistrictSearchIndex::embedded()?,
    };
    Ok(index)
}

fn open_storage(favorites: &FavoritesConfig) -> Result<Box<dyn FavoritesStorage>, AppError> {
    let storage: Box<dyn FavoritesStorage> = match favorites.backend {
        FavoritesBackend::Sqlite => {
            let path = favorites.data_dir.join(SQLITE_FILE_NAME);
            tracing::debug!("Opening favorites database at {}", path.display());
            Box::new(SqliteKvStorage::open(&path, FAVORITES_STORE_KEY)?)
        }
        FavoritesBackend::Json => {
            Box::new(JsonFileStorage::new(&favorites.data_dir, FAVORITES_STORE_KEY))
        }
        FavoritesBackend::Memory => Box::new(MemoryStorage::new()),
    };
    Ok(storage)
}
