use crate::domain::model::Location;
use crate::domain::ports::{PreferenceStore, PriceApi};
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const USER_LOCATION_KEY: &str = "user_location";

/// How long a cached location is trusted.
pub fn cache_ttl() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLocation {
    data: Location,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Cache,
    Remote,
    Fallback,
}

/// Resolves the user's location: fresh cache, then the API, then a fixed default.
#[derive(Debug)]
pub struct LocationResolver<S: PreferenceStore> {
    store: S,
    error: Option<String>,
}

impl<S: PreferenceStore> LocationResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store, error: None }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    async fn cached(&self, now: DateTime<Utc>) -> Option<Location> {
        let raw = match self.store.read(USER_LOCATION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("🔶 Could not read cached location: {}", e);
                return None;
            }
        };

        let cached: CachedLocation = match serde_json::from_slice(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("🔶 Ignoring unreadable location cache: {}", e);
                return None;
            }
        };

        (now - cached.timestamp < cache_ttl()).then_some(cached.data)
    }

    async fn store_location(&self, location: &Location, now: DateTime<Utc>) -> Result<()> {
        let cached = CachedLocation {
            data: location.clone(),
            timestamp: now,
        };
        self.store
            .write(USER_LOCATION_KEY, &serde_json::to_vec(&cached)?)
            .await
    }

    pub async fn resolve<A: PriceApi + ?Sized>(&mut self, api: &A) -> (Location, LocationSource) {
        self.resolve_at(api, Utc::now(), false).await
    }

    /// Skips the cache when `force_refresh` is set.
    pub async fn resolve_at<A: PriceApi + ?Sized>(
        &mut self,
        api: &A,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> (Location, LocationSource) {
        self.error = None;

        if !force_refresh {
            if let Some(location) = self.cached(now).await {
                tracing::debug!("📍 Using cached location {}", location.city);
                return (location, LocationSource::Cache);
            }
        }

        match api.location().await {
            Ok(location) => {
                if let Err(e) = self.store_location(&location, now).await {
                    tracing::warn!("🔶 Could not cache location: {}", e);
                }
                tracing::info!("📍 Located in {}, {}", location.city, location.country);
                (location, LocationSource::Remote)
            }
            Err(e) => {
                tracing::warn!("🔶 Error fetching location, using default: {}", e);
                self.error = Some(e.user_friendly_message());
                (Location::default(), LocationSource::Fallback)
            }
        }
    }

    /// Manual override; cached with the current timestamp.
    pub async fn update_location(&mut self, location: &Location) -> Result<()> {
        self.store_location(location, Utc::now()).await
    }
}
