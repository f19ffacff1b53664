//! Single-shot position lookups with a short-lived cache and a session
//! permission flag.

use crate::config::{AppConfig, GeolocationMode};
use crate::domain::Coordinates;
use reqwest::{Client, Url};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub type PositionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Coordinates, LocationError>> + Send + 'a>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("Location permission denied. Please allow location access to submit a report.")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("An unknown error occurred while getting location: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Prompt,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

/// Where fixes come from. Dyn-compatible so the provider can hold any source.
pub trait PositionSource: Send + Sync {
    fn locate(&self, high_accuracy: bool) -> PositionFuture<'_>;
}

/// IP-based lookup against a JSON endpoint that reports `latitude`/`longitude`
/// (or `lat`/`lon`).
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: Client,
    endpoint: String,
}

impl IpGeolocation {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl PositionSource for IpGeolocation {
    fn locate(&self, _high_accuracy: bool) -> PositionFuture<'_> {
        Box::pin(async move {
            let url = Url::parse(&self.endpoint)
                .map_err(|e| LocationError::Unknown(format!("invalid geolocation URL: {e}")))?;
            if url.scheme() != "https" {
                // Position lookups are only made over a secure channel
                return Err(LocationError::Unsupported);
            }

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| LocationError::Unknown(e.to_string()))?;
            if !response.status().is_success() {
                warn!(status = %response.status(), "geolocation endpoint refused lookup");
                return Err(LocationError::PositionUnavailable);
            }
            let body: Value = response
                .json()
                .await
                .map_err(|_| LocationError::PositionUnavailable)?;

            coordinates_from_json(&body).ok_or(LocationError::PositionUnavailable)
        })
    }
}

fn coordinates_from_json(body: &Value) -> Option<Coordinates> {
    let field = |names: [&str; 2]| names.iter().find_map(|name| body.get(name)?.as_f64());
    let latitude = field(["latitude", "lat"])?;
    let longitude = field(["longitude", "lon"])?;
    Some(Coordinates::new(latitude, longitude))
}

/// A fixed position, e.g. from `LOCATION_OVERRIDE`.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl PositionSource for FixedPosition {
    fn locate(&self, _high_accuracy: bool) -> PositionFuture<'_> {
        let coords = self.0;
        Box::pin(async move { Ok(coords) })
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedFix {
    coords: Coordinates,
    taken_at: Instant,
}

#[derive(Debug)]
struct ProviderState {
    permission: Permission,
    last_fix: Option<CachedFix>,
}

/// Wraps a position source with permission state, options and a fix cache.
pub struct LocationProvider {
    source: Option<Arc<dyn PositionSource>>,
    options: PositionOptions,
    state: Mutex<ProviderState>,
}

impl std::fmt::Debug for LocationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationProvider")
            .field("supported", &self.source.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LocationProvider {
    pub fn new(source: Option<Arc<dyn PositionSource>>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            state: Mutex::new(ProviderState {
                permission: Permission::Prompt,
                last_fix: None,
            }),
        }
    }

    /// A fixed override wins over the configured lookup mode.
    pub fn from_config(config: &AppConfig) -> Self {
        let source: Option<Arc<dyn PositionSource>> =
            match (config.location_override, config.geolocation) {
                (Some(coords), _) => Some(Arc::new(FixedPosition(coords))),
                (None, GeolocationMode::Ip) => {
                    Some(Arc::new(IpGeolocation::new(&config.geolocation_url)))
                }
                (None, GeolocationMode::Off) => None,
            };
        Self::new(source, PositionOptions::default())
    }

    pub const fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    pub fn permission(&self) -> Permission {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .permission
    }

    /// Records the user's answer to the permission prompt for this session.
    pub fn set_permission(&self, granted: bool) {
        let permission = if granted {
            Permission::Granted
        } else {
            Permission::Denied
        };
        info!(?permission, "location permission resolved");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .permission = permission;
    }

    /// One attempt at a fix. Serves a cached fix younger than
    /// `maximum_age`; otherwise asks the source, bounded by `timeout`.
    pub async fn current_location(&self) -> Result<Coordinates, LocationError> {
        let Some(source) = self.source.clone() else {
            return Err(LocationError::Unsupported);
        };

        let cached = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.permission != Permission::Granted {
                return Err(LocationError::PermissionDenied);
            }
            state
                .last_fix
                .filter(|fix| fix.taken_at.elapsed() <= self.options.maximum_age)
        };

        if let Some(fix) = cached {
            debug!("serving cached location fix");
            return Ok(fix.coords);
        }

        let coords = tokio::time::timeout(
            self.options.timeout,
            source.locate(self.options.high_accuracy),
        )
        .await
        .map_err(|_| LocationError::Timeout)??;

        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_fix = Some(CachedFix {
            coords,
            taken_at: Instant::now(),
        });
        debug!(latitude = coords.latitude, longitude = coords.longitude, "location fix acquired");
        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        coords: Coordinates,
    }

    impl PositionSource for CountingSource {
        fn locate(&self, _high_accuracy: bool) -> PositionFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let coords = self.coords;
            Box::pin(async move { Ok(coords) })
        }
    }

    struct StalledSource;

    impl PositionSource for StalledSource {
        fn locate(&self, _high_accuracy: bool) -> PositionFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(LocationError::PositionUnavailable)
            })
        }
    }

    fn granted(source: Arc<dyn PositionSource>, options: PositionOptions) -> LocationProvider {
        let provider = LocationProvider::new(Some(source), options);
        provider.set_permission(true);
        provider
    }

    #[tokio::test]
    async fn missing_source_is_unsupported() {
        let provider = LocationProvider::new(None, PositionOptions::default());
        provider.set_permission(true);
        assert!(!provider.is_supported());
        assert_eq!(
            provider.current_location().await,
            Err(LocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn unanswered_or_denied_permission_blocks_lookup() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            coords: Coordinates::new(1.0, 2.0),
        });
        let provider = LocationProvider::new(
            Some(source.clone() as Arc<dyn PositionSource>),
            PositionOptions::default(),
        );
        assert_eq!(provider.permission(), Permission::Prompt);
        assert_eq!(
            provider.current_location().await,
            Err(LocationError::PermissionDenied)
        );

        provider.set_permission(false);
        assert_eq!(
            provider.current_location().await,
            Err(LocationError::PermissionDenied)
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fresh_fix_is_served_from_cache() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            coords: Coordinates::new(16.3, 80.47),
        });
        let provider = granted(source.clone(), PositionOptions::default());

        let first = provider.current_location().await.unwrap();
        let second = provider.current_location().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_fix_is_refreshed() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            coords: Coordinates::new(16.3, 80.47),
        });
        let options = PositionOptions {
            maximum_age: Duration::ZERO,
            ..PositionOptions::default()
        };
        let provider = granted(source.clone(), options);

        provider.current_location().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        provider.current_location().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let options = PositionOptions {
            timeout: Duration::from_millis(20),
            ..PositionOptions::default()
        };
        let provider = granted(Arc::new(StalledSource), options);

        assert_eq!(
            provider.current_location().await,
            Err(LocationError::Timeout)
        );
    }

    #[tokio::test]
    async fn plain_http_endpoint_is_refused() {
        let provider = granted(
            Arc::new(IpGeolocation::new("http://ip-api.com/json/")),
            PositionOptions::default(),
        );
        assert_eq!(
            provider.current_location().await,
            Err(LocationError::Unsupported)
        );
    }

    #[test]
    fn coordinates_are_read_from_either_field_style() {
        let ipapi = serde_json::json!({"latitude": 16.3, "longitude": 80.47});
        let ip_api = serde_json::json!({"lat": 16.3, "lon": 80.47});
        let broken = serde_json::json!({"city": "Guntur"});

        assert_eq!(
            coordinates_from_json(&ipapi),
            Some(Coordinates::new(16.3, 80.47))
        );
        assert_eq!(
            coordinates_from_json(&ip_api),
            Some(Coordinates::new(16.3, 80.47))
        );
        assert_eq!(coordinates_from_json(&broken), None);
    }

    #[test]
    fn each_failure_kind_has_its_own_message() {
        let messages = [
            LocationError::Unsupported,
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unknown("boom".to_string()),
        ]
        .map(|e| e.to_string());

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(messages[1].contains("permission denied"));
    }
}
