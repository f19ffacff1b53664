use crate::domain::Coordinates;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PHOTO_BUCKET: &str = "waste-photos";
pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
const DEFAULT_FEED_POLL_MS: u64 = 2_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("unknown map style '{0}' (expected dark, light, dark-hires or light-hires)")]
    UnknownMapStyle(String),
    #[error("unsupported backend URL '{0}' (expected sqlite:, http:// or https://)")]
    UnsupportedBackend(String),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which report store implementation `BACKEND_URL` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Rest,
}

/// Base map style key. Picks the palette and the coastline resolution of the
/// map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStyle {
    Dark,
    Light,
    DarkHires,
    LightHires,
}

impl MapStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::DarkHires => "dark-hires",
            Self::LightHires => "light-hires",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            "dark-hires" => Some(Self::DarkHires),
            "light-hires" => Some(Self::LightHires),
            _ => None,
        }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark | Self::DarkHires)
    }

    pub const fn is_high_resolution(self) -> bool {
        matches!(self, Self::DarkHires | Self::LightHires)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationMode {
    Ip,
    Off,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub backend_key: String,
    pub map_style: MapStyle,
    pub photo_bucket: String,
    pub photo_dir: PathBuf,
    pub log_file: PathBuf,
    pub geolocation: GeolocationMode,
    pub geolocation_url: String,
    pub location_override: Option<Coordinates>,
    pub feed_poll: Duration,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend_url = get("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let backend_key = get("BACKEND_KEY").ok_or(ConfigError::Missing("BACKEND_KEY"))?;
        let map_style_key = get("MAP_STYLE").ok_or(ConfigError::Missing("MAP_STYLE"))?;
        let map_style =
            MapStyle::parse(&map_style_key).ok_or(ConfigError::UnknownMapStyle(map_style_key))?;

        backend_kind(&backend_url)?;

        let geolocation = match get("GEOLOCATION").as_deref() {
            None | Some("ip") => GeolocationMode::Ip,
            Some("off") => GeolocationMode::Off,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "GEOLOCATION",
                    value: other.to_string(),
                })
            }
        };

        let location_override = match get("LOCATION_OVERRIDE") {
            Some(value) => Some(Coordinates::parse(&value).ok_or(ConfigError::Invalid {
                key: "LOCATION_OVERRIDE",
                value,
            })?),
            None => None,
        };

        // A zero period cannot drive the feed ticker
        let feed_poll = match get("FEED_POLL_MS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FEED_POLL_MS",
                        value,
                    })
                }
            },
            None => Duration::from_millis(DEFAULT_FEED_POLL_MS),
        };

        Ok(Self {
            backend_url,
            backend_key,
            map_style,
            photo_bucket: get("PHOTO_BUCKET").unwrap_or_else(|| DEFAULT_PHOTO_BUCKET.to_string()),
            photo_dir: get("PHOTO_DIR").map_or_else(|| PathBuf::from("./photos"), PathBuf::from),
            log_file: get("LOG_FILE").map_or_else(|| PathBuf::from("wastemap.log"), PathBuf::from),
            geolocation,
            geolocation_url: get("GEOLOCATION_URL")
                .unwrap_or_else(|| DEFAULT_GEOLOCATION_URL.to_string()),
            location_override,
            feed_poll,
        })
    }

    pub fn backend_kind(&self) -> BackendKind {
        // Validated in `from_lookup`.
        backend_kind(&self.backend_url).unwrap_or(BackendKind::Rest)
    }
}

fn backend_kind(url: &str) -> Result<BackendKind, ConfigError> {
    if url.starts_with("sqlite:") {
        Ok(BackendKind::Sqlite)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Ok(BackendKind::Rest)
    } else {
        Err(ConfigError::UnsupportedBackend(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("BACKEND_URL", "https://example.supabase.co"),
        ("BACKEND_KEY", "public-anon-key"),
        ("MAP_STYLE", "dark"),
    ];

    #[test]
    fn required_values_produce_defaults_for_the_rest() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.backend_kind(), BackendKind::Rest);
        assert_eq!(config.map_style, MapStyle::Dark);
        assert_eq!(config.photo_bucket, DEFAULT_PHOTO_BUCKET);
        assert_eq!(config.geolocation, GeolocationMode::Ip);
        assert_eq!(config.feed_poll, Duration::from_millis(DEFAULT_FEED_POLL_MS));
        assert!(config.location_override.is_none());
    }

    #[test]
    fn each_required_key_is_fatal_when_missing() {
        for missing in ["BACKEND_URL", "BACKEND_KEY", "MAP_STYLE"] {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .copied()
                .filter(|(key, _)| *key != missing)
                .collect();
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Missing(missing));
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "sqlite://reports.db"),
            ("BACKEND_KEY", "   "),
            ("MAP_STYLE", "light"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing("BACKEND_KEY"));
    }

    #[test]
    fn unknown_map_style_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "sqlite://reports.db"),
            ("BACKEND_KEY", "local"),
            ("MAP_STYLE", "satellite"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::UnknownMapStyle("satellite".to_string()));
    }

    #[test]
    fn backend_scheme_selects_store() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "sqlite://reports.db"),
            ("BACKEND_KEY", "local"),
            ("MAP_STYLE", "Light-Hires"),
        ]))
        .unwrap();
        assert_eq!(config.backend_kind(), BackendKind::Sqlite);
        assert!(config.map_style.is_high_resolution());
        assert!(!config.map_style.is_dark());

        let err = AppConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "ftp://reports"),
            ("BACKEND_KEY", "k"),
            ("MAP_STYLE", "dark"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedBackend(_)));
    }

    #[test]
    fn optional_values_are_validated() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOCATION_OVERRIDE", "16.3,80.47"));
        pairs.push(("GEOLOCATION", "off"));
        pairs.push(("FEED_POLL_MS", "500"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.location_override,
            Some(Coordinates::new(16.3, 80.47))
        );
        assert_eq!(config.geolocation, GeolocationMode::Off);
        assert_eq!(config.feed_poll, Duration::from_millis(500));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOCATION_OVERRIDE", "somewhere"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid {
                key: "LOCATION_OVERRIDE",
                ..
            })
        ));
    }

    #[test]
    fn feed_poll_must_be_a_positive_number_of_millis() {
        for bad in ["0", "-5", "soon"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("FEED_POLL_MS", bad));
            assert_eq!(
                AppConfig::from_lookup(lookup(&pairs)).unwrap_err(),
                ConfigError::Invalid {
                    key: "FEED_POLL_MS",
                    value: bad.to_string(),
                }
            );
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FEED_POLL_MS", "1"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.feed_poll, Duration::from_millis(1));
    }

    #[test]
    fn non_finite_location_override_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOCATION_OVERRIDE", "NaN,0"));
        assert_eq!(
            AppConfig::from_lookup(lookup(&pairs)).unwrap_err(),
            ConfigError::Invalid {
                key: "LOCATION_OVERRIDE",
                value: "NaN,0".to_string(),
            }
        );
    }
}
