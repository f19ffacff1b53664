use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque report identifier assigned by the store. Remote backends may hand
/// out numeric keys, so both JSON numbers and strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ReportId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let (lat, lng) = value.split_once(',')?;
        let latitude: f64 = lat.trim().parse().ok()?;
        let longitude: f64 = lng.trim().parse().ok()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self::new(latitude, longitude))
    }
}

/// A geotagged photo observation. Never mutated after the store creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Link used by the detail view's "open in external map" action.
    pub fn external_map_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Insert payload. `id` and `created_at` are filled in by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReport {
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_accepts_numbers_and_strings() {
        let numeric: ReportId = serde_json::from_str("42").unwrap();
        let text: ReportId = serde_json::from_str("\"r1\"").unwrap();

        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "r1");
    }

    #[test]
    fn coordinates_parse_trims_whitespace() {
        let coords = Coordinates::parse(" 16.29 , 80.46 ").unwrap();
        assert_eq!(coords, Coordinates::new(16.29, 80.46));
        assert!(Coordinates::parse("16.29").is_none());
        assert!(Coordinates::parse("north,east").is_none());
    }

    #[test]
    fn coordinates_parse_rejects_non_finite_values() {
        assert!(Coordinates::parse("NaN,0").is_none());
        assert!(Coordinates::parse("16.29,inf").is_none());
        assert!(Coordinates::parse("-infinity,80.46").is_none());
    }

    #[test]
    fn external_map_url_uses_lat_then_lng() {
        let report = Report {
            id: ReportId::new("r1"),
            latitude: 16.3,
            longitude: 80.47,
            photo_url: "file:///tmp/a.jpg".to_string(),
            created_at: Utc::now(),
        };

        assert_eq!(
            report.external_map_url(),
            "https://www.google.com/maps?q=16.3,80.47"
        );
    }
}
