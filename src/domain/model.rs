use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// 数据来源标记
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Live,
    Fallback,
}

/// Normalized payload plus a marker telling whether it is real data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feed<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Feed<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            origin: Origin::Live,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            origin: Origin::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolarFlare {
    pub id: String,
    pub begin_time: DateTime<Utc>,
    pub peak_time: Option<DateTime<Utc>>,
    pub class_type: String, // e.g. "X1.1"
    pub source_location: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoronalMassEjection {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub speed_km_s: Option<f64>,
    pub note: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeomagneticStorm {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub max_kp: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticleEvent {
    pub id: String,
    pub event_time: DateTime<Utc>,
    pub instruments: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceWeatherSummary {
    pub flares: Vec<SolarFlare>,
    pub cmes: Vec<CoronalMassEjection>,
    pub storms: Vec<GeomagneticStorm>,
    pub alert_level: AlertLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PictureOfTheDay {
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub url: String,
    pub hd_url: Option<String>,
    pub media_type: String,
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResult {
    pub nasa_id: String,
    pub title: String,
    pub description: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceAlert {
    pub id: String,
    pub issued: DateTime<Utc>,
    pub headline: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Watch,
    Warning,
    Alert,
    Summary,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub issued: DateTime<Utc>,
    pub headline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XrayFluxPoint {
    pub time: DateTime<Utc>,
    pub flux: f64,
    pub energy: String,
    pub satellite: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MagneticSample {
    pub time: DateTime<Utc>,
    pub bx_gsm: Option<f64>,
    pub by_gsm: Option<f64>,
    pub bz_gsm: Option<f64>,
    pub bt: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlasmaSample {
    pub time: DateTime<Utc>,
    pub density: Option<f64>,
    pub speed: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KpKind {
    Observed,
    Estimated,
    Predicted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpForecast {
    pub time: DateTime<Utc>,
    pub kp: f64,
    pub kind: KpKind,
    pub noaa_scale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuroraImages {
    pub north: String,
    pub south: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AuroraPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuroraForecast {
    pub observation_time: Option<DateTime<Utc>>,
    pub forecast_time: Option<DateTime<Utc>>,
    pub coordinates: Vec<AuroraPoint>,
}
