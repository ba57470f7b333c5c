//! NOAA SWPC feeds: alerts, X-ray flux, solar wind, Kp forecast, aurora.

use crate::application::fallback;
use crate::application::feed::load_feed;
use crate::application::shape::{
    as_f64, expect_record, expect_records, expect_table, field_f64, field_str, field_time,
    parse_instant,
};
use crate::domain::error::ShapeError;
use crate::domain::model::{
    AuroraForecast, AuroraImages, AuroraPoint, Feed, KpForecast, KpKind, MagneticSample,
    Notification, NotificationKind, PlasmaSample, SpaceAlert, XrayFluxPoint,
};
use crate::infrastructure::cache::RequestCache;
use crate::infrastructure::config::SwpcConfig;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwpcEndpoint {
    Alerts,
    XrayOneDay,
    XraySevenDay,
    MagneticOneDay,
    PlasmaOneDay,
    KpForecast,
    AuroraForecast,
}

impl SwpcEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Alerts => "/products/alerts.json",
            Self::XrayOneDay => "/json/goes/primary/xrays-1-day.json",
            Self::XraySevenDay => "/json/goes/primary/xrays-7-day.json",
            Self::MagneticOneDay => "/products/solar-wind/mag-1-day.json",
            Self::PlasmaOneDay => "/products/solar-wind/plasma-1-day.json",
            Self::KpForecast => "/products/noaa-planetary-k-index-forecast.json",
            Self::AuroraForecast => "/json/ovation_aurora_latest.json",
        }
    }

    /// Matched to how often the upstream product updates
    pub fn ttl(self) -> Duration {
        let secs = match self {
            Self::MagneticOneDay | Self::PlasmaOneDay => 60,
            Self::XrayOneDay | Self::XraySevenDay => 2 * 60,
            Self::Alerts => 5 * 60,
            Self::AuroraForecast => 10 * 60,
            Self::KpForecast => 30 * 60,
        };
        Duration::from_secs(secs)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Alerts => "swpc-alerts",
            Self::XrayOneDay => "swpc-xray-1d",
            Self::XraySevenDay => "swpc-xray-7d",
            Self::MagneticOneDay => "swpc-mag-1d",
            Self::PlasmaOneDay => "swpc-plasma-1d",
            Self::KpForecast => "swpc-kp-forecast",
            Self::AuroraForecast => "swpc-aurora",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrayRange {
    OneDay,
    SevenDays,
}

#[derive(Clone)]
pub struct SwpcClient {
    cache: RequestCache,
    base_url: String,
}

impl SwpcClient {
    pub fn new(cache: RequestCache, config: &SwpcConfig) -> Self {
        Self {
            cache,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, endpoint: SwpcEndpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn load<T>(
        &self,
        endpoint: SwpcEndpoint,
        parse: fn(&Value) -> Result<T, ShapeError>,
        fallback: fn() -> T,
    ) -> Feed<T> {
        let url = self.url(endpoint);
        load_feed(&self.cache, endpoint.name(), &url, endpoint.ttl(), parse, fallback).await
    }

    pub async fn alerts(&self) -> Feed<Vec<SpaceAlert>> {
        self.load(SwpcEndpoint::Alerts, parse_alerts, fallback::alerts)
            .await
    }

    /// Alerts classified by headline; shares the alerts cache entry
    pub async fn notifications(&self) -> Feed<Vec<Notification>> {
        self.load(
            SwpcEndpoint::Alerts,
            parse_notifications,
            fallback::notifications,
        )
        .await
    }

    pub async fn xray_flux(&self, range: XrayRange) -> Feed<Vec<XrayFluxPoint>> {
        let endpoint = match range {
            XrayRange::OneDay => SwpcEndpoint::XrayOneDay,
            XrayRange::SevenDays => SwpcEndpoint::XraySevenDay,
        };
        self.load(endpoint, parse_xray_flux, fallback::xray_flux)
            .await
    }

    pub async fn solar_wind_magnetic(&self) -> Feed<Vec<MagneticSample>> {
        self.load(
            SwpcEndpoint::MagneticOneDay,
            parse_magnetic,
            fallback::magnetic_field,
        )
        .await
    }

    pub async fn solar_wind_plasma(&self) -> Feed<Vec<PlasmaSample>> {
        self.load(SwpcEndpoint::PlasmaOneDay, parse_plasma, fallback::plasma)
            .await
    }

    pub async fn kp_forecast(&self) -> Feed<Vec<KpForecast>> {
        self.load(
            SwpcEndpoint::KpForecast,
            parse_kp_forecast,
            fallback::kp_forecast,
        )
        .await
    }

    pub async fn aurora_forecast(&self) -> Feed<AuroraForecast> {
        self.load(
            SwpcEndpoint::AuroraForecast,
            parse_aurora_forecast,
            fallback::aurora_forecast,
        )
        .await
    }

    /// Latest OVATION hemisphere images; static urls, nothing to fetch
    pub fn aurora_images(&self) -> AuroraImages {
        AuroraImages {
            north: format!(
                "{}/images/aurora-forecast-northern-hemisphere.jpg",
                self.base_url
            ),
            south: format!(
                "{}/images/aurora-forecast-southern-hemisphere.jpg",
                self.base_url
            ),
        }
    }
}

const HEADLINE_PREFIXES: &[(&str, NotificationKind)] = &[
    ("EXTENDED WARNING", NotificationKind::Warning),
    ("WARNING", NotificationKind::Warning),
    ("WATCH", NotificationKind::Watch),
    ("ALERT", NotificationKind::Alert),
    ("SUMMARY", NotificationKind::Summary),
];

/// First classified line of an SWPC message, else its first non-empty line
pub fn headline(message: &str) -> &str {
    let mut lines = message.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.clone().next().unwrap_or_default();
    lines
        .find(|line| {
            HEADLINE_PREFIXES
                .iter()
                .any(|(prefix, _)| line.starts_with(prefix))
        })
        .unwrap_or(first)
}

pub fn classify_headline(headline: &str) -> NotificationKind {
    HEADLINE_PREFIXES
        .iter()
        .find(|(prefix, _)| headline.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or(NotificationKind::Other)
}

/// Newest first
pub fn parse_alerts(value: &Value) -> Result<Vec<SpaceAlert>, ShapeError> {
    let mut alerts: Vec<SpaceAlert> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            let product_id = field_str(record, "product_id")?;
            let issued = field_time(record, "issue_datetime")?;
            let message = field_str(record, "message").unwrap_or_default();
            Some(SpaceAlert {
                id: format!("{}-{}", product_id, issued.timestamp()),
                issued,
                headline: headline(message).to_string(),
                message: message.to_string(),
            })
        })
        .collect();
    alerts.sort_by(|a, b| b.issued.cmp(&a.issued));
    Ok(alerts)
}

pub fn parse_notifications(value: &Value) -> Result<Vec<Notification>, ShapeError> {
    Ok(parse_alerts(value)?
        .into_iter()
        .map(|alert| Notification {
            kind: classify_headline(&alert.headline),
            id: alert.id,
            issued: alert.issued,
            headline: alert.headline,
        })
        .collect())
}

pub fn parse_xray_flux(value: &Value) -> Result<Vec<XrayFluxPoint>, ShapeError> {
    let mut points: Vec<XrayFluxPoint> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            Some(XrayFluxPoint {
                time: field_time(record, "time_tag")?,
                flux: field_f64(record, "flux")?,
                energy: field_str(record, "energy").unwrap_or_default().to_string(),
                satellite: field_f64(record, "satellite").map(|s| s as u32),
            })
        })
        .collect();
    points.sort_by_key(|p| p.time);
    Ok(points)
}

pub fn parse_magnetic(value: &Value) -> Result<Vec<MagneticSample>, ShapeError> {
    let mut samples: Vec<MagneticSample> = expect_table(value)?
        .iter()
        .filter_map(|record| {
            Some(MagneticSample {
                time: field_time(record, "time_tag")?,
                bx_gsm: field_f64(record, "bx_gsm"),
                by_gsm: field_f64(record, "by_gsm"),
                bz_gsm: field_f64(record, "bz_gsm"),
                bt: field_f64(record, "bt"),
            })
        })
        .collect();
    samples.sort_by_key(|s| s.time);
    Ok(samples)
}

pub fn parse_plasma(value: &Value) -> Result<Vec<PlasmaSample>, ShapeError> {
    let mut samples: Vec<PlasmaSample> = expect_table(value)?
        .iter()
        .filter_map(|record| {
            Some(PlasmaSample {
                time: field_time(record, "time_tag")?,
                density: field_f64(record, "density"),
                speed: field_f64(record, "speed"),
                temperature: field_f64(record, "temperature"),
            })
        })
        .collect();
    samples.sort_by_key(|s| s.time);
    Ok(samples)
}

fn kp_kind(raw: Option<&str>) -> KpKind {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("observed") => KpKind::Observed,
        Some("estimated") => KpKind::Estimated,
        _ => KpKind::Predicted,
    }
}

pub fn parse_kp_forecast(value: &Value) -> Result<Vec<KpForecast>, ShapeError> {
    let mut forecast: Vec<KpForecast> = expect_table(value)?
        .iter()
        .filter_map(|record| {
            Some(KpForecast {
                time: field_time(record, "time_tag")?,
                kp: field_f64(record, "kp")?,
                kind: kp_kind(field_str(record, "observed")),
                noaa_scale: field_str(record, "noaa_scale").map(str::to_string),
            })
        })
        .collect();
    forecast.sort_by_key(|k| k.time);
    Ok(forecast)
}

pub fn parse_aurora_forecast(value: &Value) -> Result<AuroraForecast, ShapeError> {
    let record = expect_record(value)?;
    let coordinates = record
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or(ShapeError::MissingField("coordinates"))?
        .iter()
        .filter_map(|point| match point.as_array()?.as_slice() {
            [lon, lat, intensity, ..] => Some(AuroraPoint {
                longitude: as_f64(lon)?,
                latitude: as_f64(lat)?,
                intensity: as_f64(intensity)?,
            }),
            _ => None,
        })
        .collect();

    Ok(AuroraForecast {
        observation_time: field_str(&record, "Observation Time").and_then(parse_instant),
        forecast_time: field_str(&record, "Forecast Time").and_then(parse_instant),
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const K_ALERT: &str = "Space Weather Message Code: ALTK05\r\nSerial Number: 1888\r\nIssue Time: 2024 May 10 1750 UTC\r\n\r\nALERT: Geomagnetic K-index of 5\r\nThreshold Reached: 2024 May 10 1749 UTC";
    const WATCH: &str = "Space Weather Message Code: WATA50\r\nSerial Number: 120\r\nIssue Time: 2024 May 09 1230 UTC\r\n\r\nWATCH: Geomagnetic Storm Category G4 Predicted";

    #[test]
    fn headline_skips_message_preamble() {
        assert_eq!(headline(K_ALERT), "ALERT: Geomagnetic K-index of 5");
        assert_eq!(headline("Just text\nmore"), "Just text");
        assert_eq!(headline(""), "");
    }

    #[test]
    fn classifies_headlines() {
        assert_eq!(classify_headline("WATCH: G4"), NotificationKind::Watch);
        assert_eq!(classify_headline("EXTENDED WARNING: K4"), NotificationKind::Warning);
        assert_eq!(classify_headline("ALERT: K5"), NotificationKind::Alert);
        assert_eq!(classify_headline("SUMMARY: 10cm"), NotificationKind::Summary);
        assert_eq!(classify_headline("CANCEL WATCH"), NotificationKind::Other);
    }

    #[test]
    fn alerts_are_newest_first_and_drop_bad_dates() {
        let value = json!([
            {"product_id": "A50F", "issue_datetime": "2024-05-09 12:30:00.000", "message": WATCH},
            {"product_id": "K05A", "issue_datetime": "2024-05-10 17:50:00.000", "message": K_ALERT},
            {"product_id": "K04W", "issue_datetime": "garbage", "message": "WARNING: K4"}
        ]);
        let alerts = parse_alerts(&value).unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].id.starts_with("K05A-"));

        let notifications = parse_notifications(&value).unwrap();
        assert_eq!(notifications[0].kind, NotificationKind::Alert);
        assert_eq!(notifications[1].kind, NotificationKind::Watch);
    }

    #[test]
    fn xray_records() {
        let value = json!([
            {"time_tag": "2024-05-10T00:01:00Z", "satellite": 16, "flux": 2.1e-6, "energy": "0.1-0.8nm"},
            {"time_tag": "2024-05-10T00:00:00Z", "satellite": 16, "flux": 1.9e-6, "energy": "0.1-0.8nm"},
            {"time_tag": "2024-05-10T00:02:00Z", "satellite": 16, "flux": null, "energy": "0.1-0.8nm"}
        ]);
        let points = parse_xray_flux(&value).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0].time < points[1].time);
        assert_eq!(points[0].satellite, Some(16));
    }

    #[test]
    fn magnetic_from_header_rows() {
        let value = json!([
            ["time_tag", "bx_gsm", "by_gsm", "bz_gsm", "lon_gsm", "lat_gsm", "bt"],
            ["2024-05-10 00:00:00.000", "1.2", "-0.4", "-12.8", "340", "-70", "13.9"],
            ["not-a-time", "1", "1", "1", "1", "1", "1"]
        ]);
        let samples = parse_magnetic(&value).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].bz_gsm, Some(-12.8));
        assert_eq!(samples[0].bt, Some(13.9));
    }

    #[test]
    fn plasma_accepts_records_too() {
        let value = json!([
            {"time_tag": "2024-05-10T00:00:00Z", "density": 4.2, "speed": "710.5", "temperature": null}
        ]);
        let samples = parse_plasma(&value).unwrap();
        assert_eq!(samples[0].speed, Some(710.5));
        assert_eq!(samples[0].temperature, None);
    }

    #[test]
    fn kp_forecast_both_layouts_agree() {
        let rows = json!([
            ["time_tag", "kp", "observed", "noaa_scale"],
            ["2024-05-10 00:00:00", "7.67", "observed", "G3"],
            ["2024-05-11 00:00:00", "5.00", "predicted", null]
        ]);
        let records = json!([
            {"time_tag": "2024-05-10T00:00:00", "kp": 7.67, "observed": "observed", "noaa_scale": "G3"},
            {"time_tag": "2024-05-11T00:00:00", "kp": 5.0, "observed": "predicted", "noaa_scale": null}
        ]);

        let from_rows = parse_kp_forecast(&rows).unwrap();
        assert_eq!(from_rows, parse_kp_forecast(&records).unwrap());
        assert_eq!(from_rows[0].kind, KpKind::Observed);
        assert_eq!(from_rows[0].noaa_scale.as_deref(), Some("G3"));
        assert_eq!(from_rows[1].kind, KpKind::Predicted);
    }

    #[test]
    fn aurora_coordinates() {
        let forecast = parse_aurora_forecast(&json!({
            "Observation Time": "2024-05-10T23:40:00Z",
            "Forecast Time": "2024-05-11T00:25:00Z",
            "Data Format": "[Longitude, Latitude, Aurora]",
            "coordinates": [[0, -90, 4], [10, 65, 42], ["bad"]]
        }))
        .unwrap();

        assert_eq!(forecast.coordinates.len(), 2);
        assert_eq!(forecast.coordinates[1].intensity, 42.0);
        assert!(forecast.observation_time.is_some());

        assert_eq!(
            parse_aurora_forecast(&json!({})),
            Err(ShapeError::MissingField("coordinates"))
        );
    }

    #[test]
    fn ttl_tracks_update_cadence() {
        assert!(SwpcEndpoint::MagneticOneDay.ttl() < SwpcEndpoint::Alerts.ttl());
        assert!(SwpcEndpoint::XrayOneDay.ttl() <= Duration::from_secs(120));
        assert_eq!(SwpcEndpoint::Alerts.ttl(), Duration::from_secs(300));
        assert!(SwpcEndpoint::KpForecast.ttl() >= Duration::from_secs(15 * 60));
    }
}
