//! NASA feeds: DONKI space-weather events, APOD and the image library.

use crate::application::alert_level::{
    alert_level, explain_cme, explain_flare, explain_particle_event, explain_storm,
};
use crate::application::fallback;
use crate::application::feed::load_feed;
use crate::application::shape::{
    as_f64, expect_record, expect_records, field_f64, field_str, field_time, Record,
};
use crate::domain::error::ShapeError;
use crate::domain::model::{
    CoronalMassEjection, Feed, GeomagneticStorm, ImageResult, Origin, ParticleEvent,
    PictureOfTheDay, SolarFlare, SpaceWeatherSummary,
};
use crate::infrastructure::cache::RequestCache;
use crate::infrastructure::config::NasaConfig;
use chrono::{Days, NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration;

pub const IMAGES_API_BASE: &str = "https://images-api.nasa.gov";
pub const MAX_IMAGE_RESULTS: usize = 20;

const EVENT_TTL: Duration = Duration::from_secs(10 * 60);
const APOD_TTL: Duration = Duration::from_secs(60 * 60);
const IMAGE_SEARCH_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonkiEndpoint {
    Flares,
    Cmes,
    Storms,
    ParticleEvents,
}

impl DonkiEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Flares => "FLR",
            Self::Cmes => "CME",
            Self::Storms => "GST",
            Self::ParticleEvents => "SEP",
        }
    }

    pub fn ttl(self) -> Duration {
        EVENT_TTL
    }

    fn name(self) -> &'static str {
        match self {
            Self::Flares => "donki-flares",
            Self::Cmes => "donki-cmes",
            Self::Storms => "donki-storms",
            Self::ParticleEvents => "donki-sep",
        }
    }
}

#[derive(Clone)]
pub struct DonkiClient {
    cache: RequestCache,
    api_base: String,
    api_key: String,
    lookback_days: u32,
}

impl DonkiClient {
    pub fn new(cache: RequestCache, config: &NasaConfig) -> Self {
        Self {
            cache,
            api_base: config.api_base(),
            api_key: config.resolved_api_key(),
            lookback_days: config.lookback_days,
        }
    }

    pub fn event_url(&self, endpoint: DonkiEndpoint, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/DONKI/{}?startDate={}&endDate={}&api_key={}",
            self.api_base,
            endpoint.path(),
            start,
            end,
            self.api_key
        )
    }

    pub fn apod_url(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!(
                "{}/planetary/apod?api_key={}&date={}",
                self.api_base, self.api_key, date
            ),
            None => format!("{}/planetary/apod?api_key={}", self.api_base, self.api_key),
        }
    }

    pub fn image_search_url(&self, query: &str) -> String {
        url::Url::parse_with_params(
            &format!("{}/search", IMAGES_API_BASE),
            &[("q", query), ("media_type", "image")],
        )
        .map(String::from)
        .unwrap_or_else(|_| format!("{}/search?media_type=image", IMAGES_API_BASE))
    }

    fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = Utc::now().date_naive();
        let start = end
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(end);
        (start, end)
    }

    async fn events<T>(
        &self,
        endpoint: DonkiEndpoint,
        parse: fn(&Value) -> Result<Vec<T>, ShapeError>,
        fallback: fn() -> Vec<T>,
    ) -> Feed<Vec<T>> {
        let (start, end) = self.window();
        let url = self.event_url(endpoint, start, end);
        load_feed(&self.cache, endpoint.name(), &url, endpoint.ttl(), parse, fallback).await
    }

    pub async fn solar_flares(&self) -> Feed<Vec<SolarFlare>> {
        self.events(DonkiEndpoint::Flares, parse_flares, fallback::solar_flares)
            .await
    }

    pub async fn cmes(&self) -> Feed<Vec<CoronalMassEjection>> {
        self.events(DonkiEndpoint::Cmes, parse_cmes, fallback::cmes)
            .await
    }

    pub async fn geomagnetic_storms(&self) -> Feed<Vec<GeomagneticStorm>> {
        self.events(DonkiEndpoint::Storms, parse_storms, fallback::storms)
            .await
    }

    pub async fn particle_events(&self) -> Feed<Vec<ParticleEvent>> {
        self.events(
            DonkiEndpoint::ParticleEvents,
            parse_particle_events,
            fallback::particle_events,
        )
        .await
    }

    /// Flares, CMEs and storms with the derived alert level.
    ///
    /// Labeled fallback as soon as any part is.
    pub async fn summary(&self) -> Feed<SpaceWeatherSummary> {
        let (flares, cmes, storms) =
            tokio::join!(self.solar_flares(), self.cmes(), self.geomagnetic_storms());
        Feed {
            origin: combine_origins(&[flares.origin, cmes.origin, storms.origin]),
            data: summarize(flares.data, cmes.data, storms.data),
        }
    }

    pub async fn picture_of_the_day(&self, date: Option<NaiveDate>) -> Feed<PictureOfTheDay> {
        let url = self.apod_url(date);
        load_feed(
            &self.cache,
            "apod",
            &url,
            APOD_TTL,
            parse_apod,
            fallback::picture_of_the_day,
        )
        .await
    }

    pub async fn search_images(&self, query: &str) -> Feed<Vec<ImageResult>> {
        let url = self.image_search_url(query);
        load_feed(
            &self.cache,
            "image-search",
            &url,
            IMAGE_SEARCH_TTL,
            parse_image_results,
            fallback::image_results,
        )
        .await
    }
}

fn combine_origins(origins: &[Origin]) -> Origin {
    if origins.iter().any(|o| *o == Origin::Fallback) {
        Origin::Fallback
    } else {
        Origin::Live
    }
}

pub fn summarize(
    flares: Vec<SolarFlare>,
    cmes: Vec<CoronalMassEjection>,
    storms: Vec<GeomagneticStorm>,
) -> SpaceWeatherSummary {
    let alert_level = alert_level(&flares, &cmes, &storms);
    SpaceWeatherSummary {
        flares,
        cmes,
        storms,
        alert_level,
    }
}

pub fn parse_flares(value: &Value) -> Result<Vec<SolarFlare>, ShapeError> {
    let mut flares: Vec<SolarFlare> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            let class_type = field_str(record, "classType").unwrap_or("unknown");
            Some(SolarFlare {
                id: field_str(record, "flrID")?.to_string(),
                begin_time: field_time(record, "beginTime")?,
                peak_time: field_time(record, "peakTime"),
                class_type: class_type.to_string(),
                source_location: field_str(record, "sourceLocation").map(str::to_string),
                explanation: explain_flare(class_type),
            })
        })
        .collect();
    flares.sort_by_key(|f| f.begin_time);
    Ok(flares)
}

/// Most accurate analysis speed, else the fastest one reported
fn cme_speed(record: &Record) -> Option<f64> {
    let analyses = record.get("cmeAnalyses").and_then(Value::as_array)?;
    let speed_of = |a: &Value| a.get("speed").and_then(as_f64);

    analyses
        .iter()
        .filter(|a| a.get("isMostAccurate").and_then(Value::as_bool) == Some(true))
        .find_map(speed_of)
        .or_else(|| analyses.iter().filter_map(speed_of).reduce(f64::max))
}

pub fn parse_cmes(value: &Value) -> Result<Vec<CoronalMassEjection>, ShapeError> {
    let mut cmes: Vec<CoronalMassEjection> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            let speed = cme_speed(record);
            Some(CoronalMassEjection {
                id: field_str(record, "activityID")?.to_string(),
                start_time: field_time(record, "startTime")?,
                speed_km_s: speed,
                note: field_str(record, "note").map(str::to_string),
                explanation: explain_cme(speed),
            })
        })
        .collect();
    cmes.sort_by_key(|c| c.start_time);
    Ok(cmes)
}

pub fn parse_storms(value: &Value) -> Result<Vec<GeomagneticStorm>, ShapeError> {
    let mut storms: Vec<GeomagneticStorm> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            let max_kp = record
                .get("allKpIndex")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|k| k.as_object().and_then(|k| field_f64(k, "kpIndex")))
                .reduce(f64::max)
                .unwrap_or(0.0);
            Some(GeomagneticStorm {
                id: field_str(record, "gstID")?.to_string(),
                start_time: field_time(record, "startTime")?,
                max_kp,
                explanation: explain_storm(max_kp),
            })
        })
        .collect();
    storms.sort_by_key(|s| s.start_time);
    Ok(storms)
}

pub fn parse_particle_events(value: &Value) -> Result<Vec<ParticleEvent>, ShapeError> {
    let mut events: Vec<ParticleEvent> = expect_records(value)?
        .iter()
        .filter_map(|record| {
            let instruments = record
                .get("instruments")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|i| i.get("displayName").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            Some(ParticleEvent {
                id: field_str(record, "sepID")?.to_string(),
                event_time: field_time(record, "eventTime")?,
                instruments,
                explanation: explain_particle_event(),
            })
        })
        .collect();
    events.sort_by_key(|e| e.event_time);
    Ok(events)
}

pub fn parse_apod(value: &Value) -> Result<PictureOfTheDay, ShapeError> {
    let record = expect_record(value)?;
    let date = field_str(&record, "date")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or(ShapeError::MissingField("date"))?;

    Ok(PictureOfTheDay {
        date,
        title: field_str(&record, "title")
            .ok_or(ShapeError::MissingField("title"))?
            .to_string(),
        explanation: field_str(&record, "explanation")
            .unwrap_or_default()
            .to_string(),
        url: field_str(&record, "url")
            .ok_or(ShapeError::MissingField("url"))?
            .to_string(),
        hd_url: field_str(&record, "hdurl").map(str::to_string),
        media_type: field_str(&record, "media_type")
            .unwrap_or("image")
            .to_string(),
        copyright: field_str(&record, "copyright").map(|c| c.replace('\n', " ")),
    })
}

pub fn parse_image_results(value: &Value) -> Result<Vec<ImageResult>, ShapeError> {
    let record = expect_record(value)?;
    let items = record
        .get("collection")
        .and_then(|c| c.get("items"))
        .and_then(Value::as_array)
        .ok_or(ShapeError::MissingField("collection.items"))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let data = item
                .get("data")
                .and_then(Value::as_array)
                .and_then(|d| d.first())
                .and_then(Value::as_object)?;
            let thumbnail_url = item
                .get("links")
                .and_then(Value::as_array)
                .and_then(|l| l.first())
                .and_then(|l| l.get("href"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(ImageResult {
                nasa_id: field_str(data, "nasa_id")?.to_string(),
                title: field_str(data, "title").unwrap_or("Untitled").to_string(),
                description: field_str(data, "description").map(str::to_string),
                date_created: field_time(data, "date_created"),
                thumbnail_url,
            })
        })
        .take(MAX_IMAGE_RESULTS)
        .collect())
}
