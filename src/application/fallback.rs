//! Deterministic stand-in payloads served when a feed is unavailable.

use crate::application::alert_level::{
    explain_cme, explain_flare, explain_particle_event, explain_storm,
};
use crate::domain::model::{
    AuroraForecast, CoronalMassEjection, GeomagneticStorm, ImageResult, KpForecast,
    MagneticSample, Notification, ParticleEvent, PictureOfTheDay, PlasmaSample, SolarFlare,
    SpaceAlert, XrayFluxPoint,
};
use chrono::{DateTime, NaiveDate, Utc};

fn at(epoch_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch_secs, 0).unwrap_or_default()
}

pub fn solar_flares() -> Vec<SolarFlare> {
    vec![
        SolarFlare {
            id: "fallback-flr-1".to_string(),
            begin_time: at(1_715_276_640), // 2024-05-09T17:44Z
            peak_time: None,
            class_type: "C2.3".to_string(),
            source_location: None,
            explanation: explain_flare("C2.3"),
        },
        SolarFlare {
            id: "fallback-flr-2".to_string(),
            begin_time: at(1_715_322_420), // 2024-05-10T06:27Z
            peak_time: Some(at(1_715_324_040)),
            class_type: "C8.1".to_string(),
            source_location: None,
            explanation: explain_flare("C8.1"),
        },
    ]
}

pub fn cmes() -> Vec<CoronalMassEjection> {
    vec![CoronalMassEjection {
        id: "fallback-cme-1".to_string(),
        start_time: at(1_715_171_040), // 2024-05-08T12:24Z
        speed_km_s: Some(450.0),
        note: None,
        explanation: explain_cme(Some(450.0)),
    }]
}

pub fn storms() -> Vec<GeomagneticStorm> {
    vec![GeomagneticStorm {
        id: "fallback-gst-1".to_string(),
        start_time: at(1_715_353_200), // 2024-05-10T15:00Z
        max_kp: 3.0,
        explanation: explain_storm(3.0),
    }]
}

pub fn particle_events() -> Vec<ParticleEvent> {
    vec![ParticleEvent {
        id: "fallback-sep-1".to_string(),
        event_time: at(1_715_389_800), // 2024-05-11T01:10Z
        instruments: Vec::new(),
        explanation: explain_particle_event(),
    }]
}

pub fn picture_of_the_day() -> PictureOfTheDay {
    PictureOfTheDay {
        date: NaiveDate::from_ymd_opt(2024, 5, 11).unwrap_or_default(),
        title: "Our Star, the Sun".to_string(),
        explanation: "The Sun is a giant ball of hot glowing gas. Today's space picture could not be loaded, so here is our favourite star instead!".to_string(),
        url: "/images/fallback-sun.jpg".to_string(),
        hd_url: None,
        media_type: "image".to_string(),
        copyright: None,
    }
}

pub fn image_results() -> Vec<ImageResult> {
    Vec::new()
}

pub fn alerts() -> Vec<SpaceAlert> {
    Vec::new()
}

pub fn notifications() -> Vec<Notification> {
    Vec::new()
}

pub fn xray_flux() -> Vec<XrayFluxPoint> {
    Vec::new()
}

pub fn magnetic_field() -> Vec<MagneticSample> {
    Vec::new()
}

pub fn plasma() -> Vec<PlasmaSample> {
    Vec::new()
}

pub fn kp_forecast() -> Vec<KpForecast> {
    Vec::new()
}

pub fn aurora_forecast() -> AuroraForecast {
    AuroraForecast {
        observation_time: None,
        forecast_time: None,
        coordinates: Vec::new(),
    }
}
