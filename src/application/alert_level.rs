//! Alert-level scoring and kid-friendly explanations.
//!
//! A scoring heuristic, not a physical model. Points per component:
//!
//! | component            | points                              |
//! |----------------------|-------------------------------------|
//! | strongest flare      | X = 4, M = 2, C = 1                 |
//! | fastest CME (km/s)   | >= 1500: 3, >= 1000: 2, >= 500: 1   |
//! | highest Kp           | >= 7: 5, >= 5: 3, >= 4: 1           |
//!
//! The sum maps to `High` at 5 and above, `Moderate` at 2 and above.

use crate::domain::model::{AlertLevel, CoronalMassEjection, GeomagneticStorm, SolarFlare};

pub const HIGH_THRESHOLD: u32 = 5;
pub const MODERATE_THRESHOLD: u32 = 2;

pub fn flare_points(class_type: &str) -> u32 {
    match class_type.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('X') => 4,
        Some('M') => 2,
        Some('C') => 1,
        _ => 0,
    }
}

pub fn cme_points(speed_km_s: f64) -> u32 {
    if speed_km_s >= 1500.0 {
        3
    } else if speed_km_s >= 1000.0 {
        2
    } else if speed_km_s >= 500.0 {
        1
    } else {
        0
    }
}

pub fn storm_points(kp: f64) -> u32 {
    if kp >= 7.0 {
        5
    } else if kp >= 5.0 {
        3
    } else if kp >= 4.0 {
        1
    } else {
        0
    }
}

pub fn score(
    flares: &[SolarFlare],
    cmes: &[CoronalMassEjection],
    storms: &[GeomagneticStorm],
) -> u32 {
    let flare = flares
        .iter()
        .map(|f| flare_points(&f.class_type))
        .max()
        .unwrap_or(0);
    let cme = cmes
        .iter()
        .filter_map(|c| c.speed_km_s)
        .map(cme_points)
        .max()
        .unwrap_or(0);
    let storm = storms
        .iter()
        .map(|s| storm_points(s.max_kp))
        .max()
        .unwrap_or(0);

    flare + cme + storm
}

pub fn level_for_score(score: u32) -> AlertLevel {
    if score >= HIGH_THRESHOLD {
        AlertLevel::High
    } else if score >= MODERATE_THRESHOLD {
        AlertLevel::Moderate
    } else {
        AlertLevel::Low
    }
}

pub fn alert_level(
    flares: &[SolarFlare],
    cmes: &[CoronalMassEjection],
    storms: &[GeomagneticStorm],
) -> AlertLevel {
    level_for_score(score(flares, cmes, storms))
}

pub fn explain_flare(class_type: &str) -> String {
    match flare_points(class_type) {
        4 => "An X-class flare is the biggest kind of solar flare. It can cause radio blackouts on the sunny side of Earth!",
        2 => "An M-class flare is a medium-sized burst of light from the Sun. It can make radio signals fuzzy near the poles.",
        1 => "A C-class flare is a small solar flare. Earth hardly notices it.",
        _ => "A tiny flicker of light on the Sun. Too small to bother Earth.",
    }
    .to_string()
}

pub fn explain_cme(speed_km_s: Option<f64>) -> String {
    match speed_km_s {
        Some(speed) if speed >= 1000.0 => format!(
            "A super fast cloud of solar material zooming at {:.0} km/s. If it hits Earth we might see bright auroras!",
            speed
        ),
        Some(speed) => format!(
            "A cloud of solar material drifting through space at {:.0} km/s.",
            speed
        ),
        None => "The Sun puffed out a cloud of gas. Scientists are still measuring how fast it goes.".to_string(),
    }
}

pub fn explain_storm(kp: f64) -> String {
    if kp >= 7.0 {
        format!("A strong geomagnetic storm (Kp {:.0}). Auroras can be seen far from the poles!", kp)
    } else if kp >= 5.0 {
        format!("A geomagnetic storm (Kp {:.0}). Northern and southern lights get brighter.", kp)
    } else {
        format!("Earth's magnetic field wiggled a little (Kp {:.0}).", kp)
    }
}

pub fn explain_particle_event() -> String {
    "Super speedy particles from the Sun reached space near Earth. Astronauts stay inside their shielded rooms until it passes.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn flare(class_type: &str) -> SolarFlare {
        SolarFlare {
            id: class_type.to_string(),
            begin_time: DateTime::default(),
            peak_time: None,
            class_type: class_type.to_string(),
            source_location: None,
            explanation: String::new(),
        }
    }

    fn cme(speed: f64) -> CoronalMassEjection {
        CoronalMassEjection {
            id: "cme".to_string(),
            start_time: DateTime::default(),
            speed_km_s: Some(speed),
            note: None,
            explanation: String::new(),
        }
    }

    fn storm(kp: f64) -> GeomagneticStorm {
        GeomagneticStorm {
            id: "gst".to_string(),
            start_time: DateTime::default(),
            max_kp: kp,
            explanation: String::new(),
        }
    }

    #[test]
    fn component_points() {
        assert_eq!(flare_points("X1.1"), 4);
        assert_eq!(flare_points("m5.0"), 2);
        assert_eq!(flare_points("C2.3"), 1);
        assert_eq!(flare_points("B9"), 0);
        assert_eq!(flare_points(""), 0);

        assert_eq!(cme_points(1500.0), 3);
        assert_eq!(cme_points(1499.9), 2);
        assert_eq!(cme_points(1000.0), 2);
        assert_eq!(cme_points(500.0), 1);
        assert_eq!(cme_points(499.0), 0);

        assert_eq!(storm_points(7.0), 5);
        assert_eq!(storm_points(5.0), 3);
        assert_eq!(storm_points(4.0), 1);
        assert_eq!(storm_points(3.67), 0);
    }

    #[test]
    fn only_the_worst_event_of_each_kind_counts() {
        let flares = [flare("C1.0"), flare("X2.0"), flare("M1.0")];
        let cmes = [cme(400.0), cme(1100.0)];
        assert_eq!(score(&flares, &cmes, &[]), 4 + 2);
    }

    #[test]
    fn thresholds() {
        assert_eq!(level_for_score(0), AlertLevel::Low);
        assert_eq!(level_for_score(1), AlertLevel::Low);
        assert_eq!(level_for_score(2), AlertLevel::Moderate);
        assert_eq!(level_for_score(4), AlertLevel::Moderate);
        assert_eq!(level_for_score(5), AlertLevel::High);
    }

    #[test]
    fn quiet_sun_is_low() {
        assert_eq!(alert_level(&[], &[], &[]), AlertLevel::Low);
        assert_eq!(alert_level(&[flare("C1.0")], &[], &[storm(2.0)]), AlertLevel::Low);
    }

    #[test]
    fn combined_activity_escalates() {
        assert_eq!(alert_level(&[flare("X1.0")], &[], &[]), AlertLevel::Moderate);
        assert_eq!(
            alert_level(&[flare("X1.0")], &[cme(600.0)], &[]),
            AlertLevel::High
        );
        assert_eq!(alert_level(&[], &[], &[storm(7.0)]), AlertLevel::High);
    }
}
