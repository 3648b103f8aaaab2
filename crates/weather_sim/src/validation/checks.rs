//! Contract predicates. Each takes plain values and returns a message when
//! the contract is broken, so the batch runner, the suite and unit tests
//! can share them.

use serde::{Deserialize, Serialize};

use crate::config::{
    MAX_PRESSURE_INHG, MAX_TEMPERATURE_F, MIN_PRESSURE_INHG, MIN_TEMPERATURE_F,
};
use crate::weather::phase::{transition_allowed, valid_at};
use crate::weather::{PrecipitationType, WeatherSample};

/// Largest allowed gap (F) between the weekly means either side of a
/// season boundary.
pub const MAX_SEASONAL_CHANGE_F: f32 = 12.0;
/// Temperature change (F) always tolerated between two samples.
pub const MIN_CHANGE_ALLOWANCE_F: f32 = 10.0;
/// Additional change (F) tolerated per elapsed hour.
pub const CHANGE_PER_HOUR_F: f32 = 5.0;
/// Spacing beyond which two samples are not compared at all.
pub const MAX_COMPARED_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKind {
    Range,
    PrecipitationBand,
    Transition,
    HourlyChange,
    SeasonalChange,
    FloodFalsePositive,
    FloodMissedAlert,
    Determinism,
    ReplayEquivalence,
    SnowDepth,
    ProfileFallback,
}

impl CheckKind {
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Range => "range",
            CheckKind::PrecipitationBand => "precipitationBand",
            CheckKind::Transition => "transition",
            CheckKind::HourlyChange => "hourlyChange",
            CheckKind::SeasonalChange => "seasonalChange",
            CheckKind::FloodFalsePositive => "floodFalsePositive",
            CheckKind::FloodMissedAlert => "floodMissedAlert",
            CheckKind::Determinism => "determinism",
            CheckKind::ReplayEquivalence => "replayEquivalence",
            CheckKind::SnowDepth => "snowDepth",
            CheckKind::ProfileFallback => "profileFallback",
        }
    }
}

// =============================================================================
// Single-sample checks
// =============================================================================

/// Every out-of-range field of `sample`.
pub fn range_violations(sample: &WeatherSample) -> Vec<String> {
    let mut out = Vec::new();
    let mut check = |name: &str, value: f32, min: f32, max: f32| {
        if !(min..=max).contains(&value) {
            out.push(format!("{name} {value} outside [{min}, {max}]"));
        }
    };
    check("temperature", sample.temperature, MIN_TEMPERATURE_F, MAX_TEMPERATURE_F);
    check("humidity", sample.humidity, 0.0, 100.0);
    check("pressure", sample.pressure, MIN_PRESSURE_INHG, MAX_PRESSURE_INHG);
    check("cloudCover", sample.cloud_cover, 0.0, 100.0);
    check("windSpeed", sample.wind_speed, 0.0, f32::MAX);
    if sample.dew_point > sample.temperature {
        out.push(format!(
            "dew point {} above temperature {}",
            sample.dew_point, sample.temperature
        ));
    }
    out
}

/// Precipitation type outside its temperature band, or precipitation
/// fields that disagree with each other.
pub fn precipitation_band_violation(sample: &WeatherSample) -> Option<String> {
    match (sample.precipitation, sample.precipitation_type) {
        (false, None) => (sample.precipitation_rate != 0.0)
            .then(|| format!("dry hour with rate {}", sample.precipitation_rate)),
        (true, None) => Some("precipitation without a type".into()),
        (false, Some(kind)) => Some(format!("type {} on a dry hour", kind.name())),
        (true, Some(kind)) => (!valid_at(kind, sample.temperature)).then(|| {
            format!("{} at {:.1}F", kind.name(), sample.temperature)
        }),
    }
}

/// Largest temperature change tolerated across `hours` elapsed hours.
pub fn change_allowance(hours: i64) -> f32 {
    MIN_CHANGE_ALLOWANCE_F.max(CHANGE_PER_HOUR_F * hours as f32)
}

pub fn hourly_change_violation(previous: f32, current: f32, hours: i64) -> Option<String> {
    if hours <= 0 || hours > MAX_COMPARED_HOURS {
        return None;
    }
    let delta = (current - previous).abs();
    let allowed = change_allowance(hours);
    (delta > allowed).then(|| format!("{delta:.1}F change over {hours}h (allowed {allowed:.1}F)"))
}

pub fn seasonal_change_violation(before_mean: f32, after_mean: f32) -> Option<String> {
    let delta = (after_mean - before_mean).abs();
    (delta > MAX_SEASONAL_CHANGE_F).then(|| {
        format!("weekly means {before_mean:.1}F -> {after_mean:.1}F differ by {delta:.1}F")
    })
}

pub fn snow_depth_violation(depth: f32, max_depth: f32) -> Option<String> {
    (!(0.0..=max_depth).contains(&depth)).then(|| format!("snow depth {depth} outside [0, {max_depth}]"))
}

// =============================================================================
// Flood alert correctness
// =============================================================================

/// A flood alert while snow is only piling up in freezing weather.
pub fn flood_false_positive(
    flooding_level: u8,
    depth_change_1h: f32,
    temperature: f32,
    precipitation_type: Option<PrecipitationType>,
) -> Option<String> {
    let accumulating = depth_change_1h > 0.0
        && temperature <= crate::config::FREEZING_POINT_F
        && precipitation_type != Some(PrecipitationType::Rain);
    (accumulating && flooding_level > 0).then(|| {
        format!(
            "flooding level {flooding_level} while snow accumulates at {temperature:.1}F"
        )
    })
}

/// No flood alert after a rapid three-day snowpack loss above freezing.
pub fn flood_missed_alert(
    flooding_level: u8,
    depth_drop_72h: f32,
    temperature: f32,
    rapid_melt_threshold: f32,
) -> Option<String> {
    let rapid = depth_drop_72h >= rapid_melt_threshold
        && temperature > crate::config::FREEZING_POINT_F;
    (rapid && flooding_level == 0).then(|| {
        format!("no flood alert after {depth_drop_72h:.1} in of snowpack loss in 72h")
    })
}

// =============================================================================
// Sequence checks
// =============================================================================

/// Watches an hourly sequence for snow and rain following each other
/// without sleet or freezing rain between them. Dry spells shorter than
/// `reset_hours` do not break adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTracker {
    last: Option<PrecipitationType>,
    dry_hours: u32,
    reset_hours: u32,
}

impl TransitionTracker {
    pub fn new(reset_hours: u32) -> Self {
        Self {
            last: None,
            dry_hours: 0,
            reset_hours,
        }
    }

    /// Forget everything, e.g. when the sequence skips hours.
    pub fn reset(&mut self) {
        self.last = None;
        self.dry_hours = 0;
    }

    pub fn observe(&mut self, kind: Option<PrecipitationType>) -> Option<String> {
        let Some(now) = kind else {
            if self.last.is_some() {
                self.dry_hours += 1;
                if self.dry_hours >= self.reset_hours {
                    self.reset();
                }
            }
            return None;
        };
        let violation = self.last.and_then(|prev| {
            (!transition_allowed(prev, now)).then(|| {
                format!(
                    "{} followed by {} after {} dry hours",
                    prev.name(),
                    now.name(),
                    self.dry_hours
                )
            })
        });
        self.last = Some(now);
        self.dry_hours = 0;
        violation
    }
}
