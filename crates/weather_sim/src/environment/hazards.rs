//! Pure level functions. Each maps its driving statistic to a level that
//! never decreases as the statistic grows.

use crate::config::{HazardConfig, FREEZING_POINT_F};
use crate::snow::HourRecord;
use crate::weather::PrecipitationType;

/// Number of `levels` at or below `value`.
pub fn threshold_level(value: f32, levels: [f32; 4]) -> u8 {
    levels.iter().filter(|&&l| value >= l).count() as u8
}

/// Level for a run of consecutive qualifying days.
pub fn streak_level(days: u32, level_days: [u32; 4]) -> u8 {
    level_days.iter().filter(|&&d| days >= d).count() as u8
}

pub fn drought_level(dry_days: u32, baseline_days: f32, config: &HazardConfig) -> u8 {
    threshold_level(
        dry_days as f32,
        config.drought_level_multipliers.map(|m| m * baseline_days),
    )
}

/// Consecutive dry days that are ordinary where a day is wet with
/// probability `wet_day_probability`.
pub fn drought_baseline_days(wet_day_probability: f32, config: &HazardConfig) -> f32 {
    let p = wet_day_probability.max(1e-3);
    (config.drought_baseline_factor / p).clamp(
        config.drought_baseline_min_days,
        config.drought_baseline_max_days,
    )
}

/// Trailing-window water statistics for flooding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloodInputs {
    pub melt_72h: f32,
    pub rain_24h: f32,
    pub rain_72h: f32,
    pub depth_24h_ago: f32,
    pub temperature: f32,
    pub precipitation_type: Option<PrecipitationType>,
}

impl FloodInputs {
    /// Summarize the records of the 72 hours ending at the query hour
    /// (oldest first).
    pub fn from_records(records: &[HourRecord]) -> Self {
        let Some(last) = records.last() else {
            return Self {
                temperature: FREEZING_POINT_F,
                ..Default::default()
            };
        };
        let recent = &records[records.len().saturating_sub(24)..];
        let depth_24h_ago = records
            .len()
            .checked_sub(25)
            .map_or(0.0, |i| records[i].depth);
        Self {
            melt_72h: records.iter().map(|r| r.snow_melt).sum(),
            rain_24h: recent.iter().map(|r| r.rain).sum(),
            rain_72h: records.iter().map(|r| r.rain).sum(),
            depth_24h_ago,
            temperature: last.temperature,
            precipitation_type: last.precipitation_type,
        }
    }
}

/// Flooding needs released water: melt, rain on snow, or heavy rain.
/// `rain_scale` stretches the heavy-rain thresholds for wet climates.
pub fn flood_level(inputs: &FloodInputs, rain_scale: f32, config: &HazardConfig) -> u8 {
    let raining = inputs.precipitation_type == Some(PrecipitationType::Rain);
    if inputs.temperature <= FREEZING_POINT_F && !raining {
        return 0;
    }

    let mixed = matches!(
        inputs.precipitation_type,
        Some(PrecipitationType::Rain | PrecipitationType::Sleet | PrecipitationType::FreezingRain)
    );
    let mut melt = threshold_level(inputs.melt_72h, config.melt_flood_levels_in);
    if melt > 0 && mixed {
        melt += 1;
    }

    let rain_on_snow = if raining && inputs.depth_24h_ago >= config.rain_on_snow_min_depth_in {
        threshold_level(inputs.rain_24h, config.rain_on_snow_levels_in)
    } else {
        0
    };

    let heavy = threshold_level(
        inputs.rain_24h,
        config.heavy_rain_24h_levels_in.map(|l| l * rain_scale),
    )
    .max(threshold_level(
        inputs.rain_72h,
        config.heavy_rain_72h_levels_in.map(|l| l * rain_scale),
    ));

    melt.max(rain_on_snow).max(heavy).min(4)
}

/// Multiplier on heavy-rain thresholds from a region's expected daily liquid.
pub fn rain_scale(expected_daily_liquid: f32, config: &HazardConfig) -> f32 {
    (expected_daily_liquid / config.reference_daily_rain_in).clamp(0.75, 3.0)
}

/// Fire weather over the last few completed days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireWeather {
    pub dry_days: u32,
    pub baseline_days: f32,
    pub humidity_3d: f32,
    pub high_3d: f32,
    pub heat_threshold: f32,
    pub forest_density: f32,
}

/// Weighted dryness, low humidity and heat, scaled by fuel. Heat counts
/// both absolutely and relative to the region's hot-day threshold.
pub fn wildfire_score(w: &FireWeather, config: &HazardConfig) -> f32 {
    let [dry_w, humidity_w, heat_w] = config.wildfire_weights;
    let dryness = (w.dry_days as f32 / (2.0 * w.baseline_days.max(1.0))).clamp(0.0, 1.0);
    let low_humidity = ((60.0 - w.humidity_3d) / 45.0).clamp(0.0, 1.0);
    let absolute_heat = ((w.high_3d - 60.0) / 40.0).clamp(0.0, 1.0);
    let relative_heat = ((w.high_3d - w.heat_threshold + 20.0) / 25.0).clamp(0.0, 1.0);
    let heat = 0.5 * absolute_heat + 0.5 * relative_heat;
    let fuel = (0.4 + 0.8 * w.forest_density).clamp(0.2, 1.2);
    (dry_w * dryness + humidity_w * low_humidity + heat_w * heat) * fuel
}

pub fn wildfire_level(score: f32, config: &HazardConfig) -> u8 {
    threshold_level(score, config.wildfire_level_scores)
}

pub fn suppresses_wildfire(ground_type: Option<&str>, config: &HazardConfig) -> bool {
    ground_type.is_some_and(|g| {
        config
            .fire_suppressing_ground
            .iter()
            .any(|s| s.eq_ignore_ascii_case(g))
    })
}
