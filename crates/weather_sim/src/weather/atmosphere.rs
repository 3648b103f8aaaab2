//! Pure atmospheric helpers shared by the generator and the hazard layer.

use std::f32::consts::PI;

use crate::region::Region;

use super::types::{WeatherCondition, WeatherSample};

/// Fraction of a profile's `variance` applied to the combined anomaly.
pub(crate) const ANOMALY_SCALE: f32 = 0.5;
/// Knot spacing of the multi-day (synoptic) anomaly.
pub(crate) const SYNOPTIC_SPACING_HOURS: i64 = 60;
pub(crate) const DAILY_SPACING_HOURS: i64 = 24;
/// Weights give the combined anomaly unit variance at knots.
pub(crate) const SYNOPTIC_WEIGHT: f32 = 0.9;
pub(crate) const DAILY_WEIGHT: f32 = 0.435_89;
/// Standard deviation of the combined anomaly averaged over knot intervals.
pub(crate) const ANOMALY_EFFECTIVE_SD: f32 = 0.85;

const BASE_DIURNAL_RANGE_F: f32 = 14.0;
/// Hours per precipitation slot; slots start at 03, 09, 15 and 21.
pub(crate) const SLOT_HOURS: i64 = 6;
pub(crate) const SLOT_OFFSET_HOURS: i64 = 3;

/// Smooth diurnal factor for a given hour (0-23).
///
/// Returns a value in [0, 1] where 0 is the daily minimum (06:00) and 1 is
/// the daily maximum (15:00). Warming over 9 hours, cooling over 15.
pub fn diurnal_factor(hour: u32) -> f32 {
    let h = (hour % 24) as f32;

    if (6.0..=15.0).contains(&h) {
        let t = (h - 6.0) / 9.0;
        0.5 - 0.5 * (t * PI).cos()
    } else {
        let hours_since_peak = if h >= 15.0 { h - 15.0 } else { h + 9.0 };
        let t = hours_since_peak / 15.0;
        0.5 + 0.5 * (t * PI).cos()
    }
}

/// Peak-to-trough daily temperature swing (F). Oceans and humid air damp
/// it; `highDiurnalVariation` widens it.
pub fn diurnal_range(region: &Region, humidity_mean: f32) -> f32 {
    let maritime = region.maritime_influence.clamp(0.0, 1.0);
    let dryness = 1.15 - 0.5 * (humidity_mean / 100.0).clamp(0.0, 1.0);
    let boost = region
        .special_factors
        .number("highDiurnalVariation")
        .map(|v| 1.0 + 0.8 * v.clamp(0.0, 1.5))
        .unwrap_or(1.0);
    BASE_DIURNAL_RANGE_F * (1.0 - 0.5 * maritime) * dryness * boost
}

/// Index of the 6-hour precipitation slot containing `hour`.
pub(crate) fn slot_index(hour: i64) -> i64 {
    (hour - SLOT_OFFSET_HOURS).div_euclid(SLOT_HOURS)
}

/// 0 = 03-09, 1 = 09-15, 2 = 15-21, 3 = 21-03.
pub(crate) fn slot_of_day(slot: i64) -> usize {
    slot.rem_euclid(4) as usize
}

/// Probability that a slot is wet.
pub fn wet_fraction(humidity_mean: f32, temperature_mean: f32, slot_of_day: usize, multiplier: f32) -> f32 {
    let moist = ((humidity_mean - 40.0) / 50.0).clamp(0.0, 1.0);
    let mut f = 0.02 + 0.45 * moist.powf(1.6);
    let afternoon = slot_of_day == 1 || slot_of_day == 2;
    if afternoon && temperature_mean >= 70.0 {
        f += 0.2 * ((humidity_mean - 60.0) / 30.0).clamp(0.0, 1.0);
    }
    (f * multiplier.max(0.0)).clamp(0.0, 0.95)
}

/// Cold, dry air carries less water.
pub fn moisture_factor(dew_point_mean: f32) -> f32 {
    ((dew_point_mean + 10.0) / 70.0).clamp(0.2, 1.2)
}

/// Liquid inches per hour for a slot intensity draw `u` in [0, 1).
pub fn slot_rate(u: f32, moisture: f32) -> f32 {
    (0.004 + 0.08 * u * u) * moisture
}

/// Expected value of `slot_rate` over uniform `u`, per unit moisture.
const MEAN_RATE_PER_MOISTURE: f32 = 0.004 + 0.08 / 3.0;

/// Long-run precipitation statistics implied by a region's profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipitationClimatology {
    pub slot_wet_fraction: [f32; 4],
    /// Mean liquid inches per wet hour.
    pub mean_rate: f32,
}

impl PrecipitationClimatology {
    pub fn for_region(region: &Region, year_position: f32) -> Self {
        let humidity = region.climate.humidity.at(year_position).mean;
        let temperature = region.climate.temperature.at(year_position).mean;
        let dew = region.climate.dew_point.at(year_position).mean;
        let multiplier = region.factor_or("precipitationMultiplier", 1.0);
        let mut slot_wet_fraction = [0.0; 4];
        for (i, f) in slot_wet_fraction.iter_mut().enumerate() {
            *f = wet_fraction(humidity, temperature, i, multiplier);
        }
        Self {
            slot_wet_fraction,
            mean_rate: MEAN_RATE_PER_MOISTURE * moisture_factor(dew),
        }
    }

    /// Probability that at least one slot in a day is wet.
    pub fn wet_day_probability(&self) -> f32 {
        1.0 - self
            .slot_wet_fraction
            .iter()
            .map(|f| 1.0 - f)
            .product::<f32>()
    }

    pub fn expected_daily_liquid(&self) -> f32 {
        self.slot_wet_fraction.iter().sum::<f32>() * SLOT_HOURS as f32 * self.mean_rate
    }
}

/// NWS Rothfusz heat index (F) with the low- and high-humidity adjustments.
pub fn heat_index(temperature: f32, humidity: f32) -> f32 {
    let t = temperature;
    let rh = humidity;
    let mut hi = -42.379 + 2.049_015_2 * t + 10.143_331 * rh
        - 0.224_755_4 * t * rh
        - 0.006_837_83 * t * t
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * t * t * rh
        + 0.000_852_82 * t * rh * rh
        - 0.000_001_99 * t * t * rh * rh;
    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        hi -= ((13.0 - rh) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).max(0.0).sqrt();
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        hi += ((rh - 85.0) / 10.0) * ((87.0 - t) / 5.0);
    }
    hi
}

/// Apparent temperature: the heat index when it is hot, humid and at least
/// a degree above the air temperature, otherwise the air temperature.
pub fn feels_like(temperature: f32, humidity: f32) -> f32 {
    if temperature < 80.0 || humidity < 40.0 {
        return temperature;
    }
    let hi = heat_index(temperature, humidity);
    if hi - temperature >= 1.0 {
        hi
    } else {
        temperature
    }
}

/// Gameplay effect tags for a finished sample.
pub fn effects_for(sample: &WeatherSample) -> Vec<String> {
    let mut effects: Vec<&str> = Vec::new();
    match sample.condition {
        WeatherCondition::Fog => effects.push("reducedVisibility"),
        WeatherCondition::LightRain | WeatherCondition::Rain => effects.push("wetGround"),
        WeatherCondition::HeavyRain => effects.extend(["wetGround", "reducedVisibility"]),
        WeatherCondition::Thunderstorm => {
            effects.extend(["wetGround", "reducedVisibility", "lightning"])
        }
        WeatherCondition::LightSnow | WeatherCondition::Snow => effects.push("slowTravel"),
        WeatherCondition::HeavySnow => effects.extend(["slowTravel", "reducedVisibility"]),
        WeatherCondition::Blizzard => effects.extend(["slowTravel", "whiteout"]),
        WeatherCondition::Sleet | WeatherCondition::FreezingRain => effects.push("icyRoads"),
        _ => {}
    }
    if sample.wind_speed >= 39.0 {
        effects.push("damagingWinds");
    } else if sample.wind_speed >= 25.0 {
        effects.push("strongWinds");
    }
    if sample.feels_like >= 105.0 {
        effects.push("extremeHeat");
    } else if sample.feels_like >= 90.0 {
        effects.push("heatStress");
    }
    if sample.temperature <= 10.0 {
        effects.push("frostbiteRisk");
    }
    effects.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateProfile;
    use crate::region::FactorValue;

    #[test]
    fn test_diurnal_factor_extremes() {
        assert!(diurnal_factor(6).abs() < 1e-6, "minimum at 06:00");
        assert!((diurnal_factor(15) - 1.0).abs() < 1e-6, "maximum at 15:00");
        let mid = diurnal_factor(10);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_diurnal_factor_continuous_at_midnight() {
        let d = (diurnal_factor(23) - diurnal_factor(0)).abs();
        assert!(d < 0.15, "jump {d}");
    }

    #[test]
    fn test_high_diurnal_variation_widens_range() {
        let base = Region::new("d", "arid", ClimateProfile::temperate());
        let wide = base
            .clone()
            .with_factor("highDiurnalVariation", FactorValue::Bool(true));
        let r0 = diurnal_range(&base, 20.0);
        let r1 = diurnal_range(&wide, 20.0);
        assert!((r1 / r0 - 1.8).abs() < 1e-4, "{r0} -> {r1}");
    }

    #[test]
    fn test_maritime_damps_range() {
        let mut inland = Region::new("i", "t", ClimateProfile::temperate());
        inland.maritime_influence = 0.0;
        let mut coast = inland.clone();
        coast.maritime_influence = 1.0;
        assert!(diurnal_range(&coast, 70.0) < diurnal_range(&inland, 70.0));
    }

    #[test]
    fn test_slot_indexing() {
        assert_eq!(slot_of_day(slot_index(3)), 0);
        assert_eq!(slot_of_day(slot_index(8)), 0);
        assert_eq!(slot_of_day(slot_index(9)), 1);
        assert_eq!(slot_of_day(slot_index(15)), 2);
        assert_eq!(slot_of_day(slot_index(21)), 3);
        assert_eq!(slot_of_day(slot_index(26)), 3);
        assert_eq!(slot_index(2), slot_index(-3));
    }

    #[test]
    fn test_wet_fraction_monotonic_in_humidity() {
        let mut prev = 0.0;
        for h in (0..=100).step_by(5) {
            let f = wet_fraction(h as f32, 50.0, 0, 1.0);
            assert!(f >= prev);
            prev = f;
        }
        assert!(wet_fraction(20.0, 90.0, 1, 1.0) < 0.05);
    }

    #[test]
    fn test_convective_boost_only_warm_afternoons() {
        let morning = wet_fraction(85.0, 80.0, 0, 1.0);
        let afternoon = wet_fraction(85.0, 80.0, 1, 1.0);
        let cold_afternoon = wet_fraction(85.0, 40.0, 1, 1.0);
        assert!(afternoon > morning);
        assert!((cold_afternoon - morning).abs() < 1e-6);
    }

    #[test]
    fn test_climatology_wet_day_probability() {
        let c = PrecipitationClimatology {
            slot_wet_fraction: [0.5; 4],
            mean_rate: 0.03,
        };
        assert!((c.wet_day_probability() - 0.9375).abs() < 1e-5);
        assert!((c.expected_daily_liquid() - 0.36).abs() < 1e-5);
    }

    #[test]
    fn test_feels_like_only_when_hot_and_humid() {
        assert_eq!(feels_like(70.0, 90.0), 70.0);
        assert_eq!(feels_like(95.0, 20.0), 95.0);
        let hi = feels_like(95.0, 70.0);
        assert!(hi > 110.0 && hi < 130.0, "got {hi}");
    }

    #[test]
    fn test_feels_like_never_below_temperature() {
        for t in (60..130).step_by(3) {
            for rh in (0..=100).step_by(5) {
                let t = t as f32;
                assert!(feels_like(t, rh as f32) >= t);
            }
        }
    }
}
