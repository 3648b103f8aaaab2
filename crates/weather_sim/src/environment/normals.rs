//! Region-relative climate normals used as hazard baselines.

use crate::calendar::GameDate;
use crate::config::HazardConfig;
use crate::region::Region;
use crate::weather::atmosphere::{diurnal_range, ANOMALY_EFFECTIVE_SD, ANOMALY_SCALE};
use crate::weather::PrecipitationClimatology;

use super::hazards::{drought_baseline_days, rain_scale};

/// z-score of the 90th percentile of a normal distribution.
const Z_90: f32 = 1.2816;
const DAYS: usize = 365;

/// Per-day baselines for one region, indexed by whole `year_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionNormals {
    /// 90th percentile daily high (F).
    heat_threshold: Vec<f32>,
    /// 10th percentile daily low (F).
    cold_threshold: Vec<f32>,
    drought_baseline: Vec<f32>,
    rain_scale: Vec<f32>,
}

impl RegionNormals {
    pub fn for_region(region: &Region, config: &HazardConfig) -> Self {
        let mut normals = Self {
            heat_threshold: Vec::with_capacity(DAYS),
            cold_threshold: Vec::with_capacity(DAYS),
            drought_baseline: Vec::with_capacity(DAYS),
            rain_scale: Vec::with_capacity(DAYS),
        };
        for day in 0..DAYS {
            let pos = day as f32 + 0.5;
            let temperature = region.climate.temperature.at(pos);
            let humidity = region.climate.humidity.at(pos);
            let half_range = 0.5 * diurnal_range(region, humidity.mean);
            let spread = Z_90 * ANOMALY_SCALE * temperature.variance * ANOMALY_EFFECTIVE_SD;
            normals.heat_threshold.push(temperature.mean + half_range + spread);
            normals.cold_threshold.push(temperature.mean - half_range - spread);

            let climatology = PrecipitationClimatology::for_region(region, pos);
            normals
                .drought_baseline
                .push(drought_baseline_days(climatology.wet_day_probability(), config));
            normals
                .rain_scale
                .push(rain_scale(climatology.expected_daily_liquid(), config));
        }
        normals
    }

    fn index(date: GameDate) -> usize {
        (date.year_position() as usize).min(DAYS - 1)
    }

    pub fn heat_threshold(&self, date: GameDate) -> f32 {
        self.heat_threshold[Self::index(date)]
    }

    pub fn cold_threshold(&self, date: GameDate) -> f32 {
        self.cold_threshold[Self::index(date)]
    }

    pub fn drought_baseline(&self, date: GameDate) -> f32 {
        self.drought_baseline[Self::index(date)]
    }

    pub fn rain_scale(&self, date: GameDate) -> f32 {
        self.rain_scale[Self::index(date)]
    }
}
