use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::error::WeatherError;

pub const FREEZING_POINT_F: f32 = 32.0;
pub const MIN_TEMPERATURE_F: f32 = -100.0;
pub const MAX_TEMPERATURE_F: f32 = 150.0;
pub const MIN_PRESSURE_INHG: f32 = 28.0;
pub const MAX_PRESSURE_INHG: f32 = 32.0;
pub const STANDARD_PRESSURE_INHG: f32 = 29.92;

/// Snow depth (inches) at which ground counts as snow covered.
pub const SNOW_COVER_DEPTH_IN: f32 = 0.5;
/// Ice thickness (inches) at which ground counts as icy.
pub const ICY_THRESHOLD_IN: f32 = 0.1;
/// Season starts a snow replay may reach back before the query's season.
pub const MAX_CARRYOVER_SEASONS: u32 = 10;

/// Tunables for every service. Missing JSON keys keep their defaults.
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub generator: GeneratorConfig,
    pub snow: SnowConfig,
    pub hazards: HazardConfig,
    pub batch: BatchConfig,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, WeatherError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| WeatherError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WeatherError> {
        if self.generator.block_hours < 24 {
            return Err(WeatherError::Config(format!(
                "generator.blockHours must be at least 24, got {}",
                self.generator.block_hours
            )));
        }
        if self.generator.cache_capacity_hours < self.generator.block_hours as usize {
            return Err(WeatherError::Config(format!(
                "generator.cacheCapacityHours must hold a whole block of {} hours",
                self.generator.block_hours
            )));
        }
        if self.generator.min_persistence_hours >= self.generator.block_hours as u32 {
            return Err(WeatherError::Config(
                "generator.minPersistenceHours must be shorter than a block".into(),
            ));
        }
        match self.snow.epoch {
            EpochPolicy::SeasonStart {
                month,
                day,
                carryover_seasons,
            } => {
                if carryover_seasons > MAX_CARRYOVER_SEASONS {
                    return Err(WeatherError::Config(format!(
                        "snow.epoch carryoverSeasons must be at most {MAX_CARRYOVER_SEASONS}"
                    )));
                }
                // Day 29 of February would not exist in most years.
                if month == 2 && day > 28 {
                    return Err(WeatherError::Config(
                        "snow.epoch season start cannot fall on Feb 29".into(),
                    ));
                }
                GameDate::new(2001, month, day, 0)?;
            }
            EpochPolicy::Fixed { date } => date.validate()?,
        }
        if self.snow.melt_rate_per_degree < 0.0 || self.snow.snow_ratio <= 0.0 {
            return Err(WeatherError::Config(
                "snow melt rate and snow ratio must be positive".into(),
            ));
        }
        if self.batch.chunk_size == 0 {
            return Err(WeatherError::Config("batch.chunkSize must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Hours per precipitation-phase block. Each block is computed in one
    /// pass after warming the phase machine over the previous block.
    pub block_hours: i64,
    /// Hours a precipitation type is held before it may change while it is
    /// still physically valid.
    pub min_persistence_hours: u32,
    /// Consecutive dry hours after which the phase machine forgets the last
    /// precipitation type.
    pub dry_reset_hours: u32,
    /// Samples kept per region before that region's cache is dropped.
    pub cache_capacity_hours: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            block_hours: 72,
            min_persistence_hours: 3,
            dry_reset_hours: 6,
            cache_capacity_hours: 24 * 400,
        }
    }
}

/// Where snow replay starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EpochPolicy {
    /// This month/day at 00:00, `carryover_seasons` season starts before
    /// the one the query falls in. Carried seasons let a pack that outlasts
    /// summer reach into the next season.
    #[serde(rename_all = "camelCase")]
    SeasonStart {
        month: u32,
        day: u32,
        #[serde(default = "default_carryover_seasons")]
        carryover_seasons: u32,
    },
    /// One fixed date for every query; earlier queries see bare ground.
    Fixed { date: GameDate },
}

impl Default for EpochPolicy {
    fn default() -> Self {
        EpochPolicy::SeasonStart {
            month: 8,
            day: 1,
            carryover_seasons: default_carryover_seasons(),
        }
    }
}

fn default_carryover_seasons() -> u32 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnowConfig {
    pub epoch: EpochPolicy,
    /// Inches of snow per inch of liquid at the freezing point.
    pub snow_ratio: f32,
    /// Extra ratio per degree below 28F (colder snow is fluffier).
    pub snow_ratio_per_degree: f32,
    pub max_snow_ratio: f32,
    /// Inches of snow melted per hour per degree above freezing.
    pub melt_rate_per_degree: f32,
    /// Multiplier added to melt while rain falls on the pack.
    pub rain_melt_boost: f32,
    /// Inches of ice melted per hour per degree above freezing.
    pub ice_melt_rate_per_degree: f32,
    pub max_snow_depth: f32,
    /// Hours during which precipitation still counts as recent.
    pub recent_precipitation_hours: u32,
    pub recent_rain_hours: u32,
    pub recent_melt_hours: u32,
    /// Recent hour records retained per region for window queries.
    pub history_window_hours: usize,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            epoch: EpochPolicy::default(),
            snow_ratio: 10.0,
            snow_ratio_per_degree: 0.25,
            max_snow_ratio: 20.0,
            melt_rate_per_degree: 0.02,
            rain_melt_boost: 0.5,
            ice_melt_rate_per_degree: 0.005,
            max_snow_depth: 240.0,
            recent_precipitation_hours: 48,
            recent_rain_hours: 48,
            recent_melt_hours: 24,
            history_window_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HazardConfig {
    /// Liquid inches below which a day counts as dry.
    pub dry_day_threshold_in: f32,
    /// Drought baseline = clamp(factor / expected wet-day probability).
    pub drought_baseline_factor: f32,
    pub drought_baseline_min_days: f32,
    pub drought_baseline_max_days: f32,
    /// Multiples of the baseline for drought levels 1-4.
    pub drought_level_multipliers: [f32; 4],
    /// Streak lengths (days) for heat wave and cold snap levels 1-4.
    pub streak_level_days: [u32; 4],
    /// 72-hour snowmelt (inches) for flood levels 1-4.
    pub melt_flood_levels_in: [f32; 4],
    /// Snowpack (inches) that makes rain count as rain-on-snow.
    pub rain_on_snow_min_depth_in: f32,
    /// 24-hour rain (inches) for rain-on-snow levels 1-4.
    pub rain_on_snow_levels_in: [f32; 4],
    /// 24-hour rain (inches) for heavy-rain levels 1-4 before regional scaling.
    pub heavy_rain_24h_levels_in: [f32; 4],
    /// 72-hour rain (inches) for heavy-rain levels 1-4 before regional scaling.
    pub heavy_rain_72h_levels_in: [f32; 4],
    /// Expected daily liquid (inches) that leaves the heavy-rain thresholds unscaled.
    pub reference_daily_rain_in: f32,
    /// Weights for dryness, humidity and heat in the wildfire score.
    pub wildfire_weights: [f32; 3],
    pub wildfire_level_scores: [f32; 4],
    /// `groundType` values that never burn.
    pub fire_suppressing_ground: Vec<String>,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            dry_day_threshold_in: 0.02,
            drought_baseline_factor: 3.0,
            drought_baseline_min_days: 4.0,
            drought_baseline_max_days: 60.0,
            drought_level_multipliers: [1.0, 1.5, 2.0, 3.0],
            streak_level_days: [2, 3, 5, 7],
            melt_flood_levels_in: [3.0, 6.0, 10.0, 16.0],
            rain_on_snow_min_depth_in: 2.0,
            rain_on_snow_levels_in: [0.25, 0.5, 1.0, 2.0],
            heavy_rain_24h_levels_in: [1.5, 2.5, 4.0, 6.0],
            heavy_rain_72h_levels_in: [3.0, 5.0, 8.0, 12.0],
            reference_daily_rain_in: 0.1,
            wildfire_weights: [0.4, 0.35, 0.25],
            wildfire_level_scores: [0.2, 0.4, 0.6, 0.8],
            fire_suppressing_ground: [
                "waterlogged",
                "permafrost",
                "marsh",
                "swamp",
                "wetland",
                "glacier",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl HazardConfig {
    /// 72-hour melt that must always raise at least a flood watch.
    pub fn rapid_melt_threshold_in(&self) -> f32 {
        self.melt_flood_levels_in[0]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchConfig {
    /// Jobs processed per cooperative chunk.
    pub chunk_size: usize,
    /// Every Nth hourly job is regenerated without the cache.
    pub determinism_check_interval: usize,
    /// Every Nth hourly job is compared against a full snow replay.
    pub replay_check_interval: usize,
    pub evaluate_hazards: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            determinism_check_interval: 97,
            replay_check_interval: 1009,
            evaluate_hazards: true,
        }
    }
}
