//! Hazard queries over rolling weather and snow history.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bevy::prelude::*;

use crate::calendar::{GameDate, HOURS_PER_DAY};
use crate::config::{HazardConfig, SNOW_COVER_DEPTH_IN};
use crate::error::WeatherError;
use crate::region::Region;
use crate::snow::SnowAccumulationService;
use crate::weather::{guarded_generate, WeatherSource};

use super::hazards::{
    drought_level, flood_level, streak_level, suppresses_wildfire, wildfire_level, wildfire_score,
    FireWeather, FloodInputs,
};
use super::normals::RegionNormals;
use super::types::{
    DaySummary, EnvironmentalDrivers, EnvironmentalState, HazardKind, HazardLevel,
};

/// Completed days kept per region before its summary cache is dropped.
const DAY_CACHE_CAPACITY: usize = 800;
/// Days averaged for fire weather.
const FIRE_WEATHER_DAYS: i64 = 3;
const FLOOD_WINDOW_HOURS: i64 = 72;

/// Derives hazard levels from the generator and the snow service.
///
/// Day-based hazards (drought, heat, cold, wildfire) only look at days that
/// ended before the query date, so they hold steady through a day.
/// Flooding looks at the 72 hours ending at the query hour.
pub struct EnvironmentalConditionsService {
    source: Arc<dyn WeatherSource>,
    snow: Arc<SnowAccumulationService>,
    config: HazardConfig,
    normals: RwLock<HashMap<String, Arc<RegionNormals>>>,
    days: RwLock<HashMap<String, HashMap<i64, Option<DaySummary>>>>,
}

impl EnvironmentalConditionsService {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        snow: Arc<SnowAccumulationService>,
        config: HazardConfig,
    ) -> Self {
        Self {
            source,
            snow,
            config,
            normals: RwLock::new(HashMap::new()),
            days: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HazardConfig {
        &self.config
    }

    pub fn get_environmental_conditions(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<EnvironmentalState, WeatherError> {
        date.validate()?;
        let normals = self.normals(region);
        let today = date.day_number();
        let mut missing_hours = 0usize;

        // Drought: consecutive dry days before today.
        let baseline = normals.drought_baseline(date);
        let max_dry_walk = (baseline * self.config.drought_level_multipliers[3]).ceil() as i64;
        let mut dry_days = 0u32;
        for back in 1..=max_dry_walk {
            match self.day_summary(region, today - back) {
                Some(day) => {
                    missing_hours += day.missing_hours as usize;
                    if day.liquid >= self.config.dry_day_threshold_in {
                        break;
                    }
                    dry_days += 1;
                }
                None => {
                    missing_hours += HOURS_PER_DAY as usize;
                    break;
                }
            }
        }

        // Heat wave and cold snap: streaks of days past the region's percentiles.
        let max_streak = i64::from(self.config.streak_level_days[3]);
        let mut hot_days = 0u32;
        let mut cold_days = 0u32;
        let (mut hot_open, mut cold_open) = (true, true);
        for back in 1..=max_streak {
            if !hot_open && !cold_open {
                break;
            }
            let Some(day) = self.day_summary(region, today - back) else {
                break;
            };
            let day_date = date.add_hours(-back * HOURS_PER_DAY);
            hot_open &= day.high >= normals.heat_threshold(day_date);
            cold_open &= day.low <= normals.cold_threshold(day_date);
            hot_days += u32::from(hot_open);
            cold_days += u32::from(cold_open);
        }

        // Fire weather over the last three days.
        let recent: Vec<DaySummary> = (1..=FIRE_WEATHER_DAYS)
            .filter_map(|back| self.day_summary(region, today - back))
            .collect();
        let (humidity_3d, high_3d) = if recent.is_empty() {
            (100.0, 0.0)
        } else {
            let n = recent.len() as f32;
            (
                recent.iter().map(|d| d.mean_humidity).sum::<f32>() / n,
                recent.iter().map(|d| d.high).sum::<f32>() / n,
            )
        };

        // Flooding and snow cover.
        let records = self.snow.history(
            region,
            date.add_hours(-(FLOOD_WINDOW_HOURS - 1)),
            date,
        )?;
        let flood = FloodInputs::from_records(&records);
        let snow = self.snow.get_accumulation(region, date)?;
        let flooding = flood_level(&flood, normals.rain_scale(date), &self.config);

        let heat_threshold = normals.heat_threshold(date);
        let fire = FireWeather {
            dry_days,
            baseline_days: baseline,
            humidity_3d,
            high_3d,
            heat_threshold,
            forest_density: region.factor_or("forestDensity", 0.5),
        };
        let score = wildfire_score(&fire, &self.config);
        let ground = region.special_factors.ground_type();
        let wildfire = if suppresses_wildfire(ground.as_deref(), &self.config)
            || snow.snow_depth >= SNOW_COVER_DEPTH_IN
        {
            0
        } else {
            wildfire_level(score, &self.config)
        };

        Ok(EnvironmentalState {
            drought: HazardLevel::new(
                HazardKind::Drought,
                drought_level(dry_days, baseline, &self.config),
            ),
            flooding: HazardLevel::new(HazardKind::Flooding, flooding),
            heat_wave: HazardLevel::new(
                HazardKind::HeatWave,
                streak_level(hot_days, self.config.streak_level_days),
            ),
            cold_snap: HazardLevel::new(
                HazardKind::ColdSnap,
                streak_level(cold_days, self.config.streak_level_days),
            ),
            wildfire_risk: HazardLevel::new(HazardKind::WildfireRisk, wildfire),
            drivers: EnvironmentalDrivers {
                dry_days,
                drought_baseline_days: baseline,
                hot_days,
                cold_days,
                heat_threshold,
                cold_threshold: normals.cold_threshold(date),
                melt_72h: flood.melt_72h,
                rain_24h: flood.rain_24h,
                rain_72h: flood.rain_72h,
                snow_depth: snow.snow_depth,
                snow_depth_24h_ago: flood.depth_24h_ago,
                humidity_3d,
                high_3d,
                wildfire_score: score,
            },
            replay_gaps: snow.replay_gaps + missing_hours,
        })
    }

    /// Drop normals and day summaries for one region, or for every region.
    pub fn clear_cache(&self, region_id: Option<&str>) {
        let mut normals = self.normals.write().unwrap_or_else(PoisonError::into_inner);
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        match region_id {
            Some(id) => {
                normals.remove(id);
                days.remove(id);
            }
            None => {
                normals.clear();
                days.clear();
            }
        }
    }

    fn normals(&self, region: &Region) -> Arc<RegionNormals> {
        if let Some(n) = self
            .normals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&region.id)
        {
            return Arc::clone(n);
        }
        let computed = Arc::new(RegionNormals::for_region(region, &self.config));
        let mut normals = self.normals.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(normals.entry(region.id.clone()).or_insert(computed))
    }

    /// Summary of the day with index `day` (days since 1970-01-01), or
    /// `None` when none of its hours could be generated.
    fn day_summary(&self, region: &Region, day: i64) -> Option<DaySummary> {
        if let Some(cached) = self
            .days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&region.id)
            .and_then(|m| m.get(&day))
        {
            return *cached;
        }

        let summary = self.summarize_day(region, day);
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        let entries = days.entry(region.id.clone()).or_default();
        if entries.len() >= DAY_CACHE_CAPACITY {
            debug!(
                "day summary cache for region '{}' reached {} days, clearing",
                region.id,
                entries.len()
            );
            entries.clear();
        }
        entries.insert(day, summary);
        summary
    }

    fn summarize_day(&self, region: &Region, day: i64) -> Option<DaySummary> {
        let start = GameDate::from_linear_hour(day * HOURS_PER_DAY);
        let mut high = f32::MIN;
        let mut low = f32::MAX;
        let mut humidity = 0.0;
        let mut liquid = 0.0;
        let mut rain = 0.0;
        let mut valid = 0u32;
        for h in 0..HOURS_PER_DAY {
            let Ok(sample) = guarded_generate(self.source.as_ref(), region, start.add_hours(h))
            else {
                continue;
            };
            high = high.max(sample.temperature);
            low = low.min(sample.temperature);
            humidity += sample.humidity;
            liquid += sample.precipitation_rate;
            if sample.is_raining() {
                rain += sample.precipitation_rate;
            }
            valid += 1;
        }
        (valid > 0).then(|| DaySummary {
            high,
            low,
            mean_humidity: humidity / valid as f32,
            liquid,
            rain,
            missing_hours: HOURS_PER_DAY as u32 - valid,
        })
    }
}
