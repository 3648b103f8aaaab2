//! Hour-by-hour snowpack replay.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::config::{EpochPolicy, SnowConfig, FREEZING_POINT_F, ICY_THRESHOLD_IN, SNOW_COVER_DEPTH_IN};
use crate::error::{ReplayGap, WeatherError};
use crate::region::Region;
use crate::weather::{guarded_generate, PrecipitationType, WeatherSample, WeatherSource};

use super::types::{GroundCondition, HourRecord, SnowState};

// =============================================================================
// Pure helper functions (testable without a weather source)
// =============================================================================

/// Inches of snow per inch of liquid. Grows below 28F up to the configured cap.
pub fn snow_ratio(temperature: f32, config: &SnowConfig) -> f32 {
    let cold = (28.0 - temperature).max(0.0);
    (config.snow_ratio + cold * config.snow_ratio_per_degree).min(config.max_snow_ratio)
}

/// Snow depth added by one hour of weather.
pub fn snowfall_amount(sample: &WeatherSample, config: &SnowConfig) -> f32 {
    if sample.is_snowing() {
        sample.precipitation_rate * snow_ratio(sample.temperature, config)
    } else {
        0.0
    }
}

/// Potential snow melt for one hour, before bounding by the pack.
pub fn snow_melt_amount(temperature: f32, raining: bool, config: &SnowConfig) -> f32 {
    if temperature <= FREEZING_POINT_F {
        return 0.0;
    }
    let boost = if raining { 1.0 + config.rain_melt_boost } else { 1.0 };
    (temperature - FREEZING_POINT_F) * config.melt_rate_per_degree * boost
}

/// Glaze added by one hour: freezing rain at the full rate, sleet at half.
pub fn ice_accretion(sample: &WeatherSample) -> f32 {
    match sample.precipitation_type {
        Some(PrecipitationType::FreezingRain) => sample.precipitation_rate,
        Some(PrecipitationType::Sleet) => 0.5 * sample.precipitation_rate,
        _ => 0.0,
    }
}

pub fn ice_melt_amount(temperature: f32, config: &SnowConfig) -> f32 {
    if temperature <= FREEZING_POINT_F {
        return 0.0;
    }
    (temperature - FREEZING_POINT_F) * config.ice_melt_rate_per_degree
}

/// Recent-weather counters that feed the ground condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentWeather {
    pub hours_since_precipitation: u32,
    pub hours_since_rain: u32,
    pub hours_since_melt: u32,
}

impl Default for RecentWeather {
    fn default() -> Self {
        Self {
            hours_since_precipitation: u32::MAX,
            hours_since_rain: u32::MAX,
            hours_since_melt: u32::MAX,
        }
    }
}

/// Ground condition in priority order.
pub fn ground_condition(
    depth: f32,
    ice: f32,
    temperature: f32,
    recent: RecentWeather,
    config: &SnowConfig,
) -> GroundCondition {
    if depth >= SNOW_COVER_DEPTH_IN {
        GroundCondition::SnowCovered
    } else if ice >= ICY_THRESHOLD_IN {
        GroundCondition::Icy
    } else if temperature <= FREEZING_POINT_F
        && recent.hours_since_precipitation < config.recent_precipitation_hours
    {
        GroundCondition::Frozen
    } else if recent.hours_since_melt < config.recent_melt_hours {
        GroundCondition::Thawing
    } else if temperature > FREEZING_POINT_F
        && recent.hours_since_rain < config.recent_rain_hours
    {
        GroundCondition::Muddy
    } else {
        GroundCondition::Dry
    }
}

/// Replay start for a query at `date`, or `None` when the query precedes a
/// fixed epoch.
///
/// With a season start, replay begins `carryover_seasons` season starts
/// before the season containing `date`. Queries either side of a season
/// start then agree once the older pack has melted out or reached the
/// depth cap.
pub fn epoch_for(policy: EpochPolicy, date: GameDate) -> Result<Option<GameDate>, WeatherError> {
    match policy {
        EpochPolicy::SeasonStart {
            month,
            day,
            carryover_seasons,
        } => {
            let season_year = if GameDate::new(date.year, month, day, 0)? <= date {
                date.year
            } else {
                date.year - 1
            };
            let carry = i32::try_from(carryover_seasons)
                .map_err(|_| WeatherError::Config("snow.epoch carryoverSeasons too large".into()))?;
            GameDate::new(season_year.saturating_sub(carry), month, day, 0).map(Some)
        }
        EpochPolicy::Fixed { date: epoch } => Ok((epoch <= date).then_some(epoch)),
    }
}

// =============================================================================
// Replay state
// =============================================================================

/// Everything replay carries from one hour to the next. Two states built
/// from the same epoch and advanced over the same hours compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationState {
    pub epoch: GameDate,
    /// Next linear hour `apply_hour` will evaluate.
    pub next_hour: i64,
    pub depth: f32,
    pub ice: f32,
    pub last_temperature: Option<f32>,
    pub recent: RecentWeather,
    pub gaps: Vec<ReplayGap>,
    history: VecDeque<HourRecord>,
    history_capacity: usize,
}

impl AccumulationState {
    pub fn new(epoch: GameDate, config: &SnowConfig) -> Self {
        Self {
            epoch,
            next_hour: epoch.to_linear_hour(),
            depth: 0.0,
            ice: 0.0,
            last_temperature: None,
            recent: RecentWeather::default(),
            gaps: Vec::new(),
            history: VecDeque::with_capacity(config.history_window_hours),
            history_capacity: config.history_window_hours,
        }
    }

    /// Snow state after the last applied hour.
    pub fn snow_state(&self, config: &SnowConfig) -> SnowState {
        let temperature = self.last_temperature.unwrap_or(FREEZING_POINT_F);
        SnowState {
            snow_depth: self.depth,
            ice_accumulation: self.ice,
            ground_condition: ground_condition(self.depth, self.ice, temperature, self.recent, config),
            replay_gaps: self.gaps.len(),
        }
    }

    /// Evaluate `next_hour` and advance past it.
    pub fn apply_hour(
        &mut self,
        region: &Region,
        source: &dyn WeatherSource,
        config: &SnowConfig,
    ) -> HourRecord {
        let hour = self.next_hour;
        let date = GameDate::from_linear_hour(hour);
        let record = match guarded_generate(source, region, date) {
            Ok(sample) => self.apply_sample(hour, date, &sample, config),
            Err(gap) => self.apply_gap(hour, date, gap),
        };
        self.next_hour += 1;
        self.remember(record.clone());
        record
    }

    /// Apply hours until `target_hour` (inclusive) has been evaluated.
    pub fn advance_to(
        &mut self,
        target_hour: i64,
        region: &Region,
        source: &dyn WeatherSource,
        config: &SnowConfig,
    ) {
        while self.next_hour <= target_hour {
            self.apply_hour(region, source, config);
        }
    }

    /// Whether every hour in `from..=to` is in the retained history.
    pub fn covers(&self, from_hour: i64, to_hour: i64) -> bool {
        match self.history.front() {
            Some(first) => first.hour <= from_hour && to_hour < self.next_hour,
            None => false,
        }
    }

    pub fn records(&self, from_hour: i64, to_hour: i64) -> Vec<HourRecord> {
        self.history
            .iter()
            .filter(|r| r.hour >= from_hour && r.hour <= to_hour)
            .cloned()
            .collect()
    }

    fn apply_sample(
        &mut self,
        hour: i64,
        date: GameDate,
        sample: &WeatherSample,
        config: &SnowConfig,
    ) -> HourRecord {
        let t = sample.temperature;
        let raining = sample.is_raining();

        let snowfall = snowfall_amount(sample, config);
        let with_new_snow = self.depth + snowfall;
        let snow_melt = snow_melt_amount(t, raining, config).min(with_new_snow);
        self.depth = (with_new_snow - snow_melt).clamp(0.0, config.max_snow_depth);

        let with_new_ice = self.ice + ice_accretion(sample);
        let ice_melt = ice_melt_amount(t, config).min(with_new_ice);
        self.ice = (with_new_ice - ice_melt).max(0.0);

        let rain = if raining { sample.precipitation_rate } else { 0.0 };
        let melted = snow_melt > 0.0 || ice_melt > 0.0;
        self.recent = RecentWeather {
            hours_since_precipitation: bump_or_reset(
                self.recent.hours_since_precipitation,
                sample.precipitation,
            ),
            hours_since_rain: bump_or_reset(self.recent.hours_since_rain, raining),
            hours_since_melt: bump_or_reset(self.recent.hours_since_melt, melted),
        };
        self.last_temperature = Some(t);

        HourRecord {
            date,
            hour,
            depth: self.depth,
            ice: self.ice,
            snowfall,
            snow_melt,
            ice_melt,
            rain,
            liquid: sample.precipitation_rate,
            temperature: t,
            precipitation_type: sample.precipitation_type,
            gap: false,
        }
    }

    /// A dry hour at the previous temperature that leaves the pack as it was.
    fn apply_gap(&mut self, hour: i64, date: GameDate, gap: ReplayGap) -> HourRecord {
        self.gaps.push(gap);

        self.recent = RecentWeather {
            hours_since_precipitation: bump_or_reset(self.recent.hours_since_precipitation, false),
            hours_since_rain: bump_or_reset(self.recent.hours_since_rain, false),
            hours_since_melt: bump_or_reset(self.recent.hours_since_melt, false),
        };
        HourRecord {
            date,
            hour,
            depth: self.depth,
            ice: self.ice,
            snowfall: 0.0,
            snow_melt: 0.0,
            ice_melt: 0.0,
            rain: 0.0,
            liquid: 0.0,
            temperature: self.last_temperature.unwrap_or(FREEZING_POINT_F),
            precipitation_type: None,
            gap: true,
        }
    }

    fn remember(&mut self, record: HourRecord) {
        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

fn bump_or_reset(hours: u32, happened: bool) -> u32 {
    if happened {
        0
    } else {
        hours.saturating_add(1)
    }
}
