//! Hourly weather generation with a per-region sample cache.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{PoisonError, RwLock};

use bevy::prelude::*;
use rand::Rng;

use crate::calendar::GameDate;
use crate::climate::SeasonalValue;
use crate::config::{
    GeneratorConfig, MAX_TEMPERATURE_F, MIN_TEMPERATURE_F, STANDARD_PRESSURE_INHG,
};
use crate::error::{ReplayGap, WeatherError};
use crate::region::Region;
use crate::rng::{region_seed, stream_rng, Channel, KnotNoise, TemporalNoise};

use super::atmosphere::{
    diurnal_factor, diurnal_range, effects_for, feels_like, moisture_factor, slot_index,
    slot_of_day, slot_rate, wet_fraction, ANOMALY_SCALE, DAILY_SPACING_HOURS, DAILY_WEIGHT,
    SLOT_HOURS, SLOT_OFFSET_HOURS, SYNOPTIC_SPACING_HOURS, SYNOPTIC_WEIGHT,
};
use super::phase::{PhaseDecision, PrecipitationState};
use super::types::{
    PrecipitationIntensity, ThunderstormSeverity, WeatherCondition, WeatherSample, WindIntensity,
};

/// Pressure band the generator keeps to; inside the contract's 28-32 inHg.
const PRESSURE_FLOOR_INHG: f32 = 28.5;
const PRESSURE_CEILING_INHG: f32 = 31.0;
/// Minimum `thunderstorms` factor before heavy rain can become a thunderstorm.
const THUNDERSTORM_FACTOR_THRESHOLD: f32 = 0.3;
const THUNDERSTORM_MIN_TEMPERATURE_F: f32 = 50.0;
/// Share of slots whose precipitation melts aloft and refreezes at ground.
const WARM_LAYER_CHANCE: f32 = 0.35;

/// Anything that can produce the weather for a region and hour. The snow
/// and hazard services depend on this seam rather than on the generator.
pub trait WeatherSource: Send + Sync {
    fn generate_weather(&self, region: &Region, date: GameDate)
        -> Result<WeatherSample, WeatherError>;
}

/// Generate one hour for history replay. Errors and panics become a
/// logged `ReplayGap` so the caller can substitute the hour and go on.
pub fn guarded_generate(
    source: &dyn WeatherSource,
    region: &Region,
    date: GameDate,
) -> Result<WeatherSample, ReplayGap> {
    let cause = match catch_unwind(AssertUnwindSafe(|| source.generate_weather(region, date))) {
        Ok(Ok(sample)) => return Ok(sample),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "weather generation panicked".to_string()),
    };
    let gap = ReplayGap {
        region_id: region.id.clone(),
        date,
        cause,
    };
    warn!("{gap}");
    Err(gap)
}

/// Random draws for one 6-hour precipitation slot.
#[derive(Debug, Clone, Copy)]
struct SlotDraw {
    wet: bool,
    intensity: f32,
    onset_delay: i64,
    early_end: i64,
    thunder_roll: f32,
    warm_layer: bool,
}

/// Per-region noise sources and factors, built once per block.
struct RegionContext<'a> {
    region: &'a Region,
    seed: u64,
    synoptic: KnotNoise,
    daily: KnotNoise,
    humidity_noise: KnotNoise,
    dew_noise: KnotNoise,
    cloud: TemporalNoise,
    wind: TemporalNoise,
    wind_direction: TemporalNoise,
    pressure: TemporalNoise,
    rate_jitter: TemporalNoise,
    precipitation_multiplier: f32,
    thunderstorms: f32,
    wind_multiplier: f32,
}

/// Everything about an hour except the precipitation phase.
struct RawHour {
    hour: i64,
    temperature: f32,
    humidity: f32,
    dew_point: f32,
    dew_max: Option<f32>,
    wet: bool,
    rate: f32,
    slot: SlotDraw,
    cloud_texture: f32,
    wind_speed: f32,
    wind_direction: f32,
    pressure: f32,
}

impl<'a> RegionContext<'a> {
    fn new(region: &'a Region) -> Self {
        let seed = region_seed(&region.id);
        let wind_multiplier = if region.special_factors.flag("highWinds") {
            1.5
        } else {
            1.0
        };
        Self {
            region,
            seed,
            synoptic: KnotNoise::new(seed, Channel::SynopticAnomaly, SYNOPTIC_SPACING_HOURS),
            daily: KnotNoise::new(seed, Channel::DailyAnomaly, DAILY_SPACING_HOURS),
            humidity_noise: KnotNoise::new(seed, Channel::HumidityAnomaly, 36),
            dew_noise: KnotNoise::new(seed, Channel::DewPointAnomaly, 48),
            cloud: TemporalNoise::new(seed, Channel::CloudTexture, 10.0),
            wind: TemporalNoise::new(seed, Channel::WindSpeed, 18.0),
            wind_direction: TemporalNoise::new(seed, Channel::WindDirection, 40.0),
            pressure: TemporalNoise::new(seed, Channel::Pressure, 50.0),
            rate_jitter: TemporalNoise::new(seed, Channel::RateJitter, 3.0),
            precipitation_multiplier: region.factor_or("precipitationMultiplier", 1.0),
            thunderstorms: region.factor_or("thunderstorms", 0.0).clamp(0.0, 1.0),
            wind_multiplier,
        }
    }

    fn seasonal(&self, hour: i64) -> (GameDate, SeasonalValue, SeasonalValue, SeasonalValue) {
        let date = GameDate::from_linear_hour(hour);
        let pos = date.year_position();
        let climate = &self.region.climate;
        (
            date,
            climate.temperature.at(pos),
            climate.humidity.at(pos),
            climate.dew_point.at(pos),
        )
    }

    fn draw_slot(&self, slot: i64) -> SlotDraw {
        let mid_hour = slot * SLOT_HOURS + SLOT_OFFSET_HOURS + SLOT_HOURS / 2;
        let (_, temperature, humidity, _) = self.seasonal(mid_hour);
        let chance = wet_fraction(
            humidity.mean,
            temperature.mean,
            slot_of_day(slot),
            self.precipitation_multiplier,
        );

        let mut rng = stream_rng(self.seed, Channel::PrecipitationSlot, slot);
        let roll: f32 = rng.gen();
        let intensity: f32 = rng.gen();
        let onset_delay = rng.gen_range(0..=2);
        let early_end = rng.gen_range(0..=2);
        let thunder_roll: f32 = rng.gen();
        let warm_roll: f32 = rng.gen();
        SlotDraw {
            wet: roll < chance,
            intensity,
            onset_delay,
            early_end,
            thunder_roll,
            warm_layer: warm_roll < WARM_LAYER_CHANCE,
        }
    }

    fn raw_hour(&self, hour: i64, slots: &SlotTable) -> RawHour {
        let (date, t_season, h_season, d_season) = self.seasonal(hour);
        let day_curve = diurnal_factor(date.hour) - 0.5;
        let range = diurnal_range(self.region, h_season.mean);

        let slot = slot_index(hour);
        let draw = slots.get(slot);
        let offset = hour - (slot * SLOT_HOURS + SLOT_OFFSET_HOURS);
        let start = if slots.get(slot - 1).wet {
            0
        } else {
            draw.onset_delay
        };
        let end = if slots.get(slot + 1).wet {
            SLOT_HOURS
        } else {
            SLOT_HOURS - draw.early_end
        };
        let wet = draw.wet && offset >= start && offset < end;

        let rate = if wet {
            let jitter = 0.75 + 0.5 * self.rate_jitter.sample_unit(hour);
            slot_rate(draw.intensity, moisture_factor(d_season.mean)) * jitter
        } else {
            0.0
        };

        let anomaly = SYNOPTIC_WEIGHT * self.synoptic.sample(hour)
            + DAILY_WEIGHT * self.daily.sample(hour);
        let cooling = if wet { 1.5 + 1.5 * draw.intensity } else { 0.0 };
        let temperature = (t_season.mean + ANOMALY_SCALE * t_season.variance * anomaly
            + range * day_curve
            - cooling)
            .clamp(MIN_TEMPERATURE_F, MAX_TEMPERATURE_F);

        let mut humidity = h_season.mean
            + ANOMALY_SCALE * h_season.variance * self.humidity_noise.sample(hour)
            - 12.0 * day_curve;
        if wet {
            humidity = humidity.max(82.0 + 15.0 * draw.intensity);
        }

        let mut dew_point = d_season.mean
            + ANOMALY_SCALE * d_season.variance * (0.7 * anomaly + 0.71 * self.dew_noise.sample(hour))
            + 0.3 * range * day_curve;
        if wet {
            dew_point = dew_point.max(temperature - 4.0);
        }

        let roughness = self.region.terrain_roughness.clamp(0.0, 1.0);
        let mut wind_speed = (3.0 + 15.0 * self.wind.sample_unit(hour).powf(1.5))
            * (1.15 - 0.3 * roughness)
            + self.region.elevation.max(0.0) / 1000.0;
        if wet {
            wind_speed += 6.0 * draw.intensity;
        }
        wind_speed *= self.wind_multiplier;

        let mut pressure = STANDARD_PRESSURE_INHG
            + 0.3 * self.pressure.sample(hour)
            + 0.08 * self.synoptic.sample(hour);
        if wet {
            pressure -= 0.15 + 0.25 * draw.intensity;
        }

        RawHour {
            hour,
            temperature,
            humidity,
            dew_point,
            dew_max: d_season.max,
            wet,
            rate,
            slot: draw,
            cloud_texture: self.cloud.sample(hour),
            wind_speed,
            wind_direction: compass_degrees(self.wind_direction.sample(hour) * 540.0),
            pressure,
        }
    }

    /// Turn a raw hour and its phase decision into a finished sample.
    fn finish(&self, raw: RawHour, phase: Option<PhaseDecision>) -> Result<WeatherSample, WeatherError> {
        let temperature = phase.map_or(raw.temperature, |p| p.temperature);
        let humidity = raw.humidity.clamp(0.0, 100.0);
        let mut dew_point = raw.dew_point;
        if let Some(max) = raw.dew_max {
            dew_point = dew_point.min(max);
        }
        dew_point = dew_point.min(temperature);

        let mut cloud_cover = (humidity - 35.0) * 1.3 + 30.0 * raw.cloud_texture;
        if raw.wet {
            cloud_cover = cloud_cover.max(70.0 + 30.0 * raw.slot.intensity);
        }
        let cloud_cover = cloud_cover.clamp(0.0, 100.0);

        let mut wind_speed = raw.wind_speed;
        let mut pressure = raw.pressure;
        let mut thunderstorm_severity = None;

        let (condition, intensity) = match phase {
            Some(p) => {
                let intensity = PrecipitationIntensity::from_rate(raw.rate);
                let base = WeatherCondition::from_precipitation(p.kind, intensity, wind_speed);
                let storms = base == WeatherCondition::HeavyRain
                    && self.thunderstorms >= THUNDERSTORM_FACTOR_THRESHOLD
                    && raw.slot.thunder_roll < self.thunderstorms
                    && temperature >= THUNDERSTORM_MIN_TEMPERATURE_F;
                if storms {
                    thunderstorm_severity = Some(if raw.rate >= 0.10 {
                        ThunderstormSeverity::Severe
                    } else if raw.rate >= 0.08 {
                        ThunderstormSeverity::Strong
                    } else {
                        ThunderstormSeverity::Normal
                    });
                    wind_speed += 12.0;
                    pressure -= 0.1;
                    (WeatherCondition::Thunderstorm, Some(intensity))
                } else {
                    (base, Some(intensity))
                }
            }
            None => {
                let foggy = humidity >= 95.0 && temperature - dew_point <= 2.0 && wind_speed < 10.0;
                if foggy {
                    (WeatherCondition::Fog, None)
                } else {
                    (WeatherCondition::from_cloud_cover(cloud_cover), None)
                }
            }
        };

        let wind_speed = wind_speed.clamp(0.0, 150.0);
        let mut sample = WeatherSample {
            temperature,
            humidity,
            dew_point,
            pressure: pressure.clamp(PRESSURE_FLOOR_INHG, PRESSURE_CEILING_INHG),
            cloud_cover,
            wind_speed,
            wind_direction: raw.wind_direction,
            wind_intensity: WindIntensity::from_speed(wind_speed),
            precipitation: phase.is_some(),
            precipitation_type: phase.map(|p| p.kind),
            precipitation_intensity: intensity,
            precipitation_rate: raw.rate,
            condition,
            thunderstorm_severity,
            effects: Vec::new(),
            feels_like: feels_like(temperature, humidity),
        };
        self.check_finite(&sample, raw.hour)?;
        sample.effects = effects_for(&sample);
        Ok(sample)
    }

    fn check_finite(&self, s: &WeatherSample, hour: i64) -> Result<(), WeatherError> {
        let fields = [
            ("temperature", s.temperature),
            ("humidity", s.humidity),
            ("dewPoint", s.dew_point),
            ("pressure", s.pressure),
            ("cloudCover", s.cloud_cover),
            ("windSpeed", s.wind_speed),
            ("windDirection", s.wind_direction),
            ("precipitationRate", s.precipitation_rate),
            ("feelsLike", s.feels_like),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some(&(quantity, _)) => Err(WeatherError::NonFiniteSample {
                region_id: self.region.id.clone(),
                quantity,
                hour,
            }),
            None => Ok(()),
        }
    }
}

/// Wrap any angle into `[0, 360)`.
fn compass_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Slot draws for a contiguous hour range, including one slot of margin
/// on each side for onset and early-end decisions.
struct SlotTable {
    first: i64,
    draws: Vec<SlotDraw>,
}

impl SlotTable {
    fn new(ctx: &RegionContext<'_>, start_hour: i64, end_hour: i64) -> Self {
        let first = slot_index(start_hour) - 1;
        let last = slot_index(end_hour) + 1;
        Self {
            first,
            draws: (first..=last).map(|s| ctx.draw_slot(s)).collect(),
        }
    }

    fn get(&self, slot: i64) -> SlotDraw {
        self.draws[(slot - self.first) as usize]
    }
}

/// Produces hourly `WeatherSample`s and memoizes them per region.
///
/// Hours are generated a block at a time: the phase machine starts empty
/// at the beginning of the previous block and runs through the requested
/// one, so any hour can be computed from scratch and the result does not
/// depend on query order.
pub struct WeatherGenerator {
    config: GeneratorConfig,
    cache: RwLock<HashMap<String, HashMap<i64, WeatherSample>>>,
}

impl Default for WeatherGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl WeatherGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Drop cached samples for one region, or for every region.
    pub fn clear_cache(&self, region_id: Option<&str>) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        match region_id {
            Some(id) => {
                cache.remove(id);
            }
            None => cache.clear(),
        }
    }

    pub fn cached_hours(&self, region_id: &str) -> usize {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(region_id).map_or(0, HashMap::len)
    }

    /// Generate without reading or writing the cache.
    pub fn generate_uncached(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<WeatherSample, WeatherError> {
        date.validate()?;
        let hour = date.to_linear_hour();
        let block = hour.div_euclid(self.config.block_hours);
        let mut samples = self.compute_block(region, block);
        let index = (hour - block * self.config.block_hours) as usize;
        samples.swap_remove(index).1
    }

    fn lookup(&self, region_id: &str, hour: i64) -> Option<WeatherSample> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(region_id).and_then(|m| m.get(&hour)).cloned()
    }

    fn store(&self, region_id: &str, samples: &[(i64, Result<WeatherSample, WeatherError>)]) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entries = cache.entry(region_id.to_string()).or_default();
        if entries.len() + samples.len() > self.config.cache_capacity_hours {
            debug!(
                "weather cache for region '{}' reached {} hours, clearing",
                region_id,
                entries.len()
            );
            entries.clear();
        }
        for (hour, sample) in samples {
            if let Ok(sample) = sample {
                entries.insert(*hour, sample.clone());
            }
        }
    }

    /// Every hour of `block`, in order. Failed hours are kept as errors so
    /// one bad hour does not take its neighbours with it.
    fn compute_block(
        &self,
        region: &Region,
        block: i64,
    ) -> Vec<(i64, Result<WeatherSample, WeatherError>)> {
        let len = self.config.block_hours;
        let warmup_start = (block - 1) * len;
        let block_start = block * len;
        let block_end = (block + 1) * len;

        let ctx = RegionContext::new(region);
        let slots = SlotTable::new(&ctx, warmup_start, block_end);
        let mut state = PrecipitationState::default();
        let mut out = Vec::with_capacity(len as usize);

        for hour in warmup_start..block_end {
            let raw = ctx.raw_hour(hour, &slots);
            let phase = if raw.wet {
                Some(state.step_wet(
                    raw.temperature,
                    raw.slot.warm_layer,
                    self.config.min_persistence_hours,
                ))
            } else {
                state.step_dry(self.config.dry_reset_hours);
                None
            };
            if hour >= block_start {
                out.push((hour, ctx.finish(raw, phase)));
            }
        }
        out
    }
}

impl WeatherSource for WeatherGenerator {
    fn generate_weather(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<WeatherSample, WeatherError> {
        date.validate()?;
        let hour = date.to_linear_hour();
        if let Some(sample) = self.lookup(&region.id, hour) {
            return Ok(sample);
        }

        let block = hour.div_euclid(self.config.block_hours);
        let mut samples = self.compute_block(region, block);
        self.store(&region.id, &samples);
        let index = (hour - block * self.config.block_hours) as usize;
        samples.swap_remove(index).1
    }
}
