//! Cooperative batch execution of validation jobs.
//!
//! A `BatchRunner` owns a queue of `(region, date)` jobs and works through
//! it one bounded chunk at a time, so a host loop can interleave other
//! work and report progress between chunks. Each job runs in isolation:
//! an error or a panic becomes an `Exception` entry and the batch goes on.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::config::BatchConfig;
use crate::engine::WeatherEngine;
use crate::error::WeatherError;
use crate::environment::HazardKind;
use crate::region::Region;
use crate::snow::epoch_for;
use crate::weather::WeatherSample;

use super::checks::{
    flood_false_positive, flood_missed_alert, hourly_change_violation,
    precipitation_band_violation, range_violations, snow_depth_violation, CheckKind,
    TransitionTracker,
};
use super::log::ValidationLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchJob {
    /// Index into the runner's region list.
    pub region: usize,
    pub date: GameDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub violations: usize,
    pub exceptions: usize,
}

impl BatchProgress {
    pub fn is_done(&self) -> bool {
        self.processed >= self.total
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f32 / self.total as f32
        }
    }
}

/// Aggregates over every successfully evaluated job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub samples: usize,
    pub failed_jobs: usize,
    pub precipitation_hours: usize,
    /// Hours per precipitation type name.
    pub type_counts: BTreeMap<String, usize>,
    pub min_temperature: Option<f32>,
    pub max_temperature: Option<f32>,
    pub max_snow_depth: f32,
    /// Highest level seen per hazard key.
    pub hazard_max: BTreeMap<String, u8>,
    /// Most replay gaps reported by any single snow state.
    pub replay_gaps: usize,
}

impl BatchStats {
    fn record_sample(&mut self, sample: &WeatherSample) {
        self.samples += 1;
        if let Some(kind) = sample.precipitation_type {
            self.precipitation_hours += 1;
            *self.type_counts.entry(kind.name().to_string()).or_default() += 1;
        }
        let t = sample.temperature;
        self.min_temperature = Some(self.min_temperature.map_or(t, |m| m.min(t)));
        self.max_temperature = Some(self.max_temperature.map_or(t, |m| m.max(t)));
    }

    pub fn precipitation_fraction(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.precipitation_hours as f32 / self.samples as f32
        }
    }
}

/// Sequence state carried between consecutive jobs of one region.
#[derive(Debug, Clone)]
struct RegionTrack {
    last_hour: Option<i64>,
    last_temperature: f32,
    /// Snow season of the last evaluated hour.
    epoch: Option<GameDate>,
    /// Snow depth at the end of each evaluated hour of the last three days.
    depths: VecDeque<(i64, f32)>,
    transitions: TransitionTracker,
}

const DEPTH_WINDOW_HOURS: i64 = 72;

impl RegionTrack {
    fn new(reset_hours: u32) -> Self {
        Self {
            last_hour: None,
            last_temperature: 0.0,
            epoch: None,
            depths: VecDeque::new(),
            transitions: TransitionTracker::new(reset_hours),
        }
    }

    fn depth_at(&self, hour: i64) -> Option<f32> {
        self.depths
            .iter()
            .find(|(h, _)| *h == hour)
            .map(|(_, d)| *d)
    }

    fn push_depth(&mut self, hour: i64, depth: f32) {
        self.depths.push_back((hour, depth));
        while self
            .depths
            .front()
            .is_some_and(|(h, _)| *h < hour - DEPTH_WINDOW_HOURS)
        {
            self.depths.pop_front();
        }
    }
}

/// Work queue plus everything learned from the jobs run so far.
pub struct BatchRunner {
    engine: WeatherEngine,
    config: BatchConfig,
    regions: Vec<Region>,
    queue: VecDeque<BatchJob>,
    total: usize,
    processed: usize,
    tracks: HashMap<usize, RegionTrack>,
    stats: BatchStats,
    log: ValidationLog,
}

impl BatchRunner {
    pub fn new(engine: WeatherEngine, regions: Vec<Region>) -> Self {
        let config = engine.config().batch.clone();
        Self {
            engine,
            config,
            regions,
            queue: VecDeque::new(),
            total: 0,
            processed: 0,
            tracks: HashMap::new(),
            stats: BatchStats::default(),
            log: ValidationLog::default(),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn engine(&self) -> &WeatherEngine {
        &self.engine
    }

    pub fn push(&mut self, job: BatchJob) {
        self.queue.push_back(job);
        self.total += 1;
    }

    pub fn extend(&mut self, jobs: impl IntoIterator<Item = BatchJob>) {
        for job in jobs {
            self.push(job);
        }
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            processed: self.processed,
            total: self.total,
            violations: self.log.violations(),
            exceptions: self.log.exceptions(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    pub fn log(&self) -> &ValidationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ValidationLog {
        &mut self.log
    }

    pub fn into_parts(self) -> (BatchStats, ValidationLog) {
        (self.stats, self.log)
    }

    /// Run at most `chunk_size` jobs, then report progress once.
    pub fn run_chunk(&mut self, mut on_progress: impl FnMut(&BatchProgress)) -> BatchProgress {
        for _ in 0..self.config.chunk_size {
            let Some(job) = self.queue.pop_front() else {
                break;
            };
            self.run_job(job);
        }
        let progress = self.progress();
        on_progress(&progress);
        progress
    }

    /// Drain the queue, reporting progress after every chunk.
    pub fn run_to_completion(&mut self, mut on_progress: impl FnMut(&BatchProgress)) {
        while !self.is_done() {
            self.run_chunk(&mut on_progress);
        }
    }

    fn run_job(&mut self, job: BatchJob) {
        self.processed += 1;
        let Some(region) = self.regions.get(job.region).cloned() else {
            self.stats.failed_jobs += 1;
            self.log.exception(
                "?",
                job.date,
                format!("job refers to missing region #{}", job.region),
            );
            return;
        };
        let ordinal = self.processed;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.evaluate(job.region, &region, job.date, ordinal)
        }));
        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("panic: {reason}")
            }
        };
        self.stats.failed_jobs += 1;
        // The sequence is broken; start the region's checks over.
        self.tracks.remove(&job.region);
        self.log.exception(&region.id, job.date, failure);
    }

    fn evaluate(
        &mut self,
        index: usize,
        region: &Region,
        date: GameDate,
        ordinal: usize,
    ) -> Result<(), WeatherError> {
        let sample = self.engine.generate_weather(region, date)?;
        let snow = self.engine.get_accumulation(region, date)?;
        let hazards = if self.config.evaluate_hazards {
            Some(self.engine.get_environmental_conditions(region, date)?)
        } else {
            None
        };
        let hour = date.to_linear_hour();
        let id = region.id.as_str();

        for message in range_violations(&sample) {
            self.log.violation(CheckKind::Range, id, date, message);
        }
        if let Some(message) = precipitation_band_violation(&sample) {
            self.log
                .violation(CheckKind::PrecipitationBand, id, date, message);
        }
        let max_depth = self.engine.config().snow.max_snow_depth;
        if let Some(message) = snow_depth_violation(snow.snow_depth, max_depth) {
            self.log.violation(CheckKind::SnowDepth, id, date, message);
        }

        if self.config.determinism_check_interval > 0
            && ordinal % self.config.determinism_check_interval == 0
        {
            let fresh = self.engine.generator().generate_uncached(region, date)?;
            if fresh != sample {
                self.log.violation(
                    CheckKind::Determinism,
                    id,
                    date,
                    "cached sample differs from a fresh generation",
                );
            }
        }
        if self.config.replay_check_interval > 0
            && ordinal % self.config.replay_check_interval == 0
        {
            let replayed = self.engine.snow().replay_from_epoch(region, date)?;
            if replayed != snow {
                self.log.violation(
                    CheckKind::ReplayEquivalence,
                    id,
                    date,
                    format!(
                        "incremental depth {} vs replayed {}",
                        snow.snow_depth, replayed.snow_depth
                    ),
                );
            }
        }

        let epoch = epoch_for(self.engine.config().snow.epoch, date)?;
        let reset_hours = self.engine.config().generator.dry_reset_hours;
        let track = self
            .tracks
            .entry(index)
            .or_insert_with(|| RegionTrack::new(reset_hours));
        let elapsed = track.last_hour.map(|h| hour - h);
        if let Some(elapsed) = elapsed {
            if let Some(message) =
                hourly_change_violation(track.last_temperature, sample.temperature, elapsed)
            {
                self.log.violation(CheckKind::HourlyChange, id, date, message);
            }
        }
        if elapsed != Some(1) {
            track.transitions.reset();
        }
        // Depth comparisons only make sense forward in time along one replay.
        if elapsed.map_or(true, |e| e <= 0) || track.epoch != epoch {
            track.depths.clear();
        }
        track.epoch = epoch;
        if let Some(message) = track.transitions.observe(sample.precipitation_type) {
            self.log.violation(CheckKind::Transition, id, date, message);
        }

        if let Some(env) = &hazards {
            let flooding = env.flooding.level;
            if let Some(previous) = track.depth_at(hour - 1) {
                if let Some(message) = flood_false_positive(
                    flooding,
                    snow.snow_depth - previous,
                    sample.temperature,
                    sample.precipitation_type,
                ) {
                    self.log
                        .violation(CheckKind::FloodFalsePositive, id, date, message);
                }
            }
            if let Some(earlier) = track.depth_at(hour - DEPTH_WINDOW_HOURS) {
                let threshold = self.engine.config().hazards.rapid_melt_threshold_in();
                if let Some(message) = flood_missed_alert(
                    flooding,
                    earlier - snow.snow_depth,
                    sample.temperature,
                    threshold,
                ) {
                    self.log
                        .violation(CheckKind::FloodMissedAlert, id, date, message);
                }
            }
            for kind in HazardKind::ALL {
                let level = env.get(kind).level;
                let max = self.stats.hazard_max.entry(kind.key().to_string()).or_default();
                *max = (*max).max(level);
            }
        }

        track.last_hour = Some(hour);
        track.last_temperature = sample.temperature;
        track.push_depth(hour, snow.snow_depth);

        self.stats.record_sample(&sample);
        self.stats.max_snow_depth = self.stats.max_snow_depth.max(snow.snow_depth);
        self.stats.replay_gaps = self.stats.replay_gaps.max(snow.replay_gaps);
        Ok(())
    }
}
