use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::{days_in_year, GameDate, HOURS_PER_DAY};
use crate::engine::WeatherEngine;
use crate::error::WeatherError;
use crate::region::Region;

use super::batch::{BatchJob, BatchRunner, BatchStats};
use super::checks::{seasonal_change_violation, CheckKind};
use super::log::{LogEntry, Severity, ValidationLog};

/// Equinox and solstice dates (month, day) checked for seasonal jumps.
const SEASON_BOUNDARIES: [(u32, u32); 4] = [(3, 20), (6, 21), (9, 22), (12, 21)];
const WEEK_HOURS: i64 = 7 * HOURS_PER_DAY;

/// Outcome of a finished run, ready to serialize as a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub year: i32,
    pub regions: Vec<String>,
    pub stats: BatchStats,
    pub log: ValidationLog,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.log.is_clean()
    }
}

/// Whole-region scans over one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSuite {
    pub year: i32,
    /// Hours between scanned samples; 1 scans every hour.
    pub stride_hours: i64,
}

impl ValidationSuite {
    pub fn new(year: i32, stride_hours: i64) -> Self {
        Self {
            year,
            stride_hours: stride_hours.max(1),
        }
    }

    /// Jobs covering `year` for every region, region by region.
    pub fn year_scan(&self, region_count: usize) -> Vec<BatchJob> {
        let start = GameDate {
            year: self.year,
            month: 1,
            day: 1,
            hour: 0,
        };
        let hours = i64::from(days_in_year(self.year)) * HOURS_PER_DAY;
        (0..region_count)
            .flat_map(|region| {
                (0..hours)
                    .step_by(self.stride_hours as usize)
                    .map(move |h| BatchJob {
                        region,
                        date: start.add_hours(h),
                    })
            })
            .collect()
    }

    /// A runner with the year scan queued and profile fallbacks logged.
    pub fn runner(&self, engine: WeatherEngine, regions: Vec<Region>) -> BatchRunner {
        let count = regions.len();
        let mut runner = BatchRunner::new(engine, regions);
        let fallbacks: Vec<LogEntry> = runner
            .regions()
            .iter()
            .flat_map(|r| {
                r.profile_fallbacks.iter().map(|f| LogEntry {
                    severity: Severity::Warning,
                    check: Some(CheckKind::ProfileFallback),
                    region_id: r.id.clone(),
                    date: None,
                    message: f.to_string(),
                })
            })
            .collect();
        for entry in fallbacks {
            runner.log_mut().record(entry);
        }
        runner.extend(self.year_scan(count));
        runner
    }

    /// Compare the weekly mean temperature either side of each equinox and
    /// solstice.
    pub fn seasonal_checks(
        &self,
        engine: &WeatherEngine,
        region: &Region,
        log: &mut ValidationLog,
    ) -> Result<(), WeatherError> {
        for (month, day) in SEASON_BOUNDARIES {
            let boundary = GameDate::new(self.year, month, day, 0)?;
            let before = weekly_mean(engine, region, boundary.add_hours(-WEEK_HOURS))?;
            let after = weekly_mean(engine, region, boundary)?;
            if let Some(message) = seasonal_change_violation(before, after) {
                log.violation(CheckKind::SeasonalChange, &region.id, boundary, message);
            }
        }
        Ok(())
    }

    /// Finish a drained runner: seasonal checks for every region, then the
    /// report. Seasonal failures are logged as exceptions, not returned.
    pub fn finish(&self, runner: BatchRunner) -> ValidationReport {
        let engine = runner.engine().clone();
        let regions: Vec<Region> = runner.regions().to_vec();
        let (stats, mut log) = runner.into_parts();
        for region in &regions {
            if let Err(e) = self.seasonal_checks(&engine, region, &mut log) {
                let date = GameDate {
                    year: self.year,
                    month: 1,
                    day: 1,
                    hour: 0,
                };
                log.exception(&region.id, date, e.to_string());
            }
        }
        info!(
            "validation of {} regions for {}: {} samples, {} violations, {} exceptions",
            regions.len(),
            self.year,
            stats.samples,
            log.violations(),
            log.exceptions()
        );
        ValidationReport {
            year: self.year,
            regions: regions.into_iter().map(|r| r.id).collect(),
            stats,
            log,
        }
    }

    /// Queue, drain and finish in one call.
    pub fn run(&self, engine: WeatherEngine, regions: Vec<Region>) -> ValidationReport {
        let mut runner = self.runner(engine, regions);
        runner.run_to_completion(|p| {
            debug!("validation progress {}/{}", p.processed, p.total);
        });
        self.finish(runner)
    }
}

fn weekly_mean(engine: &WeatherEngine, region: &Region, start: GameDate) -> Result<f32, WeatherError> {
    let mut sum = 0.0;
    for h in 0..WEEK_HOURS {
        sum += engine.generate_weather(region, start.add_hours(h))?.temperature;
    }
    Ok(sum / WEEK_HOURS as f32)
}
