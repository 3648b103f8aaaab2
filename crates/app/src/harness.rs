//! Headless validation harness.
//!
//! Builds regions from the built-in template library (or a JSON template
//! file), queues a year scan for each, and works through the queue one
//! chunk per app update so progress is logged while the scan runs. When the
//! queue is empty the seasonal checks run, a summary is printed, and the app
//! exits non-zero if anything was violated.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use weather_sim::climate::TemplateLibrary;
use weather_sim::validation::{BatchRunner, ValidationReport, ValidationSuite};
use weather_sim::{Region, SimConfig, WeatherEngine, WeatherError, WeatherSimPlugin};

pub const USAGE: &str = "usage: weather-harness [--year N] [--stride HOURS] \
[--templates templates.json] [--config config.json] [--report report.json]";

/// Progress is logged each time another tenth of the queue is done.
const PROGRESS_STEP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessOptions {
    pub year: i32,
    pub stride_hours: i64,
    pub templates: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            year: 2024,
            stride_hours: 1,
            templates: None,
            config: None,
            report: None,
        }
    }
}

impl HarnessOptions {
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{flag} needs a value"));
            match flag.as_str() {
                "--year" => {
                    let v = value()?;
                    options.year = v.parse().map_err(|_| format!("bad year '{v}'"))?;
                }
                "--stride" => {
                    let v = value()?;
                    options.stride_hours = match v.parse::<i64>() {
                        Ok(h) if h > 0 => h,
                        _ => return Err(format!("bad stride '{v}'")),
                    };
                }
                "--templates" => options.templates = Some(PathBuf::from(value()?)),
                "--config" => options.config = Some(PathBuf::from(value()?)),
                "--report" => options.report = Some(PathBuf::from(value()?)),
                other => return Err(format!("unknown argument '{other}'")),
            }
        }
        Ok(options)
    }
}

#[derive(Resource)]
struct Harness {
    suite: ValidationSuite,
    runner: Option<BatchRunner>,
    report_path: Option<PathBuf>,
    next_report: f32,
}

fn load_config(options: &HarnessOptions) -> Result<SimConfig, WeatherError> {
    match &options.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| WeatherError::Config(format!("{}: {e}", path.display())))?;
            SimConfig::from_json_str(&json)
        }
        None => Ok(SimConfig::default()),
    }
}

fn load_regions(options: &HarnessOptions) -> Result<Vec<Region>, WeatherError> {
    let library = match &options.templates {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| WeatherError::Template(format!("{}: {e}", path.display())))?;
            TemplateLibrary::from_json_str(&json)?
        }
        None => TemplateLibrary::builtin(),
    };
    if library.is_empty() {
        return Err(WeatherError::Template("template library is empty".into()));
    }
    Ok(library
        .iter()
        .map(|(band, id, template)| Region::from_template(id, band, template))
        .collect())
}

pub fn run(options: HarnessOptions) -> AppExit {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default());

    let setup = load_config(&options).and_then(|c| Ok((c, load_regions(&options)?)));
    let (config, regions) = match setup {
        Ok(v) => v,
        Err(e) => {
            error!("{e}");
            return AppExit::from_code(2);
        }
    };

    app.add_plugins(WeatherSimPlugin { config });
    let engine = app.world().resource::<WeatherEngine>().clone();
    let suite = ValidationSuite::new(options.year, options.stride_hours);
    info!(
        "validating {} regions for {} every {}h",
        regions.len(),
        options.year,
        suite.stride_hours
    );
    let runner = suite.runner(engine, regions);

    app.insert_resource(Harness {
        suite,
        runner: Some(runner),
        report_path: options.report,
        next_report: PROGRESS_STEP,
    })
    .add_systems(Update, run_validation_chunk);
    app.run()
}

fn run_validation_chunk(mut harness: ResMut<Harness>, mut exit: EventWriter<AppExit>) {
    let Harness {
        suite,
        runner,
        report_path,
        next_report,
    } = &mut *harness;
    let Some(active) = runner.as_mut() else {
        return;
    };

    let progress = active.run_chunk(|p| {
        if p.fraction() >= *next_report {
            info!(
                "{:>3.0}% ({}/{}), {} violations, {} exceptions",
                p.fraction() * 100.0,
                p.processed,
                p.total,
                p.violations,
                p.exceptions
            );
            while *next_report <= p.fraction() {
                *next_report += PROGRESS_STEP;
            }
        }
    });
    if !progress.is_done() {
        return;
    }

    let Some(finished) = runner.take() else {
        return;
    };
    let report = suite.finish(finished);
    print_summary(&report);

    let mut code = if report.passed() { 0 } else { 1 };
    if let Some(path) = report_path.as_ref() {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => info!("report written to {}", path.display()),
            Err(e) => {
                error!("could not write report to {}: {e}", path.display());
                code = 1;
            }
        }
    }
    exit.send(AppExit::from_code(code));
}

fn print_summary(report: &ValidationReport) {
    let stats = &report.stats;
    println!("year {} over {} regions", report.year, report.regions.len());
    println!(
        "  samples {}  failed {}  wet {:.1}%",
        stats.samples,
        stats.failed_jobs,
        stats.precipitation_fraction() * 100.0
    );
    for (kind, count) in &stats.type_counts {
        println!("  {kind:<14} {count}");
    }
    if let (Some(min), Some(max)) = (stats.min_temperature, stats.max_temperature) {
        println!("  temperature {min:.1}F .. {max:.1}F");
    }
    println!("  max snow depth {:.1} in", stats.max_snow_depth);
    for (hazard, level) in &stats.hazard_max {
        println!("  max {hazard:<13} {level}");
    }
    println!(
        "  violations {}  exceptions {}  -> {}",
        report.log.violations(),
        report.log.exceptions(),
        if report.passed() { "PASS" } else { "FAIL" }
    );
}
