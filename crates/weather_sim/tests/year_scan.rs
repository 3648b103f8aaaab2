//! Year-long validation scans over the built-in climate templates.
//!
//! These tests drive the public API end to end:
//! - every built-in template scanned for a year through the batch runner
//! - the snowy templates scanned hour by hour, so transitions and flood
//!   alerts are checked between consecutive hours
//! - a cold continental January builds a snowpack
//! - a tropical rainforest is wet at noon most days and never snows
//!
//! Run: cargo test -p weather_sim --test year_scan

use std::time::Instant;

use weather_sim::climate::TemplateLibrary;
use weather_sim::snow::GroundCondition;
use weather_sim::validation::{BatchJob, BatchRunner, CheckKind, ValidationSuite};
use weather_sim::weather::PrecipitationType;
use weather_sim::{GameDate, Region, WeatherEngine};

fn builtin_regions() -> Vec<Region> {
    let library = TemplateLibrary::builtin();
    library
        .iter()
        .map(|(band, id, template)| Region::from_template(id, band, template))
        .collect()
}

fn builtin(band: &str, id: &str) -> Region {
    Region::from_library(id, &TemplateLibrary::builtin(), band, id).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Every built-in template survives a year scan
// ---------------------------------------------------------------------------

#[test]
fn test_builtin_templates_year_scan() {
    let regions = builtin_regions();
    assert!(regions.len() >= 10);

    let start = Instant::now();
    let report = ValidationSuite::new(2024, 6).run(WeatherEngine::default(), regions.clone());
    let elapsed = start.elapsed();

    println!(
        "scanned {} regions ({} samples) in {:?}: {} violations, {} seasonal",
        regions.len(),
        report.stats.samples,
        elapsed,
        report.log.violations(),
        report.log.check_count(CheckKind::SeasonalChange)
    );

    assert_eq!(report.log.exceptions(), 0, "{:?}", report.log.entries());
    assert_eq!(report.stats.samples, regions.len() * 366 * 4);
    for check in [
        CheckKind::Range,
        CheckKind::PrecipitationBand,
        CheckKind::HourlyChange,
        CheckKind::SeasonalChange,
        CheckKind::SnowDepth,
        CheckKind::FloodMissedAlert,
        CheckKind::Determinism,
        CheckKind::ReplayEquivalence,
    ] {
        assert_eq!(
            report.log.check_count(check),
            0,
            "{check:?}: {:?}",
            report.log.entries()
        );
    }
    assert!(report.stats.type_counts.contains_key("snow"));
    assert!(report.stats.type_counts.contains_key("rain"));
}

// ---------------------------------------------------------------------------
// 2. Snowy templates hour by hour
// ---------------------------------------------------------------------------

#[test]
fn test_snowy_templates_hourly_scan() {
    let regions: Vec<Region> = builtin_regions()
        .into_iter()
        .filter(|r| matches!(r.latitude_band.as_str(), "continental" | "subarctic" | "polar"))
        .collect();
    assert!(regions.len() >= 3);

    let report = ValidationSuite::new(2024, 1).run(WeatherEngine::default(), regions.clone());
    println!(
        "hourly scan of {} regions: {} samples, max depth {:.1}",
        regions.len(),
        report.stats.samples,
        report.stats.max_snow_depth
    );

    assert_eq!(report.log.exceptions(), 0, "{:?}", report.log.entries());
    assert_eq!(report.stats.samples, regions.len() * 366 * 24);
    for check in [
        CheckKind::Transition,
        CheckKind::FloodFalsePositive,
        CheckKind::FloodMissedAlert,
        CheckKind::PrecipitationBand,
        CheckKind::ReplayEquivalence,
    ] {
        assert_eq!(
            report.log.check_count(check),
            0,
            "{check:?}: {:?}",
            report.log.entries()
        );
    }
    assert!(report.stats.type_counts.contains_key("snow"));
}

// ---------------------------------------------------------------------------
// 3. Cold January: snow cover within the month, no exceptions
// ---------------------------------------------------------------------------

#[test]
fn test_cold_january_builds_snowpack() {
    let engine = WeatherEngine::default();
    let region = builtin("continental", "continentalSteppe");
    let jan1 = GameDate::new(2025, 1, 1, 0).unwrap();

    let mut covered = false;
    for h in 0..24 * 31 {
        let snow = engine.get_accumulation(&region, jan1.add_hours(h)).unwrap();
        assert!(snow.snow_depth >= 0.0);
        covered |= snow.ground_condition == GroundCondition::SnowCovered;
    }
    assert!(covered, "no snow cover in January");

    let mut runner = BatchRunner::new(engine, vec![region]);
    runner.extend((0..24 * 31).map(|h| BatchJob {
        region: 0,
        date: jan1.add_hours(h),
    }));
    runner.run_to_completion(|_| {});
    assert_eq!(runner.log().exceptions(), 0);
    assert_eq!(runner.log().check_count(CheckKind::Transition), 0);
    assert_eq!(runner.log().check_count(CheckKind::FloodFalsePositive), 0);
}

// ---------------------------------------------------------------------------
// 4. Tropical rainforest at noon for a year
// ---------------------------------------------------------------------------

#[test]
fn test_rainforest_noon_year() {
    let engine = WeatherEngine::default();
    let region = builtin("equatorial", "tropicalRainforest");
    let noon = GameDate::new(2023, 1, 1, 12).unwrap();

    let mut wet_days = 0;
    for day in 0..365 {
        let sample = engine
            .generate_weather(&region, noon.add_hours(24 * day))
            .unwrap();
        assert_ne!(sample.precipitation_type, Some(PrecipitationType::Snow));
        if sample.precipitation {
            wet_days += 1;
        }
    }
    assert!(wet_days >= 365 / 2, "only {wet_days} wet noons");
}
