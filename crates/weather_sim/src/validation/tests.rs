//! Unit tests for the batch runner and validation suite.

#[cfg(test)]
mod tests {
    use crate::calendar::GameDate;
    use crate::config::SimConfig;
    use crate::engine::WeatherEngine;
    use crate::test_support::{builtin_region, date, hours_from};
    use crate::validation::{
        BatchJob, BatchRunner, CheckKind, Severity, ValidationLog, ValidationSuite,
    };

    fn engine_with_chunk(chunk_size: usize) -> WeatherEngine {
        let mut config = SimConfig::default();
        config.batch.chunk_size = chunk_size;
        WeatherEngine::new(config).unwrap()
    }

    fn jobs(region: usize, start: GameDate, hours: i64) -> Vec<BatchJob> {
        hours_from(start, hours)
            .map(|date| BatchJob { region, date })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Chunked execution
    // -------------------------------------------------------------------------

    #[test]
    fn test_chunks_are_bounded_and_report_progress() {
        let region = builtin_region("temperate", "deciduousForest");
        let mut runner = BatchRunner::new(engine_with_chunk(5), vec![region]);
        runner.extend(jobs(0, date(2024, 4, 1, 0), 12));

        let mut reports = Vec::new();
        let first = runner.run_chunk(|p| reports.push(*p));
        assert_eq!(first.processed, 5);
        assert_eq!(first.total, 12);
        assert!(!first.is_done());

        runner.run_to_completion(|p| reports.push(*p));
        assert!(runner.is_done());
        let processed: Vec<usize> = reports.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![5, 10, 12]);
        assert!((reports[2].fraction() - 1.0).abs() < f32::EPSILON);
        assert_eq!(runner.stats().samples, 12);
    }

    #[test]
    fn test_failed_jobs_do_not_stop_the_batch() {
        let region = builtin_region("temperate", "deciduousForest");
        let mut runner = BatchRunner::new(engine_with_chunk(64), vec![region]);
        runner.extend(jobs(0, date(2024, 4, 1, 0), 4));
        runner.push(BatchJob {
            region: 0,
            date: GameDate {
                year: 2024,
                month: 2,
                day: 30,
                hour: 0,
            },
        });
        runner.push(BatchJob {
            region: 7,
            date: date(2024, 4, 1, 5),
        });
        runner.extend(jobs(0, date(2024, 4, 1, 4), 4));
        runner.run_to_completion(|_| {});

        let stats = runner.stats();
        assert_eq!(stats.samples, 8);
        assert_eq!(stats.failed_jobs, 2);
        assert_eq!(runner.log().exceptions(), 2);
        assert!(runner
            .log()
            .entries()
            .iter()
            .any(|e| e.severity == Severity::Exception && e.message.contains("day")));
    }

    #[test]
    fn test_stats_aggregate_samples() {
        let region = builtin_region("equatorial", "tropicalRainforest");
        let mut runner = BatchRunner::new(engine_with_chunk(256), vec![region]);
        runner.extend(jobs(0, date(2024, 6, 1, 0), 24 * 14));
        runner.run_to_completion(|_| {});

        let stats = runner.stats();
        assert_eq!(stats.samples, 24 * 14);
        assert!(stats.precipitation_hours > 0);
        assert_eq!(
            stats.type_counts.values().sum::<usize>(),
            stats.precipitation_hours
        );
        assert!(!stats.type_counts.contains_key("snow"));
        let (min, max) = (stats.min_temperature.unwrap(), stats.max_temperature.unwrap());
        assert!(min <= max);
        assert_eq!(stats.hazard_max.len(), 5);
        assert!(runner.log().is_clean(), "{:?}", runner.log().entries());
    }

    // -------------------------------------------------------------------------
    // Suite
    // -------------------------------------------------------------------------

    #[test]
    fn test_year_scan_job_count() {
        let suite = ValidationSuite::new(2023, 6);
        let jobs = suite.year_scan(2);
        assert_eq!(jobs.len(), 2 * 365 * 4);
        assert_eq!(jobs[0].date, date(2023, 1, 1, 0));
        assert_eq!(jobs[1].date, date(2023, 1, 1, 6));
        assert_eq!(jobs[365 * 4].region, 1);

        let leap = ValidationSuite::new(2024, 1).year_scan(1);
        assert_eq!(leap.len(), 366 * 24);
        assert_eq!(leap.last().unwrap().date, date(2024, 12, 31, 23));
    }

    #[test]
    fn test_cold_january_scan_is_clean() {
        let engine = WeatherEngine::default();
        let region = builtin_region("continental", "continentalSteppe");
        let mut runner = BatchRunner::new(engine.clone(), vec![region.clone()]);
        runner.extend(jobs(0, date(2024, 1, 1, 0), 24 * 31));
        runner.run_to_completion(|_| {});

        let log = runner.log();
        assert_eq!(log.exceptions(), 0);
        for check in [
            CheckKind::Range,
            CheckKind::PrecipitationBand,
            CheckKind::Transition,
            CheckKind::SnowDepth,
            CheckKind::FloodFalsePositive,
            CheckKind::FloodMissedAlert,
            CheckKind::Determinism,
        ] {
            assert_eq!(log.check_count(check), 0, "{check:?}: {:?}", log.entries());
        }
        assert!(runner.stats().max_snow_depth >= 0.5);
        assert_eq!(runner.stats().failed_jobs, 0);
    }

    #[test]
    fn test_seasonal_boundaries_are_smooth() {
        let engine = WeatherEngine::default();
        let suite = ValidationSuite::new(2024, 1);
        let mut log = ValidationLog::default();
        for region in [
            builtin_region("temperate", "mediterraneanCoast"),
            builtin_region("temperate", "deciduousForest"),
        ] {
            suite.seasonal_checks(&engine, &region, &mut log).unwrap();
        }
        assert_eq!(log.check_count(CheckKind::SeasonalChange), 0, "{:?}", log.entries());
    }

    #[test]
    fn test_run_produces_serializable_report() {
        let suite = ValidationSuite::new(2024, 24);
        let report = suite.run(
            engine_with_chunk(100),
            vec![builtin_region("arid", "hotDesert")],
        );
        assert_eq!(report.regions, vec!["hotDesert".to_string()]);
        assert_eq!(report.stats.samples, 366);
        assert!(report.passed(), "{:?}", report.log.entries());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"hazardMax\""));
    }
}
