//! Unit tests for the environmental conditions service.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::calendar::GameDate;
    use crate::config::{EpochPolicy, HazardConfig, SnowConfig};
    use crate::environment::EnvironmentalConditionsService;
    use crate::error::WeatherError;
    use crate::region::{FactorValue, Region};
    use crate::snow::SnowAccumulationService;
    use crate::test_support::{
        builtin_region, date, dry_sample, frozen_region, scripted, warm_region, wet_sample,
    };
    use crate::weather::{PrecipitationType, WeatherGenerator, WeatherSample, WeatherSource};

    fn services_for(source: Arc<dyn WeatherSource>, snow: SnowConfig) -> EnvironmentalConditionsService {
        let snow = Arc::new(SnowAccumulationService::new(Arc::clone(&source), snow));
        EnvironmentalConditionsService::new(source, snow, HazardConfig::default())
    }

    fn scripted_service<F>(f: F) -> EnvironmentalConditionsService
    where
        F: Fn(i64) -> Result<WeatherSample, WeatherError> + Send + Sync + 'static,
    {
        let snow = SnowConfig {
            epoch: EpochPolicy::Fixed {
                date: date(2024, 1, 1, 0),
            },
            ..Default::default()
        };
        services_for(Arc::new(scripted(f)), snow)
    }

    fn generator_service() -> EnvironmentalConditionsService {
        services_for(Arc::new(WeatherGenerator::default()), SnowConfig::default())
    }

    fn hour_of(d: GameDate) -> i64 {
        d.to_linear_hour()
    }

    // -------------------------------------------------------------------------
    // Day-based hazards
    // -------------------------------------------------------------------------

    #[test]
    fn test_long_dry_spell_reaches_extreme_drought() {
        let service = scripted_service(|_| Ok(dry_sample(70.0)));
        let state = service
            .get_environmental_conditions(&warm_region("dry"), date(2024, 5, 1, 12))
            .unwrap();
        assert_eq!(state.drought.level, 4);
        assert_eq!(state.drought.name, "Extreme Drought");
        assert!(state.drivers.dry_days as f32 >= 3.0 * state.drivers.drought_baseline_days);
    }

    #[test]
    fn test_rain_yesterday_ends_drought() {
        let rainy_day = date(2024, 4, 30, 0).day_number();
        let service = scripted_service(move |hour| {
            if hour.div_euclid(24) == rainy_day {
                Ok(wet_sample(60.0, PrecipitationType::Rain, 0.05))
            } else {
                Ok(dry_sample(70.0))
            }
        });
        let state = service
            .get_environmental_conditions(&warm_region("dry"), date(2024, 5, 1, 12))
            .unwrap();
        assert_eq!(state.drivers.dry_days, 0);
        assert_eq!(state.drought.level, 0);
    }

    #[test]
    fn test_heat_streak_is_region_relative() {
        let service = scripted_service(|_| Ok(dry_sample(95.0)));
        let state = service
            .get_environmental_conditions(&warm_region("hot"), date(2024, 7, 20, 12))
            .unwrap();
        assert_eq!(state.heat_wave.level, 4);
        assert_eq!(state.cold_snap.level, 0);

        // 60F is an ordinary summer day for a warm region but a heat wave
        // on the tundra.
        let mild = scripted_service(|_| Ok(dry_sample(60.0)));
        let warm = mild
            .get_environmental_conditions(&warm_region("mild"), date(2024, 7, 20, 12))
            .unwrap();
        let tundra = mild
            .get_environmental_conditions(&builtin_region("polar", "tundra"), date(2024, 7, 20, 12))
            .unwrap();
        assert_eq!(warm.heat_wave.level, 0);
        assert_eq!(tundra.heat_wave.level, 4);
    }

    #[test]
    fn test_cold_streak() {
        let service = scripted_service(|_| Ok(dry_sample(-10.0)));
        let state = service
            .get_environmental_conditions(&warm_region("cold"), date(2024, 1, 20, 12))
            .unwrap();
        assert_eq!(state.cold_snap.level, 4);
        assert_eq!(state.cold_snap.name, "Extreme Cold");
        assert_eq!(state.heat_wave.level, 0);
    }

    #[test]
    fn test_wildfire_needs_fuel_and_burnable_ground() {
        let service = scripted_service(|_| Ok(dry_sample(95.0)));
        let d = date(2024, 7, 20, 12);
        let forest = warm_region("forest");
        let state = service.get_environmental_conditions(&forest, d).unwrap();
        assert!(state.wildfire_risk.level >= 2, "{:?}", state.drivers);

        let bog = warm_region("bog").with_factor("groundType", FactorValue::Text("Waterlogged".into()));
        let state = service.get_environmental_conditions(&bog, d).unwrap();
        assert_eq!(state.wildfire_risk.level, 0);
        assert_eq!(state.wildfire_risk.name, "Low");
    }

    #[test]
    fn test_day_hazards_hold_through_the_day() {
        let service = generator_service();
        let region = builtin_region("arid", "hotDesert");
        let morning = service
            .get_environmental_conditions(&region, date(2024, 6, 10, 1))
            .unwrap();
        let evening = service
            .get_environmental_conditions(&region, date(2024, 6, 10, 23))
            .unwrap();
        assert_eq!(morning.drought, evening.drought);
        assert_eq!(morning.heat_wave, evening.heat_wave);
        assert_eq!(morning.cold_snap, evening.cold_snap);
    }

    #[test]
    fn test_desert_dryness_is_not_drought() {
        let service = generator_service();
        let region = builtin_region("arid", "hotDesert");
        let mut severe = 0;
        let mut checked = 0;
        for day in (0..365).step_by(5) {
            let d = date(2024, 1, 1, 12).add_hours(24 * day);
            let state = service.get_environmental_conditions(&region, d).unwrap();
            checked += 1;
            if state.drought.level >= 2 {
                severe += 1;
            }
        }
        assert!(severe * 4 < checked, "{severe} of {checked} days in drought");
    }

    // -------------------------------------------------------------------------
    // Flooding
    // -------------------------------------------------------------------------

    #[test]
    fn test_sustained_heavy_rain_floods() {
        let service = scripted_service(|_| Ok(wet_sample(50.0, PrecipitationType::Rain, 0.1)));
        let state = service
            .get_environmental_conditions(&frozen_region("soaked"), date(2024, 1, 4, 0))
            .unwrap();
        assert!((state.drivers.rain_24h - 2.4).abs() < 1e-3);
        assert!((state.drivers.rain_72h - 7.2).abs() < 1e-3);
        assert_eq!(state.flooding.level, 3);
        assert_eq!(state.flooding.name, "Moderate Flooding");
    }

    #[test]
    fn test_frozen_accumulation_does_not_flood() {
        let service = scripted_service(|_| Ok(wet_sample(20.0, PrecipitationType::Snow, 0.1)));
        let state = service
            .get_environmental_conditions(&frozen_region("pack"), date(2024, 1, 4, 0))
            .unwrap();
        assert!(state.drivers.snow_depth > 50.0);
        assert_eq!(state.flooding.level, 0);
    }

    #[test]
    fn test_rapid_melt_raises_flood_alert() {
        let start = hour_of(date(2024, 1, 1, 0));
        let service = scripted_service(move |hour| {
            if hour - start < 20 {
                Ok(wet_sample(20.0, PrecipitationType::Snow, 0.05))
            } else {
                Ok(dry_sample(60.0))
            }
        });
        let state = service
            .get_environmental_conditions(&frozen_region("melt"), date(2024, 1, 2, 12))
            .unwrap();
        assert!(state.drivers.melt_72h > 9.0, "{:?}", state.drivers);
        assert_eq!(state.flooding.level, 2);
    }

    #[test]
    fn test_rain_on_snowpack() {
        let start = hour_of(date(2024, 1, 1, 0));
        let service = scripted_service(move |hour| {
            if hour - start < 40 {
                Ok(wet_sample(20.0, PrecipitationType::Snow, 0.05))
            } else {
                Ok(wet_sample(36.0, PrecipitationType::Rain, 0.06))
            }
        });
        let state = service
            .get_environmental_conditions(&frozen_region("ros"), date(2024, 1, 3, 16))
            .unwrap();
        // A day of steady rain on a two-foot pack.
        assert!(state.drivers.snow_depth_24h_ago >= 2.0);
        assert!(state.flooding.level >= 3, "{:?}", state.drivers);
    }

    // -------------------------------------------------------------------------
    // Errors and caching
    // -------------------------------------------------------------------------

    #[test]
    fn test_failed_hours_are_counted_not_fatal() {
        let bad_day = date(2024, 3, 1, 0).day_number();
        let service = scripted_service(move |hour| {
            if hour.div_euclid(24) == bad_day && hour.rem_euclid(24) < 3 {
                Err(WeatherError::Config("scripted failure".into()))
            } else {
                Ok(dry_sample(70.0))
            }
        });
        let state = service
            .get_environmental_conditions(&warm_region("flaky"), date(2024, 3, 2, 12))
            .unwrap();
        assert!(state.replay_gaps >= 3);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let service = generator_service();
        let bad = GameDate {
            year: 2023,
            month: 2,
            day: 29,
            hour: 0,
        };
        assert!(matches!(
            service.get_environmental_conditions(&warm_region("x"), bad),
            Err(WeatherError::InvalidDate { field: "day", .. })
        ));
    }

    #[test]
    fn test_results_survive_cache_clear() {
        let service = generator_service();
        let region: Region = builtin_region("temperate", "deciduousForest");
        let d = date(2024, 9, 9, 9);
        let before = service.get_environmental_conditions(&region, d).unwrap();
        service.clear_cache(None);
        assert_eq!(before, service.get_environmental_conditions(&region, d).unwrap());
    }
}
