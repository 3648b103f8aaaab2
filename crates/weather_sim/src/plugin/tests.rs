//! Unit and ECS tests for the weather plugin.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::climate::{ClimateProfile, SeasonalValue};
    use crate::config::SimConfig;
    use crate::engine::WeatherEngine;
    use crate::environment::HazardKind;
    use crate::plugin::{
        describe_change, snapshot, ConditionsChangedEvent, RegionConditions, TrackedRegions,
        WeatherSimPlugin, WorldCalendar,
    };
    use crate::region::Region;
    use crate::test_support::{builtin_region, date};

    // -------------------------------------------------------------------------
    // Pure helpers
    // -------------------------------------------------------------------------

    #[test]
    fn test_first_snapshot_always_reported() {
        let engine = WeatherEngine::default();
        let region = builtin_region("temperate", "deciduousForest");
        let current = snapshot(&engine, &region, date(2024, 3, 3, 3)).unwrap();
        let event = describe_change(&region.id, None, &current).unwrap();
        assert_eq!(event.previous_condition, None);
        assert_eq!(event.condition, current.weather.condition);
        assert!(event.escalated.is_empty());
    }

    #[test]
    fn test_unchanged_snapshot_is_quiet() {
        let engine = WeatherEngine::default();
        let region = builtin_region("temperate", "deciduousForest");
        let current = snapshot(&engine, &region, date(2024, 3, 3, 3)).unwrap();
        assert!(describe_change(&region.id, Some(&current), &current).is_none());
    }

    #[test]
    fn test_escalation_is_reported() {
        let engine = WeatherEngine::default();
        let region = builtin_region("arid", "hotDesert");
        let previous = snapshot(&engine, &region, date(2024, 7, 3, 12)).unwrap();
        let mut current = previous.clone();
        current.hazards.heat_wave.level = previous.hazards.heat_wave.level + 1;
        let event = describe_change(&region.id, Some(&previous), &current).unwrap();
        assert_eq!(event.escalated, vec![HazardKind::HeatWave]);
        assert_eq!(event.previous_condition, Some(previous.weather.condition));
    }

    // -------------------------------------------------------------------------
    // ECS
    // -------------------------------------------------------------------------

    fn weather_test_app(region: Region) -> App {
        let mut app = App::new();
        app.add_plugins(WeatherSimPlugin::default());
        app.insert_resource(WorldCalendar::starting_at(date(2024, 1, 10, 0)));
        app.world_mut()
            .resource_mut::<TrackedRegions>()
            .track(region);
        app
    }

    fn tick(app: &mut App) {
        app.world_mut().run_schedule(FixedUpdate);
    }

    fn sent_events(app: &App) -> Vec<ConditionsChangedEvent> {
        let events = app.world().resource::<Events<ConditionsChangedEvent>>();
        let mut reader = events.get_cursor();
        reader.read(events).cloned().collect()
    }

    #[test]
    fn test_tick_advances_calendar_and_refreshes() {
        let mut app = weather_test_app(builtin_region("subarctic", "borealForest"));
        tick(&mut app);

        assert_eq!(app.world().resource::<WorldCalendar>().date, date(2024, 1, 10, 1));
        let conditions = app.world().resource::<RegionConditions>();
        let snap = conditions.get("borealForest").unwrap();
        assert_eq!(snap.date, date(2024, 1, 10, 1));

        let engine = app.world().resource::<WeatherEngine>();
        let region = builtin_region("subarctic", "borealForest");
        assert_eq!(
            snap.weather,
            engine.generate_weather(&region, date(2024, 1, 10, 1)).unwrap()
        );

        let events = sent_events(&app);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].region_id, "borealForest");
    }

    #[test]
    fn test_paused_calendar_skips_refresh() {
        let mut app = weather_test_app(builtin_region("temperate", "deciduousForest"));
        tick(&mut app);
        app.world_mut().resource_mut::<WorldCalendar>().paused = true;
        tick(&mut app);
        tick(&mut app);

        assert_eq!(app.world().resource::<WorldCalendar>().date, date(2024, 1, 10, 1));
        assert_eq!(sent_events(&app).len(), 1);
    }

    #[test]
    fn test_multi_hour_ticks() {
        let mut app = weather_test_app(builtin_region("temperate", "deciduousForest"));
        app.world_mut().resource_mut::<WorldCalendar>().hours_per_tick = 6;
        for _ in 0..4 {
            tick(&mut app);
        }
        assert_eq!(app.world().resource::<WorldCalendar>().date, date(2024, 1, 11, 0));
        let snap = app
            .world()
            .resource::<RegionConditions>()
            .get("deciduousForest")
            .cloned()
            .unwrap();
        assert_eq!(snap.date, date(2024, 1, 11, 0));
    }

    #[test]
    fn test_failed_region_keeps_others_running() {
        let mut climate = ClimateProfile::temperate();
        climate.temperature.winter = SeasonalValue::new(f32::NAN, 5.0);
        climate.temperature.spring = SeasonalValue::new(f32::NAN, 5.0);
        climate.temperature.summer = SeasonalValue::new(f32::NAN, 5.0);
        climate.temperature.fall = SeasonalValue::new(f32::NAN, 5.0);
        let broken = Region::new("broken", "temperate", climate);

        let mut app = weather_test_app(broken);
        app.world_mut()
            .resource_mut::<TrackedRegions>()
            .track(builtin_region("temperate", "deciduousForest"));
        tick(&mut app);

        let conditions = app.world().resource::<RegionConditions>();
        assert!(conditions.get("broken").is_none());
        assert!(conditions.get("deciduousForest").is_some());
        assert_eq!(conditions.failed_refreshes, 1);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let mut config = SimConfig::default();
        config.generator.block_hours = 0;
        let mut app = App::new();
        app.add_plugins(WeatherSimPlugin { config });
        assert_eq!(*app.world().resource::<SimConfig>(), SimConfig::default());

        app.world_mut()
            .resource_mut::<TrackedRegions>()
            .track(builtin_region("temperate", "deciduousForest"));
        tick(&mut app);
        let conditions = app.world().resource::<RegionConditions>();
        assert!(conditions.get("deciduousForest").is_some());
        assert_eq!(conditions.failed_refreshes, 0);
    }

    #[test]
    fn test_tracking_replaces_by_id() {
        let mut tracked = TrackedRegions::default();
        tracked.track(builtin_region("temperate", "deciduousForest"));
        let mut moved = builtin_region("temperate", "deciduousForest");
        moved.elevation = 1500.0;
        tracked.track(moved);
        assert_eq!(tracked.len(), 1);
        assert!((tracked.get("deciduousForest").unwrap().elevation - 1500.0).abs() < f32::EPSILON);
        assert!(tracked.untrack("deciduousForest").is_some());
        assert!(tracked.is_empty());
    }
}
