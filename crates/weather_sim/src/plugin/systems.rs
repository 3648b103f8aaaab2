//! Calendar and region refresh systems.

use bevy::prelude::*;

use crate::calendar::GameDate;
use crate::engine::WeatherEngine;
use crate::error::WeatherError;
use crate::region::Region;

use super::types::{
    ConditionsChangedEvent, RegionConditions, RegionSnapshot, TrackedRegions, WorldCalendar,
};

// =============================================================================
// Pure helper functions (testable without ECS)
// =============================================================================

/// Query all three services for one region and hour.
pub fn snapshot(
    engine: &WeatherEngine,
    region: &Region,
    date: GameDate,
) -> Result<RegionSnapshot, WeatherError> {
    Ok(RegionSnapshot {
        date,
        weather: engine.generate_weather(region, date)?,
        snow: engine.get_accumulation(region, date)?,
        hazards: engine.get_environmental_conditions(region, date)?,
    })
}

/// The event worth sending for `current`, if anything noticeable changed
/// since `previous`.
pub fn describe_change(
    region_id: &str,
    previous: Option<&RegionSnapshot>,
    current: &RegionSnapshot,
) -> Option<ConditionsChangedEvent> {
    let escalated = previous
        .map(|p| current.hazards.escalations(&p.hazards))
        .unwrap_or_default();
    let changed = match previous {
        None => true,
        Some(p) => {
            p.weather.condition != current.weather.condition
                || p.snow.ground_condition != current.snow.ground_condition
                || !escalated.is_empty()
        }
    };
    changed.then(|| ConditionsChangedEvent {
        region_id: region_id.to_string(),
        date: current.date,
        condition: current.weather.condition,
        previous_condition: previous.map(|p| p.weather.condition),
        ground: current.snow.ground_condition,
        escalated,
    })
}

// =============================================================================
// Systems
// =============================================================================

pub fn advance_calendar(mut calendar: ResMut<WorldCalendar>) {
    if calendar.paused {
        return;
    }
    let step = calendar.hours_per_tick;
    calendar.date = calendar.date.add_hours(step);
}

/// Refresh every tracked region whose snapshot is older than the calendar.
/// A failed refresh keeps the previous snapshot.
pub fn refresh_region_conditions(
    engine: Res<WeatherEngine>,
    calendar: Res<WorldCalendar>,
    regions: Res<TrackedRegions>,
    mut conditions: ResMut<RegionConditions>,
    mut events: EventWriter<ConditionsChangedEvent>,
) {
    let date = calendar.date;
    for region in regions.iter() {
        if conditions.get(&region.id).is_some_and(|s| s.date == date) {
            continue;
        }
        let current = match snapshot(&engine, region, date) {
            Ok(s) => s,
            Err(e) => {
                warn!("refreshing region '{}' at {date} failed: {e}", region.id);
                conditions.failed_refreshes += 1;
                continue;
            }
        };
        if let Some(event) = describe_change(&region.id, conditions.get(&region.id), &current) {
            debug!(
                "region '{}' now {} on {} ground",
                region.id,
                event.condition.name(),
                event.ground.name()
            );
            events.send(event);
        }
        conditions.insert(&region.id, current);
    }
}
