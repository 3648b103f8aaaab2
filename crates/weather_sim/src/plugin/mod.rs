//! ECS integration.
//!
//! `WeatherSimPlugin` installs a `WeatherEngine` built from a `SimConfig`,
//! an in-game `WorldCalendar`, and a set of `TrackedRegions`. Each fixed
//! tick advances the calendar and refreshes the conditions of every tracked
//! region, sending a `ConditionsChangedEvent` when the sky or the ground
//! changes or a hazard escalates.

pub mod systems;
mod tests;
pub mod types;

pub use systems::{advance_calendar, describe_change, refresh_region_conditions, snapshot};
pub use types::{
    ConditionsChangedEvent, RegionConditions, RegionSnapshot, TrackedRegions, WorldCalendar,
};

use bevy::prelude::*;

use crate::config::SimConfig;
use crate::engine::WeatherEngine;

#[derive(Default)]
pub struct WeatherSimPlugin {
    pub config: SimConfig,
}

impl Plugin for WeatherSimPlugin {
    fn build(&self, app: &mut App) {
        let (config, engine) = match WeatherEngine::new(self.config.clone()) {
            Ok(engine) => (self.config.clone(), engine),
            Err(e) => {
                warn!("invalid weather config ({e}), using defaults");
                (SimConfig::default(), WeatherEngine::default())
            }
        };
        app.insert_resource(config)
            .insert_resource(engine)
            .init_resource::<WorldCalendar>()
            .init_resource::<TrackedRegions>()
            .init_resource::<RegionConditions>()
            .add_event::<ConditionsChangedEvent>()
            .add_systems(
                FixedUpdate,
                (advance_calendar, refresh_region_conditions).chain(),
            );
    }
}
