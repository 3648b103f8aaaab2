//! Climate-driven weather for fantasy regions.
//!
//! Three query services sit on top of each other: `WeatherGenerator` turns a
//! region's climate profile into deterministic hourly samples,
//! `SnowAccumulationService` replays those samples into snow and ice on the
//! ground, and `EnvironmentalConditionsService` derives drought, flooding,
//! heat wave, cold snap and wildfire levels from the rolling history.
//! `WeatherEngine` bundles the three, `validation` checks their contract, and
//! `WeatherSimPlugin` drives them from an ECS app.

pub mod calendar;
pub mod climate;
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod plugin;
pub mod region;
pub mod rng;
pub mod snow;
pub mod validation;
pub mod weather;

#[cfg(test)]
mod test_support;

pub use calendar::{GameDate, Season};
pub use config::SimConfig;
pub use engine::WeatherEngine;
pub use error::{MissingProfileField, ReplayGap, WeatherError};
pub use plugin::WeatherSimPlugin;
pub use region::Region;
