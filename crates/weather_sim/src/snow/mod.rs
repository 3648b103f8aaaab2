//! Snow and ice accumulation.
//!
//! Snow depth is path-dependent, so every query replays hourly weather
//! from a season start (August 1 by default, two seasons before the one
//! being asked about, so packs that survive summer carry over). Snow adds
//! `rate x ratio` inches per snowy hour, warm hours melt the pack in
//! proportion to degrees above freezing, and freezing rain and sleet glaze
//! the ground with ice. Hours the generator cannot produce are recorded as
//! `ReplayGap`s and replayed as dry, unchanged hours.

pub mod accumulation;
pub mod service;
pub mod types;

pub use accumulation::{epoch_for, ground_condition, AccumulationState, RecentWeather};
pub use service::SnowAccumulationService;
pub use types::{GroundCondition, HourRecord, SnowState};
