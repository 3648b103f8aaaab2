//! Hourly weather generation.
//!
//! `WeatherGenerator` maps a region and an hour to a `WeatherSample`:
//! seasonal interpolation of the region's climate profile, diurnal
//! modulation, seeded anomalies, slot-based precipitation and a
//! precipitation-type state machine with hysteresis. Results are
//! deterministic in `(region.id, hour)` and memoized per region.

pub mod atmosphere;
pub mod generator;
pub mod phase;
pub mod types;

pub use atmosphere::{diurnal_factor, feels_like, heat_index, PrecipitationClimatology};
pub use generator::{guarded_generate, WeatherGenerator, WeatherSource};
pub use phase::{PhaseDecision, PrecipitationState};
pub use types::{
    PrecipitationIntensity, PrecipitationType, ThunderstormSeverity, WeatherCondition,
    WeatherSample, WindIntensity,
};
