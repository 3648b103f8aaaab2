//! Environmental hazards derived from rolling weather and snow history.
//!
//! Five independent 0-4 levels: drought (consecutive dry days against a
//! region's normal dry spell), flooding (snowmelt, rain on snow and heavy
//! rain), heat wave and cold snap (streaks past the region's own 90th and
//! 10th percentiles), and wildfire risk (dryness, humidity, heat and fuel).

pub mod hazards;
pub mod normals;
pub mod service;
mod tests;
pub mod types;

pub use hazards::{FireWeather, FloodInputs};
pub use normals::RegionNormals;
pub use service::EnvironmentalConditionsService;
pub use types::{
    DaySummary, EnvironmentalDrivers, EnvironmentalState, HazardKind, HazardLevel,
    MAX_HAZARD_LEVEL,
};
