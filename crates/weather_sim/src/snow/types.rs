//! Snow and ground-state value types.

use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::weather::PrecipitationType;

/// Derived terrain state, from highest to lowest priority: snow cover,
/// ice, frozen, thawing, muddy, dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroundCondition {
    #[default]
    Dry,
    Muddy,
    Thawing,
    Frozen,
    Icy,
    SnowCovered,
}

impl GroundCondition {
    pub fn name(self) -> &'static str {
        match self {
            GroundCondition::Dry => "dry",
            GroundCondition::Muddy => "muddy",
            GroundCondition::Thawing => "thawing",
            GroundCondition::Frozen => "frozen",
            GroundCondition::Icy => "icy",
            GroundCondition::SnowCovered => "snowCovered",
        }
    }
}

/// Snowpack and ice on the ground at one hour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowState {
    /// Inches of snow on the ground.
    pub snow_depth: f32,
    /// Inches of glaze ice.
    pub ice_accumulation: f32,
    pub ground_condition: GroundCondition,
    /// Hours since the epoch that could not be evaluated.
    pub replay_gaps: usize,
}

impl SnowState {
    /// Bare, dry ground with no history.
    pub fn bare() -> Self {
        Self::default()
    }
}

/// What happened to the ground during one replayed hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourRecord {
    pub date: GameDate,
    /// Linear hour of `date`.
    pub hour: i64,
    /// Snow depth at the end of the hour (in).
    pub depth: f32,
    /// Ice accumulation at the end of the hour (in).
    pub ice: f32,
    /// Snow depth added this hour (in).
    pub snowfall: f32,
    /// Snow depth removed by melt this hour (in).
    pub snow_melt: f32,
    pub ice_melt: f32,
    /// Liquid inches that fell as rain.
    pub rain: f32,
    /// Liquid-equivalent inches of all precipitation.
    pub liquid: f32,
    pub temperature: f32,
    pub precipitation_type: Option<PrecipitationType>,
    /// The hour was substituted because the weather could not be generated.
    pub gap: bool,
}
