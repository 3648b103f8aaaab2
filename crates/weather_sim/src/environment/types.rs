//! Hazard levels and the rolling statistics behind them.

use serde::{Deserialize, Serialize};

/// Highest hazard level.
pub const MAX_HAZARD_LEVEL: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HazardKind {
    Drought,
    Flooding,
    HeatWave,
    ColdSnap,
    WildfireRisk,
}

impl HazardKind {
    pub const ALL: [HazardKind; 5] = [
        HazardKind::Drought,
        HazardKind::Flooding,
        HazardKind::HeatWave,
        HazardKind::ColdSnap,
        HazardKind::WildfireRisk,
    ];

    pub fn key(self) -> &'static str {
        match self {
            HazardKind::Drought => "drought",
            HazardKind::Flooding => "flooding",
            HazardKind::HeatWave => "heatWave",
            HazardKind::ColdSnap => "coldSnap",
            HazardKind::WildfireRisk => "wildfireRisk",
        }
    }

    /// Display name of each level, 0 through 4.
    pub fn level_names(self) -> [&'static str; 5] {
        match self {
            HazardKind::Drought => [
                "None",
                "Abnormally Dry",
                "Moderate Drought",
                "Severe Drought",
                "Extreme Drought",
            ],
            HazardKind::Flooding => [
                "None",
                "Flood Watch",
                "Minor Flooding",
                "Moderate Flooding",
                "Major Flooding",
            ],
            HazardKind::HeatWave => [
                "None",
                "Warm Spell",
                "Heat Advisory",
                "Heat Wave",
                "Extreme Heat",
            ],
            HazardKind::ColdSnap => [
                "None",
                "Cool Spell",
                "Cold Advisory",
                "Cold Snap",
                "Extreme Cold",
            ],
            HazardKind::WildfireRisk => ["Low", "Moderate", "High", "Very High", "Extreme"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardLevel {
    pub level: u8,
    pub name: String,
}

impl HazardLevel {
    pub fn new(kind: HazardKind, level: u8) -> Self {
        let level = level.min(MAX_HAZARD_LEVEL);
        Self {
            level,
            name: kind.level_names()[level as usize].to_string(),
        }
    }
}

/// The rolling statistics each level was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalDrivers {
    /// Consecutive completed days below the dry-day threshold.
    pub dry_days: u32,
    /// Dry days that are normal for this region and season.
    pub drought_baseline_days: f32,
    pub hot_days: u32,
    pub cold_days: u32,
    /// Daily high (F) that counts as hot for this region and season.
    pub heat_threshold: f32,
    /// Daily low (F) that counts as cold for this region and season.
    pub cold_threshold: f32,
    /// Inches of snow depth melted over the trailing 72 hours.
    pub melt_72h: f32,
    pub rain_24h: f32,
    pub rain_72h: f32,
    pub snow_depth: f32,
    pub snow_depth_24h_ago: f32,
    /// Mean relative humidity over the last three completed days.
    pub humidity_3d: f32,
    /// Mean daily high over the last three completed days.
    pub high_3d: f32,
    pub wildfire_score: f32,
}

/// Five independent hazard levels for one region and hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalState {
    pub drought: HazardLevel,
    pub flooding: HazardLevel,
    pub heat_wave: HazardLevel,
    pub cold_snap: HazardLevel,
    pub wildfire_risk: HazardLevel,
    pub drivers: EnvironmentalDrivers,
    /// Hours that could not be evaluated while building this state.
    pub replay_gaps: usize,
}

impl EnvironmentalState {
    pub fn get(&self, kind: HazardKind) -> &HazardLevel {
        match kind {
            HazardKind::Drought => &self.drought,
            HazardKind::Flooding => &self.flooding,
            HazardKind::HeatWave => &self.heat_wave,
            HazardKind::ColdSnap => &self.cold_snap,
            HazardKind::WildfireRisk => &self.wildfire_risk,
        }
    }

    /// Hazards whose level is higher here than in `previous`.
    pub fn escalations(&self, previous: &EnvironmentalState) -> Vec<HazardKind> {
        HazardKind::ALL
            .into_iter()
            .filter(|&k| self.get(k).level > previous.get(k).level)
            .collect()
    }
}

/// Weather statistics for one completed calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub high: f32,
    pub low: f32,
    pub mean_humidity: f32,
    /// Liquid-equivalent inches of all precipitation.
    pub liquid: f32,
    /// Liquid inches that fell as rain.
    pub rain: f32,
    /// Hours that could not be generated and were left out.
    pub missing_hours: u32,
}
