//! ECS resources and events for tracked regions.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::environment::{EnvironmentalState, HazardKind};
use crate::region::Region;
use crate::snow::{GroundCondition, SnowState};
use crate::weather::{WeatherCondition, WeatherSample};

/// The in-game clock driving region refreshes.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldCalendar {
    pub date: GameDate,
    /// Game hours advanced per fixed tick.
    pub hours_per_tick: i64,
    pub paused: bool,
}

impl Default for WorldCalendar {
    fn default() -> Self {
        Self::starting_at(GameDate {
            year: 2024,
            month: 1,
            day: 1,
            hour: 0,
        })
    }
}

impl WorldCalendar {
    pub fn starting_at(date: GameDate) -> Self {
        Self {
            date,
            hours_per_tick: 1,
            paused: false,
        }
    }
}

/// Regions whose conditions are refreshed every tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct TrackedRegions {
    regions: Vec<Region>,
}

impl TrackedRegions {
    /// Track `region`, replacing any tracked region with the same id.
    pub fn track(&mut self, region: Region) {
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    pub fn untrack(&mut self, region_id: &str) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == region_id)?;
        Some(self.regions.remove(index))
    }

    pub fn get(&self, region_id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == region_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Everything known about one region at one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSnapshot {
    pub date: GameDate,
    pub weather: WeatherSample,
    pub snow: SnowState,
    pub hazards: EnvironmentalState,
}

/// Latest snapshot per tracked region.
#[derive(Resource, Debug, Clone, Default)]
pub struct RegionConditions {
    by_region: HashMap<String, RegionSnapshot>,
    /// Region refreshes that failed and kept their previous snapshot.
    pub failed_refreshes: u32,
}

impl RegionConditions {
    pub fn get(&self, region_id: &str) -> Option<&RegionSnapshot> {
        self.by_region.get(region_id)
    }

    pub fn insert(&mut self, region_id: &str, snapshot: RegionSnapshot) -> Option<RegionSnapshot> {
        self.by_region.insert(region_id.to_string(), snapshot)
    }

    pub fn remove(&mut self, region_id: &str) -> Option<RegionSnapshot> {
        self.by_region.remove(region_id)
    }

    pub fn len(&self) -> usize {
        self.by_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_region.is_empty()
    }
}

/// Fired when a region's sky or ground changes, or a hazard escalates.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ConditionsChangedEvent {
    pub region_id: String,
    pub date: GameDate,
    pub condition: WeatherCondition,
    /// `None` the first time a region is seen.
    pub previous_condition: Option<WeatherCondition>,
    pub ground: GroundCondition,
    /// Hazards whose level rose since the previous snapshot.
    pub escalated: Vec<HazardKind>,
}
