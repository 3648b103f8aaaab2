use std::sync::Arc;

use bevy::prelude::*;

use crate::calendar::GameDate;
use crate::config::SimConfig;
use crate::environment::{EnvironmentalConditionsService, EnvironmentalState};
use crate::error::WeatherError;
use crate::region::Region;
use crate::snow::{SnowAccumulationService, SnowState};
use crate::weather::{WeatherGenerator, WeatherSample, WeatherSource};

/// One simulation instance: the generator and the two services layered on
/// it, sharing a single weather cache. Cloning shares the caches.
#[derive(Resource, Clone)]
pub struct WeatherEngine {
    config: Arc<SimConfig>,
    generator: Arc<WeatherGenerator>,
    snow: Arc<SnowAccumulationService>,
    environment: Arc<EnvironmentalConditionsService>,
}

impl Default for WeatherEngine {
    fn default() -> Self {
        Self::build(SimConfig::default())
    }
}

impl WeatherEngine {
    /// Build an engine after checking `config`. Degenerate block or cache
    /// sizes would otherwise fail on the first query.
    pub fn new(config: SimConfig) -> Result<Self, WeatherError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimConfig) -> Self {
        let generator = Arc::new(WeatherGenerator::new(config.generator.clone()));
        let source: Arc<dyn WeatherSource> = generator.clone();
        let snow = Arc::new(SnowAccumulationService::new(
            Arc::clone(&source),
            config.snow.clone(),
        ));
        let environment = Arc::new(EnvironmentalConditionsService::new(
            source,
            Arc::clone(&snow),
            config.hazards.clone(),
        ));
        Self {
            config: Arc::new(config),
            generator,
            snow,
            environment,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn generator(&self) -> &WeatherGenerator {
        &self.generator
    }

    pub fn snow(&self) -> &SnowAccumulationService {
        &self.snow
    }

    pub fn environment(&self) -> &EnvironmentalConditionsService {
        &self.environment
    }

    pub fn generate_weather(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<WeatherSample, WeatherError> {
        self.generator.generate_weather(region, date)
    }

    pub fn get_accumulation(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<SnowState, WeatherError> {
        self.snow.get_accumulation(region, date)
    }

    pub fn get_environmental_conditions(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<EnvironmentalState, WeatherError> {
        self.environment.get_environmental_conditions(region, date)
    }

    /// Drop every cache for one region, or for all regions.
    pub fn clear_cache(&self, region_id: Option<&str>) {
        self.generator.clear_cache(region_id);
        self.snow.clear_cache(region_id);
        self.environment.clear_cache(region_id);
    }
}
