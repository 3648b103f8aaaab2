//! Regions: an id, a latitude band, a resolved climate profile and the
//! special factors that modulate generation.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::climate::{ClimateProfile, ClimateTemplate, TemplateLibrary};
use crate::error::{MissingProfileField, WeatherError};

/// A special factor value: flag, number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Bool(bool),
    Number(f32),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecialFactors(pub BTreeMap<String, FactorValue>);

impl SpecialFactors {
    pub fn insert(&mut self, key: impl Into<String>, value: FactorValue) {
        self.0.insert(key.into(), value);
    }

    /// `true` for `true` or any positive number.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(FactorValue::Bool(b)) => *b,
            Some(FactorValue::Number(n)) => *n > 0.0,
            _ => false,
        }
    }

    /// Numbers as-is; flags read as 1.0 / 0.0.
    pub fn number(&self, key: &str) -> Option<f32> {
        match self.0.get(key) {
            Some(FactorValue::Number(n)) if n.is_finite() => Some(*n),
            Some(FactorValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FactorValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Lower-cased `groundType`, if any.
    pub fn ground_type(&self) -> Option<String> {
        self.text("groundType").map(|s| s.to_ascii_lowercase())
    }
}

/// Immutable for the lifetime of a simulation run. Change a region by
/// building a new one and clearing the services' caches for its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub latitude_band: String,
    pub climate: ClimateProfile,
    #[serde(default)]
    pub latitude: f32,
    /// Feet above sea level.
    #[serde(default)]
    pub elevation: f32,
    /// 0 = deep continental interior, 1 = open ocean exposure.
    #[serde(default = "default_maritime")]
    pub maritime_influence: f32,
    #[serde(default = "default_roughness")]
    pub terrain_roughness: f32,
    #[serde(default)]
    pub special_factors: SpecialFactors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biome: Option<String>,
    /// Profile entries that were filled from defaults when the region was built.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile_fallbacks: Vec<MissingProfileField>,
}

fn default_maritime() -> f32 {
    0.5
}

fn default_roughness() -> f32 {
    0.3
}

impl Region {
    pub fn new(id: impl Into<String>, latitude_band: impl Into<String>, climate: ClimateProfile) -> Self {
        Self {
            id: id.into(),
            latitude_band: latitude_band.into(),
            climate,
            latitude: 45.0,
            elevation: 0.0,
            maritime_influence: default_maritime(),
            terrain_roughness: default_roughness(),
            special_factors: SpecialFactors::default(),
            biome: None,
            profile_fallbacks: Vec::new(),
        }
    }

    pub fn with_factor(mut self, key: &str, value: FactorValue) -> Self {
        self.special_factors.insert(key, value);
        self
    }

    /// Build a region from an authored template. Profile gaps are filled
    /// from defaults and logged.
    pub fn from_template(
        id: impl Into<String>,
        latitude_band: impl Into<String>,
        template: &ClimateTemplate,
    ) -> Self {
        let id = id.into();
        let params = &template.parameters;
        let (climate, missing) = ClimateProfile::resolve(&params.profile_spec());
        for field in &missing {
            warn!("region '{}': {}", id, field);
        }
        Self {
            id,
            latitude_band: latitude_band.into(),
            climate,
            latitude: params.latitude,
            elevation: params.elevation,
            maritime_influence: params.maritime_influence.clamp(0.0, 1.0),
            terrain_roughness: params.terrain_roughness.clamp(0.0, 1.0),
            special_factors: params.special_factors.clone(),
            biome: template.default_biome.clone(),
            profile_fallbacks: missing,
        }
    }

    pub fn from_library(
        id: impl Into<String>,
        library: &TemplateLibrary,
        latitude_band: &str,
        template_id: &str,
    ) -> Result<Self, WeatherError> {
        let template = library.get(latitude_band, template_id)?;
        Ok(Self::from_template(id, latitude_band, template))
    }

    /// Convenience accessor with a default for absent factors.
    pub fn factor_or(&self, key: &str, default: f32) -> f32 {
        self.special_factors.number(key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_accessors() {
        let mut f = SpecialFactors::default();
        f.insert("highDiurnalVariation", FactorValue::Bool(true));
        f.insert("thunderstorms", FactorValue::Number(0.7));
        f.insert("groundType", FactorValue::Text("Permafrost".into()));

        assert!(f.flag("highDiurnalVariation"));
        assert!(f.flag("thunderstorms"));
        assert!(!f.flag("missing"));
        assert_eq!(f.number("thunderstorms"), Some(0.7));
        assert_eq!(f.number("highDiurnalVariation"), Some(1.0));
        assert_eq!(f.ground_type().as_deref(), Some("permafrost"));
        assert_eq!(f.text("thunderstorms"), None);
    }

    #[test]
    fn test_factors_deserialize_mixed_json() {
        let f: SpecialFactors = serde_json::from_str(
            r#"{"forestDensity": 0.8, "highWinds": true, "groundType": "sand"}"#,
        )
        .unwrap();
        assert_eq!(f.number("forestDensity"), Some(0.8));
        assert!(f.flag("highWinds"));
        assert_eq!(f.text("groundType"), Some("sand"));
    }

    #[test]
    fn test_region_builder_defaults() {
        let r = Region::new("r1", "temperate", ClimateProfile::temperate())
            .with_factor("forestDensity", FactorValue::Number(0.4));
        assert_eq!(r.id, "r1");
        assert!((r.factor_or("forestDensity", 0.0) - 0.4).abs() < f32::EPSILON);
        assert!((r.factor_or("absent", 2.5) - 2.5).abs() < f32::EPSILON);
        assert!(r.profile_fallbacks.is_empty());
    }

    #[test]
    fn test_region_from_library_unknown_template() {
        let lib = TemplateLibrary::builtin();
        let err = Region::from_library("x", &lib, "temperate", "nope").unwrap_err();
        assert!(matches!(err, WeatherError::UnknownTemplate { .. }));
    }

    #[test]
    fn test_region_from_builtin_template() {
        let lib = TemplateLibrary::builtin();
        let r = Region::from_library("steppe", &lib, "continental", "continentalSteppe").unwrap();
        assert_eq!(r.latitude_band, "continental");
        assert!((r.climate.temperature.winter.mean - 20.0).abs() < f32::EPSILON);
        assert!(r.profile_fallbacks.is_empty());
    }
}
