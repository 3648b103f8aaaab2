//! Authoring format for region climates:
//! `latitudeBand -> templateId -> ClimateTemplate`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::profile::{ClimateProfileSpec, SeasonalTableSpec};
use crate::error::WeatherError;
use crate::region::SpecialFactors;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateParameters {
    pub latitude: f32,
    pub elevation: f32,
    pub maritime_influence: f32,
    pub terrain_roughness: f32,
    pub special_factors: SpecialFactors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_profile: Option<SeasonalTableSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_profile: Option<SeasonalTableSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point_profile: Option<SeasonalTableSpec>,
}

impl Default for TemplateParameters {
    fn default() -> Self {
        Self {
            latitude: 45.0,
            elevation: 0.0,
            maritime_influence: 0.5,
            terrain_roughness: 0.3,
            special_factors: SpecialFactors::default(),
            temperature_profile: None,
            humidity_profile: None,
            dew_point_profile: None,
        }
    }
}

impl TemplateParameters {
    pub fn profile_spec(&self) -> ClimateProfileSpec {
        ClimateProfileSpec {
            temperature: self.temperature_profile.clone(),
            humidity: self.humidity_profile.clone(),
            dew_point: self.dew_point_profile.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: TemplateParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_biome: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateLibrary {
    bands: BTreeMap<String, BTreeMap<String, ClimateTemplate>>,
}

impl TemplateLibrary {
    pub fn from_json_str(json: &str) -> Result<Self, WeatherError> {
        let library: TemplateLibrary =
            serde_json::from_str(json).map_err(|e| WeatherError::Template(e.to_string()))?;
        for (band, templates) in &library.bands {
            for (id, template) in templates {
                if template.name.trim().is_empty() {
                    return Err(WeatherError::Template(format!(
                        "template {band}/{id} has an empty name"
                    )));
                }
            }
        }
        Ok(library)
    }

    pub fn to_json_string(&self) -> Result<String, WeatherError> {
        serde_json::to_string_pretty(self).map_err(|e| WeatherError::Template(e.to_string()))
    }

    pub fn insert(&mut self, band: &str, id: &str, template: ClimateTemplate) {
        self.bands
            .entry(band.to_string())
            .or_default()
            .insert(id.to_string(), template);
    }

    /// Later entries win when both libraries define the same band and id.
    pub fn merge(&mut self, other: TemplateLibrary) {
        for (band, templates) in other.bands {
            self.bands.entry(band).or_default().extend(templates);
        }
    }

    pub fn get(&self, band: &str, id: &str) -> Result<&ClimateTemplate, WeatherError> {
        self.bands
            .get(band)
            .and_then(|templates| templates.get(id))
            .ok_or_else(|| WeatherError::UnknownTemplate {
                latitude_band: band.to_string(),
                template_id: id.to_string(),
            })
    }

    /// `(band, id, template)` in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ClimateTemplate)> {
        self.bands.iter().flat_map(|(band, templates)| {
            templates
                .iter()
                .map(move |(id, t)| (band.as_str(), id.as_str(), t))
        })
    }

    pub fn len(&self) -> usize {
        self.bands.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateProfile;

    const AUTHORED: &str = r#"{
        "temperate": {
            "riverValley": {
                "name": "River Valley",
                "description": "Mild, wet lowlands",
                "parameters": {
                    "latitude": 42,
                    "elevation": 300,
                    "maritimeInfluence": 0.4,
                    "terrainRoughness": 0.2,
                    "specialFactors": { "forestDensity": 0.6, "groundType": "loam" },
                    "temperatureProfile": {
                        "winter": { "mean": 30, "variance": 8 },
                        "spring": { "mean": 52, "variance": 8 },
                        "summer": { "mean": 74, "variance": 6 },
                        "fall": { "mean": 54, "variance": 8 },
                        "annual": { "mean": 52.5, "variance": 7.5 }
                    },
                    "dewPointProfile": {
                        "annual": { "mean": 40, "variance": 6, "max": 70 }
                    }
                },
                "defaultBiome": "temperate-deciduous"
            }
        }
    }"#;

    #[test]
    fn test_parse_authored_library() {
        let lib = TemplateLibrary::from_json_str(AUTHORED).unwrap();
        assert_eq!(lib.len(), 1);
        let t = lib.get("temperate", "riverValley").unwrap();
        assert_eq!(t.name, "River Valley");
        assert_eq!(t.default_biome.as_deref(), Some("temperate-deciduous"));
        assert!((t.parameters.elevation - 300.0).abs() < f32::EPSILON);
        assert_eq!(t.parameters.special_factors.text("groundType"), Some("loam"));
    }

    #[test]
    fn test_partial_profile_resolves_with_fallbacks() {
        let lib = TemplateLibrary::from_json_str(AUTHORED).unwrap();
        let t = lib.get("temperate", "riverValley").unwrap();
        let (profile, missing) = ClimateProfile::resolve(&t.parameters.profile_spec());
        // Dew point seasons come from its annual entry, humidity from defaults.
        assert_eq!(profile.dew_point.summer.max, Some(70.0));
        assert!(missing.iter().any(|m| m.path == "dewPoint.winter"));
        assert!(missing.iter().any(|m| m.path == "humidity.summer"));
        assert!(!missing.iter().any(|m| m.path.starts_with("temperature")));
    }

    #[test]
    fn test_missing_parameters_use_defaults() {
        let lib =
            TemplateLibrary::from_json_str(r#"{"polar": {"bare": {"name": "Bare"}}}"#).unwrap();
        let t = lib.get("polar", "bare").unwrap();
        assert!((t.parameters.maritime_influence - 0.5).abs() < f32::EPSILON);
        assert!(t.parameters.temperature_profile.is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = TemplateLibrary::from_json_str(r#"{"polar": {"bare": {"name": " "}}}"#)
            .unwrap_err();
        assert!(matches!(err, WeatherError::Template(_)));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(TemplateLibrary::from_json_str(r#"{"polar": 5}"#).is_err());
    }

    #[test]
    fn test_merge_overrides_and_roundtrips() {
        let mut lib = TemplateLibrary::builtin();
        let before = lib.len();
        lib.merge(TemplateLibrary::from_json_str(AUTHORED).unwrap());
        assert_eq!(lib.len(), before + 1);

        let json = lib.to_json_string().unwrap();
        let back = TemplateLibrary::from_json_str(&json).unwrap();
        assert_eq!(back, lib);
    }
}
