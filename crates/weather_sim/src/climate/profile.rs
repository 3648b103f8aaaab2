//! Seasonal parameter tables and their smooth interpolation across the year.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{FallbackSource, MissingProfileField};

/// Position (0-based day within a 365-day year) of each seasonal anchor:
/// mid-January, mid-April, mid-July and mid-October.
pub(crate) const SEASON_ANCHORS: [f32; 4] = [14.0, 104.0, 195.0, 287.0];
const YEAR_LENGTH: f32 = 365.0;

/// One seasonal entry: mean, spread, and an optional hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalValue {
    pub mean: f32,
    #[serde(default)]
    pub variance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
}

impl SeasonalValue {
    pub const fn new(mean: f32, variance: f32) -> Self {
        Self {
            mean,
            variance,
            max: None,
        }
    }

    pub const fn with_max(mean: f32, variance: f32, max: f32) -> Self {
        Self {
            mean,
            variance,
            max: Some(max),
        }
    }

    fn lerp(a: SeasonalValue, b: SeasonalValue, s: f32) -> SeasonalValue {
        let max = match (a.max, b.max) {
            (Some(x), Some(y)) => Some(x + (y - x) * s),
            (x, y) => x.or(y),
        };
        SeasonalValue {
            mean: a.mean + (b.mean - a.mean) * s,
            variance: a.variance + (b.variance - a.variance) * s,
            max,
        }
    }

    fn average(values: &[SeasonalValue]) -> SeasonalValue {
        let n = values.len().max(1) as f32;
        let maxes: Vec<f32> = values.iter().filter_map(|v| v.max).collect();
        SeasonalValue {
            mean: values.iter().map(|v| v.mean).sum::<f32>() / n,
            variance: values.iter().map(|v| v.variance).sum::<f32>() / n,
            max: maxes.iter().copied().reduce(f32::max),
        }
    }
}

/// Authoring form of a table: every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalTableSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winter: Option<SeasonalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spring: Option<SeasonalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summer: Option<SeasonalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall: Option<SeasonalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual: Option<SeasonalValue>,
}

impl SeasonalTableSpec {
    /// Four seasons plus an `annual` entry averaged from them.
    pub fn seasons(
        winter: SeasonalValue,
        spring: SeasonalValue,
        summer: SeasonalValue,
        fall: SeasonalValue,
    ) -> Self {
        Self {
            winter: Some(winter),
            spring: Some(spring),
            summer: Some(summer),
            fall: Some(fall),
            annual: Some(SeasonalValue::average(&[winter, spring, summer, fall])),
        }
    }
}

/// A fully resolved table. Every entry is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTable {
    pub winter: SeasonalValue,
    pub spring: SeasonalValue,
    pub summer: SeasonalValue,
    pub fall: SeasonalValue,
    pub annual: SeasonalValue,
}

impl SeasonalTable {
    /// Fill gaps in `spec` from its annual entry, then from the mean of the
    /// seasons that are present, then from `defaults`. Each substitution is
    /// reported under `field`.
    pub fn resolve(
        spec: &SeasonalTableSpec,
        defaults: &SeasonalTable,
        field: &str,
        missing: &mut Vec<MissingProfileField>,
    ) -> SeasonalTable {
        let present: Vec<SeasonalValue> = [spec.winter, spec.spring, spec.summer, spec.fall]
            .into_iter()
            .flatten()
            .collect();

        let mut fill = |season: &str, value: Option<SeasonalValue>, default: SeasonalValue| {
            if let Some(v) = value {
                return v;
            }
            let (v, fallback) = if let Some(annual) = spec.annual {
                (annual, FallbackSource::Annual)
            } else if !present.is_empty() {
                (SeasonalValue::average(&present), FallbackSource::SeasonalMean)
            } else {
                (default, FallbackSource::TemperateDefault)
            };
            missing.push(MissingProfileField {
                path: format!("{field}.{season}"),
                fallback,
            });
            v
        };

        let winter = fill("winter", spec.winter, defaults.winter);
        let spring = fill("spring", spec.spring, defaults.spring);
        let summer = fill("summer", spec.summer, defaults.summer);
        let fall = fill("fall", spec.fall, defaults.fall);
        let annual = spec
            .annual
            .unwrap_or_else(|| SeasonalValue::average(&[winter, spring, summer, fall]));

        SeasonalTable {
            winter: sanitize(winter),
            spring: sanitize(spring),
            summer: sanitize(summer),
            fall: sanitize(fall),
            annual: sanitize(annual),
        }
    }

    fn anchors(&self) -> [SeasonalValue; 4] {
        [self.winter, self.spring, self.summer, self.fall]
    }

    /// Raised-cosine blend between the two anchors that bracket
    /// `year_position` (days into a 365-day year).
    pub fn at(&self, year_position: f32) -> SeasonalValue {
        let p = year_position.rem_euclid(YEAR_LENGTH);
        let anchors = self.anchors();
        let p = if p < SEASON_ANCHORS[0] {
            p + YEAR_LENGTH
        } else {
            p
        };

        let mut i = 3;
        for k in 0..3 {
            if p < SEASON_ANCHORS[k + 1] {
                i = k;
                break;
            }
        }
        let start = SEASON_ANCHORS[i];
        let end = if i == 3 {
            SEASON_ANCHORS[0] + YEAR_LENGTH
        } else {
            SEASON_ANCHORS[i + 1]
        };
        let t = ((p - start) / (end - start)).clamp(0.0, 1.0);
        let s = 0.5 - 0.5 * (t * PI).cos();
        SeasonalValue::lerp(anchors[i], anchors[(i + 1) % 4], s)
    }
}

fn sanitize(v: SeasonalValue) -> SeasonalValue {
    SeasonalValue {
        mean: v.mean,
        variance: v.variance.abs(),
        max: v.max,
    }
}

/// Authoring form of a profile. Any table may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClimateProfileSpec {
    pub temperature: Option<SeasonalTableSpec>,
    pub humidity: Option<SeasonalTableSpec>,
    pub dew_point: Option<SeasonalTableSpec>,
}

/// Temperature (F), relative humidity (%) and dew point (F) tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateProfile {
    pub temperature: SeasonalTable,
    pub humidity: SeasonalTable,
    pub dew_point: SeasonalTable,
}

impl ClimateProfile {
    /// Mid-latitude temperate climate used wherever a profile is silent.
    pub fn temperate() -> Self {
        let temperature = SeasonalTable {
            winter: SeasonalValue::new(34.0, 8.0),
            spring: SeasonalValue::new(54.0, 8.0),
            summer: SeasonalValue::new(74.0, 6.0),
            fall: SeasonalValue::new(56.0, 8.0),
            annual: SeasonalValue::new(54.5, 7.5),
        };
        let humidity = SeasonalTable {
            winter: SeasonalValue::new(72.0, 10.0),
            spring: SeasonalValue::new(65.0, 10.0),
            summer: SeasonalValue::new(68.0, 10.0),
            fall: SeasonalValue::new(70.0, 10.0),
            annual: SeasonalValue::new(68.75, 10.0),
        };
        let dew_point = SeasonalTable {
            winter: SeasonalValue::with_max(24.0, 6.0, 45.0),
            spring: SeasonalValue::with_max(40.0, 6.0, 62.0),
            summer: SeasonalValue::with_max(60.0, 5.0, 75.0),
            fall: SeasonalValue::with_max(44.0, 6.0, 65.0),
            annual: SeasonalValue::with_max(42.0, 6.0, 75.0),
        };
        Self {
            temperature,
            humidity,
            dew_point,
        }
    }

    /// Resolve an authored profile, collecting every fallback taken.
    pub fn resolve(spec: &ClimateProfileSpec) -> (Self, Vec<MissingProfileField>) {
        let defaults = Self::temperate();
        let mut missing = Vec::new();
        let empty = SeasonalTableSpec::default();
        let profile = Self {
            temperature: SeasonalTable::resolve(
                spec.temperature.as_ref().unwrap_or(&empty),
                &defaults.temperature,
                "temperature",
                &mut missing,
            ),
            humidity: SeasonalTable::resolve(
                spec.humidity.as_ref().unwrap_or(&empty),
                &defaults.humidity,
                "humidity",
                &mut missing,
            ),
            dew_point: SeasonalTable::resolve(
                spec.dew_point.as_ref().unwrap_or(&empty),
                &defaults.dew_point,
                "dewPoint",
                &mut missing,
            ),
        };
        (profile, missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> SeasonalTable {
        let (profile, _) = ClimateProfile::resolve(&ClimateProfileSpec {
            temperature: Some(SeasonalTableSpec::seasons(
                SeasonalValue::new(20.0, 10.0),
                SeasonalValue::new(50.0, 8.0),
                SeasonalValue::new(80.0, 6.0),
                SeasonalValue::new(50.0, 8.0),
            )),
            ..Default::default()
        });
        profile.temperature
    }

    #[test]
    fn test_anchor_days_hit_season_means() {
        let table = sample_table();
        assert!((table.at(14.0).mean - 20.0).abs() < 1e-4);
        assert!((table.at(104.0).mean - 50.0).abs() < 1e-4);
        assert!((table.at(195.0).mean - 80.0).abs() < 1e-4);
        assert!((table.at(287.0).mean - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_interpolation_wraps_new_year() {
        let table = sample_table();
        let dec31 = table.at(364.9).mean;
        let jan1 = table.at(0.0).mean;
        assert!((dec31 - jan1).abs() < 0.1, "{dec31} vs {jan1}");
        assert!(jan1 > 20.0 && jan1 < 50.0);
    }

    #[test]
    fn test_interpolation_has_no_steps() {
        let table = sample_table();
        let mut prev = table.at(0.0).mean;
        let mut day = 0.25;
        while day < 365.0 {
            let v = table.at(day).mean;
            assert!((v - prev).abs() < 0.3, "jump at day {day}: {prev} -> {v}");
            prev = v;
            day += 0.25;
        }
    }

    #[test]
    fn test_missing_season_uses_annual() {
        let spec = ClimateProfileSpec {
            humidity: Some(SeasonalTableSpec {
                winter: Some(SeasonalValue::new(90.0, 5.0)),
                annual: Some(SeasonalValue::new(60.0, 5.0)),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (profile, missing) = ClimateProfile::resolve(&spec);
        assert!((profile.humidity.winter.mean - 90.0).abs() < f32::EPSILON);
        assert!((profile.humidity.summer.mean - 60.0).abs() < f32::EPSILON);
        assert!(missing
            .iter()
            .any(|m| m.path == "humidity.summer" && m.fallback == FallbackSource::Annual));
    }

    #[test]
    fn test_missing_annual_uses_season_mean() {
        let spec = ClimateProfileSpec {
            temperature: Some(SeasonalTableSpec {
                winter: Some(SeasonalValue::new(10.0, 5.0)),
                summer: Some(SeasonalValue::new(70.0, 5.0)),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (profile, missing) = ClimateProfile::resolve(&spec);
        assert!((profile.temperature.spring.mean - 40.0).abs() < f32::EPSILON);
        assert!(missing
            .iter()
            .any(|m| m.path == "temperature.fall" && m.fallback == FallbackSource::SeasonalMean));
    }

    #[test]
    fn test_empty_profile_is_temperate() {
        let (profile, missing) = ClimateProfile::resolve(&ClimateProfileSpec::default());
        let temperate = ClimateProfile::temperate();
        assert_eq!(profile.temperature.winter, temperate.temperature.winter);
        assert_eq!(profile.dew_point.summer, temperate.dew_point.summer);
        // 4 seasons x 3 tables
        assert_eq!(missing.len(), 12);
        assert!(missing
            .iter()
            .all(|m| m.fallback == FallbackSource::TemperateDefault));
    }

    #[test]
    fn test_negative_variance_sanitized() {
        let spec = ClimateProfileSpec {
            temperature: Some(SeasonalTableSpec::seasons(
                SeasonalValue::new(20.0, -4.0),
                SeasonalValue::new(50.0, 8.0),
                SeasonalValue::new(80.0, 6.0),
                SeasonalValue::new(50.0, 8.0),
            )),
            ..Default::default()
        };
        let (profile, _) = ClimateProfile::resolve(&spec);
        assert!((profile.temperature.winter.variance - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dew_point_max_interpolates() {
        let table = ClimateProfile::temperate().dew_point;
        let mid = table.at(150.0);
        let max = mid.max.unwrap();
        assert!(max > 62.0 && max < 75.0, "got {max}");
    }
}
