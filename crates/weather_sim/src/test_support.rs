//! Shared fixtures for unit tests.

use crate::calendar::GameDate;
use crate::climate::{
    ClimateProfile, ClimateProfileSpec, SeasonalTableSpec, SeasonalValue, TemplateLibrary,
};
use crate::error::WeatherError;
use crate::region::Region;
use crate::weather::{
    PrecipitationIntensity, PrecipitationType, WeatherCondition, WeatherSample, WeatherSource,
    WindIntensity,
};

pub(crate) fn builtin_region(band: &str, template_id: &str) -> Region {
    let library = TemplateLibrary::builtin();
    Region::from_library(template_id, &library, band, template_id).unwrap()
}

pub(crate) fn date(year: i32, month: u32, day: u32, hour: u32) -> GameDate {
    GameDate::new(year, month, day, hour).unwrap()
}

/// Every hour from `start` (inclusive) for `hours` hours.
pub(crate) fn hours_from(start: GameDate, hours: i64) -> impl Iterator<Item = GameDate> {
    (0..hours).map(move |h| start.add_hours(h))
}

/// A region held well below freezing all year with frequent precipitation.
pub(crate) fn frozen_region(id: &str) -> Region {
    let (climate, _) = ClimateProfile::resolve(&ClimateProfileSpec {
        temperature: Some(SeasonalTableSpec::seasons(
            SeasonalValue::new(5.0, 3.0),
            SeasonalValue::new(8.0, 3.0),
            SeasonalValue::new(12.0, 3.0),
            SeasonalValue::new(8.0, 3.0),
        )),
        humidity: Some(SeasonalTableSpec::seasons(
            SeasonalValue::new(88.0, 4.0),
            SeasonalValue::new(88.0, 4.0),
            SeasonalValue::new(88.0, 4.0),
            SeasonalValue::new(88.0, 4.0),
        )),
        dew_point: Some(SeasonalTableSpec::seasons(
            SeasonalValue::with_max(0.0, 3.0, 10.0),
            SeasonalValue::with_max(2.0, 3.0, 10.0),
            SeasonalValue::with_max(6.0, 3.0, 12.0),
            SeasonalValue::with_max(2.0, 3.0, 10.0),
        )),
    });
    Region::new(id, "polar", climate)
}

/// A warm, humid region that never freezes.
pub(crate) fn warm_region(id: &str) -> Region {
    let (climate, _) = ClimateProfile::resolve(&ClimateProfileSpec {
        temperature: Some(SeasonalTableSpec::seasons(
            SeasonalValue::new(70.0, 3.0),
            SeasonalValue::new(75.0, 3.0),
            SeasonalValue::new(82.0, 3.0),
            SeasonalValue::new(75.0, 3.0),
        )),
        humidity: Some(SeasonalTableSpec::seasons(
            SeasonalValue::new(80.0, 5.0),
            SeasonalValue::new(80.0, 5.0),
            SeasonalValue::new(80.0, 5.0),
            SeasonalValue::new(80.0, 5.0),
        )),
        dew_point: None,
    });
    Region::new(id, "tropical", climate)
}

/// A calm, dry, half-cloudy hour at `temperature`.
pub(crate) fn dry_sample(temperature: f32) -> WeatherSample {
    WeatherSample {
        temperature,
        humidity: 50.0,
        dew_point: temperature - 10.0,
        pressure: 29.92,
        cloud_cover: 40.0,
        wind_speed: 5.0,
        wind_direction: 180.0,
        wind_intensity: WindIntensity::from_speed(5.0),
        precipitation: false,
        precipitation_type: None,
        precipitation_intensity: None,
        precipitation_rate: 0.0,
        condition: WeatherCondition::from_cloud_cover(40.0),
        thunderstorm_severity: None,
        effects: Vec::new(),
        feels_like: temperature,
    }
}

pub(crate) fn wet_sample(temperature: f32, kind: PrecipitationType, rate: f32) -> WeatherSample {
    let intensity = PrecipitationIntensity::from_rate(rate);
    WeatherSample {
        humidity: 95.0,
        cloud_cover: 95.0,
        precipitation: true,
        precipitation_type: Some(kind),
        precipitation_intensity: Some(intensity),
        precipitation_rate: rate,
        condition: WeatherCondition::from_precipitation(kind, intensity, 5.0),
        ..dry_sample(temperature)
    }
}

/// Weather driven by a closure over the linear hour.
pub(crate) struct ScriptedSource<F>(F);

pub(crate) fn scripted<F>(f: F) -> ScriptedSource<F>
where
    F: Fn(i64) -> Result<WeatherSample, WeatherError> + Send + Sync,
{
    ScriptedSource(f)
}

impl<F> WeatherSource for ScriptedSource<F>
where
    F: Fn(i64) -> Result<WeatherSample, WeatherError> + Send + Sync,
{
    fn generate_weather(
        &self,
        _region: &Region,
        date: GameDate,
    ) -> Result<WeatherSample, WeatherError> {
        date.validate()?;
        (self.0)(date.to_linear_hour())
    }
}
