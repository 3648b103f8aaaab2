use serde::{Deserialize, Serialize};

/// Precipitation phase at the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecipitationType {
    Snow,
    Sleet,
    FreezingRain,
    Rain,
}

impl PrecipitationType {
    pub fn name(self) -> &'static str {
        match self {
            PrecipitationType::Snow => "snow",
            PrecipitationType::Sleet => "sleet",
            PrecipitationType::FreezingRain => "freezing-rain",
            PrecipitationType::Rain => "rain",
        }
    }

    /// Sleet and freezing rain sit between snow and rain.
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            PrecipitationType::Sleet | PrecipitationType::FreezingRain
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrecipitationIntensity {
    Light,
    Moderate,
    Heavy,
}

impl PrecipitationIntensity {
    /// Liquid-equivalent inches per hour.
    pub fn from_rate(rate: f32) -> Self {
        if rate < 0.02 {
            PrecipitationIntensity::Light
        } else if rate < 0.06 {
            PrecipitationIntensity::Moderate
        } else {
            PrecipitationIntensity::Heavy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThunderstormSeverity {
    Normal,
    Strong,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindIntensity {
    Calm,
    Light,
    Moderate,
    Strong,
    Gale,
    Storm,
}

impl WindIntensity {
    pub fn from_speed(mph: f32) -> Self {
        if mph < 3.0 {
            WindIntensity::Calm
        } else if mph < 13.0 {
            WindIntensity::Light
        } else if mph < 25.0 {
            WindIntensity::Moderate
        } else if mph < 39.0 {
            WindIntensity::Strong
        } else if mph < 55.0 {
            WindIntensity::Gale
        } else {
            WindIntensity::Storm
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    #[serde(rename = "Clear")]
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    #[serde(rename = "Mostly Cloudy")]
    MostlyCloudy,
    #[serde(rename = "Overcast")]
    Overcast,
    #[serde(rename = "Fog")]
    Fog,
    #[serde(rename = "Light Rain")]
    LightRain,
    #[serde(rename = "Rain")]
    Rain,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
    #[serde(rename = "Thunderstorm")]
    Thunderstorm,
    #[serde(rename = "Light Snow")]
    LightSnow,
    #[serde(rename = "Snow")]
    Snow,
    #[serde(rename = "Heavy Snow")]
    HeavySnow,
    #[serde(rename = "Blizzard")]
    Blizzard,
    #[serde(rename = "Sleet")]
    Sleet,
    #[serde(rename = "Freezing Rain")]
    FreezingRain,
}

impl WeatherCondition {
    pub fn name(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::PartlyCloudy => "Partly Cloudy",
            WeatherCondition::MostlyCloudy => "Mostly Cloudy",
            WeatherCondition::Overcast => "Overcast",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::LightRain => "Light Rain",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::HeavyRain => "Heavy Rain",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::LightSnow => "Light Snow",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::HeavySnow => "Heavy Snow",
            WeatherCondition::Blizzard => "Blizzard",
            WeatherCondition::Sleet => "Sleet",
            WeatherCondition::FreezingRain => "Freezing Rain",
        }
    }

    /// Sky condition when nothing falls.
    pub fn from_cloud_cover(cloud_cover: f32) -> Self {
        if cloud_cover < 20.0 {
            WeatherCondition::Clear
        } else if cloud_cover < 50.0 {
            WeatherCondition::PartlyCloudy
        } else if cloud_cover < 80.0 {
            WeatherCondition::MostlyCloudy
        } else {
            WeatherCondition::Overcast
        }
    }

    /// Base condition for falling precipitation, before any thunderstorm
    /// upgrade.
    pub fn from_precipitation(
        kind: PrecipitationType,
        intensity: PrecipitationIntensity,
        wind_speed: f32,
    ) -> Self {
        use PrecipitationIntensity as I;
        match (kind, intensity) {
            (PrecipitationType::Rain, I::Light) => WeatherCondition::LightRain,
            (PrecipitationType::Rain, I::Moderate) => WeatherCondition::Rain,
            (PrecipitationType::Rain, I::Heavy) => WeatherCondition::HeavyRain,
            (PrecipitationType::Snow, I::Light) => WeatherCondition::LightSnow,
            (PrecipitationType::Snow, I::Moderate) => WeatherCondition::Snow,
            (PrecipitationType::Snow, I::Heavy) if wind_speed >= 35.0 => {
                WeatherCondition::Blizzard
            }
            (PrecipitationType::Snow, I::Heavy) => WeatherCondition::HeavySnow,
            (PrecipitationType::Sleet, _) => WeatherCondition::Sleet,
            (PrecipitationType::FreezingRain, _) => WeatherCondition::FreezingRain,
        }
    }
}

/// One hour of weather for one region. A value type: services may cache
/// samples but callers always receive their own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    /// Degrees F.
    pub temperature: f32,
    /// Relative humidity, 0-100.
    pub humidity: f32,
    /// Degrees F, never above `temperature`.
    pub dew_point: f32,
    /// Inches of mercury.
    pub pressure: f32,
    /// Percent of sky covered, 0-100.
    pub cloud_cover: f32,
    /// Miles per hour.
    pub wind_speed: f32,
    /// Degrees clockwise from north the wind blows from, `[0, 360)`.
    pub wind_direction: f32,
    pub wind_intensity: WindIntensity,
    pub precipitation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_type: Option<PrecipitationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_intensity: Option<PrecipitationIntensity>,
    /// Liquid-equivalent inches per hour; zero when dry.
    #[serde(default)]
    pub precipitation_rate: f32,
    pub condition: WeatherCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thunderstorm_severity: Option<ThunderstormSeverity>,
    #[serde(default)]
    pub effects: Vec<String>,
    /// Heat index where it differs meaningfully, else the temperature.
    pub feels_like: f32,
}

impl WeatherSample {
    pub fn is_raining(&self) -> bool {
        self.precipitation_type == Some(PrecipitationType::Rain)
    }

    pub fn is_snowing(&self) -> bool {
        self.precipitation_type == Some(PrecipitationType::Snow)
    }
}
