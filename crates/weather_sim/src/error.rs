//! Error and diagnostic types shared by the generator, accumulation and
//! hazard services.
//!
//! Fatal problems are `WeatherError` variants and propagate with `?`.
//! Recoverable problems (`MissingProfileField`, `ReplayGap`) are plain
//! records: the caller logs them and keeps going.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::GameDate;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("invalid date: {field} = {value}")]
    InvalidDate { field: &'static str, value: i64 },

    #[error("cannot parse date {0:?}, expected YYYY-MM-DD or YYYY-MM-DDTHH:MM")]
    DateParse(String),

    #[error("non-finite {quantity} for region '{region_id}' at hour {hour}")]
    NonFiniteSample {
        region_id: String,
        quantity: &'static str,
        hour: i64,
    },

    #[error("climate template error: {0}")]
    Template(String),

    #[error("unknown climate template '{template_id}' in latitude band '{latitude_band}'")]
    UnknownTemplate {
        latitude_band: String,
        template_id: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// A profile entry was absent and a default was substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingProfileField {
    /// Dotted path of the absent entry, e.g. `humidity.winter`.
    pub path: String,
    /// Where the substituted value came from.
    pub fallback: FallbackSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackSource {
    /// The table's own `annual` entry.
    Annual,
    /// Mean of the seasons that were present.
    SeasonalMean,
    /// The built-in temperate table.
    TemperateDefault,
}

impl fmt::Display for MissingProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.fallback {
            FallbackSource::Annual => "annual entry",
            FallbackSource::SeasonalMean => "mean of present seasons",
            FallbackSource::TemperateDefault => "temperate default",
        };
        write!(f, "missing profile field {} (using {source})", self.path)
    }
}

/// One hour of history that could not be evaluated during replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayGap {
    pub region_id: String,
    pub date: GameDate,
    pub cause: String,
}

impl fmt::Display for ReplayGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replay gap for region '{}' at {}: {}",
            self.region_id, self.date, self.cause
        )
    }
}
