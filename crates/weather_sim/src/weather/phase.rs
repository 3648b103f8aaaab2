//! Precipitation-type state machine with hysteresis.
//!
//! The surface phase is not a pure function of the hour's temperature.
//! A type, once entered, is held while it stays physically valid for at
//! least the persistence window, and snow and rain never follow each other
//! directly: the machine always passes through sleet or freezing rain.

use serde::{Deserialize, Serialize};

use super::types::PrecipitationType;

pub const SNOW_MAX_F: f32 = 35.0;
pub const SLEET_MIN_F: f32 = 29.0;
pub const SLEET_MAX_F: f32 = 38.0;
pub const FREEZING_RAIN_MIN_F: f32 = 28.0;
pub const FREEZING_RAIN_MAX_F: f32 = 35.0;
/// Rain requires strictly warmer air than this.
pub const RAIN_MIN_F: f32 = 35.0;

/// Upper bound for choosing snow (or freezing rain) from scratch.
const PREFER_FROZEN_MAX_F: f32 = 33.0;
/// Upper bound for choosing sleet from scratch; rain above.
const PREFER_SLEET_MAX_F: f32 = 37.0;

/// Whether `kind` may physically reach the ground at `temperature`.
pub fn valid_at(kind: PrecipitationType, temperature: f32) -> bool {
    match kind {
        PrecipitationType::Snow => temperature <= SNOW_MAX_F,
        PrecipitationType::Sleet => (SLEET_MIN_F..=SLEET_MAX_F).contains(&temperature),
        PrecipitationType::FreezingRain => {
            (FREEZING_RAIN_MIN_F..=FREEZING_RAIN_MAX_F).contains(&temperature)
        }
        PrecipitationType::Rain => temperature > RAIN_MIN_F,
    }
}

/// The type the machine would pick with no history. `warm_layer` marks a
/// melting layer aloft that turns sub-freezing precipitation into
/// freezing rain.
pub fn preferred_type(temperature: f32, warm_layer: bool) -> PrecipitationType {
    if temperature <= PREFER_FROZEN_MAX_F {
        if warm_layer && temperature >= FREEZING_RAIN_MIN_F {
            PrecipitationType::FreezingRain
        } else {
            PrecipitationType::Snow
        }
    } else if temperature <= PREFER_SLEET_MAX_F {
        PrecipitationType::Sleet
    } else {
        PrecipitationType::Rain
    }
}

pub fn transition_allowed(from: PrecipitationType, to: PrecipitationType) -> bool {
    !matches!(
        (from, to),
        (PrecipitationType::Snow, PrecipitationType::Rain)
            | (PrecipitationType::Rain, PrecipitationType::Snow)
    )
}

/// Outcome of one wet hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDecision {
    pub kind: PrecipitationType,
    /// Equal to the input temperature unless the machine had to force a
    /// bridging type, in which case precipitation cooling (or latent
    /// warming) pulls the air into that type's band.
    pub temperature: f32,
}

/// Explicit, inspectable history of the phase machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecipitationState {
    pub current: Option<PrecipitationType>,
    /// Consecutive wet hours `current` has been emitted.
    pub held_hours: u32,
    /// Dry hours since `current` was last emitted.
    pub dry_hours: u32,
}

impl PrecipitationState {
    /// Advance one hour with nothing falling.
    pub fn step_dry(&mut self, reset_hours: u32) {
        if self.current.is_none() {
            return;
        }
        self.dry_hours += 1;
        if self.dry_hours >= reset_hours {
            *self = PrecipitationState::default();
        }
    }

    /// Advance one hour with precipitation and return the emitted type.
    pub fn step_wet(
        &mut self,
        temperature: f32,
        warm_layer: bool,
        min_persistence_hours: u32,
    ) -> PhaseDecision {
        let preferred = preferred_type(temperature, warm_layer);
        let decision = match self.current {
            None => PhaseDecision {
                kind: preferred,
                temperature,
            },
            Some(current) => {
                let keep = valid_at(current, temperature)
                    && (current == preferred || self.held_hours < min_persistence_hours);
                if keep {
                    PhaseDecision {
                        kind: current,
                        temperature,
                    }
                } else if transition_allowed(current, preferred) {
                    PhaseDecision {
                        kind: preferred,
                        temperature,
                    }
                } else {
                    bridge(temperature)
                }
            }
        };

        if self.current == Some(decision.kind) {
            self.held_hours += 1;
        } else {
            self.current = Some(decision.kind);
            self.held_hours = 1;
        }
        self.dry_hours = 0;
        decision
    }
}

/// Pick the transitional type for a forbidden snow/rain jump.
fn bridge(temperature: f32) -> PhaseDecision {
    for kind in [PrecipitationType::Sleet, PrecipitationType::FreezingRain] {
        if valid_at(kind, temperature) {
            return PhaseDecision { kind, temperature };
        }
    }
    PhaseDecision {
        kind: PrecipitationType::Sleet,
        temperature: temperature.clamp(SLEET_MIN_F, SLEET_MAX_F),
    }
}
