//! Deterministic randomness.
//!
//! Every random draw comes from a `ChaCha8Rng` seeded by hashing the region
//! id, a channel and an index (hour, slot or knot). Nothing reads the clock
//! or OS entropy, so identical inputs give identical weather on every run
//! and platform.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use xxhash_rust::xxh64::xxh64;

const SEED_SALT: u64 = 0x5eed_0f_c11a_7e;

/// Hours per noise cycle. Coordinates stay below `2 * CYCLE_HOURS`, well
/// inside exact `f32` integer range.
const CYCLE_HOURS: i64 = 16_384;

/// Independent random streams per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    SynopticAnomaly = 1,
    DailyAnomaly = 2,
    HumidityAnomaly = 3,
    DewPointAnomaly = 4,
    PrecipitationSlot = 5,
    CloudTexture = 6,
    WindSpeed = 7,
    WindDirection = 8,
    Pressure = 9,
    RateJitter = 10,
}

pub fn region_seed(region_id: &str) -> u64 {
    xxh64(region_id.as_bytes(), 0)
}

pub fn stream_seed(region_seed: u64, channel: Channel, index: i64) -> u64 {
    let mut buf = [0u8; 17];
    buf[..8].copy_from_slice(&region_seed.to_le_bytes());
    buf[8] = channel as u8;
    buf[9..].copy_from_slice(&index.to_le_bytes());
    xxh64(&buf, SEED_SALT)
}

pub fn stream_rng(region_seed: u64, channel: Channel, index: i64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(stream_seed(region_seed, channel, index))
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Smoothly interpolated random knots placed every `spacing` hours.
///
/// Knot values are an Irwin-Hall sum rescaled to mean 0 and unit variance,
/// so the amplitude distribution is known analytically (used by the hazard
/// layer for region-relative percentiles).
#[derive(Debug, Clone, Copy)]
pub struct KnotNoise {
    seed: u64,
    channel: Channel,
    spacing: i64,
    phase: i64,
}

impl KnotNoise {
    pub fn new(region_seed: u64, channel: Channel, spacing_hours: i64) -> Self {
        let spacing = spacing_hours.max(1);
        let phase = (stream_seed(region_seed, channel, i64::MIN) % spacing as u64) as i64;
        Self {
            seed: region_seed,
            channel,
            spacing,
            phase,
        }
    }

    fn knot(&self, index: i64) -> f32 {
        let mut rng = stream_rng(self.seed, self.channel, index);
        let sum: f32 = (0..3).map(|_| rng.gen::<f32>()).sum();
        (sum - 1.5) * 2.0
    }

    /// Value in roughly `[-3, 3]` with unit variance at knots.
    pub fn sample(&self, hour: i64) -> f32 {
        let shifted = hour + self.phase;
        let k = shifted.div_euclid(self.spacing);
        let t = shifted.rem_euclid(self.spacing) as f32 / self.spacing as f32;
        let s = smoothstep(t);
        self.knot(k) * (1.0 - s) + self.knot(k + 1) * s
    }
}

/// Continuous simplex noise over an unbounded hour axis.
///
/// The axis is cut into cycles of `CYCLE_HOURS`. Within a cycle the value
/// crossfades from the previous cycle's lane (evaluated past its end) to
/// the current lane, so the signal is continuous at every cycle boundary
/// and noise coordinates never grow large.
pub struct TemporalNoise {
    noise: FastNoiseLite,
}

impl TemporalNoise {
    /// `period_hours` is the rough feature size of the noise.
    pub fn new(region_seed: u64, channel: Channel, period_hours: f32) -> Self {
        let seed = stream_seed(region_seed, channel, 0) as i32;
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0 / period_hours.max(1.0)));
        Self { noise }
    }

    fn lane(cycle: i64) -> f32 {
        (cycle.rem_euclid(4096) as f32) * 53.0
    }

    /// Value in `[-1, 1]`.
    pub fn sample(&self, hour: i64) -> f32 {
        let cycle = hour.div_euclid(CYCLE_HOURS);
        let u = hour.rem_euclid(CYCLE_HOURS) as f32;
        let s = smoothstep(u / CYCLE_HOURS as f32);
        let previous = self
            .noise
            .get_noise_2d(u + CYCLE_HOURS as f32, Self::lane(cycle - 1));
        let current = self.noise.get_noise_2d(u, Self::lane(cycle));
        (previous * (1.0 - s) + current * s).clamp(-1.0, 1.0)
    }

    /// Value mapped to `[0, 1]`.
    pub fn sample_unit(&self, hour: i64) -> f32 {
        (self.sample(hour) + 1.0) * 0.5
    }
}
