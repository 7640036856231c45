use crate::errors::InvalidDistributionError;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;
use std::time::{SystemTime, UNIX_EPOCH};

/// The single seeded pseudo-random stream owned by one dwelling generation
/// run. Every sampling operation for that run draws from this stream in a
/// fixed order, so a given seed reproduces a bit-identical schedule. Never
/// shared between concurrent generation runs.
#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: Pcg64,
}

impl RandomStream {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Derive an independently-seeded stream for one dwelling, so that
    /// dwellings generated in parallel workers are reproducible and
    /// uncorrelated. The dwelling identifier is hashed (FNV-1a) into the base
    /// seed and the combination is finalised with splitmix64.
    pub fn for_dwelling(base_seed: u64, dwelling_id: &str) -> Self {
        Self::from_seed(splitmix64(base_seed ^ fnv1a(dwelling_id.as_bytes())))
    }

    /// A non-reproducible seed taken from the wall clock, for callers that did
    /// not supply one. Returns the seed used so the caller can surface it.
    pub fn time_based_seed() -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        splitmix64(now.as_nanos() as u64)
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Draw a discrete outcome index from a weighted-probability vector using one
/// uniform draw in [0, 1) (inverse-CDF). Weights are expected to sum to ~1.
/// Returns the first index whose cumulative weight exceeds the draw; if
/// floating-point error leaves the draw beyond the full cumulative sum, the
/// last index carrying weight is returned rather than an error.
pub fn sample_weighted_index(
    rng: &mut impl Rng,
    weights: &[f64],
) -> Result<usize, InvalidDistributionError> {
    if weights.is_empty() {
        return Err(InvalidDistributionError::Empty);
    }
    if let Some(index) = weights.iter().position(|w| *w < 0.0) {
        return Err(InvalidDistributionError::NegativeWeight {
            index,
            weight: weights[index],
        });
    }
    if weights.iter().all(|w| *w == 0.0) {
        return Err(InvalidDistributionError::ZeroMass(weights.len()));
    }

    let uniform = rng.random::<f64>();
    let mut cumulative = 0.0;
    let mut last_weighted = 0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if uniform < cumulative {
            return Ok(index);
        }
        if *weight > 0.0 {
            last_weighted = index;
        }
    }
    Ok(last_weighted)
}

/// How many times a non-positive Normal draw is retried before giving up and
/// falling back to the configured floor.
pub const CLIP_REDRAW_ATTEMPTS: usize = 10;
/// Floor for event durations when every redraw came out non-positive.
pub const MIN_DURATION_MINUTES: usize = 1;
/// Floor for flow rates when every redraw came out non-positive, in l/min.
pub const MIN_FLOW_RATE: f64 = 0.1;

/// Draws event durations and flow rates from Normal distributions with given
/// mean/std, clipped to physically valid ranges. A draw that comes out
/// non-positive is redrawn up to [`CLIP_REDRAW_ATTEMPTS`] times; if every
/// attempt fails the sampler falls back to a small positive floor.
#[derive(Clone, Copy, Debug)]
pub struct DurationFlowSampler {
    duration: Normal<f64>,
    flow_rate: Normal<f64>,
}

impl DurationFlowSampler {
    pub fn new(
        duration_mean: f64,
        duration_std: f64,
        flow_rate_mean: f64,
        flow_rate_std: f64,
    ) -> Result<Self, InvalidDistributionError> {
        Ok(Self {
            duration: Normal::new(duration_mean, duration_std).map_err(|_| {
                InvalidDistributionError::BadNormalParameters {
                    mean: duration_mean,
                    std: duration_std,
                }
            })?,
            flow_rate: Normal::new(flow_rate_mean, flow_rate_std).map_err(|_| {
                InvalidDistributionError::BadNormalParameters {
                    mean: flow_rate_mean,
                    std: flow_rate_std,
                }
            })?,
        })
    }

    /// Sample an event duration in whole minutes, always at least 1.
    pub fn sample_duration(&self, rng: &mut impl Rng) -> usize {
        match positive_draw(&self.duration, rng) {
            Some(minutes) => (minutes.round() as usize).max(MIN_DURATION_MINUTES),
            None => MIN_DURATION_MINUTES,
        }
    }

    /// Sample an event flow rate in l/min, always positive.
    pub fn sample_flow_rate(&self, rng: &mut impl Rng) -> f64 {
        positive_draw(&self.flow_rate, rng).unwrap_or(MIN_FLOW_RATE)
    }
}

fn positive_draw(distribution: &Normal<f64>, rng: &mut impl Rng) -> Option<f64> {
    (0..CLIP_REDRAW_ATTEMPTS)
        .map(|_| distribution.sample(rng))
        .find(|draw| *draw > 0.0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::RngCore;

    /// An RNG that replays a fixed sequence of uniform draws, for pinning the
    /// inverse-CDF walk in tests.
    pub(crate) struct SequenceRng {
        words: Vec<u64>,
        position: usize,
    }

    impl SequenceRng {
        /// Build a stream whose successive `random::<f64>()` calls yield the
        /// given values (to 53-bit precision).
        pub(crate) fn from_uniforms(uniforms: &[f64]) -> Self {
            Self {
                words: uniforms
                    .iter()
                    .map(|u| ((u * (1u64 << 53) as f64) as u64) << 11)
                    .collect(),
                position: 0,
            }
        }
    }

    impl RngCore for SequenceRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let word = self.words[self.position % self.words.len()];
            self.position += 1;
            word
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }
}
