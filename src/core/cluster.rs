use crate::core::sampling::{sample_weighted_index, DurationFlowSampler, RandomStream};
use crate::core::use_spec::UseEventSpec;
use crate::errors::InvalidDistributionError;
use crate::simulation_year::{MINUTES_PER_DAY, MINUTES_PER_HOUR, MINUTES_PER_YEAR};
use rand::Rng;

/// Occupant count the calibration tables are normalised to; sampled daily
/// cluster counts scale linearly from this reference household.
pub const REFERENCE_OCCUPANCY: f64 = 2.0;

/// One discrete use event, placed on the annual minute grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    /// Minute offset from the start of the simulated year.
    pub start_minute: usize,
    /// Whole minutes, always positive.
    pub duration_minutes: usize,
    /// Litres per minute, always positive.
    pub flow_rate: f64,
}

impl Event {
    pub fn end_minute(&self) -> usize {
        self.start_minute + self.duration_minutes
    }
}

/// Placed/dropped event counters for one end use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndUseStats {
    pub placed: usize,
    pub dropped: usize,
}

/// Generates a day's worth of non-overlapping use events for one end use.
///
/// Each day is a pure function of the spec and the stream's current position:
/// the draws per day are, in order, one cluster-count draw, then per cluster
/// attempt an onset-hour draw, a sub-hour offset draw, duration draws and
/// flow-rate draws. A candidate that conflicts with an already-placed event
/// (its interval padded by the minimum gap on both sides) is discarded and the
/// whole attempt is resampled; after `placement_retry_cap` failed attempts the
/// cluster is dropped and counted.
#[derive(Debug)]
pub struct EventClusterGenerator<'a> {
    spec: &'a UseEventSpec,
    sampler: DurationFlowSampler,
    occupancy_factor: f64,
}

impl<'a> EventClusterGenerator<'a> {
    pub fn new(spec: &'a UseEventSpec, occupants: f64) -> Result<Self, InvalidDistributionError> {
        Ok(Self {
            spec,
            sampler: DurationFlowSampler::new(
                spec.duration_mean,
                spec.duration_std,
                spec.flow_rate_mean,
                spec.flow_rate_std,
            )?,
            occupancy_factor: occupants / REFERENCE_OCCUPANCY,
        })
    }

    /// Generate the events for one simulated day, sorted by start time, with
    /// annual minute offsets. An event in the final hour of a day may spill
    /// into the next day; an event that would run past the end of the year is
    /// truncated at the year boundary.
    pub fn generate_day(
        &self,
        rng: &mut RandomStream,
        day_index: usize,
        stats: &mut EndUseStats,
    ) -> Result<Vec<Event>, InvalidDistributionError> {
        debug_assert!(day_index * MINUTES_PER_DAY < MINUTES_PER_YEAR);
        let cluster_count = self.sample_cluster_count(rng)?;

        // (start, duration, flow) in day-local minutes
        let mut placed: Vec<(usize, usize, f64)> = Vec::with_capacity(cluster_count);
        for _ in 0..cluster_count {
            let mut accepted = false;
            for _ in 0..self.spec.placement_retry_cap {
                let candidate = self.sample_candidate(rng)?;
                if !self.conflicts(&placed, candidate.0, candidate.1) {
                    placed.push(candidate);
                    accepted = true;
                    break;
                }
            }
            if accepted {
                stats.placed += 1;
            } else {
                stats.dropped += 1;
            }
        }

        placed.sort_by_key(|(start, _, _)| *start);
        Ok(placed
            .into_iter()
            .map(|(local_start, duration, flow_rate)| {
                let start_minute = day_index * MINUTES_PER_DAY + local_start;
                Event {
                    start_minute,
                    duration_minutes: duration.min(MINUTES_PER_YEAR - start_minute),
                    flow_rate,
                }
            })
            .collect())
    }

    fn sample_cluster_count(
        &self,
        rng: &mut RandomStream,
    ) -> Result<usize, InvalidDistributionError> {
        let distribution = &self.spec.cluster_count_distribution;
        let index = sample_weighted_index(rng, distribution.probabilities())?;
        let count = distribution.values()[index];
        Ok((count * self.occupancy_factor).round() as usize)
    }

    fn sample_candidate(
        &self,
        rng: &mut RandomStream,
    ) -> Result<(usize, usize, f64), InvalidDistributionError> {
        let distribution = &self.spec.onset_hour_distribution;
        let hour_index = sample_weighted_index(rng, distribution.probabilities())?;
        let onset_hour = distribution.values()[hour_index] as usize;
        let sub_hour_offset =
            ((rng.random::<f64>() * MINUTES_PER_HOUR as f64) as usize).min(MINUTES_PER_HOUR - 1);
        let start = onset_hour * MINUTES_PER_HOUR + sub_hour_offset;
        let duration = self.sampler.sample_duration(rng);
        let flow_rate = self.sampler.sample_flow_rate(rng);
        Ok((start, duration, flow_rate))
    }

    /// Whether a candidate interval comes within the minimum gap of any
    /// already-placed event that day.
    fn conflicts(&self, placed: &[(usize, usize, f64)], start: usize, duration: usize) -> bool {
        let gap = self.spec.min_gap_minutes;
        placed.iter().any(|(other_start, other_duration, _)| {
            start < other_start + other_duration + gap && *other_start < start + duration + gap
        })
    }
}
