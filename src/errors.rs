use thiserror::Error;

/// Top-level error for a schedule generation run.
#[derive(Debug, Error)]
pub enum SchedGenError {
    #[error("Failed to load probability data: {0}")]
    DataLoad(#[from] DataLoadError),
    #[error("Distribution with no usable mass: {0}")]
    InvalidDistribution(#[from] InvalidDistributionError),
    #[error("Schedule assembly invariant violated: {0}")]
    AssemblyRange(#[from] AssemblyRangeError),
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
}

/// A probability resource was missing or malformed. Fatal for every dwelling
/// sharing the resource, as tables are loaded once and shared read-only.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("probability resource '{resource}' could not be read: {source}")]
    Unreadable {
        resource: String,
        #[source]
        source: csv::Error,
    },
    #[error("probability resource '{resource}', row {row}: {reason}")]
    Malformed {
        resource: String,
        row: usize,
        reason: String,
    },
    #[error("probability resource '{resource}' has no rows for '{key}'")]
    MissingKey { resource: String, key: String },
    #[error(
        "probabilities for '{key}' in resource '{resource}' sum to {sum} \
        (expected 1.0 within {tolerance})"
    )]
    BadProbabilityMass {
        resource: String,
        key: String,
        sum: f64,
        tolerance: f64,
    },
}

/// A distribution that cannot be sampled from. Fatal for the end use being
/// generated; whether the caller substitutes a default or aborts is deployment
/// policy, but it must never be defaulted silently.
#[derive(Debug, Error)]
pub enum InvalidDistributionError {
    #[error("weight vector is empty")]
    Empty,
    #[error("all {0} weights are zero")]
    ZeroMass(usize),
    #[error("weight at index {index} is negative ({weight})")]
    NegativeWeight { index: usize, weight: f64 },
    #[error("invalid normal parameters (mean {mean}, std {std})")]
    BadNormalParameters { mean: f64, std: f64 },
}

/// An event was placed outside the annual array bounds. This is a logic bug in
/// upstream event generation, never a recoverable runtime condition.
#[derive(Debug, Error)]
#[error(
    "event at minute {start_minute} with duration {duration_minutes} \
    exceeds the annual bounds of {total_minutes} minutes"
)]
pub struct AssemblyRangeError {
    pub start_minute: usize,
    pub duration_minutes: usize,
    pub total_minutes: usize,
}

/// A per-dwelling failure, reported with the dwelling identifier attached so
/// sibling dwellings in a batch are unaffected.
#[derive(Debug, Error)]
#[error("schedule generation failed for dwelling '{dwelling_id}': {source}")]
pub struct DwellingError {
    pub dwelling_id: String,
    #[source]
    pub source: SchedGenError,
}
