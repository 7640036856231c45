use crate::core::probability::{ProbabilityDistribution, ProbabilityTable};
use crate::errors::DataLoadError;
use crate::simulation_year::HOURS_PER_DAY;
use indexmap::IndexMap;
use serde::Deserialize;
use std::io::{BufReader, Cursor};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

/// A category of water use with its own probability distributions.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Ord,
    PartialOrd,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndUse {
    Sink,
    Shower,
    Bath,
    Dishwasher,
    ClothesWasher,
}

/// Default cap on onset placement retries before a cluster is dropped.
pub const DEFAULT_PLACEMENT_RETRY_CAP: usize = 50;

/// One end use's event-generation policy: flow and duration parameters, the
/// minimum spacing between events, and the day-level count and onset-hour
/// distributions. Immutable after construction and shared by reference across
/// all simulated days and dwellings.
#[derive(Clone, Debug)]
pub struct UseEventSpec {
    pub end_use: EndUse,
    pub flow_rate_mean: f64,
    pub flow_rate_std: f64,
    pub duration_mean: f64,
    pub duration_std: f64,
    pub min_gap_minutes: usize,
    pub cluster_count_distribution: ProbabilityDistribution,
    pub onset_hour_distribution: ProbabilityDistribution,
    pub placement_retry_cap: usize,
}

// bundle the calibration CSVs into the binary
static CLUSTER_COUNTS_FILE: &str = include_str!("cluster_counts.csv");
static ONSET_HOURS_FILE: &str = include_str!("onset_hours.csv");
static EVENT_SHAPES_FILE: &str = include_str!("event_shapes.csv");

// represents a record from the event shapes file
#[derive(Debug, Deserialize)]
struct EventShapeRow {
    end_use: EndUse,
    flow_rate_mean: f64,
    flow_rate_std: f64,
    duration_mean: f64,
    duration_std: f64,
    min_gap_minutes: usize,
}

/// The full set of per-end-use event policies, loaded once at process start
/// and shared read-only by every dwelling generation run.
#[derive(Clone, Debug)]
pub struct UseSpecLibrary {
    specs: IndexMap<EndUse, Arc<UseEventSpec>>,
}

impl UseSpecLibrary {
    /// Build the library from the calibration tables bundled into the binary.
    pub fn built_in() -> Result<Self, DataLoadError> {
        let cluster_counts = ProbabilityTable::load(
            "cluster_counts.csv",
            BufReader::new(Cursor::new(CLUSTER_COUNTS_FILE)),
        )?;
        let onset_hours = ProbabilityTable::load(
            "onset_hours.csv",
            BufReader::new(Cursor::new(ONSET_HOURS_FILE)),
        )?;
        Self::from_tables("event_shapes.csv", EVENT_SHAPES_FILE, cluster_counts, onset_hours)
    }

    /// Build the library from externally supplied tables, validated the same
    /// way as the built-in ones.
    pub fn from_tables(
        shapes_resource: &str,
        shapes_csv: &str,
        cluster_counts: ProbabilityTable,
        onset_hours: ProbabilityTable,
    ) -> Result<Self, DataLoadError> {
        let mut specs = IndexMap::new();
        let mut shape_reader = csv::Reader::from_reader(BufReader::new(Cursor::new(shapes_csv)));
        for (row_idx, row) in shape_reader.deserialize().enumerate() {
            let row: EventShapeRow = row.map_err(|error| DataLoadError::Malformed {
                resource: shapes_resource.into(),
                row: row_idx + 2,
                reason: error.to_string(),
            })?;
            let key = row.end_use.to_string();
            let onset = onset_hours.distribution(&key)?.clone();
            if onset.len() != HOURS_PER_DAY {
                return Err(DataLoadError::Malformed {
                    resource: shapes_resource.into(),
                    row: row_idx + 2,
                    reason: format!(
                        "onset-hour distribution for '{key}' has {} entries, expected {HOURS_PER_DAY}",
                        onset.len()
                    ),
                });
            }
            specs.insert(
                row.end_use,
                Arc::new(UseEventSpec {
                    end_use: row.end_use,
                    flow_rate_mean: row.flow_rate_mean,
                    flow_rate_std: row.flow_rate_std,
                    duration_mean: row.duration_mean,
                    duration_std: row.duration_std,
                    min_gap_minutes: row.min_gap_minutes,
                    cluster_count_distribution: cluster_counts.distribution(&key)?.clone(),
                    onset_hour_distribution: onset,
                    placement_retry_cap: DEFAULT_PLACEMENT_RETRY_CAP,
                }),
            );
        }
        Ok(Self { specs })
    }

    pub fn spec(&self, end_use: EndUse) -> Option<&Arc<UseEventSpec>> {
        self.specs.get(&end_use)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EndUse, &Arc<UseEventSpec>)> {
        self.specs.iter().map(|(end_use, spec)| (*end_use, spec))
    }

    pub fn end_uses(&self) -> impl Iterator<Item = EndUse> + '_ {
        self.specs.keys().copied()
    }
}
