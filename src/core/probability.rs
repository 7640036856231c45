use crate::errors::DataLoadError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Tolerance within which the probabilities for one empirical quantity must
/// sum to 1.0.
pub const PROBABILITY_MASS_TOLERANCE: f64 = 1e-3;

/// An ordered sequence of (value, probability) pairs for one empirical
/// quantity, pre-parsed and validated at load time. Immutable once built;
/// consumers only ever read it.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityDistribution {
    values: Vec<f64>,
    probabilities: Vec<f64>,
}

impl ProbabilityDistribution {
    pub(crate) fn new(
        resource: &str,
        key: &str,
        pairs: Vec<(f64, f64)>,
    ) -> Result<Self, DataLoadError> {
        if pairs.is_empty() {
            return Err(DataLoadError::MissingKey {
                resource: resource.into(),
                key: key.into(),
            });
        }
        let sum: f64 = pairs.iter().map(|(_, p)| p).sum();
        if !is_close!(sum, 1.0, rel_tol = 0.0, abs_tol = PROBABILITY_MASS_TOLERANCE) {
            return Err(DataLoadError::BadProbabilityMass {
                resource: resource.into(),
                key: key.into(),
                sum,
                tolerance: PROBABILITY_MASS_TOLERANCE,
            });
        }
        let (values, probabilities) = pairs.into_iter().unzip();
        Ok(Self {
            values,
            probabilities,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of a probability resource file. The value column is named for what
/// it holds in each file ("count", "hour").
#[derive(Debug, Deserialize)]
struct DistributionRow {
    end_use: String,
    #[serde(alias = "count", alias = "hour")]
    value: f64,
    probability: f64,
}

/// A CSV-backed set of probability distributions, keyed by end use. Loaded
/// once at process start and shared read-only across all dwelling generation
/// runs.
#[derive(Clone, Debug)]
pub struct ProbabilityTable {
    resource: String,
    distributions: IndexMap<String, ProbabilityDistribution>,
}

impl ProbabilityTable {
    /// Load and validate a probability table from CSV content.
    ///
    /// Arguments:
    /// * `resource_identifier` - name used in error reporting (path or name of
    ///                           the embedded resource)
    /// * `reader` - the CSV content, with an `end_use,<value>,probability` header
    pub fn load(resource_identifier: &str, reader: impl Read) -> Result<Self, DataLoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut pairs_by_key: IndexMap<String, Vec<(f64, f64)>> = IndexMap::new();
        for (row_idx, row) in csv_reader.deserialize().enumerate() {
            // header is row 1
            let row_number = row_idx + 2;
            let row: DistributionRow = row.map_err(|error| DataLoadError::Malformed {
                resource: resource_identifier.into(),
                row: row_number,
                reason: error.to_string(),
            })?;
            if !row.probability.is_finite() || row.probability < 0.0 {
                return Err(DataLoadError::Malformed {
                    resource: resource_identifier.into(),
                    row: row_number,
                    reason: format!(
                        "probability {} for '{}' is not a non-negative number",
                        row.probability, row.end_use
                    ),
                });
            }
            pairs_by_key
                .entry(row.end_use)
                .or_default()
                .push((row.value, row.probability));
        }

        let mut distributions = IndexMap::with_capacity(pairs_by_key.len());
        for (key, pairs) in pairs_by_key {
            let distribution = ProbabilityDistribution::new(resource_identifier, &key, pairs)?;
            distributions.insert(key, distribution);
        }

        Ok(Self {
            resource: resource_identifier.into(),
            distributions,
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, DataLoadError> {
        let resource = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|error| DataLoadError::Unreadable {
            resource: resource.clone(),
            source: csv::Error::from(error),
        })?;
        Self::load(&resource, BufReader::new(file))
    }

    pub fn distribution(&self, key: &str) -> Result<&ProbabilityDistribution, DataLoadError> {
        self.distributions
            .get(key)
            .ok_or_else(|| DataLoadError::MissingKey {
                resource: self.resource.clone(),
                key: key.into(),
            })
    }
}
