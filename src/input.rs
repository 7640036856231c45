use crate::core::dwelling::DwellingContext;
use crate::simulation_year::{VacancyWindow, MINUTES_PER_DAY};
use anyhow::{anyhow, bail, Context};
use itertools::Itertools;
use serde::Deserialize;
use std::io::Read;

/// A batch generation request as provided in JSON.
#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    /// Base random seed. Absent means time-based, non-reproducible seeding,
    /// which is flagged to the caller.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Output resolution; defaults to minute resolution.
    #[serde(default = "default_steps_per_day")]
    pub steps_per_day: usize,
    pub dwellings: Vec<DwellingInput>,
}

fn default_steps_per_day() -> usize {
    MINUTES_PER_DAY
}

#[derive(Debug, Deserialize)]
pub struct DwellingInput {
    pub id: String,
    pub occupants: f64,
    #[serde(default)]
    pub floor_area: Option<f64>,
    #[serde(default)]
    pub vacancy: Option<VacancyInput>,
}

/// Vacancy as provided in input: either the "none" sentinel or a pair of
/// month-day date strings, both endpoints inclusive.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VacancyInput {
    Sentinel(String),
    Dates { start: String, end: String },
}

pub fn ingest_batch_config(input: impl Read) -> anyhow::Result<BatchConfig> {
    let config: BatchConfig =
        serde_json::from_reader(input).context("batch config was not valid JSON")?;

    if config.steps_per_day == 0 || MINUTES_PER_DAY % config.steps_per_day != 0 {
        bail!(
            "steps_per_day ({}) must divide the {} minutes in a day",
            config.steps_per_day,
            MINUTES_PER_DAY
        );
    }
    if config.dwellings.is_empty() {
        bail!("batch config contains no dwellings");
    }
    // duplicate identifiers would make the derived per-dwelling seeds collide
    let duplicates = config
        .dwellings
        .iter()
        .map(|dwelling| dwelling.id.as_str())
        .duplicates()
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        bail!("duplicate dwelling identifiers in batch config: {duplicates:?}");
    }

    Ok(config)
}

impl DwellingInput {
    pub fn into_context(self) -> anyhow::Result<DwellingContext> {
        if !(self.occupants.is_finite() && self.occupants > 0.0) {
            bail!(
                "dwelling '{}' has a non-positive occupant count ({})",
                self.id,
                self.occupants
            );
        }
        let vacancy = match self.vacancy {
            None => None,
            Some(VacancyInput::Sentinel(sentinel)) => {
                if sentinel != "none" {
                    return Err(anyhow!(
                        "dwelling '{}' has unrecognised vacancy value '{sentinel}' \
                        (expected \"none\" or start/end dates)",
                        self.id
                    ));
                }
                None
            }
            Some(VacancyInput::Dates { start, end }) => Some(
                VacancyWindow::from_date_strings(&start, &end)
                    .with_context(|| format!("invalid vacancy window for dwelling '{}'", self.id))?,
            ),
        };
        Ok(DwellingContext {
            id: self.id,
            occupants: self.occupants,
            floor_area: self.floor_area,
            vacancy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde_json::json;

    fn config_from(value: serde_json::Value) -> anyhow::Result<BatchConfig> {
        ingest_batch_config(value.to_string().as_bytes())
    }

    #[rstest]
    fn test_minimal_config_ingests() {
        let config = config_from(json!({
            "seed": 42,
            "dwellings": [{"id": "bldg0001", "occupants": 2.0}]
        }))
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.steps_per_day, MINUTES_PER_DAY);
    }

    #[rstest]
    fn test_vacancy_dates_parse_to_window() {
        let config = config_from(json!({
            "dwellings": [{
                "id": "bldg0001",
                "occupants": 2.0,
                "vacancy": {"start": "Jun 1", "end": "Jun 14"}
            }]
        }))
        .unwrap();
        let context = config.dwellings.into_iter().next().unwrap().into_context().unwrap();
        let window = context.vacancy.unwrap();
        assert!(window.contains_day(151));
        assert!(!window.contains_day(165));
    }

    #[rstest]
    fn test_vacancy_none_sentinel_means_never_vacant() {
        let config = config_from(json!({
            "dwellings": [{"id": "bldg0001", "occupants": 2.0, "vacancy": "none"}]
        }))
        .unwrap();
        let context = config.dwellings.into_iter().next().unwrap().into_context().unwrap();
        assert!(context.vacancy.is_none());
    }

    #[rstest]
    fn test_unrecognised_vacancy_sentinel_rejected() {
        let config = config_from(json!({
            "dwellings": [{"id": "bldg0001", "occupants": 2.0, "vacancy": "sometimes"}]
        }))
        .unwrap();
        assert!(config.dwellings.into_iter().next().unwrap().into_context().is_err());
    }

    #[rstest]
    fn test_non_positive_occupants_rejected() {
        let config = config_from(json!({
            "dwellings": [{"id": "bldg0001", "occupants": 0.0}]
        }))
        .unwrap();
        assert!(config.dwellings.into_iter().next().unwrap().into_context().is_err());
    }

    #[rstest]
    fn test_duplicate_dwelling_ids_rejected() {
        assert!(config_from(json!({
            "dwellings": [
                {"id": "bldg0001", "occupants": 2.0},
                {"id": "bldg0001", "occupants": 3.0}
            ]
        }))
        .is_err());
    }

    #[rstest]
    fn test_indivisible_steps_per_day_rejected() {
        assert!(config_from(json!({
            "steps_per_day": 7,
            "dwellings": [{"id": "bldg0001", "occupants": 2.0}]
        }))
        .is_err());
    }
}
