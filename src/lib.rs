pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod simulation_year;

#[macro_use]
extern crate is_close;

#[cfg(test)]
mod tests;

pub use crate::core::dwelling::{generate_batch, generate_dwelling, DwellingContext, DwellingSchedules};
pub use crate::core::use_spec::{EndUse, UseSpecLibrary};

use crate::core::sampling::RandomStream;
use crate::errors::DwellingError;
use crate::input::ingest_batch_config;
use crate::output::Output;
use csv::WriterBuilder;
use itertools::Itertools;
use std::io::Read;
use tracing::{error, warn};

/// Outcome of a batch run: per-dwelling failures are collected here rather
/// than aborting their siblings.
#[derive(Debug)]
pub struct BatchSummary {
    pub base_seed: u64,
    /// Set when no seed was configured and a wall-clock seed was substituted,
    /// making the run non-reproducible.
    pub seed_was_time_based: bool,
    pub completed: usize,
    pub failures: Vec<DwellingError>,
}

/// Run schedule generation for a whole batch config, writing one schedule
/// file per dwelling to the output.
pub fn run_batch(input: impl Read, output: impl Output) -> anyhow::Result<BatchSummary> {
    let config = ingest_batch_config(input)?;

    let (base_seed, seed_was_time_based) = match config.seed {
        Some(seed) => (seed, false),
        None => {
            let seed = RandomStream::time_based_seed();
            warn!(seed, "no random seed configured; this run is not reproducible");
            (seed, true)
        }
    };

    let contexts = config
        .dwellings
        .into_iter()
        .map(|dwelling| dwelling.into_context())
        .collect::<anyhow::Result<Vec<_>>>()?;

    let library = UseSpecLibrary::built_in()?;
    let results = generate_batch(&contexts, &library, config.steps_per_day, base_seed);

    let mut completed = 0;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(schedules) => {
                if !output.is_noop() {
                    write_schedule_file(&output, &schedules)?;
                }
                completed += 1;
            }
            Err(failure) => {
                error!(dwelling = %failure.dwelling_id, "{failure}");
                failures.push(failure);
            }
        }
    }

    Ok(BatchSummary {
        base_seed,
        seed_was_time_based,
        completed,
        failures,
    })
}

/// Write one dwelling's schedules as a CSV time series: a timestep column
/// followed by one column per end use.
fn write_schedule_file(
    output: &impl Output,
    schedules: &DwellingSchedules,
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(&schedules.dwelling_id)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    let mut headings = vec!["Timestep".to_string()];
    let mut units_row = vec!["[count]"];
    for end_use in schedules.schedules.keys() {
        headings.push(end_use.to_string());
        units_row.push("[l/min]");
    }
    writer.write_record(&headings)?;
    writer.write_record(&units_row)?;

    let total_steps = schedules
        .schedules
        .values()
        .map(|schedule| schedule.total_steps())
        .all_equal_value()
        .map_err(|_| anyhow::anyhow!("end-use schedules have differing lengths"))?;

    for step in 0..total_steps {
        let mut row = vec![step.to_string()];
        for schedule in schedules.schedules.values() {
            row.push(schedule.values()[step].to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;

    Ok(())
}
