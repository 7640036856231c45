use crate::core::assembler::{assemble_annual, AnnualSchedule};
use crate::core::cluster::{EndUseStats, Event, EventClusterGenerator};
use crate::core::sampling::RandomStream;
use crate::core::use_spec::{EndUse, UseSpecLibrary};
use crate::errors::{DwellingError, SchedGenError};
use crate::simulation_year::{VacancyWindow, DAYS_PER_YEAR};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

/// The narrow slice of host-model context the generator needs for one
/// dwelling, decoupled from any host object graph.
#[derive(Clone, Debug, Deserialize)]
pub struct DwellingContext {
    pub id: String,
    pub occupants: f64,
    /// Floor area in m2, carried for distributions parameterised on it.
    pub floor_area: Option<f64>,
    pub vacancy: Option<VacancyWindow>,
}

/// The generated output for one dwelling: an annual schedule per end use,
/// plus the event lists and placement counters behind them.
#[derive(Clone, Debug)]
pub struct DwellingSchedules {
    pub dwelling_id: String,
    /// The seed this dwelling's stream was derived from.
    pub seed: u64,
    pub schedules: IndexMap<EndUse, AnnualSchedule>,
    pub events: IndexMap<EndUse, Vec<Event>>,
    pub stats: IndexMap<EndUse, EndUseStats>,
}

/// Generate all end-use schedules for one dwelling.
///
/// The dwelling's stream is derived from the base seed and the dwelling
/// identifier, and draws are made in a fixed order: end uses in library
/// order, days in calendar order within each end use. Re-running with the
/// same seed and context reproduces bit-identical output.
pub fn generate_dwelling(
    context: &DwellingContext,
    library: &UseSpecLibrary,
    steps_per_day: usize,
    base_seed: u64,
) -> Result<DwellingSchedules, SchedGenError> {
    let mut rng = RandomStream::for_dwelling(base_seed, &context.id);

    let mut schedules = IndexMap::new();
    let mut events_by_use = IndexMap::new();
    let mut stats_by_use = IndexMap::new();
    for (end_use, spec) in library.iter() {
        let generator = EventClusterGenerator::new(spec, context.occupants)?;
        let mut events: Vec<Event> = Vec::new();
        let mut stats = EndUseStats::default();
        for day in 0..DAYS_PER_YEAR {
            events.extend(generator.generate_day(&mut rng, day, &mut stats)?);
        }
        if stats.dropped > 0 {
            debug!(
                dwelling = %context.id,
                end_use = %end_use,
                dropped = stats.dropped,
                "clusters dropped after placement retry exhaustion"
            );
        }

        let schedule = assemble_annual(&events, steps_per_day, |day| {
            context
                .vacancy
                .is_some_and(|window| window.contains_day(day))
        })?;
        schedules.insert(end_use, schedule);
        events_by_use.insert(end_use, events);
        stats_by_use.insert(end_use, stats);
    }

    Ok(DwellingSchedules {
        dwelling_id: context.id.clone(),
        seed: base_seed,
        schedules,
        events: events_by_use,
        stats: stats_by_use,
    })
}

/// Generate schedules for a batch of dwellings in parallel.
///
/// Each dwelling owns an independently-seeded stream, so results do not
/// depend on worker scheduling, and a failure in one dwelling is reported
/// with its identifier without affecting the others.
pub fn generate_batch(
    contexts: &[DwellingContext],
    library: &UseSpecLibrary,
    steps_per_day: usize,
    base_seed: u64,
) -> Vec<Result<DwellingSchedules, DwellingError>> {
    contexts
        .par_iter()
        .map(|context| {
            generate_dwelling(context, library, steps_per_day, base_seed).map_err(|source| {
                DwellingError {
                    dwelling_id: context.id.clone(),
                    source,
                }
            })
        })
        .collect()
}
