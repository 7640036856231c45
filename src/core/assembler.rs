use crate::core::cluster::Event;
use crate::errors::AssemblyRangeError;
use crate::simulation_year::{MINUTES_PER_DAY, MINUTES_PER_YEAR};

/// A fixed-length numeric time series covering the simulated year for one end
/// use, the final output artifact. Built once by [`assemble`] and immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnualSchedule {
    values: Vec<f64>,
    steps_per_day: usize,
}

impl AnnualSchedule {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn steps_per_day(&self) -> usize {
        self.steps_per_day
    }

    pub fn total_steps(&self) -> usize {
        self.values.len()
    }

    pub fn day_slice(&self, day_index: usize) -> &[f64] {
        let start = day_index * self.steps_per_day;
        &self.values[start..start + self.steps_per_day]
    }
}

/// Lay a year's events for one end use onto the fixed-timestep annual grid.
///
/// Each minute an event spans contributes its flow rate to the timestep
/// containing that minute; concurrent events of the same end use add rather
/// than overwrite. Days inside the vacancy window are zeroed after
/// accumulation, overriding any generated events.
///
/// Arguments:
/// * `events` - the year's events, with annual minute offsets
/// * `steps_per_day` - output resolution; must divide the minutes in a day
/// * `total_days` - length of the simulated year in days
/// * `vacant_days` - day ordinals to force to zero
pub fn assemble(
    events: &[Event],
    steps_per_day: usize,
    total_days: usize,
    vacant_days: impl Fn(usize) -> bool,
) -> Result<AnnualSchedule, AssemblyRangeError> {
    assert!(
        steps_per_day > 0 && MINUTES_PER_DAY % steps_per_day == 0,
        "steps_per_day ({steps_per_day}) must divide {MINUTES_PER_DAY}"
    );
    let minutes_per_step = MINUTES_PER_DAY / steps_per_day;
    let total_minutes = total_days * MINUTES_PER_DAY;
    let mut values = vec![0.0; total_days * steps_per_day];

    for event in events {
        // an out-of-bounds span is a bug in upstream event placement
        if event.end_minute() > total_minutes {
            return Err(AssemblyRangeError {
                start_minute: event.start_minute,
                duration_minutes: event.duration_minutes,
                total_minutes,
            });
        }
        for minute in event.start_minute..event.end_minute() {
            values[minute / minutes_per_step] += event.flow_rate;
        }
    }

    for day in 0..total_days {
        if vacant_days(day) {
            let day_start = day * steps_per_day;
            values[day_start..day_start + steps_per_day].fill(0.0);
        }
    }

    Ok(AnnualSchedule {
        values,
        steps_per_day,
    })
}

/// Assemble over a full 365-day year.
pub fn assemble_annual(
    events: &[Event],
    steps_per_day: usize,
    vacant_days: impl Fn(usize) -> bool,
) -> Result<AnnualSchedule, AssemblyRangeError> {
    assemble(events, steps_per_day, MINUTES_PER_YEAR / MINUTES_PER_DAY, vacant_days)
}
