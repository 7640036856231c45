use crate::core::dwelling::{generate_dwelling, DwellingContext};
use crate::core::use_spec::{EndUse, UseSpecLibrary};
use crate::output::{FileOutput, SinkOutput};
use crate::run_batch;
use crate::simulation_year::{VacancyWindow, DAYS_PER_YEAR, MINUTES_PER_DAY};
use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::json;

#[fixture]
fn library() -> UseSpecLibrary {
    UseSpecLibrary::built_in().unwrap()
}

fn context(vacancy: Option<VacancyWindow>) -> DwellingContext {
    DwellingContext {
        id: "bldg0001".into(),
        occupants: 2.0,
        floor_area: Some(120.0),
        vacancy,
    }
}

#[rstest]
fn test_generation_is_deterministic_for_fixed_seed(library: UseSpecLibrary) {
    let first = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 42).unwrap();
    let second = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 42).unwrap();
    assert_eq!(first.events, second.events);
    assert_eq!(first.schedules, second.schedules);
    assert_eq!(first.stats, second.stats);
}

#[rstest]
fn test_different_seeds_diverge(library: UseSpecLibrary) {
    let first = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 42).unwrap();
    let second = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 43).unwrap();
    assert_ne!(first.events, second.events);
}

#[rstest]
fn test_vacancy_window_sums_to_zero(library: UseSpecLibrary) {
    let vacancy = VacancyWindow::from_date_strings("Jun 1", "Jun 14").unwrap();
    let result =
        generate_dwelling(&context(Some(vacancy)), &library, MINUTES_PER_DAY, 42).unwrap();
    for end_use in library.end_uses() {
        let schedule = &result.schedules[&end_use];
        for day in 0..DAYS_PER_YEAR {
            let day_total: f64 = schedule.day_slice(day).iter().sum();
            if vacancy.contains_day(day) {
                assert_eq!(day_total, 0.0, "{end_use} day {day} not zeroed");
            }
        }
        // the year as a whole still has demand
        assert!(schedule.values().iter().sum::<f64>() > 0.0);
    }
}

#[rstest]
fn test_annual_sink_event_rate_matches_calibration(library: UseSpecLibrary) {
    // calibration: 6657 sink clusters per 2-occupant household-year
    let result = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 42).unwrap();
    let sink_events = &result.events[&EndUse::Sink];
    let mean_daily = sink_events.len() as f64 / DAYS_PER_YEAR as f64;
    let expected = 6657.0 / 365.0;
    assert!(
        (mean_daily - expected).abs() / expected < 0.1,
        "mean daily sink events {mean_daily} outside 10% of {expected}"
    );
    for event in sink_events {
        assert!(event.duration_minutes > 0);
        assert!(event.flow_rate > 0.0);
    }
}

#[rstest]
fn test_all_events_within_annual_bounds(library: UseSpecLibrary) {
    let result = generate_dwelling(&context(None), &library, MINUTES_PER_DAY, 7).unwrap();
    for (end_use, events) in &result.events {
        for event in events {
            assert!(
                event.end_minute() <= DAYS_PER_YEAR * MINUTES_PER_DAY,
                "{end_use} event {event:?} escapes the year"
            );
        }
    }
}

#[rstest]
fn test_run_batch_reports_completion() {
    let config = json!({
        "seed": 42,
        "dwellings": [
            {"id": "bldg0001", "occupants": 2.0},
            {"id": "bldg0002", "occupants": 3.5, "vacancy": {"start": "Dec 15", "end": "Jan 5"}}
        ]
    });
    let summary = run_batch(config.to_string().as_bytes(), SinkOutput).unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.base_seed, 42);
    assert!(!summary.seed_was_time_based);
    assert!(summary.failures.is_empty());
}

#[rstest]
fn test_run_batch_without_seed_flags_non_reproducibility() {
    let config = json!({
        "dwellings": [{"id": "bldg0001", "occupants": 1.0}]
    });
    let summary = run_batch(config.to_string().as_bytes(), SinkOutput).unwrap();
    assert!(summary.seed_was_time_based);
}

#[rstest]
fn test_run_batch_writes_csv_per_dwelling() {
    let output_dir = std::env::temp_dir().join(format!(
        "schedgen-test-{}-{}",
        std::process::id(),
        line!()
    ));
    std::fs::create_dir_all(&output_dir).unwrap();
    let config = json!({
        "seed": 42,
        "steps_per_day": 24,
        "dwellings": [{"id": "bldg0001", "occupants": 2.0}]
    });
    run_batch(
        config.to_string().as_bytes(),
        FileOutput::new(output_dir.clone()),
    )
    .unwrap();

    let contents = std::fs::read_to_string(output_dir.join("bldg0001.csv")).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Timestep,sink,shower,bath,dishwasher,clothes_washer"
    );
    assert_eq!(
        lines.next().unwrap(),
        "[count],[l/min],[l/min],[l/min],[l/min],[l/min]"
    );
    // header + units + one row per hourly step of the year
    assert_eq!(contents.lines().count(), 2 + DAYS_PER_YEAR * 24);

    std::fs::remove_dir_all(&output_dir).unwrap();
}
