use anyhow::Result;
use std::process;

use fitweek_core::cycle::PhaseReport;
use fitweek_core::service::PlanSyncService;

use super::helpers::{parse_date, print_json};

pub(crate) fn cmd_cycle_log(
    service: &PlanSyncService,
    user: &str,
    date: Option<String>,
    length: Option<u32>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let profile = service.record_period_start(user, date, length)?;

    if json {
        print_json(&profile)?;
    } else {
        println!(
            "Period start recorded for {} ({}-day cycle)",
            profile.last_period_start_date.format("%Y-%m-%d"),
            profile.cycle_length_days
        );
    }
    Ok(())
}

pub(crate) fn cmd_cycle_show(service: &PlanSyncService, user: &str, json: bool) -> Result<()> {
    let Some(profile) = service.cycle_profile(user)? else {
        eprintln!("No cycle data for {user}. Record one with `fitweek cycle log`");
        process::exit(2);
    };

    if json {
        print_json(&profile)?;
    } else {
        println!("User:              {}", profile.user_id);
        println!(
            "Last period start: {}",
            profile.last_period_start_date.format("%Y-%m-%d")
        );
        println!("Cycle length:      {} days", profile.cycle_length_days);
        println!("Updated:           {}", profile.updated_at);
    }
    Ok(())
}

pub(crate) fn cmd_cycle_phase(
    service: &PlanSyncService,
    user: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let report = service.phase_on(user, date)?;

    if json {
        return print_json(&report);
    }
    print_phase(&report);
    Ok(())
}

fn print_phase(report: &PhaseReport) {
    println!("=== {} ===", report.date.format("%Y-%m-%d"));
    match (report.cycle_day, report.cycle_length_days) {
        (Some(day), Some(len)) => println!("{} phase, day {day} of {len}", report.phase),
        _ => println!("{} phase (no cycle data recorded)", report.phase),
    }
    if let Some(next) = report.next_period_start {
        println!("Next period expected: {}", next.format("%Y-%m-%d"));
    }
    println!();
    println!("  Workout:   {}", report.guidance.workout_focus);
    println!("  Nutrition: {}", report.guidance.nutrition_focus);
}
