use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitweek_core::models::{DailyWellnessMetric, NewWellnessMetric};
use fitweek_core::service::PlanSyncService;

use super::helpers::{parse_date, print_json, truncate};

/// Scores in the order energy, mood, sleep, strength, motivation, recovery.
pub(crate) struct WellnessScores {
    pub energy: u8,
    pub mood: u8,
    pub sleep: u8,
    pub strength: u8,
    pub motivation: u8,
    pub recovery: u8,
}

pub(crate) fn cmd_wellness_log(
    service: &PlanSyncService,
    user: &str,
    scores: WellnessScores,
    date: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let metric = NewWellnessMetric {
        user_id: user.to_string(),
        date,
        energy: scores.energy,
        mood: scores.mood,
        sleep: scores.sleep,
        strength: scores.strength,
        motivation: scores.motivation,
        recovery: scores.recovery,
        notes,
    };

    let saved = service.log_wellness(&metric)?;

    if json {
        print_json(&saved)?;
    } else {
        println!("Logged wellness for {}", saved.date.format("%Y-%m-%d"));
        print_scores(&saved);
    }
    Ok(())
}

pub(crate) fn cmd_wellness_show(
    service: &PlanSyncService,
    user: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let Some(metric) = service.wellness_on(user, date)? else {
        eprintln!("No wellness entry for {}", date.format("%Y-%m-%d"));
        process::exit(2);
    };

    if json {
        print_json(&metric)?;
    } else {
        println!("=== {} ===", metric.date.format("%Y-%m-%d"));
        print_scores(&metric);
    }
    Ok(())
}

fn print_scores(m: &DailyWellnessMetric) {
    println!(
        "  Energy {} | Mood {} | Sleep {} | Strength {} | Motivation {} | Recovery {}",
        m.energy, m.mood, m.sleep, m.strength, m.motivation, m.recovery
    );
    if let Some(ref n) = m.notes {
        println!("  Notes: {n}");
    }
}

pub(crate) fn cmd_wellness_history(
    service: &PlanSyncService,
    user: &str,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct WellnessRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Energy")]
        energy: u8,
        #[tabled(rename = "Mood")]
        mood: u8,
        #[tabled(rename = "Sleep")]
        sleep: u8,
        #[tabled(rename = "Strength")]
        strength: u8,
        #[tabled(rename = "Motivation")]
        motivation: u8,
        #[tabled(rename = "Recovery")]
        recovery: u8,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let entries = service.wellness_history(user, limit)?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        eprintln!("No wellness entries for {user}");
        process::exit(2);
    }

    let rows: Vec<WellnessRow> = entries
        .iter()
        .map(|m| WellnessRow {
            date: m.date.format("%Y-%m-%d").to_string(),
            energy: m.energy,
            mood: m.mood,
            sleep: m.sleep,
            strength: m.strength,
            motivation: m.motivation,
            recovery: m.recovery,
            notes: m.notes.as_deref().map(|n| truncate(n, 30)).unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
