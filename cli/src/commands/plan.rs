use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitweek_core::aggregate::{day_total, meal_total, week_total};
use fitweek_core::models::{MealSlot, WeekDay};
use fitweek_core::plan::WeeklyDietPlan;
use fitweek_core::service::PlanSyncService;

use super::helpers::{format_totals, no_neg_zero, parse_date, print_json};

/// Resolve `--day`, falling back to the weekday of the referenced date.
fn resolve_day(day: Option<&str>, date: chrono::NaiveDate) -> Result<WeekDay> {
    match day {
        Some(d) => Ok(d.parse()?),
        None => Ok(WeekDay::of(date)),
    }
}

pub(crate) fn cmd_plan_show(
    service: &PlanSyncService,
    user: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let plan = service.get_plan(user, date)?;

    if json {
        return print_json(&plan);
    }

    if plan.is_empty() {
        eprintln!(
            "No foods planned for the week of {}",
            plan.week_start_date.format("%Y-%m-%d")
        );
        process::exit(2);
    }

    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &WeeklyDietPlan) {
    println!(
        "=== Week of {} ({}) ===\n",
        plan.week_start_date.format("%Y-%m-%d"),
        plan.user_id
    );

    for day in WeekDay::ALL {
        if MealSlot::ALL
            .iter()
            .all(|&slot| plan.entries(day, slot).is_empty())
        {
            continue;
        }
        println!("{} {}", day.name().to_uppercase(), plan.date_of(day).format("%Y-%m-%d"));
        for slot in MealSlot::ALL {
            let entries = plan.entries(day, slot);
            if entries.is_empty() {
                continue;
            }
            let sub = meal_total(plan, day, slot);
            println!("  {slot} ({:.0} kcal)", no_neg_zero(sub.calories));
            for e in entries {
                let kcal = e.nutrients.calories * e.quantity;
                println!(
                    "    [{}] {} x{} | {kcal:.0} kcal",
                    e.food_id, e.name, e.quantity
                );
            }
        }
        println!("  TOTAL: {}\n", format_totals(&day_total(plan, day)));
    }

    println!("WEEK: {}", format_totals(&week_total(plan)));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_plan_add(
    service: &PlanSyncService,
    user: &str,
    food_id: &str,
    meal: &str,
    day: Option<&str>,
    quantity: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let slot: MealSlot = meal.parse()?;
    let day = resolve_day(day, date)?;
    let entry = service.catalog_entry(food_id, quantity)?;
    let name = entry.name.clone();

    let before = service.get_plan(user, date)?;
    let already = before.contains(day, slot, food_id.trim());
    let plan = service.add_food(user, date, day, slot, entry)?;

    if json {
        return print_json(&plan);
    }

    if already {
        println!("{name} is already planned for {day} {slot}");
    } else {
        let total = meal_total(&plan, day, slot);
        println!(
            "Added {name} x{quantity} to {day} {slot} ({:.0} kcal in {slot})",
            no_neg_zero(total.calories)
        );
    }
    Ok(())
}

pub(crate) fn cmd_plan_remove(
    service: &PlanSyncService,
    user: &str,
    food_id: &str,
    meal: &str,
    day: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let slot: MealSlot = meal.parse()?;
    let day = resolve_day(day, date)?;

    let before = service.get_plan(user, date)?;
    let present = before.contains(day, slot, food_id.trim());
    let plan = service.remove_food(user, date, day, slot, food_id)?;

    if json {
        return print_json(&plan);
    }

    if present {
        println!("Removed {food_id} from {day} {slot}");
    } else {
        eprintln!("{food_id} was not planned for {day} {slot}; nothing changed");
    }
    Ok(())
}

pub(crate) fn cmd_plan_totals(
    service: &PlanSyncService,
    user: &str,
    date: Option<String>,
    target: Option<f64>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct TotalsRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
        #[tabled(rename = "Sugar")]
        sugar: String,
        #[tabled(rename = "% Target")]
        percent: String,
    }

    let date = parse_date(date)?;
    let totals = service.plan_totals(user, date, target)?;

    if json {
        return print_json(&totals);
    }

    let mut rows: Vec<TotalsRow> = totals
        .days
        .iter()
        .map(|d| {
            let t = &d.total;
            TotalsRow {
                day: d.day.to_string(),
                date: d.date.format("%Y-%m-%d").to_string(),
                calories: format!("{:.0}", no_neg_zero(t.calories)),
                protein: format!("{:.1}g", no_neg_zero(t.protein)),
                carbs: format!("{:.1}g", no_neg_zero(t.carbs)),
                fat: format!("{:.1}g", no_neg_zero(t.fat)),
                fiber: format!("{:.1}g", no_neg_zero(t.fiber)),
                sugar: format!("{:.1}g", no_neg_zero(t.sugar)),
                percent: d
                    .calorie_percent
                    .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%")),
            }
        })
        .collect();

    let w = &totals.week;
    rows.push(TotalsRow {
        day: "Week".to_string(),
        date: String::new(),
        calories: format!("{:.0}", no_neg_zero(w.calories)),
        protein: format!("{:.1}g", no_neg_zero(w.protein)),
        carbs: format!("{:.1}g", no_neg_zero(w.carbs)),
        fat: format!("{:.1}g", no_neg_zero(w.fat)),
        fiber: format!("{:.1}g", no_neg_zero(w.fiber)),
        sugar: format!("{:.1}g", no_neg_zero(w.sugar)),
        percent: String::new(),
    });

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_resolve_day_defaults_to_weekday_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(resolve_day(None, date).unwrap(), WeekDay::Wednesday);
        assert_eq!(resolve_day(Some("fri"), date).unwrap(), WeekDay::Friday);
        assert!(resolve_day(Some("funday"), date).is_err());
    }
}
