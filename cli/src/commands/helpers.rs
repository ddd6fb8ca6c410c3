use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitweek_core::aggregate::NutrientTotals;
use fitweek_core::models::{CatalogFood, DATE_FORMAT};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, DATE_FORMAT).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_food_table(foods: &[CatalogFood]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
        #[tabled(rename = "Sugar")]
        sugar: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let n = &f.nutrients;
            FoodRow {
                idx: i + 1,
                id: truncate(&f.food_id, 24),
                name: truncate(&f.name, 35),
                calories: format!("{:.0}", n.calories),
                protein: format!("{:.1}", n.protein),
                carbs: format!("{:.1}", n.carbs),
                fat: format!("{:.1}", n.fat),
                fiber: format!("{:.1}", n.fiber),
                sugar: format!("{:.1}", n.sugar),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_totals(t: &NutrientTotals) -> String {
    format!(
        "{:.0} kcal | P {:.1}g | C {:.1}g | F {:.1}g | Fiber {:.1}g | Sugar {:.1}g",
        no_neg_zero(t.calories),
        no_neg_zero(t.protein),
        no_neg_zero(t.carbs),
        no_neg_zero(t.fat),
        no_neg_zero(t.fiber),
        no_neg_zero(t.sugar),
    )
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-03-04".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("next week".to_string())).is_err());
    }

    #[test]
    fn test_format_totals() {
        let totals = NutrientTotals {
            calories: 52.0,
            protein: 0.3,
            carbs: 14.0,
            fat: 0.2,
            fiber: 2.4,
            sugar: 10.0,
        };
        assert_eq!(
            format_totals(&totals),
            "52 kcal | P 0.3g | C 14.0g | F 0.2g | Fiber 2.4g | Sugar 10.0g"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("oats", 10), "oats");
        assert_eq!(truncate("Crème fraîche allégée", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert!((no_neg_zero(5.0) - 5.0).abs() < f64::EPSILON);
    }
}
