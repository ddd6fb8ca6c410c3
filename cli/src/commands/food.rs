use std::path::Path;

use anyhow::{Context, Result};
use std::process;

use fitweek_core::models::{NewCatalogFood, NutrientProfile};
use fitweek_core::service::PlanSyncService;

use super::helpers::{print_food_table, print_json};

pub(crate) fn cmd_food_add(
    service: &PlanSyncService,
    food_id: &str,
    name: &str,
    nutrients: NutrientProfile,
    json: bool,
) -> Result<()> {
    let food = service.add_catalog_food(&NewCatalogFood {
        food_id: food_id.to_string(),
        name: name.to_string(),
        nutrients,
    })?;

    if json {
        print_json(&food)?;
    } else {
        println!(
            "Saved {} [{}]: {:.0} kcal, P {:.1}g, C {:.1}g, F {:.1}g",
            food.name,
            food.food_id,
            food.nutrients.calories,
            food.nutrients.protein,
            food.nutrients.carbs,
            food.nutrients.fat
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_list(
    service: &PlanSyncService,
    search: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let foods = service.list_catalog(search, limit)?;

    if json {
        return print_json(&foods);
    }

    if foods.is_empty() {
        match search {
            Some(q) => eprintln!("No catalog foods matching '{q}'"),
            None => eprintln!("The food catalog is empty. Add foods with `fitweek food add`"),
        }
        process::exit(2);
    }

    print_food_table(&foods);
    Ok(())
}

pub(crate) fn cmd_food_top(service: &PlanSyncService, json: bool) -> Result<()> {
    let top = service.top_foods()?;

    if json {
        return print_json(&top);
    }

    for (label, foods) in [
        ("BREAKFAST", &top.breakfast),
        ("LUNCH", &top.lunch),
        ("DINNER", &top.dinner),
    ] {
        println!("{label}");
        if foods.is_empty() {
            println!("  (none)");
        }
        for f in foods {
            println!("  [{}] {} ({:.0} kcal)", f.food_id, f.name, f.nutrients.calories);
        }
    }
    Ok(())
}

pub(crate) fn cmd_food_import(
    service: &PlanSyncService,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let summary = service.import_catalog_csv(&data, dry_run)?;

    if summary.rows_parsed == 0 {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "No rows found in CSV file" })
            );
        } else {
            eprintln!("No rows found in CSV file.");
        }
        return Ok(());
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dryRun": dry_run,
                "rowsParsed": summary.rows_parsed,
                "foodsCreated": summary.foods_created,
                "foodsUpdated": summary.foods_updated,
            })
        );
    } else if dry_run {
        println!("Dry run, no changes made.\n");
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Foods to create: {}", summary.foods_created);
        println!("  Foods to update: {}", summary.foods_updated);
    } else {
        println!("Import complete.\n");
        println!("  Rows parsed:   {}", summary.rows_parsed);
        println!("  Foods created: {}", summary.foods_created);
        println!("  Foods updated: {}", summary.foods_updated);
    }

    Ok(())
}
