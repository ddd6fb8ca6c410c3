use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::db::Database;
use crate::models::{NewCatalogFood, NutrientProfile, TopFoods};

/// Number of catalog foods shown in the meal pickers.
pub const TOP_FOODS_LIMIT: i64 = 15;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogImportSummary {
    pub rows_parsed: usize,
    pub foods_created: usize,
    pub foods_updated: usize,
}

/// Parse a catalog CSV from any reader.
///
/// Expected header (case-insensitive, any order):
/// `id,name,calories,protein,carbs,fat,fiber,sugar`
///
/// Only `name` is required. A missing or blank id is derived from the name,
/// and missing nutrient columns read as 0.
pub fn parse_catalog_csv<R: Read>(reader: R) -> Result<Vec<NewCatalogFood>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let col = |names: &[&str]| -> Option<usize> {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };

    let idx_name = col(&["name", "food name"]).context("Missing required column: name")?;
    let idx_id = col(&["id", "food_id", "foodId"]);
    let idx_calories = col(&["calories", "kcal"]);
    let idx_protein = col(&["protein", "protein (g)"]);
    let idx_carbs = col(&["carbs", "carbohydrates", "carbohydrates (g)"]);
    let idx_fat = col(&["fat", "fat (g)"]);
    let idx_fiber = col(&["fiber", "fiber (g)"]);
    let idx_sugar = col(&["sugar", "sugar (g)"]);

    let mut foods = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let line = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;

        let name = record.get(idx_name).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let food_id = idx_id
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| slugify(&name), str::to_string);

        let number = |idx: Option<usize>, column: &str| -> Result<f64> {
            match idx.and_then(|i| record.get(i)).map(str::trim) {
                None | Some("") => Ok(0.0),
                Some(raw) => raw
                    .parse::<f64>()
                    .with_context(|| format!("Row {line}: invalid {column} value '{raw}'")),
            }
        };

        let food = NewCatalogFood {
            food_id,
            name,
            nutrients: NutrientProfile {
                calories: number(idx_calories, "calories")?,
                protein: number(idx_protein, "protein")?,
                carbs: number(idx_carbs, "carbs")?,
                fat: number(idx_fat, "fat")?,
                fiber: number(idx_fiber, "fiber")?,
                sugar: number(idx_sugar, "sugar")?,
            },
        };
        if let Err(e) = food.validate() {
            bail!("Row {line}: {e}");
        }
        foods.push(food);
    }

    Ok(foods)
}

/// Lowercase the name and collapse anything that isn't alphanumeric into `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Upsert parsed rows into the catalog. When `dry_run` is true nothing is
/// written and the summary reports what would have happened.
pub fn import_catalog(
    db: &Database,
    foods: &[NewCatalogFood],
    dry_run: bool,
) -> Result<CatalogImportSummary> {
    let mut summary = CatalogImportSummary {
        rows_parsed: foods.len(),
        ..CatalogImportSummary::default()
    };
    // Repeated ids within one file count once.
    let mut seen: HashSet<&str> = HashSet::new();

    for food in foods {
        let id = food.food_id.trim();
        let existed = seen.contains(id) || db.get_catalog_food(id)?.is_some();
        if existed {
            summary.foods_updated += 1;
        } else {
            summary.foods_created += 1;
        }
        seen.insert(id);

        if !dry_run {
            db.upsert_catalog_food(food)
                .with_context(|| format!("Failed to import '{}'", food.name))?;
        }
    }

    Ok(summary)
}

/// The first catalog foods dealt across breakfast, lunch and dinner.
pub fn top_foods(db: &Database) -> Result<TopFoods> {
    let foods = db.list_catalog_foods(None, TOP_FOODS_LIMIT)?;
    Ok(TopFoods::bucket(foods))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
id,name,calories,protein,carbs,fat,fiber,sugar
oats,Rolled Oats,389,16.9,66.3,6.9,10.6,0
apple,Apple,52,0.3,14,0.2,2.4,10
salmon,Salmon Fillet,208,20,0,13,0,0
,Greek Yogurt,59,10,3.6,0.4,0,3.2
";

    #[test]
    fn test_parse_catalog_csv_basic() {
        let foods = parse_catalog_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(foods.len(), 4);
        assert_eq!(foods[0].food_id, "oats");
        assert_eq!(foods[1].name, "Apple");
        assert!((foods[1].nutrients.calories - 52.0).abs() < f64::EPSILON);
        assert!((foods[1].nutrients.sugar - 10.0).abs() < f64::EPSILON);
        assert_eq!(foods[3].food_id, "greek-yogurt");
    }

    #[test]
    fn test_parse_catalog_csv_missing_name_column() {
        let csv = "id,calories\napple,52\n";
        let err = parse_catalog_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_parse_catalog_csv_optional_columns() {
        let csv = "Name,Calories\nRice,130\n,\n";
        let foods = parse_catalog_csv(csv.as_bytes()).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].food_id, "rice");
        assert!(foods[0].nutrients.protein.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_catalog_csv_rejects_bad_numbers() {
        let csv = "name,calories\nRice,lots\n";
        let err = parse_catalog_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 2"));

        let csv = "name,fat\nRice,-1\n";
        assert!(parse_catalog_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Greek Yogurt"), "greek-yogurt");
        assert_eq!(slugify("  Salmon -- Fillet! "), "salmon-fillet");
        assert_eq!(slugify("100% Juice"), "100-juice");
    }

    #[test]
    fn test_import_dry_run_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let foods = parse_catalog_csv(SAMPLE_CSV.as_bytes()).unwrap();
        let summary = import_catalog(&db, &foods, true).unwrap();
        assert_eq!(summary.rows_parsed, 4);
        assert_eq!(summary.foods_created, 4);
        assert!(db.list_catalog_foods(None, 100).unwrap().is_empty());
    }

    #[test]
    fn test_import_updates_existing() {
        let db = Database::open_in_memory().unwrap();
        let foods = parse_catalog_csv(SAMPLE_CSV.as_bytes()).unwrap();
        let first = import_catalog(&db, &foods, false).unwrap();
        assert_eq!(first.foods_created, 4);

        let second = import_catalog(&db, &foods, false).unwrap();
        assert_eq!(second.foods_created, 0);
        assert_eq!(second.foods_updated, 4);
        assert_eq!(db.list_catalog_foods(None, 100).unwrap().len(), 4);
    }

    #[test]
    fn test_top_foods_takes_first_fifteen() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..20 {
            db.upsert_catalog_food(&NewCatalogFood {
                food_id: format!("food-{i:02}"),
                name: format!("Food {i}"),
                nutrients: NutrientProfile::default(),
            })
            .unwrap();
        }
        let top = top_foods(&db).unwrap();
        assert_eq!(top.breakfast.len(), 5);
        assert_eq!(top.lunch.len(), 5);
        assert_eq!(top.dinner.len(), 5);
        assert_eq!(top.breakfast[0].food_id, "food-00");
        assert_eq!(top.lunch[0].food_id, "food-01");
        assert_eq!(top.dinner[4].food_id, "food-14");
    }
}
