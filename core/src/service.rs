use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::aggregate::{self, PlanTotals};
use crate::catalog::{self, CatalogImportSummary};
use crate::cycle::{self, CycleProfile, DEFAULT_CYCLE_LENGTH, PhaseReport};
use crate::db::Database;
use crate::error::{PlanError, PlanResult};
use crate::models::{
    CatalogFood, DailyWellnessMetric, FoodEntry, MealSlot, NewCatalogFood, NewWellnessMetric,
    TopFoods, WeekDay, validate_user_id, week_start,
};
use crate::plan::WeeklyDietPlan;

const DEFAULT_HISTORY_LIMIT: i64 = 30;

/// Entry point for every client-visible operation.
///
/// Plan mutations are read-modify-write against the latest stored plan and
/// each save is a single transaction. Callers sharing one service across
/// threads are expected to serialise access (the REST server holds it behind
/// a mutex).
pub struct PlanSyncService {
    db: Database,
}

impl PlanSyncService {
    pub fn new(db_path: &Path) -> PlanResult<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> PlanResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Weekly plans ---

    /// The stored plan for the week containing `date`, or an empty one.
    /// Never writes.
    pub fn get_plan(&self, user_id: &str, date: NaiveDate) -> PlanResult<WeeklyDietPlan> {
        let user_id = validate_user_id(user_id)?;
        let week = week_start(date);
        let plan = self
            .db
            .load_plan(&user_id, week)?
            .unwrap_or_else(|| WeeklyDietPlan::new(&user_id, week));
        Ok(plan)
    }

    pub fn add_food(
        &self,
        user_id: &str,
        date: NaiveDate,
        day: WeekDay,
        slot: MealSlot,
        food: FoodEntry,
    ) -> PlanResult<WeeklyDietPlan> {
        self.add_foods(user_id, date, day, vec![(slot, vec![food])])
    }

    /// Add several foods to one day in a single read and save. Every food is
    /// validated before anything is written; foods already present in their
    /// slot are skipped.
    pub fn add_foods(
        &self,
        user_id: &str,
        date: NaiveDate,
        day: WeekDay,
        meals: Vec<(MealSlot, Vec<FoodEntry>)>,
    ) -> PlanResult<WeeklyDietPlan> {
        let user_id = validate_user_id(user_id)?;
        for food in meals.iter().flat_map(|(_, foods)| foods) {
            food.validate()?;
        }

        let mut plan = self.get_plan(&user_id, date)?;
        let mut added = 0usize;
        for (slot, foods) in meals {
            for mut food in foods {
                food.food_id = food.food_id.trim().to_string();
                let food_id = food.food_id.clone();
                if plan.add_food(day, slot, food) {
                    added += 1;
                } else {
                    debug!(user = %user_id, %day, %slot, %food_id, "food already planned, skipping");
                }
            }
        }

        if added > 0 {
            plan.updated_at = Some(self.db.save_plan(&plan)?);
            info!(user = %user_id, week = %plan.week_start_date, %day, added, "plan updated");
        }
        Ok(plan)
    }

    /// Remove a food from a slot. Removing something that isn't there returns
    /// the plan unchanged.
    pub fn remove_food(
        &self,
        user_id: &str,
        date: NaiveDate,
        day: WeekDay,
        slot: MealSlot,
        food_id: &str,
    ) -> PlanResult<WeeklyDietPlan> {
        let user_id = validate_user_id(user_id)?;
        let food_id = food_id.trim();
        if food_id.is_empty() {
            return Err(PlanError::validation("foodId must not be empty"));
        }

        let mut plan = self.get_plan(&user_id, date)?;
        if plan.remove_food(day, slot, food_id) {
            plan.updated_at = Some(self.db.save_plan(&plan)?);
            info!(user = %user_id, week = %plan.week_start_date, %day, %slot, %food_id, "food removed");
        } else {
            debug!(user = %user_id, %day, %slot, %food_id, "nothing to remove");
        }
        Ok(plan)
    }

    pub fn plan_totals(
        &self,
        user_id: &str,
        date: NaiveDate,
        calorie_target: Option<f64>,
    ) -> PlanResult<PlanTotals> {
        let plan = self.get_plan(user_id, date)?;
        Ok(aggregate::summarize(&plan, calorie_target))
    }

    // --- Cycle tracking ---

    /// Record the first day of a period. The cycle length is kept from the
    /// existing profile unless a new one is given.
    pub fn record_period_start(
        &self,
        user_id: &str,
        start_date: NaiveDate,
        cycle_length: Option<u32>,
    ) -> PlanResult<CycleProfile> {
        let user_id = validate_user_id(user_id)?;
        let cycle_length = match cycle_length {
            Some(days) => cycle::validate_cycle_length(days)?,
            None => self
                .db
                .get_cycle_profile(&user_id)?
                .map_or(DEFAULT_CYCLE_LENGTH, |p| p.cycle_length_days),
        };

        let profile = self
            .db
            .upsert_cycle_profile(&CycleProfile::new(&user_id, start_date, cycle_length))?;
        info!(user = %user_id, start = %start_date, cycle_length, "period start recorded");
        Ok(profile)
    }

    pub fn cycle_profile(&self, user_id: &str) -> PlanResult<Option<CycleProfile>> {
        let user_id = validate_user_id(user_id)?;
        Ok(self.db.get_cycle_profile(&user_id)?)
    }

    pub fn phase_on(&self, user_id: &str, date: NaiveDate) -> PlanResult<PhaseReport> {
        let profile = self.cycle_profile(user_id)?;
        Ok(PhaseReport::build(profile.as_ref(), date))
    }

    // --- Wellness ---

    pub fn log_wellness(&self, metric: &NewWellnessMetric) -> PlanResult<DailyWellnessMetric> {
        metric.validate()?;
        let saved = self.db.upsert_wellness(metric)?;
        info!(user = %saved.user_id, date = %saved.date, "wellness logged");
        Ok(saved)
    }

    pub fn wellness_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> PlanResult<Option<DailyWellnessMetric>> {
        let user_id = validate_user_id(user_id)?;
        Ok(self.db.get_wellness(&user_id, date)?)
    }

    pub fn wellness_history(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> PlanResult<Vec<DailyWellnessMetric>> {
        let user_id = validate_user_id(user_id)?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
        Ok(self.db.wellness_history(&user_id, limit)?)
    }

    // --- Food catalog ---

    pub fn add_catalog_food(&self, food: &NewCatalogFood) -> PlanResult<CatalogFood> {
        food.validate()?;
        Ok(self.db.upsert_catalog_food(food)?)
    }

    pub fn catalog_food(&self, food_id: &str) -> PlanResult<Option<CatalogFood>> {
        Ok(self.db.get_catalog_food(food_id.trim())?)
    }

    pub fn list_catalog(&self, search: Option<&str>, limit: i64) -> PlanResult<Vec<CatalogFood>> {
        Ok(self.db.list_catalog_foods(search, limit.max(1))?)
    }

    pub fn top_foods(&self) -> PlanResult<TopFoods> {
        Ok(catalog::top_foods(&self.db)?)
    }

    /// Snapshot a catalog food into a plan entry.
    pub fn catalog_entry(&self, food_id: &str, quantity: f64) -> PlanResult<FoodEntry> {
        let food = self
            .catalog_food(food_id)?
            .ok_or_else(|| PlanError::validation(format!("Unknown food '{food_id}'")))?;
        let entry = food.to_entry(quantity);
        entry.validate()?;
        Ok(entry)
    }

    pub fn import_catalog_csv(
        &self,
        csv_data: &str,
        dry_run: bool,
    ) -> PlanResult<CatalogImportSummary> {
        let foods = catalog::parse_catalog_csv(csv_data.as_bytes())
            .map_err(|e| PlanError::validation(format!("{e:#}")))?;
        let summary = catalog::import_catalog(&self.db, &foods, dry_run)
            .context("Catalog import failed")?;
        info!(
            rows = summary.rows_parsed,
            created = summary.foods_created,
            updated = summary.foods_updated,
            dry_run,
            "catalog import finished"
        );
        Ok(summary)
    }
}
