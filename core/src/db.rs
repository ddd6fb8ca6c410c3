use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::cycle::CycleProfile;
use crate::models::{
    CatalogFood, DATE_FORMAT, DailyWellnessMetric, FoodEntry, MealSlot, NewCatalogFood,
    NewWellnessMetric, NutrientProfile, WeekDay,
};
use crate::plan::WeeklyDietPlan;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    food_id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    calories REAL NOT NULL DEFAULT 0,
                    protein REAL NOT NULL DEFAULT 0,
                    carbs REAL NOT NULL DEFAULT 0,
                    fat REAL NOT NULL DEFAULT 0,
                    fiber REAL NOT NULL DEFAULT 0,
                    sugar REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS diet_plans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id TEXT NOT NULL,
                    week_start TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(user_id, week_start)
                );

                CREATE TABLE IF NOT EXISTS plan_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    plan_id INTEGER NOT NULL REFERENCES diet_plans(id) ON DELETE CASCADE,
                    day_of_week INTEGER NOT NULL CHECK(day_of_week BETWEEN 0 AND 6),
                    meal_slot TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    food_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL,
                    fiber REAL NOT NULL,
                    sugar REAL NOT NULL,
                    quantity REAL NOT NULL DEFAULT 1,
                    UNIQUE(plan_id, day_of_week, meal_slot, food_id)
                );

                CREATE INDEX IF NOT EXISTS idx_plan_entries_plan
                    ON plan_entries(plan_id, day_of_week, position);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS cycle_profiles (
                    user_id TEXT PRIMARY KEY,
                    last_period_start TEXT NOT NULL,
                    cycle_length_days INTEGER NOT NULL DEFAULT 28,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS wellness_metrics (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    energy INTEGER NOT NULL CHECK(energy BETWEEN 1 AND 10),
                    mood INTEGER NOT NULL CHECK(mood BETWEEN 1 AND 10),
                    sleep INTEGER NOT NULL CHECK(sleep BETWEEN 1 AND 10),
                    strength INTEGER NOT NULL CHECK(strength BETWEEN 1 AND 10),
                    motivation INTEGER NOT NULL CHECK(motivation BETWEEN 1 AND 10),
                    recovery INTEGER NOT NULL CHECK(recovery BETWEEN 1 AND 10),
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(user_id, date)
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(idx)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn nutrients_from_row(row: &rusqlite::Row, start: usize) -> rusqlite::Result<NutrientProfile> {
        Ok(NutrientProfile {
            calories: row.get(start)?,
            protein: row.get(start + 1)?,
            carbs: row.get(start + 2)?,
            fat: row.get(start + 3)?,
            fiber: row.get(start + 4)?,
            sugar: row.get(start + 5)?,
        })
    }

    // Columns: 0 id, 1 food_id, 2 name, 3..=8 nutrients, 9 created_at, 10 updated_at
    fn catalog_food_from_row(row: &rusqlite::Row) -> rusqlite::Result<CatalogFood> {
        Ok(CatalogFood {
            id: row.get(0)?,
            food_id: row.get(1)?,
            name: row.get(2)?,
            nutrients: Self::nutrients_from_row(row, 3)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    // Columns: 0 day_of_week, 1 meal_slot, 2 food_id, 3 name, 4..=9 nutrients, 10 quantity
    fn plan_entry_from_row(
        row: &rusqlite::Row,
    ) -> rusqlite::Result<(WeekDay, MealSlot, FoodEntry)> {
        let day_index: i64 = row.get(0)?;
        let day = WeekDay::from_index(day_index).ok_or_else(|| {
            rusqlite::Error::IntegralValueOutOfRange(0, day_index)
        })?;
        let slot_raw: String = row.get(1)?;
        let slot = slot_raw
            .parse::<MealSlot>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let entry = FoodEntry {
            food_id: row.get(2)?,
            name: row.get(3)?,
            nutrients: Self::nutrients_from_row(row, 4)?,
            quantity: row.get(10)?,
        };
        Ok((day, slot, entry))
    }

    fn cycle_profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<CycleProfile> {
        Ok(CycleProfile {
            user_id: row.get(0)?,
            last_period_start_date: Self::date_column(row, 1)?,
            cycle_length_days: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    fn wellness_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyWellnessMetric> {
        Ok(DailyWellnessMetric {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: Self::date_column(row, 2)?,
            energy: row.get(3)?,
            mood: row.get(4)?,
            sleep: row.get(5)?,
            strength: row.get(6)?,
            motivation: row.get(7)?,
            recovery: row.get(8)?,
            notes: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    // --- Food catalog ---

    pub fn upsert_catalog_food(&self, food: &NewCatalogFood) -> Result<CatalogFood> {
        let now = Local::now().to_rfc3339();
        let n = &food.nutrients;
        self.conn.execute(
            "INSERT INTO foods (food_id, name, calories, protein, carbs, fat, fiber, sugar, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(food_id) DO UPDATE SET
                name = excluded.name,
                calories = excluded.calories,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fat = excluded.fat,
                fiber = excluded.fiber,
                sugar = excluded.sugar,
                updated_at = excluded.updated_at",
            params![
                food.food_id.trim(),
                food.name.trim(),
                n.calories,
                n.protein,
                n.carbs,
                n.fat,
                n.fiber,
                n.sugar,
                now,
                now,
            ],
        )?;
        self.get_catalog_food(food.food_id.trim())?
            .context("Catalog food not found after upsert")
    }

    pub fn get_catalog_food(&self, food_id: &str) -> Result<Option<CatalogFood>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, food_id, name, calories, protein, carbs, fat, fiber, sugar, created_at, updated_at
             FROM foods WHERE food_id = ?1",
        )?;
        let mut rows = stmt.query(params![food_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::catalog_food_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Catalog foods in insertion order, or matching `search` by name/id.
    pub fn list_catalog_foods(&self, search: Option<&str>, limit: i64) -> Result<Vec<CatalogFood>> {
        let foods = if let Some(query) = search {
            let escaped = query
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            let pattern = format!("%{escaped}%");
            let mut stmt = self.conn.prepare(
                "SELECT id, food_id, name, calories, protein, carbs, fat, fiber, sugar, created_at, updated_at
                 FROM foods
                 WHERE name LIKE ?1 ESCAPE '\\' OR food_id LIKE ?1 ESCAPE '\\'
                 ORDER BY name LIMIT ?2",
            )?;
            stmt.query_map(params![pattern, limit], Self::catalog_food_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = self.conn.prepare(
                "SELECT id, food_id, name, calories, protein, carbs, fat, fiber, sugar, created_at, updated_at
                 FROM foods ORDER BY id LIMIT ?1",
            )?;
            stmt.query_map(params![limit], Self::catalog_food_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(foods)
    }

    // --- Weekly plans ---

    pub fn load_plan(&self, user_id: &str, week_start: NaiveDate) -> Result<Option<WeeklyDietPlan>> {
        let week_str = week_start.format(DATE_FORMAT).to_string();
        let header: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT id, updated_at FROM diet_plans WHERE user_id = ?1 AND week_start = ?2",
                params![user_id, week_str],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((plan_id, updated_at)) = header else {
            return Ok(None);
        };

        let mut plan = WeeklyDietPlan::new(user_id, week_start);
        plan.updated_at = Some(updated_at);

        let mut stmt = self.conn.prepare(
            "SELECT day_of_week, meal_slot, food_id, name, calories, protein, carbs, fat, fiber, sugar, quantity
             FROM plan_entries WHERE plan_id = ?1
             ORDER BY day_of_week, meal_slot, position",
        )?;
        let rows = stmt.query_map(params![plan_id], Self::plan_entry_from_row)?;
        for row in rows {
            let (day, slot, entry) = row.context("Failed to read plan entry")?;
            plan.push_loaded(day, slot, entry);
        }
        Ok(Some(plan))
    }

    /// Replace the stored plan for the plan's (user, week) with its current
    /// contents in one transaction. Returns the new `updated_at`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn save_plan(&self, plan: &WeeklyDietPlan) -> Result<String> {
        let now = Local::now().to_rfc3339();
        let week_str = plan.week_start_date.format(DATE_FORMAT).to_string();
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin plan transaction")?;

        tx.execute(
            "INSERT INTO diet_plans (uuid, user_id, week_start, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, week_start) DO UPDATE SET updated_at = excluded.updated_at",
            params![Uuid::new_v4().to_string(), plan.user_id, week_str, now, now],
        )?;
        let plan_id: i64 = tx.query_row(
            "SELECT id FROM diet_plans WHERE user_id = ?1 AND week_start = ?2",
            params![plan.user_id, week_str],
            |row| row.get(0),
        )?;
        tx.execute("DELETE FROM plan_entries WHERE plan_id = ?1", params![plan_id])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO plan_entries (plan_id, day_of_week, meal_slot, position, food_id, name,
                                           calories, protein, carbs, fat, fiber, sugar, quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for day in WeekDay::ALL {
                for slot in MealSlot::ALL {
                    for (position, entry) in plan.entries(day, slot).iter().enumerate() {
                        let n = &entry.nutrients;
                        stmt.execute(params![
                            plan_id,
                            day.index(),
                            slot.as_str(),
                            position as i64,
                            entry.food_id,
                            entry.name,
                            n.calories,
                            n.protein,
                            n.carbs,
                            n.fat,
                            n.fiber,
                            n.sugar,
                            entry.quantity,
                        ])?;
                    }
                }
            }
        }

        tx.commit().context("Failed to commit plan")?;
        Ok(now)
    }

    pub fn plan_exists(&self, user_id: &str, week_start: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM diet_plans WHERE user_id = ?1 AND week_start = ?2",
            params![user_id, week_start.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // --- Cycle profiles ---

    pub fn upsert_cycle_profile(&self, profile: &CycleProfile) -> Result<CycleProfile> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO cycle_profiles (user_id, last_period_start, cycle_length_days, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                last_period_start = excluded.last_period_start,
                cycle_length_days = excluded.cycle_length_days,
                updated_at = excluded.updated_at",
            params![
                profile.user_id,
                profile.last_period_start_date.format(DATE_FORMAT).to_string(),
                profile.cycle_length_days,
                now,
                now,
            ],
        )?;
        self.get_cycle_profile(&profile.user_id)?
            .context("Cycle profile not found after upsert")
    }

    pub fn get_cycle_profile(&self, user_id: &str) -> Result<Option<CycleProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, last_period_start, cycle_length_days, updated_at
             FROM cycle_profiles WHERE user_id = ?1",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::cycle_profile_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    // --- Wellness metrics ---

    pub fn upsert_wellness(&self, metric: &NewWellnessMetric) -> Result<DailyWellnessMetric> {
        let now = Local::now().to_rfc3339();
        let user_id = metric.user_id.trim();
        self.conn.execute(
            "INSERT INTO wellness_metrics (user_id, date, energy, mood, sleep, strength, motivation, recovery, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(user_id, date) DO UPDATE SET
                energy = excluded.energy,
                mood = excluded.mood,
                sleep = excluded.sleep,
                strength = excluded.strength,
                motivation = excluded.motivation,
                recovery = excluded.recovery,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                user_id,
                metric.date.format(DATE_FORMAT).to_string(),
                metric.energy,
                metric.mood,
                metric.sleep,
                metric.strength,
                metric.motivation,
                metric.recovery,
                metric.notes,
                now,
                now,
            ],
        )?;
        self.get_wellness(user_id, metric.date)?
            .context("Wellness entry not found after upsert")
    }

    pub fn get_wellness(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyWellnessMetric>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, date, energy, mood, sleep, strength, motivation, recovery, notes, created_at, updated_at
             FROM wellness_metrics WHERE user_id = ?1 AND date = ?2",
        )?;
        let mut rows = stmt.query(params![user_id, date.format(DATE_FORMAT).to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::wellness_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Most recent entries first.
    pub fn wellness_history(&self, user_id: &str, limit: i64) -> Result<Vec<DailyWellnessMetric>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, date, energy, mood, sleep, strength, motivation, recovery, notes, created_at, updated_at
             FROM wellness_metrics WHERE user_id = ?1
             ORDER BY date DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![user_id, limit], Self::wellness_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
