use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{FoodEntry, MealSlot, WeekDay, week_start};

type DayMeals = BTreeMap<MealSlot, Vec<FoodEntry>>;

/// One user's meal plan for a single ISO week.
///
/// All 21 (day, slot) lists are always present, so an empty plan
/// serializes with every day and meal as an empty array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDietPlan {
    pub user_id: String,
    pub week_start_date: NaiveDate,
    days: BTreeMap<WeekDay, DayMeals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl WeeklyDietPlan {
    /// Empty plan for the week containing `date`.
    #[must_use]
    pub fn new(user_id: &str, date: NaiveDate) -> Self {
        let days = WeekDay::ALL
            .iter()
            .map(|&day| {
                let meals = MealSlot::ALL
                    .iter()
                    .map(|&slot| (slot, Vec::new()))
                    .collect();
                (day, meals)
            })
            .collect();
        Self {
            user_id: user_id.to_string(),
            week_start_date: week_start(date),
            days,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn entries(&self, day: WeekDay, slot: MealSlot) -> &[FoodEntry] {
        self.days
            .get(&day)
            .and_then(|meals| meals.get(&slot))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn slot_mut(&mut self, day: WeekDay, slot: MealSlot) -> &mut Vec<FoodEntry> {
        self.days
            .entry(day)
            .or_default()
            .entry(slot)
            .or_default()
    }

    #[must_use]
    pub fn contains(&self, day: WeekDay, slot: MealSlot, food_id: &str) -> bool {
        self.entries(day, slot).iter().any(|e| e.food_id == food_id)
    }

    /// Append `food` to the slot. Returns `false` without touching the plan
    /// when the food is already listed there.
    pub fn add_food(&mut self, day: WeekDay, slot: MealSlot, food: FoodEntry) -> bool {
        if self.contains(day, slot, &food.food_id) {
            return false;
        }
        self.slot_mut(day, slot).push(food);
        true
    }

    /// Returns `true` if an entry was removed.
    pub fn remove_food(&mut self, day: WeekDay, slot: MealSlot, food_id: &str) -> bool {
        let entries = self.slot_mut(day, slot);
        let before = entries.len();
        entries.retain(|e| e.food_id != food_id);
        entries.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.days
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Every entry in day, slot, insertion order.
    pub fn iter_entries(&self) -> impl Iterator<Item = (WeekDay, MealSlot, &FoodEntry)> + '_ {
        WeekDay::ALL.into_iter().flat_map(move |day| {
            MealSlot::ALL.into_iter().flat_map(move |slot| {
                self.entries(day, slot)
                    .iter()
                    .map(move |entry| (day, slot, entry))
            })
        })
    }

    #[must_use]
    pub fn date_of(&self, day: WeekDay) -> NaiveDate {
        self.week_start_date + Duration::days(day.index())
    }

    // Rows come back from storage already ordered and de-duplicated.
    pub(crate) fn push_loaded(&mut self, day: WeekDay, slot: MealSlot, food: FoodEntry) {
        self.slot_mut(day, slot).push(food);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutrientProfile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn food(id: &str, calories: f64) -> FoodEntry {
        FoodEntry {
            food_id: id.to_string(),
            name: id.to_uppercase(),
            nutrients: NutrientProfile {
                calories,
                ..NutrientProfile::default()
            },
            quantity: 1.0,
        }
    }

    #[test]
    fn test_new_plan_has_all_slots() {
        let plan = WeeklyDietPlan::new("u1", date(2024, 3, 6));
        assert_eq!(plan.week_start_date, date(2024, 3, 4));
        assert!(plan.is_empty());

        let json = serde_json::to_value(&plan).unwrap();
        let days = json["days"].as_object().unwrap();
        assert_eq!(days.len(), 7);
        for meals in days.values() {
            let meals = meals.as_object().unwrap();
            assert_eq!(meals.len(), 3);
            assert!(meals["Breakfast"].as_array().unwrap().is_empty());
        }
        assert_eq!(json["weekStartDate"], "2024-03-04");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut plan = WeeklyDietPlan::new("u1", date(2024, 3, 4));
        assert!(plan.add_food(WeekDay::Monday, MealSlot::Breakfast, food("apple", 52.0)));
        let snapshot = plan.clone();
        assert!(!plan.add_food(WeekDay::Monday, MealSlot::Breakfast, food("apple", 99.0)));
        assert_eq!(plan, snapshot);
        assert_eq!(plan.entries(WeekDay::Monday, MealSlot::Breakfast).len(), 1);
    }

    #[test]
    fn test_same_food_in_different_slots() {
        let mut plan = WeeklyDietPlan::new("u1", date(2024, 3, 4));
        assert!(plan.add_food(WeekDay::Monday, MealSlot::Breakfast, food("apple", 52.0)));
        assert!(plan.add_food(WeekDay::Monday, MealSlot::Lunch, food("apple", 52.0)));
        assert!(plan.add_food(WeekDay::Tuesday, MealSlot::Breakfast, food("apple", 52.0)));
        assert_eq!(plan.entry_count(), 3);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut plan = WeeklyDietPlan::new("u1", date(2024, 3, 4));
        plan.add_food(WeekDay::Friday, MealSlot::Dinner, food("rice", 130.0));
        let snapshot = plan.clone();
        assert!(!plan.remove_food(WeekDay::Friday, MealSlot::Dinner, "bread"));
        assert!(!plan.remove_food(WeekDay::Friday, MealSlot::Lunch, "rice"));
        assert_eq!(plan, snapshot);

        assert!(plan.remove_food(WeekDay::Friday, MealSlot::Dinner, "rice"));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut plan = WeeklyDietPlan::new("u1", date(2024, 3, 4));
        for id in ["oats", "banana", "milk"] {
            plan.add_food(WeekDay::Sunday, MealSlot::Breakfast, food(id, 10.0));
        }
        let ids: Vec<&str> = plan
            .iter_entries()
            .map(|(_, _, e)| e.food_id.as_str())
            .collect();
        assert_eq!(ids, ["oats", "banana", "milk"]);
    }

    #[test]
    fn test_date_of() {
        let plan = WeeklyDietPlan::new("u1", date(2024, 3, 1));
        assert_eq!(plan.date_of(WeekDay::Monday), date(2024, 2, 26));
        assert_eq!(plan.date_of(WeekDay::Sunday), date(2024, 3, 3));
    }
}
