use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{FoodEntry, MealSlot, WeekDay};
use crate::plan::WeeklyDietPlan;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutrientTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
}

impl NutrientTotals {
    /// Nutrients of one entry scaled by its quantity.
    #[must_use]
    pub fn from_entry(entry: &FoodEntry) -> Self {
        let n = &entry.nutrients;
        let q = entry.quantity;
        Self {
            calories: n.calories * q,
            protein: n.protein * q,
            carbs: n.carbs * q,
            fat: n.fat * q,
            fiber: n.fiber * q,
            sugar: n.sugar * q,
        }
    }
}

impl Add for NutrientTotals {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for NutrientTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
        self.fiber += rhs.fiber;
        self.sugar += rhs.sugar;
    }
}

impl Sum for NutrientTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[must_use]
pub fn meal_total(plan: &WeeklyDietPlan, day: WeekDay, slot: MealSlot) -> NutrientTotals {
    plan.entries(day, slot)
        .iter()
        .map(NutrientTotals::from_entry)
        .sum()
}

#[must_use]
pub fn day_total(plan: &WeeklyDietPlan, day: WeekDay) -> NutrientTotals {
    MealSlot::ALL
        .iter()
        .map(|&slot| meal_total(plan, day, slot))
        .sum()
}

#[must_use]
pub fn week_total(plan: &WeeklyDietPlan) -> NutrientTotals {
    WeekDay::ALL.iter().map(|&day| day_total(plan, day)).sum()
}

/// `value` as a percentage of `target`. A zero or non-finite target yields 0.
#[must_use]
pub fn percent_of_target(value: f64, target: f64) -> f64 {
    if target == 0.0 || !target.is_finite() {
        return 0.0;
    }
    value / target * 100.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub day: WeekDay,
    pub date: NaiveDate,
    pub meals: BTreeMap<MealSlot, NutrientTotals>,
    pub total: NutrientTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub days: Vec<DayTotals>,
    pub week: NutrientTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_target: Option<f64>,
}

/// Meal, day and week totals for display. When a daily calorie target is
/// given each day also carries its percentage of that target.
#[must_use]
pub fn summarize(plan: &WeeklyDietPlan, calorie_target: Option<f64>) -> PlanTotals {
    let days: Vec<DayTotals> = WeekDay::ALL
        .iter()
        .map(|&day| {
            let meals: BTreeMap<MealSlot, NutrientTotals> = MealSlot::ALL
                .iter()
                .map(|&slot| (slot, meal_total(plan, day, slot)))
                .collect();
            let total: NutrientTotals = meals.values().copied().sum();
            DayTotals {
                day,
                date: plan.date_of(day),
                meals,
                total,
                calorie_percent: calorie_target.map(|t| percent_of_target(total.calories, t)),
            }
        })
        .collect();
    let week = days.iter().map(|d| d.total).sum();

    PlanTotals {
        user_id: plan.user_id.clone(),
        week_start_date: plan.week_start_date,
        days,
        week,
        calorie_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutrientProfile;

    fn plan() -> WeeklyDietPlan {
        WeeklyDietPlan::new("u1", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
    }

    fn entry(id: &str, calories: f64, protein: f64, quantity: f64) -> FoodEntry {
        FoodEntry {
            food_id: id.to_string(),
            name: id.to_string(),
            nutrients: NutrientProfile {
                calories,
                protein,
                carbs: 1.0,
                fat: 0.5,
                fiber: 0.25,
                sugar: 0.1,
            },
            quantity,
        }
    }

    #[test]
    fn test_empty_plan_totals_are_zero() {
        let plan = plan();
        assert_eq!(week_total(&plan), NutrientTotals::default());
        assert_eq!(day_total(&plan, WeekDay::Wednesday), NutrientTotals::default());
    }

    #[test]
    fn test_quantity_scales_nutrients() {
        let mut plan = plan();
        plan.add_food(WeekDay::Monday, MealSlot::Lunch, entry("rice", 130.0, 2.7, 2.0));
        let total = meal_total(&plan, WeekDay::Monday, MealSlot::Lunch);
        assert!((total.calories - 260.0).abs() < 0.01);
        assert!((total.protein - 5.4).abs() < 0.01);
        assert!((total.carbs - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_week_total_is_sum_of_days() {
        let mut plan = plan();
        plan.add_food(WeekDay::Monday, MealSlot::Breakfast, entry("oats", 150.0, 5.0, 1.0));
        plan.add_food(WeekDay::Monday, MealSlot::Dinner, entry("salmon", 208.0, 20.0, 1.5));
        plan.add_food(WeekDay::Thursday, MealSlot::Lunch, entry("salad", 33.0, 1.0, 1.0));
        plan.add_food(WeekDay::Sunday, MealSlot::Dinner, entry("pasta", 157.0, 5.8, 0.5));

        let summed: NutrientTotals = WeekDay::ALL.iter().map(|&d| day_total(&plan, d)).sum();
        let week = week_total(&plan);
        assert!((week.calories - summed.calories).abs() < 1e-9);
        assert!((week.protein - summed.protein).abs() < 1e-9);

        let monday: NutrientTotals = MealSlot::ALL
            .iter()
            .map(|&s| meal_total(&plan, WeekDay::Monday, s))
            .sum();
        assert!((day_total(&plan, WeekDay::Monday).calories - monday.calories).abs() < 1e-9);
        assert!((monday.calories - 462.0).abs() < 0.01);
    }

    #[test]
    fn test_percent_of_target() {
        assert!((percent_of_target(1000.0, 2000.0) - 50.0).abs() < f64::EPSILON);
        assert!(percent_of_target(1000.0, 0.0).abs() < f64::EPSILON);
        assert!(percent_of_target(1000.0, f64::NAN).abs() < f64::EPSILON);
        assert!(percent_of_target(1000.0, f64::INFINITY).abs() < f64::EPSILON);
        assert!(percent_of_target(0.0, 0.0).is_finite());
    }

    #[test]
    fn test_summarize_apple_monday() {
        let mut plan = plan();
        let apple = FoodEntry {
            food_id: "apple".to_string(),
            name: "Apple".to_string(),
            nutrients: NutrientProfile {
                calories: 52.0,
                protein: 0.3,
                carbs: 14.0,
                fat: 0.2,
                fiber: 2.4,
                sugar: 10.0,
            },
            quantity: 1.0,
        };
        plan.add_food(WeekDay::Monday, MealSlot::Breakfast, apple);

        let totals = summarize(&plan, Some(2000.0));
        assert_eq!(totals.days.len(), 7);
        let monday = &totals.days[0];
        assert_eq!(monday.day, WeekDay::Monday);
        assert_eq!(monday.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert!((monday.total.calories - 52.0).abs() < 0.01);
        assert!((monday.meals[&MealSlot::Breakfast].sugar - 10.0).abs() < 0.01);
        assert!((monday.calorie_percent.unwrap() - 2.6).abs() < 0.01);
        assert!((totals.week.calories - 52.0).abs() < 0.01);
        assert!(totals.days[1].total.calories.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_without_target() {
        let totals = summarize(&plan(), None);
        assert!(totals.days.iter().all(|d| d.calorie_percent.is_none()));
        let json = serde_json::to_value(&totals).unwrap();
        assert!(json["days"][0].get("caloriePercent").is_none());
        assert_eq!(json["days"][0]["meals"]["Lunch"]["calories"], 0.0);
    }
}
