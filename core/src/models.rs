use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MAX_USER_ID_LEN: usize = 128;

// --- Calendar addressing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
        WeekDay::Sunday,
    ];

    /// Zero-based offset from Monday, as stored in the database.
    #[must_use]
    pub fn index(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_monday() as usize]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeekDay {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            "saturday" | "sat" => Ok(Self::Saturday),
            "sunday" | "sun" => Ok(Self::Sunday),
            _ => Err(PlanError::validation(format!(
                "Invalid day '{s}'. Use monday-sunday or mon-sun"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    /// Lowercase key used for storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MealSlot {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(PlanError::validation(format!(
                "Invalid meal slot '{s}'. Must be one of: breakfast, lunch, dinner"
            ))),
        }
    }
}

/// Monday of the ISO week containing `date`.
///
/// Every plan read and write goes through this so that the add, read and
/// remove paths always address the same row.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn parse_date(s: &str) -> PlanResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| PlanError::validation(format!("Invalid date '{s}'. Use YYYY-MM-DD")))
}

pub fn validate_user_id(user_id: &str) -> PlanResult<String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(PlanError::validation("userId must not be empty"));
    }
    if trimmed.chars().count() > MAX_USER_ID_LEN {
        return Err(PlanError::validation(format!(
            "userId must be at most {MAX_USER_ID_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// --- Foods ---

/// Per-serving nutrient values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
}

impl NutrientProfile {
    pub fn validate(&self) -> PlanResult<()> {
        let fields = [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::validation(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

fn default_quantity() -> f64 {
    1.0
}

/// A food placed into a plan slot.
///
/// Nutrients are copied from the catalog when the entry is created, so
/// editing the catalog later never rewrites past plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    #[serde(alias = "id")]
    pub food_id: String,
    pub name: String,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

impl FoodEntry {
    pub fn validate(&self) -> PlanResult<()> {
        if self.food_id.trim().is_empty() {
            return Err(PlanError::validation("foodId must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(PlanError::validation(format!(
                "Food '{}' must have a name",
                self.food_id
            )));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(PlanError::validation("quantity must be greater than 0"));
        }
        self.nutrients.validate()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFood {
    #[serde(skip_serializing)]
    pub id: i64,
    pub food_id: String,
    pub name: String,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
    pub created_at: String,
    pub updated_at: String,
}

impl CatalogFood {
    #[must_use]
    pub fn to_entry(&self, quantity: f64) -> FoodEntry {
        FoodEntry {
            food_id: self.food_id.clone(),
            name: self.name.clone(),
            nutrients: self.nutrients,
            quantity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogFood {
    pub food_id: String,
    pub name: String,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
}

impl NewCatalogFood {
    pub fn validate(&self) -> PlanResult<()> {
        if self.food_id.trim().is_empty() {
            return Err(PlanError::validation("foodId must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(PlanError::validation("Food name must not be empty"));
        }
        self.nutrients.validate()
    }
}

/// Catalog foods grouped for the meal pickers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopFoods {
    pub breakfast: Vec<CatalogFood>,
    pub lunch: Vec<CatalogFood>,
    pub dinner: Vec<CatalogFood>,
}

impl TopFoods {
    /// Deal foods round-robin into the three slots, keeping catalog order.
    #[must_use]
    pub fn bucket(foods: Vec<CatalogFood>) -> Self {
        let mut top = Self::default();
        for (i, food) in foods.into_iter().enumerate() {
            match MealSlot::ALL[i % MealSlot::ALL.len()] {
                MealSlot::Breakfast => top.breakfast.push(food),
                MealSlot::Lunch => top.lunch.push(food),
                MealSlot::Dinner => top.dinner.push(food),
            }
        }
        top
    }
}

// --- Wellness ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWellnessMetric {
    pub id: i64,
    pub user_id: String,
    pub date: NaiveDate,
    pub energy: u8,
    pub mood: u8,
    pub sleep: u8,
    pub strength: u8,
    pub motivation: u8,
    pub recovery: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWellnessMetric {
    #[serde(alias = "user")]
    pub user_id: String,
    pub date: NaiveDate,
    pub energy: u8,
    pub mood: u8,
    pub sleep: u8,
    pub strength: u8,
    pub motivation: u8,
    pub recovery: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewWellnessMetric {
    pub fn validate(&self) -> PlanResult<()> {
        validate_user_id(&self.user_id)?;
        let scores = [
            ("energy", self.energy),
            ("mood", self.mood),
            ("sleep", self.sleep),
            ("strength", self.strength),
            ("motivation", self.motivation),
            ("recovery", self.recovery),
        ];
        for (name, score) in scores {
            if !(1..=10).contains(&score) {
                return Err(PlanError::validation(format!(
                    "{name} must be between 1 and 10 (got {score})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn apple() -> FoodEntry {
        FoodEntry {
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
        }
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-03-06 is a Wednesday
        assert_eq!(week_start(date(2024, 3, 6)), date(2024, 3, 4));
        assert_eq!(week_start(date(2024, 3, 4)), date(2024, 3, 4));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(week_start(date(2024, 3, 10)), date(2024, 3, 4));
        // Crosses a month boundary
        assert_eq!(week_start(date(2024, 3, 1)), date(2024, 2, 26));
    }

    #[test]
    fn test_weekday_parse() {
        assert_eq!("Monday".parse::<WeekDay>().unwrap(), WeekDay::Monday);
        assert_eq!("sun".parse::<WeekDay>().unwrap(), WeekDay::Sunday);
        assert_eq!(" FRIDAY ".parse::<WeekDay>().unwrap(), WeekDay::Friday);
        assert!("someday".parse::<WeekDay>().unwrap_err().is_validation());
    }

    #[test]
    fn test_weekday_index_roundtrip() {
        for day in WeekDay::ALL {
            assert_eq!(WeekDay::from_index(day.index()), Some(day));
        }
        assert_eq!(WeekDay::from_index(7), None);
        assert_eq!(WeekDay::from_index(-1), None);
    }

    #[test]
    fn test_weekday_of_date() {
        assert_eq!(WeekDay::of(date(2024, 3, 4)), WeekDay::Monday);
        assert_eq!(WeekDay::of(date(2024, 3, 10)), WeekDay::Sunday);
    }

    #[test]
    fn test_meal_slot_parse() {
        assert_eq!("breakfast".parse::<MealSlot>().unwrap(), MealSlot::Breakfast);
        assert_eq!("Lunch".parse::<MealSlot>().unwrap(), MealSlot::Lunch);
        assert_eq!("DINNER".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
    }

    #[test]
    fn test_meal_slot_rejects_snacks() {
        assert!("Snacks".parse::<MealSlot>().is_err());
        assert!("brunch".parse::<MealSlot>().is_err());
        assert!("".parse::<MealSlot>().is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-01").unwrap(), date(2024, 3, 1));
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id("  u1 ").unwrap(), "u1");
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_food_entry_json_shape() {
        let json = serde_json::json!({
            "foodId": "apple",
            "name": "Apple",
            "calories": 52.0,
            "protein": 0.3
        });
        let entry: FoodEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.food_id, "apple");
        assert!((entry.quantity - 1.0).abs() < f64::EPSILON);
        assert!((entry.nutrients.calories - 52.0).abs() < f64::EPSILON);
        assert!(entry.nutrients.fiber.abs() < f64::EPSILON);

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["foodId"], "apple");
        assert_eq!(out["calories"], 52.0);
        assert_eq!(out["quantity"], 1.0);
    }

    #[test]
    fn test_food_entry_validate() {
        assert!(apple().validate().is_ok());

        let mut missing_id = apple();
        missing_id.food_id = " ".to_string();
        assert!(missing_id.validate().is_err());

        let mut zero_qty = apple();
        zero_qty.quantity = 0.0;
        assert!(zero_qty.validate().is_err());

        let mut negative = apple();
        negative.nutrients.fat = -1.0;
        assert!(negative.validate().is_err());

        let mut nan = apple();
        nan.nutrients.sugar = f64::NAN;
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_top_foods_bucket_round_robin() {
        let foods: Vec<CatalogFood> = (0..5)
            .map(|i| CatalogFood {
                id: i,
                food_id: format!("f{i}"),
                name: format!("Food {i}"),
                nutrients: NutrientProfile::default(),
                created_at: String::new(),
                updated_at: String::new(),
            })
            .collect();
        let top = TopFoods::bucket(foods);
        assert_eq!(top.breakfast.len(), 2);
        assert_eq!(top.lunch.len(), 2);
        assert_eq!(top.dinner.len(), 1);
        assert_eq!(top.breakfast[1].food_id, "f3");
        assert_eq!(top.dinner[0].food_id, "f2");
    }

    #[test]
    fn test_wellness_scores_in_range() {
        let metric = NewWellnessMetric {
            user_id: "u1".to_string(),
            date: date(2024, 3, 1),
            energy: 7,
            mood: 8,
            sleep: 6,
            strength: 5,
            motivation: 9,
            recovery: 10,
            notes: None,
        };
        assert!(metric.validate().is_ok());

        let too_low = NewWellnessMetric { energy: 0, ..metric.clone() };
        assert!(too_low.validate().is_err());

        let too_high = NewWellnessMetric { recovery: 11, ..metric };
        assert!(too_high.validate().is_err());
    }
}
