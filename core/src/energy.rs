use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(PlanError::validation(format!(
                "Unsupported gender '{s}'. Must be male or female"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::VeryActive => "very-active",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(Self::Sedentary),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "active" => Ok(Self::Active),
            "very-active" | "very_active" | "veryactive" => Ok(Self::VeryActive),
            _ => Err(PlanError::validation(format!(
                "Invalid activity level '{s}'. Must be one of: sedentary, light, moderate, active, very-active"
            ))),
        }
    }
}

/// Basal metabolic rate in kcal/day (Mifflin-St Jeor).
pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> PlanResult<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(PlanError::validation("weightKg must be a positive number"));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(PlanError::validation("heightCm must be a positive number"));
    }
    if age == 0 {
        return Err(PlanError::validation("age must be greater than 0"));
    }

    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    Ok(match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    })
}

/// Total daily energy expenditure, rounded to whole kcal.
#[must_use]
pub fn tdee(bmr: f64, activity: ActivityLevel) -> i64 {
    (bmr * activity.multiplier()).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieGoal {
    pub bmr: f64,
    pub tdee: i64,
    pub activity: ActivityLevel,
}

pub fn calorie_goal(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
    activity: ActivityLevel,
) -> PlanResult<CalorieGoal> {
    let bmr = bmr(weight_kg, height_cm, age, gender)?;
    Ok(CalorieGoal {
        bmr,
        tdee: tdee(bmr, activity),
        activity,
    })
}
