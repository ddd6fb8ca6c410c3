use anyhow::Result;

use fitweek_core::energy::{ActivityLevel, Gender, calorie_goal};

use super::helpers::print_json;

pub(crate) fn cmd_goal(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: &str,
    activity: &str,
    json: bool,
) -> Result<()> {
    let gender: Gender = gender.parse()?;
    let activity: ActivityLevel = activity.parse()?;
    let goal = calorie_goal(weight_kg, height_cm, age, gender, activity)?;

    if json {
        print_json(&goal)?;
    } else {
        println!("BMR:  {:.0} kcal/day", goal.bmr);
        println!("TDEE: {} kcal/day ({})", goal.tdee, goal.activity);
    }
    Ok(())
}
