mod cycle;
mod food;
mod goal;
mod helpers;
mod plan;
mod wellness;

pub(crate) use cycle::{cmd_cycle_log, cmd_cycle_phase, cmd_cycle_show};
pub(crate) use food::{cmd_food_add, cmd_food_import, cmd_food_list, cmd_food_top};
pub(crate) use goal::cmd_goal;
pub(crate) use plan::{cmd_plan_add, cmd_plan_remove, cmd_plan_show, cmd_plan_totals};
pub(crate) use wellness::{
    WellnessScores, cmd_wellness_history, cmd_wellness_log, cmd_wellness_show,
};
