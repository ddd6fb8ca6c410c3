mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    WellnessScores, cmd_cycle_log, cmd_cycle_phase, cmd_cycle_show, cmd_food_add,
    cmd_food_import, cmd_food_list, cmd_food_top, cmd_goal, cmd_plan_add, cmd_plan_remove,
    cmd_plan_show, cmd_plan_totals, cmd_wellness_history, cmd_wellness_log, cmd_wellness_show,
};
use crate::config::Config;
use fitweek_core::models::NutrientProfile;
use fitweek_core::service::PlanSyncService;

#[derive(Parser)]
#[command(
    name = "fitweek",
    version,
    about = "Weekly meal plans, nutrient totals and cycle-phase guidance"
)]
struct Cli {
    /// User id (default: $FITWEEK_USER or "local")
    #[arg(short, long, global = true)]
    user: Option<String>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
    /// Build the weekly diet plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage the local food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Track the menstrual cycle and show the current phase
    Cycle {
        #[command(subcommand)]
        command: CycleCommands,
    },
    /// Log daily wellness scores
    Wellness {
        #[command(subcommand)]
        command: WellnessCommands,
    },
    /// Estimate BMR and daily calorie needs (Mifflin-St Jeor)
    Goal {
        /// Body weight in kg
        #[arg(long)]
        weight: f64,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Age in years
        #[arg(long)]
        age: u32,
        /// Gender: male or female
        #[arg(long)]
        gender: String,
        /// Activity: sedentary, light, moderate, active, very-active
        #[arg(short, long, default_value = "sedentary")]
        activity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show the plan for the week containing a date (default: this week)
    Show {
        /// Any date in the week (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a catalog food to a day and meal
    Add {
        /// Catalog food id
        food_id: String,
        /// Meal: breakfast, lunch, dinner
        #[arg(short, long)]
        meal: String,
        /// Day of the week (default: the weekday of --date)
        #[arg(short, long)]
        day: Option<String>,
        /// Number of servings
        #[arg(short, long, default_value = "1")]
        quantity: f64,
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a food from a day and meal
    Remove {
        /// Food id to remove
        food_id: String,
        /// Meal: breakfast, lunch, dinner
        #[arg(short, long)]
        meal: String,
        /// Day of the week (default: the weekday of --date)
        #[arg(short, long)]
        day: Option<String>,
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show nutrient totals per day and for the week
    Totals {
        /// Any date in the week (default: today)
        date: Option<String>,
        /// Daily calorie target, adds a percentage column
        #[arg(short, long)]
        target: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add or update a catalog food
    Add {
        /// Food id (used to reference the food in plans)
        id: String,
        /// Food name
        name: String,
        /// Calories per serving
        #[arg(long)]
        calories: f64,
        /// Protein per serving (g)
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carbs per serving (g)
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat per serving (g)
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Fiber per serving (g)
        #[arg(long, default_value = "0")]
        fiber: f64,
        /// Sugar per serving (g)
        #[arg(long, default_value = "0")]
        sugar: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List/search the catalog
    List {
        /// Search query to filter foods
        #[arg(short, long)]
        search: Option<String>,
        /// Maximum number of foods
        #[arg(short, long, default_value = "50")]
        limit: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the top catalog foods per meal
    Top {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import catalog foods from a CSV file
    Import {
        /// Path to the CSV file (columns: id,name,calories,protein,carbs,fat,fiber,sugar)
        file: std::path::PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CycleCommands {
    /// Record the first day of a period
    Log {
        /// Start date (YYYY-MM-DD or today/yesterday, default: today)
        date: Option<String>,
        /// Average cycle length in days (default: keep the stored value, or 28)
        #[arg(short, long)]
        length: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the cycle phase and guidance for a date (default: today)
    Phase {
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored cycle profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WellnessCommands {
    /// Log scores (1-10) for a day
    Log {
        #[arg(long)]
        energy: u8,
        #[arg(long)]
        mood: u8,
        #[arg(long)]
        sleep: u8,
        #[arg(long)]
        strength: u8,
        #[arg(long)]
        motivation: u8,
        #[arg(long)]
        recovery: u8,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the entry for a date (default: today)
    Show {
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent entries, newest first
    History {
        /// Number of entries to show (default: 30)
        #[arg(short, long)]
        limit: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` gives debug, `serve` logs at info
/// and one-shot commands only surface warnings.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = PlanSyncService::new(&config.db_path)?;
    let user = Config::resolve_user(cli.user);

    match cli.command {
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(service, port, &bind, api_key, new_api_key).await
        }
        Commands::Plan { command } => match command {
            PlanCommands::Show { date, json } => cmd_plan_show(&service, &user, date, json),
            PlanCommands::Add {
                food_id,
                meal,
                day,
                quantity,
                date,
                json,
            } => cmd_plan_add(
                &service,
                &user,
                &food_id,
                &meal,
                day.as_deref(),
                quantity,
                date,
                json,
            ),
            PlanCommands::Remove {
                food_id,
                meal,
                day,
                date,
                json,
            } => cmd_plan_remove(&service, &user, &food_id, &meal, day.as_deref(), date, json),
            PlanCommands::Totals { date, target, json } => {
                cmd_plan_totals(&service, &user, date, target, json)
            }
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                id,
                name,
                calories,
                protein,
                carbs,
                fat,
                fiber,
                sugar,
                json,
            } => cmd_food_add(
                &service,
                &id,
                &name,
                NutrientProfile {
                    calories,
                    protein,
                    carbs,
                    fat,
                    fiber,
                    sugar,
                },
                json,
            ),
            FoodCommands::List {
                search,
                limit,
                json,
            } => cmd_food_list(&service, search.as_deref(), limit, json),
            FoodCommands::Top { json } => cmd_food_top(&service, json),
            FoodCommands::Import {
                file,
                dry_run,
                json,
            } => cmd_food_import(&service, &file, dry_run, json),
        },
        Commands::Cycle { command } => match command {
            CycleCommands::Log { date, length, json } => {
                cmd_cycle_log(&service, &user, date, length, json)
            }
            CycleCommands::Phase { date, json } => cmd_cycle_phase(&service, &user, date, json),
            CycleCommands::Show { json } => cmd_cycle_show(&service, &user, json),
        },
        Commands::Wellness { command } => match command {
            WellnessCommands::Log {
                energy,
                mood,
                sleep,
                strength,
                motivation,
                recovery,
                date,
                notes,
                json,
            } => cmd_wellness_log(
                &service,
                &user,
                WellnessScores {
                    energy,
                    mood,
                    sleep,
                    strength,
                    motivation,
                    recovery,
                },
                date,
                notes,
                json,
            ),
            WellnessCommands::Show { date, json } => {
                cmd_wellness_show(&service, &user, date, json)
            }
            WellnessCommands::History { limit, json } => {
                cmd_wellness_history(&service, &user, limit, json)
            }
        },
        Commands::Goal {
            weight,
            height,
            age,
            gender,
            activity,
            json,
        } => cmd_goal(weight, height, age, &gender, &activity, json),
    }
}
