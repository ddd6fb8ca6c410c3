use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use fitweek_core::aggregate::PlanTotals;
use fitweek_core::cycle::{CycleProfile, PhaseReport};
use fitweek_core::energy::{ActivityLevel, CalorieGoal, Gender, calorie_goal};
use fitweek_core::error::PlanError;
use fitweek_core::models::{
    CatalogFood, DailyWellnessMetric, FoodEntry, MealSlot, NewCatalogFood, NewWellnessMetric,
    TopFoods, WeekDay, parse_date,
};
use fitweek_core::plan::WeeklyDietPlan;
use fitweek_core::service::PlanSyncService;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<PlanSyncService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, PlanSyncService> {
        self.service
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanQuery {
    user_id: String,
    week_start_date: String,
    calorie_target: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFoodPlanRequest {
    user: String,
    week_start_date: String,
    day: String,
    #[serde(default)]
    meals: BTreeMap<String, Vec<FoodEntry>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFoodPlanItemRequest {
    user: String,
    week_start_date: String,
    day: String,
    meal_type: String,
    food_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanMutationResponse {
    success: bool,
    daily_plan: WeeklyDietPlan,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FoodPlanResponse {
    daily_plans: DailyPlans,
}

#[derive(Serialize)]
struct DailyPlans {
    plan: WeeklyDietPlan,
}

#[derive(Deserialize)]
struct CatalogQuery {
    search: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodRequest {
    user: String,
    start_date: String,
    cycle_length: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseQuery {
    user_id: String,
    date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WellnessHistoryQuery {
    user_id: String,
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalorieGoalRequest {
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: String,
    activity: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Validation(msg) => Self::BadRequest(msg),
            PlanError::Storage(err) => Self::Internal(err),
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Food plan handlers ---

async fn top_foods(State(state): State<AppState>) -> Result<Json<TopFoods>, ApiError> {
    let top = state.service().top_foods()?;
    Ok(Json(top))
}

async fn get_food_plan(
    State(state): State<AppState>,
    Query(params): Query<PlanQuery>,
) -> Result<Json<FoodPlanResponse>, ApiError> {
    let date = parse_date(&params.week_start_date)?;
    let plan = state.service().get_plan(&params.user_id, date)?;
    Ok(Json(FoodPlanResponse {
        daily_plans: DailyPlans { plan },
    }))
}

async fn add_food_plan(
    State(state): State<AppState>,
    Json(body): Json<AddFoodPlanRequest>,
) -> Result<Json<PlanMutationResponse>, ApiError> {
    let date = parse_date(&body.week_start_date)?;
    let day: WeekDay = body.day.parse()?;
    let meals = body
        .meals
        .into_iter()
        .map(|(slot, foods)| Ok((slot.parse::<MealSlot>()?, foods)))
        .collect::<Result<Vec<_>, PlanError>>()?;

    let plan = state.service().add_foods(&body.user, date, day, meals)?;
    Ok(Json(PlanMutationResponse {
        success: true,
        daily_plan: plan,
    }))
}

async fn remove_food_plan_item(
    State(state): State<AppState>,
    Json(body): Json<RemoveFoodPlanItemRequest>,
) -> Result<Json<PlanMutationResponse>, ApiError> {
    let date = parse_date(&body.week_start_date)?;
    let day: WeekDay = body.day.parse()?;
    let slot: MealSlot = body.meal_type.parse()?;

    let plan = state
        .service()
        .remove_food(&body.user, date, day, slot, &body.food_id)?;
    Ok(Json(PlanMutationResponse {
        success: true,
        daily_plan: plan,
    }))
}

async fn plan_totals(
    State(state): State<AppState>,
    Query(params): Query<PlanQuery>,
) -> Result<Json<PlanTotals>, ApiError> {
    let date = parse_date(&params.week_start_date)?;
    let totals = state
        .service()
        .plan_totals(&params.user_id, date, params.calorie_target)?;
    Ok(Json(totals))
}

// --- Catalog handlers ---

async fn list_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogFood>>, ApiError> {
    let foods = state
        .service()
        .list_catalog(params.search.as_deref(), params.limit.unwrap_or(50))?;
    Ok(Json(foods))
}

async fn create_catalog_food(
    State(state): State<AppState>,
    Json(body): Json<NewCatalogFood>,
) -> Result<(StatusCode, Json<CatalogFood>), ApiError> {
    let food = state.service().add_catalog_food(&body)?;
    Ok((StatusCode::CREATED, Json(food)))
}

// --- Cycle handlers ---

async fn record_period(
    State(state): State<AppState>,
    Json(body): Json<PeriodRequest>,
) -> Result<Json<CycleProfile>, ApiError> {
    let start = parse_date(&body.start_date)?;
    let profile = state
        .service()
        .record_period_start(&body.user, start, body.cycle_length)?;
    Ok(Json(profile))
}

async fn get_phase(
    State(state): State<AppState>,
    Query(params): Query<PhaseQuery>,
) -> Result<Json<PhaseReport>, ApiError> {
    let date = parse_date(&params.date)?;
    let report = state.service().phase_on(&params.user_id, date)?;
    Ok(Json(report))
}

// --- Wellness handlers ---

async fn log_wellness(
    State(state): State<AppState>,
    Json(body): Json<NewWellnessMetric>,
) -> Result<Json<DailyWellnessMetric>, ApiError> {
    let saved = state.service().log_wellness(&body)?;
    Ok(Json(saved))
}

async fn get_wellness(
    State(state): State<AppState>,
    Path((user, date_str)): Path<(String, String)>,
) -> Result<Json<DailyWellnessMetric>, ApiError> {
    let date = parse_date(&date_str)?;
    let metric = state
        .service()
        .wellness_on(&user, date)?
        .ok_or_else(|| ApiError::NotFound(format!("No wellness entry for {date_str}")))?;
    Ok(Json(metric))
}

async fn wellness_history(
    State(state): State<AppState>,
    Query(params): Query<WellnessHistoryQuery>,
) -> Result<Json<Vec<DailyWellnessMetric>>, ApiError> {
    let entries = state
        .service()
        .wellness_history(&params.user_id, params.limit)?;
    Ok(Json(entries))
}

// --- Goal handlers ---

async fn calculate_calories(
    Json(body): Json<CalorieGoalRequest>,
) -> Result<Json<CalorieGoal>, ApiError> {
    let gender: Gender = body.gender.parse()?;
    let activity: ActivityLevel = body.activity.parse()?;
    let goal = calorie_goal(body.weight_kg, body.height_cm, body.age, gender, activity)?;
    Ok(Json(goal))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/food/top15", get(top_foods))
        .route("/food/food-plan", get(get_food_plan))
        .route("/food/addFoodPlan", post(add_food_plan))
        .route("/food/removeFoodPlanItem", post(remove_food_plan_item))
        .route("/food/plan-totals", get(plan_totals))
        .route("/food/catalog", get(list_catalog).post(create_catalog_food))
        .route("/cycle/period", post(record_period))
        .route("/cycle/phase", get(get_phase))
        .route("/wellness", post(log_wellness))
        .route("/wellness/history", get(wellness_history))
        .route("/wellness/{user}/{date}", get(get_wellness))
        .route("/goal/calories", post(calculate_calories))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: PlanSyncService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key {
        Some(ref key) if key.len() >= 8 && !new_api_key => {
            eprintln!(
                "API key: {}...{} (see api_key file in data directory)",
                &key[..4],
                &key[key.len() - 4..],
            );
        }
        Some(_) => {}
        None => warn!("authentication disabled (--no-auth), API is open to anyone"),
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        warn!(
            %bind,
            "listening with no authentication, any device on your network can access this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
