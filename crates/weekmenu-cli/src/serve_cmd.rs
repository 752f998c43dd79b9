use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use weekmenu_core::generate::{PlanContext, PlanIngredients};
use weekmenu_core::plan::{self, PlanOptions, Profile, RecipeBook};
use weekmenu_core::shopping::{ListError, ShoppingSession, service};
use weekmenu_db::models::{DayPlan, HistoryEntry, ShoppingItem};
use weekmenu_db::queries::{day_plans, history};

use crate::config::WeekmenuConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<ListError> for AppError {
    fn from(err: ListError) -> Self {
        let status = match &err {
            ListError::Validation(_) => StatusCode::BAD_REQUEST,
            ListError::InvalidMove { .. } => StatusCode::CONFLICT,
            ListError::NotFound(_) => StatusCode::NOT_FOUND,
            ListError::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and request types
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub recipes: RecipeBook,
    pub base_servings: u32,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
struct GenerateListRequest {
    start: NaiveDate,
    #[serde(default = "default_days")]
    days: u32,
    #[serde(default = "default_persons")]
    person_count: u32,
}

fn default_days() -> u32 {
    7
}

fn default_persons() -> u32 {
    2
}

#[derive(Debug, Deserialize)]
struct CheckedRequest {
    checked: bool,
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    moved_id: i64,
    target_id: i64,
    #[serde(default)]
    insert_after: bool,
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct NewItemRequest {
    name: String,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    unit: String,
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct DayUpdateRequest {
    cook: Option<bool>,
    meal_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratePlanRequest {
    start: NaiveDate,
    #[serde(default = "default_days")]
    days: u32,
    #[serde(flatten)]
    options: PlanOptions,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/shopping-list",
            get(get_list).post(regenerate_list).delete(clear_list),
        )
        .route(
            "/api/shopping-list/{id}",
            put(set_item_checked).delete(delete_item),
        )
        .route("/api/shopping-list/reorder", put(reorder_list))
        .route("/api/shopping-list/complete", post(complete_list))
        .route("/api/shopping-list/items", post(add_item))
        .route("/api/calendar", get(get_calendar))
        .route("/api/calendar/{day}", put(update_day))
        .route("/api/calendar/{day}/retry", post(retry_day))
        .route("/api/generate", post(generate_plan))
        .route("/api/history", get(get_history_counts))
        .route("/api/history/{day}", get(get_history_day))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(
    pool: SqlitePool,
    config: &WeekmenuConfig,
    bind: &str,
    port: u16,
) -> Result<()> {
    let recipes = RecipeBook::load(&config.recipes_path)?;
    let state = AppState {
        pool,
        recipes,
        base_servings: config.base_servings,
        profile: config.profile.clone(),
    };

    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("weekmenu serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("weekmenu serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Shopping list handlers
// ---------------------------------------------------------------------------

/// Every mutation responds with the full list so the client can replace
/// its local state wholesale.
async fn loaded_session(pool: &SqlitePool) -> Result<ShoppingSession, AppError> {
    let mut session = ShoppingSession::new();
    service::load(pool, &mut session).await?;
    Ok(session)
}

async fn get_list(State(state): State<AppState>) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let session = loaded_session(&state.pool).await?;
    Ok(Json(session.items))
}

async fn regenerate_list(
    State(state): State<AppState>,
    Json(req): Json<GenerateListRequest>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;

    let generator = PlanIngredients::new(
        state.pool.clone(),
        state.recipes.clone(),
        state.base_servings,
    );
    let ctx = PlanContext {
        start: req.start,
        end: req.start + Days::new(u64::from(req.days.saturating_sub(1))),
        person_count: req.person_count,
    };
    service::generate(&state.pool, &mut session, &generator, &ctx).await?;
    Ok(Json(session.items))
}

async fn clear_list(State(state): State<AppState>) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    service::clear(&state.pool, &mut session).await?;
    Ok(Json(session.items))
}

async fn set_item_checked(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CheckedRequest>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    service::toggle(&state.pool, &mut session, id, req.checked).await?;
    Ok(Json(session.items))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    service::delete(&state.pool, &mut session, id).await?;
    Ok(Json(session.items))
}

async fn reorder_list(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    service::move_to(
        &state.pool,
        &mut session,
        req.moved_id,
        req.target_id,
        req.insert_after,
    )
    .await?;
    Ok(Json(session.items))
}

async fn complete_list(
    State(state): State<AppState>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    let day = req.date.unwrap_or_else(|| Local::now().date_naive());
    service::complete(&state.pool, &mut session, day).await?;
    Ok(Json(session.items))
}

async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<NewItemRequest>,
) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let mut session = loaded_session(&state.pool).await?;
    service::add(&state.pool, &mut session, &req.name, req.quantity, &req.unit).await?;
    Ok(Json(session.items))
}

// ---------------------------------------------------------------------------
// Calendar and plan handlers
// ---------------------------------------------------------------------------

async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<DayPlan>>, AppError> {
    let days = day_plans::get_days_between(&state.pool, query.start, query.end)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(days))
}

async fn update_day(
    State(state): State<AppState>,
    Path(day): Path<NaiveDate>,
    Json(req): Json<DayUpdateRequest>,
) -> Result<Json<DayPlan>, AppError> {
    if let Some(meal_id) = &req.meal_id {
        if state.recipes.by_id(meal_id).is_none() {
            return Err(AppError::bad_request(format!("unknown meal {meal_id}")));
        }
        day_plans::set_day_meal(&state.pool, day, meal_id)
            .await
            .map_err(AppError::internal)?;
    }
    if let Some(cook) = req.cook {
        day_plans::set_day_cook(&state.pool, day, cook)
            .await
            .map_err(AppError::internal)?;
    }

    let plan = day_plans::get_day(&state.pool, day)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::bad_request("request changed nothing"))?;
    Ok(Json(plan))
}

async fn retry_day(
    State(state): State<AppState>,
    Path(day): Path<NaiveDate>,
) -> Result<Json<DayPlan>, AppError> {
    let current = day_plans::get_day(&state.pool, day)
        .await
        .map_err(AppError::internal)?
        .and_then(|plan| plan.meal_id);
    let excluded: Vec<String> = current.into_iter().collect();

    let prev = neighbor_recipe(&state, day.pred_opt()).await?;
    let next = neighbor_recipe(&state, day.succ_opt()).await?;

    let pick = plan::select_best_recipe(
        state.recipes.recipes(),
        &state.profile,
        &PlanOptions::default(),
        Some(day),
        prev.as_ref(),
        next.as_ref(),
        &excluded,
    )
    .ok_or_else(|| AppError::not_found(format!("no alternative meal for {day}")))?;

    day_plans::set_day_meal(&state.pool, day, &pick.id)
        .await
        .map_err(AppError::internal)?;
    let plan = day_plans::get_day(&state.pool, day)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::internal(anyhow::anyhow!("day vanished after update")))?;
    Ok(Json(plan))
}

async fn neighbor_recipe(
    state: &AppState,
    day: Option<NaiveDate>,
) -> Result<Option<plan::Recipe>, AppError> {
    let Some(day) = day else {
        return Ok(None);
    };
    let meal_id = day_plans::get_day(&state.pool, day)
        .await
        .map_err(AppError::internal)?
        .filter(|plan| plan.cook)
        .and_then(|plan| plan.meal_id);
    Ok(meal_id.and_then(|id| state.recipes.by_id(&id).cloned()))
}

async fn generate_plan(
    State(state): State<AppState>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<Json<Vec<plan::PlannedMeal>>, AppError> {
    let all_days = crate::plan_cmd::range(req.start, req.days);
    let cook_days = crate::plan_cmd::cook_days(&state.pool, &all_days)
        .await
        .map_err(AppError::internal)?;

    let planned = plan::generate_plan(
        &cook_days,
        state.recipes.recipes(),
        &state.profile,
        &req.options,
        &mut rand::rng(),
    );

    for meal in &planned {
        day_plans::set_day_meal(&state.pool, meal.date, &meal.meal_id)
            .await
            .map_err(AppError::internal)?;
    }
    Ok(Json(planned))
}

// ---------------------------------------------------------------------------
// History handlers
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
struct HistoryDayCount {
    day_date: NaiveDate,
    count: i64,
}

async fn get_history_counts(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<HistoryDayCount>>, AppError> {
    let counts = history::counts_between(&state.pool, query.start, query.end)
        .await
        .map_err(AppError::internal)?;
    let counts = counts
        .into_iter()
        .map(|(day_date, count)| HistoryDayCount { day_date, count })
        .collect();
    Ok(Json(counts))
}

async fn get_history_day(
    State(state): State<AppState>,
    Path(day): Path<NaiveDate>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let entries = history::list_for_day(&state.pool, day)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(entries))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
