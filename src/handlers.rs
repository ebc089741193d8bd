use crate::chat::parse_reply;
use crate::config::{Profile, Settings, SettingsUpdate};
use crate::errors::AppError;
use crate::models::{
    AppData, DailyTotals, EntryBatch, ExerciseEntry, ExerciseRequest, FoodEntriesRequest,
    FoodEntry,
};
use crate::state::AppState;
use crate::stats::{build_snapshot_at, Snapshot};
use crate::ui::render_index;
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{error, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    let snapshot = build_snapshot_at(today(), &data);
    Html(render_index(&snapshot, &data.settings))
}

pub async fn get_today(State(state): State<AppState>) -> Json<DailyTotals> {
    let data = state.data.lock().await;
    Json(data.ledger.totals_on(today()))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<Snapshot> {
    let data = state.data.lock().await;
    Json(build_snapshot_at(today(), &data))
}

pub async fn add_entries(
    State(state): State<AppState>,
    Json(payload): Json<FoodEntriesRequest>,
) -> Json<Snapshot> {
    Json(apply_batch(&state, EntryBatch::Food(payload.items)).await)
}

pub async fn log_exercise(
    State(state): State<AppState>,
    Json(payload): Json<ExerciseRequest>,
) -> Json<Snapshot> {
    Json(apply_batch(&state, EntryBatch::Exercise(payload.items)).await)
}

pub async fn entry_form(State(state): State<AppState>, Form(entry): Form<FoodEntry>) -> Redirect {
    apply_batch(&state, EntryBatch::Food(vec![entry])).await;
    Redirect::to("/")
}

pub async fn exercise_form(
    State(state): State<AppState>,
    Form(entry): Form<ExerciseEntry>,
) -> Redirect {
    apply_batch(&state, EntryBatch::Exercise(vec![entry])).await;
    Redirect::to("/")
}

/// Validates a chat endpoint response into a batch awaiting confirmation.
/// Nothing is recorded.
pub async fn parse_chat(Json(body): Json<Value>) -> Result<Json<EntryBatch>, AppError> {
    let batch = parse_reply(&body).inspect_err(|err| error!("rejected chat reply: {err}"))?;
    Ok(Json(batch))
}

pub async fn apply_chat(
    State(state): State<AppState>,
    Json(batch): Json<EntryBatch>,
) -> Json<Snapshot> {
    Json(apply_batch(&state, batch).await)
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let data = state.data.lock().await;
    Json(data.settings.clone())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<Settings> {
    let mut data = state.data.lock().await;
    data.settings.apply(update);
    sync_eviction(&mut data);
    info!(revision = data.settings.revision, "settings updated");
    Json(data.settings.clone())
}

pub async fn onboarding(
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> Result<Json<Snapshot>, AppError> {
    let date = today();
    let mut data = state.data.lock().await;
    data.settings.onboard(&profile)?;
    sync_eviction(&mut data);
    data.ledger.seed_today(date);
    info!(
        goal = data.settings.daily_calorie_goal,
        tdee = data.settings.tdee,
        bmr = data.settings.bmr,
        "onboarding complete"
    );
    Ok(Json(build_snapshot_at(date, &data)))
}

async fn apply_batch(state: &AppState, batch: EntryBatch) -> Snapshot {
    let date = today();
    let mut data = state.data.lock().await;
    let totals = data.ledger.apply_batch(date, &batch);
    info!(
        kind = batch.kind(),
        items = batch.len(),
        calories = totals.totals.calories,
        "entries recorded"
    );
    build_snapshot_at(date, &data)
}

fn sync_eviction(data: &mut AppData) {
    let policy = data.settings.eviction_policy;
    data.ledger.set_eviction_policy(policy);
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
