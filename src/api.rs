//! HTTP routes.
//!
//! Requests are validated here before reaching the engine; engine failures
//! are mapped to status codes here as well.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::quest::{Objective, PlayerQuest, Quest, QuestEngine, QuestError, QuestErrorKind, Reward};

/// Level assumed when an accept request does not carry one
const DEFAULT_PLAYER_LEVEL: i32 = 1;

/// Build the full application router
pub fn router(engine: Arc<QuestEngine>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .with_state(engine)
}

/// Quest routes, mounted under `/api`
fn routes() -> Router<Arc<QuestEngine>> {
    Router::new()
        .route("/quests", get(list_quests).post(create_quest))
        .route("/quests/available/:player_id/:player_level", get(list_available_quests))
        .route("/players/:player_id/quests", get(list_player_quests).post(accept_quest))
        .route(
            "/players/:player_id/quests/:quest_id/progress",
            post(update_quest_progress),
        )
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request, rejected before reaching the engine
    Validation(String),
    /// Body refused by the extractor for transport reasons (media type, size)
    Rejected(StatusCode, String),
    Quest(QuestError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    status: u16,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected(status, _) => *status,
            ApiError::Quest(e) => match e.kind() {
                QuestErrorKind::NotFound => StatusCode::NOT_FOUND,
                QuestErrorKind::Forbidden => StatusCode::FORBIDDEN,
                QuestErrorKind::Conflict => StatusCode::CONFLICT,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(msg) | ApiError::Rejected(_, msg) => msg,
            ApiError::Quest(e) => e.to_string(),
        };
        warn!("Request rejected ({}): {}", status.as_u16(), message);

        let body = ErrorBody {
            error: ErrorDetail {
                message,
                status: status.as_u16(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<QuestError> for ApiError {
    fn from(e: QuestError) -> Self {
        ApiError::Quest(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::UNSUPPORTED_MEDIA_TYPE || status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::Rejected(status, rejection.body_text())
        } else {
            ApiError::Validation(rejection.body_text())
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// Quest body as sent by clients; every field is optional so that missing
/// fields produce a 400 with a useful message rather than a bare rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuestRequest {
    quest_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    level_requirement: Option<i32>,
    rewards: Option<RewardRequest>,
    objectives: Option<Vec<ObjectiveRequest>>,
}

#[derive(Debug, Deserialize)]
struct RewardRequest {
    #[serde(default)]
    xp: u32,
    #[serde(default)]
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectiveRequest {
    objective_id: Option<String>,
    description: Option<String>,
    target_count: Option<serde_json::Number>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptQuestRequest {
    quest_id: Option<String>,
    player_level: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRequest {
    objective_id: Option<String>,
    progress_made: Option<serde_json::Value>,
}

/// A JSON number with no fractional part, so `5` and `5.0` are both accepted
fn whole_number(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// A required, non-empty string field
fn required(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl CreateQuestRequest {
    fn into_quest(self) -> Result<Quest, ApiError> {
        let missing = || ApiError::Validation("Invalid quest data. Missing required fields.".to_string());

        let quest_id = required(self.quest_id).ok_or_else(missing)?;
        let title = required(self.title).ok_or_else(missing)?;
        let description = required(self.description).ok_or_else(missing)?;
        let level_requirement = self.level_requirement.ok_or_else(missing)?;
        let rewards = self.rewards.ok_or_else(missing)?;
        let objectives = self.objectives.filter(|o| !o.is_empty()).ok_or_else(missing)?;

        let objectives = objectives
            .into_iter()
            .map(ObjectiveRequest::into_objective)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quest {
            quest_id,
            title,
            description,
            level_requirement,
            rewards: Reward {
                xp: rewards.xp,
                items: rewards.items,
            },
            objectives,
        })
    }
}

impl ObjectiveRequest {
    fn into_objective(self) -> Result<Objective, ApiError> {
        let invalid = || {
            ApiError::Validation(
                "Invalid objective data. Each objective must have objectiveId, description, and a positive integer targetCount."
                    .to_string(),
            )
        };

        let objective_id = required(self.objective_id).ok_or_else(invalid)?;
        let description = required(self.description).ok_or_else(invalid)?;
        let target_count = self
            .target_count
            .as_ref()
            .and_then(whole_number)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|&n| n > 0)
            .ok_or_else(invalid)?;

        Ok(Objective {
            objective_id,
            description,
            target_count,
        })
    }
}

impl ProgressRequest {
    fn validate(self) -> Result<(String, u32), ApiError> {
        let invalid = || {
            ApiError::Validation(
                "Invalid progress data. objectiveId and a non-negative integer progressMade are required."
                    .to_string(),
            )
        };

        let objective_id = required(self.objective_id).ok_or_else(invalid)?;
        let amount = self
            .progress_made
            .as_ref()
            .and_then(serde_json::Value::as_number)
            .and_then(whole_number)
            .ok_or_else(invalid)?;

        // The engine clamps to the target anyway
        Ok((objective_id, u32::try_from(amount).unwrap_or(u32::MAX)))
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the QuestCraft API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis()
    }))
}

async fn create_quest(
    State(engine): State<Arc<QuestEngine>>,
    payload: Result<Json<CreateQuestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quest>), ApiError> {
    let Json(req) = payload?;
    let quest = engine.define_quest(req.into_quest()?).await;
    Ok((StatusCode::CREATED, Json(quest.as_ref().clone())))
}

async fn list_quests(State(engine): State<Arc<QuestEngine>>) -> Json<Vec<Arc<Quest>>> {
    Json(engine.list_quests().await)
}

async fn list_available_quests(
    State(engine): State<Arc<QuestEngine>>,
    Path((player_id, player_level)): Path<(String, String)>,
) -> Result<Json<Vec<Arc<Quest>>>, ApiError> {
    let player_level: i32 = player_level
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid player level '{}'", player_level)))?;

    Ok(Json(engine.list_available_quests(&player_id, player_level).await))
}

async fn accept_quest(
    State(engine): State<Arc<QuestEngine>>,
    Path(player_id): Path<String>,
    payload: Result<Json<AcceptQuestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlayerQuest>), ApiError> {
    let Json(req) = payload?;
    let quest_id = required(req.quest_id)
        .ok_or_else(|| ApiError::Validation("questId is required".to_string()))?;
    let player_level = req.player_level.unwrap_or(DEFAULT_PLAYER_LEVEL);

    let player_quest = engine.accept_quest(&player_id, &quest_id, player_level).await?;
    Ok((StatusCode::CREATED, Json(player_quest)))
}

async fn list_player_quests(
    State(engine): State<Arc<QuestEngine>>,
    Path(player_id): Path<String>,
) -> Json<Vec<PlayerQuest>> {
    Json(engine.list_player_quests(&player_id))
}

async fn update_quest_progress(
    State(engine): State<Arc<QuestEngine>>,
    Path((player_id, quest_id)): Path<(String, String)>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<Json<PlayerQuest>, ApiError> {
    let Json(req) = payload?;
    let (objective_id, amount) = req.validate()?;

    let player_quest = engine
        .apply_progress(&player_id, &quest_id, &objective_id, amount)
        .await?;
    Ok(Json(player_quest))
}
