//! Play endpoint handlers.
//!
//! Every handler validates the payload syntax, then runs the play service
//! inside one database transaction that is committed only on success.
//! Returning early drops the store and rolls the transaction back.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use domain::models::play::{
    CodeRequest, CodeResponse, LandParams, LandResponse, NextRequest, NextResponse,
    RankingsResponse, SignRequest, SignResponse, StartRequest, StartResponse,
};
use persistence::PgPlayStore;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_attempt_started, record_next_outcome};

/// Resolve a link-access match.
///
/// POST /play/h/:uhash
pub async fn land(
    State(state): State<AppState>,
    Path(uhash): Path<String>,
) -> Result<Json<LandResponse>, ApiError> {
    let params = LandParams { uhash };
    params.validate()?;

    let mut store = PgPlayStore::begin(&state.pool).await?;
    let response = state.play.land(&mut store, &params).await?;
    store.commit().await?;

    Ok(Json(response))
}

/// Resolve a code-access match and issue an anonymous player.
///
/// POST /play/code
pub async fn code(
    State(state): State<AppState>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<CodeResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let mut store = PgPlayStore::begin(&state.pool).await?;
    let response = state.play.code(&mut store, &request).await?;
    store.commit().await?;

    Ok(Json(response))
}

/// Identify a signed player by e-mail and token.
///
/// POST /play/sign
pub async fn sign(
    State(state): State<AppState>,
    payload: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<SignResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let mut store = PgPlayStore::begin(&state.pool).await?;
    let response = state.play.sign(&mut store, &request).await?;
    store.commit().await?;

    Ok(Json(response))
}

/// Begin (or resume) an attempt and return its first question.
///
/// POST /play/start
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let mut store = PgPlayStore::begin(&state.pool).await?;
    let outcome = state.play.start(&mut store, &request).await?;
    store.commit().await?;

    record_attempt_started(&outcome);

    Ok(Json(outcome.response))
}

/// Answer the current question and move to the next one.
///
/// POST /play/next
pub async fn next(
    State(state): State<AppState>,
    payload: Result<Json<NextRequest>, JsonRejection>,
) -> Result<Json<NextResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let mut store = PgPlayStore::begin(&state.pool).await?;
    let outcome = state.play.next(&mut store, &request).await?;
    store.commit().await?;

    record_next_outcome(&outcome);

    Ok(Json(outcome.response))
}

/// Leaderboard of a match.
///
/// GET /play/rankings/:match_uid
pub async fn rankings(
    State(state): State<AppState>,
    Path(match_uid): Path<i64>,
) -> Result<Json<RankingsResponse>, ApiError> {
    let mut store = PgPlayStore::begin(&state.pool).await?;
    let response = state.play.rankings(&mut store, match_uid).await?;
    store.commit().await?;

    Ok(Json(response))
}
