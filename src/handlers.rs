use crate::actions::{RecordOutcome, record_drink, remediation};
use crate::errors::AppError;
use crate::models::{ClickRequest, ClickResponse, DrinkKind, Event, ScoresResponse, StatsResponse};
use crate::state::AppState;
use crate::stats::{build_scores, build_stats_at};
use crate::ui::{IndexQuery, Notice, pick_quote, render_index};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};

pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Html<String> {
    let events = state.store.events_or_empty().await;
    let scores = build_scores(&state.config, &events);
    let notice = Notice::from_query(&query, &state.config);
    Html(render_index(&state.config, &scores, notice.as_ref(), pick_quote()))
}

pub async fn get_scores(State(state): State<AppState>) -> Json<ScoresResponse> {
    let events = state.store.events_or_empty().await;
    Json(build_scores(&state.config, &events))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let events = state.store.events_or_empty().await;
    Json(build_stats_at(&state.config, &events, state.now()))
}

pub async fn get_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    let mut events = state.store.events_or_empty().await;
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(events)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn click(
    State(state): State<AppState>,
    Json(payload): Json<ClickRequest>,
) -> Result<(StatusCode, Json<ClickResponse>), AppError> {
    let (user, kind) = parse_click(&state, &payload.user, &payload.drink)?;
    let outcome = record_drink(&state.store, &state.config, state.now(), &user, kind).await;

    let response = match outcome {
        RecordOutcome::Recorded => {
            let events = state.store.events_or_empty().await;
            (
                StatusCode::OK,
                ClickResponse::Recorded {
                    scores: build_scores(&state.config, &events),
                },
            )
        }
        RecordOutcome::CooldownActive { remaining_seconds } => (
            StatusCode::TOO_MANY_REQUESTS,
            ClickResponse::CooldownActive { remaining_seconds },
        ),
        RecordOutcome::SchemaMismatch { column } => (
            StatusCode::CONFLICT,
            ClickResponse::SchemaMismatch {
                remediation: remediation(&column),
                column,
            },
        ),
        RecordOutcome::Failed { message } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ClickResponse::Failed { message },
        ),
    };

    Ok((response.0, Json(response.1)))
}

pub async fn click_form(
    State(state): State<AppState>,
    Path((user, drink)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let (user, kind) = parse_click(&state, &user, &drink)?;
    let outcome = record_drink(&state.store, &state.config, state.now(), &user, kind).await;
    let notice = Notice::from_outcome(&user, kind, outcome);
    Ok(Redirect::to(&format!("/?{}", notice.to_query())))
}

fn parse_click(state: &AppState, user: &str, drink: &str) -> Result<(String, DrinkKind), AppError> {
    let user = user.trim();
    if !state.config.is_tracked(user) {
        return Err(AppError::bad_request(format!("unknown user '{user}'")));
    }
    let kind = DrinkKind::parse(drink)
        .ok_or_else(|| AppError::bad_request("drink must be 'coffee' or 'tea'"))?;
    Ok((user.to_string(), kind))
}
