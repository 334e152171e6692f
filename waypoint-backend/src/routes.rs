use crate::compress::{self, CompactPlayer};
use crate::error::AppError;
use crate::helpers::{now, token_matches};
use crate::validation;
use crate::AppState;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use axum_macros::debug_handler;
use headers::authorization::Bearer;
use headers::Authorization;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Serialize)]
pub(crate) struct IngestResponse {
    server: String,
    records: usize,
}

#[derive(Serialize)]
pub(crate) struct PlayersResponse {
    server: String,
    updated_at: i64,
    players: Vec<CompactPlayer>,
}

#[derive(Serialize)]
pub(crate) struct ServerStatus {
    name: String,
    tracked: usize,
}

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    servers: Vec<ServerStatus>,
}

#[debug_handler]
pub(crate) async fn ingest(
    State(state): State<Arc<AppState>>,
    Path(server): Path<String>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(records): Json<Vec<Value>>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(expected) = &state.ingest_token {
        let presented = auth.as_ref().map(|TypedHeader(auth)| auth.token());
        if !presented.is_some_and(|token| token_matches(expected, token)) {
            return Err(AppError::Unauthorized);
        }
    }

    validation::validate_server_name(&server)?;
    validation::validate_snapshot(&records)?;

    let count = records.len();
    state
        .players
        .replace(&server, compress::compress_players(&records), now())
        .await;

    // History I/O is blocking file access
    let history = Arc::clone(&state.history);
    let scope = server.clone();
    tokio::task::spawn_blocking(move || history.ingest(&records, &scope)).await?;

    tracing::debug!(%server, records = count, "ingested snapshot");
    Ok((
        StatusCode::OK,
        Json(IngestResponse {
            server,
            records: count,
        }),
    ))
}

pub(crate) async fn players(
    State(state): State<Arc<AppState>>,
    Path(server): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_server_name(&server)?;

    let (players, updated_at) = state
        .players
        .get(&server)
        .await
        .ok_or_else(|| AppError::ServerNotFound(server.clone()))?;

    Ok(Json(PlayersResponse {
        server,
        updated_at,
        players,
    }))
}

pub(crate) async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let servers = state
        .history
        .server_scopes()
        .into_iter()
        .map(|name| {
            let tracked = state.history.resident_identities(&name).len();
            ServerStatus { name, tracked }
        })
        .collect();

    Json(StatusResponse { servers })
}
