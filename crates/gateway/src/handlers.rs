use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, IF_MODIFIED_SINCE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tfsgate_client::{Connector, FileName};
use tracing::{Level, info};

use crate::{AppState, GatewayError};

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    pub tfsname: Option<String>,
    pub suffix: Option<String>,
}

impl FileQuery {
    fn name(&self) -> Result<FileName, GatewayError> {
        let raw = self
            .tfsname
            .as_deref()
            .ok_or_else(|| GatewayError::BadRequest("tfsname query parameter is required".into()))?;
        FileName::parse(raw).map_err(|e| GatewayError::BadRequest(e.to_string()))
    }
}

/// Runs a blocking transfer off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, GatewayError>
where
    F: FnOnce() -> Result<T, GatewayError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GatewayError::Internal(format!("transfer task failed: {e}")))?
}

fn file_response(len: u64, body: Body) -> Response {
    (
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        body,
    )
        .into_response()
}

/// POST {put_path}
///
/// Stores the request body as a new file and answers with its name.
pub async fn put_file<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<FileQuery>,
    body: Bytes,
) -> Result<Response, GatewayError>
where
    C: Connector + 'static,
{
    if body.is_empty() {
        return Err(GatewayError::BadRequest("request body is empty".into()));
    }

    let name = blocking(move || {
        let session = state.pool.get(&state.config.ns_addr)?;
        let name = tfsgate_transfer::put(&*session, &body, query.suffix.as_deref(), &state.engine)?;
        Ok(name)
    })
    .await?;

    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        name.to_string(),
    )
        .into_response())
}

/// GET {get_path}?tfsname=<name>
///
/// Streams back a file only after its checksum has been verified. Stored
/// files never change, so any conditional request is answered with 304.
pub async fn get_file<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Result<Response, GatewayError>
where
    C: Connector + 'static,
{
    let name = query.name()?;
    if headers.contains_key(IF_MODIFIED_SINCE) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let data = blocking(move || {
        let session = state.pool.get(&state.config.ns_addr)?;
        let data = tfsgate_transfer::get(&*session, &name, query.suffix.as_deref(), &state.engine)?;
        Ok(data)
    })
    .await?;

    Ok(file_response(data.len() as u64, Body::from(data)))
}

/// HEAD {get_path}?tfsname=<name>
///
/// Reports the stored size without transferring the contents.
pub async fn head_file<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Result<Response, GatewayError>
where
    C: Connector + 'static,
{
    let name = query.name()?;
    if headers.contains_key(IF_MODIFIED_SINCE) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let stat = blocking(move || {
        let session = state.pool.get(&state.config.ns_addr)?;
        let stat = tfsgate_transfer::stat(&*session, &name, query.suffix.as_deref())?;
        Ok(stat)
    })
    .await?;

    Ok(file_response(stat.size as u64, Body::empty()))
}

/// PUT /admin/log-level
pub async fn set_log_level<C>(
    State(state): State<Arc<AppState<C>>>,
    body: String,
) -> Result<StatusCode, GatewayError>
where
    C: Connector + 'static,
{
    let Some(setter) = &state.log_level else {
        return Err(GatewayError::NotFound("runtime log level is not enabled".into()));
    };

    let requested = body.trim();
    let level: Level = requested
        .parse()
        .map_err(|_| GatewayError::BadRequest(format!("unknown log level {requested:?}")))?;

    setter(level).map_err(GatewayError::Internal)?;
    info!(%level, "log level changed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> &'static str {
    "ok"
}
