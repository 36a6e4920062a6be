use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::{ExpirationPolicy, ShortenParams};
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;

pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>)> {
    let Json(request) = payload?;

    let mut params = ShortenParams::new(request.url);
    if let Some(ttl) = request.ttl_seconds {
        params = params.with_expiration(match ttl {
            0 => ExpirationPolicy::Never,
            secs => ExpirationPolicy::AfterDuration(Duration::from_secs(secs)),
        });
    }

    let shortened = state.shortener().shorten(params).await?;
    if shortened.created {
        info!(code = %shortened.record.code, "short link created");
    }

    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(shortened.into())))
}

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let record = state.shortener().resolve(&code).await?;
    let location = HeaderValue::try_from(record.original_url.as_str()).map_err(|e| {
        error!(code = %record.code, error = %e, "stored URL is not a valid Location header");
        AppError::Internal
    })?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
}
