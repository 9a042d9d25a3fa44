//! Ingestion endpoint request handling.
//!
//! `POST /api/vercel/{channelid}` with a JSON array of log events.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::Utc;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::{header, Method, Request, Response, StatusCode};
use serde_json::json;

use crate::pipeline::{IngestError, IngestionService};

use super::rate_limit::{FixedWindowRateLimiter, RateLimitDecision};

pub const INGEST_PATH_PREFIX: &str = "/api/vercel/";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub type HttpResponse = Response<Full<Bytes>>;

/// Shared state behind every connection.
pub struct AppState {
    pub ingestion: IngestionService,
    pub rate_limiter: Option<FixedWindowRateLimiter>,
}

/// Extract the channel id from an ingestion path.
pub fn channel_id_from_path(path: &str) -> Option<&str> {
    let id = path.strip_prefix(INGEST_PATH_PREFIX)?;
    let id = id.strip_suffix('/').unwrap_or(id);
    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id)
    }
}

/// Handle one HTTP request. Never fails; errors become status codes.
pub async fn handle_request<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let channel_id = match channel_id_from_path(req.uri().path()) {
        Some(id) => id.to_string(),
        None => {
            log::debug!("ROUTE_NOT_FOUND path={}", req.uri().path());
            return Ok(json_response(StatusCode::NOT_FOUND, "Not found", None));
        }
    };

    if req.method() != Method::POST {
        return Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
            None,
        ));
    }

    let decision = state
        .rate_limiter
        .as_ref()
        .map(|limiter| limiter.check(&channel_id, Utc::now()));

    if let Some(d) = decision.filter(|d| !d.allowed) {
        log::warn!(
            "[channel={}] RATE_LIMITED current={} limit={}",
            channel_id,
            d.current,
            d.limit
        );
        return Ok(json_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests",
            decision.as_ref(),
        ));
    }

    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                return Ok(json_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Payload too large",
                    decision.as_ref(),
                ));
            }
            log::warn!("[channel={}] BODY_READ_FAILED error={}", channel_id, e);
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                "Unable to read request body",
                decision.as_ref(),
            ));
        }
    };

    let body = if body.is_empty() { None } else { Some(body.as_ref()) };

    let response = match state.ingestion.ingest(&channel_id, body).await {
        Ok(_) => created_response(decision.as_ref()),
        Err(e) => error_response(&e, decision.as_ref()),
    };
    Ok(response)
}

fn created_response(decision: Option<&RateLimitDecision>) -> HttpResponse {
    let body = json!({ "statusCode": 201 }).to_string();
    build_response(StatusCode::CREATED, body, decision)
}

/// Map an ingestion failure to its HTTP response.
pub fn error_response(error: &IngestError, decision: Option<&RateLimitDecision>) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &error.public_message(), decision)
}

fn json_response(
    status: StatusCode,
    message: &str,
    decision: Option<&RateLimitDecision>,
) -> HttpResponse {
    let body = json!({ "statusCode": status.as_u16(), "message": message }).to_string();
    build_response(status, body, decision)
}

fn build_response(
    status: StatusCode,
    body: String,
    decision: Option<&RateLimitDecision>,
) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    if let Some(decision) = decision {
        for (name, value) in decision.headers() {
            if let Ok(value) = header::HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
    }
    response
}
