//! Turns handler outcomes into response envelopes and finalizes the request.

use std::error::Error as StdError;
use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::binder::BindError;
use crate::context::RequestCtx;
use crate::envelope::{Envelope, PagedEnvelope};
use crate::error_codes::{ErrorCodeTable, UNKNOWN_CODE};
use crate::pagination::{get_links, PageQuery, PageResult};

/// Binding failure: 400 with the unknown code.
pub(crate) fn reject(ctx: &RequestCtx, err: &BindError) -> Response {
    log_failure(ctx, err);
    finish(
        ctx,
        StatusCode::BAD_REQUEST,
        Json(Envelope::error(UNKNOWN_CODE, err.to_string())),
    )
}

/// Business error: 400 with the mapped code (or the unknown code).
pub(crate) fn resolve_error<E>(ctx: &RequestCtx, codes: &ErrorCodeTable, err: &E) -> Response
where
    E: StdError + 'static,
{
    log_failure(ctx, err);
    let code = codes.code_for(err);
    finish(
        ctx,
        StatusCode::BAD_REQUEST,
        Json(Envelope::error(code, err.to_string())),
    )
}

/// Outcome of a non-paginated handler.
pub(crate) fn resolve_standard<T, E>(
    ctx: &RequestCtx,
    codes: &ErrorCodeTable,
    outcome: Result<T, E>,
) -> Response
where
    T: Serialize,
    E: StdError + 'static,
{
    let payload = match outcome {
        Ok(payload) => payload,
        Err(err) => return resolve_error(ctx, codes, &err),
    };

    if let Some(resp) = bypassed(ctx) {
        return resp;
    }

    match serde_json::to_value(&payload) {
        Ok(data) => finish(ctx, StatusCode::OK, Json(Envelope::ok(data))),
        Err(err) => unserializable(ctx, &err),
    }
}

/// Outcome of a paginated handler; links come from the result total and the parsed query.
pub(crate) fn resolve_paginated<T, E>(
    ctx: &RequestCtx,
    codes: &ErrorCodeTable,
    query: &PageQuery,
    outcome: Result<PageResult<T>, E>,
) -> Response
where
    T: Serialize,
    E: StdError + 'static,
{
    let result = match outcome {
        Ok(result) => result,
        Err(err) => return resolve_error(ctx, codes, &err),
    };

    if let Some(resp) = bypassed(ctx) {
        return resp;
    }

    let links = get_links(ctx.original_uri(), result.total, query);
    match serde_json::to_value(PagedEnvelope::ok(result, links)) {
        Ok(body) => finish(ctx, StatusCode::OK, Json(body)),
        Err(err) => unserializable(ctx, &err),
    }
}

/// Response written by the handler itself, if it finalized the request.
fn bypassed(ctx: &RequestCtx) -> Option<Response> {
    if ctx.is_finalized() {
        tracing::trace!(uri = %ctx.uri(), "handler finalized the response itself");
        return ctx.take_response();
    }
    None
}

fn unserializable(ctx: &RequestCtx, err: &serde_json::Error) -> Response {
    tracing::error!(
        url = %ctx.uri(),
        request_id = ctx.request_id().unwrap_or("n/a"),
        error = %err,
        "failed to serialize handler result"
    );
    finish(
        ctx,
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::error(UNKNOWN_CODE, "failed to serialize response")),
    )
}

fn log_failure(ctx: &RequestCtx, err: &dyn Display) {
    let body = ctx.recorded_body();
    tracing::error!(
        url = %ctx.original_uri(),
        request_body = body.as_deref().unwrap_or(""),
        request_id = ctx.request_id().unwrap_or("n/a"),
        error = %err,
        "Error requesting the api server"
    );
}

/// Finalize through the context slot and hand the winning response to the router.
fn finish(ctx: &RequestCtx, status: StatusCode, body: impl IntoResponse) -> Response {
    ctx.finalize(status, body);
    ctx.take_response()
        .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
