//! Per-request argument binding: JSON body decode + validation, pagination parsing.

use std::future::Future;

use axum::body::{to_bytes, Body};
use axum::Json;
use serde::{de::DeserializeOwned, Serialize};
use validator::{Validate, ValidationErrors};

use crate::config::ApiConfig;
use crate::context::RequestCtx;
use crate::descriptor::ParamKind;
use crate::pagination::{PageQuery, PaginationConfig, PaginationError};

/// Types usable as a handler request body.
///
/// The body is decoded from JSON, re-encoded for diagnostic logging and then
/// checked with its declared `validator` constraints.
pub trait RequestBody: DeserializeOwned + Serialize + Validate + Send + 'static {}

impl<T> RequestBody for T where T: DeserializeOwned + Serialize + Validate + Send + 'static {}

/// Client-side failure while binding the handler arguments.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("invalid request body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to record request body: {0}")]
    Record(#[source] serde_json::Error),

    #[error("request body validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

/// Materialized arguments of one request: context, body slot, pagination slot.
///
/// Absent slots are `()`.
#[derive(Debug)]
pub struct BoundArguments<B, P> {
    pub ctx: RequestCtx,
    pub body: B,
    pub page: P,
}

mod sealed {
    pub trait Sealed {}
}

/// Body position of a handler shape.
pub trait BodySlot: sealed::Sealed + Sized + Send + 'static {
    const KIND: Option<ParamKind>;

    fn bind(
        ctx: RequestCtx,
        body: Body,
        max_bytes: usize,
    ) -> impl Future<Output = Result<Self, BindError>> + Send;
}

/// Pagination position of a handler shape.
pub trait PageSlot: sealed::Sealed + Sized + Send + 'static {
    const KIND: Option<ParamKind>;

    fn bind(ctx: &RequestCtx, cfg: &PaginationConfig) -> Result<Self, BindError>;
}

impl sealed::Sealed for () {}
impl<B: RequestBody> sealed::Sealed for Json<B> {}
impl sealed::Sealed for PageQuery {}

impl BodySlot for () {
    const KIND: Option<ParamKind> = None;

    async fn bind(_ctx: RequestCtx, _body: Body, _max_bytes: usize) -> Result<Self, BindError> {
        Ok(())
    }
}

impl<B: RequestBody> BodySlot for Json<B> {
    const KIND: Option<ParamKind> = Some(ParamKind::Body);

    async fn bind(ctx: RequestCtx, body: Body, max_bytes: usize) -> Result<Self, BindError> {
        let bytes = to_bytes(body, max_bytes)
            .await
            .map_err(BindError::BodyRead)?;
        let value: B = serde_json::from_slice(&bytes).map_err(BindError::Decode)?;

        let recorded = serde_json::to_string(&value).map_err(BindError::Record)?;
        ctx.record_body(recorded);

        value.validate()?;
        Ok(Json(value))
    }
}

impl PageSlot for () {
    const KIND: Option<ParamKind> = None;

    fn bind(_ctx: &RequestCtx, _cfg: &PaginationConfig) -> Result<Self, BindError> {
        Ok(())
    }
}

impl PageSlot for PageQuery {
    const KIND: Option<ParamKind> = Some(ParamKind::Pagination);

    fn bind(ctx: &RequestCtx, cfg: &PaginationConfig) -> Result<Self, BindError> {
        Ok(PageQuery::parse(ctx.uri(), cfg)?)
    }
}

/// Parameter kinds of the shape `(RequestCtx, B, P)` with absent slots skipped.
pub fn param_kinds<B: BodySlot, P: PageSlot>() -> Vec<ParamKind> {
    std::iter::once(ParamKind::Context)
        .chain(B::KIND)
        .chain(P::KIND)
        .collect()
}

/// Bind the arguments for a `(RequestCtx, B, P)` shape. The body is bound
/// before the pagination query; the first failure is returned.
pub async fn bind<B: BodySlot, P: PageSlot>(
    ctx: RequestCtx,
    body: Body,
    cfg: &ApiConfig,
) -> Result<BoundArguments<B, P>, BindError> {
    let body = B::bind(ctx.clone(), body, cfg.max_body_bytes).await?;
    let page = P::bind(&ctx, &cfg.pagination)?;
    Ok(BoundArguments { ctx, body, page })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct NewItem {
        #[validate(length(min = 1, max = 32))]
        name: String,
        #[validate(range(min = 1))]
        qty: u32,
    }

    fn request(uri: &str, body: &str) -> (RequestCtx, Body) {
        let (parts, body) = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_owned()))
            .unwrap()
            .into_parts();
        (RequestCtx::from_parts(parts), body)
    }

    #[test]
    fn param_kinds_follow_slots() {
        assert_eq!(param_kinds::<(), ()>(), vec![ParamKind::Context]);
        assert_eq!(
            param_kinds::<Json<NewItem>, ()>(),
            vec![ParamKind::Context, ParamKind::Body]
        );
        assert_eq!(
            param_kinds::<(), PageQuery>(),
            vec![ParamKind::Context, ParamKind::Pagination]
        );
        assert_eq!(
            param_kinds::<Json<NewItem>, PageQuery>(),
            vec![ParamKind::Context, ParamKind::Body, ParamKind::Pagination]
        );
    }

    #[tokio::test]
    async fn context_only_ignores_body() {
        let (ctx, body) = request("/items", "not json at all");
        let args = bind::<(), ()>(ctx, body, &ApiConfig::default())
            .await
            .unwrap();
        assert!(args.ctx.recorded_body().is_none());
    }

    #[tokio::test]
    async fn body_is_decoded_recorded_and_validated() {
        let (ctx, body) = request("/items", r#"{"name":"apple","qty":3}"#);
        let args = bind::<Json<NewItem>, ()>(ctx, body, &ApiConfig::default())
            .await
            .unwrap();
        let Json(item) = args.body;
        assert_eq!(item.name, "apple");
        assert_eq!(item.qty, 3);
        assert_eq!(
            args.ctx.recorded_body().as_deref(),
            Some(r#"{"name":"apple","qty":3}"#)
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let (ctx, body) = request("/items", r#"{"name":"apple","#);
        let err = bind::<Json<NewItem>, ()>(ctx, body, &ApiConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::Decode(_)));
    }

    #[tokio::test]
    async fn constraint_violation_is_recorded_then_rejected() {
        let (ctx, body) = request("/items", r#"{"name":"","qty":0}"#);
        let err = bind::<Json<NewItem>, ()>(ctx.clone(), body, &ApiConfig::default())
            .await
            .unwrap_err();
        match err {
            BindError::Validation(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("qty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ctx.recorded_body().is_some());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let cfg = ApiConfig {
            max_body_bytes: 8,
            ..Default::default()
        };
        let (ctx, body) = request("/items", r#"{"name":"apple","qty":3}"#);
        let err = bind::<Json<NewItem>, ()>(ctx, body, &cfg).await.unwrap_err();
        assert!(matches!(err, BindError::BodyRead(_)));
    }

    #[tokio::test]
    async fn pagination_is_parsed_after_body() {
        let (ctx, body) = request("/items?page=2&limit=5", r#"{"name":"apple","qty":3}"#);
        let args = bind::<Json<NewItem>, PageQuery>(ctx, body, &ApiConfig::default())
            .await
            .unwrap();
        assert_eq!(args.page, PageQuery { page: 2, limit: 5 });
    }

    #[tokio::test]
    async fn bad_pagination_is_a_bind_error() {
        let (ctx, body) = request("/items?page=0", "");
        let err = bind::<(), PageQuery>(ctx, body, &ApiConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::Pagination(PaginationError::ZeroPage)
        ));
    }
}
