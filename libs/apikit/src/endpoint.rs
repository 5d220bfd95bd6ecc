//! Handler registration and invocation.
//!
//! [`Dispatcher::handle`] is the single registration entry point. It accepts a
//! closed set of handler shapes through [`IntoEndpoint`]:
//!
//! | shape                                  | return                     |
//! |----------------------------------------|----------------------------|
//! | `Fn(RequestCtx)`                       | `Result<T, E>`             |
//! | `Fn(RequestCtx, Json<B>)`              | `Result<T, E>`             |
//! | `Fn(RequestCtx, PageQuery)`            | `Result<PageResult<T>, E>` |
//! | `Fn(RequestCtx, Json<B>, PageQuery)`   | `Result<PageResult<T>, E>` |
//!
//! `T` is any serialisable payload (`()` for no payload), `B` any
//! [`RequestBody`] and `E` any `std::error::Error`. The returned [`Endpoint`]
//! plugs into an axum router like a plain handler function.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(codes);
//! let router = Router::new()
//!     .route("/items", post(dispatcher.handle(create_item)?))
//!     .route("/items", get(dispatcher.handle(list_items)?));
//! ```

use std::any::TypeId;
use std::error::Error as StdError;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::response::Response;
use axum::Json;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::binder::{self, BodySlot, BoundArguments, PageSlot, RequestBody};
use crate::config::{ApiConfig, ConfigError};
use crate::context::RequestCtx;
use crate::descriptor::{HandlerDescriptor, ReturnKind, SignatureError};
use crate::error_codes::ErrorCodeTable;
use crate::pagination::{PageQuery, PageResult};
use crate::resolver;

/// A handler function of one of the supported shapes.
///
/// `Args` is the parameter tuple of the shape and only serves to tell the
/// implementations apart.
pub trait IntoEndpoint<Args>: Clone + Send + Sync + Sized + 'static {
    /// Shape of this handler, checked once at registration.
    fn descriptor() -> Result<HandlerDescriptor, SignatureError>;

    /// Bind, invoke and resolve one request.
    fn dispatch(self, dispatcher: Dispatcher, req: Request) -> BoxFuture<'static, Response>;
}

/// Return kinds of a non-paginated handler; `()` payloads count as a single return.
fn standard_returns<T: 'static>() -> Vec<ReturnKind> {
    if TypeId::of::<T>() == TypeId::of::<()>() {
        vec![ReturnKind::Error]
    } else {
        vec![ReturnKind::Payload, ReturnKind::Error]
    }
}

fn paginated_returns() -> Vec<ReturnKind> {
    vec![ReturnKind::PageResult, ReturnKind::Error]
}

impl<F, Fut, T, E> IntoEndpoint<(RequestCtx,)> for F
where
    F: Fn(RequestCtx) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Serialize + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    fn descriptor() -> Result<HandlerDescriptor, SignatureError> {
        HandlerDescriptor::new(binder::param_kinds::<(), ()>(), standard_returns::<T>())
    }

    fn dispatch(self, dispatcher: Dispatcher, req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let BoundArguments { ctx, .. } = match dispatcher.bind::<(), ()>(req).await {
                Ok(args) => args,
                Err(resp) => return resp,
            };
            let outcome = self(ctx.clone()).await;
            resolver::resolve_standard(&ctx, dispatcher.error_codes(), outcome)
        })
    }
}

impl<F, Fut, B, T, E> IntoEndpoint<(RequestCtx, Json<B>)> for F
where
    F: Fn(RequestCtx, Json<B>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    B: RequestBody,
    T: Serialize + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    fn descriptor() -> Result<HandlerDescriptor, SignatureError> {
        HandlerDescriptor::new(binder::param_kinds::<Json<B>, ()>(), standard_returns::<T>())
    }

    fn dispatch(self, dispatcher: Dispatcher, req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let BoundArguments { ctx, body, .. } =
                match dispatcher.bind::<Json<B>, ()>(req).await {
                    Ok(args) => args,
                    Err(resp) => return resp,
                };
            let outcome = self(ctx.clone(), body).await;
            resolver::resolve_standard(&ctx, dispatcher.error_codes(), outcome)
        })
    }
}

impl<F, Fut, T, E> IntoEndpoint<(RequestCtx, PageQuery)> for F
where
    F: Fn(RequestCtx, PageQuery) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<PageResult<T>, E>> + Send + 'static,
    T: Serialize + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    fn descriptor() -> Result<HandlerDescriptor, SignatureError> {
        HandlerDescriptor::new(binder::param_kinds::<(), PageQuery>(), paginated_returns())
    }

    fn dispatch(self, dispatcher: Dispatcher, req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let BoundArguments { ctx, page, .. } =
                match dispatcher.bind::<(), PageQuery>(req).await {
                    Ok(args) => args,
                    Err(resp) => return resp,
                };
            let outcome = self(ctx.clone(), page).await;
            resolver::resolve_paginated(&ctx, dispatcher.error_codes(), &page, outcome)
        })
    }
}

impl<F, Fut, B, T, E> IntoEndpoint<(RequestCtx, Json<B>, PageQuery)> for F
where
    F: Fn(RequestCtx, Json<B>, PageQuery) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<PageResult<T>, E>> + Send + 'static,
    B: RequestBody,
    T: Serialize + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    fn descriptor() -> Result<HandlerDescriptor, SignatureError> {
        HandlerDescriptor::new(
            binder::param_kinds::<Json<B>, PageQuery>(),
            paginated_returns(),
        )
    }

    fn dispatch(self, dispatcher: Dispatcher, req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let BoundArguments { ctx, body, page } =
                match dispatcher.bind::<Json<B>, PageQuery>(req).await {
                    Ok(args) => args,
                    Err(resp) => return resp,
                };
            let outcome = self(ctx.clone(), body, page).await;
            resolver::resolve_paginated(&ctx, dispatcher.error_codes(), &page, outcome)
        })
    }
}

/// Marker used as the axum handler type parameter of [`Endpoint`].
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct Dispatched;

/// A registered handler, ready to be mounted on a router.
pub struct Endpoint<F, Args> {
    handler: F,
    dispatcher: Dispatcher,
    descriptor: Arc<HandlerDescriptor>,
    _args: PhantomData<fn() -> Args>,
}

impl<F: Clone, Args> Clone for Endpoint<F, Args> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            dispatcher: self.dispatcher.clone(),
            descriptor: self.descriptor.clone(),
            _args: PhantomData,
        }
    }
}

impl<F, Args> Endpoint<F, Args> {
    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }
}

impl<F, Args, S> Handler<Dispatched, S> for Endpoint<F, Args>
where
    F: IntoEndpoint<Args>,
    Args: 'static,
{
    type Future = BoxFuture<'static, Response>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        self.handler.dispatch(self.dispatcher, req)
    }
}

struct Inner {
    codes: ErrorCodeTable,
    config: ApiConfig,
}

/// Registration entry point holding the read-only error code table and settings.
///
/// Cheap to clone; every [`Endpoint`] keeps a handle to it.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(codes: ErrorCodeTable) -> Self {
        Self {
            inner: Arc::new(Inner {
                codes,
                config: ApiConfig::default(),
            }),
        }
    }

    /// Dispatcher with explicit settings; fails if they are inconsistent.
    pub fn with_config(codes: ErrorCodeTable, config: ApiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner { codes, config }),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    pub fn error_codes(&self) -> &ErrorCodeTable {
        &self.inner.codes
    }

    /// Validate the shape of `handler` and wrap it into a routable [`Endpoint`].
    ///
    /// A rejected shape is a programming error: callers are expected to abort
    /// startup on `Err`, so no request ever reaches an invalid handler.
    pub fn handle<F, Args>(&self, handler: F) -> Result<Endpoint<F, Args>, SignatureError>
    where
        F: IntoEndpoint<Args>,
        Args: 'static,
    {
        let name = std::any::type_name::<F>();
        let descriptor = F::descriptor().inspect_err(|e| {
            tracing::error!(handler = name, error = %e, "validate service handle func failed");
        })?;
        tracing::debug!(handler = name, shape = %descriptor, "handler registered");

        Ok(Endpoint {
            handler,
            dispatcher: self.clone(),
            descriptor: Arc::new(descriptor),
            _args: PhantomData,
        })
    }

    async fn bind<B, P>(&self, req: Request) -> Result<BoundArguments<B, P>, Response>
    where
        B: BodySlot,
        P: PageSlot,
    {
        let (parts, body) = req.into_parts();
        let ctx = RequestCtx::from_parts(parts);
        binder::bind::<B, P>(ctx.clone(), body, self.config())
            .await
            .map_err(|e| resolver::reject(&ctx, &e))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("codes", &self.inner.codes)
            .field("config", &self.inner.config)
            .finish()
    }
}
