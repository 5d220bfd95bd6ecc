//! # apikit - typed handler adapter for axum
//!
//! Registers plain business functions as HTTP endpoints. A handler is written
//! against a request context, an optional validated JSON body and an optional
//! pagination query; apikit checks its shape once at registration, binds the
//! arguments of every request, invokes it and normalizes the result into one of
//! the response envelopes:
//!
//! - standard: `{"code": 200, "msg": "ok", "data"?: ...}`
//! - error: `{"code": <mapped or -1>, "msg": "..."}` with status 400
//! - paginated: `{"code": 200, "result": {...}, "links": {...}}`
//!
//! ## Example
//!
//! ```rust,ignore
//! use apikit::{Dispatcher, ErrorCodeTable, PageQuery, PageResult, RequestCtx};
//! use axum::{routing::get, Json, Router};
//!
//! async fn list_notes(ctx: RequestCtx, q: PageQuery) -> Result<PageResult<Note>, NotesError> {
//!     // ...
//! }
//!
//! let codes = ErrorCodeTable::builder().code(NotesError::NotFound, 1001).build();
//! let dispatcher = Dispatcher::new(codes);
//! let router: Router = Router::new().route("/notes", get(dispatcher.handle(list_notes)?));
//! ```

pub mod binder;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod endpoint;
pub mod envelope;
pub mod error_codes;
pub mod pagination;
mod resolver;

pub use binder::{BindError, BoundArguments, RequestBody};
pub use config::{ApiConfig, ConfigError};
pub use context::RequestCtx;
pub use descriptor::{HandlerDescriptor, ParamKind, ReturnKind, SignatureError};
pub use endpoint::{Dispatcher, Endpoint, IntoEndpoint};
pub use envelope::{Envelope, PagedEnvelope, OK_MSG};
pub use error_codes::{ErrorCodeTable, ErrorCodeTableBuilder, UNKNOWN_CODE};
pub use pagination::{get_links, PageLinks, PageQuery, PageResult, PaginationConfig};

// Handlers take their body as `Json<B>`.
pub use axum::Json;
