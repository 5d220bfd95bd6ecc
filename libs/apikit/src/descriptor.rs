//! Handler shape descriptors and the registration-time signature check.
//!
//! Every handler accepted by the [`Dispatcher`](crate::Dispatcher) is described
//! by a [`HandlerDescriptor`]: the ordered kinds of its parameters and of its
//! return values. A descriptor can only be obtained through
//! [`HandlerDescriptor::new`], which applies the shape rules in a fixed order
//! and reports the first violation. Holding a descriptor therefore means the
//! shape has been accepted.

use std::fmt;

/// Kind of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The request-context handle, always first.
    Context,
    /// A decoded and validated JSON request body.
    Body,
    /// A parsed pagination query, always last when present.
    Pagination,
}

/// Kind of a handler return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Any serialisable value sent back as the `data` field.
    Payload,
    /// A pagination result carrying a total count.
    PageResult,
    /// The error channel.
    Error,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Context => "RequestCtx",
            ParamKind::Body => "Json<Body>",
            ParamKind::Pagination => "PageQuery",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnKind::Payload => "T",
            ReturnKind::PageResult => "PageResult<T>",
            ReturnKind::Error => "E",
        };
        f.write_str(s)
    }
}

/// Rejection reasons for a handler shape. Variants follow the order in which
/// the rules are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("handler must take 1 to 3 parameters, got {count} in {shape}")]
    ParamCount { count: usize, shape: String },

    #[error("the first parameter must be the request context in {shape}")]
    ContextFirst { shape: String },

    #[error("the second parameter must be a request body or a pagination query in {shape}")]
    SecondParam { shape: String },

    #[error("a three parameter handler must take (RequestCtx, Json<Body>, PageQuery), got {shape}")]
    ThreeParams { shape: String },

    #[error("handler must return 1 or 2 values, got {count} in {shape}")]
    ReturnCount { count: usize, shape: String },

    #[error("the last parameter is a pagination query, the first return value must be a page result in {shape}")]
    PaginationResult { shape: String },

    #[error("the last return value must be an error in {shape}")]
    ErrorLast { shape: String },
}

/// Validated shape of a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    params: Vec<ParamKind>,
    returns: Vec<ReturnKind>,
}

impl HandlerDescriptor {
    /// Check a candidate shape and accept it.
    ///
    /// Rules, first violation wins:
    /// 1. 1, 2 or 3 parameters;
    /// 2. parameter 0 is the context;
    /// 3. with 2 parameters, parameter 1 is a body or a pagination query;
    /// 4. with 3 parameters, they are context, body, pagination query;
    /// 5. 1 or 2 return values;
    /// 6. a trailing pagination query requires a page result as first return;
    /// 7. the last return value is the error.
    pub fn new(params: Vec<ParamKind>, returns: Vec<ReturnKind>) -> Result<Self, SignatureError> {
        let shape = render_shape(&params, &returns);

        if params.is_empty() || params.len() > 3 {
            return Err(SignatureError::ParamCount {
                count: params.len(),
                shape,
            });
        }

        if params[0] != ParamKind::Context {
            return Err(SignatureError::ContextFirst { shape });
        }

        if params.len() == 2 && params[1] == ParamKind::Context {
            return Err(SignatureError::SecondParam { shape });
        }

        if params.len() == 3 && (params[1] != ParamKind::Body || params[2] != ParamKind::Pagination)
        {
            return Err(SignatureError::ThreeParams { shape });
        }

        if returns.is_empty() || returns.len() > 2 {
            return Err(SignatureError::ReturnCount {
                count: returns.len(),
                shape,
            });
        }

        if params.last() == Some(&ParamKind::Pagination) && returns[0] != ReturnKind::PageResult {
            return Err(SignatureError::PaginationResult { shape });
        }

        if returns.last() != Some(&ReturnKind::Error) {
            return Err(SignatureError::ErrorLast { shape });
        }

        Ok(Self { params, returns })
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns(&self) -> &[ReturnKind] {
        &self.returns
    }

    /// Whether a JSON body is decoded for this handler.
    pub fn has_body(&self) -> bool {
        self.params.contains(&ParamKind::Body)
    }

    /// Whether the handler is a paged listing (last parameter is a pagination query).
    pub fn is_paginated(&self) -> bool {
        self.params.last() == Some(&ParamKind::Pagination)
    }
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_shape(&self.params, &self.returns))
    }
}

fn render_shape(params: &[ParamKind], returns: &[ReturnKind]) -> String {
    let params = params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let returns = returns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("fn({params}) -> ({returns})")
}
