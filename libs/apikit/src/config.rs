use serde::{Deserialize, Serialize};

use crate::pagination::PaginationConfig;

/// Default cap on decoded request bodies (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Dispatcher settings, read from the `apikit` entry of the modules config bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Largest request body the binder reads, in bytes.
    pub max_body_bytes: usize,
    pub pagination: PaginationConfig,
}

/// Settings that cannot serve a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("pagination.max_limit must be greater than 0")]
    ZeroMaxLimit,

    #[error("pagination.default_limit must be in 1..={max}, got {got}")]
    DefaultLimitOutOfRange { got: u64, max: u64 },
}

impl ApiConfig {
    /// Reject settings under which every request would fail to bind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        let PaginationConfig {
            default_limit,
            max_limit,
        } = self.pagination;
        if max_limit == 0 {
            return Err(ConfigError::ZeroMaxLimit);
        }
        if default_limit == 0 || default_limit > max_limit {
            return Err(ConfigError::DefaultLimitOutOfRange {
                got: default_limit,
                max: max_limit,
            });
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            pagination: PaginationConfig::default(),
        }
    }
}
