//! Mapping from known business errors to stable numeric codes.

use std::error::Error as StdError;
use std::fmt;

/// Code reported for errors that have no registered mapping.
pub const UNKNOWN_CODE: i32 = -1;

type Matcher = Box<dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync>;

struct Entry {
    type_name: &'static str,
    matches: Matcher,
    code: i32,
}

/// Read-only table of registered error values and their codes.
///
/// Entries are compared by value: a returned error matches an entry when it has
/// the same concrete type as the registered value and compares equal to it.
/// Only types implementing `PartialEq` can be registered, so a returned error of
/// a type without value equality never matches and resolves to
/// [`UNKNOWN_CODE`].
#[derive(Default)]
pub struct ErrorCodeTable {
    entries: Vec<Entry>,
}

impl ErrorCodeTable {
    pub fn builder() -> ErrorCodeTableBuilder {
        ErrorCodeTableBuilder::default()
    }

    /// Empty table: every error resolves to [`UNKNOWN_CODE`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Code registered for `err`, or [`UNKNOWN_CODE`].
    pub fn code_for(&self, err: &(dyn StdError + 'static)) -> i32 {
        self.entries
            .iter()
            .find(|e| (e.matches)(err))
            .map(|e| e.code)
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ErrorCodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.type_name, e.code)))
            .finish()
    }
}

#[derive(Default)]
pub struct ErrorCodeTableBuilder {
    entries: Vec<Entry>,
}

impl ErrorCodeTableBuilder {
    /// Register `err` under `code`. The first registration matching an error wins.
    pub fn code<E>(mut self, err: E, code: i32) -> Self
    where
        E: StdError + PartialEq + Send + Sync + 'static,
    {
        self.entries.push(Entry {
            type_name: std::any::type_name::<E>(),
            matches: Box::new(move |candidate| {
                candidate
                    .downcast_ref::<E>()
                    .is_some_and(|candidate| *candidate == err)
            }),
            code,
        });
        self
    }

    pub fn build(self) -> ErrorCodeTable {
        ErrorCodeTable {
            entries: self.entries,
        }
    }
}
