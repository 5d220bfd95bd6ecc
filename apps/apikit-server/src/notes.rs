//! In-memory notes service exposed through apikit handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use apikit::{ErrorCodeTable, Json, PageQuery, PageResult, RequestCtx};
use axum::http::{header, StatusCode};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const NOT_FOUND_CODE: i32 = 1001;
pub const TITLE_TAKEN_CODE: i32 = 1002;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotesError {
    #[error("note not found")]
    NotFound,
    #[error("a note with this title already exists")]
    TitleTaken,
    #[error("notes service is not configured")]
    Unavailable,
}

/// Business error codes of the notes API.
pub fn error_codes() -> ErrorCodeTable {
    ErrorCodeTable::builder()
        .code(NotesError::NotFound, NOT_FOUND_CODE)
        .code(NotesError::TitleTaken, TITLE_TAKEN_CODE)
        .build()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewNote {
    #[validate(length(min = 1, max = 128))]
    pub title: String,
    #[validate(length(max = 4096))]
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NoteId {
    #[validate(range(min = 1))]
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NoteFilter {
    /// Case-insensitive substring matched against title and body.
    #[validate(length(min = 1, max = 64))]
    pub text: String,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    notes: BTreeMap<u64, Note>,
}

#[derive(Default)]
pub struct NotesService {
    store: RwLock<Store>,
}

impl NotesService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewNote) -> Result<Note, NotesError> {
        let mut store = self.store.write();
        if store.notes.values().any(|n| n.title == new.title) {
            return Err(NotesError::TitleTaken);
        }
        store.next_id += 1;
        let note = Note {
            id: store.next_id,
            title: new.title,
            body: new.body,
        };
        store.notes.insert(note.id, note.clone());
        Ok(note)
    }

    pub fn get(&self, id: u64) -> Result<Note, NotesError> {
        self.store
            .read()
            .notes
            .get(&id)
            .cloned()
            .ok_or(NotesError::NotFound)
    }

    pub fn list(&self, page: &PageQuery) -> PageResult<Note> {
        self.page_of(page, |_| true)
    }

    pub fn search(&self, filter: &NoteFilter, page: &PageQuery) -> PageResult<Note> {
        let needle = filter.text.to_lowercase();
        self.page_of(page, |n| {
            n.title.to_lowercase().contains(&needle) || n.body.to_lowercase().contains(&needle)
        })
    }

    fn page_of(&self, page: &PageQuery, keep: impl Fn(&Note) -> bool) -> PageResult<Note> {
        let store = self.store.read();
        let matching: Vec<&Note> = store.notes.values().filter(|n| keep(n)).collect();
        let items = matching
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|n| (*n).clone())
            .collect();
        PageResult::new(matching.len() as u64, items)
    }

    fn all(&self) -> Vec<Note> {
        self.store.read().notes.values().cloned().collect()
    }
}

fn service(ctx: &RequestCtx) -> Result<Arc<NotesService>, NotesError> {
    ctx.extension::<Arc<NotesService>>()
        .ok_or(NotesError::Unavailable)
}

// -------- handlers --------

pub async fn health(_ctx: RequestCtx) -> Result<(), NotesError> {
    Ok(())
}

pub async fn create_note(ctx: RequestCtx, Json(new): Json<NewNote>) -> Result<Note, NotesError> {
    let note = service(&ctx)?.create(new)?;
    tracing::info!(id = note.id, "note created");
    Ok(note)
}

pub async fn get_note(ctx: RequestCtx, Json(req): Json<NoteId>) -> Result<Note, NotesError> {
    service(&ctx)?.get(req.id)
}

pub async fn list_notes(ctx: RequestCtx, page: PageQuery) -> Result<PageResult<Note>, NotesError> {
    Ok(service(&ctx)?.list(&page))
}

pub async fn search_notes(
    ctx: RequestCtx,
    Json(filter): Json<NoteFilter>,
    page: PageQuery,
) -> Result<PageResult<Note>, NotesError> {
    Ok(service(&ctx)?.search(&filter, &page))
}

/// Writes a CSV export directly, bypassing the JSON envelope.
pub async fn export_notes(ctx: RequestCtx) -> Result<(), NotesError> {
    let mut csv = String::from("id,title\n");
    for note in service(&ctx)?.all() {
        csv.push_str(&format!("{},\"{}\"\n", note.id, note.title.replace('"', "\"\"")));
    }
    ctx.finalize(StatusCode::OK, ([(header::CONTENT_TYPE, "text/csv")], csv));
    Ok(())
}
