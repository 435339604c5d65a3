use std::collections::hash_map::Entry;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use guidebook_core::{
    Applied, ChapterId, ContentEntry, DeletedChapter, DeletedSection, DiscardedDraft,
    MoveOutcome, OutlineEditor, OutlineError, OutlineProgress, OutlineSource, SectionId, Snapshot,
};
use uuid::Uuid;

use super::AppState;
use crate::models::*;
use crate::render;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side; clients only see a generic message.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Editor failures are caused by the request, so their message is returned
/// as-is.
fn outline_error(e: OutlineError) -> ApiError {
    tracing::warn!("Rejected edit: {}", e);
    let status = match e {
        OutlineError::NotFound(_) => StatusCode::NOT_FOUND,
        OutlineError::InvalidState(_) => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

fn guide_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Guide not found".to_string())
}

fn editor_not_open() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        "No editor open for this guide".to_string(),
    )
}

/// Run `f` against the open editor for `guide`.
fn with_editor<T>(
    state: &AppState,
    guide: Uuid,
    f: impl FnOnce(&mut OutlineEditor) -> Result<T, OutlineError>,
) -> Result<T, ApiError> {
    let mut editors = state.editors.lock().expect("editor lock poisoned");
    let editor = editors.get_mut(&guide).ok_or_else(editor_not_open)?;
    f(editor).map_err(outline_error)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Guides
// ============================================================

pub async fn list_guides(
    State(state): State<AppState>,
) -> Result<Json<Vec<GuideSummary>>, ApiError> {
    state.db.list_guides().map(Json).map_err(internal_error)
}

pub async fn get_guide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Guide>, ApiError> {
    state
        .db
        .get_guide(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(guide_not_found)
}

pub async fn create_guide(
    State(state): State<AppState>,
    Json(input): Json<CreateGuideInput>,
) -> Result<(StatusCode, Json<Guide>), ApiError> {
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    state
        .db
        .create_guide(input)
        .map(|g| (StatusCode::CREATED, Json(g)))
        .map_err(internal_error)
}

/// Deleting a guide also drops its open editor, unsaved changes included.
pub async fn delete_guide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.db.delete_guide(id).map_err(internal_error)?;
    if !deleted {
        return Err(guide_not_found());
    }
    state
        .editors
        .lock()
        .expect("editor lock poisoned")
        .remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Publish the open editor's outline and content to the store.
pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Guide>, ApiError> {
    {
        let editors = state.editors.lock().expect("editor lock poisoned");
        let editor = editors.get(&id).ok_or_else(editor_not_open)?;
        editor.publish(&state.db, id).map_err(internal_error)?;
    }

    state
        .db
        .get_guide(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(guide_not_found)
}

/// Text tree of the guide. Shows the open editor's outline when there is one,
/// the published outline otherwise.
pub async fn get_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, ApiError> {
    {
        let editors = state.editors.lock().expect("editor lock poisoned");
        if let Some(editor) = editors.get(&id) {
            return Ok(render::render_outline(editor.outline()));
        }
    }

    if state.db.get_guide(id).map_err(internal_error)?.is_none() {
        return Err(guide_not_found());
    }
    let outline = state.db.load_outline(id).map_err(internal_error)?;
    Ok(render::render_outline(&outline))
}

// ============================================================
// Editor
// ============================================================

/// Open an editor from the published guide. An editor that is already open
/// is returned unchanged, so drafts survive a client reconnecting.
pub async fn open_editor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Snapshot>), ApiError> {
    if let Some(editor) = state
        .editors
        .lock()
        .expect("editor lock poisoned")
        .get(&id)
    {
        return Ok((StatusCode::OK, Json(editor.snapshot())));
    }

    if state.db.get_guide(id).map_err(internal_error)?.is_none() {
        return Err(guide_not_found());
    }
    let editor = OutlineEditor::open(&state.db, id).map_err(internal_error)?;
    let snapshot = editor.snapshot();

    let mut editors = state.editors.lock().expect("editor lock poisoned");
    match editors.entry(id) {
        // Another request opened it first.
        Entry::Occupied(open) => Ok((StatusCode::OK, Json(open.get().snapshot()))),
        Entry::Vacant(slot) => {
            tracing::info!(guide = %id, "Opened editor");
            slot.insert(editor);
            Ok((StatusCode::CREATED, Json(snapshot)))
        }
    }
}

pub async fn get_editor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| Ok(editor.snapshot())).map(Json)
}

/// Close the editor without publishing.
pub async fn close_editor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let editor = state
        .editors
        .lock()
        .expect("editor lock poisoned")
        .remove(&id)
        .ok_or_else(editor_not_open)?;

    if editor.session().is_dirty() {
        tracing::warn!(guide = %id, "Closed editor with an unsaved draft");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OutlineProgress>, ApiError> {
    with_editor(&state, id, |editor| Ok(editor.outline().progress())).map(Json)
}

pub async fn update_outline_meta(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<MetaInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| {
        Ok(editor.update_outline_meta(input.title, input.description))
    })
    .map(Json)
}

pub async fn set_active_chapter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ActiveChapterInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.set_active_chapter(input.chapter_id.as_ref())
    })
    .map(Json)
}

// ============================================================
// Chapters
// ============================================================

pub async fn add_chapter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Applied<ChapterId>>), ApiError> {
    with_editor(&state, id, |editor| Ok(editor.add_chapter()))
        .map(|applied| (StatusCode::CREATED, Json(applied)))
}

pub async fn update_chapter_meta(
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, ChapterId)>,
    Json(input): Json<MetaInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.update_chapter_meta(&chapter_id, input.title, input.description)
    })
    .map(Json)
}

pub async fn delete_chapter(
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, ChapterId)>,
) -> Result<Json<Applied<DeletedChapter>>, ApiError> {
    with_editor(&state, id, |editor| editor.delete_chapter(&chapter_id)).map(Json)
}

pub async fn move_chapter(
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, ChapterId)>,
    Json(input): Json<MoveInput>,
) -> Result<Json<Applied<MoveOutcome>>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.move_chapter(&chapter_id, input.direction)
    })
    .map(Json)
}

/// Set the chapter's completion flag, or toggle it when none is given.
pub async fn set_chapter_completed(
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, ChapterId)>,
    Json(input): Json<CompletedInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| match input.completed {
        Some(completed) => editor.set_chapter_completed(&chapter_id, completed),
        None => editor.toggle_chapter_completed(&chapter_id),
    })
    .map(Json)
}

pub async fn add_section(
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, ChapterId)>,
) -> Result<(StatusCode, Json<Applied<SectionId>>), ApiError> {
    with_editor(&state, id, |editor| editor.add_section(&chapter_id))
        .map(|applied| (StatusCode::CREATED, Json(applied)))
}

// ============================================================
// Sections
// ============================================================

pub async fn delete_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, SectionId)>,
) -> Result<Json<Applied<DeletedSection>>, ApiError> {
    with_editor(&state, id, |editor| editor.delete_section(&section_id)).map(Json)
}

/// Move a section within its chapter.
pub async fn move_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, SectionId)>,
    Json(input): Json<MoveInput>,
) -> Result<Json<Applied<MoveOutcome>>, ApiError> {
    with_editor(&state, id, |editor| {
        let chapter_id = editor
            .outline()
            .find_section(&section_id)
            .map(|(chapter, _)| chapter.id.clone())
            .ok_or_else(|| OutlineError::section_not_found(&section_id))?;
        editor.move_section(&chapter_id, &section_id, input.direction)
    })
    .map(Json)
}

pub async fn set_section_completed(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, SectionId)>,
    Json(input): Json<CompletedInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| match input.completed {
        Some(completed) => editor.set_section_completed(&section_id, completed),
        None => editor.toggle_section_completed(&section_id),
    })
    .map(Json)
}

pub async fn set_section_duration(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, SectionId)>,
    Json(input): Json<DurationInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.set_section_duration(&section_id, input.duration)
    })
    .map(Json)
}

pub async fn get_content(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, SectionId)>,
) -> Result<Json<ContentEntry>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.get_content(&section_id).cloned()
    })
    .map(Json)
}

// ============================================================
// Edit session
// ============================================================

/// Open a section for editing. Any draft already open is discarded and
/// returned in `value`.
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<BeginEditInput>,
) -> Result<Json<Applied<Option<DiscardedDraft>>>, ApiError> {
    with_editor(&state, id, |editor| editor.begin_edit(&input.section_id)).map(Json)
}

pub async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| {
        editor.update_draft(input.title, input.body)
    })
    .map(Json)
}

pub async fn commit_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| Ok(editor.commit_edit())).map(Json)
}

pub async fn cancel_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Snapshot>, ApiError> {
    with_editor(&state, id, |editor| Ok(editor.cancel_edit())).map(Json)
}
