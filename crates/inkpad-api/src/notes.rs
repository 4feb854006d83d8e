use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use inkpad_db::Store;
use inkpad_types::api::{MessageResponse, NoteRequest};
use inkpad_types::models::Note;

use crate::error::{ApiError, INVALID_TOKEN, NOTE_NOT_FOUND};
use crate::middleware::AuthUser;
use crate::{AppState, convert, run_blocking, validate};

// Every lookup goes through the store's (note id, owner id) predicate, so a
// note held by someone else is indistinguishable from one that never existed.

pub fn parse_note_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation("invalid note id"))
}

fn validate_body(req: &NoteRequest) -> Result<(), ApiError> {
    validate::required("title", &req.title)?;
    validate::required("content", &req.content)
}

pub fn list(store: &dyn Store, owner: AuthUser) -> Result<Vec<Note>, ApiError> {
    let rows = store.list_notes(owner.id)?;
    Ok(rows.into_iter().map(convert::note).collect())
}

pub fn get(store: &dyn Store, owner: AuthUser, note_id: i64) -> Result<Note, ApiError> {
    let row = store
        .find_note(owner.id, note_id)?
        .ok_or(ApiError::NotFound(NOTE_NOT_FOUND))?;
    Ok(convert::note(row))
}

/// The owner always comes from the authenticated identity.
pub fn create(store: &dyn Store, owner: AuthUser, req: &NoteRequest) -> Result<Note, ApiError> {
    validate_body(req)?;

    let Some(row) = store.create_note(owner.id, &req.title, &req.content)? else {
        warn!(user_id = owner.id, "Note create for a user that no longer exists");
        return Err(ApiError::Auth(INVALID_TOKEN));
    };

    info!(user_id = owner.id, note_id = row.id, "Created note");
    Ok(convert::note(row))
}

pub fn update(
    store: &dyn Store,
    owner: AuthUser,
    note_id: i64,
    req: &NoteRequest,
) -> Result<Note, ApiError> {
    validate_body(req)?;

    let row = store
        .update_note(owner.id, note_id, &req.title, &req.content)?
        .ok_or(ApiError::NotFound(NOTE_NOT_FOUND))?;
    Ok(convert::note(row))
}

pub fn delete(store: &dyn Store, owner: AuthUser, note_id: i64) -> Result<(), ApiError> {
    if !store.delete_note(owner.id, note_id)? {
        return Err(ApiError::NotFound(NOTE_NOT_FOUND));
    }

    info!(user_id = owner.id, note_id, "Deleted note");
    Ok(())
}

// -- Handlers --

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = run_blocking(&state, move |s| list(s.store.as_ref(), owner)).await?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(owner): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let note_id = parse_note_id(&id)?;
    let note = run_blocking(&state, move |s| get(s.store.as_ref(), owner, note_id)).await?;
    Ok(Json(note))
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthUser>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let note = run_blocking(&state, move |s| create(s.store.as_ref(), owner, &req)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(owner): Extension<AuthUser>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let note_id = parse_note_id(&id)?;
    let Json(req) = body?;
    let note = run_blocking(&state, move |s| update(s.store.as_ref(), owner, note_id, &req)).await?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(owner): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let note_id = parse_note_id(&id)?;
    run_blocking(&state, move |s| delete(s.store.as_ref(), owner, note_id)).await?;
    Ok(Json(MessageResponse::new("note deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpad_db::Database;

    fn setup() -> (Database, AuthUser, AuthUser) {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("alice", "alice@x.com", "h").unwrap();
        let b = db.create_user("bob", "bob@x.com", "h").unwrap();
        (db, AuthUser { id: a.id }, AuthUser { id: b.id })
    }

    fn body(title: &str, content: &str) -> NoteRequest {
        NoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let (db, alice, _) = setup();
        let created = create(&db, alice, &body("a", "b")).unwrap();
        let fetched = get(&db, alice, created.id).unwrap();

        assert_eq!(fetched.title, "a");
        assert_eq!(fetched.content, "b");
        assert_eq!(fetched.user_id, alice.id);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let (db, alice, _) = setup();
        for req in [body("", "b"), body("a", ""), body("  ", "b")] {
            let err = create(&db, alice, &req).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
        assert!(list(&db, alice).unwrap().is_empty());
    }

    #[test]
    fn foreign_notes_are_not_found() {
        let (db, alice, bob) = setup();
        let note = create(&db, bob, &body("bob's", "private")).unwrap();

        assert_eq!(get(&db, alice, note.id).unwrap_err().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            update(&db, alice, note.id, &body("x", "y")).unwrap_err().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(delete(&db, alice, note.id).unwrap_err().status_code(), StatusCode::NOT_FOUND);

        assert_eq!(get(&db, bob, note.id).unwrap().title, "bob's");
    }

    #[test]
    fn list_only_returns_own_notes() {
        let (db, alice, bob) = setup();
        let mine = create(&db, alice, &body("mine", "c")).unwrap();
        create(&db, bob, &body("theirs", "c")).unwrap();

        let notes = list(&db, alice).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, mine.id);
    }

    #[test]
    fn update_preserves_identity() {
        let (db, alice, _) = setup();
        let note = create(&db, alice, &body("a", "b")).unwrap();
        let updated = update(&db, alice, note.id, &body("a2", "b2")).unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.user_id, alice.id);
        assert_eq!((updated.title.as_str(), updated.content.as_str()), ("a2", "b2"));
    }

    #[test]
    fn delete_is_not_silent_on_second_attempt() {
        let (db, alice, _) = setup();
        let note = create(&db, alice, &body("a", "b")).unwrap();

        delete(&db, alice, note.id).unwrap();
        assert_eq!(delete(&db, alice, note.id).unwrap_err().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(delete(&db, alice, 4242).unwrap_err().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn create_for_deleted_user_is_unauthorized() {
        let (db, alice, _) = setup();
        db.delete_user(alice.id).unwrap();

        let err = create(&db, alice, &body("a", "b")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn note_ids_must_be_positive_integers() {
        assert_eq!(parse_note_id("12").unwrap(), 12);
        for raw in ["abc", "0", "-3", "1.5", ""] {
            assert_eq!(parse_note_id(raw).unwrap_err().status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
