use crate::StoreError;
use crate::models::{NoteRow, UserRow};

/// Persistence capability handed to the API layer at construction.
///
/// Every read skips soft-deleted rows. Note operations take the owner id
/// alongside the note id and only match rows where both agree, so a note
/// under another owner looks exactly like a missing one.
pub trait Store: Send + Sync {
    // -- Users --

    /// Fails with [`StoreError::Conflict`] when the username or email is
    /// already held by any user, deleted ones included.
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError>;

    fn find_user_by_id(&self, id: i64) -> Result<Option<UserRow>, StoreError>;

    /// Matches `identifier` against username or email.
    fn find_user_by_login(&self, identifier: &str) -> Result<Option<UserRow>, StoreError>;

    fn user_exists(&self, username: &str, email: &str) -> Result<bool, StoreError>;

    /// `None` fields are left unchanged. Returns `None` if the user is gone.
    fn update_user_profile(
        &self,
        id: i64,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>, StoreError>;

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError>;

    /// Soft-deletes the user together with their notes.
    fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    // -- Notes --

    fn list_notes(&self, owner_id: i64) -> Result<Vec<NoteRow>, StoreError>;

    fn find_note(&self, owner_id: i64, note_id: i64) -> Result<Option<NoteRow>, StoreError>;

    /// Returns `None` when `owner_id` is not an active user.
    fn create_note(
        &self,
        owner_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<NoteRow>, StoreError>;

    fn update_note(
        &self,
        owner_id: i64,
        note_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<NoteRow>, StoreError>;

    /// False when nothing matched `(note_id, owner_id)`.
    fn delete_note(&self, owner_id: i64, note_id: i64) -> Result<bool, StoreError>;
}
