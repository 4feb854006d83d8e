//! Database row types. These map directly to SQLite rows and stay
//! independent of the inkpad-types API models.

/// A user row. `password` always holds a PHC hash string.
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NoteRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}
