use rusqlite::{Connection, Row, params};

use crate::models::{NoteRow, UserRow};
use crate::{Database, Store, StoreError};

const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

impl Store for Database {
    // -- Users --

    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)
                 RETURNING {USER_COLUMNS}"
            );
            let row = conn.query_row(&sql, params![username, email, password_hash], user_row)?;
            Ok(row)
        })
    }

    fn find_user_by_id(&self, id: i64) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    fn find_user_by_login(&self, identifier: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE (username = ?1 OR email = ?1) AND deleted_at IS NULL
                 ORDER BY id LIMIT 1"
            );
            conn.query_row(&sql, [identifier], user_row).optional()
        })
    }

    fn user_exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR email = ?2)",
                params![username, email],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn update_user_profile(
        &self,
        id: i64,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE users
                 SET username = COALESCE(?2, username),
                     email = COALESCE(?3, email),
                     updated_at = datetime('now')
                 WHERE id = ?1 AND deleted_at IS NULL
                 RETURNING {USER_COLUMNS}"
            );
            conn.query_row(&sql, params![id, username, email], user_row)
                .optional()
        })
    }

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2, updated_at = datetime('now')
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![id, password_hash],
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let changed = tx.execute(
                "UPDATE users SET deleted_at = datetime('now')
                 WHERE id = ?1 AND deleted_at IS NULL",
                [id],
            )?;
            if changed == 0 {
                return Ok(false);
            }

            tx.execute(
                "UPDATE notes SET deleted_at = datetime('now')
                 WHERE user_id = ?1 AND deleted_at IS NULL",
                [id],
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    // -- Notes --

    fn list_notes(&self, owner_id: i64) -> Result<Vec<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ?1 AND deleted_at IS NULL
                 ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], note_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn find_note(&self, owner_id: i64, note_id: i64) -> Result<Option<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
            );
            conn.query_row(&sql, params![note_id, owner_id], note_row)
                .optional()
        })
    }

    fn create_note(
        &self,
        owner_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            // Selecting the owner inside the insert keeps the existence check atomic.
            let sql = format!(
                "INSERT INTO notes (user_id, title, content)
                 SELECT id, ?2, ?3 FROM users WHERE id = ?1 AND deleted_at IS NULL
                 RETURNING {NOTE_COLUMNS}"
            );
            conn.query_row(&sql, params![owner_id, title, content], note_row)
                .optional()
        })
    }

    fn update_note(
        &self,
        owner_id: i64,
        note_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE notes
                 SET title = ?3, content = ?4, updated_at = datetime('now')
                 WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL
                 RETURNING {NOTE_COLUMNS}"
            );
            conn.query_row(&sql, params![note_id, owner_id, title, content], note_row)
                .optional()
        })
    }

    fn delete_note(&self, owner_id: i64, note_id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notes SET deleted_at = datetime('now')
                 WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL",
                params![note_id, owner_id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND deleted_at IS NULL");
    conn.query_row(&sql, [id], user_row).optional()
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn note_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
