use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use inkpad_db::models::{NoteRow, UserRow};
use inkpad_types::models::{Note, User};

pub fn user(row: UserRow) -> User {
    User {
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
        id: row.id,
        username: row.username,
        email: row.email,
    }
}

pub fn note(row: NoteRow) -> Note {
    Note {
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
        id: row.id,
        title: row.title,
        content: row.content,
        user_id: row.user_id,
    }
}

// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
// Parse as naive UTC and convert.
fn timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}
