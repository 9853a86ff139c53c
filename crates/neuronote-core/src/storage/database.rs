//! SQLite-based storage for notes, quiz cards, study blocks, and sessions.
//!
//! Provides persistent storage for:
//! - Notes extracted by the ML pipeline, with their quiz cards
//! - Study blocks produced by scheduling runs
//! - Auth sessions (token, user, expiry)

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::scheduler::StudyBlock;

use super::data_dir;

/// A stored note with its quiz cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub content: String,
    pub summary: String,
    pub quiz_cards: Vec<QuizCardRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question/answer card attached to a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizCardRecord {
    pub id: String,
    pub note_id: String,
    pub question: String,
    pub answer: String,
}

/// A persisted study block with its storage-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyBlockRecord {
    pub id: String,
    pub user_id: String,
    pub note_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
}

// === Helper Functions ===

/// Parse an RFC 3339 timestamp stored as text, with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a StudyBlockRecord from a database row
fn row_to_block(row: &rusqlite::Row) -> Result<StudyBlockRecord, rusqlite::Error> {
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    Ok(StudyBlockRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        note_id: row.get(2)?,
        start: parse_datetime_fallback(&start),
        end: parse_datetime_fallback(&end),
        status: row.get(5)?,
    })
}

/// SQLite database for NeuroNote persistence.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/neuronote/neuronote.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::DataDir(e.to_string()))?
            .join("neuronote.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS notes (
                    id         TEXT PRIMARY KEY,
                    content    TEXT NOT NULL,
                    summary    TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS quiz_cards (
                    id       TEXT PRIMARY KEY,
                    note_id  TEXT NOT NULL REFERENCES notes(id),
                    question TEXT NOT NULL,
                    answer   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS study_blocks (
                    id         TEXT PRIMARY KEY,
                    user_id    TEXT NOT NULL,
                    note_id    TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time   TEXT NOT NULL,
                    status     TEXT NOT NULL DEFAULT 'pending'
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    token      TEXT PRIMARY KEY,
                    user_id    TEXT NOT NULL,
                    expires_at TEXT NOT NULL
                );

                -- Create indexes for common query patterns
                CREATE INDEX IF NOT EXISTS idx_quiz_cards_note_id ON quiz_cards(note_id);
                CREATE INDEX IF NOT EXISTS idx_study_blocks_user_start
                    ON study_blocks(user_id, start_time);
                CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // === Notes ===

    /// Create a note, minting its id and timestamps.
    pub fn insert_note(&self, content: &str, summary: &str) -> Result<NoteRecord, DatabaseError> {
        let now = Utc::now();
        let record = NoteRecord {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            summary: summary.to_string(),
            quiz_cards: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO notes (id, content, summary, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.content,
                record.summary,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    /// Fetch a note with its quiz cards.
    pub fn get_note(&self, id: &str) -> Result<Option<NoteRecord>, DatabaseError> {
        let note = self
            .conn
            .query_row(
                "SELECT id, content, summary, created_at, updated_at
                 FROM notes WHERE id = ?1",
                params![id],
                |row| {
                    let created: String = row.get(3)?;
                    let updated: String = row.get(4)?;
                    Ok(NoteRecord {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        summary: row.get(2)?,
                        quiz_cards: Vec::new(),
                        created_at: parse_datetime_fallback(&created),
                        updated_at: parse_datetime_fallback(&updated),
                    })
                },
            )
            .optional()?;

        match note {
            Some(mut note) => {
                note.quiz_cards = self.quiz_cards_for(&note.id)?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    /// List all notes, quiz cards included.
    pub fn list_notes(&self) -> Result<Vec<NoteRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, summary, created_at, updated_at
             FROM notes ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let created: String = row.get(3)?;
            let updated: String = row.get(4)?;
            Ok(NoteRecord {
                id: row.get(0)?,
                content: row.get(1)?,
                summary: row.get(2)?,
                quiz_cards: Vec::new(),
                created_at: parse_datetime_fallback(&created),
                updated_at: parse_datetime_fallback(&updated),
            })
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let mut note = row?;
            note.quiz_cards = self.quiz_cards_for(&note.id)?;
            notes.push(note);
        }
        Ok(notes)
    }

    /// Attach a quiz card to a note.
    pub fn insert_quiz_card(
        &self,
        note_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<QuizCardRecord, DatabaseError> {
        let record = QuizCardRecord {
            id: Uuid::new_v4().to_string(),
            note_id: note_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
        };
        self.conn.execute(
            "INSERT INTO quiz_cards (id, note_id, question, answer) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.note_id, record.question, record.answer],
        )?;
        Ok(record)
    }

    fn quiz_cards_for(&self, note_id: &str) -> Result<Vec<QuizCardRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, question, answer FROM quiz_cards WHERE note_id = ?1",
        )?;
        let rows = stmt.query_map(params![note_id], |row| {
            Ok(QuizCardRecord {
                id: row.get(0)?,
                note_id: row.get(1)?,
                question: row.get(2)?,
                answer: row.get(3)?,
            })
        })?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row?);
        }
        Ok(cards)
    }

    // === Study blocks ===

    /// Persist the blocks of one scheduling run transactionally.
    ///
    /// Ids are assigned here, not by the scheduler. All blocks are written
    /// in a single transaction: either every block of the run is stored or
    /// none is.
    pub fn save_study_blocks(
        &mut self,
        blocks: &[StudyBlock],
    ) -> Result<Vec<StudyBlockRecord>, DatabaseError> {
        let tx = self.conn.transaction()?;
        let mut records = Vec::with_capacity(blocks.len());
        for block in blocks {
            let record = StudyBlockRecord {
                id: Uuid::new_v4().to_string(),
                user_id: block.user_id.clone(),
                note_id: block.note_id.clone(),
                start: block.start,
                end: block.end,
                status: "pending".to_string(),
            };
            tx.execute(
                "INSERT INTO study_blocks (id, user_id, note_id, start_time, end_time, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.note_id,
                    record.start.to_rfc3339(),
                    record.end.to_rfc3339(),
                    record.status,
                ],
            )?;
            records.push(record);
        }
        tx.commit()?;

        debug!(count = records.len(), "saved study blocks");
        Ok(records)
    }

    /// Stored blocks for a user starting at or after `from`, earliest first.
    pub fn upcoming_blocks(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<StudyBlockRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, note_id, start_time, end_time, status
             FROM study_blocks
             WHERE user_id = ?1 AND start_time >= ?2
             ORDER BY start_time ASC",
        )?;
        let rows = stmt.query_map(params![user_id, from.to_rfc3339()], row_to_block)?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?);
        }
        Ok(blocks)
    }

    /// All stored blocks for a user, earliest first.
    pub fn blocks_for_user(&self, user_id: &str) -> Result<Vec<StudyBlockRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, note_id, start_time, end_time, status
             FROM study_blocks
             WHERE user_id = ?1
             ORDER BY start_time ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_block)?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?);
        }
        Ok(blocks)
    }

    // === Sessions ===

    /// Record an issued session token.
    pub fn create_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, expires_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Expiry of the session matching a token and user, if one exists.
    pub fn session_expiry(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let expiry: Option<String> = self
            .conn
            .query_row(
                "SELECT expires_at FROM sessions WHERE token = ?1 AND user_id = ?2",
                params![token, user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(expiry.and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }))
    }

    /// Drop sessions that expired before `now`.
    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn note_roundtrip_with_quiz_cards() {
        let db = Database::open_memory().unwrap();
        let note = db.insert_note("photosynthesis lecture", "light reactions").unwrap();
        db.insert_quiz_card(&note.id, "What splits water?", "Photosystem II")
            .unwrap();

        let loaded = db.get_note(&note.id).unwrap().unwrap();
        assert_eq!(loaded.content, "photosynthesis lecture");
        assert_eq!(loaded.quiz_cards.len(), 1);
        assert_eq!(loaded.quiz_cards[0].question, "What splits water?");

        assert!(db.get_note("missing").unwrap().is_none());
        assert_eq!(db.list_notes().unwrap().len(), 1);
    }

    #[test]
    fn study_blocks_get_ids_and_sort_by_start() {
        let mut db = Database::open_memory().unwrap();
        let now = fixed_now();
        let blocks = vec![
            StudyBlock {
                user_id: "u1".to_string(),
                note_id: "n1".to_string(),
                start: now + Duration::hours(2),
                end: now + Duration::hours(2) + Duration::minutes(30),
            },
            StudyBlock {
                user_id: "u1".to_string(),
                note_id: "n2".to_string(),
                start: now + Duration::hours(1),
                end: now + Duration::hours(1) + Duration::minutes(30),
            },
        ];

        let records = db.save_study_blocks(&blocks).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.id.is_empty()));
        assert!(records.iter().all(|r| r.status == "pending"));

        let upcoming = db.upcoming_blocks("u1", now).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].note_id, "n2");
        assert_eq!(upcoming[1].note_id, "n1");

        // Past cutoff filters blocks that already started.
        let later = db.upcoming_blocks("u1", now + Duration::hours(2)).unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].note_id, "n1");

        assert!(db.upcoming_blocks("someone-else", now).unwrap().is_empty());
        assert_eq!(db.blocks_for_user("u1").unwrap().len(), 2);
    }

    #[test]
    fn session_expiry_roundtrip() {
        let db = Database::open_memory().unwrap();
        let now = fixed_now();
        db.create_session("tok-1", "u1", now + Duration::days(30))
            .unwrap();

        let expiry = db.session_expiry("tok-1", "u1").unwrap().unwrap();
        assert_eq!(expiry, now + Duration::days(30));

        assert!(db.session_expiry("tok-1", "u2").unwrap().is_none());
        assert!(db.session_expiry("other", "u1").unwrap().is_none());

        assert_eq!(db.delete_expired_sessions(now).unwrap(), 0);
        assert_eq!(
            db.delete_expired_sessions(now + Duration::days(31)).unwrap(),
            1
        );
        assert!(db.session_expiry("tok-1", "u1").unwrap().is_none());
    }
}
