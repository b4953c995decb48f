//! PostgreSQL implementation of [`NoteStore`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::{debug, info};

use super::Result;
use super::models::{Note, NoteContent, NoteId, NoteRow, User};
use super::store::NoteStore;

/// Column list for notes queries.
const NOTE_COLUMNS: &str = "note_id, user_id, text, media_type, media_url, date";

/// Notes storage backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    /// Connects to PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
        acquire_timeout: std::time::Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        info!("Connected to database (pool size: {})", max_connections);

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `users` and `notes` tables if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl NoteStore for PgNoteStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO users (user_id, username) VALUES ($1, $2)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user.user_id)
        .bind(&user.username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Registered user {}", user.user_id);
        }
        Ok(())
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_note(
        &self,
        user_id: i64,
        content: &NoteContent,
        created_at: DateTime<Utc>,
    ) -> Result<Note> {
        let query = format!(
            "INSERT INTO notes (user_id, text, media_type, media_url, date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NoteRow>(&query)
            .bind(user_id)
            .bind(content.text_column())
            .bind(content.media_type().as_str())
            .bind(content.media_column())
            .bind(created_at)
            .fetch_one(&self.pool)
            .await?;

        debug!("Inserted note {} for user {}", row.note_id, user_id);
        Note::try_from(row)
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE user_id = $1
             ORDER BY note_id"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Note::try_from)
            .collect()
    }

    async fn list_note_ids(&self, user_id: i64) -> Result<Vec<NoteId>> {
        let ids: Vec<NoteId> =
            sqlx::query_scalar("SELECT note_id FROM notes WHERE user_id = $1 ORDER BY note_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &NoteContent) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notes
             SET text = $1, media_type = $2, media_url = $3
             WHERE note_id = $4 AND user_id = $5",
        )
        .bind(content.text_column())
        .bind(content.media_type().as_str())
        .bind(content.media_column())
        .bind(note_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE note_id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
