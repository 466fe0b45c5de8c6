use sqlx::SqlitePool;

/// Schema for the rooms record. `participants` is a JSON array of user ids;
/// `current_participants` is the redundant counter that must always match its
/// length. Both are only ever written together.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rooms (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_public INTEGER NOT NULL,
            password_hash TEXT,
            capacity INTEGER NOT NULL,
            owner_id TEXT NOT NULL,
            participants TEXT NOT NULL DEFAULT '[]',
            current_participants INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
