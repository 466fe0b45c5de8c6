use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

use super::model::{RoomSnapshot, Visibility};

/// Every store call must complete within this bound; an elapsed timeout
/// surfaces as `StoreError::Unavailable` instead of hanging the request.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store call timed out")]
    Unavailable,

    #[error(transparent)]
    Backend(#[from] sqlx::Error),

    #[error("malformed participants column: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    Applied,
    /// The guarded precondition no longer held; the caller re-reads and
    /// re-evaluates.
    Conflict,
    NotFound,
}

/// Read / compare-and-swap interface over the rooms record.
///
/// `update_participants` writes the participant list and the redundant
/// counter together, guarded by the participant list the caller last read.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomSnapshot>, StoreError>;

    async fn update_participants(
        &self,
        room_id: Uuid,
        expected: &[String],
        new: &[String],
    ) -> Result<StoreWrite, StoreError>;
}

#[derive(Clone)]
pub struct SqliteRoomStore {
    pool: SqlitePool,
}

impl SqliteRoomStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for SqliteRoomStore {
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomSnapshot>, StoreError> {
        let row: Option<(String, bool, Option<String>, i64, String, String, i64)> = timeout(
            STORE_TIMEOUT,
            sqlx::query_as(
                "SELECT name,is_public,password_hash,capacity,owner_id,participants,current_participants \
                 FROM rooms WHERE uuid=?",
            )
            .bind(room_id.to_string())
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Unavailable)??;

        let Some((name, is_public, password_hash, capacity, owner_id, participants, count)) = row
        else {
            return Ok(None);
        };

        let participants: Vec<String> = serde_json::from_str(&participants)?;

        Ok(Some(RoomSnapshot {
            id: room_id,
            name,
            visibility: if is_public {
                Visibility::Public
            } else {
                Visibility::Private
            },
            password_hash,
            capacity: capacity as u32,
            owner_id,
            participants,
            participant_count: count,
        }))
    }

    async fn update_participants(
        &self,
        room_id: Uuid,
        expected: &[String],
        new: &[String],
    ) -> Result<StoreWrite, StoreError> {
        // SQLite has no native CAS; the WHERE clause on the previously read
        // participant list simulates one, and both fields land in a single
        // statement so the count invariant cannot be half-written.
        let expected_json = serde_json::to_string(expected)?;
        let new_json = serde_json::to_string(new)?;

        let result = timeout(
            STORE_TIMEOUT,
            sqlx::query(
                "UPDATE rooms SET participants=?, current_participants=? \
                 WHERE uuid=? AND participants=?",
            )
            .bind(&new_json)
            .bind(new.len() as i64)
            .bind(room_id.to_string())
            .bind(&expected_json)
            .execute(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Unavailable)??;

        if result.rows_affected() == 1 {
            return Ok(StoreWrite::Applied);
        }

        let exists = timeout(
            STORE_TIMEOUT,
            sqlx::query("SELECT 1 FROM rooms WHERE uuid=?")
                .bind(room_id.to_string())
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Unavailable)??;

        Ok(if exists.is_some() {
            StoreWrite::Conflict
        } else {
            StoreWrite::NotFound
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::Mutex;

    use super::*;

    /// In-memory double with the same CAS semantics as the SQLite adapter,
    /// plus knobs for forcing conflicts and counting writes.
    pub(crate) struct MemStore {
        rooms: Mutex<HashMap<Uuid, RoomSnapshot>>,
        forced_conflicts: AtomicU32,
        writes: AtomicU32,
    }

    impl MemStore {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                rooms: Mutex::new(HashMap::new()),
                forced_conflicts: AtomicU32::new(0),
                writes: AtomicU32::new(0),
            })
        }

        pub(crate) async fn insert(&self, room: RoomSnapshot) {
            self.rooms.lock().await.insert(room.id, room);
        }

        pub(crate) async fn snapshot(&self, room_id: Uuid) -> Option<RoomSnapshot> {
            self.rooms.lock().await.get(&room_id).cloned()
        }

        /// Make the next `n` writes report `Conflict` without applying.
        pub(crate) fn force_conflicts(&self, n: u32) {
            self.forced_conflicts.store(n, Ordering::SeqCst);
        }

        pub(crate) fn writes_applied(&self) -> u32 {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RoomStore for Arc<MemStore> {
        async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomSnapshot>, StoreError> {
            Ok(self.rooms.lock().await.get(&room_id).cloned())
        }

        async fn update_participants(
            &self,
            room_id: Uuid,
            expected: &[String],
            new: &[String],
        ) -> Result<StoreWrite, StoreError> {
            if self
                .forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Ok(StoreWrite::Conflict);
            }

            let mut rooms = self.rooms.lock().await;
            let Some(room) = rooms.get_mut(&room_id) else {
                return Ok(StoreWrite::NotFound);
            };
            if room.participants != expected {
                return Ok(StoreWrite::Conflict);
            }
            room.participants = new.to_vec();
            room.participant_count = new.len() as i64;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(StoreWrite::Applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::db;

    async fn pool_with_schema() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init(&pool).await.unwrap();
        pool
    }

    async fn seed_room(pool: &SqlitePool, participants: &[&str]) -> Uuid {
        let id = Uuid::now_v7();
        let list = serde_json::to_string(participants).unwrap();
        sqlx::query(
            "INSERT INTO rooms (uuid,name,is_public,password_hash,capacity,owner_id,participants,current_participants) \
             VALUES (?,?,?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind("btc lounge")
        .bind(true)
        .bind(Option::<String>::None)
        .bind(4i64)
        .bind("owner")
        .bind(&list)
        .bind(participants.len() as i64)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn get_room_maps_row_to_snapshot() {
        let pool = pool_with_schema().await;
        let store = SqliteRoomStore::new(pool.clone());
        let id = seed_room(&pool, &["alice"]).await;

        let room = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room.name, "btc lounge");
        assert_eq!(room.visibility, Visibility::Public);
        assert_eq!(room.capacity, 4);
        assert_eq!(room.owner_id, "owner");
        assert_eq!(room.participants, vec!["alice".to_string()]);
        assert_eq!(room.participant_count, 1);
    }

    #[tokio::test]
    async fn get_room_missing_is_none() {
        let pool = pool_with_schema().await;
        let store = SqliteRoomStore::new(pool);
        assert!(store.get_room(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_applies_when_expectation_holds() {
        let pool = pool_with_schema().await;
        let store = SqliteRoomStore::new(pool.clone());
        let id = seed_room(&pool, &[]).await;

        let outcome = store
            .update_participants(id, &[], &["alice".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome, StoreWrite::Applied);

        // Both fields moved together.
        let room = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room.participants, vec!["alice".to_string()]);
        assert_eq!(room.participant_count, 1);
    }

    #[tokio::test]
    async fn update_with_stale_expectation_conflicts() {
        let pool = pool_with_schema().await;
        let store = SqliteRoomStore::new(pool.clone());
        let id = seed_room(&pool, &["alice"]).await;

        let outcome = store
            .update_participants(id, &[], &["bob".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome, StoreWrite::Conflict);

        // Losing write left the row untouched.
        let room = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room.participants, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn update_unknown_room_is_not_found() {
        let pool = pool_with_schema().await;
        let store = SqliteRoomStore::new(pool);

        let outcome = store
            .update_participants(Uuid::now_v7(), &[], &["alice".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome, StoreWrite::NotFound);
    }
}
