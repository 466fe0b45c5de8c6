use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

/// Point-in-time view of a room as read from the store.
///
/// `participant_count` is the redundant stored counter; it must match
/// `participants.len()` after every write. The owner is implicitly a member
/// and never appears in `participants`, so they never count against capacity.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub id: Uuid,
    pub name: String,
    pub visibility: Visibility,
    pub password_hash: Option<String>,
    pub capacity: u32,
    pub owner_id: String,
    pub participants: Vec<String>,
    pub participant_count: i64,
}

impl RoomSnapshot {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Number of occupied slots. The participant list is authoritative; a
    /// stored counter that disagrees is a data-integrity fault and gets
    /// logged rather than trusted.
    pub fn occupancy(&self) -> usize {
        let actual = self.participants.len();
        if self.participant_count != actual as i64 {
            tracing::error!(
                room = %self.id,
                stored = self.participant_count,
                actual,
                "participant count disagrees with participant list"
            );
        }
        actual
    }
}

/// One attempt to enter a room. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct MembershipAttempt<'a> {
    pub user_id: &'a str,
    pub supplied_password: Option<&'a str>,
}
