use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::model::{MembershipAttempt, RoomSnapshot, Visibility};
use super::notify::Notifier;
use super::password;
use super::store::{RoomStore, StoreError, StoreWrite};

/// Outcome of running the membership rules against one room snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AlreadyMember,
    Admit,
    RejectCapacity,
    RejectPassword,
    RejectVisibility,
}

/// Pure decision function: no I/O, fully determined by the snapshot and the
/// attempt. Rule order matters: membership is checked before capacity so a
/// redundant join never gets bounced from a full room it is already in.
pub fn evaluate(room: &RoomSnapshot, attempt: &MembershipAttempt) -> Decision {
    if attempt.user_id == room.owner_id || room.is_member(attempt.user_id) {
        return Decision::AlreadyMember;
    }

    if room.occupancy() >= room.capacity as usize {
        return Decision::RejectCapacity;
    }

    if room.visibility == Visibility::Private {
        let Some(supplied) = attempt.supplied_password else {
            return Decision::RejectVisibility;
        };
        let Some(hash) = room.password_hash.as_deref() else {
            // Private room with no hash is a data fault; nobody gets in.
            error!(room = %room.id, "private room has no password hash");
            return Decision::RejectVisibility;
        };
        if !password::matches(hash, supplied) {
            return Decision::RejectPassword;
        }
    }

    Decision::Admit
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("You must be signed in to join a room")]
    Unauthenticated,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is at maximum capacity")]
    RejectCapacity,

    #[error("Incorrect password")]
    RejectPassword,

    #[error("This room is private and requires a password")]
    RejectVisibility,

    #[error("Room membership changed while joining, please try again")]
    Conflict,

    #[error("Room service is temporarily unavailable")]
    StoreUnavailable,
}

impl From<StoreError> for AdmissionError {
    fn from(err: StoreError) -> Self {
        error!("room store failure: {err}");
        AdmissionError::StoreUnavailable
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = match self {
            AdmissionError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AdmissionError::RoomNotFound => StatusCode::NOT_FOUND,
            AdmissionError::RejectCapacity
            | AdmissionError::RejectPassword
            | AdmissionError::RejectVisibility => StatusCode::FORBIDDEN,
            AdmissionError::Conflict => StatusCode::CONFLICT,
            AdmissionError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        (
            status,
            Json(serde_json::json!({ "success": false, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Successful results of `join`/`leave`. `AlreadyMember` and `NotMember` are
/// idempotent no-ops, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    Admitted,
    AlreadyMember,
    Left,
    NotMember,
}

impl MembershipOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            MembershipOutcome::Admitted => "Joined room",
            MembershipOutcome::AlreadyMember => "Already a member of this room",
            MembershipOutcome::Left => "Left room",
            MembershipOutcome::NotMember => "Not a member of this room",
        }
    }
}

const MAX_ATTEMPTS: u32 = 3;

/// Orchestrates one admission as a read-evaluate-write cycle over a store
/// without native CAS. A lost write means another admission raced us; the
/// cycle restarts from a fresh snapshot up to `MAX_ATTEMPTS` times before
/// giving up with `Conflict`.
#[derive(Clone)]
pub struct AdmissionService<S> {
    store: S,
    notifier: Notifier,
}

impl<S: RoomStore> AdmissionService<S> {
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn join(
        &self,
        room_id: Uuid,
        caller: Option<&str>,
        supplied_password: Option<&str>,
    ) -> Result<MembershipOutcome, AdmissionError> {
        let user_id = caller.ok_or(AdmissionError::Unauthenticated)?;

        for attempt_no in 1..=MAX_ATTEMPTS {
            let room = self
                .store
                .get_room(room_id)
                .await?
                .ok_or(AdmissionError::RoomNotFound)?;

            let attempt = MembershipAttempt {
                user_id,
                supplied_password,
            };

            match evaluate(&room, &attempt) {
                Decision::AlreadyMember => return Ok(MembershipOutcome::AlreadyMember),
                Decision::RejectCapacity => return Err(AdmissionError::RejectCapacity),
                Decision::RejectPassword => return Err(AdmissionError::RejectPassword),
                Decision::RejectVisibility => return Err(AdmissionError::RejectVisibility),
                Decision::Admit => {
                    let mut next = room.participants.clone();
                    next.push(user_id.to_owned());

                    match self
                        .store
                        .update_participants(room_id, &room.participants, &next)
                        .await?
                    {
                        StoreWrite::Applied => {
                            self.notifier.membership_changed(room_id);
                            return Ok(MembershipOutcome::Admitted);
                        }
                        StoreWrite::NotFound => return Err(AdmissionError::RoomNotFound),
                        StoreWrite::Conflict => {
                            debug!(room = %room_id, attempt_no, "join lost the write race, retrying");
                            backoff().await;
                        }
                    }
                }
            }
        }

        Err(AdmissionError::Conflict)
    }

    /// Removes the caller from the room. The owner is never listed in
    /// `participants`, so an owner "leave" falls out as a no-op here; owner
    /// exit is a room-deletion concern handled elsewhere.
    pub async fn leave(
        &self,
        room_id: Uuid,
        caller: Option<&str>,
    ) -> Result<MembershipOutcome, AdmissionError> {
        let user_id = caller.ok_or(AdmissionError::Unauthenticated)?;

        for attempt_no in 1..=MAX_ATTEMPTS {
            let room = self
                .store
                .get_room(room_id)
                .await?
                .ok_or(AdmissionError::RoomNotFound)?;

            if !room.is_member(user_id) {
                return Ok(MembershipOutcome::NotMember);
            }

            let next: Vec<String> = room
                .participants
                .iter()
                .filter(|p| *p != user_id)
                .cloned()
                .collect();

            match self
                .store
                .update_participants(room_id, &room.participants, &next)
                .await?
            {
                StoreWrite::Applied => {
                    self.notifier.membership_changed(room_id);
                    return Ok(MembershipOutcome::Left);
                }
                StoreWrite::NotFound => return Err(AdmissionError::RoomNotFound),
                StoreWrite::Conflict => {
                    debug!(room = %room_id, attempt_no, "leave lost the write race, retrying");
                    backoff().await;
                }
            }
        }

        Err(AdmissionError::Conflict)
    }
}

async fn backoff() {
    let ms = rand::rng().random_range(5..25);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
