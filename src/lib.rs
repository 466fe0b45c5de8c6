pub mod auth;
pub mod config;
pub mod db;
pub mod rooms;
pub mod session;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use rooms::{AdmissionService, Notifier, SqliteRoomStore};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub store: SqliteRoomStore,
    pub notifier: Notifier,
    pub admissions: AdmissionService<SqliteRoomStore>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        let store = SqliteRoomStore::new(db_pool.clone());
        let notifier = Notifier::new(64);
        let admissions = AdmissionService::new(store.clone(), notifier.clone());
        Self {
            db_pool,
            store,
            notifier,
            admissions,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Catch-all for programming errors and infrastructure faults in handlers.
/// Expected admission outcomes never travel this path; they are typed
/// `AdmissionError`s with their own responses.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("unhandled error: {:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
