pub mod admin;
pub mod tweets;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Body returned when a mutation creates a row.
#[derive(Debug, Serialize)]
pub struct Created<T> {
    pub id: T,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(tweets::router())
        .merge(admin::router())
}
