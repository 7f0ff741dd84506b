use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::db::models::TweetId;
use crate::error::CoreResult;
use crate::extractors::Viewer;
use crate::social::{self, views};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/tweets", get(list_tweets))
        .route("/admin/tweets/{id}", delete(remove_tweet))
        .route("/admin/users", get(list_users))
}

async fn list_tweets(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> CoreResult<Json<Vec<views::TweetEntry>>> {
    let tweets = social::admin_tweets(state.store.as_ref(), viewer).await?;
    Ok(Json(tweets))
}

async fn remove_tweet(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
) -> CoreResult<StatusCode> {
    social::delete_tweet(state.store.as_ref(), viewer, tweet).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> CoreResult<Json<Vec<views::AdminUserEntry>>> {
    let users = social::admin_users(state.store.as_ref(), viewer).await?;
    Ok(Json(users))
}
