use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::TweetId;
use crate::error::CoreResult;
use crate::extractors::Viewer;
use crate::routes::Created;
use crate::social::{self, views};
use crate::state::AppState;

// --- Forms ---

#[derive(Deserialize)]
pub struct CreateTweetForm {
    pub description: String,
}

#[derive(Deserialize)]
pub struct CreateReplyForm {
    pub comment: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tweets", get(timeline).post(create_tweet))
        .route("/tweets/{id}", get(tweet_detail))
        .route("/tweets/{id}/replies", get(list_replies).post(create_reply))
        .route("/tweets/{id}/like", post(like).delete(unlike))
}

// --- Handlers ---

async fn timeline(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> CoreResult<Json<views::TimelinePage>> {
    let page = social::timeline(state.store.as_ref(), viewer).await?;
    Ok(Json(page))
}

async fn create_tweet(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Json(form): Json<CreateTweetForm>,
) -> CoreResult<(StatusCode, Json<Created<TweetId>>)> {
    let id = social::create_tweet(state.store.as_ref(), viewer, &form.description).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn tweet_detail(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
) -> CoreResult<Json<views::TweetDetail>> {
    let detail = social::tweet_detail(state.store.as_ref(), tweet, viewer).await?;
    Ok(Json(detail))
}

async fn list_replies(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
) -> CoreResult<Json<Vec<views::ReplyEntry>>> {
    let detail = social::tweet_detail(state.store.as_ref(), tweet, viewer).await?;
    Ok(Json(detail.replies))
}

async fn create_reply(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
    Json(form): Json<CreateReplyForm>,
) -> CoreResult<(StatusCode, Json<Created<i64>>)> {
    let id = social::create_reply(state.store.as_ref(), viewer, tweet, &form.comment).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn like(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
) -> CoreResult<StatusCode> {
    social::create_like(state.store.as_ref(), viewer, tweet).await?;
    Ok(StatusCode::CREATED)
}

async fn unlike(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(tweet): Path<TweetId>,
) -> CoreResult<StatusCode> {
    social::remove_like(state.store.as_ref(), viewer, tweet).await?;
    Ok(StatusCode::NO_CONTENT)
}
