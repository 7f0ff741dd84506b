use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::db::models::UserId;
use crate::error::CoreResult;
use crate::extractors::Viewer;
use crate::routes::Created;
use crate::social::{self, views, ProfileForm, SettingsForm, SignUpForm};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/users/{id}/tweets", get(user_tweets))
        .route("/users/{id}/likes", get(user_likes))
        .route("/users/{id}/replied", get(user_replied))
        .route("/users/{id}/followings", get(user_followings))
        .route("/users/{id}/followers", get(user_followers))
        .route("/users/{id}/setting", get(get_setting).put(put_setting))
        .route("/users/{id}/edit", put(put_profile))
        .route("/followships/{id}", post(follow).delete(unfollow))
}

// --- Profile pages ---

async fn user_tweets(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::ProfilePage<views::TweetEntry>>> {
    let page = social::tweets_feed(state.store.as_ref(), subject, viewer).await?;
    Ok(Json(page))
}

async fn user_likes(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::ProfilePage<views::LikedEntry>>> {
    let page = social::liked_feed(state.store.as_ref(), subject, viewer).await?;
    Ok(Json(page))
}

async fn user_replied(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::ProfilePage<views::RepliedEntry>>> {
    let page = social::replied_feed(state.store.as_ref(), subject, viewer).await?;
    Ok(Json(page))
}

async fn user_followings(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::ProfilePage<views::FollowEntry>>> {
    let page = social::followings_page(state.store.as_ref(), subject, viewer).await?;
    Ok(Json(page))
}

async fn user_followers(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::ProfilePage<views::FollowEntry>>> {
    let page = social::followers_page(state.store.as_ref(), subject, viewer).await?;
    Ok(Json(page))
}

// --- Accounts ---

async fn sign_up(
    State(state): State<AppState>,
    Json(form): Json<SignUpForm>,
) -> CoreResult<(StatusCode, Json<Created<UserId>>)> {
    let id = social::sign_up(state.store.as_ref(), &form, state.config.accounts.hash_cost).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn get_setting(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
) -> CoreResult<Json<views::SettingsView>> {
    let view = social::settings(state.store.as_ref(), viewer, subject).await?;
    Ok(Json(view))
}

async fn put_setting(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
    Json(form): Json<SettingsForm>,
) -> CoreResult<StatusCode> {
    social::update_settings(
        state.store.as_ref(),
        viewer,
        subject,
        &form,
        state.config.accounts.hash_cost,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_profile(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(subject): Path<UserId>,
    Json(form): Json<ProfileForm>,
) -> CoreResult<StatusCode> {
    social::update_profile(state.store.as_ref(), viewer, subject, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Followships ---

async fn follow(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(target): Path<UserId>,
) -> CoreResult<StatusCode> {
    social::follow(state.store.as_ref(), viewer, target).await?;
    Ok(StatusCode::CREATED)
}

async fn unfollow(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(target): Path<UserId>,
) -> CoreResult<StatusCode> {
    social::unfollow(state.store.as_ref(), viewer, target).await?;
    Ok(StatusCode::NO_CONTENT)
}
