//! Social graph aggregation and feed assembly.
//!
//! Every entry point takes the viewer identity explicitly; nothing here reads
//! request-scoped or global state.

pub mod accounts;
pub mod admin;
pub mod aggregate;
pub mod feed;
pub mod follow;
pub mod posting;
pub mod recommend;
pub mod relativize;
pub mod views;

use crate::db::models::{User, UserId};
use crate::error::{CoreError, CoreResult};

pub use accounts::{
    settings, sign_up, update_profile, update_settings, ProfileForm, SettingsForm, SignUpForm,
};
pub use admin::{admin_tweets, admin_users, delete_tweet};
pub use feed::{
    followers_page, followings_page, liked_feed, replied_feed, timeline, tweet_detail,
    tweets_feed,
};
pub use follow::{follow, unfollow};
pub use posting::{create_like, create_reply, create_tweet, remove_like};
pub use relativize::ViewerContext;

/// The acting user must exist and must not be an administrator.
pub(crate) fn front_stage_member(user: Option<User>, id: UserId) -> CoreResult<User> {
    let user = user.ok_or_else(|| CoreError::not_found(format!("User {id} not found")))?;
    if user.is_admin() {
        return Err(CoreError::authorization(
            "Administrators cannot use the front stage",
        ));
    }
    Ok(user)
}

/// The acting user must exist and must be an administrator.
pub(crate) fn require_admin(user: Option<User>, id: UserId) -> CoreResult<User> {
    let user = user.ok_or_else(|| CoreError::not_found(format!("User {id} not found")))?;
    if !user.is_admin() {
        return Err(CoreError::authorization("Administrators only"));
    }
    Ok(user)
}
