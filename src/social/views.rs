// View models handed to the rendering layer
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::models::{Role, TweetId, UserCard, UserId};

/// Subject header shown above every profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHeader {
    pub id: UserId,
    pub name: Option<String>,
    pub account: String,
    pub introduction: Option<String>,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    pub tweets_count: i64,
    pub followings_count: i64,
    pub followers_count: i64,
    pub is_followed: bool,
    pub is_self: bool,
}

/// Sidebar recommendation entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUser {
    pub id: UserId,
    pub name: String,
    pub account: String,
    pub avatar: Option<String>,
    pub followers_count: i64,
    pub is_followed: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: UserId,
    pub name: Option<String>,
    pub account: String,
    pub avatar: Option<String>,
}

impl From<UserCard> for Author {
    fn from(card: UserCard) -> Self {
        Self {
            id: card.id,
            name: card.name,
            account: card.account,
            avatar: card.avatar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliedEntry {
    pub comment: String,
    pub tweet_id: TweetId,
    pub replied_at: NaiveDateTime,
    pub replied_by_account: String,
    pub replied_by_id: UserId,
}

/// A liked tweet; `id`/`name`/`account`/`avatar` describe the tweet's author.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedEntry {
    pub id: UserId,
    pub name: Option<String>,
    pub account: String,
    pub avatar: Option<String>,
    pub liked_at: NaiveDateTime,
    pub tweet_id: TweetId,
    pub tweet_description: String,
    pub tweet_reply_count: usize,
    pub tweet_like_count: usize,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetEntry {
    pub id: TweetId,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub author: Author,
    pub reply_count: usize,
    pub like_count: usize,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEntry {
    pub id: i64,
    pub comment: String,
    pub replied_at: NaiveDateTime,
    pub author: Author,
}

/// Follower or following list entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEntry {
    pub id: UserId,
    pub name: Option<String>,
    pub account: String,
    pub avatar: Option<String>,
    pub introduction: Option<String>,
    pub followed_at: NaiveDateTime,
    pub is_followed: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage<T> {
    pub profile: ProfileHeader,
    pub entries: Vec<T>,
    pub top_users: Vec<TopUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePage {
    pub tweets: Vec<TweetEntry>,
    pub top_users: Vec<TopUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetail {
    pub tweet: TweetEntry,
    pub replies: Vec<ReplyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    pub id: UserId,
    pub account: String,
    pub name: Option<String>,
    pub email: String,
}

/// Back-office user row with the same counts a profile header shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserEntry {
    pub id: UserId,
    pub account: String,
    pub name: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub tweets_count: i64,
    pub followers_count: i64,
    pub followings_count: i64,
}
