// Graph store seam - every read and write the social core needs
pub mod sqlite;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::{Followship, Like, Reply, Tweet, TweetId, User, UserCard, UserId};

pub use sqlite::SqliteGraphStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Foreign-key column a grouped count runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountedRelation {
    /// `tweets.user_id`
    TweetsByAuthor,
    /// `followships.following_id`
    FollowersOf,
    /// `followships.follower_id`
    FollowingsOf,
}

/// Result of a write that is guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Duplicate,
}

/// Followed user together with the number of distinct non-admin followers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerTally {
    pub user: UserCard,
    pub followers: i64,
}

/// A user on one end of a followship, with the edge's creation time.
#[derive(Debug, Clone)]
pub struct FollowLink {
    pub user: User,
    pub followed_at: NaiveDateTime,
}

/// A tweet joined to its author and its full reply and like collections.
#[derive(Debug, Clone)]
pub struct TweetThread {
    pub tweet: Tweet,
    pub author: UserCard,
    pub reply_ids: Vec<i64>,
    pub liker_ids: Vec<UserId>,
}

/// A reply joined to the tweet it answers and that tweet's author.
#[derive(Debug, Clone)]
pub struct RepliedTweet {
    pub reply: Reply,
    pub tweet_author: UserCard,
}

/// A reply joined to the user who wrote it.
#[derive(Debug, Clone)]
pub struct AuthoredReply {
    pub reply: Reply,
    pub author: UserCard,
}

#[derive(Debug, Clone)]
pub struct LikedTweet {
    pub like: Like,
    pub thread: TweetThread,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub account: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct SettingsChange {
    pub account: String,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
}

/// Public profile fields; `None` clears the field.
#[derive(Debug, Clone)]
pub struct ProfileChange {
    pub name: String,
    pub introduction: Option<String>,
    pub avatar: Option<String>,
    pub cover: Option<String>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Point lookup of a user
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Users whose account or email matches, excluding `except` when given
    async fn users_matching(
        &self,
        account: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<Vec<User>, StoreError>;

    /// Insert a normal user; `None` when account or email is already taken
    async fn insert_user(&self, user: &NewUser) -> Result<Option<UserId>, StoreError>;

    /// Apply settings to a user; `Duplicate` when account or email collides
    async fn update_settings(
        &self,
        id: UserId,
        change: &SettingsChange,
    ) -> Result<WriteOutcome, StoreError>;

    /// Overwrite the public profile of a user; returns whether the user exists
    async fn update_profile(&self, id: UserId, change: &ProfileChange)
        -> Result<bool, StoreError>;

    /// Every user, oldest account first
    async fn all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Grouped `COUNT(*)` over `relation` for the given users; users with no rows are omitted.
    /// Followers sourced from administrators are not counted.
    async fn grouped_counts(
        &self,
        relation: CountedRelation,
        ids: &[UserId],
    ) -> Result<Vec<(UserId, i64)>, StoreError>;

    /// The `limit` most followed normal users by distinct non-admin followers,
    /// ties by ascending id
    async fn follower_tallies(&self, limit: usize) -> Result<Vec<FollowerTally>, StoreError>;

    async fn following_ids(&self, id: UserId) -> Result<Vec<UserId>, StoreError>;

    /// Non-admin users following `id`, newest edge first
    async fn followers_of(&self, id: UserId) -> Result<Vec<FollowLink>, StoreError>;

    /// Users followed by `id`, newest edge first
    async fn followings_of(&self, id: UserId) -> Result<Vec<FollowLink>, StoreError>;

    async fn followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<Followship>, StoreError>;

    async fn insert_followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<WriteOutcome, StoreError>;

    /// Returns whether an edge was removed
    async fn delete_followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<bool, StoreError>;

    async fn tweet(&self, id: TweetId) -> Result<Option<TweetThread>, StoreError>;

    /// Most recent tweets across all users, newest first
    async fn recent_tweets(&self, limit: usize) -> Result<Vec<TweetThread>, StoreError>;

    /// Every tweet, newest first
    async fn all_tweets(&self) -> Result<Vec<TweetThread>, StoreError>;

    /// Tweets authored by `author`, newest first
    async fn tweets_by(&self, author: UserId) -> Result<Vec<TweetThread>, StoreError>;

    /// Replies to `tweet`, oldest first
    async fn replies_to(&self, tweet: TweetId) -> Result<Vec<AuthoredReply>, StoreError>;

    /// Replies written by `author`, newest first
    async fn replies_by(&self, author: UserId) -> Result<Vec<RepliedTweet>, StoreError>;

    /// Likes given by `user`, newest first
    async fn likes_by(&self, user: UserId) -> Result<Vec<LikedTweet>, StoreError>;

    async fn insert_tweet(&self, author: UserId, description: &str)
        -> Result<TweetId, StoreError>;

    /// Delete a tweet with its replies and likes; returns whether it existed
    async fn delete_tweet(&self, id: TweetId) -> Result<bool, StoreError>;

    async fn insert_reply(
        &self,
        author: UserId,
        tweet: TweetId,
        comment: &str,
    ) -> Result<i64, StoreError>;

    async fn insert_like(&self, user: UserId, tweet: TweetId) -> Result<WriteOutcome, StoreError>;

    /// Returns whether a like was removed
    async fn delete_like(&self, user: UserId, tweet: TweetId) -> Result<bool, StoreError>;
}

/// Type alias for Arc-wrapped store (for AppState)
pub type DynGraphStore = Arc<dyn GraphStore>;
