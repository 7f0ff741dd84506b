//! Back-office views: every tweet, every user with counts, tweet removal.

use crate::db::models::{TweetId, UserId};
use crate::error::{CoreError, CoreResult};
use crate::social::aggregate::user_counts;
use crate::social::feed::tweet_entries;
use crate::social::relativize::ViewerContext;
use crate::social::require_admin;
use crate::social::views::{AdminUserEntry, TweetEntry};
use crate::store::GraphStore;

/// All tweets, newest first.
pub async fn admin_tweets(store: &dyn GraphStore, viewer: UserId) -> CoreResult<Vec<TweetEntry>> {
    let (admin, threads) = tokio::try_join!(store.user(viewer), store.all_tweets())?;
    require_admin(admin, viewer)?;
    Ok(tweet_entries(threads, &ViewerContext::new(viewer, [])))
}

pub async fn admin_users(
    store: &dyn GraphStore,
    viewer: UserId,
) -> CoreResult<Vec<AdminUserEntry>> {
    let (admin, users) = tokio::try_join!(store.user(viewer), store.all_users())?;
    require_admin(admin, viewer)?;

    let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
    let counts = user_counts(store, &ids).await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let c = counts.get(&user.id).copied().unwrap_or_default();
            AdminUserEntry {
                id: user.id,
                account: user.account,
                name: user.name,
                email: user.email,
                avatar: user.avatar,
                role: user.role,
                tweets_count: c.tweets,
                followers_count: c.followers,
                followings_count: c.followings,
            }
        })
        .collect())
}

/// Remove a tweet together with its replies and likes.
pub async fn delete_tweet(store: &dyn GraphStore, viewer: UserId, tweet: TweetId) -> CoreResult<()> {
    require_admin(store.user(viewer).await?, viewer)?;
    if !store.delete_tweet(tweet).await? {
        return Err(CoreError::not_found(format!("Tweet {tweet} not found")));
    }
    Ok(())
}
