//! Derived counts and follower ranking over the follow graph.

use std::collections::HashMap;

use crate::db::models::{Role, UserId};
use crate::store::{CountedRelation, FollowerTally, GraphStore, StoreError};

/// Length of the top-users list.
pub const TOP_USERS_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserCounts {
    pub tweets: i64,
    pub followers: i64,
    pub followings: i64,
}

/// Tweet, follower and following counts for each of `ids`.
///
/// Every requested id is present in the result; users without rows get zeros.
pub async fn user_counts(
    store: &dyn GraphStore,
    ids: &[UserId],
) -> Result<HashMap<UserId, UserCounts>, StoreError> {
    let (tweets, followers, followings) = tokio::try_join!(
        store.grouped_counts(CountedRelation::TweetsByAuthor, ids),
        store.grouped_counts(CountedRelation::FollowersOf, ids),
        store.grouped_counts(CountedRelation::FollowingsOf, ids),
    )?;

    let mut counts: HashMap<UserId, UserCounts> = ids
        .iter()
        .map(|id| (*id, UserCounts::default()))
        .collect();

    for (id, n) in tweets {
        if let Some(c) = counts.get_mut(&id) {
            c.tweets = n;
        }
    }
    for (id, n) in followers {
        if let Some(c) = counts.get_mut(&id) {
            c.followers = n;
        }
    }
    for (id, n) in followings {
        if let Some(c) = counts.get_mut(&id) {
            c.followings = n;
        }
    }

    Ok(counts)
}

/// Normal users with at least one follower, most followed first.
///
/// Ties break by ascending user id so the list is reproducible.
pub fn rank_by_followers(tallies: Vec<FollowerTally>, limit: usize) -> Vec<FollowerTally> {
    let mut ranked: Vec<FollowerTally> = tallies
        .into_iter()
        .filter(|t| t.user.role == Role::Normal && t.followers > 0)
        .collect();

    ranked.sort_by(|a, b| {
        b.followers
            .cmp(&a.followers)
            .then_with(|| a.user.id.cmp(&b.user.id))
    });
    ranked.truncate(limit);
    ranked
}

/// The store ranks and limits in SQL; the rule is re-applied so any store
/// yields the same list.
pub async fn top_followed(
    store: &dyn GraphStore,
    limit: usize,
) -> Result<Vec<FollowerTally>, StoreError> {
    let tallies = store.follower_tallies(limit).await?;
    Ok(rank_by_followers(tallies, limit))
}
