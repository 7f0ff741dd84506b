//! Top-users sidebar built from the follower ranking.

use crate::social::aggregate::{top_followed, TOP_USERS_LIMIT};
use crate::social::relativize::{display_label, ViewerContext, NO_ACCOUNT, NO_NAME};
use crate::social::views::TopUser;
use crate::store::{FollowerTally, GraphStore, StoreError};

/// Relativize and truncate already-ranked tallies for `viewer`.
pub fn top_users(ranked: &[FollowerTally], viewer: &ViewerContext) -> Vec<TopUser> {
    ranked
        .iter()
        .map(|tally| {
            let relation = viewer.relation(tally.user.id);
            TopUser {
                id: tally.user.id,
                name: display_label(tally.user.name.as_deref(), NO_NAME),
                account: display_label(Some(tally.user.account.as_str()), NO_ACCOUNT),
                avatar: tally.user.avatar.clone(),
                followers_count: tally.followers,
                is_followed: relation.is_followed,
                is_self: relation.is_self,
            }
        })
        .collect()
}

pub async fn recommendations(
    store: &dyn GraphStore,
    viewer: &ViewerContext,
) -> Result<Vec<TopUser>, StoreError> {
    let ranked = top_followed(store, TOP_USERS_LIMIT).await?;
    Ok(top_users(&ranked, viewer))
}
