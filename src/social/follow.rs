//! Follow-graph mutation.

use crate::db::models::UserId;
use crate::error::{CoreError, CoreResult};
use crate::social::front_stage_member;
use crate::store::{GraphStore, WriteOutcome};

/// Create the edge `viewer -> target`.
///
/// The application checks are a fast path; the store's primary key decides
/// when two identical requests race.
pub async fn follow(store: &dyn GraphStore, viewer: UserId, target: UserId) -> CoreResult<()> {
    if viewer == target {
        return Err(CoreError::validation("You cannot follow yourself"));
    }

    let (member, target_user, existing) = tokio::try_join!(
        store.user(viewer),
        store.user(target),
        store.followship(viewer, target),
    )?;
    front_stage_member(member, viewer)?;
    if target_user.is_none() {
        return Err(CoreError::not_found(format!("User {target} not found")));
    }
    if existing.is_some() {
        return Err(CoreError::validation("You are already following this user"));
    }

    match store.insert_followship(viewer, target).await? {
        WriteOutcome::Created => Ok(()),
        WriteOutcome::Duplicate => Err(CoreError::validation(
            "You are already following this user",
        )),
    }
}

/// Remove the edge `viewer -> target`; a missing edge is not an error.
pub async fn unfollow(store: &dyn GraphStore, viewer: UserId, target: UserId) -> CoreResult<()> {
    store.delete_followship(viewer, target).await?;
    Ok(())
}
