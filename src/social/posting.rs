//! Tweet, reply and like creation.

use crate::db::models::{TweetId, UserId};
use crate::error::{CoreError, CoreResult};
use crate::social::front_stage_member;
use crate::store::{GraphStore, WriteOutcome};

/// Upper bound on tweet and reply text, in characters.
pub const MAX_TEXT_CHARS: usize = 140;

fn validate_text(field: &str, text: &str) -> CoreResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::validation(format!("{field} cannot be empty")));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(CoreError::validation(format!(
            "{field} must be {MAX_TEXT_CHARS} characters or less"
        )));
    }
    Ok(text.to_string())
}

pub async fn create_tweet(
    store: &dyn GraphStore,
    viewer: UserId,
    description: &str,
) -> CoreResult<TweetId> {
    let description = validate_text("Tweet", description)?;
    front_stage_member(store.user(viewer).await?, viewer)?;
    Ok(store.insert_tweet(viewer, &description).await?)
}

pub async fn create_reply(
    store: &dyn GraphStore,
    viewer: UserId,
    tweet: TweetId,
    comment: &str,
) -> CoreResult<i64> {
    let comment = validate_text("Reply", comment)?;
    let (member, thread) = tokio::try_join!(store.user(viewer), store.tweet(tweet))?;
    front_stage_member(member, viewer)?;
    if thread.is_none() {
        return Err(CoreError::not_found(format!("Tweet {tweet} not found")));
    }
    Ok(store.insert_reply(viewer, tweet, &comment).await?)
}

/// Like `tweet`; the `(user, tweet)` unique key rejects a second like.
pub async fn create_like(store: &dyn GraphStore, viewer: UserId, tweet: TweetId) -> CoreResult<()> {
    let (member, thread) = tokio::try_join!(store.user(viewer), store.tweet(tweet))?;
    front_stage_member(member, viewer)?;
    if thread.is_none() {
        return Err(CoreError::not_found(format!("Tweet {tweet} not found")));
    }
    match store.insert_like(viewer, tweet).await? {
        WriteOutcome::Created => Ok(()),
        WriteOutcome::Duplicate => Err(CoreError::validation("You already liked this tweet")),
    }
}

/// Withdraw a like; liking nothing is not an error.
pub async fn remove_like(store: &dyn GraphStore, viewer: UserId, tweet: TweetId) -> CoreResult<()> {
    store.delete_like(viewer, tweet).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::feed::tweet_detail;
    use crate::store::testing::{add_user, make_admin, test_store};

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(validate_text("Tweet", "  hi  ").unwrap(), "hi");
        assert!(validate_text("Tweet", "   ").is_err());
        assert!(validate_text("Tweet", &"x".repeat(MAX_TEXT_CHARS)).is_ok());
        assert!(validate_text("Tweet", &"x".repeat(MAX_TEXT_CHARS + 1)).is_err());
    }

    #[tokio::test]
    async fn tweet_and_reply_round_out_a_thread() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        let tweet = create_tweet(&store, a, "hello world").await.unwrap();
        create_reply(&store, b, tweet, "hi alice").await.unwrap();

        let detail = tweet_detail(&store, tweet, a).await.unwrap();
        assert_eq!(detail.tweet.description, "hello world");
        assert_eq!(detail.replies.len(), 1);
    }

    #[tokio::test]
    async fn reply_to_missing_tweet_is_not_found() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;

        let err = create_reply(&store, a, TweetId(404), "anyone?")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_tweet_rejected() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;

        let err = create_tweet(&store, a, "").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn likes_are_unique_and_removal_idempotent() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;
        let tweet = create_tweet(&store, a, "like me").await.unwrap();

        create_like(&store, b, tweet).await.unwrap();
        let err = create_like(&store, b, tweet).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        remove_like(&store, b, tweet).await.unwrap();
        remove_like(&store, b, tweet).await.unwrap();
        create_like(&store, b, tweet).await.unwrap();

        let detail = tweet_detail(&store, tweet, b).await.unwrap();
        assert_eq!(detail.tweet.like_count, 1);
    }

    #[tokio::test]
    async fn admins_cannot_post() {
        let (store, _temp) = test_store();
        let root = add_user(&store, "rootadmin").await;
        make_admin(&store, root);

        let err = create_tweet(&store, root, "hello").await.unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
    }

    #[tokio::test]
    async fn unknown_viewer_is_not_found() {
        let (store, _temp) = test_store();

        let err = create_tweet(&store, UserId(12), "hello").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
