//! Profile pages, timeline and tweet detail assembled from graph-store reads.
//!
//! Each page issues its independent reads concurrently and only then applies
//! the viewer relativization, so store results never carry viewer state.

use crate::db::models::{TweetId, User, UserId};
use crate::error::{CoreError, CoreResult};
use crate::social::aggregate::{top_followed, user_counts, UserCounts, TOP_USERS_LIMIT};
use crate::social::recommend::top_users;
use crate::social::relativize::ViewerContext;
use crate::social::views::{
    FollowEntry, LikedEntry, ProfileHeader, ProfilePage, RepliedEntry, ReplyEntry, TimelinePage,
    TweetDetail, TweetEntry,
};
use crate::store::{
    FollowLink, FollowerTally, GraphStore, LikedTweet, RepliedTweet, StoreError, TweetThread,
};

/// Tweets shown on the timeline.
pub const TIMELINE_LIMIT: usize = 50;

/// Reads shared by every profile page.
struct ProfileContext {
    subject: Option<User>,
    counts: UserCounts,
    ranked: Vec<FollowerTally>,
    viewer: ViewerContext,
}

async fn profile_context(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> Result<ProfileContext, StoreError> {
    let ids = [subject];
    let (user, counts, ranked, viewer) = tokio::try_join!(
        store.user(subject),
        user_counts(store, &ids),
        top_followed(store, TOP_USERS_LIMIT),
        ViewerContext::load(store, viewer),
    )?;

    Ok(ProfileContext {
        subject: user,
        counts: counts.get(&subject).copied().unwrap_or_default(),
        ranked,
        viewer,
    })
}

impl ProfileContext {
    fn into_page<T>(
        self,
        subject: UserId,
        build: impl FnOnce(&ViewerContext) -> Vec<T>,
    ) -> CoreResult<ProfilePage<T>> {
        let user = self
            .subject
            .ok_or_else(|| CoreError::not_found(format!("User {subject} not found")))?;

        Ok(ProfilePage {
            profile: profile_header(user, self.counts, &self.viewer),
            entries: build(&self.viewer),
            top_users: top_users(&self.ranked, &self.viewer),
        })
    }
}

pub fn profile_header(user: User, counts: UserCounts, viewer: &ViewerContext) -> ProfileHeader {
    let relation = viewer.relation(user.id);
    ProfileHeader {
        id: user.id,
        name: user.name,
        account: user.account,
        introduction: user.introduction,
        avatar: user.avatar,
        cover: user.cover,
        tweets_count: counts.tweets,
        followings_count: counts.followings,
        followers_count: counts.followers,
        is_followed: relation.is_followed,
        is_self: relation.is_self,
    }
}

pub(crate) fn tweet_entry(thread: TweetThread, viewer: &ViewerContext) -> TweetEntry {
    TweetEntry {
        is_liked: viewer.has_liked(&thread.liker_ids),
        reply_count: thread.reply_ids.len(),
        like_count: thread.liker_ids.len(),
        id: thread.tweet.id,
        description: thread.tweet.description,
        created_at: thread.tweet.created_at,
        author: thread.author.into(),
    }
}

pub(crate) fn tweet_entries(mut threads: Vec<TweetThread>, viewer: &ViewerContext) -> Vec<TweetEntry> {
    threads.sort_by(|a, b| {
        b.tweet
            .created_at
            .cmp(&a.tweet.created_at)
            .then_with(|| b.tweet.id.cmp(&a.tweet.id))
    });
    threads
        .into_iter()
        .map(|thread| tweet_entry(thread, viewer))
        .collect()
}

/// Replies written by the subject, newest first.
pub fn replied_entries(mut rows: Vec<RepliedTweet>) -> Vec<RepliedEntry> {
    rows.sort_by(|a, b| {
        b.reply
            .created_at
            .cmp(&a.reply.created_at)
            .then_with(|| b.reply.id.cmp(&a.reply.id))
    });
    rows.into_iter()
        .map(|row| RepliedEntry {
            comment: row.reply.comment,
            tweet_id: row.reply.tweet_id,
            replied_at: row.reply.created_at,
            replied_by_account: row.tweet_author.account,
            replied_by_id: row.tweet_author.id,
        })
        .collect()
}

/// Tweets liked by the subject, newest like first, with counts recomputed from
/// the joined collections.
pub fn liked_entries(mut rows: Vec<LikedTweet>, viewer: &ViewerContext) -> Vec<LikedEntry> {
    rows.sort_by(|a, b| {
        b.like
            .created_at
            .cmp(&a.like.created_at)
            .then_with(|| b.like.id.cmp(&a.like.id))
    });
    rows.into_iter()
        .map(|row| {
            let thread = row.thread;
            LikedEntry {
                id: thread.author.id,
                name: thread.author.name,
                account: thread.author.account,
                avatar: thread.author.avatar,
                liked_at: row.like.created_at,
                tweet_id: thread.tweet.id,
                tweet_description: thread.tweet.description,
                tweet_reply_count: thread.reply_ids.len(),
                tweet_like_count: thread.liker_ids.len(),
                is_liked: viewer.has_liked(&thread.liker_ids),
            }
        })
        .collect()
}

pub fn follow_entries(mut links: Vec<FollowLink>, viewer: &ViewerContext) -> Vec<FollowEntry> {
    links.sort_by(|a, b| {
        b.followed_at
            .cmp(&a.followed_at)
            .then_with(|| b.user.id.cmp(&a.user.id))
    });
    links
        .into_iter()
        .map(|link| {
            let relation = viewer.relation(link.user.id);
            FollowEntry {
                id: link.user.id,
                name: link.user.name,
                account: link.user.account,
                avatar: link.user.avatar,
                introduction: link.user.introduction,
                followed_at: link.followed_at,
                is_followed: relation.is_followed,
                is_self: relation.is_self,
            }
        })
        .collect()
}

pub async fn replied_feed(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> CoreResult<ProfilePage<RepliedEntry>> {
    let (context, rows) = tokio::try_join!(
        profile_context(store, subject, viewer),
        store.replies_by(subject),
    )?;
    context.into_page(subject, |_| replied_entries(rows))
}

pub async fn liked_feed(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> CoreResult<ProfilePage<LikedEntry>> {
    let (context, rows) = tokio::try_join!(
        profile_context(store, subject, viewer),
        store.likes_by(subject),
    )?;
    context.into_page(subject, |viewer| liked_entries(rows, viewer))
}

pub async fn tweets_feed(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> CoreResult<ProfilePage<TweetEntry>> {
    let (context, threads) = tokio::try_join!(
        profile_context(store, subject, viewer),
        store.tweets_by(subject),
    )?;
    context.into_page(subject, |viewer| tweet_entries(threads, viewer))
}

pub async fn followers_page(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> CoreResult<ProfilePage<FollowEntry>> {
    let (context, links) = tokio::try_join!(
        profile_context(store, subject, viewer),
        store.followers_of(subject),
    )?;
    context.into_page(subject, |viewer| follow_entries(links, viewer))
}

pub async fn followings_page(
    store: &dyn GraphStore,
    subject: UserId,
    viewer: UserId,
) -> CoreResult<ProfilePage<FollowEntry>> {
    let (context, links) = tokio::try_join!(
        profile_context(store, subject, viewer),
        store.followings_of(subject),
    )?;
    context.into_page(subject, |viewer| follow_entries(links, viewer))
}

pub async fn timeline(store: &dyn GraphStore, viewer: UserId) -> CoreResult<TimelinePage> {
    let (threads, ranked, viewer) = tokio::try_join!(
        store.recent_tweets(TIMELINE_LIMIT),
        top_followed(store, TOP_USERS_LIMIT),
        ViewerContext::load(store, viewer),
    )?;

    Ok(TimelinePage {
        tweets: tweet_entries(threads, &viewer),
        top_users: top_users(&ranked, &viewer),
    })
}

pub async fn tweet_detail(
    store: &dyn GraphStore,
    tweet: TweetId,
    viewer: UserId,
) -> CoreResult<TweetDetail> {
    let (thread, replies) = tokio::try_join!(store.tweet(tweet), store.replies_to(tweet))?;
    let thread = thread.ok_or_else(|| CoreError::not_found(format!("Tweet {tweet} not found")))?;

    // Liking is the only viewer-relative flag here
    let viewer = ViewerContext::new(viewer, []);

    Ok(TweetDetail {
        tweet: tweet_entry(thread, &viewer),
        replies: replies
            .into_iter()
            .map(|r| ReplyEntry {
                id: r.reply.id,
                comment: r.reply.comment,
                replied_at: r.reply.created_at,
                author: r.author.into(),
            })
            .collect(),
    })
}
