//! Graph properties exercised through the public social API against a real
//! SQLite store.

use rusqlite::params;
use tempfile::TempDir;

use warble::db;
use warble::db::models::UserId;
use warble::error::CoreError;
use warble::social::{self, aggregate};
use warble::store::{GraphStore, NewUser, SqliteGraphStore};

fn create_test_store() -> (TempDir, SqliteGraphStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (temp_dir, SqliteGraphStore::new(pool))
}

async fn insert_user(store: &SqliteGraphStore, account: &str, name: &str) -> UserId {
    store
        .insert_user(&NewUser {
            account: account.to_string(),
            email: format!("{account}@example.com"),
            name: name.to_string(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap()
        .expect("account should be free")
}

fn promote_to_admin(store: &SqliteGraphStore, id: UserId) {
    let conn = store.pool().get().unwrap();
    conn.execute("UPDATE users SET role = 'admin' WHERE id = ?1", params![id])
        .unwrap();
}

#[tokio::test]
async fn test_ranking_is_sorted_bounded_and_admin_free() {
    let (_temp, store) = create_test_store();

    let mut fans = Vec::new();
    for i in 0..3 {
        fans.push(insert_user(&store, &format!("fan{i}"), "fan").await);
    }
    let mut targets = Vec::new();
    for i in 0..12 {
        let target = insert_user(&store, &format!("target{i}"), "target").await;
        for fan in fans.iter().take(i % 3 + 1) {
            social::follow(&store, *fan, target).await.unwrap();
        }
        targets.push(target);
    }

    // Most followed of all, but promoted afterwards
    let boss = insert_user(&store, "boss_", "boss").await;
    for fan in &fans {
        social::follow(&store, *fan, boss).await.unwrap();
    }
    promote_to_admin(&store, boss);

    let ranked = aggregate::top_followed(&store, aggregate::TOP_USERS_LIMIT)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 10);
    assert!(ranked.iter().all(|t| t.user.id != boss));
    for pair in ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.followers > b.followers || (a.followers == b.followers && a.user.id < b.user.id),
            "ranking out of order: {:?} before {:?}",
            (a.user.id, a.followers),
            (b.user.id, b.followers)
        );
    }

    // Ranking counts agree with the per-user follower counts
    let ids: Vec<UserId> = ranked.iter().map(|t| t.user.id).collect();
    let counts = aggregate::user_counts(&store, &ids).await.unwrap();
    for tally in &ranked {
        assert_eq!(counts[&tally.user.id].followers, tally.followers);
    }
}

#[tokio::test]
async fn test_follow_graph_mutation_rules() {
    let (_temp, store) = create_test_store();
    let a = insert_user(&store, "alice", "Alice").await;
    let b = insert_user(&store, "bobby", "Bob").await;

    let err = social::follow(&store, a, a).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    social::follow(&store, a, b).await.unwrap();
    let err = social::follow(&store, a, b).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Self-follow stays rejected once other edges exist
    let err = social::follow(&store, a, a).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    social::unfollow(&store, a, b).await.unwrap();
    social::unfollow(&store, a, b).await.unwrap();
    assert!(store.followship(a, b).await.unwrap().is_none());

    let err = social::follow(&store, a, UserId(9999)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_recommendation_labels_are_truncated() {
    let (_temp, store) = create_test_store();
    let viewer = insert_user(&store, "viewer", "Viewer").await;
    let long = insert_user(&store, "long_account_name", "ABCDEFGHIJKLM").await;
    let exact = insert_user(&store, "exact", "ABCDEFGHIJKL").await;
    let unnamed = insert_user(&store, "unnamed", "").await;

    for target in [long, exact, unnamed] {
        social::follow(&store, viewer, target).await.unwrap();
    }

    let page = social::timeline(&store, viewer).await.unwrap();
    let entry = |id: UserId| page.top_users.iter().find(|u| u.id == id).unwrap();

    assert_eq!(entry(long).name, "ABCDEFGHIJKL…");
    assert_eq!(entry(long).account, "long_account…");
    assert_eq!(entry(exact).name, "ABCDEFGHIJKL");
    assert_eq!(entry(unnamed).name, "noName");
    assert!(page.top_users.iter().all(|u| u.is_followed && !u.is_self));
}

#[tokio::test]
async fn test_profile_flags_depend_on_viewer_only() {
    let (_temp, store) = create_test_store();
    let subject = insert_user(&store, "subject", "Subject").await;
    let fan = insert_user(&store, "fanatic", "Fan").await;
    let stranger = insert_user(&store, "stranger", "Stranger").await;

    social::follow(&store, fan, subject).await.unwrap();
    social::create_tweet(&store, subject, "hello").await.unwrap();

    let for_fan = social::tweets_feed(&store, subject, fan).await.unwrap();
    let for_stranger = social::tweets_feed(&store, subject, stranger).await.unwrap();
    let for_self = social::tweets_feed(&store, subject, subject).await.unwrap();

    assert!(for_fan.profile.is_followed);
    assert!(!for_stranger.profile.is_followed);
    assert!(for_self.profile.is_self);
    assert!(!for_fan.profile.is_self);

    for page in [&for_fan, &for_stranger, &for_self] {
        assert_eq!(page.profile.tweets_count, 1);
        assert_eq!(page.profile.followers_count, 1);
        assert_eq!(page.profile.followings_count, 0);
    }
}

#[tokio::test]
async fn test_liked_feed_counts_and_viewer_like() {
    let (_temp, store) = create_test_store();
    let author = insert_user(&store, "author", "Author").await;
    let subject = insert_user(&store, "subject", "Subject").await;
    let viewer = insert_user(&store, "viewer", "Viewer").await;

    let tweet = social::create_tweet(&store, author, "a tweet").await.unwrap();
    for comment in ["one", "two", "three"] {
        social::create_reply(&store, author, tweet, comment)
            .await
            .unwrap();
    }
    social::create_like(&store, subject, tweet).await.unwrap();
    social::create_like(&store, viewer, tweet).await.unwrap();

    let page = social::liked_feed(&store, subject, viewer).await.unwrap();
    assert_eq!(page.entries.len(), 1);

    let entry = &page.entries[0];
    assert_eq!(entry.tweet_id, tweet);
    assert_eq!(entry.id, author);
    assert_eq!(entry.tweet_reply_count, 3);
    assert_eq!(entry.tweet_like_count, 2);
    assert!(entry.is_liked);

    let outsider = insert_user(&store, "outsider", "Outsider").await;
    let page = social::liked_feed(&store, subject, outsider).await.unwrap();
    assert!(!page.entries[0].is_liked);
}

#[tokio::test]
async fn test_replied_feed_is_newest_first() {
    let (_temp, store) = create_test_store();
    let author = insert_user(&store, "author", "Author").await;
    let replier = insert_user(&store, "replier", "Replier").await;

    let tweet = social::create_tweet(&store, author, "first").await.unwrap();
    social::create_reply(&store, replier, tweet, "older").await.unwrap();
    social::create_reply(&store, replier, tweet, "newer").await.unwrap();

    let page = social::replied_feed(&store, replier, author).await.unwrap();
    let comments: Vec<&str> = page.entries.iter().map(|e| e.comment.as_str()).collect();
    assert_eq!(comments, ["newer", "older"]);
    assert_eq!(page.entries[0].replied_by_account, "author");
    assert_eq!(page.entries[0].replied_by_id, author);
}

#[tokio::test]
async fn test_missing_subject_is_not_found() {
    let (_temp, store) = create_test_store();
    let viewer = insert_user(&store, "viewer", "Viewer").await;

    let err = social::replied_feed(&store, UserId(4242), viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_feeds_survive_more_tweets_than_sqlite_variables() {
    let (_temp, store) = create_test_store();
    let author = insert_user(&store, "author", "Author").await;
    let fan = insert_user(&store, "fanatic", "Fan").await;

    // Past SQLite's 32766 bound-variable ceiling
    const VOLUME: i64 = 33_000;
    {
        let mut conn = store.pool().get().unwrap();
        let tx = conn.transaction().unwrap();
        {
            let mut tweet = tx
                .prepare("INSERT INTO tweets (user_id, description) VALUES (?1, ?2)")
                .unwrap();
            let mut like = tx
                .prepare("INSERT INTO likes (tweet_id, user_id) VALUES (?1, ?2)")
                .unwrap();
            for i in 0..VOLUME {
                tweet.execute(params![author, format!("tweet {i}")]).unwrap();
                like.execute(params![tx.last_insert_rowid(), fan]).unwrap();
            }
        }
        tx.commit().unwrap();
    }

    let liked = social::liked_feed(&store, fan, fan).await.unwrap();
    assert_eq!(liked.entries.len() as i64, VOLUME);
    assert!(liked.entries.iter().all(|e| e.is_liked && e.tweet_like_count == 1));

    let tweets = social::tweets_feed(&store, author, fan).await.unwrap();
    assert_eq!(tweets.entries.len() as i64, VOLUME);
    assert_eq!(tweets.profile.tweets_count, VOLUME);
}
