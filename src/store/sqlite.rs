// SQLite implementation of the graph store - isolates all database side effects
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

use crate::db::models::{Followship, Like, Reply, Tweet, TweetId, User, UserCard, UserId};
use crate::state::DbPool;
use crate::store::{
    AuthoredReply, CountedRelation, FollowLink, FollowerTally, GraphStore, LikedTweet, NewUser,
    ProfileChange, RepliedTweet, SettingsChange, StoreError, TweetThread, WriteOutcome,
};

const USER_COLUMNS: &str = "u.id, u.account, u.email, u.name, u.password_hash, u.role, \
                            u.introduction, u.avatar, u.cover, u.created_at";

pub struct SqliteGraphStore {
    pool: DbPool,
}

impl SqliteGraphStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run blocking SQLite work off the async executor.
    async fn run<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            work(&conn)
        })
        .await?
    }
}

fn read_user(row: &Row<'_>, at: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(at)?,
        account: row.get(at + 1)?,
        email: row.get(at + 2)?,
        name: row.get(at + 3)?,
        password_hash: row.get(at + 4)?,
        role: row.get(at + 5)?,
        introduction: row.get(at + 6)?,
        avatar: row.get(at + 7)?,
        cover: row.get(at + 8)?,
        created_at: row.get(at + 9)?,
    })
}

/// Reads `id, account, name, avatar, role` starting at `at`.
fn read_card(row: &Row<'_>, at: usize) -> rusqlite::Result<UserCard> {
    Ok(UserCard {
        id: row.get(at)?,
        account: row.get(at + 1)?,
        name: row.get(at + 2)?,
        avatar: row.get(at + 3)?,
        role: row.get(at + 4)?,
    })
}

/// Reads `id, user_id, description, created_at` starting at `at`.
fn read_tweet(row: &Row<'_>, at: usize) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: row.get(at)?,
        user_id: row.get(at + 1)?,
        description: row.get(at + 2)?,
        created_at: row.get(at + 3)?,
    })
}

/// Reads `id, tweet_id, user_id, comment, created_at` starting at `at`.
fn read_reply(row: &Row<'_>, at: usize) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(at)?,
        tweet_id: row.get(at + 1)?,
        user_id: row.get(at + 2)?,
        comment: row.get(at + 3)?,
        created_at: row.get(at + 4)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Ids bound per `IN (...)` statement, well under SQLite's variable limit.
const ID_CHUNK: usize = 500;

/// Attach the full reply and like collections to each tweet, preserving order.
fn load_threads(
    conn: &Connection,
    tweets: Vec<(Tweet, UserCard)>,
) -> Result<Vec<TweetThread>, StoreError> {
    if tweets.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<TweetId> = tweets.iter().map(|(t, _)| t.id).collect();
    let mut replies: HashMap<TweetId, Vec<i64>> = HashMap::new();
    let mut likers: HashMap<TweetId, Vec<UserId>> = HashMap::new();

    for chunk in ids.chunks(ID_CHUNK) {
        let marks = placeholders(chunk.len());

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT tweet_id, id FROM replies WHERE tweet_id IN ({marks}) ORDER BY id"
        ))?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            replies.entry(row.get(0)?).or_default().push(row.get(1)?);
        }

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT tweet_id, user_id FROM likes WHERE tweet_id IN ({marks}) ORDER BY id"
        ))?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            likers.entry(row.get(0)?).or_default().push(row.get(1)?);
        }
    }

    Ok(tweets
        .into_iter()
        .map(|(tweet, author)| TweetThread {
            reply_ids: replies.remove(&tweet.id).unwrap_or_default(),
            liker_ids: likers.remove(&tweet.id).unwrap_or_default(),
            tweet,
            author,
        })
        .collect())
}

fn query_follow_links(
    conn: &Connection,
    sql: &str,
    id: UserId,
) -> Result<Vec<FollowLink>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let links = stmt
        .query_map(params![id], |row| {
            Ok(FollowLink {
                user: read_user(row, 0)?,
                followed_at: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(links)
}

fn query_tweets(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<TweetThread>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let tweets = stmt
        .query_map(params, |row| Ok((read_tweet(row, 0)?, read_card(row, 4)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    load_threads(conn, tweets)
}

const TWEET_SELECT: &str = "SELECT t.id, t.user_id, t.description, t.created_at,
                                   a.id, a.account, a.name, a.avatar, a.role
                            FROM tweets t
                            JOIN users a ON a.id = t.user_id";

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
                params![id],
                |row| read_user(row, 0),
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn users_matching(
        &self,
        account: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<Vec<User>, StoreError> {
        let account = account.to_string();
        let email = email.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE (u.account = ?1 OR u.email = ?2)
                   AND (?3 IS NULL OR u.id <> ?3)"
            ))?;
            let users = stmt
                .query_map(params![account, email, except], |row| read_user(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<Option<UserId>, StoreError> {
        let user = user.clone();
        self.run(move |conn| {
            let now = Utc::now().naive_utc();
            let result = conn.execute(
                "INSERT INTO users (account, email, name, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![user.account, user.email, user.name, user.password_hash, now],
            );
            match result {
                Ok(_) => Ok(Some(UserId(conn.last_insert_rowid()))),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn update_settings(
        &self,
        id: UserId,
        change: &SettingsChange,
    ) -> Result<WriteOutcome, StoreError> {
        let change = change.clone();
        self.run(move |conn| {
            let result = conn.execute(
                "UPDATE users SET account = ?1, email = ?2, name = ?3,
                        password_hash = COALESCE(?4, password_hash), updated_at = ?5
                 WHERE id = ?6",
                params![
                    change.account,
                    change.email,
                    change.name,
                    change.password_hash,
                    Utc::now().naive_utc(),
                    id
                ],
            );
            match result {
                Ok(_) => Ok(WriteOutcome::Created),
                Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Duplicate),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn update_profile(
        &self,
        id: UserId,
        change: &ProfileChange,
    ) -> Result<bool, StoreError> {
        let change = change.clone();
        self.run(move |conn| {
            let rows = conn.execute(
                "UPDATE users SET name = ?1, introduction = ?2, avatar = ?3, cover = ?4,
                        updated_at = ?5
                 WHERE id = ?6",
                params![
                    change.name,
                    change.introduction,
                    change.avatar,
                    change.cover,
                    Utc::now().naive_utc(),
                    id
                ],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    async fn all_users(&self) -> Result<Vec<User>, StoreError> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id"))?;
            let users = stmt
                .query_map([], |row| read_user(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
    }

    async fn grouped_counts(
        &self,
        relation: CountedRelation,
        ids: &[UserId],
    ) -> Result<Vec<(UserId, i64)>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.run(move |conn| {
            // Admin-sourced edges never count as followers
            let (from, column) = match relation {
                CountedRelation::TweetsByAuthor => ("tweets t", "t.user_id"),
                CountedRelation::FollowersOf => (
                    "followships f JOIN users src ON src.id = f.follower_id \
                     AND src.role = 'normal'",
                    "f.following_id",
                ),
                CountedRelation::FollowingsOf => ("followships f", "f.follower_id"),
            };

            let mut counts = Vec::new();
            for chunk in ids.chunks(ID_CHUNK) {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {column}, COUNT(*) FROM {from}
                     WHERE {column} IN ({})
                     GROUP BY {column}",
                    placeholders(chunk.len())
                ))?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                for row in rows {
                    counts.push(row?);
                }
            }
            Ok(counts)
        })
        .await
    }

    async fn follower_tallies(&self, limit: usize) -> Result<Vec<FollowerTally>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.account, u.name, u.avatar, u.role,
                        COUNT(DISTINCT f.follower_id) AS followers
                 FROM followships f
                 JOIN users u ON u.id = f.following_id AND u.role = 'normal'
                 JOIN users src ON src.id = f.follower_id AND src.role = 'normal'
                 GROUP BY f.following_id
                 ORDER BY followers DESC, u.id ASC
                 LIMIT ?1",
            )?;
            let tallies = stmt
                .query_map(params![limit], |row| {
                    Ok(FollowerTally {
                        user: read_card(row, 0)?,
                        followers: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tallies)
        })
        .await
    }

    async fn following_ids(&self, id: UserId) -> Result<Vec<UserId>, StoreError> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare("SELECT following_id FROM followships WHERE follower_id = ?1")?;
            let ids = stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
        .await
    }

    async fn followers_of(&self, id: UserId) -> Result<Vec<FollowLink>, StoreError> {
        self.run(move |conn| {
            query_follow_links(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS}, f.created_at
                     FROM followships f
                     JOIN users u ON u.id = f.follower_id AND u.role = 'normal'
                     WHERE f.following_id = ?1
                     ORDER BY f.created_at DESC, u.id DESC"
                ),
                id,
            )
        })
        .await
    }

    async fn followings_of(&self, id: UserId) -> Result<Vec<FollowLink>, StoreError> {
        self.run(move |conn| {
            query_follow_links(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS}, f.created_at
                     FROM followships f
                     JOIN users u ON u.id = f.following_id
                     WHERE f.follower_id = ?1
                     ORDER BY f.created_at DESC, u.id DESC"
                ),
                id,
            )
        })
        .await
    }

    async fn followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<Followship>, StoreError> {
        self.run(move |conn| {
            let result = conn.query_row(
                "SELECT follower_id, following_id, created_at FROM followships
                 WHERE follower_id = ?1 AND following_id = ?2",
                params![follower, following],
                |row| {
                    Ok(Followship {
                        follower_id: row.get(0)?,
                        following_id: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(edge) => Ok(Some(edge)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn insert_followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<WriteOutcome, StoreError> {
        self.run(move |conn| {
            // The primary key is the authoritative duplicate guard
            let rows = conn.execute(
                "INSERT INTO followships (follower_id, following_id, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT DO NOTHING",
                params![follower, following, Utc::now().naive_utc()],
            )?;
            Ok(if rows == 0 {
                WriteOutcome::Duplicate
            } else {
                WriteOutcome::Created
            })
        })
        .await
    }

    async fn delete_followship(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let rows = conn.execute(
                "DELETE FROM followships WHERE follower_id = ?1 AND following_id = ?2",
                params![follower, following],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    async fn tweet(&self, id: TweetId) -> Result<Option<TweetThread>, StoreError> {
        self.run(move |conn| {
            let threads = query_tweets(conn, &format!("{TWEET_SELECT} WHERE t.id = ?1"), params![id])?;
            Ok(threads.into_iter().next())
        })
        .await
    }

    async fn recent_tweets(&self, limit: usize) -> Result<Vec<TweetThread>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            query_tweets(
                conn,
                &format!("{TWEET_SELECT} ORDER BY t.created_at DESC, t.id DESC LIMIT ?1"),
                params![limit],
            )
        })
        .await
    }

    async fn all_tweets(&self) -> Result<Vec<TweetThread>, StoreError> {
        self.run(|conn| {
            query_tweets(
                conn,
                &format!("{TWEET_SELECT} ORDER BY t.created_at DESC, t.id DESC"),
                [],
            )
        })
        .await
    }

    async fn tweets_by(&self, author: UserId) -> Result<Vec<TweetThread>, StoreError> {
        self.run(move |conn| {
            query_tweets(
                conn,
                &format!("{TWEET_SELECT} WHERE t.user_id = ?1 ORDER BY t.created_at DESC, t.id DESC"),
                params![author],
            )
        })
        .await
    }

    async fn replies_to(&self, tweet: TweetId) -> Result<Vec<AuthoredReply>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.tweet_id, r.user_id, r.comment, r.created_at,
                        a.id, a.account, a.name, a.avatar, a.role
                 FROM replies r
                 JOIN users a ON a.id = r.user_id
                 WHERE r.tweet_id = ?1
                 ORDER BY r.created_at ASC, r.id ASC",
            )?;
            let replies = stmt
                .query_map(params![tweet], |row| {
                    Ok(AuthoredReply {
                        reply: read_reply(row, 0)?,
                        author: read_card(row, 5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(replies)
        })
        .await
    }

    async fn replies_by(&self, author: UserId) -> Result<Vec<RepliedTweet>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.tweet_id, r.user_id, r.comment, r.created_at,
                        a.id, a.account, a.name, a.avatar, a.role
                 FROM replies r
                 JOIN tweets t ON t.id = r.tweet_id
                 JOIN users a ON a.id = t.user_id
                 WHERE r.user_id = ?1
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;
            let replies = stmt
                .query_map(params![author], |row| {
                    Ok(RepliedTweet {
                        reply: read_reply(row, 0)?,
                        tweet_author: read_card(row, 5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(replies)
        })
        .await
    }

    async fn likes_by(&self, user: UserId) -> Result<Vec<LikedTweet>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.tweet_id, l.user_id, l.created_at,
                        t.id, t.user_id, t.description, t.created_at,
                        a.id, a.account, a.name, a.avatar, a.role
                 FROM likes l
                 JOIN tweets t ON t.id = l.tweet_id
                 JOIN users a ON a.id = t.user_id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, l.id DESC",
            )?;
            let rows = stmt
                .query_map(params![user], |row| {
                    let like = Like {
                        id: row.get(0)?,
                        tweet_id: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: row.get(3)?,
                    };
                    Ok((like, read_tweet(row, 4)?, read_card(row, 8)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let (likes, tweets): (Vec<Like>, Vec<(Tweet, UserCard)>) = rows
                .into_iter()
                .map(|(like, tweet, author)| (like, (tweet, author)))
                .unzip();
            let threads = load_threads(conn, tweets)?;

            Ok(likes
                .into_iter()
                .zip(threads)
                .map(|(like, thread)| LikedTweet { like, thread })
                .collect())
        })
        .await
    }

    async fn insert_tweet(
        &self,
        author: UserId,
        description: &str,
    ) -> Result<TweetId, StoreError> {
        let description = description.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO tweets (user_id, description, created_at) VALUES (?1, ?2, ?3)",
                params![author, description, Utc::now().naive_utc()],
            )?;
            Ok(TweetId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn delete_tweet(&self, id: TweetId) -> Result<bool, StoreError> {
        self.run(move |conn| {
            // Replies and likes go with it through ON DELETE CASCADE
            let rows = conn.execute("DELETE FROM tweets WHERE id = ?1", params![id])?;
            Ok(rows > 0)
        })
        .await
    }

    async fn insert_reply(
        &self,
        author: UserId,
        tweet: TweetId,
        comment: &str,
    ) -> Result<i64, StoreError> {
        let comment = comment.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO replies (tweet_id, user_id, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![tweet, author, comment, Utc::now().naive_utc()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn insert_like(&self, user: UserId, tweet: TweetId) -> Result<WriteOutcome, StoreError> {
        self.run(move |conn| {
            let rows = conn.execute(
                "INSERT INTO likes (tweet_id, user_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, tweet_id) DO NOTHING",
                params![tweet, user, Utc::now().naive_utc()],
            )?;
            Ok(if rows == 0 {
                WriteOutcome::Duplicate
            } else {
                WriteOutcome::Created
            })
        })
        .await
    }

    async fn delete_like(&self, user: UserId, tweet: TweetId) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let rows = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND tweet_id = ?2",
                params![user, tweet],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use crate::store::testing::{add_user, make_admin, test_store};

    #[tokio::test]
    async fn test_user_lookup() {
        let (store, _temp) = test_store();
        let id = add_user(&store, "alice").await;

        let user = store.user(id).await.unwrap().unwrap();
        assert_eq!(user.account, "alice");
        assert_eq!(user.role, Role::Normal);

        assert!(store.user(UserId(9999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_user_reports_taken_account() {
        let (store, _temp) = test_store();
        add_user(&store, "alice").await;

        let dup = NewUser {
            account: "alice".into(),
            email: "other@example.com".into(),
            name: "Other".into(),
            password_hash: "x".into(),
        };
        assert_eq!(store.insert_user(&dup).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_users_matching_excludes_self() {
        let (store, _temp) = test_store();
        let alice = add_user(&store, "alice").await;
        add_user(&store, "bobby").await;

        let hits = store
            .users_matching("alice", "bobby@example.com", None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store
            .users_matching("alice", "bobby@example.com", Some(alice))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].account, "bobby");
    }

    #[tokio::test]
    async fn test_insert_followship_duplicate() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        assert_eq!(
            store.insert_followship(a, b).await.unwrap(),
            WriteOutcome::Created
        );
        assert_eq!(
            store.insert_followship(a, b).await.unwrap(),
            WriteOutcome::Duplicate
        );
        assert!(store.followship(a, b).await.unwrap().is_some());
        assert!(store.followship(b, a).await.unwrap().is_none());

        assert!(store.delete_followship(a, b).await.unwrap());
        assert!(!store.delete_followship(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_grouped_counts() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;
        let c = add_user(&store, "carol").await;

        store.insert_followship(a, c).await.unwrap();
        store.insert_followship(b, c).await.unwrap();
        store.insert_followship(c, a).await.unwrap();
        store.insert_tweet(a, "one").await.unwrap();
        store.insert_tweet(a, "two").await.unwrap();

        let mut followers = store
            .grouped_counts(CountedRelation::FollowersOf, &[a, b, c])
            .await
            .unwrap();
        followers.sort();
        assert_eq!(followers, vec![(a, 1), (c, 2)]);

        let tweets = store
            .grouped_counts(CountedRelation::TweetsByAuthor, &[a, b])
            .await
            .unwrap();
        assert_eq!(tweets, vec![(a, 2)]);

        assert!(store
            .grouped_counts(CountedRelation::FollowingsOf, &[])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_follower_tallies_skip_admin_sources() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;
        let root = add_user(&store, "rootadmin").await;

        store.insert_followship(a, b).await.unwrap();
        store.insert_followship(root, b).await.unwrap();
        make_admin(&store, root);

        let tallies = store.follower_tallies(10).await.unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].user.id, b);
        assert_eq!(tallies[0].followers, 1);

        let followers = store
            .grouped_counts(CountedRelation::FollowersOf, &[b])
            .await
            .unwrap();
        assert_eq!(followers, vec![(b, 1)]);

        let links = store.followers_of(b).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].user.id, a);
    }

    #[tokio::test]
    async fn test_follower_tallies_ordered_and_limited() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;
        let c = add_user(&store, "carol").await;
        let d = add_user(&store, "dave_").await;
        let root = add_user(&store, "rootadmin").await;

        let edges = [
            (a, d),
            (b, d),
            (a, c),
            (d, b),
            (c, b),
            (a, root),
            (b, root),
            (c, root),
        ];
        for (from, to) in edges {
            store.insert_followship(from, to).await.unwrap();
        }
        make_admin(&store, root);

        let ranked: Vec<_> = store
            .follower_tallies(10)
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.user.id, t.followers))
            .collect();
        assert_eq!(ranked, vec![(b, 2), (d, 2), (c, 1)]);

        let top = store.follower_tallies(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].user.id, b);
    }

    #[tokio::test]
    async fn test_grouped_counts_beyond_one_chunk() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;
        store.insert_followship(a, b).await.unwrap();

        let mut ids: Vec<UserId> = (1000..1000 + 3 * ID_CHUNK as i64).map(UserId).collect();
        ids.push(b);
        let counts = store
            .grouped_counts(CountedRelation::FollowersOf, &ids)
            .await
            .unwrap();
        assert_eq!(counts, vec![(b, 1)]);
    }

    #[tokio::test]
    async fn test_update_profile_and_list_users() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        let change = ProfileChange {
            name: "Alice A.".into(),
            introduction: Some("hello there".into()),
            avatar: Some("https://img.example.com/a.png".into()),
            cover: None,
        };
        assert!(store.update_profile(a, &change).await.unwrap());
        assert!(!store.update_profile(UserId(9999), &change).await.unwrap());

        let user = store.user(a).await.unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Alice A."));
        assert_eq!(user.introduction.as_deref(), Some("hello there"));
        assert_eq!(user.avatar.as_deref(), Some("https://img.example.com/a.png"));
        assert_eq!(user.cover, None);
        assert_eq!(user.account, "alice");

        let ids: Vec<_> = store.all_users().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_delete_tweet_cascades() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        let doomed = store.insert_tweet(a, "doomed").await.unwrap();
        let kept = store.insert_tweet(a, "kept").await.unwrap();
        store.insert_reply(b, doomed, "reply").await.unwrap();
        store.insert_like(b, doomed).await.unwrap();
        store.insert_like(b, kept).await.unwrap();

        assert!(store.delete_tweet(doomed).await.unwrap());
        assert!(!store.delete_tweet(doomed).await.unwrap());

        assert!(store.tweet(doomed).await.unwrap().is_none());
        assert!(store.replies_by(b).await.unwrap().is_empty());
        let liked: Vec<_> = store
            .likes_by(b)
            .await
            .unwrap()
            .iter()
            .map(|l| l.thread.tweet.id)
            .collect();
        assert_eq!(liked, vec![kept]);

        let all: Vec<_> = store.all_tweets().await.unwrap().iter().map(|t| t.tweet.id).collect();
        assert_eq!(all, vec![kept]);
    }

    #[tokio::test]
    async fn test_tweet_thread_carries_engagement() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        let tweet = store.insert_tweet(a, "hello").await.unwrap();
        store.insert_reply(b, tweet, "hi back").await.unwrap();
        store.insert_reply(a, tweet, "thanks").await.unwrap();
        store.insert_like(b, tweet).await.unwrap();
        assert_eq!(
            store.insert_like(b, tweet).await.unwrap(),
            WriteOutcome::Duplicate
        );

        let thread = store.tweet(tweet).await.unwrap().unwrap();
        assert_eq!(thread.author.account, "alice");
        assert_eq!(thread.reply_ids.len(), 2);
        assert_eq!(thread.liker_ids, vec![b]);

        let replies = store.replies_to(tweet).await.unwrap();
        let comments: Vec<_> = replies.iter().map(|r| r.reply.comment.as_str()).collect();
        assert_eq!(comments, vec!["hi back", "thanks"]);
    }

    #[tokio::test]
    async fn test_likes_by_joins_tweet_and_author() {
        let (store, _temp) = test_store();
        let a = add_user(&store, "alice").await;
        let b = add_user(&store, "bobby").await;

        let first = store.insert_tweet(a, "first").await.unwrap();
        let second = store.insert_tweet(a, "second").await.unwrap();
        store.insert_like(b, first).await.unwrap();
        store.insert_like(b, second).await.unwrap();
        store.insert_like(a, second).await.unwrap();

        let liked = store.likes_by(b).await.unwrap();
        let ids: Vec<_> = liked.iter().map(|l| l.thread.tweet.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(liked[0].thread.author.id, a);
        assert_eq!(liked[0].thread.liker_ids.len(), 2);
        assert_eq!(liked[1].thread.liker_ids, vec![b]);
    }
}
