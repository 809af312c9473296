mod comments;
mod follows;
mod groups;
mod posts;
mod sessions;
mod users;

use super::models::{
    CommentRecord, FollowRecord, GroupRecord, PostRecord, SessionRecord, UserRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    fn delete(&self, id: &str) -> Result<()>;
}

pub trait SessionRepository {
    fn create(&self, record: &SessionRecord) -> Result<()>;
    fn get(&self, token: &str) -> Result<Option<SessionRecord>>;
    fn delete(&self, token: &str) -> Result<()>;
}

pub trait GroupRepository {
    fn create(&self, record: &GroupRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<GroupRecord>>;
    fn get_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>>;
    fn list(&self) -> Result<Vec<GroupRecord>>;
    fn delete(&self, id: &str) -> Result<()>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    /// Rewrites the mutable columns only; author and timestamp stay put.
    fn update_content(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn count_all(&self) -> Result<u64>;
    fn count_for_group(&self, group_id: &str) -> Result<u64>;
    fn count_for_author(&self, author_id: &str) -> Result<u64>;
    fn count_followed_by(&self, user_id: &str) -> Result<u64>;
    fn list_recent(&self, limit: usize, offset: usize) -> Result<Vec<PostRecord>>;
    fn list_for_group(&self, group_id: &str, limit: usize, offset: usize)
        -> Result<Vec<PostRecord>>;
    fn list_for_author(
        &self,
        author_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>>;
    fn list_followed_by(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    fn count_all(&self) -> Result<u64>;
}

pub trait FollowRepository {
    /// Inserting an existing (user, author) pair is a no-op.
    fn follow(&self, record: &FollowRecord) -> Result<()>;
    fn unfollow(&self, user_id: &str, author_id: &str) -> Result<()>;
    fn is_following(&self, user_id: &str, author_id: &str) -> Result<bool>;
    fn list_following(&self, user_id: &str) -> Result<Vec<FollowRecord>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn sessions(&self) -> impl SessionRepository + '_ {
        sessions::SqliteSessionRepository { conn: self.conn }
    }

    pub fn groups(&self) -> impl GroupRepository + '_ {
        groups::SqliteGroupRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn follows(&self) -> impl FollowRepository + '_ {
        follows::SqliteFollowRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MIGRATIONS;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("migrations");
        conn
    }

    fn user(id: &str, username: &str) -> UserRecord {
        UserRecord {
            id: id.into(),
            username: username.into(),
            password_hash: "hash".into(),
            joined_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    fn post(id: &str, author: &str, group: Option<&str>, published_at: &str) -> PostRecord {
        PostRecord {
            id: id.into(),
            text: format!("text of {id}"),
            author_id: author.into(),
            group_id: group.map(Into::into),
            image_path: None,
            published_at: published_at.into(),
        }
    }

    #[test]
    fn user_and_post_round_trip() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.users().create(&user("u1", "bob")).unwrap();
        let fetched = repos.users().get_by_username("bob").unwrap().unwrap();
        assert_eq!(fetched.id, "u1");

        repos
            .posts()
            .create(&post("p1", "u1", None, "2026-01-02T00:00:00+00:00"))
            .unwrap();
        let fetched = repos.posts().get("p1").unwrap().unwrap();
        assert_eq!(fetched.text, "text of p1");
        assert_eq!(repos.posts().count_all().unwrap(), 1);
    }

    #[test]
    fn posts_list_newest_first() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "bob")).unwrap();

        repos
            .posts()
            .create(&post("p1", "u1", None, "2026-01-01T00:00:00+00:00"))
            .unwrap();
        repos
            .posts()
            .create(&post("p2", "u1", None, "2026-01-03T00:00:00+00:00"))
            .unwrap();
        repos
            .posts()
            .create(&post("p3", "u1", None, "2026-01-02T00:00:00+00:00"))
            .unwrap();

        let listed = repos.posts().list_recent(10, 0).unwrap();
        let ids: Vec<_> = listed.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p3", "p1"]);
    }

    #[test]
    fn same_instant_posts_keep_insertion_order() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "bob")).unwrap();

        for id in ["p1", "p2", "p3"] {
            repos
                .posts()
                .create(&post(id, "u1", None, "2026-01-01T00:00:00+00:00"))
                .unwrap();
        }

        let listed = repos.posts().list_recent(10, 0).unwrap();
        let ids: Vec<_> = listed.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p2", "p1"]);
    }

    #[test]
    fn deleting_group_nulls_post_reference() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "bob")).unwrap();
        repos
            .groups()
            .create(&GroupRecord {
                id: "g1".into(),
                title: "Group".into(),
                slug: "test-slug".into(),
                description: "about".into(),
            })
            .unwrap();
        repos
            .posts()
            .create(&post("p1", "u1", Some("g1"), "2026-01-01T00:00:00+00:00"))
            .unwrap();

        repos.groups().delete("g1").unwrap();

        let fetched = repos.posts().get("p1").unwrap().unwrap();
        assert_eq!(fetched.group_id, None);
    }

    #[test]
    fn deleting_author_cascades_posts_and_comments() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "bob")).unwrap();
        repos.users().create(&user("u2", "eve")).unwrap();
        repos
            .posts()
            .create(&post("p1", "u1", None, "2026-01-01T00:00:00+00:00"))
            .unwrap();
        repos
            .comments()
            .create(&CommentRecord {
                id: "c1".into(),
                post_id: "p1".into(),
                author_id: "u2".into(),
                text: "hi".into(),
                created_at: "2026-01-01T00:00:01+00:00".into(),
            })
            .unwrap();

        repos.users().delete("u1").unwrap();

        assert_eq!(repos.posts().count_all().unwrap(), 0);
        assert_eq!(repos.comments().count_all().unwrap(), 0);
    }

    #[test]
    fn duplicate_follow_is_ignored() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "bob")).unwrap();
        repos.users().create(&user("u2", "eve")).unwrap();

        let edge = FollowRecord {
            user_id: "u1".into(),
            author_id: "u2".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        repos.follows().follow(&edge).unwrap();
        repos.follows().follow(&edge).unwrap();

        assert_eq!(repos.follows().list_following("u1").unwrap().len(), 1);
        assert!(repos.follows().is_following("u1", "u2").unwrap());

        repos.follows().unfollow("u1", "u2").unwrap();
        repos.follows().unfollow("u1", "u2").unwrap();
        assert!(!repos.follows().is_following("u1", "u2").unwrap());
    }

    #[test]
    fn followed_listing_only_covers_followed_authors() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.users().create(&user("u1", "reader")).unwrap();
        repos.users().create(&user("u2", "followed")).unwrap();
        repos.users().create(&user("u3", "stranger")).unwrap();

        repos
            .follows()
            .follow(&FollowRecord {
                user_id: "u1".into(),
                author_id: "u2".into(),
                created_at: "2026-01-01T00:00:00+00:00".into(),
            })
            .unwrap();
        repos
            .posts()
            .create(&post("p1", "u2", None, "2026-01-01T00:00:00+00:00"))
            .unwrap();
        repos
            .posts()
            .create(&post("p2", "u3", None, "2026-01-02T00:00:00+00:00"))
            .unwrap();

        let feed = repos.posts().list_followed_by("u1", 10, 0).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "p1");
        assert_eq!(repos.posts().count_followed_by("u1").unwrap(), 1);
    }
}
