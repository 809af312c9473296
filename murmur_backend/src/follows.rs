use crate::database::models::{FollowRecord, UserRecord};
use crate::database::repositories::{FollowRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;

/// Directed subscription edges between users. Both directions of the
/// toggle are idempotent: re-following hits the pair-unique constraint
/// as a no-op and unfollowing an absent edge deletes nothing.
#[derive(Clone)]
pub struct FollowService {
    database: Database,
}

impl FollowService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// `None` when no such author exists. Following yourself is a no-op.
    pub fn follow(&self, user: &UserRecord, author_username: &str) -> Result<Option<()>> {
        self.database.with_repositories(|repos| {
            let Some(author) = repos.users().get_by_username(author_username)? else {
                return Ok(None);
            };
            if author.id == user.id {
                return Ok(Some(()));
            }
            repos.follows().follow(&FollowRecord {
                user_id: user.id.clone(),
                author_id: author.id,
                created_at: now_utc_iso(),
            })?;
            Ok(Some(()))
        })
    }

    pub fn unfollow(&self, user: &UserRecord, author_username: &str) -> Result<Option<()>> {
        self.database.with_repositories(|repos| {
            let Some(author) = repos.users().get_by_username(author_username)? else {
                return Ok(None);
            };
            repos.follows().unfollow(&user.id, &author.id)?;
            Ok(Some(()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::FollowRepository;
    use rusqlite::Connection;
    use uuid::Uuid;

    fn setup() -> (Database, FollowService) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let database = Database::from_connection(conn);
        database.ensure_migrations().expect("migrations");
        let service = FollowService::new(database.clone());
        (database, service)
    }

    fn make_user(database: &Database, username: &str) -> UserRecord {
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: "hash".into(),
            joined_at: now_utc_iso(),
        };
        database
            .with_repositories(|repos| repos.users().create(&record))
            .expect("create user");
        record
    }

    fn edges(database: &Database, user: &UserRecord) -> usize {
        database
            .with_repositories(|repos| repos.follows().list_following(&user.id))
            .expect("list")
            .len()
    }

    #[test]
    fn double_follow_leaves_one_edge() {
        let (database, service) = setup();
        let reader = make_user(&database, "reader");
        make_user(&database, "author");

        service.follow(&reader, "author").expect("follow").expect("author exists");
        service.follow(&reader, "author").expect("follow").expect("author exists");
        assert_eq!(edges(&database, &reader), 1);

        service
            .unfollow(&reader, "author")
            .expect("unfollow")
            .expect("author exists");
        assert_eq!(edges(&database, &reader), 0);

        // absent edge, still fine
        service
            .unfollow(&reader, "author")
            .expect("unfollow")
            .expect("author exists");
    }

    #[test]
    fn self_follow_creates_nothing() {
        let (database, service) = setup();
        let reader = make_user(&database, "reader");

        service.follow(&reader, "reader").expect("follow").expect("author exists");
        assert_eq!(edges(&database, &reader), 0);
    }

    #[test]
    fn unknown_author_reports_none() {
        let (database, service) = setup();
        let reader = make_user(&database, "reader");

        assert!(service.follow(&reader, "ghost").expect("follow").is_none());
        assert!(service.unfollow(&reader, "ghost").expect("unfollow").is_none());
    }
}
