use crate::database::models::{SessionRecord, UserRecord};
use crate::database::repositories::{SessionRepository, UserRepository};
use crate::database::Database;
use crate::forms::FormErrors;
use crate::utils::{is_valid_username, now_utc_iso};
use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "murmur_session";

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct AccountService {
    database: Database,
}

#[derive(Debug)]
pub struct StartedSession {
    pub token: String,
    pub user: UserRecord,
}

impl AccountService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn signup(&self, username: &str, password: &str) -> Result<UserRecord> {
        let mut errors = FormErrors::new();
        if !is_valid_username(username) {
            errors.push(
                "username",
                "use 3-30 letters, digits or underscores",
            );
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("password", "use at least 8 characters");
        }
        if errors.is_empty() {
            let taken = self
                .database
                .with_repositories(|repos| repos.users().get_by_username(username))?
                .is_some();
            if taken {
                errors.push("username", "already taken");
            }
        }
        errors.into_result()?;

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            joined_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.users().create(&record))?;
        tracing::info!(username = %record.username, "account created");
        Ok(record)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<StartedSession> {
        let user = self
            .database
            .with_repositories(|repos| repos.users().get_by_username(username))?;
        let Some(user) = user else {
            return Err(FormErrors::single("username", "unknown username").into());
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(FormErrors::single("password", "incorrect password").into());
        }

        let session = SessionRecord {
            token: generate_token(),
            user_id: user.id.clone(),
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.sessions().create(&session))?;
        Ok(StartedSession {
            token: session.token,
            user,
        })
    }

    pub fn logout(&self, token: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.sessions().delete(token))
    }

    /// User behind a session token; `None` for unknown or revoked tokens.
    pub fn authenticate(&self, token: &str) -> Result<Option<UserRecord>> {
        self.database.with_repositories(|repos| {
            let Some(session) = repos.sessions().get(token)? else {
                return Ok(None);
            };
            repos.users().get(&session.user_id)
        })
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|err| anyhow!("stored password hash invalid: {err}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> AccountService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let database = Database::from_connection(conn);
        database.ensure_migrations().expect("migrations");
        AccountService::new(database)
    }

    #[test]
    fn signup_then_login_round_trip() {
        let service = setup_service();
        let user = service.signup("bob", "tibetritualknife").expect("signup");
        assert_eq!(user.username, "bob");
        assert_ne!(user.password_hash, "tibetritualknife");

        let session = service.login("bob", "tibetritualknife").expect("login");
        assert_eq!(session.user.id, user.id);

        let authenticated = service
            .authenticate(&session.token)
            .expect("authenticate")
            .expect("session resolves");
        assert_eq!(authenticated.username, "bob");
    }

    #[test]
    fn wrong_password_is_a_form_error() {
        let service = setup_service();
        service.signup("bob", "tibetritualknife").expect("signup");

        let err = service.login("bob", "wrong-password").unwrap_err();
        let errors = err.downcast_ref::<FormErrors>().expect("form errors");
        assert!(errors.field("password").is_some());
    }

    #[test]
    fn duplicate_username_is_rejected_without_partial_row() {
        let service = setup_service();
        service.signup("bob", "tibetritualknife").expect("signup");

        let err = service.signup("bob", "anotherpassword").unwrap_err();
        let errors = err.downcast_ref::<FormErrors>().expect("form errors");
        assert_eq!(errors.field("username"), Some("already taken"));
    }

    #[test]
    fn short_password_and_bad_username_collect_both_errors() {
        let service = setup_service();
        let err = service.signup("x", "short").unwrap_err();
        let errors = err.downcast_ref::<FormErrors>().expect("form errors");
        assert!(errors.field("username").is_some());
        assert!(errors.field("password").is_some());
    }

    #[test]
    fn logout_revokes_the_session() {
        let service = setup_service();
        service.signup("bob", "tibetritualknife").expect("signup");
        let session = service.login("bob", "tibetritualknife").expect("login");

        service.logout(&session.token).expect("logout");
        assert!(service
            .authenticate(&session.token)
            .expect("authenticate")
            .is_none());
    }
}
