use crate::database::models::GroupRecord;
use crate::database::repositories::GroupRepository;
use crate::database::Database;
use crate::forms::FormErrors;
use crate::utils::is_valid_slug;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct GroupService {
    database: Database,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl GroupView {
    pub(crate) fn from_record(record: GroupRecord) -> Self {
        Self {
            title: record.title,
            slug: record.slug,
            description: record.description,
        }
    }
}

impl GroupService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_group(&self, input: CreateGroupInput) -> Result<GroupView> {
        let mut errors = FormErrors::new();
        if input.title.trim().is_empty() {
            errors.push("title", "title may not be empty");
        }
        if !is_valid_slug(&input.slug) {
            errors.push("slug", "use letters, digits, dashes or underscores");
        } else {
            let taken = self
                .database
                .with_repositories(|repos| repos.groups().get_by_slug(&input.slug))?
                .is_some();
            if taken {
                errors.push("slug", "already in use");
            }
        }
        errors.into_result()?;

        let record = GroupRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            slug: input.slug,
            description: input.description,
        };
        self.database
            .with_repositories(|repos| repos.groups().create(&record))?;
        tracing::info!(slug = %record.slug, "group created");
        Ok(GroupView::from_record(record))
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<GroupView>> {
        let record = self
            .database
            .with_repositories(|repos| repos.groups().get_by_slug(slug))?;
        Ok(record.map(GroupView::from_record))
    }

    /// All groups, for the post-form choice list.
    pub fn list(&self) -> Result<Vec<GroupView>> {
        let records = self.database.with_repositories(|repos| repos.groups().list())?;
        Ok(records.into_iter().map(GroupView::from_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> GroupService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let database = Database::from_connection(conn);
        database.ensure_migrations().expect("migrations");
        GroupService::new(database)
    }

    fn input(title: &str, slug: &str) -> CreateGroupInput {
        CreateGroupInput {
            title: title.into(),
            slug: slug.into(),
            description: String::new(),
        }
    }

    #[test]
    fn creates_and_finds_by_slug() {
        let service = setup_service();
        service
            .create_group(input("Rustaceans", "rustaceans"))
            .expect("create");

        let found = service.get_by_slug("rustaceans").expect("lookup");
        assert_eq!(found.expect("present").title, "Rustaceans");
        assert!(service.get_by_slug("missing").expect("lookup").is_none());
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let service = setup_service();
        service
            .create_group(input("First", "test-slug"))
            .expect("create");

        let err = service.create_group(input("Second", "test-slug")).unwrap_err();
        let errors = err
            .downcast_ref::<crate::forms::FormErrors>()
            .expect("form errors");
        assert_eq!(errors.field("slug"), Some("already in use"));
    }

    #[test]
    fn invalid_slug_is_rejected() {
        let service = setup_service();
        let err = service.create_group(input("Bad", "has space")).unwrap_err();
        let errors = err
            .downcast_ref::<crate::forms::FormErrors>()
            .expect("form errors");
        assert!(errors.field("slug").is_some());
    }
}
