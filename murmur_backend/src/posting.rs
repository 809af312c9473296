use crate::config::MurmurPaths;
use crate::database::models::{CommentRecord, PostRecord, UserRecord};
use crate::database::repositories::{
    CommentRepository, GroupRepository, PostRepository, SqliteRepositories, UserRepository,
};
use crate::database::Database;
use crate::forms::FormErrors;
use crate::groups::GroupView;
use crate::media::{ImageUpload, MediaService};
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

/// Creation and editing of posts and comments. Feeds live in
/// [`crate::feed`]; this service covers the single-post operations.
#[derive(Clone)]
pub struct PostService {
    database: Database,
    media: MediaService,
}

#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub text: String,
    /// Group slug; empty or missing means no group.
    pub group: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct EditPostInput {
    pub text: String,
    pub group: Option<String>,
    /// Replacement image; `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

#[derive(Debug)]
pub enum EditOutcome {
    Updated(PostView),
    /// The editor is not the post's author; the handler redirects away.
    NotAuthor,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub author: String,
    pub group: Option<GroupView>,
    pub image_url: Option<String>,
    pub published_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    /// Newest first.
    pub comments: Vec<CommentView>,
}

impl PostView {
    fn assemble(record: PostRecord, author: String, group: Option<GroupView>) -> Self {
        Self {
            id: record.id,
            text: record.text,
            author,
            group,
            image_url: record.image_path.map(|name| format!("/media/{name}")),
            published_at: record.published_at,
        }
    }
}

impl CommentView {
    fn assemble(record: CommentRecord, author: String) -> Self {
        Self {
            id: record.id,
            author,
            text: record.text,
            created_at: record.created_at,
        }
    }
}

/// Hydrates a bare post row with its author and group for rendering.
pub(crate) fn build_post_view(
    repos: &SqliteRepositories<'_>,
    record: PostRecord,
) -> Result<PostView> {
    let author = repos
        .users()
        .get(&record.author_id)?
        .with_context(|| format!("post {} references a missing author", record.id))?;
    let group = match record.group_id.as_deref() {
        Some(group_id) => repos.groups().get(group_id)?.map(GroupView::from_record),
        None => None,
    };
    Ok(PostView::assemble(record, author.username, group))
}

impl PostService {
    pub fn new(database: Database, paths: MurmurPaths) -> Self {
        Self {
            database,
            media: MediaService::new(paths),
        }
    }

    /// Resolves the `/<username>/<post_id>/` route pair. `None` when the
    /// post is missing or belongs to a different author.
    pub fn find_by_route(&self, username: &str, post_id: &str) -> Result<Option<PostRecord>> {
        self.database.with_repositories(|repos| {
            let Some(post) = repos.posts().get(post_id)? else {
                return Ok(None);
            };
            let Some(author) = repos.users().get(&post.author_id)? else {
                return Ok(None);
            };
            if author.username != username {
                return Ok(None);
            }
            Ok(Some(post))
        })
    }

    pub fn create_post(&self, author: &UserRecord, input: CreatePostInput) -> Result<PostView> {
        let (text, group, image) =
            self.validate_submission(input.text, input.group, input.image)?;

        let image_path = match &image {
            Some(upload) => Some(self.media.save_image(upload)?.file_name),
            None => None,
        };

        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            text,
            author_id: author.id.clone(),
            group_id: group.as_ref().map(|(id, _)| id.clone()),
            image_path,
            published_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.posts().create(&record))?;
        tracing::info!(post_id = %record.id, author = %author.username, "post published");

        Ok(PostView::assemble(
            record,
            author.username.clone(),
            group.map(|(_, view)| view),
        ))
    }

    pub fn edit_post(
        &self,
        editor: &UserRecord,
        post: &PostRecord,
        input: EditPostInput,
    ) -> Result<EditOutcome> {
        if post.author_id != editor.id {
            return Ok(EditOutcome::NotAuthor);
        }

        let (text, group, image) =
            self.validate_submission(input.text, input.group, input.image)?;

        let image_path = match &image {
            Some(upload) => Some(self.media.save_image(upload)?.file_name),
            None => post.image_path.clone(),
        };

        let record = PostRecord {
            id: post.id.clone(),
            text,
            author_id: post.author_id.clone(),
            group_id: group.as_ref().map(|(id, _)| id.clone()),
            image_path,
            published_at: post.published_at.clone(),
        };
        self.database
            .with_repositories(|repos| repos.posts().update_content(&record))?;

        Ok(EditOutcome::Updated(PostView::assemble(
            record,
            editor.username.clone(),
            group.map(|(_, view)| view),
        )))
    }

    pub fn detail(&self, username: &str, post_id: &str) -> Result<Option<PostDetail>> {
        self.database.with_repositories(|repos| {
            let Some(post) = repos.posts().get(post_id)? else {
                return Ok(None);
            };
            let Some(author) = repos.users().get(&post.author_id)? else {
                return Ok(None);
            };
            if author.username != username {
                return Ok(None);
            }

            let mut comments = Vec::new();
            for record in repos.comments().list_for_post(&post.id)? {
                let commenter = repos
                    .users()
                    .get(&record.author_id)?
                    .with_context(|| format!("comment {} references a missing author", record.id))?;
                comments.push(CommentView::assemble(record, commenter.username));
            }

            let post = build_post_view(&repos, post)?;
            Ok(Some(PostDetail { post, comments }))
        })
    }

    pub fn add_comment(
        &self,
        author: &UserRecord,
        post: &PostRecord,
        text: &str,
    ) -> Result<CommentView> {
        if text.trim().is_empty() {
            return Err(FormErrors::single("text", "comment text may not be empty").into());
        }

        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: post.id.clone(),
            author_id: author.id.clone(),
            text: text.to_string(),
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.comments().create(&record))?;

        Ok(CommentView::assemble(record, author.username.clone()))
    }

    /// Shared create/edit checks. Returns the validated text, the
    /// resolved group (id plus view) and the image, or every field
    /// error at once.
    fn validate_submission(
        &self,
        text: String,
        group: Option<String>,
        image: Option<ImageUpload>,
    ) -> Result<(String, Option<(String, GroupView)>, Option<ImageUpload>)> {
        let mut errors = FormErrors::new();

        if text.trim().is_empty() {
            errors.push("text", "post text may not be empty");
        }

        let slug = group.filter(|slug| !slug.trim().is_empty());
        let group = match slug {
            Some(slug) => {
                let found = self
                    .database
                    .with_repositories(|repos| repos.groups().get_by_slug(&slug))?;
                match found {
                    Some(record) => Some((record.id.clone(), GroupView::from_record(record))),
                    None => {
                        errors.push("group", format!("unknown group '{slug}'"));
                        None
                    }
                }
            }
            None => None,
        };

        if let Some(upload) = &image {
            if !upload.is_image() {
                errors.push("image", "upload is not a recognizable image");
            }
        }

        errors.into_result()?;
        Ok((text, group, image))
    }
}
