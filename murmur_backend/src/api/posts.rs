use super::{ApiError, ApiResult, AppState, Viewer};
use crate::groups::{GroupService, GroupView};
use crate::media::ImageUpload;
use crate::posting::{
    CreatePostInput, EditOutcome, EditPostInput, PostDetail, PostService, PostView,
};
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct PostForm {
    text: String,
    #[serde(default)]
    group: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PostFormContext {
    /// Group choices for the form's group field.
    groups: Vec<GroupView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditFormContext {
    post: PostView,
    groups: Vec<GroupView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentForm {
    text: String,
}

/// Post submissions arrive as multipart: a `json` part with the text
/// and group slug, and an optional `image` part with the upload.
async fn read_submission(
    mut multipart: Multipart,
) -> Result<(PostForm, Option<ImageUpload>), ApiError> {
    let mut form: Option<PostForm> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "json" {
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            let parsed: PostForm =
                serde_json::from_slice(&data).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            form = Some(parsed);
        } else if name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            if !data.is_empty() {
                image = Some(ImageUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
        }
    }

    let form = form.ok_or(ApiError::BadRequest("missing json field".into()))?;
    Ok((form, image))
}

pub(crate) async fn new_post_form(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ApiResult<PostFormContext> {
    let _user = viewer.require("/new/")?;
    let groups = GroupService::new(state.database.clone()).list()?;
    Ok(Json(PostFormContext { groups }))
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let user = viewer.require("/new/")?;
    let (form, image) = read_submission(multipart).await?;

    let service = PostService::new(state.database.clone(), state.config.paths.clone());
    service.create_post(
        &user,
        CreatePostInput {
            text: form.text,
            group: form.group,
            image,
        },
    )?;

    Ok(Redirect::to("/"))
}

pub(crate) async fn post_detail(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> ApiResult<PostDetail> {
    let service = PostService::new(state.database.clone(), state.config.paths.clone());
    match service.detail(&username, &post_id)? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound(format!(
            "post {post_id} by {username} not found"
        ))),
    }
}

pub(crate) async fn edit_form(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    viewer: Viewer,
) -> Result<Response, ApiError> {
    let next = format!("/{username}/{post_id}/edit/");
    let user = viewer.require(&next)?;

    let service = PostService::new(state.database.clone(), state.config.paths.clone());
    let Some(post) = service.find_by_route(&username, &post_id)? else {
        return Err(ApiError::NotFound(format!(
            "post {post_id} by {username} not found"
        )));
    };
    if post.author_id != user.id {
        return Ok(Redirect::to(&format!("/{username}/{post_id}/")).into_response());
    }

    let Some(detail) = service.detail(&username, &post_id)? else {
        return Err(ApiError::NotFound(format!(
            "post {post_id} by {username} not found"
        )));
    };
    let groups = GroupService::new(state.database.clone()).list()?;
    Ok(Json(EditFormContext {
        post: detail.post,
        groups,
    })
    .into_response())
}

pub(crate) async fn edit_post(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let next = format!("/{username}/{post_id}/edit/");
    let user = viewer.require(&next)?;
    let (form, image) = read_submission(multipart).await?;

    let service = PostService::new(state.database.clone(), state.config.paths.clone());
    let Some(post) = service.find_by_route(&username, &post_id)? else {
        return Err(ApiError::NotFound(format!(
            "post {post_id} by {username} not found"
        )));
    };

    let outcome = service.edit_post(
        &user,
        &post,
        EditPostInput {
            text: form.text,
            group: form.group,
            image,
        },
    )?;
    if let EditOutcome::NotAuthor = outcome {
        tracing::debug!(post_id = %post.id, user = %user.username, "edit refused, not the author");
    }

    Ok(Redirect::to(&format!("/{username}/{post_id}/")))
}

pub(crate) async fn add_comment(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    viewer: Viewer,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, ApiError> {
    let next = format!("/{username}/{post_id}/comment/");
    let user = viewer.require(&next)?;

    let service = PostService::new(state.database.clone(), state.config.paths.clone());
    let Some(post) = service.find_by_route(&username, &post_id)? else {
        return Err(ApiError::NotFound(format!(
            "post {post_id} by {username} not found"
        )));
    };
    service.add_comment(&user, &post, &form.text)?;

    Ok(Redirect::to(&format!("/{username}/{post_id}/")))
}
