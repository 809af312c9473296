use super::{ApiError, ApiResult, AppState, Viewer};
use crate::feed::{FeedPage, FeedService, GroupFeed, ProfileFeed};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    page: Option<usize>,
}

impl PageParams {
    pub(crate) fn number(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// The index body is cached whole for the configured TTL, so a post
/// published inside the window only shows up after expiry.
pub(crate) async fn index(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let page_number = params.number();
    let cache_key = format!("index:{page_number}");
    if let Some(body) = state.cache.get(&cache_key) {
        return Ok(json_response(body));
    }

    let page = FeedService::new(state.database.clone()).index_page(page_number)?;
    let body = serde_json::to_string(&page).map_err(|err| ApiError::Internal(err.into()))?;
    state.cache.store(&cache_key, body.clone());
    Ok(json_response(body))
}

pub(crate) async fn group_index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<GroupFeed> {
    let service = FeedService::new(state.database.clone());
    match service.group_page(&slug, params.number())? {
        Some(feed) => Ok(Json(feed)),
        None => Err(ApiError::NotFound(format!("group {slug} not found"))),
    }
}

pub(crate) async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
    viewer: Viewer,
) -> ApiResult<ProfileFeed> {
    let service = FeedService::new(state.database.clone());
    match service.profile_page(&username, params.number(), viewer.as_user())? {
        Some(feed) => Ok(Json(feed)),
        None => Err(ApiError::NotFound(format!("user {username} not found"))),
    }
}

pub(crate) async fn follow_index(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    viewer: Viewer,
) -> ApiResult<FeedPage> {
    let user = viewer.require("/follow/")?;
    let page = FeedService::new(state.database.clone()).following_page(&user, params.number())?;
    Ok(Json(page))
}
