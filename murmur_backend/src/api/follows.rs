use super::{ApiError, AppState, Viewer};
use crate::follows::FollowService;
use axum::extract::{Path, State};
use axum::response::Redirect;

pub(crate) async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    viewer: Viewer,
) -> Result<Redirect, ApiError> {
    let user = viewer.require(&format!("/{username}/follow/"))?;
    let service = FollowService::new(state.database.clone());
    match service.follow(&user, &username)? {
        Some(()) => Ok(Redirect::to(&format!("/{username}/"))),
        None => Err(ApiError::NotFound(format!("user {username} not found"))),
    }
}

pub(crate) async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    viewer: Viewer,
) -> Result<Redirect, ApiError> {
    let user = viewer.require(&format!("/{username}/unfollow/"))?;
    let service = FollowService::new(state.database.clone());
    match service.unfollow(&user, &username)? {
        Some(()) => Ok(Redirect::to(&format!("/{username}/"))),
        None => Err(ApiError::NotFound(format!("user {username} not found"))),
    }
}
