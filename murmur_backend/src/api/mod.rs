mod accounts;
mod feeds;
mod follows;
mod media;
mod posts;

use crate::accounts::{AccountService, SESSION_COOKIE};
use crate::cache::PageCache;
use crate::config::MurmurConfig;
use crate::database::models::UserRecord;
use crate::database::Database;
use crate::forms::FormErrors;
use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: MurmurConfig,
    pub database: Database,
    pub cache: Arc<PageCache>,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Form(FormErrors),
    NotFound(String),
    /// Anonymous caller on an auth-only route; rendered as a redirect
    /// to the login page carrying the original path.
    LoginRequired { next: String },
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FormErrors>() {
            Ok(errors) => ApiError::Form(errors),
            Err(err) => ApiError::Internal(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::LoginRequired { next } => {
                Redirect::to(&format!("/auth/login/?next={next}")).into_response()
            }
            ApiError::Form(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        message: "internal server error".into(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// The requesting user, resolved from the session cookie; `None` for
/// anonymous requests.
pub struct Viewer(pub Option<UserRecord>);

impl Viewer {
    /// The signed-in user, or a login redirect pointing back at `next`.
    pub fn require(self, next: &str) -> Result<UserRecord, ApiError> {
        self.0.ok_or_else(|| ApiError::LoginRequired {
            next: next.to_string(),
        })
    }

    pub fn as_user(&self) -> Option<&UserRecord> {
        self.0.as_ref()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match CookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Viewer(None));
        };
        let accounts = AccountService::new(state.database.clone());
        let user = accounts
            .authenticate(cookie.value())
            .map_err(ApiError::Internal)?;
        Ok(Viewer(user))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {uri}"))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(feeds::index))
        .route("/new/", get(posts::new_post_form).post(posts::create_post))
        .route("/follow/", get(feeds::follow_index))
        .route("/group/:slug/", get(feeds::group_index))
        .route("/auth/signup/", post(accounts::signup))
        .route(
            "/auth/login/",
            get(accounts::login_form).post(accounts::login),
        )
        .route("/auth/logout/", post(accounts::logout))
        .route("/media/:file", get(media::download))
        .route("/:username/", get(feeds::profile))
        .route(
            "/:username/follow/",
            get(follows::follow).post(follows::follow),
        )
        .route(
            "/:username/unfollow/",
            get(follows::unfollow).post(follows::unfollow),
        )
        .route("/:username/:post_id/", get(posts::post_detail))
        .route(
            "/:username/:post_id/edit/",
            get(posts::edit_form).post(posts::edit_post),
        )
        .route("/:username/:post_id/comment/", post(posts::add_comment))
        .fallback(fallback)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve_http(config: MurmurConfig, database: Database) -> Result<()> {
    let cache = Arc::new(PageCache::new(config.cache.index_ttl));
    let state = AppState {
        config: config.clone(),
        database,
        cache,
    };
    let router = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
