use super::{ApiError, AppState};
use crate::accounts::{AccountService, SESSION_COOKIE};
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct NextParams {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginFormContext {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupForm {
    username: String,
    password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}

/// Only relative targets are honored, so a crafted `next` cannot send
/// the browser off-site.
fn redirect_target(next: Option<String>) -> String {
    next.filter(|target| target.starts_with('/'))
        .unwrap_or_else(|| "/".to_string())
}

pub(crate) async fn login_form(Query(params): Query<NextParams>) -> Json<LoginFormContext> {
    Json(LoginFormContext { next: params.next })
}

pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let service = AccountService::new(state.database.clone());
    let session = service.login(&form.username, &form.password)?;

    let jar = jar.add(session_cookie(session.token));
    let target = redirect_target(form.next);
    Ok((jar, Redirect::to(&target)))
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        AccountService::new(state.database.clone())
            .logout(cookie.value())
            .map_err(ApiError::Internal)?;
    }
    let jar = jar.remove(session_cookie(String::new()));
    Ok((jar, Redirect::to("/")))
}

/// Creates the account and signs it straight in.
pub(crate) async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let service = AccountService::new(state.database.clone());
    service.signup(&form.username, &form.password)?;
    let session = service.login(&form.username, &form.password)?;

    let jar = jar.add(session_cookie(session.token));
    Ok((jar, Redirect::to("/")))
}
