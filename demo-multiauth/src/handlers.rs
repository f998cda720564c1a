use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, headers};
use serde::Deserialize;
use std::sync::Arc;

use multiauth::{
    AuthenticationResult, AuthorizationCallback, ORIGIN, ProviderKind, channel_interaction,
};

use crate::error::IntoResponseError;
use crate::pages;
use crate::state::{AppState, OAuthAttempt, SecondFactorAttempt, WebCodePrompt};

pub(crate) const SESSION_COOKIE_NAME: &str = "multiauth_session";

type HandlerResult<T> = Result<T, (StatusCode, String)>;

#[derive(Deserialize)]
pub(crate) struct MessageQuery {
    message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CallbackQuery {
    code: Option<String>,
    state: String,
    error: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct CodeForm {
    code: String,
}

pub(crate) async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
) -> HandlerResult<Html<String>> {
    pages::index(&state.orchestrator.providers(), query.message.as_deref())
}

/// Start an OAuth2 attempt and send the browser to the provider.
///
/// The attempt itself runs as a task inside the orchestrator; this handler
/// only waits until it has produced the authorization URL.
pub(crate) async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> HandlerResult<Redirect> {
    let kind: ProviderKind = provider
        .parse()
        .map_err(|_| (StatusCode::NOT_FOUND, format!("Unknown provider: {provider}")))?;

    state.purge_finished().await;

    let (interaction, mut prompts) = channel_interaction(1);
    let orchestrator = state.orchestrator.clone();
    let task = tokio::spawn(async move {
        orchestrator
            .authenticate_with_oauth(kind, &interaction)
            .await
    });

    let Some(pending) = prompts.next().await else {
        // The attempt ended before asking for the browser
        let result = task.await.into_response_error()?.into_response_error()?;
        tracing::warn!(%kind, ?result, "OAuth2 attempt ended without a prompt");
        return Ok(Redirect::to(&failure_location("Sign-in is not available")));
    };

    let url = pending.prompt.url.clone();
    state
        .oauth_attempts
        .lock()
        .await
        .insert(pending.prompt.state.clone(), OAuthAttempt { pending, task });

    Ok(Redirect::to(&url))
}

pub(crate) async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> HandlerResult<Response> {
    let Some(attempt) = state.oauth_attempts.lock().await.remove(&query.state) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Unknown or expired sign-in attempt".to_string(),
        ));
    };

    match (query.code, query.error) {
        (Some(code), None) => {
            if !attempt.pending.complete(AuthorizationCallback {
                code,
                state: query.state,
            }) {
                tracing::debug!("Attempt ended before the callback arrived");
            }
        }
        (_, error) => {
            tracing::info!(?error, "Provider returned without a code");
            attempt.pending.cancel();
        }
    }

    let result = attempt
        .task
        .await
        .into_response_error()?
        .into_response_error()?;
    Ok(finish_primary(&state, result))
}

pub(crate) async fn password_login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> HandlerResult<Response> {
    let result = state
        .orchestrator
        .authenticate_with_password(&form.username, &form.password)
        .await
        .into_response_error()?;
    Ok(finish_primary(&state, result))
}

/// Show the enrollment (first time) or the code form.
pub(crate) async fn two_factor_page(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> HandlerResult<Response> {
    let Some(session_id) = session_cookie(cookies.as_ref()) else {
        return Ok(Redirect::to("/").into_response());
    };

    state.purge_finished().await;
    if state.second_factor.lock().await.contains_key(&session_id) {
        // Reload while a code is outstanding; the secret is not shown twice
        return Ok(pages::two_factor(None)?.into_response());
    }

    let (prompt, shown, code_tx) =
        WebCodePrompt::new(state.orchestrator.settings().interaction_timeout);
    let orchestrator = state.orchestrator.clone();
    let task_session = session_id.clone();
    let task = tokio::spawn(async move {
        orchestrator
            .complete_second_factor(&task_session, &prompt)
            .await
    });

    match shown.await {
        Ok(enrollment) => {
            state
                .second_factor
                .lock()
                .await
                .insert(session_id, SecondFactorAttempt { code_tx, task });
            Ok(pages::two_factor(enrollment.as_ref())?.into_response())
        }
        Err(_) => {
            // The gate finished without prompting, e.g. the session expired
            if let Err(e) = task.await.into_response_error()? {
                tracing::warn!("Second factor could not start: {}", e.log());
            }
            Ok(signed_out("Please sign in again"))
        }
    }
}

pub(crate) async fn two_factor_submit(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<headers::Cookie>>,
    Form(form): Form<CodeForm>,
) -> HandlerResult<Response> {
    let Some(session_id) = session_cookie(cookies.as_ref()) else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(attempt) = state.second_factor.lock().await.remove(&session_id) else {
        return Ok(Redirect::to("/auth/2fa").into_response());
    };

    if attempt.code_tx.send(form.code).is_err() {
        tracing::debug!("Second-factor step ended before the code arrived");
    }

    let passed = attempt
        .task
        .await
        .into_response_error()?
        .into_response_error()?;
    if passed {
        Ok(Redirect::to("/protected").into_response())
    } else {
        Ok(signed_out("Invalid code"))
    }
}

pub(crate) async fn protected(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> HandlerResult<Response> {
    let Some(session_id) = session_cookie(cookies.as_ref()) else {
        return Ok(Redirect::to("/").into_response());
    };

    let orchestrator = &state.orchestrator;
    let allowed = orchestrator
        .authorize_action(&session_id, "reviews", "read")
        .await
        .into_response_error()?;
    if !allowed {
        return Ok(Redirect::to("/").into_response());
    }

    let session = orchestrator
        .sessions()
        .get_session(&session_id)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;
    let user = orchestrator
        .directory()
        .get_user_by_id(&session.user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    tracing::trace!(user_id = %user.user_id, role = %user.role, "Serving protected page");
    Ok(pages::protected(&user.username, user.role)?.into_response())
}

pub(crate) async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> HandlerResult<Response> {
    if let Some(session_id) = session_cookie(cookies.as_ref()) {
        let ended = state
            .orchestrator
            .logout(&session_id)
            .await
            .into_response_error()?;
        tracing::debug!(ended, "Logout");
    }
    Ok(signed_out("Signed out"))
}

/// Set the session cookie and continue to the second factor, or report failure.
fn finish_primary(state: &AppState, result: AuthenticationResult) -> Response {
    if !result.authentication_succeeded {
        return Redirect::to(&failure_location("Sign-in failed")).into_response();
    }

    let max_age = state.orchestrator.sessions().max_age().as_secs();
    let cookie = format!(
        "{SESSION_COOKIE_NAME}={}; {}; Max-Age={max_age}",
        result.session_id,
        cookie_attributes(&ORIGIN)
    );
    (cookie_headers(&cookie), Redirect::to("/auth/2fa")).into_response()
}

fn signed_out(message: &str) -> Response {
    let cookie = format!(
        "{SESSION_COOKIE_NAME}=; {}; Max-Age=0",
        cookie_attributes(&ORIGIN)
    );
    (cookie_headers(&cookie), Redirect::to(&failure_location(message))).into_response()
}

/// `Secure` is set whenever the app is served over https
fn cookie_attributes(origin: &str) -> String {
    let secure = if origin.starts_with("https://") {
        "; Secure"
    } else {
        ""
    };
    format!("Path=/; HttpOnly; SameSite=Lax{secure}")
}

fn cookie_headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.insert(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Invalid cookie header: {}", e),
    }
    headers
}

fn failure_location(message: &str) -> String {
    format!("/?message={}", urlencoding::encode(message))
}

fn session_cookie(cookies: Option<&TypedHeader<headers::Cookie>>) -> Option<String> {
    cookies?
        .get(SESSION_COOKIE_NAME)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
