//! Axum-based mock of the token and profile endpoints of all five providers
//!
//! Each test starts its own server on an ephemeral port, so tests never share
//! provider state and can switch failure modes freely. Google and LinkedIn
//! token responses carry an unsigned `id_token` with the same profile claims.

use axum::{
    Router,
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use multiauth::{ProviderConfig, ProviderKind};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub const CALLBACK_URL: &str = "http://localhost:3001/auth/callback";

/// How the token and profile endpoints answer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Healthy,
    /// 400 with an OAuth2 error body
    RejectToken,
    /// 200 with a body that is not JSON
    MalformedToken,
    /// 200 with an `error` field, as GitHub does for bad codes
    ErrorPayload,
    /// Token works, profile endpoint answers 503
    ProfileUnavailable,
    /// Profile carries the subject id only
    IncompleteProfile,
}

/// Profile the mock providers report for the signed-in account
#[derive(Clone, Debug)]
pub struct TestProfile {
    pub subject: String,
    pub login: String,
    pub email: String,
}

impl Default for TestProfile {
    fn default() -> Self {
        Self {
            subject: "4242".to_string(),
            login: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct MockState {
    behavior: Arc<Mutex<Behavior>>,
    profile: Arc<Mutex<TestProfile>>,
    token_requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

pub struct MockProvider {
    pub base_url: String,
    state: MockState,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/{provider}/token", post(token))
            .route("/{provider}/profile", get(profile))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock provider");
        let addr = listener.local_addr().expect("Mock provider has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock provider stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    pub fn set_profile(&self, profile: TestProfile) {
        *self.state.profile.lock().unwrap() = profile;
    }

    /// Form bodies received by the token endpoint, with the provider path segment
    pub fn token_requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.state.token_requests.lock().unwrap().clone()
    }

    /// Provider defaults with the token and profile endpoints pointed at this server
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        let mut config = ProviderConfig::new(
            kind,
            format!("{kind}-client"),
            Some("test-secret".to_string()),
            CALLBACK_URL,
        );
        config.token_url = format!("{}/{kind}/token", self.base_url);
        config.profile_url = format!("{}/{kind}/profile", self.base_url);
        config
    }
}

async fn token(
    Path(provider): Path<String>,
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let code = form.get("code").cloned().unwrap_or_default();
    state
        .token_requests
        .lock()
        .unwrap()
        .push((provider.clone(), form));

    let behavior = *state.behavior.lock().unwrap();
    match behavior {
        Behavior::RejectToken => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Bad code"})),
        )
            .into_response(),
        Behavior::MalformedToken => (StatusCode::OK, "<html>Service moved</html>").into_response(),
        Behavior::ErrorPayload => Json(json!({"error": "bad_verification_code"})).into_response(),
        Behavior::Healthy | Behavior::ProfileUnavailable | Behavior::IncompleteProfile => {
            if code.is_empty() {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_request"})),
                )
                    .into_response();
            }
            let mut body = json!({
                "access_token": format!("mock-token-{provider}"),
                "token_type": "bearer",
                "expires_in": 3600,
            });
            if matches!(provider.as_str(), "google" | "linkedin") {
                let profile = state.profile.lock().unwrap().clone();
                body["id_token"] = Value::String(id_token(&profile));
            }
            Json(body).into_response()
        }
    }
}

async fn profile(
    Path(provider): Path<String>,
    State(state): State<MockState>,
    headers: HeaderMap,
) -> Response {
    let expected = format!("Bearer mock-token-{provider}");
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let behavior = *state.behavior.lock().unwrap();
    let profile = state.profile.lock().unwrap().clone();
    match behavior {
        Behavior::ProfileUnavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Behavior::IncompleteProfile => Json(subject_only_json(&provider, &profile)).into_response(),
        _ => Json(profile_json(&provider, &profile)).into_response(),
    }
}

/// Unsigned JWT whose payload mirrors the OIDC profile
fn id_token(profile: &TestProfile) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = json!({
        "iss": "https://mock-provider.test",
        "sub": profile.subject,
        "name": profile.login,
        "email": profile.email,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.bW9jay1zaWduYXR1cmU")
}

fn subject_only_json(provider: &str, profile: &TestProfile) -> Value {
    match provider {
        "twitter" => json!({"data": {"id": profile.subject}}),
        "github" | "facebook" => json!({"id": profile.subject}),
        _ => json!({"sub": profile.subject}),
    }
}

/// Profile payload in each provider's own shape
fn profile_json(provider: &str, profile: &TestProfile) -> Value {
    match provider {
        "twitter" => json!({
            "data": {"id": profile.subject, "name": "Test User", "username": profile.login}
        }),
        "github" => json!({
            "id": profile.subject.parse::<u64>().ok(),
            "login": profile.login,
            "email": profile.email,
        }),
        "facebook" => json!({
            "id": profile.subject,
            "name": profile.login,
            "email": profile.email,
        }),
        _ => json!({
            "sub": profile.subject,
            "name": profile.login,
            "email": profile.email,
            "email_verified": true,
        }),
    }
}
