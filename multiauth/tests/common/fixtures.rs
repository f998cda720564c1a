use async_trait::async_trait;
use multiauth::{
    Argon2PasswordHasher, AuthOrchestrator, AuthSettings, AuthorizationCallback,
    AuthorizationInteraction, AuthorizationRequest, CodePrompt, Enrollment, IdentityProvider,
    InMemoryCacheStore, InMemoryUserDirectory, OAuth2Engine, PngQrRenderer, ProviderKind,
    SessionManager, TwoFactorService, UserDirectory,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use totp_rs::{Algorithm, Secret, TOTP};

use super::mock_provider::MockProvider;

/// Orchestrator over in-memory stores with all five providers pointed at `mock`.
pub fn orchestrator_with(mock: &MockProvider, settings: AuthSettings) -> AuthOrchestrator {
    let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
    let sessions = SessionManager::new(
        Box::new(InMemoryCacheStore::new()),
        directory.clone(),
        settings.session_max_age,
    );
    let two_factor = TwoFactorService::new(directory.clone(), Arc::new(PngQrRenderer), "multiauth-test");
    let http_timeout = settings.http_timeout;

    let mut orchestrator = AuthOrchestrator::new(
        directory,
        sessions,
        two_factor,
        Arc::new(Argon2PasswordHasher::new()),
        settings,
    );
    for kind in ProviderKind::ALL {
        let provider = IdentityProvider::new(kind, mock.provider_config(kind));
        let engine = OAuth2Engine::new(provider, http_timeout).expect("Failed to build engine");
        orchestrator = orchestrator.with_provider(Arc::new(engine));
    }
    orchestrator
}

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        http_timeout: Duration::from_secs(5),
        interaction_timeout: Duration::from_secs(5),
        ..AuthSettings::default()
    }
}

/// Plays the user approving the consent screen.
///
/// Answers with the state from the authorization URL unless told to forge one,
/// and records every URL it was shown.
#[derive(Default)]
pub struct MockBrowser {
    pub forged_state: Option<String>,
    pub visited: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn forging(state: &str) -> Self {
        Self {
            forged_state: Some(state.to_string()),
            ..Self::default()
        }
    }

    pub fn last_url(&self) -> Option<url::Url> {
        let visited = self.visited.lock().unwrap();
        visited.last().map(|u| url::Url::parse(u).expect("Invalid authorization URL"))
    }
}

#[async_trait]
impl AuthorizationInteraction for MockBrowser {
    async fn authorize(&self, request: &AuthorizationRequest) -> Option<AuthorizationCallback> {
        self.visited.lock().unwrap().push(request.url.clone());
        Some(AuthorizationCallback {
            code: "mock-authorization-code".to_string(),
            state: self
                .forged_state
                .clone()
                .unwrap_or_else(|| request.state.clone()),
        })
    }
}

/// Authenticator app that keeps the enrolled secret.
pub struct MockAuthenticator {
    secret: Mutex<Option<String>>,
    tamper: bool,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self {
            secret: Mutex::new(None),
            tamper: false,
        }
    }

    pub fn tampering() -> Self {
        Self {
            secret: Mutex::new(None),
            tamper: true,
        }
    }

    pub fn secret(&self) -> Option<String> {
        self.secret.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodePrompt for MockAuthenticator {
    async fn request_code(&self, enrollment: Option<&Enrollment>) -> Option<String> {
        let mut secret = self.secret.lock().unwrap();
        if let Some(enrollment) = enrollment {
            assert!(enrollment.provisioning_uri.starts_with("otpauth://totp/"));
            *secret = Some(enrollment.secret.clone());
        }
        let code = current_code(secret.as_deref()?);
        if self.tamper {
            Some(tampered(&code))
        } else {
            Some(code)
        }
    }
}

pub fn current_code(secret: &str) -> String {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .expect("Invalid base32 secret");
    TOTP::new_unchecked(Algorithm::SHA1, 6, 0, 30, bytes, None, String::new())
        .generate_current()
        .expect("System clock before UNIX epoch")
}

/// Same code with every digit shifted, so it can never collide with a valid one
pub fn tampered(code: &str) -> String {
    code.bytes()
        .map(|b| char::from(b'0' + (b - b'0' + 5) % 10))
        .collect()
}
