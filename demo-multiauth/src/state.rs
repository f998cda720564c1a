use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use multiauth::{
    AuthOrchestrator, AuthenticationResult, CodePrompt, CoordinationError, Enrollment,
    PendingAuthorization,
};

/// OAuth2 attempt waiting for the browser to come back to `/auth/callback`
pub(crate) struct OAuthAttempt {
    pub(crate) pending: PendingAuthorization,
    pub(crate) task: JoinHandle<Result<AuthenticationResult, CoordinationError>>,
}

/// Second-factor step waiting for the code form
pub(crate) struct SecondFactorAttempt {
    pub(crate) code_tx: oneshot::Sender<String>,
    pub(crate) task: JoinHandle<Result<bool, CoordinationError>>,
}

pub(crate) struct AppState {
    pub(crate) orchestrator: Arc<AuthOrchestrator>,
    /// Keyed by OAuth2 state token
    pub(crate) oauth_attempts: Mutex<HashMap<String, OAuthAttempt>>,
    /// Keyed by session id
    pub(crate) second_factor: Mutex<HashMap<String, SecondFactorAttempt>>,
}

impl AppState {
    pub(crate) fn new(orchestrator: AuthOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            oauth_attempts: Mutex::new(HashMap::new()),
            second_factor: Mutex::new(HashMap::new()),
        }
    }

    /// Drop attempts whose task already ended (timed out or abandoned)
    pub(crate) async fn purge_finished(&self) {
        self.oauth_attempts
            .lock()
            .await
            .retain(|_, attempt| !attempt.task.is_finished());
        self.second_factor
            .lock()
            .await
            .retain(|_, attempt| !attempt.task.is_finished());
    }
}

/// [`CodePrompt`] bridged to two HTTP requests: the page that shows the
/// enrollment and the form post that carries the code.
pub(crate) struct WebCodePrompt {
    shown: Mutex<Option<oneshot::Sender<Option<Enrollment>>>>,
    code: Mutex<Option<oneshot::Receiver<String>>>,
    timeout: Duration,
}

impl WebCodePrompt {
    /// Returns the prompt, the receiver for what to display and the sender for the code.
    pub(crate) fn new(
        timeout: Duration,
    ) -> (
        Self,
        oneshot::Receiver<Option<Enrollment>>,
        oneshot::Sender<String>,
    ) {
        let (shown_tx, shown_rx) = oneshot::channel();
        let (code_tx, code_rx) = oneshot::channel();
        let prompt = Self {
            shown: Mutex::new(Some(shown_tx)),
            code: Mutex::new(Some(code_rx)),
            timeout,
        };
        (prompt, shown_rx, code_tx)
    }
}

#[async_trait]
impl CodePrompt for WebCodePrompt {
    async fn request_code(&self, enrollment: Option<&Enrollment>) -> Option<String> {
        let shown = self.shown.lock().await.take()?;
        if shown.send(enrollment.cloned()).is_err() {
            return None;
        }
        let code = self.code.lock().await.take()?;
        match tokio::time::timeout(self.timeout, code).await {
            Ok(Ok(code)) => Some(code),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::info!("Second-factor code not submitted in time");
                None
            }
        }
    }
}
