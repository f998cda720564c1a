//! The user-facing half of an authorization attempt.
//!
//! The orchestrator hands an [`AuthorizationRequest`] to an
//! [`AuthorizationInteraction`] and waits for the redirect parameters. A host
//! application with a browser redirect flow uses [`channel_interaction`]: the
//! pending attempt is delivered over a channel and completed from the callback
//! handler. Dropping a [`PendingAuthorization`] cancels the attempt.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::oauth2::provider::ProviderKind;
use crate::oauth2::types::{AuthorizationCallback, AuthorizationRequest};

/// Presents the authorization URL and returns what the provider redirected back with.
///
/// `None` means the user cancelled or closed the dialog.
#[async_trait]
pub trait AuthorizationInteraction: Send + Sync {
    async fn authorize(&self, request: &AuthorizationRequest) -> Option<AuthorizationCallback>;
}

/// Public view of an attempt: everything except the PKCE verifier.
#[derive(Debug, Clone)]
pub struct AuthorizationPrompt {
    pub provider: ProviderKind,
    pub url: String,
    pub state: String,
}

/// An attempt waiting for the provider redirect.
#[derive(Debug)]
pub struct PendingAuthorization {
    pub prompt: AuthorizationPrompt,
    responder: oneshot::Sender<AuthorizationCallback>,
}

impl PendingAuthorization {
    /// Deliver the redirect parameters. Returns false if the attempt is gone
    /// (timed out or the orchestrator gave up).
    pub fn complete(self, callback: AuthorizationCallback) -> bool {
        self.responder.send(callback).is_ok()
    }

    pub fn cancel(self) {
        tracing::debug!(state = %self.prompt.state, "Authorization cancelled by host");
    }
}

#[derive(Debug, Clone)]
pub struct ChannelInteraction {
    tx: mpsc::Sender<PendingAuthorization>,
}

#[derive(Debug)]
pub struct PendingAuthorizations {
    rx: mpsc::Receiver<PendingAuthorization>,
}

impl PendingAuthorizations {
    /// Next attempt that needs the user; `None` once every [`ChannelInteraction`] is dropped.
    pub async fn next(&mut self) -> Option<PendingAuthorization> {
        self.rx.recv().await
    }
}

/// Create a channel-backed interaction and the receiving side the host drives.
pub fn channel_interaction(buffer: usize) -> (ChannelInteraction, PendingAuthorizations) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (ChannelInteraction { tx }, PendingAuthorizations { rx })
}

#[async_trait]
impl AuthorizationInteraction for ChannelInteraction {
    async fn authorize(&self, request: &AuthorizationRequest) -> Option<AuthorizationCallback> {
        let (responder, response) = oneshot::channel();
        let pending = PendingAuthorization {
            prompt: AuthorizationPrompt {
                provider: request.provider,
                url: request.url.clone(),
                state: request.state.clone(),
            },
            responder,
        };

        if self.tx.send(pending).await.is_err() {
            tracing::warn!("No host is listening for authorization prompts");
            return None;
        }

        response.await.ok()
    }
}
