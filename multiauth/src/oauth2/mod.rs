mod config;
mod errors;
mod main;
mod provider;
mod types;

pub use errors::OAuth2Error;
pub use main::{
    AuthorizationInteraction, AuthorizationPrompt, ChannelInteraction, IdentityProviderAdapter,
    OAuth2Engine, PendingAuthorization, PendingAuthorizations, PkcePair, challenge_for,
    channel_interaction, generate_state_token, generate_verifier_and_challenge,
};
pub use provider::{IdentityProvider, ProviderConfig, ProviderKind};
pub use types::{AuthorizationCallback, AuthorizationRequest, Identity, TokenSet};

pub(crate) use main::verify_state;
