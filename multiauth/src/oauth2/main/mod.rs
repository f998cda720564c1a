mod engine;
mod idtoken;
mod interaction;
mod pkce;

pub use engine::{IdentityProviderAdapter, OAuth2Engine};
pub use interaction::{
    AuthorizationInteraction, AuthorizationPrompt, ChannelInteraction, PendingAuthorization,
    PendingAuthorizations, channel_interaction,
};
pub use pkce::{PkcePair, challenge_for, generate_state_token, generate_verifier_and_challenge};

pub(crate) use pkce::verify_state;
