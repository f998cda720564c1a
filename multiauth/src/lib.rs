//! multiauth - multi-provider authentication with a TOTP second factor
//!
//! Users sign in through one of several OAuth2 providers (Google, Twitter/X,
//! GitHub, Facebook, LinkedIn) or with a username and password. Every
//! successful primary sign-in opens a pending session that only becomes
//! usable once the TOTP second factor passes.
//!
//! [`AuthOrchestrator`] is the entry point; build it with
//! [`AuthOrchestrator::from_env`] or assemble the collaborators yourself.

mod config;
mod coordination;
mod oauth2;
mod session;
mod storage;
mod totp;
mod userdb;
mod utils;

pub use config::{AuthSettings, MAX_SESSION_MAX_AGE, OAUTH2_REDIRECT_PATH, ORIGIN, redirect_uri};

pub use coordination::{AuthOrchestrator, AuthenticationResult, CoordinationError};

pub use oauth2::{
    AuthorizationCallback, AuthorizationInteraction, AuthorizationPrompt, AuthorizationRequest,
    ChannelInteraction, Identity, IdentityProvider, IdentityProviderAdapter, OAuth2Engine,
    OAuth2Error, PendingAuthorization, PendingAuthorizations, PkcePair, ProviderConfig,
    ProviderKind, TokenSet, challenge_for, channel_interaction, generate_state_token,
    generate_verifier_and_challenge,
};

pub use session::{Session, SessionError, SessionManager};

pub use storage::{
    CacheData, CacheStore, InMemoryCacheStore, RedisCacheStore, StorageError,
    cache_store_from_env, new_cache_store,
};

pub use totp::{
    CodePrompt, Enrollment, PngQrRenderer, QrRenderer, TwoFactorContext, TwoFactorError,
    TwoFactorService,
};

pub use userdb::{
    Argon2PasswordHasher, InMemoryUserDirectory, PasswordHasher, Role, SqliteUserDirectory, User,
    UserDirectory, UserError, user_directory_from_env,
};

pub use utils::{UtilError, gen_random_string};
