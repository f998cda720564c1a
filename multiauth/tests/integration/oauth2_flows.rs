use crate::common::{
    Behavior, MockAuthenticator, MockBrowser, MockProvider, TestProfile, orchestrator_with,
    test_settings,
};
use multiauth::{AuthenticationResult, Identity, ProviderKind, User, challenge_for};

/// Failed token exchange ends in a failed result for every provider
#[tokio::test]
async fn test_failed_exchange_for_every_provider() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    for behavior in [
        Behavior::RejectToken,
        Behavior::MalformedToken,
        Behavior::ErrorPayload,
    ] {
        mock.set_behavior(behavior);
        for kind in ProviderKind::ALL {
            let result = orchestrator
                .authenticate_with_oauth(kind, &MockBrowser::default())
                .await
                .unwrap();
            assert_eq!(
                result,
                AuthenticationResult::failed(),
                "{kind} with {behavior:?}"
            );
            assert!(result.session_id.is_empty());
        }
    }

    assert!(
        orchestrator
            .directory()
            .get_user_by_username("testuser")
            .await
            .unwrap()
            .is_none(),
        "A failed sign-in must not create users"
    );
}

#[tokio::test]
async fn test_unreachable_provider_fails() {
    let mock = MockProvider::start().await;
    let mut settings = test_settings();
    settings.http_timeout = std::time::Duration::from_secs(2);
    let orchestrator = orchestrator_with(&mock, settings);

    let mut config = mock.provider_config(ProviderKind::Google);
    config.token_url = "http://127.0.0.1:9/token".to_string();
    let engine = multiauth::OAuth2Engine::new(
        multiauth::IdentityProvider::new(ProviderKind::Google, config),
        std::time::Duration::from_secs(2),
    )
    .unwrap();
    let orchestrator = orchestrator.with_provider(std::sync::Arc::new(engine));

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Google, &MockBrowser::default())
        .await
        .unwrap();
    assert!(!result.authentication_succeeded);
}

/// GitHub sign-in for a login that already exists resolves to that user
#[tokio::test]
async fn test_github_existing_user() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    let existing = orchestrator
        .directory()
        .create_user(User::new(
            "user-x".to_string(),
            "testuser".to_string(),
            String::new(),
        ))
        .await
        .unwrap();

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::GitHub, &MockBrowser::default())
        .await
        .unwrap();

    assert!(result.authentication_succeeded);
    assert!(!result.is_new_account);
    assert_eq!(result.oauth_token, "mock-token-github");

    let session = orchestrator
        .sessions()
        .get_session_by_user_id(&existing.user_id)
        .await
        .unwrap();
    assert_eq!(session.session_id, result.session_id);
    assert!(!session.is_active, "Session stays pending until 2FA");

    let refreshed = orchestrator
        .directory()
        .get_user_by_id("user-x")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.email_address, "testuser@example.com");
}

#[tokio::test]
async fn test_github_new_user() {
    let mock = MockProvider::start().await;
    mock.set_profile(TestProfile {
        subject: "777".to_string(),
        login: "newcomer".to_string(),
        email: "newcomer@example.com".to_string(),
    });
    let orchestrator = orchestrator_with(&mock, test_settings());

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::GitHub, &MockBrowser::default())
        .await
        .unwrap();
    assert!(result.authentication_succeeded);
    assert!(result.is_new_account);

    let user = orchestrator
        .directory()
        .get_user_by_username("newcomer")
        .await
        .unwrap()
        .expect("User should have been created");
    assert_eq!(user.email_address, "newcomer@example.com");
    assert!(user.password_hash.is_none());
    assert!(!user.has_two_factor());

    // Second sign-in resolves to the same account
    let again = orchestrator
        .authenticate_with_oauth(ProviderKind::GitHub, &MockBrowser::default())
        .await
        .unwrap();
    assert!(again.authentication_succeeded);
    assert!(!again.is_new_account);
    assert_ne!(again.session_id, result.session_id);
    assert!(
        !orchestrator
            .sessions()
            .validate_session(&result.session_id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_every_provider_signs_in_and_passes_second_factor() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    for (i, kind) in ProviderKind::ALL.into_iter().enumerate() {
        mock.set_profile(TestProfile {
            subject: format!("{}", 1000 + i),
            login: format!("{kind}-user"),
            email: format!("{kind}@example.com"),
        });

        let result = orchestrator
            .authenticate_with_oauth(kind, &MockBrowser::default())
            .await
            .unwrap();
        assert!(result.authentication_succeeded, "{kind}");
        assert!(result.is_new_account, "{kind}");

        let passed = orchestrator
            .complete_second_factor(&result.session_id, &MockAuthenticator::new())
            .await
            .unwrap();
        assert!(passed, "{kind}");
        assert!(
            orchestrator
                .authorize_action(&result.session_id, "reviews", "create")
                .await
                .unwrap()
        );
    }
}

#[tokio::test]
async fn test_pkce_and_client_secret_on_the_wire() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    for kind in [ProviderKind::Twitter, ProviderKind::GitHub] {
        let browser = MockBrowser::default();
        let result = orchestrator
            .authenticate_with_oauth(kind, &browser)
            .await
            .unwrap();
        assert!(result.authentication_succeeded);

        let url = browser.last_url().unwrap();
        let challenge = url
            .query_pairs()
            .find(|(k, _)| k == "code_challenge")
            .map(|(_, v)| v.to_string());

        let (provider, form) = mock.token_requests().pop().unwrap();
        assert_eq!(provider, kind.as_str());
        assert_eq!(form.get("grant_type").unwrap(), "authorization_code");
        assert_eq!(form.get("code").unwrap(), "mock-authorization-code");

        match kind {
            ProviderKind::Twitter => {
                let verifier = form.get("code_verifier").expect("Verifier missing");
                assert_eq!(challenge, Some(challenge_for(verifier)));
                assert!(!form.contains_key("client_secret"));
            }
            _ => {
                assert!(challenge.is_none());
                assert!(!form.contains_key("code_verifier"));
                assert_eq!(form.get("client_secret").unwrap(), "test-secret");
            }
        }
    }
}

#[tokio::test]
async fn test_forged_state_is_rejected_before_exchange() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Google, &MockBrowser::forging("attacker"))
        .await
        .unwrap();
    assert!(!result.authentication_succeeded);
    assert!(mock.token_requests().is_empty());
}

/// Providers without an ID token cannot sign in while the profile endpoint is down
#[tokio::test]
async fn test_profile_outage_fails_sign_in() {
    let mock = MockProvider::start().await;
    mock.set_behavior(Behavior::ProfileUnavailable);
    let orchestrator = orchestrator_with(&mock, test_settings());

    for kind in [ProviderKind::Twitter, ProviderKind::GitHub, ProviderKind::Facebook] {
        let result = orchestrator
            .authenticate_with_oauth(kind, &MockBrowser::default())
            .await
            .unwrap();
        assert!(!result.authentication_succeeded, "{kind}");
    }
}

/// OIDC providers fall back to the ID token claims when the profile endpoint is down
#[tokio::test]
async fn test_profile_outage_falls_back_to_id_token() {
    let mock = MockProvider::start().await;
    mock.set_behavior(Behavior::ProfileUnavailable);
    let orchestrator = orchestrator_with(&mock, test_settings());

    for (kind, subject) in [(ProviderKind::Google, "g-1"), (ProviderKind::LinkedIn, "l-1")] {
        mock.set_profile(TestProfile {
            subject: subject.to_string(),
            login: format!("{kind}-claims"),
            email: format!("{kind}-claims@example.com"),
        });

        let result = orchestrator
            .authenticate_with_oauth(kind, &MockBrowser::default())
            .await
            .unwrap();
        assert!(result.authentication_succeeded, "{kind}");
        assert!(result.is_new_account, "{kind}");

        let user = orchestrator
            .directory()
            .get_user_by_username(&format!("{kind}-claims"))
            .await
            .unwrap()
            .expect("User from id_token claims");
        let expected = Identity {
            provider_name: kind.to_string(),
            provider_subject_id: subject.to_string(),
            display_name: String::new(),
            email_address: String::new(),
        };
        assert_eq!(user.user_id, expected.local_id());
        assert_eq!(user.email_address, format!("{kind}-claims@example.com"));
    }
}

/// A profile without a name is completed from the ID token; without one the sign-in fails
#[tokio::test]
async fn test_incomplete_profile() {
    let mock = MockProvider::start().await;
    mock.set_behavior(Behavior::IncompleteProfile);
    let orchestrator = orchestrator_with(&mock, test_settings());

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Google, &MockBrowser::default())
        .await
        .unwrap();
    assert!(result.authentication_succeeded);
    assert!(
        orchestrator
            .directory()
            .get_user_by_username("testuser")
            .await
            .unwrap()
            .is_some()
    );

    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Twitter, &MockBrowser::default())
        .await
        .unwrap();
    assert!(!result.authentication_succeeded);
}

#[tokio::test]
async fn test_token_shortcut() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());

    let result = orchestrator
        .authenticate_with_token(ProviderKind::LinkedIn, "testuser@example.com", "mock-token-linkedin")
        .await
        .unwrap();
    assert!(result.authentication_succeeded);
    assert_eq!(result.oauth_token, "mock-token-linkedin");

    let wrong_token = orchestrator
        .authenticate_with_token(ProviderKind::LinkedIn, "", "stolen")
        .await
        .unwrap();
    assert!(!wrong_token.authentication_succeeded);

    let wrong_identifier = orchestrator
        .authenticate_with_token(ProviderKind::LinkedIn, "mallory", "mock-token-linkedin")
        .await
        .unwrap();
    assert!(!wrong_identifier.authentication_succeeded);
}

#[tokio::test]
async fn test_concurrent_first_sign_ins_create_one_user() {
    let mock = MockProvider::start().await;
    let orchestrator = std::sync::Arc::new(orchestrator_with(&mock, test_settings()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            orchestrator
                .authenticate_with_oauth(ProviderKind::Google, &MockBrowser::default())
                .await
                .unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.authentication_succeeded);
        if result.is_new_account {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}
