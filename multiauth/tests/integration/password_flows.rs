use crate::common::{MockAuthenticator, MockProvider, orchestrator_with, test_settings};
use multiauth::{AuthenticationResult, PasswordHasher, Argon2PasswordHasher, Role, User};

async fn seed_user(orchestrator: &multiauth::AuthOrchestrator, username: &str, password: &str) -> User {
    let mut user = User::new(
        format!("id-{username}"),
        username.to_string(),
        format!("{username}@example.com"),
    );
    user.password_hash = Some(Argon2PasswordHasher::new().hash(password).unwrap());
    orchestrator.directory().create_user(user).await.unwrap()
}

#[tokio::test]
async fn test_basic_auth_then_second_factor() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let user = seed_user(&orchestrator, "carol", "correct horse").await;

    let result = orchestrator
        .authenticate_with_password("carol", "correct horse")
        .await
        .unwrap();
    assert!(result.authentication_succeeded);
    assert!(!result.is_new_account);
    assert!(result.oauth_token.is_empty());

    // Pending sessions authorize nothing
    assert!(
        !orchestrator
            .authorize_action(&result.session_id, "reviews", "read")
            .await
            .unwrap()
    );

    let authenticator = MockAuthenticator::new();
    assert!(
        orchestrator
            .complete_second_factor(&result.session_id, &authenticator)
            .await
            .unwrap()
    );
    assert!(
        orchestrator
            .authorize_action(&result.session_id, "reviews", "read")
            .await
            .unwrap()
    );
    assert!(
        !orchestrator
            .authorize_action(&result.session_id, "admin", "read")
            .await
            .unwrap()
    );

    let stored = orchestrator
        .directory()
        .get_user_by_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.two_factor_secret, authenticator.secret());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    seed_user(&orchestrator, "dave", "s3cret").await;

    for (username, password) in [("dave", "wrong"), ("dave", ""), ("", "s3cret"), ("erin", "s3cret")] {
        let result = orchestrator
            .authenticate_with_password(username, password)
            .await
            .unwrap();
        assert_eq!(result, AuthenticationResult::failed(), "{username}/{password}");
    }
}

#[tokio::test]
async fn test_auto_register_creates_account() {
    let mock = MockProvider::start().await;
    let mut settings = test_settings();
    settings.auto_register = true;
    let orchestrator = orchestrator_with(&mock, settings);

    let first = orchestrator
        .authenticate_with_password("frank", "pa55word")
        .await
        .unwrap();
    assert!(first.authentication_succeeded);
    assert!(first.is_new_account);

    let user = orchestrator
        .directory()
        .get_user_by_username("frank")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, Role::Member);

    let second = orchestrator
        .authenticate_with_password("frank", "pa55word")
        .await
        .unwrap();
    assert!(second.authentication_succeeded);
    assert!(!second.is_new_account);

    let wrong = orchestrator
        .authenticate_with_password("frank", "other")
        .await
        .unwrap();
    assert!(!wrong.authentication_succeeded);
}

#[tokio::test]
async fn test_logout_and_unknown_sessions() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    seed_user(&orchestrator, "gina", "pw").await;

    assert!(
        !orchestrator
            .authorize_action("session-id-never-issued", "reviews", "read")
            .await
            .unwrap()
    );

    let result = orchestrator
        .authenticate_with_password("gina", "pw")
        .await
        .unwrap();
    orchestrator
        .complete_second_factor(&result.session_id, &MockAuthenticator::new())
        .await
        .unwrap();

    let session = orchestrator
        .sessions()
        .get_session(&result.session_id)
        .await
        .unwrap();
    assert!(session.is_active);
    assert_eq!(session.user_id, "id-gina");

    assert!(orchestrator.logout(&result.session_id).await.unwrap());
    assert!(!orchestrator.logout(&result.session_id).await.unwrap());
    assert!(
        !orchestrator
            .authorize_action(&result.session_id, "reviews", "read")
            .await
            .unwrap()
    );
}
