use crate::common::{
    MockAuthenticator, MockBrowser, MockProvider, current_code, orchestrator_with, tampered,
    test_settings,
};
use async_trait::async_trait;
use multiauth::{CodePrompt, Enrollment, ProviderKind, TwoFactorContext, TwoFactorError};

struct FixedCode(Option<String>);

#[async_trait]
impl CodePrompt for FixedCode {
    async fn request_code(&self, _enrollment: Option<&Enrollment>) -> Option<String> {
        self.0.clone()
    }
}

async fn enrolled_user_session(
    orchestrator: &multiauth::AuthOrchestrator,
) -> (String, String, String) {
    let first = orchestrator
        .authenticate_with_oauth(ProviderKind::GitHub, &MockBrowser::default())
        .await
        .unwrap();
    let authenticator = MockAuthenticator::new();
    assert!(
        orchestrator
            .complete_second_factor(&first.session_id, &authenticator)
            .await
            .unwrap()
    );
    let secret = authenticator.secret().unwrap();
    let user_id = orchestrator
        .sessions()
        .get_session(&first.session_id)
        .await
        .unwrap()
        .user_id;

    let second = orchestrator
        .authenticate_with_oauth(ProviderKind::GitHub, &MockBrowser::default())
        .await
        .unwrap();
    (user_id, secret, second.session_id)
}

#[tokio::test]
async fn test_tampered_code_ends_session() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let (user_id, secret, session_id) = enrolled_user_session(&orchestrator).await;

    let code = tampered(&current_code(&secret));
    let passed = orchestrator
        .complete_second_factor(&session_id, &FixedCode(Some(code)))
        .await
        .unwrap();
    assert!(!passed);
    assert!(
        !orchestrator
            .authorize_action(&session_id, "reviews", "read")
            .await
            .unwrap()
    );

    // A rejected code leaves the enrolled secret in place
    let user = orchestrator
        .directory()
        .get_user_by_id(&user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.two_factor_secret, Some(secret));
}

#[tokio::test]
async fn test_returning_user_verifies_without_enrollment() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let (_, secret, session_id) = enrolled_user_session(&orchestrator).await;

    let passed = orchestrator
        .complete_second_factor(&session_id, &FixedCode(Some(current_code(&secret))))
        .await
        .unwrap();
    assert!(passed);
    assert!(
        orchestrator
            .sessions()
            .validate_session(&session_id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_abandoned_prompt_ends_session() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Google, &MockBrowser::default())
        .await
        .unwrap();

    let passed = orchestrator
        .complete_second_factor(&result.session_id, &FixedCode(None))
        .await
        .unwrap();
    assert!(!passed);
    assert!(orchestrator.sessions().get_session(&result.session_id).await.is_err());
}

#[tokio::test]
async fn test_verify_without_secret_is_argument_error() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::LinkedIn, &MockBrowser::default())
        .await
        .unwrap();
    let user_id = orchestrator
        .sessions()
        .get_session(&result.session_id)
        .await
        .unwrap()
        .user_id;

    let outcome = orchestrator
        .two_factor()
        .setup_or_verify(
            &TwoFactorContext {
                user_id,
                is_first_time_setup: false,
            },
            &FixedCode(Some("123456".to_string())),
        )
        .await;
    assert!(matches!(outcome, Err(TwoFactorError::Argument(_))));
}

#[tokio::test]
async fn test_enrollment_renders_qr_png() {
    let mock = MockProvider::start().await;
    let orchestrator = orchestrator_with(&mock, test_settings());
    let result = orchestrator
        .authenticate_with_oauth(ProviderKind::Twitter, &MockBrowser::default())
        .await
        .unwrap();
    let user_id = orchestrator
        .sessions()
        .get_session(&result.session_id)
        .await
        .unwrap()
        .user_id;

    let enrollment = orchestrator.two_factor().enroll(&user_id).await.unwrap();
    assert!(
        enrollment
            .provisioning_uri
            .starts_with("otpauth://totp/multiauth-test:testuser?secret=")
    );
    let png = enrollment.qr_png.expect("QR should render");
    assert_eq!(&png[..4], b"\x89PNG");
}
