//! End-to-end authentication flows over in-memory stores.

mod common;

use keygate_auth::onetime;
use keygate_core::error::ErrorKind;
use keygate_database::store::CredentialStore;
use keygate_entity::permission::Permission;
use keygate_entity::user::UserRole;
use keygate_service::FederatedOutcome;

use common::{MailKind, StaticFederation, client, harness, harness_with, signup_request};

#[tokio::test]
async fn signup_issues_tokens_with_default_role() {
    let h = harness();

    let signed_up = h
        .auth
        .signup(signup_request("new@example.com", "New User", "Str0ngPass!"), &client())
        .await
        .unwrap();

    assert_eq!(signed_up.user.role, UserRole::User);
    assert!(!signed_up.user.is_email_verified);

    // The access token authenticates immediately with the role defaults.
    let ctx = h.auth.authenticate(&signed_up.tokens.access_token).await.unwrap();
    assert_eq!(ctx.role, UserRole::User);
    assert!(ctx.has_permission(Permission::Read));
    assert!(!ctx.has_permission(Permission::Delete));

    // A verification email went out.
    assert!(
        h.mailer
            .last_token(MailKind::Verification, "new@example.com")
            .is_some()
    );
}

#[tokio::test]
async fn duplicate_signup_rejected() {
    let h = harness();
    h.auth
        .signup(signup_request("dup@example.com", "First", "Str0ngPass!"), &client())
        .await
        .unwrap();

    let err = h
        .auth
        .signup(signup_request("DUP@example.com", "Second", "Str0ngPass!"), &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateIdentity);
}

#[tokio::test]
async fn weak_password_rejected_at_signup() {
    let h = harness();
    let err = h
        .auth
        .signup(signup_request("weak@example.com", "Weak", "password1"), &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WeakPassword);
}

#[tokio::test]
async fn malformed_email_rejected_at_signup() {
    let h = harness();
    let err = h
        .auth
        .signup(signup_request("not-an-email", "Nope", "Str0ngPass!"), &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let federation = StaticFederation::default().with("ok", "fed-1", "fed@example.com", None);
    let h = harness_with(federation);

    h.auth
        .signup(signup_request("known@example.com", "Known", "Str0ngPass!"), &client())
        .await
        .unwrap();
    // A federated-only account with no local password.
    h.auth.federated_login("ok", &client()).await.unwrap();

    let unknown = h
        .auth
        .login("nobody@example.com", "Str0ngPass!", &client())
        .await
        .unwrap_err();
    let wrong = h
        .auth
        .login("known@example.com", "Wr0ngPass!!", &client())
        .await
        .unwrap_err();
    let passwordless = h
        .auth
        .login("fed@example.com", "Str0ngPass!", &client())
        .await
        .unwrap_err();

    for err in [&unknown, &wrong, &passwordless] {
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }
    assert_eq!(unknown.message, wrong.message);
    assert_eq!(wrong.message, passwordless.message);
}

#[tokio::test]
async fn refresh_works_until_logout() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("r@example.com", "R", "Str0ngPass!"), &client())
        .await
        .unwrap();

    let refreshed = h.auth.refresh(&signed_up.tokens.refresh_token).await.unwrap();
    assert!(
        h.auth
            .authenticate(&refreshed.access_token)
            .await
            .is_ok()
    );

    let revoked = h.auth.logout(&signed_up.tokens.access_token).await.unwrap();
    assert_eq!(revoked, 1);

    let err = h
        .auth
        .refresh(&signed_up.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionRevoked);
}

#[tokio::test]
async fn access_token_not_accepted_for_refresh() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("kind@example.com", "K", "Str0ngPass!"), &client())
        .await
        .unwrap();

    let err = h
        .auth
        .refresh(&signed_up.tokens.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenKindMismatch);

    let err = h
        .auth
        .logout(&signed_up.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenKindMismatch);
}

#[tokio::test]
async fn disabled_account_cannot_login_or_refresh() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("off@example.com", "Off", "Str0ngPass!"), &client())
        .await
        .unwrap();

    h.credentials
        .set_active(signed_up.user.id, false)
        .await
        .unwrap();

    let err = h
        .auth
        .login("off@example.com", "Str0ngPass!", &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountDisabled);

    // The session still exists but the account gate rejects the refresh.
    let err = h
        .auth
        .refresh(&signed_up.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountDisabled);
}

#[tokio::test]
async fn password_recovery_end_to_end() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("reset@example.com", "Reset", "Str0ngPass!"), &client())
        .await
        .unwrap();

    h.auth.forgot_password("reset@example.com").await.unwrap();
    let token = h
        .mailer
        .last_token(MailKind::PasswordReset, "reset@example.com")
        .unwrap();

    h.auth.reset_password(&token, "N3wStr0ng?Pass").await.unwrap();

    // Old password no longer works, new one does.
    let err = h
        .auth
        .login("reset@example.com", "Str0ngPass!", &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    h.auth
        .login("reset@example.com", "N3wStr0ng?Pass", &client())
        .await
        .unwrap();

    // Every pre-reset session was revoked.
    let err = h
        .auth
        .refresh(&signed_up.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionRevoked);

    // The reset token was one-time.
    let err = h
        .auth
        .reset_password(&token, "An0ther?Pass1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);
}

#[tokio::test]
async fn forgot_password_never_reveals_account_existence() {
    let h = harness();
    h.auth.forgot_password("ghost@example.com").await.unwrap();
    assert_eq!(h.mailer.sent_count(), 0);
}

#[tokio::test]
async fn expired_reset_token_rejected() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("stale@example.com", "Stale", "Str0ngPass!"), &client())
        .await
        .unwrap();

    h.credentials
        .set_reset_token(
            signed_up.user.id,
            &onetime::hash_token("stale-token"),
            chrono::Utc::now() - chrono::Duration::minutes(1),
        )
        .await
        .unwrap();

    let err = h
        .auth
        .reset_password("stale-token", "N3wStr0ng?Pass")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);
}

#[tokio::test]
async fn email_verification_is_one_time() {
    let h = harness();
    h.auth
        .signup(signup_request("v@example.com", "V", "Str0ngPass!"), &client())
        .await
        .unwrap();

    let token = h
        .mailer
        .last_token(MailKind::Verification, "v@example.com")
        .unwrap();

    let verified = h.auth.verify_email(&token).await.unwrap();
    assert!(verified.is_email_verified);

    let err = h.auth.verify_email(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);
}

#[tokio::test]
async fn federated_login_created_linked_found() {
    let federation = StaticFederation::default()
        .with("fresh", "sub-fresh", "fresh@example.com", Some("Fresh"))
        .with("existing", "sub-existing", "linked@example.com", None);
    let h = harness_with(federation);

    // No local account: one is created, email pre-verified, passwordless.
    let login = h.auth.federated_login("fresh", &client()).await.unwrap();
    assert_eq!(login.outcome, FederatedOutcome::Created);
    assert!(login.user.is_email_verified);
    assert!(login.user.is_federated_only());
    assert_eq!(login.user.role, UserRole::User);

    // Same assertion again: the linked account is found.
    let login = h.auth.federated_login("fresh", &client()).await.unwrap();
    assert_eq!(login.outcome, FederatedOutcome::Found);

    // A password account with the matching email gets linked.
    h.auth
        .signup(signup_request("linked@example.com", "L", "Str0ngPass!"), &client())
        .await
        .unwrap();
    let login = h.auth.federated_login("existing", &client()).await.unwrap();
    assert_eq!(login.outcome, FederatedOutcome::Linked);
    assert_eq!(login.user.federation_id.as_deref(), Some("sub-existing"));

    let login = h.auth.federated_login("existing", &client()).await.unwrap();
    assert_eq!(login.outcome, FederatedOutcome::Found);
}

#[tokio::test]
async fn unverifiable_assertion_rejected() {
    let h = harness();
    let err = h
        .auth
        .federated_login("garbage", &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::FederationVerification);
}

#[tokio::test]
async fn change_password_revokes_all_sessions() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("chg@example.com", "Chg", "Str0ngPass!"), &client())
        .await
        .unwrap();
    // A second session from another device.
    let second = h
        .auth
        .login("chg@example.com", "Str0ngPass!", &client())
        .await
        .unwrap();

    let ctx = h.auth.authenticate(&signed_up.tokens.access_token).await.unwrap();
    h.users
        .change_password(&ctx, "Str0ngPass!", "N3wStr0ng?Pass")
        .await
        .unwrap();

    for token in [&signed_up.tokens.refresh_token, &second.tokens.refresh_token] {
        let err = h.auth.refresh(token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionRevoked);
    }

    h.auth
        .login("chg@example.com", "N3wStr0ng?Pass", &client())
        .await
        .unwrap();
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let h = harness();
    let signed_up = h
        .auth
        .signup(signup_request("cur@example.com", "Cur", "Str0ngPass!"), &client())
        .await
        .unwrap();
    let ctx = h.auth.authenticate(&signed_up.tokens.access_token).await.unwrap();

    let err = h
        .users
        .change_password(&ctx, "Wr0ngPass!!", "N3wStr0ng?Pass")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);

    let err = h
        .users
        .change_password(&ctx, "Str0ngPass!", "Str0ngPass!")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WeakPassword);
}

#[tokio::test]
async fn garbage_access_token_is_malformed() {
    let h = harness();
    let err = h.auth.authenticate("definitely.not.a.token").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenMalformed);
}
