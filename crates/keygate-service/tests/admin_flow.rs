//! Administrative operations and the authorization matrix.

mod common;

use std::collections::HashSet;

use keygate_core::error::ErrorKind;
use keygate_core::types::pagination::PageRequest;
use keygate_database::store::CredentialStore;
use keygate_entity::permission::Permission;
use keygate_entity::user::UserRole;
use keygate_service::RequestContext;

use common::{Harness, client, harness, signup_request};

/// Signs up a user, stores the given role with its defaults, and returns an
/// authenticated context carrying the fresh role.
async fn user_with_role(h: &Harness, email: &str, role: UserRole) -> RequestContext {
    let signed_up = h
        .auth
        .signup(signup_request(email, "Someone", "Str0ngPass!"), &client())
        .await
        .unwrap();

    let defaults = match role {
        UserRole::Admin => Permission::all(),
        UserRole::Hr => [Permission::Read, Permission::Write, Permission::ManageUsers]
            .into_iter()
            .collect(),
        UserRole::User | UserRole::Candidate => [Permission::Read].into_iter().collect(),
    };
    h.credentials
        .set_role(signed_up.user.id, role, defaults)
        .await
        .unwrap();

    h.auth
        .authenticate(&signed_up.tokens.access_token)
        .await
        .unwrap()
}

#[tokio::test]
async fn listing_requires_admin_or_hr() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let hr = user_with_role(&h, "hr@example.com", UserRole::Hr).await;
    let user = user_with_role(&h, "user@example.com", UserRole::User).await;

    assert!(h.admin.list_users(&admin, &PageRequest::default()).await.is_ok());
    assert!(h.admin.list_users(&hr, &PageRequest::default()).await.is_ok());

    let err = h
        .admin
        .list_users(&user, &PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);
}

#[tokio::test]
async fn role_change_requires_manage_roles() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let hr = user_with_role(&h, "hr@example.com", UserRole::Hr).await;
    let target = user_with_role(&h, "target@example.com", UserRole::User).await;

    // HR holds manage_users but not manage_roles.
    let err = h
        .admin
        .set_role(&hr, target.user_id, UserRole::Hr)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    h.admin
        .set_role(&admin, target.user_id, UserRole::Hr)
        .await
        .unwrap();
    let updated = h.admin.get_user(&admin, target.user_id).await.unwrap();
    assert_eq!(updated.role, UserRole::Hr);
}

#[tokio::test]
async fn role_change_resets_explicit_permissions() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let target = user_with_role(&h, "target@example.com", UserRole::User).await;

    // Grant an override, then change the role.
    h.admin
        .set_permissions(
            &admin,
            target.user_id,
            [Permission::Read, Permission::Delete].into_iter().collect(),
        )
        .await
        .unwrap();
    h.admin
        .set_role(&admin, target.user_id, UserRole::Candidate)
        .await
        .unwrap();

    let updated = h.admin.get_user(&admin, target.user_id).await.unwrap();
    assert_eq!(updated.role, UserRole::Candidate);
    // The override did not survive the role change.
    assert!(!updated.explicit_permissions().contains(&Permission::Delete));
    assert!(updated.explicit_permissions().contains(&Permission::Read));
}

#[tokio::test]
async fn explicit_override_unlocks_permission_gated_operations() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let grantee = user_with_role(&h, "grantee@example.com", UserRole::User).await;
    let victim = user_with_role(&h, "victim@example.com", UserRole::User).await;

    // A plain user cannot delete.
    let err = h
        .admin
        .delete_user(&grantee, victim.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    // With an explicit delete grant they can, regardless of role.
    h.admin
        .set_permissions(
            &admin,
            grantee.user_id,
            [Permission::Read, Permission::Delete].into_iter().collect(),
        )
        .await
        .unwrap();
    let grantee = h
        .auth
        .authenticate(
            &h.auth
                .login("grantee@example.com", "Str0ngPass!", &client())
                .await
                .unwrap()
                .tokens
                .access_token,
        )
        .await
        .unwrap();

    h.admin.delete_user(&grantee, victim.user_id).await.unwrap();
    let err = h.admin.get_user(&admin, victim.user_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn self_deletion_and_self_deactivation_refused() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;

    let err = h.admin.delete_user(&admin, admin.user_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .admin
        .set_active_status(&admin, admin.user_id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn deactivation_revokes_sessions_immediately() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;

    let target = h
        .auth
        .signup(signup_request("t@example.com", "T", "Str0ngPass!"), &client())
        .await
        .unwrap();

    h.admin
        .set_active_status(&admin, target.user.id, false)
        .await
        .unwrap();

    let err = h
        .auth
        .refresh(&target.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionRevoked);

    let err = h
        .auth
        .login("t@example.com", "Str0ngPass!", &client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountDisabled);

    // And reactivation restores login.
    h.admin
        .set_active_status(&admin, target.user.id, true)
        .await
        .unwrap();
    h.auth
        .login("t@example.com", "Str0ngPass!", &client())
        .await
        .unwrap();
}

#[tokio::test]
async fn permission_replacement_requires_manage_users() {
    let h = harness();
    let hr = user_with_role(&h, "hr@example.com", UserRole::Hr).await;
    let user = user_with_role(&h, "user@example.com", UserRole::User).await;
    let target = user_with_role(&h, "target@example.com", UserRole::User).await;

    // HR's defaults include manage_users.
    h.admin
        .set_permissions(&hr, target.user_id, HashSet::new())
        .await
        .unwrap();

    let err = h
        .admin
        .set_permissions(&user, target.user_id, HashSet::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);
}

#[tokio::test]
async fn dashboard_stats_are_admin_only_and_accurate() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let hr = user_with_role(&h, "hr@example.com", UserRole::Hr).await;

    // One more user, then verify their email and disable them.
    let extra = h
        .auth
        .signup(signup_request("x@example.com", "X", "Str0ngPass!"), &client())
        .await
        .unwrap();
    h.credentials
        .mark_email_verified(extra.user.id)
        .await
        .unwrap();
    h.admin
        .set_active_status(&admin, extra.user.id, false)
        .await
        .unwrap();

    let err = h.admin.dashboard_stats(&hr).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    let stats = h.admin.dashboard_stats(&admin).await.unwrap();
    assert_eq!(stats.users.total_users, 3);
    assert_eq!(stats.users.verified_users, 1);
    assert_eq!(stats.users.active_users, 2);
    assert_eq!(stats.users.recent_registrations, 3);
    assert_eq!(stats.users.users_by_role.get(&UserRole::Admin), Some(&1));
    // admin + hr sessions; the disabled user's session was revoked.
    assert_eq!(stats.active_sessions, 2);
}

#[tokio::test]
async fn permission_registry_lists_all_five() {
    let h = harness();
    let admin = user_with_role(&h, "admin@example.com", UserRole::Admin).await;
    let user = user_with_role(&h, "user@example.com", UserRole::User).await;

    let listed = h.admin.list_permissions(&admin).unwrap();
    assert_eq!(listed.len(), 5);

    let err = h.admin.list_permissions(&user).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);
}
