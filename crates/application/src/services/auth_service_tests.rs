//! 登录注册与会话测试

use chrono::Duration;
use domain::{ClientInfo, DomainError, EventKind, UserId};

use super::test_support::Harness;
use super::{LoginRequest, SessionStatus, SignupRequest};
use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::repository::{LoginEventRepository, SessionRepository, UserRepository};

fn client() -> ClientInfo {
    ClientInfo {
        ip: "127.0.0.1".into(),
        user_agent: "tests".into(),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn signup_opens_session_and_records_login() {
    let harness = Harness::new();
    let auth = harness.auth();

    let outcome = auth
        .signup(
            SignupRequest {
                full_name: " Dana ".into(),
                email: " Dana@Example.COM ".into(),
                password: "pw".into(),
            },
            &client(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.user.email, "dana@example.com");
    assert_eq!(outcome.user.full_name, "Dana");
    assert!(!outcome.warning.pending);
    assert_eq!(outcome.session.token.as_str().len(), 43);

    let session = auth.resolve_session(&outcome.session.token).await.unwrap();
    assert_eq!(session.map(|s| s.user_id), Some(outcome.user.id));

    let logins = harness.logins.list_recent(10).await.unwrap();
    assert_eq!(logins.len(), 1);
    assert!(logins[0].success);
    assert_eq!(logins[0].ip, "127.0.0.1");
}

#[tokio::test]
async fn signup_requires_every_field_and_unique_email() {
    let harness = Harness::new();
    let auth = harness.auth();

    let missing = auth
        .signup(
            SignupRequest {
                full_name: "Eve".into(),
                email: "".into(),
                password: "pw".into(),
            },
            &client(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        missing,
        ApplicationError::Domain(DomainError::InvalidArgument { ref reason, .. }) if reason == "missing_fields"
    ));

    harness.create_user("Eve", "eve@example.com").await;
    let duplicate = auth
        .signup(
            SignupRequest {
                full_name: "Eve Again".into(),
                email: "EVE@example.com".into(),
                password: "pw".into(),
            },
            &client(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        duplicate,
        ApplicationError::Domain(DomainError::UserAlreadyExists)
    ));
}

#[tokio::test]
async fn bad_password_and_banned_accounts_are_rejected_and_recorded() {
    let harness = Harness::new();
    let auth = harness.auth();
    let mut frank = harness.create_user("Frank", "frank@example.com").await;

    let wrong = auth
        .login(login("frank@example.com", "nope"), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        wrong,
        ApplicationError::Domain(DomainError::InvalidCredentials)
    ));

    frank.ban(harness.clock.now());
    harness.users.update(frank).await.unwrap();
    let banned = auth
        .login(login("frank@example.com", "secret"), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        banned,
        ApplicationError::Domain(DomainError::InvalidCredentials)
    ));

    let unknown = auth
        .login(login("ghost@example.com", "secret"), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        unknown,
        ApplicationError::Domain(DomainError::InvalidCredentials)
    ));

    let logins = harness.logins.list_recent(10).await.unwrap();
    assert_eq!(logins.len(), 3);
    assert!(logins.iter().all(|event| !event.success));
    assert_eq!(logins[0].user_id, None);
}

#[tokio::test]
async fn login_trims_password_and_treats_blank_as_wrong() {
    let harness = Harness::new();
    let auth = harness.auth();
    let hank = harness.create_user("Hank", "hank@example.com").await;

    let blank = auth
        .login(login("hank@example.com", "   "), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        blank,
        ApplicationError::Domain(DomainError::InvalidCredentials)
    ));

    let outcome = auth
        .login(login(" HANK@example.com ", " secret "), &client())
        .await
        .unwrap();
    assert_eq!(outcome.user.id, hank.id);

    let logins = harness.logins.list_recent(10).await.unwrap();
    assert_eq!(logins.len(), 2);
    assert!(logins[0].success);
    assert!(!logins[1].success);
    assert_eq!(logins[1].user_id, Some(hank.id));
}

#[tokio::test]
async fn suspended_user_cannot_log_in_until_expiry() {
    let harness = Harness::new();
    let auth = harness.auth();
    let mut gina = harness.create_user("Gina", "gina@example.com").await;
    let now = harness.clock.now();
    gina.suspend_until(now + Duration::days(3), now);
    harness.users.update(gina).await.unwrap();

    let err = auth
        .login(login("gina@example.com", "secret"), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::AccountSuspended { .. })
    ));

    harness.clock.advance(Duration::days(3) + Duration::seconds(1));
    assert!(auth
        .login(login("gina@example.com", "secret"), &client())
        .await
        .is_ok());
}

#[tokio::test]
async fn admin_login_requires_admin_flag() {
    let harness = Harness::new();
    let auth = harness.auth();
    harness.create_user("Hank", "hank@example.com").await;
    harness.create_admin("Root", "root@example.com").await;

    let err = auth
        .admin_login(login("hank@example.com", "secret"), &client())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidCredentials)
    ));

    let outcome = auth
        .admin_login(login("root@example.com", "secret"), &client())
        .await
        .unwrap();
    assert!(outcome.session.is_admin);
}

#[tokio::test]
async fn login_broadcasts_to_admin_connections() {
    let harness = Harness::new();
    let auth = harness.auth();
    let admin = harness.create_admin("Root", "root@example.com").await;
    harness.create_user("Ivy", "ivy@example.com").await;
    harness.queues.register(admin.id);

    auth.login(login("ivy@example.com", "secret"), &client())
        .await
        .unwrap();

    let event = harness.queues.pop(admin.id).unwrap();
    assert_eq!(event.kind, EventKind::LoginEvent);
    assert!(event.admin_only);
    assert_eq!(event.payload["action"], "login");
    assert_eq!(event.payload["user"]["email"], "ivy@example.com");
}

#[tokio::test]
async fn logout_clears_session_and_presence() {
    let harness = Harness::new();
    let auth = harness.auth();
    harness.create_user("Jo", "jo@example.com").await;

    let outcome = auth
        .login(login("jo@example.com", "secret"), &client())
        .await
        .unwrap();
    harness
        .presence
        .set_presence(outcome.user.id, "messages", None);

    auth.logout(Some(&outcome.session.token)).await.unwrap();

    assert!(harness
        .sessions
        .find(&outcome.session.token)
        .await
        .unwrap()
        .is_none());
    assert!(!harness.presence.is_on_messages_page(outcome.user.id));

    // 重复登出无副作用
    auth.logout(Some(&outcome.session.token)).await.unwrap();
    auth.logout(None).await.unwrap();
}

#[tokio::test]
async fn session_status_revokes_suspended_sessions() {
    let harness = Harness::new();
    let auth = harness.auth();
    harness.create_user("Kim", "kim@example.com").await;
    let outcome = auth
        .login(login("kim@example.com", "secret"), &client())
        .await
        .unwrap();

    let status = auth
        .session_status(Some(&outcome.session.token))
        .await
        .unwrap();
    assert!(matches!(status, SessionStatus::Active { .. }));

    let mut kim = harness
        .users
        .find_by_id(outcome.user.id)
        .await
        .unwrap()
        .unwrap();
    let now = harness.clock.now();
    kim.suspend_until(now + Duration::days(1), now);
    harness.users.update(kim).await.unwrap();

    let status = auth
        .session_status(Some(&outcome.session.token))
        .await
        .unwrap();
    assert!(matches!(status, SessionStatus::Suspended { .. }));
    assert!(auth
        .resolve_session(&outcome.session.token)
        .await
        .unwrap()
        .is_none());

    let anonymous = auth.session_status(None).await.unwrap();
    assert!(matches!(anonymous, SessionStatus::Anonymous));
}

#[tokio::test]
async fn acknowledge_warning_clears_pending_message() {
    let harness = Harness::new();
    let auth = harness.auth();
    let mut lee = harness.create_user("Lee", "lee@example.com").await;
    lee.set_warning("be nice", harness.clock.now());
    let lee = harness.users.update(lee).await.unwrap();

    auth.acknowledge_warning(lee.id).await;
    // 未知用户同样不报错
    auth.acknowledge_warning(UserId::generate()).await;

    let stored = harness.users.find_by_id(lee.id).await.unwrap().unwrap();
    assert!(stored.warning_message.is_none());
}

#[tokio::test]
async fn ensure_admin_creates_or_promotes() {
    let harness = Harness::new();
    let auth = harness.auth();
    let request = SignupRequest {
        full_name: "Ops".into(),
        email: "ops@example.com".into(),
        password: "bootstrap".into(),
    };

    let created = auth.ensure_admin(request.clone()).await.unwrap();
    assert!(created.is_admin);
    let again = auth.ensure_admin(request).await.unwrap();
    assert_eq!(again.id, created.id);

    harness.create_user("Mo", "mo@example.com").await;
    let promoted = auth
        .ensure_admin(SignupRequest {
            full_name: "Mo".into(),
            email: "mo@example.com".into(),
            password: String::new(),
        })
        .await
        .unwrap();
    assert!(promoted.is_admin);
    assert_eq!(harness.users.count().await.unwrap(), 2);
}
