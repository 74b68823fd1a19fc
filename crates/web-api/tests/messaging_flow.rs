mod support;

use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use support::spawn_app;

#[tokio::test]
async fn away_recipient_gets_one_truncated_notification() {
    let app = spawn_app().await;
    let alice = app.signup("Alice", "alice@example.com").await;
    let bob = app.signup("Bob", "bob@example.com").await;
    app.set_page(&alice, "profile").await;

    let text = "x".repeat(200);
    let sent = app.send_message(&bob, &alice, &text).await;
    assert_eq!(sent["notification_created"], true);
    assert_eq!(sent["message"]["text"].as_str().unwrap().len(), 200);

    let notifications: Vec<Value> = app
        .get(&alice, "/api/notifications")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    let notification = &notifications[0];
    assert_eq!(notification["kind"], "message");
    assert_eq!(notification["icon"], "💬");
    assert_eq!(notification["title"], "New message from Bob");
    assert_eq!(notification["content"].as_str().unwrap().chars().count(), 120);
    assert_eq!(
        notification["link"],
        format!("/messages.html?contact={}", bob.id)
    );
    assert_eq!(notification["read"], false);

    // 发件人自己不会收到通知
    let own: Vec<Value> = app.get(&bob, "/api/notifications").await.json().await.unwrap();
    assert!(own.is_empty());
}

#[tokio::test]
async fn recipient_on_messages_page_gets_no_notification() {
    let app = spawn_app().await;
    let alice = app.signup("Alice", "alice@example.com").await;
    let bob = app.signup("Bob", "bob@example.com").await;
    app.set_page(&alice, "  Messages ").await;

    let sent = app.send_message(&bob, &alice, "hi").await;
    assert_eq!(sent["notification_created"], false);

    let notifications: Vec<Value> = app
        .get(&alice, "/api/notifications")
        .await
        .json()
        .await
        .unwrap();
    assert!(notifications.is_empty());

    // 离开私信页后恢复通知
    app.set_page(&alice, "feed").await;
    let sent = app.send_message(&bob, &alice, "still there?").await;
    assert_eq!(sent["notification_created"], true);
}

#[tokio::test]
async fn send_rejects_anonymous_and_invalid_requests() {
    let app = spawn_app().await;
    let alice = app.signup("Alice", "alice@example.com").await;
    let bob = app.signup("Bob", "bob@example.com").await;

    let anonymous = app
        .client
        .post(app.url("/api/messages/send"))
        .json(&json!({ "recipient_id": alice.id, "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let body: Value = anonymous.json().await.unwrap();
    assert_eq!(body["code"], "auth_required");

    let forged = app
        .client
        .post(app.url("/api/messages/send"))
        .header(header::COOKIE, "genbridge_session=not-a-session")
        .json(&json!({ "recipient_id": alice.id, "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let blank = app
        .post(&bob, "/api/messages/send", json!({ "recipient_id": alice.id, "text": "   " }))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    let body: Value = blank.json().await.unwrap();
    assert_eq!(body["code"], "missing_fields");

    let no_recipient = app
        .post(&bob, "/api/messages/send", json!({ "text": "hello" }))
        .await;
    assert_eq!(no_recipient.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .post(
            &bob,
            "/api/messages/send",
            json!({ "recipient_id": Uuid::new_v4(), "text": "hello" }),
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let thread: Vec<Value> = app
        .get(&bob, &format!("/api/messages/thread/{}", alice.id))
        .await
        .json()
        .await
        .unwrap();
    assert!(thread.is_empty());
}

#[tokio::test]
async fn contacts_and_thread_reflect_conversation() {
    let app = spawn_app().await;
    let alice = app.signup("Alice", "alice@example.com").await;
    let bob = app.signup("Bob", "bob@example.com").await;
    let carol = app.signup("Carol", "carol@example.com").await;

    app.send_message(&alice, &bob, "one").await;
    app.send_message(&bob, &alice, "two").await;
    app.send_message(&carol, &alice, "three").await;
    app.set_page(&carol, "feed").await;

    let thread: Vec<Value> = app
        .get(&alice, &format!("/api/messages/thread/{}", bob.id))
        .await
        .json()
        .await
        .unwrap();
    let texts: Vec<&str> = thread.iter().map(|m| m["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["one", "two"]);

    let contacts: Vec<Value> = app
        .get(&alice, "/api/messages/contacts")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0]["id"], carol.id.to_string());
    assert_eq!(contacts[0]["online"], true);
    assert_eq!(contacts[1]["name"], "Bob");
    assert_eq!(contacts[1]["online"], false);
}

#[tokio::test]
async fn notifications_can_be_marked_read_and_cleared() {
    let app = spawn_app().await;
    let alice = app.signup("Alice", "alice@example.com").await;
    let bob = app.signup("Bob", "bob@example.com").await;
    app.send_message(&bob, &alice, "first").await;
    app.send_message(&bob, &alice, "second").await;

    let marked: Value = app
        .post(&alice, "/api/notifications/mark_all_read", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(marked["count"], 2);

    let notifications: Vec<Value> = app
        .get(&alice, "/api/notifications")
        .await
        .json()
        .await
        .unwrap();
    assert!(notifications.iter().all(|n| n["read"] == true));

    let cleared: Value = app
        .post(&alice, "/api/notifications/clear", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["count"], 2);

    let notifications: Vec<Value> = app
        .get(&alice, "/api/notifications")
        .await
        .json()
        .await
        .unwrap();
    assert!(notifications.is_empty());
}
