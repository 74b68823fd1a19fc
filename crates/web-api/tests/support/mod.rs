#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use application::{SignupRequest, SystemClock};
use infrastructure::BcryptPasswordHasher;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot, time::timeout};
use uuid::Uuid;
use web_api::{router, AppState, StateDependencies};

pub const PASSWORD: &str = "secret";

pub struct TestApp {
    pub base: String,
    pub client: Client,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// 已登录的测试用户
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub cookie: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_keepalive(Duration::from_secs(20)).await
}

pub async fn spawn_app_with_keepalive(keepalive_interval: Duration) -> TestApp {
    let mut deps = StateDependencies::in_memory(
        Arc::new(BcryptPasswordHasher::new(Some(4))),
        Arc::new(SystemClock),
    );
    deps.keepalive_interval = keepalive_interval;
    let state = AppState::new(deps);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestApp {
        base: format!("http://{}", addr),
        client: Client::new(),
        state,
        shutdown: Some(shutdown_tx),
    }
}

/// 取出 `Set-Cookie` 中的 `name=value` 部分
pub fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("ascii cookie");
    set_cookie.split(';').next().expect("cookie pair").to_string()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn signup(&self, full_name: &str, email: &str) -> TestUser {
        let response = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "full_name": full_name, "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("signup request");
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = session_cookie(&response);
        let body: Value = response.json().await.expect("signup json");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            cookie,
        }
    }

    pub async fn login(&self, email: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("login request")
    }

    /// 创建管理员并通过管理员入口登录
    pub async fn admin(&self, email: &str) -> TestUser {
        let admin = self
            .state
            .auth_service
            .ensure_admin(SignupRequest {
                full_name: "Root".into(),
                email: email.into(),
                password: PASSWORD.into(),
            })
            .await
            .expect("bootstrap admin");

        let response = self
            .client
            .post(self.url("/api/auth/admin_login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("admin login");
        assert_eq!(response.status(), StatusCode::OK);
        TestUser {
            id: Uuid::from(admin.id),
            email: email.to_string(),
            cookie: session_cookie(&response),
        }
    }

    pub async fn get(&self, user: &TestUser, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header(header::COOKIE, &user.cookie)
            .send()
            .await
            .expect("get request")
    }

    pub async fn post(&self, user: &TestUser, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .header(header::COOKIE, &user.cookie)
            .json(&body)
            .send()
            .await
            .expect("post request")
    }

    pub async fn set_page(&self, user: &TestUser, page: &str) {
        let response = self
            .post(user, "/api/realtime/presence", json!({ "page": page }))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    pub async fn send_message(&self, from: &TestUser, to: &TestUser, text: &str) -> Value {
        let response = self
            .post(
                from,
                "/api/messages/send",
                json!({ "recipient_id": to.id, "text": text }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("send json")
    }

    pub async fn open_stream(&self, user: &TestUser) -> SseReader {
        let response = self
            .get(user, "/api/realtime/stream")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));
        SseReader {
            response,
            buffer: String::new(),
        }
    }
}

/// 从 `text/event-stream` 响应中逐条解析事件
pub struct SseReader {
    response: Response,
    buffer: String,
}

#[derive(Debug, Clone)]
pub struct SseEvent {
    pub name: String,
    pub data: Value,
}

impl SseReader {
    pub async fn next_event(&mut self) -> SseEvent {
        timeout(Duration::from_secs(5), self.read_event())
            .await
            .expect("timed out waiting for event")
    }

    /// 等待服务端结束响应流，期间不应再收到任何事件
    pub async fn expect_closed(&mut self) {
        let closed = timeout(Duration::from_secs(5), async {
            while let Ok(Some(chunk)) = self.response.chunk().await {
                self.buffer.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await;
        assert!(closed.is_ok(), "stream is still open");
        assert!(
            !self.buffer.contains("event:"),
            "unexpected events before close: {}",
            self.buffer
        );
    }

    async fn read_event(&mut self) -> SseEvent {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                if let Some(event) = parse_frame(&frame) {
                    return event;
                }
                continue;
            }
            let chunk = self
                .response
                .chunk()
                .await
                .expect("read chunk")
                .expect("stream ended");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut name = None;
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim_start().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push_str(value.trim_start());
        }
    }
    let name = name?;
    let data = if data.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&data).expect("event data is json")
    };
    Some(SseEvent { name, data })
}
