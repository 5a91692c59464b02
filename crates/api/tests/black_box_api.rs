use chrono::{Duration as ChronoDuration, Utc};
use erpguard_api::config::AppConfig;
use erpguard_auth::JwtClaims;
use erpguard_core::UserId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const ROOT_EMAIL: &str = "root@example.com";
const ROOT_PASSWORD: &str = "root-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = AppConfig::new(JWT_SECRET).with_bootstrap_superuser(ROOT_EMAIL, ROOT_PASSWORD);
        let app = erpguard_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .header("x-forwarded-for", "198.51.100.4")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + expires_in,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Creates a company, a member with the given password and a role holding
/// `permissions` assigned to that member. Returns (company id, user id, role id).
async fn provision_member(
    srv: &TestServer,
    root: &str,
    company: &str,
    username: &str,
    permissions: &[&str],
) -> (String, String, String) {
    let (status, company) = srv.post(root, "/companies", json!({ "name": company })).await;
    assert_eq!(status, StatusCode::CREATED);
    let company_id = company["id"].as_str().unwrap().to_string();

    let (status, user) = srv
        .post(
            root,
            "/users",
            json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "member-pw",
                "company": company_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, role) = srv
        .post(root, "/roles", json!({ "name": format!("{username}-role") }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = role["id"].as_str().unwrap().to_string();

    let (status, _) = srv
        .post(
            root,
            &format!("/roles/{role_id}/assign_permissions"),
            json!({ "permissions": permissions }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .post(root, &format!("/users/{user_id}/assign_role"), json!({ "role_id": role_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Role assigned successfully");

    (company_id, user_id, role_id)
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url("/notifications/stream"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_for_unknown_account_is_rejected() {
    let srv = TestServer::spawn().await;

    let token = mint_jwt(UserId::new(), ChronoDuration::minutes(10));
    let (status, body) = srv.get(&token, "/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let srv = TestServer::spawn().await;

    let (wrong_pw, wrong_body) = srv.login(ROOT_EMAIL, "nope").await;
    let (unknown, unknown_body) = srv.login("ghost@example.com", "nope").await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn superuser_login_returns_full_catalog() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.login(ROOT_EMAIL, ROOT_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].as_str().is_some());
    assert_eq!(body["user"]["email"], ROOT_EMAIL);
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["permissions"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;
    provision_member(&srv, &root, "Lock Co", "lockme", &[]).await;

    for _ in 0..5 {
        let (status, _) = srv.login("lockme@example.com", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = srv.login("lockme@example.com", "member-pw").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "account_locked");
    assert!(body["locked_until"].as_str().is_some());

    let (status, logs) = srv.get(&root, "/audit-logs?action=login&user=lockme").await;
    assert_eq!(status, StatusCode::OK);
    let details: Vec<&str> = logs["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["details"].as_str().unwrap())
        .collect();
    assert_eq!(details.len(), 6);
    assert_eq!(details[0], "Failed login attempt - account locked");
    assert!(details.contains(&"Failed login attempt #5"));
    assert!(logs["items"].as_array().unwrap().iter().all(|e| e["ip_address"] == "198.51.100.4"));
}

#[tokio::test]
async fn tenant_isolation_blocks_cross_company_reads_and_writes() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;

    let (company_a, _alice, _) =
        provision_member(&srv, &root, "Company A", "alice", &["VIEW_USERS", "UPDATE_USER", "VIEW_COMPANIES"]).await;
    let (_company_b, bob, _) = provision_member(&srv, &root, "Company B", "bob", &[]).await;

    let alice = srv.token("alice@example.com", "member-pw").await;

    let (status, users) = srv.get(&alice, "/users").await;
    assert_eq!(status, StatusCode::OK);
    let users = users["items"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users.iter().all(|u| u["company"] == company_a.as_str()));

    let (status, companies) = srv.get(&alice, "/companies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(companies["items"].as_array().unwrap().len(), 1);

    let (status, body) = srv.get(&alice, &format!("/users/{bob}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "access denied");

    let res = srv
        .client
        .put(srv.url(&format!("/users/{bob}")))
        .bearer_auth(&alice)
        .json(&json!({ "first_name": "Mallory" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Same answer for an id that does not exist anywhere.
    let (status, _) = srv.get(&alice, &format!("/users/{}", UserId::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_permission_is_a_generic_denial() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;
    provision_member(&srv, &root, "Plain Co", "plain", &[]).await;
    let plain = srv.token("plain@example.com", "member-pw").await;

    let (status, body) = srv.get(&plain, "/audit-logs").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "permission_denied", "message": "permission denied" }));
}

#[tokio::test]
async fn unknown_audit_action_is_rejected() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;

    let (status, body) = srv.get(&root, "/audit-logs?action=purge").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "unknown audit action 'PURGE'");
}

#[tokio::test]
async fn role_assignment_is_idempotent_over_http() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;
    let (_, user, role) = provision_member(&srv, &root, "Idem Co", "idem", &["VIEW_USERS"]).await;

    let (status, body) = srv
        .post(&root, &format!("/users/{user}/assign_role"), json!({ "role_id": role }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Role already assigned");

    let remove = |role: String| {
        srv.client
            .delete(srv.url(&format!("/users/{user}/remove_role")))
            .bearer_auth(&root)
            .json(&json!({ "role_id": role }))
            .send()
    };

    let body: Value = remove(role.clone()).await.unwrap().json().await.unwrap();
    assert_eq!(body["message"], "Role removed successfully");
    let body: Value = remove(role.clone()).await.unwrap().json().await.unwrap();
    assert_eq!(body["message"], "Role not assigned to user");

    let (status, roles) = srv.get(&root, &format!("/users/{user}/roles")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(roles["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn permission_changes_are_pushed_to_live_streams() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;
    let (_, user, role) = provision_member(&srv, &root, "Live Co", "live", &["VIEW_USERS"]).await;
    let live = srv.token("live@example.com", "member-pw").await;

    let mut stream = srv
        .client
        .get(srv.url("/notifications/stream"))
        .bearer_auth(&live)
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::OK);

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{user}/remove_role")))
        .bearer_auth(&root)
        .json(&json!({ "role_id": role }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let mut received = String::new();
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while !received.contains("permissionUpdate") {
        let chunk = tokio::time::timeout_at(deadline, stream.chunk())
            .await
            .expect("no notification within timeout")
            .unwrap()
            .expect("stream ended");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(received.contains("event: permissionUpdate"));
    assert!(received.contains(&format!("\"userId\":\"{user}\"")));
    assert!(received.contains("\"permissions\":[]"));
}

#[tokio::test]
async fn locked_account_tokens_are_refused() {
    let srv = TestServer::spawn().await;
    let root = srv.token(ROOT_EMAIL, ROOT_PASSWORD).await;
    provision_member(&srv, &root, "Mid Co", "midsession", &[]).await;
    let token = srv.token("midsession@example.com", "member-pw").await;

    for _ in 0..5 {
        srv.login("midsession@example.com", "wrong").await;
    }

    let (status, body) = srv.get(&token, "/auth/me").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "account_locked");
}
