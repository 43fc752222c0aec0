use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use shelfwise_auth::{JwtClaims, Role};
use shelfwise_core::{InventoryId, UserId};
use shelfwise_infra::AppConfig;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "admin@example.com";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory backend), bound to an ephemeral port.
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
            ..AppConfig::default()
        };
        let app = shelfwise_api::app::build_app(&config).await.expect("failed to build app");
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

    /// Register an account and sign in; returns (token, user id).
    async fn user(&self, email: &str) -> (String, String) {
        let res = self
            .client
            .post(self.url("/auth/sign-up"))
            .json(&json!({ "email": email, "password": "correct horse", "full_name": "Test Person" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let profile: Value = res.json().await.unwrap();

        let res = self
            .client
            .post(self.url("/auth/sign-in"))
            .json(&json!({ "email": email, "password": "correct horse" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let session: Value = res.json().await.unwrap();

        (
            session["access_token"].as_str().unwrap().to_string(),
            profile["id"].as_str().unwrap().to_string(),
        )
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// A template with one field of every kind, plus an inventory using it.
    async fn inventory(&self, token: &str, is_public: bool) -> String {
        let res = self
            .post(
                token,
                "/templates",
                json!({
                    "name": "Equipment",
                    "is_public": true,
                    "fields": [
                        { "name": "Serial", "type": "text", "required": true },
                        { "name": "Active", "type": "boolean", "required": true },
                        { "name": "Color", "type": "select", "options": ["Red", "Blue"] },
                        { "name": "Weight", "type": "number" },
                        { "name": "Bought", "type": "date" }
                    ]
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let template: Value = res.json().await.unwrap();

        let res = self
            .post(
                token,
                "/inventories",
                json!({
                    "name": "Lab gear",
                    "template_id": template["id"],
                    "is_public": is_public,
                    "tags": "lab, shared, lab",
                    "custom_fields": { "Serial": "LAB-1" }
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let inventory: Value = res.json().await.unwrap();
        assert_eq!(inventory["tags"], json!(["lab", "shared"]));
        inventory["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId) -> String {
    let claims = JwtClaims::new(sub, Role::Admin, Utc::now(), ChronoDuration::minutes(10));
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Read SSE chunks until one contains `needle`.
async fn read_until(res: &mut reqwest::Response, needle: &str) -> String {
    let mut seen = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !seen.contains(needle) {
        let chunk = tokio::time::timeout_at(deadline, res.chunk())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}; got {seen:?}"))
            .unwrap()
            .expect("stream ended");
        seen.push_str(&String::from_utf8_lossy(&chunk));
    }
    seen
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn forged_and_orphaned_tokens_are_rejected() {
    let srv = TestServer::spawn().await;

    let wrong_secret = mint_jwt("another-secret", UserId::new());
    assert_eq!(srv.get(&wrong_secret, "/whoami").await.status(), StatusCode::UNAUTHORIZED);

    // Correctly signed, but no such account.
    let orphan = mint_jwt(JWT_SECRET, UserId::new());
    assert_eq!(srv.get(&orphan, "/whoami").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_lifecycle_sign_up_sign_in_sign_out() {
    let srv = TestServer::spawn().await;
    let (token, user_id) = srv.user("Ada@Example.com").await;

    let res = srv.get(&token, "/auth/session").await;
    assert_eq!(res.status(), StatusCode::OK);
    let session: Value = res.json().await.unwrap();
    assert_eq!(session["profile"]["id"], user_id.as_str());
    assert_eq!(session["profile"]["email"], "ada@example.com");
    assert_eq!(session["profile"]["role"], "user");
    assert_eq!(session["initials"], "TP");

    let res = srv
        .client
        .post(srv.url("/auth/sign-in"))
        .json(&json!({ "email": "ada@example.com", "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.post(&token, "/auth/sign-out", json!({})).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get(&token, "/whoami").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_up_validation_names_the_field() {
    let srv = TestServer::spawn().await;
    srv.user("ada@example.com").await;

    let res = srv
        .client
        .post(srv.url("/auth/sign-up"))
        .json(&json!({ "email": "ADA@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "email");

    let res = srv
        .client
        .post(srv.url("/auth/sign-up"))
        .json(&json!({ "email": "bob@example.com", "password": "short" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn template_drafting_rejects_bad_fields() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.user("ada@example.com").await;

    let res = srv
        .post(
            &token,
            "/templates",
            json!({
                "name": "Books",
                "fields": [
                    { "name": "Genre", "type": "select", "options": [" ", ""] }
                ]
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "fields[0].options");

    let res = srv
        .post(
            &token,
            "/templates",
            json!({
                "name": "Books",
                "fields": [
                    { "name": "Author", "type": "text" },
                    { "name": "Author", "type": "text" }
                ]
            }),
        )
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "fields[1].name");

    let res = srv.post(&token, "/templates", json!({ "name": "   " })).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "name");
}

#[tokio::test]
async fn inventory_creation_checks_required_template_fields() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.user("ada@example.com").await;

    let template: Value = srv
        .post(
            &token,
            "/templates",
            json!({ "name": "Assets", "fields": [{ "name": "Serial", "type": "text", "required": true }] }),
        )
        .await
        .json()
        .await
        .unwrap();

    let res = srv
        .post(&token, "/inventories", json!({ "name": "Office", "template_id": template["id"] }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "Serial");

    let res = srv
        .post(
            &token,
            "/inventories",
            json!({ "name": "Office", "template_id": template["id"], "custom_fields": { "Serial": "OF-1" } }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn item_lifecycle_validates_custom_fields() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.user("ada@example.com").await;
    let inventory_id = srv.inventory(&token, false).await;
    let items_path = format!("/inventories/{inventory_id}/items");

    // Required text field left blank.
    let res = srv
        .post(&token, &items_path, json!({ "name": "Scope", "custom_fields": { "Serial": "  " } }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "Serial");

    // Option outside the select's list.
    let res = srv
        .post(
            &token,
            &items_path,
            json!({ "name": "Scope", "custom_fields": { "Serial": "A1", "Color": "Green" } }),
        )
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "Color");

    // Negative quantity.
    let res = srv
        .post(
            &token,
            &items_path,
            json!({ "name": "Scope", "quantity": -1, "custom_fields": { "Serial": "A1" } }),
        )
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "quantity");

    // Boolean "Active" may be omitted even though it is required.
    let res = srv
        .post(
            &token,
            &items_path,
            json!({
                "name": "Scope",
                "tags": ["optics"],
                "custom_fields": { "Serial": "A1", "Color": "Blue", "Weight": "1234.5", "Bought": "2024-03-01" }
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let item_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["quantity"], 1);
    assert_eq!(created["custom_fields"]["Active"], false);
    assert_eq!(created["custom_fields"]["Weight"], 1234.5);

    let res = srv.get(&token, &format!("{items_path}/{item_id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail: Value = res.json().await.unwrap();
    let displays: Vec<(&str, &str)> = detail["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap(), f["display"].as_str().unwrap()))
        .collect();
    assert_eq!(
        displays,
        vec![
            ("Serial", "A1"),
            ("Active", "No"),
            ("Color", "Blue"),
            ("Weight", "1,234.5"),
            ("Bought", "2024-03-01"),
        ]
    );

    let second = srv
        .post(&token, &items_path, json!({ "name": "Probe", "custom_fields": { "Serial": "B2" } }))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);

    let listing: Value = srv.get(&token, &items_path).await.json().await.unwrap();
    assert_eq!(listing["summary_fields"], json!(["Serial", "Active"]));
    let names: Vec<&str> = listing["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Probe", "Scope"]);

    let detail: Value = srv.get(&token, &format!("/inventories/{inventory_id}")).await.json().await.unwrap();
    assert_eq!(detail["item_count"], 2);
    assert_eq!(detail["can_edit"], true);
    assert_eq!(detail["template"]["name"], "Equipment");
}

#[tokio::test]
async fn private_and_public_inventories_enforce_access() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.user("owner@example.com").await;
    let (other, _) = srv.user("other@example.com").await;

    let private_id = srv.inventory(&owner, false).await;
    let public_id = srv.inventory(&owner, true).await;

    let res = srv.get(&other, &format!("/inventories/{private_id}")).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.get(&other, &format!("/inventories/{public_id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail: Value = res.json().await.unwrap();
    assert_eq!(detail["can_edit"], false);

    let res = srv
        .post(
            &other,
            &format!("/inventories/{public_id}/items"),
            json!({ "name": "Sneaky", "custom_fields": { "Serial": "X" } }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let missing = InventoryId::new();
    let res = srv.get(&other, &format!("/inventories/{missing}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.get(&other, "/inventories/not-an-id").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let own: Value = srv.get(&other, "/inventories").await.json().await.unwrap();
    assert!(own.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn likes_are_idempotent() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.user("owner@example.com").await;
    let (fan, _) = srv.user("fan@example.com").await;
    let inventory_id = srv.inventory(&owner, true).await;
    let like_path = format!("/inventories/{inventory_id}/like");

    srv.post(&fan, &like_path, json!({})).await;
    let state: Value = srv.post(&fan, &like_path, json!({})).await.json().await.unwrap();
    assert_eq!(state, json!({ "liked": true, "like_count": 1 }));

    let res = srv.client.delete(srv.url(&like_path)).bearer_auth(&fan).send().await.unwrap();
    let state: Value = res.json().await.unwrap();
    assert_eq!(state["like_count"], 0);
}

#[tokio::test]
async fn discussion_thread_drafts_and_push() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.user("owner@example.com").await;
    let (guest, guest_id) = srv.user("guest@example.com").await;
    let inventory_id = srv.inventory(&owner, true).await;
    let thread_path = format!("/inventories/{inventory_id}/discussions");
    let draft_path = format!("{thread_path}/draft");

    let res = srv
        .client
        .put(srv.url(&draft_path))
        .bearer_auth(&guest)
        .json(&json!({ "body": "half a thought" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let draft: Value = srv.get(&guest, &draft_path).await.json().await.unwrap();
    assert_eq!(draft["body"], "half a thought");

    let mut stream = srv.get(&owner, &format!("{thread_path}/stream")).await;
    assert_eq!(stream.status(), StatusCode::OK);

    let res = srv.post(&guest, &thread_path, json!({ "body": "   " })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "body");

    let res = srv.post(&guest, &thread_path, json!({ "body": "  first!  " })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let posted: Value = res.json().await.unwrap();
    assert_eq!(posted["body"], "first!");
    assert_eq!(posted["author"]["id"], guest_id.as_str());

    let pushed = read_until(&mut stream, "first!").await;
    assert!(pushed.contains("event: discussion.message_posted"));

    srv.post(&owner, &thread_path, json!({ "body": "welcome" })).await;
    let thread: Value = srv.get(&guest, &thread_path).await.json().await.unwrap();
    let bodies: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["first!", "welcome"]);
    assert_eq!(thread[0]["author"]["display_name"], "Test Person");

    // Posting cleared the draft.
    let draft: Value = srv.get(&guest, &draft_path).await.json().await.unwrap();
    assert!(draft.is_null());

    let too_long = "x".repeat(1001);
    let res = srv.post(&guest, &thread_path, json!({ "body": too_long })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn presence_tracks_open_streams() {
    let srv = TestServer::spawn().await;
    let (owner, owner_id) = srv.user("owner@example.com").await;
    let (viewer, viewer_id) = srv.user("viewer@example.com").await;
    let inventory_id = srv.inventory(&owner, true).await;
    let presence_path = format!("/inventories/{inventory_id}/presence");

    let mut owner_stream = srv.get(&owner, &format!("{presence_path}/stream")).await;
    assert_eq!(owner_stream.status(), StatusCode::OK);
    let owner_sync = read_until(&mut owner_stream, "presence.sync").await;
    assert!(owner_sync.contains(r#""viewers":[]"#), "lone viewer saw someone: {owner_sync}");

    let mut stream = srv.get(&viewer, &format!("{presence_path}/stream")).await;
    assert_eq!(stream.status(), StatusCode::OK);
    let first = read_until(&mut stream, "presence.sync").await;
    assert!(first.contains(&owner_id));
    assert!(!first.contains(&viewer_id), "viewer listed in their own roster: {first}");

    // The owner hears about the viewer, never about themselves.
    let owner_seen = read_until(&mut owner_stream, &viewer_id).await;
    assert!(owner_seen.contains("event: presence.join"));
    assert!(!owner_seen.contains(&owner_id));

    let others: Value = srv.get(&owner, &presence_path).await.json().await.unwrap();
    assert_eq!(others.as_array().unwrap().len(), 1);
    assert_eq!(others[0]["user_id"], viewer_id.as_str());

    let own_view: Value = srv.get(&viewer, &presence_path).await.json().await.unwrap();
    assert_eq!(own_view.as_array().unwrap().len(), 1);
    assert_eq!(own_view[0]["user_id"], owner_id.as_str());

    // The server notices the disconnect on its next write at the latest,
    // which is the keep-alive ping.
    drop(stream);
    for _ in 0..100 {
        let others: Value = srv.get(&owner, &presence_path).await.json().await.unwrap();
        if others.as_array().unwrap().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    panic!("viewer did not leave after closing the stream");
}

#[tokio::test]
async fn admin_views_are_admin_only() {
    let srv = TestServer::spawn().await;
    let (user, _) = srv.user("user@example.com").await;
    let (admin, _) = srv.user(ADMIN_EMAIL).await;
    srv.inventory(&user, true).await;

    let res = srv.get(&user, "/admin/stats").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.get(&admin, "/admin/stats").await;
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["totals"]["users"], 2);
    assert_eq!(stats["totals"]["templates"], 1);
    assert_eq!(stats["totals"]["inventories"], 1);
    assert_eq!(stats["recent_templates"][0]["field_count"], 5);
    assert_eq!(stats["recent_templates"][0]["owner"]["email"], "user@example.com");

    let users: Value = srv.get(&admin, "/admin/users").await.json().await.unwrap();
    let user_row = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "user@example.com")
        .unwrap();
    assert_eq!(user_row["template_count"], 1);
    assert_eq!(user_row["inventory_count"], 1);

    let res = srv.get(&admin, "/admin/templates").await;
    assert_eq!(res.status(), StatusCode::OK);
}
