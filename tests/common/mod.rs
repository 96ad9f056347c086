#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use storefront::notify::OrderHooks;
use tempfile::TempDir;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_hooks(OrderHooks::new()).await
    }

    pub async fn with_hooks(hooks: OrderHooks) -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        storefront::db::MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self::from_pool(pool, hooks).await
    }

    /// An app over a database file with a multi-connection pool, so that
    /// concurrent requests really run side by side. Keep the returned
    /// directory alive for the duration of the test.
    pub async fn on_disk() -> (Self, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite:{}", dir.path().join("storefront.db").display());
        let pool = storefront::db::init_pool(&url)
            .await
            .expect("Failed to open on-disk pool");

        (Self::from_pool(pool, OrderHooks::new()).await, dir)
    }

    async fn from_pool(pool: SqlitePool, hooks: OrderHooks) -> Self {
        let router = storefront::build_app(pool.clone(), false, hooks)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user (and their customer record) and return (user_id, invite_code).
    pub async fn create_user(&self, name: &str) -> (String, String) {
        let user = storefront::cli::create_user(&self.db, name, None, false)
            .await
            .expect("Failed to create test user");
        (user.id, user.invite_code)
    }

    /// Create a staff user and return (user_id, invite_code).
    pub async fn create_admin(&self, name: &str) -> (String, String) {
        let user = storefront::cli::create_user(&self.db, name, None, true)
            .await
            .expect("Failed to create test admin");
        (user.id, user.invite_code)
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, invite_code: &str) -> String {
        let body = serde_json::json!({ "invite_code": invite_code });
        let resp = self.post_json("/auth/login", &body, None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Create a staff user, log in and return the session cookie.
    pub async fn admin_cookie(&self) -> String {
        let (_id, invite_code) = self.create_admin("Admin").await;
        self.login(&invite_code).await
    }

    /// Create a regular user, log in and return (user_id, cookie).
    pub async fn customer_cookie(&self, name: &str) -> (String, String) {
        let (id, invite_code) = self.create_user(name).await;
        let cookie = self.login(&invite_code).await;
        (id, cookie)
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, None, cookie).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), cookie).await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response {
        self.send("PATCH", uri, Some(body), cookie).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response {
        self.send("PUT", uri, Some(body), cookie).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("DELETE", uri, None, cookie).await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> Response {
        self.request(json_request(method, uri, body, cookie)).await
    }

    /// Insert a collection directly and return its id.
    pub async fn seed_collection(&self, title: &str) -> i64 {
        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO collections (title) VALUES (?) RETURNING id")
                .bind(title)
                .fetch_one(&self.db)
                .await
                .expect("Failed to seed collection");
        id
    }

    /// Insert a product directly and return its id. `price` is a decimal string.
    pub async fn seed_product(&self, collection_id: i64, title: &str, price: &str) -> i64 {
        let now = chrono::Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO products (title, price, inventory, last_updated, collection_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(price)
        .bind(100)
        .bind(now)
        .bind(collection_id)
        .fetch_one(&self.db)
        .await
        .expect("Failed to seed product");
        id
    }

    /// Create a cart through the API and return its id.
    pub async fn create_cart(&self) -> String {
        let resp = self.post_json("/carts", &serde_json::json!({}), None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        json["id"].as_str().unwrap().to_string()
    }

    /// Add a product to a cart through the API.
    pub async fn add_to_cart(&self, cart_id: &str, product_id: i64, quantity: i64) -> Response {
        let body = serde_json::json!({ "product_id": product_id, "quantity": quantity });
        self.post_json(&format!("/carts/{cart_id}/items"), &body, None).await
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&self.db).await.unwrap();
        count
    }
}

/// Build a request with an optional JSON body and session cookie.
pub fn json_request(
    method: &str,
    uri: &str,
    body: Option<&Value>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let body = body_string(resp).await;
    serde_json::from_str(&body).unwrap_or_else(|_| panic!("Expected JSON body, got {body}"))
}

/// Assert that a response carries the given status and error message.
pub async fn assert_error(resp: Response, status: StatusCode, message: &str) {
    assert_eq!(resp.status(), status);
    let json = body_json(resp).await;
    assert_eq!(json["error"], message);
}
