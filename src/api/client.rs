//! API client for the Commerce storefront REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the catalog, cart, order, account, and auth endpoints.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::models::{
    AuthSession, Cart, Category, NewProduct, Order, OrderStatus, Page, Product, ProductQuery,
    ProductUpdate, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Every endpoint wraps its payload in this envelope; success payloads live
/// under `data`, failures carry `message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    // No serde(default) here: it would force a `T: Default` bound on the
    // derived impl, and a missing key already decodes as None
    data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    phone: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// API client for the storefront backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the session is shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a new API client against `base_url`, authenticating through
    /// the injected session.
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ===== Request plumbing =====

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn bearer(token: &str) -> Result<header::HeaderValue, ApiError> {
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::Decode("access token is not a valid header value".to_string()))
    }

    /// Send an authenticated request. A stored access token, when present,
    /// rides along as `Authorization: Bearer <token>`; if the server answers
    /// 401 the token is refreshed and the request replayed exactly once.
    /// Network-level failures propagate immediately and are never retried.
    async fn dispatch(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = builder.build()?;
        let token = self.session.access_token()?;
        if let Some(ref token) = token {
            request
                .headers_mut()
                .insert(header::AUTHORIZATION, Self::bearer(token)?);
        }

        let replay = request.try_clone();
        let response = self.client.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Streaming bodies cannot be replayed; surface the 401 as-is
        let Some(mut replay) = replay else {
            return Ok(response);
        };

        debug!(url = %replay.url(), "got 401, refreshing access token");
        let fresh = self.refresh(token.as_deref()).await?;
        replay
            .headers_mut()
            .insert(header::AUTHORIZATION, Self::bearer(&fresh)?);

        // A second 401 propagates through the normal status mapping
        Ok(self.client.execute(replay).await?)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Concurrent 401s are coalesced: whoever holds the gate performs the
    /// refresh, and waiters that find the token already replaced reuse it
    /// instead of firing their own call. Any refresh failure, including a
    /// missing refresh token, clears the whole stored session.
    async fn refresh(&self, stale_token: Option<&str>) -> Result<String, ApiError> {
        let _gate = self.session.lock_refresh().await;

        if let Some(current) = self.session.access_token()? {
            if stale_token != Some(current.as_str()) {
                debug!("access token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token()? else {
            warn!("no refresh token stored, clearing session");
            self.clear_session_best_effort();
            return Err(ApiError::SessionExpired);
        };

        let result: Result<RefreshResponse, ApiError> = self
            .post_raw(
                "/auth/refresh",
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await;

        match result {
            Ok(refreshed) => {
                self.session.set_access_token(&refreshed.access_token)?;
                Ok(refreshed.access_token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing session");
                self.clear_session_best_effort();
                Err(ApiError::SessionExpired)
            }
        }
    }

    fn clear_session_best_effort(&self) {
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear stored session");
        }
    }

    /// POST without the 401-replay machinery. The auth endpoints establish
    /// or renew the session themselves; a 401 from them must surface rather
    /// than trigger another refresh.
    async fn post_raw<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::parse(response).await
    }

    /// Decode the response envelope, mapping error statuses to the
    /// `ApiError` taxonomy with the server message attached.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            return Err(ApiError::from_status(status, message, &body));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|err| ApiError::Decode(format!("unexpected response shape: {}", err)))?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response envelope has no data payload".to_string()))
    }

    /// Status check for endpoints whose payload we discard.
    async fn parse_empty(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message);
        Err(ApiError::from_status(status, message, &body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(self.request(Method::GET, path)).await?;
        Self::parse(response).await
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let response = self
            .dispatch(self.request(Method::GET, path).query(query))
            .await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .dispatch(self.request(Method::POST, path).json(body))
            .await?;
        Self::parse(response).await
    }

    async fn post_no_body<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(self.request(Method::POST, path)).await?;
        Self::parse(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .dispatch(self.request(Method::PUT, path).json(body))
            .await?;
        Self::parse(response).await
    }

    async fn put_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self
            .dispatch(self.request(Method::PUT, path).json(body))
            .await?;
        Self::parse_empty(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.dispatch(self.request(Method::DELETE, path)).await?;
        Self::parse_empty(response).await
    }

    // ===== Auth =====

    /// Log in and persist the full session (user record + both tokens).
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let auth: AuthSession = self
            .post_raw("/auth/login", &LoginRequest { email, password })
            .await
            .map_err(|err| match err {
                // Bad credentials arrive as a bare 401; give the caller a
                // login-shaped message instead of the token-expiry one
                ApiError::Unauthorized => {
                    ApiError::Rejected("invalid email or password".to_string())
                }
                other => other,
            })?;
        self.session.persist(&auth)?;
        debug!(user_id = auth.user_id, "logged in");
        Ok(auth.user())
    }

    /// Create an account; a successful signup also establishes a session.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: &str,
    ) -> Result<User, ApiError> {
        let auth: AuthSession = self
            .post_raw(
                "/auth/signup",
                &SignupRequest {
                    name,
                    email,
                    password,
                    phone,
                },
            )
            .await?;
        self.session.persist(&auth)?;
        debug!(user_id = auth.user_id, "registered");
        Ok(auth.user())
    }

    /// Log out. The remote call is best-effort; the local session is
    /// cleared no matter what, and calling this twice is harmless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        match self.dispatch(self.request(Method::POST, "/auth/logout")).await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "remote logout rejected, clearing local session anyway");
            }
            Err(err) => {
                warn!(error = %err, "remote logout failed, clearing local session anyway");
            }
            Ok(_) => {}
        }
        self.session.clear()?;
        Ok(())
    }

    // ===== Catalog =====

    /// Fetch a page of products, optionally filtered by keyword/category
    pub async fn products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        self.get_query("/products", query).await
    }

    /// Fetch a single product by id
    pub async fn product(&self, id: i64) -> Result<Product, ApiError> {
        self.get(&format!("/products/{}", id)).await
    }

    /// Keyword search over the catalog
    pub async fn search_products(
        &self,
        keyword: &str,
        query: &ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        let mut query = query.clone();
        query.keyword = Some(keyword.to_string());
        self.get_query("/products/search", &query).await
    }

    /// Fetch all categories
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get("/categories").await
    }

    /// Fetch a single category by id
    pub async fn category(&self, id: i64) -> Result<Category, ApiError> {
        self.get(&format!("/categories/{}", id)).await
    }

    // ===== Cart =====

    /// Fetch the current user's cart
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.get("/carts").await
    }

    /// Add a product to the cart, returning the updated cart
    pub async fn add_to_cart(&self, product_id: i64, quantity: u32) -> Result<Cart, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct AddItemRequest {
            product_id: i64,
            quantity: u32,
        }
        self.post(
            "/carts/items",
            &AddItemRequest {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Change the quantity of a cart line
    pub async fn update_cart_item(&self, item_id: i64, quantity: u32) -> Result<(), ApiError> {
        let path = format!("/carts/items/{}?quantity={}", item_id, quantity);
        let response = self.dispatch(self.request(Method::PATCH, &path)).await?;
        Self::parse_empty(response).await
    }

    /// Remove a single line from the cart
    pub async fn remove_cart_item(&self, item_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/carts/items/{}", item_id)).await
    }

    /// Empty the cart
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.delete("/carts").await
    }

    // ===== Orders =====

    /// Place an order from the current cart contents
    pub async fn create_order(&self) -> Result<Order, ApiError> {
        self.post_no_body("/orders").await
    }

    /// Fetch the current user's order history
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders").await
    }

    /// Fetch a single order by id
    pub async fn order(&self, id: i64) -> Result<Order, ApiError> {
        self.get(&format!("/orders/{}", id)).await
    }

    /// Cancel an order that has not shipped yet
    pub async fn cancel_order(&self, id: i64) -> Result<Order, ApiError> {
        self.post_no_body(&format!("/orders/{}/cancel", id)).await
    }

    // ===== Account =====

    /// Update the profile fields of the logged-in user
    pub async fn update_profile(&self, name: &str, phone: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct UpdateProfileRequest<'a> {
            name: &'a str,
            phone: &'a str,
        }
        self.put_empty("/users/profile", &UpdateProfileRequest { name, phone })
            .await
    }

    /// Change the logged-in user's password
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ChangePasswordRequest<'a> {
            old_password: &'a str,
            new_password: &'a str,
        }
        self.put_empty(
            "/users/password",
            &ChangePasswordRequest {
                old_password,
                new_password,
            },
        )
        .await
    }

    // ===== Admin =====

    /// Create a catalog product (admin only)
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        self.post("/admin/products", product).await
    }

    /// Update a catalog product (admin only)
    pub async fn update_product(
        &self,
        id: i64,
        changes: &ProductUpdate,
    ) -> Result<Product, ApiError> {
        self.put(&format!("/admin/products/{}", id), changes).await
    }

    /// Delete a catalog product (admin only)
    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/admin/products/{}", id)).await
    }

    /// Create a category (admin only)
    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        self.post("/admin/categories", &serde_json::json!({ "name": name }))
            .await
    }

    /// Rename a category (admin only)
    pub async fn update_category(&self, id: i64, name: &str) -> Result<Category, ApiError> {
        self.put(
            &format!("/admin/categories/{}", id),
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    /// Delete a category (admin only)
    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/admin/categories/{}", id)).await
    }

    /// Fetch every order across all users (admin only)
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/admin/orders").await
    }

    /// Move an order to a new fulfillment status (admin only)
    pub async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let response = self
            .dispatch(
                self.request(Method::PATCH, &format!("/admin/orders/{}/status", id))
                    .json(&serde_json::json!({ "status": status })),
            )
            .await?;
        Self::parse(response).await
    }
}
