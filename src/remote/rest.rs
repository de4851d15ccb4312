use crate::config::RemoteConfig;
use crate::errors::{AppError, Result};
use crate::remote::traits::{AuthService, DataService};
use crate::remote::types::{Filter, Query, Table};
use crate::session::{Credentials, Session};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Client for the hosted backend: PostgREST tables under `/rest/v1` and the
/// GoTrue auth API under `/auth/v1`.
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl RestBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("alugux/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Request with `apikey` and a bearer token: the session's when signed in,
    /// otherwise the anon key.
    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        };

        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn require_session(&self) -> Result<()> {
        if self.session.read().await.is_some() {
            Ok(())
        } else {
            Err(AppError::SessionMissing)
        }
    }
}

/// Turn a non-success response into `AppError::Remote` with the backend's message
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = remote_error_message(&body).unwrap_or_else(|| status.to_string());
    warn!(status = status.as_u16(), %message, "Remote call failed");
    Err(AppError::remote(status.as_u16(), message))
}

/// Pull the human-readable message out of a PostgREST or GoTrue error body
pub fn remote_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Total from a `Content-Range` header such as `0-24/573` or `*/0`
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), f.param_value()))
        .collect()
}

#[async_trait]
impl DataService for RestBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(query.table);
        debug!(%url, params = ?query.to_params(), "Selecting rows");

        let response = self
            .request(Method::GET, &url)
            .await
            .query(&query.to_params())
            .send()
            .await?;

        let rows: Vec<Value> = check(response).await?.json().await?;
        debug!(table = %query.table, rows = rows.len(), "Select returned");
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        let url = self.table_url(query.table);
        let mut params = filter_params(&query.filters);
        params.push(("select".to_string(), "id".to_string()));

        let response = self
            .request(Method::HEAD, &url)
            .await
            .header("Prefer", "count=exact")
            .query(&params)
            .send()
            .await?;

        let response = check(response).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| AppError::remote(response.status().as_u16(), "Missing Content-Range in count response"))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let url = self.table_url(table);
        debug!(%url, "Inserting row");

        let response = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let mut rows: Vec<Value> = check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(AppError::remote(500, format!("Insert into {table} returned no row")));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        let url = self.table_url(table);
        debug!(%url, filters = ?filter_params(filters), "Updating rows");

        let response = self
            .request(Method::PATCH, &url)
            .await
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .json(&patch)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[async_trait]
impl AuthService for RestBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.auth_url("token");
        let response = self
            .request(Method::POST, &url)
            .await
            .query(&[("grant_type", "password")])
            .json(credentials)
            .send()
            .await?;

        let session: Session = check(response).await?.json().await?;
        info!(user = %session.user.id, "Signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials, full_name: &str) -> Result<()> {
        let url = self.auth_url("signup");
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
            "data": { "full_name": full_name },
        });

        let response = self.request(Method::POST, &url).await.json(&body).send().await?;
        check(response).await?;
        info!(email = %credentials.email, "Account created");
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session.read().await.is_some() {
            let url = self.auth_url("logout");
            let response = self.request(Method::POST, &url).await.send().await?;
            check(response).await?;
        }
        *self.session.write().await = None;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<()> {
        self.require_session().await?;
        let url = self.auth_url("user");
        let response = self
            .request(Method::PUT, &url)
            .await
            .json(&json!({ "password": password }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update_full_name(&self, full_name: &str) -> Result<()> {
        self.require_session().await?;
        let url = self.auth_url("user");
        let response = self
            .request(Method::PUT, &url)
            .await
            .json(&json!({ "data": { "full_name": full_name } }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn reset_password_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let url = self.auth_url("recover");
        let response = self
            .request(Method::POST, &url)
            .await
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}
