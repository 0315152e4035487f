use crate::config::EnvConfig;
use crate::models::{Page, Profile, Role, Session, SessionUser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{ctx} ({status}): {message}")]
    Http {
        ctx: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Pull a readable message out of an auth/PostgREST error body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        })
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Clone, Debug)]
struct PageRow<'a> {
    page_number: u32,
    title: &'a str,
    body: &'a str,
}

impl<'a> From<&'a Page> for PageRow<'a> {
    fn from(p: &'a Page) -> Self {
        Self {
            page_number: p.number,
            title: &p.title,
            body: &p.body,
        }
    }
}

/// A `poems` row as the server returns it. Columns other than these are ignored.
#[derive(Deserialize, Clone, Debug)]
struct StoredRow {
    page_number: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

impl From<StoredRow> for Page {
    fn from(row: StoredRow) -> Self {
        Self {
            number: row.page_number,
            title: row.title,
            body: row.body,
        }
    }
}

const PAGE_COLUMNS: &str = "select=page_number,title,body";

fn decode_rows(body: &str) -> ApiResult<Vec<Page>> {
    let rows: Vec<StoredRow> = serde_json::from_str(body).map_err(ApiError::parse)?;
    Ok(rows.into_iter().map(Page::from).collect())
}

/// Client for the hosted auth + table service.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url,
            anon_key,
            token: None,
        }
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        Self::new(config.api_url.clone(), config.anon_key.clone())
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get_auth_header(&self) -> String {
        // Anonymous requests authenticate with the public key.
        format!("Bearer {}", self.token.as_deref().unwrap_or(&self.anon_key))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn profile_url(&self, user_id: &str) -> String {
        self.url(&format!(
            "/rest/v1/profiles?select=id,role&id=eq.{}",
            urlencoding::encode(user_id)
        ))
    }

    fn with_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", self.get_auth_header())
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        ctx: &'static str,
    ) -> ApiResult<reqwest::Response> {
        let res = self
            .with_headers(req)
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::Unauthorized)
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::Http {
                ctx,
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let req = reqwest::Client::new()
            .post(self.url("/auth/v1/token?grant_type=password"))
            .json(&SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
            });

        self.send(req, "Sign in failed")
            .await?
            .json()
            .await
            .map_err(ApiError::parse)
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        let req = reqwest::Client::new().post(self.url("/auth/v1/logout"));
        self.send(req, "Sign out failed").await.map(|_| ())
    }

    pub async fn get_user(&self) -> ApiResult<SessionUser> {
        let req = reqwest::Client::new().get(self.url("/auth/v1/user"));
        self.send(req, "Session check failed")
            .await?
            .json()
            .await
            .map_err(ApiError::parse)
    }

    pub async fn fetch_pages(&self) -> ApiResult<Vec<Page>> {
        let req = reqwest::Client::new().get(
            self.url(&format!("/rest/v1/poems?{PAGE_COLUMNS}&order=page_number.asc")),
        );
        let body = self
            .send(req, "Failed to load pages")
            .await?
            .text()
            .await
            .map_err(ApiError::network)?;
        decode_rows(&body)
    }

    pub async fn insert_page(&self, page: &Page) -> ApiResult<Page> {
        let req = reqwest::Client::new()
            .post(self.url(&format!("/rest/v1/poems?{PAGE_COLUMNS}")))
            .header("Prefer", "return=representation")
            .json(&PageRow::from(page));

        let body = self
            .send(req, "Failed to add page")
            .await?
            .text()
            .await
            .map_err(ApiError::network)?;

        decode_rows(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::parse("insert returned no rows"))
    }

    /// Insert or overwrite the row sharing `page.number`.
    pub async fn upsert_page(&self, page: &Page) -> ApiResult<()> {
        let req = reqwest::Client::new()
            .post(self.url("/rest/v1/poems?on_conflict=page_number"))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&PageRow::from(page));
        self.send(req, "Failed to save page").await.map(|_| ())
    }

    pub async fn fetch_profile(&self, user_id: &str) -> ApiResult<Option<Profile>> {
        let req = reqwest::Client::new().get(self.profile_url(user_id));
        let rows: Vec<Profile> = self
            .send(req, "Failed to load profile")
            .await?
            .json()
            .await
            .map_err(ApiError::parse)?;
        Ok(rows.into_iter().next())
    }

    /// Create the profile row with the default role unless one already exists.
    pub async fn ensure_profile(&self, user_id: &str) -> ApiResult<()> {
        let req = reqwest::Client::new()
            .post(self.url("/rest/v1/profiles?on_conflict=id"))
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&Profile {
                id: user_id.to_string(),
                role: Role::default(),
            });
        self.send(req, "Failed to create profile").await.map(|_| ())
    }

    /// Role for the signed-in user, creating the profile on first use.
    pub async fn load_role(&self, user_id: &str) -> ApiResult<Role> {
        if let Some(profile) = self.fetch_profile(user_id).await? {
            return Ok(profile.role);
        }
        self.ensure_profile(user_id).await?;
        Ok(self
            .fetch_profile(user_id)
            .await?
            .map(|p| p.role)
            .unwrap_or_default())
    }
}
