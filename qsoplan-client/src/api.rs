//! HTTP client for the QSO Plan API
//!
//! Async wrapper over the server's REST endpoints. Authenticated calls
//! send the session's bearer token; when the server answers 401 the
//! client mints a fresh access token from the refresh token and retries
//! once. If the refresh is rejected too, the stored session is cleared
//! and the call fails with [`ClientError::SessionExpired`].
//!
//! Server error bodies come in a few shapes (`{"detail": "..."}`, field
//! maps, bare arrays). All of them fold into [`ClientError::Api`] with a
//! readable detail string.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::models::{
    CallsignMatch, ContactRecord, NewContact, ProfileUpdate, RankingEntry, RegistrationRequest,
    RegistrationResponse, TokenPair, UserProfile,
};
use crate::session::{Session, SessionStore};
use crate::validate;

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one QSO Plan server
pub struct ApiClient {
    http: Client,

    /// Server base URL without a trailing slash
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given server base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request a token pair for the given credentials
    ///
    /// The server uses the call sign as the username.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        debug!("Requesting token pair for {}", username);
        let response = self
            .http
            .post(self.url("/api/token/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "logging in"))?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Mint a fresh access token from a refresh token
    pub async fn refresh(&self, refresh: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct AccessToken {
            access: String,
        }

        let response = self
            .http
            .post(self.url("/api/token/refresh/"))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "refreshing token"))?;
        let token: AccessToken = Self::check(response).await?.json().await?;
        Ok(token.access)
    }

    /// Log in and persist the session
    ///
    /// Fetches the user's profile with the fresh tokens so the stored
    /// session knows its own call sign.
    pub async fn sign_in(
        &self,
        store: &mut SessionStore,
        username: &str,
        password: &str,
    ) -> Result<UserProfile> {
        let tokens = self.login(username, password).await?;
        let response = self
            .http
            .get(self.url("/api/user/profile/"))
            .bearer_auth(&tokens.access)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "fetching profile"))?;
        let profile: UserProfile = Self::check(response).await?.json().await?;

        store.set(Session {
            access: tokens.access,
            refresh: tokens.refresh,
            user: profile.clone(),
        })?;
        Ok(profile)
    }

    /// Fetch the logged-in user's profile and refresh the stored copy
    pub async fn fetch_profile(&self, store: &mut SessionStore) -> Result<UserProfile> {
        let url = self.url("/api/user/profile/");
        let response = self
            .authed(store, |http, access| {
                http.get(url.as_str()).bearer_auth(access)
            })
            .await?;
        let profile: UserProfile = Self::check(response).await?.json().await?;
        store.update_user(profile.clone())?;
        Ok(profile)
    }

    /// Update profile fields the server allows changing
    ///
    /// The call sign is read-only server-side, so it is not part of
    /// [`ProfileUpdate`] at all.
    pub async fn update_profile(
        &self,
        store: &mut SessionStore,
        update: &ProfileUpdate,
    ) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".to_string()));
        }
        let update = ProfileUpdate {
            email: update.email.as_ref().map(|email| email.trim().to_string()),
            default_grid_square: match &update.default_grid_square {
                Some(grid) => Some(validate::normalize_locator(grid)?),
                None => None,
            },
        };

        let url = self.url("/api/user/profile/");
        let response = self
            .authed(store, |http, access| {
                http.put(url.as_str()).bearer_auth(access).json(&update)
            })
            .await?;
        let profile: UserProfile = Self::check(response).await?.json().await?;
        store.update_user(profile.clone())?;
        Ok(profile)
    }

    /// Change the account password
    pub async fn change_password(
        &self,
        store: &mut SessionStore,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let url = self.url("/api/user/change-password/");
        let response = self
            .authed(store, |http, access| {
                http.post(url.as_str()).bearer_auth(access).json(&json!({
                    "old_password": old_password,
                    "new_password": new_password,
                }))
            })
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Register a new account
    ///
    /// Accounts start inactive; the response message tells the user to
    /// wait for admin approval before logging in.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<RegistrationResponse> {
        let request = RegistrationRequest {
            email: request.email.trim().to_string(),
            call_sign: validate::normalize_call_sign(&request.call_sign)?,
            default_grid_square: validate::normalize_locator(&request.default_grid_square)?,
            password: request.password.clone(),
        };

        debug!("Registering call sign {}", request.call_sign);
        let response = self
            .http
            .post(self.url("/api/register/"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "registering"))?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Fetch the logged-in user's contact records, newest first
    pub async fn list_contacts(&self, store: &mut SessionStore) -> Result<Vec<ContactRecord>> {
        let url = self.url("/api/qsos/");
        let response = self
            .authed(store, |http, access| {
                http.get(url.as_str()).bearer_auth(access)
            })
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Log a new contact
    ///
    /// The contact is normalized and validated locally first, so most
    /// rejections surface as [`ClientError::Validation`] without a round
    /// trip.
    pub async fn create_contact(
        &self,
        store: &mut SessionStore,
        contact: NewContact,
    ) -> Result<ContactRecord> {
        let own_call_sign = store.require()?.user.call_sign.clone();
        let contact = validate::validated_contact(contact, &own_call_sign)?;

        debug!(
            "Logging contact with {} on {} MHz",
            contact.recipient, contact.frequency
        );
        let url = self.url("/api/qsos/");
        let response = self
            .authed(store, |http, access| {
                http.post(url.as_str()).bearer_auth(access).json(&contact)
            })
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Delete a contact record
    ///
    /// The server refuses to delete confirmed contacts; that surfaces as
    /// a [`ClientError::Api`] with the server's detail message.
    pub async fn delete_contact(&self, store: &mut SessionStore, id: i64) -> Result<()> {
        let url = self.url(&format!("/api/qsos/{}/", id));
        let response = self
            .authed(store, |http, access| {
                http.delete(url.as_str()).bearer_auth(access)
            })
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Fetch the public rankings, no login required
    pub async fn rankings(&self) -> Result<Vec<RankingEntry>> {
        let response = self
            .http
            .get(self.url("/api/qsos/rankings/"))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "fetching rankings"))?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Search call signs by prefix
    ///
    /// The server requires at least two characters and caps the result
    /// list, so shorter queries return empty without a round trip.
    pub async fn search_callsigns(
        &self,
        store: &mut SessionStore,
        query: &str,
    ) -> Result<Vec<CallsignMatch>> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }

        let url = self.url("/api/users/callsigns/");
        let response = self
            .authed(store, |http, access| {
                http.get(url.as_str())
                    .bearer_auth(access)
                    .query(&[("search", query)])
            })
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Send an authenticated request, refreshing the access token once
    /// on 401
    async fn authed<F>(&self, store: &mut SessionStore, build: F) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let access = store.require()?.access.clone();
        let response = build(&self.http, &access)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "sending request"))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Access token rejected, attempting refresh");
        let refresh = store.require()?.refresh.clone();
        let access = match self.refresh(&refresh).await {
            Ok(access) => access,
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                store.clear()?;
                return Err(ClientError::SessionExpired);
            }
        };
        store.update_access(access.clone())?;

        build(&self.http, &access)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, "sending request"))
    }

    /// Turn a non-success response into [`ClientError::Api`]
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            detail: extract_error_detail(status, &body),
        })
    }
}

/// Fold the server's error body shapes into one detail string
fn extract_error_detail(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    match value {
        Value::String(message) => message,
        Value::Array(items) => {
            let joined = join_messages(&items);
            if joined.is_empty() {
                fallback()
            } else {
                joined
            }
        }
        Value::Object(map) => {
            if let Some(detail) = map.get("detail") {
                return match detail {
                    Value::String(message) => message.clone(),
                    other => other.to_string(),
                };
            }
            // Validation failures come as {field: ["msg", ...]} maps.
            let parts: Vec<String> = map
                .iter()
                .map(|(field, messages)| {
                    let text = match messages {
                        Value::String(message) => message.clone(),
                        Value::Array(items) => join_messages(items),
                        other => other.to_string(),
                    };
                    if field == "non_field_errors" {
                        text
                    } else {
                        format!("{}: {}", field, text)
                    }
                })
                .collect();
            if parts.is_empty() {
                fallback()
            } else {
                parts.join("; ")
            }
        }
        _ => fallback(),
    }
}

fn join_messages(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
