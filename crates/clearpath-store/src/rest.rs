//! REST backend for the hosted Identity Store.
//!
//! Auth goes through the password-grant token endpoint; rows go through
//! PostgREST-style endpoints (`/rest/v1/{table}` with `col=eq.val`
//! filters). Every request carries the project anon key; row requests
//! additionally carry the session's bearer token so the backend can apply
//! its row-level rules.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use clearpath_types::session::Session;

use crate::{IdentityStore, Result, StoreError};

/// REST client for the hosted backend.
pub struct RestStore {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
}

/// Token endpoint response shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

impl RestStore {
    /// Create a client for the given project URL and anon key.
    ///
    /// Fails with [`StoreError::NotConfigured`] when either value is empty,
    /// so an unconfigured deployment short-circuits before any network call.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        if base_url.trim().is_empty() || anon_key.trim().is_empty() {
            return Err(StoreError::NotConfigured);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
            session: RwLock::new(None),
        })
    }

    /// Bearer token for row requests: the session token when signed in,
    /// the anon key otherwise.
    async fn bearer(&self) -> String {
        let session = self.session.read().await;
        session
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    /// Turn exact-match filters into PostgREST `col=eq.val` query pairs.
    fn filter_pairs(filters: &[(&str, &str)]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|(col, val)| ((*col).to_string(), format!("eq.{val}")))
            .collect()
    }

    /// Map a non-success response into a backend error with its body.
    async fn backend_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| format!("HTTP {status}"));
        StoreError::Backend { status, message }
    }
}

#[async_trait]
impl IdentityStore for RestStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(StoreError::Auth(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let session = Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
        };

        *self.session.write().await = Some(session.clone());
        debug!(email = %session.email, "signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let token = {
            let session = self.session.read().await;
            match session.as_ref() {
                Some(s) => s.access_token.clone(),
                None => return Ok(()),
            }
        };

        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        // The session is gone locally even if the backend revocation failed.
        *self.session.write().await = None;

        if !response.status().is_success() && response.status().as_u16() != 401 {
            return Err(StoreError::Auth(format!(
                "logout rejected: HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn restore_session(&self, session: Session) -> Result<()> {
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn select(&self, table: &str, filters: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(Self::filter_pairs(filters));

        let response = self
            .client
            .get(self.rest_url(table))
            .query(&pairs)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn count(&self, table: &str, filters: &[(&str, &str)]) -> Result<u64> {
        let mut pairs = vec![("select".to_string(), "id".to_string())];
        pairs.extend(Self::filter_pairs(filters));

        let response = self
            .client
            .head(self.rest_url(table))
            .query(&pairs)
            .header("apikey", &self.anon_key)
            .header("Prefer", "count=exact")
            .bearer_auth(self.bearer().await)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        // Total row count arrives as the denominator of Content-Range,
        // e.g. "0-9/42".
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        range
            .rsplit('/')
            .next()
            .and_then(|total| total.parse().ok())
            .ok_or_else(|| StoreError::Decode(format!("bad content-range: {range:?}")))
    }

    async fn update(&self, table: &str, filters: &[(&str, &str)], patch: Value) -> Result<()> {
        let response = self
            .client
            .patch(self.rest_url(table))
            .query(&Self::filter_pairs(filters))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(self.bearer().await)
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<()> {
        let response = self
            .client
            .post(self.rest_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("apikey", &self.anon_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .bearer_auth(self.bearer().await)
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_not_configured() {
        assert!(matches!(
            RestStore::new("", "key"),
            Err(StoreError::NotConfigured)
        ));
        assert!(matches!(
            RestStore::new("https://x.example.com", "  "),
            Err(StoreError::NotConfigured)
        ));
    }

    #[test]
    fn test_url_shapes() {
        let store =
            RestStore::new("https://proj.example.com/", "anon").expect("configured store");
        assert_eq!(
            store.rest_url("students"),
            "https://proj.example.com/rest/v1/students"
        );
        assert_eq!(
            store.auth_url("token"),
            "https://proj.example.com/auth/v1/token"
        );
    }

    #[test]
    fn test_filter_pairs() {
        let pairs = RestStore::filter_pairs(&[("email", "a@u.edu"), ("department", "Library")]);
        assert_eq!(
            pairs,
            vec![
                ("email".to_string(), "eq.a@u.edu".to_string()),
                ("department".to_string(), "eq.Library".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_bearer_falls_back_to_anon_key() {
        let store = RestStore::new("https://proj.example.com", "anon").expect("store");
        assert_eq!(store.bearer().await, "anon");

        store
            .restore_session(Session {
                user_id: "u-1".to_string(),
                email: "a@u.edu".to_string(),
                access_token: "tok".to_string(),
            })
            .await
            .expect("restore");
        assert_eq!(store.bearer().await, "tok");
    }
}
