//! PostgREST client for the managed backend.
//!
//! Tables live under `{url}/rest/v1/{table}`. Filters use the `column=eq.value`
//! syntax, and writes send `Prefer: return=representation` so the stored rows
//! come back in the response body.
//!
//! Authentication sends the configured key both as `apikey` and as a bearer
//! token. Server deployments use the service-role key; the anon key works for
//! tables whose row-level policies allow it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Store, StoreError};
use crate::constants::{DELIVERIES_TABLE, UNIQUE_VIOLATION_CODE, USERS_TABLE};
use crate::models::{DeliveryPatch, DeliveryRecord, NewDeliveryRecord, NewUserProfile, UserProfile};

const RETURN_REPRESENTATION: &str = "return=representation";

/// PATCH body: the set fields of the patch plus a fresh `updated_at`
#[derive(Serialize)]
struct PatchBody<'a> {
    #[serde(flatten)]
    patch: &'a DeliveryPatch,
    updated_at: DateTime<Utc>,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
pub struct PostgrestError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

/// Store backed by the managed backend's REST API
#[derive(Clone)]
pub struct RestStore {
    inner: Arc<RestStoreInner>,
}

struct RestStoreInner {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Create a REST store client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP client
    /// fails to build.
    pub fn new(url: &str, api_key: &SecretString, timeout: Duration) -> Result<Self, StoreError> {
        let key = api_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| StoreError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| StoreError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestStoreInner {
                client,
                base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            }),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.inner.base_url, table)
    }

    /// GET rows from a table with the given query parameters
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.table_url(table))
            .query(query)
            .send()
            .await?;
        handle_response(response).await
    }

    /// POST rows to a table and return them as stored
    async fn insert<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .inner
            .client
            .post(self.table_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// PATCH matching rows and return them as updated
    async fn update<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .inner
            .client
            .patch(self.table_url(table))
            .query(query)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn delete(&self, table: &str, query: &[(&str, String)]) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .delete(self.table_url(table))
            .query(query)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(parse_error(response).await)
    }
}

/// Build an `eq.` filter value
fn eq(value: &str) -> String {
    format!("eq.{value}")
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Vec<T>, StoreError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| StoreError::Parse(format!("Failed to parse response: {e}")));
    }

    Err(parse_error(response).await)
}

async fn parse_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    error_from_body(status, &body)
}

/// Classify a PostgREST error response
fn error_from_body(status: u16, body: &str) -> StoreError {
    let Ok(error) = serde_json::from_str::<PostgrestError>(body) else {
        return StoreError::Api {
            status,
            code: None,
            message: body.to_string(),
        };
    };

    let mut message = error.message.unwrap_or_else(|| format!("HTTP {status}"));
    if let Some(details) = error.details.filter(|d| !d.is_empty()) {
        message = format!("{message} ({details})");
    }
    if let Some(hint) = error.hint.filter(|h| !h.is_empty()) {
        tracing::debug!("Backend hint: {}", hint);
    }

    if error.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        return StoreError::Duplicate(message);
    }

    StoreError::Api {
        status,
        code: error.code,
        message,
    }
}

#[async_trait]
impl Store for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _: Vec<serde_json::Value> = self
            .select(USERS_TABLE, &[("select", "id".to_string()), ("limit", "1".to_string())])
            .await?;
        Ok(())
    }

    async fn find_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let rows: Vec<UserProfile> = self
            .select(USERS_TABLE, &[("select", "*".to_string()), ("id", eq(id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> Result<UserProfile, StoreError> {
        let rows: Vec<UserProfile> = self.insert(USERS_TABLE, &profile).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Parse("Insert returned no profile row".to_string()))
    }

    async fn insert_deliveries(
        &self,
        records: Vec<NewDeliveryRecord>,
    ) -> Result<Vec<DeliveryRecord>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(DELIVERIES_TABLE, records.as_slice()).await
    }

    async fn list_deliveries(&self, owner_id: &str) -> Result<Vec<DeliveryRecord>, StoreError> {
        self.select(
            DELIVERIES_TABLE,
            &[
                ("select", "*".to_string()),
                ("user_id", eq(owner_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn update_delivery(
        &self,
        id: &str,
        patch: DeliveryPatch,
    ) -> Result<DeliveryRecord, StoreError> {
        let body = PatchBody {
            patch: &patch,
            updated_at: Utc::now(),
        };

        let rows: Vec<DeliveryRecord> = self
            .update(DELIVERIES_TABLE, &[("id", eq(id))], &body)
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn delete_delivery(&self, id: &str) -> Result<(), StoreError> {
        self.delete(DELIVERIES_TABLE, &[("id", eq(id))]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_duplicate() {
        let body = r#"{
            "code": "23505",
            "details": "Key (id)=(abc) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"users_pkey\""
        }"#;

        let err = error_from_body(409, body);
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_other_errors_keep_status_and_code() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"users\" does not exist"}"#;

        match error_from_body(404, body) {
            StoreError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("42P01"));
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_error_body() {
        let err = error_from_body(502, "Bad Gateway");
        assert!(matches!(
            err,
            StoreError::Api { status: 502, code: None, ref message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_new_builds_table_urls() {
        let key = SecretString::from("service-key".to_string());
        let store = RestStore::new("https://example.supabase.co/", &key, Duration::from_secs(5))
            .unwrap();

        assert_eq!(
            store.table_url(DELIVERIES_TABLE),
            "https://example.supabase.co/rest/v1/deliveries"
        );
        assert_eq!(store.backend(), "rest");
    }

    #[test]
    fn test_patch_body_only_sends_set_fields() {
        let patch = DeliveryPatch {
            optimized_order: Some(4),
            ..Default::default()
        };
        let body = serde_json::to_value(PatchBody {
            patch: &patch,
            updated_at: Utc::now(),
        })
        .unwrap();

        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["optimized_order"], 4);
        assert!(object.contains_key("updated_at"));
    }

    #[test]
    fn test_new_rejects_invalid_key() {
        let key = SecretString::from("bad\nkey".to_string());
        let result = RestStore::new("https://example.supabase.co", &key, Duration::from_secs(5));
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }
}
