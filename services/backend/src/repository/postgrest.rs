//! PostgREST client for the hosted database
//!
//! Talks to `<SUPABASE_URL>/rest/v1/<table>` with the service role key.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use super::retry::RetryStrategy;
use super::{Query, Rows, StoreError, StoreResult, TableStore};

pub struct PostgrestStore {
    http: Client,
    rest_url: String,
    api_key: String,
    retry: RetryStrategy,
}

impl PostgrestStore {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryStrategy,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            retry,
        })
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Prefer", "return=representation")
    }

    async fn execute(&self, request: RequestBuilder) -> StoreResult<Rows> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %body, "PostgREST request failed");
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_rows(&body)
    }

    /// Run an idempotent request, retrying transient failures
    async fn execute_with_retry<F>(&self, build: F) -> StoreResult<Rows>
    where
        F: Fn() -> RequestBuilder,
    {
        let strategy = &self.retry;
        let build = &build;
        backoff::future::retry(strategy.create_backoff(), || async move {
            self.execute(build()).await.map_err(|error| {
                if strategy.is_retryable(&error) {
                    tracing::warn!(error = %error, "Transient PostgREST failure, retrying");
                }
                strategy.classify(error)
            })
        })
        .await
    }
}

/// Empty bodies become no rows; a single object becomes one row.
fn decode_rows(body: &str) -> StoreResult<Rows> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(row) => Ok(vec![row]),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Rows> {
        let params = query.to_params();
        self.execute_with_retry(|| self.request(Method::GET, table).query(&params))
            .await
    }

    async fn insert(&self, table: &str, rows: &Value) -> StoreResult<Rows> {
        self.execute(self.request(Method::POST, table).json(rows))
            .await
    }

    async fn update(&self, table: &str, query: &Query, patch: &Value) -> StoreResult<Rows> {
        let params = query.to_params();
        self.execute_with_retry(|| {
            self.request(Method::PATCH, table)
                .query(&params)
                .json(patch)
        })
        .await
    }

    async fn delete(&self, table: &str, query: &Query) -> StoreResult<Rows> {
        let params = query.to_params();
        self.execute_with_retry(|| self.request(Method::DELETE, table).query(&params))
            .await
    }

    async fn ping(&self) -> StoreResult<()> {
        let query = Query::new().select("id").limit(1);
        self.select(shared::TABLE_USERS, &query).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rest_url_strips_trailing_slash() {
        let store = PostgrestStore::new(
            "https://example.supabase.co/",
            "key",
            Duration::from_secs(1),
            RetryStrategy::disabled(),
        )
        .unwrap();
        assert_eq!(store.rest_url(), "https://example.supabase.co/rest/v1");
    }

    #[test]
    fn test_decode_rows_shapes() {
        assert!(decode_rows("").unwrap().is_empty());
        assert!(decode_rows("null").unwrap().is_empty());
        assert_eq!(decode_rows(r#"{"id":"a"}"#).unwrap(), vec![json!({"id": "a"})]);
        assert_eq!(decode_rows(r#"[{"id":1},{"id":2}]"#).unwrap().len(), 2);
        assert!(matches!(decode_rows("<html>"), Err(StoreError::Decode(_))));
    }
}
