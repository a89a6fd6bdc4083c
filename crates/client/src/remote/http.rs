//! HTTP implementation of [`Remote`] for the Supabase + tRPC backend.
//!
//! Uses `reqwest` 0.13 for HTTP. Caches `user.searchUser` lookups using
//! `moka` (1-minute TTL).

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{AuthFlow, Endpoint, Procedure, Remote, RemoteError, Table};
use crate::config::BackendConfig;

/// Characters of a response body kept in logs and errors.
const BODY_PREVIEW: usize = 200;

/// Backend client over HTTP.
#[derive(Clone)]
pub struct HttpRemote {
    inner: Arc<HttpRemoteInner>,
}

struct HttpRemoteInner {
    client: reqwest::Client,
    supabase_url: String,
    api_base_url: String,
    anon_key: String,
    access_token: RwLock<Option<SecretString>>,
    cache: Cache<String, Value>,
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("supabase_url", &self.inner.supabase_url)
            .field("api_base_url", &self.inner.api_base_url)
            .finish_non_exhaustive()
    }
}

impl HttpRemote {
    /// Create a client for the configured backend.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(HttpRemoteInner {
                client: reqwest::Client::new(),
                supabase_url: config.supabase_url.as_str().trim_end_matches('/').to_owned(),
                api_base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
                anon_key: config.anon_key().to_owned(),
                access_token: RwLock::new(None),
                cache,
            }),
        }
    }

    fn procedure_url(&self, procedure: Procedure) -> String {
        format!("{}/api/trpc/{}", self.inner.api_base_url, procedure.path())
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.inner.supabase_url, table.name())
    }

    fn auth_url(&self, flow: AuthFlow) -> String {
        match flow {
            AuthFlow::SignIn => format!("{}/auth/v1/token?grant_type=password", self.inner.supabase_url),
            AuthFlow::SignUp => format!("{}/auth/v1/signup", self.inner.supabase_url),
        }
    }

    /// Bearer token: the user's session when signed in, else the anon key.
    fn bearer(&self) -> String {
        self.inner
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or_else(
                || self.inner.anon_key.clone(),
                |token| token.expose_secret().to_owned(),
            )
    }

    fn supabase_request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(self.bearer())
            .header("Content-Type", "application/json")
    }

    /// Send a request and parse the JSON body.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;
        let preview: String = text.chars().take(BODY_PREVIEW).collect();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized(preview));
        }
        if !status.is_success() {
            tracing::warn!(status = %status, body = %preview, "backend returned non-success status");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(error = %e, body = %preview, "failed to parse backend response");
            RemoteError::Parse(e)
        })
    }

    async fn call_procedure(
        &self,
        procedure: Procedure,
        input: &Value,
        write: bool,
    ) -> Result<Value, RemoteError> {
        let url = self.procedure_url(procedure);
        let envelope = json!({ "json": input });
        let request = if write {
            self.inner.client.post(&url).json(&envelope)
        } else {
            let encoded = urlencoding::encode(&envelope.to_string()).into_owned();
            self.inner.client.get(format!("{url}?input={encoded}"))
        };
        let request = request.bearer_auth(self.bearer());
        let response = self.execute(request).await?;
        Ok(unwrap_trpc(response))
    }

    async fn select(&self, table: Table, filters: &Value) -> Result<Value, RemoteError> {
        let mut query = vec![("select".to_owned(), "*".to_owned())];
        query.extend(equality_filters(filters)?);
        let url = with_query(&self.table_url(table), &query)?;
        let request = self.supabase_request(self.inner.client.get(url));
        self.execute(request).await
    }

    async fn upsert(&self, table: Table, rows: &Value) -> Result<Value, RemoteError> {
        let request = self
            .supabase_request(self.inner.client.post(self.table_url(table)))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        self.execute(request).await
    }

    async fn delete(&self, table: Table, filters: &Value) -> Result<Value, RemoteError> {
        let query = equality_filters(filters)?;
        if query.is_empty() {
            return Err(RemoteError::Unsupported(format!(
                "refusing unfiltered delete on {}",
                table.name()
            )));
        }
        let url = with_query(&self.table_url(table), &query)?;
        let request = self.supabase_request(self.inner.client.delete(url));
        self.execute(request).await
    }

    async fn authenticate(&self, flow: AuthFlow, payload: &Value) -> Result<Value, RemoteError> {
        let request = self
            .inner
            .client
            .post(self.auth_url(flow))
            .header("apikey", &self.inner.anon_key)
            .json(payload);
        self.execute(request).await
    }
}

#[async_trait]
impl Remote for HttpRemote {
    #[instrument(skip(self, payload), fields(endpoint = %endpoint))]
    async fn mutate(&self, endpoint: &Endpoint, payload: &Value) -> Result<Value, RemoteError> {
        match *endpoint {
            Endpoint::Procedure(procedure) => self.call_procedure(procedure, payload, true).await,
            Endpoint::Table(table) => self.upsert(table, payload).await,
            Endpoint::TableDelete(table) => self.delete(table, payload).await,
            Endpoint::Auth(flow) => self.authenticate(flow, payload).await,
        }
    }

    #[instrument(skip(self, params), fields(endpoint = %endpoint))]
    async fn query(&self, endpoint: &Endpoint, params: &Value) -> Result<Value, RemoteError> {
        match *endpoint {
            Endpoint::Procedure(Procedure::UserSearchUser) => {
                let cache_key = format!("searchUser:{params}");
                if let Some(hit) = self.inner.cache.get(&cache_key).await {
                    debug!("user search cache hit");
                    return Ok(hit);
                }
                let result = self
                    .call_procedure(Procedure::UserSearchUser, params, false)
                    .await?;
                self.inner.cache.insert(cache_key, result.clone()).await;
                Ok(result)
            }
            Endpoint::Procedure(procedure) => self.call_procedure(procedure, params, false).await,
            Endpoint::Table(table) => self.select(table, params).await,
            Endpoint::TableDelete(_) | Endpoint::Auth(_) => {
                Err(RemoteError::Unsupported(format!("{endpoint} is write-only")))
            }
        }
    }

    fn set_access_token(&self, token: Option<SecretString>) {
        *self
            .inner
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}

/// tRPC wraps results as `{"result":{"data":{"json": ...}}}`.
fn unwrap_trpc(response: Value) -> Value {
    response
        .pointer("/result/data/json")
        .or_else(|| response.pointer("/result/data"))
        .cloned()
        .unwrap_or(response)
}

fn with_query(base: &str, pairs: &[(String, String)]) -> Result<url::Url, RemoteError> {
    url::Url::parse_with_params(base, pairs)
        .map_err(|e| RemoteError::Unsupported(format!("invalid URL {base}: {e}")))
}

/// Turn `{"user_id": "x", "date": "2026-10-17"}` into PostgREST `eq.` filters.
fn equality_filters(filters: &Value) -> Result<Vec<(String, String)>, RemoteError> {
    let Some(object) = filters.as_object() else {
        return match filters {
            Value::Null => Ok(Vec::new()),
            _ => Err(RemoteError::Unsupported(
                "table filters must be a JSON object".to_owned(),
            )),
        };
    };
    Ok(object
        .iter()
        .map(|(column, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (column.clone(), format!("eq.{value}"))
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn remote() -> HttpRemote {
        let config = crate::config::ClientConfig::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("https://abcd.supabase.co/".to_owned()),
            "SUPABASE_ANON_KEY" => Some("anon.jwt.value".to_owned()),
            "BARBUDDY_API_BASE_URL" => Some("https://api.barbuddy.app".to_owned()),
            _ => None,
        })
        .unwrap();
        HttpRemote::new(config.backend.as_ref().unwrap())
    }

    #[test]
    fn test_urls() {
        let remote = remote();
        assert_eq!(
            remote.procedure_url(Procedure::ChatGetMessages),
            "https://api.barbuddy.app/api/trpc/chat.getMessages"
        );
        assert_eq!(
            remote.table_url(Table::DailyStats),
            "https://abcd.supabase.co/rest/v1/daily_stats"
        );
        assert_eq!(
            remote.auth_url(AuthFlow::SignIn),
            "https://abcd.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_bearer_prefers_session_token() {
        let remote = remote();
        assert_eq!(remote.bearer(), "anon.jwt.value");
        remote.set_access_token(Some(SecretString::from("user.session.token")));
        assert_eq!(remote.bearer(), "user.session.token");
        remote.set_access_token(None);
        assert_eq!(remote.bearer(), "anon.jwt.value");
    }

    #[test]
    fn test_unwrap_trpc() {
        let wrapped = json!({"result": {"data": {"json": [{"id": "m1"}]}}});
        assert_eq!(unwrap_trpc(wrapped), json!([{"id": "m1"}]));
        assert_eq!(unwrap_trpc(json!({"result": {"data": 3}})), json!(3));
        assert_eq!(unwrap_trpc(json!([1])), json!([1]));
    }

    #[test]
    fn test_equality_filters() {
        let filters = equality_filters(&json!({"user_id": "#Sam12345", "limit": 5})).unwrap();
        assert!(filters.contains(&("user_id".to_owned(), "eq.#Sam12345".to_owned())));
        assert!(filters.contains(&("limit".to_owned(), "eq.5".to_owned())));
        assert!(equality_filters(&Value::Null).unwrap().is_empty());
        assert!(equality_filters(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_with_query_encodes_values() {
        let url = with_query(
            "https://abcd.supabase.co/rest/v1/friends",
            &[("user_id".to_owned(), "eq.#Sam 1".to_owned())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcd.supabase.co/rest/v1/friends?user_id=eq.%23Sam+1"
        );
    }
}
