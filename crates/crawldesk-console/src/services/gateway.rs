//! Typed gateway over the backend REST API.
//!
//! Every endpoint answers with the same envelope; [`interpret`] turns a raw
//! exchange into either the `data` payload or a [`DashboardError`].

use std::rc::Rc;

use crawldesk_api_models::{
    AccessIpRequest, AccessListKind, ApiEnvelope, IpPolicy, IpRecord, LocalIpRequest, PoolStats,
    TaskCreateRequest, paths,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::services::transport::{ApiRequest, RawResponse, Transport};

const FALLBACK_FAILURE: &str = "request failed";

/// Shared, stateless gateway. Cloning is cheap.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Rc<dyn Transport>,
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway").finish_non_exhaustive()
    }
}

impl ApiGateway {
    /// Wrap a transport.
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Perform one call and unwrap its envelope.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Network`] when the exchange fails or the
    /// failure body is unreadable, and [`DashboardError::Api`] when the backend
    /// rejects the call.
    pub async fn request(&self, request: ApiRequest) -> DashboardResult<Value> {
        let method = request.method.as_str();
        let path = request.path.clone();
        let response = self.transport.send(request).await.map_err(|err| {
            warn!(method, path = %path, error = %err, "api exchange failed");
            DashboardError::Network {
                status_text: err.to_string(),
            }
        })?;
        let outcome = interpret(&response);
        if let Err(err) = &outcome {
            debug!(method, path = %path, status = response.status, error = %err, "api call rejected");
        }
        outcome
    }

    /// `GET /api/tasks`; raw records, not yet normalized.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures; a non-array payload is an API error.
    pub async fn fetch_tasks(&self) -> DashboardResult<Vec<Value>> {
        match self.request(ApiRequest::get(paths::TASKS)).await? {
            Value::Array(items) => Ok(items),
            _ => Err(DashboardError::Api {
                status: 200,
                message: "unexpected task list payload".to_string(),
            }),
        }
    }

    /// `POST /api/tasks/create`; returns the created record when the server echoes it.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn create_task(&self, request: &TaskCreateRequest) -> DashboardResult<Value> {
        self.request(ApiRequest::post(paths::TASKS_CREATE, to_body(request)?))
            .await
    }

    /// `GET /api/ip/local`.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn fetch_local_ips(&self) -> DashboardResult<Vec<IpRecord>> {
        let data = self.request(ApiRequest::get(paths::LOCAL_IPS)).await?;
        let items = array_items(data);
        let received = items.len();
        let records: Vec<IpRecord> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        log_discarded(paths::LOCAL_IPS, received, records.len());
        Ok(records)
    }

    /// `POST /api/ip/local`.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn add_local_ip(&self, request: &LocalIpRequest) -> DashboardResult<()> {
        self.request(ApiRequest::post(paths::LOCAL_IPS, to_body(request)?))
            .await
            .map(drop)
    }

    /// `DELETE /api/ip/local/{id}`.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn remove_local_ip(&self, id: &str) -> DashboardResult<()> {
        self.request(ApiRequest::delete(paths::local_ip(id)))
            .await
            .map(drop)
    }

    /// `GET` the whitelist or blacklist.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn fetch_access_list(&self, kind: AccessListKind) -> DashboardResult<Vec<String>> {
        let data = self.request(ApiRequest::get(kind.path())).await?;
        let items = array_items(data);
        let received = items.len();
        let addresses: Vec<String> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(address) => Some(address),
                _ => None,
            })
            .collect();
        log_discarded(kind.path(), received, addresses.len());
        Ok(addresses)
    }

    /// `POST {ip}` to an access list.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn add_access_ip(&self, kind: AccessListKind, ip: &str) -> DashboardResult<()> {
        let body = to_body(&AccessIpRequest { ip: ip.to_string() })?;
        self.request(ApiRequest::post(kind.path(), body))
            .await
            .map(drop)
    }

    /// `DELETE ?ip=` from an access list.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn remove_access_ip(&self, kind: AccessListKind, ip: &str) -> DashboardResult<()> {
        self.request(ApiRequest::delete(kind.path()).with_query("ip", ip))
            .await
            .map(drop)
    }

    /// `GET /api/ip/settings`; `None` when the server has no policy payload.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures; an undecodable object is an API error.
    pub async fn fetch_policy(&self) -> DashboardResult<Option<IpPolicy>> {
        let data = self.request(ApiRequest::get(paths::IP_SETTINGS)).await?;
        object_payload(paths::IP_SETTINGS, data)
    }

    /// `PUT /api/ip/settings`.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn save_policy(&self, policy: &IpPolicy) -> DashboardResult<()> {
        self.request(ApiRequest::put(paths::IP_SETTINGS, to_body(policy)?))
            .await
            .map(drop)
    }

    /// `GET /api/pool/stats`; `None` when the server has no snapshot.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures; an undecodable object is an API error.
    pub async fn fetch_pool_stats(&self) -> DashboardResult<Option<PoolStats>> {
        let data = self.request(ApiRequest::get(paths::POOL_STATS)).await?;
        object_payload(paths::POOL_STATS, data)
    }
}

/// Classify a completed exchange.
///
/// # Errors
///
/// See [`ApiGateway::request`].
pub fn interpret(response: &RawResponse) -> DashboardResult<Value> {
    let Ok(document) = serde_json::from_slice::<Value>(&response.body) else {
        if response.is_success() {
            return Ok(Value::Null);
        }
        return Err(DashboardError::Network {
            status_text: non_empty(&response.status_text)
                .unwrap_or(FALLBACK_FAILURE)
                .to_string(),
        });
    };

    let envelope = ApiEnvelope::from_value(&document);
    if !response.is_success() || envelope.is_explicit_failure() {
        let message = envelope
            .message
            .or_else(|| non_empty(&response.status_text).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_FAILURE.to_string());
        return Err(DashboardError::Api {
            status: response.status,
            message,
        });
    }
    Ok(envelope.data.unwrap_or(Value::Null))
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn array_items(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn log_discarded(path: &str, received: usize, kept: usize) {
    if kept < received {
        warn!(path, discarded = received - kept, kept, "dropped unreadable list entries");
    }
}

fn object_payload<T: serde::de::DeserializeOwned>(
    path: &str,
    data: Value,
) -> DashboardResult<Option<T>> {
    if !data.is_object() {
        return Ok(None);
    }
    serde_json::from_value(data).map(Some).map_err(|err| {
        warn!(path, error = %err, "undecodable payload");
        DashboardError::Api {
            status: 200,
            message: format!("unexpected payload from {path}"),
        }
    })
}

fn to_body<T: Serialize>(payload: &T) -> DashboardResult<Value> {
    serde_json::to_value(payload).map_err(|err| DashboardError::Network {
        status_text: format!("failed to encode request body: {err}"),
    })
}
