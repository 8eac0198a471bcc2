use std::future::Future;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Campaign, CampaignId, Keyword, Town},
    error::ErrorBody,
    protocol::{AccountBalancePayload, ApiEnvelope, CampaignPayload},
};
use tracing::{debug, error};

use crate::{
    config::{validate_base_url, ClientSettings},
    error::{ApiError, ApiResult},
};

/// Remote operations of the campaign backend.
///
/// Implementations log every failure and hand the error back unchanged;
/// they never retry.
#[async_trait]
pub trait CampaignApi: Send + Sync {
    async fn get_account_balance(&self) -> ApiResult<Decimal>;
    async fn get_towns(&self) -> ApiResult<Vec<Town>>;
    async fn search_towns(&self, query: &str) -> ApiResult<Vec<Town>>;
    async fn get_keywords(&self) -> ApiResult<Vec<Keyword>>;
    async fn search_keywords(&self, query: &str) -> ApiResult<Vec<Keyword>>;
    async fn get_campaigns(&self) -> ApiResult<Vec<Campaign>>;
    async fn get_campaign(&self, id: CampaignId) -> ApiResult<Campaign>;
    async fn create_campaign(&self, payload: &CampaignPayload) -> ApiResult<Campaign>;
    async fn update_campaign(&self, id: CampaignId, payload: &CampaignPayload)
        -> ApiResult<Campaign>;
    async fn delete_campaign(&self, id: CampaignId) -> ApiResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BareBody {
    Accepted,
    Rejected,
}

pub struct HttpCampaignApi {
    http: Client,
    base_url: String,
}

impl HttpCampaignApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        validate_base_url(&settings.api_base_url)?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn logged<T>(
        &self,
        endpoint: &str,
        call: impl Future<Output = ApiResult<T>> + Send,
    ) -> ApiResult<T> {
        match call.await {
            Ok(value) => {
                debug!(endpoint, "api request succeeded");
                Ok(value)
            }
            Err(err) => {
                match &err {
                    ApiError::Validation { fields, .. } => {
                        error!(endpoint, error = %err, fields = ?fields, "api request failed")
                    }
                    _ => error!(endpoint, error = %err, "api request failed"),
                }
                Err(err)
            }
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        resource: &str,
        request: RequestBuilder,
    ) -> ApiResult<Option<Value>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(rejection(resource, status, &body));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|err| ApiError::invalid_response(endpoint, err.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &str,
        request: RequestBuilder,
        bare: BareBody,
    ) -> ApiResult<T> {
        let body = self.send(endpoint, resource, request).await?;
        let payload = open_envelope(endpoint, body, bare)?;
        serde_json::from_value(payload)
            .map_err(|err| ApiError::invalid_response(endpoint, err.to_string()))
    }
}

#[async_trait]
impl CampaignApi for HttpCampaignApi {
    async fn get_account_balance(&self) -> ApiResult<Decimal> {
        let endpoint = "GET /account/balance";
        self.logged(endpoint, async {
            let request = self.http.get(self.url("/account/balance"));
            let payload: AccountBalancePayload = self
                .fetch(endpoint, "account", request, BareBody::Rejected)
                .await?;
            Ok(payload.balance)
        })
        .await
    }

    async fn get_towns(&self) -> ApiResult<Vec<Town>> {
        let endpoint = "GET /towns";
        self.logged(endpoint, async {
            let request = self.http.get(self.url("/towns"));
            self.fetch(endpoint, "towns", request, BareBody::Rejected)
                .await
        })
        .await
    }

    async fn search_towns(&self, query: &str) -> ApiResult<Vec<Town>> {
        let endpoint = "GET /towns/search";
        self.logged(endpoint, async {
            let request = self
                .http
                .get(self.url("/towns/search"))
                .query(&[("q", query)]);
            self.fetch(endpoint, "towns", request, BareBody::Rejected)
                .await
        })
        .await
    }

    async fn get_keywords(&self) -> ApiResult<Vec<Keyword>> {
        let endpoint = "GET /keywords";
        self.logged(endpoint, async {
            let request = self.http.get(self.url("/keywords"));
            self.fetch(endpoint, "keywords", request, BareBody::Rejected)
                .await
        })
        .await
    }

    async fn search_keywords(&self, query: &str) -> ApiResult<Vec<Keyword>> {
        let endpoint = "GET /keywords/search";
        self.logged(endpoint, async {
            let request = self
                .http
                .get(self.url("/keywords/search"))
                .query(&[("q", query)]);
            self.fetch(endpoint, "keywords", request, BareBody::Rejected)
                .await
        })
        .await
    }

    async fn get_campaigns(&self) -> ApiResult<Vec<Campaign>> {
        let endpoint = "GET /campaigns";
        self.logged(endpoint, async {
            let request = self.http.get(self.url("/campaigns"));
            self.fetch(endpoint, "campaigns", request, BareBody::Rejected)
                .await
        })
        .await
    }

    async fn get_campaign(&self, id: CampaignId) -> ApiResult<Campaign> {
        let endpoint = "GET /campaigns/{id}";
        self.logged(endpoint, async {
            let request = self.http.get(self.url(&format!("/campaigns/{id}")));
            self.fetch(
                endpoint,
                &format!("campaign {id}"),
                request,
                BareBody::Rejected,
            )
            .await
        })
        .await
    }

    async fn create_campaign(&self, payload: &CampaignPayload) -> ApiResult<Campaign> {
        let endpoint = "POST /campaigns";
        self.logged(endpoint, async {
            let request = self.http.post(self.url("/campaigns")).json(payload);
            self.fetch(endpoint, "campaign", request, BareBody::Accepted)
                .await
        })
        .await
    }

    async fn update_campaign(
        &self,
        id: CampaignId,
        payload: &CampaignPayload,
    ) -> ApiResult<Campaign> {
        let endpoint = "PUT /campaigns/{id}";
        self.logged(endpoint, async {
            let request = self
                .http
                .put(self.url(&format!("/campaigns/{id}")))
                .json(payload);
            self.fetch(
                endpoint,
                &format!("campaign {id}"),
                request,
                BareBody::Accepted,
            )
            .await
        })
        .await
    }

    async fn delete_campaign(&self, id: CampaignId) -> ApiResult<()> {
        let endpoint = "DELETE /campaigns/{id}";
        self.logged(endpoint, async {
            let request = self.http.delete(self.url(&format!("/campaigns/{id}")));
            self.send(endpoint, &format!("campaign {id}"), request)
                .await
                .map(|_| ())
        })
        .await
    }
}

fn rejection(resource: &str, status: StatusCode, body: &[u8]) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound {
            resource: resource.to_string(),
        };
    }

    if status.is_client_error() {
        return ApiError::Validation {
            message: parsed.message_or(status.canonical_reason().unwrap_or("request rejected")),
            fields: parsed.field_errors(),
        };
    }

    ApiError::Transport {
        status: Some(status.as_u16()),
        message: parsed.message_or(&format!("HTTP {status}")),
    }
}

/// Strips the `{success, message, data}` wrapper, including the doubly
/// nested `{data: {data: ..}}` form some endpoints produce.
fn open_envelope(endpoint: &str, body: Option<Value>, bare: BareBody) -> ApiResult<Value> {
    let mut current =
        body.ok_or_else(|| ApiError::invalid_response(endpoint, "empty response body"))?;
    let mut opened = false;

    loop {
        match current {
            Value::Object(map) if map.contains_key("data") || map.contains_key("success") => {
                let envelope: ApiEnvelope<Value> = serde_json::from_value(Value::Object(map))
                    .map_err(|err| ApiError::invalid_response(endpoint, err.to_string()))?;
                if !envelope.success {
                    let reason = envelope
                        .message
                        .unwrap_or_else(|| "server reported success=false".to_string());
                    return Err(ApiError::invalid_response(endpoint, reason));
                }
                match envelope.data {
                    None | Some(Value::Null) => {
                        return Err(ApiError::invalid_response(endpoint, "missing data"));
                    }
                    Some(inner) => {
                        current = inner;
                        opened = true;
                    }
                }
            }
            other => {
                if !opened && bare == BareBody::Rejected {
                    return Err(ApiError::invalid_response(
                        endpoint,
                        "response is not wrapped in a success envelope",
                    ));
                }
                return Ok(other);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
