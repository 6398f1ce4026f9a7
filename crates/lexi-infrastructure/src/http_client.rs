//! HTTP client for the Lexi backend.
//!
//! One [`HttpApiClient`] implements every collaborator contract of
//! `lexi-core`: account status, resource binding, the OAuth provider, word
//! lookup, grammar correction and entry saving.

use crate::dto::{
    BindRequest, CorrectRequest, CorrectResponse, DefineRequest, DefineResponse, ErrorBody,
    ExchangeRequest, ExchangeResponse, SaveRequest, StatusResponse,
};
use async_trait::async_trait;
use lexi_core::config::ClientConfig;
use lexi_core::error::{LexiError, Result};
use lexi_core::oauth::{ExchangeResult, LinkProvider};
use lexi_core::query::{CorrectionService, LookupService, WordResult};
use lexi_core::save::{EntryStore, WordEntry};
use lexi_core::session::{
    AccountStatus, AccountStatusService, LocalIdentity, ResourceBindingService,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

const STATUS_PATH: &str = "/api/notion/status";
const CONNECT_PATH: &str = "/api/notion/connect-notion";
const CONNECT_FRESH_PATH: &str = "/connect-notion";
const EXCHANGE_PATH: &str = "/api/notion/exchange-token";
const BIND_PATH: &str = "/api/notion/set-vocabulary-db";
const DEFINE_PATH: &str = "/api/define";
const CORRECT_PATH: &str = "/api/correctSentence";
const SAVE_PATH: &str = "/api/notion/save-to-notion";

/// reqwest-backed client for every backend endpoint.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LexiError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &'static str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(endpoint, error = %e, "Request failed");
            LexiError::network(format!("{} request failed: {}", endpoint, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let error = classify_error(status, &body);
        tracing::warn!(endpoint, status = status.as_u16(), error = %error, "Backend rejected request");
        Err(error)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<T> {
        let response = self.send(request, endpoint).await?;
        response.json::<T>().await.map_err(|e| LexiError::Serialization {
            format: "JSON".to_string(),
            message: format!("Failed to parse {} response: {}", endpoint, e),
        })
    }
}

/// Maps a non-success response to a [`LexiError`].
///
/// The `CODE_ALREADY_USED` error code becomes [`LexiError::CodeAlreadyUsed`]
/// whatever the status. The provider's free-text "already been used"
/// description only counts on a `400`. Everything else is a `Service` error
/// carrying the backend's own message when it sent one.
pub fn classify_error(status: StatusCode, body: &str) -> LexiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if parsed.has_code_already_used()
        || (status == StatusCode::BAD_REQUEST && parsed.describes_code_already_used())
    {
        return LexiError::CodeAlreadyUsed;
    }
    let message = parsed.message().unwrap_or_else(|| {
        let text = body.trim();
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            text.to_string()
        }
    });
    LexiError::Service {
        status: status.as_u16(),
        code: parsed.code,
        message,
    }
}

#[async_trait]
impl AccountStatusService for HttpApiClient {
    async fn fetch_status(&self, identity: &LocalIdentity) -> Result<AccountStatus> {
        let request = self
            .client
            .get(self.endpoint(STATUS_PATH))
            .query(&[("app_user_id", identity.as_str())]);
        let dto: StatusResponse = self.send_json(request, "status").await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl ResourceBindingService for HttpApiClient {
    async fn bind_resource(
        &self,
        identity: &LocalIdentity,
        resource_id: Option<&str>,
    ) -> Result<()> {
        let body = BindRequest {
            database_id: resource_id,
            app_user_id: identity.as_str(),
        };
        let request = self.client.post(self.endpoint(BIND_PATH)).json(&body);
        self.send(request, "set-vocabulary-db").await?;
        Ok(())
    }
}

#[async_trait]
impl LinkProvider for HttpApiClient {
    fn connect_url(&self, identity: Option<&LocalIdentity>) -> String {
        match identity {
            Some(identity) => match Url::parse(&self.endpoint(CONNECT_PATH)) {
                Ok(mut url) => {
                    url.query_pairs_mut()
                        .append_pair("app_user_id", identity.as_str());
                    url.to_string()
                }
                // Base URL is validated on load; keep a usable string anyway.
                Err(_) => format!(
                    "{}?app_user_id={}",
                    self.endpoint(CONNECT_PATH),
                    identity.as_str()
                ),
            },
            None => self.endpoint(CONNECT_FRESH_PATH),
        }
    }

    async fn exchange_code(
        &self,
        authorization_code: &str,
        identity: Option<&LocalIdentity>,
    ) -> Result<ExchangeResult> {
        let body = ExchangeRequest {
            code: authorization_code,
            app_user_id: identity.map(LocalIdentity::as_str),
        };
        let request = self.client.post(self.endpoint(EXCHANGE_PATH)).json(&body);
        let dto: ExchangeResponse = self.send_json(request, "exchange-token").await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl LookupService for HttpApiClient {
    async fn lookup(&self, word: &str) -> Result<WordResult> {
        let request = self
            .client
            .post(self.endpoint(DEFINE_PATH))
            .json(&DefineRequest { word });
        let dto: DefineResponse = self.send_json(request, "define").await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl CorrectionService for HttpApiClient {
    async fn correct(&self, sentence: &str) -> Result<String> {
        let request = self
            .client
            .post(self.endpoint(CORRECT_PATH))
            .json(&CorrectRequest { sentence });
        let dto: CorrectResponse = self.send_json(request, "correctSentence").await?;
        Ok(dto.corrected_text.unwrap_or_default())
    }
}

#[async_trait]
impl EntryStore for HttpApiClient {
    async fn save_entry(
        &self,
        identity: &LocalIdentity,
        resource_id: &str,
        entry: &WordEntry,
    ) -> Result<()> {
        let body = SaveRequest::new(identity, resource_id, entry);
        let request = self.client.post(self.endpoint(SAVE_PATH)).json(&body);
        self.send(request, "save-to-notion").await?;
        tracing::info!(word = %entry.word, "Saved entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpApiClient {
        HttpApiClient::with_client(Client::new(), "http://localhost:8000/")
    }

    #[test]
    fn test_connect_url_with_identity_carries_token() {
        let url = client().connect_url(Some(&LocalIdentity::new("tok 1")));
        assert_eq!(
            url,
            "http://localhost:8000/api/notion/connect-notion?app_user_id=tok+1"
        );
    }

    #[test]
    fn test_connect_url_without_identity() {
        assert_eq!(
            client().connect_url(None),
            "http://localhost:8000/connect-notion"
        );
    }

    #[test]
    fn test_classify_code_already_used() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid code: this code has already been used."}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            LexiError::CodeAlreadyUsed
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, r#"{"code":"CODE_ALREADY_USED"}"#),
            LexiError::CodeAlreadyUsed
        ));
    }

    #[test]
    fn test_classify_used_code_marker_at_any_status() {
        for status in [StatusCode::CONFLICT, StatusCode::INTERNAL_SERVER_ERROR] {
            assert!(matches!(
                classify_error(status, r#"{"code":"CODE_ALREADY_USED"}"#),
                LexiError::CodeAlreadyUsed
            ));
        }
    }

    #[test]
    fn test_classify_used_code_description_needs_bad_request() {
        let body = r#"{"error_description":"Invalid code: this code has already been used."}"#;
        match classify_error(StatusCode::INTERNAL_SERVER_ERROR, body) {
            LexiError::Service { status, message, .. } => {
                assert_eq!(status, 500);
                assert!(message.contains("already been used"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_prefers_server_message() {
        match classify_error(StatusCode::BAD_GATEWAY, r#"{"error":"grammar model offline"}"#) {
            LexiError::Service { message, .. } => assert_eq!(message, "grammar model offline"),
            other => panic!("unexpected error: {other:?}"),
        }
        match classify_error(StatusCode::NOT_FOUND, "") {
            LexiError::Service { message, .. } => assert_eq!(message, "Not Found"),
            other => panic!("unexpected error: {other:?}"),
        }
        match classify_error(StatusCode::BAD_REQUEST, "plain text failure") {
            LexiError::Service { message, .. } => assert_eq!(message, "plain text failure"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let api = HttpApiClient::with_client(Client::new(), "http://127.0.0.1:9");
        let err = api.lookup("cat").await.unwrap_err();
        assert!(err.is_network());
    }
}
