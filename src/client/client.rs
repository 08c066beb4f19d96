//! HTTP client for the gateway API.
//!
//! # Responsibilities
//! - Fetch a fresh CSRF token before every mutating request
//! - Encode request bodies per endpoint generation
//! - Decode responses with the matching envelope codec
//!
//! # Design Decisions
//! - Tokens are single use, so they are never cached
//! - A 404 from the token endpoint means CSRF is off: the header is omitted
//! - No retries; the first transport failure is returned as is
//! - Environment proxies are ignored; the gateway is dialed directly

use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::client::error::{ClientError, Result};
use crate::config::ClientConfig;
use crate::csrf::{CsrfTokenResponse, CSRF_HEADER};
use crate::envelope::{decode_v1, decode_v2, Partial};
use crate::gateway::{
    AddressVerification, BuildInfo, InjectTransactionRequest, VerifiedTransaction,
    VerifyAddressRequest, VerifyTransactionRequest,
};

/// Client for the gateway's generation-1 and generation-2 endpoints.
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ProtocolClient {
    /// Client for `base_url` with default timeouts.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Client with timeouts and credentials from `config`.
    ///
    /// The TLS handshake happens inside reqwest's connect phase, so the
    /// connect timeout covers the dial and the handshake budgets together.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let http = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(config.dial_timeout() + config.tls_handshake_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Attach basic-auth credentials to every request.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a CSRF token. `None` means the server has CSRF disabled.
    pub async fn csrf(&self) -> Result<Option<String>> {
        let (status, body) = self.send(self.request(Method::GET, "/api/v1/csrf")?).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let token: CsrfTokenResponse = decode_v1(status, &body)?;
        Ok(Some(token.csrf_token))
    }

    /// Generation-1 GET.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let (status, body) = self
            .send(self.request(Method::GET, endpoint)?.query(query))
            .await?;
        decode_v1(status, &body)
    }

    /// Generation-2 GET.
    pub async fn get_v2<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Partial<T>> {
        let (status, body) = self
            .send(self.request(Method::GET, endpoint)?.query(query))
            .await?;
        decode_v2(status, &body)
    }

    /// Generation-1 POST with a form body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let request = self.mutating(endpoint).await?.form(form);
        let (status, body) = self.send(request).await?;
        decode_v1(status, &body)
    }

    /// Generation-1 POST with a JSON body.
    pub async fn post_json<B, T>(&self, endpoint: &str, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.mutating(endpoint).await?.json(payload);
        let (status, body) = self.send(request).await?;
        decode_v1(status, &body)
    }

    /// Generation-2 POST with a JSON body.
    ///
    /// A 422 may come back with both an error and data; both are returned.
    pub async fn post_json_v2<B, T>(&self, endpoint: &str, payload: &B) -> Result<Partial<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.mutating(endpoint).await?.json(payload);
        let (status, body) = self.send(request).await?;
        decode_v2(status, &body)
    }

    /// `GET /api/v1/version`
    pub async fn version(&self) -> Result<BuildInfo> {
        self.get("/api/v1/version", &[]).await
    }

    /// `POST /api/v1/injectTransaction`. Returns the txid.
    pub async fn inject_transaction(&self, rawtx: &str) -> Result<String> {
        let request = InjectTransactionRequest {
            rawtx: rawtx.to_string(),
        };
        self.post_json("/api/v1/injectTransaction", &request).await
    }

    /// `POST /api/v2/address/verify`
    pub async fn verify_address(&self, address: &str) -> Result<AddressVerification> {
        let request = VerifyAddressRequest {
            address: address.to_string(),
        };
        let partial = self.post_json_v2("/api/v2/address/verify", &request).await?;
        partial.into_result()?.ok_or_else(missing_data)
    }

    /// `POST /api/v2/transaction/verify`
    ///
    /// Returned as [`Partial`] so a failed verification still exposes the
    /// decoded transaction.
    pub async fn verify_transaction(&self, encoded: &str) -> Result<Partial<VerifiedTransaction>> {
        let request = VerifyTransactionRequest {
            encoded_transaction: encoded.to_string(),
        };
        self.post_json_v2("/api/v2/transaction/verify", &request).await
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Ok(Url::parse(&url)?)
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let builder = self.http.request(method, self.url(endpoint)?);
        Ok(match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        })
    }

    /// POST builder carrying a freshly fetched token, if CSRF is on.
    async fn mutating(&self, endpoint: &str) -> Result<RequestBuilder> {
        let token = self.csrf().await?;
        let builder = self.request(Method::POST, endpoint)?;
        Ok(match token {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Request failed before a response arrived");
                ClientError::Transport(e)
            })?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?;
        tracing::debug!(url = %url, status = %status, bytes = body.len(), "Received response");
        Ok((status, body.to_vec()))
    }
}

fn missing_data() -> ClientError {
    ClientError::Decode(<serde_json::Error as serde::de::Error>::missing_field("data"))
}
