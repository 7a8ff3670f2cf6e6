//! REST implementation of [`ControlPlane`] over reqwest.
//!
//! Every call is bounded by the configured per-call timeout. Authentication
//! is a bearer token obtained from `POST /v1/tokens` on first use and cached;
//! a `401` clears the cache and the call is retried once with a fresh token.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use super::models::{
    Certificate, CertificatesGenerationSpec, Domain, Page, ResourceCertificateSpec, Task,
    ValidationResult,
};
use super::{ControlPlane, Envelope};
use crate::config::ClientConfig;
use crate::error::{FleetError, Result};
use crate::tls;

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Map reqwest failures, separating per-call timeouts from other transport
/// errors.
fn transport(e: reqwest::Error) -> FleetError {
    if e.is_timeout() {
        FleetError::Timeout(e.to_string())
    } else {
        FleetError::Transport(e)
    }
}

/// Accept `https://host[:port]`, `http://...`, or a bare `host[:port]`.
///
/// Only `http`/`https` URLs with a host and without userinfo are usable;
/// a bare value that parses into credentials (`mailto:ops@example.com`) is
/// rejected rather than connected to.
pub fn base_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let url = if host.contains("://") {
        Url::parse(host)?
    } else {
        Url::parse(&format!("https://{host}"))?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FleetError::Config(format!("host '{host}' must be an http(s) URL")));
    }
    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(FleetError::Config(format!("host '{host}' is not a usable base URL")));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FleetError::Config(format!(
            "host '{host}' must not carry credentials; use username/password"
        )));
    }
    Ok(url)
}

pub struct HttpControlPlane {
    http:     Client,
    base:     Url,
    username: String,
    password: String,
    token:    Mutex<Option<String>>,
}

impl HttpControlPlane {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base = base_url(&cfg.host)?;
        let mut builder = Client::builder().timeout(cfg.api_timeout());
        if let Some(tls_cfg) = tls::build_tls_config(cfg)? {
            builder = builder.use_preconfigured_tls(tls_cfg);
        }
        let http = builder.build().map_err(FleetError::Transport)?;
        info!("control plane at {base}");
        Ok(HttpControlPlane {
            http,
            base,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            token:    Mutex::new(None),
        })
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FleetError::Config(format!("{} is not a usable base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref() {
            return Ok(t.clone());
        }
        debug!("requesting access token for {}", self.username);
        let resp = self
            .http
            .post(self.endpoint(&["v1", "tokens"])?)
            .json(&TokenRequest { username: &self.username, password: &self.password })
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        let body: TokenResponse = resp.json().await.map_err(transport)?;
        *cached = Some(body.access_token.clone());
        Ok(body.access_token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Send an authenticated request built by `build`, retrying once with a
    /// fresh token on `401`.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> Result<RequestBuilder>,
    {
        let token = self.token().await?;
        let resp = build(&self.http)?.bearer_auth(token).send().await.map_err(transport)?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }
        debug!("access token rejected, re-authenticating");
        self.forget_token().await;
        let token = self.token().await?;
        let resp = build(&self.http)?.bearer_auth(token).send().await.map_err(transport)?;
        check_status(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let resp = self.send(|http| Ok(http.get(url.clone()))).await?;
        resp.json().await.map_err(transport)
    }

    /// `PUT` whose answer is `200` (synchronous result) or `202` (accepted).
    async fn put_envelope<B, T>(&self, segments: &[&str], body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let resp = self.send(|http| Ok(http.put(url.clone()).json(body))).await?;
        let status = resp.status();
        match status {
            StatusCode::OK => Ok(Envelope::sync(resp.json().await.map_err(transport)?)),
            StatusCode::ACCEPTED => Ok(Envelope::accepted(resp.json().await.map_err(transport)?)),
            other => Err(FleetError::InvalidResponse(format!(
                "unexpected HTTP {} from {url}",
                other.as_u16()
            ))),
        }
    }
}

/// Turn a non-success status into [`FleetError::Api`], using the control
/// plane's `message` field when the body has one.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(text);
    Err(FleetError::Api { status: status.as_u16(), message })
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn submit_validation(
        &self,
        domain_id: &str,
        specs:     &[ResourceCertificateSpec],
    ) -> Result<Envelope<ValidationResult>> {
        self.put_envelope(
            &["v1", "domains", domain_id, "resource-certificates", "validations"],
            specs,
        )
        .await
    }

    async fn get_validation_status(&self, validation_id: &str) -> Result<ValidationResult> {
        self.get_json(&["v1", "domains", "resource-certificates", "validations", validation_id])
            .await
    }

    async fn submit_generation(
        &self,
        domain_id: &str,
        spec:      &CertificatesGenerationSpec,
    ) -> Result<Envelope<Task>> {
        self.put_envelope(&["v1", "domains", domain_id, "resource-certificates"], spec)
            .await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.get_json(&["v1", "tasks", task_id]).await
    }

    async fn list_certificates(&self, domain_id: &str) -> Result<Page<Certificate>> {
        self.get_json(&["v1", "domains", domain_id, "resource-certificates"]).await
    }

    async fn list_domains(&self) -> Result<Page<Domain>> {
        self.get_json(&["v1", "domains"]).await
    }
}
