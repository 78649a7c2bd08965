use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode, Url};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::device::digest::{self, DigestChallenge};
use crate::device::tls::{self, CertificatePolicy};
use crate::error::AuthError;
use crate::model::device::DeviceCredential;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Digest-authenticated JSON calls against one terminal at a time.
///
/// Holds two connection pools: one with normal certificate validation and
/// one that tolerates self-signed certificates. The [`CertificatePolicy`]
/// picks the pool per target host. No retries happen here.
#[derive(Clone)]
pub struct DigestAuthClient {
    verified: Client,
    lenient: Client,
    scheme: String,
    policy: CertificatePolicy,
    probe_timeout: Duration,
}

impl DigestAuthClient {
    pub fn new(
        scheme: &str,
        call_timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let verified = Client::builder()
            .timeout(call_timeout)
            .connect_timeout(probe_timeout)
            .build()?;
        let lenient = Client::builder()
            .timeout(call_timeout)
            .connect_timeout(probe_timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            verified,
            lenient,
            scheme: scheme.to_string(),
            policy: tls::private_network_only,
            probe_timeout,
        })
    }

    pub fn with_policy(mut self, policy: CertificatePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn url(&self, device: &DeviceCredential, path: &str) -> Result<Url, AuthError> {
        Url::parse(&format!("{}://{}{}", self.scheme, device.ip, path))
            .map_err(|e| AuthError::Unreachable(format!("invalid device address {}: {e}", device.ip)))
    }

    fn client_for(&self, url: &Url) -> &Client {
        match url.host_str() {
            Some(host) if (self.policy)(host) => &self.lenient,
            _ => &self.verified,
        }
    }

    /// POST `body` to `path`, answering a digest challenge if one comes back.
    pub async fn call(
        &self,
        device: &DeviceCredential,
        path: &str,
        body: &str,
    ) -> Result<RawResponse, AuthError> {
        let url = self.url(device, path)?;
        let client = self.client_for(&url);

        debug!(device = %device, path, "Calling device");

        let initial = client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await?;

        if initial.status() != StatusCode::UNAUTHORIZED {
            return finish(device, initial).await;
        }

        let challenge = digest_challenge(initial.headers())?;
        debug!(device = %device, realm = %challenge.realm, "Received digest challenge");

        let authorization = digest::authorization(
            &challenge,
            &device.username,
            &device.password,
            "POST",
            path,
            &digest::new_cnonce(),
        );

        let authenticated = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization)
            .body(body.to_owned())
            .send()
            .await?;

        finish(device, authenticated).await
    }

    /// Cheap connectivity check: a TCP connect to the device port.
    pub async fn probe(&self, device: &DeviceCredential) -> bool {
        let Ok(url) = self.url(device, "/") else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let port = url.port_or_known_default().unwrap_or(80);

        match tokio::time::timeout(self.probe_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(device = %device, error = %e, "Probe connect failed");
                false
            }
            Err(_) => {
                debug!(device = %device, "Probe timed out");
                false
            }
        }
    }
}

async fn finish(
    device: &DeviceCredential,
    response: reqwest::Response,
) -> Result<RawResponse, AuthError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(device = %device, status = status.as_u16(), body = %body, "Device call failed");
        return Err(AuthError::Rejected {
            status: status.as_u16(),
        });
    }

    Ok(RawResponse {
        status: status.as_u16(),
        body,
    })
}

/// First `Digest` challenge among the `WWW-Authenticate` headers.
fn digest_challenge(headers: &HeaderMap) -> Result<DigestChallenge, AuthError> {
    let mut offered = Vec::new();

    for value in headers.get_all(WWW_AUTHENTICATE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        match DigestChallenge::from_header(value) {
            Err(AuthError::AuthSchemeUnsupported(scheme)) => offered.push(scheme),
            other => return other,
        }
    }

    let offered = if offered.is_empty() {
        "none".to_string()
    } else {
        offered.join(", ")
    };
    Err(AuthError::AuthSchemeUnsupported(offered))
}
