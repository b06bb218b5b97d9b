//! HTTP Signing Gateway Adapter
//!
//! Implements the `SigningGateway` port over the gateway's REST API.
//! Transport failures and non-success statuses map to
//! `GatewayUnavailable`; signer decisions come back in the payload
//! result body and are interpreted by the signing client.

use crate::algorithms::LedgerTx;
use crate::config::SigningConfig;
use crate::domain::{EscrowError, Result};
use crate::ports::outbound::{PayloadResult, SigningGateway, SigningPayload};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wire request for creating a signing payload.
#[derive(Debug, Serialize)]
struct CreatePayloadRequest<'a> {
    txjson: &'a LedgerTx,
    instruction: &'a str,
}

/// Wire response for a created payload.
#[derive(Debug, Deserialize)]
struct CreatePayloadResponse {
    uuid: String,
    refs: PayloadRefs,
}

#[derive(Debug, Deserialize)]
struct PayloadRefs {
    qr_png: String,
    deeplink: String,
}

/// Wire response for a payload result. Fields the gateway has not set
/// yet default to false/absent.
#[derive(Debug, Default, Deserialize)]
struct PayloadResultResponse {
    #[serde(default)]
    signed: bool,
    #[serde(default)]
    rejected: bool,
    #[serde(default)]
    expired: bool,
    #[serde(default)]
    txid: Option<String>,
}

/// Signing gateway client over HTTP.
pub struct HttpSigningGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSigningGateway {
    /// Build a gateway client from configuration.
    pub fn new(config: &SigningConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| EscrowError::GatewayUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> EscrowError {
        if e.is_connect() {
            EscrowError::GatewayUnavailable(format!("cannot connect to {}", self.base_url))
        } else if e.is_timeout() {
            EscrowError::GatewayUnavailable(format!("request to {} timed out", self.base_url))
        } else {
            EscrowError::GatewayUnavailable(e.to_string())
        }
    }
}

#[async_trait]
impl SigningGateway for HttpSigningGateway {
    async fn create_payload(&self, tx: &LedgerTx, instruction: &str) -> Result<SigningPayload> {
        let url = format!("{}/payload", self.base_url);
        let response = self
            .authorize(self.client.post(&url))
            .json(&CreatePayloadRequest {
                txjson: tx,
                instruction,
            })
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(EscrowError::GatewayUnavailable(format!(
                "gateway returned {} creating payload",
                response.status()
            )));
        }

        let body: CreatePayloadResponse = response.json().await.map_err(|e| {
            EscrowError::GatewayUnavailable(format!("malformed gateway response: {e}"))
        })?;
        debug!(request_id = %body.uuid, "Signing payload created at gateway");
        Ok(SigningPayload {
            uuid: body.uuid,
            qr_image_url: body.refs.qr_png,
            deeplink_url: body.refs.deeplink,
        })
    }

    async fn get_payload_result(&self, uuid: &str) -> Result<PayloadResult> {
        let url = format!("{}/payload/{}", self.base_url, uuid);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(EscrowError::GatewayUnavailable(format!(
                "gateway returned {} for payload {uuid}",
                response.status()
            )));
        }

        let body: PayloadResultResponse = response.json().await.map_err(|e| {
            EscrowError::GatewayUnavailable(format!("malformed gateway response: {e}"))
        })?;
        Ok(PayloadResult {
            signed: body.signed,
            rejected: body.rejected,
            expired: body.expired,
            tx_hash: body.txid,
        })
    }
}
