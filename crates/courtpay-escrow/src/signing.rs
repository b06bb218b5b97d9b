//! # Signing Client
//!
//! Client-side half of the interactive signing flow: create a signing
//! request at the gateway, hand the QR/deeplink material to the caller,
//! then poll for resolution under a hard deadline.
//!
//! The wait loop is a plain `async fn` owning its own timer, so callers
//! can run it concurrently with other work and cancel it by dropping
//! the future. Nothing keeps ticking afterwards.

use crate::algorithms::LedgerTx;
use crate::config::SigningConfig;
use crate::domain::{EscrowError, Result};
use crate::ports::outbound::SigningGateway;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Statistics for the signing client.
#[derive(Debug, Default)]
pub struct SigningStats {
    /// Signing requests created.
    pub requests_created: AtomicU64,
    /// Requests resolved as signed.
    pub signed: AtomicU64,
    /// Requests declined by the signer.
    pub rejected: AtomicU64,
    /// Requests that expired at the gateway.
    pub expired: AtomicU64,
    /// Waits abandoned at the deadline.
    pub timeouts: AtomicU64,
    /// Result polls issued.
    pub polls: AtomicU64,
}

/// A created signing request awaiting the signer.
#[derive(Clone, Debug)]
pub struct PendingSignatureRequest {
    /// Gateway-assigned request ID.
    pub request_id: String,
    /// QR code for the signer to scan.
    pub qr_image_url: String,
    /// Deep link into the signer's wallet app.
    pub deeplink_url: String,
}

/// One poll's view of a signing request.
#[derive(Clone, Debug)]
pub struct SignatureStatus {
    /// Whether any terminal outcome has been reached.
    pub resolved: bool,
    /// Signer approved and signed.
    pub signed: bool,
    /// Signer explicitly declined.
    pub rejected: bool,
    /// Request expired at the gateway.
    pub expired: bool,
    /// Transaction hash once signed and submitted.
    pub tx_hash: Option<String>,
}

/// Signing flow client over any [`SigningGateway`].
pub struct SigningClient {
    gateway: Arc<dyn SigningGateway>,
    resolution_timeout: Duration,
    poll_interval: Duration,
    stats: Arc<SigningStats>,
}

impl SigningClient {
    /// Create a new signing client.
    pub fn new(gateway: Arc<dyn SigningGateway>, config: &SigningConfig) -> Self {
        Self {
            gateway,
            resolution_timeout: config.resolution_timeout(),
            poll_interval: config.poll_interval(),
            stats: Arc::new(SigningStats::default()),
        }
    }

    /// Create a signing request for a transaction.
    ///
    /// Only the transaction label is logged; payload contents stay out
    /// of the logs.
    pub async fn create_signing_request(
        &self,
        tx: &LedgerTx,
        instruction: &str,
    ) -> Result<PendingSignatureRequest> {
        let payload = self.gateway.create_payload(tx, instruction).await?;
        self.stats.requests_created.fetch_add(1, Ordering::Relaxed);
        debug!(
            request_id = %payload.uuid,
            tx = tx.label(),
            "Created signing request"
        );
        Ok(PendingSignatureRequest {
            request_id: payload.uuid,
            qr_image_url: payload.qr_image_url,
            deeplink_url: payload.deeplink_url,
        })
    }

    /// Fetch the current resolution state of a request.
    pub async fn poll_result(&self, request_id: &str) -> Result<SignatureStatus> {
        let result = self.gateway.get_payload_result(request_id).await?;
        self.stats.polls.fetch_add(1, Ordering::Relaxed);
        Ok(SignatureStatus {
            resolved: result.resolved(),
            signed: result.signed,
            rejected: result.rejected,
            expired: result.expired,
            tx_hash: result.tx_hash,
        })
    }

    /// Wait for a request to resolve, using the configured deadline and
    /// poll interval. Returns the signed transaction hash.
    pub async fn wait_for_resolution(&self, request_id: &str) -> Result<String> {
        self.wait_for_resolution_with(request_id, self.resolution_timeout, self.poll_interval)
            .await
    }

    /// Wait for a request to resolve under explicit bounds.
    ///
    /// Polls until the signer signs, declines, the request expires, or
    /// the deadline passes. Transport errors during a poll are retried
    /// on the next tick; the deadline bounds the whole affair.
    pub async fn wait_for_resolution_with(
        &self,
        request_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<String> {
        let deadline = tokio::time::sleep_until(Instant::now() + timeout);
        tokio::pin!(deadline);
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                    warn!(request_id, waited_secs = timeout.as_secs(), "Gave up waiting for signature");
                    return Err(EscrowError::SignatureTimeout {
                        waited_secs: timeout.as_secs(),
                    });
                }
                _ = ticker.tick() => {
                    match self.poll_result(request_id).await {
                        Ok(status) => {
                            if status.rejected {
                                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                                return Err(EscrowError::SignatureRejected);
                            }
                            if status.expired {
                                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                                return Err(EscrowError::SignatureExpired);
                            }
                            if status.signed {
                                self.stats.signed.fetch_add(1, Ordering::Relaxed);
                                return match status.tx_hash {
                                    Some(hash) => Ok(hash),
                                    None => Err(EscrowError::Submission(
                                        "gateway reported signed without a transaction hash"
                                            .to_string(),
                                    )),
                                };
                            }
                            debug!(request_id, "Still awaiting signer");
                        }
                        Err(e) => {
                            // Transient transport failure; the deadline bounds the retries.
                            warn!(request_id, error = %e, "Result poll failed, retrying");
                        }
                    }
                }
            }
        }
    }

    /// Client statistics.
    pub fn stats(&self) -> &SigningStats {
        &self.stats
    }
}
