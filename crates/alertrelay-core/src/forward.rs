// ── Signal forwarding ──
//
// `SignalSink` is the seam between a worker and wherever signals go.
// Production uses `CollectorForwarder`; tests substitute recording sinks.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use alertrelay_api::{CollectorClient, SignalRequest};

use crate::config::RelayConfig;
use crate::error::CoreError;
use crate::model::Signal;

/// Destination for encoded signals.
///
/// `forward` is awaited before the worker reads the next part, so
/// signals for one device are delivered in the order their events arrived.
pub trait SignalSink: Send + Sync {
    fn forward(&self, signal: &Signal) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl<S: SignalSink> SignalSink for Arc<S> {
    fn forward(&self, signal: &Signal) -> impl Future<Output = Result<(), CoreError>> + Send {
        (**self).forward(signal)
    }
}

/// Posts each signal to the downstream collector.
pub struct CollectorForwarder {
    client: CollectorClient,
}

impl CollectorForwarder {
    /// Build a forwarder with its own HTTP client.
    pub fn new(config: &RelayConfig) -> Result<Self, CoreError> {
        let client = CollectorClient::new(
            config.collector.url.clone(),
            &config.collector.token,
            &config.collector_transport(),
        )?;
        Ok(Self { client })
    }
}

impl SignalSink for CollectorForwarder {
    async fn forward(&self, signal: &Signal) -> Result<(), CoreError> {
        debug!(
            signal_ids = ?signal.signal_ids,
            start = signal.start.rel_90k,
            end = signal.end.rel_90k,
            "forwarding signal"
        );
        self.client
            .post_signal(&SignalRequest::from(signal))
            .await
            .map_err(CoreError::forward)
    }
}
