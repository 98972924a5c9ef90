use crate::sse::server_sent_event::{EventBuffer, ServerSentEvent};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub retry_ms: u64,
    pub retry_max_delay: Duration,
    pub stale_connection_timeout: Duration,
}

pub type SseItem<T> = Result<ServerSentEvent<T>, SseError>;

/// Listens to an SSE stream until the receiving side of `tx` is dropped.
///
/// Every connection failure is forwarded to `tx` before reconnecting with an exponential backoff,
/// so the receiver sees each failure exactly once.
#[instrument(skip_all, fields(url = %config.url))]
pub async fn listen<T>(tx: Sender<SseItem<T>>, client: &Client, config: &Config) -> Result<(), SseError>
where
    T: DeserializeOwned + Debug + Send + 'static,
{
    let strategy = ExponentialBackoff::from_millis(config.retry_ms)
        .factor(2)
        .max_delay(config.retry_max_delay)
        .map(jitter);

    info!("Connecting to SSE stream {}...", config.url);
    Retry::spawn(strategy, || async {
        match connect_sse_stream::<T>(tx.clone(), client, config).await {
            Ok(_) => {
                info!("✅ SSE receiver went away, closing stream");
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ SSE error: {}. Retrying...", e);
                match tx.send(Err(e)).await {
                    Ok(_) => Err(()), // Triggers retry
                    Err(_) => Ok(()),
                }
            }
        }
    })
    .await
    .map_err(|_| SseError::Closed)
}

/// Returns `Ok` once `tx` is closed, any other outcome is an error.
async fn connect_sse_stream<T>(tx: Sender<SseItem<T>>, client: &Client, config: &Config) -> Result<(), SseError>
where
    T: DeserializeOwned + Debug,
{
    let response = client
        .get(&config.url)
        .header("Accept", "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    if response.status() == StatusCode::OK {
        info!(status = %response.status(), "Connecting to SSE stream {}... OK", config.url);
    }

    let mut stream = response.bytes_stream();
    let mut buffer = EventBuffer::default();
    loop {
        let event = timeout(config.stale_connection_timeout, stream.next()).await;
        match event {
            Ok(Some(Ok(chunk))) => {
                for block in buffer.push(&chunk) {
                    let event = ServerSentEvent::<T>::parse(&block).map_err(SseError::Payload);
                    debug!(event = block.as_str(), "🔸 Received event: {:?}", event);
                    if tx.send(event).await.is_err() {
                        return Ok(());
                    }
                }
            }
            Ok(Some(Err(e))) => {
                error!("❌ SSE stream error: {}", e);
                return Err(SseError::Stream(e));
            }
            Ok(None) => {
                warn!("🔴 SSE stream ended");
                return Err(SseError::Closed);
            }
            Err(_) => {
                warn!("⏳ No data for {} seconds. Reconnecting...", config.stale_connection_timeout.as_secs());
                return Err(SseError::Stale(config.stale_connection_timeout));
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum SseError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("stream error: {0}")]
    Stream(reqwest::Error),
    #[error("invalid event payload: {0}")]
    Payload(serde_json::Error),
    #[error("stream closed")]
    Closed,
    #[error("no data for {0:?}")]
    Stale(Duration),
}
