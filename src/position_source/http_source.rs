use crate::app_config::AppConfig;
use crate::domain::PositionSample;
use crate::position_source::{PositionError, PositionEvent, PositionSource, SourceWatchId, WatchOptions};
use crate::sse::{self, ServerSentEvent, SseError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Position provider reached over HTTP: `GET {url}/position` for a single reading and a
/// server-sent event stream at `GET {url}/position/stream` for continuous updates.
#[derive(Debug)]
pub struct HttpPositionSource {
    client: Client,
    url: String,
    retry_ms: u64,
    retry_max_delay: Duration,
    buffer_size: usize,
    next_id: AtomicU64,
    watches: Mutex<HashMap<SourceWatchId, JoinHandle<()>>>,
}

impl HttpPositionSource {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        HttpPositionSource {
            client,
            url: config.position_source().url().trim_end_matches('/').to_string(),
            retry_ms: config.position_source().retry_ms(),
            retry_max_delay: config.position_source().retry_max_delay(),
            buffer_size: config.core().event_buffer_size(),
            next_id: AtomicU64::new(1),
            watches: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    #[instrument(skip(self))]
    async fn current_position(&self, options: &WatchOptions) -> Result<PositionSample, PositionError> {
        info!("📍 Requesting current position...");
        let request = self
            .client
            .get(format!("{}/position", self.url))
            .query(&[("high_accuracy", options.high_accuracy)])
            .send();

        let response = timeout(options.timeout, request).await.map_err(|_| PositionError::Timeout(options.timeout))??;
        if !response.status().is_success() {
            let status = response.status();
            warn!(status_code = %status, "📍 Requesting current position... failed");
            return Err(PositionError::Unavailable(format!("position source responded with {}", status)));
        }

        let sample = response.json::<PositionSample>().await?;
        info!("📍 Requesting current position... OK, {}", sample.position());
        Ok(sample)
    }

    fn watch_position(&self, options: &WatchOptions, tx: Sender<PositionEvent>) -> Result<SourceWatchId, PositionError> {
        let id = SourceWatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let config = sse::Config {
            url: format!("{}/position/stream?high_accuracy={}", self.url, options.high_accuracy),
            retry_ms: self.retry_ms,
            retry_max_delay: self.retry_max_delay,
            stale_connection_timeout: options.timeout,
        };

        let client = self.client.clone();
        let maximum_age = options.maximum_age;
        let (sse_tx, sse_rx) = mpsc::channel(self.buffer_size);
        let task = tokio::spawn(async move {
            tokio::select! {
                result = sse::listen::<PositionSample>(sse_tx, &client, &config) => {
                    if let Err(e) = result {
                        warn!("⚠️ Position stream stopped: {}", e);
                    }
                }
                _ = forward(sse_rx, tx, maximum_age) => {}
            }
            debug!(watch_id = id.0, "Position watch finished");
        });

        self.watches.lock().unwrap_or_else(PoisonError::into_inner).insert(id, task);
        info!(watch_id = id.0, "📍 Watching position");
        Ok(id)
    }

    fn clear_watch(&self, id: SourceWatchId) {
        if let Some(task) = self.watches.lock().unwrap_or_else(PoisonError::into_inner).remove(&id) {
            task.abort();
            info!(watch_id = id.0, "📍 Cleared position watch");
        }
    }
}

/// Maps stream items to position events until either side goes away.
async fn forward(mut rx: Receiver<sse::SseItem<PositionSample>>, tx: Sender<PositionEvent>, maximum_age: Option<Duration>) {
    while let Some(item) = rx.recv().await {
        let event = match item {
            Ok(ServerSentEvent { data: Some(sample), .. }) if is_too_old(&sample, maximum_age) => {
                debug!("Discarding a sample older than {:?}", maximum_age);
                continue;
            }
            Ok(ServerSentEvent { data: Some(sample), .. }) => PositionEvent::Sample(sample),
            Ok(_) => continue, // Keepalives and other events without a payload
            Err(SseError::Stale(duration)) => PositionEvent::Error(PositionError::Timeout(duration)),
            Err(e) => PositionEvent::Error(PositionError::Stream(e)),
        };

        if tx.send(event).await.is_err() {
            break;
        }
    }
}

fn is_too_old(sample: &PositionSample, maximum_age: Option<Duration>) -> bool {
    match (sample.timestamp, maximum_age) {
        (Some(timestamp), Some(maximum_age)) => Utc::now()
            .signed_duration_since(timestamp)
            .to_std()
            .is_ok_and(|age| age > maximum_age),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn source(url: String) -> HttpPositionSource {
        let config = AppConfigBuilder::new().position_source_url(url).build();
        HttpPositionSource::new(Client::new(), &config)
    }

    #[test(tokio::test)]
    async fn current_position_returns_the_reported_sample() -> Result<(), PositionError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/position")
            .match_query(Matcher::UrlEncoded("high_accuracy".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "latitude": 47.5, "longitude": 8.4, "timestamp": "2025-03-01T10:00:00Z" }"#)
            .create_async()
            .await;

        let sample = source(server.url()).current_position(&WatchOptions::default()).await?;

        mock.assert_async().await;
        assert_eq!(sample, PositionSample::new(47.5, 8.4, Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())));
        Ok(())
    }

    #[test(tokio::test)]
    async fn current_position_reports_a_refusal_as_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/position").match_query(Matcher::Any).with_status(403).create_async().await;

        let result = source(server.url()).current_position(&WatchOptions::default()).await;

        assert!(matches!(result, Err(PositionError::Unavailable(message)) if message.contains("403")));
    }

    #[test(tokio::test)]
    async fn watch_position_delivers_samples_until_cleared() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/position/stream")
            .match_query(Matcher::UrlEncoded("high_accuracy".into(), "false".into()))
            .with_status(200)
            .with_body("data: {\"latitude\": 47.5, \"longitude\": 8.4}\n\n: keepalive\n\ndata: {\"latitude\": 47.51, \"longitude\": 8.41}\n\n")
            .create_async()
            .await;

        let source = source(server.url());
        let options = WatchOptions {
            high_accuracy: false,
            ..WatchOptions::default()
        };
        let (tx, mut rx) = mpsc::channel(8);

        let id = source.watch_position(&options, tx).unwrap();

        assert!(matches!(rx.recv().await, Some(PositionEvent::Sample(sample)) if sample == PositionSample::new(47.5, 8.4, None)));
        assert!(matches!(rx.recv().await, Some(PositionEvent::Sample(sample)) if sample == PositionSample::new(47.51, 8.41, None)));
        // The mock closes the stream after the body, which is reported before reconnecting
        assert!(matches!(rx.recv().await, Some(PositionEvent::Error(PositionError::Stream(SseError::Closed)))));

        source.clear_watch(id);
        source.clear_watch(id);

        // Aborting the watch drops its sender, which closes the channel
        while rx.recv().await.is_some() {}
        assert!(source.watches.lock().unwrap().is_empty());
    }

    #[test]
    fn samples_without_capture_time_are_never_too_old() {
        let sample = PositionSample::new(47.5, 8.4, None);

        assert!(!is_too_old(&sample, Some(Duration::from_secs(1))));
    }

    #[test]
    fn samples_older_than_the_maximum_age_are_too_old() {
        let sample = PositionSample::new(47.5, 8.4, Some(Utc::now() - chrono::Duration::minutes(5)));

        assert!(is_too_old(&sample, Some(Duration::from_secs(60))));
        assert!(!is_too_old(&sample, Some(Duration::from_secs(600))));
        assert!(!is_too_old(&sample, None));
    }
}
