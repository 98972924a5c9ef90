use crate::app_config::AppConfig;
use crate::domain::{Position, TrackPoint};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

const SEND_COORDINATES: &str = "send coordinates";
const LATEST_COORDINATES: &str = "load latest coordinates";

/// Client for the coordinate backend, `POST` and `GET` on `{url}/coordinates`. Requests are not
/// retried.
#[derive(Debug, Clone)]
pub struct CoordinateClient {
    client: Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct NewCoordinate {
    lat: f64,
    lon: f64,
}

/// Latest coordinate stored by the backend. Backends without row ids leave `id` out.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCoordinate {
    #[serde(default)]
    pub id: Option<i64>,
    pub lat: f64,
    pub lon: f64,
    pub created_at: DateTime<Utc>,
}

impl RemoteCoordinate {
    pub fn position(&self) -> Position {
        Position::new(self.lat, self.lon)
    }

    fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub attempted: usize,
    pub failed: usize,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}

impl CoordinateClient {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        CoordinateClient {
            client,
            url: config.remote().url().trim_end_matches('/').to_string(),
            timeout: config.remote().timeout(),
        }
    }

    #[instrument(skip(self))]
    pub async fn send_coordinates(&self, lat: f64, lon: f64) -> Result<(), RemoteError> {
        let request = self.client.post(self.coordinates_url()).json(&NewCoordinate { lat, lon });
        self.send(SEND_COORDINATES, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn latest_coordinates(&self) -> Result<RemoteCoordinate, RemoteError> {
        info!("🌐 Loading latest coordinates...");
        let response = self.send(LATEST_COORDINATES, self.client.get(self.coordinates_url())).await?;
        let coordinate = response
            .json::<RemoteCoordinate>()
            .await
            .map_err(|e| RemoteError::network(LATEST_COORDINATES, e))?;

        if !coordinate.is_in_range() {
            warn!("🌐 Loading latest coordinates... failed, ({}, {}) is out of range", coordinate.lat, coordinate.lon);
            return Err(RemoteError::InvalidCoordinate {
                lat: coordinate.lat,
                lon: coordinate.lon,
            });
        }

        info!("🌐 Loading latest coordinates... OK, {} from {}", coordinate.position(), coordinate.created_at);
        Ok(coordinate)
    }

    /// Sends every point on its own. A failed point does not stop the upload, the report counts
    /// the failures.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn upload_trajectory(&self, points: &[TrackPoint]) -> UploadReport {
        info!("🌐 Uploading {} point(s)...", points.len());
        let mut failed = 0;
        for point in points {
            if let Err(e) = self.send_coordinates(point.latitude(), point.longitude()).await {
                warn!("⚠️ Failed to upload point of {}: {}", point.timestamp(), e);
                failed += 1;
            }
        }

        let report = UploadReport {
            attempted: points.len(),
            failed,
        };
        info!("🌐 Uploading {} point(s)... OK, {} failed", report.attempted, report.failed);
        report
    }

    fn coordinates_url(&self) -> String {
        format!("{}/coordinates", self.url)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RemoteError::network(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::HttpStatus { operation, status, body });
        }

        Ok(response)
    }
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("{operation} failed: {source}")]
    Network { operation: &'static str, source: reqwest::Error },
    #[error("{operation} failed with {status}: {body}")]
    HttpStatus {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("the backend returned the invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

impl RemoteError {
    fn network(operation: &'static str, source: reqwest::Error) -> Self {
        RemoteError::Network { operation, source }
    }
}
