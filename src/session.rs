use crate::app_config::AppConfig;
use crate::comparator::{ComparisonResult, ReferenceComparator};
use crate::domain::TrackPoint;
use crate::geodesy::{BoundingBox, bounding_square};
use crate::position_source::{PositionError, PositionSource, WatchOptions};
use crate::remote::{CoordinateClient, RemoteError, UploadReport};
use crate::storage::{DocumentStore, StorageError};
use crate::track_serializer::DecodedTrack;
use crate::watch::{PositionWatchController, WatchHandle};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything the tracking view works with: the recording, the reference comparison, saved
/// tracks and the coordinate backend. The display layer only ever receives snapshots.
pub struct TrackingSession {
    observer_id: String,
    source: Arc<dyn PositionSource>,
    options: WatchOptions,
    controller: PositionWatchController,
    handle: Option<WatchHandle>,
    comparator: ReferenceComparator,
    reference_area: Option<BoundingBox>,
    documents: DocumentStore,
    remote: CoordinateClient,
}

impl TrackingSession {
    pub fn new(source: Arc<dyn PositionSource>, remote: CoordinateClient, config: &AppConfig) -> Self {
        let controller = PositionWatchController::new(
            source.clone(),
            config.observer().id(),
            config.watch().clone(),
            config.core().event_buffer_size(),
        );
        let reference_area = config
            .comparator()
            .area_center()
            .and_then(|center| bounding_square(center, config.comparator().area_side_m()));
        let documents = DocumentStore::new(config.storage().directory());
        info!("📂 Tracks are stored in {}", documents.directory().display());

        TrackingSession {
            observer_id: config.observer().id().to_string(),
            source,
            options: config.watch().clone(),
            controller,
            handle: None,
            comparator: ReferenceComparator::new(config.comparator().indicator_length_m()),
            reference_area,
            documents,
            remote,
        }
    }

    /// Starts a new recording. A running recording is stopped and its trajectory discarded.
    pub async fn start_tracking<F, E>(&mut self, on_sample: F, on_error: E) -> Result<WatchHandle, PositionError>
    where
        F: Fn(&[TrackPoint]) + Send + Sync + 'static,
        E: Fn(&PositionError) + Send + Sync + 'static,
    {
        let handle = self.controller.start_watch(on_sample, on_error).await?;
        self.handle = Some(handle);
        Ok(handle)
    }

    /// Stops the recording and discards its trajectory, save it first to keep it.
    pub async fn stop_tracking(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => self.controller.stop_watch(handle).await,
            None => false,
        }
    }

    /// Navigating away from the tracking view ends the recording and forgets the trajectory.
    pub async fn leave(&mut self) {
        self.handle = None;
        self.controller.reset().await;
        info!("👋 Left the tracking view");
    }

    /// Whether the recording started by this session is still running.
    pub async fn is_tracking(&self) -> bool {
        match self.handle {
            Some(handle) => self.controller.is_valid(handle).await,
            None => false,
        }
    }

    pub async fn trajectory(&self) -> Vec<TrackPoint> {
        self.controller.trajectory().await
    }

    /// Reads the current position once and uses it as "my" side of the comparison.
    #[instrument(skip(self))]
    pub async fn locate_me(&mut self) -> Result<ComparisonResult, PositionError> {
        let sample = self.source.current_position(&self.options).await?;
        let point = TrackPoint::new(
            self.observer_id.as_str(),
            sample.timestamp.unwrap_or_else(Utc::now),
            sample.latitude,
            sample.longitude,
        )?;

        Ok(self.comparator.set_my_position(Some(point.position())))
    }

    /// Uses the last point of the current recording as "my" side of the comparison. Keeps the
    /// current side if nothing was recorded.
    pub async fn use_last_recorded_position(&mut self) -> ComparisonResult {
        match self.controller.last_point().await {
            Some(point) => self.comparator.set_my_position(Some(point.position())),
            None => self.comparator.result(),
        }
    }

    /// Uses the latest coordinate of the backend as the reference.
    pub async fn load_reference_from_remote(&mut self) -> Result<ComparisonResult, RemoteError> {
        let coordinate = self.remote.latest_coordinates().await?;
        Ok(self.comparator.set_reference(Some(coordinate.position())))
    }

    /// Uses the last point of a saved track as the reference, the last saved track if `name` is
    /// `None`. The comparison is left untouched if the track can't be read.
    pub async fn load_reference_from_file(&mut self, name: Option<&str>) -> Result<ComparisonResult, StorageError> {
        let point = match name {
            Some(name) => self.documents.load_last_point(name).await?,
            None => self.documents.load_reference().await?,
        };

        Ok(self.comparator.set_reference(Some(point.position())))
    }

    pub fn comparison(&self) -> ComparisonResult {
        self.comparator.result()
    }

    pub fn reference_area(&self) -> Option<BoundingBox> {
        self.reference_area
    }

    /// Whether my position lies inside the reference area, `None` if either is unknown.
    pub fn is_in_reference_area(&self) -> Option<bool> {
        let area = self.reference_area?;
        let my_position = self.comparator.my_position()?;
        Some(area.contains(&my_position))
    }

    pub async fn save_track(&self) -> Result<PathBuf, StorageError> {
        self.documents.save_track(&self.controller.trajectory().await).await
    }

    pub async fn saved_tracks(&self) -> Result<Vec<PathBuf>, StorageError> {
        self.documents.list_tracks().await
    }

    /// Reads every point of a saved track, the last saved track if `name` is `None`.
    pub async fn load_track(&self, name: Option<&str>) -> Result<DecodedTrack, StorageError> {
        match name {
            Some(name) => self.documents.load_track(name).await,
            None => {
                let name = self.documents.last_saved().ok_or(StorageError::NoTrackSaved)?;
                self.documents.load_track(&name).await
            }
        }
    }

    pub async fn upload_track(&self) -> UploadReport {
        self.remote.upload_trajectory(&self.controller.trajectory().await).await
    }
}
