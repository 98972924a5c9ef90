use crate::domain::TrackPoint;
use crate::extensions::date_time_ext::ToFileStamp;
use crate::extensions::path_ext::FileName;
use crate::track_serializer::{self, DecodedTrack, ParseError};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::{info, instrument, warn};

const TRACK_EXTENSION: &str = "csv";

/// Text files in the "documents" directory, plus the bookkeeping of the last saved track.
#[derive(Debug)]
pub struct DocumentStore {
    directory: PathBuf,
    last_saved: Mutex<Option<String>>,
}

impl DocumentStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DocumentStore {
            directory: directory.into(),
            last_saved: Mutex::new(None),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `text` to `name`, creating the directory if needed. Returns the full path.
    #[instrument(skip(self, text))]
    pub async fn write(&self, name: &str, text: &str) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.directory).await.map_err(|e| StorageError::io(e, &self.directory))?;

        let path = self.directory.join(name);
        fs::write(&path, text).await.map_err(|e| StorageError::io(e, &path))?;
        Ok(path)
    }

    #[instrument(skip(self))]
    pub async fn read(&self, name: &str) -> Result<String, StorageError> {
        let path = self.directory.join(name);
        fs::read_to_string(&path).await.map_err(|e| StorageError::io(e, &path))
    }

    /// Saved tracks sorted by name, which is also the order they were saved in. A missing
    /// directory has no tracks.
    #[instrument(skip(self))]
    pub async fn list_tracks(&self) -> Result<Vec<PathBuf>, StorageError> {
        let dir = match fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(e, &self.directory)),
        };

        let mut files = Vec::new();
        let mut entries = ReadDirStream::new(dir);
        while let Some(entry) = entries.next().await {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(TRACK_EXTENSION) {
                        files.push(path);
                    }
                }
                Err(err) => warn!("⚠️ Unable to read directory entry: {}", err),
            }
        }

        files.sort();
        Ok(files)
    }

    /// Saves the trajectory as `track-<timestamp>.csv` and remembers it as the last saved track.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn save_track(&self, points: &[TrackPoint]) -> Result<PathBuf, StorageError> {
        if points.is_empty() {
            return Err(StorageError::EmptyTrajectory);
        }

        info!("💾 Saving track...");
        let name = format!("track-{}.{}", Utc::now().to_file_stamp(), TRACK_EXTENSION);
        let path = self.write(&name, &track_serializer::encode(points)).await?;
        *self.last_saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(name);

        info!("💾 Saving track... OK, '{}'", path.string_file_name());
        Ok(path)
    }

    pub fn last_saved(&self) -> Option<String> {
        self.last_saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The last point of the last saved track.
    pub async fn load_reference(&self) -> Result<TrackPoint, StorageError> {
        let name = self.last_saved().ok_or(StorageError::NoTrackSaved)?;
        self.load_last_point(&name).await
    }

    /// The last point of the track stored as `name`.
    #[instrument(skip(self))]
    pub async fn load_last_point(&self, name: &str) -> Result<TrackPoint, StorageError> {
        let text = self.read(name).await?;
        let point = track_serializer::decode(&text)?;
        info!("📂 Loaded reference {} from '{}'", point.position(), name);
        Ok(point)
    }

    /// Every readable point of the track stored as `name`. Broken rows are skipped and counted.
    #[instrument(skip(self))]
    pub async fn load_track(&self, name: &str) -> Result<DecodedTrack, StorageError> {
        let text = self.read(name).await?;
        let track = track_serializer::decode_all(&text)?;
        if track.skipped > 0 {
            warn!("⚠️ Skipped {} broken row(s) of '{}'", track.skipped, name);
        }
        info!("📂 Loaded {} point(s) from '{}'", track.points.len(), name);
        Ok(track)
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{}: {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
    #[error("the trajectory is empty, nothing to save")]
    EmptyTrajectory,
    #[error("no track has been saved yet")]
    NoTrackSaved,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl StorageError {
    fn io(source: io::Error, path: &Path) -> Self {
        StorageError::Io {
            source,
            path: path.to_path_buf(),
        }
    }
}
