use crate::app_config::AppConfig;
use crate::position_source::HttpPositionSource;
use crate::remote::CoordinateClient;
use crate::session::TrackingSession;
use crate::trajectory_store::polyline;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod app_config;
mod comparator;
mod domain;
mod extensions;
mod geodesy;
mod position_deserializer;
mod position_source;
mod remote;
mod session;
mod sse;
mod storage;
mod track_serializer;
mod trajectory_store;
mod watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let client = remote::client::new_client(&config)?;
    let source = Arc::new(HttpPositionSource::new(client.clone(), &config));
    let coordinates = CoordinateClient::new(client, &config);
    let mut session = TrackingSession::new(source, coordinates, &config);
    info!("✅  Initialized tracking session for '{}'", config.observer().id());

    if let Some(area) = session.reference_area() {
        info!("🗺️ Reference area: {:?}", area);
    }

    match session.locate_me().await {
        Ok(_) => info!("✅  Located observer"),
        Err(e) => warn!("⚠️ Could not locate observer: {}", e),
    }

    session
        .start_tracking(
            |trajectory| {
                if let Some(last) = trajectory.last() {
                    info!("🗺️ Path has {} point(s), last at {}", trajectory.len(), last.position());
                }
                debug!("Path: {:?}", polyline(trajectory));
            },
            |error| warn!("⚠️ {}", error),
        )
        .await?;
    info!("🔥 {} is up and running, press Ctrl+C to stop", env!("CARGO_PKG_NAME"));

    tokio::signal::ctrl_c().await?;
    info!("🛑 Stopping...");

    match session.save_track().await {
        Ok(path) => {
            let saved = session.saved_tracks().await.map(|tracks| tracks.len()).unwrap_or_default();
            info!("✅  Saved track to {}, {} track(s) in total", path.display(), saved);
            match session.load_track(None).await {
                Ok(track) => info!("✅  Saved track holds {} point(s)", track.points.len()),
                Err(e) => warn!("⚠️ Could not read the saved track back: {}", e),
            }
        }
        Err(e) => warn!("⚠️ Could not save track: {}", e),
    }

    let report = session.upload_track().await;
    if report.failed > 0 {
        warn!("⚠️ {} of {} point(s) were not uploaded", report.failed, report.attempted);
    } else {
        info!("✅  Uploaded {} point(s)", report.succeeded());
    }

    session.use_last_recorded_position().await;
    if session.is_tracking().await {
        session.stop_tracking().await;
    }

    match session.load_reference_from_remote().await {
        Ok(result) => info!("🧭 Latest remote coordinate: {}", result),
        Err(e) => {
            warn!("⚠️ Could not load the remote reference: {}", e);
            match session.load_reference_from_file(None).await {
                Ok(result) => info!("🧭 Last saved track: {}", result),
                Err(e) => warn!("⚠️ Could not load the saved reference: {}", e),
            }
        }
    }

    if let Some(inside) = session.is_in_reference_area() {
        info!("🗺️ Inside the reference area: {}", inside);
    }

    session.leave().await;
    Ok(())
}
