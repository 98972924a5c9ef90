pub mod client;
mod coordinate_client;

pub use coordinate_client::{CoordinateClient, RemoteCoordinate, RemoteError, UploadReport};
