use crate::domain::Position;
use crate::position_source::WatchOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    observer: Observer,
    #[serde(default)]
    watch: WatchOptions,
    position_source: PositionSource,
    remote: Remote,
    storage: Storage,
    #[serde(default)]
    comparator: Comparator,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("TRAILKEEPER").separator("__"));

        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        if config.observer.id.trim().is_empty() {
            return Err(ConfigError::Message("observer.id must not be empty".to_string()));
        }

        if config.observer.id.contains(',') {
            return Err(ConfigError::Message("observer.id must not contain a comma".to_string()));
        }

        Ok(config)
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn watch(&self) -> &WatchOptions {
        &self.watch
    }

    pub fn position_source(&self) -> &PositionSource {
        &self.position_source
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    event_buffer_size: usize,
}

impl Core {
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

#[derive(Debug, Deserialize)]
pub struct Observer {
    id: String,
}

impl Observer {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct PositionSource {
    url: String,
    retry_ms: u64,
    retry_max_delay_ms: u64,
}

impl PositionSource {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct Remote {
    url: String,
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

impl Remote {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    directory: String,
}

impl Storage {
    pub fn directory(&self) -> &Path {
        Path::new(&self.directory)
    }
}

#[derive(Debug, Deserialize)]
pub struct Comparator {
    #[serde(default = "default_indicator_length_m")]
    indicator_length_m: f64,
    area_center: Option<Position>,
    #[serde(default = "default_area_side_m")]
    area_side_m: f64,
}

fn default_indicator_length_m() -> f64 {
    100.0
}

fn default_area_side_m() -> f64 {
    1000.0
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator {
            indicator_length_m: default_indicator_length_m(),
            area_center: None,
            area_side_m: default_area_side_m(),
        }
    }
}

impl Comparator {
    pub fn indicator_length_m(&self) -> f64 {
        self.indicator_length_m
    }

    pub fn area_center(&self) -> Option<Position> {
        self.area_center
    }

    pub fn area_side_m(&self) -> f64 {
        self.area_side_m
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { event_buffer_size: 16 },
                observer: Observer { id: "phone-1".to_string() },
                watch: WatchOptions::default(),
                position_source: PositionSource {
                    url: "http://position.url".to_string(),
                    retry_ms: 10,
                    retry_max_delay_ms: 20,
                },
                remote: Remote {
                    url: "http://remote.url/api".to_string(),
                    timeout: Duration::from_secs(5),
                },
                storage: Storage {
                    directory: "documents".to_string(),
                },
                comparator: Comparator::default(),
            },
        }
    }

    pub fn position_source_url(mut self, url: String) -> Self {
        self.config.position_source.url = url;
        self
    }

    pub fn remote_url(mut self, url: String) -> Self {
        self.config.remote.url = url;
        self
    }

    pub fn storage_directory(mut self, directory: &Path) -> Self {
        self.config.storage.directory = directory.to_string_lossy().into_owned();
        self
    }

    pub fn area(mut self, center: Position, side_m: f64) -> Self {
        self.config.comparator.area_center = Some(center);
        self.config.comparator.area_side_m = side_m;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use pretty_assertions::assert_eq;

    fn from_toml(text: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::build(Config::builder().add_source(config::File::from_str(text, FileFormat::Toml)))
    }

    #[test]
    fn the_shipped_config_file_is_valid() -> Result<(), ConfigError> {
        let config = from_toml(include_str!("../config.toml"))?;

        assert_eq!(config.observer().id(), "my-phone");
        assert_eq!(config.watch(), &WatchOptions::default());
        assert_eq!(config.position_source().retry_max_delay(), Duration::from_secs(30));
        assert_eq!(config.remote().timeout(), Duration::from_secs(10));
        assert_eq!(config.storage().directory(), Path::new("documents"));
        assert_eq!(config.comparator().indicator_length_m(), 100.0);
        assert_eq!(config.comparator().area_center(), Some(Position::new(47.46385684116505, 8.39244934396616)));
        assert_eq!(config.comparator().area_side_m(), 1000.0);
        Ok(())
    }

    #[test]
    fn watch_and_comparator_sections_are_optional() -> Result<(), ConfigError> {
        let config = from_toml(
            r#"
            core = { event_buffer_size = 4 }
            observer = { id = "tablet" }
            position_source = { url = "http://localhost:8080", retry_ms = 100, retry_max_delay_ms = 1000 }
            remote = { url = "http://localhost:3000/api", timeout = "3s" }
            storage = { directory = "/tmp/tracks" }
            "#,
        )?;

        assert_eq!(config.watch(), &WatchOptions::default());
        assert_eq!(config.comparator().indicator_length_m(), 100.0);
        assert_eq!(config.comparator().area_center(), None);
        Ok(())
    }

    #[test]
    fn an_empty_observer_id_is_rejected() {
        let result = from_toml(
            r#"
            core = { event_buffer_size = 4 }
            observer = { id = " " }
            position_source = { url = "http://localhost:8080", retry_ms = 100, retry_max_delay_ms = 1000 }
            remote = { url = "http://localhost:3000/api", timeout = "3s" }
            storage = { directory = "/tmp/tracks" }
            "#,
        );

        assert_eq!(result.unwrap_err().to_string(), "observer.id must not be empty");
    }

    #[test]
    fn an_observer_id_with_a_comma_is_rejected() {
        let result = from_toml(
            r#"
            core = { event_buffer_size = 4 }
            observer = { id = "phone,1" }
            position_source = { url = "http://localhost:8080", retry_ms = 100, retry_max_delay_ms = 1000 }
            remote = { url = "http://localhost:3000/api", timeout = "3s" }
            storage = { directory = "/tmp/tracks" }
            "#,
        );

        assert_eq!(result.unwrap_err().to_string(), "observer.id must not contain a comma");
    }

    #[test]
    fn an_out_of_range_area_center_is_rejected() {
        let result = from_toml(
            r#"
            core = { event_buffer_size = 4 }
            observer = { id = "tablet" }
            position_source = { url = "http://localhost:8080", retry_ms = 100, retry_max_delay_ms = 1000 }
            remote = { url = "http://localhost:3000/api", timeout = "3s" }
            storage = { directory = "/tmp/tracks" }
            comparator = { area_center = { latitude = 120.0, longitude = 8.0 } }
            "#,
        );

        assert!(result.is_err());
    }
}
