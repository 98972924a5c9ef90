use crate::app_config::AppConfig;
use reqwest::Client;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the position source and the coordinate client.
pub fn new_client(config: &AppConfig) -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).connect_timeout(config.remote().timeout()).build()
}
