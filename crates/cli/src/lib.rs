//! Operator command line for the workshop backend.
//!
//! Wires configuration, the file-backed session store and the API client
//! together; the binary in `main.rs` only parses arguments and prints.

pub mod cli;
pub mod commands;
pub mod config;

use workshop_client::ApiClient;
use workshop_session::SessionStore;

use crate::config::CliConfig;

/// Open the session file and build a client over it.
pub fn build_client(config: &CliConfig) -> anyhow::Result<ApiClient> {
    let store = SessionStore::open_file(&config.session_file)?;
    let client = ApiClient::new(&config.client, store)?;
    Ok(client)
}
